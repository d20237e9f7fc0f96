pub mod error;
pub mod types;
pub mod value;

pub use error::{BindingError, Error, PluginError, RegistrationError, Result};
pub use types::{Parameter, Row, RowBounds};
pub use value::Value;
