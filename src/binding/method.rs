use std::collections::HashMap;
use std::fmt;

use super::{Arg, MethodSignature, ParamNameResolver, ReturnShape};
use crate::core::{BindingError, Result, Row, Value};
use crate::executor::{BatchResult, Cursor};
use crate::mapping::{SqlCommandType, StatementStore};
use crate::session::SqlSession;

/// What a mapper method does when called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    SelectOne,
    SelectMany,
    SelectMap { key: &'static str },
    SelectCursor,
    Insert,
    Update,
    Delete,
    Flush,
}

/// Statement id plus command kind of a resolved method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlCommand {
    name: String,
    kind: CommandKind,
}

impl SqlCommand {
    /// Decide the command for `signature` of mapper `namespace`.
    pub fn resolve(
        namespace: &str,
        signature: &MethodSignature,
        store: &StatementStore,
    ) -> std::result::Result<Self, BindingError> {
        let name = format!("{}.{}", namespace, signature.name);
        if signature.returns == ReturnShape::Batch {
            return Ok(Self {
                name,
                kind: CommandKind::Flush,
            });
        }

        let statement = store.statement(&name)?;
        let unsupported = || BindingError::UnsupportedReturn {
            id: name.clone(),
            shape: signature.returns.to_string(),
            command: statement.command_type().to_string(),
        };

        let kind = match (statement.command_type(), signature.returns) {
            (SqlCommandType::Unknown, _) => {
                return Err(BindingError::UnknownCommand { id: name.clone() });
            }
            (SqlCommandType::Select, ReturnShape::One | ReturnShape::Void) => CommandKind::SelectOne,
            (SqlCommandType::Select, ReturnShape::Many) => CommandKind::SelectMany,
            (SqlCommandType::Select, ReturnShape::Map { key }) => CommandKind::SelectMap { key },
            (SqlCommandType::Select, ReturnShape::Cursor) => CommandKind::SelectCursor,
            (SqlCommandType::Select, _) => return Err(unsupported()),
            (write, ReturnShape::Void | ReturnShape::Count | ReturnShape::Flag) => match write {
                SqlCommandType::Insert => CommandKind::Insert,
                SqlCommandType::Update => CommandKind::Update,
                _ => CommandKind::Delete,
            },
            _ => return Err(unsupported()),
        };

        Ok(Self { name, kind })
    }

    /// Statement id (`namespace.method`).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }
}

/// A resolved mapper method, cached per proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapperMethod {
    command: SqlCommand,
    returns: ReturnShape,
    params: ParamNameResolver,
}

impl MapperMethod {
    pub fn resolve(
        namespace: &str,
        signature: &MethodSignature,
        store: &StatementStore,
    ) -> std::result::Result<Self, BindingError> {
        let command = SqlCommand::resolve(namespace, signature, store)?;
        let params = ParamNameResolver::new(command.name(), &signature.params)?;
        Ok(Self {
            command,
            returns: signature.returns,
            params,
        })
    }

    pub fn command(&self) -> &SqlCommand {
        &self.command
    }

    pub fn returns(&self) -> ReturnShape {
        self.returns
    }

    pub fn execute(&self, session: &dyn SqlSession, args: &[Arg]) -> Result<MapperResult> {
        let (parameter, bounds) = self.params.resolve(args)?;
        let id = self.command.name();

        let result = match self.command.kind() {
            CommandKind::Insert => self.write_result(session.insert(id, &parameter)?),
            CommandKind::Update => self.write_result(session.update(id, &parameter)?),
            CommandKind::Delete => self.write_result(session.delete(id, &parameter)?),
            CommandKind::SelectOne => {
                let row = session.select_one(id, &parameter)?;
                match self.returns {
                    ReturnShape::Void => MapperResult::Void,
                    _ => MapperResult::One(row),
                }
            }
            CommandKind::SelectMany => MapperResult::Many(session.select_list_with_bounds(id, &parameter, bounds)?),
            CommandKind::SelectMap { key } => MapperResult::Map(session.select_map(id, &parameter, key, bounds)?),
            CommandKind::SelectCursor => MapperResult::Cursor(session.select_cursor(id, &parameter, bounds)?),
            CommandKind::Flush => MapperResult::Batch(session.flush_statements()?),
        };
        Ok(result)
    }

    fn write_result(&self, count: u64) -> MapperResult {
        match self.returns {
            ReturnShape::Count => MapperResult::Count(count),
            ReturnShape::Flag => MapperResult::Flag(count > 0),
            _ => MapperResult::Void,
        }
    }
}

/// Value returned by a mapper call, shaped by the method's [`ReturnShape`].
#[derive(Debug)]
pub enum MapperResult {
    Void,
    Count(u64),
    Flag(bool),
    One(Option<Row>),
    Many(Vec<Row>),
    Map(HashMap<Value, Row>),
    Cursor(Cursor),
    Batch(Vec<BatchResult>),
}

impl MapperResult {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Void => "void",
            Self::Count(_) => "count",
            Self::Flag(_) => "flag",
            Self::One(_) => "one",
            Self::Many(_) => "many",
            Self::Map(_) => "map",
            Self::Cursor(_) => "cursor",
            Self::Batch(_) => "batch",
        }
    }

    fn mismatch(&self, expected: &'static str) -> BindingError {
        BindingError::ResultShape {
            expected,
            found: self.kind(),
        }
    }

    pub fn into_void(self) -> Result<()> {
        match self {
            Self::Void => Ok(()),
            other => Err(other.mismatch("void").into()),
        }
    }

    pub fn into_count(self) -> Result<u64> {
        match self {
            Self::Count(n) => Ok(n),
            other => Err(other.mismatch("count").into()),
        }
    }

    pub fn into_flag(self) -> Result<bool> {
        match self {
            Self::Flag(b) => Ok(b),
            other => Err(other.mismatch("flag").into()),
        }
    }

    pub fn into_one(self) -> Result<Option<Row>> {
        match self {
            Self::One(row) => Ok(row),
            other => Err(other.mismatch("one").into()),
        }
    }

    pub fn into_many(self) -> Result<Vec<Row>> {
        match self {
            Self::Many(rows) => Ok(rows),
            other => Err(other.mismatch("many").into()),
        }
    }

    pub fn into_map(self) -> Result<HashMap<Value, Row>> {
        match self {
            Self::Map(map) => Ok(map),
            other => Err(other.mismatch("map").into()),
        }
    }

    pub fn into_cursor(self) -> Result<Cursor> {
        match self {
            Self::Cursor(cursor) => Ok(cursor),
            other => Err(other.mismatch("cursor").into()),
        }
    }

    pub fn into_batch(self) -> Result<Vec<BatchResult>> {
        match self {
            Self::Batch(results) => Ok(results),
            other => Err(other.mismatch("batch").into()),
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelectOne => write!(f, "SELECT ONE"),
            Self::SelectMany => write!(f, "SELECT MANY"),
            Self::SelectMap { key } => write!(f, "SELECT MAP({})", key),
            Self::SelectCursor => write!(f, "SELECT CURSOR"),
            Self::Insert => write!(f, "INSERT"),
            Self::Update => write!(f, "UPDATE"),
            Self::Delete => write!(f, "DELETE"),
            Self::Flush => write!(f, "FLUSH"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::MappedStatement;

    fn store() -> StatementStore {
        let mut store = StatementStore::new();
        store
            .add(MappedStatement::select("UserMapper.findUserById", "select * from user where id = #{id}").unwrap())
            .unwrap();
        store
            .add(MappedStatement::delete("UserMapper.deleteUser", "delete from user where id = #{id}").unwrap())
            .unwrap();
        store
            .add(MappedStatement::new("UserMapper.mystery", SqlCommandType::Unknown, "call x()", Vec::new()))
            .unwrap();
        store
    }

    #[test]
    fn test_command_kinds() {
        let store = store();
        let one = SqlCommand::resolve(
            "UserMapper",
            &MethodSignature::new("findUserById", ReturnShape::One).param("id"),
            &store,
        )
        .unwrap();
        assert_eq!(one.name(), "UserMapper.findUserById");
        assert_eq!(one.kind(), CommandKind::SelectOne);

        let delete = SqlCommand::resolve(
            "UserMapper",
            &MethodSignature::new("deleteUser", ReturnShape::Flag).param("id"),
            &store,
        )
        .unwrap();
        assert_eq!(delete.kind(), CommandKind::Delete);

        let flush = SqlCommand::resolve("UserMapper", &MethodSignature::flush("flush"), &store).unwrap();
        assert_eq!(flush.kind(), CommandKind::Flush);
    }

    #[test]
    fn test_resolution_failures() {
        let store = store();
        let resolve = |sig: MethodSignature| SqlCommand::resolve("UserMapper", &sig, &store);

        assert_eq!(
            resolve(MethodSignature::new("nope", ReturnShape::Many)),
            Err(BindingError::StatementNotFound {
                id: "UserMapper.nope".into()
            })
        );
        assert!(matches!(
            resolve(MethodSignature::new("mystery", ReturnShape::Void)),
            Err(BindingError::UnknownCommand { .. })
        ));
        assert!(matches!(
            resolve(MethodSignature::new("deleteUser", ReturnShape::Many)),
            Err(BindingError::UnsupportedReturn { .. })
        ));
        assert!(matches!(
            resolve(MethodSignature::new("findUserById", ReturnShape::Count)),
            Err(BindingError::UnsupportedReturn { .. })
        ));
    }

    #[test]
    fn test_result_shape_mismatch() {
        let err = MapperResult::Count(1).into_many().unwrap_err();
        assert!(err.to_string().contains("expected many"));
    }
}
