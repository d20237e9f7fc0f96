use std::collections::VecDeque;
use std::sync::Arc;

use log::debug;

use crate::core::{Result, Row, RowBounds};
use crate::mapping::MappedStatement;
use crate::result::ResultSet;

/// Turns a driver result set into rows.
pub trait ResultSetHandler: Send {
    fn handle_result_sets(&self, result_set: &ResultSet) -> Result<Vec<Row>>;

    fn handle_cursor_result_sets(&self, result_set: &ResultSet) -> Result<Cursor>;
}

/// Applies row bounds while reading; no object mapping.
pub struct DefaultResultSetHandler {
    mapped_statement: Arc<MappedStatement>,
    bounds: RowBounds,
}

impl DefaultResultSetHandler {
    pub fn new(mapped_statement: Arc<MappedStatement>, bounds: RowBounds) -> Self {
        Self {
            mapped_statement,
            bounds,
        }
    }

    fn bounded_rows(&self, result_set: &ResultSet) -> VecDeque<Row> {
        (0..result_set.row_count())
            .skip(self.bounds.offset())
            .take(self.bounds.limit())
            .filter_map(|i| result_set.row(i))
            .collect()
    }
}

impl ResultSetHandler for DefaultResultSetHandler {
    fn handle_result_sets(&self, result_set: &ResultSet) -> Result<Vec<Row>> {
        let rows: Vec<Row> = self.bounded_rows(result_set).into();
        debug!("<==      Total: {}", rows.len());
        Ok(rows)
    }

    fn handle_cursor_result_sets(&self, result_set: &ResultSet) -> Result<Cursor> {
        Ok(Cursor::new(
            self.mapped_statement.id(),
            self.bounded_rows(result_set),
        ))
    }
}

/// Rows handed out one at a time.
#[derive(Debug)]
pub struct Cursor {
    statement_id: String,
    rows: VecDeque<Row>,
    position: usize,
    closed: bool,
}

impl Cursor {
    pub fn new(statement_id: impl Into<String>, rows: impl Into<VecDeque<Row>>) -> Self {
        Self {
            statement_id: statement_id.into(),
            rows: rows.into(),
            position: 0,
            closed: false,
        }
    }

    pub fn statement_id(&self) -> &str {
        &self.statement_id
    }

    pub fn is_open(&self) -> bool {
        !self.closed
    }

    /// True once every row has been read.
    pub fn is_consumed(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows read so far.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Drop remaining rows. Further reads yield nothing.
    pub fn close(&mut self) {
        self.rows.clear();
        self.closed = true;
    }
}

impl Iterator for Cursor {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        if self.closed {
            return None;
        }
        let row = self.rows.pop_front()?;
        self.position += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.rows.len(), Some(self.rows.len()))
    }
}

/// Running state handed to a [`ResultHandler`].
#[derive(Debug, Default)]
pub struct ResultContext {
    count: usize,
    stopped: bool,
}

impl ResultContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows delivered so far, including the current one.
    pub fn result_count(&self) -> usize {
        self.count
    }

    /// Ask for no further rows.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub(crate) fn next_row(&mut self) {
        self.count += 1;
    }
}

/// Receives rows one by one from `select_with_handler`.
pub trait ResultHandler {
    fn handle_result(&mut self, row: Row, context: &mut ResultContext);
}

impl<F> ResultHandler for F
where
    F: FnMut(Row, &mut ResultContext),
{
    fn handle_result(&mut self, row: Row, context: &mut ResultContext) {
        self(row, context)
    }
}
