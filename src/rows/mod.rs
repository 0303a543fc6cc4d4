//! # Row Streams
//!
//! This module provides `RowStream`, the forward-only cursor the mapping
//! engine consumes, together with two implementations:
//!
//! - `MemoryRows`: owned rows built in memory, with optional injected failures
//! - `SqliteRows`: a live `rusqlite` query (feature `sqlite`)
//!
//! ## Protocol
//!
//! ```text
//! columns() ──► next_row() ──► cells() ──► next_row() ... ──► false
//!                                                              │
//!                                          err() ◄─────────────┘
//!                                          close()
//! ```
//!
//! `next_row` returns false both at the end of the result set and on failure;
//! `err` tells the two apart and reports the deferred failure. `close` releases
//! the underlying cursor and must be safe to call more than once.

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteRows;

use std::collections::VecDeque;

use eyre::{bail, eyre, Report, Result};

use crate::types::{ColumnType, OwnedValue};

/// A forward-only cursor over result rows.
pub trait RowStream {
    /// Returns the ordered column signature of the result set.
    fn columns(&self) -> Result<Vec<ColumnType>>;

    /// Advances to the next row. Returns false when exhausted or failed.
    fn next_row(&mut self) -> bool;

    /// Returns the cells of the current row.
    fn cells(&self) -> &[OwnedValue];

    /// Reports the failure that ended iteration early, if any.
    fn err(&mut self) -> Result<()>;

    /// Releases the cursor.
    fn close(&mut self) -> Result<()>;
}

impl<R: RowStream + ?Sized> RowStream for &mut R {
    fn columns(&self) -> Result<Vec<ColumnType>> {
        (**self).columns()
    }

    fn next_row(&mut self) -> bool {
        (**self).next_row()
    }

    fn cells(&self) -> &[OwnedValue] {
        (**self).cells()
    }

    fn err(&mut self) -> Result<()> {
        (**self).err()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// In-memory row stream.
///
/// Rows may be ragged: a row does not have to carry one cell per column. The
/// stream can be told to fail after yielding a number of rows, or to fail when
/// asked for its columns.
#[derive(Debug, Default)]
pub struct MemoryRows {
    columns: Vec<ColumnType>,
    pending: VecDeque<Vec<OwnedValue>>,
    current: Option<Vec<OwnedValue>>,
    yielded: usize,
    fail_after: Option<(usize, String)>,
    fail_columns: Option<String>,
    fail_close: Option<String>,
    error: Option<Report>,
    closed: bool,
    close_calls: usize,
}

impl MemoryRows {
    pub fn new(columns: Vec<ColumnType>) -> Self {
        Self {
            columns,
            ..Self::default()
        }
    }

    pub fn with_row(mut self, cells: Vec<OwnedValue>) -> Self {
        self.pending.push_back(cells);
        self
    }

    pub fn with_rows<I>(mut self, rows: I) -> Self
    where
        I: IntoIterator<Item = Vec<OwnedValue>>,
    {
        self.pending.extend(rows);
        self
    }

    /// Stops iteration with `message` after `rows` rows have been yielded.
    pub fn fail_after(mut self, rows: usize, message: impl Into<String>) -> Self {
        self.fail_after = Some((rows, message.into()));
        self
    }

    pub fn fail_columns(mut self, message: impl Into<String>) -> Self {
        self.fail_columns = Some(message.into());
        self
    }

    pub fn fail_close(mut self, message: impl Into<String>) -> Self {
        self.fail_close = Some(message.into());
        self
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl RowStream for MemoryRows {
    fn columns(&self) -> Result<Vec<ColumnType>> {
        if let Some(message) = &self.fail_columns {
            bail!("{}", message);
        }
        Ok(self.columns.clone())
    }

    fn next_row(&mut self) -> bool {
        self.current = None;
        if self.closed || self.error.is_some() {
            return false;
        }
        if let Some((rows, message)) = &self.fail_after {
            if self.yielded == *rows {
                self.error = Some(eyre!("{}", message));
                return false;
            }
        }
        match self.pending.pop_front() {
            Some(row) => {
                self.yielded += 1;
                self.current = Some(row);
                true
            }
            None => false,
        }
    }

    fn cells(&self) -> &[OwnedValue] {
        match &self.current {
            Some(cells) => cells,
            None => &[],
        }
    }

    fn err(&mut self) -> Result<()> {
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.close_calls += 1;
        self.closed = true;
        self.current = None;
        if let Some(message) = &self.fail_close {
            bail!("{}", message);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataType;

    fn two_rows() -> MemoryRows {
        MemoryRows::new(vec![ColumnType::new("a", DataType::Int8)])
            .with_row(vec![OwnedValue::Int(1)])
            .with_row(vec![OwnedValue::Int(2)])
    }

    #[test]
    fn yields_rows_in_order_then_stops() {
        let mut rows = two_rows();
        assert_eq!(rows.columns().unwrap().len(), 1);
        assert!(rows.next_row());
        assert_eq!(rows.cells(), &[OwnedValue::Int(1)]);
        assert!(rows.next_row());
        assert_eq!(rows.cells(), &[OwnedValue::Int(2)]);
        assert!(!rows.next_row());
        assert!(rows.cells().is_empty());
        assert!(rows.err().is_ok());
    }

    #[test]
    fn injected_failure_is_deferred_to_err() {
        let mut rows = two_rows().fail_after(1, "connection reset");
        assert!(rows.next_row());
        assert!(!rows.next_row());
        let err = rows.err().unwrap_err();
        assert_eq!(err.to_string(), "connection reset");
        assert_eq!(rows.remaining(), 1);
    }

    #[test]
    fn close_is_idempotent_and_stops_iteration() {
        let mut rows = two_rows();
        rows.close().unwrap();
        rows.close().unwrap();
        assert!(rows.is_closed());
        assert_eq!(rows.close_calls(), 2);
        assert!(!rows.next_row());
    }

    fn drain(mut stream: impl RowStream) -> usize {
        let mut count = 0;
        while stream.next_row() {
            count += 1;
        }
        stream.close().unwrap();
        count
    }

    #[test]
    fn stream_through_mutable_reference() {
        let mut rows = two_rows();
        assert_eq!(drain(&mut rows), 2);
        assert!(rows.is_closed());
    }

    #[test]
    fn ragged_rows_are_yielded_as_given() {
        let mut rows = MemoryRows::new(vec![
            ColumnType::new("a", DataType::Int8),
            ColumnType::new("b", DataType::Text),
        ])
        .with_rows([vec![OwnedValue::Int(4)], vec![]]);
        assert!(rows.next_row());
        assert_eq!(rows.cells(), &[OwnedValue::Int(4)]);
        assert!(rows.next_row());
        assert!(rows.cells().is_empty());
        assert_eq!(rows.remaining(), 0);
    }
}
