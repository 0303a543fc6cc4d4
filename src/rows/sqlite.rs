//! Row stream over a live SQLite query.
//!
//! Column types come from the declared types of the result columns and follow
//! SQLite's affinity rules (see `DataType::from_decl_type`). Expression
//! columns have no declared type and report `Blob`, so strict column type
//! checks only make sense for queries that select table columns.

use eyre::{Report, Result, WrapErr};
use rusqlite::types::ValueRef;
use rusqlite::{Params, Rows, Statement};

use super::RowStream;
use crate::types::{ColumnType, DataType, OwnedValue};

pub struct SqliteRows<'stmt> {
    columns: Vec<ColumnType>,
    rows: Option<Rows<'stmt>>,
    current: Vec<OwnedValue>,
    error: Option<Report>,
}

impl<'stmt> SqliteRows<'stmt> {
    /// Executes `stmt` with `params` and streams its result rows.
    pub fn query<P: Params>(stmt: &'stmt mut Statement<'_>, params: P) -> Result<Self> {
        let columns = stmt
            .columns()
            .iter()
            .map(|column| {
                ColumnType::new(column.name(), DataType::from_decl_type(column.decl_type()))
            })
            .collect();
        let rows = stmt.query(params).wrap_err("failed to execute query")?;
        Ok(Self {
            columns,
            rows: Some(rows),
            current: Vec::new(),
            error: None,
        })
    }
}

fn owned_from_ref(value: ValueRef<'_>) -> OwnedValue {
    match value {
        ValueRef::Null => OwnedValue::Null,
        ValueRef::Integer(i) => OwnedValue::Int(i),
        ValueRef::Real(f) => OwnedValue::Float(f),
        ValueRef::Text(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => OwnedValue::Text(text.to_string()),
            Err(_) => OwnedValue::Blob(bytes.to_vec()),
        },
        ValueRef::Blob(bytes) => OwnedValue::Blob(bytes.to_vec()),
    }
}

impl RowStream for SqliteRows<'_> {
    fn columns(&self) -> Result<Vec<ColumnType>> {
        Ok(self.columns.clone())
    }

    fn next_row(&mut self) -> bool {
        self.current.clear();
        let Some(rows) = self.rows.as_mut() else {
            return false;
        };
        match rows.next() {
            Ok(Some(row)) => {
                for idx in 0..self.columns.len() {
                    match row.get_ref(idx) {
                        Ok(value) => self.current.push(owned_from_ref(value)),
                        Err(err) => {
                            self.error = Some(Report::new(err).wrap_err("failed to read cell"));
                            self.current.clear();
                            return false;
                        }
                    }
                }
                true
            }
            Ok(None) => false,
            Err(err) => {
                self.error = Some(Report::new(err).wrap_err("failed to step row"));
                false
            }
        }
    }

    fn cells(&self) -> &[OwnedValue] {
        &self.current
    }

    fn err(&mut self) -> Result<()> {
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.rows = None;
        self.current.clear();
        Ok(())
    }
}
