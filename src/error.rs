//! # Error Types
//!
//! Mapping functions return `eyre::Result`. The typed root causes below can be
//! recovered with `Report::downcast_ref` to tell the error categories apart:
//!
//! | Category | Type | Raised |
//! |----------|------|--------|
//! | Shape | `MappingError::UnsupportedElement` | before any row is read |
//! | Resolution | `MappingError::NotARecord`, `MappingError::RecursiveRecord` | first plan compilation |
//! | Strictness | `MappingError::UnmappedColumn`, `MappingError::ColumnTypeMismatch` | plan compilation |
//! | Per-row | `ScanError`, `MappingError::ColumnCount` | while driving rows |
//!
//! Stream errors are whatever the row stream reports; they are passed through
//! untouched.

use thiserror::Error;

use crate::types::DataType;

/// Errors raised by the mapping engine itself.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("unsupported destination element type {type_name}: {kind} cannot hold a row")]
    UnsupportedElement {
        type_name: &'static str,
        kind: &'static str,
    },

    #[error("underlying type is not a record: {type_name}")]
    NotARecord { type_name: &'static str },

    #[error("record type {type_name} contains itself through field chain {path}")]
    RecursiveRecord {
        type_name: &'static str,
        path: String,
    },

    #[error("no mapping exists for column/alias: {column}")]
    UnmappedColumn { column: String },

    #[error(
        "value for column/alias: {column} can't be stored into the type: {field_type}; \
         required type: {column_type}"
    )]
    ColumnTypeMismatch {
        column: String,
        field_type: &'static str,
        column_type: DataType,
    },

    #[error("expected {expected} destination arguments in scan, not {actual}")]
    ColumnCount { expected: usize, actual: usize },

    #[error("nil pointer while reaching field {field} of {type_name}")]
    NilPointer {
        type_name: &'static str,
        field: &'static str,
    },

    #[error("value does not have the type its descriptor names: {expected}")]
    DescriptorMismatch { expected: &'static str },
}

/// Errors raised when a cell cannot be converted into its destination type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("converting NULL to {into} is unsupported")]
    NullInto { into: &'static str },

    #[error("unsupported scan, storing {from} value into type {into}")]
    Unsupported {
        from: &'static str,
        into: &'static str,
    },

    #[error("converting {value} to {into}: value out of range")]
    OutOfRange { value: String, into: &'static str },

    #[error("converting {value:?} to {into}: {reason}")]
    Parse {
        value: String,
        into: &'static str,
        reason: String,
    },
}
