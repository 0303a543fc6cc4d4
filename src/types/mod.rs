//! # Cell and Column Types
//!
//! This module provides the value-level vocabulary shared by row streams and
//! the mapping engine.
//!
//! ## Module Structure
//!
//! - `data_type`: `DataType` reported for columns and declared by fields
//! - `owned_value`: `OwnedValue`, one raw cell of a result row
//! - `column`: `ColumnType` and column signature comparison
//!
//! ## Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | `DataType` | Reported/declared type discriminant |
//! | `TypeAffinity` | SQLite-compatible type affinity |
//! | `OwnedValue` | Heap-owned cell value |
//! | `ColumnType` | Column name with reported type |

mod column;
mod data_type;
mod owned_value;

pub use column::{signatures_match, ColumnType};
pub use data_type::{DataType, TypeAffinity};
pub use owned_value::OwnedValue;
