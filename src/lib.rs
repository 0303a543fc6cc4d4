//! # rowconv - Query Rows into Typed Values
//!
//! rowconv maps the rows of a query result into scalars or into record types,
//! including records nested behind pointer chains. Column-to-field bindings are
//! compiled once per (type, column signature) and cached, so repeated queries
//! of the same shape pay the introspection cost once.
//!
//! ## Quick Start
//!
//! ```ignore
//! use rowconv::{propagate, record, SqliteRows};
//!
//! record! {
//!     #[derive(Debug, Default)]
//!     pub struct User {
//!         pub id: i64,
//!         #[column = "display_name"]
//!         pub name: Option<String>,
//!     }
//! }
//!
//! let mut stmt = conn.prepare("SELECT id, display_name FROM users")?;
//! let mut users: Vec<User> = Vec::new();
//! propagate(&mut users, SqliteRows::query(&mut stmt, [])?)?;
//!
//! let mut stmt = conn.prepare("SELECT id FROM users")?;
//! let mut ids: Vec<i64> = Vec::new();
//! propagate(&mut ids, SqliteRows::query(&mut stmt, [])?)?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   propagate / Mapper (mapper)        │
//! ├─────────────────────────────────────┤
//! │ classify │ resolve │ provide │ plan  │
//! ├─────────────────────────────────────┤
//! │  Type Descriptors (reflect, record!) │
//! ├──────────────────┬──────────────────┤
//! │ Scan (FromCell)  │ Row Streams      │
//! ├──────────────────┴──────────────────┤
//! │  Cells and Columns (types, parsing)  │
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Element Types
//!
//! | Element | Mapping |
//! |---------|---------|
//! | `i64`, `String`, `Vec<u8>`, `bool`, floats, chrono types | one cell per row |
//! | `Option<T>`, `Box<T>` of the above | one cell per row; `NULL` → `None` |
//! | `record!` struct, possibly behind `Option`/`Box` | columns bound to fields by name |
//! | sequences, maps, arrays, trait objects, functions, channels | rejected |
//!
//! ## Module Overview
//!
//! - [`mapper`]: `Mapper`, `propagate`, and the plan and provider caches
//! - [`reflect`]: `Reflect`, `TypeInfo`, and the built-in descriptors
//! - [`scan`]: `FromCell` conversions from cells to typed values
//! - [`rows`]: `RowStream`, `MemoryRows`, `SqliteRows`
//! - [`types`]: `OwnedValue`, `DataType`, `ColumnType`
//! - [`parsing`]: ISO 8601 date and time literals
//! - [`error`]: `MappingError` and `ScanError`

#[macro_use]
mod macros;

pub mod error;
pub mod mapper;
pub mod parsing;
pub mod reflect;
pub mod rows;
pub mod scan;
pub mod types;

pub use error::{MappingError, ScanError};
pub use mapper::{Destination, Mapper, MapperConfig};
pub use reflect::Reflect;
pub use rows::{MemoryRows, RowStream};
#[cfg(feature = "sqlite")]
pub use rows::SqliteRows;
pub use scan::FromCell;
pub use types::{ColumnType, DataType, OwnedValue};

use eyre::Result;

/// Maps every row of `rows` into a `T` and appends it to `dst`, using the
/// global mapper.
pub fn propagate<T, D, R>(dst: &mut D, rows: R) -> Result<()>
where
    T: Reflect,
    D: Destination<T> + ?Sized,
    R: RowStream,
{
    Mapper::global().propagate(dst, rows)
}

/// Sets the global column type check for plans compiled from now on.
pub fn set_strict_column_type_check(enabled: bool) {
    Mapper::global().set_strict_column_types(enabled);
}

/// Sets the global column amount check for plans compiled from now on.
pub fn set_strict_column_amount_check(enabled: bool) {
    Mapper::global().set_strict_column_amount(enabled);
}

/// Registers `T` as an opaque leaf of the global mapper.
pub fn register_opaque_leaf<T: Reflect>() {
    Mapper::global().register_opaque_leaf::<T>();
}
