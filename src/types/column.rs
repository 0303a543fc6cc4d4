//! # Column Types and Signatures
//!
//! A `ColumnType` pairs a result column's name with the data type the query
//! reports for it. The ordered list of column types of one result set is its
//! column signature; scan plans are cached per signature, so two signatures are
//! only interchangeable when they agree in length and, position by position, in
//! both name and reported type.
//!
//! ## Usage
//!
//! ```ignore
//! use rowconv::types::{ColumnType, DataType};
//!
//! let id = ColumnType::new("ID", DataType::Int8);
//! assert_eq!(id.normalized_name(), "id");
//! ```

use super::DataType;

/// Name and reported data type of one result column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnType {
    name: String,
    data_type: DataType,
}

impl ColumnType {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }

    /// Returns the column name (or alias) exactly as the query reported it.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the reported data type.
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Returns the lower-cased name used for field binding.
    pub fn normalized_name(&self) -> String {
        self.name.to_lowercase()
    }
}

/// Returns true if two column signatures are interchangeable.
pub fn signatures_match(left: &[ColumnType], right: &[ColumnType]) -> bool {
    left.len() == right.len() && left.iter().zip(right).all(|(l, r)| l == r)
}
