//! # Reported Column Data Types
//!
//! This module provides the `DataType` enum used to describe what a query
//! reports for each of its result columns, and what a destination field
//! declares it can hold. The two sides meet in strict type checking: a column
//! whose reported type differs from the bound field's declared type is rejected
//! when the scan plan is compiled.
//!
//! ## Type Categories
//!
//! | Category | Types |
//! |----------|-------|
//! | **Boolean** | Bool |
//! | **Integer** | Int2, Int4, Int8 |
//! | **Float** | Float4, Float8 |
//! | **Numeric** | Decimal |
//! | **Date/Time** | Date, Time, Timestamp, TimestampTz |
//! | **Text** | Text |
//! | **Binary** | Blob |
//!
//! ## Declared Types
//!
//! Drivers that only expose the declared SQL type of a column (SQLite being the
//! prominent example) go through `DataType::from_decl_type`, which recognizes the
//! common spellings first and then falls back to SQLite's affinity rules:
//!
//! 1. Contains `INT` → integer
//! 2. Contains `CHAR`, `CLOB` or `TEXT` → text
//! 3. Contains `BLOB`, or no declared type → blob
//! 4. Contains `REAL`, `FLOA` or `DOUB` → real
//! 5. Anything else → numeric
//!
//! ## Usage
//!
//! ```ignore
//! use rowconv::types::DataType;
//!
//! assert_eq!(DataType::from_decl_type(Some("VARCHAR(20)")), DataType::Text);
//! assert_eq!(DataType::from_decl_type(Some("DATETIME")), DataType::Timestamp);
//! ```

use std::fmt;

/// Data type reported by a query for a result column.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Bool = 0,
    Int2 = 1,
    Int4 = 2,
    Int8 = 3,
    Float4 = 4,
    Float8 = 5,
    Date = 6,
    Time = 7,
    Timestamp = 8,
    TimestampTz = 9,

    Text = 20,
    Blob = 21,

    Decimal = 30,
}

/// Type affinity following SQLite's flexible typing rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeAffinity {
    Integer,
    Real,
    Text,
    Blob,
    Numeric,
}

impl DataType {
    /// Maps a declared SQL column type to a data type.
    pub fn from_decl_type(decl: Option<&str>) -> DataType {
        let decl = match decl {
            Some(decl) => decl.trim().to_ascii_uppercase(),
            None => return DataType::Blob,
        };
        let base = decl.split('(').next().unwrap_or("").trim();

        match base {
            "BOOL" | "BOOLEAN" => return DataType::Bool,
            "TINYINT" | "SMALLINT" | "INT2" => return DataType::Int2,
            "INT4" | "MEDIUMINT" => return DataType::Int4,
            "FLOAT4" => return DataType::Float4,
            "DATE" => return DataType::Date,
            "TIME" => return DataType::Time,
            "DATETIME" | "TIMESTAMP" => return DataType::Timestamp,
            "TIMESTAMPTZ" | "TIMESTAMP WITH TIME ZONE" => return DataType::TimestampTz,
            _ => {}
        }

        match Self::affinity_of(&decl) {
            TypeAffinity::Integer => DataType::Int8,
            TypeAffinity::Text => DataType::Text,
            TypeAffinity::Blob => DataType::Blob,
            TypeAffinity::Real => DataType::Float8,
            TypeAffinity::Numeric => DataType::Decimal,
        }
    }

    fn affinity_of(decl: &str) -> TypeAffinity {
        if decl.contains("INT") {
            TypeAffinity::Integer
        } else if decl.contains("CHAR") || decl.contains("CLOB") || decl.contains("TEXT") {
            TypeAffinity::Text
        } else if decl.is_empty() || decl.contains("BLOB") {
            TypeAffinity::Blob
        } else if decl.contains("REAL") || decl.contains("FLOA") || decl.contains("DOUB") {
            TypeAffinity::Real
        } else {
            TypeAffinity::Numeric
        }
    }

    /// Returns the SQLite-compatible type affinity for this type.
    pub fn affinity(&self) -> TypeAffinity {
        match self {
            DataType::Int2 | DataType::Int4 | DataType::Int8 | DataType::Bool => {
                TypeAffinity::Integer
            }
            DataType::Float4 | DataType::Float8 => TypeAffinity::Real,
            DataType::Text => TypeAffinity::Text,
            DataType::Blob => TypeAffinity::Blob,
            DataType::Decimal
            | DataType::Date
            | DataType::Time
            | DataType::Timestamp
            | DataType::TimestampTz => TypeAffinity::Numeric,
        }
    }

    /// Returns true if this is a numeric type (integer, float or decimal).
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::Int2
                | DataType::Int4
                | DataType::Int8
                | DataType::Float4
                | DataType::Float8
                | DataType::Decimal
        )
    }

    /// Returns true if this is a date/time type.
    pub fn is_datetime(&self) -> bool {
        matches!(
            self,
            DataType::Date | DataType::Time | DataType::Timestamp | DataType::TimestampTz
        )
    }

    /// SQL spelling used in error messages.
    pub fn sql_name(&self) -> &'static str {
        match self {
            DataType::Bool => "BOOLEAN",
            DataType::Int2 => "SMALLINT",
            DataType::Int4 => "INTEGER",
            DataType::Int8 => "BIGINT",
            DataType::Float4 => "REAL",
            DataType::Float8 => "DOUBLE PRECISION",
            DataType::Date => "DATE",
            DataType::Time => "TIME",
            DataType::Timestamp => "TIMESTAMP",
            DataType::TimestampTz => "TIMESTAMPTZ",
            DataType::Text => "TEXT",
            DataType::Blob => "BLOB",
            DataType::Decimal => "DECIMAL",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decl_type_common_spellings() {
        assert_eq!(DataType::from_decl_type(Some("BOOLEAN")), DataType::Bool);
        assert_eq!(DataType::from_decl_type(Some("smallint")), DataType::Int2);
        assert_eq!(DataType::from_decl_type(Some("INTEGER")), DataType::Int8);
        assert_eq!(DataType::from_decl_type(Some("BIGINT")), DataType::Int8);
        assert_eq!(DataType::from_decl_type(Some("DATETIME")), DataType::Timestamp);
        assert_eq!(DataType::from_decl_type(Some("date")), DataType::Date);
    }

    #[test]
    fn decl_type_affinity_fallback() {
        assert_eq!(DataType::from_decl_type(Some("VARCHAR(20)")), DataType::Text);
        assert_eq!(DataType::from_decl_type(Some("NATIVE CHARACTER(70)")), DataType::Text);
        assert_eq!(DataType::from_decl_type(Some("DOUBLE")), DataType::Float8);
        assert_eq!(DataType::from_decl_type(Some("DECIMAL(6,0)")), DataType::Decimal);
        assert_eq!(DataType::from_decl_type(Some("BLOB")), DataType::Blob);
    }

    #[test]
    fn decl_type_missing_is_blob() {
        assert_eq!(DataType::from_decl_type(None), DataType::Blob);
        assert_eq!(DataType::from_decl_type(Some("")), DataType::Blob);
    }

    #[test]
    fn affinity_groups() {
        assert_eq!(DataType::Bool.affinity(), TypeAffinity::Integer);
        assert_eq!(DataType::Float4.affinity(), TypeAffinity::Real);
        assert_eq!(DataType::Timestamp.affinity(), TypeAffinity::Numeric);
        assert!(DataType::Decimal.is_numeric());
        assert!(DataType::TimestampTz.is_datetime());
        assert!(!DataType::Text.is_numeric());
    }

    #[test]
    fn display_uses_sql_name() {
        assert_eq!(DataType::Int8.to_string(), "BIGINT");
        assert_eq!(DataType::Text.to_string(), "TEXT");
    }
}
