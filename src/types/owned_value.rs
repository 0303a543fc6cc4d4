use super::DataType;
use std::fmt;

/// One raw cell of a result row, as produced by a row stream.
///
/// Temporal variants carry the encodings used throughout the crate: days since
/// the Unix epoch for dates, microseconds since midnight for times, and
/// microseconds since the Unix epoch for timestamps (the zoned variant also
/// carries the UTC offset in seconds).
#[derive(Debug, Clone, PartialEq)]
pub enum OwnedValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
    Date(i32),
    Time(i64),
    Timestamp(i64),
    TimestampTz(i64, i32),
}

impl OwnedValue {
    pub fn is_null(&self) -> bool {
        matches!(self, OwnedValue::Null)
    }

    /// Short name of the variant, used in conversion errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            OwnedValue::Null => "NULL",
            OwnedValue::Bool(_) => "BOOL",
            OwnedValue::Int(_) => "INT",
            OwnedValue::Float(_) => "FLOAT",
            OwnedValue::Text(_) => "TEXT",
            OwnedValue::Blob(_) => "BLOB",
            OwnedValue::Date(_) => "DATE",
            OwnedValue::Time(_) => "TIME",
            OwnedValue::Timestamp(_) => "TIMESTAMP",
            OwnedValue::TimestampTz(_, _) => "TIMESTAMPTZ",
        }
    }

    /// The natural data type of this cell, or None for NULL.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            OwnedValue::Null => None,
            OwnedValue::Bool(_) => Some(DataType::Bool),
            OwnedValue::Int(_) => Some(DataType::Int8),
            OwnedValue::Float(_) => Some(DataType::Float8),
            OwnedValue::Text(_) => Some(DataType::Text),
            OwnedValue::Blob(_) => Some(DataType::Blob),
            OwnedValue::Date(_) => Some(DataType::Date),
            OwnedValue::Time(_) => Some(DataType::Time),
            OwnedValue::Timestamp(_) => Some(DataType::Timestamp),
            OwnedValue::TimestampTz(_, _) => Some(DataType::TimestampTz),
        }
    }
}

impl fmt::Display for OwnedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnedValue::Null => f.write_str("NULL"),
            OwnedValue::Bool(b) => write!(f, "{}", b),
            OwnedValue::Int(i) => write!(f, "{}", i),
            OwnedValue::Float(v) => write!(f, "{}", v),
            OwnedValue::Text(s) => write!(f, "{:?}", s),
            OwnedValue::Blob(b) => write!(f, "<{} bytes>", b.len()),
            OwnedValue::Date(d) => write!(f, "DATE({})", d),
            OwnedValue::Time(t) => write!(f, "TIME({})", t),
            OwnedValue::Timestamp(ts) => write!(f, "TIMESTAMP({})", ts),
            OwnedValue::TimestampTz(ts, offset) => write!(f, "TIMESTAMPTZ({}, {})", ts, offset),
        }
    }
}

impl From<bool> for OwnedValue {
    fn from(v: bool) -> Self {
        OwnedValue::Bool(v)
    }
}

impl From<i64> for OwnedValue {
    fn from(v: i64) -> Self {
        OwnedValue::Int(v)
    }
}

impl From<i32> for OwnedValue {
    fn from(v: i32) -> Self {
        OwnedValue::Int(v as i64)
    }
}

impl From<f64> for OwnedValue {
    fn from(v: f64) -> Self {
        OwnedValue::Float(v)
    }
}

impl From<&str> for OwnedValue {
    fn from(v: &str) -> Self {
        OwnedValue::Text(v.to_string())
    }
}

impl From<String> for OwnedValue {
    fn from(v: String) -> Self {
        OwnedValue::Text(v)
    }
}

impl From<Vec<u8>> for OwnedValue {
    fn from(v: Vec<u8>) -> Self {
        OwnedValue::Blob(v)
    }
}

impl<T: Into<OwnedValue>> From<Option<T>> for OwnedValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(OwnedValue::Null)
    }
}
