//! # Scan Capability
//!
//! This module provides `FromCell`, the conversion of one raw cell into a typed
//! destination. The mapping engine treats it as an opaque capability: a cell
//! either converts into the destination's type or the row fails with a
//! `ScanError`.
//!
//! ## Conversion Rules
//!
//! | Destination | Accepted cells |
//! |-------------|----------------|
//! | integers | `Int` (range-checked), `Bool`, integral `Float`, decimal `Text`/`Blob` |
//! | `f32`, `f64` | `Int`, `Float`, numeric `Text` |
//! | `bool` | `Bool`, `Int` 0/1, `Text` (`1/0/t/f/true/false`) |
//! | `String` | `Text`, UTF-8 `Blob`, `Int`, `Float`, `Bool` |
//! | `Vec<u8>` | `Blob`, `Text` |
//! | chrono types | temporal cells or ISO 8601 `Text` (see `temporal`) |
//! | `Option<T>` | `Null` → `None`, anything else through `T` |
//!
//! `Null` into any non-`Option` destination fails with `ScanError::NullInto`.
//!
//! ## Custom Leaves
//!
//! Implementing `FromCell` for an application type makes it scannable. Pair it
//! with `reflect_leaf!` so the mapping engine treats the type as a leaf instead
//! of descending into it:
//!
//! ```ignore
//! #[derive(Debug, Default, PartialEq)]
//! struct Cents(i64);
//!
//! impl FromCell for Cents {
//!     fn from_cell(cell: &OwnedValue) -> Result<Self, ScanError> {
//!         i64::from_cell(cell).map(Cents)
//!     }
//! }
//!
//! rowconv::reflect_leaf!(Cents => Int, Int8);
//! ```

mod temporal;

use std::any::{type_name, Any};

use eyre::Result;

use crate::error::{MappingError, ScanError};
use crate::types::OwnedValue;

/// Conversion of a raw cell into a typed value.
pub trait FromCell: Sized {
    fn from_cell(cell: &OwnedValue) -> Result<Self, ScanError>;
}

/// Type-erased scan entry point stored in descriptors.
pub type ScanFn = fn(&mut dyn Any, &OwnedValue) -> Result<()>;

/// Scans `cell` into `dst`, which must hold a `T`.
pub fn scan_into<T: FromCell + 'static>(dst: &mut dyn Any, cell: &OwnedValue) -> Result<()> {
    let slot = dst
        .downcast_mut::<T>()
        .ok_or(MappingError::DescriptorMismatch {
            expected: type_name::<T>(),
        })?;
    *slot = T::from_cell(cell)?;
    Ok(())
}

fn text_of<'a>(cell: &'a OwnedValue, into: &'static str) -> Result<&'a str, ScanError> {
    match cell {
        OwnedValue::Text(s) => Ok(s),
        OwnedValue::Blob(b) => std::str::from_utf8(b).map_err(|e| ScanError::Parse {
            value: format!("<{} bytes>", b.len()),
            into,
            reason: e.to_string(),
        }),
        other => Err(ScanError::Unsupported {
            from: other.kind_name(),
            into,
        }),
    }
}

macro_rules! impl_from_cell_int {
    ($($t:ty),* $(,)?) => {
        $(
            impl FromCell for $t {
                fn from_cell(cell: &OwnedValue) -> Result<Self, ScanError> {
                    let into = stringify!($t);
                    match cell {
                        OwnedValue::Int(i) => <$t>::try_from(*i).map_err(|_| ScanError::OutOfRange {
                            value: i.to_string(),
                            into,
                        }),
                        OwnedValue::Bool(b) => Ok(<$t>::from(*b)),
                        OwnedValue::Float(f) if f.is_finite() && f.fract() == 0.0 => {
                            <$t>::try_from(*f as i128).map_err(|_| ScanError::OutOfRange {
                                value: f.to_string(),
                                into,
                            })
                        }
                        OwnedValue::Text(_) | OwnedValue::Blob(_) => {
                            let text = text_of(cell, into)?;
                            text.trim().parse::<$t>().map_err(|e| ScanError::Parse {
                                value: text.to_string(),
                                into,
                                reason: e.to_string(),
                            })
                        }
                        OwnedValue::Null => Err(ScanError::NullInto { into }),
                        other => Err(ScanError::Unsupported {
                            from: other.kind_name(),
                            into,
                        }),
                    }
                }
            }
        )*
    };
}

impl_from_cell_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! impl_from_cell_float {
    ($($t:ty),* $(,)?) => {
        $(
            impl FromCell for $t {
                fn from_cell(cell: &OwnedValue) -> Result<Self, ScanError> {
                    let into = stringify!($t);
                    match cell {
                        OwnedValue::Float(f) => Ok(*f as $t),
                        OwnedValue::Int(i) => Ok(*i as $t),
                        OwnedValue::Text(_) | OwnedValue::Blob(_) => {
                            let text = text_of(cell, into)?;
                            text.trim().parse::<$t>().map_err(|e| ScanError::Parse {
                                value: text.to_string(),
                                into,
                                reason: e.to_string(),
                            })
                        }
                        OwnedValue::Null => Err(ScanError::NullInto { into }),
                        other => Err(ScanError::Unsupported {
                            from: other.kind_name(),
                            into,
                        }),
                    }
                }
            }
        )*
    };
}

impl_from_cell_float!(f32, f64);

impl FromCell for bool {
    fn from_cell(cell: &OwnedValue) -> Result<Self, ScanError> {
        let into = "bool";
        match cell {
            OwnedValue::Bool(b) => Ok(*b),
            OwnedValue::Int(0) => Ok(false),
            OwnedValue::Int(1) => Ok(true),
            OwnedValue::Int(i) => Err(ScanError::OutOfRange {
                value: i.to_string(),
                into,
            }),
            OwnedValue::Text(_) | OwnedValue::Blob(_) => {
                let text = text_of(cell, into)?;
                match text.trim() {
                    "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
                    "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
                    other => Err(ScanError::Parse {
                        value: other.to_string(),
                        into,
                        reason: "invalid syntax".to_string(),
                    }),
                }
            }
            OwnedValue::Null => Err(ScanError::NullInto { into }),
            other => Err(ScanError::Unsupported {
                from: other.kind_name(),
                into,
            }),
        }
    }
}

impl FromCell for String {
    fn from_cell(cell: &OwnedValue) -> Result<Self, ScanError> {
        let into = "String";
        match cell {
            OwnedValue::Text(s) => Ok(s.clone()),
            OwnedValue::Blob(_) => text_of(cell, into).map(str::to_string),
            OwnedValue::Int(i) => Ok(i.to_string()),
            OwnedValue::Float(f) => Ok(f.to_string()),
            OwnedValue::Bool(b) => Ok(b.to_string()),
            OwnedValue::Null => Err(ScanError::NullInto { into }),
            other => Err(ScanError::Unsupported {
                from: other.kind_name(),
                into,
            }),
        }
    }
}

impl FromCell for Vec<u8> {
    fn from_cell(cell: &OwnedValue) -> Result<Self, ScanError> {
        let into = "Vec<u8>";
        match cell {
            OwnedValue::Blob(b) => Ok(b.clone()),
            OwnedValue::Text(s) => Ok(s.as_bytes().to_vec()),
            OwnedValue::Null => Err(ScanError::NullInto { into }),
            other => Err(ScanError::Unsupported {
                from: other.kind_name(),
                into,
            }),
        }
    }
}

impl<T: FromCell> FromCell for Option<T> {
    fn from_cell(cell: &OwnedValue) -> Result<Self, ScanError> {
        match cell {
            OwnedValue::Null => Ok(None),
            other => T::from_cell(other).map(Some),
        }
    }
}

impl<T: FromCell> FromCell for Box<T> {
    fn from_cell(cell: &OwnedValue) -> Result<Self, ScanError> {
        T::from_cell(cell).map(Box::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_from_int_with_range_check() {
        assert_eq!(i64::from_cell(&OwnedValue::Int(42)).unwrap(), 42);
        assert_eq!(u8::from_cell(&OwnedValue::Int(255)).unwrap(), 255);
        assert!(matches!(
            u8::from_cell(&OwnedValue::Int(256)),
            Err(ScanError::OutOfRange { .. })
        ));
        assert!(matches!(
            u32::from_cell(&OwnedValue::Int(-1)),
            Err(ScanError::OutOfRange { .. })
        ));
    }

    #[test]
    fn integers_from_text_float_and_bool() {
        assert_eq!(i32::from_cell(&OwnedValue::Text(" 17 ".into())).unwrap(), 17);
        assert_eq!(i64::from_cell(&OwnedValue::Blob(b"9".to_vec())).unwrap(), 9);
        assert_eq!(i64::from_cell(&OwnedValue::Float(3.0)).unwrap(), 3);
        assert_eq!(i16::from_cell(&OwnedValue::Bool(true)).unwrap(), 1);
        assert!(matches!(
            i64::from_cell(&OwnedValue::Float(3.5)),
            Err(ScanError::Unsupported { .. })
        ));
        assert!(matches!(
            i64::from_cell(&OwnedValue::Text("abc".into())),
            Err(ScanError::Parse { .. })
        ));
    }

    #[test]
    fn null_into_non_option_fails() {
        assert_eq!(
            i64::from_cell(&OwnedValue::Null),
            Err(ScanError::NullInto { into: "i64" })
        );
        assert!(String::from_cell(&OwnedValue::Null).is_err());
    }

    #[test]
    fn option_maps_null_to_none() {
        assert_eq!(Option::<String>::from_cell(&OwnedValue::Null).unwrap(), None);
        assert_eq!(
            Option::<String>::from_cell(&OwnedValue::Text("b".into())).unwrap(),
            Some("b".to_string())
        );
    }

    #[test]
    fn floats_and_bools() {
        assert_eq!(f64::from_cell(&OwnedValue::Int(2)).unwrap(), 2.0);
        assert_eq!(f32::from_cell(&OwnedValue::Text("1.5".into())).unwrap(), 1.5);
        assert!(bool::from_cell(&OwnedValue::Text("t".into())).unwrap());
        assert!(!bool::from_cell(&OwnedValue::Int(0)).unwrap());
        assert!(bool::from_cell(&OwnedValue::Int(2)).is_err());
    }

    #[test]
    fn strings_and_bytes() {
        assert_eq!(String::from_cell(&OwnedValue::Int(5)).unwrap(), "5");
        assert_eq!(
            String::from_cell(&OwnedValue::Blob(b"abc".to_vec())).unwrap(),
            "abc"
        );
        assert!(String::from_cell(&OwnedValue::Blob(vec![0xff, 0xfe])).is_err());
        assert_eq!(
            Vec::<u8>::from_cell(&OwnedValue::Text("a".into())).unwrap(),
            b"a".to_vec()
        );
    }

    #[test]
    fn erased_scan_checks_destination_type() {
        let mut value: i64 = 0;
        scan_into::<i64>(&mut value, &OwnedValue::Int(7)).unwrap();
        assert_eq!(value, 7);

        let mut wrong = String::new();
        let err = scan_into::<i64>(&mut wrong, &OwnedValue::Int(7)).unwrap_err();
        assert!(err.downcast_ref::<MappingError>().is_some());
    }
}
