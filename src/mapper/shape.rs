//! Destination element classification.
//!
//! An element type is a *scalar* when, with its pointer layers removed, it is a
//! primitive, a string, a byte sequence, or a struct-shaped leaf (registered as
//! opaque or scannable from a cell). Any other struct is a *record*. Everything
//! else cannot receive a row.

use std::any::TypeId;

use hashbrown::HashSet;

use crate::error::MappingError;
use crate::reflect::{Kind, TypeInfo};

pub(crate) type OpaqueSet = HashSet<TypeId>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shape {
    Scalar,
    Record,
}

/// True for a struct-shaped type that is scanned as a whole.
pub(crate) fn is_leaf_struct(info: &TypeInfo, opaque: &OpaqueSet) -> bool {
    info.is_struct() && (info.scan_fn().is_some() || opaque.contains(&info.id()))
}

/// True for a struct whose fields are mapped individually.
pub(crate) fn is_record(info: &TypeInfo, opaque: &OpaqueSet) -> bool {
    info.is_struct() && !is_leaf_struct(info, opaque)
}

pub(crate) fn classify(info: &TypeInfo, opaque: &OpaqueSet) -> Result<Shape, MappingError> {
    let (base, _) = info.unwrap_pointers();
    match base.kind() {
        Kind::Bool | Kind::Int | Kind::Uint | Kind::Float | Kind::String | Kind::Bytes => {
            Ok(Shape::Scalar)
        }
        Kind::Struct(_) if is_leaf_struct(&base, opaque) => Ok(Shape::Scalar),
        Kind::Struct(_) => Ok(Shape::Record),
        other => Err(MappingError::UnsupportedElement {
            type_name: info.name(),
            kind: other.name(),
        }),
    }
}
