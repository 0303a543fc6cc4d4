//! # Type Descriptors
//!
//! This module provides the runtime type descriptors the mapping engine works
//! from. A `TypeInfo` describes one Rust type: its kind, the data type it
//! declares for strict column checks, and a set of type-erased operations
//! (construct a zero value, assign, dereference a pointer layer, reach a field,
//! scan a cell) that let the engine populate values it only knows as
//! `dyn Any`.
//!
//! ## Kinds
//!
//! | Kind | Rust types | Role |
//! |------|-----------|------|
//! | `Bool`, `Int`, `Uint`, `Float`, `String`, `Bytes` | primitives, `String`, `Vec<u8>` | leaf |
//! | `Pointer` | `Option<T>` (nullable), `Box<T>` | unwrapped by the engine |
//! | `Struct` | records from `record!`, opaque leaves | record or leaf |
//! | `Sequence`, `Map`, `Array`, `Interface`, `Function`, `Channel` | everything else | unsupported |
//!
//! ## Pointer Layers
//!
//! The engine models the pointer chains of nested records with `Option<Box<T>>`
//! (two layers: nullable, then owning) or `Box<T>`. Every pointer layer knows
//! how to reach its pointee (`deref_mut`) and how to wrap an owned pointee back
//! into itself (`wrap`), which is what the record provider uses to install
//! pre-allocated nested records.
//!
//! ## Describing Records
//!
//! Records get their descriptor from the `record!` macro:
//!
//! ```ignore
//! rowconv::record! {
//!     #[derive(Debug, Default, PartialEq)]
//!     pub struct Account {
//!         #[column = "id"]
//!         pub pk: i64,
//!         pub owner: Option<Box<Owner>>,
//!     }
//! }
//! ```
//!
//! Application types that scan themselves from a cell use `reflect_leaf!`.

mod impls;

use std::any::{type_name, Any, TypeId};
use std::fmt;

use eyre::Result;
use smallvec::SmallVec;

use crate::error::MappingError;
use crate::scan::{scan_into, FromCell, ScanFn};
use crate::types::DataType;

/// Allocates a zero value of the described type.
pub type NewFn = fn() -> Box<dyn Any>;
/// Moves an owned value into a slot of the described type.
pub type AssignFn = fn(&mut dyn Any, Box<dyn Any>) -> Result<()>;
/// Reaches a field or a pointee; None for an unset nullable pointer.
pub type AccessFn = fn(&mut dyn Any) -> Option<&mut dyn Any>;
/// Wraps an owned pointee into one pointer layer.
pub type WrapFn = fn(Box<dyn Any>) -> Result<Box<dyn Any>>;

/// Types the mapping engine can describe.
pub trait Reflect: 'static {
    fn type_info() -> TypeInfo;
}

/// Descriptor of one Rust type.
#[derive(Clone)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
    kind: Kind,
    data_type: Option<DataType>,
    new: Option<NewFn>,
    assign: AssignFn,
    scan: Option<ScanFn>,
}

#[derive(Clone)]
pub enum Kind {
    Bool,
    Int,
    Uint,
    Float,
    String,
    Bytes,
    Pointer(PointerInfo),
    Struct(StructInfo),
    Sequence,
    Map,
    Array,
    Interface,
    Function,
    Channel,
}

#[derive(Clone)]
pub struct PointerInfo {
    pub pointee: fn() -> TypeInfo,
    pub deref_mut: AccessFn,
    pub wrap: WrapFn,
    pub nullable: bool,
}

/// Fields of a struct-shaped type. Opaque leaves expose none.
#[derive(Clone, Default)]
pub struct StructInfo {
    fields: Vec<FieldInfo>,
}

#[derive(Clone)]
pub struct FieldInfo {
    name: &'static str,
    column: Option<&'static str>,
    ty: fn() -> TypeInfo,
    get_mut: AccessFn,
}

impl TypeInfo {
    /// Descriptor for a scalar leaf scanned through `FromCell`.
    pub fn leaf<T: FromCell + Default + 'static>(kind: Kind, data_type: Option<DataType>) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            kind,
            data_type,
            new: Some(new_default::<T>),
            assign: assign::<T>,
            scan: Some(scan_into::<T>),
        }
    }

    /// Descriptor for a struct-shaped type that is scanned as a whole.
    pub fn opaque<T: FromCell + Default + 'static>(data_type: Option<DataType>) -> Self {
        Self::opaque_with::<T>(data_type, new_default::<T>)
    }

    /// Like `opaque`, for types without a `Default` zero value.
    pub fn opaque_with<T: FromCell + 'static>(data_type: Option<DataType>, new: NewFn) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            kind: Kind::Struct(StructInfo::default()),
            data_type,
            new: Some(new),
            assign: assign::<T>,
            scan: Some(scan_into::<T>),
        }
    }

    /// Descriptor for a record whose fields are mapped individually.
    pub fn record<T: Default + 'static>(fields: Vec<FieldInfo>) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            kind: Kind::Struct(StructInfo { fields }),
            data_type: None,
            new: Some(new_default::<T>),
            assign: assign::<T>,
            scan: None,
        }
    }

    /// Descriptor for a pointer layer.
    pub fn pointer<T: 'static>(
        pointer: PointerInfo,
        new: Option<NewFn>,
        data_type: Option<DataType>,
        scan: Option<ScanFn>,
    ) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            kind: Kind::Pointer(pointer),
            data_type,
            new,
            assign: assign::<T>,
            scan,
        }
    }

    /// Descriptor for a type no row can be mapped into.
    pub fn unsupported<T: 'static>(kind: Kind) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            kind,
            data_type: None,
            new: None,
            assign: assign::<T>,
            scan: None,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Data type this type declares for strict column checks.
    pub fn data_type(&self) -> Option<DataType> {
        self.data_type
    }

    pub fn new_fn(&self) -> Option<NewFn> {
        self.new
    }

    pub fn assign_fn(&self) -> AssignFn {
        self.assign
    }

    pub fn scan_fn(&self) -> Option<ScanFn> {
        self.scan
    }

    /// Follows pointer layers down to the first non-pointer type. Returns that
    /// type and the traversed layers, outermost first.
    pub fn unwrap_pointers(&self) -> (TypeInfo, SmallVec<[PointerInfo; 2]>) {
        let mut layers = SmallVec::new();
        let mut current = self.clone();
        while let Kind::Pointer(pointer) = &current.kind {
            layers.push(pointer.clone());
            current = (pointer.pointee)();
        }
        (current, layers)
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.kind, Kind::Struct(_))
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("data_type", &self.data_type)
            .field("scannable", &self.scan.is_some())
            .finish()
    }
}

impl Kind {
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Uint => "uint",
            Kind::Float => "float",
            Kind::String => "string",
            Kind::Bytes => "bytes",
            Kind::Pointer(_) => "pointer",
            Kind::Struct(_) => "struct",
            Kind::Sequence => "sequence",
            Kind::Map => "map",
            Kind::Array => "array",
            Kind::Interface => "interface",
            Kind::Function => "function",
            Kind::Channel => "channel",
        }
    }
}

impl fmt::Debug for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Pointer(pointer) => f
                .debug_struct("Pointer")
                .field("pointee", &(pointer.pointee)().name)
                .field("nullable", &pointer.nullable)
                .finish(),
            Kind::Struct(info) => f
                .debug_struct("Struct")
                .field("fields", &info.fields)
                .finish(),
            other => f.write_str(other.name()),
        }
    }
}

impl StructInfo {
    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }
}

impl FieldInfo {
    pub fn new(
        name: &'static str,
        column: Option<&'static str>,
        ty: fn() -> TypeInfo,
        get_mut: AccessFn,
    ) -> Self {
        Self {
            name,
            column,
            ty,
            get_mut,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Explicit column binding override.
    pub fn column(&self) -> Option<&'static str> {
        self.column
    }

    pub fn type_info(&self) -> TypeInfo {
        (self.ty)()
    }

    pub fn get_mut_fn(&self) -> AccessFn {
        self.get_mut
    }
}

impl fmt::Debug for FieldInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldInfo")
            .field("name", &self.name)
            .field("column", &self.column)
            .finish()
    }
}

fn new_default<T: Default + 'static>() -> Box<dyn Any> {
    Box::new(T::default())
}

fn assign<T: 'static>(slot: &mut dyn Any, value: Box<dyn Any>) -> Result<()> {
    let mismatch = || MappingError::DescriptorMismatch {
        expected: type_name::<T>(),
    };
    let slot = slot.downcast_mut::<T>().ok_or_else(mismatch)?;
    let value = value.downcast::<T>().map_err(|_| mismatch())?;
    *slot = *value;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OwnedValue;

    crate::record! {
        #[derive(Debug, Default, PartialEq)]
        struct Inner {
            value: i64,
        }
    }

    crate::record! {
        #[derive(Debug, Default, PartialEq)]
        struct Outer {
            #[column = "ident"]
            id: i64,
            inner: Option<Box<Inner>>,
        }
    }

    #[test]
    fn scalar_descriptors() {
        let info = i64::type_info();
        assert!(matches!(info.kind(), Kind::Int));
        assert_eq!(info.data_type(), Some(DataType::Int8));
        assert!(info.scan_fn().is_some());

        let bytes = Vec::<u8>::type_info();
        assert!(matches!(bytes.kind(), Kind::Bytes));
        assert!(matches!(Vec::<i64>::type_info().kind(), Kind::Sequence));
    }

    #[test]
    fn record_descriptor_lists_fields_in_order() {
        let info = Outer::type_info();
        let Kind::Struct(record) = info.kind() else {
            panic!("expected struct kind, got {:?}", info.kind());
        };
        let names: Vec<_> = record.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["id", "inner"]);
        assert_eq!(record.fields()[0].column(), Some("ident"));
        assert_eq!(record.fields()[1].column(), None);
        assert!(info.scan_fn().is_none());
    }

    #[test]
    fn unwrap_pointers_reports_layers_outermost_first() {
        let (base, layers) = Option::<Box<Inner>>::type_info().unwrap_pointers();
        assert_eq!(base.id(), TypeId::of::<Inner>());
        assert_eq!(layers.len(), 2);
        assert!(layers[0].nullable);
        assert!(!layers[1].nullable);
    }

    #[test]
    fn field_access_and_assign_through_erased_values() {
        let mut outer = Outer::default();
        let info = Outer::type_info();
        let Kind::Struct(record) = info.kind() else {
            panic!("expected struct kind");
        };

        let id = (record.fields()[0].get_mut_fn())(&mut outer).unwrap();
        (i64::type_info().scan_fn().unwrap())(id, &OwnedValue::Int(9)).unwrap();
        assert_eq!(outer.id, 9);

        let inner_field = (record.fields()[1].get_mut_fn())(&mut outer).unwrap();
        let fresh: Box<dyn Any> = Box::new(Some(Box::new(Inner { value: 3 })));
        (Option::<Box<Inner>>::type_info().assign_fn())(inner_field, fresh).unwrap();
        assert_eq!(outer.inner, Some(Box::new(Inner { value: 3 })));
    }

    #[test]
    fn assign_rejects_wrong_type() {
        let mut slot = 0i64;
        let err = (i64::type_info().assign_fn())(&mut slot, Box::new("x".to_string())).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MappingError>(),
            Some(MappingError::DescriptorMismatch { .. })
        ));
    }

    #[test]
    fn option_scan_maps_null() {
        let scan = Option::<String>::type_info().scan_fn().unwrap();
        let mut slot: Option<String> = Some("old".into());
        scan(&mut slot, &OwnedValue::Null).unwrap();
        assert_eq!(slot, None);
        scan(&mut slot, &OwnedValue::Text("b".into())).unwrap();
        assert_eq!(slot.as_deref(), Some("b"));
    }
}
