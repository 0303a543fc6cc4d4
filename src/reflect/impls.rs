//! Descriptors for standard library and chrono types.

use std::any::{type_name, Any, TypeId};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::mpsc::{Receiver, Sender, SyncSender};
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, Utc};
use eyre::Result;

use super::{Kind, NewFn, PointerInfo, Reflect, TypeInfo};
use crate::error::{MappingError, ScanError};
use crate::scan::ScanFn;
use crate::types::{DataType, OwnedValue};

macro_rules! reflect_scalars {
    ($($t:ty => $kind:ident, $dt:ident);* $(;)?) => {
        $(
            impl Reflect for $t {
                fn type_info() -> TypeInfo {
                    TypeInfo::leaf::<$t>(Kind::$kind, Some(DataType::$dt))
                }
            }
        )*
    };
}

reflect_scalars! {
    bool => Bool, Bool;
    i8 => Int, Int2;
    i16 => Int, Int2;
    i32 => Int, Int4;
    i64 => Int, Int8;
    isize => Int, Int8;
    u8 => Uint, Int2;
    u16 => Uint, Int4;
    u32 => Uint, Int8;
    u64 => Uint, Int8;
    usize => Uint, Int8;
    f32 => Float, Float4;
    f64 => Float, Float8;
    String => String, Text;
}

impl Reflect for NaiveDateTime {
    fn type_info() -> TypeInfo {
        TypeInfo::opaque::<Self>(Some(DataType::Timestamp))
    }
}

impl Reflect for DateTime<Utc> {
    fn type_info() -> TypeInfo {
        TypeInfo::opaque::<Self>(Some(DataType::TimestampTz))
    }
}

impl Reflect for NaiveDate {
    fn type_info() -> TypeInfo {
        TypeInfo::opaque::<Self>(Some(DataType::Date))
    }
}

impl Reflect for NaiveTime {
    fn type_info() -> TypeInfo {
        TypeInfo::opaque::<Self>(Some(DataType::Time))
    }
}

impl Reflect for FixedOffset {
    fn type_info() -> TypeInfo {
        TypeInfo::opaque_with::<Self>(None, || Box::new(Utc.fix()) as Box<dyn Any>)
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn type_info() -> TypeInfo {
        if TypeId::of::<T>() == TypeId::of::<u8>() {
            TypeInfo::leaf::<Vec<u8>>(Kind::Bytes, Some(DataType::Blob))
        } else {
            TypeInfo::unsupported::<Self>(Kind::Sequence)
        }
    }
}

impl<T: 'static> Reflect for VecDeque<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::unsupported::<Self>(Kind::Sequence)
    }
}

impl<K: 'static, V: 'static, S: 'static> Reflect for HashMap<K, V, S> {
    fn type_info() -> TypeInfo {
        TypeInfo::unsupported::<Self>(Kind::Map)
    }
}

impl<K: 'static, V: 'static> Reflect for BTreeMap<K, V> {
    fn type_info() -> TypeInfo {
        TypeInfo::unsupported::<Self>(Kind::Map)
    }
}

impl<T: 'static, const N: usize> Reflect for [T; N] {
    fn type_info() -> TypeInfo {
        TypeInfo::unsupported::<Self>(Kind::Array)
    }
}

impl Reflect for Arc<dyn Any + Send + Sync> {
    fn type_info() -> TypeInfo {
        TypeInfo::unsupported::<Self>(Kind::Interface)
    }
}

impl Reflect for fn() {
    fn type_info() -> TypeInfo {
        TypeInfo::unsupported::<Self>(Kind::Function)
    }
}

impl<T: 'static> Reflect for Sender<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::unsupported::<Self>(Kind::Channel)
    }
}

impl<T: 'static> Reflect for SyncSender<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::unsupported::<Self>(Kind::Channel)
    }
}

impl<T: 'static> Reflect for Receiver<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::unsupported::<Self>(Kind::Channel)
    }
}

/// `Option<T>` is a nullable pointer layer. Its zero value is `None`.
impl<T: Reflect> Reflect for Option<T> {
    fn type_info() -> TypeInfo {
        let pointee = T::type_info();
        TypeInfo::pointer::<Self>(
            PointerInfo {
                pointee: T::type_info,
                deref_mut: deref_option::<T>,
                wrap: wrap_option::<T>,
                nullable: true,
            },
            Some(new_none::<T> as NewFn),
            pointee.data_type(),
            pointee.scan_fn().map(|_| scan_option::<T> as ScanFn),
        )
    }
}

/// `Box<T>` is a non-null pointer layer. Its zero value boxes the zero `T`.
impl<T: Reflect + Default> Reflect for Box<T> {
    fn type_info() -> TypeInfo {
        let pointee = T::type_info();
        TypeInfo::pointer::<Self>(
            PointerInfo {
                pointee: T::type_info,
                deref_mut: deref_box::<T>,
                wrap: wrap_box::<T>,
                nullable: false,
            },
            Some(new_box::<T> as NewFn),
            pointee.data_type(),
            pointee.scan_fn().map(|_| scan_box::<T> as ScanFn),
        )
    }
}

fn mismatch<T>() -> MappingError {
    MappingError::DescriptorMismatch {
        expected: type_name::<T>(),
    }
}

fn new_none<T: 'static>() -> Box<dyn Any> {
    Box::new(None::<T>)
}

fn new_box<T: Default + 'static>() -> Box<dyn Any> {
    Box::new(Box::<T>::default())
}

fn deref_option<T: 'static>(value: &mut dyn Any) -> Option<&mut dyn Any> {
    value
        .downcast_mut::<Option<T>>()?
        .as_mut()
        .map(|inner| inner as &mut dyn Any)
}

fn deref_box<T: 'static>(value: &mut dyn Any) -> Option<&mut dyn Any> {
    value
        .downcast_mut::<Box<T>>()
        .map(|inner| &mut **inner as &mut dyn Any)
}

fn wrap_option<T: 'static>(value: Box<dyn Any>) -> Result<Box<dyn Any>> {
    let value = value.downcast::<T>().map_err(|_| mismatch::<T>())?;
    Ok(Box::new(Some(*value)))
}

fn wrap_box<T: 'static>(value: Box<dyn Any>) -> Result<Box<dyn Any>> {
    let value = value.downcast::<T>().map_err(|_| mismatch::<T>())?;
    Ok(Box::new(value))
}

fn scan_option<T: Reflect>(dst: &mut dyn Any, cell: &OwnedValue) -> Result<()> {
    let slot = dst
        .downcast_mut::<Option<T>>()
        .ok_or_else(mismatch::<Option<T>>)?;
    if cell.is_null() {
        *slot = None;
        return Ok(());
    }

    let info = T::type_info();
    let (Some(scan), Some(new)) = (info.scan_fn(), info.new_fn()) else {
        return Err(ScanError::Unsupported {
            from: cell.kind_name(),
            into: type_name::<T>(),
        }
        .into());
    };
    let mut value = new();
    scan(value.as_mut(), cell)?;
    let value = value.downcast::<T>().map_err(|_| mismatch::<T>())?;
    *slot = Some(*value);
    Ok(())
}

fn scan_box<T: Reflect>(dst: &mut dyn Any, cell: &OwnedValue) -> Result<()> {
    let slot = dst.downcast_mut::<Box<T>>().ok_or_else(mismatch::<Box<T>>)?;
    let scan = T::type_info().scan_fn().ok_or(ScanError::Unsupported {
        from: cell.kind_name(),
        into: type_name::<T>(),
    })?;
    scan(&mut **slot, cell)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_kinds() {
        assert!(matches!(HashMap::<String, i64>::type_info().kind(), Kind::Map));
        assert!(matches!(<[i64; 4]>::type_info().kind(), Kind::Array));
        assert!(matches!(<fn()>::type_info().kind(), Kind::Function));
        assert!(matches!(Receiver::<i64>::type_info().kind(), Kind::Channel));
        assert!(matches!(
            Arc::<dyn Any + Send + Sync>::type_info().kind(),
            Kind::Interface
        ));
        assert!(HashMap::<String, i64>::type_info().new_fn().is_none());
    }

    #[test]
    fn chrono_types_are_scannable_structs() {
        let info = NaiveDateTime::type_info();
        assert!(info.is_struct());
        assert!(info.scan_fn().is_some());
        assert_eq!(info.data_type(), Some(DataType::Timestamp));

        let mut offset = FixedOffset::type_info().new_fn().unwrap()();
        (FixedOffset::type_info().scan_fn().unwrap())(
            offset.as_mut(),
            &OwnedValue::Text("+01:00".into()),
        )
        .unwrap();
        assert_eq!(
            offset.downcast_ref::<FixedOffset>(),
            FixedOffset::east_opt(3600).as_ref()
        );
    }

    #[test]
    fn pointers_expose_pointee_scan_and_type() {
        let info = Option::<i32>::type_info();
        assert_eq!(info.data_type(), Some(DataType::Int4));
        assert!(info.scan_fn().is_some());
        assert!(Option::<HashMap<i64, i64>>::type_info().scan_fn().is_none());
    }

    #[test]
    fn box_scan_writes_through() {
        let mut slot: Box<i64> = Box::default();
        (Box::<i64>::type_info().scan_fn().unwrap())(&mut slot, &OwnedValue::Int(11)).unwrap();
        assert_eq!(*slot, 11);
    }

    #[test]
    fn wrap_and_deref_round_trip() {
        let info = Option::<i64>::type_info();
        let Kind::Pointer(pointer) = info.kind() else {
            panic!("expected pointer");
        };
        let mut wrapped = (pointer.wrap)(Box::new(5i64)).unwrap();
        let inner = (pointer.deref_mut)(wrapped.as_mut()).unwrap();
        assert_eq!(inner.downcast_ref::<i64>(), Some(&5));

        let mut empty: Option<i64> = None;
        assert!((pointer.deref_mut)(&mut empty).is_none());
        assert!((pointer.wrap)(Box::new("nope")).is_err());
    }
}
