//! # Descriptor Macros
//!
//! This module provides the macros that generate `Reflect` implementations.
//!
//! ## record!
//!
//! Declares a struct and describes each of its fields so rows can be mapped
//! into it. The struct must implement `Default`, which is its zero value. A
//! field may carry `#[column = "..."]` after its doc comments to bind it to a
//! column name other than its lower-cased field name.
//!
//! ### Usage
//!
//! ```ignore
//! rowconv::record! {
//!     #[derive(Debug, Default)]
//!     pub struct Order {
//!         /// Primary key.
//!         pub id: i64,
//!         #[column = "creation_time"]
//!         pub created: chrono::NaiveDateTime,
//!         pub customer: Option<Box<Customer>>,
//!     }
//! }
//!
//! // Generates the struct unchanged, plus:
//! // impl Reflect for Order {
//! //     fn type_info() -> TypeInfo {
//! //         TypeInfo::record::<Order>(vec![
//! //             FieldInfo::new("id", None, <i64 as Reflect>::type_info, |r| ...),
//! //             FieldInfo::new("created", Some("creation_time"), ...),
//! //             FieldInfo::new("customer", None, ...),
//! //         ])
//! //     }
//! // }
//! ```
//!
//! ## reflect_leaf!
//!
//! Describes an application type that implements `FromCell` as a leaf. The
//! kind is one of `Bool`, `Int`, `Uint`, `Float`, `String`, `Bytes`, or
//! `Opaque` for struct-shaped types; the optional second argument is the
//! declared `DataType` used by strict column type checks.
//!
//! ```ignore
//! rowconv::reflect_leaf!(Cents => Int, Int8);
//! rowconv::reflect_leaf!(Money => Opaque, Decimal);
//! ```

/// Declares a record struct and its `Reflect` implementation.
#[macro_export]
macro_rules! record {
    (@column) => {
        ::std::option::Option::None
    };
    (@column $column:literal) => {
        ::std::option::Option::Some($column)
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[doc = $doc:literal])*
                $(#[column = $column:literal])?
                $fvis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[doc = $doc])*
                $fvis $field: $ty,
            )*
        }

        impl $crate::reflect::Reflect for $name {
            fn type_info() -> $crate::reflect::TypeInfo {
                $crate::reflect::TypeInfo::record::<$name>(::std::vec![
                    $(
                        $crate::reflect::FieldInfo::new(
                            ::std::stringify!($field),
                            $crate::record!(@column $($column)?),
                            <$ty as $crate::reflect::Reflect>::type_info,
                            |record| {
                                record
                                    .downcast_mut::<$name>()
                                    .map(|record| &mut record.$field as &mut dyn ::std::any::Any)
                            },
                        ),
                    )*
                ])
            }
        }
    };
}

/// Describes a `FromCell` type as a leaf of the mapping engine.
#[macro_export]
macro_rules! reflect_leaf {
    (@data_type) => {
        ::std::option::Option::None
    };
    (@data_type $data_type:ident) => {
        ::std::option::Option::Some($crate::types::DataType::$data_type)
    };
    ($t:ty => Opaque $(, $data_type:ident)?) => {
        impl $crate::reflect::Reflect for $t {
            fn type_info() -> $crate::reflect::TypeInfo {
                $crate::reflect::TypeInfo::opaque::<$t>($crate::reflect_leaf!(@data_type $($data_type)?))
            }
        }
    };
    ($t:ty => $kind:ident $(, $data_type:ident)?) => {
        impl $crate::reflect::Reflect for $t {
            fn type_info() -> $crate::reflect::TypeInfo {
                $crate::reflect::TypeInfo::leaf::<$t>(
                    $crate::reflect::Kind::$kind,
                    $crate::reflect_leaf!(@data_type $($data_type)?),
                )
            }
        }
    };
}
