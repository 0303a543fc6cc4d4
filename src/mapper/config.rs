//! # Mapper Configuration
//!
//! `MapperConfig` is the builder for a `Mapper`'s initial settings. Both
//! strictness flags can also be flipped later on a live mapper; either way a
//! change only affects scan plans compiled afterwards.
//!
//! ## Configuration Options
//!
//! | Option               | Default | Description                                      |
//! |----------------------|---------|--------------------------------------------------|
//! | strict_column_types  | false   | Reject columns whose type differs from the field |
//! | strict_column_amount | false   | Reject columns that bind to no field             |
//! | opaque_leaf::<T>()   | chrono  | Treat a struct-shaped type as one indivisible leaf |
//!
//! ## Usage
//!
//! ```ignore
//! let mapper = MapperConfig::new()
//!     .strict_column_amount(true)
//!     .opaque_leaf::<Money>()
//!     .build();
//! ```

use std::any::TypeId;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

use super::Mapper;
use crate::reflect::Reflect;

/// Builder for a `Mapper`.
#[derive(Debug, Clone)]
pub struct MapperConfig {
    pub(super) strict_column_types: bool,
    pub(super) strict_column_amount: bool,
    pub(super) opaque_leaves: Vec<TypeId>,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl MapperConfig {
    /// Creates a configuration with both checks off and the chrono timestamp
    /// types registered as opaque leaves.
    pub fn new() -> Self {
        Self {
            strict_column_types: false,
            strict_column_amount: false,
            opaque_leaves: vec![
                TypeId::of::<NaiveDateTime>(),
                TypeId::of::<DateTime<Utc>>(),
                TypeId::of::<FixedOffset>(),
            ],
        }
    }

    /// Requires every bound column's reported type to equal the data type its
    /// field declares.
    pub fn strict_column_types(mut self, enabled: bool) -> Self {
        self.strict_column_types = enabled;
        self
    }

    /// Requires every column of a result to bind to some field.
    pub fn strict_column_amount(mut self, enabled: bool) -> Self {
        self.strict_column_amount = enabled;
        self
    }

    /// Registers `T` as an indivisible leaf: the engine never descends into it
    /// and scans the whole value from one cell.
    pub fn opaque_leaf<T: Reflect>(mut self) -> Self {
        let id = TypeId::of::<T>();
        if !self.opaque_leaves.contains(&id) {
            self.opaque_leaves.push(id);
        }
        self
    }

    pub fn build(self) -> Mapper {
        Mapper::with_config(self)
    }
}
