//! # Mapping Engine
//!
//! This module provides `Mapper`, which turns a row stream into values of a
//! destination element type and appends them to a caller-provided container.
//!
//! ## Pipeline
//!
//! ```text
//! propagate::<T>(dst, rows)
//!   │
//!   ├─ shape::classify(T) ──────────────► UnsupportedElement
//!   │
//!   ├─ Scalar ─► driver::drive_scalars   one cell per row into a fresh T
//!   │
//!   └─ Record ─► plan cache lookup(T, columns)
//!                  │ miss: accessor::resolve + provider cache + ScanPlan::compile
//!                  ▼
//!                driver::drive_records   provider, deref, scan bound cells
//!   │
//!   └─ driver::finish                     close the stream on every path
//! ```
//!
//! ## Module Structure
//!
//! - `config`: `MapperConfig` builder
//! - `shape`: scalar/record classification of element types
//! - `accessor`: column name to field path tables
//! - `provider`: cached factories for pre-allocated records
//! - `plan`: compiled scan plans and their cache
//! - `driver`: row iteration and stream shutdown
//!
//! ## Shared State
//!
//! | State | Protection | Lifetime |
//! |-------|------------|----------|
//! | strictness flags | `AtomicBool` | read at each plan compilation |
//! | opaque leaf set | `RwLock` | grows only |
//! | record providers | `RwLock`, per full type | never evicted |
//! | scan plans | `RwLock`, per type then signature | never evicted |
//!
//! Changing a strictness flag does not touch plans that are already cached: a
//! signature compiled leniently stays lenient for the life of the mapper.

mod accessor;
mod config;
mod driver;
mod plan;
mod provider;
mod shape;

pub use config::MapperConfig;

use std::any::TypeId;
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use eyre::Result;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::reflect::{Reflect, TypeInfo};
use crate::rows::RowStream;
use crate::types::ColumnType;
use plan::{CompileOptions, PlanCache, ScanPlan};
use provider::ProviderCache;
use shape::{OpaqueSet, Shape};

/// A growable container that receives mapped elements in row order.
pub trait Destination<T> {
    fn push_element(&mut self, value: T);
}

impl<T> Destination<T> for Vec<T> {
    fn push_element(&mut self, value: T) {
        self.push(value);
    }
}

impl<T> Destination<T> for VecDeque<T> {
    fn push_element(&mut self, value: T) {
        self.push_back(value);
    }
}

/// Registry of mapping settings and caches.
pub struct Mapper {
    strict_column_types: AtomicBool,
    strict_column_amount: AtomicBool,
    opaque: RwLock<OpaqueSet>,
    providers: ProviderCache,
    plans: PlanCache,
}

static GLOBAL: OnceLock<Mapper> = OnceLock::new();

impl Default for Mapper {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Mapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapper")
            .field("strict_column_types", &self.strict_column_types())
            .field("strict_column_amount", &self.strict_column_amount())
            .field("opaque_leaves", &self.opaque.read().len())
            .field("providers", &self.providers.len())
            .finish()
    }
}

impl Mapper {
    pub fn new() -> Self {
        Self::with_config(MapperConfig::new())
    }

    pub fn with_config(config: MapperConfig) -> Self {
        Self {
            strict_column_types: AtomicBool::new(config.strict_column_types),
            strict_column_amount: AtomicBool::new(config.strict_column_amount),
            opaque: RwLock::new(config.opaque_leaves.into_iter().collect()),
            providers: ProviderCache::default(),
            plans: PlanCache::default(),
        }
    }

    /// Process-wide mapper behind the crate's free functions.
    pub fn global() -> &'static Mapper {
        GLOBAL.get_or_init(Mapper::new)
    }

    pub fn strict_column_types(&self) -> bool {
        self.strict_column_types.load(Ordering::Acquire)
    }

    pub fn strict_column_amount(&self) -> bool {
        self.strict_column_amount.load(Ordering::Acquire)
    }

    /// Applies to plans compiled after the call.
    pub fn set_strict_column_types(&self, enabled: bool) {
        self.strict_column_types.store(enabled, Ordering::Release);
    }

    /// Applies to plans compiled after the call.
    pub fn set_strict_column_amount(&self, enabled: bool) {
        self.strict_column_amount.store(enabled, Ordering::Release);
    }

    /// Treats `T` as an indivisible leaf from now on.
    pub fn register_opaque_leaf<T: Reflect>(&self) {
        if self.opaque.write().insert(TypeId::of::<T>()) {
            debug!(type_name = std::any::type_name::<T>(), "registered opaque leaf");
        }
    }

    pub fn is_opaque_leaf<T: Reflect>(&self) -> bool {
        self.opaque.read().contains(&TypeId::of::<T>())
    }

    /// Maps every row of `rows` into a `T` and appends it to `dst`.
    ///
    /// Rows appended before a failure stay in `dst`. `rows` is closed on every
    /// path; pass `&mut stream` to keep using the stream afterwards.
    pub fn propagate<T, D, R>(&self, dst: &mut D, mut rows: R) -> Result<()>
    where
        T: Reflect,
        D: Destination<T> + ?Sized,
        R: RowStream,
    {
        let result = self.drive::<T, D, R>(dst, &mut rows);
        driver::finish(result, &mut rows)
    }

    /// Number of scan plans cached for element type `T`.
    pub fn cached_plan_count<T: Reflect>(&self) -> usize {
        self.plans.count(TypeId::of::<T>())
    }

    /// Number of record providers cached across all types.
    pub fn cached_provider_count(&self) -> usize {
        self.providers.len()
    }

    fn drive<T, D, R>(&self, dst: &mut D, rows: &mut R) -> Result<()>
    where
        T: Reflect,
        D: Destination<T> + ?Sized,
        R: RowStream,
    {
        let info = T::type_info();
        let shape = shape::classify(&info, &self.opaque.read())?;
        match shape {
            Shape::Scalar => driver::drive_scalars::<T, D, R>(&info, dst, rows),
            Shape::Record => {
                let columns = rows.columns()?;
                let plan = self.plan_for(&info, &columns)?;
                driver::drive_records::<T, D, R>(&plan, dst, rows)
            }
        }
    }

    fn plan_for(&self, info: &TypeInfo, columns: &[ColumnType]) -> Result<Arc<ScanPlan>> {
        if let Some(plan) = self.plans.lookup(info.id(), columns) {
            trace!(type_name = info.name(), "scan plan cache hit");
            return Ok(plan);
        }

        let options = CompileOptions {
            strict_types: self.strict_column_types(),
            strict_amount: self.strict_column_amount(),
        };
        let plan = {
            let opaque = self.opaque.read();
            let accessors = accessor::resolve(info, &opaque)?;
            let provider = self.providers.get_or_build(info, &opaque)?;
            ScanPlan::compile(info, columns, provider, &accessors, options)?
        };
        debug!(
            type_name = info.name(),
            columns = columns.len(),
            bound = plan.bound_count(),
            strict_types = options.strict_types,
            strict_amount = options.strict_amount,
            "compiled scan plan"
        );
        Ok(self.plans.insert(info.id(), plan))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MappingError;
    use crate::rows::MemoryRows;
    use crate::types::{DataType, OwnedValue};

    crate::record! {
        #[derive(Debug, Default, PartialEq)]
        struct Pair {
            key: String,
            value: i64,
        }
    }

    fn pair_rows() -> MemoryRows {
        MemoryRows::new(vec![
            ColumnType::new("KEY", DataType::Text),
            ColumnType::new("Value", DataType::Int8),
        ])
        .with_row(vec![OwnedValue::Text("a".into()), OwnedValue::Int(1)])
        .with_row(vec![OwnedValue::Text("b".into()), OwnedValue::Int(2)])
    }

    #[test]
    fn records_map_case_insensitively() {
        let mapper = Mapper::new();
        let mut out: Vec<Pair> = Vec::new();
        mapper.propagate(&mut out, pair_rows()).unwrap();
        assert_eq!(
            out,
            vec![
                Pair {
                    key: "a".into(),
                    value: 1
                },
                Pair {
                    key: "b".into(),
                    value: 2
                },
            ]
        );
    }

    #[test]
    fn plans_are_reused_per_signature() {
        let mapper = Mapper::new();
        let mut out: Vec<Pair> = Vec::new();
        mapper.propagate(&mut out, pair_rows()).unwrap();
        mapper.propagate(&mut out, pair_rows()).unwrap();
        assert_eq!(mapper.cached_plan_count::<Pair>(), 1);
        assert_eq!(mapper.cached_provider_count(), 1);
        assert_eq!(out.len(), 4);

        let narrow = MemoryRows::new(vec![ColumnType::new("key", DataType::Text)])
            .with_row(vec![OwnedValue::Text("c".into())]);
        mapper.propagate(&mut out, narrow).unwrap();
        assert_eq!(mapper.cached_plan_count::<Pair>(), 2);
        assert_eq!(out[4].value, 0);
    }

    #[test]
    fn strictness_applies_to_later_compilations_only() {
        let mapper = Mapper::new();
        let wide = || {
            MemoryRows::new(vec![
                ColumnType::new("key", DataType::Text),
                ColumnType::new("other", DataType::Text),
            ])
            .with_row(vec![OwnedValue::Text("k".into()), OwnedValue::Text("x".into())])
        };

        let mut out: Vec<Pair> = Vec::new();
        mapper.propagate(&mut out, wide()).unwrap();
        mapper.set_strict_column_amount(true);
        mapper.propagate(&mut out, wide()).unwrap();
        assert_eq!(out.len(), 2);

        let fresh = MapperConfig::new().strict_column_amount(true).build();
        let mut strict_out: Vec<Pair> = Vec::new();
        let err = fresh.propagate(&mut strict_out, wide()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MappingError>(),
            Some(MappingError::UnmappedColumn { .. })
        ));
        assert!(strict_out.is_empty());
        assert_eq!(fresh.cached_plan_count::<Pair>(), 0);
    }

    #[test]
    fn unsupported_element_closes_stream() {
        let mapper = Mapper::new();
        let mut rows = pair_rows();
        let mut out: Vec<Vec<String>> = Vec::new();
        let err = mapper.propagate(&mut out, &mut rows).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MappingError>(),
            Some(MappingError::UnsupportedElement { .. })
        ));
        assert!(rows.is_closed());
        assert_eq!(rows.remaining(), 2);
    }

    #[test]
    fn registered_opaque_leaf_is_scanned_whole() {
        let mapper = Mapper::new();
        assert!(mapper.is_opaque_leaf::<chrono::NaiveDateTime>());
        mapper.register_opaque_leaf::<Pair>();
        assert!(mapper.is_opaque_leaf::<Pair>());

        let rows = MemoryRows::new(vec![ColumnType::new("key", DataType::Text)])
            .with_row(vec![OwnedValue::Text("a".into())]);
        let mut out: Vec<Pair> = Vec::new();
        let err = mapper.propagate(&mut out, rows).unwrap_err();
        assert!(err.downcast_ref::<crate::error::ScanError>().is_some());
    }

    #[test]
    fn plan_for_returns_the_plan_that_won_the_insert() {
        let mapper = Mapper::new();
        let info = Pair::type_info();
        let columns = pair_rows().columns().unwrap();

        let first = mapper.plan_for(&info, &columns).unwrap();

        let racing = {
            let opaque = mapper.opaque.read();
            let accessors = accessor::resolve(&info, &opaque).unwrap();
            let provider = mapper.providers.get_or_build(&info, &opaque).unwrap();
            ScanPlan::compile(&info, &columns, provider, &accessors, CompileOptions::default())
                .unwrap()
        };
        let kept = mapper.plans.insert(info.id(), racing);
        assert!(Arc::ptr_eq(&first, &kept));

        let again = mapper.plan_for(&info, &columns).unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(mapper.cached_plan_count::<Pair>(), 1);
    }

    #[test]
    fn vec_deque_destination() {
        let mapper = Mapper::new();
        let mut out: VecDeque<Pair> = VecDeque::new();
        mapper.propagate(&mut out, pair_rows()).unwrap();
        assert_eq!(out.front().map(|p| p.value), Some(1));
    }
}
