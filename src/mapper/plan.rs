//! # Scan Plans
//!
//! A scan plan is compiled once per (element type, column signature) and says,
//! for every column position, which leaf field receives the cell, or that the
//! cell is dropped.
//!
//! ## Compilation
//!
//! | Column lookup | amount check off | amount check on |
//! |---------------|------------------|-----------------|
//! | field found   | bind to field    | bind to field   |
//! | no field      | discard          | `UnmappedColumn` |
//!
//! With the type check on, a bound column whose reported type differs from the
//! data type its field declares fails with `ColumnTypeMismatch`. Nullability is
//! not part of the comparison: `Option<i64>` declares the same type as `i64`.
//!
//! ## Cache
//!
//! Plans are grouped per element `TypeId` and matched linearly by signature.
//! Lookups take the shared lock; a miss compiles outside the lock and inserts
//! under the exclusive lock after re-checking, so racing first uses end up
//! sharing one plan. Failed compilations are never cached and plans are never
//! evicted.

use std::any::{Any, TypeId};
use std::sync::Arc;

use eyre::{Result, WrapErr};
use hashbrown::HashMap;
use parking_lot::RwLock;
use smallvec::SmallVec;

use super::accessor::{AccessorTable, Step};
use super::provider::RecordProvider;
use crate::error::{MappingError, ScanError};
use crate::reflect::{AccessFn, TypeInfo};
use crate::scan::ScanFn;
use crate::types::{signatures_match, ColumnType, OwnedValue};

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CompileOptions {
    pub strict_types: bool,
    pub strict_amount: bool,
}

pub(crate) enum Binding {
    Field(FieldBinding),
    Discard,
}

pub(crate) struct FieldBinding {
    field_type: &'static str,
    steps: SmallVec<[Step; 4]>,
    scan: Option<ScanFn>,
}

impl FieldBinding {
    /// Walks from the record root to the bound leaf field.
    fn reach<'a>(&self, root: &'a mut dyn Any, record: &'static str) -> Result<&'a mut dyn Any> {
        let mut current = root;
        for step in &self.steps {
            current = (step.get)(current).ok_or(MappingError::DescriptorMismatch {
                expected: record,
            })?;
            for deref in &step.derefs {
                current = deref(current).ok_or(MappingError::NilPointer {
                    type_name: record,
                    field: step.field,
                })?;
            }
        }
        Ok(current)
    }
}

pub(crate) struct ScanPlan {
    type_name: &'static str,
    columns: Vec<ColumnType>,
    provider: Arc<RecordProvider>,
    element_derefs: SmallVec<[AccessFn; 2]>,
    bindings: Vec<Binding>,
}

impl ScanPlan {
    pub(crate) fn compile(
        info: &TypeInfo,
        columns: &[ColumnType],
        provider: Arc<RecordProvider>,
        accessors: &AccessorTable,
        options: CompileOptions,
    ) -> Result<Self, MappingError> {
        let mut bindings = Vec::with_capacity(columns.len());
        for column in columns {
            let Some(accessor) = accessors.get(&column.normalized_name()) else {
                if options.strict_amount {
                    return Err(MappingError::UnmappedColumn {
                        column: column.name().to_string(),
                    });
                }
                bindings.push(Binding::Discard);
                continue;
            };

            if options.strict_types && accessor.field_type.data_type() != Some(column.data_type())
            {
                return Err(MappingError::ColumnTypeMismatch {
                    column: column.name().to_string(),
                    field_type: accessor.field_type.name(),
                    column_type: column.data_type(),
                });
            }

            bindings.push(Binding::Field(FieldBinding {
                field_type: accessor.field_type.name(),
                steps: accessor.steps.clone(),
                scan: accessor.field_type.scan_fn(),
            }));
        }

        let (_, layers) = info.unwrap_pointers();
        Ok(Self {
            type_name: info.name(),
            columns: columns.to_vec(),
            provider,
            element_derefs: layers.iter().map(|layer| layer.deref_mut).collect(),
            bindings,
        })
    }

    pub(crate) fn columns(&self) -> &[ColumnType] {
        &self.columns
    }

    pub(crate) fn bound_count(&self) -> usize {
        self.bindings
            .iter()
            .filter(|binding| matches!(binding, Binding::Field(_)))
            .count()
    }

    /// Builds one element from the cells of a row.
    pub(crate) fn materialize(&self, cells: &[OwnedValue]) -> Result<Box<dyn Any>> {
        if cells.len() != self.bindings.len() {
            return Err(MappingError::ColumnCount {
                expected: cells.len(),
                actual: self.bindings.len(),
            }
            .into());
        }

        let mut element = self.provider.provide()?;
        let record = self.provider.type_name();
        let mut root: &mut dyn Any = element.as_mut();
        for deref in &self.element_derefs {
            root = deref(root).ok_or(MappingError::NilPointer {
                type_name: record,
                field: "*",
            })?;
        }

        for (index, (binding, cell)) in self.bindings.iter().zip(cells).enumerate() {
            let Binding::Field(field) = binding else {
                continue;
            };
            let scan_err = || {
                format!(
                    "scan error on column index {}, name {:?}",
                    index,
                    self.columns[index].name()
                )
            };
            let scan = field
                .scan
                .ok_or(ScanError::Unsupported {
                    from: cell.kind_name(),
                    into: field.field_type,
                })
                .wrap_err_with(scan_err)?;
            let slot = field.reach(&mut *root, self.type_name)?;
            scan(slot, cell).wrap_err_with(scan_err)?;
        }

        Ok(element)
    }
}

#[derive(Default)]
pub(crate) struct PlanCache {
    plans: RwLock<HashMap<TypeId, Vec<Arc<ScanPlan>>>>,
}

impl PlanCache {
    pub(crate) fn lookup(&self, id: TypeId, columns: &[ColumnType]) -> Option<Arc<ScanPlan>> {
        self.plans
            .read()
            .get(&id)?
            .iter()
            .find(|plan| signatures_match(plan.columns(), columns))
            .cloned()
    }

    /// Caches `plan` unless an equivalent one was inserted concurrently, and
    /// returns whichever plan is cached.
    pub(crate) fn insert(&self, id: TypeId, plan: ScanPlan) -> Arc<ScanPlan> {
        let mut plans = self.plans.write();
        let entry = plans.entry(id).or_default();
        if let Some(existing) = entry
            .iter()
            .find(|cached| signatures_match(cached.columns(), plan.columns()))
        {
            return Arc::clone(existing);
        }
        let plan = Arc::new(plan);
        entry.push(Arc::clone(&plan));
        plan
    }

    pub(crate) fn count(&self, id: TypeId) -> usize {
        self.plans.read().get(&id).map_or(0, Vec::len)
    }
}
