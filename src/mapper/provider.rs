//! # Record Providers
//!
//! A provider allocates a zero value of a record type with every nested record
//! already in place, so that every leaf field a scan plan targets is reachable
//! before the first cell is scanned.
//!
//! ## Construction
//!
//! ```text
//! provide(Option<Box<Outer>>)
//!   │
//!   ├─ Outer::default()
//!   ├─ init actions, in field order
//!   │    inner: Option<Box<Inner>> ◄── provide(Option<Box<Inner>>) = Some(Box(Inner { .. }))
//!   └─ wrap pointer layers, innermost first
//!        Outer ─► Box<Outer> ─► Some(Box<Outer>)
//! ```
//!
//! Leaf fields get no init action and keep their zero value until scanned.
//! Providers are keyed by the full type (pointer layers included) and shared by
//! every plan that targets it. They are immutable once built.

use std::any::{Any, TypeId};
use std::sync::Arc;

use eyre::Result;
use hashbrown::HashMap;
use parking_lot::RwLock;
use smallvec::SmallVec;
use tracing::{debug, trace};

use super::accessor::cycle_path;
use super::shape::{is_record, OpaqueSet};
use crate::error::MappingError;
use crate::reflect::{AccessFn, AssignFn, Kind, NewFn, TypeInfo, WrapFn};

pub(crate) struct RecordProvider {
    type_name: &'static str,
    new: NewFn,
    actions: Vec<InitAction>,
    /// Pointer layer wraps, outermost first.
    wraps: SmallVec<[WrapFn; 2]>,
}

struct InitAction {
    field: &'static str,
    get_mut: AccessFn,
    nested: Arc<RecordProvider>,
    assign: AssignFn,
}

impl RecordProvider {
    /// Allocates a fully pre-allocated instance.
    pub(crate) fn provide(&self) -> Result<Box<dyn Any>> {
        let mut value = (self.new)();
        for action in &self.actions {
            let nested = action.nested.provide()?;
            let slot = (action.get_mut)(value.as_mut()).ok_or(MappingError::NilPointer {
                type_name: self.type_name,
                field: action.field,
            })?;
            (action.assign)(slot, nested)?;
        }
        for wrap in self.wraps.iter().rev() {
            value = wrap(value)?;
        }
        Ok(value)
    }

    pub(crate) fn type_name(&self) -> &'static str {
        self.type_name
    }
}

#[derive(Default)]
pub(crate) struct ProviderCache {
    providers: RwLock<HashMap<TypeId, Arc<RecordProvider>>>,
}

impl ProviderCache {
    pub(crate) fn get_or_build(
        &self,
        info: &TypeInfo,
        opaque: &OpaqueSet,
    ) -> Result<Arc<RecordProvider>, MappingError> {
        self.build(info, opaque, &mut Vec::new())
    }

    pub(crate) fn len(&self) -> usize {
        self.providers.read().len()
    }

    fn build(
        &self,
        info: &TypeInfo,
        opaque: &OpaqueSet,
        stack: &mut Vec<(TypeId, &'static str)>,
    ) -> Result<Arc<RecordProvider>, MappingError> {
        if let Some(provider) = self.providers.read().get(&info.id()) {
            trace!(type_name = info.name(), "record provider cache hit");
            return Ok(Arc::clone(provider));
        }

        let not_a_record = || MappingError::NotARecord {
            type_name: info.name(),
        };
        let (base, layers) = info.unwrap_pointers();
        let Kind::Struct(record) = base.kind() else {
            return Err(not_a_record());
        };
        if !is_record(&base, opaque) {
            return Err(not_a_record());
        }
        let new = base.new_fn().ok_or_else(not_a_record)?;

        if stack.is_empty() {
            stack.push((base.id(), base.name()));
        }
        let mut actions = Vec::new();
        for field in record.fields() {
            let field_type = field.type_info();
            let (field_base, _) = field_type.unwrap_pointers();
            if !is_record(&field_base, opaque) {
                continue;
            }
            if stack.iter().any(|(id, _)| *id == field_base.id()) {
                return Err(MappingError::RecursiveRecord {
                    type_name: field_base.name(),
                    path: cycle_path(stack, field.name()),
                });
            }
            stack.push((field_base.id(), field.name()));
            let nested = self.build(&field_type, opaque, stack)?;
            stack.pop();
            actions.push(InitAction {
                field: field.name(),
                get_mut: field.get_mut_fn(),
                nested,
                assign: field_type.assign_fn(),
            });
        }

        let provider = Arc::new(RecordProvider {
            type_name: info.name(),
            new,
            actions,
            wraps: layers.iter().map(|layer| layer.wrap).collect(),
        });

        let mut providers = self.providers.write();
        let provider = Arc::clone(providers.entry(info.id()).or_insert(provider));
        debug!(
            type_name = info.name(),
            nested = provider.actions.len(),
            "built record provider"
        );
        Ok(provider)
    }
}
