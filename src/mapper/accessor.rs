//! # Accessor Resolution
//!
//! Builds the table that tells a scan plan where each column lands inside a
//! record. Keys are normalized column names; values carry the declared type of
//! the target field and the path that reaches it from the record root.
//!
//! ## Traversal
//!
//! Fields are visited in declaration order. A field whose type, with all its
//! pointer layers removed, is itself a record is descended into *before* the
//! field registers under its own name:
//!
//! ```text
//! Outer { id, inner: Option<Box<Inner>>, name }
//!         │    │                          │
//!         │    ├─► Inner { id, label }    │
//!         │    │     "id"    → inner.id   │   (overwrites id)
//!         │    │     "label" → inner.label│
//!         │    └─► "inner" → inner        │
//!         "id" → id                       "name" → name
//! ```
//!
//! Registration is last-write-wins. A descendant shadows an earlier sibling of
//! its parent with the same name, the parent field shadows its own descendants,
//! and a later sibling shadows an earlier one. Opaque leaves are never
//! descended into.
//!
//! A record that reaches itself through its own fields cannot be
//! pre-allocated and is rejected with `MappingError::RecursiveRecord`.

use std::any::TypeId;

use hashbrown::HashMap;
use smallvec::SmallVec;

use super::shape::{is_record, OpaqueSet};
use crate::error::MappingError;
use crate::reflect::{AccessFn, FieldInfo, Kind, StructInfo, TypeInfo};

/// One hop from a struct to one of its fields. `derefs` follows the field's
/// pointer layers when the path continues below it.
#[derive(Clone)]
pub(crate) struct Step {
    pub field: &'static str,
    pub get: AccessFn,
    pub derefs: SmallVec<[AccessFn; 2]>,
}

#[derive(Clone)]
pub(crate) struct FieldAccessor {
    pub field_type: TypeInfo,
    pub steps: SmallVec<[Step; 4]>,
}

pub(crate) type AccessorTable = HashMap<String, FieldAccessor>;

/// Column name a field binds to.
pub(crate) fn column_key(field: &FieldInfo) -> String {
    field.column().unwrap_or(field.name()).to_lowercase()
}

/// Renders the field chain of a detected cycle, starting at the root type.
pub(crate) fn cycle_path(stack: &[(TypeId, &'static str)], field: &'static str) -> String {
    let mut parts: Vec<&str> = stack.iter().map(|(_, name)| *name).collect();
    parts.push(field);
    parts.join(".")
}

pub(crate) fn resolve(info: &TypeInfo, opaque: &OpaqueSet) -> Result<AccessorTable, MappingError> {
    let (base, _) = info.unwrap_pointers();
    let Kind::Struct(record) = base.kind() else {
        return Err(MappingError::NotARecord {
            type_name: info.name(),
        });
    };
    if !is_record(&base, opaque) {
        return Err(MappingError::NotARecord {
            type_name: info.name(),
        });
    }

    let mut walker = Walker {
        opaque,
        steps: SmallVec::new(),
        stack: vec![(base.id(), base.name())],
        table: AccessorTable::new(),
    };
    walker.walk(record)?;
    Ok(walker.table)
}

struct Walker<'a> {
    opaque: &'a OpaqueSet,
    steps: SmallVec<[Step; 4]>,
    stack: Vec<(TypeId, &'static str)>,
    table: AccessorTable,
}

impl Walker<'_> {
    fn walk(&mut self, record: &StructInfo) -> Result<(), MappingError> {
        for field in record.fields() {
            let field_type = field.type_info();
            let (field_base, layers) = field_type.unwrap_pointers();

            if let Kind::Struct(nested) = field_base.kind() {
                if is_record(&field_base, self.opaque) {
                    if self.stack.iter().any(|(id, _)| *id == field_base.id()) {
                        return Err(MappingError::RecursiveRecord {
                            type_name: field_base.name(),
                            path: cycle_path(&self.stack, field.name()),
                        });
                    }
                    self.stack.push((field_base.id(), field.name()));
                    self.steps.push(Step {
                        field: field.name(),
                        get: field.get_mut_fn(),
                        derefs: layers.iter().map(|layer| layer.deref_mut).collect(),
                    });
                    self.walk(nested)?;
                    self.steps.pop();
                    self.stack.pop();
                }
            }

            let mut steps = self.steps.clone();
            steps.push(Step {
                field: field.name(),
                get: field.get_mut_fn(),
                derefs: SmallVec::new(),
            });
            self.table.insert(
                column_key(field),
                FieldAccessor { field_type, steps },
            );
        }
        Ok(())
    }
}
