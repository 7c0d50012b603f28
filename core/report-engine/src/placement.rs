//! FILENAME: core/report-engine/src/placement.rs
//! Placement Engine - which fields occupy rows, columns and values.
//!
//! Rules enforced on every mutation:
//! - `values` only takes measures, `rows`/`columns` only take dimensions
//! - a field id appears in at most one slot of the whole set
//!
//! A rejected action returns a `PlacementError` and leaves the set untouched.

use serde::{Deserialize, Serialize};

use crate::definition::{AggregationType, Field, FieldId, PlacedField, Slot};
use crate::error::PlacementError;
use crate::registry::FieldRegistry;

/// A single state transition of a placement set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlacementAction {
    Place { field: FieldId, slot: Slot },
    Remove { field: FieldId, slot: Slot },
    Move { field: FieldId, slot: Slot, index: usize },
    Reorder { slot: Slot, from: usize, to: usize },
    Rename { field: FieldId, name: String },
    SetAggregation { field: FieldId, aggregation: AggregationType },
    Clear,
}

/// Rows, columns and values of one report configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacementSet {
    rows: Vec<PlacedField>,
    columns: Vec<PlacedField>,
    values: Vec<PlacedField>,
}

impl PlacementSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[PlacedField] {
        &self.rows
    }

    pub fn columns(&self) -> &[PlacedField] {
        &self.columns
    }

    pub fn values(&self) -> &[PlacedField] {
        &self.values
    }

    pub fn slot(&self, slot: Slot) -> &[PlacedField] {
        match slot {
            Slot::Rows => &self.rows,
            Slot::Columns => &self.columns,
            Slot::Values => &self.values,
        }
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut Vec<PlacedField> {
        match slot {
            Slot::Rows => &mut self.rows,
            Slot::Columns => &mut self.columns,
            Slot::Values => &mut self.values,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.columns.is_empty() && self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len() + self.columns.len() + self.values.len()
    }

    /// Slot and position of a placed field.
    pub fn locate(&self, field_id: &str) -> Option<(Slot, usize)> {
        Slot::ALL.into_iter().find_map(|slot| {
            self.slot(slot)
                .iter()
                .position(|p| p.field_id == field_id)
                .map(|idx| (slot, idx))
        })
    }

    pub fn contains(&self, field_id: &str) -> bool {
        self.locate(field_id).is_some()
    }

    pub fn get(&self, field_id: &str) -> Option<&PlacedField> {
        self.locate(field_id).map(|(slot, idx)| &self.slot(slot)[idx])
    }

    fn get_mut(&mut self, field_id: &str) -> Option<&mut PlacedField> {
        let (slot, idx) = self.locate(field_id)?;
        Some(&mut self.slot_mut(slot)[idx])
    }

    /// Registry fields of `model` that are not placed anywhere, in registry order.
    pub fn available<'r>(&self, registry: &'r dyn FieldRegistry, model: &str) -> Vec<&'r Field> {
        registry
            .fields(model)
            .iter()
            .filter(|f| !self.contains(&f.id))
            .collect()
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Appends `field_id` to `slot`.
    pub fn place(
        &mut self,
        registry: &dyn FieldRegistry,
        model: &str,
        field_id: &str,
        slot: Slot,
    ) -> Result<(), PlacementError> {
        let field = lookup(registry, model, field_id)?;
        check_role(field, slot)?;
        if let Some((existing, _)) = self.locate(field_id) {
            return Err(PlacementError::AlreadyPlaced {
                field: field_id.to_string(),
                slot: existing,
            });
        }
        self.slot_mut(slot).push(PlacedField::new(field, slot));
        Ok(())
    }

    /// Takes `field_id` out of `slot`. A field that is not in that slot is
    /// left alone; this never fails.
    pub fn remove(&mut self, field_id: &str, slot: Slot) -> Option<PlacedField> {
        let entries = self.slot_mut(slot);
        let idx = entries.iter().position(|p| p.field_id == field_id)?;
        Some(entries.remove(idx))
    }

    /// Moves a field to `index` of `slot`, placing it first if it is unplaced.
    /// `index` may equal the target length (append).
    pub fn move_to(
        &mut self,
        registry: &dyn FieldRegistry,
        model: &str,
        field_id: &str,
        slot: Slot,
        index: usize,
    ) -> Result<(), PlacementError> {
        let field = lookup(registry, model, field_id)?;
        check_role(field, slot)?;

        match self.locate(field_id) {
            Some((current, from)) if current == slot => {
                let len = self.slot(slot).len();
                if index >= len {
                    return Err(PlacementError::IndexOutOfRange { slot, index, len });
                }
                let entry = self.slot_mut(slot).remove(from);
                self.slot_mut(slot).insert(index, entry);
            }
            Some((current, from)) => {
                let len = self.slot(slot).len();
                if index > len {
                    return Err(PlacementError::IndexOutOfRange { slot, index, len });
                }
                // Only rows <-> columns gets here; values holds measures alone.
                let entry = self.slot_mut(current).remove(from);
                self.slot_mut(slot).insert(index, entry);
            }
            None => {
                let len = self.slot(slot).len();
                if index > len {
                    return Err(PlacementError::IndexOutOfRange { slot, index, len });
                }
                self.slot_mut(slot).insert(index, PlacedField::new(field, slot));
            }
        }
        Ok(())
    }

    /// Moves the entry at `from` to `to` within one slot.
    pub fn reorder(&mut self, slot: Slot, from: usize, to: usize) -> Result<(), PlacementError> {
        let entries = self.slot_mut(slot);
        let len = entries.len();
        for index in [from, to] {
            if index >= len {
                return Err(PlacementError::IndexOutOfRange { slot, index, len });
            }
        }
        let entry = entries.remove(from);
        entries.insert(to, entry);
        Ok(())
    }

    /// Changes the display name of a placed field.
    pub fn rename(&mut self, field_id: &str, name: &str) -> Result<(), PlacementError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PlacementError::EmptyName(field_id.to_string()));
        }
        let entry = self
            .get_mut(field_id)
            .ok_or_else(|| PlacementError::NotPlaced(field_id.to_string()))?;
        entry.name = name.to_string();
        Ok(())
    }

    pub fn set_aggregation(
        &mut self,
        field_id: &str,
        aggregation: AggregationType,
    ) -> Result<(), PlacementError> {
        let entry = self
            .values
            .iter_mut()
            .find(|p| p.field_id == field_id)
            .ok_or_else(|| PlacementError::NotAValueField(field_id.to_string()))?;
        entry.aggregation = Some(aggregation);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.columns.clear();
        self.values.clear();
    }

    /// Single entry point for all placement transitions.
    pub fn apply(
        &mut self,
        registry: &dyn FieldRegistry,
        model: &str,
        action: PlacementAction,
    ) -> Result<(), PlacementError> {
        match action {
            PlacementAction::Place { field, slot } => self.place(registry, model, &field, slot),
            PlacementAction::Remove { field, slot } => {
                self.remove(&field, slot);
                Ok(())
            }
            PlacementAction::Move { field, slot, index } => {
                self.move_to(registry, model, &field, slot, index)
            }
            PlacementAction::Reorder { slot, from, to } => self.reorder(slot, from, to),
            PlacementAction::Rename { field, name } => self.rename(&field, &name),
            PlacementAction::SetAggregation { field, aggregation } => {
                self.set_aggregation(&field, aggregation)
            }
            PlacementAction::Clear => {
                self.clear();
                Ok(())
            }
        }
    }

    /// Checks a set that did not come through `apply` (e.g. deserialized).
    pub fn validate(&self, registry: &dyn FieldRegistry, model: &str) -> Result<(), PlacementError> {
        let mut seen = rustc_hash::FxHashSet::default();
        for slot in Slot::ALL {
            for entry in self.slot(slot) {
                let field = lookup(registry, model, &entry.field_id)?;
                check_role(field, slot)?;
                if !seen.insert(entry.field_id.as_str()) {
                    return Err(PlacementError::AlreadyPlaced {
                        field: entry.field_id.clone(),
                        slot,
                    });
                }
                if entry.name.trim().is_empty() {
                    return Err(PlacementError::EmptyName(entry.field_id.clone()));
                }
                if entry.aggregation.is_some() != (slot == Slot::Values) {
                    return Err(PlacementError::AggregationMismatch {
                        field: entry.field_id.clone(),
                        slot,
                    });
                }
            }
        }
        Ok(())
    }
}

fn lookup<'r>(
    registry: &'r dyn FieldRegistry,
    model: &str,
    field_id: &str,
) -> Result<&'r Field, PlacementError> {
    registry
        .field(model, field_id)
        .ok_or_else(|| PlacementError::UnknownField {
            field: field_id.to_string(),
            model: model.to_string(),
        })
}

fn check_role(field: &Field, slot: Slot) -> Result<(), PlacementError> {
    let expected = slot.required_role();
    if field.role != expected {
        return Err(PlacementError::RoleMismatch {
            field: field.id.clone(),
            slot,
            expected,
            actual: field.role,
        });
    }
    Ok(())
}
