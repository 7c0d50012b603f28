//! FILENAME: core/report-engine/src/registry.rs
//! Field Registry - where selectable fields come from.
//!
//! The placement and filter layers only see the `FieldRegistry` trait, so a
//! hard-coded catalog and a metadata service are interchangeable.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::definition::{DataType, Field, FieldRole, ModelId};
use crate::error::RegistryError;

/// Read access to data models and their fields.
pub trait FieldRegistry {
    /// All models, in registration order.
    fn models(&self) -> Vec<&DataModel>;

    fn model(&self, id: &str) -> Option<&DataModel>;

    fn field(&self, model: &str, field_id: &str) -> Option<&Field> {
        self.model(model).and_then(|m| m.field(field_id))
    }

    /// Fields of a model in registry order; empty for unknown models.
    fn fields(&self, model: &str) -> &[Field] {
        self.model(model).map(|m| m.fields.as_slice()).unwrap_or(&[])
    }
}

/// A dataset and the fields it exposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataModel {
    pub id: ModelId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub fields: Vec<Field>,
}

impl DataModel {
    pub fn new(id: impl Into<ModelId>, name: impl Into<String>) -> Self {
        DataModel {
            id: id.into(),
            name: name.into(),
            description: None,
            fields: Vec::new(),
        }
    }

    pub fn field(&self, field_id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == field_id)
    }

    /// Appends a field. Ids must be unique and the field must name this model.
    pub fn add_field(&mut self, field: Field) -> Result<(), RegistryError> {
        if field.model != self.id {
            return Err(RegistryError::ModelMismatch {
                field: field.id,
                owner: field.model,
                model: self.id.clone(),
            });
        }
        if self.field(&field.id).is_some() {
            return Err(RegistryError::DuplicateField {
                model: self.id.clone(),
                field: field.id,
            });
        }
        self.fields.push(field);
        Ok(())
    }

    pub fn dimensions(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.role == FieldRole::Dimension)
    }

    pub fn measures(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.role == FieldRole::Measure)
    }
}

/// Registry backed by models held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    models: Vec<DataModel>,
    index: FxHashMap<ModelId, usize>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_model(&mut self, model: DataModel) -> Result<(), RegistryError> {
        if self.index.contains_key(&model.id) {
            return Err(RegistryError::DuplicateModel(model.id));
        }
        self.index.insert(model.id.clone(), self.models.len());
        self.models.push(model);
        Ok(())
    }

    /// Registers a user-defined measure computed by `formula`.
    pub fn register_custom_metric(
        &mut self,
        model: &str,
        id: &str,
        name: &str,
        data_type: DataType,
        formula: &str,
    ) -> Result<&Field, RegistryError> {
        if formula.trim().is_empty() {
            return Err(RegistryError::EmptyFormula(id.to_string()));
        }
        let mut field = Field::measure(model, id, name, data_type)?;
        field.formula = Some(formula.trim().to_string());

        let idx = *self
            .index
            .get(model)
            .ok_or_else(|| RegistryError::UnknownModel(model.to_string()))?;
        let target = &mut self.models[idx];
        target.add_field(field)?;
        Ok(&target.fields[target.fields.len() - 1])
    }
}

impl FieldRegistry for InMemoryRegistry {
    fn models(&self) -> Vec<&DataModel> {
        self.models.iter().collect()
    }

    fn model(&self, id: &str) -> Option<&DataModel> {
        self.index.get(id).map(|&idx| &self.models[idx])
    }
}
