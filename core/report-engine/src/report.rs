//! FILENAME: core/report-engine/src/report.rs
//! Report Configuration - the object handed to the save collaborator, and
//! the editor state that produces it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::definition::{ConditionId, ModelId};
use crate::error::{ConfigError, RegistryError};
use crate::filter::{FilterAction, FilterBuilder, FilterCondition, DEFAULT_LIST_DELIMITER};
use crate::placement::{PlacementAction, PlacementSet};
use crate::preview::{render_preview, PreviewView};
use crate::registry::FieldRegistry;

/// The complete, serializable configuration of a pivot report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfiguration {
    /// Assigned when the report is first saved.
    #[serde(default)]
    pub id: Option<Uuid>,

    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Data model the fields come from.
    pub model: ModelId,

    pub placements: PlacementSet,

    #[serde(default)]
    pub filters: Vec<FilterCondition>,

    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

/// A single state transition of the report editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "action", rename_all = "snake_case")]
pub enum ReportAction {
    SetName(String),
    SetDescription(String),
    Placement(PlacementAction),
    Filter(FilterAction),
}

/// Working state of one open report dialog.
#[derive(Debug, Clone)]
pub struct ReportEditor {
    id: Option<Uuid>,
    name: String,
    description: String,
    model: ModelId,
    placements: PlacementSet,
    filters: FilterBuilder,
}

impl ReportEditor {
    /// Starts an empty configuration on `model`.
    pub fn new(registry: &dyn FieldRegistry, model: &str) -> Result<Self, ConfigError> {
        Self::with_delimiter(registry, model, DEFAULT_LIST_DELIMITER)
    }

    pub fn with_delimiter(
        registry: &dyn FieldRegistry,
        model: &str,
        delimiter: &str,
    ) -> Result<Self, ConfigError> {
        ensure_model(registry, model)?;
        Ok(ReportEditor {
            id: None,
            name: String::new(),
            description: String::new(),
            model: model.to_string(),
            placements: PlacementSet::new(),
            filters: FilterBuilder::with_delimiter(delimiter),
        })
    }

    /// Rebuilds editor state from a saved configuration, re-checking every
    /// field reference against the registry.
    pub fn hydrate(
        registry: &dyn FieldRegistry,
        config: ReportConfiguration,
        delimiter: &str,
    ) -> Result<Self, ConfigError> {
        ensure_model(registry, &config.model)?;
        config.placements.validate(registry, &config.model)?;
        let filters = FilterBuilder::from_conditions(config.filters, delimiter)?;
        filters.validate_against(registry, &config.model)?;

        Ok(ReportEditor {
            id: config.id,
            name: config.name,
            description: config.description,
            model: config.model,
            placements: config.placements,
            filters,
        })
    }

    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn placements(&self) -> &PlacementSet {
        &self.placements
    }

    pub fn filters(&self) -> &FilterBuilder {
        &self.filters
    }

    /// Single entry point for editor transitions. Returns the id of a newly
    /// added filter condition.
    pub fn apply(
        &mut self,
        registry: &dyn FieldRegistry,
        action: ReportAction,
    ) -> Result<Option<ConditionId>, ConfigError> {
        match action {
            ReportAction::SetName(name) => {
                self.name = name;
                Ok(None)
            }
            ReportAction::SetDescription(description) => {
                self.description = description;
                Ok(None)
            }
            ReportAction::Placement(action) => {
                self.placements.apply(registry, &self.model, action)?;
                Ok(None)
            }
            ReportAction::Filter(action) => Ok(self.filters.apply(registry, &self.model, action)?),
        }
    }

    pub fn render_expression(&self) -> String {
        self.filters.render_expression()
    }

    pub fn preview(&self, sample_rows: usize) -> PreviewView {
        render_preview(&self.placements, sample_rows)
    }

    /// Produces the whole configuration for saving. Rejects an empty name and
    /// incomplete filter conditions.
    pub fn build(&self, registry: &dyn FieldRegistry) -> Result<ReportConfiguration, ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        ensure_model(registry, &self.model)?;
        self.placements.validate(registry, &self.model)?;
        self.filters.validate()?;

        Ok(ReportConfiguration {
            id: self.id,
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            model: self.model.clone(),
            placements: self.placements.clone(),
            filters: self.filters.conditions().to_vec(),
            saved_at: None,
        })
    }
}

fn ensure_model(registry: &dyn FieldRegistry, model: &str) -> Result<(), RegistryError> {
    match registry.model(model) {
        Some(_) => Ok(()),
        None => Err(RegistryError::UnknownModel(model.to_string())),
    }
}
