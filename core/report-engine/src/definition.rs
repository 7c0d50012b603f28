//! FILENAME: core/report-engine/src/definition.rs
//! Report Definition - the shared vocabulary of a report configuration.
//!
//! This module contains the small value types that every other layer
//! refers to. They are:
//! - Serializable (saved as part of a report configuration)
//! - Cheap to clone
//! - Free of any registry or UI knowledge

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::RegistryError;

/// Identifier of a data model (dataset) in the field registry.
pub type ModelId = String;

/// Identifier of a field, unique within its data model.
pub type FieldId = String;

/// Identifier of a filter condition, unique within one filter builder.
pub type ConditionId = u32;

// ============================================================================
// FIELD CLASSIFICATION
// ============================================================================

/// Whether a field groups (dimension) or aggregates (measure).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRole {
    Dimension,
    Measure,
}

impl fmt::Display for FieldRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRole::Dimension => write!(f, "dimension"),
            FieldRole::Measure => write!(f, "measure"),
        }
    }
}

/// Data type of a field. Drives which filter operators are offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    String,
    Integer,
    Decimal,
    Date,
    Boolean,
}

impl DataType {
    pub fn is_numeric(self) -> bool {
        matches!(self, DataType::Integer | DataType::Decimal)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::String => "string",
            DataType::Integer => "integer",
            DataType::Decimal => "decimal",
            DataType::Date => "date",
            DataType::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

// ============================================================================
// FIELD
// ============================================================================

/// A selectable field of a data model.
/// Immutable once registered; placements and filters refer to it by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: FieldId,

    /// Display name shown in the field list.
    pub name: String,

    pub role: FieldRole,

    pub data_type: DataType,

    /// The data model that owns this field.
    pub model: ModelId,

    /// Formula of a user-defined metric. `None` for fields that come
    /// straight from the dataset.
    #[serde(default)]
    pub formula: Option<String>,
}

impl Field {
    /// Creates a field, rejecting measures that cannot be aggregated.
    pub fn new(
        model: impl Into<ModelId>,
        id: impl Into<FieldId>,
        name: impl Into<String>,
        role: FieldRole,
        data_type: DataType,
    ) -> Result<Self, RegistryError> {
        let id = id.into();
        if role == FieldRole::Measure && !data_type.is_numeric() {
            return Err(RegistryError::NonNumericMeasure { field: id, data_type });
        }
        Ok(Field {
            id,
            name: name.into(),
            role,
            data_type,
            model: model.into(),
            formula: None,
        })
    }

    /// Dimensions accept every data type, so this cannot fail.
    pub fn dimension(
        model: impl Into<ModelId>,
        id: impl Into<FieldId>,
        name: impl Into<String>,
        data_type: DataType,
    ) -> Self {
        Field {
            id: id.into(),
            name: name.into(),
            role: FieldRole::Dimension,
            data_type,
            model: model.into(),
            formula: None,
        }
    }

    pub fn measure(
        model: impl Into<ModelId>,
        id: impl Into<FieldId>,
        name: impl Into<String>,
        data_type: DataType,
    ) -> Result<Self, RegistryError> {
        Field::new(model, id, name, FieldRole::Measure, data_type)
    }

    pub fn is_custom_metric(&self) -> bool {
        self.formula.is_some()
    }
}

// ============================================================================
// SLOTS
// ============================================================================

/// The three areas of a pivot report a field can be placed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Rows,
    Columns,
    Values,
}

impl Slot {
    pub const ALL: [Slot; 3] = [Slot::Rows, Slot::Columns, Slot::Values];

    /// The only role a field may have to be placed into this slot.
    pub fn required_role(self) -> FieldRole {
        match self {
            Slot::Rows | Slot::Columns => FieldRole::Dimension,
            Slot::Values => FieldRole::Measure,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Rows => write!(f, "rows"),
            Slot::Columns => write!(f, "columns"),
            Slot::Values => write!(f, "values"),
        }
    }
}

// ============================================================================
// AGGREGATION
// ============================================================================

/// Supported aggregation functions for value fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AggregationType {
    #[default]
    Sum,
    Count,
    CountDistinct,
    Average,
    Min,
    Max,
}

impl AggregationType {
    /// Caption prefix used for value headers ("Sum of Price").
    pub fn caption(self) -> &'static str {
        match self {
            AggregationType::Sum => "Sum",
            AggregationType::Count => "Count",
            AggregationType::CountDistinct => "Distinct Count",
            AggregationType::Average => "Average",
            AggregationType::Min => "Min",
            AggregationType::Max => "Max",
        }
    }
}

// ============================================================================
// PLACED FIELD
// ============================================================================

/// A field occupying a slot of the placement set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedField {
    /// Registry field this placement refers to.
    pub field_id: FieldId,

    /// Display name. Editable in place; does not affect identity.
    pub name: String,

    /// Aggregation applied when the field sits in the values slot.
    #[serde(default)]
    pub aggregation: Option<AggregationType>,
}

impl PlacedField {
    pub fn new(field: &Field, slot: Slot) -> Self {
        PlacedField {
            field_id: field.id.clone(),
            name: field.name.clone(),
            aggregation: match slot {
                Slot::Values => Some(AggregationType::default()),
                Slot::Rows | Slot::Columns => None,
            },
        }
    }

    /// Header caption for preview output.
    pub fn caption(&self) -> String {
        match self.aggregation {
            Some(agg) => format!("{} of {}", agg.caption(), self.name),
            None => self.name.clone(),
        }
    }
}
