//! FILENAME: core/report-engine/src/filter.rs
//! Filter Builder - an ordered list of filter conditions.
//!
//! Each condition is `field operator value`, joined to the previous one with
//! AND/OR. The operators offered depend on the field's data type, and the
//! value shape depends on the operator:
//! - `is_empty` / `is_not_empty`: no value
//! - `between`: a pair
//! - `in` / `not_in`: a non-empty list
//! - everything else: a single scalar
//!
//! Conditions render into a flat expression string, left to right, with no
//! parenthesization.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::definition::{ConditionId, DataType, Field, FieldId};
use crate::error::FilterError;
use crate::registry::FieldRegistry;

pub const DEFAULT_LIST_DELIMITER: &str = ",";

// ============================================================================
// OPERATORS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Before,
    After,
    Between,
    In,
    NotIn,
    IsEmpty,
    IsNotEmpty,
}

/// What kind of value an operator expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueShape {
    None,
    Single,
    Pair,
    List,
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueShape::None => "empty",
            ValueShape::Single => "single",
            ValueShape::Pair => "pair",
            ValueShape::List => "list",
        };
        f.write_str(name)
    }
}

use FilterOperator::*;

const STRING_OPERATORS: &[FilterOperator] = &[
    Equals, NotEquals, Contains, NotContains, StartsWith, EndsWith, In, NotIn, IsEmpty,
    IsNotEmpty,
];

const INTEGER_OPERATORS: &[FilterOperator] = &[
    Equals, NotEquals, GreaterThan, GreaterThanOrEqual, LessThan, LessThanOrEqual, Between, In,
    NotIn, IsEmpty, IsNotEmpty,
];

const DECIMAL_OPERATORS: &[FilterOperator] = &[
    Equals, NotEquals, GreaterThan, GreaterThanOrEqual, LessThan, LessThanOrEqual, Between,
    IsEmpty, IsNotEmpty,
];

const DATE_OPERATORS: &[FilterOperator] =
    &[Equals, NotEquals, Before, After, Between, IsEmpty, IsNotEmpty];

const BOOLEAN_OPERATORS: &[FilterOperator] = &[Equals, NotEquals, IsEmpty, IsNotEmpty];

/// The fixed operator table for a data type. Every table starts with `Equals`.
pub fn operators_for(data_type: DataType) -> &'static [FilterOperator] {
    match data_type {
        DataType::String => STRING_OPERATORS,
        DataType::Integer => INTEGER_OPERATORS,
        DataType::Decimal => DECIMAL_OPERATORS,
        DataType::Date => DATE_OPERATORS,
        DataType::Boolean => BOOLEAN_OPERATORS,
    }
}

impl FilterOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            Equals => "equals",
            NotEquals => "not_equals",
            Contains => "contains",
            NotContains => "not_contains",
            StartsWith => "starts_with",
            EndsWith => "ends_with",
            GreaterThan => "greater_than",
            GreaterThanOrEqual => "greater_than_or_equal",
            LessThan => "less_than",
            LessThanOrEqual => "less_than_or_equal",
            Before => "before",
            After => "after",
            Between => "between",
            In => "in",
            NotIn => "not_in",
            IsEmpty => "is_empty",
            IsNotEmpty => "is_not_empty",
        }
    }

    pub fn value_shape(self) -> ValueShape {
        match self {
            IsEmpty | IsNotEmpty => ValueShape::None,
            Between => ValueShape::Pair,
            In | NotIn => ValueShape::List,
            _ => ValueShape::Single,
        }
    }

    pub fn supports(self, data_type: DataType) -> bool {
        operators_for(data_type).contains(&self)
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const ALL: [FilterOperator; 17] = [
            Equals, NotEquals, Contains, NotContains, StartsWith, EndsWith, GreaterThan,
            GreaterThanOrEqual, LessThan, LessThanOrEqual, Before, After, Between, In, NotIn,
            IsEmpty, IsNotEmpty,
        ];
        let wanted = s.trim().to_ascii_lowercase();
        ALL.into_iter()
            .find(|op| op.as_str() == wanted)
            .ok_or_else(|| format!("Unknown filter operator: {}", s))
    }
}

// ============================================================================
// VALUES
// ============================================================================

/// One typed filter operand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ScalarValue {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Date(NaiveDate),
    Boolean(bool),
}

impl ScalarValue {
    /// Whether this operand can be compared against a field of `data_type`.
    /// Integer literals are accepted for decimal fields.
    pub fn fits(&self, data_type: DataType) -> bool {
        matches!(
            (self, data_type),
            (ScalarValue::Text(_), DataType::String)
                | (ScalarValue::Integer(_), DataType::Integer | DataType::Decimal)
                | (ScalarValue::Decimal(_), DataType::Decimal)
                | (ScalarValue::Date(_), DataType::Date)
                | (ScalarValue::Boolean(_), DataType::Boolean)
        )
    }

    /// Empty or whitespace-only text. Counts as no value at all.
    pub fn is_blank(&self) -> bool {
        matches!(self, ScalarValue::Text(s) if s.trim().is_empty())
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Text(s) => f.write_str(s),
            ScalarValue::Integer(n) => write!(f, "{}", n),
            ScalarValue::Decimal(n) => write!(f, "{}", n),
            ScalarValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            ScalarValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

pub type ValueList = SmallVec<[ScalarValue; 4]>;

/// The value of a condition, shaped by its operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "items", rename_all = "snake_case")]
pub enum ConditionValue {
    Single(ScalarValue),
    Pair(ScalarValue, ScalarValue),
    List(ValueList),
}

impl ConditionValue {
    pub fn shape(&self) -> ValueShape {
        match self {
            ConditionValue::Single(_) => ValueShape::Single,
            ConditionValue::Pair(..) => ValueShape::Pair,
            ConditionValue::List(_) => ValueShape::List,
        }
    }

    fn scalars(&self) -> Box<dyn Iterator<Item = &ScalarValue> + '_> {
        match self {
            ConditionValue::Single(v) => Box::new(std::iter::once(v)),
            ConditionValue::Pair(low, high) => Box::new([low, high].into_iter()),
            ConditionValue::List(items) => Box::new(items.iter()),
        }
    }

    /// True when any operand is blank text.
    pub fn has_blank(&self) -> bool {
        self.scalars().any(ScalarValue::is_blank)
    }

    pub fn render(&self, delimiter: &str) -> String {
        self.scalars()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(delimiter)
    }
}

impl From<ScalarValue> for ConditionValue {
    fn from(value: ScalarValue) -> Self {
        ConditionValue::Single(value)
    }
}

// ============================================================================
// CONDITIONS
// ============================================================================

/// Logical connective to the previous condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Joiner {
    #[default]
    And,
    Or,
}

impl Joiner {
    pub fn as_str(self) -> &'static str {
        match self {
            Joiner::And => "AND",
            Joiner::Or => "OR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub id: ConditionId,
    pub field: FieldId,

    /// Data type of `field` at the time the condition was built.
    pub data_type: DataType,

    pub operator: FilterOperator,

    /// `None` while the condition still waits for a value.
    #[serde(default)]
    pub value: Option<ConditionValue>,

    #[serde(default)]
    pub joiner: Joiner,
}

impl FilterCondition {
    /// A condition is complete when its operator has the value it needs.
    /// Blank text operands do not count.
    pub fn is_complete(&self) -> bool {
        self.operator.value_shape() == ValueShape::None
            || self.value.as_ref().is_some_and(|v| !v.has_blank())
    }

    /// `field operator [value]`, without the joiner.
    pub fn render(&self, delimiter: &str) -> String {
        match &self.value {
            Some(value) if self.operator.value_shape() != ValueShape::None => format!(
                "{} {} {}",
                self.field,
                self.operator,
                value.render(delimiter)
            ),
            _ => format!("{} {}", self.field, self.operator),
        }
    }
}

fn check_operator(operator: FilterOperator, data_type: DataType) -> Result<(), FilterError> {
    if !operator.supports(data_type) {
        return Err(FilterError::UnsupportedOperator { operator, data_type });
    }
    Ok(())
}

/// Validates operator availability and value shape/type for one condition.
fn check_value(
    field: &str,
    data_type: DataType,
    operator: FilterOperator,
    value: Option<&ConditionValue>,
) -> Result<(), FilterError> {
    check_operator(operator, data_type)?;

    let expected = operator.value_shape();
    let value = match (expected, value) {
        (ValueShape::None, None) => return Ok(()),
        (ValueShape::None, Some(_)) => return Err(FilterError::UnexpectedValue(operator)),
        (_, Some(value)) if !value.has_blank() => value,
        (_, _) => {
            return Err(FilterError::MissingValue {
                field: field.to_string(),
                operator,
            })
        }
    };

    if value.shape() != expected {
        return Err(FilterError::ShapeMismatch { operator, expected });
    }
    if let ConditionValue::List(items) = value {
        if items.is_empty() {
            return Err(FilterError::EmptyList(operator));
        }
    }
    if let Some(bad) = value.scalars().find(|v| !v.fits(data_type)) {
        return Err(FilterError::TypeMismatch {
            field: field.to_string(),
            data_type,
            value: bad.to_string(),
        });
    }
    Ok(())
}

/// Partial replacement of a condition. Unset members keep their value.
#[derive(Debug, Clone, Default)]
pub struct ConditionEdit<'f> {
    pub field: Option<&'f Field>,
    pub operator: Option<FilterOperator>,
    pub value: Option<ConditionValue>,
    pub joiner: Option<Joiner>,
}

/// A single state transition of a filter builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterAction {
    Add {
        field: FieldId,
        operator: FilterOperator,
        #[serde(default)]
        value: Option<ConditionValue>,
        #[serde(default)]
        joiner: Option<Joiner>,
    },
    Edit {
        id: ConditionId,
        #[serde(default)]
        field: Option<FieldId>,
        #[serde(default)]
        operator: Option<FilterOperator>,
        #[serde(default)]
        value: Option<ConditionValue>,
        #[serde(default)]
        joiner: Option<Joiner>,
    },
    Remove { id: ConditionId },
    Move { id: ConditionId, index: usize },
    Clear,
}

// ============================================================================
// BUILDER
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct FilterBuilder {
    conditions: Vec<FilterCondition>,
    next_id: ConditionId,
    list_delimiter: String,
}

impl Default for FilterBuilder {
    fn default() -> Self {
        FilterBuilder {
            conditions: Vec::new(),
            next_id: 1,
            list_delimiter: DEFAULT_LIST_DELIMITER.to_string(),
        }
    }
}

impl FilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(delimiter: impl Into<String>) -> Self {
        FilterBuilder {
            list_delimiter: delimiter.into(),
            ..Self::default()
        }
    }

    /// Rebuilds a builder from saved conditions. Ids keep counting upward
    /// from the highest existing one and must be unique.
    pub fn from_conditions(
        conditions: Vec<FilterCondition>,
        delimiter: impl Into<String>,
    ) -> Result<Self, FilterError> {
        check_unique_ids(&conditions)?;
        let next_id = match conditions.iter().map(|c| c.id).max() {
            Some(max) => max.checked_add(1).ok_or(FilterError::IdsExhausted)?,
            None => 1,
        };
        Ok(FilterBuilder {
            conditions,
            next_id,
            list_delimiter: delimiter.into(),
        })
    }

    pub fn conditions(&self) -> &[FilterCondition] {
        &self.conditions
    }

    pub fn into_conditions(self) -> Vec<FilterCondition> {
        self.conditions
    }

    pub fn get(&self, id: ConditionId) -> Option<&FilterCondition> {
        self.conditions.iter().find(|c| c.id == id)
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn list_delimiter(&self) -> &str {
        &self.list_delimiter
    }

    /// Items of a multi-item value may not contain the list delimiter, or
    /// the rendered expression could not tell them apart.
    fn check_delimiter(&self, value: &ConditionValue) -> Result<(), FilterError> {
        if value.shape() == ValueShape::Single {
            return Ok(());
        }
        match value
            .scalars()
            .find(|v| v.to_string().contains(self.list_delimiter.as_str()))
        {
            Some(bad) => Err(FilterError::DelimiterInValue {
                value: bad.to_string(),
                delimiter: self.list_delimiter.clone(),
            }),
            None => Ok(()),
        }
    }

    fn position(&self, id: ConditionId) -> Result<usize, FilterError> {
        self.conditions
            .iter()
            .position(|c| c.id == id)
            .ok_or(FilterError::UnknownCondition(id))
    }

    /// Appends a complete condition and returns its id.
    pub fn add_condition(
        &mut self,
        field: &Field,
        operator: FilterOperator,
        value: Option<ConditionValue>,
        joiner: Joiner,
    ) -> Result<ConditionId, FilterError> {
        check_value(&field.id, field.data_type, operator, value.as_ref())?;
        if let Some(value) = &value {
            self.check_delimiter(value)?;
        }
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(FilterError::IdsExhausted)?;
        self.conditions.push(FilterCondition {
            id,
            field: field.id.clone(),
            data_type: field.data_type,
            operator,
            value,
            joiner,
        });
        Ok(id)
    }

    /// Replaces parts of the condition `id`. A new field or a new operator
    /// drops the stored value, leaving the condition incomplete until a
    /// value is supplied.
    pub fn edit_condition(&mut self, id: ConditionId, edit: ConditionEdit<'_>) -> Result<(), FilterError> {
        let idx = self.position(id)?;
        let mut next = self.conditions[idx].clone();

        if let Some(field) = edit.field {
            if field.id != next.field || field.data_type != next.data_type {
                next.field = field.id.clone();
                next.data_type = field.data_type;
                next.value = None;
                if !next.operator.supports(field.data_type) {
                    next.operator = FilterOperator::Equals;
                }
            }
        }

        if let Some(operator) = edit.operator {
            check_operator(operator, next.data_type)?;
            if operator != next.operator {
                next.operator = operator;
                next.value = None;
            }
        }

        if let Some(value) = edit.value {
            check_value(&next.field, next.data_type, next.operator, Some(&value))?;
            self.check_delimiter(&value)?;
            next.value = Some(value);
        }

        if let Some(joiner) = edit.joiner {
            next.joiner = joiner;
        }

        self.conditions[idx] = next;
        Ok(())
    }

    pub fn remove_condition(&mut self, id: ConditionId) -> Result<FilterCondition, FilterError> {
        let idx = self.position(id)?;
        Ok(self.conditions.remove(idx))
    }

    pub fn move_condition(&mut self, id: ConditionId, index: usize) -> Result<(), FilterError> {
        let len = self.conditions.len();
        if index >= len {
            return Err(FilterError::IndexOutOfRange { index, len });
        }
        let idx = self.position(id)?;
        let condition = self.conditions.remove(idx);
        self.conditions.insert(index, condition);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.conditions.clear();
    }

    /// Single entry point for all filter transitions. Returns the id of the
    /// condition an `Add` created.
    pub fn apply(
        &mut self,
        registry: &dyn FieldRegistry,
        model: &str,
        action: FilterAction,
    ) -> Result<Option<ConditionId>, FilterError> {
        match action {
            FilterAction::Add {
                field,
                operator,
                value,
                joiner,
            } => {
                let field = lookup(registry, model, &field)?;
                self.add_condition(field, operator, value, joiner.unwrap_or_default())
                    .map(Some)
            }
            FilterAction::Edit {
                id,
                field,
                operator,
                value,
                joiner,
            } => {
                let field = match field {
                    Some(field_id) => Some(lookup(registry, model, &field_id)?),
                    None => None,
                };
                self.edit_condition(
                    id,
                    ConditionEdit {
                        field,
                        operator,
                        value,
                        joiner,
                    },
                )?;
                Ok(None)
            }
            FilterAction::Remove { id } => self.remove_condition(id).map(|_| None),
            FilterAction::Move { id, index } => self.move_condition(id, index).map(|_| None),
            FilterAction::Clear => {
                self.clear();
                Ok(None)
            }
        }
    }

    // ========================================================================
    // OUTPUT
    // ========================================================================

    /// Rendered pieces of the expression, computed on demand. The first piece
    /// carries no joiner. Incomplete conditions are skipped.
    pub fn expression_parts(&self) -> impl Iterator<Item = String> + '_ {
        self.conditions
            .iter()
            .filter(|c| c.is_complete())
            .enumerate()
            .map(move |(i, c)| {
                let body = c.render(&self.list_delimiter);
                if i == 0 {
                    body
                } else {
                    format!("{} {}", c.joiner.as_str(), body)
                }
            })
    }

    /// The flat filter expression, e.g. `amount greater_than 100 AND status equals paid`.
    pub fn render_expression(&self) -> String {
        self.expression_parts().fold(String::new(), |mut out, part| {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&part);
            out
        })
    }

    /// True when the rendered expression mixes AND with OR. Such expressions
    /// have no explicit grouping.
    pub fn has_mixed_joiners(&self) -> bool {
        let mut joiners = self
            .conditions
            .iter()
            .filter(|c| c.is_complete())
            .skip(1)
            .map(|c| c.joiner);
        match joiners.next() {
            Some(first) => joiners.any(|j| j != first),
            None => false,
        }
    }

    pub fn incomplete(&self) -> Vec<ConditionId> {
        self.conditions
            .iter()
            .filter(|c| !c.is_complete())
            .map(|c| c.id)
            .collect()
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        let incomplete = self.incomplete();
        if incomplete.is_empty() {
            Ok(())
        } else {
            Err(FilterError::Incomplete(incomplete))
        }
    }

    /// Re-checks every condition against the registry (used when hydrating).
    pub fn validate_against(&self, registry: &dyn FieldRegistry, model: &str) -> Result<(), FilterError> {
        check_unique_ids(&self.conditions)?;
        for condition in &self.conditions {
            let field = lookup(registry, model, &condition.field)?;
            if field.data_type != condition.data_type {
                return Err(FilterError::TypeMismatch {
                    field: field.id.clone(),
                    data_type: field.data_type,
                    value: condition.data_type.to_string(),
                });
            }
            check_value(
                &condition.field,
                condition.data_type,
                condition.operator,
                condition.value.as_ref(),
            )?;
            if let Some(value) = &condition.value {
                self.check_delimiter(value)?;
            }
        }
        Ok(())
    }
}

fn check_unique_ids(conditions: &[FilterCondition]) -> Result<(), FilterError> {
    let mut seen = rustc_hash::FxHashSet::default();
    match conditions.iter().find(|c| !seen.insert(c.id)) {
        Some(dup) => Err(FilterError::DuplicateCondition(dup.id)),
        None => Ok(()),
    }
}

fn lookup<'r>(registry: &'r dyn FieldRegistry, model: &str, field_id: &str) -> Result<&'r Field, FilterError> {
    registry
        .field(model, field_id)
        .ok_or_else(|| FilterError::UnknownField {
            field: field_id.to_string(),
            model: model.to_string(),
        })
}
