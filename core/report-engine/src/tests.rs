//! FILENAME: core/report-engine/src/tests.rs
//! PURPOSE: Consolidated unit tests for the report engine.

use chrono::NaiveDate;
use smallvec::smallvec;

use crate::definition::{AggregationType, DataType, Field, Slot};
use crate::error::{ConfigError, FilterError, PlacementError, RegistryError};
use crate::filter::{
    operators_for, ConditionEdit, ConditionValue, FilterAction, FilterBuilder, FilterOperator,
    Joiner, ScalarValue,
};
use crate::placement::{PlacementAction, PlacementSet};
use crate::preview::{render_preview, PreviewCell, PreviewView, MAX_PREVIEW_ROWS};
use crate::registry::{DataModel, FieldRegistry, InMemoryRegistry};
use crate::report::{ReportAction, ReportEditor};

const MODEL: &str = "orders";

fn registry() -> InMemoryRegistry {
    let mut model = DataModel::new(MODEL, "Orders");
    model.add_field(Field::dimension(MODEL, "region", "Region", DataType::String)).unwrap();
    model.add_field(Field::dimension(MODEL, "status", "Status", DataType::String)).unwrap();
    model.add_field(Field::dimension(MODEL, "order_date", "Order Date", DataType::Date)).unwrap();
    model.add_field(Field::dimension(MODEL, "is_promo", "Promo", DataType::Boolean)).unwrap();
    model.add_field(Field::measure(MODEL, "amount", "Amount", DataType::Decimal).unwrap()).unwrap();
    model.add_field(Field::measure(MODEL, "quantity", "Quantity", DataType::Integer).unwrap()).unwrap();

    let mut registry = InMemoryRegistry::new();
    registry.add_model(model).unwrap();
    registry
}

fn field<'r>(registry: &'r InMemoryRegistry, id: &str) -> &'r Field {
    registry.field(MODEL, id).unwrap()
}

fn text(s: &str) -> Option<ConditionValue> {
    Some(ConditionValue::Single(ScalarValue::Text(s.to_string())))
}

fn int(n: i64) -> Option<ConditionValue> {
    Some(ConditionValue::Single(ScalarValue::Integer(n)))
}

// ========================================
// REGISTRY TESTS
// ========================================

#[test]
fn test_measure_must_be_numeric() {
    let err = Field::measure(MODEL, "label", "Label", DataType::String).unwrap_err();
    assert!(matches!(err, RegistryError::NonNumericMeasure { .. }));
}

#[test]
fn test_duplicate_field_rejected() {
    let mut model = DataModel::new(MODEL, "Orders");
    model.add_field(Field::dimension(MODEL, "region", "Region", DataType::String)).unwrap();
    let err = model
        .add_field(Field::dimension(MODEL, "region", "Region 2", DataType::String))
        .unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateField { .. }));
}

#[test]
fn test_field_from_other_model_rejected() {
    let mut model = DataModel::new(MODEL, "Orders");
    let err = model
        .add_field(Field::dimension("prices", "sku", "SKU", DataType::String))
        .unwrap_err();
    assert!(matches!(err, RegistryError::ModelMismatch { .. }));
}

#[test]
fn test_duplicate_model_rejected() {
    let mut registry = registry();
    let err = registry.add_model(DataModel::new(MODEL, "Again")).unwrap_err();
    assert_eq!(err, RegistryError::DuplicateModel(MODEL.to_string()));
}

#[test]
fn test_custom_metric_registration() {
    let mut registry = registry();
    let metric = registry
        .register_custom_metric(MODEL, "avg_price", "Avg Price", DataType::Decimal, "amount / quantity")
        .unwrap();
    assert!(metric.is_custom_metric());
    assert_eq!(metric.formula.as_deref(), Some("amount / quantity"));

    let model = registry.model(MODEL).unwrap();
    assert_eq!(model.measures().count(), 3);
    assert_eq!(registry.fields(MODEL).last().unwrap().id, "avg_price");
}

#[test]
fn test_custom_metric_rejections() {
    let mut registry = registry();
    assert!(matches!(
        registry.register_custom_metric(MODEL, "x", "X", DataType::Decimal, "  "),
        Err(RegistryError::EmptyFormula(_))
    ));
    assert!(matches!(
        registry.register_custom_metric(MODEL, "x", "X", DataType::Date, "a"),
        Err(RegistryError::NonNumericMeasure { .. })
    ));
    assert!(matches!(
        registry.register_custom_metric(MODEL, "amount", "Amount", DataType::Decimal, "a"),
        Err(RegistryError::DuplicateField { .. })
    ));
    assert!(matches!(
        registry.register_custom_metric("nope", "x", "X", DataType::Decimal, "a"),
        Err(RegistryError::UnknownModel(_))
    ));
}

#[test]
fn test_unknown_model_has_no_fields() {
    let registry = registry();
    assert!(registry.fields("missing").is_empty());
    assert!(registry.field("missing", "region").is_none());
}

// ========================================
// PLACEMENT TESTS
// ========================================

#[test]
fn test_place_dimension_and_measure() {
    let registry = registry();
    let mut set = PlacementSet::new();

    set.place(&registry, MODEL, "region", Slot::Rows).unwrap();
    set.place(&registry, MODEL, "status", Slot::Columns).unwrap();
    set.place(&registry, MODEL, "amount", Slot::Values).unwrap();

    assert_eq!(set.rows()[0].field_id, "region");
    assert_eq!(set.columns()[0].field_id, "status");
    assert_eq!(set.values()[0].aggregation, Some(AggregationType::Sum));
    assert_eq!(set.rows()[0].aggregation, None);
    assert_eq!(set.len(), 3);
}

#[test]
fn test_role_mismatch_leaves_state_unchanged() {
    let registry = registry();
    let mut set = PlacementSet::new();
    set.place(&registry, MODEL, "region", Slot::Rows).unwrap();
    let before = set.clone();

    for (id, slot) in [("amount", Slot::Rows), ("amount", Slot::Columns), ("status", Slot::Values)] {
        let err = set.place(&registry, MODEL, id, slot).unwrap_err();
        assert!(matches!(err, PlacementError::RoleMismatch { .. }), "{:?}", err);
        assert_eq!(set, before);
    }
}

#[test]
fn test_duplicate_placement_rejected_across_slots() {
    let registry = registry();
    let mut set = PlacementSet::new();
    set.place(&registry, MODEL, "region", Slot::Rows).unwrap();
    let before = set.clone();

    let err = set.place(&registry, MODEL, "region", Slot::Columns).unwrap_err();
    assert_eq!(
        err,
        PlacementError::AlreadyPlaced {
            field: "region".to_string(),
            slot: Slot::Rows
        }
    );
    let err = set.place(&registry, MODEL, "region", Slot::Rows).unwrap_err();
    assert!(matches!(err, PlacementError::AlreadyPlaced { .. }));
    assert_eq!(set, before);
}

#[test]
fn test_unknown_field_rejected() {
    let registry = registry();
    let mut set = PlacementSet::new();
    let err = set.place(&registry, MODEL, "ghost", Slot::Rows).unwrap_err();
    assert!(matches!(err, PlacementError::UnknownField { .. }));
    assert!(set.is_empty());
}

#[test]
fn test_remove_returns_field_to_pool_once() {
    let registry = registry();
    let mut set = PlacementSet::new();
    let total = registry.fields(MODEL).len();

    set.place(&registry, MODEL, "region", Slot::Rows).unwrap();
    assert_eq!(set.available(&registry, MODEL).len(), total - 1);

    assert!(set.remove("region", Slot::Rows).is_some());
    let pool = set.available(&registry, MODEL);
    assert_eq!(pool.len(), total);
    assert_eq!(pool.iter().filter(|f| f.id == "region").count(), 1);

    // Removing again, or from the wrong slot, is a no-op.
    assert!(set.remove("region", Slot::Rows).is_none());
    assert!(set.remove("status", Slot::Values).is_none());
    assert_eq!(set.available(&registry, MODEL).len(), total);
}

#[test]
fn test_remove_from_wrong_slot_keeps_field() {
    let registry = registry();
    let mut set = PlacementSet::new();
    set.place(&registry, MODEL, "region", Slot::Rows).unwrap();
    assert!(set.remove("region", Slot::Columns).is_none());
    assert!(set.contains("region"));
}

#[test]
fn test_available_keeps_registry_order() {
    let registry = registry();
    let mut set = PlacementSet::new();
    set.place(&registry, MODEL, "status", Slot::Rows).unwrap();
    let ids: Vec<&str> = set.available(&registry, MODEL).iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["region", "order_date", "is_promo", "amount", "quantity"]);
}

#[test]
fn test_move_between_rows_and_columns() {
    let registry = registry();
    let mut set = PlacementSet::new();
    set.place(&registry, MODEL, "region", Slot::Rows).unwrap();
    set.place(&registry, MODEL, "status", Slot::Columns).unwrap();

    set.move_to(&registry, MODEL, "region", Slot::Columns, 0).unwrap();
    assert!(set.rows().is_empty());
    let ids: Vec<&str> = set.columns().iter().map(|p| p.field_id.as_str()).collect();
    assert_eq!(ids, vec!["region", "status"]);

    let err = set.move_to(&registry, MODEL, "region", Slot::Values, 0).unwrap_err();
    assert!(matches!(err, PlacementError::RoleMismatch { .. }));
}

#[test]
fn test_move_within_slot_and_unplaced() {
    let registry = registry();
    let mut set = PlacementSet::new();
    set.place(&registry, MODEL, "region", Slot::Rows).unwrap();
    set.move_to(&registry, MODEL, "status", Slot::Rows, 0).unwrap();
    assert_eq!(set.rows()[0].field_id, "status");

    set.move_to(&registry, MODEL, "status", Slot::Rows, 1).unwrap();
    assert_eq!(set.rows()[1].field_id, "status");

    let err = set.move_to(&registry, MODEL, "status", Slot::Rows, 2).unwrap_err();
    assert!(matches!(err, PlacementError::IndexOutOfRange { .. }));
    let err = set.move_to(&registry, MODEL, "order_date", Slot::Rows, 5).unwrap_err();
    assert!(matches!(err, PlacementError::IndexOutOfRange { .. }));
    assert_eq!(set.rows().len(), 2);
}

#[test]
fn test_reorder() {
    let registry = registry();
    let mut set = PlacementSet::new();
    for id in ["region", "status", "order_date"] {
        set.place(&registry, MODEL, id, Slot::Rows).unwrap();
    }
    set.reorder(Slot::Rows, 2, 0).unwrap();
    let ids: Vec<&str> = set.rows().iter().map(|p| p.field_id.as_str()).collect();
    assert_eq!(ids, vec!["order_date", "region", "status"]);

    assert!(set.reorder(Slot::Rows, 3, 0).is_err());
    assert!(set.reorder(Slot::Columns, 0, 0).is_err());
}

#[test]
fn test_rename_keeps_identity() {
    let registry = registry();
    let mut set = PlacementSet::new();
    set.place(&registry, MODEL, "region", Slot::Rows).unwrap();
    set.rename("region", "  Sales Region ").unwrap();

    assert_eq!(set.rows()[0].name, "Sales Region");
    assert_eq!(set.rows()[0].field_id, "region");
    assert!(set.place(&registry, MODEL, "region", Slot::Columns).is_err());

    assert_eq!(set.rename("region", " "), Err(PlacementError::EmptyName("region".to_string())));
    assert_eq!(set.rename("status", "X"), Err(PlacementError::NotPlaced("status".to_string())));
}

#[test]
fn test_set_aggregation_only_on_values() {
    let registry = registry();
    let mut set = PlacementSet::new();
    set.place(&registry, MODEL, "region", Slot::Rows).unwrap();
    set.place(&registry, MODEL, "amount", Slot::Values).unwrap();

    set.set_aggregation("amount", AggregationType::Average).unwrap();
    assert_eq!(set.values()[0].caption(), "Average of Amount");
    assert!(matches!(
        set.set_aggregation("region", AggregationType::Max),
        Err(PlacementError::NotAValueField(_))
    ));
}

#[test]
fn test_apply_actions() {
    let registry = registry();
    let mut set = PlacementSet::new();
    let actions = vec![
        PlacementAction::Place { field: "region".into(), slot: Slot::Rows },
        PlacementAction::Place { field: "amount".into(), slot: Slot::Values },
        PlacementAction::SetAggregation { field: "amount".into(), aggregation: AggregationType::Max },
        PlacementAction::Rename { field: "amount".into(), name: "Top Amount".into() },
        PlacementAction::Remove { field: "ghost".into(), slot: Slot::Rows },
    ];
    for action in actions {
        set.apply(&registry, MODEL, action).unwrap();
    }
    assert_eq!(set.values()[0].caption(), "Max of Top Amount");

    set.apply(&registry, MODEL, PlacementAction::Clear).unwrap();
    assert!(set.is_empty());
}

#[test]
fn test_uniqueness_holds_over_action_sequence() {
    let registry = registry();
    let mut set = PlacementSet::new();
    let slots = [Slot::Rows, Slot::Columns, Slot::Values];
    let ids = ["region", "status", "order_date", "amount", "quantity"];

    for (i, id) in ids.iter().cycle().take(30).enumerate() {
        let slot = slots[i % 3];
        let _ = set.place(&registry, MODEL, id, slot);
        if i % 4 == 0 {
            set.remove(id, slots[(i + 1) % 3]);
        }
        let _ = set.move_to(&registry, MODEL, id, slots[(i + 2) % 3], 0);

        for id in ids {
            let count = Slot::ALL
                .iter()
                .map(|s| set.slot(*s).iter().filter(|p| p.field_id == id).count())
                .sum::<usize>();
            assert!(count <= 1, "{} placed {} times", id, count);
        }
        assert!(set.validate(&registry, MODEL).is_ok());
    }
}

#[test]
fn test_validate_catches_deserialized_duplicates() {
    let registry = registry();
    let json = r#"{
        "rows": [{"field_id": "region", "name": "Region"}],
        "columns": [{"field_id": "region", "name": "Region"}],
        "values": []
    }"#;
    let set: PlacementSet = serde_json::from_str(json).unwrap();
    assert!(matches!(
        set.validate(&registry, MODEL),
        Err(PlacementError::AlreadyPlaced { .. })
    ));
}

#[test]
fn test_validate_checks_aggregation_against_slot() {
    let registry = registry();
    let json = r#"{
        "rows": [{"field_id": "region", "name": "Region", "aggregation": "sum"}],
        "columns": [],
        "values": []
    }"#;
    let set: PlacementSet = serde_json::from_str(json).unwrap();
    assert_eq!(
        set.validate(&registry, MODEL),
        Err(PlacementError::AggregationMismatch {
            field: "region".into(),
            slot: Slot::Rows
        })
    );

    let json = r#"{
        "rows": [],
        "columns": [],
        "values": [{"field_id": "amount", "name": "Amount"}]
    }"#;
    let set: PlacementSet = serde_json::from_str(json).unwrap();
    assert!(matches!(
        set.validate(&registry, MODEL),
        Err(PlacementError::AggregationMismatch { slot: Slot::Values, .. })
    ));
}

// ========================================
// FILTER TESTS
// ========================================

#[test]
fn test_operator_tables_are_distinct() {
    let tables: Vec<_> = [
        DataType::String,
        DataType::Integer,
        DataType::Decimal,
        DataType::Date,
        DataType::Boolean,
    ]
    .into_iter()
    .map(operators_for)
    .collect();
    for (i, a) in tables.iter().enumerate() {
        assert_eq!(a[0], FilterOperator::Equals);
        for b in &tables[i + 1..] {
            assert_ne!(a, b);
        }
    }
    assert!(FilterOperator::Contains.supports(DataType::String));
    assert!(!FilterOperator::Contains.supports(DataType::Integer));
    assert!(FilterOperator::Before.supports(DataType::Date));
    assert!(!FilterOperator::GreaterThan.supports(DataType::Boolean));
}

#[test]
fn test_operator_from_str() {
    assert_eq!("greater_than".parse::<FilterOperator>(), Ok(FilterOperator::GreaterThan));
    assert_eq!(" NOT_IN ".parse::<FilterOperator>(), Ok(FilterOperator::NotIn));
    assert!("like".parse::<FilterOperator>().is_err());
}

#[test]
fn test_empty_expression() {
    assert_eq!(FilterBuilder::new().render_expression(), "");
}

#[test]
fn test_single_condition_has_no_joiner() {
    let registry = registry();
    let mut filters = FilterBuilder::new();
    filters
        .add_condition(field(&registry, "status"), FilterOperator::Equals, text("paid"), Joiner::Or)
        .unwrap();
    assert_eq!(filters.render_expression(), "status equals paid");
}

#[test]
fn test_two_condition_expression() {
    let registry = registry();
    let mut filters = FilterBuilder::new();
    filters
        .add_condition(field(&registry, "amount"), FilterOperator::GreaterThan, int(100), Joiner::And)
        .unwrap();
    filters
        .add_condition(field(&registry, "status"), FilterOperator::Equals, text("paid"), Joiner::And)
        .unwrap();
    assert_eq!(
        filters.render_expression(),
        "amount greater_than 100 AND status equals paid"
    );
}

#[test]
fn test_value_shapes_render() {
    let registry = registry();
    let mut filters = FilterBuilder::new();
    filters
        .add_condition(
            field(&registry, "quantity"),
            FilterOperator::Between,
            Some(ConditionValue::Pair(ScalarValue::Integer(1), ScalarValue::Integer(10))),
            Joiner::And,
        )
        .unwrap();
    filters
        .add_condition(
            field(&registry, "region"),
            FilterOperator::In,
            Some(ConditionValue::List(smallvec![
                ScalarValue::Text("north".into()),
                ScalarValue::Text("south".into()),
            ])),
            Joiner::Or,
        )
        .unwrap();
    filters
        .add_condition(field(&registry, "status"), FilterOperator::IsNotEmpty, None, Joiner::And)
        .unwrap();
    filters
        .add_condition(
            field(&registry, "order_date"),
            FilterOperator::After,
            Some(ScalarValue::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()).into()),
            Joiner::And,
        )
        .unwrap();

    assert_eq!(
        filters.render_expression(),
        "quantity between 1,10 OR region in north,south AND status is_not_empty AND order_date after 2024-03-01"
    );
    assert!(filters.has_mixed_joiners());
}

#[test]
fn test_custom_delimiter() {
    let registry = registry();
    let mut filters = FilterBuilder::with_delimiter(" | ");
    filters
        .add_condition(
            field(&registry, "quantity"),
            FilterOperator::NotIn,
            Some(ConditionValue::List(smallvec![ScalarValue::Integer(3), ScalarValue::Integer(4)])),
            Joiner::And,
        )
        .unwrap();
    assert_eq!(filters.render_expression(), "quantity not_in 3 | 4");
}

#[test]
fn test_add_rejects_invalid_conditions() {
    let registry = registry();
    let mut filters = FilterBuilder::new();
    let status = field(&registry, "status");
    let amount = field(&registry, "amount");

    assert!(matches!(
        filters.add_condition(status, FilterOperator::GreaterThan, text("a"), Joiner::And),
        Err(FilterError::UnsupportedOperator { .. })
    ));
    assert!(matches!(
        filters.add_condition(status, FilterOperator::Equals, None, Joiner::And),
        Err(FilterError::MissingValue { .. })
    ));
    assert!(matches!(
        filters.add_condition(status, FilterOperator::IsEmpty, text("x"), Joiner::And),
        Err(FilterError::UnexpectedValue(FilterOperator::IsEmpty))
    ));
    assert!(matches!(
        filters.add_condition(amount, FilterOperator::Between, int(5), Joiner::And),
        Err(FilterError::ShapeMismatch { .. })
    ));
    assert!(matches!(
        filters.add_condition(amount, FilterOperator::Equals, text("five"), Joiner::And),
        Err(FilterError::TypeMismatch { .. })
    ));
    assert!(matches!(
        filters.add_condition(
            status,
            FilterOperator::In,
            Some(ConditionValue::List(smallvec![])),
            Joiner::And
        ),
        Err(FilterError::EmptyList(FilterOperator::In))
    ));
    assert!(filters.is_empty());
}

#[test]
fn test_decimal_field_accepts_integer_literal() {
    let registry = registry();
    let mut filters = FilterBuilder::new();
    let amount = field(&registry, "amount");
    filters.add_condition(amount, FilterOperator::LessThan, int(5), Joiner::And).unwrap();
    filters
        .add_condition(
            amount,
            FilterOperator::GreaterThan,
            Some(ScalarValue::Decimal(2.5).into()),
            Joiner::And,
        )
        .unwrap();
    assert_eq!(filters.render_expression(), "amount less_than 5 AND amount greater_than 2.5");

    let quantity = field(&registry, "quantity");
    assert!(filters
        .add_condition(quantity, FilterOperator::Equals, Some(ScalarValue::Decimal(1.5).into()), Joiner::And)
        .is_err());
}

#[test]
fn test_edit_operator_clears_value() {
    let registry = registry();
    let mut filters = FilterBuilder::new();
    let id = filters
        .add_condition(field(&registry, "amount"), FilterOperator::GreaterThan, int(100), Joiner::And)
        .unwrap();

    filters
        .edit_condition(
            id,
            ConditionEdit {
                operator: Some(FilterOperator::Between),
                ..Default::default()
            },
        )
        .unwrap();
    let condition = filters.get(id).unwrap();
    assert_eq!(condition.operator, FilterOperator::Between);
    assert_eq!(condition.value, None);
    assert!(!condition.is_complete());
    assert_eq!(filters.render_expression(), "");
    assert_eq!(filters.validate(), Err(FilterError::Incomplete(vec![id])));

    filters
        .edit_condition(
            id,
            ConditionEdit {
                value: Some(ConditionValue::Pair(ScalarValue::Integer(1), ScalarValue::Integer(2))),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(filters.render_expression(), "amount between 1,2");
    assert!(filters.validate().is_ok());
}

#[test]
fn test_edit_operator_and_value_together() {
    let registry = registry();
    let mut filters = FilterBuilder::new();
    let id = filters
        .add_condition(field(&registry, "status"), FilterOperator::Equals, text("paid"), Joiner::And)
        .unwrap();
    filters
        .edit_condition(
            id,
            ConditionEdit {
                operator: Some(FilterOperator::Contains),
                value: text("pend"),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(filters.render_expression(), "status contains pend");
}

#[test]
fn test_edit_field_resets_incompatible_operator() {
    let registry = registry();
    let mut filters = FilterBuilder::new();
    let id = filters
        .add_condition(field(&registry, "status"), FilterOperator::Contains, text("x"), Joiner::And)
        .unwrap();
    filters
        .edit_condition(
            id,
            ConditionEdit {
                field: Some(field(&registry, "quantity")),
                ..Default::default()
            },
        )
        .unwrap();
    let condition = filters.get(id).unwrap();
    assert_eq!(condition.field, "quantity");
    assert_eq!(condition.data_type, DataType::Integer);
    assert_eq!(condition.operator, FilterOperator::Equals);
    assert_eq!(condition.value, None);
}

#[test]
fn test_failed_edit_leaves_condition_unchanged() {
    let registry = registry();
    let mut filters = FilterBuilder::new();
    let id = filters
        .add_condition(field(&registry, "status"), FilterOperator::Equals, text("paid"), Joiner::And)
        .unwrap();
    let before = filters.clone();

    let err = filters
        .edit_condition(
            id,
            ConditionEdit {
                operator: Some(FilterOperator::StartsWith),
                value: int(4),
                joiner: Some(Joiner::Or),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, FilterError::TypeMismatch { .. }));
    assert_eq!(filters, before);

    assert_eq!(
        filters.edit_condition(99, ConditionEdit::default()),
        Err(FilterError::UnknownCondition(99))
    );
}

#[test]
fn test_remove_and_move_conditions() {
    let registry = registry();
    let mut filters = FilterBuilder::new();
    let a = filters
        .add_condition(field(&registry, "status"), FilterOperator::Equals, text("paid"), Joiner::And)
        .unwrap();
    let b = filters
        .add_condition(field(&registry, "region"), FilterOperator::Equals, text("west"), Joiner::Or)
        .unwrap();
    let c = filters
        .add_condition(field(&registry, "quantity"), FilterOperator::GreaterThan, int(2), Joiner::And)
        .unwrap();

    filters.move_condition(c, 0).unwrap();
    assert_eq!(
        filters.render_expression(),
        "quantity greater_than 2 AND status equals paid OR region equals west"
    );

    filters.remove_condition(c).unwrap();
    // The new first condition drops its joiner from the output.
    assert_eq!(filters.render_expression(), "status equals paid OR region equals west");
    assert_eq!(filters.remove_condition(c), Err(FilterError::UnknownCondition(c)));

    filters.remove_condition(a).unwrap();
    assert_eq!(filters.render_expression(), "region equals west");
    assert!(!filters.has_mixed_joiners());

    assert!(filters.move_condition(b, 3).is_err());
    let d = filters
        .add_condition(field(&registry, "status"), FilterOperator::IsEmpty, None, Joiner::And)
        .unwrap();
    assert!(d > c);
}

#[test]
fn test_apply_filter_actions() {
    let registry = registry();
    let mut filters = FilterBuilder::new();
    let id = filters
        .apply(
            &registry,
            MODEL,
            FilterAction::Add {
                field: "amount".into(),
                operator: FilterOperator::GreaterThan,
                value: int(100),
                joiner: None,
            },
        )
        .unwrap()
        .unwrap();
    filters
        .apply(
            &registry,
            MODEL,
            FilterAction::Add {
                field: "status".into(),
                operator: FilterOperator::Equals,
                value: text("paid"),
                joiner: None,
            },
        )
        .unwrap();
    assert_eq!(
        filters.render_expression(),
        "amount greater_than 100 AND status equals paid"
    );

    let err = filters
        .apply(
            &registry,
            MODEL,
            FilterAction::Add {
                field: "ghost".into(),
                operator: FilterOperator::Equals,
                value: text("x"),
                joiner: None,
            },
        )
        .unwrap_err();
    assert!(matches!(err, FilterError::UnknownField { .. }));

    filters
        .apply(
            &registry,
            MODEL,
            FilterAction::Edit {
                id,
                field: None,
                operator: None,
                value: None,
                joiner: Some(Joiner::Or),
            },
        )
        .unwrap();
    filters.apply(&registry, MODEL, FilterAction::Move { id, index: 1 }).unwrap();
    assert_eq!(
        filters.render_expression(),
        "status equals paid OR amount greater_than 100"
    );

    filters.apply(&registry, MODEL, FilterAction::Clear).unwrap();
    assert!(filters.is_empty());
}

#[test]
fn test_from_conditions_continues_ids() {
    let registry = registry();
    let mut filters = FilterBuilder::new();
    filters
        .add_condition(field(&registry, "status"), FilterOperator::Equals, text("paid"), Joiner::And)
        .unwrap();
    filters
        .add_condition(field(&registry, "region"), FilterOperator::Equals, text("west"), Joiner::And)
        .unwrap();

    let mut restored = FilterBuilder::from_conditions(filters.conditions().to_vec(), ",").unwrap();
    assert!(restored.validate_against(&registry, MODEL).is_ok());
    let next = restored
        .add_condition(field(&registry, "status"), FilterOperator::IsEmpty, None, Joiner::And)
        .unwrap();
    assert_eq!(next, 3);
}

#[test]
fn test_blank_text_is_a_missing_value() {
    let registry = registry();
    let mut filters = FilterBuilder::new();
    for blank in ["", "   "] {
        let err = filters
            .add_condition(field(&registry, "status"), FilterOperator::Equals, text(blank), Joiner::And)
            .unwrap_err();
        assert!(matches!(err, FilterError::MissingValue { .. }));
    }
    let err = filters
        .add_condition(
            field(&registry, "region"),
            FilterOperator::In,
            Some(ConditionValue::List(smallvec![
                ScalarValue::Text("north".into()),
                ScalarValue::Text(" ".into()),
            ])),
            Joiner::And,
        )
        .unwrap_err();
    assert!(matches!(err, FilterError::MissingValue { .. }));
    assert!(filters.is_empty());
    assert_eq!(filters.render_expression(), "");

    // Blank values from a saved record count as incomplete.
    let id = filters
        .add_condition(field(&registry, "status"), FilterOperator::Equals, text("paid"), Joiner::And)
        .unwrap();
    let mut saved = filters.conditions().to_vec();
    saved[0].value = text("");
    let restored = FilterBuilder::from_conditions(saved, ",").unwrap();
    assert_eq!(restored.incomplete(), vec![id]);
    assert_eq!(restored.render_expression(), "");
}

#[test]
fn test_list_items_cannot_contain_delimiter() {
    let registry = registry();
    let mut filters = FilterBuilder::new();
    let err = filters
        .add_condition(
            field(&registry, "region"),
            FilterOperator::In,
            Some(ConditionValue::List(smallvec![ScalarValue::Text("a,b".into())])),
            Joiner::And,
        )
        .unwrap_err();
    assert_eq!(
        err,
        FilterError::DelimiterInValue {
            value: "a,b".into(),
            delimiter: ",".into()
        }
    );

    // A single value may contain it.
    filters
        .add_condition(field(&registry, "region"), FilterOperator::Equals, text("a,b"), Joiner::And)
        .unwrap();
    let mut semicolons = FilterBuilder::with_delimiter(";");
    semicolons
        .add_condition(
            field(&registry, "region"),
            FilterOperator::In,
            Some(ConditionValue::List(smallvec![ScalarValue::Text("a,b".into())])),
            Joiner::And,
        )
        .unwrap();
    assert_eq!(semicolons.render_expression(), "region in a,b");
}

#[test]
fn test_from_conditions_rejects_duplicate_ids() {
    let registry = registry();
    let mut filters = FilterBuilder::new();
    filters
        .add_condition(field(&registry, "status"), FilterOperator::Equals, text("paid"), Joiner::And)
        .unwrap();
    filters
        .add_condition(field(&registry, "region"), FilterOperator::Equals, text("west"), Joiner::And)
        .unwrap();

    let mut saved = filters.conditions().to_vec();
    saved[1].id = saved[0].id;
    assert_eq!(
        FilterBuilder::from_conditions(saved, ",").unwrap_err(),
        FilterError::DuplicateCondition(1)
    );
}

#[test]
fn test_condition_ids_do_not_overflow() {
    let registry = registry();
    let mut filters = FilterBuilder::new();
    filters
        .add_condition(field(&registry, "status"), FilterOperator::Equals, text("paid"), Joiner::And)
        .unwrap();

    let mut saved = filters.conditions().to_vec();
    saved[0].id = u32::MAX;
    assert_eq!(
        FilterBuilder::from_conditions(saved.clone(), ",").unwrap_err(),
        FilterError::IdsExhausted
    );

    saved[0].id = u32::MAX - 1;
    let mut restored = FilterBuilder::from_conditions(saved, ",").unwrap();
    let err = restored
        .add_condition(field(&registry, "region"), FilterOperator::IsEmpty, None, Joiner::And)
        .unwrap_err();
    assert_eq!(err, FilterError::IdsExhausted);
    assert_eq!(restored.len(), 1);
}

// ========================================
// PREVIEW TESTS
// ========================================

#[test]
fn test_preview_empty_set() {
    assert_eq!(render_preview(&PlacementSet::new(), 5), PreviewView::Empty);
    assert!(render_preview(&PlacementSet::new(), 0).is_empty());
}

#[test]
fn test_preview_rows_and_values() {
    let registry = registry();
    let mut set = PlacementSet::new();
    set.place(&registry, MODEL, "region", Slot::Rows).unwrap();
    set.place(&registry, MODEL, "amount", Slot::Values).unwrap();

    let PreviewView::Table(table) = render_preview(&set, 3) else {
        panic!("expected a table");
    };
    assert_eq!(table.headers, vec!["Region", "Sum of Amount"]);
    assert_eq!(table.rows.len(), 3);
    assert_eq!(table.rows[0][0], PreviewCell::Label("Region 1".into()));
    assert_eq!(table.rows[2][1], PreviewCell::Number(30.0));
    assert!(!table.truncated);
}

#[test]
fn test_preview_columns_cross_values() {
    let registry = registry();
    let mut set = PlacementSet::new();
    set.place(&registry, MODEL, "status", Slot::Columns).unwrap();
    set.place(&registry, MODEL, "amount", Slot::Values).unwrap();
    set.place(&registry, MODEL, "quantity", Slot::Values).unwrap();

    let PreviewView::Table(table) = render_preview(&set, 4) else {
        panic!("expected a table");
    };
    assert_eq!(table.headers.len(), 1 + 4);
    assert_eq!(table.headers[1], "Status 1 / Sum of Amount");
    // No row fields: a single total row.
    assert_eq!(table.rows.len(), 1);
    assert_eq!(table.rows[0][0], PreviewCell::Label("Total".into()));
}

#[test]
fn test_preview_without_values_is_blank() {
    let registry = registry();
    let mut set = PlacementSet::new();
    set.place(&registry, MODEL, "region", Slot::Rows).unwrap();
    set.place(&registry, MODEL, "status", Slot::Columns).unwrap();

    let PreviewView::Table(table) = render_preview(&set, 2) else {
        panic!("expected a table");
    };
    assert_eq!(table.headers, vec!["Region", "Status 1", "Status 2"]);
    assert!(table.rows.iter().all(|r| r[1..].iter().all(|c| *c == PreviewCell::Blank)));
}

#[test]
fn test_preview_rows_are_capped() {
    let registry = registry();
    let mut set = PlacementSet::new();
    set.place(&registry, MODEL, "region", Slot::Rows).unwrap();

    let PreviewView::Table(table) = render_preview(&set, usize::MAX) else {
        panic!("expected a table");
    };
    assert_eq!(table.rows.len(), MAX_PREVIEW_ROWS);
}

// ========================================
// REPORT EDITOR TESTS
// ========================================

#[test]
fn test_editor_unknown_model() {
    let registry = registry();
    assert!(matches!(
        ReportEditor::new(&registry, "nope"),
        Err(ConfigError::Registry(RegistryError::UnknownModel(_)))
    ));
}

#[test]
fn test_editor_build_and_hydrate() {
    let registry = registry();
    let mut editor = ReportEditor::new(&registry, MODEL).unwrap();
    editor.apply(&registry, ReportAction::SetName(" Weekly ".into())).unwrap();
    editor
        .apply(
            &registry,
            ReportAction::Placement(PlacementAction::Place { field: "region".into(), slot: Slot::Rows }),
        )
        .unwrap();
    let id = editor
        .apply(
            &registry,
            ReportAction::Filter(FilterAction::Add {
                field: "status".into(),
                operator: FilterOperator::Equals,
                value: text("paid"),
                joiner: None,
            }),
        )
        .unwrap();
    assert_eq!(id, Some(1));

    let config = editor.build(&registry).unwrap();
    assert_eq!(config.name, "Weekly");
    assert_eq!(config.filters.len(), 1);

    let json = serde_json::to_string(&config).unwrap();
    let restored = serde_json::from_str(&json).unwrap();
    let hydrated = ReportEditor::hydrate(&registry, restored, ",").unwrap();
    assert_eq!(hydrated.placements(), editor.placements());
    assert_eq!(hydrated.render_expression(), "status equals paid");
}

#[test]
fn test_editor_rejections_keep_state() {
    let registry = registry();
    let mut editor = ReportEditor::new(&registry, MODEL).unwrap();
    assert_eq!(editor.build(&registry).unwrap_err(), ConfigError::EmptyName);

    let err = editor
        .apply(
            &registry,
            ReportAction::Placement(PlacementAction::Place { field: "amount".into(), slot: Slot::Rows }),
        )
        .unwrap_err();
    assert!(matches!(err, ConfigError::Placement(PlacementError::RoleMismatch { .. })));
    assert!(editor.placements().is_empty());
}

#[test]
fn test_build_rejects_incomplete_filters() {
    let registry = registry();
    let mut editor = ReportEditor::new(&registry, MODEL).unwrap();
    editor.apply(&registry, ReportAction::SetName("R".into())).unwrap();
    let id = editor
        .apply(
            &registry,
            ReportAction::Filter(FilterAction::Add {
                field: "amount".into(),
                operator: FilterOperator::Equals,
                value: int(1),
                joiner: None,
            }),
        )
        .unwrap()
        .unwrap();
    editor
        .apply(
            &registry,
            ReportAction::Filter(FilterAction::Edit {
                id,
                field: None,
                operator: Some(FilterOperator::NotEquals),
                value: None,
                joiner: None,
            }),
        )
        .unwrap();
    assert_eq!(
        editor.build(&registry).unwrap_err(),
        ConfigError::Filter(FilterError::Incomplete(vec![id]))
    );
}

#[test]
fn test_hydrate_rejects_role_mismatch() {
    let registry = registry();
    let json = r#"{
        "name": "Broken",
        "model": "orders",
        "placements": {
            "rows": [{"field_id": "amount", "name": "Amount"}],
            "columns": [],
            "values": []
        }
    }"#;
    let config = serde_json::from_str(json).unwrap();
    assert!(matches!(
        ReportEditor::hydrate(&registry, config, ","),
        Err(ConfigError::Placement(PlacementError::RoleMismatch { .. }))
    ));
}

#[test]
fn test_hydrate_checks_condition_ids() {
    let registry = registry();
    let mut editor = ReportEditor::new(&registry, MODEL).unwrap();
    editor.apply(&registry, ReportAction::SetName("Ids".into())).unwrap();
    for (field, value) in [("status", "paid"), ("region", "west")] {
        editor
            .apply(
                &registry,
                ReportAction::Filter(FilterAction::Add {
                    field: field.into(),
                    operator: FilterOperator::Equals,
                    value: text(value),
                    joiner: None,
                }),
            )
            .unwrap();
    }
    let config = editor.build(&registry).unwrap();

    let mut duplicated = config.clone();
    duplicated.filters[1].id = duplicated.filters[0].id;
    assert_eq!(
        ReportEditor::hydrate(&registry, duplicated, ",").unwrap_err(),
        ConfigError::Filter(FilterError::DuplicateCondition(1))
    );

    let mut exhausted = config;
    exhausted.filters[0].id = u32::MAX;
    assert_eq!(
        ReportEditor::hydrate(&registry, exhausted, ",").unwrap_err(),
        ConfigError::Filter(FilterError::IdsExhausted)
    );
}
