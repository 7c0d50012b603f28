//! FILENAME: app/console/src/catalog.rs
// PURPOSE: Built-in data models offered by the console.
// CONTEXT: Stands in for a dataset metadata service. The editor only sees
//          these through the `FieldRegistry` trait.

use report_engine::{DataModel, DataType, Field, InMemoryRegistry, RegistryError};

pub const PRICE_COMPARISON: &str = "price_comparison";
pub const SALES_ORDERS: &str = "sales_orders";

type FieldSpec = (&'static str, &'static str, DataType);

const PRICE_DIMENSIONS: &[FieldSpec] = &[
    ("scheme", "Scheme", DataType::String),
    ("category", "Product Category", DataType::String),
    ("sku", "SKU", DataType::String),
    ("competitor", "Competitor", DataType::String),
    ("region", "Region", DataType::String),
    ("channel", "Channel", DataType::String),
    ("snapshot_date", "Snapshot Date", DataType::Date),
    ("in_stock", "In Stock", DataType::Boolean),
];

const PRICE_MEASURES: &[FieldSpec] = &[
    ("our_price", "Our Price", DataType::Decimal),
    ("competitor_price", "Competitor Price", DataType::Decimal),
    ("price_gap", "Price Gap", DataType::Decimal),
    ("units_sold", "Units Sold", DataType::Integer),
];

const ORDER_DIMENSIONS: &[FieldSpec] = &[
    ("order_id", "Order ID", DataType::String),
    ("customer", "Customer", DataType::String),
    ("status", "Status", DataType::String),
    ("order_date", "Order Date", DataType::Date),
    ("is_promo", "Promotion", DataType::Boolean),
];

const ORDER_MEASURES: &[FieldSpec] = &[
    ("amount", "Amount", DataType::Decimal),
    ("quantity", "Quantity", DataType::Integer),
];

fn build_model(
    id: &str,
    name: &str,
    description: &str,
    dimensions: &[FieldSpec],
    measures: &[FieldSpec],
) -> Result<DataModel, RegistryError> {
    let mut model = DataModel::new(id, name);
    model.description = Some(description.to_string());
    for &(field_id, label, data_type) in dimensions {
        model.add_field(Field::dimension(id, field_id, label, data_type))?;
    }
    for &(field_id, label, data_type) in measures {
        model.add_field(Field::measure(id, field_id, label, data_type)?)?;
    }
    Ok(model)
}

/// Registry preloaded with the built-in models.
pub fn builtin_registry() -> Result<InMemoryRegistry, RegistryError> {
    let mut registry = InMemoryRegistry::new();
    registry.add_model(build_model(
        PRICE_COMPARISON,
        "Price Comparison",
        "Our prices against competitor snapshots, per scheme",
        PRICE_DIMENSIONS,
        PRICE_MEASURES,
    )?)?;
    registry.add_model(build_model(
        SALES_ORDERS,
        "Sales Orders",
        "Order lines with amounts and quantities",
        ORDER_DIMENSIONS,
        ORDER_MEASURES,
    )?)?;
    Ok(registry)
}
