use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockbook_core::docno::{generate_doc_no, opening_batch_no};
use stockbook_core::{
    DocType, EntryDetails, LedgerEntry, Product, ProductAttributes, WarehouseSet, check_amount,
};
use tracing::debug;

pub const OPENING_HANDLER: &str = "opening import";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpeningRow {
    pub sku: String,
    pub quantity: Decimal,
    #[serde(default)]
    pub total_cost: Decimal,
    #[serde(default)]
    pub warehouse: Option<String>,
    #[serde(default)]
    pub attributes: Option<ProductAttributes>,
}

pub fn opening_entries(
    rows: &[OpeningRow],
    catalog: &[Product],
    warehouses: &WarehouseSet,
    default_warehouse: &str,
    now: DateTime<Utc>,
) -> Vec<LedgerEntry> {
    let catalog: HashMap<&str, &Product> = catalog
        .iter()
        .map(|product| (product.sku.as_str(), product))
        .collect();
    let fallback_warehouse = warehouses
        .resolve(default_warehouse)
        .unwrap_or_else(|| warehouses.default_warehouse())
        .to_string();
    let date = now.date_naive();

    let mut entries = Vec::new();
    for row in rows {
        let sku = row.sku.trim();
        if sku.is_empty() || row.quantity <= Decimal::ZERO {
            debug!(sku, quantity = %row.quantity, "opening row skipped");
            continue;
        }
        if row.total_cost < Decimal::ZERO
            || check_amount(row.quantity, "quantity").is_err()
            || check_amount(row.total_cost, "total_cost").is_err()
        {
            debug!(
                sku,
                quantity = %row.quantity,
                total_cost = %row.total_cost,
                "opening row with out-of-range amounts skipped"
            );
            continue;
        }

        let warehouse = row
            .warehouse
            .as_deref()
            .and_then(|name| warehouses.resolve(name))
            .map(str::to_string)
            .unwrap_or_else(|| fallback_warehouse.clone());

        let attributes = match catalog.get(sku) {
            Some(product) => product.attributes.clone(),
            None => opening_attributes(sku, row.attributes.as_ref()),
        };

        entries.push(
            LedgerEntry::new(
                DocType::OpeningBalance,
                generate_doc_no(DocType::OpeningBalance, sku, &now),
                date,
                sku,
                warehouse,
                row.quantity,
            )
            .with_total_cost(row.total_cost)
            .with_product(attributes)
            .with_details(EntryDetails {
                batch_no: opening_batch_no(date),
                handler: OPENING_HANDLER.to_string(),
                notes: OPENING_HANDLER.to_string(),
                ..EntryDetails::default()
            }),
        );
    }
    entries
}

fn opening_attributes(sku: &str, row: Option<&ProductAttributes>) -> ProductAttributes {
    let given = row.cloned().unwrap_or_default();
    let filled = |value: String, fallback: String| {
        if value.trim().is_empty() {
            fallback
        } else {
            value.trim().to_string()
        }
    };

    ProductAttributes {
        series: filled(given.series, "Opening".to_string()),
        category: filled(given.category, "Opening".to_string()),
        name: filled(given.name, format!("Unnamed-{sku}")),
        spec: given.spec.trim().to_string(),
    }
}
