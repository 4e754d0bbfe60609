use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockbook_core::{DocType, LedgerEntry, ProductAttributes, StockPosition};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerFilter {
    #[serde(default)]
    pub doc_type: Option<DocType>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub warehouse: Option<String>,
    #[serde(default)]
    pub manufacturing: bool,
}

impl LedgerFilter {
    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        if let Some(doc_type) = self.doc_type {
            if entry.doc_type != doc_type {
                return false;
            }
        }
        if let Some(sku) = &self.sku {
            if entry.sku != sku.trim() {
                return false;
            }
        }
        if let Some(warehouse) = &self.warehouse {
            if entry.warehouse != warehouse.trim() {
                return false;
            }
        }
        !self.manufacturing || entry.doc_type.is_manufacturing()
    }
}

pub fn filter_entries<'a>(
    entries: &'a [LedgerEntry],
    filter: &LedgerFilter,
) -> Vec<&'a LedgerEntry> {
    entries.iter().filter(|entry| filter.matches(entry)).collect()
}

pub fn pending_costs(entries: &[LedgerEntry]) -> Vec<&LedgerEntry> {
    entries
        .iter()
        .filter(|entry| entry.doc_type == DocType::Purchase && entry.total_cost.is_zero())
        .collect()
}

pub fn sorted_positions<'a, I>(positions: I) -> Vec<&'a StockPosition>
where
    I: IntoIterator<Item = &'a StockPosition>,
{
    let mut sorted: Vec<&StockPosition> = positions.into_iter().collect();
    sorted.sort_by(|a, b| {
        let key = |position: &'a StockPosition| {
            (
                &position.attributes.series,
                &position.attributes.category,
                &position.attributes.name,
                &position.attributes.spec,
                &position.sku,
            )
        };
        key(*a).cmp(&key(*b))
    });
    sorted
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WarehouseRow {
    pub sku: String,
    pub name: String,
    pub qty_by_warehouse: BTreeMap<String, Decimal>,
    pub total_qty: Decimal,
}

pub fn warehouse_summary<'a, I>(positions: I) -> Vec<WarehouseRow>
where
    I: IntoIterator<Item = &'a StockPosition>,
{
    sorted_positions(positions)
        .into_iter()
        .map(|position| WarehouseRow {
            sku: position.sku.clone(),
            name: position.attributes.name.clone(),
            qty_by_warehouse: position.qty_by_warehouse.clone(),
            total_qty: position.total_qty,
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    pub total_qty: Decimal,
}

pub fn category_summary<'a, I>(positions: I) -> Vec<CategoryTotal>
where
    I: IntoIterator<Item = &'a StockPosition>,
{
    let mut totals: BTreeMap<&str, Decimal> = BTreeMap::new();
    for position in positions {
        *totals.entry(position.attributes.category.as_str()).or_default() += position.total_qty;
    }
    totals
        .into_iter()
        .map(|(category, total_qty)| CategoryTotal {
            category: category.to_string(),
            total_qty,
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SafePosition {
    pub sku: String,
    #[serde(flatten)]
    pub attributes: ProductAttributes,
    pub total_qty: Decimal,
    pub qty_by_warehouse: BTreeMap<String, Decimal>,
}

impl From<&StockPosition> for SafePosition {
    fn from(position: &StockPosition) -> Self {
        Self {
            sku: position.sku.clone(),
            attributes: position.attributes.clone(),
            total_qty: position.total_qty,
            qty_by_warehouse: position.qty_by_warehouse.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SafeEntry {
    pub id: Uuid,
    pub doc_type: DocType,
    pub doc_no: String,
    pub date: NaiveDate,
    pub sku: String,
    pub warehouse: String,
    pub quantity: Decimal,
    #[serde(flatten)]
    pub product: ProductAttributes,
    pub batch_no: String,
    pub handler: String,
    pub vendor: String,
    pub order_no: String,
    pub ship_date: Option<NaiveDate>,
    pub notes: String,
}

impl From<&LedgerEntry> for SafeEntry {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            id: entry.id,
            doc_type: entry.doc_type,
            doc_no: entry.doc_no.clone(),
            date: entry.date,
            sku: entry.sku.clone(),
            warehouse: entry.warehouse.clone(),
            quantity: entry.quantity,
            product: entry.product.clone(),
            batch_no: entry.details.batch_no.clone(),
            handler: entry.details.handler.clone(),
            vendor: entry.details.vendor.clone(),
            order_no: entry.details.order_no.clone(),
            ship_date: entry.details.ship_date,
            notes: entry.details.notes.clone(),
        }
    }
}
