use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ProductAttributes;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockPosition {
    pub sku: String,
    #[serde(flatten)]
    pub attributes: ProductAttributes,
    pub total_qty: Decimal,
    pub cost_basis: Decimal,
    pub avg_unit_cost: Decimal,
    pub qty_by_warehouse: BTreeMap<String, Decimal>,
}

impl StockPosition {
    pub fn warehouse_qty(&self, warehouse: &str) -> Decimal {
        self.qty_by_warehouse
            .get(warehouse)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn warehouse_total(&self) -> Decimal {
        self.qty_by_warehouse
            .values()
            .fold(Decimal::ZERO, |total, qty| total.saturating_add(*qty))
    }

    pub fn is_conserved(&self) -> bool {
        self.total_qty == self.warehouse_total()
    }

    pub fn inventory_value(&self) -> Decimal {
        self.cost_basis
    }
}

/// Data-quality finding raised while folding the ledger. Folding never
/// stops on these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReductionWarning {
    NegativeStock {
        entry_id: Uuid,
        sku: String,
        requested: Decimal,
        available: Decimal,
    },
    NegativeWarehouseStock {
        entry_id: Uuid,
        sku: String,
        warehouse: String,
        balance: Decimal,
        clamped: bool,
    },
    UnknownWarehouse {
        entry_id: Uuid,
        sku: String,
        warehouse: String,
        folded_into: String,
    },
    AmountOverflow {
        entry_id: Uuid,
        sku: String,
        quantity: Decimal,
        total_cost: Decimal,
    },
}

impl ReductionWarning {
    pub fn sku(&self) -> &str {
        match self {
            ReductionWarning::NegativeStock { sku, .. }
            | ReductionWarning::NegativeWarehouseStock { sku, .. }
            | ReductionWarning::UnknownWarehouse { sku, .. }
            | ReductionWarning::AmountOverflow { sku, .. } => sku,
        }
    }

    pub fn breaks_conservation(&self) -> bool {
        match self {
            ReductionWarning::NegativeStock { .. } => true,
            ReductionWarning::NegativeWarehouseStock { clamped, .. } => *clamped,
            ReductionWarning::UnknownWarehouse { .. } | ReductionWarning::AmountOverflow { .. } => {
                false
            }
        }
    }
}

impl fmt::Display for ReductionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReductionWarning::NegativeStock {
                entry_id,
                sku,
                requested,
                available,
            } => write!(
                f,
                "entry {entry_id}: {sku} issued {requested} with only {available} on hand, \
                 clamped to zero"
            ),
            ReductionWarning::NegativeWarehouseStock {
                entry_id,
                sku,
                warehouse,
                balance,
                clamped,
            } => write!(
                f,
                "entry {entry_id}: {sku} in {warehouse} went to {balance}{}",
                if *clamped { ", clamped to zero" } else { "" }
            ),
            ReductionWarning::UnknownWarehouse {
                entry_id,
                sku,
                warehouse,
                folded_into,
            } => write!(
                f,
                "entry {entry_id}: {sku} names unknown warehouse '{warehouse}', \
                 booked into {folded_into}"
            ),
            ReductionWarning::AmountOverflow {
                entry_id,
                sku,
                quantity,
                total_cost,
            } => write!(
                f,
                "entry {entry_id}: {sku} quantity {quantity} at cost {total_cost} \
                 is out of range, skipped"
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockSnapshot {
    pub ledger_version: u64,
    pub computed_at: DateTime<Utc>,
    pub positions: BTreeMap<String, StockPosition>,
    pub warnings: Vec<ReductionWarning>,
}

impl StockSnapshot {
    pub fn position(&self, sku: &str) -> Option<&StockPosition> {
        self.positions.get(sku)
    }

    pub fn inventory_value(&self) -> Decimal {
        self.positions
            .values()
            .fold(Decimal::ZERO, |total, position| {
                total.saturating_add(position.inventory_value())
            })
    }
}
