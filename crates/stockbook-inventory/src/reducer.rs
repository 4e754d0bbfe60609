use std::collections::BTreeMap;

use chrono::Utc;
use rust_decimal::Decimal;
use stockbook_core::{
    Direction, FoldOrder, LedgerEntry, LedgerState, Product, ProductAttributes, ReducerPolicy,
    ReductionWarning, StockPosition, StockSnapshot, WarehouseFloor, WarehouseSet,
};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct Reduction {
    pub positions: BTreeMap<String, StockPosition>,
    pub warnings: Vec<ReductionWarning>,
}

impl Reduction {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn into_snapshot(self, ledger_version: u64) -> StockSnapshot {
        StockSnapshot {
            ledger_version,
            computed_at: Utc::now(),
            positions: self.positions,
            warnings: self.warnings,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct OutOfRange;

fn average_of(cost_basis: Decimal, quantity: Decimal) -> Option<Decimal> {
    if quantity > Decimal::ZERO {
        cost_basis.checked_div(quantity)
    } else {
        Some(Decimal::ZERO)
    }
}

#[derive(Debug, Clone)]
struct SkuFold {
    sku: String,
    attributes: ProductAttributes,
    quantity_on_hand: Decimal,
    cost_basis: Decimal,
    by_warehouse: BTreeMap<String, Decimal>,
}

impl SkuFold {
    fn new(sku: &str, attributes: ProductAttributes, warehouses: &WarehouseSet) -> Self {
        Self {
            sku: sku.to_string(),
            attributes,
            quantity_on_hand: Decimal::ZERO,
            cost_basis: Decimal::ZERO,
            by_warehouse: warehouses
                .names()
                .iter()
                .map(|name| (name.clone(), Decimal::ZERO))
                .collect(),
        }
    }

    fn average_cost(&self) -> Option<Decimal> {
        average_of(self.cost_basis, self.quantity_on_hand)
    }

    fn warehouse_balance(&self, warehouse: &str) -> Decimal {
        self.by_warehouse
            .get(warehouse)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    // A zero cost means "not known yet" and stays out of the basis.
    fn receive(
        &mut self,
        warehouse: &str,
        quantity: Decimal,
        total_cost: Decimal,
    ) -> Result<(), OutOfRange> {
        let quantity_on_hand = self.quantity_on_hand.checked_add(quantity).ok_or(OutOfRange)?;
        let cost_basis = if total_cost > Decimal::ZERO {
            self.cost_basis.checked_add(total_cost).ok_or(OutOfRange)?
        } else {
            self.cost_basis
        };
        average_of(cost_basis, quantity_on_hand).ok_or(OutOfRange)?;
        let balance = self
            .warehouse_balance(warehouse)
            .checked_add(quantity)
            .ok_or(OutOfRange)?;

        self.quantity_on_hand = quantity_on_hand;
        self.cost_basis = cost_basis;
        self.by_warehouse.insert(warehouse.to_string(), balance);
        Ok(())
    }

    fn issue(
        &mut self,
        entry_id: Uuid,
        warehouse: &str,
        quantity: Decimal,
        floor: WarehouseFloor,
        warnings: &mut Vec<ReductionWarning>,
    ) -> Result<(), OutOfRange> {
        let average_cost = self.average_cost().ok_or(OutOfRange)?;
        let available = self.quantity_on_hand;

        let remaining = available.checked_sub(quantity).ok_or(OutOfRange)?;
        let cogs = quantity.checked_mul(average_cost).ok_or(OutOfRange)?;
        let cost_basis = self
            .cost_basis
            .checked_sub(cogs)
            .ok_or(OutOfRange)?
            .max(Decimal::ZERO);
        let quantity_on_hand = remaining.max(Decimal::ZERO);
        average_of(cost_basis, quantity_on_hand).ok_or(OutOfRange)?;
        let balance = self
            .warehouse_balance(warehouse)
            .checked_sub(quantity)
            .ok_or(OutOfRange)?;

        if remaining < Decimal::ZERO {
            warnings.push(ReductionWarning::NegativeStock {
                entry_id,
                sku: self.sku.clone(),
                requested: quantity,
                available,
            });
        }
        let clamped = balance < Decimal::ZERO && floor == WarehouseFloor::ClampAtZero;
        if balance < Decimal::ZERO {
            warnings.push(ReductionWarning::NegativeWarehouseStock {
                entry_id,
                sku: self.sku.clone(),
                warehouse: warehouse.to_string(),
                balance,
                clamped,
            });
        }

        self.quantity_on_hand = quantity_on_hand;
        self.cost_basis = cost_basis;
        let balance = if clamped { Decimal::ZERO } else { balance };
        self.by_warehouse.insert(warehouse.to_string(), balance);
        Ok(())
    }

    fn finish(self) -> StockPosition {
        // Every applied row left the average representable.
        let avg_unit_cost = self.average_cost().unwrap_or(Decimal::ZERO);
        StockPosition {
            sku: self.sku,
            attributes: self.attributes,
            total_qty: self.quantity_on_hand,
            cost_basis: self.cost_basis,
            avg_unit_cost,
            qty_by_warehouse: self.by_warehouse,
        }
    }
}

/// Folds the ledger into one position per SKU.
///
/// Every catalogued product gets a position, even without movements. A SKU
/// that only appears in the ledger is materialized from the attributes of
/// its first row. SKUs are independent, so a single pass over the ledger
/// covers all of them.
pub fn reduce(
    entries: &[LedgerEntry],
    products: &[Product],
    warehouses: &WarehouseSet,
    policy: ReducerPolicy,
) -> Reduction {
    let mut folds: BTreeMap<String, SkuFold> = BTreeMap::new();
    for product in products {
        folds
            .entry(product.sku.clone())
            .or_insert_with(|| SkuFold::new(&product.sku, product.attributes.clone(), warehouses));
    }

    let mut order: Vec<&LedgerEntry> = entries.iter().collect();
    if policy.fold_order == FoldOrder::Chronological {
        order.sort_by_key(|entry| entry.date);
    }

    let mut warnings = Vec::new();
    for entry in order {
        let fold = folds
            .entry(entry.sku.clone())
            .or_insert_with(|| SkuFold::new(&entry.sku, entry.product.clone(), warehouses));

        let warehouse = match warehouses.resolve(&entry.warehouse) {
            Some(known) => known,
            None => {
                let folded_into = warehouses.default_warehouse();
                warnings.push(ReductionWarning::UnknownWarehouse {
                    entry_id: entry.id,
                    sku: entry.sku.clone(),
                    warehouse: entry.warehouse.clone(),
                    folded_into: folded_into.to_string(),
                });
                folded_into
            }
        };

        let applied = match entry.doc_type.direction() {
            Direction::Inbound => fold.receive(warehouse, entry.quantity, entry.total_cost),
            Direction::Outbound => fold.issue(
                entry.id,
                warehouse,
                entry.quantity,
                policy.warehouse_floor,
                &mut warnings,
            ),
        };
        if applied.is_err() {
            warnings.push(ReductionWarning::AmountOverflow {
                entry_id: entry.id,
                sku: entry.sku.clone(),
                quantity: entry.quantity,
                total_cost: entry.total_cost,
            });
        }
    }

    debug!(
        entries = entries.len(),
        skus = folds.len(),
        warnings = warnings.len(),
        "ledger reduced"
    );

    Reduction {
        positions: folds
            .into_iter()
            .map(|(sku, fold)| (sku, fold.finish()))
            .collect(),
        warnings,
    }
}

pub fn snapshot(
    ledger: &LedgerState,
    products: &[Product],
    warehouses: &WarehouseSet,
    policy: ReducerPolicy,
) -> StockSnapshot {
    let entries = ledger.entries();
    reduce(&entries, products, warehouses, policy).into_snapshot(ledger.version)
}
