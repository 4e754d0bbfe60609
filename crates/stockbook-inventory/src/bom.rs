use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockbook_core::docno::{batch_no, manufacturing_order_no};
use stockbook_core::{
    BillOfMaterials, DocType, EntryDetails, LedgerEntry, ProductAttributes, StockPosition,
    ValidationError, WarehouseSet, check_amount,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionOrder {
    pub parent_sku: String,
    pub quantity: Decimal,
    pub warehouse: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub handler: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductionRun {
    pub order_no: String,
    pub issues: Vec<LedgerEntry>,
    pub receipt: LedgerEntry,
}

impl ProductionRun {
    // Component issues first, then the finished-goods receipt, so the
    // receipt never sees the components it consumed.
    pub fn into_entries(self) -> Vec<LedgerEntry> {
        let mut entries = self.issues;
        entries.push(self.receipt);
        entries
    }
}

pub fn plan_production(
    order: &ProductionOrder,
    bom: &BillOfMaterials,
    positions: &BTreeMap<String, StockPosition>,
    warehouses: &WarehouseSet,
    now: DateTime<Utc>,
) -> Result<ProductionRun, ValidationError> {
    bom.validate()?;
    if order.quantity <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveQuantity);
    }
    check_amount(order.quantity, "quantity")?;
    if order.parent_sku.trim() != bom.parent_sku.trim() {
        return Err(ValidationError::UnknownSku(order.parent_sku.trim().to_string()));
    }
    let warehouse = warehouses.require(&order.warehouse)?;

    let order_no = manufacturing_order_no(&now);
    let date = order.date.unwrap_or_else(|| now.date_naive());
    let details = EntryDetails {
        handler: order.handler.clone(),
        order_no: order_no.clone(),
        notes: order.notes.clone(),
        ..EntryDetails::default()
    };

    let mut issues = Vec::with_capacity(bom.components.len());
    let mut parent_cost = Decimal::ZERO;
    for line in &bom.components {
        let component_sku = line.sku.trim();
        let component = positions
            .get(component_sku)
            .ok_or_else(|| ValidationError::UnknownSku(component_sku.to_string()))?;

        let quantity = line
            .quantity_per
            .checked_mul(order.quantity)
            .ok_or(ValidationError::OutOfRange("quantity"))?;
        check_amount(quantity, "quantity")?;
        parent_cost = quantity
            .checked_mul(component.avg_unit_cost)
            .and_then(|cost| parent_cost.checked_add(cost))
            .ok_or(ValidationError::OutOfRange("total_cost"))?;

        issues.push(
            LedgerEntry::new(
                DocType::ManufactureIssue,
                order_no.clone(),
                date,
                component_sku,
                warehouse.clone(),
                quantity,
            )
            .with_product(component.attributes.clone())
            .with_details(details.clone()),
        );
    }

    check_amount(parent_cost, "total_cost")?;

    let parent_sku = bom.parent_sku.trim();
    let parent_attributes = positions
        .get(parent_sku)
        .map(|position| position.attributes.clone())
        .unwrap_or_else(ProductAttributes::default);

    let receipt = LedgerEntry::new(
        DocType::ManufactureReceipt,
        order_no.clone(),
        date,
        parent_sku,
        warehouse,
        order.quantity,
    )
    .with_total_cost(parent_cost)
    .with_product(parent_attributes)
    .with_details(EntryDetails {
        batch_no: batch_no("PD", &now),
        ..details
    });

    Ok(ProductionRun {
        order_no,
        issues,
        receipt,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use stockbook_core::{BomLine, ReducerPolicy};

    use super::*;
    use crate::reducer::reduce;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 2, 8, 15, 0).unwrap()
    }

    fn teapot_bom() -> BillOfMaterials {
        BillOfMaterials {
            parent_sku: "TEAPOT".to_string(),
            components: vec![
                BomLine {
                    sku: "CLAY".to_string(),
                    quantity_per: dec!(2),
                },
                BomLine {
                    sku: "GLAZE".to_string(),
                    quantity_per: dec!(0.5),
                },
            ],
        }
    }

    fn order(quantity: Decimal) -> ProductionOrder {
        ProductionOrder {
            parent_sku: "TEAPOT".to_string(),
            quantity,
            warehouse: "Imeng".to_string(),
            date: None,
            handler: "James".to_string(),
            notes: String::new(),
        }
    }

    fn stocked() -> BTreeMap<String, StockPosition> {
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let entries = vec![
            LedgerEntry::new(DocType::Purchase, "P1", day, "CLAY", "Imeng", dec!(100))
                .with_total_cost(dec!(300)),
            LedgerEntry::new(DocType::Purchase, "P2", day, "GLAZE", "Imeng", dec!(10)),
        ];
        reduce(&entries, &[], &WarehouseSet::default(), ReducerPolicy::default()).positions
    }

    #[test]
    fn explodes_components_and_costs_parent() {
        let run = plan_production(
            &order(dec!(4)),
            &teapot_bom(),
            &stocked(),
            &WarehouseSet::default(),
            now(),
        )
        .unwrap();

        assert_eq!(run.order_no, "MO-240502-0815");
        assert_eq!(run.issues.len(), 2);
        assert_eq!(run.issues[0].sku, "CLAY");
        assert_eq!(run.issues[0].quantity, dec!(8));
        assert_eq!(run.issues[1].quantity, dec!(2));
        // Glaze has no known cost, so only clay is carried: 8 * 3.
        assert_eq!(run.receipt.total_cost, dec!(24));
        assert_eq!(run.receipt.details.batch_no, "PD-2405020815");

        let entries = run.into_entries();
        assert!(entries.iter().all(|entry| entry.doc_no == "MO-240502-0815"));
        assert_eq!(entries.last().unwrap().doc_type, DocType::ManufactureReceipt);
    }

    #[test]
    fn produced_goods_carry_component_cost_through_reducer() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let mut ledger = vec![
            LedgerEntry::new(DocType::Purchase, "P1", day, "CLAY", "Imeng", dec!(100))
                .with_total_cost(dec!(300)),
            LedgerEntry::new(DocType::Purchase, "P2", day, "GLAZE", "Imeng", dec!(10))
                .with_total_cost(dec!(50)),
        ];
        let positions =
            reduce(&ledger, &[], &WarehouseSet::default(), ReducerPolicy::default()).positions;

        let run = plan_production(
            &order(dec!(4)),
            &teapot_bom(),
            &positions,
            &WarehouseSet::default(),
            now(),
        )
        .unwrap();
        ledger.extend(run.into_entries());

        let after = reduce(&ledger, &[], &WarehouseSet::default(), ReducerPolicy::default());
        assert_eq!(after.positions["TEAPOT"].total_qty, dec!(4));
        assert_eq!(after.positions["TEAPOT"].cost_basis, dec!(34));
        assert_eq!(after.positions["CLAY"].total_qty, dec!(92));
        assert_eq!(after.positions["GLAZE"].cost_basis, dec!(40));
    }

    #[test]
    fn rejects_unknown_component_and_bad_orders() {
        let mut positions = stocked();
        positions.remove("GLAZE");

        assert_eq!(
            plan_production(
                &order(dec!(1)),
                &teapot_bom(),
                &positions,
                &WarehouseSet::default(),
                now()
            ),
            Err(ValidationError::UnknownSku("GLAZE".to_string()))
        );
        assert_eq!(
            plan_production(
                &order(Decimal::ZERO),
                &teapot_bom(),
                &stocked(),
                &WarehouseSet::default(),
                now()
            ),
            Err(ValidationError::NonPositiveQuantity)
        );

        let elsewhere = ProductionOrder {
            warehouse: "Garage".to_string(),
            ..order(dec!(1))
        };
        assert_eq!(
            plan_production(
                &elsewhere,
                &teapot_bom(),
                &stocked(),
                &WarehouseSet::default(),
                now()
            ),
            Err(ValidationError::UnknownWarehouse("Garage".to_string()))
        );
    }

    #[test]
    fn oversized_orders_are_rejected() {
        assert_eq!(
            plan_production(
                &order(dec!(50000000000000000000000000000)),
                &teapot_bom(),
                &stocked(),
                &WarehouseSet::default(),
                now()
            ),
            Err(ValidationError::OutOfRange("quantity"))
        );
        // Within bounds per order, but clay needs twice as much.
        assert_eq!(
            plan_production(
                &order(dec!(600000000000000)),
                &teapot_bom(),
                &stocked(),
                &WarehouseSet::default(),
                now()
            ),
            Err(ValidationError::OutOfRange("quantity"))
        );
    }
}
