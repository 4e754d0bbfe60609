use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockbook_core::docno::generate_doc_no;
use stockbook_core::{
    DocType, EntryDetails, LedgerEntry, StockPosition, ValidationError, WarehouseSet, check_amount,
};

pub const STOCKTAKE_HANDLER: &str = "stocktake";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockCount {
    pub sku: String,
    pub warehouse: String,
    pub counted: Decimal,
    #[serde(default = "default_reason")]
    pub reason: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

fn default_reason() -> String {
    "stocktake correction".to_string()
}

pub fn stocktake_entry(
    count: &StockCount,
    position: &StockPosition,
    warehouses: &WarehouseSet,
    now: DateTime<Utc>,
) -> Result<Option<LedgerEntry>, ValidationError> {
    if count.counted < Decimal::ZERO {
        return Err(ValidationError::NegativeAmount("counted"));
    }
    check_amount(count.counted, "counted")?;
    let warehouse = warehouses.require(&count.warehouse)?;

    let on_book = position.warehouse_qty(&warehouse);
    let difference = count
        .counted
        .checked_sub(on_book)
        .ok_or(ValidationError::OutOfRange("counted"))?;
    check_amount(difference.abs(), "quantity")?;
    if difference.is_zero() {
        return Ok(None);
    }

    let doc_type = if difference > Decimal::ZERO {
        DocType::AdjustmentIncrease
    } else {
        DocType::AdjustmentDecrease
    };

    let entry = LedgerEntry::new(
        doc_type,
        generate_doc_no(doc_type, &position.sku, &now),
        count.date.unwrap_or_else(|| now.date_naive()),
        position.sku.clone(),
        warehouse,
        difference.abs(),
    )
    .with_product(position.attributes.clone())
    .with_details(EntryDetails {
        handler: STOCKTAKE_HANDLER.to_string(),
        notes: format!(
            "{} (was {}, now {})",
            count.reason.trim(),
            on_book.normalize(),
            count.counted.normalize()
        ),
        ..EntryDetails::default()
    });

    Ok(Some(entry))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use stockbook_core::ReducerPolicy;

    use super::*;
    use crate::reducer::reduce;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 10, 0, 0).unwrap()
    }

    fn position(on_hand: Decimal) -> StockPosition {
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let entries = vec![
            LedgerEntry::new(DocType::Purchase, "P1", day, "CUP", "James", on_hand)
                .with_total_cost(on_hand * dec!(2)),
        ];
        reduce(&entries, &[], &WarehouseSet::default(), ReducerPolicy::default())
            .positions
            .remove("CUP")
            .unwrap()
    }

    fn count(counted: Decimal) -> StockCount {
        StockCount {
            sku: "CUP".to_string(),
            warehouse: "James".to_string(),
            counted,
            reason: "annual count".to_string(),
            date: None,
        }
    }

    #[test]
    fn matching_count_writes_nothing() {
        let entry =
            stocktake_entry(&count(dec!(10)), &position(dec!(10)), &WarehouseSet::default(), now())
                .unwrap();
        assert!(entry.is_none());
    }

    #[test]
    fn shortfall_becomes_decrease_of_the_difference() {
        let entry =
            stocktake_entry(&count(dec!(7)), &position(dec!(10)), &WarehouseSet::default(), now())
                .unwrap()
                .unwrap();

        assert_eq!(entry.doc_type, DocType::AdjustmentDecrease);
        assert_eq!(entry.quantity, dec!(3));
        assert_eq!(entry.warehouse, "James");
        assert_eq!(entry.details.handler, "stocktake");
        assert_eq!(entry.details.notes, "annual count (was 10, now 7)");
        assert!(entry.doc_no.starts_with("ADJ-"));
    }

    #[test]
    fn surplus_becomes_increase() {
        let entry =
            stocktake_entry(&count(dec!(12)), &position(dec!(10)), &WarehouseSet::default(), now())
                .unwrap()
                .unwrap();

        assert_eq!(entry.doc_type, DocType::AdjustmentIncrease);
        assert_eq!(entry.quantity, dec!(2));
        assert!(entry.total_cost.is_zero());
    }

    #[test]
    fn count_is_checked_against_the_named_warehouse() {
        let entry =
            stocktake_entry(
                &StockCount {
                    warehouse: "Wen".to_string(),
                    ..count(dec!(1))
                },
                &position(dec!(10)),
                &WarehouseSet::default(),
                now(),
            )
            .unwrap()
            .unwrap();

        assert_eq!(entry.doc_type, DocType::AdjustmentIncrease);
        assert_eq!(entry.quantity, dec!(1));
        assert_eq!(entry.warehouse, "Wen");
    }

    #[test]
    fn oversized_count_is_rejected() {
        assert_eq!(
            stocktake_entry(
                &count(dec!(50000000000000000000000000000)),
                &position(dec!(10)),
                &WarehouseSet::default(),
                now(),
            ),
            Err(ValidationError::OutOfRange("counted"))
        );
    }
}
