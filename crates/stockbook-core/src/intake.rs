use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::docno::generate_doc_no;
use crate::error::ValidationError;
use crate::models::{DocType, EntryDetails, LedgerEntry, Product, ProductAttributes};
use crate::warehouse::WarehouseSet;

/// Upper bound for quantities and money on a single row. Keeps running
/// totals and averages well inside `Decimal` range.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0); // 1_000_000_000_000_000

pub fn check_amount(value: Decimal, field: &'static str) -> Result<(), ValidationError> {
    if value > MAX_AMOUNT {
        return Err(ValidationError::OutOfRange(field));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryDraft {
    pub doc_type: DocType,
    pub sku: String,
    pub warehouse: String,
    pub quantity: Decimal,
    #[serde(default)]
    pub total_cost: Option<Decimal>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub doc_no: Option<String>,
    #[serde(default)]
    pub product: Option<ProductAttributes>,
    #[serde(default)]
    pub details: EntryDetails,
}

impl EntryDraft {
    pub fn new(
        doc_type: DocType,
        sku: impl Into<String>,
        warehouse: impl Into<String>,
        quantity: Decimal,
    ) -> Self {
        Self {
            doc_type,
            sku: sku.into(),
            warehouse: warehouse.into(),
            quantity,
            total_cost: None,
            date: None,
            doc_no: None,
            product: None,
            details: EntryDetails::default(),
        }
    }

    pub fn validate(
        self,
        warehouses: &WarehouseSet,
        catalogued: Option<&Product>,
        now: DateTime<Utc>,
    ) -> Result<LedgerEntry, ValidationError> {
        let sku = self.sku.trim().to_string();
        if sku.is_empty() {
            return Err(ValidationError::MissingField("sku"));
        }
        if self.quantity <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveQuantity);
        }

        let total_cost = self.total_cost.unwrap_or(Decimal::ZERO);
        if total_cost < Decimal::ZERO {
            return Err(ValidationError::NegativeAmount("total_cost"));
        }
        if self.details.shipping_fee < Decimal::ZERO {
            return Err(ValidationError::NegativeAmount("shipping_fee"));
        }
        if self.details.wages < Decimal::ZERO {
            return Err(ValidationError::NegativeAmount("wages"));
        }

        check_amount(self.quantity, "quantity")?;
        check_amount(total_cost, "total_cost")?;
        check_amount(self.details.shipping_fee, "shipping_fee")?;
        check_amount(self.details.wages, "wages")?;

        let warehouse = warehouses.require(&self.warehouse)?;

        let doc_no = self
            .doc_no
            .map(|doc_no| doc_no.trim().to_string())
            .filter(|doc_no| !doc_no.is_empty())
            .unwrap_or_else(|| generate_doc_no(self.doc_type, &sku, &now));

        let product = match catalogued {
            Some(product) => product.attributes.clone(),
            None => self.product.unwrap_or_default(),
        };

        Ok(LedgerEntry {
            id: Uuid::new_v4(),
            doc_type: self.doc_type,
            doc_no,
            date: self.date.unwrap_or_else(|| now.date_naive()),
            sku,
            warehouse,
            quantity: self.quantity,
            total_cost,
            product,
            details: self.details,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn fills_defaults_from_clock_and_catalog() {
        let catalogued = Product::new(
            "A-001",
            ProductAttributes {
                name: "Bowl".to_string(),
                ..ProductAttributes::default()
            },
        );
        let draft = EntryDraft {
            product: Some(ProductAttributes {
                name: "Ignored".to_string(),
                ..ProductAttributes::default()
            }),
            ..EntryDraft::new(DocType::Sale, " A-001 ", "James", dec!(2))
        };

        let entry = draft
            .validate(&WarehouseSet::default(), Some(&catalogued), now())
            .unwrap();

        assert_eq!(entry.sku, "A-001");
        assert_eq!(entry.doc_no, "20240601093000");
        assert_eq!(entry.date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(entry.product.name, "Bowl");
        assert_eq!(entry.total_cost, Decimal::ZERO);
    }

    #[test]
    fn rejects_bad_drafts() {
        let warehouses = WarehouseSet::default();

        let zero = EntryDraft::new(DocType::Purchase, "A", "Wen", Decimal::ZERO);
        assert_eq!(
            zero.validate(&warehouses, None, now()),
            Err(ValidationError::NonPositiveQuantity)
        );

        let unknown = EntryDraft::new(DocType::Purchase, "A", "Attic", dec!(1));
        assert_eq!(
            unknown.validate(&warehouses, None, now()),
            Err(ValidationError::UnknownWarehouse("Attic".to_string()))
        );

        let negative = EntryDraft {
            total_cost: Some(dec!(-5)),
            ..EntryDraft::new(DocType::Purchase, "A", "Wen", dec!(1))
        };
        assert_eq!(
            negative.validate(&warehouses, None, now()),
            Err(ValidationError::NegativeAmount("total_cost"))
        );

        let huge_cost = EntryDraft {
            total_cost: Some(dec!(10000000000000000000000)),
            ..EntryDraft::new(DocType::Purchase, "A", "Wen", dec!(0.0000001))
        };
        assert_eq!(
            huge_cost.validate(&warehouses, None, now()),
            Err(ValidationError::OutOfRange("total_cost"))
        );

        let huge_quantity =
            EntryDraft::new(DocType::Purchase, "A", "Wen", dec!(50000000000000000000000000000));
        assert_eq!(
            huge_quantity.validate(&warehouses, None, now()),
            Err(ValidationError::OutOfRange("quantity"))
        );

        let blank = EntryDraft::new(DocType::Purchase, "  ", "Wen", dec!(1));
        assert_eq!(
            blank.validate(&warehouses, None, now()),
            Err(ValidationError::MissingField("sku"))
        );
    }
}
