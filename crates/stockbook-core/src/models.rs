use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Inbound,
    Outbound,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocType {
    #[serde(alias = "進貨")]
    Purchase,
    #[serde(alias = "銷售出貨")]
    Sale,
    #[serde(alias = "製造領料")]
    ManufactureIssue,
    #[serde(alias = "製造入庫")]
    ManufactureReceipt,
    #[serde(alias = "庫存調整(加)", alias = "調整入庫")]
    AdjustmentIncrease,
    #[serde(alias = "庫存調整(減)", alias = "調整出庫")]
    AdjustmentDecrease,
    #[serde(alias = "期初建檔")]
    OpeningBalance,
}

impl DocType {
    pub const ALL: [DocType; 7] = [
        DocType::Purchase,
        DocType::Sale,
        DocType::ManufactureIssue,
        DocType::ManufactureReceipt,
        DocType::AdjustmentIncrease,
        DocType::AdjustmentDecrease,
        DocType::OpeningBalance,
    ];

    pub fn direction(self) -> Direction {
        match self {
            DocType::Purchase
            | DocType::ManufactureReceipt
            | DocType::AdjustmentIncrease
            | DocType::OpeningBalance => Direction::Inbound,
            DocType::Sale | DocType::ManufactureIssue | DocType::AdjustmentDecrease => {
                Direction::Outbound
            }
        }
    }

    pub fn is_inbound(self) -> bool {
        self.direction() == Direction::Inbound
    }

    pub fn is_manufacturing(self) -> bool {
        matches!(self, DocType::ManufactureIssue | DocType::ManufactureReceipt)
    }

    pub fn legacy_label(self) -> &'static str {
        match self {
            DocType::Purchase => "進貨",
            DocType::Sale => "銷售出貨",
            DocType::ManufactureIssue => "製造領料",
            DocType::ManufactureReceipt => "製造入庫",
            DocType::AdjustmentIncrease => "庫存調整(加)",
            DocType::AdjustmentDecrease => "庫存調整(減)",
            DocType::OpeningBalance => "期初建檔",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DocType::Purchase => "PURCHASE",
            DocType::Sale => "SALE",
            DocType::ManufactureIssue => "MANUFACTURE_ISSUE",
            DocType::ManufactureReceipt => "MANUFACTURE_RECEIPT",
            DocType::AdjustmentIncrease => "ADJUSTMENT_INCREASE",
            DocType::AdjustmentDecrease => "ADJUSTMENT_DECREASE",
            DocType::OpeningBalance => "OPENING_BALANCE",
        }
    }
}

impl FromStr for DocType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let normalized = trimmed.to_ascii_uppercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "PURCHASE" | "進貨" => Ok(DocType::Purchase),
            "SALE" | "銷售出貨" => Ok(DocType::Sale),
            "MANUFACTURE_ISSUE" | "製造領料" => Ok(DocType::ManufactureIssue),
            "MANUFACTURE_RECEIPT" | "製造入庫" => Ok(DocType::ManufactureReceipt),
            "ADJUSTMENT_INCREASE" | "庫存調整(加)" | "調整入庫" => {
                Ok(DocType::AdjustmentIncrease)
            }
            "ADJUSTMENT_DECREASE" | "庫存調整(減)" | "調整出庫" => {
                Ok(DocType::AdjustmentDecrease)
            }
            "OPENING_BALANCE" | "期初建檔" => Ok(DocType::OpeningBalance),
            _ => Err(ValidationError::UnknownDocType(trimmed.to_string())),
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductAttributes {
    #[serde(default)]
    pub series: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub spec: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    pub sku: String,
    #[serde(flatten)]
    pub attributes: ProductAttributes,
}

impl Product {
    pub fn new(sku: impl Into<String>, attributes: ProductAttributes) -> Self {
        Self {
            sku: sku.into(),
            attributes,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EntryDetails {
    #[serde(default)]
    pub batch_no: String,
    #[serde(default)]
    pub handler: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub order_no: String,
    #[serde(default)]
    pub ship_date: Option<NaiveDate>,
    #[serde(default)]
    pub sku_note: String,
    #[serde(default)]
    pub shipping_fee: Decimal,
    #[serde(default)]
    pub settled: String,
    #[serde(default)]
    pub wages: Decimal,
    #[serde(default)]
    pub invoice_no: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub doc_type: DocType,
    pub doc_no: String,
    pub date: NaiveDate,
    pub sku: String,
    pub warehouse: String,
    pub quantity: Decimal,
    pub total_cost: Decimal,
    #[serde(default)]
    pub product: ProductAttributes,
    #[serde(default)]
    pub details: EntryDetails,
}

impl LedgerEntry {
    pub fn new(
        doc_type: DocType,
        doc_no: impl Into<String>,
        date: NaiveDate,
        sku: impl Into<String>,
        warehouse: impl Into<String>,
        quantity: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            doc_type,
            doc_no: doc_no.into(),
            date,
            sku: sku.into(),
            warehouse: warehouse.into(),
            quantity,
            total_cost: Decimal::ZERO,
            product: ProductAttributes::default(),
            details: EntryDetails::default(),
        }
    }

    pub fn with_total_cost(mut self, total_cost: Decimal) -> Self {
        self.total_cost = total_cost;
        self
    }

    pub fn with_product(mut self, product: ProductAttributes) -> Self {
        self.product = product;
        self
    }

    pub fn with_details(mut self, details: EntryDetails) -> Self {
        self.details = details;
        self
    }

    pub fn cost_pending(&self) -> bool {
        self.doc_type.is_inbound() && self.total_cost.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_doc_type_has_a_direction() {
        let inbound: Vec<_> = DocType::ALL
            .iter()
            .filter(|doc_type| doc_type.is_inbound())
            .collect();
        assert_eq!(inbound.len(), 4);
        assert_eq!(DocType::Sale.direction(), Direction::Outbound);
        assert_eq!(DocType::OpeningBalance.direction(), Direction::Inbound);
    }

    #[test]
    fn parses_legacy_labels_and_names() {
        assert_eq!("進貨".parse::<DocType>().unwrap(), DocType::Purchase);
        assert_eq!("調整出庫".parse::<DocType>().unwrap(), DocType::AdjustmentDecrease);
        assert_eq!("庫存調整(加)".parse::<DocType>().unwrap(), DocType::AdjustmentIncrease);
        assert_eq!("manufacture-issue".parse::<DocType>().unwrap(), DocType::ManufactureIssue);
        assert_eq!(" SALE ".parse::<DocType>().unwrap(), DocType::Sale);
        assert!(matches!(
            "退貨".parse::<DocType>(),
            Err(ValidationError::UnknownDocType(label)) if label == "退貨"
        ));
    }

    #[test]
    fn legacy_label_round_trips() {
        for doc_type in DocType::ALL {
            assert_eq!(doc_type.legacy_label().parse::<DocType>().unwrap(), doc_type);
        }
    }

    #[test]
    fn serde_accepts_legacy_alias() {
        let doc_type: DocType = serde_json::from_str("\"製造入庫\"").unwrap();
        assert_eq!(doc_type, DocType::ManufactureReceipt);
        assert_eq!(
            serde_json::to_string(&DocType::ManufactureReceipt).unwrap(),
            "\"MANUFACTURE_RECEIPT\""
        );
    }
}
