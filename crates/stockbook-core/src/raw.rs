//! Rows as they come out of the legacy history table: Traditional Chinese
//! column names, every cell a loose string or number.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::intake::check_amount;
use crate::models::{DocType, EntryDetails, LedgerEntry, ProductAttributes};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLedgerRow {
    #[serde(rename = "單據類型", alias = "doc_type", default)]
    pub doc_type: Value,
    #[serde(rename = "單號", alias = "doc_no", default)]
    pub doc_no: Value,
    #[serde(rename = "日期", alias = "date", default)]
    pub date: Value,
    #[serde(rename = "系列", alias = "series", default)]
    pub series: Value,
    #[serde(rename = "分類", alias = "category", default)]
    pub category: Value,
    #[serde(rename = "品名", alias = "name", default)]
    pub name: Value,
    #[serde(rename = "規格", alias = "spec", default)]
    pub spec: Value,
    #[serde(rename = "貨號", alias = "sku", default)]
    pub sku: Value,
    #[serde(rename = "批號", alias = "batch_no", default)]
    pub batch_no: Value,
    #[serde(rename = "倉庫", alias = "warehouse", default)]
    pub warehouse: Value,
    #[serde(rename = "數量", alias = "quantity", default)]
    pub quantity: Value,
    #[serde(rename = "Key單者", alias = "handler", default)]
    pub handler: Value,
    #[serde(rename = "廠商", alias = "vendor", default)]
    pub vendor: Value,
    #[serde(rename = "訂單單號", alias = "order_no", default)]
    pub order_no: Value,
    #[serde(rename = "出貨日期", alias = "ship_date", default)]
    pub ship_date: Value,
    #[serde(rename = "貨號備註", alias = "sku_note", default)]
    pub sku_note: Value,
    #[serde(rename = "運費", alias = "shipping_fee", default)]
    pub shipping_fee: Value,
    #[serde(rename = "款項結清", alias = "settled", default)]
    pub settled: Value,
    #[serde(rename = "工資", alias = "wages", default)]
    pub wages: Value,
    #[serde(rename = "發票", alias = "invoice_no", default)]
    pub invoice_no: Value,
    #[serde(rename = "備註", alias = "notes", default)]
    pub notes: Value,
    #[serde(rename = "進貨總成本", alias = "total_cost", default)]
    pub total_cost: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParseWarning {
    pub row: usize,
    pub field: String,
    pub value: String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {}: {} '{}' is not a number, taken as 0",
            self.row, self.field, self.value
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RejectedRow {
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct RowImport {
    pub entries: Vec<LedgerEntry>,
    pub warnings: Vec<ParseWarning>,
    pub rejected: Vec<RejectedRow>,
}

pub fn import_rows(rows: Vec<RawLedgerRow>) -> RowImport {
    let mut import = RowImport::default();
    for (index, row) in rows.into_iter().enumerate() {
        let row_no = index + 1;
        match row.into_entry(row_no, &mut import.warnings) {
            Ok(entry) => import.entries.push(entry),
            Err(err) => import.rejected.push(RejectedRow {
                row: row_no,
                reason: err.to_string(),
            }),
        }
    }
    import
}

impl RawLedgerRow {
    pub fn into_entry(
        self,
        row: usize,
        warnings: &mut Vec<ParseWarning>,
    ) -> Result<LedgerEntry, ValidationError> {
        let doc_type_label = cell_text(&self.doc_type);
        if doc_type_label.is_empty() {
            return Err(ValidationError::MissingField("doc_type"));
        }
        let doc_type = DocType::from_str(&doc_type_label)?;

        let sku = cell_text(&self.sku);
        if sku.is_empty() {
            return Err(ValidationError::MissingField("sku"));
        }

        let date_text = cell_text(&self.date);
        let date = parse_date(&date_text).ok_or(ValidationError::InvalidDate(date_text))?;

        let quantity = cell_decimal(&self.quantity, row, "quantity", warnings);
        if quantity < Decimal::ZERO {
            return Err(ValidationError::NegativeAmount("quantity"));
        }
        check_amount(quantity, "quantity")?;
        let total_cost = cell_decimal(&self.total_cost, row, "total_cost", warnings);
        if total_cost < Decimal::ZERO {
            return Err(ValidationError::NegativeAmount("total_cost"));
        }
        check_amount(total_cost, "total_cost")?;

        let ship_date_text = cell_text(&self.ship_date);
        let ship_date = if ship_date_text.is_empty() {
            None
        } else {
            parse_date(&ship_date_text)
        };

        Ok(LedgerEntry {
            id: Uuid::new_v4(),
            doc_type,
            doc_no: cell_text(&self.doc_no),
            date,
            sku,
            warehouse: cell_text(&self.warehouse),
            quantity,
            total_cost,
            product: ProductAttributes {
                series: cell_text(&self.series),
                category: cell_text(&self.category),
                name: cell_text(&self.name),
                spec: cell_text(&self.spec),
            },
            details: EntryDetails {
                batch_no: cell_text(&self.batch_no),
                handler: cell_text(&self.handler),
                vendor: cell_text(&self.vendor),
                order_no: cell_text(&self.order_no),
                ship_date,
                sku_note: cell_text(&self.sku_note),
                shipping_fee: cell_decimal(&self.shipping_fee, row, "shipping_fee", warnings),
                settled: cell_text(&self.settled),
                wages: cell_decimal(&self.wages, row, "wages", warnings),
                invoice_no: cell_text(&self.invoice_no),
                notes: cell_text(&self.notes),
            },
        })
    }
}

fn is_blank(text: &str) -> bool {
    text.is_empty() || text.eq_ignore_ascii_case("nan") || text.eq_ignore_ascii_case("none")
}

fn cell_text(value: &Value) -> String {
    let text = match value {
        Value::Null => String::new(),
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        other => other.to_string(),
    };
    if is_blank(&text) { String::new() } else { text }
}

fn cell_decimal(
    value: &Value,
    row: usize,
    field: &str,
    warnings: &mut Vec<ParseWarning>,
) -> Decimal {
    let text = cell_text(value);
    if text.is_empty() {
        return Decimal::ZERO;
    }

    let cleaned = text.replace(',', "");
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .unwrap_or_else(|_| {
            warnings.push(ParseWarning {
                row,
                field: field.to_string(),
                value: text.clone(),
            });
            Decimal::ZERO
        })
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let head: String = text.chars().take(10).collect();
    NaiveDate::parse_from_str(&head, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;

    fn row(value: Value) -> RawLedgerRow {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn reads_legacy_columns() {
        let raw = row(json!({
            "單據類型": "進貨",
            "單號": 20240105120000u64,
            "日期": "2024-01-05 00:00:00",
            "品名": "Teapot",
            "貨號": "TP-01",
            "倉庫": "Wen",
            "數量": "1,200",
            "進貨總成本": 3600.5,
            "運費": "nan",
        }));

        let mut warnings = Vec::new();
        let entry = raw.into_entry(1, &mut warnings).unwrap();

        assert!(warnings.is_empty());
        assert_eq!(entry.doc_type, DocType::Purchase);
        assert_eq!(entry.doc_no, "20240105120000");
        assert_eq!(entry.date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(entry.quantity, dec!(1200));
        assert_eq!(entry.total_cost, dec!(3600.5));
        assert_eq!(entry.details.shipping_fee, Decimal::ZERO);
        assert_eq!(entry.product.name, "Teapot");
    }

    #[test]
    fn non_numeric_cell_becomes_zero_with_warning() {
        let raw = row(json!({
            "doc_type": "SALE",
            "date": "2024-02-01",
            "sku": "TP-01",
            "warehouse": "Wen",
            "quantity": "three",
        }));

        let mut warnings = Vec::new();
        let entry = raw.into_entry(7, &mut warnings).unwrap();

        assert_eq!(entry.quantity, Decimal::ZERO);
        assert_eq!(
            warnings,
            vec![ParseWarning {
                row: 7,
                field: "quantity".to_string(),
                value: "three".to_string(),
            }]
        );
    }

    #[test]
    fn import_rejects_unknown_doc_type_and_bad_date() {
        let rows = vec![
            row(json!({"單據類型": "退貨", "日期": "2024-01-01", "貨號": "A"})),
            row(json!({"單據類型": "進貨", "日期": "someday", "貨號": "A"})),
            row(json!({"單據類型": "進貨", "日期": "2024-01-01", "貨號": "A", "數量": 2})),
        ];

        let import = import_rows(rows);

        assert_eq!(import.entries.len(), 1);
        assert_eq!(import.rejected.len(), 2);
        assert_eq!(import.rejected[0].row, 1);
        assert!(import.rejected[0].reason.contains("退貨"));
        assert_eq!(import.rejected[1].row, 2);
        assert!(import.rejected[1].reason.contains("someday"));
    }

    #[test]
    fn oversized_amounts_are_rejected() {
        let rows = vec![
            row(json!({
                "單據類型": "進貨",
                "日期": "2024-01-01",
                "貨號": "A",
                "數量": "0.0000001",
                "進貨總成本": "10000000000000000000000",
            })),
            row(json!({
                "單據類型": "進貨",
                "日期": "2024-01-01",
                "貨號": "A",
                "數量": "50000000000000000000000000000",
            })),
        ];

        let import = import_rows(rows);

        assert!(import.entries.is_empty());
        assert!(import.rejected[0].reason.contains("total_cost"));
        assert!(import.rejected[1].reason.contains("quantity"));
    }
}
