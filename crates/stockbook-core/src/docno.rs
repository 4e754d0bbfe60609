use chrono::{DateTime, NaiveDate, TimeZone};

use crate::models::DocType;

pub fn generate_doc_no<Tz: TimeZone>(doc_type: DocType, sku: &str, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match doc_type {
        DocType::Purchase | DocType::Sale => now.format("%Y%m%d%H%M%S").to_string(),
        DocType::ManufactureIssue | DocType::ManufactureReceipt => manufacturing_order_no(now),
        DocType::AdjustmentIncrease | DocType::AdjustmentDecrease => {
            format!("ADJ-{}", now.timestamp())
        }
        DocType::OpeningBalance => format!("OPEN-{}-{}", now.timestamp(), sku.trim()),
    }
}

pub fn manufacturing_order_no<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format("MO-%y%m%d-%H%M").to_string()
}

pub fn batch_no<Tz: TimeZone>(prefix: &str, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{prefix}-{}", now.format("%y%m%d%H%M"))
}

pub fn opening_batch_no(date: NaiveDate) -> String {
    format!("INIT-{}", date.format("%Y%m%d"))
}
