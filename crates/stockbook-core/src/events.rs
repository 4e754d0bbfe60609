use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::LedgerEntry;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerChangeKind {
    Appended,
    Amended,
    Removed,
}

impl LedgerChangeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LedgerChangeKind::Appended => "APPENDED",
            LedgerChangeKind::Amended => "AMENDED",
            LedgerChangeKind::Removed => "REMOVED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "APPENDED" => Some(LedgerChangeKind::Appended),
            "AMENDED" => Some(LedgerChangeKind::Amended),
            "REMOVED" => Some(LedgerChangeKind::Removed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerChange {
    pub version: u64,
    pub entry_id: Uuid,
    pub kind: LedgerChangeKind,
    pub before: Option<LedgerEntry>,
    pub after: Option<LedgerEntry>,
    pub occurred_at: DateTime<Utc>,
}
