use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoldOrder {
    #[default]
    Storage,
    Chronological,
}

impl FromStr for FoldOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "storage" => Ok(FoldOrder::Storage),
            "chronological" | "date" => Ok(FoldOrder::Chronological),
            other => Err(format!("unknown fold order: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarehouseFloor {
    #[default]
    Unclamped,
    ClampAtZero,
}

impl FromStr for WarehouseFloor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unclamped" | "none" => Ok(WarehouseFloor::Unclamped),
            "clamp" | "clamp_at_zero" | "zero" => Ok(WarehouseFloor::ClampAtZero),
            other => Err(format!("unknown warehouse floor: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReducerPolicy {
    #[serde(default)]
    pub fold_order: FoldOrder,
    #[serde(default)]
    pub warehouse_floor: WarehouseFloor,
}

impl ReducerPolicy {
    pub fn valuation_method(&self) -> &'static str {
        "AVCO"
    }
}
