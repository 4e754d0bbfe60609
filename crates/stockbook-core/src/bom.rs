use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BomLine {
    pub sku: String,
    pub quantity_per: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BillOfMaterials {
    pub parent_sku: String,
    pub components: Vec<BomLine>,
}

impl BillOfMaterials {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.parent_sku.trim().is_empty() {
            return Err(ValidationError::MissingField("parent_sku"));
        }
        if self.components.is_empty() {
            return Err(ValidationError::MissingField("components"));
        }
        for line in &self.components {
            if line.sku.trim().is_empty() {
                return Err(ValidationError::MissingField("components.sku"));
            }
            if line.quantity_per <= Decimal::ZERO {
                return Err(ValidationError::NonPositiveQuantity);
            }
        }
        Ok(())
    }
}
