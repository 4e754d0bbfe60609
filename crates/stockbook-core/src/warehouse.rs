use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct WarehouseSet {
    names: Vec<String>,
}

impl WarehouseSet {
    pub fn new<I, S>(names: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for name in names {
            let name = name.into().trim().to_string();
            if name.is_empty() || unique.contains(&name) {
                continue;
            }
            unique.push(name);
        }

        if unique.is_empty() {
            return Err(ValidationError::MissingField("warehouse"));
        }

        Ok(Self { names: unique })
    }

    pub fn parse_list(value: &str) -> Result<Self, ValidationError> {
        Self::new(value.split(','))
    }

    pub fn default_warehouse(&self) -> &str {
        &self.names[0]
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn resolve(&self, name: &str) -> Option<&str> {
        let trimmed = name.trim();
        self.names
            .iter()
            .find(|known| known.as_str() == trimmed)
            .map(String::as_str)
    }

    pub fn require(&self, name: &str) -> Result<String, ValidationError> {
        self.resolve(name)
            .map(str::to_string)
            .ok_or_else(|| ValidationError::UnknownWarehouse(name.trim().to_string()))
    }
}

impl Default for WarehouseSet {
    fn default() -> Self {
        Self {
            names: ["Wen", "千畇", "James", "Imeng"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

impl TryFrom<Vec<String>> for WarehouseSet {
    type Error = ValidationError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<WarehouseSet> for Vec<String> {
    fn from(value: WarehouseSet) -> Self {
        value.names
    }
}
