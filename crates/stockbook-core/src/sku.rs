//! SKU auto-coding: `CATEGORY-SERIES-NAME-SPEC`, each part looked up in a
//! small name-to-code table.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::ProductAttributes;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkuRule {
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkuRules {
    #[serde(default)]
    pub category: Vec<SkuRule>,
    #[serde(default)]
    pub series: Vec<SkuRule>,
    #[serde(default)]
    pub name: Vec<SkuRule>,
    #[serde(default)]
    pub spec: Vec<SkuRule>,
}

#[derive(Debug, thiserror::Error)]
pub enum SkuRulesError {
    #[error("failed to read sku rules from {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse sku rules: {0}")]
    Parse(#[from] serde_json::Error),
}

impl SkuRules {
    pub fn from_json(json: &str) -> Result<Self, SkuRulesError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, SkuRulesError> {
        let json = std::fs::read_to_string(path).map_err(|source| SkuRulesError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn generate(&self, attributes: &ProductAttributes) -> String {
        format!(
            "{}-{}-{}-{}",
            lookup_code(&self.category, &attributes.category),
            lookup_code(&self.series, &attributes.series),
            lookup_code(&self.name, &attributes.name),
            lookup_code(&self.spec, &attributes.spec),
        )
    }
}

// Exact name match first, then the first rule whose name occurs in the
// text. Without a rule: the first run of digits, else the first two
// characters upper-cased.
pub fn lookup_code(rules: &[SkuRule], text: &str) -> String {
    let text = text.trim();

    if let Some(rule) = rules.iter().find(|rule| rule.name.trim() == text) {
        return rule.code.trim().to_uppercase();
    }

    if let Some(rule) = rules
        .iter()
        .find(|rule| !rule.name.trim().is_empty() && text.contains(rule.name.trim()))
    {
        return rule.code.trim().to_uppercase();
    }

    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if !digits.is_empty() {
        return digits;
    }

    text.chars().take(2).collect::<String>().to_uppercase()
}
