use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unknown warehouse '{0}'")]
    UnknownWarehouse(String),

    #[error("unknown document type '{0}'")]
    UnknownDocType(String),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("quantity must be positive")]
    NonPositiveQuantity,

    #[error("{0} must not be negative")]
    NegativeAmount(&'static str),

    #[error("{0} exceeds the largest amount the ledger accepts")]
    OutOfRange(&'static str),

    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("unknown sku '{0}'")]
    UnknownSku(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("ledger version conflict: expected {expected}, current {actual}")]
    VersionConflict { expected: u64, actual: u64 },

    #[error("ledger entry {0} not found")]
    EntryNotFound(Uuid),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        StoreError::Backend(err.to_string())
    }
}
