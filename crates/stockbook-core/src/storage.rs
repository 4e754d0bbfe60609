use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::bom::BillOfMaterials;
use crate::error::StoreError;
use crate::events::LedgerChange;
use crate::models::{LedgerEntry, Product};
use crate::position::StockSnapshot;

#[derive(Debug, Clone)]
pub struct LedgerRecord {
    pub sequence: i64,
    pub entry: LedgerEntry,
    pub stored_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct LedgerState {
    pub version: u64,
    pub records: Vec<LedgerRecord>,
}

impl LedgerState {
    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.records.iter().map(|record| record.entry.clone()).collect()
    }

    pub fn find(&self, entry_id: Uuid) -> Option<&LedgerEntry> {
        self.records
            .iter()
            .map(|record| &record.entry)
            .find(|entry| entry.id == entry_id)
    }
}

/// Append-mostly transaction ledger with optimistic concurrency. Every
/// write names the version it was based on and fails with
/// [`StoreError::VersionConflict`] if the ledger moved on since.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn load(&self) -> Result<LedgerState, StoreError>;

    async fn version(&self) -> Result<u64, StoreError>;

    async fn append(
        &self,
        expected_version: u64,
        entries: Vec<LedgerEntry>,
    ) -> Result<u64, StoreError>;

    async fn amend(&self, expected_version: u64, entry: LedgerEntry) -> Result<u64, StoreError>;

    async fn remove(&self, expected_version: u64, entry_id: Uuid) -> Result<u64, StoreError>;

    async fn changes(&self, limit: usize) -> Result<Vec<LedgerChange>, StoreError>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn products(&self) -> Result<Vec<Product>, StoreError>;

    async fn product(&self, sku: &str) -> Result<Option<Product>, StoreError>;

    async fn upsert_product(&self, product: Product) -> Result<(), StoreError>;

    async fn boms(&self) -> Result<Vec<BillOfMaterials>, StoreError>;

    async fn bom(&self, parent_sku: &str) -> Result<Option<BillOfMaterials>, StoreError>;

    async fn upsert_bom(&self, bom: BillOfMaterials) -> Result<(), StoreError>;
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn save(&self, snapshot: StockSnapshot) -> Result<(), StoreError>;

    async fn latest(&self) -> Result<Option<StockSnapshot>, StoreError>;
}
