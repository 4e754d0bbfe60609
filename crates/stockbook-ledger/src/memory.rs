use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use stockbook_core::{
    BillOfMaterials, CatalogStore, LedgerChange, LedgerChangeKind, LedgerEntry, LedgerRecord,
    LedgerState, LedgerStore, Product, SnapshotStore, StockSnapshot, StoreError,
};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct MemoryLedger {
    version: u64,
    sequence: i64,
    records: Vec<LedgerRecord>,
    changes: Vec<LedgerChange>,
}

impl MemoryLedger {
    fn check_version(&self, expected: u64) -> Result<(), StoreError> {
        if self.version != expected {
            return Err(StoreError::VersionConflict {
                expected,
                actual: self.version,
            });
        }
        Ok(())
    }

    fn position_of(&self, entry_id: Uuid) -> Result<usize, StoreError> {
        self.records
            .iter()
            .position(|record| record.entry.id == entry_id)
            .ok_or(StoreError::EntryNotFound(entry_id))
    }
}

#[derive(Default)]
pub struct InMemoryLedgerStore {
    ledger: RwLock<MemoryLedger>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn load(&self) -> Result<LedgerState, StoreError> {
        let ledger = self.ledger.read().await;
        Ok(LedgerState {
            version: ledger.version,
            records: ledger.records.clone(),
        })
    }

    async fn version(&self) -> Result<u64, StoreError> {
        Ok(self.ledger.read().await.version)
    }

    async fn append(
        &self,
        expected_version: u64,
        entries: Vec<LedgerEntry>,
    ) -> Result<u64, StoreError> {
        let mut ledger = self.ledger.write().await;
        ledger.check_version(expected_version)?;
        if entries.is_empty() {
            return Ok(ledger.version);
        }

        ledger.version += 1;
        let version = ledger.version;
        let now = Utc::now();
        for entry in entries {
            ledger.sequence += 1;
            let sequence = ledger.sequence;
            ledger.changes.push(LedgerChange {
                version,
                entry_id: entry.id,
                kind: LedgerChangeKind::Appended,
                before: None,
                after: Some(entry.clone()),
                occurred_at: now,
            });
            ledger.records.push(LedgerRecord {
                sequence,
                entry,
                stored_at: now,
            });
        }

        Ok(version)
    }

    async fn amend(&self, expected_version: u64, entry: LedgerEntry) -> Result<u64, StoreError> {
        let mut ledger = self.ledger.write().await;
        ledger.check_version(expected_version)?;
        let index = ledger.position_of(entry.id)?;

        ledger.version += 1;
        let version = ledger.version;
        let before = std::mem::replace(&mut ledger.records[index].entry, entry.clone());
        ledger.changes.push(LedgerChange {
            version,
            entry_id: entry.id,
            kind: LedgerChangeKind::Amended,
            before: Some(before),
            after: Some(entry),
            occurred_at: Utc::now(),
        });

        Ok(version)
    }

    async fn remove(&self, expected_version: u64, entry_id: Uuid) -> Result<u64, StoreError> {
        let mut ledger = self.ledger.write().await;
        ledger.check_version(expected_version)?;
        let index = ledger.position_of(entry_id)?;

        ledger.version += 1;
        let version = ledger.version;
        let removed = ledger.records.remove(index);
        ledger.changes.push(LedgerChange {
            version,
            entry_id,
            kind: LedgerChangeKind::Removed,
            before: Some(removed.entry),
            after: None,
            occurred_at: Utc::now(),
        });

        Ok(version)
    }

    async fn changes(&self, limit: usize) -> Result<Vec<LedgerChange>, StoreError> {
        let ledger = self.ledger.read().await;
        Ok(ledger.changes.iter().rev().take(limit).cloned().collect())
    }
}

#[derive(Default)]
pub struct InMemoryCatalogStore {
    products: RwLock<BTreeMap<String, Product>>,
    boms: RwLock<BTreeMap<String, BillOfMaterials>>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn products(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.products.read().await.values().cloned().collect())
    }

    async fn product(&self, sku: &str) -> Result<Option<Product>, StoreError> {
        Ok(self.products.read().await.get(sku.trim()).cloned())
    }

    async fn upsert_product(&self, product: Product) -> Result<(), StoreError> {
        self.products
            .write()
            .await
            .insert(product.sku.clone(), product);
        Ok(())
    }

    async fn boms(&self) -> Result<Vec<BillOfMaterials>, StoreError> {
        Ok(self.boms.read().await.values().cloned().collect())
    }

    async fn bom(&self, parent_sku: &str) -> Result<Option<BillOfMaterials>, StoreError> {
        Ok(self.boms.read().await.get(parent_sku.trim()).cloned())
    }

    async fn upsert_bom(&self, bom: BillOfMaterials) -> Result<(), StoreError> {
        self.boms.write().await.insert(bom.parent_sku.clone(), bom);
        Ok(())
    }
}

/// Holds the most recent snapshot only. A snapshot computed from an older
/// ledger version never replaces a newer one.
#[derive(Default)]
pub struct InMemorySnapshotStore {
    latest: RwLock<Option<StockSnapshot>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn save(&self, snapshot: StockSnapshot) -> Result<(), StoreError> {
        let mut latest = self.latest.write().await;
        let newer = latest
            .as_ref()
            .is_none_or(|current| current.ledger_version <= snapshot.ledger_version);
        if newer {
            *latest = Some(snapshot);
        }
        Ok(())
    }

    async fn latest(&self) -> Result<Option<StockSnapshot>, StoreError> {
        Ok(self.latest.read().await.clone())
    }
}
