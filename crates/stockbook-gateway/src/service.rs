use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use stockbook_core::{
    BillOfMaterials, CatalogStore, DocType, EntryDraft, LedgerChange, LedgerEntry, LedgerState,
    LedgerStore, Product, ProductAttributes, RawLedgerRow, ReducerPolicy, ReductionWarning,
    RowImport, SkuRules, SnapshotStore, StockPosition, StockSnapshot, StoreError, ValidationError,
    WarehouseSet, import_rows,
};
use stockbook_inventory::{
    CategoryTotal, LedgerFilter, OpeningRow, ProductionOrder, StockCount, WarehouseRow,
    category_summary, filter_entries, opening_entries, pending_costs, plan_production, snapshot,
    stocktake_entry, warehouse_summary,
};
use stockbook_platform::{AmendEntryRequest, ImportResponse, LedgerQuery};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

const MAX_WRITE_ATTEMPTS: usize = 3;
pub const DEFAULT_CHANGES_LIMIT: usize = 50;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0}")]
    NotFound(String),
}

#[derive(Debug, Clone)]
pub enum LedgerWrite {
    Append(Vec<LedgerEntry>),
    Amend(LedgerEntry),
    Remove(Uuid),
}

#[derive(Debug, Clone)]
pub struct WriteOutcome {
    pub ledger_version: u64,
    pub entries: Vec<LedgerEntry>,
    pub snapshot: StockSnapshot,
}

impl WriteOutcome {
    pub fn warnings(&self) -> Vec<ReductionWarning> {
        let skus: BTreeSet<&str> = self.entries.iter().map(|entry| entry.sku.as_str()).collect();
        self.snapshot
            .warnings
            .iter()
            .filter(|warning| skus.contains(warning.sku()))
            .cloned()
            .collect()
    }
}

pub struct InventoryService {
    ledger: Arc<dyn LedgerStore>,
    catalog: Arc<dyn CatalogStore>,
    snapshots: Arc<dyn SnapshotStore>,
    warehouses: WarehouseSet,
    policy: ReducerPolicy,
    sku_rules: SkuRules,
    // Held from loading the ledger to saving the snapshot, so the last save
    // always saw the latest catalogue.
    refresh: Mutex<()>,
}

impl InventoryService {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        catalog: Arc<dyn CatalogStore>,
        snapshots: Arc<dyn SnapshotStore>,
        warehouses: WarehouseSet,
        policy: ReducerPolicy,
        sku_rules: SkuRules,
    ) -> Self {
        Self {
            ledger,
            catalog,
            snapshots,
            warehouses,
            policy,
            sku_rules,
            refresh: Mutex::new(()),
        }
    }

    pub fn warehouses(&self) -> &WarehouseSet {
        &self.warehouses
    }

    pub async fn ledger_version(&self) -> Result<u64, ServiceError> {
        Ok(self.ledger.version().await?)
    }

    async fn reduce_state(&self, state: &LedgerState) -> Result<StockSnapshot, ServiceError> {
        let products = self.catalog.products().await?;
        Ok(snapshot(state, &products, &self.warehouses, self.policy))
    }

    pub async fn refresh_snapshot(&self) -> Result<StockSnapshot, ServiceError> {
        let _refresh = self.refresh.lock().await;
        let state = self.ledger.load().await?;
        let snapshot = self.reduce_state(&state).await?;

        if !snapshot.warnings.is_empty() {
            warn!(
                ledger_version = snapshot.ledger_version,
                warnings = snapshot.warnings.len(),
                "stock recomputed with data-quality warnings"
            );
            for warning in &snapshot.warnings {
                debug!(%warning, "reduction warning");
            }
        }

        self.snapshots.save(snapshot.clone()).await?;
        Ok(snapshot)
    }

    pub async fn current_snapshot(&self) -> Result<StockSnapshot, ServiceError> {
        let version = self.ledger.version().await?;
        if let Some(saved) = self.snapshots.latest().await? {
            if saved.ledger_version == version {
                return Ok(saved);
            }
            debug!(
                saved = saved.ledger_version,
                current = version,
                "stock snapshot is stale"
            );
        }
        self.refresh_snapshot().await
    }

    /// Runs `plan` against the current ledger and commits what it returns.
    ///
    /// With `expected_version` set the write fails on any mismatch. Without
    /// it a write that loses a race is planned again from the fresh ledger,
    /// up to [`MAX_WRITE_ATTEMPTS`] times.
    pub async fn write<F>(
        &self,
        expected_version: Option<u64>,
        mut plan: F,
    ) -> Result<WriteOutcome, ServiceError>
    where
        F: FnMut(&LedgerState, &StockSnapshot) -> Result<LedgerWrite, ServiceError> + Send,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let state = self.ledger.load().await?;
            if let Some(expected) = expected_version {
                if expected != state.version {
                    return Err(StoreError::VersionConflict {
                        expected,
                        actual: state.version,
                    }
                    .into());
                }
            }

            let before = self.reduce_state(&state).await?;
            let (result, entries) = match plan(&state, &before)? {
                LedgerWrite::Append(entries) if entries.is_empty() => {
                    return Ok(WriteOutcome {
                        ledger_version: state.version,
                        entries,
                        snapshot: before,
                    });
                }
                LedgerWrite::Append(entries) => {
                    let result = self.ledger.append(state.version, entries.clone()).await;
                    (result, entries)
                }
                LedgerWrite::Amend(entry) => {
                    let result = self.ledger.amend(state.version, entry.clone()).await;
                    (result, vec![entry])
                }
                LedgerWrite::Remove(entry_id) => {
                    let removed = state
                        .find(entry_id)
                        .cloned()
                        .ok_or(StoreError::EntryNotFound(entry_id))?;
                    let result = self.ledger.remove(state.version, entry_id).await;
                    (result, vec![removed])
                }
            };

            match result {
                Ok(ledger_version) => {
                    info!(ledger_version, entries = entries.len(), "ledger updated");
                    let snapshot = self.refresh_snapshot().await?;
                    return Ok(WriteOutcome {
                        ledger_version,
                        entries,
                        snapshot,
                    });
                }
                Err(StoreError::VersionConflict { expected, actual })
                    if expected_version.is_none() && attempt < MAX_WRITE_ATTEMPTS =>
                {
                    warn!(expected, actual, attempt, "ledger moved on, planning write again");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    pub async fn record_entry(
        &self,
        draft: EntryDraft,
        expected_version: Option<u64>,
    ) -> Result<WriteOutcome, ServiceError> {
        let catalogued = self.catalog.product(draft.sku.trim()).await?;
        let entry = draft.validate(&self.warehouses, catalogued.as_ref(), Utc::now())?;
        self.write(expected_version, |_, _| {
            Ok(LedgerWrite::Append(vec![entry.clone()]))
        })
        .await
    }

    pub async fn amend_entry(
        &self,
        entry_id: Uuid,
        patch: AmendEntryRequest,
    ) -> Result<WriteOutcome, ServiceError> {
        self.write(patch.expected_version, |state, _| {
            let existing = state
                .find(entry_id)
                .ok_or(StoreError::EntryNotFound(entry_id))?;
            let amended = apply_amendment(existing, &patch, &self.warehouses)?;
            Ok(LedgerWrite::Amend(amended))
        })
        .await
    }

    pub async fn remove_entry(
        &self,
        entry_id: Uuid,
        expected_version: Option<u64>,
    ) -> Result<WriteOutcome, ServiceError> {
        self.write(expected_version, |_, _| Ok(LedgerWrite::Remove(entry_id)))
            .await
    }

    pub async fn import_legacy(
        &self,
        rows: Vec<RawLedgerRow>,
        expected_version: Option<u64>,
    ) -> Result<ImportResponse, ServiceError> {
        let RowImport {
            entries,
            warnings: parse_warnings,
            rejected,
        } = import_rows(rows);
        for warning in &parse_warnings {
            warn!(%warning, "legacy cell coerced");
        }
        if !rejected.is_empty() {
            warn!(rejected = rejected.len(), "legacy rows rejected");
        }

        let outcome = self
            .write(expected_version, |_, _| {
                Ok(LedgerWrite::Append(entries.clone()))
            })
            .await?;

        Ok(ImportResponse {
            ledger_version: outcome.ledger_version,
            imported: outcome.entries.len(),
            parse_warnings,
            rejected,
            warnings: outcome.warnings(),
        })
    }

    pub async fn record_opening_balances(
        &self,
        rows: Vec<OpeningRow>,
        default_warehouse: Option<String>,
        expected_version: Option<u64>,
    ) -> Result<WriteOutcome, ServiceError> {
        let default_warehouse = match default_warehouse {
            Some(name) => self.warehouses.require(&name)?,
            None => self.warehouses.default_warehouse().to_string(),
        };
        let products = self.catalog.products().await?;
        let entries = opening_entries(
            &rows,
            &products,
            &self.warehouses,
            &default_warehouse,
            Utc::now(),
        );
        if entries.is_empty() {
            return Err(ValidationError::MissingField("rows").into());
        }

        self.write(expected_version, |_, _| {
            Ok(LedgerWrite::Append(entries.clone()))
        })
        .await
    }

    pub async fn record_stocktake(
        &self,
        count: StockCount,
        expected_version: Option<u64>,
    ) -> Result<WriteOutcome, ServiceError> {
        self.write(expected_version, |_, current| {
            let sku = count.sku.trim();
            let position = current
                .position(sku)
                .ok_or_else(|| ValidationError::UnknownSku(sku.to_string()))?;
            let adjustment = stocktake_entry(&count, position, &self.warehouses, Utc::now())?;
            Ok(LedgerWrite::Append(adjustment.into_iter().collect()))
        })
        .await
    }

    pub async fn produce(
        &self,
        order: ProductionOrder,
        expected_version: Option<u64>,
    ) -> Result<WriteOutcome, ServiceError> {
        let parent_sku = order.parent_sku.trim();
        let bom = self.catalog.bom(parent_sku).await?.ok_or_else(|| {
            ServiceError::NotFound(format!("no bill of materials for '{parent_sku}'"))
        })?;

        self.write(expected_version, |_, current| {
            let run = plan_production(
                &order,
                &bom,
                &current.positions,
                &self.warehouses,
                Utc::now(),
            )?;
            Ok(LedgerWrite::Append(run.into_entries()))
        })
        .await
    }

    pub async fn products(&self) -> Result<Vec<Product>, ServiceError> {
        Ok(self.catalog.products().await?)
    }

    pub fn generate_sku(&self, attributes: &ProductAttributes) -> String {
        self.sku_rules.generate(attributes)
    }

    pub async fn create_product(
        &self,
        sku: Option<String>,
        attributes: ProductAttributes,
    ) -> Result<Product, ServiceError> {
        if attributes.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name").into());
        }
        let sku = sku
            .map(|sku| sku.trim().to_string())
            .filter(|sku| !sku.is_empty())
            .unwrap_or_else(|| self.generate_sku(&attributes));

        let product = Product::new(sku, attributes);
        self.catalog.upsert_product(product.clone()).await?;
        info!(sku = %product.sku, "product saved");

        // Catalogue changes do not move the ledger version.
        self.refresh_snapshot().await?;
        Ok(product)
    }

    pub async fn upsert_bom(
        &self,
        parent_sku: &str,
        mut bom: BillOfMaterials,
    ) -> Result<BillOfMaterials, ServiceError> {
        bom.parent_sku = parent_sku.trim().to_string();
        for line in &mut bom.components {
            line.sku = line.sku.trim().to_string();
        }
        bom.validate()?;
        self.catalog.upsert_bom(bom.clone()).await?;
        Ok(bom)
    }

    pub async fn boms(&self) -> Result<Vec<BillOfMaterials>, ServiceError> {
        Ok(self.catalog.boms().await?)
    }

    pub async fn ledger(
        &self,
        query: &LedgerQuery,
    ) -> Result<(u64, Vec<LedgerEntry>), ServiceError> {
        let doc_type = query
            .doc_type
            .as_deref()
            .map(DocType::from_str)
            .transpose()?;
        let filter = LedgerFilter {
            doc_type,
            sku: query.sku.clone(),
            warehouse: query.warehouse.clone(),
            manufacturing: query.manufacturing.unwrap_or(false),
        };

        let state = self.ledger.load().await?;
        let entries = state.entries();
        let matching = filter_entries(&entries, &filter)
            .into_iter()
            .cloned()
            .collect();
        Ok((state.version, matching))
    }

    pub async fn pending_costs(&self) -> Result<Vec<LedgerEntry>, ServiceError> {
        let entries = self.ledger.load().await?.entries();
        Ok(pending_costs(&entries).into_iter().cloned().collect())
    }

    pub async fn changes(&self, limit: Option<usize>) -> Result<Vec<LedgerChange>, ServiceError> {
        let limit = limit.unwrap_or(DEFAULT_CHANGES_LIMIT);
        Ok(self.ledger.changes(limit).await?)
    }

    pub fn valuation_method(&self) -> &'static str {
        self.policy.valuation_method()
    }

    pub async fn position(&self, sku: &str) -> Result<StockPosition, ServiceError> {
        let snapshot = self.current_snapshot().await?;
        snapshot
            .position(sku.trim())
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("unknown sku '{}'", sku.trim())))
    }

    pub async fn warehouse_report(&self) -> Result<(u64, Vec<WarehouseRow>), ServiceError> {
        let snapshot = self.current_snapshot().await?;
        Ok((
            snapshot.ledger_version,
            warehouse_summary(snapshot.positions.values()),
        ))
    }

    pub async fn category_report(&self) -> Result<(u64, Vec<CategoryTotal>), ServiceError> {
        let snapshot = self.current_snapshot().await?;
        Ok((
            snapshot.ledger_version,
            category_summary(snapshot.positions.values()),
        ))
    }
}

fn apply_amendment(
    existing: &LedgerEntry,
    patch: &AmendEntryRequest,
    warehouses: &WarehouseSet,
) -> Result<LedgerEntry, ValidationError> {
    let draft = EntryDraft {
        doc_type: patch.doc_type.unwrap_or(existing.doc_type),
        sku: patch.sku.clone().unwrap_or_else(|| existing.sku.clone()),
        warehouse: patch
            .warehouse
            .clone()
            .unwrap_or_else(|| existing.warehouse.clone()),
        quantity: patch.quantity.unwrap_or(existing.quantity),
        total_cost: Some(patch.total_cost.unwrap_or(existing.total_cost)),
        date: Some(patch.date.unwrap_or(existing.date)),
        doc_no: Some(patch.doc_no.clone().unwrap_or_else(|| existing.doc_no.clone())),
        product: Some(
            patch
                .product
                .clone()
                .unwrap_or_else(|| existing.product.clone()),
        ),
        details: patch
            .details
            .clone()
            .unwrap_or_else(|| existing.details.clone()),
    };

    let mut amended = draft.validate(warehouses, None, Utc::now())?;
    amended.id = existing.id;
    Ok(amended)
}
