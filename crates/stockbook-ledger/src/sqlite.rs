use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite, SqlitePool};
use stockbook_core::{
    BillOfMaterials, BomLine, CatalogStore, DocType, LedgerChange, LedgerChangeKind, LedgerEntry,
    LedgerRecord, LedgerState, LedgerStore, Product, ProductAttributes, SnapshotStore,
    StockSnapshot, StoreError,
};
use tracing::debug;
use uuid::Uuid;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS ledger_meta (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        version INTEGER NOT NULL
    )
    "#,
    "INSERT OR IGNORE INTO ledger_meta (id, version) VALUES (1, 0)",
    r#"
    CREATE TABLE IF NOT EXISTS ledger_entries (
        sequence INTEGER PRIMARY KEY AUTOINCREMENT,
        id BLOB NOT NULL UNIQUE,
        doc_type TEXT NOT NULL,
        doc_no TEXT NOT NULL,
        entry_date TEXT NOT NULL,
        sku TEXT NOT NULL,
        warehouse TEXT NOT NULL,
        quantity TEXT NOT NULL,
        total_cost TEXT NOT NULL,
        product TEXT NOT NULL,
        details TEXT NOT NULL,
        stored_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS ledger_entries_sku ON ledger_entries (sku)",
    r#"
    CREATE TABLE IF NOT EXISTS ledger_changes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        version INTEGER NOT NULL,
        entry_id BLOB NOT NULL,
        kind TEXT NOT NULL,
        before_entry TEXT,
        after_entry TEXT,
        occurred_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS products (
        sku TEXT PRIMARY KEY,
        series TEXT NOT NULL,
        category TEXT NOT NULL,
        name TEXT NOT NULL,
        spec TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS boms (
        parent_sku TEXT PRIMARY KEY,
        components TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS stock_snapshots (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        ledger_version INTEGER NOT NULL,
        body TEXT NOT NULL
    )
    "#,
];

pub async fn migrate(pool: &SqlitePool) -> Result<(), StoreError> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(StoreError::backend)?;
    }
    debug!("sqlite schema ready");
    Ok(())
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

async fn read_version<'e, E>(executor: E) -> Result<u64, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let version: i64 = sqlx::query_scalar("SELECT version FROM ledger_meta WHERE id = 1")
        .fetch_one(executor)
        .await
        .map_err(StoreError::backend)?;
    Ok(version as u64)
}

async fn claim_version(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    expected_version: u64,
) -> Result<u64, StoreError> {
    let updated =
        sqlx::query("UPDATE ledger_meta SET version = version + 1 WHERE id = 1 AND version = ?")
            .bind(expected_version as i64)
            .execute(&mut **tx)
            .await
            .map_err(StoreError::backend)?
            .rows_affected();

    if updated == 0 {
        let actual = read_version(&mut **tx).await?;
        return Err(StoreError::VersionConflict {
            expected: expected_version,
            actual,
        });
    }
    Ok(expected_version + 1)
}

async fn record_change(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    version: u64,
    entry_id: Uuid,
    kind: LedgerChangeKind,
    before: Option<&LedgerEntry>,
    after: Option<&LedgerEntry>,
) -> Result<(), StoreError> {
    let before = before.map(serde_json::to_string).transpose().map_err(StoreError::backend)?;
    let after = after.map(serde_json::to_string).transpose().map_err(StoreError::backend)?;

    sqlx::query(
        r#"
        INSERT INTO ledger_changes (version, entry_id, kind, before_entry, after_entry, occurred_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(version as i64)
    .bind(entry_id)
    .bind(kind.as_str())
    .bind(before)
    .bind(after)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await
    .map_err(StoreError::backend)?;
    Ok(())
}

const PRODUCT_COLUMNS: &str = "sku, series, category, name, spec";

const ENTRY_COLUMNS: &str = "sequence, id, doc_type, doc_no, entry_date, sku, warehouse, \
     quantity, total_cost, product, details, stored_at";

fn decimal_column(row: &SqliteRow, column: &str) -> Result<Decimal, StoreError> {
    let text: String = row.try_get(column).map_err(StoreError::backend)?;
    Decimal::from_str(&text).map_err(StoreError::backend)
}

fn record_from_row(row: &SqliteRow) -> Result<LedgerRecord, StoreError> {
    let doc_type: String = row.try_get("doc_type").map_err(StoreError::backend)?;
    let product: String = row.try_get("product").map_err(StoreError::backend)?;
    let details: String = row.try_get("details").map_err(StoreError::backend)?;
    let date: NaiveDate = row.try_get("entry_date").map_err(StoreError::backend)?;

    let entry = LedgerEntry {
        id: row.try_get("id").map_err(StoreError::backend)?,
        doc_type: DocType::from_str(&doc_type).map_err(StoreError::backend)?,
        doc_no: row.try_get("doc_no").map_err(StoreError::backend)?,
        date,
        sku: row.try_get("sku").map_err(StoreError::backend)?,
        warehouse: row.try_get("warehouse").map_err(StoreError::backend)?,
        quantity: decimal_column(row, "quantity")?,
        total_cost: decimal_column(row, "total_cost")?,
        product: serde_json::from_str(&product).map_err(StoreError::backend)?,
        details: serde_json::from_str(&details).map_err(StoreError::backend)?,
    };

    Ok(LedgerRecord {
        sequence: row.try_get("sequence").map_err(StoreError::backend)?,
        entry,
        stored_at: row.try_get("stored_at").map_err(StoreError::backend)?,
    })
}

fn change_from_row(row: &SqliteRow) -> Result<LedgerChange, StoreError> {
    let kind: String = row.try_get("kind").map_err(StoreError::backend)?;
    let kind = LedgerChangeKind::parse(&kind)
        .ok_or_else(|| StoreError::Backend(format!("unknown change kind '{kind}'")))?;
    let version: i64 = row.try_get("version").map_err(StoreError::backend)?;
    let parse_entry = |column: &str| -> Result<Option<LedgerEntry>, StoreError> {
        let json: Option<String> = row.try_get(column).map_err(StoreError::backend)?;
        json.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(StoreError::backend)
    };

    Ok(LedgerChange {
        version: version as u64,
        entry_id: row.try_get("entry_id").map_err(StoreError::backend)?,
        kind,
        before: parse_entry("before_entry")?,
        after: parse_entry("after_entry")?,
        occurred_at: row.try_get::<DateTime<Utc>, _>("occurred_at").map_err(StoreError::backend)?,
    })
}

#[async_trait]
impl LedgerStore for SqliteStore {
    async fn load(&self) -> Result<LedgerState, StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::backend)?;
        let version = read_version(&mut *tx).await?;
        let rows = sqlx::query(&format!(
            "SELECT {ENTRY_COLUMNS} FROM ledger_entries ORDER BY sequence"
        ))
        .fetch_all(&mut *tx)
        .await
        .map_err(StoreError::backend)?;
        tx.commit().await.map_err(StoreError::backend)?;

        let records = rows
            .iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(LedgerState { version, records })
    }

    async fn version(&self) -> Result<u64, StoreError> {
        read_version(&self.pool).await
    }

    async fn append(
        &self,
        expected_version: u64,
        entries: Vec<LedgerEntry>,
    ) -> Result<u64, StoreError> {
        if entries.is_empty() {
            let actual = self.version().await?;
            if actual != expected_version {
                return Err(StoreError::VersionConflict {
                    expected: expected_version,
                    actual,
                });
            }
            return Ok(actual);
        }

        let mut tx = self.pool.begin().await.map_err(StoreError::backend)?;
        let version = claim_version(&mut tx, expected_version).await?;
        let now = Utc::now();

        for entry in &entries {
            let product = serde_json::to_string(&entry.product).map_err(StoreError::backend)?;
            let details = serde_json::to_string(&entry.details).map_err(StoreError::backend)?;
            sqlx::query(
                r#"
                INSERT INTO ledger_entries (
                    id, doc_type, doc_no, entry_date, sku, warehouse,
                    quantity, total_cost, product, details, stored_at
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(entry.id)
            .bind(entry.doc_type.as_str())
            .bind(&entry.doc_no)
            .bind(entry.date)
            .bind(&entry.sku)
            .bind(&entry.warehouse)
            .bind(entry.quantity.to_string())
            .bind(entry.total_cost.to_string())
            .bind(product)
            .bind(details)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::backend)?;

            record_change(
                &mut tx,
                version,
                entry.id,
                LedgerChangeKind::Appended,
                None,
                Some(entry),
            )
            .await?;
        }

        tx.commit().await.map_err(StoreError::backend)?;
        debug!(version, entries = entries.len(), "ledger entries appended");
        Ok(version)
    }

    async fn amend(&self, expected_version: u64, entry: LedgerEntry) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::backend)?;
        let version = claim_version(&mut tx, expected_version).await?;

        let row = sqlx::query(&format!(
            "SELECT {ENTRY_COLUMNS} FROM ledger_entries WHERE id = ?"
        ))
        .bind(entry.id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(StoreError::backend)?
        .ok_or(StoreError::EntryNotFound(entry.id))?;
        let before = record_from_row(&row)?.entry;

        let product = serde_json::to_string(&entry.product).map_err(StoreError::backend)?;
        let details = serde_json::to_string(&entry.details).map_err(StoreError::backend)?;
        sqlx::query(
            r#"
            UPDATE ledger_entries SET
                doc_type = ?, doc_no = ?, entry_date = ?, sku = ?, warehouse = ?,
                quantity = ?, total_cost = ?, product = ?, details = ?
            WHERE id = ?
            "#,
        )
        .bind(entry.doc_type.as_str())
        .bind(&entry.doc_no)
        .bind(entry.date)
        .bind(&entry.sku)
        .bind(&entry.warehouse)
        .bind(entry.quantity.to_string())
        .bind(entry.total_cost.to_string())
        .bind(product)
        .bind(details)
        .bind(entry.id)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::backend)?;

        record_change(
            &mut tx,
            version,
            entry.id,
            LedgerChangeKind::Amended,
            Some(&before),
            Some(&entry),
        )
        .await?;

        tx.commit().await.map_err(StoreError::backend)?;
        Ok(version)
    }

    async fn remove(&self, expected_version: u64, entry_id: Uuid) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::backend)?;
        let version = claim_version(&mut tx, expected_version).await?;

        let row = sqlx::query(&format!(
            "SELECT {ENTRY_COLUMNS} FROM ledger_entries WHERE id = ?"
        ))
        .bind(entry_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(StoreError::backend)?
        .ok_or(StoreError::EntryNotFound(entry_id))?;
        let before = record_from_row(&row)?.entry;

        sqlx::query("DELETE FROM ledger_entries WHERE id = ?")
            .bind(entry_id)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::backend)?;

        record_change(
            &mut tx,
            version,
            entry_id,
            LedgerChangeKind::Removed,
            Some(&before),
            None,
        )
        .await?;

        tx.commit().await.map_err(StoreError::backend)?;
        Ok(version)
    }

    async fn changes(&self, limit: usize) -> Result<Vec<LedgerChange>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT version, entry_id, kind, before_entry, after_entry, occurred_at
            FROM ledger_changes
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        rows.iter().map(change_from_row).collect()
    }
}

fn product_from_row(row: &SqliteRow) -> Result<Product, StoreError> {
    Ok(Product {
        sku: row.try_get("sku").map_err(StoreError::backend)?,
        attributes: ProductAttributes {
            series: row.try_get("series").map_err(StoreError::backend)?,
            category: row.try_get("category").map_err(StoreError::backend)?,
            name: row.try_get("name").map_err(StoreError::backend)?,
            spec: row.try_get("spec").map_err(StoreError::backend)?,
        },
    })
}

fn bom_from_row(row: &SqliteRow) -> Result<BillOfMaterials, StoreError> {
    let components: String = row.try_get("components").map_err(StoreError::backend)?;
    let components: Vec<BomLine> =
        serde_json::from_str(&components).map_err(StoreError::backend)?;
    Ok(BillOfMaterials {
        parent_sku: row.try_get("parent_sku").map_err(StoreError::backend)?,
        components,
    })
}

#[async_trait]
impl CatalogStore for SqliteStore {
    async fn products(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY sku"))
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        rows.iter().map(product_from_row).collect()
    }

    async fn product(&self, sku: &str) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?"))
            .bind(sku.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn upsert_product(&self, product: Product) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO products (sku, series, category, name, spec)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (sku) DO UPDATE SET
                series = excluded.series,
                category = excluded.category,
                name = excluded.name,
                spec = excluded.spec
            "#,
        )
        .bind(&product.sku)
        .bind(&product.attributes.series)
        .bind(&product.attributes.category)
        .bind(&product.attributes.name)
        .bind(&product.attributes.spec)
        .execute(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(())
    }

    async fn boms(&self) -> Result<Vec<BillOfMaterials>, StoreError> {
        let rows = sqlx::query("SELECT parent_sku, components FROM boms ORDER BY parent_sku")
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        rows.iter().map(bom_from_row).collect()
    }

    async fn bom(&self, parent_sku: &str) -> Result<Option<BillOfMaterials>, StoreError> {
        let row = sqlx::query("SELECT parent_sku, components FROM boms WHERE parent_sku = ?")
            .bind(parent_sku.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        row.as_ref().map(bom_from_row).transpose()
    }

    async fn upsert_bom(&self, bom: BillOfMaterials) -> Result<(), StoreError> {
        let components = serde_json::to_string(&bom.components).map_err(StoreError::backend)?;
        sqlx::query(
            r#"
            INSERT INTO boms (parent_sku, components)
            VALUES (?, ?)
            ON CONFLICT (parent_sku) DO UPDATE SET components = excluded.components
            "#,
        )
        .bind(&bom.parent_sku)
        .bind(components)
        .execute(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for SqliteStore {
    async fn save(&self, snapshot: StockSnapshot) -> Result<(), StoreError> {
        let body = serde_json::to_string(&snapshot).map_err(StoreError::backend)?;
        sqlx::query(
            r#"
            INSERT INTO stock_snapshots (id, ledger_version, body)
            VALUES (1, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                ledger_version = excluded.ledger_version,
                body = excluded.body
            WHERE excluded.ledger_version >= stock_snapshots.ledger_version
            "#,
        )
        .bind(snapshot.ledger_version as i64)
        .bind(body)
        .execute(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(())
    }

    async fn latest(&self) -> Result<Option<StockSnapshot>, StoreError> {
        let body: Option<String> =
            sqlx::query_scalar("SELECT body FROM stock_snapshots WHERE id = 1")
                .fetch_optional(&self.pool)
                .await
                .map_err(StoreError::backend)?;
        body.map(|body| serde_json::from_str(&body))
            .transpose()
            .map_err(StoreError::backend)
    }
}
