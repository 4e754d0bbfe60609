use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockbook_core::{
    BillOfMaterials, BomLine, DocType, EntryDetails, EntryDraft, LedgerChange, LedgerEntry,
    ParseWarning, Product, ProductAttributes, RawLedgerRow, ReductionWarning, RejectedRow,
    StockPosition,
};
use stockbook_inventory::{
    CategoryTotal, OpeningRow, ProductionOrder, SafeEntry, SafePosition, StockCount, WarehouseRow,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub ledger_version: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProductRequest {
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(flatten)]
    pub attributes: ProductAttributes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductListResponse {
    pub items: Vec<Product>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateSkuResponse {
    pub sku: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteResponse {
    pub ledger_version: u64,
    pub entries: Vec<LedgerEntry>,
    pub warnings: Vec<ReductionWarning>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordEntryRequest {
    #[serde(flatten)]
    pub draft: EntryDraft,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AmendEntryRequest {
    #[serde(default)]
    pub expected_version: Option<u64>,
    #[serde(default)]
    pub doc_type: Option<DocType>,
    #[serde(default)]
    pub doc_no: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub warehouse: Option<String>,
    #[serde(default)]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub total_cost: Option<Decimal>,
    #[serde(default)]
    pub product: Option<ProductAttributes>,
    #[serde(default)]
    pub details: Option<EntryDetails>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoveEntryQuery {
    pub expected_version: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerQuery {
    pub doc_type: Option<String>,
    pub sku: Option<String>,
    pub warehouse: Option<String>,
    pub manufacturing: Option<bool>,
    pub safe: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LedgerListing {
    Full {
        ledger_version: u64,
        items: Vec<LedgerEntry>,
    },
    Safe {
        ledger_version: u64,
        items: Vec<SafeEntry>,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangesQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangesResponse {
    pub items: Vec<LedgerChange>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRequest {
    pub rows: Vec<RawLedgerRow>,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResponse {
    pub ledger_version: u64,
    pub imported: usize,
    pub parse_warnings: Vec<ParseWarning>,
    pub rejected: Vec<RejectedRow>,
    pub warnings: Vec<ReductionWarning>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpeningBalanceRequest {
    pub rows: Vec<OpeningRow>,
    #[serde(default)]
    pub default_warehouse: Option<String>,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StocktakeRequest {
    #[serde(flatten)]
    pub count: StockCount,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StocktakeResponse {
    pub ledger_version: u64,
    pub adjustment: Option<LedgerEntry>,
    pub warnings: Vec<ReductionWarning>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertBomRequest {
    pub components: Vec<BomLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BomListResponse {
    pub items: Vec<BillOfMaterials>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProduceRequest {
    #[serde(flatten)]
    pub order: ProductionOrder,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProduceResponse {
    pub ledger_version: u64,
    pub order_no: String,
    pub entries: Vec<LedgerEntry>,
    pub warnings: Vec<ReductionWarning>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockQuery {
    pub safe: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockResponse {
    pub ledger_version: u64,
    pub computed_at: DateTime<Utc>,
    pub valuation_method: String,
    pub inventory_value: Decimal,
    pub items: Vec<StockPosition>,
    pub warnings: Vec<ReductionWarning>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafeStockResponse {
    pub ledger_version: u64,
    pub computed_at: DateTime<Utc>,
    pub items: Vec<SafePosition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StockListing {
    Full(StockResponse),
    Safe(SafeStockResponse),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PositionView {
    Full(StockPosition),
    Safe(SafePosition),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseReportResponse {
    pub ledger_version: u64,
    pub warehouses: Vec<String>,
    pub items: Vec<WarehouseRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryReportResponse {
    pub ledger_version: u64,
    pub items: Vec<CategoryTotal>,
}
