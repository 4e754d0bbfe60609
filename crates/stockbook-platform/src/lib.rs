pub mod config;
pub mod contracts;
pub mod db;

pub use config::ServiceConfig;
pub use contracts::{
    AmendEntryRequest, BomListResponse, CategoryReportResponse, ChangesQuery, ChangesResponse,
    CreateProductRequest, GenerateSkuResponse, HealthResponse, ImportRequest, ImportResponse,
    LedgerListing, LedgerQuery, OpeningBalanceRequest, PositionView, ProduceRequest,
    ProduceResponse, ProductListResponse, RecordEntryRequest, RemoveEntryQuery, SafeStockResponse,
    StockListing, StockQuery, StockResponse, StocktakeRequest, StocktakeResponse,
    UpsertBomRequest, WarehouseReportResponse, WriteResponse,
};
pub use db::connect_database;
