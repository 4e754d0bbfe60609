pub mod service;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post, put},
};
use stockbook_core::{BillOfMaterials, ProductAttributes, StoreError};
use stockbook_inventory::{SafeEntry, SafePosition, sorted_positions};
use stockbook_platform::{
    AmendEntryRequest, BomListResponse, CategoryReportResponse, ChangesQuery, ChangesResponse,
    CreateProductRequest, GenerateSkuResponse, HealthResponse, ImportRequest, ImportResponse,
    LedgerListing, LedgerQuery, OpeningBalanceRequest, PositionView, ProduceRequest,
    ProduceResponse, ProductListResponse, RecordEntryRequest, RemoveEntryQuery, SafeStockResponse,
    StockListing, StockQuery, StockResponse, StocktakeRequest, StocktakeResponse,
    UpsertBomRequest, WarehouseReportResponse, WriteResponse,
};
use tower_http::trace::TraceLayer;
use tracing::error;
use uuid::Uuid;

pub use service::{InventoryService, LedgerWrite, ServiceError, WriteOutcome};

#[derive(Clone)]
pub struct AppState {
    service: Arc<InventoryService>,
}

impl AppState {
    pub fn new(service: Arc<InventoryService>) -> Self {
        Self { service }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/products", get(list_products).post(create_product))
        .route("/sku/generate", post(generate_sku))
        .route("/ledger", get(list_ledger))
        .route("/ledger/entries", post(record_entry))
        .route(
            "/ledger/entries/{entry_id}",
            patch(amend_entry).delete(remove_entry),
        )
        .route("/ledger/pending-costs", get(list_pending_costs))
        .route("/ledger/changes", get(list_changes))
        .route("/ledger/import", post(import_ledger))
        .route("/opening-balances", post(record_opening_balances))
        .route("/stocktake", post(record_stocktake))
        .route("/boms", get(list_boms))
        .route("/boms/{sku}", put(upsert_bom))
        .route("/manufacture/produce", post(produce))
        .route("/stock", get(stock))
        .route("/stock/{sku}", get(stock_position))
        .route("/reports/warehouses", get(warehouse_report))
        .route("/reports/categories", get(category_report))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, String)> {
    let ledger_version = state
        .service
        .ledger_version()
        .await
        .map_err(service_error)?;
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        ledger_version,
    }))
}

async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<ProductListResponse>, (StatusCode, String)> {
    let items = state.service.products().await.map_err(service_error)?;
    Ok(Json(ProductListResponse { items }))
}

async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<stockbook_core::Product>), (StatusCode, String)> {
    let product = state
        .service
        .create_product(payload.sku, payload.attributes)
        .await
        .map_err(service_error)?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn generate_sku(
    State(state): State<AppState>,
    Json(payload): Json<ProductAttributes>,
) -> Json<GenerateSkuResponse> {
    Json(GenerateSkuResponse {
        sku: state.service.generate_sku(&payload),
    })
}

async fn list_ledger(
    State(state): State<AppState>,
    Query(query): Query<LedgerQuery>,
) -> Result<Json<LedgerListing>, (StatusCode, String)> {
    let (ledger_version, entries) = state.service.ledger(&query).await.map_err(service_error)?;

    if query.safe.unwrap_or(false) {
        return Ok(Json(LedgerListing::Safe {
            ledger_version,
            items: entries.iter().map(SafeEntry::from).collect(),
        }));
    }
    Ok(Json(LedgerListing::Full {
        ledger_version,
        items: entries,
    }))
}

async fn record_entry(
    State(state): State<AppState>,
    Json(payload): Json<RecordEntryRequest>,
) -> Result<(StatusCode, Json<WriteResponse>), (StatusCode, String)> {
    let outcome = state
        .service
        .record_entry(payload.draft, payload.expected_version)
        .await
        .map_err(service_error)?;
    Ok((StatusCode::CREATED, Json(write_response(outcome))))
}

async fn amend_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    Json(payload): Json<AmendEntryRequest>,
) -> Result<Json<WriteResponse>, (StatusCode, String)> {
    let outcome = state
        .service
        .amend_entry(entry_id, payload)
        .await
        .map_err(service_error)?;
    Ok(Json(write_response(outcome)))
}

async fn remove_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    Query(query): Query<RemoveEntryQuery>,
) -> Result<Json<WriteResponse>, (StatusCode, String)> {
    let outcome = state
        .service
        .remove_entry(entry_id, query.expected_version)
        .await
        .map_err(service_error)?;
    Ok(Json(write_response(outcome)))
}

async fn list_pending_costs(
    State(state): State<AppState>,
) -> Result<Json<LedgerListing>, (StatusCode, String)> {
    let ledger_version = state
        .service
        .ledger_version()
        .await
        .map_err(service_error)?;
    let items = state.service.pending_costs().await.map_err(service_error)?;
    Ok(Json(LedgerListing::Full {
        ledger_version,
        items,
    }))
}

async fn list_changes(
    State(state): State<AppState>,
    Query(query): Query<ChangesQuery>,
) -> Result<Json<ChangesResponse>, (StatusCode, String)> {
    let items = state
        .service
        .changes(query.limit)
        .await
        .map_err(service_error)?;
    Ok(Json(ChangesResponse { items }))
}

async fn import_ledger(
    State(state): State<AppState>,
    Json(payload): Json<ImportRequest>,
) -> Result<Json<ImportResponse>, (StatusCode, String)> {
    let response = state
        .service
        .import_legacy(payload.rows, payload.expected_version)
        .await
        .map_err(service_error)?;
    Ok(Json(response))
}

async fn record_opening_balances(
    State(state): State<AppState>,
    Json(payload): Json<OpeningBalanceRequest>,
) -> Result<(StatusCode, Json<WriteResponse>), (StatusCode, String)> {
    let outcome = state
        .service
        .record_opening_balances(
            payload.rows,
            payload.default_warehouse,
            payload.expected_version,
        )
        .await
        .map_err(service_error)?;
    Ok((StatusCode::CREATED, Json(write_response(outcome))))
}

async fn record_stocktake(
    State(state): State<AppState>,
    Json(payload): Json<StocktakeRequest>,
) -> Result<Json<StocktakeResponse>, (StatusCode, String)> {
    let outcome = state
        .service
        .record_stocktake(payload.count, payload.expected_version)
        .await
        .map_err(service_error)?;
    let warnings = outcome.warnings();
    Ok(Json(StocktakeResponse {
        ledger_version: outcome.ledger_version,
        adjustment: outcome.entries.into_iter().next(),
        warnings,
    }))
}

async fn list_boms(
    State(state): State<AppState>,
) -> Result<Json<BomListResponse>, (StatusCode, String)> {
    let items = state.service.boms().await.map_err(service_error)?;
    Ok(Json(BomListResponse { items }))
}

async fn upsert_bom(
    State(state): State<AppState>,
    Path(sku): Path<String>,
    Json(payload): Json<UpsertBomRequest>,
) -> Result<Json<BillOfMaterials>, (StatusCode, String)> {
    let bom = BillOfMaterials {
        parent_sku: sku.clone(),
        components: payload.components,
    };
    let saved = state
        .service
        .upsert_bom(&sku, bom)
        .await
        .map_err(service_error)?;
    Ok(Json(saved))
}

async fn produce(
    State(state): State<AppState>,
    Json(payload): Json<ProduceRequest>,
) -> Result<(StatusCode, Json<ProduceResponse>), (StatusCode, String)> {
    let outcome = state
        .service
        .produce(payload.order, payload.expected_version)
        .await
        .map_err(service_error)?;
    let warnings = outcome.warnings();
    let order_no = outcome
        .entries
        .last()
        .map(|receipt| receipt.details.order_no.clone())
        .unwrap_or_default();
    Ok((
        StatusCode::CREATED,
        Json(ProduceResponse {
            ledger_version: outcome.ledger_version,
            order_no,
            entries: outcome.entries,
            warnings,
        }),
    ))
}

async fn stock(
    State(state): State<AppState>,
    Query(query): Query<StockQuery>,
) -> Result<Json<StockListing>, (StatusCode, String)> {
    let snapshot = state
        .service
        .current_snapshot()
        .await
        .map_err(service_error)?;
    let positions = sorted_positions(snapshot.positions.values());

    if query.safe.unwrap_or(false) {
        return Ok(Json(StockListing::Safe(SafeStockResponse {
            ledger_version: snapshot.ledger_version,
            computed_at: snapshot.computed_at,
            items: positions.into_iter().map(SafePosition::from).collect(),
        })));
    }

    Ok(Json(StockListing::Full(StockResponse {
        ledger_version: snapshot.ledger_version,
        computed_at: snapshot.computed_at,
        valuation_method: state.service.valuation_method().to_string(),
        inventory_value: snapshot.inventory_value(),
        items: positions.into_iter().cloned().collect(),
        warnings: snapshot.warnings.clone(),
    })))
}

async fn stock_position(
    State(state): State<AppState>,
    Path(sku): Path<String>,
    Query(query): Query<StockQuery>,
) -> Result<Json<PositionView>, (StatusCode, String)> {
    let position = state.service.position(&sku).await.map_err(service_error)?;
    if query.safe.unwrap_or(false) {
        return Ok(Json(PositionView::Safe(SafePosition::from(&position))));
    }
    Ok(Json(PositionView::Full(position)))
}

async fn warehouse_report(
    State(state): State<AppState>,
) -> Result<Json<WarehouseReportResponse>, (StatusCode, String)> {
    let (ledger_version, items) = state
        .service
        .warehouse_report()
        .await
        .map_err(service_error)?;
    Ok(Json(WarehouseReportResponse {
        ledger_version,
        warehouses: state.service.warehouses().names().to_vec(),
        items,
    }))
}

async fn category_report(
    State(state): State<AppState>,
) -> Result<Json<CategoryReportResponse>, (StatusCode, String)> {
    let (ledger_version, items) = state
        .service
        .category_report()
        .await
        .map_err(service_error)?;
    Ok(Json(CategoryReportResponse {
        ledger_version,
        items,
    }))
}

fn write_response(outcome: WriteOutcome) -> WriteResponse {
    let warnings = outcome.warnings();
    WriteResponse {
        ledger_version: outcome.ledger_version,
        entries: outcome.entries,
        warnings,
    }
}

fn service_error(err: ServiceError) -> (StatusCode, String) {
    let status = match &err {
        ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        ServiceError::NotFound(_) | ServiceError::Store(StoreError::EntryNotFound(_)) => {
            StatusCode::NOT_FOUND
        }
        ServiceError::Store(StoreError::VersionConflict { .. }) => StatusCode::CONFLICT,
        ServiceError::Store(StoreError::Backend(_)) => {
            error!(error = %err, "storage failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.to_string())
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use axum::body::Body;
    use chrono::NaiveDate;
    use axum::http::Request;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};
    use stockbook_core::{
        DocType, LedgerEntry, LedgerStore, ReducerPolicy, SkuRules, WarehouseSet,
    };
    use stockbook_ledger::{InMemoryCatalogStore, InMemoryLedgerStore, InMemorySnapshotStore};
    use tower::ServiceExt;

    use super::*;

    fn test_router() -> Router {
        router_over(Arc::new(InMemoryLedgerStore::new()))
    }

    fn router_over(ledger: Arc<InMemoryLedgerStore>) -> Router {
        let service = InventoryService::new(
            ledger,
            Arc::new(InMemoryCatalogStore::new()),
            Arc::new(InMemorySnapshotStore::new()),
            WarehouseSet::default(),
            ReducerPolicy::default(),
            SkuRules::default(),
        );
        router(AppState::new(Arc::new(service)))
    }

    async fn call(
        router: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    fn decimal(value: &Value) -> Decimal {
        Decimal::from_str(value.as_str().unwrap()).unwrap()
    }

    async fn purchase(router: &Router, sku: &str, quantity: &str, total_cost: &str) -> Value {
        let (status, body) = call(
            router,
            "POST",
            "/ledger/entries",
            Some(json!({
                "doc_type": "PURCHASE",
                "sku": sku,
                "warehouse": "Wen",
                "quantity": quantity,
                "total_cost": total_cost,
                "product": { "category": "Cups", "name": sku }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body
    }

    #[tokio::test]
    async fn health_reports_ledger_version() {
        let router = test_router();
        let (status, body) = call(&router, "GET", "/healthz", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["ledger_version"], 0);
    }

    #[tokio::test]
    async fn stock_follows_weighted_average() {
        let router = test_router();
        purchase(&router, "CUP", "10", "100").await;
        let (status, _) = call(
            &router,
            "POST",
            "/ledger/entries",
            Some(json!({ "doc_type": "銷售出貨", "sku": "CUP", "warehouse": "Wen", "quantity": "4" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        purchase(&router, "CUP", "5", "60").await;

        let (status, position) = call(&router, "GET", "/stock/CUP", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(decimal(&position["total_qty"]), dec!(11));
        assert_eq!(decimal(&position["cost_basis"]), dec!(120));
        assert_eq!(decimal(&position["avg_unit_cost"]).round_dp(3), dec!(10.909));
        assert_eq!(decimal(&position["qty_by_warehouse"]["Wen"]), dec!(11));

        let (_, listing) = call(&router, "GET", "/stock", None).await;
        assert_eq!(listing["ledger_version"], 3);
        assert_eq!(listing["valuation_method"], "AVCO");
        assert_eq!(decimal(&listing["inventory_value"]), dec!(120));
    }

    #[tokio::test]
    async fn stale_expected_version_is_a_conflict() {
        let router = test_router();
        purchase(&router, "CUP", "10", "100").await;

        let (status, _) = call(
            &router,
            "POST",
            "/ledger/entries",
            Some(json!({
                "doc_type": "PURCHASE",
                "sku": "CUP",
                "warehouse": "Wen",
                "quantity": "1",
                "expected_version": 0
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, health) = call(&router, "GET", "/healthz", None).await;
        assert_eq!(health["ledger_version"], 1);
    }

    #[tokio::test]
    async fn unknown_warehouse_is_rejected() {
        let router = test_router();
        let (status, _) = call(
            &router,
            "POST",
            "/ledger/entries",
            Some(json!({
                "doc_type": "PURCHASE",
                "sku": "CUP",
                "warehouse": "Loft",
                "quantity": "1"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn amend_and_remove_entries() {
        let router = test_router();
        let written = purchase(&router, "CUP", "10", "0").await;
        let entry_id = written["entries"][0]["id"].as_str().unwrap().to_string();

        let (_, pending) = call(&router, "GET", "/ledger/pending-costs", None).await;
        assert_eq!(pending["items"].as_array().unwrap().len(), 1);

        let (status, amended) = call(
            &router,
            "PATCH",
            &format!("/ledger/entries/{entry_id}"),
            Some(json!({ "total_cost": "50" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(amended["entries"][0]["id"], entry_id.as_str());

        let (_, position) = call(&router, "GET", "/stock/CUP", None).await;
        assert_eq!(decimal(&position["avg_unit_cost"]), dec!(5));

        let uri = format!("/ledger/entries/{entry_id}");
        let (status, _) = call(&router, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(&router, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, changes) = call(&router, "GET", "/ledger/changes?limit=2", None).await;
        let kinds: Vec<&str> = changes["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|change| change["kind"].as_str().unwrap())
            .collect();
        assert_eq!(kinds, vec!["REMOVED", "AMENDED"]);
    }

    #[tokio::test]
    async fn safe_views_hide_costs() {
        let router = test_router();
        purchase(&router, "CUP", "10", "100").await;

        let (_, listing) = call(&router, "GET", "/stock?safe=true", None).await;
        let item = &listing["items"][0];
        assert_eq!(item["sku"], "CUP");
        assert!(item.get("cost_basis").is_none());
        assert!(item.get("avg_unit_cost").is_none());
        assert!(listing.get("inventory_value").is_none());

        let (_, ledger) = call(&router, "GET", "/ledger?safe=true", None).await;
        assert!(ledger["items"][0].get("total_cost").is_none());

        let (_, ledger) = call(&router, "GET", "/ledger?doc_type=SALE", None).await;
        assert!(ledger["items"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn oversell_is_reported_as_warning() {
        let router = test_router();
        purchase(&router, "CUP", "2", "20").await;

        let (status, body) = call(
            &router,
            "POST",
            "/ledger/entries",
            Some(json!({ "doc_type": "SALE", "sku": "CUP", "warehouse": "Wen", "quantity": "5" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let kinds: Vec<&str> = body["warnings"]
            .as_array()
            .unwrap()
            .iter()
            .map(|warning| warning["kind"].as_str().unwrap())
            .collect();
        assert!(kinds.contains(&"negative_stock"));

        let (_, position) = call(&router, "GET", "/stock/CUP", None).await;
        assert_eq!(decimal(&position["total_qty"]), Decimal::ZERO);
    }

    #[tokio::test]
    async fn stocktake_posts_adjustment() {
        let router = test_router();
        purchase(&router, "CUP", "10", "100").await;

        let (status, body) = call(
            &router,
            "POST",
            "/stocktake",
            Some(json!({ "sku": "CUP", "warehouse": "Wen", "counted": "7" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["adjustment"]["doc_type"], "ADJUSTMENT_DECREASE");
        assert_eq!(decimal(&body["adjustment"]["quantity"]), dec!(3));

        let (_, body) = call(
            &router,
            "POST",
            "/stocktake",
            Some(json!({ "sku": "CUP", "warehouse": "Wen", "counted": "7" })),
        )
        .await;
        assert!(body["adjustment"].is_null());

        let (status, _) = call(
            &router,
            "POST",
            "/stocktake",
            Some(json!({ "sku": "MUG", "warehouse": "Wen", "counted": "1" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn production_consumes_components() {
        let router = test_router();
        purchase(&router, "LEG", "8", "320").await;

        let (status, _) = call(
            &router,
            "PUT",
            "/boms/TABLE",
            Some(json!({ "components": [{ "sku": "LEG", "quantity_per": "4" }] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(
            &router,
            "POST",
            "/manufacture/produce",
            Some(json!({ "parent_sku": "TABLE", "quantity": "2", "warehouse": "Wen" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["order_no"].as_str().unwrap().starts_with("MO-"));
        assert_eq!(body["entries"].as_array().unwrap().len(), 2);

        let (_, leg) = call(&router, "GET", "/stock/LEG", None).await;
        assert_eq!(decimal(&leg["total_qty"]), Decimal::ZERO);
        let (_, table) = call(&router, "GET", "/stock/TABLE", None).await;
        assert_eq!(decimal(&table["total_qty"]), dec!(2));
        assert_eq!(decimal(&table["cost_basis"]), dec!(320));

        let (status, _) = call(
            &router,
            "POST",
            "/manufacture/produce",
            Some(json!({ "parent_sku": "CHAIR", "quantity": "1", "warehouse": "Wen" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn legacy_import_reports_coerced_cells() {
        let router = test_router();
        let (status, body) = call(
            &router,
            "POST",
            "/ledger/import",
            Some(json!({
                "rows": [
                    {
                        "單據類型": "進貨",
                        "日期": "2024-01-05",
                        "貨號": "CUP",
                        "倉庫": "Wen",
                        "數量": 10,
                        "進貨總成本": "abc"
                    },
                    { "單據類型": "退貨", "日期": "2024-01-06", "貨號": "CUP" }
                ]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["imported"], 1);
        assert_eq!(body["parse_warnings"][0]["field"], "total_cost");
        assert_eq!(body["rejected"][0]["row"], 2);
    }

    #[tokio::test]
    async fn opening_balances_seed_stock() {
        let router = test_router();
        let (status, body) = call(
            &router,
            "POST",
            "/opening-balances",
            Some(json!({
                "rows": [
                    { "sku": "CUP", "quantity": "5", "total_cost": "50", "warehouse": "James" },
                    { "sku": "", "quantity": "3" }
                ]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["entries"].as_array().unwrap().len(), 1);
        assert_eq!(body["entries"][0]["doc_type"], "OPENING_BALANCE");

        let (_, position) = call(&router, "GET", "/stock/CUP", None).await;
        assert_eq!(decimal(&position["avg_unit_cost"]), dec!(10));
        assert_eq!(decimal(&position["qty_by_warehouse"]["James"]), dec!(5));

        let (status, _) = call(
            &router,
            "POST",
            "/opening-balances",
            Some(json!({ "rows": [], "default_warehouse": "Loft" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn products_get_generated_skus() {
        let router = test_router();
        let mug = json!({
            "series": "Classic",
            "category": "Cups",
            "name": "Mug",
            "spec": "350ml"
        });
        let (status, product) = call(
            &router,
            "POST",
            "/products",
            Some(mug.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let sku = product["sku"].as_str().unwrap().to_string();
        assert!(!sku.is_empty());

        let (_, generated) = call(
            &router,
            "POST",
            "/sku/generate",
            Some(mug),
        )
        .await;
        assert_eq!(generated["sku"], sku.as_str());

        let (_, listing) = call(&router, "GET", "/stock", None).await;
        assert_eq!(listing["items"][0]["sku"], sku.as_str());
        assert_eq!(decimal(&listing["items"][0]["total_qty"]), Decimal::ZERO);

        let (_, categories) = call(&router, "GET", "/reports/categories", None).await;
        assert_eq!(categories["items"][0]["category"], "Cups");

        let nameless = json!({ "category": "Cups" });
        let (status, _) = call(&router, "POST", "/products", Some(nameless)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn oversized_amounts_never_take_stock_down() {
        let router = test_router();
        let (status, _) = call(
            &router,
            "POST",
            "/ledger/entries",
            Some(json!({
                "doc_type": "PURCHASE",
                "sku": "CUP",
                "warehouse": "Wen",
                "quantity": "0.0000001",
                "total_cost": "10000000000000000000000"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (_, health) = call(&router, "GET", "/healthz", None).await;
        assert_eq!(health["ledger_version"], 0);

        // A row already stored with such amounts is skipped, not fatal.
        let ledger = Arc::new(InMemoryLedgerStore::new());
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        ledger
            .append(
                0,
                vec![
                    LedgerEntry::new(DocType::Purchase, "P1", day, "CUP", "Wen", dec!(0.0000001))
                        .with_total_cost(dec!(10_000_000_000_000_000_000_000)),
                    LedgerEntry::new(DocType::Purchase, "P2", day, "CUP", "Wen", dec!(4))
                        .with_total_cost(dec!(40)),
                ],
            )
            .await
            .unwrap();
        let router = router_over(ledger);

        let (status, listing) = call(&router, "GET", "/stock", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(decimal(&listing["items"][0]["total_qty"]), dec!(4));
        assert_eq!(listing["warnings"][0]["kind"], "amount_overflow");
    }
}
