use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result as AnyResult};
use stockbook_gateway::{AppState, InventoryService, router};
use stockbook_ledger::{SqliteStore, migrate};
use stockbook_platform::{ServiceConfig, connect_database};
use tracing::info;

#[tokio::main]
async fn main() -> AnyResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "stockbook_gateway=info,tower_http=info".to_string()),
        )
        .init();

    let config = ServiceConfig::from_env("0.0.0.0:8080")?;
    let pool = connect_database(&config.database_url).await?;
    migrate(&pool)
        .await
        .context("failed to apply database schema")?;
    let sku_rules = config.load_sku_rules()?;

    let store = Arc::new(SqliteStore::new(pool));
    let service = InventoryService::new(
        store.clone(),
        store.clone(),
        store,
        config.warehouses.clone(),
        config.policy,
        sku_rules,
    );

    let snapshot = service
        .refresh_snapshot()
        .await
        .context("failed to compute initial stock")?;
    info!(
        ledger_version = snapshot.ledger_version,
        skus = snapshot.positions.len(),
        warehouses = ?config.warehouses.names(),
        "stock loaded"
    );

    let router = router(AppState::new(Arc::new(service)));

    let addr: SocketAddr = config.http_addr.parse()?;
    info!("gateway listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
