use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use stockbook_core::{FoldOrder, ReducerPolicy, SkuRules, WarehouseFloor, WarehouseSet};

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub database_url: String,
    pub http_addr: String,
    pub warehouses: WarehouseSet,
    pub policy: ReducerPolicy,
    pub sku_rules_path: Option<PathBuf>,
}

impl ServiceConfig {
    pub fn from_env(default_http_addr: &str) -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), default_http_addr)
    }

    pub fn from_lookup<F>(lookup: F, default_http_addr: &str) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL is required")?;
        let http_addr = lookup("HTTP_ADDR").unwrap_or_else(|| default_http_addr.to_string());

        let warehouses = match lookup("STOCKBOOK_WAREHOUSES") {
            Some(list) => WarehouseSet::parse_list(&list)
                .context("STOCKBOOK_WAREHOUSES must name at least one warehouse")?,
            None => WarehouseSet::default(),
        };

        let fold_order = match lookup("STOCKBOOK_FOLD_ORDER") {
            Some(value) => value
                .parse::<FoldOrder>()
                .map_err(|err| anyhow!(err))
                .context("invalid STOCKBOOK_FOLD_ORDER")?,
            None => FoldOrder::default(),
        };
        let warehouse_floor = match lookup("STOCKBOOK_WAREHOUSE_FLOOR") {
            Some(value) => value
                .parse::<WarehouseFloor>()
                .map_err(|err| anyhow!(err))
                .context("invalid STOCKBOOK_WAREHOUSE_FLOOR")?,
            None => WarehouseFloor::default(),
        };

        let sku_rules_path = lookup("SKU_RULES_PATH")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            database_url,
            http_addr,
            warehouses,
            policy: ReducerPolicy {
                fold_order,
                warehouse_floor,
            },
            sku_rules_path,
        })
    }

    pub fn load_sku_rules(&self) -> Result<SkuRules> {
        match &self.sku_rules_path {
            Some(path) => SkuRules::load(path)
                .with_context(|| format!("failed to load sku rules from {}", path.display())),
            None => Ok(SkuRules::default()),
        }
    }
}
