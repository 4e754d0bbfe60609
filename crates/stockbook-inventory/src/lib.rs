pub mod bom;
pub mod opening;
pub mod reducer;
pub mod report;
pub mod stocktake;

pub use bom::{ProductionOrder, ProductionRun, plan_production};
pub use opening::{OpeningRow, opening_entries};
pub use reducer::{Reduction, reduce, snapshot};
pub use report::{
    CategoryTotal, LedgerFilter, SafeEntry, SafePosition, WarehouseRow, category_summary,
    filter_entries, pending_costs, sorted_positions, warehouse_summary,
};
pub use stocktake::{StockCount, stocktake_entry};
