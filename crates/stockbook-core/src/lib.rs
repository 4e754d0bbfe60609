pub mod bom;
pub mod docno;
pub mod error;
pub mod events;
pub mod intake;
pub mod models;
pub mod policy;
pub mod position;
pub mod raw;
pub mod sku;
pub mod storage;
pub mod warehouse;

pub use bom::{BillOfMaterials, BomLine};
pub use error::{StoreError, ValidationError};
pub use events::{LedgerChange, LedgerChangeKind};
pub use intake::{EntryDraft, MAX_AMOUNT, check_amount};
pub use models::{Direction, DocType, EntryDetails, LedgerEntry, Product, ProductAttributes};
pub use policy::{FoldOrder, ReducerPolicy, WarehouseFloor};
pub use position::{ReductionWarning, StockPosition, StockSnapshot};
pub use raw::{ParseWarning, RawLedgerRow, RejectedRow, RowImport, import_rows};
pub use sku::{SkuRule, SkuRules};
pub use storage::{CatalogStore, LedgerRecord, LedgerState, LedgerStore, SnapshotStore};
pub use warehouse::WarehouseSet;
