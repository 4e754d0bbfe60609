pub mod memory;
pub mod sqlite;

pub use memory::{InMemoryCatalogStore, InMemoryLedgerStore, InMemorySnapshotStore};
pub use sqlite::{SqliteStore, migrate};
