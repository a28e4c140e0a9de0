//! Thin wiring crate: re-exports the three layers (page file, buffer pool,
//! record/table manager) plus the skeletal B-tree index so a caller can
//! depend on one crate instead of four. No behavior of its own beyond the
//! demo binary in `src/bin/demo.rs`.

pub use btree::BTreeIndex;
pub use buffer::{BufferPool, PageHandle};
pub use common::{DbError, DbResult, ReplacementStrategy, Rid, NO_PAGE, PAGE_SIZE};
pub use pagefile::PageFileHandle;
pub use record::{
    create_table, delete_table, Attribute, CompareOp, DataType, Predicate, Record, ScanHandle,
    Schema, TableHandle, Value, DEFAULT_SLOT_SIZE,
};
