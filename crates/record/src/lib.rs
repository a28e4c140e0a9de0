//! Fixed-layout record schema and value codec, plus the on-disk table
//! manager built over the buffer pool: header + schema pages, a chain of
//! page-metadata pages tracking each data page's live-slot count, and
//! data pages of fixed-size slots addressed by `(page, slot)`.

mod predicate;
mod record;
mod schema;
mod table;
mod value;

pub use predicate::{CompareOp, Predicate};
pub use record::Record;
pub use schema::{Attribute, Schema};
pub use table::{create_table, delete_table, ScanHandle, TableHandle, DEFAULT_SLOT_SIZE};
pub use value::{DataType, Value};
