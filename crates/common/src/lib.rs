//! Shared identifiers and the crate-wide error type for the storage engine.

#[cfg(test)]
mod tests;

use std::io;
use thiserror::Error;

/// Fixed page size used by every file in this engine. Not configurable at runtime.
pub const PAGE_SIZE: usize = 4096;

/// Sentinel used wherever a page slot or forward pointer means "none".
pub const NO_PAGE: i32 = -1;

/// Zero-based page number within a page file.
pub type PageNum = i32;

/// Record address: the page holding the slot, and the byte offset of the slot
/// within that page.
///
/// Examples:
/// - `Rid { page: 1, slot: 0 }` — first slot of the first data page
/// - `Rid { page: 3, slot: 512 }` — a slot at offset 512 on page 3
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rid {
    pub page: PageNum,
    pub slot: i32,
}

impl Rid {
    pub fn new(page: PageNum, slot: i32) -> Self {
        Self { page, slot }
    }
}

/// Canonical error type shared across the page file, buffer pool, and record
/// manager. One variant per row of the error taxonomy.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("file not found")]
    FileNotFound,
    #[error("create failed: {0}")]
    CreateFailed(String),
    #[error("page {0} does not exist")]
    NonExistingPage(PageNum),
    #[error("seek failed: {0}")]
    SeekFailed(String),
    #[error("read failed: {0}")]
    ReadFailed(String),
    #[error("write failed: {0}")]
    WriteFailed(String),
    #[error("memory allocation failed")]
    MemAllocFailed,
    #[error("shutdown failed: {0} frame(s) still pinned")]
    ShutdownFailed(usize),
    #[error("page {0} not found in buffer pool")]
    PageNotFound(PageNum),
    #[error("unknown replacement strategy")]
    StrategyNotFound,
    #[error("force flush failed: {0}")]
    ForceFlushFailed(String),
    #[error("no free frame available to pin page {0}")]
    NoFrame(PageNum),
    #[error("record does not exist")]
    RecordNotExist,
    #[error("no more tuples")]
    NoMoreTuples,
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    #[error("unknown datatype: {0}")]
    UnknownDatatype(String),
    #[error("invalid argument: {0}")]
    InvalidArg(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result alias that carries a `DbError`.
pub type DbResult<T> = Result<T, DbError>;

/// Page replacement strategy selectable at buffer pool init.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplacementStrategy {
    Fifo,
    Lru,
}
