//! Fixed-size block I/O over a single named backing file.
//!
//! A [`PageFileHandle`] is a thin, stateful adapter over a byte stream: it
//! tracks the file's current page count and a current-position cursor so
//! higher layers can iterate pages without repeating the page number on
//! every call.


use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};

use common::{DbError, DbResult, PageNum, PAGE_SIZE};

/// An open page file: a name, an underlying [`File`], a total page count,
/// and a 0-based current-position cursor.
#[derive(Debug)]
pub struct PageFileHandle {
    name: String,
    file: File,
    total_pages: PageNum,
    current_position: PageNum,
}

impl PageFileHandle {
    /// Create a new file at `name`, zero-fill exactly one page, and leave it
    /// closed. Fails with [`DbError::CreateFailed`] if the file cannot be
    /// created or the full page cannot be written; any partial file is
    /// removed before the error is returned.
    pub fn create(name: &str) -> DbResult<()> {
        let result = (|| -> DbResult<()> {
            let mut file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(name)
                .map_err(|e| DbError::CreateFailed(e.to_string()))?;
            let zero_page = vec![0u8; PAGE_SIZE];
            file.write_all(&zero_page)
                .map_err(|e| DbError::CreateFailed(e.to_string()))?;
            Ok(())
        })();
        if result.is_err() {
            let _ = fs::remove_file(name);
        }
        result
    }

    /// Open an existing page file for read/write access. Populates the
    /// handle with an owned copy of `name`, `total_pages = ceil(len /
    /// PAGE_SIZE)`, and `current_position = 0`.
    pub fn open(name: &str) -> DbResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(name)
            .map_err(|_| DbError::FileNotFound)?;
        let len = file
            .metadata()
            .map_err(|e| DbError::ReadFailed(e.to_string()))?
            .len();
        let total_pages = len.div_ceil(PAGE_SIZE as u64) as PageNum;
        Ok(Self {
            name: name.to_string(),
            file,
            total_pages,
            current_position: 0,
        })
    }

    /// Release the handle's resources. Subsequent use of `self` is
    /// impossible in Rust (the value is consumed), matching the source's
    /// "subsequent use is undefined" contract.
    pub fn close(self) {
        drop(self);
    }

    /// Remove the named file from disk.
    pub fn destroy(name: &str) -> DbResult<()> {
        fs::remove_file(name)?;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn total_pages(&self) -> PageNum {
        self.total_pages
    }

    pub fn current_position(&self) -> PageNum {
        self.current_position
    }

    fn check_existing(&self, page_num: PageNum) -> DbResult<()> {
        if page_num < 0 || page_num >= self.total_pages {
            return Err(DbError::NonExistingPage(page_num));
        }
        Ok(())
    }

    /// Read page `page_num` into `buf` (which must be exactly `PAGE_SIZE`
    /// bytes). Updates `current_position` to `page_num` on success.
    pub fn read(&mut self, page_num: PageNum, buf: &mut [u8]) -> DbResult<()> {
        self.check_existing(page_num)?;
        debug_assert_eq!(buf.len(), PAGE_SIZE);
        self.file
            .seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))
            .map_err(|e| DbError::SeekFailed(e.to_string()))?;
        self.file
            .read_exact(buf)
            .map_err(|e| DbError::ReadFailed(e.to_string()))?;
        self.current_position = page_num;
        Ok(())
    }

    pub fn read_first(&mut self, buf: &mut [u8]) -> DbResult<()> {
        self.read(0, buf)
    }

    pub fn read_last(&mut self, buf: &mut [u8]) -> DbResult<()> {
        self.read(self.total_pages - 1, buf)
    }

    pub fn read_current(&mut self, buf: &mut [u8]) -> DbResult<()> {
        self.read(self.current_position, buf)
    }

    /// Requires `current_position <= total_pages - 2`.
    pub fn read_next(&mut self, buf: &mut [u8]) -> DbResult<()> {
        if self.current_position > self.total_pages - 2 {
            return Err(DbError::NonExistingPage(self.current_position + 1));
        }
        self.read(self.current_position + 1, buf)
    }

    /// Requires `current_position >= 1`.
    pub fn read_previous(&mut self, buf: &mut [u8]) -> DbResult<()> {
        if self.current_position < 1 {
            return Err(DbError::NonExistingPage(self.current_position - 1));
        }
        self.read(self.current_position - 1, buf)
    }

    /// Ensure the file has at least `page_num + 1` pages, then write `buf` at
    /// that page. Updates `current_position = page_num`.
    pub fn write(&mut self, page_num: PageNum, buf: &[u8]) -> DbResult<()> {
        debug_assert_eq!(buf.len(), PAGE_SIZE);
        self.ensure_capacity(page_num + 1)?;
        self.file
            .seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))
            .map_err(|e| DbError::SeekFailed(e.to_string()))?;
        self.file
            .write_all(buf)
            .map_err(|e| DbError::WriteFailed(e.to_string()))?;
        self.current_position = page_num;
        Ok(())
    }

    /// Write to `current_position`; fails if that position is not an
    /// existing page.
    pub fn write_current(&mut self, buf: &[u8]) -> DbResult<()> {
        self.check_existing(self.current_position)
            .map_err(|_| DbError::WriteFailed("current position is not a valid page".into()))?;
        let pos = self.current_position;
        self.write(pos, buf)
    }

    /// Append one zero-filled page and increment `total_pages`.
    pub fn append_empty_block(&mut self) -> DbResult<()> {
        let zero_page = vec![0u8; PAGE_SIZE];
        self.file
            .seek(SeekFrom::Start(self.total_pages as u64 * PAGE_SIZE as u64))
            .map_err(|e| DbError::SeekFailed(e.to_string()))?;
        self.file
            .write_all(&zero_page)
            .map_err(|e| DbError::WriteFailed(e.to_string()))?;
        self.total_pages += 1;
        Ok(())
    }

    /// If `total_pages < n`, append `n - total_pages` zero-filled pages in
    /// one contiguous write; otherwise no-op.
    pub fn ensure_capacity(&mut self, n: PageNum) -> DbResult<()> {
        if self.total_pages >= n {
            return Ok(());
        }
        let missing = (n - self.total_pages) as usize;
        let padding = vec![0u8; missing * PAGE_SIZE];
        self.file
            .seek(SeekFrom::Start(self.total_pages as u64 * PAGE_SIZE as u64))
            .map_err(|e| DbError::SeekFailed(e.to_string()))?;
        self.file
            .write_all(&padding)
            .map_err(|e| DbError::WriteFailed(e.to_string()))?;
        self.total_pages = n;
        Ok(())
    }
}
