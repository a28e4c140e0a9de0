//! On-disk table format and the record manager's CRUD/scan operations.
//!
//! A table is one page file laid out as: a header page (page 0) carrying
//! four header ints plus a serialized [`Schema`] (spilling onto further
//! pages if the schema string doesn't fit in page 0's remainder), followed
//! by a chain of page-metadata pages, each an array of `(data_page,
//! used_count)` pairs whose last slot doubles as a forward pointer to the
//! next page-metadata page. Data pages are divided into fixed-size slots,
//! each `[live: 1 byte][record bytes]`.

use buffer::BufferPool;
use common::{DbError, DbResult, PageNum, ReplacementStrategy, Rid, NO_PAGE, PAGE_SIZE};
use pagefile::PageFileHandle;

use crate::predicate::Predicate;
use crate::record::Record;
use crate::schema::Schema;

/// Default slot width in bytes: chosen so `slots_per_page == 16`.
pub const DEFAULT_SLOT_SIZE: i32 = 256;

const HEADER_BYTES: usize = 16;
const META_ENTRY_BYTES: usize = 8;
/// Frame count for the dedicated buffer pool `openTable` allocates per table.
const TABLE_POOL_FRAMES: usize = 10;

fn entries_per_meta_page() -> usize {
    PAGE_SIZE / META_ENTRY_BYTES
}

/// Number of entries in a metadata page actually available for data-page
/// bookkeeping; the last entry is reserved as the forward pointer.
fn data_entry_slots_per_meta_page() -> usize {
    entries_per_meta_page() - 1
}

fn forward_pointer_idx() -> usize {
    entries_per_meta_page() - 1
}

fn entry_offset(idx: usize) -> usize {
    idx * META_ENTRY_BYTES
}

fn read_entry(buf: &[u8], idx: usize) -> (i32, i32) {
    let off = entry_offset(idx);
    let a = i32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
    let b = i32::from_le_bytes(buf[off + 4..off + 8].try_into().unwrap());
    (a, b)
}

fn write_entry(buf: &mut [u8], idx: usize, a: i32, b: i32) {
    let off = entry_offset(idx);
    buf[off..off + 4].copy_from_slice(&a.to_le_bytes());
    buf[off + 4..off + 8].copy_from_slice(&b.to_le_bytes());
}

#[derive(Clone, Copy, Debug)]
struct Header {
    meta_size: i32,
    slots_per_page: i32,
    slot_size: i32,
    num_tuples: i32,
}

impl Header {
    fn read(buf: &[u8]) -> Self {
        Self {
            meta_size: i32::from_le_bytes(buf[0..4].try_into().unwrap()),
            slots_per_page: i32::from_le_bytes(buf[4..8].try_into().unwrap()),
            slot_size: i32::from_le_bytes(buf[8..12].try_into().unwrap()),
            num_tuples: i32::from_le_bytes(buf[12..16].try_into().unwrap()),
        }
    }

    fn write(&self, buf: &mut [u8]) {
        buf[0..4].copy_from_slice(&self.meta_size.to_le_bytes());
        buf[4..8].copy_from_slice(&self.slots_per_page.to_le_bytes());
        buf[8..12].copy_from_slice(&self.slot_size.to_le_bytes());
        buf[12..16].copy_from_slice(&self.num_tuples.to_le_bytes());
    }
}

/// Number of header+schema pages needed to hold `schema_bytes_len` bytes of
/// serialized schema, given page 0 reserves its first 16 bytes for the
/// header ints.
fn schema_pages_needed(schema_bytes_len: usize) -> i32 {
    let page0_capacity = PAGE_SIZE - HEADER_BYTES;
    if schema_bytes_len <= page0_capacity {
        1
    } else {
        1 + (schema_bytes_len - page0_capacity).div_ceil(PAGE_SIZE) as i32
    }
}

/// Create a new table file named `name` with the given `schema`: a header
/// page (+ overflow schema pages), then one initial page-metadata page with
/// every entry marked unused.
pub fn create_table(name: &str, schema: &Schema) -> DbResult<()> {
    let slot_size = DEFAULT_SLOT_SIZE;
    let slots_per_page = PAGE_SIZE as i32 / slot_size;
    let schema_str = schema.to_string();
    let schema_bytes = schema_str.as_bytes();
    let meta_size = schema_pages_needed(schema_bytes.len());

    PageFileHandle::create(name)?;
    let mut file = PageFileHandle::open(name)?;
    file.ensure_capacity(meta_size + 1)?;

    let mut remaining = schema_bytes;
    for page_num in 0..meta_size {
        let mut buf = vec![0u8; PAGE_SIZE];
        let payload_start = if page_num == 0 {
            let header = Header {
                meta_size,
                slots_per_page,
                slot_size,
                num_tuples: 0,
            };
            header.write(&mut buf[..HEADER_BYTES]);
            HEADER_BYTES
        } else {
            0
        };
        let capacity = PAGE_SIZE - payload_start;
        let take = remaining.len().min(capacity);
        buf[payload_start..payload_start + take].copy_from_slice(&remaining[..take]);
        remaining = &remaining[take..];
        file.write(page_num, &buf)?;
    }

    let mut meta_buf = vec![0u8; PAGE_SIZE];
    for idx in 0..entries_per_meta_page() {
        write_entry(&mut meta_buf, idx, NO_PAGE, NO_PAGE);
    }
    file.write(meta_size, &meta_buf)?;
    file.close();
    Ok(())
}

/// Remove a table's backing file.
pub fn delete_table(name: &str) -> DbResult<()> {
    PageFileHandle::destroy(name)
}

/// A cursor over a sequential scan. Tracks `(current metadata page, entry
/// index within it, slot index within the current data page)`.
pub struct ScanHandle {
    meta_page: PageNum,
    entry_idx: usize,
    slot_idx: i32,
    predicate: Predicate,
    done: bool,
}

/// An open table: its dedicated buffer pool, parsed schema, and the layout
/// constants read back from its header.
pub struct TableHandle {
    pool: BufferPool,
    schema: Schema,
    meta_size: i32,
    slots_per_page: i32,
    slot_size: i32,
}

impl TableHandle {
    /// Open `name`'s page file, initialize a dedicated 10-frame LRU buffer
    /// pool for it, and reconstruct the schema from the header pages.
    pub fn open(name: &str) -> DbResult<Self> {
        let mut pool = BufferPool::init(name, TABLE_POOL_FRAMES, ReplacementStrategy::Lru)?;

        let h0 = pool.pin_page(0)?;
        let header = Header::read(&pool.page_data(&h0)[..HEADER_BYTES]);
        pool.unpin_page(&h0);

        let mut schema_bytes = Vec::new();
        for page_num in 0..header.meta_size {
            let h = pool.pin_page(page_num)?;
            let data = pool.page_data(&h);
            let start = if page_num == 0 { HEADER_BYTES } else { 0 };
            schema_bytes.extend_from_slice(&data[start..]);
            pool.unpin_page(&h);
        }
        let end = schema_bytes
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(schema_bytes.len());
        let schema_str = std::str::from_utf8(&schema_bytes[..end])
            .map_err(|e| DbError::InvalidSchema(e.to_string()))?;
        let schema = Schema::parse(schema_str)?;

        Ok(Self {
            pool,
            schema,
            meta_size: header.meta_size,
            slots_per_page: header.slots_per_page,
            slot_size: header.slot_size,
        })
    }

    /// Flush and shut down the table's buffer pool.
    pub fn close(mut self) -> DbResult<()> {
        self.pool.shutdown()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn get_num_tuples(&mut self) -> DbResult<i32> {
        let h = self.pool.pin_page(0)?;
        let header = Header::read(&self.pool.page_data(&h)[..HEADER_BYTES]);
        self.pool.unpin_page(&h);
        Ok(header.num_tuples)
    }

    fn bump_num_tuples(&mut self, delta: i32) -> DbResult<()> {
        let h = self.pool.pin_page(0)?;
        let mut header = Header::read(&self.pool.page_data(&h)[..HEADER_BYTES]);
        header.num_tuples += delta;
        header.write(&mut self.pool.page_data_mut(&h)[..HEADER_BYTES]);
        self.pool.mark_dirty(&h)?;
        self.pool.unpin_page(&h);
        Ok(())
    }

    /// Walk the metadata chain for the first registered entry with room
    /// (`0 <= used_count < slots_per_page`). If none exists, reuse an
    /// unused (`-1`) entry slot in the last metadata page, or append a new
    /// metadata page if that page's entry array is full; either way,
    /// allocate a fresh data page and register it there with `used_count =
    /// 0`. Returns `(meta_page, entry_idx, data_page, used_count)`.
    ///
    /// `used_count` is a count of live slots on the page, not an insertion
    /// index — the caller still has to find an actual free slot by
    /// scanning live flags, since a non-tail delete can leave a hole below
    /// the highest-ever-used slot (see [`Self::find_free_slot_in_page`]).
    fn find_or_allocate_slot(&mut self) -> DbResult<(PageNum, usize, PageNum, i32)> {
        let mut meta_page = self.meta_size;
        let mut last_meta_page = meta_page;
        loop {
            let h = self.pool.pin_page(meta_page)?;
            let data = self.pool.page_data(&h).to_vec();
            self.pool.unpin_page(&h);

            for idx in 0..data_entry_slots_per_meta_page() {
                let (data_page, used_count) = read_entry(&data, idx);
                if used_count != NO_PAGE && used_count != self.slots_per_page {
                    return Ok((meta_page, idx, data_page, used_count));
                }
            }

            let (next_ptr, _) = read_entry(&data, forward_pointer_idx());
            last_meta_page = meta_page;
            if next_ptr == NO_PAGE {
                break;
            }
            meta_page = next_ptr;
        }

        let h = self.pool.pin_page(last_meta_page)?;
        let data = self.pool.page_data(&h).to_vec();
        self.pool.unpin_page(&h);

        let free_slot_idx = (0..data_entry_slots_per_meta_page())
            .find(|&idx| read_entry(&data, idx).1 == NO_PAGE);

        let (target_meta_page, target_idx) = match free_slot_idx {
            Some(idx) => (last_meta_page, idx),
            None => {
                let new_meta_page = self.pool.allocate_page()?;
                let mut new_buf = vec![0u8; PAGE_SIZE];
                for idx in 0..entries_per_meta_page() {
                    write_entry(&mut new_buf, idx, NO_PAGE, NO_PAGE);
                }
                let nh = self.pool.pin_page(new_meta_page)?;
                self.pool.page_data_mut(&nh).copy_from_slice(&new_buf);
                self.pool.mark_dirty(&nh)?;
                self.pool.unpin_page(&nh);

                let lh = self.pool.pin_page(last_meta_page)?;
                write_entry(
                    self.pool.page_data_mut(&lh),
                    forward_pointer_idx(),
                    new_meta_page,
                    NO_PAGE,
                );
                self.pool.mark_dirty(&lh)?;
                self.pool.unpin_page(&lh);

                (new_meta_page, 0)
            }
        };

        let new_data_page = self.pool.allocate_page()?;
        let mh = self.pool.pin_page(target_meta_page)?;
        write_entry(self.pool.page_data_mut(&mh), target_idx, new_data_page, 0);
        self.pool.mark_dirty(&mh)?;
        self.pool.unpin_page(&mh);

        Ok((target_meta_page, target_idx, new_data_page, 0))
    }

    /// Find the first slot on `data_page` whose live flag is clear. A page
    /// registered with `used_count < slots_per_page` is guaranteed to have
    /// one, but which byte offset it is depends on delete history, not just
    /// `used_count` — a non-tail delete frees a slot below the page's
    /// highest-ever-used index, so this scans live flags rather than
    /// trusting `used_count` as a literal append position.
    fn find_free_slot_in_page(&mut self, data_page: PageNum) -> DbResult<i32> {
        let dh = self.pool.pin_page(data_page)?;
        let slot_size = self.slot_size as usize;
        let found = {
            let buf = self.pool.page_data(&dh);
            (0..self.slots_per_page).find(|&idx| buf[idx as usize * slot_size] == 0)
        };
        self.pool.unpin_page(&dh);
        found.ok_or(DbError::PageNotFound(data_page))
    }

    /// Insert `record`, assigning it a fresh [`Rid`]. Writes go through the
    /// table's buffer pool: pin, write, mark dirty, unpin.
    pub fn insert_record(&mut self, record: &Record) -> DbResult<Rid> {
        if record.data.len() != self.schema.record_size() {
            return Err(DbError::InvalidArg(format!(
                "record is {} bytes, schema expects {}",
                record.data.len(),
                self.schema.record_size()
            )));
        }

        let (meta_page, entry_idx, data_page, used_count) = self.find_or_allocate_slot()?;
        let slot_idx = self.find_free_slot_in_page(data_page)?;
        let rid = Rid::new(data_page, slot_idx * self.slot_size);

        let dh = self.pool.pin_page(data_page)?;
        let slot_start = rid.slot as usize;
        {
            let buf = self.pool.page_data_mut(&dh);
            buf[slot_start] = 1;
            buf[slot_start + 1..slot_start + 1 + record.data.len()].copy_from_slice(&record.data);
        }
        self.pool.mark_dirty(&dh)?;
        self.pool.unpin_page(&dh);

        let mh = self.pool.pin_page(meta_page)?;
        write_entry(
            self.pool.page_data_mut(&mh),
            entry_idx,
            data_page,
            used_count + 1,
        );
        self.pool.mark_dirty(&mh)?;
        self.pool.unpin_page(&mh);

        self.bump_num_tuples(1)?;
        Ok(rid)
    }

    /// Read the record at `rid`. Fails with [`DbError::RecordNotExist`] if
    /// its live flag is clear.
    pub fn get_record(&mut self, rid: Rid) -> DbResult<Record> {
        let dh = self.pool.pin_page(rid.page)?;
        let slot_start = rid.slot as usize;
        let size = self.schema.record_size();
        let result = {
            let buf = self.pool.page_data(&dh);
            if buf[slot_start] == 0 {
                None
            } else {
                Some(buf[slot_start + 1..slot_start + 1 + size].to_vec())
            }
        };
        self.pool.unpin_page(&dh);
        result
            .map(Record::from_bytes)
            .ok_or(DbError::RecordNotExist)
    }

    /// Overwrite the bytes of the record addressed by `rid` in place.
    pub fn update_record(&mut self, rid: Rid, data: &[u8]) -> DbResult<()> {
        if data.len() != self.schema.record_size() {
            return Err(DbError::InvalidArg(format!(
                "record is {} bytes, schema expects {}",
                data.len(),
                self.schema.record_size()
            )));
        }
        let dh = self.pool.pin_page(rid.page)?;
        let slot_start = rid.slot as usize;
        self.pool.page_data_mut(&dh)[slot_start + 1..slot_start + 1 + data.len()]
            .copy_from_slice(data);
        self.pool.mark_dirty(&dh)?;
        self.pool.unpin_page(&dh);
        Ok(())
    }

    /// Clear the record's slot (live flag and body) and decrement both the
    /// header's tuple count and the owning metadata entry's used-count.
    ///
    /// The used-count decrement is an explicit deviation from the source,
    /// which never decrements on delete (see the design notes): without it
    /// `num_tuples` and the metadata chain would drift out of sync. Because
    /// `used_count` is a live-slot count rather than an insertion index
    /// (see [`Self::find_free_slot_in_page`]), decrementing it unconditionally
    /// here is correct regardless of whether the deleted slot was the tail.
    pub fn delete_record(&mut self, rid: Rid) -> DbResult<()> {
        let dh = self.pool.pin_page(rid.page)?;
        let slot_start = rid.slot as usize;
        let slot_size = self.slot_size as usize;
        let was_live = {
            let buf = self.pool.page_data_mut(&dh);
            let live = buf[slot_start] != 0;
            if live {
                for b in buf[slot_start..slot_start + slot_size].iter_mut() {
                    *b = 0;
                }
            }
            live
        };
        if was_live {
            self.pool.mark_dirty(&dh)?;
        }
        self.pool.unpin_page(&dh);
        if !was_live {
            return Err(DbError::RecordNotExist);
        }

        self.decrement_meta_used_count(rid.page)?;
        self.bump_num_tuples(-1)?;
        Ok(())
    }

    fn decrement_meta_used_count(&mut self, data_page: PageNum) -> DbResult<()> {
        let mut meta_page = self.meta_size;
        loop {
            let h = self.pool.pin_page(meta_page)?;
            let data = self.pool.page_data(&h).to_vec();
            self.pool.unpin_page(&h);

            for idx in 0..data_entry_slots_per_meta_page() {
                let (dp, used_count) = read_entry(&data, idx);
                if dp == data_page && used_count != NO_PAGE {
                    let mh = self.pool.pin_page(meta_page)?;
                    write_entry(self.pool.page_data_mut(&mh), idx, dp, used_count - 1);
                    self.pool.mark_dirty(&mh)?;
                    self.pool.unpin_page(&mh);
                    return Ok(());
                }
            }

            let (next_ptr, _) = read_entry(&data, forward_pointer_idx());
            if next_ptr == NO_PAGE {
                return Err(DbError::PageNotFound(data_page));
            }
            meta_page = next_ptr;
        }
    }

    /// Start a sequential scan over every metadata entry's data page,
    /// filtering by `predicate`.
    pub fn start_scan(&self, predicate: Predicate) -> ScanHandle {
        ScanHandle {
            meta_page: self.meta_size,
            entry_idx: 0,
            slot_idx: 0,
            predicate,
            done: false,
        }
    }

    /// Advance `scan` and return the next record matching its predicate, or
    /// [`DbError::NoMoreTuples`] once the metadata chain is exhausted.
    pub fn next(&mut self, scan: &mut ScanHandle) -> DbResult<Record> {
        if scan.done {
            return Err(DbError::NoMoreTuples);
        }
        loop {
            if scan.entry_idx >= data_entry_slots_per_meta_page() {
                let h = self.pool.pin_page(scan.meta_page)?;
                let (next_ptr, _) = read_entry(self.pool.page_data(&h), forward_pointer_idx());
                self.pool.unpin_page(&h);
                if next_ptr == NO_PAGE {
                    scan.done = true;
                    return Err(DbError::NoMoreTuples);
                }
                scan.meta_page = next_ptr;
                scan.entry_idx = 0;
                scan.slot_idx = 0;
                continue;
            }

            let h = self.pool.pin_page(scan.meta_page)?;
            let (data_page, used_count) = read_entry(self.pool.page_data(&h), scan.entry_idx);
            self.pool.unpin_page(&h);

            if used_count == NO_PAGE || scan.slot_idx >= used_count {
                scan.entry_idx += 1;
                scan.slot_idx = 0;
                continue;
            }

            let rid = Rid::new(data_page, scan.slot_idx * self.slot_size);
            scan.slot_idx += 1;

            let dh = self.pool.pin_page(data_page)?;
            let slot_start = rid.slot as usize;
            let size = self.schema.record_size();
            let (live, bytes) = {
                let buf = self.pool.page_data(&dh);
                (buf[slot_start] != 0, buf[slot_start + 1..slot_start + 1 + size].to_vec())
            };
            self.pool.unpin_page(&dh);

            if !live {
                continue;
            }
            let record = Record::from_bytes(bytes);
            if scan.predicate.eval(&record, &self.schema)? {
                return Ok(record);
            }
        }
    }

    /// Release a scan cursor. A no-op since [`ScanHandle`] holds no
    /// resources of its own (all page access goes through the table's
    /// pool), but kept for symmetry with `start_scan`.
    pub fn close_scan(&self, _scan: ScanHandle) {}
}

#[cfg(test)]
mod tests;
