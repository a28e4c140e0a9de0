//! Buffer pool manager: a bounded, in-memory cache of pages from one page
//! file, with pinning, dirty tracking, forced write-back, and pluggable
//! FIFO/LRU replacement.
//!
//! Replacement is unified behind a single per-frame recency *stamp* and a
//! pool-wide *tick* counter: FIFO assigns the stamp once, when a frame is
//! first populated; LRU refreshes it on every pin. Eviction always picks the
//! unpinned frame with the smallest stamp, breaking ties by frame index.


use common::{DbError, DbResult, PageNum, ReplacementStrategy, NO_PAGE, PAGE_SIZE};
use pagefile::PageFileHandle;

/// Normalize the tick counter once it exceeds this bound, to keep stamps
/// from growing without limit under long-running pools.
const TICK_NORMALIZE_THRESHOLD: i32 = 32_000;

struct Frame {
    data: Vec<u8>,
    page: PageNum,
    dirty: bool,
    fix_count: i32,
    stamp: i32,
}

impl Frame {
    fn empty() -> Self {
        Self {
            data: vec![0u8; PAGE_SIZE],
            page: NO_PAGE,
            dirty: false,
            fix_count: 0,
            stamp: 0,
        }
    }

    fn is_empty(&self) -> bool {
        self.page == NO_PAGE
    }
}

/// A snapshot of a pinned page's frame state, handed back by [`BufferPool::pin_page`].
///
/// Carries the page number plus the dirty flag and fix count observed at
/// pin time; actual byte access goes back through the pool via
/// [`BufferPool::page_data`] / [`BufferPool::page_data_mut`], since a frame's
/// buffer is owned by the pool for the pool's lifetime.
#[derive(Clone, Copy, Debug)]
pub struct PageHandle {
    pub page_num: PageNum,
    pub dirty: bool,
    pub fix_count: i32,
}

/// A bounded cache of pages from a single page file.
pub struct BufferPool {
    file: PageFileHandle,
    frames: Vec<Frame>,
    strategy: ReplacementStrategy,
    tick: i32,
    read_io: u64,
    write_io: u64,
}

impl BufferPool {
    /// Open `file_name` (which must already exist) and allocate `num_frames`
    /// empty frames.
    pub fn init(
        file_name: &str,
        num_frames: usize,
        strategy: ReplacementStrategy,
    ) -> DbResult<Self> {
        if num_frames == 0 {
            return Err(DbError::MemAllocFailed);
        }
        let file = PageFileHandle::open(file_name).map_err(|_| DbError::FileNotFound)?;
        let frames = (0..num_frames).map(|_| Frame::empty()).collect();
        Ok(Self {
            file,
            frames,
            strategy,
            tick: 0,
            read_io: 0,
            write_io: 0,
        })
    }

    fn find_frame(&self, page_num: PageNum) -> Option<usize> {
        self.frames.iter().position(|f| f.page == page_num)
    }

    fn pick_victim(&self) -> Option<usize> {
        self.frames
            .iter()
            .enumerate()
            .filter(|(_, f)| f.fix_count == 0)
            .min_by_key(|(idx, f)| (f.stamp, *idx))
            .map(|(idx, _)| idx)
    }

    fn next_tick(&mut self) -> i32 {
        let t = self.tick;
        self.tick += 1;
        t
    }

    fn normalize_if_needed(&mut self) {
        if self.tick <= TICK_NORMALIZE_THRESHOLD {
            return;
        }
        let min_stamp = self
            .frames
            .iter()
            .filter(|f| !f.is_empty())
            .map(|f| f.stamp)
            .min()
            .unwrap_or(0);
        if min_stamp == 0 {
            return;
        }
        for frame in self.frames.iter_mut() {
            if !frame.is_empty() {
                frame.stamp -= min_stamp;
            }
        }
        self.tick -= min_stamp;
    }

    fn write_back(&mut self, frame_idx: usize) -> DbResult<()> {
        let page = self.frames[frame_idx].page;
        self.file.write(page, &self.frames[frame_idx].data)?;
        self.write_io += 1;
        self.frames[frame_idx].dirty = false;
        Ok(())
    }

    /// Fetch `page_num` into a frame (reading it from disk if not already
    /// resident), pin it, and return a handle describing the frame's state.
    pub fn pin_page(&mut self, page_num: PageNum) -> DbResult<PageHandle> {
        if let Some(idx) = self.find_frame(page_num) {
            self.frames[idx].fix_count += 1;
            if self.strategy == ReplacementStrategy::Lru {
                let stamp = self.next_tick();
                self.frames[idx].stamp = stamp;
            }
            return Ok(self.handle_for(idx));
        }

        if let Some(idx) = self.frames.iter().position(|f| f.is_empty()) {
            self.file.read(page_num, &mut self.frames[idx].data)?;
            self.read_io += 1;
            let stamp = self.next_tick();
            let frame = &mut self.frames[idx];
            frame.page = page_num;
            frame.stamp = stamp;
            frame.dirty = false;
            frame.fix_count = 1;
            self.normalize_if_needed();
            return Ok(self.handle_for(idx));
        }

        let victim = self.pick_victim().ok_or(DbError::NoFrame(page_num))?;
        if self.frames[victim].dirty {
            self.write_back(victim)?;
        }
        self.file.read(page_num, &mut self.frames[victim].data)?;
        self.read_io += 1;
        let stamp = self.next_tick();
        let frame = &mut self.frames[victim];
        frame.page = page_num;
        frame.stamp = stamp;
        frame.dirty = false;
        frame.fix_count = 1;
        self.normalize_if_needed();
        Ok(self.handle_for(victim))
    }

    fn handle_for(&self, idx: usize) -> PageHandle {
        let frame = &self.frames[idx];
        PageHandle {
            page_num: frame.page,
            dirty: frame.dirty,
            fix_count: frame.fix_count,
        }
    }

    /// Immutable access to the bytes of a pinned page.
    pub fn page_data(&self, handle: &PageHandle) -> &[u8] {
        let idx = self
            .find_frame(handle.page_num)
            .expect("page handle refers to a resident frame");
        &self.frames[idx].data
    }

    /// Mutable access to the bytes of a pinned page.
    pub fn page_data_mut(&mut self, handle: &PageHandle) -> &mut [u8] {
        let idx = self
            .find_frame(handle.page_num)
            .expect("page handle refers to a resident frame");
        &mut self.frames[idx].data
    }

    /// Mark the frame holding `handle.page_num` dirty.
    pub fn mark_dirty(&mut self, handle: &PageHandle) -> DbResult<()> {
        let idx = self
            .find_frame(handle.page_num)
            .ok_or(DbError::PageNotFound(handle.page_num))?;
        self.frames[idx].dirty = true;
        Ok(())
    }

    /// Decrement the fix count of the frame holding `handle.page_num`. A
    /// page not found in the pool is a quietly-successful no-op, matching
    /// the source behavior flagged in the design notes as suspicious but
    /// kept for compatibility.
    pub fn unpin_page(&mut self, handle: &PageHandle) {
        if let Some(idx) = self.find_frame(handle.page_num) {
            self.frames[idx].fix_count -= 1;
        }
    }

    /// Write the frame holding `handle.page_num` back to disk unconditionally,
    /// clearing its dirty flag (and the passed handle's). Does not affect
    /// fix count.
    pub fn force_page(&mut self, handle: &mut PageHandle) -> DbResult<()> {
        let idx = self
            .find_frame(handle.page_num)
            .ok_or(DbError::PageNotFound(handle.page_num))?;
        self.write_back(idx)?;
        handle.dirty = false;
        Ok(())
    }

    /// Write back every unpinned, dirty frame and clear its dirty flag.
    pub fn force_flush_pool(&mut self) -> DbResult<()> {
        let dirty_unpinned: Vec<usize> = self
            .frames
            .iter()
            .enumerate()
            .filter(|(_, f)| f.fix_count == 0 && f.dirty)
            .map(|(idx, _)| idx)
            .collect();
        for idx in dirty_unpinned {
            self.write_back(idx)
                .map_err(|e| DbError::ForceFlushFailed(e.to_string()))?;
        }
        Ok(())
    }

    /// Flush and invalidate the pool. Fails if any frame is still pinned,
    /// leaving the pool usable.
    pub fn shutdown(&mut self) -> DbResult<()> {
        let pinned = self.frames.iter().filter(|f| f.fix_count > 0).count();
        if pinned > 0 {
            return Err(DbError::ShutdownFailed(pinned));
        }
        self.force_flush_pool()?;
        self.frames.clear();
        Ok(())
    }

    /// Extend the pool's backing file by one zero-filled page and return its
    /// page number. The buffer pool owns the file exclusively, so higher
    /// layers that need to grow the file (e.g. the record manager appending
    /// a new data or metadata page) go through this rather than touching
    /// the page file directly.
    pub fn allocate_page(&mut self) -> DbResult<PageNum> {
        self.file.append_empty_block()?;
        Ok(self.file.total_pages() - 1)
    }

    pub fn num_read_io(&self) -> u64 {
        self.read_io
    }

    pub fn num_write_io(&self) -> u64 {
        self.write_io
    }

    pub fn frame_contents(&self) -> Vec<PageNum> {
        self.frames.iter().map(|f| f.page).collect()
    }

    pub fn dirty_flags(&self) -> Vec<bool> {
        self.frames.iter().map(|f| f.dirty).collect()
    }

    pub fn fix_counts(&self) -> Vec<i32> {
        self.frames.iter().map(|f| f.fix_count).collect()
    }
}
