use crate::frame::PAGE_SIZE;
use crate::typedef::PageId;
use crate::Result;
use bytes::{Bytes, BytesMut};
use rustdb_error::{errdata, Error};
use std::cell::RefCell;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const DELETED_FLAG: &[u8] = &[1];
const LIVE_FLAG: &[u8] = &[0];
const EMPTY_BUFFER: &[u8] = &[0; PAGE_SIZE];
/// Each on-disk slot is a one-byte liveness flag followed by a full page of
/// data; the flag is kept outside the page's own bytes so a tombstoned page
/// can never be confused with live data whose first byte happens to be 1.
const SLOT_STRIDE: usize = PAGE_SIZE + 1;

/// Handles read and write accesses to pages stored in a single backing
/// file. File I/O is synchronous; the buffer pool is what gives callers an
/// in-memory cache on top of it.
#[derive(Debug)]
pub struct DiskManager {
    next_page_id: PageId,
    /// Deallocated single pages, tombstoned on disk and reusable by the next
    /// `allocate_page` call before the high-water mark is bumped again.
    free_list: Vec<PageId>,
    file: RefCell<std::fs::File>,
}

impl DiskManager {
    /// Opens (creating and truncating if necessary) the database file at
    /// `path`.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path: PathBuf = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::OpenOptions::new()
            .write(true)
            .read(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        let mut disk_manager = Self {
            next_page_id: 0,
            free_list: Vec::new(),
            file: RefCell::new(file),
        };

        disk_manager.write_page(0, EMPTY_BUFFER)?;
        tracing::trace!(path = %path.display(), "disk manager opened");
        Ok(disk_manager)
    }

    /// Allocates `count` contiguous page ids, returning the first. Only
    /// single-page requests draw from the free list; multi-page runs always
    /// bump the high-water mark so the run stays contiguous. The high-water
    /// mark is pre-incremented before use (mirroring the teacher's
    /// `last_allocated_pid += 1; let page_id = last_allocated_pid;`), so page
    /// 0 — written by `new()` — is never handed back out.
    pub fn allocate_pages(&mut self, count: usize) -> Result<PageId> {
        if count == 1 {
            if let Some(reused) = self.free_list.pop() {
                self.write_page(reused, EMPTY_BUFFER)?;
                return Ok(reused);
            }
        }

        self.next_page_id = self
            .next_page_id
            .checked_add(1)
            .ok_or(Error::ArithmeticOverflow)?;
        let first = self.next_page_id;
        if count > 1 {
            self.next_page_id = first
                .checked_add(count as i64 - 1)
                .ok_or(Error::ArithmeticOverflow)?;
        }
        for i in 0..count as i64 {
            self.write_page(first + i, EMPTY_BUFFER)?;
        }
        tracing::trace!(first, count, "allocated pages");
        Ok(first)
    }

    pub fn allocate_page(&mut self) -> Result<PageId> {
        self.allocate_pages(1)
    }

    pub fn deallocate_page(&mut self, page_id: PageId) -> Result<()> {
        let mut file = self.file.borrow_mut();
        file.seek(SeekFrom::Start(Self::calculate_offset(page_id)?))?;
        file.write_all(DELETED_FLAG)?;
        drop(file);
        self.free_list.push(page_id);
        tracing::trace!(page_id, "deallocated page");
        Ok(())
    }

    pub fn read_page(&self, page_id: PageId) -> Result<Option<Bytes>> {
        let mut file = self.file.borrow_mut();
        file.seek(SeekFrom::Start(Self::calculate_offset(page_id)?))?;

        let mut flag = [0u8; 1];
        file.read_exact(&mut flag)?;
        if flag == DELETED_FLAG {
            return Ok(None);
        }

        let mut bytes = BytesMut::zeroed(PAGE_SIZE);
        file.read_exact(&mut bytes)?;
        tracing::trace!(page_id, "read page");
        Ok(Some(bytes.freeze()))
    }

    pub fn write_page(&self, page_id: PageId, data: &[u8]) -> Result<()> {
        if data.len() > PAGE_SIZE {
            return errdata!(
                "page data must fit in a page ({} > {})",
                data.len(),
                PAGE_SIZE
            );
        }

        let mut file = self.file.borrow_mut();
        file.seek(SeekFrom::Start(Self::calculate_offset(page_id)?))?;
        file.write_all(LIVE_FLAG)?;
        file.write_all(data)?;
        file.sync_all()?;
        tracing::trace!(page_id, "wrote page");
        Ok(())
    }

    fn calculate_offset(page_id: PageId) -> Result<u64> {
        if page_id < 0 {
            return errdata!("page id {} is negative", page_id);
        }
        (page_id as u64)
            .checked_mul(SLOT_STRIDE as u64)
            .ok_or(Error::ArithmeticOverflow)
    }
}
