//! In-memory layout and operations on a single fixed-size page: variable-length
//! record insert/delete/lookup/iterate, compaction on delete, free-space
//! reporting. Operates purely on the bytes of a page — no I/O, no knowledge
//! of the buffer pool that pins it.
//!
//! Byte layout of a `PAGE_SIZE` page:
//!
//! ```text
//! [0, HEADER_SIZE)                   fixed scalar header
//! [HEADER_SIZE, HEADER_SIZE+slotCnt*SLOT_SIZE)   slot directory, growing up
//! [DPFIXED+usedPtr, PAGE_SIZE)        live records, growing down from the end
//! ```
//!
//! `DPFIXED` (`HEADER_SIZE + SLOT_SIZE`, i.e. the header plus room for
//! `slot[0]`) is the origin every record offset is measured from, matching
//! the slot-directory-and-record-area overlay of the MiniBase `HFPage` this
//! layout is ported from.

use crate::frame::PAGE_SIZE;
use crate::record_id::{RecordId, INVALID_PAGE};
use crate::typedef::PageId;
use bytemuck::{Pod, Zeroable};
use std::mem;

/// Marks a slot-directory entry as a tombstone, reserved for future reuse.
pub const EMPTY_SLOT: i16 = -1;

#[repr(C)]
#[derive(Pod, Zeroable, Copy, Clone, Debug)]
struct SlottedPageHeader {
    cur_page: PageId,
    prev_page: PageId,
    next_page: PageId,
    slot_cnt: i16,
    used_ptr: i16,
    free_space: i16,
    _padding: [u8; 2],
}

const HEADER_SIZE: usize = mem::size_of::<SlottedPageHeader>();

/// A slot-directory entry: `(offset, length)`, relative to the start of the
/// page's data area (byte `DPFIXED` of the page). `length == EMPTY_SLOT`
/// marks a tombstone.
#[repr(C)]
#[derive(Pod, Zeroable, Copy, Clone, Debug, PartialEq, Eq)]
pub struct Slot {
    offset: i16,
    length: i16,
}

const SLOT_SIZE: usize = mem::size_of::<Slot>();

/// Byte size of the fixed header plus one slot entry (`slot[0]`); the origin
/// that every record's `offset` is measured from.
pub const DPFIXED: usize = HEADER_SIZE + SLOT_SIZE;

impl Slot {
    fn is_tombstone(self) -> bool {
        self.length == EMPTY_SLOT
    }
}

/// Control signals the page returns instead of failing: out-of-space on
/// insert, end-of-iteration, or a malformed/cross-page record id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    /// Page full (insert) or no more records (iteration).
    Done,
    /// Bad argument local to this page: out-of-range or tombstoned slot, or
    /// a record id naming a different page.
    Fail,
}

pub type PageResult<T> = Result<T, PageStatus>;

/// Generic over both read-only and mutable views of a page's bytes, the way
/// the teacher's `TablePage<T>` wraps `AsRef`/`AsMut` page frames.
pub struct SlottedPage<T> {
    buf: T,
}

impl<T: AsRef<[u8]>> SlottedPage<T> {
    fn header(&self) -> &SlottedPageHeader {
        bytemuck::from_bytes(&self.buf.as_ref()[..HEADER_SIZE])
    }

    fn slot_array(&self) -> &[Slot] {
        let cnt = self.header().slot_cnt as usize;
        let end = HEADER_SIZE + cnt * SLOT_SIZE;
        bytemuck::cast_slice(&self.buf.as_ref()[HEADER_SIZE..end])
    }

    /// The page's own id (self-identifying).
    pub fn cur_page(&self) -> PageId {
        self.header().cur_page
    }

    pub fn get_prev_page(&self) -> PageId {
        self.header().prev_page
    }

    pub fn get_next_page(&self) -> PageId {
        self.header().next_page
    }

    pub fn slot_count(&self) -> i16 {
        self.header().slot_cnt
    }

    /// Bytes of unallocated space between the end of the slot directory and
    /// the used pointer, excluding the directory entries already present.
    pub fn available_space(&self) -> i16 {
        let header = self.header();
        if header.slot_cnt == 0 {
            header.free_space - SLOT_SIZE as i16
        } else {
            header.free_space - header.slot_cnt * SLOT_SIZE as i16
        }
    }

    /// True iff no live (non-tombstoned) slot exists.
    pub fn is_empty(&self) -> bool {
        self.slot_array().iter().all(|s| s.is_tombstone())
    }

    /// RID of the first live slot, in ascending slot-index order.
    pub fn first_record(&self) -> PageResult<RecordId> {
        if self.is_empty() {
            return Err(PageStatus::Done);
        }
        for (i, slot) in self.slot_array().iter().enumerate() {
            if !slot.is_tombstone() {
                return Ok(RecordId::new(self.cur_page(), i as i32));
            }
        }
        Err(PageStatus::Done)
    }

    /// RID of the next live slot strictly after `rid.slot_no()`.
    pub fn next_record(&self, rid: RecordId) -> PageResult<RecordId> {
        if rid.page_no() != self.cur_page() {
            return Err(PageStatus::Fail);
        }
        if self.is_empty() {
            return Err(PageStatus::Fail);
        }
        let slots = self.slot_array();
        let start = (rid.slot_no() + 1).max(0) as usize;
        for (offset, slot) in slots.iter().enumerate().skip(start) {
            if !slot.is_tombstone() {
                return Ok(RecordId::new(self.cur_page(), offset as i32));
            }
        }
        Err(PageStatus::Done)
    }

    fn live_slot(&self, rid: RecordId) -> PageResult<Slot> {
        if rid.page_no() != self.cur_page() {
            return Err(PageStatus::Fail);
        }
        let cnt = self.header().slot_cnt;
        if cnt == 0 || rid.slot_no() < 0 || rid.slot_no() >= cnt as i32 {
            return Err(PageStatus::Fail);
        }
        let slot = self.slot_array()[rid.slot_no() as usize];
        if slot.is_tombstone() {
            return Err(PageStatus::Fail);
        }
        Ok(slot)
    }

    fn record_bytes(&self, slot: Slot) -> &[u8] {
        let start = DPFIXED + slot.offset as usize;
        &self.buf.as_ref()[start..start + slot.length as usize]
    }

    /// Copies the record named by `rid` out into an owned buffer.
    pub fn get_record(&self, rid: RecordId) -> PageResult<Vec<u8>> {
        let slot = self.live_slot(rid)?;
        Ok(self.record_bytes(slot).to_vec())
    }

    /// Returns an in-place view of the record named by `rid`, borrowing the
    /// page instead of copying.
    pub fn return_record(&self, rid: RecordId) -> PageResult<&[u8]> {
        let slot = self.live_slot(rid)?;
        Ok(self.record_bytes(slot))
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> SlottedPage<T> {
    fn header_mut(&mut self) -> &mut SlottedPageHeader {
        bytemuck::from_bytes_mut(&mut self.buf.as_mut()[..HEADER_SIZE])
    }

    fn slot_array_mut(&mut self, cnt: usize) -> &mut [Slot] {
        let end = HEADER_SIZE + cnt * SLOT_SIZE;
        bytemuck::cast_slice_mut(&mut self.buf.as_mut()[HEADER_SIZE..end])
    }

    /// Resets the page to empty, self-identified by `page_no`.
    pub fn init(&mut self, page_no: PageId) {
        let data_area = (PAGE_SIZE - DPFIXED) as i16;
        *self.header_mut() = SlottedPageHeader {
            cur_page: page_no,
            prev_page: INVALID_PAGE,
            next_page: INVALID_PAGE,
            slot_cnt: 0,
            used_ptr: data_area,
            free_space: data_area + SLOT_SIZE as i16,
            _padding: [0; 2],
        };
    }

    pub fn set_prev_page(&mut self, page_no: PageId) {
        self.header_mut().prev_page = page_no;
    }

    pub fn set_next_page(&mut self, page_no: PageId) {
        self.header_mut().next_page = page_no;
    }

    /// Finds the lowest tombstoned slot (or appends a fresh one), writes the
    /// record at the top of the live-record region, and returns its RID.
    /// Returns `Done` if `available_space() < record.len()`.
    pub fn insert_record(&mut self, record: &[u8]) -> PageResult<RecordId> {
        let len = record.len() as i16;
        if self.available_space() < len {
            return Err(PageStatus::Done);
        }

        let cnt = self.header().slot_cnt;
        let slot_no = {
            let slots = self.slot_array_mut(cnt as usize);
            slots
                .iter()
                .position(|s| s.is_tombstone())
                .map(|i| i as i16)
                .unwrap_or(cnt)
        };
        let new_cnt = if slot_no == cnt { cnt + 1 } else { cnt };

        let used_ptr = self.header().used_ptr - len;
        let start = DPFIXED + used_ptr as usize;
        self.buf.as_mut()[start..start + len as usize].copy_from_slice(record);

        {
            let slots = self.slot_array_mut(new_cnt as usize);
            slots[slot_no as usize] = Slot {
                offset: used_ptr,
                length: len,
            };
        }

        let header = self.header_mut();
        header.used_ptr = used_ptr;
        header.slot_cnt = new_cnt;
        header.free_space -= len;

        Ok(RecordId::new(self.cur_page(), slot_no as i32))
    }

    /// Removes the record named by `rid`, compacting the live-record region
    /// so no gap remains, and trims any now-trailing tombstones.
    pub fn delete_record(&mut self, rid: RecordId) -> PageResult<()> {
        if rid.page_no() != self.cur_page() {
            return Err(PageStatus::Fail);
        }
        let cnt = self.header().slot_cnt;
        let slot_no = rid.slot_no();
        if cnt == 0 || slot_no < 0 || slot_no >= cnt as i32 {
            return Err(PageStatus::Fail);
        }

        let (offset, length) = {
            let slots = self.slot_array_mut(cnt as usize);
            let slot = slots[slot_no as usize];
            if slot.is_tombstone() {
                return Err(PageStatus::Fail);
            }
            (slot.offset, slot.length)
        };

        let used_ptr = self.header().used_ptr;
        let shift_start = DPFIXED + used_ptr as usize;
        let shift_end = DPFIXED + offset as usize;
        if shift_end > shift_start {
            self.buf
                .as_mut()
                .copy_within(shift_start..shift_end, shift_start + length as usize);
        }

        let mut new_cnt = cnt;
        {
            let slots = self.slot_array_mut(cnt as usize);
            slots[slot_no as usize].length = EMPTY_SLOT;
            for (i, slot) in slots.iter_mut().enumerate() {
                if i as i32 != slot_no && !slot.is_tombstone() && slot.offset < offset {
                    slot.offset += length;
                }
            }
            while new_cnt > 0 && slots[new_cnt as usize - 1].is_tombstone() {
                new_cnt -= 1;
            }
        }

        let header = self.header_mut();
        header.used_ptr = used_ptr + length;
        header.slot_cnt = new_cnt;
        header.free_space += length;

        Ok(())
    }
}

/// Read-only view of a page's bytes.
pub type SlottedPageRef<'a> = SlottedPage<&'a [u8]>;
/// Mutable view of a page's bytes.
pub type SlottedPageMut<'a> = SlottedPage<&'a mut [u8]>;

impl<'a> From<&'a [u8]> for SlottedPageRef<'a> {
    fn from(buf: &'a [u8]) -> Self {
        SlottedPage { buf }
    }
}

impl<'a> From<&'a mut [u8]> for SlottedPageMut<'a> {
    fn from(buf: &'a mut [u8]) -> Self {
        SlottedPage { buf }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::PAGE_SIZE;

    fn new_page(page_no: PageId) -> [u8; PAGE_SIZE] {
        let mut buf = [0u8; PAGE_SIZE];
        SlottedPageMut::from(&mut buf[..]).init(page_no);
        buf
    }

    // S1 — insert/delete round-trip on a page.
    #[test]
    fn insert_delete_round_trip() {
        let mut buf = new_page(5);
        let mut page = SlottedPageMut::from(&mut buf[..]);

        let before = page.available_space();
        let rid_a = page.insert_record(b"AA").unwrap();
        let rid_b = page.insert_record(b"BBBB").unwrap();
        let rid_c = page.insert_record(b"CCC").unwrap();

        assert_eq!(rid_a, RecordId::new(5, 0));
        assert_eq!(rid_b, RecordId::new(5, 1));
        assert_eq!(rid_c, RecordId::new(5, 2));

        let after = page.available_space();
        assert_eq!(
            before - after,
            2 + 4 + 3 + 2 * SLOT_SIZE as i16,
            "available_space must account for payload and new slot entries \
             beyond the one slot DPFIXED already reserves structurally"
        );

        page.delete_record(rid_b).unwrap();
        assert_eq!(page.get_record(rid_a).unwrap(), b"AA");
        assert_eq!(page.get_record(rid_c).unwrap(), b"CCC");
        assert_eq!(page.get_record(rid_b), Err(PageStatus::Fail));

        let rid_d = page.insert_record(b"DD").unwrap();
        assert_eq!(rid_d, RecordId::new(5, 1), "tombstone slot must be reused");
    }

    // S2 — page-full.
    #[test]
    fn insert_until_full() {
        let mut buf = new_page(1);
        let mut page = SlottedPageMut::from(&mut buf[..]);
        let record = [0u8; 100];

        let mut last_ok = false;
        loop {
            match page.insert_record(&record) {
                Ok(_) => last_ok = true,
                Err(PageStatus::Done) => break,
                Err(PageStatus::Fail) => panic!("insert should never FAIL"),
            }
        }
        assert!(last_ok, "at least one insert should have succeeded");
        assert!(page.available_space() < 100);
    }

    #[test]
    fn iteration_visits_live_slots_in_order() {
        let mut buf = new_page(9);
        let mut page = SlottedPageMut::from(&mut buf[..]);
        let a = page.insert_record(b"a").unwrap();
        let b = page.insert_record(b"bb").unwrap();
        let c = page.insert_record(b"ccc").unwrap();
        page.delete_record(b).unwrap();

        let first = page.first_record().unwrap();
        assert_eq!(first, a);
        let next = page.next_record(first).unwrap();
        assert_eq!(next, c);
        assert_eq!(page.next_record(next), Err(PageStatus::Done));
    }

    #[test]
    fn next_record_rejects_foreign_page() {
        let mut buf = new_page(1);
        let mut page = SlottedPageMut::from(&mut buf[..]);
        page.insert_record(b"x").unwrap();
        let foreign = RecordId::new(2, 0);
        assert_eq!(page.next_record(foreign), Err(PageStatus::Fail));
    }

    #[test]
    fn empty_page_reports_done_on_first_record() {
        let buf = new_page(1);
        let page = SlottedPageRef::from(&buf[..]);
        assert_eq!(page.first_record(), Err(PageStatus::Done));
        assert!(page.is_empty());
    }

    #[test]
    fn prev_next_page_accessors() {
        let mut buf = new_page(1);
        let mut page = SlottedPageMut::from(&mut buf[..]);
        page.set_prev_page(10);
        page.set_next_page(20);
        assert_eq!(page.get_prev_page(), 10);
        assert_eq!(page.get_next_page(), 20);
    }

    #[test]
    fn delete_compacts_and_preserves_other_records() {
        let mut buf = new_page(2);
        let mut page = SlottedPageMut::from(&mut buf[..]);
        let a = page.insert_record(b"aaaa").unwrap();
        let b = page.insert_record(b"bb").unwrap();
        let c = page.insert_record(b"cccccc").unwrap();

        page.delete_record(a).unwrap();
        assert_eq!(page.get_record(b).unwrap(), b"bb");
        assert_eq!(page.get_record(c).unwrap(), b"cccccc");

        page.delete_record(b).unwrap();
        page.delete_record(c).unwrap();
        assert!(page.is_empty());
        assert_eq!(page.slot_count(), 0, "trailing tombstones must be trimmed");
    }

    #[test]
    fn delete_rejects_bad_rid() {
        let mut buf = new_page(1);
        let mut page = SlottedPageMut::from(&mut buf[..]);
        assert_eq!(
            page.delete_record(RecordId::new(1, 0)),
            Err(PageStatus::Fail)
        );
        page.insert_record(b"x").unwrap();
        assert_eq!(
            page.delete_record(RecordId::new(1, 5)),
            Err(PageStatus::Fail)
        );
    }
}
