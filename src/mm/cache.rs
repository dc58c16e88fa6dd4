/*
 * Copyright 2026 The Boron Project
 *
 * This file is part of Boron.
 *
 * Boron is free software: you can redistribute it and/or modify it under the
 * terms of the GNU General Public License as published by the Free Software
 * Foundation, either version 3 of the License, or (at your option) any later
 * version.
 *
 * Boron is distributed in the hope that it will be useful, but WITHOUT ANY
 * WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR
 * A PARTICULAR PURPOSE. See the GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License along with
 * Boron. If not, see <https://www.gnu.org/licenses/>.
 */

//! Cache control blocks and the system view cache (spec 4.9).
//!
//! A CCB maps a file's page index to the PFN currently caching that page's
//! content; an FCB with `DISPATCH_FLAG_DIRECTLY_MAPPABLE` owns exactly one.
//! The original indexes this with a direct block plus up to four levels of
//! 512/1024-entry indirect blocks, mirroring a classic Unix inode's
//! block-map; a `BTreeMap` keyed by page index gives the same sparse,
//! logarithmic-lookup shape without hand-rolling indirection levels, so
//! that is what backs it here.

use super::pfn::{CacheBacking, PfnDatabase};
use crate::hal::page_table::Pfn;
use crate::rtl::index_list::{IndexList, Linkable};
use crate::status::{EResult, Status};
use crate::sync::mutex::Mutex;
use crate::sync::spin::IntSpin;
use alloc::collections::BTreeMap;

/// Opaque identity of one cache control block, used as the `ccb` half of
/// [`CacheBacking`] and as the view cache's key.
pub type CcbId = u64;

/// One file's page cache. Guarded by a single mutex: the original keeps a
/// `CCB_MUTEX` per file rather than per page, since indirect-block
/// allocation already has to serialize against concurrent faults on
/// neighboring pages of the same file.
pub struct Ccb {
	id: CcbId,
	pages: Mutex<BTreeMap<u64, Pfn>>,
	/// Lowest/highest page index with an outstanding modified page, so the
	/// modified-page writer can flush a file's dirty range without scanning
	/// every page (spec 4.5's writer reads this off the owning CCB).
	modified_range: Mutex<Option<(u64, u64)>>,
}

impl Ccb {
	pub fn new(id: CcbId) -> Self {
		Ccb { id, pages: Mutex::new(BTreeMap::new()), modified_range: Mutex::new(None) }
	}

	pub fn id(&self) -> CcbId {
		self.id
	}

	/// Looks up the PFN currently caching `page_index`, if any.
	pub fn lookup(&self, page_index: u64) -> Option<Pfn> {
		self.pages.lock().get(&page_index).copied()
	}

	/// Records that `page_index` is now cached in `pfn`.
	pub fn insert(&self, page_index: u64, pfn: Pfn) {
		self.pages.lock().insert(page_index, pfn);
	}

	/// Removes `page_index` from the map, e.g. when its page is reclaimed
	/// off the standby list for something else.
	pub fn remove(&self, page_index: u64) -> Option<Pfn> {
		self.pages.lock().remove(&page_index)
	}

	/// Marks `page_index` dirty, widening the tracked modified range.
	pub fn mark_modified(&self, page_index: u64) {
		let mut range = self.modified_range.lock();
		*range = Some(match *range {
			Some((lo, hi)) => (lo.min(page_index), hi.max(page_index)),
			None => (page_index, page_index),
		});
	}

	/// Takes the tracked modified range, resetting it to "nothing dirty".
	/// Called by the modified-page writer once it has queued every page in
	/// the range for write-back.
	pub fn take_modified_range(&self) -> Option<(u64, u64)> {
		self.modified_range.lock().take()
	}

	pub fn backing_for(&self, page_index: u64) -> CacheBacking {
		CacheBacking { ccb: self.id, page_index }
	}
}

/// Per-view reference count plus the LRU links. One entry per (CCB, base
/// offset) pairing currently mapped into some address space.
struct ViewEntry {
	ccb: CcbId,
	offset: u64,
	consumers: u32,
	prev: Option<u64>,
	next: Option<u64>,
}

impl Linkable<u64> for ViewEntry {
	fn prev(&self) -> Option<u64> {
		self.prev
	}
	fn next(&self) -> Option<u64> {
		self.next
	}
	fn set_prev(&mut self, v: Option<u64>) {
		self.prev = v;
	}
	fn set_next(&mut self, v: Option<u64>) {
		self.next = v;
	}
}

/// System-wide cache of mapped file views (spec 4.9): a cap-bounded LRU
/// keyed by `(ccb, offset)`, shared by every `MapViewOfObject` caller so
/// that two mappers of the same range of the same file share one mapping.
pub struct ViewCache {
	cap: usize,
	views: BTreeMap<u64, ViewEntry>,
	lru: IndexList<u64>,
	next_id: u64,
	index: BTreeMap<(CcbId, u64), u64>,
}

impl ViewCache {
	pub fn new(cap: usize) -> Self {
		ViewCache { cap, views: BTreeMap::new(), lru: IndexList::new(), next_id: 1, index: BTreeMap::new() }
	}

	/// Acquires a view of `(ccb, offset)`, creating it if this is the first
	/// consumer. Returns the view's id, which the caller releases with
	/// [`Self::release`] when it unmaps.
	pub fn acquire(&mut self, ccb: CcbId, offset: u64) -> EResult<u64> {
		if let Some(&id) = self.index.get(&(ccb, offset)) {
			self.touch(id);
			self.views.get_mut(&id).unwrap().consumers += 1;
			return Ok(id);
		}
		if self.views.len() >= self.cap && !self.evict_one() {
			return Err(Status::InsufficientSpace);
		}
		let id = self.next_id;
		self.next_id += 1;
		self.index.insert((ccb, offset), id);
		self.views.insert(id, ViewEntry { ccb, offset, consumers: 1, prev: None, next: None });
		self.lru.link_back(id, |i| self.views.get_mut(&i).unwrap());
		Ok(id)
	}

	/// Drops one consumer of `id`. The view stays resident (available for
	/// re-acquisition) until the cache needs the slot back under
	/// eviction pressure.
	pub fn release(&mut self, id: u64) {
		if let Some(entry) = self.views.get_mut(&id) {
			entry.consumers = entry.consumers.saturating_sub(1);
		}
	}

	fn touch(&mut self, id: u64) {
		self.lru.unlink(id, |i| self.views.get_mut(&i).unwrap());
		self.lru.link_back(id, |i| self.views.get_mut(&i).unwrap());
	}

	/// Evicts the least-recently-used view with zero outstanding
	/// consumers. Returns whether a slot was freed.
	fn evict_one(&mut self) -> bool {
		let mut cursor = self.lru.front();
		while let Some(id) = cursor {
			let entry = &self.views[&id];
			if entry.consumers == 0 {
				let (ccb, offset) = (entry.ccb, entry.offset);
				self.lru.unlink(id, |i| self.views.get_mut(&i).unwrap());
				self.views.remove(&id);
				self.index.remove(&(ccb, offset));
				return true;
			}
			cursor = entry.next;
		}
		false
	}

	pub fn len(&self) -> usize {
		self.views.len()
	}
}

/// The global CCB table: one slot per live cache control block, indexed by
/// [`CcbId`]. FCBs reference an id into this table rather than owning a
/// `Ccb` directly, so the PFN database's [`CacheBacking`] can look one up
/// without a pointer back through the FCB.
pub struct CcbTable {
	ccbs: BTreeMap<CcbId, Ccb>,
	next_id: CcbId,
}

impl CcbTable {
	pub const fn new() -> Self {
		CcbTable { ccbs: BTreeMap::new(), next_id: 1 }
	}

	pub fn create(&mut self) -> CcbId {
		let id = self.next_id;
		self.next_id += 1;
		self.ccbs.insert(id, Ccb::new(id));
		id
	}

	pub fn get(&self, id: CcbId) -> Option<&Ccb> {
		self.ccbs.get(&id)
	}

	/// Tears down a CCB, releasing every page it still holds back to the
	/// PFN database.
	pub fn destroy(&mut self, id: CcbId, pfn_db: &mut PfnDatabase) {
		if let Some(ccb) = self.ccbs.remove(&id) {
			for (_, pfn) in ccb.pages.lock().iter() {
				pfn_db.free_physical_page(*pfn, false);
			}
		}
	}
}

pub static CCB_TABLE: IntSpin<CcbTable> = IntSpin::new(CcbTable::new());

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ccb_tracks_pages_and_modified_range() {
		let ccb = Ccb::new(1);
		ccb.insert(0, 10);
		ccb.insert(5, 11);
		assert_eq!(ccb.lookup(0), Some(10));
		ccb.mark_modified(5);
		ccb.mark_modified(2);
		assert_eq!(ccb.take_modified_range(), Some((2, 5)));
		assert_eq!(ccb.take_modified_range(), None);
	}

	#[test]
	fn view_cache_shares_one_slot_for_repeat_acquire() {
		let mut cache = ViewCache::new(4);
		let a = cache.acquire(1, 0).unwrap();
		let b = cache.acquire(1, 0).unwrap();
		assert_eq!(a, b);
		assert_eq!(cache.len(), 1);
	}

	#[test]
	fn view_cache_evicts_lru_once_full_and_unreferenced() {
		let mut cache = ViewCache::new(2);
		let first = cache.acquire(1, 0).unwrap();
		cache.acquire(1, 1).unwrap();
		cache.release(first);
		let third = cache.acquire(1, 2).unwrap();
		assert_eq!(cache.len(), 2);
		assert!(cache.index.get(&(1, 0)).is_none());
		assert!(cache.index.contains_key(&(1, 2)));
		let _ = third;
	}

	#[test]
	fn view_cache_refuses_eviction_while_all_views_are_consumed() {
		let mut cache = ViewCache::new(1);
		cache.acquire(1, 0).unwrap();
		assert_eq!(cache.acquire(1, 1).unwrap_err(), Status::InsufficientSpace);
	}

	#[test]
	fn ccb_table_destroy_frees_pages_back_to_the_pfn_database() {
		let mut table = CcbTable::new();
		let id = table.create();
		let mut pfn_db = PfnDatabase::new(4);
		let pfn = pfn_db.allocate().unwrap();
		table.get(id).unwrap().insert(0, pfn);
		table.destroy(id, &mut pfn_db);
		assert_eq!(pfn_db.free_count(), 4);
	}
}
