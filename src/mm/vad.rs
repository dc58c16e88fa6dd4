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

//! Virtual address descriptors and the per-process/kernel address space
//! (spec 4.7).

use crate::hal::page_table::{PageMapId, Protection, VaRange, VirtAddr, PAGE_SIZE};
use crate::rtl::rank_tree::RankTree;
use crate::status::{EResult, Status};
use crate::sync::rwlock::RwLock;
use alloc::vec::Vec;

bitflags::bitflags! {
	#[derive(Clone, Copy, Debug, PartialEq, Eq)]
	pub struct VadFlags: u32 {
		const COMMITTED = 1 << 0;
		const PRIVATE   = 1 << 1;
		const COW       = 1 << 2;
		const NON_PAGED = 1 << 3;
	}
}

/// One reserved virtual address range and the flags governing it (spec
/// 4.7: "inserts a VAD with committed/private/cow/protection flags").
#[derive(Clone, Debug)]
pub struct Vad {
	pub base: VirtAddr,
	pub pages: u64,
	pub protection: Protection,
	pub flags: VadFlags,
}

impl Vad {
	pub fn end(&self) -> VirtAddr {
		self.base + self.pages * PAGE_SIZE
	}

	pub fn contains(&self, va: VirtAddr) -> bool {
		va >= self.base && va < self.end()
	}
}

/// A simple top-down/bottom-up free-range allocator over one address
/// space's usable span, used to find a base for [`AddressSpace::reserve`]
/// before a VAD is inserted (spec 4.7: "asks the per-process heap (a
/// free-range allocator) for a range").
///
/// Space never touched by a reservation lives beyond `bump_low`/`bump_high`;
/// space that was reserved and then released is tracked in `free_list`
/// (sorted, coalesced `[start, end)` ranges) so that
/// `Reserve → Release → Reserve` reuses it rather than leaking address
/// space (spec 8: "the heap free-map covers the complement").
struct FreeRangeHeap {
	low: VirtAddr,
	high: VirtAddr,
	bump_low: VirtAddr,
	bump_high: VirtAddr,
	free_list: Vec<(VirtAddr, VirtAddr)>,
}

impl FreeRangeHeap {
	fn new(low: VirtAddr, high: VirtAddr) -> Self {
		FreeRangeHeap { low, high, bump_low: low, bump_high: high, free_list: Vec::new() }
	}

	/// Finds `pages` worth of space, disjoint from every `existing` VAD,
	/// growing from the bottom or the top of the span depending on
	/// `top_down`. Checks `free_list` first (first-fit, searched from the
	/// end that matches `top_down` so released space near the requested
	/// side is preferred) and only grows into untouched space once no
	/// freed range is large enough.
	fn find_range(&mut self, pages: u64, top_down: bool, existing: &RankTree<VirtAddr, Vad>) -> EResult<VirtAddr> {
		let span = pages * PAGE_SIZE;
		if let Some(base) = self.take_from_free_list(span, top_down) {
			debug_assert!(!overlaps_any(base, pages, existing));
			return Ok(base);
		}
		if top_down {
			let mut candidate = self.bump_high.checked_sub(span).ok_or(Status::InsufficientVaSpace)?;
			while overlaps_any(candidate, pages, existing) {
				candidate = candidate.checked_sub(PAGE_SIZE).ok_or(Status::InsufficientVaSpace)?;
			}
			if candidate < self.low {
				return Err(Status::InsufficientVaSpace);
			}
			self.bump_high = candidate;
			Ok(candidate)
		} else {
			let mut candidate = self.bump_low;
			while overlaps_any(candidate, pages, existing) {
				candidate = candidate.checked_add(PAGE_SIZE).ok_or(Status::InsufficientVaSpace)?;
			}
			if candidate.checked_add(span).map_or(true, |end| end > self.high) {
				return Err(Status::InsufficientVaSpace);
			}
			self.bump_low = candidate + span;
			Ok(candidate)
		}
	}

	/// First-fit search of `free_list` for a range of at least `span` bytes,
	/// splitting off the unused remainder back into the list.
	fn take_from_free_list(&mut self, span: u64, top_down: bool) -> Option<VirtAddr> {
		let len = self.free_list.len();
		let mut found = None;
		for step in 0..len {
			let i = if top_down { len - 1 - step } else { step };
			let (start, end) = self.free_list[i];
			if end - start >= span {
				found = Some(i);
				break;
			}
		}
		let i = found?;
		let (start, end) = self.free_list[i];
		let (base, remainder) = if top_down {
			let base = end - span;
			(base, if base > start { Some((start, base)) } else { None })
		} else {
			let base = start;
			(base, if start + span < end { Some((start + span, end)) } else { None })
		};
		match remainder {
			Some(r) => self.free_list[i] = r,
			None => {
				self.free_list.remove(i);
			}
		}
		Some(base)
	}

	/// Returns `[base, base + pages*PAGE_SIZE)` to the heap: rewinds the
	/// matching bump pointer directly when the range abuts it, otherwise
	/// inserts (and coalesces with neighbours) into `free_list`.
	fn free_range(&mut self, base: VirtAddr, pages: u64) {
		let span = pages * PAGE_SIZE;
		let mut start = base;
		let mut end = base + span;
		if end == self.bump_low {
			self.bump_low = start;
			return;
		}
		if start == self.bump_high {
			self.bump_high = end;
			return;
		}
		self.free_list.retain(|&(s, e)| {
			if e == start {
				start = s;
				false
			} else if s == end {
				end = e;
				false
			} else {
				true
			}
		});
		let idx = self.free_list.partition_point(|&(s, _)| s < start);
		self.free_list.insert(idx, (start, end));
	}
}

fn overlaps_any(base: VirtAddr, pages: u64, existing: &RankTree<VirtAddr, Vad>) -> bool {
	let end = base + pages * PAGE_SIZE;
	existing.iter().any(|(_, vad)| vad.base < end && base < vad.end())
}

/// One address space: either the shared kernel half or one process's
/// private half, each guarded by its own rw-lock (spec section 5 table).
pub struct AddressSpace {
	pub page_map: PageMapId,
	vads: RwLock<RankTree<VirtAddr, Vad>>,
	heap: RwLock<FreeRangeHeap>,
}

impl AddressSpace {
	pub fn new(page_map: PageMapId, low: VirtAddr, high: VirtAddr) -> Self {
		AddressSpace {
			page_map,
			vads: RwLock::new(RankTree::new()),
			heap: RwLock::new(FreeRangeHeap::new(low, high)),
		}
	}

	/// Reserves `pages` pages of address space (spec 4.7, `ReserveVirtualMemory`).
	pub fn reserve(&self, pages: u64, top_down: bool, protection: Protection, flags: VadFlags) -> EResult<VirtAddr> {
		let mut vads = self.vads.write();
		let base = self.heap.write().find_range(pages, top_down, &vads)?;
		vads.insert(base, Vad { base, pages, protection, flags });
		Ok(base)
	}

	/// Releases the VAD based at `base` (spec 4.7, `Release`): the caller
	/// is responsible for having already unmapped its PTEs through the
	/// page-table primitive. Removes the bookkeeping VAD *and* returns its
	/// range to the heap, so a later `reserve` can reuse the space (spec 8
	/// invariant #3, "the heap free-map covers the complement").
	pub fn release(&self, base: VirtAddr) -> EResult<Vad> {
		let vad = self.vads.write().remove(&base).ok_or(Status::VaNotAtBase)?;
		self.heap.write().free_range(vad.base, vad.pages);
		Ok(vad)
	}

	/// Finds the VAD (if any) covering `va`.
	pub fn find(&self, va: VirtAddr) -> Option<Vad> {
		let vads = self.vads.read();
		let (_, vad) = vads.floor(&va)?;
		if vad.contains(va) {
			Some(vad.clone())
		} else {
			None
		}
	}

	/// Toggles the committed flag on the VAD covering `base` exactly
	/// (spec 4.7: "Commit / decommit only toggle a flag on the VAD...").
	pub fn set_committed(&self, base: VirtAddr, committed: bool) -> EResult<()> {
		let mut vads = self.vads.write();
		let vad = vads.get_mut(&base).ok_or(Status::VaNotAtBase)?;
		vad.flags.set(VadFlags::COMMITTED, committed);
		Ok(())
	}

	pub fn vad_count(&self) -> usize {
		self.vads.read().len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::hal::page_table::PageMapId;

	fn space() -> AddressSpace {
		AddressSpace::new(PageMapId(1), 0x1000, 0x1_0000)
	}

	#[test]
	fn reserve_then_release_frees_the_vad() {
		let space = space();
		let base = space.reserve(4, false, Protection::READ, VadFlags::PRIVATE).unwrap();
		assert!(space.find(base).is_some());
		assert!(space.find(base + PAGE_SIZE).is_some());
		space.release(base).unwrap();
		assert!(space.find(base).is_none());
	}

	#[test]
	fn reserve_after_release_reuses_the_space() {
		let space = space();
		let first = space.reserve(4, false, Protection::READ, VadFlags::PRIVATE).unwrap();
		space.release(first).unwrap();
		let second = space.reserve(4, false, Protection::READ, VadFlags::PRIVATE).unwrap();
		assert_eq!(first, second, "released range must be reused, not leaked");
		assert!(space.find(second).is_some());
	}

	#[test]
	fn release_of_unknown_base_fails() {
		let space = space();
		assert_eq!(space.release(0x5000).unwrap_err(), Status::VaNotAtBase);
	}

	#[test]
	fn reservations_do_not_overlap() {
		let space = space();
		let a = space.reserve(2, false, Protection::READ, VadFlags::PRIVATE).unwrap();
		let b = space.reserve(2, false, Protection::READ, VadFlags::PRIVATE).unwrap();
		assert!(a + 2 * PAGE_SIZE <= b || b + 2 * PAGE_SIZE <= a);
	}

	#[test]
	fn top_down_reservation_lands_near_the_high_end() {
		let space = space();
		let base = space.reserve(1, true, Protection::READ, VadFlags::PRIVATE).unwrap();
		assert!(base >= 0x1000);
		assert!(base < 0x1_0000);
	}
}
