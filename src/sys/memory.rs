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

//! `OSAllocateVirtualMemory`/`OSFreeVirtualMemory`/`OSCommitVirtualMemory`/
//! `OSDecommitVirtualMemory` (spec 6), thin wrappers over
//! [`crate::mm::vad::AddressSpace`] and the installed page-table backend.

use crate::hal::page_table::{Protection, VaRange, VirtAddr, PAGE_SIZE};
use crate::ke::process::ProcessId;
use crate::mm::pfn::PFN_DB;
use crate::mm::vad::VadFlags;
use crate::status::{EResult, Status};

/// `MmReserveVirtualMemory`: reserves `pages` pages in `process`'s address
/// space without committing them (spec 4.7).
pub fn allocate_virtual_memory(process: ProcessId, pages: u64, top_down: bool, protection: Protection, committed: bool) -> EResult<VirtAddr> {
	let mut flags = VadFlags::PRIVATE;
	if committed {
		flags |= VadFlags::COMMITTED;
	}
	crate::ke::process::with_process(process, |p| p.address_space.reserve(pages, top_down, protection, flags))
}

/// `MmCommitVirtualMemory`: marks an already-reserved range committed, so
/// the next touch demand-zeroes it rather than access-violating (spec 4.7,
/// 4.8).
pub fn commit_virtual_memory(process: ProcessId, base: VirtAddr) -> EResult<()> {
	crate::ke::process::with_process(process, |p| p.address_space.set_committed(base, true))
}

/// `MmDecommitVirtualMemory`: unmaps every page in the VAD based at `base`
/// through the page-table backend, releasing each `FROM_POOL` page back to
/// the PFN database, then clears the committed flag. The VAD itself stays
/// reserved.
pub fn decommit_virtual_memory(process: ProcessId, base: VirtAddr) -> EResult<()> {
	let pt = crate::hal::page_table::backend().ok_or(Status::InvalidParameter)?;
	let (page_map, pages) = crate::ke::process::with_process(process, |p| {
		let vad = p.address_space.find(base).filter(|v| v.base == base);
		(p.page_map, vad.map(|v| v.pages))
	});
	let pages = pages.ok_or(Status::VaNotAtBase)?;
	let removed = pt.unmap(page_map, VaRange { start: base, pages });
	let mut db_guard = PFN_DB.lock();
	if let Some(db) = db_guard.as_mut() {
		for page in removed {
			if let crate::hal::page_table::PteState::Present { pfn, protection } | crate::hal::page_table::PteState::Transition { pfn, protection } = page.prior {
				if protection.contains(Protection::FROM_POOL) {
					db.free_physical_page(pfn, false);
				}
			}
		}
	}
	drop(db_guard);
	crate::ke::process::with_process(process, |p| p.address_space.set_committed(base, false))
}

/// `MmReleaseVirtualMemory`: decommits (if needed) then drops the VAD
/// bookkeeping entirely, returning the range to the free-range heap's
/// caller-visible view (spec 4.7, `Release`). The underlying bump heap does
/// not reclaim the address range itself (see `FreeRangeHeap`'s doc comment).
pub fn free_virtual_memory(process: ProcessId, base: VirtAddr) -> EResult<()> {
	let _ = decommit_virtual_memory(process, base);
	crate::ke::process::with_process(process, |p| p.address_space.release(base)).map(|_| ())
}

pub const fn pages_for_bytes(bytes: u64) -> u64 {
	(bytes + PAGE_SIZE - 1) / PAGE_SIZE
}
