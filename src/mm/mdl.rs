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

//! Memory descriptor lists (spec 3, 4.9): a pinned array of PFNs describing
//! a buffer so I/O can run against it without caring whose address space
//! the bytes originally came from.

use super::fault::{probe_address, AccessMode, FaultContext};
use super::pfn::PfnDatabase;
use super::vad::{AddressSpace, VadFlags};
use crate::hal::page_table::{PageTableOps, PteState, Protection, VaRange, VirtAddr, PAGE_SIZE};
use crate::ke::process::ProcessId;
use crate::status::{EResult, SResult, Status};
use alloc::vec::Vec;

bitflags::bitflags! {
	/// Spec 3: "state flags (from-pool | captured | mapped | write)".
	#[derive(Clone, Copy, Debug, PartialEq, Eq)]
	pub struct MdlFlags: u32 {
		/// The `Mdl` struct itself (not its PFN array) came from pool memory
		/// rather than being embedded in the caller's own allocation.
		const FROM_POOL = 1 << 0;
		/// The PFN array has been filled in by [`build_mdl`]; an `Mdl`
		/// returned by a constructor that hasn't captured pages yet (e.g. one
		/// sized but not yet probed) does not have this set.
		const CAPTURED  = 1 << 1;
		/// [`map_into_system_space`] has produced a kernel-space mapping.
		const MAPPED    = 1 << 2;
		/// The buffer was probed for write access.
		const WRITE     = 1 << 3;
	}
}

/// A pinned description of `[source_va, source_va + byte_count)` in
/// `process`'s address space, expressed as the concrete PFNs backing it
/// plus the byte offset into the first page (spec 3: "source VA, first-page
/// byte offset, byte count, process owner").
pub struct Mdl {
	pub source_va: VirtAddr,
	pub byte_offset: u32,
	pub byte_count: u32,
	pub process: ProcessId,
	pub flags: MdlFlags,
	pub pfns: Vec<u64>,
	pub mapped_va: Option<VirtAddr>,
}

impl Mdl {
	pub fn page_count(&self) -> usize {
		self.pfns.len()
	}
}

/// Probes `[va, va + byte_count)` resident and captures the PFNs backing it
/// into a new [`Mdl`] (spec 4.9: MDL construction pins pages so I/O can run
/// against them without racing page reclaim).
pub fn build_mdl(ctx: &FaultContext, process: ProcessId, va: VirtAddr, byte_count: u32, write: bool, is_user: bool) -> EResult<Mdl> {
	if byte_count == 0 {
		return Err(Status::InvalidParameter);
	}
	probe_address(ctx, va, byte_count as u64, write, is_user)?;

	let byte_offset = (va % PAGE_SIZE) as u32;
	let first_page = va - byte_offset as u64;
	let last_page = (va + byte_count as u64 - 1) & !(PAGE_SIZE - 1);
	let page_count = ((last_page - first_page) / PAGE_SIZE + 1) as usize;

	let mut pfns = Vec::with_capacity(page_count);
	let mut db = ctx.pfn_db.lock();
	let db = db.as_mut().ok_or(Status::InsufficientMemory)?;
	for i in 0..page_count as u64 {
		let page_va = first_page + i * PAGE_SIZE;
		let pfn = match ctx.pt.get_pte(ctx.space.page_map, page_va) {
			PteState::Present { pfn, .. } => pfn,
			_ => {
				// `probe_address` just resolved every page in range; a
				// non-present PTE here means something raced the probe and
				// reclaimed it (e.g. a concurrent decommit).
				for already in &pfns {
					db.free_physical_page(*already, false);
				}
				return Err(Status::AccessViolation);
			}
		};
		db.add_reference(pfn);
		pfns.push(pfn);
	}
	drop(db);

	let mut flags = MdlFlags::CAPTURED;
	if write {
		flags |= MdlFlags::WRITE;
	}
	Ok(Mdl { source_va: va, byte_offset, byte_count, process, flags, pfns, mapped_va: None })
}

/// Maps an already-built MDL's pages into `system_space`, e.g. so a driver
/// can touch a user buffer without switching address spaces.
pub fn map_into_system_space(mdl: &mut Mdl, system_space: &AddressSpace, pt: &dyn PageTableOps) -> SResult {
	if mdl.flags.contains(MdlFlags::MAPPED) {
		return Ok(());
	}
	let protection = if mdl.flags.contains(MdlFlags::WRITE) {
		Protection::READ | Protection::WRITE
	} else {
		Protection::READ
	};
	let base = system_space.reserve(mdl.pfns.len() as u64, false, protection, VadFlags::NON_PAGED)?;
	for (i, pfn) in mdl.pfns.iter().enumerate() {
		pt.map_physical(system_space.page_map, base + i as u64 * PAGE_SIZE, *pfn, protection)?;
	}
	mdl.mapped_va = Some(base);
	mdl.flags |= MdlFlags::MAPPED;
	Ok(())
}

/// Releases an MDL: tears down its system-space mapping if any, then drops
/// the pinning reference on every captured page.
pub fn release_mdl(mdl: Mdl, system_space: Option<&AddressSpace>, pt: &dyn PageTableOps, pfn_db: &crate::sync::spin::IntSpin<Option<PfnDatabase>>) {
	if let (Some(mapped_va), Some(space)) = (mdl.mapped_va, system_space) {
		pt.unmap(space.page_map, VaRange { start: mapped_va, pages: mdl.pfns.len() as u64 });
		let _ = space.release(mapped_va);
	}
	let mut db = pfn_db.lock();
	if let Some(db) = db.as_mut() {
		for pfn in &mdl.pfns {
			db.free_physical_page(*pfn, mdl.flags.contains(MdlFlags::WRITE));
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::hal::sim::SimPageTable;
	use crate::mm::vad::VadFlags as Vf;
	use crate::sync::spin::IntSpin;

	fn harness() -> (AddressSpace, SimPageTable, IntSpin<Option<PfnDatabase>>) {
		let pt = SimPageTable::new();
		let map = pt.create_page_map(None).unwrap();
		let space = AddressSpace::new(map, 0x1000, 0x10_0000);
		let pfn_db = IntSpin::new(Some(PfnDatabase::new(64)));
		(space, pt, pfn_db)
	}

	#[test]
	fn build_mdl_spans_partial_pages_on_both_ends() {
		let (space, pt, pfn_db) = harness();
		let base = space.reserve(2, false, Protection::READ | Protection::WRITE, Vf::COMMITTED | Vf::PRIVATE).unwrap();
		let ctx = FaultContext { space: &space, pt: &pt, pfn_db: &pfn_db };
		let va = base + 100;
		let mdl = build_mdl(&ctx, ProcessId(1), va, PAGE_SIZE as u32, false, false).unwrap();
		assert_eq!(mdl.byte_offset, 100);
		assert_eq!(mdl.page_count(), 2);
	}

	#[test]
	fn build_mdl_pins_pages_with_extra_references() {
		let (space, pt, pfn_db) = harness();
		let base = space.reserve(1, false, Protection::READ, Vf::COMMITTED | Vf::PRIVATE).unwrap();
		let ctx = FaultContext { space: &space, pt: &pt, pfn_db: &pfn_db };
		let mdl = build_mdl(&ctx, ProcessId(1), base, 16, false, false).unwrap();
		let pfn = mdl.pfns[0];
		assert_eq!(pfn_db.lock().as_ref().unwrap().refcount(pfn), 2);
		release_mdl(mdl, None, &pt, &pfn_db);
		assert_eq!(pfn_db.lock().as_ref().unwrap().refcount(pfn), 1);
	}

	#[test]
	fn map_into_system_space_installs_present_ptes() {
		let (space, pt, pfn_db) = harness();
		let base = space.reserve(1, false, Protection::READ | Protection::WRITE, Vf::COMMITTED | Vf::PRIVATE).unwrap();
		let ctx = FaultContext { space: &space, pt: &pt, pfn_db: &pfn_db };
		let mut mdl = build_mdl(&ctx, ProcessId(1), base, 16, true, false).unwrap();

		let sys_map = pt.create_page_map(None).unwrap();
		let sys_space = AddressSpace::new(sys_map, 0x1000, 0x10_0000);
		map_into_system_space(&mut mdl, &sys_space, &pt).unwrap();
		let mapped_va = mdl.mapped_va.unwrap();
		assert!(pt.get_pte(sys_map, mapped_va).is_present());
	}

	#[test]
	fn build_mdl_rejects_zero_length() {
		let (space, pt, pfn_db) = harness();
		let ctx = FaultContext { space: &space, pt: &pt, pfn_db: &pfn_db };
		assert_eq!(build_mdl(&ctx, ProcessId(1), 0x1000, 0, false, false).unwrap_err(), Status::InvalidParameter);
	}
}
