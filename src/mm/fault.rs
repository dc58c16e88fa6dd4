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

//! Page fault handler (spec 4.8).
//!
//! Entry conditions carry a faulting VA, an access mode, and whether the
//! fault happened in user mode. The handler is IPL-gated (paging is only
//! allowed below APC), looks up the owning VAD, then branches on the
//! PTE's current state exactly as spec 4.8 enumerates.

use super::pfn::PfnDatabase;
use super::vad::{AddressSpace, VadFlags};
use crate::hal::page_table::{PageTableOps, PteState, Protection, VirtAddr, PAGE_SIZE};
use crate::status::{EResult, SResult, Status};
use crate::sync::ipl::{self, Ipl};
use crate::sync::spin::IntSpin;

/// The kind of access that triggered the fault (spec 4.8: "faulting PC,
/// faulting VA, and access mode").
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AccessMode {
	Read,
	Write,
	Execute,
}

/// Outcome of a resolved fault. `MoreProcessingRequired` means the handler
/// kicked off a disk read through the owning FCB and the caller must wait
/// on the event the I/O posts before retrying the faulting instruction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FaultReason {
	Resolved,
	MoreProcessingRequired,
}

/// Everything [`handle_page_fault`] needs reach into: the address space
/// the fault occurred in, the page-table backend, and the PFN database.
/// Bundled into one struct since every branch of the handler touches at
/// least two of the three.
pub struct FaultContext<'a> {
	pub space: &'a AddressSpace,
	pub pt: &'a dyn PageTableOps,
	pub pfn_db: &'a IntSpin<Option<PfnDatabase>>,
}

fn access_allowed(access: AccessMode, protection: Protection, is_user: bool) -> bool {
	if is_user && !protection.contains(Protection::USER) {
		return false;
	}
	match access {
		AccessMode::Read => protection.contains(Protection::READ),
		AccessMode::Write => protection.contains(Protection::WRITE) || protection.contains(Protection::COW),
		AccessMode::Execute => protection.contains(Protection::EXECUTE),
	}
}

/// Resolves one page fault (spec 4.8, steps 1-4).
pub fn handle_page_fault(ctx: &FaultContext, faulting_va: VirtAddr, access: AccessMode, is_user: bool) -> EResult<FaultReason> {
	if ipl::current_ipl() >= Ipl::APC {
		return Err(Status::Refault);
	}

	let page_va = faulting_va & !(PAGE_SIZE - 1);
	let Some(vad) = ctx.space.find(page_va) else {
		return Err(Status::AccessViolation);
	};

	match ctx.pt.get_pte(ctx.space.page_map, page_va) {
		PteState::Present { pfn, protection } => {
			if !access_allowed(access, protection, is_user) {
				return Err(Status::AccessViolation);
			}
			if access == AccessMode::Write && protection.contains(Protection::COW) {
				copy_on_write(ctx, page_va, pfn, protection)?;
			}
			Ok(FaultReason::Resolved)
		}

		PteState::Transition { pfn, protection } => {
			if !access_allowed(access, protection, is_user) {
				return Err(Status::AccessViolation);
			}
			let mut db = ctx.pfn_db.lock();
			let db = db.as_mut().ok_or(Status::InsufficientMemory)?;
			db.reclaim_from_transition(pfn);
			drop(db);
			ctx.pt.map_physical(ctx.space.page_map, page_va, pfn, protection)?;
			Ok(FaultReason::Resolved)
		}

		PteState::Decommitted => Err(Status::AccessViolation),

		PteState::NotMapped => {
			if !vad.flags.contains(VadFlags::COMMITTED) {
				return Err(Status::AccessViolation);
			}
			demand_zero(ctx, page_va, vad.protection)?;
			Ok(FaultReason::Resolved)
		}

		PteState::DemandPaged { protection } => {
			if !access_allowed(access, protection, is_user) {
				return Err(Status::AccessViolation);
			}
			demand_zero(ctx, page_va, protection)?;
			Ok(FaultReason::Resolved)
		}

		PteState::BackedByFile { protection, .. } => {
			if !access_allowed(access, protection, is_user) {
				return Err(Status::AccessViolation);
			}
			// The CCB lookup and, if necessary, the disk read that backs a
			// file-mapped page are the I/O subsystem's job (spec 4.10); the
			// handler only reports that the caller must wait on the event
			// the read posts before retrying.
			Ok(FaultReason::MoreProcessingRequired)
		}

		PteState::Swapped { .. } => {
			// Pagefile write-back is an open point (spec 9); the PTE
			// encoding is honored but there is nothing to read from yet.
			Err(Status::Unimplemented)
		}
	}
}

fn demand_zero(ctx: &FaultContext, page_va: VirtAddr, protection: Protection) -> SResult {
	let mut db = ctx.pfn_db.lock();
	let db = db.as_mut().ok_or(Status::InsufficientMemory)?;
	let pfn = db.allocate().ok_or(Status::InsufficientMemory)?;
	drop(db);
	ctx.pt.map_anon(ctx.space.page_map, page_va, pfn, protection | Protection::FROM_POOL)
}

/// Duplicates a copy-on-write page on the first write fault against it
/// (spec 4.6: "copy-on-write is expressed by PTE bits (COW|was-read-write)").
fn copy_on_write(ctx: &FaultContext, page_va: VirtAddr, old_pfn: u64, protection: Protection) -> SResult {
	let mut db = ctx.pfn_db.lock();
	let db = db.as_mut().ok_or(Status::InsufficientMemory)?;
	let new_pfn = db.allocate().ok_or(Status::InsufficientMemory)?;
	db.free_physical_page(old_pfn, false);
	drop(db);
	let new_protection = (protection - Protection::COW) | Protection::WAS_READ_WRITE | Protection::FROM_POOL;
	ctx.pt.map_anon(ctx.space.page_map, page_va, new_pfn, new_protection)
}

/// `MmProbeAddress` (spec 4.8): walks `[va, va+length)`, forcing each page
/// resident via a controlled fault, one per page. The canonical way the
/// system-service layer validates a user buffer before touching it.
pub fn probe_address(ctx: &FaultContext, va: VirtAddr, length: u64, write: bool, is_user: bool) -> SResult {
	if length == 0 {
		return Ok(());
	}
	let access = if write { AccessMode::Write } else { AccessMode::Read };
	let first_page = va & !(PAGE_SIZE - 1);
	let last_page = (va + length - 1) & !(PAGE_SIZE - 1);

	let mut page = first_page;
	loop {
		match handle_page_fault(ctx, page, access, is_user) {
			Ok(_) => {}
			Err(e) if e.is_restart_signal() => return Err(Status::Fault),
			Err(e) => return Err(e),
		}
		if page == last_page {
			break;
		}
		page += PAGE_SIZE;
	}
	Ok(())
}

/// Re-expression of `MmSafeCopy`/`MmProbeAddress`'s setjmp-like trampoline
/// (spec section 9) as a scope: probes the range up front, then runs `f`,
/// so a caller never needs to handle a fault mid-copy itself.
pub fn with_probe<R>(ctx: &FaultContext, va: VirtAddr, length: u64, write: bool, is_user: bool, f: impl FnOnce() -> R) -> EResult<R> {
	probe_address(ctx, va, length, write, is_user)?;
	Ok(f())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::hal::sim::SimPageTable;
	use crate::mm::vad::VadFlags;

	fn harness() -> (AddressSpace, SimPageTable, IntSpin<Option<PfnDatabase>>) {
		let pt = SimPageTable::new();
		let map = pt.create_page_map(None).unwrap();
		let space = AddressSpace::new(map, 0x1000, 0x10_0000);
		let pfn_db = IntSpin::new(Some(PfnDatabase::new(64)));
		(space, pt, pfn_db)
	}

	#[test]
	fn demand_zero_fault_resolves_and_consumes_a_frame() {
		let (space, pt, pfn_db) = harness();
		let base = space
			.reserve(1, false, Protection::READ | Protection::WRITE, VadFlags::COMMITTED | VadFlags::PRIVATE)
			.unwrap();
		let ctx = FaultContext { space: &space, pt: &pt, pfn_db: &pfn_db };
		let reason = handle_page_fault(&ctx, base, AccessMode::Write, false).unwrap();
		assert_eq!(reason, FaultReason::Resolved);
		assert!(pt.get_pte(space.page_map, base).is_present());
		assert_eq!(pfn_db.lock().as_ref().unwrap().free_count(), 63);
	}

	#[test]
	fn fault_outside_any_vad_is_access_violation() {
		let (space, pt, pfn_db) = harness();
		let ctx = FaultContext { space: &space, pt: &pt, pfn_db: &pfn_db };
		assert_eq!(handle_page_fault(&ctx, 0x9000, AccessMode::Read, false).unwrap_err(), Status::AccessViolation);
	}

	#[test]
	fn decommitted_range_is_never_demand_zeroed() {
		let (space, pt, pfn_db) = harness();
		let base = space.reserve(1, false, Protection::READ, VadFlags::PRIVATE).unwrap();
		let ctx = FaultContext { space: &space, pt: &pt, pfn_db: &pfn_db };
		assert_eq!(handle_page_fault(&ctx, base, AccessMode::Read, false).unwrap_err(), Status::AccessViolation);
	}

	#[test]
	fn cow_write_duplicates_the_frame() {
		let (space, pt, pfn_db) = harness();
		let base = space
			.reserve(1, false, Protection::READ | Protection::WRITE, VadFlags::COMMITTED | VadFlags::COW)
			.unwrap();
		pt.map_anon(space.page_map, base, 9, Protection::READ | Protection::COW).unwrap();
		let ctx = FaultContext { space: &space, pt: &pt, pfn_db: &pfn_db };
		handle_page_fault(&ctx, base, AccessMode::Write, false).unwrap();
		let PteState::Present { pfn, protection } = pt.get_pte(space.page_map, base) else {
			panic!("expected a present PTE after CoW resolution")
		};
		assert_ne!(pfn, 9);
		assert!(!protection.contains(Protection::COW));
		assert!(protection.contains(Protection::WAS_READ_WRITE));
	}

	#[test]
	fn probe_address_spans_multiple_pages() {
		let (space, pt, pfn_db) = harness();
		let base = space
			.reserve(3, false, Protection::READ | Protection::WRITE, VadFlags::COMMITTED | VadFlags::PRIVATE)
			.unwrap();
		let ctx = FaultContext { space: &space, pt: &pt, pfn_db: &pfn_db };
		probe_address(&ctx, base, 3 * PAGE_SIZE, true, false).unwrap();
		for i in 0..3 {
			assert!(pt.get_pte(space.page_map, base + i * PAGE_SIZE).is_present());
		}
	}

	#[test]
	fn ipl_at_or_above_apc_refaults() {
		let (space, pt, pfn_db) = harness();
		let base = space
			.reserve(1, false, Protection::READ, VadFlags::COMMITTED | VadFlags::PRIVATE)
			.unwrap();
		let ctx = FaultContext { space: &space, pt: &pt, pfn_db: &pfn_db };
		let old = ipl::raise_ipl(Ipl::APC);
		let result = handle_page_fault(&ctx, base, AccessMode::Read, false);
		ipl::lower_ipl(old);
		assert_eq!(result.unwrap_err(), Status::Refault);
	}
}
