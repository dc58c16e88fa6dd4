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

//! Page-table primitive (spec section 6 and 4.6).
//!
//! The core never walks architecture-specific page-table formats itself:
//! it reads and writes PTE *states* through this trait, and the platform
//! backend is responsible for encoding/decoding those states into whatever
//! the real paging structures look like (amd64 4/5-level paging, arm64
//! stage-1 tables, ...).
//!
//! Spec 4.6 enumerates exactly the operations here (`GetPteLocation`,
//! `MapAnon`, `MapPhysical`, `Unmap`, `CreatePageMap`/`FreePageMap`) and
//! the sub-states a non-present PTE must be able to encode: decommitted,
//! demand-paged, backed-by-file, swapped (with pagefile index + offset),
//! transition.

use crate::status::EResult;
use bitflags::bitflags;

/// A physical page number (physical address / page size).
pub type Pfn = u64;
/// A virtual address.
pub type VirtAddr = u64;

bitflags! {
	/// Page protection/usage bits. `Cow` and `WasReadWrite` implement the
	/// copy-on-write PTE-bit encoding spec 4.6 calls for ("copy-on-write is
	/// expressed by PTE bits (COW|was-read-write)").
	#[derive(Clone, Copy, Debug, PartialEq, Eq)]
	pub struct Protection: u32 {
		const READ          = 1 << 0;
		const WRITE         = 1 << 1;
		const EXECUTE       = 1 << 2;
		const USER          = 1 << 3;
		const COW           = 1 << 4;
		const WAS_READ_WRITE = 1 << 5;
		/// The backing physical page was allocated from the PMM and must
		/// be released (its PFN refcount dropped) when the PTE is unmapped.
		const FROM_POOL     = 1 << 6;
	}
}

/// Identifies an index into a file's cache control block, used by
/// [`PteState::BackedByFile`].
pub type CacheFileIndex = u64;

/// The logical state of one page-table entry. Present and non-present PTE
/// sub-states are unified into a single enum at this layer; the backend
/// maps them onto whatever bit pattern its hardware format uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PteState {
	/// No PTE has ever been installed here (distinct from `Decommitted`:
	/// a fault here may indicate the VAD lookup should run, rather than a
	/// known-decommitted range).
	NotMapped,
	/// Reserved but explicitly decommitted: touching this address is an
	/// access violation even though a VAD may still cover it.
	Decommitted,
	/// Anonymous, private memory not yet backed by a physical page
	/// (zero-fill on first touch).
	DemandPaged { protection: Protection },
	/// Backed by file content identified by `(ccb, page_index)`; not
	/// currently resident.
	BackedByFile {
		ccb: CacheFileIndex,
		page_index: u64,
		protection: Protection,
	},
	/// Swapped out to the pagefile at `(pagefile_index, offset)` — spec
	/// 4.6: "swapped (with pagefile index + offset in the high bits)".
	/// The pagefile write-back path itself is an open point (spec 9);
	/// only the encoding is implemented here.
	Swapped { pagefile_index: u32, offset: u32 },
	/// On the standby or modified list: physically resident but not
	/// currently mapped by any live PTE; a fault here promotes it back to
	/// `Present` (spec 4.8, "Transition bit set").
	Transition { pfn: Pfn, protection: Protection },
	/// Resident and mapped.
	Present { pfn: Pfn, protection: Protection },
}

impl PteState {
	pub fn is_present(&self) -> bool {
		matches!(self, PteState::Present { .. })
	}

	pub fn protection(&self) -> Option<Protection> {
		match *self {
			PteState::DemandPaged { protection }
			| PteState::BackedByFile { protection, .. }
			| PteState::Transition { protection, .. }
			| PteState::Present { protection, .. } => Some(protection),
			_ => None,
		}
	}
}

/// Opaque handle to one process's (or the kernel's) root page map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageMapId(pub u64);

/// A half-open virtual address range, `[start, start + pages * PAGE_SIZE)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VaRange {
	pub start: VirtAddr,
	pub pages: u64,
}

/// Page size in bytes, fixed for the lifetime of the executive (a
/// multi-page-size TLB is an arch-specific optimization, out of scope).
pub const PAGE_SIZE: u64 = 4096;

/// Per-PTE outcome of an [`PageTableOps::unmap`] call, used by the caller
/// to release PFN references for pages that came `FROM_POOL`.
pub struct UnmappedPage {
	pub va: VirtAddr,
	pub prior: PteState,
}

pub trait PageTableOps: Send + Sync {
	/// Creates a new page map. The kernel half is always shared (spec 4.6:
	/// "Kernel half is shared across all page maps"); `parent` is `None`
	/// for the very first (kernel) map and `Some` for every process map
	/// cloned from it afterward.
	fn create_page_map(&self, parent: Option<PageMapId>) -> EResult<PageMapId>;

	/// Frees a page map. The kernel half is never torn down by this call.
	fn free_page_map(&self, map: PageMapId);

	/// Reads the current PTE state at `va` within `map`.
	fn get_pte(&self, map: PageMapId, va: VirtAddr) -> PteState;

	/// Writes a new PTE state at `va`, allocating intermediate paging
	/// structures as needed (`create` in spec 4.6's `GetPteLocation`).
	fn set_pte(&self, map: PageMapId, va: VirtAddr, state: PteState) -> EResult<()>;

	/// Maps an anonymous (non-file-backed) physical page.
	fn map_anon(&self, map: PageMapId, va: VirtAddr, pfn: Pfn, protection: Protection) -> EResult<()> {
		self.set_pte(map, va, PteState::Present { pfn, protection })
	}

	/// Maps a physical page directly (MMIO, or a page already owned by a
	/// cache/MDL).
	fn map_physical(&self, map: PageMapId, va: VirtAddr, pfn: Pfn, protection: Protection) -> EResult<()> {
		self.set_pte(map, va, PteState::Present { pfn, protection })
	}

	/// Unmaps `range`, always issuing a TLB shootdown covering it (spec
	/// 4.6: "Unmap always issues a TLB shootdown covering the range").
	/// Returns the prior state of every page that had been mapped, so the
	/// caller can release PFN references for pages marked `FROM_POOL`.
	fn unmap(&self, map: PageMapId, range: VaRange) -> alloc::vec::Vec<UnmappedPage>;

	/// Invalidates the TLB entries covering `range` on every CPU.
	fn shootdown(&self, map: PageMapId, range: VaRange);
}

use core::sync::atomic::{AtomicUsize, Ordering};

/// The installed [`PageTableOps`] backend, stored the same way
/// [`super::cpu::install`] stores a [`super::cpu::CurrentCpu`]. Unlike
/// `cpu`'s, there is no sane uniprocessor default: every caller that needs
/// "the" live page map (the `sys::` system-call layer, `start_up`) goes
/// through [`backend`], while isolated unit tests keep constructing and
/// threading their own [`crate::hal::sim::SimPageTable`] instead.
static BACKEND: AtomicUsize = AtomicUsize::new(0);

/// Installs the platform's page-table backend. Must be called at most
/// once, during `start_up`, before any fault can occur.
pub fn install(backend: &'static dyn PageTableOps) {
	BACKEND.store(backend as *const dyn PageTableOps as *const () as usize, Ordering::Release);
}

/// Returns the installed backend, or `None` before `start_up` has run.
pub fn backend() -> Option<&'static dyn PageTableOps> {
	let raw = BACKEND.load(Ordering::Acquire);
	if raw == 0 {
		None
	} else {
		// SAFETY: the only value ever stored is a `'static` reference cast
		// through `install`.
		Some(unsafe { &*(raw as *const dyn PageTableOps) })
	}
}
