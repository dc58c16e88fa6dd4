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

//! Memory manager: physical-page allocator and PFN database, VADs and
//! pool, the page-fault handler, and MDLs/view cache (spec 4.5-4.9, table
//! row "Memory (Mm)").

pub mod cache;
pub mod fault;
pub mod mdl;
pub mod pfn;
pub mod pool;
pub mod vad;

pub use fault::{handle_page_fault, AccessMode, FaultReason};
pub use pfn::PfnDatabase;
pub use vad::{AddressSpace, Vad};

/// Brings up the memory manager once the physical memory map is known:
/// populates the global PFN database with `page_count` physical pages, all
/// initially free. Called once from `start_up`, after the platform hook
/// has reported how much physical memory exists (spec 1: "physical memory
/// layout... supplied by platform-specific bring-up code").
pub fn init(page_count: u64) {
	*pfn::PFN_DB.lock() = Some(pfn::PfnDatabase::new(page_count));
}
