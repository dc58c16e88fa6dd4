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

//! Boron: a Windows-NT-shaped kernel executive — virtual memory manager,
//! scheduler/dispatcher, object manager, and I/O FCB layer — built as a
//! library so it can be linked into a freestanding kernel image or
//! exercised directly by the hosted test harness (`cargo test`).
//!
//! [`start_up`] is the single entry point that sequences every subsystem's
//! own `init`: a platform bring-up routine (the freestanding `bin.rs`, or a
//! test) supplies the platform hook implementations and the physical page
//! count, and everything downstream of that reaches global state through
//! `hal::*::backend()`/`ke`/`mm`/`ob`/`io`/`sys` rather than threading
//! parameters through every call site (spec 9: "global state initialized
//! once in `start_up`").

#![cfg_attr(not(test), no_std)]
#![allow(clippy::missing_safety_doc)]

extern crate alloc;

pub mod config;
pub mod hal;
pub mod io;
pub mod ke;
pub mod logger;
pub mod mm;
pub mod ob;
pub mod panic;
pub mod rtl;
pub mod status;
pub mod sync;
pub mod sys;

#[cfg(any(test, feature = "selftest"))]
pub mod selftest;

/// The freestanding kernel image's global heap, backing `alloc::`'s
/// allocations once `start_up` has wired up the rest of the executive. The
/// hosted test harness links against the host's own allocator instead, so
/// this only exists outside `cfg(test)`.
#[cfg(not(test))]
pub mod heap {
	use linked_list_allocator::LockedHeap;

	#[global_allocator]
	static ALLOCATOR: LockedHeap = LockedHeap::empty();

	/// Hands the global allocator a backing region, `[start, start + size)`.
	/// Must be called exactly once, before any other code in this crate
	/// allocates, from the platform's earliest bring-up code — before
	/// [`super::start_up`] runs, since `start_up` itself allocates (the
	/// scheduler's per-CPU ready queues, the object manager's root
	/// directory, ...).
	///
	/// # Safety
	/// `start` must point to `size` bytes of memory not otherwise in use
	/// and valid for the remainder of the kernel's lifetime.
	pub unsafe fn init(start: *mut u8, size: usize) {
		ALLOCATOR.lock().init(start, size);
	}
}

/// Brings up every subsystem, in the dependency order spec 2's layering
/// requires (`Mm` before anything that allocates through a VAD, `Ke` before
/// `Ob` since handle tables are keyed by process, `Ob` before `Io` since
/// FCBs are objects). Called exactly once, by the platform's earliest
/// bring-up code, after [`heap::init`] (outside tests) and before any
/// thread other than the calling one runs.
///
/// `physical_page_count` is the number of physical pages platform-specific
/// bring-up code has discovered (spec 1: "physical memory layout...
/// supplied by platform-specific bring-up code"); the platform hook
/// implementations are `'static` since every subsystem below reaches them
/// through `hal::*::backend()` for the rest of the kernel's lifetime.
#[allow(clippy::too_many_arguments)]
pub fn start_up(
	cpu: &'static dyn hal::CurrentCpu,
	interrupt_controller: &'static dyn hal::InterruptController,
	timer: &'static dyn hal::IntervalTimer,
	page_table: &'static dyn hal::PageTableOps,
	physical_page_count: u64,
	console: Option<alloc::boxed::Box<dyn logger::Sink>>,
) {
	hal::cpu::install(cpu);
	hal::interrupt_controller::install(interrupt_controller);
	hal::timer::install(timer);
	hal::page_table::install(page_table);

	if let Some(sink) = console {
		logger::LOGGER.lock().set_sink(sink);
	}

	mm::init(physical_page_count);
	ke::init();
	ob::init();
	io::init();
	sys::init();

	let kernel_map = page_table.create_page_map(None).expect("kernel page map");
	sys::process::set_kernel_page_map(kernel_map);

	crate::kprintln!("Boron executive started ({} CPU(s), {} physical page(s))", hal::cpu::cpu_count(), physical_page_count);
}
