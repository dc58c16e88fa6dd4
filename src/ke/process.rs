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

//! Processes: the unit `Ke` schedules threads under and `Mm`/`Ob` key
//! address spaces and handle tables by (spec 3, "Process").
//!
//! Mirrors [`super::scheduler`]'s thread registry: a global table keyed by
//! a monotonic id, guarded by one spinlock. Process creation also touches
//! `Ob` (a handle table) and `Mm` (an address space), so [`create_process`]
//! sequences those the way the teacher's `kernel_main_inner` sequences
//! subsystem bring-up, rather than leaving callers to remember the order.

use super::thread::ThreadId;
use crate::hal::page_table::PageMapId;
use crate::mm::vad::AddressSpace;
use crate::ob::api;
use crate::status::EResult;
use crate::sync::spin::IntSpin;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU64, Ordering};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct ProcessId(pub u64);

/// A process's scheduling affinity: which logical CPUs its threads may run
/// on. Defaults to every CPU the executive brought up.
#[derive(Clone, Debug)]
pub struct Affinity(pub Vec<usize>);

impl Affinity {
	pub fn all(cpu_count: usize) -> Self {
		Affinity((0..cpu_count).collect())
	}

	pub fn allows(&self, cpu: usize) -> bool {
		self.0.iter().any(|&c| c == cpu)
	}
}

pub struct Process {
	pub id: ProcessId,
	pub page_map: PageMapId,
	pub address_space: AddressSpace,
	pub threads: Vec<ThreadId>,
	pub base_priority: u8,
	pub affinity: Affinity,
	pub terminated: bool,
	/// Exit status recorded by the first thread to call `OSTerminateProcess`
	/// / `OSExitProcess` (spec 6); read by a joiner waiting on the process
	/// object after it signals.
	pub exit_status: i32,
}

impl Process {
	fn new(id: ProcessId, page_map: PageMapId, address_space: AddressSpace, cpu_count: usize) -> Self {
		Process {
			id,
			page_map,
			address_space,
			threads: Vec::new(),
			base_priority: 8,
			affinity: Affinity::all(cpu_count),
			terminated: false,
			exit_status: 0,
		}
	}
}

static PROCESSES: IntSpin<BTreeMap<ProcessId, Process>> = IntSpin::new_lazy(BTreeMap::new);
static NEXT_PROCESS_ID: AtomicU64 = AtomicU64::new(1);

/// User address space span handed to every new process's [`AddressSpace`]
/// (the kernel half above it is shared and out of this range; spec 4.6,
/// "kernel half is shared across all page maps").
const USER_VA_LOW: u64 = 0x1000;
const USER_VA_HIGH: u64 = 0x0000_7fff_ffff_0000;

/// `PsCreateProcess`: allocates a process id, a page map, an empty handle
/// table (`Ob`), and an address space (`Mm`) covering the user half of
/// `page_map`. Does not create a thread — callers (`OSCreateProcess`) do
/// that separately once the process exists.
pub fn create_process(page_map: PageMapId, cpu_count: usize) -> ProcessId {
	let id = ProcessId(NEXT_PROCESS_ID.fetch_add(1, Ordering::Relaxed));
	let space = AddressSpace::new(page_map, USER_VA_LOW, USER_VA_HIGH);
	api::create_handle_table(id);
	PROCESSES.lock().insert(id, Process::new(id, page_map, space, cpu_count));
	id
}

/// Runs `f` with exclusive access to `id`'s process control block.
pub fn with_process<R>(id: ProcessId, f: impl FnOnce(&mut Process) -> R) -> R {
	let mut processes = PROCESSES.lock();
	f(processes.get_mut(&id).expect("unknown ProcessId"))
}

pub fn address_space_snapshot(id: ProcessId) -> EResult<PageMapId> {
	Ok(with_process(id, |p| p.page_map))
}

/// `PsTerminateProcess`: marks every thread of `id` for termination, tears
/// down its handle table (running every still-open handle's `Close`
/// callback), and records `exit_status` for a later joiner.
pub fn terminate_process(id: ProcessId, exit_status: i32) {
	let threads = with_process(id, |p| {
		p.terminated = true;
		p.exit_status = exit_status;
		p.threads.clone()
	});
	for thread in threads {
		super::scheduler::terminate(thread);
	}
	api::kill_handle_table(id);
}

/// Removes the process control block once the object manager has dropped
/// the last reference to its process object (spec 4.4: deletion happens at
/// zero pointer references, independent of when `terminate_process` ran).
pub fn destroy(id: ProcessId) {
	PROCESSES.lock().remove(&id);
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn create_then_terminate_marks_process_and_tears_down_handles() {
		crate::ob::types::ensure_basic_types();
		let id = create_process(PageMapId(1), 1);
		let thread = super::super::scheduler::create_thread(id, 8);
		with_process(id, |p| p.threads.push(thread));
		terminate_process(id, 7);
		with_process(id, |p| {
			assert!(p.terminated);
			assert_eq!(p.exit_status, 7);
		});
		destroy(id);
	}

	#[test]
	fn affinity_all_allows_every_cpu_up_to_count() {
		let affinity = Affinity::all(4);
		assert!(affinity.allows(0));
		assert!(affinity.allows(3));
		assert!(!affinity.allows(4));
	}
}
