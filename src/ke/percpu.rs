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

//! Per-CPU scheduler state: one ready-queue array, running/next-thread
//! slots, and a DPC queue per logical processor (spec 4.2, 4.3).

use super::dpc::DpcId;
use super::thread::ThreadId;
use crate::rtl::index_list::IndexList;
use crate::sync::spin::IntSpin;
use alloc::vec::Vec;

pub struct PerCpu {
	/// `ready[priority]`, `priority` in `0..PRIORITY_LEVELS`, 0 = idle.
	pub ready: Vec<IndexList<ThreadId>>,
	pub running: Option<ThreadId>,
	/// Set to signal a pending context switch away from `running`.
	pub next: Option<ThreadId>,
	pub dpc_queue: IndexList<DpcId>,
	pub idle_thread: Option<ThreadId>,
}

impl PerCpu {
	fn new() -> Self {
		let levels = crate::config::generated::PRIORITY_LEVELS;
		let mut ready = Vec::with_capacity(levels);
		for _ in 0..levels {
			ready.push(IndexList::new());
		}
		PerCpu {
			ready,
			running: None,
			next: None,
			dpc_queue: IndexList::new(),
			idle_thread: None,
		}
	}

	/// Highest-priority non-empty ready queue, if any.
	pub fn highest_ready_priority(&self) -> Option<usize> {
		self.ready.iter().enumerate().rev().find(|(_, q)| !q.is_empty()).map(|(p, _)| p)
	}
}

static CPUS: IntSpin<Vec<IntSpin<PerCpu>>> = IntSpin::new_lazy(Vec::new);

pub fn init(cpu_count: usize) {
	let mut cpus = CPUS.lock();
	cpus.clear();
	for _ in 0..cpu_count {
		cpus.push(IntSpin::new(PerCpu::new()));
	}
}

/// Runs `f` with exclusive access to CPU `cpu`'s scheduler state.
pub fn with_cpu<R>(cpu: usize, f: impl FnOnce(&mut PerCpu) -> R) -> R {
	let cpus = CPUS.lock();
	let mut guard = cpus[cpu].lock();
	f(&mut guard)
}

pub fn cpu_count() -> usize {
	CPUS.lock().len()
}
