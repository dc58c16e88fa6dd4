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

//! Threads (spec 4.3): state, priority, wait blocks, APC queues.

use super::dispatch::{DispatchHeader, WaitBlockId, WaitType};
use super::process::ProcessId;
use crate::rtl::index_list::Linkable;
use crate::status::{self, RawStatus, Status};
use alloc::vec::Vec;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct ThreadId(pub u64);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ThreadState {
	Ready,
	Running,
	Waiting,
	Terminated,
}

/// Why a wait completed, mirroring spec 4.3's wake conditions. Encoded
/// into a [`crate::status::Status`] via `STATUS_RANGE_WAIT`/
/// `STATUS_RANGE_ABANDONED_WAIT` once the index of the satisfying object
/// is known.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum WaitOutcome {
	/// `type=any`: object at this index satisfied the wait.
	Satisfied { index: u32 },
	/// `type=all`: every object satisfied; thread re-checked and is done.
	AllSatisfied,
	Timeout,
	Alerted,
	Killed,
}

impl WaitOutcome {
	/// Encodes the outcome the way a caller of `WaitForSingleObject`/
	/// `WaitForMultipleObjects` sees it (spec section 7): the satisfied
	/// index is folded into `STATUS_RANGE_WAIT`, everything else is a
	/// plain [`Status`] cast to its raw value.
	pub fn to_raw(self) -> RawStatus {
		match self {
			WaitOutcome::Satisfied { index } => status::wait_n(index as usize),
			WaitOutcome::AllSatisfied => Status::Success as RawStatus,
			WaitOutcome::Timeout => Status::Timeout as RawStatus,
			WaitOutcome::Alerted => Status::Alerted as RawStatus,
			WaitOutcome::Killed => Status::Killed as RawStatus,
		}
	}
}

/// The thread's currently-outstanding wait blocks: up to
/// `EMBEDDED_WAIT_BLOCKS` stored inline, the remainder (up to
/// `MAX_WAIT_BLOCKS`) spilled onto the heap. Spec 4.3: "allocates wait
/// blocks (embedded 4, heap otherwise, max 64)".
pub struct WaitBlockSet {
	inline: [Option<WaitBlockId>; crate::config::generated::EMBEDDED_WAIT_BLOCKS],
	inline_len: usize,
	overflow: Vec<WaitBlockId>,
}

impl WaitBlockSet {
	pub const fn new() -> Self {
		WaitBlockSet {
			inline: [None; crate::config::generated::EMBEDDED_WAIT_BLOCKS],
			inline_len: 0,
			overflow: Vec::new(),
		}
	}

	pub fn len(&self) -> usize {
		self.inline_len + self.overflow.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn push(&mut self, id: WaitBlockId) -> Status {
		if self.len() >= crate::config::generated::MAX_WAIT_BLOCKS {
			return Status::InsufficientSpace;
		}
		if self.inline_len < self.inline.len() {
			self.inline[self.inline_len] = Some(id);
			self.inline_len += 1;
		} else {
			self.overflow.push(id);
		}
		Status::Success
	}

	pub fn iter(&self) -> impl Iterator<Item = WaitBlockId> + '_ {
		self.inline[..self.inline_len].iter().copied().flatten().chain(self.overflow.iter().copied())
	}

	pub fn clear(&mut self) {
		self.inline_len = 0;
		self.overflow.clear();
	}
}

impl Default for WaitBlockSet {
	fn default() -> Self {
		Self::new()
	}
}

/// One kernel APC: a routine to run in the context of the thread it was
/// queued to, at APC IPL.
pub struct KernelApc {
	pub routine: fn(ThreadId),
}

pub struct Thread {
	pub id: ThreadId,
	pub process: ProcessId,
	pub priority: u8,
	pub state: ThreadState,
	pub quantum_deadline_ticks: u64,
	/// Dispatch header signalled on termination, so joiners waiting on the
	/// thread object itself wake up (spec 4.3, "Thread termination...
	/// signals its dispatch header").
	pub header: DispatchHeader,
	pub wait_blocks: WaitBlockSet,
	pub wait_type: WaitType,
	pub apc_disable_count: u32,
	pub kernel_apc_queue: alloc::collections::VecDeque<KernelApc>,
	pub user_apc_pending: bool,
	pub alertable: bool,
	pub alerted: bool,
	pub killed: bool,
	/// Ready-queue link; valid only while `state == Ready`.
	prev: Option<ThreadId>,
	next: Option<ThreadId>,
}

impl Linkable<ThreadId> for Thread {
	fn prev(&self) -> Option<ThreadId> {
		self.prev
	}
	fn next(&self) -> Option<ThreadId> {
		self.next
	}
	fn set_prev(&mut self, v: Option<ThreadId>) {
		self.prev = v;
	}
	fn set_next(&mut self, v: Option<ThreadId>) {
		self.next = v;
	}
}

impl Thread {
	pub fn new(id: ThreadId, process: ProcessId, priority: u8) -> Self {
		Thread {
			id,
			process,
			priority,
			state: ThreadState::Ready,
			quantum_deadline_ticks: 0,
			header: DispatchHeader::new(0),
			wait_blocks: WaitBlockSet::new(),
			wait_type: WaitType::Any,
			apc_disable_count: 0,
			kernel_apc_queue: alloc::collections::VecDeque::new(),
			user_apc_pending: false,
			alertable: false,
			alerted: false,
			killed: false,
			prev: None,
			next: None,
		}
	}

	pub fn kernel_apcs_deliverable(&self) -> bool {
		self.apc_disable_count == 0 && !self.kernel_apc_queue.is_empty()
	}
}
