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

//! Dispatch header: the wait/signal primitive every blocking
//! synchronisation object (spec 4.1's "Mutex & rw-lock... built on
//! dispatch-header primitive") and the scheduler's wait machinery
//! (spec 4.3) share.
//!
//! A dispatch header does not know what kind of object owns it; it only
//! tracks a signal `state` (interpreted by the owner: 0/1 for an event,
//! a count for a semaphore) and the list of wait blocks currently queued
//! on it. Waking threads up is [`crate::ke::wait`]'s job, since that
//! requires reaching into the scheduler and thread table.

use crate::rtl::index_list::{IndexList, Linkable};
use crate::sync::spin::IntSpin;
use alloc::vec::Vec;

use super::thread::ThreadId;

/// Whether a multi-object wait is satisfied by any one object becoming
/// signalled, or requires all of them (spec 4.3, `WaitForMultipleObjects`).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum WaitType {
	Any,
	All,
}

pub type WaitBlockId = u32;

/// One thread's registration on one object's wait list. Spec 4.3: "links
/// each into its object's wait list."
pub struct WaitBlock {
	pub thread: ThreadId,
	/// Position of this wait block within the owning thread's wait
	/// request (`WaitForMultipleObjects(objects[i], ...)`), used to
	/// compute `STATUS_RANGE_WAIT + index` on wake.
	pub index: u32,
	pub wait_type: WaitType,
	/// Set by [`super::wait`] once this block's object has satisfied it;
	/// a still-pending `All` wait inspects this on each candidate wake.
	pub satisfied: bool,
	prev: Option<WaitBlockId>,
	next: Option<WaitBlockId>,
}

impl WaitBlock {
	pub fn new(thread: ThreadId, index: u32, wait_type: WaitType) -> Self {
		WaitBlock {
			thread,
			index,
			wait_type,
			satisfied: false,
			prev: None,
			next: None,
		}
	}
}

impl Linkable<WaitBlockId> for WaitBlock {
	fn prev(&self) -> Option<WaitBlockId> {
		self.prev
	}
	fn next(&self) -> Option<WaitBlockId> {
		self.next
	}
	fn set_prev(&mut self, v: Option<WaitBlockId>) {
		self.prev = v;
	}
	fn set_next(&mut self, v: Option<WaitBlockId>) {
		self.next = v;
	}
}

/// A dispatcher object's wait-related state: its signal level and the
/// waiters currently queued on it.
pub struct DispatchHeader {
	pub state: i64,
	pub waiters: IndexList<WaitBlockId>,
}

impl DispatchHeader {
	pub const fn new(initial_state: i64) -> Self {
		DispatchHeader {
			state: initial_state,
			waiters: IndexList::new(),
		}
	}

	pub fn is_signaled(&self) -> bool {
		self.state > 0
	}
}

/// Global arena owning every currently-allocated wait block, addressed by
/// [`WaitBlockId`]. Spec 4.3: "the thread allocates wait blocks (embedded
/// 4, heap otherwise, max 64)" — the embedded/heap distinction is carried
/// by [`super::thread::WaitBlockSet`], which borrows slots from this
/// arena; the arena itself is just a slab so `IndexList` has stable
/// addresses to link through.
pub struct WaitBlockArena {
	slots: Vec<Option<WaitBlock>>,
	free: Vec<WaitBlockId>,
}

impl WaitBlockArena {
	pub const fn new() -> Self {
		WaitBlockArena {
			slots: Vec::new(),
			free: Vec::new(),
		}
	}

	pub fn alloc(&mut self, block: WaitBlock) -> WaitBlockId {
		if let Some(id) = self.free.pop() {
			self.slots[id as usize] = Some(block);
			id
		} else {
			self.slots.push(Some(block));
			(self.slots.len() - 1) as WaitBlockId
		}
	}

	pub fn free(&mut self, id: WaitBlockId) {
		self.slots[id as usize] = None;
		self.free.push(id);
	}

	pub fn get(&self, id: WaitBlockId) -> &WaitBlock {
		self.slots[id as usize].as_ref().expect("dangling WaitBlockId")
	}

	pub fn get_mut(&mut self, id: WaitBlockId) -> &mut WaitBlock {
		self.slots[id as usize].as_mut().expect("dangling WaitBlockId")
	}
}

impl Default for WaitBlockArena {
	fn default() -> Self {
		Self::new()
	}
}

/// The one global wait block arena. Every [`DispatchHeader::waiters`]
/// list is a list of indices into this arena, raised at DPC IPL while
/// manipulated (spec 5: "each object's wait list happens under the
/// scheduler lock raised to DPC IPL").
pub static WAIT_BLOCKS: IntSpin<WaitBlockArena> = IntSpin::new(WaitBlockArena::new());

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn header_starts_unsignaled_by_default_and_signaled_when_asked() {
		let unsignaled = DispatchHeader::new(0);
		assert!(!unsignaled.is_signaled());
		let signaled = DispatchHeader::new(1);
		assert!(signaled.is_signaled());
	}

	#[test]
	fn arena_reuses_freed_slots() {
		let mut arena = WaitBlockArena::new();
		let a = arena.alloc(WaitBlock {
			thread: ThreadId(1),
			index: 0,
			wait_type: WaitType::Any,
			satisfied: false,
			prev: None,
			next: None,
		});
		arena.free(a);
		let b = arena.alloc(WaitBlock {
			thread: ThreadId(2),
			index: 0,
			wait_type: WaitType::Any,
			satisfied: false,
			prev: None,
			next: None,
		});
		assert_eq!(a, b);
	}
}
