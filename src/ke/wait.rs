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

//! `WaitForSingleObject` / `WaitForMultipleObjects` (spec 4.3).
//!
//! Wait blocks are genuinely allocated and linked into each object's wait
//! list for the duration of the wait, and unlinked on the way out (spec:
//! "after wake-up, the thread removes itself from every object's wait
//! list") — this bookkeeping is what a real wake-from-interrupt path
//! would walk. Resolving *when* to wake, though, is simplified to a
//! condition re-check loop rather than a true suspend/resume: this crate
//! never boots a real scheduler loop, and an arch layer that did would
//! replace the spin with [`super::scheduler::yield_voluntarily`] /
//! [`super::scheduler::take_pending_switch`] around the same check.

use super::dispatch::{DispatchHeader, WaitBlock, WaitBlockId, WaitType, WAIT_BLOCKS};
use super::scheduler;
use super::thread::{ThreadId, WaitOutcome};
use crate::status::{self, RawStatus, Status};
use crate::sync::spin::IntSpin;
use alloc::vec::Vec;

/// Anything a thread can wait on: events, semaphores, mutexes, timers.
pub trait Waitable: Send + Sync {
	fn header(&self) -> &IntSpin<DispatchHeader>;

	/// Called exactly once, when this object is chosen to satisfy a
	/// waiter, to apply whatever object-specific bookkeeping "being
	/// consumed" means (a semaphore decrements, a synchronization event
	/// auto-resets, a mutex records its new owner).
	fn consume_for(&self, thread: ThreadId);
}

fn register(objects: &[&dyn Waitable], thread: ThreadId, wait_type: WaitType) -> Vec<WaitBlockId> {
	let mut ids = Vec::with_capacity(objects.len());
	let mut arena = WAIT_BLOCKS.lock();
	for (index, obj) in objects.iter().enumerate() {
		let block = WaitBlock::new(thread, index as u32, wait_type);
		let id = arena.alloc(block);
		obj.header().lock().waiters.link_back(id, |i| arena.get_mut(i));
		ids.push(id);
	}
	drop(arena);
	scheduler::with_thread(thread, |t| {
		for &id in &ids {
			let _ = t.wait_blocks.push(id);
		}
	});
	ids
}

fn unregister(objects: &[&dyn Waitable], ids: &[WaitBlockId], thread: ThreadId) {
	let mut arena = WAIT_BLOCKS.lock();
	for (obj, &id) in objects.iter().zip(ids) {
		obj.header().lock().waiters.unlink(id, |i| arena.get_mut(i));
		arena.free(id);
	}
	drop(arena);
	scheduler::with_thread(thread, |t| t.wait_blocks.clear());
}

/// Waits on a single object. `deadline_tick`, if set, is the absolute
/// tick (per `now_ticks`) at which the wait gives up with `STATUS_TIMEOUT`.
pub fn wait_for_single_object(
	thread: ThreadId,
	obj: &dyn Waitable,
	alertable: bool,
	deadline_tick: Option<u64>,
	now_ticks: impl Fn() -> u64,
) -> RawStatus {
	wait_for_multiple_objects(thread, &[obj], WaitType::Any, alertable, deadline_tick, now_ticks)
}

/// Waits on a set of objects, either for any one or for all of them to be
/// signalled (spec 4.3). Entering with `alertable` set and a pending user
/// APC returns `alerted` immediately without registering anything.
pub fn wait_for_multiple_objects(
	thread: ThreadId,
	objects: &[&dyn Waitable],
	wait_type: WaitType,
	alertable: bool,
	deadline_tick: Option<u64>,
	now_ticks: impl Fn() -> u64,
) -> RawStatus {
	if scheduler::with_thread(thread, |t| t.killed) {
		return Status::Killed as RawStatus;
	}
	if alertable && scheduler::with_thread(thread, |t| t.user_apc_pending) {
		scheduler::with_thread(thread, |t| t.user_apc_pending = false);
		return Status::Alerted as RawStatus;
	}

	if let Some(outcome) = try_satisfy(objects, wait_type, thread) {
		return outcome.to_raw();
	}

	let ids = register(objects, thread, wait_type);
	scheduler::with_thread(thread, |t| t.state = super::thread::ThreadState::Waiting);

	let outcome = loop {
		if scheduler::with_thread(thread, |t| t.killed) {
			break WaitOutcome::Killed;
		}
		if alertable && scheduler::with_thread(thread, |t| t.alerted) {
			scheduler::with_thread(thread, |t| t.alerted = false);
			break WaitOutcome::Alerted;
		}
		if let Some(outcome) = try_satisfy(objects, wait_type, thread) {
			break outcome;
		}
		if let Some(deadline) = deadline_tick {
			if now_ticks() >= deadline {
				break WaitOutcome::Timeout;
			}
		}
		core::hint::spin_loop();
	};

	unregister(objects, &ids, thread);
	scheduler::with_thread(thread, |t| t.state = super::thread::ThreadState::Ready);
	outcome.to_raw()
}

fn try_satisfy(objects: &[&dyn Waitable], wait_type: WaitType, thread: ThreadId) -> Option<WaitOutcome> {
	match wait_type {
		WaitType::Any => {
			for (index, obj) in objects.iter().enumerate() {
				if obj.header().lock().is_signaled() {
					obj.consume_for(thread);
					return Some(WaitOutcome::Satisfied { index: index as u32 });
				}
			}
			None
		}
		WaitType::All => {
			if objects.iter().all(|o| o.header().lock().is_signaled()) {
				for obj in objects {
					obj.consume_for(thread);
				}
				Some(WaitOutcome::AllSatisfied)
			} else {
				None
			}
		}
	}
}

/// Helper for `status::wait_n`/`status::abandoned_wait_n` callers that
/// already have a decoded outcome (kept here rather than in `status` so
/// `status` stays free of `ke` types).
pub fn decode(raw: RawStatus) -> Option<usize> {
	status::decode_wait_index(raw)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ke::sync_objects::{Event, EventKind, Semaphore};
	use alloc::sync::Arc;
	use core::sync::atomic::{AtomicU64, Ordering};

	fn no_timeout() -> u64 {
		0
	}

	#[test]
	fn wait_on_already_signaled_event_returns_immediately() {
		let thread = crate::ke::scheduler::create_thread(crate::ke::process::ProcessId(0), 1);
		let event = Event::new(EventKind::Notification, true);
		let status = wait_for_single_object(thread, &event, false, None, no_timeout);
		assert_eq!(status, status::wait_n(0));
	}

	#[test]
	fn timeout_fires_when_deadline_passed() {
		let thread = crate::ke::scheduler::create_thread(crate::ke::process::ProcessId(0), 1);
		let event = Event::new(EventKind::Notification, false);
		let status = wait_for_single_object(thread, &event, false, Some(0), || 1);
		assert_eq!(status, Status::Timeout as RawStatus);
	}

	#[test]
	fn another_os_thread_signalling_wakes_the_waiter() {
		let thread = crate::ke::scheduler::create_thread(crate::ke::process::ProcessId(0), 1);
		let sem = Arc::new(Semaphore::new(0, 1));
		let ticks = Arc::new(AtomicU64::new(0));

		let sem2 = sem.clone();
		let ticks2 = ticks.clone();
		std::thread::spawn(move || {
			std::thread::sleep(std::time::Duration::from_millis(10));
			ticks2.fetch_add(1, Ordering::Relaxed);
			sem2.release(1);
		});

		let status = wait_for_single_object(thread, &*sem, false, None, || ticks.load(Ordering::Relaxed));
		assert_eq!(status, status::wait_n(0));
	}
}
