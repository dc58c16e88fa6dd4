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

//! Kernel timers: a global due-time-ordered queue backing wait timeouts
//! and the scheduler's quantum-end deadline (spec 4.3: "A one-shot timer
//! is programmed to the soonest of the quantum deadline and the head of
//! the global timer queue").
//!
//! Each [`KTimer`] is a dispatcher object (a [`DispatchHeader`]) signalled
//! when it expires, so a thread can either wait on it directly or have the
//! wait machinery attach a timeout timer to an ongoing
//! `WaitForMultipleObjects`.

use super::dispatch::DispatchHeader;
use crate::rtl::rank_tree::RankTree;
use crate::sync::spin::IntSpin;
use alloc::vec::Vec;

pub type TimerId = u64;

pub struct KTimer {
	pub id: TimerId,
	pub due_tick: u64,
	pub header: DispatchHeader,
	pub periodic_ticks: Option<u64>,
}

struct TimerQueue {
	/// Keyed by `(due_tick, id)` so ties at the same tick stay ordered by
	/// insertion (id is monotonically increasing).
	by_due: RankTree<(u64, TimerId), ()>,
	timers: alloc::collections::BTreeMap<TimerId, KTimer>,
	next_id: TimerId,
}

impl TimerQueue {
	const fn new() -> Self {
		TimerQueue {
			by_due: RankTree::new(),
			timers: alloc::collections::BTreeMap::new(),
			next_id: 1,
		}
	}
}

static QUEUE: IntSpin<TimerQueue> = IntSpin::new(TimerQueue::new());

/// Arms a new one-shot (or, if `periodic_ticks` is set, repeating) timer
/// due at `now + ticks_from_now`, returning its id.
pub fn arm(now: u64, ticks_from_now: u64, periodic_ticks: Option<u64>) -> TimerId {
	let mut q = QUEUE.lock();
	let id = q.next_id;
	q.next_id += 1;
	let due = now + ticks_from_now;
	q.by_due.insert((due, id), ());
	q.timers.insert(
		id,
		KTimer {
			id,
			due_tick: due,
			header: DispatchHeader::new(0),
			periodic_ticks,
		},
	);
	id
}

/// Cancels a timer before it fires. No-op if it already fired or never
/// existed.
pub fn cancel(id: TimerId) {
	let mut q = QUEUE.lock();
	if let Some(timer) = q.timers.remove(&id) {
		q.by_due.remove(&(timer.due_tick, id));
	}
}

/// Advances the timer queue to `now`, signalling (and, if periodic,
/// re-arming) every timer whose due tick has passed. Returns the ids of
/// timers that fired, so the wait machinery can wake their waiters.
pub fn expire_due(now: u64) -> Vec<TimerId> {
	let mut fired = Vec::new();
	let mut q = QUEUE.lock();
	loop {
		let Some((&(due, id), _)) = q.by_due.iter().next() else { break };
		if due > now {
			break;
		}
		q.by_due.remove(&(due, id));
		if let Some(timer) = q.timers.get_mut(&id) {
			timer.header.state = 1;
			fired.push(id);
			if let Some(period) = timer.periodic_ticks {
				let new_due = due + period;
				timer.due_tick = new_due;
				timer.header.state = 0;
				q.by_due.insert((new_due, id), ());
			} else {
				q.timers.remove(&id);
			}
		}
	}
	fired
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fires_exactly_once_for_one_shot() {
		let id = arm(0, 10, None);
		assert!(expire_due(5).is_empty());
		assert_eq!(expire_due(10), alloc::vec![id]);
		assert!(expire_due(20).is_empty());
	}

	#[test]
	fn cancel_prevents_firing() {
		let id = arm(0, 10, None);
		cancel(id);
		assert!(expire_due(10).is_empty());
	}

	#[test]
	fn periodic_timer_rearms() {
		let id = arm(0, 5, Some(5));
		assert_eq!(expire_due(5), alloc::vec![id]);
		assert!(expire_due(8).is_empty());
		assert_eq!(expire_due(10), alloc::vec![id]);
	}
}
