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

//! Ready queues, quantum management, and thread selection (spec 4.3).
//!
//! The actual register-level context switch is the one piece of "context
//! switch" (layer table, section 2) that is genuinely architecture
//! specific; this module decides *which* thread runs next and leaves
//! `next` set on the owning [`super::percpu::PerCpu`] for the HAL's trap
//! return path to consume via [`take_pending_switch`].

use super::dispatch::WaitType;
use super::percpu;
use super::process::ProcessId;
use super::thread::{Thread, ThreadId, ThreadState};
use crate::rtl::index_list::Linkable;
use crate::sync::spin::IntSpin;
use alloc::collections::BTreeMap;
use core::sync::atomic::{AtomicU64, Ordering};

static THREADS: IntSpin<BTreeMap<ThreadId, Thread>> = IntSpin::new_lazy(BTreeMap::new);
static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

/// Scheduler ticks making up one quantum (spec 4.3: "frequency x 10ms").
pub fn quantum_ticks() -> u64 {
	core::cmp::max(1, u64::from(crate::config::generated::TICK_HZ) / 100)
}

pub fn init(cpu_count: usize) {
	for cpu in 0..cpu_count {
		let id = create_thread(ProcessId(0), 0);
		percpu::with_cpu(cpu, |pcpu| pcpu.idle_thread = Some(id));
	}
}

/// Creates a new thread in the `Ready` state, owned by `process`, at
/// `priority`. Does not place it on any CPU's ready queue — callers use
/// [`enqueue_ready`] once the thread is ready to actually run.
pub fn create_thread(process: ProcessId, priority: u8) -> ThreadId {
	let id = ThreadId(NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed));
	THREADS.lock().insert(id, Thread::new(id, process, priority));
	id
}

/// Runs `f` with exclusive access to `id`'s thread control block.
pub fn with_thread<R>(id: ThreadId, f: impl FnOnce(&mut Thread) -> R) -> R {
	let mut threads = THREADS.lock();
	f(threads.get_mut(&id).expect("unknown ThreadId"))
}

/// Places `id` at the tail of its priority's ready queue on `cpu`.
pub fn enqueue_ready(cpu: usize, id: ThreadId) {
	with_thread(id, |t| t.state = ThreadState::Ready);
	let priority = with_thread(id, |t| t.priority);
	percpu::with_cpu(cpu, |pcpu| {
		let mut threads = THREADS.lock();
		pcpu.ready[priority as usize].link_back(id, |i| threads.get_mut(&i).expect("unknown ThreadId"));
	});
}

/// Picks the next thread to run on `cpu`: the head of the highest
/// non-empty ready queue, or the idle thread if every queue is empty
/// (spec 4.3: "the idle thread at priority 0 is always available").
fn pick_next(cpu: usize) -> ThreadId {
	percpu::with_cpu(cpu, |pcpu| {
		let mut threads = THREADS.lock();
		if let Some(priority) = pcpu.highest_ready_priority() {
			if let Some(id) = pcpu.ready[priority].pop_front(|i| threads.get_mut(&i).expect("unknown ThreadId")) {
				return id;
			}
		}
		pcpu.idle_thread.expect("scheduler not initialised")
	})
}

/// Sets `cpu.next`, to be consumed by the HAL's trap-return path, and
/// returns the thread it picked.
fn reschedule(cpu: usize) -> ThreadId {
	let next = pick_next(cpu);
	percpu::with_cpu(cpu, |pcpu| pcpu.next = Some(next));
	next
}

/// The HAL's trap-return path calls this to find out whether a switch was
/// requested, consuming the request.
pub fn take_pending_switch(cpu: usize) -> Option<ThreadId> {
	percpu::with_cpu(cpu, |pcpu| {
		let next = pcpu.next.take();
		if let Some(id) = next {
			pcpu.running = Some(id);
			with_thread(id, |t| t.state = ThreadState::Running);
		}
		next
	})
}

/// Quantum-end path (spec 4.3, "Quantum end"): called from the clock
/// interrupt when `now >= deadline`. If a higher-or-equal priority thread
/// is ready, the running thread is preempted and re-queued at the tail of
/// its own ready queue; otherwise it keeps running with a fresh quantum.
pub fn quantum_end(cpu: usize, now: u64) {
	let Some(running) = percpu::with_cpu(cpu, |pcpu| pcpu.running) else { return };
	let running_priority = with_thread(running, |t| t.priority);
	let should_switch = percpu::with_cpu(cpu, |pcpu| {
		pcpu.highest_ready_priority().map(|p| p >= running_priority as usize).unwrap_or(false)
	});
	if should_switch {
		enqueue_ready(cpu, running);
		reschedule(cpu);
	} else {
		with_thread(running, |t| t.quantum_deadline_ticks = now + quantum_ticks());
	}
}

/// Voluntary yield (spec 4.3, "Voluntary yield"): the calling thread is
/// entering a wait or exiting, and must not be re-queued — the caller is
/// responsible for having already set its new state.
pub fn yield_voluntarily(cpu: usize) {
	reschedule(cpu);
}

/// Terminates `id`: marks it `Terminated`, signals its dispatch header so
/// joiners waiting on the thread object wake, and removes it from the
/// owning process's thread list. The thread control block itself is kept
/// around (its header may still have waiters to wake via
/// `super::wait::satisfy`) until the last reference is dropped.
pub fn terminate(id: ThreadId) {
	with_thread(id, |t| {
		t.state = ThreadState::Terminated;
		t.killed = true;
		t.header.state = 1;
	});
}

/// Removes `id`'s control block entirely, once the object manager has
/// dropped the last reference to its thread object (spec 4.3: the TCB is
/// "kept around... until the last reference is dropped", tracked the
/// object-manager way rather than with its own ad hoc refcount).
pub fn destroy(id: ThreadId) {
	THREADS.lock().remove(&id);
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn idle_thread_runs_when_queues_empty() {
		percpu::init(1);
		init(1);
		let idle = percpu::with_cpu(0, |pcpu| pcpu.idle_thread.unwrap());
		assert_eq!(pick_next(0), idle);
	}

	#[test]
	fn higher_priority_thread_preempts() {
		percpu::init(1);
		init(1);
		let low = create_thread(ProcessId(1), 1);
		let high = create_thread(ProcessId(1), 5);
		enqueue_ready(0, low);
		enqueue_ready(0, high);
		assert_eq!(pick_next(0), high);
	}

	#[test]
	fn quantum_end_requeues_preempted_thread() {
		percpu::init(1);
		init(1);
		let a = create_thread(ProcessId(1), 2);
		let b = create_thread(ProcessId(1), 2);
		percpu::with_cpu(0, |pcpu| pcpu.running = Some(a));
		with_thread(a, |t| t.state = ThreadState::Running);
		enqueue_ready(0, b);
		quantum_end(0, 1000);
		let next = take_pending_switch(0);
		assert_eq!(next, Some(b));
		with_thread(a, |t| assert_eq!(t.state, ThreadState::Ready));
	}
}
