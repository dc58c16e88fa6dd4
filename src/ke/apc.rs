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

//! Asynchronous procedure calls (spec 4.3): "Two per-thread queues
//! (kernel, user). Kernel APCs run at APC IPL whenever the thread is
//! scheduled and `apc-disable == 0`; user APCs run on user-mode return
//! when `alertable`."

use super::scheduler;
use super::thread::{KernelApc, ThreadId};
use crate::sync::ipl::{self, Ipl};

/// Queues a kernel APC to run the next time `thread` is scheduled with
/// APC delivery enabled.
pub fn queue_kernel_apc(thread: ThreadId, routine: fn(ThreadId)) {
	scheduler::with_thread(thread, |t| t.kernel_apc_queue.push_back(KernelApc { routine }));
}

/// Marks `thread` as having a user APC pending; delivered on return to
/// user mode if the thread is currently in an alertable wait or takes
/// one next.
pub fn queue_user_apc(thread: ThreadId) {
	scheduler::with_thread(thread, |t| t.user_apc_pending = true);
}

/// Raises an "APC disable" critical region: kernel APCs queued to this
/// thread will not run until a matching [`leave_critical_region`].
/// Mirrors `KeEnterCriticalRegion`.
pub fn enter_critical_region(thread: ThreadId) {
	scheduler::with_thread(thread, |t| t.apc_disable_count += 1);
}

pub fn leave_critical_region(thread: ThreadId) {
	scheduler::with_thread(thread, |t| {
		debug_assert!(t.apc_disable_count > 0, "unbalanced leave_critical_region");
		t.apc_disable_count = t.apc_disable_count.saturating_sub(1);
	});
}

/// Drains and runs every deliverable kernel APC queued to `thread`, at
/// APC IPL. Called on the path back into a thread once it has been
/// scheduled (spec: "whenever the thread is scheduled and apc-disable ==
/// 0").
pub fn deliver_kernel_apcs(thread: ThreadId) {
	if !scheduler::with_thread(thread, |t| t.kernel_apcs_deliverable()) {
		return;
	}
	let old_ipl = ipl::raise_ipl(Ipl::APC);
	loop {
		let next = scheduler::with_thread(thread, |t| {
			if t.apc_disable_count == 0 {
				t.kernel_apc_queue.pop_front()
			} else {
				None
			}
		});
		let Some(apc) = next else { break };
		(apc.routine)(thread);
	}
	ipl::lower_ipl(old_ipl);
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ke::process::ProcessId;
	use core::sync::atomic::{AtomicUsize, Ordering};

	static RAN: AtomicUsize = AtomicUsize::new(0);

	fn bump(_thread: ThreadId) {
		RAN.fetch_add(1, Ordering::Relaxed);
	}

	#[test]
	fn kernel_apc_runs_when_not_disabled() {
		let t = scheduler::create_thread(ProcessId(0), 1);
		queue_kernel_apc(t, bump);
		let before = RAN.load(Ordering::Relaxed);
		deliver_kernel_apcs(t);
		assert_eq!(RAN.load(Ordering::Relaxed), before + 1);
	}

	#[test]
	fn kernel_apc_withheld_while_disabled() {
		let t = scheduler::create_thread(ProcessId(0), 1);
		enter_critical_region(t);
		queue_kernel_apc(t, bump);
		let before = RAN.load(Ordering::Relaxed);
		deliver_kernel_apcs(t);
		assert_eq!(RAN.load(Ordering::Relaxed), before);
		leave_critical_region(t);
		deliver_kernel_apcs(t);
		assert_eq!(RAN.load(Ordering::Relaxed), before + 1);
	}
}
