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

//! `OSGetCurrentProcessId`/`OSGetCurrentThreadId` (SPEC_FULL.md's addendum
//! to spec 6's system-call surface): the two accessors nearly every other
//! `OS*` call needs, so they are reached through the scheduler's own
//! bookkeeping rather than a separate "current" pointer the way a real
//! per-CPU control block would carry one.

use crate::hal::cpu;
use crate::ke::percpu;
use crate::ke::process::ProcessId;
use crate::ke::scheduler;
use crate::ke::thread::ThreadId;

/// The thread currently running on the calling CPU. `None` before the
/// scheduler has picked anything for this CPU to run (very early bring-up).
pub fn current_thread_id() -> Option<ThreadId> {
	percpu::with_cpu(cpu::cpu_id(), |pcpu| pcpu.running)
}

/// The process owning [`current_thread_id`]'s thread.
pub fn current_process_id() -> Option<ProcessId> {
	current_thread_id().map(|tid| scheduler::with_thread(tid, |t| t.process))
}
