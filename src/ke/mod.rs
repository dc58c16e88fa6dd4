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

//! Kernel core: IPL-disciplined synchronisation, dispatcher objects,
//! threads and processes, the scheduler, DPCs, APCs, kernel timers and
//! interrupt objects (spec 4.1-4.3, table row "Kernel Core (Ke)").
//!
//! `crate::sync` supplies the raw spinlocks IPL-raising locks this module
//! is built from; `ke` itself supplies everything that can block a thread
//! instead of spinning.

pub mod apc;
pub mod dispatch;
pub mod dpc;
pub mod interrupt;
pub mod percpu;
pub mod process;
pub mod scheduler;
pub mod sync_objects;
pub mod thread;
pub mod timer;
pub mod wait;

pub use dispatch::{DispatchHeader, WaitType};
pub use process::{Process, ProcessId};
pub use sync_objects::{Event, EventKind, KMutex, Semaphore};
pub use thread::{Thread, ThreadId, ThreadState};

/// Brings up the kernel core: one idle thread and one ready queue per CPU,
/// reporting `cpu_count` logical processors. Called once from `start_up`.
pub fn init() {
	let cpus = crate::hal::cpu::cpu_count();
	percpu::init(cpus);
	scheduler::init(cpus);
}
