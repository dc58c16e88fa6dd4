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

//! `OSCreateThread`/`OSTerminateThread`/`OSExitThread` (spec 6).

use super::object;
use crate::ke::process::ProcessId;
use crate::ke::scheduler;
use crate::ke::thread::ThreadId;
use crate::ob::api::{self, OpenFlags};
use crate::ob::handle::Handle;
use crate::ob::object::ObjectFlags;
use crate::status::{EResult, Status};

/// `PsCreateSystemThread`-equivalent: spins up a new, `Ready`-state thread
/// owned by `process` at `priority`, wraps it as an object, and installs a
/// handle for it in `process`'s own table. Does not place the thread on
/// any CPU's ready queue yet — the caller does that (after, e.g., setting
/// up its initial register state, which is architecture-specific and out
/// of this crate's scope) via [`crate::ke::scheduler::enqueue_ready`].
pub fn create_thread(process: ProcessId, priority: u8) -> EResult<Handle> {
	let tid = scheduler::create_thread(process, priority);
	crate::ke::process::with_process(process, |p| p.threads.push(tid));
	let obj = api::create_object(object::thread_type(), None, None, ObjectFlags::NO_DIRECTORY, tid)?;
	let handle = api::insert_object_create(process, obj, OpenFlags::empty());
	if handle.is_err() {
		crate::ob::object::dereference(obj);
	}
	handle
}

fn resolve(process: ProcessId, handle: Handle) -> EResult<ThreadId> {
	let obj = api::reference_object_by_handle(process, handle, Some(object::thread_type()))?;
	let tid = crate::ob::object::with_object(obj, |_, body| *body.as_other().and_then(|b| b.downcast_ref::<ThreadId>()).expect("thread object"));
	crate::ob::object::dereference(obj);
	Ok(tid)
}

/// `PsTerminateThread`: marks the thread terminated and signals its
/// dispatch header so any joiner wakes (spec 4.3).
pub fn terminate_thread(process: ProcessId, handle: Handle) -> EResult<()> {
	let tid = resolve(process, handle)?;
	scheduler::terminate(tid);
	Ok(())
}

/// `OSExitThread`: the calling thread terminates itself. Never returns on
/// success since there is nothing left to return to; callers that do get
/// a `Status` back hit a genuine validation failure before the exit ran.
pub fn exit_thread(thread: ThreadId, exit_status: i32) -> Status {
	let _ = exit_status;
	scheduler::terminate(thread);
	Status::Success
}
