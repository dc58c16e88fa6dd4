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

//! `OSWaitForSingleObject`/`OSWaitForMultipleObjects`/`OSSleep` (spec 6),
//! layered directly on [`crate::ke::wait`] with the installed interval
//! timer standing in for "now" (spec 4.3's deadline is always expressed
//! in ticks since boot).

use super::sync::resolve_waitable;
use crate::hal::timer;
use crate::ke::dispatch::WaitType;
use crate::ke::process::ProcessId;
use crate::ke::thread::ThreadId;
use crate::ke::wait;
use crate::ob::handle::Handle;
use crate::status::{EResult, RawStatus};

fn deadline(timeout_ticks: Option<u64>) -> Option<u64> {
	timeout_ticks.map(|t| timer::now_ticks() + t)
}

/// Waits on a single handle. `timeout_ticks` of `None` waits forever.
pub fn wait_for_single_object(process: ProcessId, thread: ThreadId, handle: Handle, alertable: bool, timeout_ticks: Option<u64>) -> EResult<RawStatus> {
	let object = resolve_waitable(process, handle)?;
	Ok(wait::wait_for_single_object(thread, &*object, alertable, deadline(timeout_ticks), timer::now_ticks))
}

/// Waits on a set of handles, either for any one or all of them to be
/// signalled.
pub fn wait_for_multiple_objects(process: ProcessId, thread: ThreadId, handles: &[Handle], wait_type: WaitType, alertable: bool, timeout_ticks: Option<u64>) -> EResult<RawStatus> {
	let objects: alloc::vec::Vec<_> = handles.iter().map(|&h| resolve_waitable(process, h)).collect::<EResult<_>>()?;
	let refs: alloc::vec::Vec<&dyn wait::Waitable> = objects.iter().map(|o| &**o).collect();
	Ok(wait::wait_for_multiple_objects(thread, &refs, wait_type, alertable, deadline(timeout_ticks), timer::now_ticks))
}

/// `OSSleep`: waits for `ticks` to pass with nothing to wake early on — a
/// degenerate `WaitForMultipleObjects` over an empty set, timing out once
/// the deadline passes (spec 4.3's timeout path, minus any object to watch).
pub fn sleep(thread: ThreadId, ticks: u64) -> RawStatus {
	wait::wait_for_multiple_objects(thread, &[], WaitType::Any, false, deadline(Some(ticks)), timer::now_ticks)
}
