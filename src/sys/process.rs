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

//! `OSCreateProcess`/`OSTerminateProcess` (spec 6).

use super::object;
use crate::hal::page_table::PageMapId;
use crate::ke::process::{self, ProcessId};
use crate::ob::api::{self, OpenFlags};
use crate::ob::handle::Handle;
use crate::ob::object::ObjectFlags;
use crate::status::{EResult, Status};
use crate::sync::spin::IntSpin;

/// The page map every new process's address space is cloned from (spec
/// 4.6: "Kernel half is shared across all page maps"). Installed once
/// during `start_up`.
static KERNEL_PAGE_MAP: IntSpin<Option<PageMapId>> = IntSpin::new(None);

pub fn set_kernel_page_map(map: PageMapId) {
	*KERNEL_PAGE_MAP.lock() = Some(map);
}

/// `PsCreateProcess` + `ObInsertObject`: clones the kernel page map, brings
/// up an address space and handle table for it (`ke::process::create_process`),
/// wraps the new [`ProcessId`] as an object, and installs a handle for it
/// in `creator`'s own table — mirroring every other `OSCreate*` call's
/// "the object exists the instant it's created, the handle just names it
/// for the caller" shape (spec 4.4).
pub fn create_process(creator: ProcessId, cpu_count: usize) -> EResult<Handle> {
	let kernel_map = KERNEL_PAGE_MAP.lock().ok_or(Status::InvalidParameter)?;
	let pt = crate::hal::page_table::backend().ok_or(Status::InvalidParameter)?;
	let page_map = pt.create_page_map(Some(kernel_map))?;
	let pid = process::create_process(page_map, cpu_count);
	let obj = api::create_object(object::process_type(), None, None, ObjectFlags::NO_DIRECTORY, pid)?;
	let handle = api::insert_object_create(creator, obj, OpenFlags::empty());
	if handle.is_err() {
		crate::ob::object::dereference(obj);
	}
	handle
}

/// `PsTerminateProcess`: resolves `handle` to a [`ProcessId`] and tears
/// its threads and handle table down. The process object itself (and its
/// control block) survives until the caller's own reference is released.
pub fn terminate_process(caller: ProcessId, handle: Handle, exit_status: i32) -> EResult<()> {
	let obj = api::reference_object_by_handle(caller, handle, Some(object::process_type()))?;
	let pid = crate::ob::object::with_object(obj, |_, body| *body.as_other().and_then(|b| b.downcast_ref::<ProcessId>()).expect("process object"));
	process::terminate_process(pid, exit_status);
	crate::ob::object::dereference(obj);
	Ok(())
}
