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

//! `OSCreatePipe`/`OSReadFile`/`OSWriteFile`/`OSSetFilePointer`/`OSClose`
//! (spec 6), wrapping [`crate::io::FileObject`] the same way [`super::sync`]
//! wraps dispatcher objects: mint it, install a handle, resolve the handle
//! back to the shared `Arc` on every subsequent call.

use super::object;
use crate::io::dispatch::{IoStatusBlock, RwFlags};
use crate::io::file_object::FileObject;
use crate::io::pipe;
use crate::ke::process::ProcessId;
use crate::ob::api::{self, OpenFlags};
use crate::ob::handle::Handle;
use crate::ob::object::{self as ob_object, ObjectFlags};
use crate::status::{EResult, Status};
use alloc::sync::Arc;

fn resolve(process: ProcessId, handle: Handle) -> EResult<Arc<FileObject>> {
	let obj = api::reference_object_by_handle(process, handle, Some(object::file_type()))?;
	let file = ob_object::with_object(obj, |_, body| body.as_other().and_then(|b| b.downcast_ref::<Arc<FileObject>>()).cloned());
	ob_object::dereference(obj);
	file.ok_or(Status::TypeMismatch)
}

/// `OSCreatePipe`: creates a pipe FCB and wraps one `FileObject` end of it
/// as a handle in `process`'s table (spec 6, spec 8 scenario S3). Returns a
/// single handle; a caller wanting distinct read/write ends opens the FCB
/// twice through `FileObject::new`, each with its own cursor.
pub fn create_pipe(process: ProcessId, buffer_size: usize) -> EResult<Handle> {
	let fcb = pipe::create_pipe(buffer_size);
	let file = Arc::new(FileObject::new(fcb, RwFlags::empty()));
	let obj = api::create_object(object::file_type(), None, None, ObjectFlags::NO_DIRECTORY, file)?;
	let handle = api::insert_object_create(process, obj, OpenFlags::empty());
	if handle.is_err() {
		ob_object::dereference(obj);
	}
	handle
}

pub fn read_file(process: ProcessId, handle: Handle, buf: &mut [u8]) -> EResult<IoStatusBlock> {
	let file = resolve(process, handle)?;
	Ok(file.read(buf))
}

pub fn write_file(process: ProcessId, handle: Handle, buf: &[u8]) -> EResult<IoStatusBlock> {
	let file = resolve(process, handle)?;
	Ok(file.write(buf))
}

pub fn set_file_pointer(process: ProcessId, handle: Handle, offset: u64) -> EResult<()> {
	let file = resolve(process, handle)?;
	match file.seek(offset) {
		Status::Success => Ok(()),
		other => Err(other),
	}
}

/// `OSClose`: releases `handle`, independent of what kind of object it
/// names (spec 4.4's handle close path is uniform across object types).
pub fn close(process: ProcessId, handle: Handle) -> EResult<()> {
	api::close(process, handle)
}
