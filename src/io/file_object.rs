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

//! File objects: the per-open-handle state layered on top of a shared
//! [`Fcb`] (spec 3/4.4 — what a handle to an open file actually refers
//! to). Two handles opened against the same path get two `FileObject`s,
//! each with its own cursor, both pointing at the one `Fcb` the driver
//! created; this is the same "handle is a private view, object is
//! shared" split [`crate::ob::handle`] draws between a `Handle` and the
//! `ObjectId` it resolves to.
//!
//! A `FileObject` is wrapped as `ob::ObjectBody::Other` so it rides the
//! same handle-table/reference-counting machinery every other object
//! uses; `ob::api::create_object` is the intended call site.

use super::dispatch::{IoInformation, IoStatusBlock, RwFlags};
use super::fcb::Fcb;
use crate::status::Status;
use crate::sync::mutex::Mutex;
use alloc::sync::Arc;

/// A single open instance of an [`Fcb`]: its own seek position and the
/// flags it was opened with, shared ownership of the FCB underneath.
pub struct FileObject {
	pub fcb: Arc<Fcb>,
	offset: Mutex<u64>,
	pub flags: RwFlags,
}

impl FileObject {
	pub fn new(fcb: Arc<Fcb>, flags: RwFlags) -> FileObject {
		FileObject { fcb, offset: Mutex::new(0), flags }
	}

	pub fn offset(&self) -> u64 {
		*self.offset.lock()
	}

	/// Repositions the cursor. The dispatch table's `seekable` slot gates
	/// this the way the original refuses `SetFilePointer` on a pipe.
	pub fn seek(&self, new_offset: u64) -> Status {
		if let Some(seekable) = self.fcb.dispatch.seekable {
			if !seekable(&self.fcb) {
				return Status::UnsupportedFunction;
			}
		}
		*self.offset.lock() = new_offset;
		Status::Success
	}

	/// Reads through the FCB's dispatch table at the current offset,
	/// advancing it by however many bytes were transferred.
	pub fn read(&self, buf: &mut [u8]) -> IoStatusBlock {
		let Some(read_fn) = self.fcb.dispatch.read else {
			return IoStatusBlock::failed(Status::UnsupportedFunction);
		};
		let offset = self.offset();
		let result = read_fn(&self.fcb, offset, buf, self.flags);
		if let IoInformation::BytesTransferred(n) = result.information {
			*self.offset.lock() = offset + n;
		}
		result
	}

	/// Writes through the FCB's dispatch table at the current offset,
	/// advancing it by however many bytes were transferred. File
	/// expansion past the current length is the driver's job (it calls
	/// back into `Fcb::set_length` under its own rw-lock discipline).
	pub fn write(&self, buf: &[u8]) -> IoStatusBlock {
		let Some(write_fn) = self.fcb.dispatch.write else {
			return IoStatusBlock::failed(Status::UnsupportedFunction);
		};
		let offset = self.offset();
		let result = write_fn(&self.fcb, offset, buf, self.flags);
		if let IoInformation::BytesTransferred(n) = result.information {
			*self.offset.lock() = offset + n;
		}
		result
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use super::super::dispatch::DispatchTable;
	use super::super::fcb::FcbType;
	use alloc::boxed::Box;

	fn fake_read(_fcb: &Fcb, offset: u64, buf: &mut [u8], _flags: RwFlags) -> IoStatusBlock {
		for (i, byte) in buf.iter_mut().enumerate() {
			*byte = (offset as usize + i) as u8;
		}
		IoStatusBlock::ok(IoInformation::BytesTransferred(buf.len() as u64))
	}

	static TABLE: DispatchTable = DispatchTable { read: Some(fake_read), ..DispatchTable::empty() };

	#[test]
	fn read_advances_the_cursor() {
		let fcb = Arc::new(Fcb::new(&TABLE, FcbType::Regular, None, 4096, Box::new(())));
		let file = FileObject::new(fcb, RwFlags::empty());
		let mut buf = [0u8; 4];
		file.read(&mut buf);
		assert_eq!(file.offset(), 4);
		let mut buf2 = [0u8; 4];
		file.read(&mut buf2);
		assert_eq!(buf2, [4, 5, 6, 7]);
	}

	#[test]
	fn write_without_a_dispatch_slot_is_unsupported() {
		static EMPTY: DispatchTable = DispatchTable::empty();
		let fcb = Arc::new(Fcb::new(&EMPTY, FcbType::Device, None, 0, Box::new(())));
		let file = FileObject::new(fcb, RwFlags::empty());
		let result = file.write(&[1, 2, 3]);
		assert_eq!(result.status, Status::UnsupportedFunction);
	}
}
