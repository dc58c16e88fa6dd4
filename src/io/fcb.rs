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

//! File control blocks (spec 3, "FCB... Holds dispatch table, CCB,
//! read/write-lock, view-cache..., file length, file type, and a
//! driver-supplied extension. Created by a file-system driver, destroyed
//! when its last reference drops.").
//!
//! Unlike objects and threads, which live in a global arena keyed by an
//! opaque id (there is no safe way to recover a header from a body
//! pointer the way the original's `OBJECT_GET_HEADER` does), an FCB's
//! lifetime is explicitly single-owner-counted in the spec itself — "the
//! last reference drops" is `Arc`'s own vocabulary. So an `Fcb` is handed
//! out as `Arc<Fcb>` rather than registered anywhere; [`FcbId`] exists
//! only so debug logging and the view cache (which is keyed by CCB id,
//! not FCB id) have something stable to print.

use super::dispatch::DispatchTable;
use crate::mm::cache::{CcbId, CCB_TABLE};
use crate::mm::pfn::PFN_DB;
use crate::sync::rwlock::RwLock;
use alloc::boxed::Box;
use core::any::Any;
use core::sync::atomic::{AtomicU64, Ordering};

pub type FcbId = u64;

static NEXT_FCB_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> FcbId {
	NEXT_FCB_ID.fetch_add(1, Ordering::Relaxed)
}

/// What kind of thing this FCB represents. Drives default handling
/// (pipes are never `directly-mappable`; directories never `read`).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FcbType {
	Regular,
	Device,
	Pipe,
	Directory,
}

/// A file control block. `dispatch` is the second of the three allowed
/// dynamic-dispatch points (spec 9): a small fn-pointer table the owning
/// driver installs once at creation, exactly mirroring how
/// [`crate::ob::types::ObjectTypeOps`] hangs off an object's type.
pub struct Fcb {
	id: FcbId,
	pub dispatch: &'static DispatchTable,
	pub file_type: FcbType,
	ccb: Option<CcbId>,
	length: RwLock<u64>,
	extension: Box<dyn Any + Send + Sync>,
}

impl Fcb {
	/// Builds a new FCB. `ccb` is `Some` only for FCBs that participate in
	/// the page cache (spec 4.9's "directly-mappable" flag implies a CCB);
	/// a pipe or a character device has none.
	pub fn new(dispatch: &'static DispatchTable, file_type: FcbType, ccb: Option<CcbId>, length: u64, extension: Box<dyn Any + Send + Sync>) -> Fcb {
		Fcb {
			id: next_id(),
			dispatch,
			file_type,
			ccb,
			length: RwLock::new(length),
			extension,
		}
	}

	pub fn id(&self) -> FcbId {
		self.id
	}

	pub fn ccb(&self) -> Option<CcbId> {
		self.ccb
	}

	/// Current file length. Readers only need this held shared; resizing
	/// (spec 5's resource table: "FCB contents (size) | FCB rw-lock |
	/// Resize | Read/Write") needs it exclusive.
	pub fn length(&self) -> u64 {
		*self.length.read()
	}

	/// Grows or shrinks the file, taking the rw-lock exclusive as the
	/// resource table requires.
	pub fn set_length(&self, new_length: u64) {
		*self.length.write() = new_length;
	}

	/// Downcasts the driver-supplied extension (the pipe's ring buffer,
	/// say) to its concrete type.
	pub fn extension<T: 'static>(&self) -> Option<&T> {
		self.extension.downcast_ref::<T>()
	}
}

impl Drop for Fcb {
	/// "Destroyed when its last reference drops" (spec 3): runs the
	/// dispatch table's `dereference` hook, if any, then tears down the
	/// backing CCB so its cached pages return to the PFN database.
	fn drop(&mut self) {
		if let Some(dereference) = self.dispatch.dereference {
			dereference(self);
		}
		if let Some(ccb_id) = self.ccb {
			let mut ccbs = CCB_TABLE.lock();
			let mut pfn_guard = PFN_DB.lock();
			if let Some(pfn_db) = pfn_guard.as_mut() {
				ccbs.destroy(ccb_id, pfn_db);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use super::super::dispatch::DispatchTable;

	static EMPTY: DispatchTable = DispatchTable::empty();

	#[test]
	fn length_round_trips_through_resize() {
		let fcb = Fcb::new(&EMPTY, FcbType::Regular, None, 0, Box::new(()));
		assert_eq!(fcb.length(), 0);
		fcb.set_length(4096);
		assert_eq!(fcb.length(), 4096);
	}

	#[test]
	fn extension_downcasts_to_concrete_driver_state() {
		let fcb = Fcb::new(&EMPTY, FcbType::Device, None, 0, Box::new(42u32));
		assert_eq!(fcb.extension::<u32>(), Some(&42));
		assert_eq!(fcb.extension::<u64>(), None);
	}
}
