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

//! The object manager's public surface: object creation, handle
//! insertion/close, and handle-table duplication (spec 4.4, "Handles"),
//! grounded in `ob/api.c` and `ob/handle.c`.

use super::handle::{Handle, HandleTable};
use super::object::{self, ObjectBody, ObjectFlags, ObjectId, ObjectTypeId, OpenReason};
use crate::ke::process::ProcessId;
use crate::status::{EResult, SResult, Status};
use crate::sync::spin::IntSpin;
use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::String;
use core::any::Any;

bitflags::bitflags! {
	/// Flags accepted by [`insert_object`]/[`open_object_by_name`] (spec
	/// 4.4: "InsertObject(object, out-handle, flags)").
	#[derive(Clone, Copy, PartialEq, Eq, Debug)]
	pub struct OpenFlags: u32 {
		/// The handle should be inherited by a child process created with
		/// `inherit-handles` set.
		const INHERIT = 1 << 0;
	}
}

static HANDLE_TABLES: IntSpin<BTreeMap<ProcessId, HandleTable>> = IntSpin::new_lazy(BTreeMap::new);

/// Default handle-table sizing: small initial allocation, doubling growth,
/// no hard limit. Matches the original's typical per-process call to
/// `ExCreateHandleTable`.
const INITIAL_CAPACITY: usize = 16;
const GROW_BY: usize = 16;

/// Creates an empty handle table for a freshly created process. Called
/// once from process creation.
pub fn create_handle_table(process: ProcessId) {
	HANDLE_TABLES.lock().insert(process, HandleTable::new(INITIAL_CAPACITY, GROW_BY, 0));
}

fn type_close_and_open(object: ObjectId) -> (Option<super::object::CloseFn>, Option<super::object::OpenFn>, bool) {
	let ty = object::object_type_of(object);
	object::with_object(ty, |_, body| {
		body.as_type().map(|t| (t.ops.close, t.ops.open, true)).unwrap_or((None, None, false))
	})
}

/// `ObpInsertObject` / `ObInsertObject`: adds a pointer reference for the
/// handle, allocates a slot, and invokes the type's `Open` callback.
pub fn insert_object(process: ProcessId, object: ObjectId, flags: OpenFlags, reason: OpenReason) -> EResult<Handle> {
	object::add_reference(object);

	let handle = {
		let mut tables = HANDLE_TABLES.lock();
		let table = tables.get_mut(&process).expect("process has no handle table");
		match table.create(object, flags.contains(OpenFlags::INHERIT)) {
			Ok(h) => h,
			Err(e) => {
				object::dereference(object);
				return Err(e);
			}
		}
	};

	let handle_count = object::with_object_mut(object, |h, _| {
		h.handle_count += 1;
		h.handle_count
	});
	let (_, open_fn, _) = type_close_and_open(object);
	if let Some(open_fn) = open_fn {
		open_fn(object, handle_count, reason);
	}
	Ok(handle)
}

pub fn insert_object_create(process: ProcessId, object: ObjectId, flags: OpenFlags) -> EResult<Handle> {
	insert_object(process, object, flags, OpenReason::CreateHandle)
}

/// `ObClose`: runs the type's `Close` callback then drops the handle's
/// reference.
pub fn close(process: ProcessId, handle: Handle) -> SResult {
	let object = {
		let mut tables = HANDLE_TABLES.lock();
		let table = tables.get_mut(&process).expect("process has no handle table");
		let object = table.lookup(handle)?;
		table.delete(handle, |_| true)?;
		object
	};
	let (close_fn, _, _) = type_close_and_open(object);
	let last_handle_count = object::with_object_mut(object, |h, _| {
		h.handle_count -= 1;
		h.handle_count as i32
	});
	if let Some(close_fn) = close_fn {
		close_fn(object, last_handle_count);
	}
	object::dereference(object);
	Ok(())
}

/// `ObReferenceObjectByHandle`: validates and resolves `handle`, taking a
/// fresh pointer reference to the object it names.
pub fn reference_object_by_handle(process: ProcessId, handle: Handle, expected_type: Option<ObjectTypeId>) -> EResult<ObjectId> {
	let object = {
		let tables = HANDLE_TABLES.lock();
		let table = tables.get(&process).expect("process has no handle table");
		table.lookup(handle)?
	};
	if let Some(expected) = expected_type {
		if object::object_type_of(object) != expected {
			return Err(Status::TypeMismatch);
		}
	}
	object::add_reference(object);
	Ok(object)
}

/// `ObOpenObjectByName`: resolves a path (optionally relative to an
/// already-open handle) and installs a fresh handle for it.
pub fn open_object_by_name(process: ProcessId, path: &str, root: Option<Handle>, flags: OpenFlags, expected_type: Option<ObjectTypeId>) -> EResult<Handle> {
	let initial = match root {
		Some(h) => Some(reference_object_by_handle(process, h, None)?),
		None => None,
	};
	let found = super::lookup::reference_object_by_name(path, initial, expected_type, 0);
	if let Some(initial) = initial {
		object::dereference(initial);
	}
	let found = found?;
	let handle = insert_object(process, found, flags, OpenReason::OpenHandle);
	object::dereference(found);
	handle
}

/// `ObDuplicateHandleTable`: builds a new table the same shape as the
/// source and calls `duplicate` on every live slot — inherited or not —
/// passing along the slot's inherit flag so the callback, not this table,
/// decides whether a non-inherited handle is dropped (spec 4.4:
/// "invokes a caller callback per live slot so new handles can be
/// filtered out or cloned"; `ExDuplicateHandleTable`,
/// `source/ex/handtab.c:534-547`, calls `DuplicateMethod` on every
/// non-null slot unconditionally). Returning `None` filters the slot out
/// of the new table, mirroring `EX_DUPLICATE_HANDLE_METHOD` returning a
/// null pointer.
pub fn duplicate_handle_table(source: ProcessId, dest: ProcessId, mut duplicate: impl FnMut(ObjectId, bool) -> Option<ObjectId>) {
	let entries: alloc::vec::Vec<(Handle, ObjectId, bool)> = {
		let tables = HANDLE_TABLES.lock();
		tables.get(&source).expect("process has no handle table").iter().collect()
	};
	let mut new_table = HandleTable::new(INITIAL_CAPACITY, GROW_BY, 0);
	for (_, object, inherit) in entries {
		if let Some(cloned) = duplicate(object, inherit) {
			object::add_reference(cloned);
			let _ = new_table.create(cloned, inherit);
		}
	}
	HANDLE_TABLES.lock().insert(dest, new_table);
}

/// Destroys a process's handle table, closing every handle it still
/// holds (`ExKillHandleTable`, driven through [`close`]'s bookkeeping so
/// every object's `Close` callback and dereference still run).
pub fn kill_handle_table(process: ProcessId) {
	let mut table = match HANDLE_TABLES.lock().remove(&process) {
		Some(t) => t,
		None => return,
	};
	table.kill_all(|object| {
		let (close_fn, _, _) = type_close_and_open(object);
		let last_handle_count = object::with_object_mut(object, |h, _| {
			h.handle_count = h.handle_count.saturating_sub(1);
			h.handle_count as i32
		});
		if let Some(close_fn) = close_fn {
			close_fn(object, last_handle_count);
		}
		object::dereference(object);
	});
}

/// Convenience wrapper over [`object::create_object`] for callers outside
/// `ob::` that just want to mint a new object body and don't need to
/// reach into the `ObjectBody` enum themselves.
pub fn create_object<T: Any + Send + Sync>(object_type: ObjectTypeId, name: Option<String>, parent: Option<ObjectId>, flags: ObjectFlags, body: T) -> EResult<ObjectId> {
	object::create_object(object_type, name, parent, flags, ObjectBody::Other(Box::new(body)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ob::types;
	use core::sync::atomic::{AtomicU64, Ordering};

	static NEXT_TEST_PID: AtomicU64 = AtomicU64::new(1);

	fn fresh_process() -> ProcessId {
		types::ensure_basic_types();
		let pid = ProcessId(NEXT_TEST_PID.fetch_add(1, Ordering::Relaxed));
		create_handle_table(pid);
		pid
	}

	#[test]
	fn insert_reference_close_roundtrip() {
		let pid = fresh_process();
		let ty = types::object_type_type_id();
		let obj = create_object(ty, None, None, ObjectFlags::NO_DIRECTORY, 1u32).unwrap();
		let handle = insert_object_create(pid, obj, OpenFlags::empty()).unwrap();
		let referenced = reference_object_by_handle(pid, handle, None).unwrap();
		assert_eq!(referenced, obj);
		object::dereference(referenced);
		close(pid, handle).unwrap();
		assert_eq!(reference_object_by_handle(pid, handle, None), Err(Status::InvalidHandle));
		object::dereference(obj);
	}

	#[test]
	fn duplicate_clones_an_inherited_handle_when_the_callback_accepts_it() {
		let src = fresh_process();
		let dst = ProcessId(NEXT_TEST_PID.fetch_add(1, Ordering::Relaxed));
		create_handle_table(dst);
		let ty = types::object_type_type_id();
		let obj = create_object(ty, None, None, ObjectFlags::NO_DIRECTORY, 1u32).unwrap();
		let h = insert_object_create(src, obj, OpenFlags::INHERIT).unwrap();
		duplicate_handle_table(src, dst, |o, _inherit| Some(o));
		assert!(reference_object_by_handle(dst, h, None).is_ok());
		object::dereference(obj);
	}

	#[test]
	fn duplicate_invokes_the_callback_for_every_live_slot_inherited_or_not() {
		let src = fresh_process();
		let dst = ProcessId(NEXT_TEST_PID.fetch_add(1, Ordering::Relaxed));
		create_handle_table(dst);
		let ty = types::object_type_type_id();
		let inherited = create_object(ty, None, None, ObjectFlags::NO_DIRECTORY, 1u32).unwrap();
		let not_inherited = create_object(ty, None, None, ObjectFlags::NO_DIRECTORY, 2u32).unwrap();
		let h_inherited = insert_object_create(src, inherited, OpenFlags::INHERIT).unwrap();
		let h_not_inherited = insert_object_create(src, not_inherited, OpenFlags::empty()).unwrap();

		let mut seen = alloc::vec::Vec::new();
		duplicate_handle_table(src, dst, |o, inherit| {
			seen.push((o, inherit));
			// The callback, not the table, decides: keep only inherited slots.
			if inherit { Some(o) } else { None }
		});
		// Both slots were offered to the callback, including the non-inherited one.
		assert_eq!(seen.len(), 2);
		assert!(seen.contains(&(inherited, true)));
		assert!(seen.contains(&(not_inherited, false)));

		let _ = h_not_inherited;
		assert!(reference_object_by_handle(dst, h_inherited, None).is_ok());
		object::dereference(inherited);
		object::dereference(not_inherited);
	}
}
