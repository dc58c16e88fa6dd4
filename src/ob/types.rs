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

//! Object types (spec 3, "Object type. Itself an object. Holds a small
//! virtual table... valid-access mask, non-paged-pool flag, and a running
//! object count"), grounded in `ob/type.c`.
//!
//! `ObpInitializeBasicTypes` bootstraps three types before anything else
//! can be created: the "Type" type (which must describe itself),
//! "Directory", and "SymbolicLink". [`ensure_basic_types`] is the Rust
//! equivalent, safe to call repeatedly (idempotent) since every other
//! piece of `ob::` depends on it having run.

use super::object::{self, DebugFn, DeleteFn, DuplicateFn, ObjectBody, ObjectFlags, ObjectId, OpenFn, ParseFn, SecureFn};
use alloc::string::String;
use core::sync::atomic::{AtomicU64, Ordering};

/// The virtual table `OBJECT_TYPE_INFO` describes: every slot is optional
/// since most types only implement a handful (spec: "open/close/delete/
/// parse/duplicate/debug/secure").
#[derive(Clone, Copy, Default)]
pub struct ObjectTypeOps {
	pub open: Option<OpenFn>,
	pub close: Option<CloseFnSlot>,
	pub delete: Option<DeleteFn>,
	pub parse: Option<ParseFn>,
	pub duplicate: Option<DuplicateFn>,
	pub secure: Option<SecureFn>,
	pub debug: Option<DebugFn>,
}

// `CloseFn` takes an `i32`, unlike the other slots; aliased here only so
// `ObjectTypeOps`'s `#[derive(Default)]` has a concrete, nameable type.
pub type CloseFnSlot = super::object::CloseFn;

pub struct ObjectType {
	pub name: String,
	pub ops: ObjectTypeOps,
	pub valid_access_mask: u32,
	pub nonpaged_pool: bool,
	pub total_object_count: u64,
}

/// Creates a new object type, itself stored as an object of `of_type`
/// (itself, during bootstrap — mirroring `ObCreateObjectType`'s "the
/// first ever object type created MUST be the ObjectType object type").
fn create_object_type(of_type: ObjectId, name: &str, ops: ObjectTypeOps, nonpaged_pool: bool) -> ObjectId {
	let body = ObjectBody::Type(ObjectType {
		name: String::from(name),
		ops,
		valid_access_mask: 0,
		nonpaged_pool,
		total_object_count: 0,
	});
	object::create_object(of_type, Some(String::from(name)), None, ObjectFlags::KERNEL | ObjectFlags::PERMANENT | ObjectFlags::NO_DIRECTORY, body)
		.expect("bootstrap object type creation cannot fail")
}

static TYPE_TYPE_ID: AtomicU64 = AtomicU64::new(0);
static DIRECTORY_TYPE_ID: AtomicU64 = AtomicU64::new(0);
static SYMLINK_TYPE_ID: AtomicU64 = AtomicU64::new(0);

pub fn object_type_type_id() -> ObjectId {
	ObjectId(TYPE_TYPE_ID.load(Ordering::Relaxed))
}

pub fn directory_type_id() -> ObjectId {
	ObjectId(DIRECTORY_TYPE_ID.load(Ordering::Relaxed))
}

pub fn symbolic_link_type_id() -> ObjectId {
	ObjectId(SYMLINK_TYPE_ID.load(Ordering::Relaxed))
}

/// Brings up the three built-in object types if they don't exist yet.
/// Idempotent: every test and every real boot path calls this before
/// touching anything else in `ob::`.
pub fn ensure_basic_types() {
	if TYPE_TYPE_ID.load(Ordering::Relaxed) != 0 {
		return;
	}

	// Placeholder self-reference: the id isn't known until after
	// `create_object` runs, so fix the header up afterwards.
	let type_id = create_object_type(ObjectId(0), "Type", ObjectTypeOps::default(), true);
	object::with_object_mut(type_id, |h, _| h.object_type = type_id);
	TYPE_TYPE_ID.store(type_id.0, Ordering::Relaxed);
	object::with_object_mut(type_id, |_, body| {
		if let Some(t) = body.as_type_mut() {
			t.total_object_count = 1;
		}
	});

	let dir_ops = ObjectTypeOps {
		delete: Some(super::directory::delete_directory),
		..Default::default()
	};
	let dir_id = create_object_type(type_id, "Directory", dir_ops, true);
	DIRECTORY_TYPE_ID.store(dir_id.0, Ordering::Relaxed);

	let link_ops = ObjectTypeOps {
		parse: Some(super::link::parse_symbolic_link),
		delete: Some(super::link::delete_symbolic_link),
		..Default::default()
	};
	let link_id = create_object_type(type_id, "SymbolicLink", link_ops, false);
	SYMLINK_TYPE_ID.store(link_id.0, Ordering::Relaxed);
}

/// Registers a new object type for a subsystem outside `ob::` itself
/// (processes, threads, dispatcher objects, file objects — spec 3's "a
/// handful of built-in types" grows here). Ensures the three bootstrap
/// types exist first, since every type is itself an object of the "Type"
/// type.
pub fn register_type(name: &str, ops: ObjectTypeOps, nonpaged: bool) -> ObjectId {
	ensure_basic_types();
	create_object_type(object_type_type_id(), name, ops, nonpaged)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bootstrap_types_are_distinct_and_self_describing() {
		ensure_basic_types();
		let t = object_type_type_id();
		let d = directory_type_id();
		let s = symbolic_link_type_id();
		assert_ne!(t, d);
		assert_ne!(d, s);
		assert_eq!(object::object_type_of(t), t);
		assert_eq!(object::object_type_of(d), t);
	}
}
