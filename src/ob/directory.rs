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

//! Directory objects: name -> object map, guarded by the shared object
//! registry lock (spec 3, "Directory object... Guards itself with a
//! mutex"), grounded in `ob/dir.c`.
//!
//! The original keys an AA tree by a hash of the name's leading bytes
//! mixed with the parent directory's pointer, resolving collisions by
//! incrementing the key and retrying. [`crate::rtl::hash_dir::HashDir`]
//! is the open-addressing equivalent of that same idea (hash the name,
//! probe on collision), salted by the directory's own [`ObjectId`]
//! instead of its address — `ObjectId` already *is* the stable identity
//! an address played in the original.

use super::object::{self, ObjectId};
use crate::rtl::hash_dir::HashDir;
use crate::status::{SResult, Status};
use alloc::string::String;
use alloc::vec::Vec;

pub struct Directory {
	entries: HashDir<ObjectId>,
}

impl Directory {
	pub fn new(salt: ObjectId) -> Self {
		Directory {
			entries: HashDir::new(salt.0),
		}
	}

	pub fn lookup(&self, name: &str) -> Option<ObjectId> {
		self.entries.get(name).copied()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn list(&self) -> Vec<(String, ObjectId)> {
		self.entries.iter().map(|(name, id)| (String::from(name), *id)).collect()
	}
}

/// Links `child` under `parent` by `name` (spec 4.4's `CreateObject`
/// implicitly calling `ObpAddObjectToDirectory`). Rejects a name already
/// in use with `NAME_COLLISION`, matching `ObpInsertObjectIntoDirectory`.
pub fn insert_child(parent: ObjectId, name: &str, child: ObjectId) -> SResult {
	object::with_object_mut(parent, |_, body| {
		let dir = body.as_directory_mut().ok_or(Status::NotADirectory)?;
		if dir.lookup(name).is_some() {
			return Err(Status::NameCollision);
		}
		dir.entries.insert(name, child);
		Ok(())
	})
}

pub fn remove_child(parent: ObjectId, name: &str) -> SResult {
	object::with_object_mut(parent, |_, body| {
		let dir = body.as_directory_mut().ok_or(Status::NotADirectory)?;
		dir.entries.remove(name).map(|_| ()).ok_or(Status::NameNotFound)
	})
}

pub fn lookup_child(parent: ObjectId, name: &str) -> Option<ObjectId> {
	object::with_object(parent, |_, body| body.as_directory().and_then(|d| d.lookup(name)))
}

/// `ObListDirectoryObject`: a snapshot of every live `(name, object)` pair.
pub fn list(directory: ObjectId) -> Vec<(String, ObjectId)> {
	object::with_object(directory, |_, body| body.as_directory().map(Directory::list).unwrap_or_default())
}

/// Creates a fresh, empty directory object (`ObCreateDirectoryObject`).
/// Fails with `NAME_COLLISION` if `parent` already has a child by this
/// name — a recoverable, spec-7 "propagate to the user" condition, not a
/// bug, so it is returned rather than asserted away.
pub fn create_directory(name: Option<String>, parent: Option<ObjectId>) -> crate::status::EResult<ObjectId> {
	super::types::ensure_basic_types();
	let ty = super::types::directory_type_id();
	// The salt is filled in below once the id is known; `ObjectId(0)` never
	// collides with a real id (ids start at 1).
	let id = object::create_object(ty, name, parent, super::object::ObjectFlags::empty(), super::object::ObjectBody::Directory(Directory::new(ObjectId(0))))?;
	object::with_object_mut(id, |_, body| {
		if let Some(dir) = body.as_directory_mut() {
			*dir = Directory::new(id);
		}
	});
	Ok(id)
}

/// Type delete method for directory objects: nothing to free beyond the
/// `HashDir` itself, which drops along with the registry entry.
pub fn delete_directory(_id: ObjectId) {}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn insert_lookup_remove_roundtrip() {
		super::super::types::ensure_basic_types();
		let dir = create_directory(Some(String::from("Test")), None).unwrap();
		let child = ObjectId(999999);
		insert_child(dir, "child", child).unwrap();
		assert_eq!(lookup_child(dir, "child"), Some(child));
		assert_eq!(insert_child(dir, "child", child), Err(Status::NameCollision));
		remove_child(dir, "child").unwrap();
		assert_eq!(lookup_child(dir, "child"), None);
	}

	#[test]
	fn create_directory_reports_name_collision_instead_of_panicking() {
		super::super::types::ensure_basic_types();
		let parent = create_directory(Some(String::from("CollisionParent")), None).unwrap();
		create_directory(Some(String::from("dup")), Some(parent)).unwrap();
		assert_eq!(create_directory(Some(String::from("dup")), Some(parent)), Err(Status::NameCollision));
	}
}
