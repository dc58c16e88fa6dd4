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

//! Directory-path resolution (spec 4.4, "Directory lookup"), grounded in
//! `ob/api.c`'s `ObReferenceObjectByName` and `ob/link.c`'s parse
//! re-entry.

use super::object::{self, ObjectId, ObjectTypeId};
use crate::status::{EResult, Status};
use alloc::string::{String, ToString};
use alloc::vec::Vec;

pub const PATH_SEPARATOR: char = '/';
const MAX_LOOP_COUNT: u32 = 32;

use crate::sync::spin::IntSpin;

static ROOT_DIRECTORY: IntSpin<Option<ObjectId>> = IntSpin::new(None);

/// Installs the global root directory. Called once from `start_up`.
pub fn set_root_directory(id: ObjectId) {
	*ROOT_DIRECTORY.lock() = Some(id);
}

pub fn root_directory() -> ObjectId {
	ROOT_DIRECTORY.lock().expect("root directory not initialised")
}

/// `ObReferenceObjectByName`: walks `path` segment by segment starting
/// either at `initial` or, if `initial` is `None` and `path` begins with
/// the separator, at the global root directory (spec 4.4 step 1). Returns
/// a new reference to the final object — the caller owns it and must
/// eventually dereference.
pub fn reference_object_by_name(path: &str, initial: Option<ObjectId>, expected_type: Option<ObjectTypeId>, loop_count: u32) -> EResult<ObjectId> {
	if loop_count > MAX_LOOP_COUNT {
		return Err(Status::LoopTooDeep);
	}

	let absolute = path.starts_with(PATH_SEPARATOR);
	let mut current = match (initial, absolute) {
		(Some(obj), _) => obj,
		(None, true) => root_directory(),
		(None, false) => return Err(Status::PathInvalid),
	};
	object::add_reference(current);

	let mut remaining: String = path.trim_start_matches(PATH_SEPARATOR).to_string();

	while !remaining.is_empty() {
		let (segment, rest) = match remaining.split_once(PATH_SEPARATOR) {
			Some((a, b)) => (a.to_string(), b.to_string()),
			None => (core::mem::take(&mut remaining), String::new()),
		};
		if segment.is_empty() {
			remaining = rest;
			continue;
		}

		let Some(child) = super::directory::lookup_child(current, &segment) else {
			object::dereference(current);
			return Err(Status::NameNotFound);
		};
		object::add_reference(child);
		object::dereference(current);
		current = child;

		let ty = object::object_type_of(current);
		let parse_fn = object::with_object(ty, |_, body| body.as_type().and_then(|t| t.ops.parse));

		if let Some(parse_fn) = parse_fn {
			match parse_fn(current, &rest, loop_count) {
				Ok(outcome) => {
					object::add_reference(outcome.object);
					object::dereference(current);
					current = outcome.object;
					remaining = outcome.remaining_path;
				}
				Err(err) => {
					object::dereference(current);
					return Err(err);
				}
			}
		} else {
			remaining = rest;
		}
	}

	if let Some(expected) = expected_type {
		if object::object_type_of(current) != expected {
			object::dereference(current);
			return Err(Status::TypeMismatch);
		}
	}

	Ok(current)
}

/// Splits `path` into its non-empty components, for callers (directory
/// listing, link target validation) that want the segments without
/// walking them.
pub fn split_path(path: &str) -> Vec<&str> {
	path.split(PATH_SEPARATOR).filter(|s| !s.is_empty()).collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ob::directory;

	fn fresh_root() -> ObjectId {
		super::super::types::ensure_basic_types();
		let root = directory::create_directory(Some(String::from("Root")), None).unwrap();
		set_root_directory(root);
		root
	}

	#[test]
	fn resolves_nested_path_from_root() {
		let root = fresh_root();
		let sub = directory::create_directory(Some(String::from("lib")), Some(root)).unwrap();
		let found = reference_object_by_name("/lib", None, None, 0).unwrap();
		assert_eq!(found, sub);
		object::dereference(found);
	}

	#[test]
	fn missing_segment_is_name_not_found() {
		fresh_root();
		assert_eq!(reference_object_by_name("/nope", None, None, 0), Err(Status::NameNotFound));
	}

	#[test]
	fn relative_lookup_without_initial_is_rejected() {
		fresh_root();
		assert_eq!(reference_object_by_name("nope", None, None, 0), Err(Status::PathInvalid));
	}
}
