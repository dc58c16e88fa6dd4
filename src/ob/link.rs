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

//! Symbolic link objects (spec 3, "Symbolic link object. Destination
//! path string; its parse method restarts the lookup at that path"),
//! grounded in `ob/link.c`.

use super::object::{self, ObjectFlags, ObjectId, ParseOutcome};
use crate::status::{EResult, Status};
use alloc::format;
use alloc::string::String;

pub struct SymbolicLink {
	pub dest_path: Option<String>,
}

/// `ObpParseSymbolicLink`: re-enters the lookup at the link's destination
/// with whatever path was still unconsumed appended, letting
/// [`super::lookup::reference_object_by_name`] "swap the directory out
/// from under" the caller transparently.
pub fn parse_symbolic_link(object: ObjectId, remaining_path: &str, loop_count: u32) -> EResult<ParseOutcome> {
	let dest = object::with_object(object, |_, body| body.as_symlink().and_then(|s| s.dest_path.clone()));
	let Some(dest) = dest else {
		return Err(Status::UnassignedLink);
	};
	let full_path = if remaining_path.is_empty() {
		dest
	} else {
		format!("{dest}/{remaining_path}")
	};
	// The lookup that follows this one re-splits `full_path` from scratch,
	// so hand back an empty remainder alongside the resolved object.
	let target = super::lookup::reference_object_by_name(&full_path, None, None, loop_count + 1)?;
	Ok(ParseOutcome {
		object: target,
		remaining_path: String::new(),
	})
}

pub fn delete_symbolic_link(object: ObjectId) {
	object::with_object_mut(object, |_, body| {
		if let Some(link) = match body {
			object::ObjectBody::SymbolicLink(l) => Some(l),
			_ => None,
		} {
			link.dest_path = None;
		}
	});
}

/// `ObCreateSymbolicLinkObject`: resolves the target once (to confirm it
/// exists) before creating the link, exactly as the original does.
pub fn create_symbolic_link(name: Option<String>, parent: Option<ObjectId>, target: &str) -> EResult<ObjectId> {
	let resolved = super::lookup::reference_object_by_name(target, None, None, 0)?;
	object::dereference(resolved);

	super::types::ensure_basic_types();
	let ty = super::types::symbolic_link_type_id();
	let body = object::ObjectBody::SymbolicLink(SymbolicLink {
		dest_path: Some(String::from(target)),
	});
	object::create_object(ty, name, parent, ObjectFlags::empty(), body)
}
