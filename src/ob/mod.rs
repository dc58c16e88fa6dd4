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

//! Object manager: object headers, types, directories, symbolic links,
//! and per-process handle tables (spec 4.4, table row "Object Manager
//! (Ob)").
//!
//! Layered above `ke` (a handle table is keyed by
//! [`crate::ke::process::ProcessId`]) and below `io` (file objects are
//! just another [`object::ObjectBody::Other`] payload).

pub mod api;
pub mod directory;
pub mod handle;
pub mod link;
pub mod lookup;
pub mod object;
pub mod types;

pub use api::{close, create_handle_table, insert_object_create, kill_handle_table, open_object_by_name, reference_object_by_handle, OpenFlags};
pub use handle::{Handle, HandleTable, HANDLE_NONE};
pub use lookup::{reference_object_by_name, root_directory, set_root_directory};
pub use object::{ObjectFlags, ObjectId, ObjectTypeId};

/// Brings up the object manager's root directory and built-in types.
/// Called once from `start_up`, before any driver or subsystem creates an
/// object.
pub fn init() {
	types::ensure_basic_types();
	let root = directory::create_directory(None, None).expect("root directory has no parent to collide under");
	lookup::set_root_directory(root);
}
