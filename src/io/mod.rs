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

//! The I/O file-control-block layer (spec 4.10, table row "I/O (Io):
//! FCB, file object, pipe, device object, dispatch-table routing;
//! pluggable drivers").
//!
//! Everything a thread can read, write, or map down here is an FCB: a
//! regular file, a device, or a pipe all look the same from the caller's
//! side, routed through the FCB's dispatch table. The concrete drivers
//! behind that table (the on-disk `ext2fs`, a serial device, a terminal's
//! line discipline) are external collaborators per spec section 1; this
//! module only implements the FCB/file-object/dispatch-table machinery
//! and the one concrete, in-scope dispatch table — the pipe.

pub mod dispatch;
pub mod fcb;
pub mod file_object;
pub mod pipe;

pub use dispatch::{DispatchFlags, DispatchTable, IoInformation, IoStatusBlock, RwFlags};
pub use fcb::{Fcb, FcbId, FcbType};
pub use file_object::FileObject;

use alloc::string::String;

/// Brings up the reserved top-level namespaces spec 6's path grammar
/// names (`Devices`, `InitRoot`, `Mount`). Called once from `start_up`,
/// after `ob::init` has installed the root directory.
pub fn init() {
	let root = crate::ob::root_directory();
	for name in ["Devices", "InitRoot", "Mount"] {
		crate::ob::directory::create_directory(Some(String::from(name)), Some(root))
			.expect("reserved top-level namespace name collision during bootstrap");
	}
}
