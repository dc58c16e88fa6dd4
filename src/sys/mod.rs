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

//! System-call surface: the `OS*` entry points spec section 6 describes,
//! layered directly on `ke`/`mm`/`ob`/`io` with no machinery of its own —
//! each function here validates its handles and arguments, then calls
//! straight through to the subsystem that actually does the work. A real
//! user-mode entry trap would decode arguments out of a syscall frame and
//! call one of these; that trampoline is architecture-specific and out of
//! this crate's scope (spec section 1).

pub mod file;
pub mod info;
pub mod memory;
pub mod object;
pub mod process;
pub mod sync;
pub mod thread;
pub mod wait;

pub use info::{current_process_id, current_thread_id};

/// A caller-supplied handle value meaning "the calling thread's own
/// process" (spec 6's object-attributes block), so a caller never has to
/// open a handle to itself first.
pub const CURRENT_PROCESS_HANDLE: crate::ob::Handle = crate::ob::Handle(u64::MAX);
/// Same, for "the calling thread".
pub const CURRENT_THREAD_HANDLE: crate::ob::Handle = crate::ob::Handle(u64::MAX - 1);

/// The object-attributes block every `OSCreate*`/`OSOpen*` call accepts
/// (spec 6): an optional name to publish the object under (relative to
/// `root`, or the global root directory if `root` is `None`), and whether
/// handles to it are inherited by a child process created with
/// `inherit-handles` set.
pub struct ObjectAttributes<'a> {
	pub name: Option<&'a str>,
	pub root: Option<crate::ob::Handle>,
	pub inherit: bool,
}

impl<'a> ObjectAttributes<'a> {
	pub const fn none() -> Self {
		ObjectAttributes { name: None, root: None, inherit: false }
	}
}

/// Brings up the object types the system-call layer needs on top of
/// `ob::init`'s bootstrap types. Called once from `start_up`.
pub fn init() {
	object::ensure_types();
}
