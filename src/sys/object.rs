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

//! Object-type registration for the kernel objects user-mode reaches
//! through a handle (spec 3): dispatcher objects, processes, threads, and
//! file objects. Plain dispatcher objects and file objects need no `delete`
//! callback — dropping their `Other` payload (an `Arc`) is enough; a
//! process or thread handle instead wraps an id into a registry that lives
//! elsewhere, so their `delete` callbacks tear that registry entry down.

use crate::ke::process::ProcessId;
use crate::ke::thread::ThreadId;
use crate::ob::object::{self, ObjectId, ObjectTypeId};
use crate::ob::types::{self, ObjectTypeOps};
use core::sync::atomic::{AtomicU64, Ordering};

static EVENT_TYPE: AtomicU64 = AtomicU64::new(0);
static SEMAPHORE_TYPE: AtomicU64 = AtomicU64::new(0);
static MUTEX_TYPE: AtomicU64 = AtomicU64::new(0);
static PROCESS_TYPE: AtomicU64 = AtomicU64::new(0);
static THREAD_TYPE: AtomicU64 = AtomicU64::new(0);
static FILE_TYPE: AtomicU64 = AtomicU64::new(0);

fn process_delete(id: ObjectId) {
	let pid = object::with_object(id, |_, body| *body.as_other().and_then(|b| b.downcast_ref::<ProcessId>()).expect("process object holds a ProcessId"));
	crate::ke::process::destroy(pid);
}

fn thread_delete(id: ObjectId) {
	let tid = object::with_object(id, |_, body| *body.as_other().and_then(|b| b.downcast_ref::<ThreadId>()).expect("thread object holds a ThreadId"));
	crate::ke::scheduler::destroy(tid);
}

/// Brings up every object type `sys::` needs on top of `ob::`'s three
/// bootstrap types. Idempotent, called once from `init`.
pub fn ensure_types() {
	if EVENT_TYPE.load(Ordering::Relaxed) != 0 {
		return;
	}
	EVENT_TYPE.store(types::register_type("Event", ObjectTypeOps::default(), false).0, Ordering::Relaxed);
	SEMAPHORE_TYPE.store(types::register_type("Semaphore", ObjectTypeOps::default(), false).0, Ordering::Relaxed);
	MUTEX_TYPE.store(types::register_type("Mutex", ObjectTypeOps::default(), false).0, Ordering::Relaxed);
	FILE_TYPE.store(types::register_type("File", ObjectTypeOps::default(), false).0, Ordering::Relaxed);
	let process_ops = ObjectTypeOps { delete: Some(process_delete), ..Default::default() };
	PROCESS_TYPE.store(types::register_type("Process", process_ops, false).0, Ordering::Relaxed);
	let thread_ops = ObjectTypeOps { delete: Some(thread_delete), ..Default::default() };
	THREAD_TYPE.store(types::register_type("Thread", thread_ops, false).0, Ordering::Relaxed);
}

pub fn event_type() -> ObjectTypeId {
	ObjectId(EVENT_TYPE.load(Ordering::Relaxed))
}

pub fn semaphore_type() -> ObjectTypeId {
	ObjectId(SEMAPHORE_TYPE.load(Ordering::Relaxed))
}

pub fn mutex_type() -> ObjectTypeId {
	ObjectId(MUTEX_TYPE.load(Ordering::Relaxed))
}

pub fn process_type() -> ObjectTypeId {
	ObjectId(PROCESS_TYPE.load(Ordering::Relaxed))
}

pub fn thread_type() -> ObjectTypeId {
	ObjectId(THREAD_TYPE.load(Ordering::Relaxed))
}

pub fn file_type() -> ObjectTypeId {
	ObjectId(FILE_TYPE.load(Ordering::Relaxed))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn types_are_distinct_and_idempotent() {
		ensure_types();
		let first = event_type();
		ensure_types();
		assert_eq!(event_type(), first);
		assert_ne!(event_type(), semaphore_type());
		assert_ne!(process_type(), thread_type());
	}
}
