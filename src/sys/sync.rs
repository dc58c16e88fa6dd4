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

//! `OSCreateEvent`/`OSSetEvent`/`OSResetEvent`/`OSCreateSemaphore`/
//! `OSReleaseSemaphore`/`OSCreateMutex`/`OSReleaseMutex` (spec 6), each a
//! thin "mint the kernel object, hand back a handle" / "resolve the handle,
//! call the kernel object's method" pair, the same shape for all three
//! object kinds.

use super::object;
use crate::ke::process::ProcessId;
use crate::ke::sync_objects::{Event, EventKind, KMutex, Semaphore};
use crate::ke::thread::ThreadId;
use crate::ob::api::{self, OpenFlags};
use crate::ob::handle::Handle;
use crate::ob::object::{self as ob_object, ObjectFlags, ObjectId};
use crate::status::{EResult, Status};
use alloc::sync::Arc;

fn install<T: core::any::Any + Send + Sync>(process: ProcessId, ty: ObjectId, value: T) -> EResult<Handle> {
	let obj = api::create_object(ty, None, None, ObjectFlags::NO_DIRECTORY, value)?;
	let handle = api::insert_object_create(process, obj, OpenFlags::empty());
	if handle.is_err() {
		ob_object::dereference(obj);
	}
	handle
}

fn resolve<T: Clone + 'static>(process: ProcessId, handle: Handle, ty: ObjectId) -> EResult<T> {
	let obj = api::reference_object_by_handle(process, handle, Some(ty))?;
	let value = ob_object::with_object(obj, |_, body| body.as_other().and_then(|b| b.downcast_ref::<T>()).cloned());
	ob_object::dereference(obj);
	value.ok_or(Status::TypeMismatch)
}

pub fn create_event(process: ProcessId, kind: EventKind, initially_signaled: bool) -> EResult<Handle> {
	install(process, object::event_type(), Arc::new(Event::new(kind, initially_signaled)))
}

pub fn set_event(process: ProcessId, handle: Handle) -> EResult<()> {
	let event: Arc<Event> = resolve(process, handle, object::event_type())?;
	event.signal();
	Ok(())
}

pub fn reset_event(process: ProcessId, handle: Handle) -> EResult<()> {
	let event: Arc<Event> = resolve(process, handle, object::event_type())?;
	event.reset();
	Ok(())
}

pub fn create_semaphore(process: ProcessId, initial_count: i64, limit: i64) -> EResult<Handle> {
	install(process, object::semaphore_type(), Arc::new(Semaphore::new(initial_count, limit)))
}

pub fn release_semaphore(process: ProcessId, handle: Handle, count: i64) -> EResult<i64> {
	let sem: Arc<Semaphore> = resolve(process, handle, object::semaphore_type())?;
	Ok(sem.release(count))
}

pub fn create_mutex(process: ProcessId) -> EResult<Handle> {
	install(process, object::mutex_type(), Arc::new(KMutex::new()))
}

pub fn release_mutex(process: ProcessId, handle: Handle, thread: ThreadId) -> EResult<()> {
	let mutex: Arc<KMutex> = resolve(process, handle, object::mutex_type())?;
	if mutex.release(thread) {
		Ok(())
	} else {
		Err(Status::ObjectUnowned)
	}
}

/// Resolves `handle` to whichever dispatcher object it names — an event, a
/// semaphore, or a mutex — as a single trait object, so a caller waiting on
/// a mixed set of handles (spec 4.3, `WaitForMultipleObjects`) doesn't need
/// to know each one's concrete kind up front.
pub fn resolve_waitable(process: ProcessId, handle: Handle) -> EResult<Arc<dyn crate::ke::wait::Waitable>> {
	let obj = api::reference_object_by_handle(process, handle, None)?;
	let ty = ob_object::object_type_of(obj);
	let waitable: Option<Arc<dyn crate::ke::wait::Waitable>> = if ty == object::event_type() {
		ob_object::with_object(obj, |_, body| body.as_other().and_then(|b| b.downcast_ref::<Arc<Event>>()).cloned()).map(|a| a as Arc<dyn crate::ke::wait::Waitable>)
	} else if ty == object::semaphore_type() {
		ob_object::with_object(obj, |_, body| body.as_other().and_then(|b| b.downcast_ref::<Arc<Semaphore>>()).cloned()).map(|a| a as Arc<dyn crate::ke::wait::Waitable>)
	} else if ty == object::mutex_type() {
		ob_object::with_object(obj, |_, body| body.as_other().and_then(|b| b.downcast_ref::<Arc<KMutex>>()).cloned()).map(|a| a as Arc<dyn crate::ke::wait::Waitable>)
	} else {
		None
	};
	ob_object::dereference(obj);
	waitable.ok_or(Status::TypeMismatch)
}
