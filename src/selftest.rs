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

//! In-kernel and hosted scenario harness (spec 8: "testable properties"
//! and end-to-end scenarios S1-S6).
//!
//! Grounded in the teacher kernel's `selftest.rs`: a `Testable` trait
//! blanket-implemented for any `Fn()`, and a sequential `runner` that
//! prints `test <name> ... ok` for each one — meant to run inside the
//! freestanding image itself once a bring-up routine has brought every
//! subsystem up (`--features selftest`), the same way the teacher's
//! kernel runs its integration tests as the init process rather than on
//! a host. Most of this crate's invariant checking already lives beside
//! the module it covers (the PFN refcount invariant in `mm::pfn`'s own
//! tests, VAD disjointness in `mm::vad`'s, the view-cache/LRU invariant
//! in `mm::cache`'s); this module is for the scenarios spec 8 describes
//! end-to-end, crossing module boundaries the way a real caller would.
//!
//! Scenarios that need genuine concurrency (S4, S5) spawn real OS threads
//! and so only run under `cargo test`, not under `--features selftest`
//! (there is no real preemptive scheduler loop in this crate — see
//! `ke::scheduler`'s own doc comment — so nothing could race with them in
//! the freestanding image anyway). Everything else is plain, single-
//! threaded bookkeeping runnable in both worlds.

use crate::hal::page_table::{PageTableOps, Protection, PteState, VaRange, PAGE_SIZE};
use crate::hal::sim::SimPageTable;
use crate::mm::cache::Ccb;
use crate::mm::fault::{self, AccessMode, FaultContext};
use crate::mm::pfn::PfnDatabase;
use crate::mm::vad::{AddressSpace, VadFlags};
use crate::ob::api as ob_api;
use crate::ob::object::{self as ob_object, ObjectFlags};
use crate::ob::types as ob_types;
use crate::status::Status;
use crate::sync::spin::IntSpin;
use alloc::vec;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicUsize, Ordering};

/// Scenario S1 (spec 8): reserve 64 KiB top-down writable, write a
/// distinct word to the first page and to the page at byte offset 4096,
/// then free. Both stores must land in distinct frames and `release` must
/// leave no VAD and no outstanding PFN behind.
pub fn scenario_s1_anonymous_allocation() -> Result<(), &'static str> {
	let pt = SimPageTable::new();
	let map = pt.create_page_map(None).map_err(|_| "create_page_map failed")?;
	let space = AddressSpace::new(map, 0x1_0000, 0x1000_0000);
	let pfn_db = IntSpin::new(Some(PfnDatabase::new(64)));
	let ctx = FaultContext { space: &space, pt: &pt, pfn_db: &pfn_db };

	let pages = (64 * 1024) / PAGE_SIZE;
	let base = space
		.reserve(pages, true, Protection::READ | Protection::WRITE, VadFlags::COMMITTED | VadFlags::PRIVATE)
		.map_err(|_| "reserve failed")?;

	// Stand-in "physical RAM": this simulation tracks PTE state, not
	// actual byte content, so a small array indexed by PFN plays the role
	// real memory would.
	let mut ram = [0u32; 64];
	let mut touched = Vec::new();
	for (offset, value) in [(0u64, 0xCAFEBABEu32), (4096u64, 0xDEADBEEFu32)] {
		let va = base + offset;
		let reason = fault::handle_page_fault(&ctx, va, AccessMode::Write, false).map_err(|_| "fault did not resolve")?;
		if reason != fault::FaultReason::Resolved {
			return Err("anonymous fault was not immediately resolved");
		}
		let PteState::Present { pfn, .. } = pt.get_pte(map, va) else {
			return Err("page not present after fault");
		};
		ram[pfn as usize] = value;
		touched.push((pfn, value));
	}
	if touched[0].0 == touched[1].0 {
		return Err("both pages resolved to the same frame");
	}
	for (pfn, value) in &touched {
		if ram[*pfn as usize] != *value {
			return Err("stored value did not round-trip");
		}
	}

	let removed = pt.unmap(map, VaRange { start: base, pages });
	let mut db = pfn_db.lock();
	let db = db.as_mut().ok_or("pfn database missing")?;
	for page in removed {
		if let PteState::Present { pfn, protection } = page.prior {
			if protection.contains(Protection::FROM_POOL) {
				db.free_physical_page(pfn, false);
			}
		}
	}
	if db.free_count() + db.zeroed_count() != 64 {
		return Err("frames leaked across reserve/commit/release");
	}
	drop(db);
	space.release(base).map_err(|_| "release failed")?;
	if space.vad_count() != 0 {
		return Err("VAD survived release");
	}
	Ok(())
}

/// Scenario S2 (spec 8): map a page copy-on-write and write to it. The
/// write must duplicate the frame (spec 4.6's COW|was-read-write PTE
/// encoding) rather than touching the page the cache control block still
/// has recorded for that file offset — the on-disk content is reached
/// only through the CCB, and CoW never consults it.
pub fn scenario_s2_file_mapping_cow() -> Result<(), &'static str> {
	let pt = SimPageTable::new();
	let map = pt.create_page_map(None).map_err(|_| "create_page_map failed")?;
	let space = AddressSpace::new(map, 0x1_0000, 0x1000_0000);
	let pfn_db = IntSpin::new(Some(PfnDatabase::new(16)));
	let ctx = FaultContext { space: &space, pt: &pt, pfn_db: &pfn_db };

	let ccb = Ccb::new(1);
	let file_pfn = pfn_db.lock().as_mut().ok_or("pfn database missing")?.allocate().ok_or("no frames")?;
	ccb.insert(0, file_pfn);

	let base = space
		.reserve(5, false, Protection::READ | Protection::WRITE, VadFlags::COMMITTED | VadFlags::COW)
		.map_err(|_| "reserve failed")?;
	pt.map_anon(map, base, file_pfn, Protection::READ | Protection::COW).map_err(|_| "map_anon failed")?;

	fault::handle_page_fault(&ctx, base, AccessMode::Write, false).map_err(|_| "cow fault failed")?;

	let PteState::Present { pfn: new_pfn, protection } = pt.get_pte(map, base) else {
		return Err("page not present after cow fault");
	};
	if new_pfn == file_pfn {
		return Err("cow write did not duplicate the frame");
	}
	if protection.contains(Protection::COW) {
		return Err("cow bit still set after resolution");
	}
	if ccb.lookup(0) != Some(file_pfn) {
		return Err("cache control block's record of the file's page changed");
	}
	Ok(())
}

/// Scenario S3 (spec 8): a 4096-byte pipe accepts 4095 bytes, refuses a
/// 4096th, and the reverse on the read side. Exercised at the `io::`
/// layer directly; `io::pipe`'s own tests already cover the event
/// bookkeeping this drives.
pub fn scenario_s3_pipe_full_and_empty() -> Result<(), &'static str> {
	use crate::io::dispatch::{IoInformation, RwFlags};
	use crate::io::file_object::FileObject;
	use crate::io::pipe;

	let fcb = pipe::create_pipe(pipe::DEFAULT_PIPE_BUFFER);
	let file = FileObject::new(fcb, RwFlags::empty());

	let input = vec![0xABu8; 4095];
	let r = file.write(&input);
	if r.status != Status::Success || r.information != IoInformation::BytesTransferred(4095) {
		return Err("first write did not fill the pipe");
	}
	if file.write(&[0x11]).status != Status::EndOfFile {
		return Err("write against a full pipe did not report end-of-file");
	}

	let mut out = vec![0u8; 4095];
	let r = file.read(&mut out);
	if r.status != Status::Success || out != input {
		return Err("read did not return what was written");
	}
	if file.read(&mut [0u8; 1]).status != Status::EndOfFile {
		return Err("read against an empty pipe did not report end-of-file");
	}
	Ok(())
}

/// Scenario S6 (spec 8): open an object, duplicate its handle, close the
/// first, verify the second still resolves, close the second, and check
/// the type's `Delete` callback fired exactly once.
pub fn scenario_s6_handle_lifetime() -> Result<(), &'static str> {
	static DELETE_COUNT: AtomicUsize = AtomicUsize::new(0);
	fn on_delete(_id: crate::ob::ObjectId) {
		DELETE_COUNT.fetch_add(1, Ordering::Relaxed);
	}

	ob_types::ensure_basic_types();
	let ty = ob_types::register_type(
		"SelftestProbe",
		ob_types::ObjectTypeOps { delete: Some(on_delete), ..Default::default() },
		false,
	);

	static NEXT_PID: AtomicUsize = AtomicUsize::new(1 << 20);
	let pid = crate::ke::process::ProcessId(NEXT_PID.fetch_add(1, Ordering::Relaxed) as u64);
	ob_api::create_handle_table(pid);

	let before = DELETE_COUNT.load(Ordering::Relaxed);
	let obj = ob_api::create_object(ty, None, None, ObjectFlags::NO_DIRECTORY, 7u32).map_err(|_| "create_object failed")?;
	let h1 = ob_api::insert_object_create(pid, obj, ob_api::OpenFlags::empty()).map_err(|_| "insert_object failed")?;
	let h2 = {
		let obj2 = ob_api::reference_object_by_handle(pid, h1, None).map_err(|_| "reference_by_handle failed")?;
		let h = ob_api::insert_object_create(pid, obj2, ob_api::OpenFlags::empty());
		ob_object::dereference(obj2);
		h.map_err(|_| "second insert_object failed")?
	};

	ob_api::close(pid, h1).map_err(|_| "close of first handle failed")?;
	if ob_api::reference_object_by_handle(pid, h1, None) != Err(Status::InvalidHandle) {
		return Err("first handle still resolves after close");
	}
	let still_live = ob_api::reference_object_by_handle(pid, h2, None).map_err(|_| "second handle stopped resolving too early")?;
	ob_object::dereference(still_live);
	ob_object::dereference(obj);

	ob_api::close(pid, h2).map_err(|_| "close of second handle failed")?;
	if DELETE_COUNT.load(Ordering::Relaxed) != before + 1 {
		return Err("delete callback did not fire exactly once");
	}
	Ok(())
}

/// Trait for anything this harness can run as a named test (spec 8's
/// scenarios and testable properties), mirroring the teacher kernel's own
/// `Testable`: any zero-argument `Fn` is one, named by its type.
pub trait Testable {
	fn run(&self);
}

impl<T: Fn() -> Result<(), &'static str>> Testable for T {
	fn run(&self) {
		let name = core::any::type_name::<T>();
		crate::kprintln!("test {name} ... ");
		match self() {
			Ok(()) => crate::kprintln!("ok"),
			Err(reason) => crate::bugcheck!("selftest {name} failed: {reason}"),
		}
	}
}

/// The test runner, mirroring the teacher kernel's `runner`: prints a
/// banner, runs each test in order, prints the trailer. A failing test
/// bugchecks rather than returning, since there is no process boundary to
/// unwind into here.
pub fn runner(tests: &[&dyn Testable]) {
	crate::kprintln!("Running {} selftest(s)", tests.len());
	for test in tests {
		test.run();
	}
	crate::kprintln!("No more selftests to run");
}

/// Runs every scenario this harness can express without real concurrency
/// (S4 and S5 need genuine OS-thread preemption; see the module doc
/// comment). Intended to be called once from a freestanding bring-up
/// routine after `boron_kernel::start_up`, under `--features selftest`.
#[cfg(feature = "selftest")]
pub fn run_all() {
	runner(&[
		&scenario_s1_anonymous_allocation,
		&scenario_s2_file_mapping_cow,
		&scenario_s3_pipe_full_and_empty,
		&scenario_s6_handle_lifetime,
	]);
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ke::dispatch::WaitType;
	use crate::ke::process::ProcessId;
	use crate::ke::scheduler;
	use crate::ke::sync_objects::{Event, EventKind};
	use crate::ke::thread::ThreadState;
	use crate::ke::wait;
	use alloc::sync::Arc;
	use core::sync::atomic::{AtomicU64, Ordering as AOrdering};

	#[test]
	fn scenario_s1_runs() {
		assert_eq!(scenario_s1_anonymous_allocation(), Ok(()));
	}

	#[test]
	fn scenario_s2_runs() {
		assert_eq!(scenario_s2_file_mapping_cow(), Ok(()));
	}

	#[test]
	fn scenario_s3_runs() {
		assert_eq!(scenario_s3_pipe_full_and_empty(), Ok(()));
	}

	#[test]
	fn scenario_s6_runs() {
		assert_eq!(scenario_s6_handle_lifetime(), Ok(()));
	}

	/// Scenario S4 (spec 8): two threads "sleep" 500ms (simulated here by a
	/// real background thread that signals an event after a short real
	/// delay); the main thread waits `ALL` with an infinite timeout and
	/// expects `SUCCESS` once both have fired, and `TIMEOUT` when given a
	/// deadline shorter than that.
	#[test]
	fn scenario_s4_multiwait() {
		let thread = scheduler::create_thread(ProcessId(0), 1);
		let a = Arc::new(Event::new(EventKind::Notification, false));
		let b = Arc::new(Event::new(EventKind::Notification, false));
		let ticks = Arc::new(AtomicU64::new(0));

		for ev in [a.clone(), b.clone()] {
			let ticks = ticks.clone();
			std::thread::spawn(move || {
				std::thread::sleep(std::time::Duration::from_millis(20));
				ticks.fetch_add(1, AOrdering::Relaxed);
				ev.signal();
			});
		}

		let objects: [&dyn wait::Waitable; 2] = [&*a, &*b];
		let status = wait::wait_for_multiple_objects(thread, &objects, WaitType::All, false, None, || ticks.load(AOrdering::Relaxed));
		assert_eq!(status, Status::Success as i32);

		// Same setup, but a deadline reached before either event fires.
		let a2 = Event::new(EventKind::Notification, false);
		let b2 = Event::new(EventKind::Notification, false);
		let objects2: [&dyn wait::Waitable; 2] = [&a2, &b2];
		let status = wait::wait_for_multiple_objects(thread, &objects2, WaitType::All, false, Some(0), || 1);
		assert_eq!(status, Status::Timeout as i32);
	}

	/// Scenario S5 (spec 8): thread A waits (simulating a long sleep);
	/// thread B terminates it from a real background thread shortly after.
	/// The join (A's own wait) must return `KILLED`, and A's state must be
	/// `Terminated`.
	#[test]
	fn scenario_s5_terminate_other_thread() {
		let a = scheduler::create_thread(ProcessId(0), 1);
		let never_signals = Event::new(EventKind::Notification, false);

		std::thread::spawn(move || {
			std::thread::sleep(std::time::Duration::from_millis(20));
			scheduler::terminate(a);
		});

		let status = wait::wait_for_single_object(a, &never_signals, false, None, || 0);
		assert_eq!(status, Status::Killed as i32);
		scheduler::with_thread(a, |t| assert_eq!(t.state, ThreadState::Terminated));
	}

	/// Testable property 8 (spec 8): `WaitForMultipleObjects(n, h, ALL,
	/// false, INFINITE)` returns `SUCCESS` iff every object is signalled.
	#[test]
	fn property_wait_all_requires_every_object_signalled() {
		let thread = scheduler::create_thread(ProcessId(0), 1);
		let signalled = Event::new(EventKind::Notification, true);
		let unsignalled = Event::new(EventKind::Notification, false);
		unsignalled.signal();
		let objects: [&dyn wait::Waitable; 2] = [&signalled, &unsignalled];
		let status = wait::wait_for_multiple_objects(thread, &objects, WaitType::All, false, Some(0), || 1);
		assert_eq!(status, Status::Success as i32);
	}

	/// Testable property 7 (spec 8): after `Close`, a subsequent
	/// `ReferenceObjectByHandle` fails with `INVALID_HANDLE`.
	#[test]
	fn property_handle_invalid_after_close() {
		ob_types::ensure_basic_types();
		static NEXT_PID: AtomicUsize = AtomicUsize::new(2 << 20);
		let pid = ProcessId(NEXT_PID.fetch_add(1, Ordering::Relaxed) as u64);
		ob_api::create_handle_table(pid);
		let ty = ob_types::object_type_type_id();
		let obj = ob_api::create_object(ty, None, None, ObjectFlags::NO_DIRECTORY, 1u32).unwrap();
		let handle = ob_api::insert_object_create(pid, obj, ob_api::OpenFlags::empty()).unwrap();
		ob_api::close(pid, handle).unwrap();
		assert_eq!(ob_api::reference_object_by_handle(pid, handle, None), Err(Status::InvalidHandle));
	}

	/// Testable property 6 (spec 8): a thread is on at most one ready
	/// queue at a time — enqueuing it once must only be picked once before
	/// the idle thread takes over, never twice in a row.
	#[test]
	fn property_thread_enqueued_exactly_once() {
		crate::ke::percpu::init(1);
		scheduler::init(1);
		let t = scheduler::create_thread(ProcessId(0), 3);
		scheduler::enqueue_ready(0, t);

		scheduler::yield_voluntarily(0);
		assert_eq!(scheduler::take_pending_switch(0), Some(t));

		scheduler::yield_voluntarily(0);
		assert_ne!(scheduler::take_pending_switch(0), Some(t));
	}
}
