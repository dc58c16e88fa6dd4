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

//! Interrupt objects (spec 4.1): "Binds a vector to a service routine plus
//! a caller-owned spin lock. Connecting inserts into a per-vector list;
//! shared vectors require every interrupt on that vector to permit
//! sharing. At delivery, the arch layer walks the vector's list, acquiring
//! each lock in turn. `SynchronizeExecution` raises IPL to the interrupt's
//! IPL, acquires the spin lock, calls the routine, restores."

use crate::hal::interrupt_controller::Vector;
use crate::status::{EResult, Status};
use crate::sync::ipl::{self, Ipl};
use crate::sync::spin::IntSpin;
use alloc::boxed::Box;
use alloc::vec::Vec;

pub type ServiceRoutine = fn(Vector, *mut ()) -> bool;

pub struct KInterrupt {
	pub vector: Vector,
	pub ipl: Ipl,
	pub shareable: bool,
	pub routine: ServiceRoutine,
	pub context: *mut (),
	pub spin_lock: IntSpin<()>,
}

// SAFETY: `context` is only ever dereferenced by `routine`, which the
// caller who registered the interrupt is responsible for making safe to
// call from any CPU.
unsafe impl Send for KInterrupt {}
unsafe impl Sync for KInterrupt {}

impl KInterrupt {
	/// Raises IPL to this interrupt's level, acquires its spin lock, calls
	/// the service routine, then restores both — the same sequence the
	/// real delivery path runs, exposed so drivers can run code "as if
	/// inside the ISR" (spec 4.1, `SynchronizeExecution`).
	pub fn synchronize_execution(&self) -> bool {
		let old_ipl = ipl::raise_ipl(self.ipl);
		let _guard = self.spin_lock.lock();
		let result = (self.routine)(self.vector, self.context);
		drop(_guard);
		ipl::lower_ipl(old_ipl);
		result
	}
}

struct VectorTable {
	entries: alloc::collections::BTreeMap<Vector, Vec<Box<KInterrupt>>>,
}

impl VectorTable {
	const fn new() -> Self {
		VectorTable { entries: alloc::collections::BTreeMap::new() }
	}
}

static TABLE: IntSpin<VectorTable> = IntSpin::new(VectorTable::new());

/// Connects `interrupt` to its vector. Fails with `unsupported-function`
/// if the vector already has a non-shareable interrupt connected, or if
/// `interrupt` itself disallows sharing a non-empty vector.
pub fn connect(interrupt: KInterrupt) -> EResult<Vector> {
	let vector = interrupt.vector;
	let mut table = TABLE.lock();
	let list = table.entries.entry(vector).or_default();
	if !list.is_empty() && (!interrupt.shareable || !list.iter().all(|i| i.shareable)) {
		return Err(Status::UnsupportedFunction);
	}
	list.push(Box::new(interrupt));
	Ok(vector)
}

/// Disconnects every interrupt object registered on `vector`.
pub fn disconnect(vector: Vector) {
	TABLE.lock().entries.remove(&vector);
}

/// Delivers `vector`: walks its list, calling `SynchronizeExecution`-style
/// on each registered interrupt in turn (spec 4.1). Returns the number of
/// routines that claimed the interrupt.
pub fn deliver(vector: Vector) -> usize {
	let table = TABLE.lock();
	let Some(list) = table.entries.get(&vector) else { return 0 };
	list.iter().filter(|i| i.synchronize_execution()).count()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn noop_routine(_v: Vector, _ctx: *mut ()) -> bool {
		true
	}

	#[test]
	fn exclusive_interrupt_rejects_second_connection() {
		disconnect(9);
		let a = KInterrupt {
			vector: 9,
			ipl: Ipl::device(0),
			shareable: false,
			routine: noop_routine,
			context: core::ptr::null_mut(),
			spin_lock: IntSpin::new(()),
		};
		connect(a).unwrap();
		let b = KInterrupt {
			vector: 9,
			ipl: Ipl::device(0),
			shareable: false,
			routine: noop_routine,
			context: core::ptr::null_mut(),
			spin_lock: IntSpin::new(()),
		};
		assert!(connect(b).is_err());
	}

	#[test]
	fn shared_interrupts_all_run_on_delivery() {
		disconnect(10);
		for _ in 0..3 {
			let i = KInterrupt {
				vector: 10,
				ipl: Ipl::device(0),
				shareable: true,
				routine: noop_routine,
				context: core::ptr::null_mut(),
				spin_lock: IntSpin::new(()),
			};
			connect(i).unwrap();
		}
		assert_eq!(deliver(10), 3);
	}
}
