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

//! Interrupt-masking spinlock: raises IPL to [`Ipl::DPC`] for the duration
//! of the critical section, so the lock can never be held across an
//! interrupt that would try to reacquire it on the same CPU (the classic
//! single-CPU deadlock a plain spinlock is vulnerable to).
//!
//! [`IntSpin::new_lazy`] additionally supports deferred initialization from
//! inside a `const fn`, so a `static` can hold a value whose constructor
//! needs the allocator (not available before `start_up` runs).

use super::ipl::{self, Ipl};
use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, Ordering};

enum Lazy<T> {
	Pending(fn() -> T),
	Ready(T),
}

pub struct IntSpin<T> {
	locked: AtomicBool,
	value: UnsafeCell<Lazy<T>>,
}

unsafe impl<T: Send> Send for IntSpin<T> {}
unsafe impl<T: Send> Sync for IntSpin<T> {}

impl<T> IntSpin<T> {
	pub const fn new(value: T) -> Self {
		IntSpin {
			locked: AtomicBool::new(false),
			value: UnsafeCell::new(Lazy::Ready(value)),
		}
	}

	/// Builds a lock whose contents are constructed on first [`lock`]
	/// rather than at `static` initialization time.
	pub const fn new_lazy(init: fn() -> T) -> Self {
		IntSpin {
			locked: AtomicBool::new(false),
			value: UnsafeCell::new(Lazy::Pending(init)),
		}
	}

	pub fn lock(&self) -> IntSpinGuard<'_, T> {
		let old_ipl = ipl::raise_ipl(Ipl::DPC);
		while self.locked.swap(true, Ordering::Acquire) {
			core::hint::spin_loop();
		}
		// SAFETY: `locked` just transitioned false -> true under us; we are
		// the sole holder until `IntSpinGuard::drop` releases it.
		unsafe {
			let slot = &mut *self.value.get();
			if let Lazy::Pending(init) = slot {
				let built = init();
				*slot = Lazy::Ready(built);
			}
		}
		IntSpinGuard { lock: self, old_ipl }
	}

	/// Attempts to acquire without spinning. Returns `None` if contended.
	pub fn try_lock(&self) -> Option<IntSpinGuard<'_, T>> {
		let old_ipl = ipl::raise_ipl(Ipl::DPC);
		if self.locked.swap(true, Ordering::Acquire) {
			ipl::lower_ipl(old_ipl);
			return None;
		}
		unsafe {
			let slot = &mut *self.value.get();
			if let Lazy::Pending(init) = slot {
				let built = init();
				*slot = Lazy::Ready(built);
			}
		}
		Some(IntSpinGuard { lock: self, old_ipl })
	}
}

pub struct IntSpinGuard<'a, T> {
	lock: &'a IntSpin<T>,
	old_ipl: Ipl,
}

impl<'a, T> Deref for IntSpinGuard<'a, T> {
	type Target = T;
	fn deref(&self) -> &T {
		// SAFETY: held the lock since acquisition; `Lazy::Ready` by now.
		match unsafe { &*self.lock.value.get() } {
			Lazy::Ready(v) => v,
			Lazy::Pending(_) => unreachable!("lock() always resolves Pending before returning"),
		}
	}
}

impl<'a, T> DerefMut for IntSpinGuard<'a, T> {
	fn deref_mut(&mut self) -> &mut T {
		match unsafe { &mut *self.lock.value.get() } {
			Lazy::Ready(v) => v,
			Lazy::Pending(_) => unreachable!("lock() always resolves Pending before returning"),
		}
	}
}

impl<'a, T> Drop for IntSpinGuard<'a, T> {
	fn drop(&mut self) {
		self.lock.locked.store(false, Ordering::Release);
		ipl::lower_ipl(self.old_ipl);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn eager_value_roundtrips() {
		let lock = IntSpin::new(5usize);
		*lock.lock() += 1;
		assert_eq!(*lock.lock(), 6);
	}

	#[test]
	fn lazy_value_built_on_first_lock() {
		static LOCK: IntSpin<alloc::vec::Vec<i32>> = IntSpin::new_lazy(|| alloc::vec![1, 2, 3]);
		assert_eq!(*LOCK.lock(), alloc::vec![1, 2, 3]);
	}

	#[test]
	fn try_lock_fails_while_held() {
		let lock = IntSpin::new(0);
		let guard = lock.lock();
		assert!(lock.try_lock().is_none());
		drop(guard);
		assert!(lock.try_lock().is_some());
	}
}
