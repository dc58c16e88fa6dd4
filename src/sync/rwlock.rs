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

//! Passive-level spin reader-writer lock, the `Mutex` of this module
//! widened to distinguish shared from exclusive access (directory and
//! cache-control-block lookups, which are overwhelmingly read-mostly).

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicUsize, Ordering};

const WRITER: usize = usize::MAX;

pub struct RwLock<T> {
	state: AtomicUsize,
	value: UnsafeCell<T>,
}

unsafe impl<T: Send> Send for RwLock<T> {}
unsafe impl<T: Send + Sync> Sync for RwLock<T> {}

impl<T> RwLock<T> {
	pub const fn new(value: T) -> Self {
		RwLock {
			state: AtomicUsize::new(0),
			value: UnsafeCell::new(value),
		}
	}

	pub fn read(&self) -> RwLockReadGuard<'_, T> {
		loop {
			let current = self.state.load(Ordering::Relaxed);
			if current == WRITER {
				core::hint::spin_loop();
				continue;
			}
			if self
				.state
				.compare_exchange_weak(current, current + 1, Ordering::Acquire, Ordering::Relaxed)
				.is_ok()
			{
				return RwLockReadGuard { lock: self };
			}
		}
	}

	pub fn write(&self) -> RwLockWriteGuard<'_, T> {
		loop {
			if self
				.state
				.compare_exchange_weak(0, WRITER, Ordering::Acquire, Ordering::Relaxed)
				.is_ok()
			{
				return RwLockWriteGuard { lock: self };
			}
			core::hint::spin_loop();
		}
	}
}

pub struct RwLockReadGuard<'a, T> {
	lock: &'a RwLock<T>,
}

impl<'a, T> Deref for RwLockReadGuard<'a, T> {
	type Target = T;
	fn deref(&self) -> &T {
		unsafe { &*self.lock.value.get() }
	}
}

impl<'a, T> Drop for RwLockReadGuard<'a, T> {
	fn drop(&mut self) {
		self.lock.state.fetch_sub(1, Ordering::Release);
	}
}

pub struct RwLockWriteGuard<'a, T> {
	lock: &'a RwLock<T>,
}

impl<'a, T> Deref for RwLockWriteGuard<'a, T> {
	type Target = T;
	fn deref(&self) -> &T {
		unsafe { &*self.lock.value.get() }
	}
}

impl<'a, T> DerefMut for RwLockWriteGuard<'a, T> {
	fn deref_mut(&mut self) -> &mut T {
		unsafe { &mut *self.lock.value.get() }
	}
}

impl<'a, T> Drop for RwLockWriteGuard<'a, T> {
	fn drop(&mut self) {
		self.lock.state.store(0, Ordering::Release);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn concurrent_reads_allowed() {
		let lock = RwLock::new(42);
		let a = lock.read();
		let b = lock.read();
		assert_eq!(*a, 42);
		assert_eq!(*b, 42);
	}

	#[test]
	fn write_then_read_sees_update() {
		let lock = RwLock::new(0);
		*lock.write() = 7;
		assert_eq!(*lock.read(), 7);
	}
}
