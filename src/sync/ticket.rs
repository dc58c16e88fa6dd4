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

//! Fair ticket spinlock: waiters are served in arrival order. Used where
//! starvation under contention would be worse than the extra cache traffic
//! of a ticket counter (long directory/handle-table scans at passive
//! level, spec 4.4), as opposed to [`super::spin::IntSpin`]'s short,
//! IPL-raising critical sections.

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicUsize, Ordering};

pub struct TicketSpin<T> {
	next_ticket: AtomicUsize,
	now_serving: AtomicUsize,
	value: UnsafeCell<T>,
}

unsafe impl<T: Send> Send for TicketSpin<T> {}
unsafe impl<T: Send> Sync for TicketSpin<T> {}

impl<T> TicketSpin<T> {
	pub const fn new(value: T) -> Self {
		TicketSpin {
			next_ticket: AtomicUsize::new(0),
			now_serving: AtomicUsize::new(0),
			value: UnsafeCell::new(value),
		}
	}

	pub fn lock(&self) -> TicketGuard<'_, T> {
		let my_ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
		while self.now_serving.load(Ordering::Acquire) != my_ticket {
			core::hint::spin_loop();
		}
		TicketGuard { lock: self }
	}
}

pub struct TicketGuard<'a, T> {
	lock: &'a TicketSpin<T>,
}

impl<'a, T> Deref for TicketGuard<'a, T> {
	type Target = T;
	fn deref(&self) -> &T {
		unsafe { &*self.lock.value.get() }
	}
}

impl<'a, T> DerefMut for TicketGuard<'a, T> {
	fn deref_mut(&mut self) -> &mut T {
		unsafe { &mut *self.lock.value.get() }
	}
}

impl<'a, T> Drop for TicketGuard<'a, T> {
	fn drop(&mut self) {
		self.lock.now_serving.fetch_add(1, Ordering::Release);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn serves_in_order() {
		let lock = TicketSpin::new(alloc::vec::Vec::new());
		for i in 0..8 {
			lock.lock().push(i);
		}
		assert_eq!(*lock.lock(), (0..8).collect::<alloc::vec::Vec<_>>());
	}
}
