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

//! Interval timer hook (spec section 6): "request interrupt in N ticks;
//! one-shot or periodic". Backs [`crate::ke::timer`] and the scheduler's
//! quantum-end programming (spec 4.3).

/// A platform interval timer capable of arming a one-shot deadline.
pub trait IntervalTimer: Send + Sync {
	/// Arms the timer to fire once, `ticks` ticks from now. Arming again
	/// before it fires replaces the previous deadline (the scheduler
	/// always programs "the soonest of the quantum deadline and the head
	/// of the global timer queue", per spec 4.3).
	fn arm_one_shot(&self, ticks: u64);
	/// Disarms the timer, if armed.
	fn disarm(&self);
	/// The monotonic tick counter driven by this timer's periodic base
	/// rate (`Boron.toml`'s `tick_hz`).
	fn now_ticks(&self) -> u64;
}

use core::sync::atomic::{AtomicUsize, Ordering};

/// The installed [`IntervalTimer`] backend, stored the same way
/// [`super::interrupt_controller::install`] stores its backend. Gives the
/// `sys::` system-call layer and [`crate::ke::timer`]'s quantum/deadline
/// programming a single "the" clock to read without threading one through
/// every call site; isolated unit tests still construct their own
/// [`crate::hal::sim::SimIntervalTimer`].
static BACKEND: AtomicUsize = AtomicUsize::new(0);

/// Installs the platform's interval timer. Must be called at most once,
/// during `start_up`.
pub fn install(backend: &'static dyn IntervalTimer) {
	BACKEND.store(backend as *const dyn IntervalTimer as *const () as usize, Ordering::Release);
}

/// Returns the installed backend, or `None` before `start_up` has run.
pub fn backend() -> Option<&'static dyn IntervalTimer> {
	let raw = BACKEND.load(Ordering::Acquire);
	if raw == 0 {
		None
	} else {
		// SAFETY: the only value ever stored is a `'static` reference cast
		// through `install`.
		Some(unsafe { &*(raw as *const dyn IntervalTimer) })
	}
}

/// The monotonic tick count read from the installed timer, or `0` before
/// `start_up` has run (early bring-up and unit tests that don't care about
/// wall-clock time).
pub fn now_ticks() -> u64 {
	backend().map(IntervalTimer::now_ticks).unwrap_or(0)
}
