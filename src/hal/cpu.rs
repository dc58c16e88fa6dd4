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

//! Current-CPU data pointer and per-CPU identification.
//!
//! Spec section 6 lists "Current-CPU data pointer, atomic primitives,
//! cache hints" among the platform hooks. Atomics and cache hints are
//! `core::sync::atomic`/`core::hint` and need no trait; identifying "which
//! CPU am I running on right now" does, since it is inherently
//! architecture-specific (a segment-register-relative load on amd64, a
//! dedicated system register on arm64).

/// Maximum number of logical processors the executive is built to
/// support; see `Boron.toml`/`build/main.rs`.
pub const MAX_CPUS: usize = crate::config::generated::MAX_CPUS;

/// Returns which logical CPU the calling code is currently executing on.
///
/// Implementations must be callable from any context, including inside an
/// interrupt service routine, and must never allocate or block.
pub trait CurrentCpu: Send + Sync {
	fn cpu_id(&self) -> usize;
	fn cpu_count(&self) -> usize;
}

use core::sync::atomic::{AtomicUsize, Ordering};

/// The installed [`CurrentCpu`] backend. Defaults to a single-CPU identity
/// backend so the executive and its tests work before any platform hook
/// is installed.
static BACKEND: AtomicUsize = AtomicUsize::new(0);

static UP_BACKEND: UniprocessorCpu = UniprocessorCpu;

/// Installs the platform's [`CurrentCpu`] implementation. Must be called
/// at most once, during `start_up`, before any other CPU may run.
pub fn install(backend: &'static dyn CurrentCpu) {
	BACKEND.store(backend as *const dyn CurrentCpu as *const () as usize, Ordering::Release);
}

fn backend() -> &'static dyn CurrentCpu {
	let raw = BACKEND.load(Ordering::Acquire);
	if raw == 0 {
		&UP_BACKEND
	} else {
		// SAFETY: the only value ever stored is a `'static` reference cast
		// through `install`.
		unsafe { &*(raw as *const dyn CurrentCpu) }
	}
}

/// Returns which logical CPU is currently executing, via the installed
/// backend (or CPU 0 if none was installed — the uniprocessor default
/// used by tests and early bring-up).
pub fn cpu_id() -> usize {
	backend().cpu_id()
}

/// Returns the total number of active logical processors.
pub fn cpu_count() -> usize {
	backend().cpu_count()
}

/// The default backend: always reports CPU 0 of 1. Used by unit tests and
/// before a real platform hook is installed.
pub struct UniprocessorCpu;

impl CurrentCpu for UniprocessorCpu {
	fn cpu_id(&self) -> usize {
		0
	}
	fn cpu_count(&self) -> usize {
		1
	}
}
