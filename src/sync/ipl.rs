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

//! Interrupt priority level (IPL) ordering and per-CPU current-IPL tracking.
//!
//! Spec 4.1: "IPL ordering: normal < APC < DPC < device < clock <
//! no-interrupts." Device IPLs occupy a contiguous band so that a driver's
//! interrupt can be assigned any priority between the two named ends
//! without colliding with `Apc`, `Dpc`, or `Clock`.

use core::sync::atomic::{AtomicU8, Ordering};

/// An interrupt priority level. Ordered the way the comparison operators
/// derive it: by underlying byte value, low to high.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ipl(u8);

impl Ipl {
	pub const NORMAL: Ipl = Ipl(0);
	pub const APC: Ipl = Ipl(1);
	pub const DPC: Ipl = Ipl(2);
	const DEVICE_LOW: u8 = 3;
	const DEVICE_HIGH: u8 = 13;
	pub const CLOCK: Ipl = Ipl(14);
	/// No-interrupts: the highest IPL, masks everything including the
	/// clock. Held only for the shortest possible critical sections.
	pub const HIGH: Ipl = Ipl(15);

	/// Builds a device IPL. `priority` is clamped into the device band so a
	/// misconfigured driver priority cannot accidentally reach `Clock` or
	/// `High`.
	pub const fn device(priority: u8) -> Ipl {
		let span = Self::DEVICE_HIGH - Self::DEVICE_LOW;
		let clamped = if priority > span { span } else { priority };
		Ipl(Self::DEVICE_LOW + clamped)
	}

	pub const fn as_u8(self) -> u8 {
		self.0
	}
}

/// Upper bound on logical processors this build tracks current-IPL for.
/// Independent of `Boron.toml`'s `max_cpus` so the array can be a `const`
/// item; [`raise_ipl`]/[`lower_ipl`] panic if `cpu::cpu_id()` exceeds it,
/// which a build with a saner `max_cpus` will never do.
const MAX_TRACKED_CPUS: usize = 256;

static CURRENT_IPL: [AtomicU8; MAX_TRACKED_CPUS] = {
	const INIT: AtomicU8 = AtomicU8::new(0);
	[INIT; MAX_TRACKED_CPUS]
};

/// Returns the calling CPU's current IPL.
pub fn current_ipl() -> Ipl {
	Ipl(CURRENT_IPL[crate::hal::cpu::cpu_id()].load(Ordering::Acquire))
}

/// Raises the calling CPU's IPL to `new`, returning the previous value.
/// Raising to an IPL lower than the current one is a logic error (spec 4.1
/// locking discipline: IPL only ever goes up across a `raise`, back down
/// across the matching [`lower_ipl`]); debug builds assert it.
pub fn raise_ipl(new: Ipl) -> Ipl {
	let slot = &CURRENT_IPL[crate::hal::cpu::cpu_id()];
	let old = slot.swap(new.as_u8(), Ordering::AcqRel);
	#[cfg(config_debug_asserts)]
	debug_assert!(old <= new.as_u8(), "IPL must not be raised below its current value");
	Ipl(old)
}

/// Restores the calling CPU's IPL to `old`, which must be a value
/// previously returned by [`raise_ipl`] on the same CPU.
pub fn lower_ipl(old: Ipl) {
	let slot = &CURRENT_IPL[crate::hal::cpu::cpu_id()];
	#[cfg(config_debug_asserts)]
	{
		let current = slot.load(Ordering::Acquire);
		debug_assert!(old.as_u8() <= current, "IPL must not be lowered above its current value");
	}
	slot.store(old.as_u8(), Ordering::Release);
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ordering_matches_spec() {
		assert!(Ipl::NORMAL < Ipl::APC);
		assert!(Ipl::APC < Ipl::DPC);
		assert!(Ipl::DPC < Ipl::device(0));
		assert!(Ipl::device(0) < Ipl::device(5));
		assert!(Ipl::device(255) < Ipl::CLOCK);
		assert!(Ipl::CLOCK < Ipl::HIGH);
	}

	#[test]
	fn raise_then_lower_restores_prior_level() {
		let old = raise_ipl(Ipl::DPC);
		assert_eq!(old, Ipl::NORMAL);
		assert_eq!(current_ipl(), Ipl::DPC);
		lower_ipl(old);
		assert_eq!(current_ipl(), Ipl::NORMAL);
	}
}
