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

//! Kernel status codes.
//!
//! Every executive entry point returns a [`Status`] rather than throwing:
//! see spec section 7 ("Error handling design"). The catalogue below is
//! transcribed from the original `status.h` so that callers which match on
//! specific codes (`NAME_NOT_FOUND`, `ACCESS_VIOLATION`, ...) see exactly
//! the codes the design calls for.

use core::fmt;

/// A kernel status code. `Status::Success` is always the zero variant so
/// that `status as i32 == 0` matches the C convention `STATUS_SUCCESS == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Status {
	Success = 0,

	// Generic errors
	InvalidParameter,
	AccessViolation,
	InsufficientMemory,
	Unimplemented,
	IplTooHigh,
	Refault,
	RefaultSleep,

	// Wait-for-object(s) completion codes
	Waiting,
	Alerted,
	Timeout,
	Killed,
	KernelApc,

	// Probe errors
	Fault,
	NoRemap,

	// Object manager errors
	NameInvalid,
	NameCollision,
	TypeMismatch,
	ObjectUnowned,
	NameNotFound,
	UnsupportedFunction,
	PathInvalid,
	DirectoryDone,
	LoopTooDeep,
	UnassignedLink,
	PathTooDeep,
	NameTooLong,
	NotLinked,
	AlreadyLinked,
	InvalidHandle,

	// Handle table errors
	TableNotEmpty,
	DeleteCanceled,
	TooManyHandles,

	// I/O errors/status codes
	Pending,
	InvalidHeader,
	SameFrame,
	NoMoreFrames,
	MoreProcessingRequired,
	InsufficientSpace,
	NoSuchDevices,
	Unload,
	NotADirectory,
	IsADirectory,
	HardwareIoError,
	UnalignedOperation,
	NotThisFileSystem,
	EndOfFile,
	BlockingOperation,
	DirectoryNotEmpty,
	OutOfFileBounds,
	NotATerminal,

	// Memory manager error codes
	InsufficientVaSpace,
	VaNotAtBase,
	MemoryNotReserved,
	MemoryCommitted,
	ConflictingAddresses,

	// Execution error codes
	InvalidExecutable,
	InvalidArchitecture,
	IsChildProcess,

	// Process error codes
	StillRunning,
}

/// Base used to encode "object `n` out of a `WaitForMultipleObjects` call
/// was satisfied" into a single status code, per spec section 7.
pub const STATUS_RANGE_WAIT: i32 = 0x1000000;
/// Same, but for a wait that completed because the object was abandoned.
pub const STATUS_RANGE_ABANDONED_WAIT: i32 = 0x1000040;

/// Builds the status returned by a successful `WAIT_ANY`/`WAIT_ALL` call,
/// encoding which wait block (`index`) was the one that completed.
pub const fn wait_n(index: usize) -> i32 {
	STATUS_RANGE_WAIT + index as i32
}

/// Same as [`wait_n`], but for an abandoned wait (the object's owner
/// terminated without releasing it; only meaningful for owned dispatcher
/// objects such as mutexes).
pub const fn abandoned_wait_n(index: usize) -> i32 {
	STATUS_RANGE_ABANDONED_WAIT + index as i32
}

/// Decodes a `WAIT(n)`/`ABANDONED_WAIT(n)` encoded raw status back into the
/// satisfied index, if `raw` falls in either range.
pub fn decode_wait_index(raw: i32) -> Option<usize> {
	if (STATUS_RANGE_WAIT..STATUS_RANGE_WAIT + 64).contains(&raw) {
		Some((raw - STATUS_RANGE_WAIT) as usize)
	} else if (STATUS_RANGE_ABANDONED_WAIT..STATUS_RANGE_ABANDONED_WAIT + 64).contains(&raw) {
		Some((raw - STATUS_RANGE_ABANDONED_WAIT) as usize)
	} else {
		None
	}
}

impl Status {
	/// `FAILED(x)` from spec section 7: true for anything but `Success`.
	pub const fn failed(self) -> bool {
		!matches!(self, Status::Success)
	}

	/// `SUCCEEDED(x)`.
	pub const fn succeeded(self) -> bool {
		!self.failed()
	}

	/// `IOFAILED(x)`: I/O uses a widened success set that also admits
	/// `end-of-file` and `blocking-operation`.
	pub const fn io_failed(self) -> bool {
		!matches!(self, Status::Success | Status::EndOfFile | Status::BlockingOperation)
	}

	/// `IOSUCCEEDED(x)`.
	pub const fn io_succeeded(self) -> bool {
		!self.io_failed()
	}

	/// Whether this is one of the internal page-fault restart signals
	/// (spec 7: `REFAULT` / `REFAULT_SLEEP` / `MORE_PROCESSING_REQUIRED`).
	pub const fn is_restart_signal(self) -> bool {
		matches!(
			self,
			Status::Refault | Status::RefaultSleep | Status::MoreProcessingRequired
		)
	}
}

impl fmt::Display for Status {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(self, f)
	}
}

/// A raw status code: either a plain [`Status`] cast to `i32`, or a value
/// in the `wait_n`/`abandoned_wait_n` ranges that `Status` has no variant
/// for. Wait completion functions return this rather than `Status`
/// itself, since the satisfied-index encoding is open-ended.
pub type RawStatus = i32;

/// Result alias used throughout the executive: `Ok(T)` on success, or the
/// [`Status`] that failed the call.
pub type EResult<T> = Result<T, Status>;

/// Shorthand for a call that only reports success/failure.
pub type SResult = EResult<()>;

/// Converts a boolean predicate into a [`Status`], the same shape as the
/// many `if (...) return STATUS_X;` guard clauses in the original source.
#[inline]
pub fn ensure(cond: bool, err: Status) -> SResult {
	if cond {
		Ok(())
	} else {
		Err(err)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn success_is_zero() {
		assert_eq!(Status::Success as i32, 0);
	}

	#[test]
	fn io_success_set_is_widened() {
		assert!(Status::EndOfFile.io_succeeded());
		assert!(Status::BlockingOperation.io_succeeded());
		assert!(Status::EndOfFile.failed());
	}

	#[test]
	fn wait_index_roundtrips() {
		let raw = wait_n(3);
		assert_eq!(decode_wait_index(raw), Some(3));
		let raw = abandoned_wait_n(5);
		assert_eq!(decode_wait_index(raw), Some(5));
		assert_eq!(decode_wait_index(42), None);
	}
}
