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

//! Kernel logging.
//!
//! Grounded in the teacher kernel's `logger.rs`/`print.rs`: a ring buffer
//! behind a lock that masks interrupts, always written to regardless of
//! whether output is currently silenced, plus `klog!`/`kprintln!` macros
//! that funnel through it. The teacher targets a TTY; this targets
//! whatever `Sink` the platform hook installs (a serial port, a framebuffer
//! console, or — for tests — an in-memory buffer), since the concrete
//! console device is an external collaborator per spec section 1.

use crate::sync::spin::IntSpin;
use core::fmt::{self, Write};

const LOG_BUFFER_SIZE: usize = 64 * 1024;

/// Anything the logger can forward freshly written bytes to, in addition
/// to keeping them in the ring buffer. Kept deliberately minimal so a
/// serial driver, a framebuffer console, or a test harness can all serve
/// as the sink.
pub trait Sink: Send {
	fn write_bytes(&mut self, bytes: &[u8]);
}

struct NullSink;
impl Sink for NullSink {
	fn write_bytes(&mut self, _bytes: &[u8]) {}
}

/// The kernel's logger: a fixed-size ring buffer of recent log bytes plus
/// an optional live sink.
pub struct Logger {
	silent: bool,
	buf: alloc::boxed::Box<[u8; LOG_BUFFER_SIZE]>,
	write_head: usize,
	filled: bool,
	sink: alloc::boxed::Box<dyn Sink>,
}

impl Logger {
	fn new() -> Self {
		Self {
			silent: false,
			buf: alloc::boxed::Box::new([0u8; LOG_BUFFER_SIZE]),
			write_head: 0,
			filled: false,
			sink: alloc::boxed::Box::new(NullSink),
		}
	}

	/// Installs the live console sink. Typically called once during
	/// `start_up`.
	pub fn set_sink(&mut self, sink: alloc::boxed::Box<dyn Sink>) {
		self.sink = sink;
	}

	/// Silences (or un-silences) live output; logs are still captured in
	/// the ring buffer either way, matching the teacher's "-silent"
	/// behaviour.
	pub fn set_silent(&mut self, silent: bool) {
		self.silent = silent;
	}

	fn write_bytes(&mut self, bytes: &[u8]) {
		for &b in bytes {
			self.buf[self.write_head] = b;
			self.write_head += 1;
			if self.write_head == self.buf.len() {
				self.write_head = 0;
				self.filled = true;
			}
		}
		if !self.silent {
			self.sink.write_bytes(bytes);
		}
	}

	/// Copies the buffer's contents (oldest first) into `out`, returning
	/// the number of bytes copied.
	pub fn snapshot(&self, out: &mut alloc::vec::Vec<u8>) {
		if self.filled {
			out.extend_from_slice(&self.buf[self.write_head..]);
		}
		out.extend_from_slice(&self.buf[..self.write_head]);
	}
}

impl Write for Logger {
	fn write_str(&mut self, s: &str) -> fmt::Result {
		self.write_bytes(s.as_bytes());
		Ok(())
	}
}

/// Global kernel logger. Interrupts are masked while held, matching the
/// teacher's `IntMutex`-guarded logger: logging must be safe to call from
/// an interrupt service routine.
pub static LOGGER: IntSpin<Logger> = IntSpin::new_lazy(Logger::new);

#[doc(hidden)]
pub fn _print(args: fmt::Arguments) {
	let mut logger = LOGGER.lock();
	let _ = fmt::write(&mut *logger, args);
}

/// Logs a message without a trailing newline.
#[macro_export]
macro_rules! klog {
	($($arg:tt)*) => {{
		$crate::logger::_print(format_args!($($arg)*));
	}};
}

/// Logs a message, appending a newline.
#[macro_export]
macro_rules! kprintln {
	() => ($crate::klog!("\n"));
	($fmt:expr) => ($crate::klog!(concat!($fmt, "\n")));
	($fmt:expr, $($arg:tt)*) => ($crate::klog!(concat!($fmt, "\n"), $($arg)*));
}
