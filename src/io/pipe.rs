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

//! Pipes (spec 4.10): "a ring buffer guarded by a mutex and two events
//! (space-available, data-available) that supports blocking and
//! non-blocking I/O and closes cleanly."
//!
//! The ring buffer itself is grounded in the teacher kernel's
//! `memory::ring_buffer::RingBuffer`: capacity minus one slot reserved so
//! `read_cursor == write_cursor` unambiguously means "empty" without a
//! separate flag, exactly as `get_available_len` computes
//! `capacity() - data_len() - 1`. A 4096-byte pipe therefore holds 4095
//! usable bytes — the numbers spec 8's scenario S3 exercises.
//!
//! The dispatch table's `read`/`write` slots make a single attempt:
//! empty/full returns `END_OF_FILE` with nothing transferred, matching
//! S3's literal contract. Nothing below `sys` carries an ambient
//! "current thread" to wait with (see [`crate::ke::wait`]'s explicit
//! `thread` parameter), so genuinely blocking I/O is layered on top by a
//! caller that does have one, waiting on `space_available`/
//! `data_available` and retrying; the documented zero-byte-write-against-
//! a-full-pipe deviation is left unimplemented per spec 9's "do not
//! guess" (see DESIGN.md).

use super::dispatch::{DispatchFlags, DispatchTable, IoInformation, IoStatusBlock, RwFlags};
use super::fcb::{Fcb, FcbType};
use crate::ke::sync_objects::{Event, EventKind};
use crate::status::Status;
use crate::sync::mutex::Mutex;
use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

struct RingBuffer {
	buf: Vec<u8>,
	read_cursor: usize,
	write_cursor: usize,
}

impl RingBuffer {
	fn new(capacity: usize) -> RingBuffer {
		RingBuffer { buf: vec![0u8; capacity.max(1)], read_cursor: 0, write_cursor: 0 }
	}

	fn capacity(&self) -> usize {
		self.buf.len()
	}

	fn data_len(&self) -> usize {
		if self.write_cursor >= self.read_cursor {
			self.write_cursor - self.read_cursor
		} else {
			self.capacity() - self.read_cursor + self.write_cursor
		}
	}

	fn available_len(&self) -> usize {
		self.capacity() - self.data_len() - 1
	}

	fn write(&mut self, src: &[u8]) -> usize {
		let n = src.len().min(self.available_len());
		for &b in &src[..n] {
			self.buf[self.write_cursor] = b;
			self.write_cursor = (self.write_cursor + 1) % self.capacity();
		}
		n
	}

	fn read(&mut self, dst: &mut [u8]) -> usize {
		let n = dst.len().min(self.data_len());
		for slot in &mut dst[..n] {
			*slot = self.buf[self.read_cursor];
			self.read_cursor = (self.read_cursor + 1) % self.capacity();
		}
		n
	}
}

/// The pipe's driver-supplied FCB extension, reached through
/// [`Fcb::extension`].
pub struct PipeState {
	ring: Mutex<RingBuffer>,
	/// Signalled whenever the buffer has room for at least one more byte;
	/// reset the instant a write fills it completely.
	pub space_available: Event,
	/// Signalled whenever the buffer holds at least one byte; reset the
	/// instant a read drains it completely.
	pub data_available: Event,
}

impl PipeState {
	fn new(capacity: usize) -> PipeState {
		PipeState {
			ring: Mutex::new(RingBuffer::new(capacity)),
			space_available: Event::new(EventKind::Notification, true),
			data_available: Event::new(EventKind::Notification, false),
		}
	}
}

/// Default pipe buffer size (spec 8, scenario S3).
pub const DEFAULT_PIPE_BUFFER: usize = 4096;

static PIPE_DISPATCH: DispatchTable = DispatchTable {
	flags: DispatchFlags::EXCLUSIVE,
	read: Some(pipe_read),
	write: Some(pipe_write),
	seekable: Some(pipe_seekable),
	..DispatchTable::empty()
};

/// Creates a new pipe FCB (backs spec 6's `OSCreatePipe`). The returned
/// FCB has no CCB: pipes never participate in the page cache.
pub fn create_pipe(buffer_size: usize) -> Arc<Fcb> {
	let state = PipeState::new(buffer_size);
	Arc::new(Fcb::new(&PIPE_DISPATCH, FcbType::Pipe, None, 0, Box::new(state)))
}

fn pipe_seekable(_fcb: &Fcb) -> bool {
	false
}

fn pipe_read(fcb: &Fcb, _offset: u64, buf: &mut [u8], _flags: RwFlags) -> IoStatusBlock {
	let Some(state) = fcb.extension::<PipeState>() else {
		return IoStatusBlock::failed(Status::InvalidParameter);
	};
	if buf.is_empty() {
		return IoStatusBlock::ok(IoInformation::BytesTransferred(0));
	}
	let mut ring = state.ring.lock();
	if ring.data_len() == 0 {
		return IoStatusBlock::failed(Status::EndOfFile);
	}
	let n = ring.read(buf);
	if ring.data_len() == 0 {
		state.data_available.reset();
	}
	state.space_available.signal();
	IoStatusBlock::ok(IoInformation::BytesTransferred(n as u64))
}

fn pipe_write(fcb: &Fcb, _offset: u64, buf: &[u8], _flags: RwFlags) -> IoStatusBlock {
	let Some(state) = fcb.extension::<PipeState>() else {
		return IoStatusBlock::failed(Status::InvalidParameter);
	};
	if buf.is_empty() {
		return IoStatusBlock::ok(IoInformation::BytesTransferred(0));
	}
	let mut ring = state.ring.lock();
	if ring.available_len() == 0 {
		return IoStatusBlock::failed(Status::EndOfFile);
	}
	let n = ring.write(buf);
	if ring.available_len() == 0 {
		state.space_available.reset();
	}
	state.data_available.signal();
	IoStatusBlock::ok(IoInformation::BytesTransferred(n as u64))
}

#[cfg(test)]
mod tests {
	use super::*;
	use super::super::dispatch::RwFlags;

	#[test]
	fn scenario_s3_pipe_full_and_empty() {
		let pipe = create_pipe(DEFAULT_PIPE_BUFFER);
		let input = vec![0xABu8; 4095];

		let r = pipe_write(&pipe, 0, &input, RwFlags::empty());
		assert_eq!(r.status, Status::Success);
		assert_eq!(r.information, IoInformation::BytesTransferred(4095));

		let r = pipe_write(&pipe, 0, &[0x11], RwFlags::empty());
		assert_eq!(r.status, Status::EndOfFile);

		let mut out = vec![0u8; 4095];
		let r = pipe_read(&pipe, 0, &mut out, RwFlags::empty());
		assert_eq!(r.status, Status::Success);
		assert_eq!(r.information, IoInformation::BytesTransferred(4095));
		assert_eq!(out, input);

		let mut one = [0u8; 1];
		let r = pipe_read(&pipe, 0, &mut one, RwFlags::empty());
		assert_eq!(r.status, Status::EndOfFile);
	}

	#[test]
	fn events_track_fullness() {
		let pipe = create_pipe(4);
		let state = pipe.extension::<PipeState>().unwrap();
		assert!(state.space_available.is_signaled());
		assert!(!state.data_available.is_signaled());

		pipe_write(&pipe, 0, &[1, 2, 3], RwFlags::empty());
		assert!(!state.space_available.is_signaled());
		assert!(state.data_available.is_signaled());

		let mut buf = [0u8; 3];
		pipe_read(&pipe, 0, &mut buf, RwFlags::empty());
		assert!(state.space_available.is_signaled());
		assert!(!state.data_available.is_signaled());
	}

	#[test]
	fn zero_byte_write_never_reports_end_of_file() {
		let pipe = create_pipe(4);
		pipe_write(&pipe, 0, &[1, 2, 3], RwFlags::empty());
		let r = pipe_write(&pipe, 0, &[], RwFlags::empty());
		assert_eq!(r.status, Status::Success);
	}
}
