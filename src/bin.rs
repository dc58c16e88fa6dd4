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

//! This module exists only to link the executive, compiled as a library
//! (`boron_kernel`), into a freestanding binary image.
//!
//! Multiboot-style parsing, the serial/framebuffer console driver, the
//! `_start` entry trampoline, and the real amd64/arm64 `hal::*` backends
//! are external collaborators (spec 1) with no implementation in this
//! crate; wiring one up and calling `boron_kernel::start_up` is where a
//! bootable image's own entry point would begin.

#![no_std]
#![no_main]

extern crate boron_kernel;
