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

//! Build-time configuration, read from `Boron.toml` by `build/main.rs` and
//! baked in as constants (spec: "Build-time configuration knobs").

pub mod generated {
	include!(concat!(env!("OUT_DIR"), "/config.rs"));
}

pub use generated::{EMBEDDED_WAIT_BLOCKS, MAX_CPUS, MAX_WAIT_BLOCKS, PRIORITY_LEVELS, TICK_HZ};
