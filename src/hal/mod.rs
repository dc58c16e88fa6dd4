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

//! Platform hooks: the boundary the core executive consumes from — but
//! never implements — per-architecture code (spec section 6, "Platform
//! hooks (consumed by the core)").
//!
//! Each trait here corresponds to one bullet of that list:
//!
//! - [`page_table::PageTableOps`] — "Page-table primitive".
//! - [`interrupt_controller::InterruptController`] — "Interrupt controller".
//! - [`timer::IntervalTimer`] — "Interval timer".
//! - [`cpu::CurrentCpu`] — "Current-CPU data pointer, atomic primitives".
//!
//! A real backend (amd64 `cr3`-based paging + IOAPIC + HPET, or arm64
//! equivalents) is out of scope: spec section 1 explicitly treats
//! "per-architecture register layouts" as an external collaborator. What
//! *is* in scope is the boundary itself and a simulation backend
//! (`hal::sim`) exact enough to drive the executive's logic in tests and
//! to stand in during early single-CPU bring-up.

pub mod cpu;
pub mod interrupt_controller;
pub mod page_table;
pub mod sim;
pub mod timer;

pub use cpu::CurrentCpu;
pub use interrupt_controller::InterruptController;
pub use page_table::PageTableOps;
pub use timer::IntervalTimer;
