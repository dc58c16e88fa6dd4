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

//! Locking primitives and IPL management (spec 4.1, "Concurrency primitives
//! (locks, IPL discipline, dispatcher waits)").
//!
//! This module holds the *raw* primitives: IPL raise/lower, an
//! interrupt-masking spinlock ([`spin::IntSpin`]), a fair ticket spinlock
//! ([`ticket::TicketSpin`]), and passive-level spin-based `Mutex`/`RwLock`.
//! Thread-blocking synchronization — the kind that parks a thread on a
//! wait list instead of spinning — is a dispatcher object and lives in
//! [`crate::ke`], layered on top of these.

pub mod ipl;
pub mod mutex;
pub mod rwlock;
pub mod spin;
pub mod ticket;

pub use ipl::Ipl;
pub use mutex::Mutex;
pub use rwlock::RwLock;
pub use spin::IntSpin;
pub use ticket::TicketSpin;
