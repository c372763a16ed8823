// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>
//! # Design: Resizable Job Dispatcher
//!
//! ## Overview
//! A single dispatch loop feeds jobs into concurrently running execution contexts.
//!
//! - Producers push submissions into an unbounded admission queue (never blocking).
//! - One loop, running on a dedicated thread, pops submissions in arrival order.
//! - Every replica of a submission needs a permit from the concurrency limiter before it
//!   is spawned on its own thread. A saturated limiter suspends the loop (backpressure).
//! - On completion the permit is returned and the completion groups are counted down.
//! - The limiter can be resized at any time; shrinking never revokes a held permit.
//!
//! ```text
//!         +-----------+   push   +-----------------+
//!         | producers +--------->+ admission queue |
//!         +-----------+          +--------+--------+
//!                                         | pop (FIFO)
//!                                +--------v--------+   acquire   +---------+
//!                                |  dispatch loop  +<------------+ limiter |
//!                                +--------+--------+             +----+----+
//!                                         | spawn                     ^
//!                                +--------v--------+    release       |
//!                                |   job thread    +------------------+
//!                                +--------+--------+
//!                                         | done
//!                                +--------v--------+
//!                                | completion grps |
//!                                +-----------------+
//! ```

pub mod admission;
pub mod closure_job;
pub mod depth;
pub mod dispatcher;
pub mod job;
pub mod limiter;
pub mod registry;

#[cfg(test)]
mod tests;
