//! SPDX-License-Identifier: MIT OR Apache-2.0
//!
//! # Multiplexed ADC Scanner Core
//!
//! Hardware-independent scan logic for a board that routes 32 analog inputs
//! through two cascaded 16:1 multiplexers into a single ADC input and
//! streams every sample to a host over a serial link.
//!
//! - **Channel Selector:** mux address and bank lines (`channel.rs`).
//! - **Conversion Controller:** typed busy state machine shared with the
//!   completion interrupt (`conversion.rs`).
//! - **Report:** `Ch <n> ADC Val: <v>` lines over a blocking byte sink (`report.rs`).
//! - **Sequencer:** the main scan loop (`sequencer.rs`).
//! - **Receive Buffer:** bounded store for inbound bytes (`rx.rs`).
//!
//! The firmware binary (`main.rs`) wires these to RP2350 peripherals.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod channel;
pub mod config;
pub mod conversion;
pub mod error;
pub mod report;
pub mod rx;
pub mod sequencer;

#[cfg(test)]
mod testing;

pub use error::Error;
