//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Optimized Link State Routing (RFC 3626).
//!
//! The protocol engine is I/O free: it consumes decoded packets and timer
//! ticks through [`instance::Instance`] and emits packets to transmit and
//! forwarding table updates on an output channel.

#![warn(rust_2018_idioms)]

pub mod config;
pub mod debug;
pub mod duplicate;
pub mod error;
pub mod events;
pub mod hna;
pub mod instance;
pub mod interface;
pub mod link;
pub mod mid;
pub mod mpr;
pub mod mpr_selector;
pub mod neighbor;
pub mod output;
pub mod packet;
pub mod route;
pub mod seqno;
pub mod southbound;
pub mod tasks;
pub mod topology;
