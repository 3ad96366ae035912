//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use serde::{Deserialize, Serialize};

// Type aliases.
pub type DecodeResult<T> = Result<T, DecodeError>;

// OLSR packet decoding errors.
#[derive(Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum DecodeError {
    InvalidLength(usize),
    InvalidPacketLength(u16),
    InvalidMessageSize(u16),
    InvalidLinkMessageSize(u16),
    InvalidAddressBlock(usize),
    InvalidHnaNetmask,
}

// ===== impl DecodeError =====

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::InvalidLength(len) => {
                write!(f, "invalid buffer length: {}", len)
            }
            DecodeError::InvalidPacketLength(pkt_len) => {
                write!(f, "invalid packet length: {}", pkt_len)
            }
            DecodeError::InvalidMessageSize(msg_size) => {
                write!(f, "invalid message size: {}", msg_size)
            }
            DecodeError::InvalidLinkMessageSize(size) => {
                write!(f, "invalid link message size: {}", size)
            }
            DecodeError::InvalidAddressBlock(len) => {
                write!(f, "invalid address block length: {}", len)
            }
            DecodeError::InvalidHnaNetmask => {
                write!(f, "invalid HNA netmask")
            }
        }
    }
}

impl std::error::Error for DecodeError {}
