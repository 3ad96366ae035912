//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use num_derive::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

// Well-known UDP port.
pub const OLSR_PORT: u16 = 698;

// Largest packet this implementation sends or accepts.
pub const MAX_PACKET_SIZE: usize = 2000;

// Largest TTL value.
pub const MAX_TTL: u8 = 255;

// Willingness values.
pub const WILL_NEVER: u8 = 0;
pub const WILL_LOW: u8 = 1;
pub const WILL_DEFAULT: u8 = 3;
pub const WILL_HIGH: u8 = 6;
pub const WILL_ALWAYS: u8 = 7;

// OLSR message types.
//
// IANA registry:
// https://www.iana.org/assignments/manet-parameters/manet-parameters.xhtml
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(FromPrimitive, ToPrimitive)]
#[derive(Deserialize, Serialize)]
pub enum MessageType {
    Hello = 1,
    Tc = 2,
    Mid = 3,
    Hna = 4,
}

// Link type carried in the two low-order bits of a HELLO link code.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(FromPrimitive, ToPrimitive)]
#[derive(Deserialize, Serialize)]
pub enum LinkType {
    Unspec = 0,
    Asym = 1,
    Sym = 2,
    Lost = 3,
}

// Neighbor type carried in bits 2-3 of a HELLO link code.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(FromPrimitive, ToPrimitive)]
#[derive(Deserialize, Serialize)]
pub enum NeighborType {
    NotNeigh = 0,
    SymNeigh = 1,
    MprNeigh = 2,
}

// ===== impl LinkType =====

impl std::fmt::Display for LinkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkType::Unspec => write!(f, "unspecified"),
            LinkType::Asym => write!(f, "asymmetric"),
            LinkType::Sym => write!(f, "symmetric"),
            LinkType::Lost => write!(f, "lost"),
        }
    }
}
