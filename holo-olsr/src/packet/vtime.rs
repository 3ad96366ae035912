//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Mantissa/exponent encoding of validity and emission intervals
//! (RFC 3626, section 18.3).
//!
//! An 8-bit value holds a mantissa `a` in the four high-order bits and an
//! exponent `b` in the four low-order bits, and represents
//! `C * (1 + a / 16) * 2^b` seconds, where `C` is 1/16 of a second.

use std::time::Duration;

// Granularity of the encoding (C / 16), in nanoseconds.
const UNIT_NANOS: u128 = 3_906_250;

/// Encodes a duration into its 8-bit representation.
///
/// The encoded value is the smallest representable value that is greater
/// than or equal to the input, saturating at both ends of the range.
pub fn encode(value: Duration) -> u8 {
    // Work in units of C/16, where the encoded value is (16 + a) * 2^b.
    let units = value.as_nanos().div_ceil(UNIT_NANOS);
    if units <= 16 {
        return 0;
    }

    // Smallest exponent whose largest mantissa still covers the value.
    let mut b = 0u32;
    while 31u128 << b < units {
        b += 1;
        if b > 15 {
            return 0xff;
        }
    }
    let a = units.div_ceil(1u128 << b) - 16;

    ((a as u8) << 4) | (b as u8)
}

/// Decodes an 8-bit representation into a duration.
pub fn decode(value: u8) -> Duration {
    let a = (value >> 4) as u64;
    let b = (value & 0x0f) as u32;
    let nanos = ((16 + a) << b) * UNIT_NANOS as u64;
    Duration::from_nanos(nanos)
}

// ===== unit tests =====
