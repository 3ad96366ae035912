//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

// Largest sequence number value.
pub const MAX_VALUE: u16 = u16::MAX;

// Returns whether `s1` is newer than `s2` under wraparound (RFC 3626,
// section 19).
pub fn seqno_greater_than(s1: u16, s2: u16) -> bool {
    let half = MAX_VALUE / 2;
    (s1 > s2 && s1 - s2 <= half) || (s2 > s1 && s2 - s1 > half)
}

// ===== unit tests =====
