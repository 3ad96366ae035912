//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

mod hello;
mod hna;
mod mid;
mod tc;
mod unknown;

use std::sync::LazyLock as Lazy;

use const_addrs::{ip, net};
use holo_olsr::packet::*;
use holo_utils::ip::AddressFamily;

//
// Helper functions.
//

fn test_encode_packet(bytes_expected: &[u8], packet: &DecodeResult<Packet>) {
    let packet = packet.as_ref().unwrap();
    let bytes_actual = packet.encode();
    assert_eq!(bytes_expected, bytes_actual.as_ref());
    assert_eq!(packet.length(), bytes_expected.len());
}

fn test_decode_packet(
    af: AddressFamily,
    bytes: &[u8],
    packet_expected: &DecodeResult<Packet>,
) {
    let packet_actual = Packet::decode(bytes, af);
    assert_eq!(*packet_expected, packet_actual);
}

//
// Tests.
//

#[test]
fn test_decode_short_buffer() {
    test_decode_packet(
        AddressFamily::Ipv4,
        &[0x00],
        &Err(DecodeError::InvalidLength(1)),
    );
}

#[test]
fn test_decode_packet_length_mismatch() {
    test_decode_packet(
        AddressFamily::Ipv4,
        &[0x00, 0x08, 0x00, 0x01],
        &Err(DecodeError::InvalidPacketLength(8)),
    );
}

#[test]
fn test_decode_message_size_too_small() {
    test_decode_packet(
        AddressFamily::Ipv4,
        &[
            0x00, 0x10, 0x00, 0x01, 0x02, 0xe7, 0x00, 0x04, 0x0a, 0x00, 0x00,
            0x01, 0xff, 0x00, 0x00, 0x06,
        ],
        &Err(DecodeError::InvalidMessageSize(4)),
    );
}

#[test]
fn test_decode_message_size_overflow() {
    test_decode_packet(
        AddressFamily::Ipv4,
        &[
            0x00, 0x10, 0x00, 0x01, 0x02, 0xe7, 0x00, 0x20, 0x0a, 0x00, 0x00,
            0x01, 0xff, 0x00, 0x00, 0x06,
        ],
        &Err(DecodeError::InvalidMessageSize(32)),
    );
}

#[test]
fn test_decode_empty_packet() {
    test_decode_packet(
        AddressFamily::Ipv6,
        &[0x00, 0x04, 0x00, 0x07],
        &Ok(Packet {
            seqno: 7,
            messages: vec![],
        }),
    );
}
