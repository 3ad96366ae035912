//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use super::*;

static HNA1: Lazy<(Vec<u8>, DecodeResult<Packet>)> = Lazy::new(|| {
    (
        vec![
            0x00, 0x18, 0x00, 0x04, 0x04, 0xe7, 0x00, 0x14, 0x0a, 0x00, 0x00,
            0x01, 0xff, 0x00, 0x00, 0x08, 0xc0, 0xa8, 0x01, 0x00, 0xff, 0xff,
            0xff, 0x00,
        ],
        Ok(Packet {
            seqno: 4,
            messages: vec![Message {
                hdr: MessageHdr {
                    vtime: 0xe7,
                    originator: ip!("10.0.0.1"),
                    ttl: 255,
                    hop_count: 0,
                    seqno: 8,
                },
                body: MessageBody::Hna(Hna {
                    networks: vec![net!("192.168.1.0/24")],
                }),
            }],
        }),
    )
});

static HNA2: Lazy<(Vec<u8>, DecodeResult<Packet>)> = Lazy::new(|| {
    (
        vec![
            0x00, 0x3c, 0x00, 0x01, 0x04, 0xe7, 0x00, 0x38, 0x20, 0x01, 0x0d,
            0xb8, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x01, 0xff, 0x00, 0x00, 0x09, 0x20, 0x01, 0x0d, 0xb8, 0x00,
            0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00,
        ],
        Ok(Packet {
            seqno: 1,
            messages: vec![Message {
                hdr: MessageHdr {
                    vtime: 0xe7,
                    originator: ip!("2001:db8::1"),
                    ttl: 255,
                    hop_count: 0,
                    seqno: 9,
                },
                body: MessageBody::Hna(Hna {
                    networks: vec![net!("2001:db8:1::/48")],
                }),
            }],
        }),
    )
});

static HNA_BAD_MASK: Lazy<(Vec<u8>, DecodeResult<Packet>)> = Lazy::new(|| {
    (
        vec![
            0x00, 0x18, 0x00, 0x04, 0x04, 0xe7, 0x00, 0x14, 0x0a, 0x00, 0x00,
            0x01, 0xff, 0x00, 0x00, 0x08, 0xc0, 0xa8, 0x01, 0x00, 0xff, 0x00,
            0xff, 0x00,
        ],
        Err(DecodeError::InvalidHnaNetmask),
    )
});

#[test]
fn test_encode_hna1() {
    let (ref bytes, ref packet) = *HNA1;
    test_encode_packet(bytes, packet);
}

#[test]
fn test_decode_hna1() {
    let (ref bytes, ref packet) = *HNA1;
    test_decode_packet(AddressFamily::Ipv4, bytes, packet);
}

#[test]
fn test_encode_hna2() {
    let (ref bytes, ref packet) = *HNA2;
    test_encode_packet(bytes, packet);
}

#[test]
fn test_decode_hna2() {
    let (ref bytes, ref packet) = *HNA2;
    test_decode_packet(AddressFamily::Ipv6, bytes, packet);
}

#[test]
fn test_decode_hna_bad_mask() {
    let (ref bytes, ref packet) = *HNA_BAD_MASK;
    test_decode_packet(AddressFamily::Ipv4, bytes, packet);
}
