//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use super::*;

static MID1: Lazy<(Vec<u8>, DecodeResult<Packet>)> = Lazy::new(|| {
    (
        vec![
            0x00, 0x14, 0x00, 0x03, 0x03, 0xe7, 0x00, 0x10, 0x0a, 0x00, 0x00,
            0x01, 0xff, 0x00, 0x00, 0x07, 0x0a, 0x00, 0x01, 0x01,
        ],
        Ok(Packet {
            seqno: 3,
            messages: vec![Message {
                hdr: MessageHdr {
                    vtime: 0xe7,
                    originator: ip!("10.0.0.1"),
                    ttl: 255,
                    hop_count: 0,
                    seqno: 7,
                },
                body: MessageBody::Mid(Mid {
                    addrs: vec![ip!("10.0.1.1")],
                }),
            }],
        }),
    )
});

// MID followed by a TC in the same packet.
static MID_TC1: Lazy<(Vec<u8>, DecodeResult<Packet>)> = Lazy::new(|| {
    (
        vec![
            0x00, 0x24, 0x00, 0x04, 0x03, 0xe7, 0x00, 0x10, 0x0a, 0x00, 0x00,
            0x01, 0xff, 0x00, 0x00, 0x08, 0x0a, 0x00, 0x01, 0x01, 0x02, 0xe7,
            0x00, 0x10, 0x0a, 0x00, 0x00, 0x01, 0xff, 0x00, 0x00, 0x09, 0x00,
            0x01, 0x00, 0x00,
        ],
        Ok(Packet {
            seqno: 4,
            messages: vec![
                Message {
                    hdr: MessageHdr {
                        vtime: 0xe7,
                        originator: ip!("10.0.0.1"),
                        ttl: 255,
                        hop_count: 0,
                        seqno: 8,
                    },
                    body: MessageBody::Mid(Mid {
                        addrs: vec![ip!("10.0.1.1")],
                    }),
                },
                Message {
                    hdr: MessageHdr {
                        vtime: 0xe7,
                        originator: ip!("10.0.0.1"),
                        ttl: 255,
                        hop_count: 0,
                        seqno: 9,
                    },
                    body: MessageBody::Tc(Tc {
                        ansn: 1,
                        addrs: vec![],
                    }),
                },
            ],
        }),
    )
});

#[test]
fn test_encode_mid1() {
    let (ref bytes, ref packet) = *MID1;
    test_encode_packet(bytes, packet);
}

#[test]
fn test_decode_mid1() {
    let (ref bytes, ref packet) = *MID1;
    test_decode_packet(AddressFamily::Ipv4, bytes, packet);
}

#[test]
fn test_encode_mid_tc1() {
    let (ref bytes, ref packet) = *MID_TC1;
    test_encode_packet(bytes, packet);
}

#[test]
fn test_decode_mid_tc1() {
    let (ref bytes, ref packet) = *MID_TC1;
    test_decode_packet(AddressFamily::Ipv4, bytes, packet);
}
