//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use super::*;

static TC1: Lazy<(Vec<u8>, DecodeResult<Packet>)> = Lazy::new(|| {
    (
        vec![
            0x00, 0x1c, 0x00, 0x02, 0x02, 0xe7, 0x00, 0x18, 0x0a, 0x00, 0x00,
            0x01, 0xff, 0x00, 0x00, 0x06, 0x00, 0x03, 0x00, 0x00, 0x0a, 0x00,
            0x00, 0x02, 0x0a, 0x00, 0x00, 0x03,
        ],
        Ok(Packet {
            seqno: 2,
            messages: vec![Message {
                hdr: MessageHdr {
                    vtime: 0xe7,
                    originator: ip!("10.0.0.1"),
                    ttl: 255,
                    hop_count: 0,
                    seqno: 6,
                },
                body: MessageBody::Tc(Tc {
                    ansn: 3,
                    addrs: vec![ip!("10.0.0.2"), ip!("10.0.0.3")],
                }),
            }],
        }),
    )
});

// Empty TC, relayed twice.
static TC2: Lazy<(Vec<u8>, DecodeResult<Packet>)> = Lazy::new(|| {
    (
        vec![
            0x00, 0x14, 0x01, 0x00, 0x02, 0xe7, 0x00, 0x10, 0x0a, 0x00, 0x00,
            0x01, 0xfd, 0x02, 0xff, 0xff, 0x00, 0x04, 0x00, 0x00,
        ],
        Ok(Packet {
            seqno: 256,
            messages: vec![Message {
                hdr: MessageHdr {
                    vtime: 0xe7,
                    originator: ip!("10.0.0.1"),
                    ttl: 253,
                    hop_count: 2,
                    seqno: 65535,
                },
                body: MessageBody::Tc(Tc {
                    ansn: 4,
                    addrs: vec![],
                }),
            }],
        }),
    )
});

static TC_BAD_ADDRS: Lazy<(Vec<u8>, DecodeResult<Packet>)> = Lazy::new(|| {
    (
        vec![
            0x00, 0x16, 0x00, 0x02, 0x02, 0xe7, 0x00, 0x12, 0x0a, 0x00, 0x00,
            0x01, 0xff, 0x00, 0x00, 0x06, 0x00, 0x03, 0x00, 0x00, 0x0a, 0x00,
        ],
        Err(DecodeError::InvalidAddressBlock(2)),
    )
});

#[test]
fn test_encode_tc1() {
    let (ref bytes, ref packet) = *TC1;
    test_encode_packet(bytes, packet);
}

#[test]
fn test_decode_tc1() {
    let (ref bytes, ref packet) = *TC1;
    test_decode_packet(AddressFamily::Ipv4, bytes, packet);
}

#[test]
fn test_encode_tc2() {
    let (ref bytes, ref packet) = *TC2;
    test_encode_packet(bytes, packet);
}

#[test]
fn test_decode_tc2() {
    let (ref bytes, ref packet) = *TC2;
    test_decode_packet(AddressFamily::Ipv4, bytes, packet);
}

#[test]
fn test_decode_tc_bad_addrs() {
    let (ref bytes, ref packet) = *TC_BAD_ADDRS;
    test_decode_packet(AddressFamily::Ipv4, bytes, packet);
}

#[test]
fn test_tc_vtime() {
    let (_, ref packet) = *TC1;
    let hdr = &packet.as_ref().unwrap().messages[0].hdr;
    assert_eq!(hdr.vtime(), std::time::Duration::from_secs(15));
}
