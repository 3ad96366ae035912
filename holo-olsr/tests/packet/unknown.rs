//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use bytes::Bytes;

use super::*;

static UNKNOWN1: Lazy<(Vec<u8>, DecodeResult<Packet>)> = Lazy::new(|| {
    (
        vec![
            0x00, 0x14, 0x00, 0x05, 0xc8, 0xe7, 0x00, 0x10, 0x0a, 0x00, 0x00,
            0x01, 0x10, 0x01, 0x00, 0x0a, 0xde, 0xad, 0xbe, 0xef,
        ],
        Ok(Packet {
            seqno: 5,
            messages: vec![Message {
                hdr: MessageHdr {
                    vtime: 0xe7,
                    originator: ip!("10.0.0.1"),
                    ttl: 16,
                    hop_count: 1,
                    seqno: 10,
                },
                body: MessageBody::Unknown(UnknownMsg {
                    msg_type: 200,
                    data: Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]),
                }),
            }],
        }),
    )
});

#[test]
fn test_encode_unknown1() {
    let (ref bytes, ref packet) = *UNKNOWN1;
    test_encode_packet(bytes, packet);
}

#[test]
fn test_decode_unknown1() {
    let (ref bytes, ref packet) = *UNKNOWN1;
    test_decode_packet(AddressFamily::Ipv4, bytes, packet);
}
