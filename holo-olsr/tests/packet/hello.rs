//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use super::*;

static HELLO1: Lazy<(Vec<u8>, DecodeResult<Packet>)> = Lazy::new(|| {
    (
        vec![
            0x00, 0x28, 0x00, 0x01, 0x01, 0x86, 0x00, 0x24, 0x0a, 0x00, 0x00,
            0x01, 0x01, 0x00, 0x00, 0x05, 0x00, 0x00, 0x05, 0x03, 0x06, 0x00,
            0x00, 0x0c, 0x0a, 0x00, 0x00, 0x02, 0x0a, 0x00, 0x00, 0x03, 0x01,
            0x00, 0x00, 0x08, 0x0a, 0x00, 0x00, 0x04,
        ],
        Ok(Packet {
            seqno: 1,
            messages: vec![Message {
                hdr: MessageHdr {
                    vtime: 0x86,
                    originator: ip!("10.0.0.1"),
                    ttl: 1,
                    hop_count: 0,
                    seqno: 5,
                },
                body: MessageBody::Hello(Hello {
                    htime: 0x05,
                    willingness: 3,
                    links: vec![
                        LinkBlock {
                            code: LinkCode::new(
                                LinkType::Sym,
                                NeighborType::SymNeigh,
                            ),
                            addrs: vec![ip!("10.0.0.2"), ip!("10.0.0.3")],
                        },
                        LinkBlock {
                            code: LinkCode::new(
                                LinkType::Asym,
                                NeighborType::NotNeigh,
                            ),
                            addrs: vec![ip!("10.0.0.4")],
                        },
                    ],
                }),
            }],
        }),
    )
});

// The first link block carries an invalid link code (SYM_LINK with
// NOT_NEIGH) and is skipped.
static HELLO2: Lazy<(Vec<u8>, DecodeResult<Packet>)> = Lazy::new(|| {
    (
        vec![
            0x00, 0x24, 0x00, 0x02, 0x01, 0x86, 0x00, 0x20, 0x0a, 0x00, 0x00,
            0x01, 0x01, 0x00, 0x00, 0x06, 0x00, 0x00, 0x05, 0x07, 0x02, 0x00,
            0x00, 0x08, 0x0a, 0x00, 0x00, 0x02, 0x0a, 0x00, 0x00, 0x08, 0x0a,
            0x00, 0x00, 0x03,
        ],
        Ok(Packet {
            seqno: 2,
            messages: vec![Message {
                hdr: MessageHdr {
                    vtime: 0x86,
                    originator: ip!("10.0.0.1"),
                    ttl: 1,
                    hop_count: 0,
                    seqno: 6,
                },
                body: MessageBody::Hello(Hello {
                    htime: 0x05,
                    willingness: 7,
                    links: vec![LinkBlock {
                        code: LinkCode::new(
                            LinkType::Sym,
                            NeighborType::MprNeigh,
                        ),
                        addrs: vec![ip!("10.0.0.3")],
                    }],
                }),
            }],
        }),
    )
});

static HELLO_BAD_LINK_SIZE: Lazy<(Vec<u8>, DecodeResult<Packet>)> =
    Lazy::new(|| {
        (
            vec![
                0x00, 0x1c, 0x00, 0x03, 0x01, 0x86, 0x00, 0x18, 0x0a, 0x00,
                0x00, 0x01, 0x01, 0x00, 0x00, 0x07, 0x00, 0x00, 0x05, 0x03,
                0x06, 0x00, 0x00, 0x0c, 0x0a, 0x00, 0x00, 0x02,
            ],
            Err(DecodeError::InvalidLinkMessageSize(12)),
        )
    });

#[test]
fn test_encode_hello1() {
    let (ref bytes, ref packet) = *HELLO1;
    test_encode_packet(bytes, packet);
}

#[test]
fn test_decode_hello1() {
    let (ref bytes, ref packet) = *HELLO1;
    test_decode_packet(AddressFamily::Ipv4, bytes, packet);
}

#[test]
fn test_decode_hello2() {
    let (ref bytes, ref packet) = *HELLO2;
    test_decode_packet(AddressFamily::Ipv4, bytes, packet);
}

#[test]
fn test_decode_hello_bad_link_size() {
    let (ref bytes, ref packet) = *HELLO_BAD_LINK_SIZE;
    test_decode_packet(AddressFamily::Ipv4, bytes, packet);
}

#[test]
fn test_hello_lookups() {
    let (_, ref packet) = *HELLO1;
    let MessageBody::Hello(hello) = &packet.as_ref().unwrap().messages[0].body
    else {
        panic!("not a HELLO");
    };
    assert_eq!(hello.link_type_for(&ip!("10.0.0.3")), Some(LinkType::Sym));
    assert_eq!(hello.link_type_for(&ip!("10.0.0.4")), Some(LinkType::Asym));
    assert_eq!(hello.link_type_for(&ip!("10.0.0.5")), None);
    assert_eq!(hello.neighbors().count(), 3);
}
