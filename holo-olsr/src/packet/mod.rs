//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

pub mod consts;
pub mod error;
pub mod vtime;

use std::net::IpAddr;
use std::time::Duration;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use holo_utils::bytes::{BytesExt, BytesMutExt};
use holo_utils::ip::{AddressFamily, IpAddrExt};
use ipnetwork::IpNetwork;
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};

pub use crate::packet::consts::{
    LinkType, MAX_PACKET_SIZE, MessageType, NeighborType,
};
pub use crate::packet::error::{DecodeError, DecodeResult};

//
// OLSR packet format:
//
//  0                   1                   2                   3
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |         Packet Length         |    Packet Sequence Number     |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |  Message Type |     Vtime     |         Message Size          |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                      Originator Address                       |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |  Time To Live |   Hop Count   |    Message Sequence Number    |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                                                               |
// :                            MESSAGE                            :
// |                                                               |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// :                              ...                              :
//
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Packet {
    pub seqno: u16,
    pub messages: Vec<Message>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Message {
    pub hdr: MessageHdr,
    pub body: MessageBody,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct MessageHdr {
    pub vtime: u8,
    pub originator: IpAddr,
    pub ttl: u8,
    pub hop_count: u8,
    pub seqno: u16,
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum MessageBody {
    Hello(Hello),
    Tc(Tc),
    Mid(Mid),
    Hna(Hna),
    Unknown(UnknownMsg),
}

//
// HELLO message format:
//
//  0                   1                   2                   3
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |          Reserved             |     Htime     |  Willingness  |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |   Link Code   |   Reserved    |       Link Message Size       |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                  Neighbor Interface Address                   |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// :                             ...                               :
//
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Hello {
    pub htime: u8,
    pub willingness: u8,
    pub links: Vec<LinkBlock>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LinkBlock {
    pub code: LinkCode,
    pub addrs: Vec<IpAddr>,
}

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct LinkCode {
    pub link_type: LinkType,
    pub nbr_type: NeighborType,
}

//
// TC message format:
//
//  0                   1                   2                   3
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |              ANSN             |           Reserved            |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |               Advertised Neighbor Main Address                |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// :                             ...                               :
//
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Tc {
    pub ansn: u16,
    pub addrs: Vec<IpAddr>,
}

// MID message: a plain list of interface addresses.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Mid {
    pub addrs: Vec<IpAddr>,
}

// HNA message: a list of (network address, netmask) pairs.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Hna {
    pub networks: Vec<IpNetwork>,
}

// Message of a type this implementation doesn't process. It's still subject
// to default forwarding.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct UnknownMsg {
    pub msg_type: u8,
    pub data: Bytes,
}

// ===== impl Packet =====

impl Packet {
    pub const HDR_LENGTH: usize = 4;

    // Encodes OLSR packet into a bytes buffer.
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(MAX_PACKET_SIZE);

        // The packet length is initialized to zero and updated later.
        buf.put_u16(0);
        buf.put_u16(self.seqno);
        for msg in &self.messages {
            msg.encode(&mut buf);
        }

        let pkt_len = buf.len() as u16;
        buf.patch_u16(0, pkt_len);
        buf
    }

    // Returns the encoded length of the packet.
    pub fn length(&self) -> usize {
        Self::HDR_LENGTH
            + self.messages.iter().map(Message::length).sum::<usize>()
    }

    // Decodes OLSR packet from a bytes buffer.
    pub fn decode(data: &[u8], af: AddressFamily) -> DecodeResult<Self> {
        let mut buf = Bytes::copy_from_slice(data);

        if buf.remaining() < Self::HDR_LENGTH {
            return Err(DecodeError::InvalidLength(buf.remaining()));
        }
        let pkt_len = buf.get_u16();
        if pkt_len as usize != data.len() {
            return Err(DecodeError::InvalidPacketLength(pkt_len));
        }
        let seqno = buf.get_u16();

        let mut messages = vec![];
        while buf.has_remaining() {
            messages.push(Message::decode(&mut buf, af)?);
        }

        Ok(Packet { seqno, messages })
    }
}

// ===== impl Message =====

impl Message {
    // Returns the length of the message header for the given address family.
    pub fn hdr_length(af: AddressFamily) -> usize {
        8 + af.addr_len()
    }

    // Returns the encoded length of the message, header included.
    pub fn length(&self) -> usize {
        let addr_len = self.hdr.originator.length();
        let body_len = match &self.body {
            MessageBody::Hello(hello) => {
                4 + hello
                    .links
                    .iter()
                    .map(|block| 4 + block.addrs.len() * addr_len)
                    .sum::<usize>()
            }
            MessageBody::Tc(tc) => 4 + tc.addrs.len() * addr_len,
            MessageBody::Mid(mid) => mid.addrs.len() * addr_len,
            MessageBody::Hna(hna) => hna.networks.len() * addr_len * 2,
            MessageBody::Unknown(msg) => msg.data.len(),
        };
        8 + addr_len + body_len
    }

    // Returns the on-the-wire message type.
    pub fn msg_type(&self) -> u8 {
        match &self.body {
            MessageBody::Hello(_) => MessageType::Hello as u8,
            MessageBody::Tc(_) => MessageType::Tc as u8,
            MessageBody::Mid(_) => MessageType::Mid as u8,
            MessageBody::Hna(_) => MessageType::Hna as u8,
            MessageBody::Unknown(msg) => msg.msg_type,
        }
    }

    fn encode(&self, buf: &mut BytesMut) {
        let start = buf.len();

        buf.put_u8(self.msg_type());
        buf.put_u8(self.hdr.vtime);
        // The message size is initialized to zero and updated later.
        buf.put_u16(0);
        buf.put_ip(&self.hdr.originator);
        buf.put_u8(self.hdr.ttl);
        buf.put_u8(self.hdr.hop_count);
        buf.put_u16(self.hdr.seqno);

        match &self.body {
            MessageBody::Hello(hello) => hello.encode(buf),
            MessageBody::Tc(tc) => tc.encode(buf),
            MessageBody::Mid(mid) => mid.encode(buf),
            MessageBody::Hna(hna) => hna.encode(buf),
            MessageBody::Unknown(msg) => buf.put_slice(&msg.data),
        }

        let msg_size = (buf.len() - start) as u16;
        buf.patch_u16(start + 2, msg_size);
    }

    fn decode(buf: &mut Bytes, af: AddressFamily) -> DecodeResult<Self> {
        let hdr_len = Self::hdr_length(af);
        if buf.remaining() < hdr_len {
            return Err(DecodeError::InvalidLength(buf.remaining()));
        }

        let msg_type = buf.get_u8();
        let vtime = buf.get_u8();
        let msg_size = buf.get_u16();
        if (msg_size as usize) < hdr_len
            || (msg_size as usize) > buf.remaining() + 4
        {
            return Err(DecodeError::InvalidMessageSize(msg_size));
        }
        let originator = buf.get_ip(af);
        let ttl = buf.get_u8();
        let hop_count = buf.get_u8();
        let seqno = buf.get_u16();
        let hdr = MessageHdr {
            vtime,
            originator,
            ttl,
            hop_count,
            seqno,
        };

        let mut buf_body = buf.split_to(msg_size as usize - hdr_len);
        let body = match MessageType::from_u8(msg_type) {
            Some(MessageType::Hello) => {
                MessageBody::Hello(Hello::decode(&mut buf_body, af)?)
            }
            Some(MessageType::Tc) => {
                MessageBody::Tc(Tc::decode(&mut buf_body, af)?)
            }
            Some(MessageType::Mid) => {
                MessageBody::Mid(Mid::decode(&mut buf_body, af)?)
            }
            Some(MessageType::Hna) => {
                MessageBody::Hna(Hna::decode(&mut buf_body, af)?)
            }
            None => MessageBody::Unknown(UnknownMsg {
                msg_type,
                data: buf_body,
            }),
        };

        Ok(Message { hdr, body })
    }
}

// ===== impl MessageHdr =====

impl MessageHdr {
    // Returns the decoded validity time.
    pub fn vtime(&self) -> Duration {
        vtime::decode(self.vtime)
    }
}

// ===== impl Hello =====

impl Hello {
    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u16(0);
        buf.put_u8(self.htime);
        buf.put_u8(self.willingness);

        for block in &self.links {
            let start = buf.len();
            buf.put_u8(block.code.encode());
            buf.put_u8(0);
            // The link message size is initialized to zero and updated
            // later.
            buf.put_u16(0);
            for addr in &block.addrs {
                buf.put_ip(addr);
            }
            let size = (buf.len() - start) as u16;
            buf.patch_u16(start + 2, size);
        }
    }

    fn decode(buf: &mut Bytes, af: AddressFamily) -> DecodeResult<Self> {
        if buf.remaining() < 4 {
            return Err(DecodeError::InvalidLength(buf.remaining()));
        }
        let _reserved = buf.get_u16();
        let htime = buf.get_u8();
        let willingness = buf.get_u8();

        let mut links = vec![];
        while buf.remaining() >= 4 {
            let code = buf.get_u8();
            let _reserved = buf.get_u8();
            let size = buf.get_u16();
            if size < 4 || size as usize > buf.remaining() + 4 {
                return Err(DecodeError::InvalidLinkMessageSize(size));
            }
            let mut buf_block = buf.split_to(size as usize - 4);
            let addrs = decode_addrs(&mut buf_block, af)?;

            // Link codes with invalid values are silently discarded.
            if let Some(code) = LinkCode::decode(code) {
                links.push(LinkBlock { code, addrs });
            }
        }

        Ok(Hello {
            htime,
            willingness,
            links,
        })
    }

    // Returns the link type advertised for the given address, if any.
    pub fn link_type_for(&self, addr: &IpAddr) -> Option<LinkType> {
        self.links
            .iter()
            .find(|block| block.addrs.contains(addr))
            .map(|block| block.code.link_type)
    }

    // Returns an iterator over all (neighbor type, address) pairs.
    pub fn neighbors(&self) -> impl Iterator<Item = (NeighborType, &IpAddr)> {
        self.links.iter().flat_map(|block| {
            block.addrs.iter().map(|addr| (block.code.nbr_type, addr))
        })
    }
}

// ===== impl LinkCode =====

impl LinkCode {
    pub fn new(link_type: LinkType, nbr_type: NeighborType) -> Self {
        LinkCode {
            link_type,
            nbr_type,
        }
    }

    pub fn encode(&self) -> u8 {
        (self.link_type as u8) | ((self.nbr_type as u8) << 2)
    }

    pub fn decode(code: u8) -> Option<Self> {
        if code & 0xf0 != 0 {
            return None;
        }
        let link_type = LinkType::from_u8(code & 0x03)?;
        let nbr_type = NeighborType::from_u8((code >> 2) & 0x03)?;
        // A symmetric link can't belong to a non-neighbor.
        if link_type == LinkType::Sym && nbr_type == NeighborType::NotNeigh {
            return None;
        }
        Some(LinkCode::new(link_type, nbr_type))
    }
}

// ===== impl Tc =====

impl Tc {
    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u16(self.ansn);
        buf.put_u16(0);
        for addr in &self.addrs {
            buf.put_ip(addr);
        }
    }

    fn decode(buf: &mut Bytes, af: AddressFamily) -> DecodeResult<Self> {
        if buf.remaining() < 4 {
            return Err(DecodeError::InvalidLength(buf.remaining()));
        }
        let ansn = buf.get_u16();
        let _reserved = buf.get_u16();
        let addrs = decode_addrs(buf, af)?;

        Ok(Tc { ansn, addrs })
    }
}

// ===== impl Mid =====

impl Mid {
    fn encode(&self, buf: &mut BytesMut) {
        for addr in &self.addrs {
            buf.put_ip(addr);
        }
    }

    fn decode(buf: &mut Bytes, af: AddressFamily) -> DecodeResult<Self> {
        let addrs = decode_addrs(buf, af)?;
        Ok(Mid { addrs })
    }
}

// ===== impl Hna =====

impl Hna {
    fn encode(&self, buf: &mut BytesMut) {
        for network in &self.networks {
            buf.put_ip(&network.network());
            buf.put_ip(&network.mask());
        }
    }

    fn decode(buf: &mut Bytes, af: AddressFamily) -> DecodeResult<Self> {
        let pair_len = af.addr_len() * 2;
        if buf.remaining() % pair_len != 0 {
            return Err(DecodeError::InvalidAddressBlock(buf.remaining()));
        }

        let mut networks = vec![];
        while buf.has_remaining() {
            let addr = buf.get_ip(af);
            let mask = buf.get_ip(af);
            let prefixlen = match mask {
                IpAddr::V4(mask) => ipnetwork::ipv4_mask_to_prefix(mask),
                IpAddr::V6(mask) => ipnetwork::ipv6_mask_to_prefix(mask),
            }
            .map_err(|_| DecodeError::InvalidHnaNetmask)?;
            let network = IpNetwork::new(addr, prefixlen)
                .map_err(|_| DecodeError::InvalidHnaNetmask)?;
            networks.push(network);
        }

        Ok(Hna { networks })
    }
}

// ===== helper functions =====

fn decode_addrs(
    buf: &mut Bytes,
    af: AddressFamily,
) -> DecodeResult<Vec<IpAddr>> {
    if buf.remaining() % af.addr_len() != 0 {
        return Err(DecodeError::InvalidAddressBlock(buf.remaining()));
    }

    let mut addrs = Vec::with_capacity(buf.remaining() / af.addr_len());
    while buf.has_remaining() {
        addrs.push(buf.get_ip(af));
    }
    Ok(addrs)
}
