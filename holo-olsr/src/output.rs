//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use holo_utils::UnboundedSender;
use holo_utils::ip::AddressFamily;
use itertools::Itertools;
use tokio::time::Instant;

use crate::debug::Debug;
use crate::error::Error;
use crate::instance::{Instance, MessageEvent};
use crate::interface::Interface;
use crate::packet::consts::{MAX_TTL, OLSR_PORT};
use crate::packet::{
    Hello, Hna, LinkBlock, LinkCode, LinkType, MAX_PACKET_SIZE, Message,
    MessageBody, MessageHdr, MessageType, Mid, NeighborType, Packet, Tc,
    vtime,
};
use crate::tasks::messages::ProtocolOutputMsg;
use crate::tasks::messages::output::NetTxPacketMsg;

// IPv6 destination group.
const OLSR_MCAST_GROUP: Ipv6Addr = Ipv6Addr::new(0xff0e, 0, 0, 0, 0, 0, 0, 1);

// ===== global functions =====

// Generates and sends a HELLO message on every OLSR interface.
pub(crate) fn send_hello(instance: &mut Instance, now: Instant) {
    let vtime = vtime::encode(instance.config.neighbor_hold_time);
    let htime = vtime::encode(instance.config.hello_interval);
    let af = instance.config.ip_version;
    let local_addrs = instance
        .interfaces
        .olsr()
        .map(Interface::ip)
        .collect::<Vec<_>>();

    for local_addr in local_addrs {
        let hello = Hello {
            htime,
            willingness: instance.config.willingness,
            links: hello_link_blocks(instance, now, local_addr),
        };
        let msg = Message {
            hdr: MessageHdr {
                vtime,
                originator: instance.system.main_addr,
                ttl: 1,
                hop_count: 0,
                seqno: instance.next_msg_seqno(),
            },
            body: MessageBody::Hello(hello),
        };

        let output_tx = &instance.tx.protocol_output;
        let Some(iface) = instance
            .interfaces
            .olsr_mut()
            .find(|iface| iface.ip() == local_addr)
        else {
            continue;
        };
        if send_message(iface, msg, af, output_tx) {
            instance
                .state
                .statistics
                .update(MessageType::Hello as u8, MessageEvent::Generated);
        }
    }
}

// Generates and sends a TC message advertising the MPR selector set.
//
// After the last selector is gone, empty TCs keep being sent until the
// previously advertised information expires.
pub(crate) fn send_tc(instance: &mut Instance, now: Instant) {
    let state = &mut instance.state;
    if !state.mpr_selectors.is_empty() {
        state.tc_valid_until = Some(now + instance.config.topology_hold_time);
    } else if !state.tc_valid_until.is_some_and(|until| now < until) {
        return;
    }

    let tc = Tc {
        ansn: state.mpr_selectors.ansn,
        addrs: state
            .mpr_selectors
            .iter()
            .map(|selector| selector.main_addr)
            .collect(),
    };
    let vtime = vtime::encode(instance.config.topology_hold_time);
    originate(instance, vtime, MessageBody::Tc(tc));
}

// Generates and sends a MID message declaring the non-main OLSR interface
// addresses. Nothing is sent by single-interface nodes.
pub(crate) fn send_mid(instance: &mut Instance) {
    let main_addr = instance.system.main_addr;
    let addrs = instance
        .interfaces
        .olsr()
        .map(Interface::ip)
        .filter(|addr| *addr != main_addr)
        .collect::<Vec<_>>();
    if addrs.is_empty() {
        return;
    }

    let vtime = vtime::encode(instance.config.mid_hold_time);
    originate(instance, vtime, MessageBody::Mid(Mid { addrs }));
}

// Generates and sends an HNA message advertising the networks attached to
// non-OLSR interfaces.
pub(crate) fn send_hna(instance: &mut Instance) {
    let networks = instance.interfaces.hna_networks(instance.config.ip_version);
    if networks.is_empty() {
        return;
    }

    let vtime = vtime::encode(instance.config.hna_hold_time);
    originate(instance, vtime, MessageBody::Hna(Hna { networks }));
}

// Retransmits a message on all OLSR interfaces.
pub(crate) fn forward(instance: &mut Instance, msg: &Message) {
    let af = instance.config.ip_version;
    let output_tx = &instance.tx.protocol_output;
    let mut sent = false;
    for iface in instance.interfaces.olsr_mut() {
        sent |= send_message(iface, msg.clone(), af, output_tx);
    }
    if sent {
        instance
            .state
            .statistics
            .update(msg.msg_type(), MessageEvent::Relayed);
    }
}

// ===== helper functions =====

// Builds the link blocks of a HELLO sent on the given local interface.
//
// Every link of that interface is listed with its current status. Symmetric
// neighbors reached only through other interfaces are listed with an
// unspecified link type.
fn hello_link_blocks(
    instance: &Instance,
    now: Instant,
    local_addr: IpAddr,
) -> Vec<LinkBlock> {
    let state = &instance.state;
    let nbr_type = |nbr_addr: &IpAddr| match state.neighbors.get(nbr_addr) {
        Some(nbr) if nbr.is_mpr => NeighborType::MprNeigh,
        Some(nbr) if nbr.is_sym() => NeighborType::SymNeigh,
        _ => NeighborType::NotNeigh,
    };

    let mut blocks: BTreeMap<LinkCode, Vec<IpAddr>> = BTreeMap::new();
    for link in state.links.iter().filter(|link| link.local_addr == local_addr)
    {
        let link_type = link.status(now);
        let nbr_type = match (link_type, nbr_type(&link.neighbor)) {
            // A symmetric link implies at least a symmetric neighbor.
            (LinkType::Sym, NeighborType::NotNeigh) => NeighborType::SymNeigh,
            (_, nbr_type) => nbr_type,
        };
        blocks
            .entry(LinkCode::new(link_type, nbr_type))
            .or_default()
            .push(link.neighbor_addr);
    }

    for nbr in state.neighbors.iter().filter(|nbr| nbr.is_sym()) {
        if state
            .links
            .neighbor_links(nbr.main_addr)
            .any(|link| link.local_addr == local_addr)
        {
            continue;
        }
        let nbr_type = nbr_type(&nbr.main_addr);
        let addrs = state
            .links
            .neighbor_links(nbr.main_addr)
            .map(|link| link.neighbor_addr)
            .unique();
        blocks
            .entry(LinkCode::new(LinkType::Unspec, nbr_type))
            .or_default()
            .extend(addrs);
    }

    blocks
        .into_iter()
        .map(|(code, addrs)| LinkBlock { code, addrs })
        .collect()
}

// Originates a flooded message on all OLSR interfaces.
fn originate(instance: &mut Instance, vtime: u8, body: MessageBody) {
    let msg = Message {
        hdr: MessageHdr {
            vtime,
            originator: instance.system.main_addr,
            ttl: MAX_TTL,
            hop_count: 0,
            seqno: instance.next_msg_seqno(),
        },
        body,
    };

    let af = instance.config.ip_version;
    let output_tx = &instance.tx.protocol_output;
    let mut sent = false;
    for iface in instance.interfaces.olsr_mut() {
        sent |= send_message(iface, msg.clone(), af, output_tx);
    }
    if sent {
        instance
            .state
            .statistics
            .update(msg.msg_type(), MessageEvent::Generated);
    }
}

// Wraps a message into a packet and hands it to the network layer.
fn send_message(
    iface: &mut Interface,
    msg: Message,
    af: AddressFamily,
    output_tx: &UnboundedSender<ProtocolOutputMsg>,
) -> bool {
    let packet = Packet {
        seqno: iface.next_pkt_seqno(),
        messages: vec![msg],
    };
    let size = packet.length();
    if size > MAX_PACKET_SIZE {
        Error::PacketTooLarge(iface.name.clone(), size).log();
        return false;
    }
    Debug::PacketTx(&iface.name, &packet).log();

    let msg = NetTxPacketMsg {
        ifindex: iface.ifindex,
        src: iface.ip(),
        dst: SocketAddr::new(destination(af), OLSR_PORT),
        packet,
    };
    let _ = output_tx.send(ProtocolOutputMsg::NetTxPacket(msg));
    true
}

fn destination(af: AddressFamily) -> IpAddr {
    match af {
        AddressFamily::Ipv4 => Ipv4Addr::BROADCAST.into(),
        AddressFamily::Ipv6 => OLSR_MCAST_GROUP.into(),
    }
}
