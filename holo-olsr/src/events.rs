//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::IpAddr;

use tokio::time::Instant;

use crate::debug::Debug;
use crate::error::Error;
use crate::instance::{Instance, MessageEvent};
use crate::packet::{
    DecodeError, Hello, Hna, Message, MessageBody, MessageHdr, MessageType,
    Mid, NeighborType, Packet, Tc,
};
use crate::tasks::messages::input::HoldTable;
use crate::{link, mpr, neighbor, output, route};

// ===== packet receipt =====

// Processes a packet received on the given interface (RFC 3626, section 3.4).
pub fn process_packet(
    instance: &mut Instance,
    now: Instant,
    ifindex: u32,
    src: IpAddr,
    packet: Result<Packet, DecodeError>,
) {
    let Some(iface) = instance.interfaces.get_by_ifindex(ifindex) else {
        Error::UnknownInterface(ifindex).log();
        return;
    };
    if !iface.olsr {
        return;
    }
    let local_addr = iface.ip();

    let packet = match packet {
        Ok(packet) => packet,
        Err(error) => {
            Error::PacketDecodeError(iface.name.clone(), src, error).log();
            return;
        }
    };
    Debug::PacketRx(&iface.name, &src, &packet).log();

    // Ignore packets sent by ourselves.
    if instance.interfaces.contains_addr(&src) {
        return;
    }

    for msg in packet.messages {
        process_message(instance, now, ifindex, local_addr, src, msg);
    }
}

fn process_message(
    instance: &mut Instance,
    now: Instant,
    ifindex: u32,
    local_addr: IpAddr,
    src: IpAddr,
    msg: Message,
) {
    let hdr = &msg.hdr;
    if hdr.ttl == 0 || instance.interfaces.contains_addr(&hdr.originator) {
        return;
    }

    // HELLOs are never forwarded nor checked for duplicates.
    if let MessageBody::Hello(hello) = &msg.body {
        process_hello(instance, now, ifindex, local_addr, src, hdr, hello);
        return;
    }

    let forward = if instance.state.duplicates.contains(hdr.originator, hdr.seqno)
    {
        // Already processed, but it may still have to be forwarded on this
        // interface unless it turned out to be stale.
        match &msg.body {
            MessageBody::Tc(tc) => !is_stale_tc(instance, hdr, tc),
            _ => true,
        }
    } else {
        let expiry = now + instance.config.duplicate_hold_time;
        instance
            .state
            .duplicates
            .insert(hdr.originator, hdr.seqno, expiry);

        match &msg.body {
            MessageBody::Hello(_) => false,
            MessageBody::Tc(tc) => process_tc(instance, now, src, hdr, tc),
            MessageBody::Mid(mid) => process_mid(instance, now, src, hdr, mid),
            MessageBody::Hna(hna) => process_hna(instance, now, src, hdr, hna),
            MessageBody::Unknown(_) => true,
        }
    };

    if forward {
        forward_message(instance, now, local_addr, src, &msg);
    }
}

// Processes a HELLO message: link sensing, neighbor detection, two-hop
// neighbor and MPR selector maintenance (RFC 3626, sections 7.1.1, 8.1.1,
// 8.2.1 and 8.4.1).
pub(crate) fn process_hello(
    instance: &mut Instance,
    now: Instant,
    ifindex: u32,
    local_addr: IpAddr,
    src: IpAddr,
    hdr: &MessageHdr,
    hello: &Hello,
) {
    let vtime = hdr.vtime();
    let originator = hdr.originator;
    instance
        .state
        .statistics
        .update(MessageType::Hello as u8, MessageEvent::Received);

    link::update_link_entry(
        &mut instance.state,
        &instance.config,
        now,
        ifindex,
        local_addr,
        src,
        originator,
        hello,
        vtime,
    );

    let state = &mut instance.state;
    let Some(nbr) = state.neighbors.get_mut(&originator) else {
        return;
    };
    if nbr.willingness != hello.willingness {
        nbr.willingness = hello.willingness;
        state.changes_neighborhood = true;
        state.changes_topology = true;
    }
    if !nbr.is_sym() {
        return;
    }

    // Two-hop neighbors.
    for (nbr_type, addr) in hello.neighbors() {
        let addr2 = state.mid.resolve(*addr);
        if addr2 == originator
            || instance.interfaces.contains_addr(addr)
            || instance.interfaces.contains_addr(&addr2)
        {
            continue;
        }
        let changed = match nbr_type {
            NeighborType::SymNeigh | NeighborType::MprNeigh => {
                neighbor::two_hop_add(
                    &mut state.neighbors,
                    &mut state.two_hop_neighbors,
                    originator,
                    addr2,
                    now + vtime,
                )
            }
            NeighborType::NotNeigh => neighbor::two_hop_remove(
                &mut state.neighbors,
                &mut state.two_hop_neighbors,
                originator,
                addr2,
            ),
        };
        if changed {
            state.changes_neighborhood = true;
            state.changes_topology = true;
        }
    }

    // MPR selectors.
    let selected = hello.neighbors().any(|(nbr_type, addr)| {
        nbr_type == NeighborType::MprNeigh
            && instance.interfaces.contains_addr(addr)
    });
    if selected {
        state.mpr_selectors.insert(originator, now + vtime);
    }
}

// Processes a TC message (RFC 3626, section 9.5).
//
// Returns whether the message is eligible for forwarding.
pub(crate) fn process_tc(
    instance: &mut Instance,
    now: Instant,
    src: IpAddr,
    hdr: &MessageHdr,
    tc: &Tc,
) -> bool {
    let state = &mut instance.state;
    state
        .statistics
        .update(MessageType::Tc as u8, MessageEvent::Received);

    // Only accept topology information from symmetric neighbors.
    if !state.neighbors.is_sym(&state.mid.resolve(src)) {
        return false;
    }
    if is_stale_tc(instance, hdr, tc) {
        return false;
    }

    let state = &mut instance.state;
    let addrs = tc
        .addrs
        .iter()
        .filter(|addr| !instance.interfaces.contains_addr(addr))
        .copied()
        .collect::<Vec<_>>();
    if state
        .topology
        .update(hdr.originator, tc.ansn, &addrs, now + hdr.vtime())
    {
        state.changes_topology = true;
    }
    true
}

// Processes a MID message (RFC 3626, section 5.4).
//
// Returns whether the message is eligible for forwarding.
pub(crate) fn process_mid(
    instance: &mut Instance,
    now: Instant,
    src: IpAddr,
    hdr: &MessageHdr,
    mid: &Mid,
) -> bool {
    let state = &mut instance.state;
    state
        .statistics
        .update(MessageType::Mid as u8, MessageEvent::Received);

    if !state.neighbors.is_sym(&state.mid.resolve(src)) {
        return false;
    }

    let expiry = now + hdr.vtime();
    for alias in &mid.addrs {
        if *alias == hdr.originator || instance.interfaces.contains_addr(alias)
        {
            continue;
        }
        if state.mid.insert(hdr.originator, *alias, expiry) {
            state.changes_topology = true;
        }
    }
    true
}

// Processes an HNA message (RFC 3626, section 12.5).
//
// Returns whether the message is eligible for forwarding.
pub(crate) fn process_hna(
    instance: &mut Instance,
    now: Instant,
    src: IpAddr,
    hdr: &MessageHdr,
    hna: &Hna,
) -> bool {
    let state = &mut instance.state;
    state
        .statistics
        .update(MessageType::Hna as u8, MessageEvent::Received);

    if !state.neighbors.is_sym(&state.mid.resolve(src)) {
        return false;
    }

    let expiry = now + hdr.vtime();
    for network in &hna.networks {
        if state.hna.insert(hdr.originator, *network, expiry) {
            state.changes_topology = true;
        }
    }
    true
}

// Default forwarding algorithm (RFC 3626, section 3.4.1).
//
// Returns whether the message was retransmitted.
pub(crate) fn forward_message(
    instance: &mut Instance,
    now: Instant,
    local_addr: IpAddr,
    src: IpAddr,
    msg: &Message,
) -> bool {
    let hdr = &msg.hdr;
    let state = &mut instance.state;

    // The sender interface must belong to a symmetric neighbor.
    let sender = state.mid.resolve(src);
    if !state.neighbors.is_sym(&sender) {
        return false;
    }

    // Never consider the same message twice on the same interface.
    if state
        .duplicates
        .is_forwarded(hdr.originator, hdr.seqno, &local_addr)
    {
        return false;
    }

    let expiry = now + instance.config.duplicate_hold_time;
    let entry = state.duplicates.insert(hdr.originator, hdr.seqno, expiry);
    entry.ifaces.insert(local_addr);

    // Only MPRs of the sender retransmit, and only while TTL allows.
    if hdr.ttl <= 1 || !state.mpr_selectors.contains(&sender) {
        return false;
    }
    entry.retransmitted = true;

    let mut fwd_msg = msg.clone();
    fwd_msg.hdr.ttl -= 1;
    fwd_msg.hdr.hop_count = fwd_msg.hdr.hop_count.saturating_add(1);
    Debug::MessageForward(&hdr.originator, hdr.seqno, fwd_msg.hdr.ttl).log();
    output::forward(instance, &fwd_msg);
    true
}

// ===== timers =====

pub fn process_hello_interval(instance: &mut Instance, now: Instant) {
    output::send_hello(instance, now);
}

pub fn process_tc_interval(instance: &mut Instance, now: Instant) {
    output::send_tc(instance, now);
}

pub fn process_mid_interval(instance: &mut Instance, _now: Instant) {
    output::send_mid(instance);
}

pub fn process_hna_interval(instance: &mut Instance, _now: Instant) {
    output::send_hna(instance);
}

// Removes expired entries from the given table and applies the resulting
// changes.
pub fn process_hold_timer(
    instance: &mut Instance,
    now: Instant,
    table: HoldTable,
) {
    let state = &mut instance.state;
    match table {
        HoldTable::Neighbor => {
            state.mpr_selectors.expire(now);
            link::link_expire(state, now);
            if neighbor::two_hop_expire(
                &mut state.neighbors,
                &mut state.two_hop_neighbors,
                now,
            ) {
                state.changes_neighborhood = true;
                state.changes_topology = true;
            }
        }
        HoldTable::Topology => {
            if state.topology.expire(now) {
                state.changes_topology = true;
            }
        }
        HoldTable::Duplicate => {
            state.duplicates.expire(now);
        }
        HoldTable::Mid => {
            if state.mid.expire(now) {
                state.changes_topology = true;
            }
        }
        HoldTable::Hna => {
            if state.hna.expire(now) {
                state.changes_topology = true;
            }
        }
    }

    process_changes(instance);
}

// Recomputes the MPR set and the routing table as required by pending
// neighborhood or topology changes.
pub fn process_changes(instance: &mut Instance) {
    let state = &mut instance.state;
    if state.changes_neighborhood {
        mpr::calculate_mpr(state, instance.config.mpr_coverage);
        route::calculate_routing_table(
            state,
            &instance.interfaces,
            &instance.tx.protocol_output,
        );
    } else if state.changes_topology {
        route::calculate_routing_table(
            state,
            &instance.interfaces,
            &instance.tx.protocol_output,
        );
    }
    state.changes_neighborhood = false;
    state.changes_topology = false;
}

// ===== helper functions =====

fn is_stale_tc(instance: &Instance, hdr: &MessageHdr, tc: &Tc) -> bool {
    if instance.state.topology.is_stale(&hdr.originator, tc.ansn) {
        Debug::TcDiscardStale(&hdr.originator, tc.ansn).log();
        return true;
    }
    false
}
