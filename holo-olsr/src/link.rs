//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::net::IpAddr;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::InstanceCfg;
use crate::debug::Debug;
use crate::instance::InstanceState;
use crate::neighbor::{self, NeighborStatus};
use crate::packet::{Hello, LinkType};

// Holding time of interface aliases learned from HELLO source addresses,
// until a MID message confirms them.
pub const PROVISIONAL_ALIAS_HOLD_TIME: Duration = Duration::from_secs(20);

// Link between a local interface and a neighbor interface.
#[derive(Debug)]
pub struct Link {
    pub ifindex: u32,
    pub local_addr: IpAddr,
    pub neighbor_addr: IpAddr,
    // Main address of the neighbor owning this link.
    pub neighbor: IpAddr,
    pub sym_time: Instant,
    pub asym_time: Instant,
    pub time: Instant,
    // Last link type advertised by the neighbor for this link.
    pub prev_status: LinkType,
}

#[derive(Debug, Default)]
pub struct LinkSet {
    entries: BTreeMap<(IpAddr, IpAddr), Link>,
}

// ===== impl Link =====

impl Link {
    fn new(
        ifindex: u32,
        local_addr: IpAddr,
        neighbor_addr: IpAddr,
        neighbor: IpAddr,
        now: Instant,
        vtime: Duration,
    ) -> Link {
        Debug::LinkCreate(&local_addr, &neighbor_addr).log();

        // A new link starts out neither symmetric nor asymmetric.
        Link {
            ifindex,
            local_addr,
            neighbor_addr,
            neighbor,
            sym_time: now,
            asym_time: now,
            time: now + vtime,
            prev_status: LinkType::Unspec,
        }
    }

    // Returns the current status of the link.
    pub fn status(&self, now: Instant) -> LinkType {
        if now < self.sym_time {
            LinkType::Sym
        } else if now < self.asym_time {
            LinkType::Asym
        } else {
            LinkType::Lost
        }
    }
}

// ===== impl LinkSet =====

impl LinkSet {
    pub fn get(&self, local_addr: IpAddr, neighbor_addr: IpAddr) -> Option<&Link> {
        self.entries.get(&(local_addr, neighbor_addr))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Link> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Returns all links belonging to the given neighbor.
    pub fn neighbor_links(&self, nbr_addr: IpAddr) -> impl Iterator<Item = &Link> {
        self.iter().filter(move |link| link.neighbor == nbr_addr)
    }

    // Returns whether there's a link to the given neighbor interface address.
    pub fn has_neighbor_addr(&self, addr: &IpAddr) -> bool {
        self.iter().any(|link| link.neighbor_addr == *addr)
    }

    // Returns the link to use for reaching `addr`, an interface address of
    // the neighbor whose main address is `nbr_addr`.
    //
    // A link whose neighbor interface address matches `addr` exactly wins.
    // Otherwise the last link of the neighbor, in (local, remote) address
    // order, is used.
    pub fn best_link(&self, addr: &IpAddr, nbr_addr: &IpAddr) -> Option<&Link> {
        let mut best = None;
        for link in self.neighbor_links(*nbr_addr) {
            if link.neighbor_addr == *addr {
                return Some(link);
            }
            best = Some(link);
        }
        best
    }

    fn entry(
        &mut self,
        local_addr: IpAddr,
        neighbor_addr: IpAddr,
    ) -> btree_map::Entry<'_, (IpAddr, IpAddr), Link> {
        self.entries.entry((local_addr, neighbor_addr))
    }
}

// ===== global functions =====

// Updates the link set upon receipt of a HELLO message (RFC 3626, section
// 7.1.1), followed by the status of the owning neighbor.
pub(crate) fn update_link_entry(
    state: &mut InstanceState,
    config: &InstanceCfg,
    now: Instant,
    ifindex: u32,
    local_addr: IpAddr,
    neighbor_addr: IpAddr,
    originator: IpAddr,
    hello: &Hello,
    vtime: Duration,
) {
    let link = match state.links.entry(local_addr, neighbor_addr) {
        btree_map::Entry::Occupied(o) => o.into_mut(),
        btree_map::Entry::Vacant(v) => {
            let nbr = state
                .neighbors
                .get_or_create(originator, hello.willingness);
            nbr.link_count += 1;
            state.changes_neighborhood = true;
            v.insert(Link::new(
                ifindex,
                local_addr,
                neighbor_addr,
                originator,
                now,
                vtime,
            ))
        }
    };

    link.asym_time = now + vtime;
    let status = hello.link_type_for(&local_addr).unwrap_or(LinkType::Unspec);
    match status {
        LinkType::Lost => {
            link.sym_time = now;
        }
        LinkType::Sym | LinkType::Asym => {
            link.sym_time = now + vtime;
            link.time = now + config.neighbor_hold_time;
        }
        LinkType::Unspec => (),
    }
    link.time = link.time.max(link.asym_time);
    link.prev_status = status;
    let nbr_addr = link.neighbor;

    update_neighbor_status(state, now, nbr_addr);

    // The source address of a HELLO is an interface of its originator.
    if neighbor_addr != originator && state.mid.main_addr(&neighbor_addr).is_none()
    {
        state.mid.insert(
            originator,
            neighbor_addr,
            now + PROVISIONAL_ALIAS_HOLD_TIME,
        );
    }
}

// Recomputes the status of a neighbor from the status of its links.
//
// A neighbor that becomes symmetric stops being a two-hop neighbor.
pub(crate) fn update_neighbor_status(
    state: &mut InstanceState,
    now: Instant,
    nbr_addr: IpAddr,
) {
    let status = if state
        .links
        .neighbor_links(nbr_addr)
        .any(|link| link.status(now) == LinkType::Sym)
    {
        NeighborStatus::Sym
    } else {
        NeighborStatus::NotSym
    };

    let Some(nbr) = state.neighbors.get_mut(&nbr_addr) else {
        return;
    };
    if nbr.status == status {
        return;
    }
    Debug::NbrStatusChange(&nbr_addr, status).log();
    nbr.status = status;

    if status == NeighborStatus::Sym {
        neighbor::two_hop_delete(
            &mut state.neighbors,
            &mut state.two_hop_neighbors,
            nbr_addr,
        );
    }
    state.changes_neighborhood = true;
    state.changes_topology = true;
}

// Removes links whose validity has passed. Neighbors left without links are
// deleted along with their two-hop associations and MPR selector entries.
pub(crate) fn link_expire(state: &mut InstanceState, now: Instant) {
    let expired = state
        .links
        .iter()
        .filter(|link| link.time <= now)
        .map(|link| (link.local_addr, link.neighbor_addr))
        .collect::<Vec<_>>();

    for key in expired {
        let Some(link) = state.links.entries.remove(&key) else {
            continue;
        };
        Debug::LinkTimeout(&link.local_addr, &link.neighbor_addr).log();
        state.changes_neighborhood = true;
        state.changes_topology = true;

        let Some(nbr) = state.neighbors.get_mut(&link.neighbor) else {
            continue;
        };
        nbr.link_count = nbr.link_count.saturating_sub(1);
        if nbr.link_count == 0 {
            neighbor::neighbor_delete(
                &mut state.neighbors,
                &mut state.two_hop_neighbors,
                link.neighbor,
            );
            state.mpr_selectors.remove(&link.neighbor);
        }
    }

    // Links may have dropped out of the symmetric state without expiring.
    let nbr_addrs = state
        .neighbors
        .iter()
        .map(|nbr| nbr.main_addr)
        .collect::<Vec<_>>();
    for nbr_addr in nbr_addrs {
        update_neighbor_status(state, now, nbr_addr);
    }
}

// ===== unit tests =====
