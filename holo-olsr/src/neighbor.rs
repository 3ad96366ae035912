//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeMap, BTreeSet};
use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::debug::Debug;

// One-hop neighbor, keyed by its main address.
#[derive(Debug)]
pub struct Neighbor {
    pub main_addr: IpAddr,
    pub willingness: u8,
    pub status: NeighborStatus,
    // Number of link tuples belonging to this neighbor.
    pub link_count: usize,
    pub is_mpr: bool,
    pub was_mpr: bool,
    // Number of not yet covered two-hop neighbors reachable through this
    // neighbor. Only meaningful during MPR selection.
    pub two_hop_nocov: usize,
    // Two-hop neighbors advertised by this neighbor, with their expiry.
    pub two_hop_list: BTreeMap<IpAddr, Instant>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum NeighborStatus {
    NotSym,
    Sym,
}

#[derive(Debug, Default)]
pub struct NeighborTable {
    // Incremented after every MPR computation.
    pub mpr_seqno: u16,
    entries: BTreeMap<IpAddr, Neighbor>,
}

// Two-hop neighbor, keyed by its main address.
#[derive(Debug)]
pub struct TwoHopNeighbor {
    pub addr: IpAddr,
    pub mpr_covered_count: usize,
    pub processed: bool,
    // One-hop neighbors through which this node is reachable.
    pub neighbors: BTreeSet<IpAddr>,
}

#[derive(Debug, Default)]
pub struct TwoHopTable {
    entries: BTreeMap<IpAddr, TwoHopNeighbor>,
}

// ===== impl Neighbor =====

impl Neighbor {
    fn new(main_addr: IpAddr, willingness: u8) -> Neighbor {
        Debug::NbrCreate(&main_addr).log();

        Neighbor {
            main_addr,
            willingness,
            status: NeighborStatus::NotSym,
            link_count: 0,
            is_mpr: false,
            was_mpr: false,
            two_hop_nocov: 0,
            two_hop_list: Default::default(),
        }
    }

    pub fn is_sym(&self) -> bool {
        self.status == NeighborStatus::Sym
    }
}

// ===== impl NeighborStatus =====

impl std::fmt::Display for NeighborStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NeighborStatus::NotSym => write!(f, "not-symmetric"),
            NeighborStatus::Sym => write!(f, "symmetric"),
        }
    }
}

// ===== impl NeighborTable =====

impl NeighborTable {
    pub fn get(&self, addr: &IpAddr) -> Option<&Neighbor> {
        self.entries.get(addr)
    }

    pub fn get_mut(&mut self, addr: &IpAddr) -> Option<&mut Neighbor> {
        self.entries.get_mut(addr)
    }

    // Returns the neighbor with the given main address, creating it with the
    // given willingness when it doesn't exist yet.
    pub(crate) fn get_or_create(
        &mut self,
        main_addr: IpAddr,
        willingness: u8,
    ) -> &mut Neighbor {
        self.entries
            .entry(main_addr)
            .or_insert_with(|| Neighbor::new(main_addr, willingness))
    }

    pub fn is_sym(&self, addr: &IpAddr) -> bool {
        self.get(addr).is_some_and(Neighbor::is_sym)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Neighbor> {
        self.entries.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Neighbor> {
        self.entries.values_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Returns the main addresses of all symmetric neighbors.
    pub fn sym_addrs(&self) -> BTreeSet<IpAddr> {
        self.iter()
            .filter(|nbr| nbr.is_sym())
            .map(|nbr| nbr.main_addr)
            .collect()
    }

    // Returns the main addresses of all neighbors selected as MPRs.
    pub fn mpr_set(&self) -> BTreeSet<IpAddr> {
        self.iter()
            .filter(|nbr| nbr.is_mpr)
            .map(|nbr| nbr.main_addr)
            .collect()
    }
}

// ===== impl TwoHopTable =====

impl TwoHopTable {
    pub fn get(&self, addr: &IpAddr) -> Option<&TwoHopNeighbor> {
        self.entries.get(addr)
    }

    pub fn get_mut(&mut self, addr: &IpAddr) -> Option<&mut TwoHopNeighbor> {
        self.entries.get_mut(addr)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TwoHopNeighbor> {
        self.entries.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TwoHopNeighbor> {
        self.entries.values_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ===== global functions =====

// Records that `addr2` is reachable through neighbor `nbr_addr`, refreshing
// the expiry of an existing association.
//
// Returns true when a new association was created.
pub(crate) fn two_hop_add(
    neighbors: &mut NeighborTable,
    two_hops: &mut TwoHopTable,
    nbr_addr: IpAddr,
    addr2: IpAddr,
    expiry: Instant,
) -> bool {
    let Some(nbr) = neighbors.get_mut(&nbr_addr) else {
        return false;
    };
    let new = nbr.two_hop_list.insert(addr2, expiry).is_none();
    if new {
        Debug::TwoHopNbrCreate(&addr2, &nbr_addr).log();
        two_hops
            .entries
            .entry(addr2)
            .or_insert_with(|| TwoHopNeighbor {
                addr: addr2,
                mpr_covered_count: 0,
                processed: false,
                neighbors: Default::default(),
            })
            .neighbors
            .insert(nbr_addr);
    }
    new
}

// Removes the association between neighbor `nbr_addr` and `addr2`. The
// two-hop neighbor is destroyed once no neighbor references it.
//
// Returns true when an association was removed.
pub(crate) fn two_hop_remove(
    neighbors: &mut NeighborTable,
    two_hops: &mut TwoHopTable,
    nbr_addr: IpAddr,
    addr2: IpAddr,
) -> bool {
    let Some(nbr) = neighbors.get_mut(&nbr_addr) else {
        return false;
    };
    if nbr.two_hop_list.remove(&addr2).is_none() {
        return false;
    }
    Debug::TwoHopNbrDelete(&addr2, &nbr_addr).log();
    unlink_two_hop(two_hops, nbr_addr, addr2);
    true
}

// Removes the two-hop neighbor `addr2` from the lists of all neighbors.
pub(crate) fn two_hop_delete(
    neighbors: &mut NeighborTable,
    two_hops: &mut TwoHopTable,
    addr2: IpAddr,
) -> bool {
    let Some(th) = two_hops.entries.remove(&addr2) else {
        return false;
    };
    for nbr_addr in th.neighbors {
        if let Some(nbr) = neighbors.get_mut(&nbr_addr) {
            nbr.two_hop_list.remove(&addr2);
            Debug::TwoHopNbrDelete(&addr2, &nbr_addr).log();
        }
    }
    true
}

// Deletes a neighbor along with all of its two-hop associations.
pub(crate) fn neighbor_delete(
    neighbors: &mut NeighborTable,
    two_hops: &mut TwoHopTable,
    nbr_addr: IpAddr,
) {
    let Some(nbr) = neighbors.entries.remove(&nbr_addr) else {
        return;
    };
    Debug::NbrDelete(&nbr_addr).log();
    for addr2 in nbr.two_hop_list.keys() {
        unlink_two_hop(two_hops, nbr_addr, *addr2);
    }
}

// Removes all two-hop associations whose expiry has passed.
//
// Returns true when at least one association was removed.
pub(crate) fn two_hop_expire(
    neighbors: &mut NeighborTable,
    two_hops: &mut TwoHopTable,
    now: Instant,
) -> bool {
    let expired = neighbors
        .iter()
        .flat_map(|nbr| {
            nbr.two_hop_list
                .iter()
                .filter(|(_, expiry)| **expiry <= now)
                .map(|(addr2, _)| (nbr.main_addr, *addr2))
        })
        .collect::<Vec<_>>();

    for (nbr_addr, addr2) in &expired {
        two_hop_remove(neighbors, two_hops, *nbr_addr, *addr2);
    }
    !expired.is_empty()
}

// ===== helper functions =====

fn unlink_two_hop(two_hops: &mut TwoHopTable, nbr_addr: IpAddr, addr2: IpAddr) {
    if let Some(th) = two_hops.entries.get_mut(&addr2) {
        th.neighbors.remove(&nbr_addr);
        if th.neighbors.is_empty() {
            two_hops.entries.remove(&addr2);
        }
    }
}

// ===== unit tests =====
