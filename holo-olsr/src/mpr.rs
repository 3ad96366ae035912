//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;
use std::net::IpAddr;

use crate::debug::Debug;
use crate::instance::InstanceState;
use crate::neighbor::{NeighborTable, TwoHopTable};
use crate::packet::consts::{WILL_ALWAYS, WILL_NEVER};

// Selects the MPR set among the symmetric one-hop neighbors so that every
// strict two-hop neighbor is covered by at least `coverage` MPRs whenever
// possible (RFC 3626, section 8.3.1).
pub(crate) fn calculate_mpr(state: &mut InstanceState, coverage: usize) {
    let neighbors = &mut state.neighbors;
    let two_hops = &mut state.two_hop_neighbors;
    let old_mprs = neighbors.mpr_set();

    clear_mprs(neighbors, two_hops);

    let sym = neighbors.sym_addrs();
    let two_hop_count = calculate_two_hop_coverage(neighbors, two_hops, &sym);
    let mut covered = 0;

    // Neighbors always willing to forward are selected unconditionally.
    let always = neighbors
        .iter()
        .filter(|nbr| nbr.is_sym() && nbr.willingness == WILL_ALWAYS)
        .map(|nbr| nbr.main_addr)
        .collect::<Vec<_>>();
    for addr in always {
        choose_mpr(neighbors, two_hops, &sym, addr, coverage, &mut covered);
    }

    for willingness in (WILL_NEVER + 1..WILL_ALWAYS).rev() {
        if covered >= two_hop_count {
            break;
        }

        // Neighbors that are among the only ones able to reach a two-hop
        // neighbor are required regardless of their willingness.
        for addr in required_coverers(neighbors, two_hops, &sym, coverage) {
            choose_mpr(neighbors, two_hops, &sym, addr, coverage, &mut covered);
        }

        while covered < two_hop_count {
            let Some(addr) = max_coverage_neighbor(neighbors, willingness)
            else {
                break;
            };
            choose_mpr(neighbors, two_hops, &sym, addr, coverage, &mut covered);
        }
    }

    neighbors.mpr_seqno = neighbors.mpr_seqno.wrapping_add(1);

    let mprs = neighbors.mpr_set();
    if mprs != old_mprs {
        Debug::MprSetChange(&mprs).log();
    }
}

// ===== helper functions =====

fn clear_mprs(neighbors: &mut NeighborTable, two_hops: &mut TwoHopTable) {
    for nbr in neighbors.iter_mut() {
        nbr.was_mpr = nbr.is_mpr;
        nbr.is_mpr = false;
        nbr.two_hop_nocov = 0;
    }
    for th in two_hops.iter_mut() {
        th.mpr_covered_count = 0;
        th.processed = false;
    }
}

// Computes, for every willing symmetric neighbor, how many strict two-hop
// neighbors it reaches.
//
// Returns the number of distinct two-hop neighbors that can be covered.
fn calculate_two_hop_coverage(
    neighbors: &mut NeighborTable,
    two_hops: &mut TwoHopTable,
    sym: &BTreeSet<IpAddr>,
) -> usize {
    let mut count = 0;

    for nbr in neighbors.iter_mut() {
        if !nbr.is_sym() || nbr.willingness == WILL_NEVER {
            continue;
        }
        for addr2 in nbr.two_hop_list.keys() {
            if sym.contains(addr2) {
                continue;
            }
            nbr.two_hop_nocov += 1;
            if let Some(th) = two_hops.get_mut(addr2)
                && !th.processed
            {
                th.processed = true;
                count += 1;
            }
        }
    }

    count
}

// Returns the not yet selected neighbors that are among at most `coverage`
// possible coverers of a not yet sufficiently covered two-hop neighbor.
fn required_coverers(
    neighbors: &NeighborTable,
    two_hops: &TwoHopTable,
    sym: &BTreeSet<IpAddr>,
    coverage: usize,
) -> BTreeSet<IpAddr> {
    let mut required = BTreeSet::new();

    for th in two_hops.iter() {
        if th.mpr_covered_count >= coverage || sym.contains(&th.addr) {
            continue;
        }
        let coverers = th
            .neighbors
            .iter()
            .filter_map(|addr| neighbors.get(addr))
            .filter(|nbr| nbr.is_sym() && nbr.willingness != WILL_NEVER)
            .collect::<Vec<_>>();
        if coverers.len() <= coverage {
            required.extend(
                coverers
                    .iter()
                    .filter(|nbr| !nbr.is_mpr)
                    .map(|nbr| nbr.main_addr),
            );
        }
    }

    required
}

// Returns the unselected neighbor with the given willingness that covers the
// most remaining two-hop neighbors. Ties go to the lowest address.
fn max_coverage_neighbor(
    neighbors: &NeighborTable,
    willingness: u8,
) -> Option<IpAddr> {
    let mut best: Option<(IpAddr, usize)> = None;
    for nbr in neighbors.iter().filter(|nbr| {
        nbr.is_sym()
            && !nbr.is_mpr
            && nbr.willingness == willingness
            && nbr.two_hop_nocov > 0
    }) {
        if best.is_none_or(|(_, nocov)| nbr.two_hop_nocov > nocov) {
            best = Some((nbr.main_addr, nbr.two_hop_nocov));
        }
    }
    best.map(|(addr, _)| addr)
}

// Marks a neighbor as MPR and updates the coverage of the two-hop neighbors
// it reaches.
fn choose_mpr(
    neighbors: &mut NeighborTable,
    two_hops: &mut TwoHopTable,
    sym: &BTreeSet<IpAddr>,
    addr: IpAddr,
    coverage: usize,
    covered: &mut usize,
) {
    let Some(nbr) = neighbors.get_mut(&addr) else {
        return;
    };
    if nbr.is_mpr {
        return;
    }
    nbr.is_mpr = true;
    nbr.two_hop_nocov = 0;
    let reachable = nbr.two_hop_list.keys().copied().collect::<Vec<_>>();

    for addr2 in reachable {
        if sym.contains(&addr2) {
            continue;
        }
        let Some(th) = two_hops.get_mut(&addr2) else {
            continue;
        };
        th.mpr_covered_count += 1;
        if th.mpr_covered_count != coverage {
            continue;
        }

        // Fully covered: it no longer counts for the other coverers.
        *covered += 1;
        for other in th.neighbors.iter().filter(|other| **other != addr) {
            if let Some(other) = neighbors.get_mut(other) {
                other.two_hop_nocov = other.two_hop_nocov.saturating_sub(1);
            }
        }
    }
}

// ===== unit tests =====
