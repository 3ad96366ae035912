//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeMap, BTreeSet};
use std::net::IpAddr;

use tokio::time::Instant;

use crate::debug::Debug;
use crate::seqno::seqno_greater_than;

// Topology information advertised in TC messages by a given originator
// ("last hop"), listing the destinations reachable through it.
#[derive(Debug)]
pub struct TopologyLast {
    pub last_addr: IpAddr,
    pub ansn: u16,
    pub expiry: Instant,
    pub destinations: BTreeSet<IpAddr>,
}

#[derive(Debug, Default)]
pub struct TopologyTable {
    lasts: BTreeMap<IpAddr, TopologyLast>,
    // Destination to last hops index.
    destinations: BTreeMap<IpAddr, BTreeSet<IpAddr>>,
}

// ===== impl TopologyTable =====

impl TopologyTable {
    pub fn get(&self, last_addr: &IpAddr) -> Option<&TopologyLast> {
        self.lasts.get(last_addr)
    }

    // Returns whether a TC from `last_addr` with the given ANSN is older than
    // the information already held.
    pub fn is_stale(&self, last_addr: &IpAddr, ansn: u16) -> bool {
        self.get(last_addr)
            .is_some_and(|last| seqno_greater_than(last.ansn, ansn))
    }

    // Returns the last hops through which the given destination is reachable.
    pub fn lasts_of(&self, dest: &IpAddr) -> impl Iterator<Item = &IpAddr> {
        self.destinations.get(dest).into_iter().flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TopologyLast> {
        self.lasts.values()
    }

    pub fn len(&self) -> usize {
        self.lasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lasts.is_empty()
    }

    // Applies the contents of a non-stale TC message (RFC 3626, section
    // 9.5).
    //
    // A newer ANSN replaces the advertised set, while an equal ANSN only adds
    // to it. Returns true when the set of destinations changed.
    pub(crate) fn update(
        &mut self,
        last_addr: IpAddr,
        ansn: u16,
        dests: &[IpAddr],
        expiry: Instant,
    ) -> bool {
        let mut changed = false;

        let last = self.lasts.entry(last_addr).or_insert_with(|| {
            changed = true;
            TopologyLast {
                last_addr,
                ansn,
                expiry,
                destinations: Default::default(),
            }
        });

        if seqno_greater_than(ansn, last.ansn) {
            let stale = last
                .destinations
                .iter()
                .filter(|dest| !dests.contains(dest))
                .copied()
                .collect::<Vec<_>>();
            for dest in stale {
                last.destinations.remove(&dest);
                unindex(&mut self.destinations, dest, last_addr);
                changed = true;
            }
            last.ansn = ansn;
        }
        for dest in dests {
            if last.destinations.insert(*dest) {
                self.destinations.entry(*dest).or_default().insert(last_addr);
                changed = true;
            }
        }
        last.expiry = expiry;

        if changed {
            Debug::TopologyUpdate(&last_addr, ansn).log();
        }
        changed
    }

    // Removes topology entries whose holding time has passed.
    //
    // Returns true when at least one entry was removed.
    pub(crate) fn expire(&mut self, now: Instant) -> bool {
        let expired = self
            .lasts
            .values()
            .filter(|last| last.expiry <= now)
            .map(|last| last.last_addr)
            .collect::<Vec<_>>();

        for last_addr in &expired {
            Debug::TopologyTimeout(last_addr).log();
            if let Some(last) = self.lasts.remove(last_addr) {
                for dest in last.destinations {
                    unindex(&mut self.destinations, dest, *last_addr);
                }
            }
        }
        !expired.is_empty()
    }
}

// ===== helper functions =====

fn unindex(
    destinations: &mut BTreeMap<IpAddr, BTreeSet<IpAddr>>,
    dest: IpAddr,
    last_addr: IpAddr,
) {
    if let Some(lasts) = destinations.get_mut(&dest) {
        lasts.remove(&last_addr);
        if lasts.is_empty() {
            destinations.remove(&dest);
        }
    }
}

// ===== unit tests =====
