//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::net::IpAddr;

use ipnetwork::IpNetwork;
use tokio::time::Instant;

use crate::debug::Debug;

// Networks reachable through a gateway, as advertised in its HNA messages.
#[derive(Debug)]
pub struct HnaEntry {
    pub gateway: IpAddr,
    pub networks: BTreeMap<IpNetwork, Instant>,
}

#[derive(Debug, Default)]
pub struct HnaTable {
    entries: BTreeMap<IpAddr, HnaEntry>,
}

// ===== impl HnaTable =====

impl HnaTable {
    // Adds or refreshes an association.
    //
    // Returns true when the association is new.
    pub(crate) fn insert(
        &mut self,
        gateway: IpAddr,
        network: IpNetwork,
        expiry: Instant,
    ) -> bool {
        let entry = self.entries.entry(gateway).or_insert_with(|| HnaEntry {
            gateway,
            networks: Default::default(),
        });
        let new = entry.networks.insert(network, expiry).is_none();
        if new {
            Debug::HnaCreate(&gateway, &network).log();
        }
        new
    }

    pub fn get(&self, gateway: &IpAddr) -> Option<&HnaEntry> {
        self.entries.get(gateway)
    }

    // Returns all (gateway, network) associations.
    pub fn associations(&self) -> impl Iterator<Item = (&IpAddr, &IpNetwork)> {
        self.entries.values().flat_map(|entry| {
            entry
                .networks
                .keys()
                .map(move |network| (&entry.gateway, network))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Removes associations whose holding time has passed.
    //
    // Returns true when at least one association was removed.
    pub(crate) fn expire(&mut self, now: Instant) -> bool {
        let mut changed = false;
        self.entries.retain(|gateway, entry| {
            entry.networks.retain(|network, expiry| {
                if *expiry <= now {
                    Debug::HnaTimeout(gateway, network).log();
                    changed = true;
                    return false;
                }
                true
            });
            !entry.networks.is_empty()
        });
        changed
    }
}

// ===== unit tests =====
