//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::net::IpAddr;

use tokio::time::Instant;

use crate::debug::Debug;

// Neighbor that selected this node as MPR.
#[derive(Debug)]
pub struct MprSelector {
    pub main_addr: IpAddr,
    pub expiry: Instant,
}

#[derive(Debug, Default)]
pub struct MprSelectorTable {
    // Advertised neighbor sequence number, bumped whenever the set changes.
    pub ansn: u16,
    entries: BTreeMap<IpAddr, MprSelector>,
}

// ===== impl MprSelectorTable =====

impl MprSelectorTable {
    // Adds or refreshes a selector.
    //
    // Returns true when the selector is new.
    pub(crate) fn insert(&mut self, main_addr: IpAddr, expiry: Instant) -> bool {
        if let Some(selector) = self.entries.get_mut(&main_addr) {
            selector.expiry = expiry;
            return false;
        }

        Debug::MprSelectorCreate(&main_addr).log();
        self.entries
            .insert(main_addr, MprSelector { main_addr, expiry });
        self.ansn = self.ansn.wrapping_add(1);
        true
    }

    pub(crate) fn remove(&mut self, main_addr: &IpAddr) -> bool {
        if self.entries.remove(main_addr).is_none() {
            return false;
        }
        self.ansn = self.ansn.wrapping_add(1);
        true
    }

    pub fn contains(&self, main_addr: &IpAddr) -> bool {
        self.entries.contains_key(main_addr)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MprSelector> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Removes selectors whose holding time has passed.
    //
    // Returns true when at least one selector was removed.
    pub(crate) fn expire(&mut self, now: Instant) -> bool {
        let expired = self
            .entries
            .values()
            .filter(|selector| selector.expiry <= now)
            .map(|selector| selector.main_addr)
            .collect::<Vec<_>>();

        for addr in &expired {
            Debug::MprSelectorTimeout(addr).log();
            self.remove(addr);
        }
        !expired.is_empty()
    }
}

// ===== unit tests =====
