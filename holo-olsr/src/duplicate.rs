//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeMap, BTreeSet};
use std::net::IpAddr;

use tokio::time::Instant;

// Record of a recently seen message, identified by its originator and
// message sequence number.
#[derive(Debug)]
pub struct DuplicateEntry {
    pub originator: IpAddr,
    pub seqno: u16,
    pub retransmitted: bool,
    // Local interface addresses the message was received on and considered
    // for forwarding.
    pub ifaces: BTreeSet<IpAddr>,
    pub expiry: Instant,
}

#[derive(Debug, Default)]
pub struct DuplicateTable {
    entries: BTreeMap<(IpAddr, u16), DuplicateEntry>,
}

// ===== impl DuplicateTable =====

impl DuplicateTable {
    pub fn get(&self, originator: IpAddr, seqno: u16) -> Option<&DuplicateEntry> {
        self.entries.get(&(originator, seqno))
    }

    pub fn contains(&self, originator: IpAddr, seqno: u16) -> bool {
        self.entries.contains_key(&(originator, seqno))
    }

    // Records a message as seen, refreshing the holding time of an existing
    // record.
    pub fn insert(
        &mut self,
        originator: IpAddr,
        seqno: u16,
        expiry: Instant,
    ) -> &mut DuplicateEntry {
        let entry = self
            .entries
            .entry((originator, seqno))
            .or_insert_with(|| DuplicateEntry {
                originator,
                seqno,
                retransmitted: false,
                ifaces: Default::default(),
                expiry,
            });
        entry.expiry = expiry;
        entry
    }

    // Returns whether the message was already considered for forwarding on
    // the given local interface.
    pub fn is_forwarded(
        &self,
        originator: IpAddr,
        seqno: u16,
        iface_addr: &IpAddr,
    ) -> bool {
        self.get(originator, seqno)
            .is_some_and(|entry| entry.ifaces.contains(iface_addr))
    }

    // Removes all records whose holding time has passed.
    pub fn expire(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expiry > now);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DuplicateEntry> {
        self.entries.values()
    }
}

// ===== unit tests =====
