//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::net::IpAddr;

use tokio::time::Instant;

use crate::debug::Debug;

// Interface aliases of a multi-interface node.
#[derive(Debug)]
pub struct MidEntry {
    pub main_addr: IpAddr,
    pub aliases: BTreeMap<IpAddr, Instant>,
}

#[derive(Debug, Default)]
pub struct MidTable {
    entries: BTreeMap<IpAddr, MidEntry>,
    // Alias to main address index.
    aliases: BTreeMap<IpAddr, IpAddr>,
}

// ===== impl MidTable =====

impl MidTable {
    // Records `alias` as an interface address of `main_addr`, refreshing its
    // expiry when already known.
    //
    // Returns true when the alias is new.
    pub(crate) fn insert(
        &mut self,
        main_addr: IpAddr,
        alias: IpAddr,
        expiry: Instant,
    ) -> bool {
        // An alias belongs to a single node.
        if let Some(old_main) = self.aliases.get(&alias).copied()
            && old_main != main_addr
        {
            self.remove_alias(old_main, alias);
        }

        let entry = self.entries.entry(main_addr).or_insert_with(|| MidEntry {
            main_addr,
            aliases: Default::default(),
        });
        let new = entry.aliases.insert(alias, expiry).is_none();
        if new {
            Debug::MidAliasCreate(&alias, &main_addr).log();
            self.aliases.insert(alias, main_addr);
        }
        new
    }

    // Returns the main address the given alias belongs to.
    pub fn main_addr(&self, alias: &IpAddr) -> Option<IpAddr> {
        self.aliases.get(alias).copied()
    }

    // Maps an interface address to the main address of its node. Addresses
    // without a known alias are assumed to be main addresses.
    pub fn resolve(&self, addr: IpAddr) -> IpAddr {
        self.main_addr(&addr).unwrap_or(addr)
    }

    // Returns the known aliases of the given main address.
    pub fn aliases_of(&self, main_addr: &IpAddr) -> impl Iterator<Item = &IpAddr> {
        self.entries
            .get(main_addr)
            .into_iter()
            .flat_map(|entry| entry.aliases.keys())
    }

    pub fn iter(&self) -> impl Iterator<Item = &MidEntry> {
        self.entries.values()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Removes aliases whose holding time has passed.
    //
    // Returns true when at least one alias was removed.
    pub(crate) fn expire(&mut self, now: Instant) -> bool {
        let expired = self
            .entries
            .values()
            .flat_map(|entry| {
                entry
                    .aliases
                    .iter()
                    .filter(|(_, expiry)| **expiry <= now)
                    .map(|(alias, _)| (entry.main_addr, *alias))
            })
            .collect::<Vec<_>>();

        for (main_addr, alias) in &expired {
            Debug::MidAliasTimeout(alias, main_addr).log();
            self.remove_alias(*main_addr, *alias);
        }
        !expired.is_empty()
    }

    fn remove_alias(&mut self, main_addr: IpAddr, alias: IpAddr) {
        self.aliases.remove(&alias);
        if let Some(entry) = self.entries.get_mut(&main_addr) {
            entry.aliases.remove(&alias);
            if entry.aliases.is_empty() {
                self.entries.remove(&main_addr);
            }
        }
    }
}

// ===== unit tests =====
