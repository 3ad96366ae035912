//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::IpAddr;

use derive_new::new;
use holo_utils::ip::{AddressFamily, IpNetworkExt};
use ipnetwork::IpNetwork;

#[derive(Debug, new)]
pub struct Interface {
    // Interface name.
    pub name: String,
    // Interface index.
    pub ifindex: u32,
    // Interface address and prefix length.
    pub addr: IpNetwork,
    // Whether OLSR runs on this interface. Networks of the other interfaces
    // are advertised through HNA messages.
    pub olsr: bool,
    // Outgoing packet sequence number.
    #[new(default)]
    pub pkt_seqno: u16,
}

// Interfaces of an instance, ordered by interface index.
#[derive(Debug, Default)]
pub struct Interfaces {
    list: Vec<Interface>,
}

// ===== impl Interface =====

impl Interface {
    pub fn ip(&self) -> IpAddr {
        self.addr.ip()
    }

    pub(crate) fn next_pkt_seqno(&mut self) -> u16 {
        let seqno = self.pkt_seqno;
        self.pkt_seqno = self.pkt_seqno.wrapping_add(1);
        seqno
    }
}

// ===== impl Interfaces =====

impl Interfaces {
    pub fn new(mut list: Vec<Interface>) -> Interfaces {
        list.sort_by_key(|iface| iface.ifindex);
        Interfaces { list }
    }

    pub fn get_by_ifindex(&self, ifindex: u32) -> Option<&Interface> {
        self.list.iter().find(|iface| iface.ifindex == ifindex)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interface> {
        self.list.iter()
    }

    // Returns the OLSR-enabled interfaces.
    pub fn olsr(&self) -> impl Iterator<Item = &Interface> {
        self.list.iter().filter(|iface| iface.olsr)
    }

    pub(crate) fn olsr_mut(&mut self) -> impl Iterator<Item = &mut Interface> {
        self.list.iter_mut().filter(|iface| iface.olsr)
    }

    // Returns the main address: the address of the OLSR interface with the
    // lowest index.
    pub fn main_addr(&self) -> Option<IpAddr> {
        self.olsr().next().map(Interface::ip)
    }

    // Returns whether the address belongs to one of the local interfaces.
    pub fn contains_addr(&self, addr: &IpAddr) -> bool {
        self.list.iter().any(|iface| iface.ip() == *addr)
    }

    // Returns the networks attached to non-OLSR interfaces of the given
    // address family.
    pub fn hna_networks(&self, af: AddressFamily) -> Vec<IpNetwork> {
        self.list
            .iter()
            .filter(|iface| !iface.olsr && iface.addr.address_family() == af)
            .map(|iface| iface.addr.apply_mask())
            .collect()
    }
}

// ===== unit tests =====
