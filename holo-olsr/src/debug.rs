//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;
use std::net::IpAddr;

use ipnetwork::IpNetwork;
use tracing::{debug, debug_span};

use crate::neighbor::NeighborStatus;
use crate::packet::Packet;
use crate::route::Route;

// OLSR debug messages.
#[derive(Debug)]
pub enum Debug<'a> {
    InstanceCreate(&'a IpAddr),
    InstanceStart,
    InstanceStop,
    PacketRx(&'a str, &'a IpAddr, &'a Packet),
    PacketTx(&'a str, &'a Packet),
    MessageForward(&'a IpAddr, u16, u8),
    TcDiscardStale(&'a IpAddr, u16),
    LinkCreate(&'a IpAddr, &'a IpAddr),
    LinkTimeout(&'a IpAddr, &'a IpAddr),
    NbrCreate(&'a IpAddr),
    NbrDelete(&'a IpAddr),
    NbrStatusChange(&'a IpAddr, NeighborStatus),
    TwoHopNbrCreate(&'a IpAddr, &'a IpAddr),
    TwoHopNbrDelete(&'a IpAddr, &'a IpAddr),
    MprSetChange(&'a BTreeSet<IpAddr>),
    MprSelectorCreate(&'a IpAddr),
    MprSelectorTimeout(&'a IpAddr),
    TopologyUpdate(&'a IpAddr, u16),
    TopologyTimeout(&'a IpAddr),
    MidAliasCreate(&'a IpAddr, &'a IpAddr),
    MidAliasTimeout(&'a IpAddr, &'a IpAddr),
    HnaCreate(&'a IpAddr, &'a IpNetwork),
    HnaTimeout(&'a IpAddr, &'a IpNetwork),
    RoutingTableCalc(usize),
    RouteCreate(&'a Route),
    RouteUpdate(&'a Route),
    RouteDelete(&'a IpNetwork),
}

// ===== impl Debug =====

impl Debug<'_> {
    // Log debug message using the tracing API.
    pub(crate) fn log(&self) {
        match self {
            Debug::InstanceCreate(main_addr) => {
                // Parent span(s): olsr-instance
                debug!(%main_addr, "{}", self);
            }
            Debug::InstanceStart | Debug::InstanceStop => {
                // Parent span(s): olsr-instance
                debug!("{}", self);
            }
            Debug::PacketRx(name, source, packet) => {
                // Parent span(s): olsr-instance
                debug_span!("network").in_scope(|| {
                    debug_span!("input", interface = %name, %source).in_scope(
                        || {
                            let data = serde_json::to_string(&packet).unwrap();
                            debug!(%data, "{}", self);
                        },
                    );
                });
            }
            Debug::PacketTx(name, packet) => {
                // Parent span(s): olsr-instance
                debug_span!("network").in_scope(|| {
                    debug_span!("output", interface = %name).in_scope(|| {
                        let data = serde_json::to_string(&packet).unwrap();
                        debug!(%data, "{}", self);
                    });
                });
            }
            Debug::MessageForward(originator, seqno, ttl) => {
                // Parent span(s): olsr-instance
                debug!(%originator, %seqno, %ttl, "{}", self);
            }
            Debug::TcDiscardStale(originator, ansn) => {
                // Parent span(s): olsr-instance
                debug!(%originator, %ansn, "{}", self);
            }
            Debug::LinkCreate(local, remote)
            | Debug::LinkTimeout(local, remote) => {
                // Parent span(s): olsr-instance
                debug!(%local, %remote, "{}", self);
            }
            Debug::NbrCreate(addr) | Debug::NbrDelete(addr) => {
                // Parent span(s): olsr-instance
                debug!(address = %addr, "{}", self);
            }
            Debug::NbrStatusChange(addr, status) => {
                // Parent span(s): olsr-instance
                debug!(address = %addr, %status, "{}", self);
            }
            Debug::TwoHopNbrCreate(addr, via)
            | Debug::TwoHopNbrDelete(addr, via) => {
                // Parent span(s): olsr-instance
                debug!(address = %addr, %via, "{}", self);
            }
            Debug::MprSetChange(mprs) => {
                // Parent span(s): olsr-instance
                let mprs = mprs
                    .iter()
                    .map(|addr| addr.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                debug!(%mprs, "{}", self);
            }
            Debug::MprSelectorCreate(addr) | Debug::MprSelectorTimeout(addr) => {
                // Parent span(s): olsr-instance
                debug!(address = %addr, "{}", self);
            }
            Debug::TopologyUpdate(last, ansn) => {
                // Parent span(s): olsr-instance
                debug!(%last, %ansn, "{}", self);
            }
            Debug::TopologyTimeout(last) => {
                // Parent span(s): olsr-instance
                debug!(%last, "{}", self);
            }
            Debug::MidAliasCreate(alias, main_addr)
            | Debug::MidAliasTimeout(alias, main_addr) => {
                // Parent span(s): olsr-instance
                debug!(%alias, %main_addr, "{}", self);
            }
            Debug::HnaCreate(gateway, prefix)
            | Debug::HnaTimeout(gateway, prefix) => {
                // Parent span(s): olsr-instance
                debug!(%gateway, %prefix, "{}", self);
            }
            Debug::RoutingTableCalc(routes) => {
                // Parent span(s): olsr-instance
                debug!(%routes, "{}", self);
            }
            Debug::RouteCreate(route) | Debug::RouteUpdate(route) => {
                // Parent span(s): olsr-instance
                debug!(
                    prefix = %route.prefix,
                    nexthop = %route.nexthop,
                    metric = %route.metric,
                    ifindex = %route.ifindex,
                    "{}", self
                );
            }
            Debug::RouteDelete(prefix) => {
                // Parent span(s): olsr-instance
                debug!(%prefix, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Debug<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::InstanceCreate(..) => {
                write!(f, "instance created")
            }
            Debug::InstanceStart => {
                write!(f, "starting instance")
            }
            Debug::InstanceStop => {
                write!(f, "stopping instance")
            }
            Debug::PacketRx(..) | Debug::PacketTx(..) => {
                write!(f, "packet")
            }
            Debug::MessageForward(..) => {
                write!(f, "forwarding message")
            }
            Debug::TcDiscardStale(..) => {
                write!(f, "discarding TC with stale ANSN")
            }
            Debug::LinkCreate(..) => {
                write!(f, "link created")
            }
            Debug::LinkTimeout(..) => {
                write!(f, "link timed out")
            }
            Debug::NbrCreate(..) => {
                write!(f, "neighbor created")
            }
            Debug::NbrDelete(..) => {
                write!(f, "neighbor deleted")
            }
            Debug::NbrStatusChange(..) => {
                write!(f, "neighbor status change")
            }
            Debug::TwoHopNbrCreate(..) => {
                write!(f, "two-hop neighbor created")
            }
            Debug::TwoHopNbrDelete(..) => {
                write!(f, "two-hop neighbor deleted")
            }
            Debug::MprSetChange(..) => {
                write!(f, "MPR set changed")
            }
            Debug::MprSelectorCreate(..) => {
                write!(f, "MPR selector created")
            }
            Debug::MprSelectorTimeout(..) => {
                write!(f, "MPR selector timed out")
            }
            Debug::TopologyUpdate(..) => {
                write!(f, "topology entry updated")
            }
            Debug::TopologyTimeout(..) => {
                write!(f, "topology entry timed out")
            }
            Debug::MidAliasCreate(..) => {
                write!(f, "interface alias created")
            }
            Debug::MidAliasTimeout(..) => {
                write!(f, "interface alias timed out")
            }
            Debug::HnaCreate(..) => {
                write!(f, "host network association created")
            }
            Debug::HnaTimeout(..) => {
                write!(f, "host network association timed out")
            }
            Debug::RoutingTableCalc(..) => {
                write!(f, "routing table computed")
            }
            Debug::RouteCreate(..) => {
                write!(f, "route created")
            }
            Debug::RouteUpdate(..) => {
                write!(f, "route updated")
            }
            Debug::RouteDelete(..) => {
                write!(f, "route deleted")
            }
        }
    }
}
