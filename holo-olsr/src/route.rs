//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeMap, VecDeque};
use std::net::IpAddr;

use holo_utils::UnboundedSender;
use holo_utils::ip::IpAddrExt;
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};

use crate::debug::Debug;
use crate::instance::InstanceState;
use crate::interface::Interfaces;
use crate::packet::consts::WILL_NEVER;
use crate::southbound;
use crate::tasks::messages::ProtocolOutputMsg;

// Hop count to a destination.
pub type Metric = u16;

#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Route {
    pub prefix: IpNetwork,
    pub nexthop: IpAddr,
    pub metric: Metric,
    pub ifindex: u32,
}

#[derive(Debug, Default)]
pub struct RoutingTable {
    routes: BTreeMap<IpNetwork, Route>,
}

// ===== impl RoutingTable =====

impl RoutingTable {
    pub fn get(&self, prefix: &IpNetwork) -> Option<&Route> {
        self.routes.get(prefix)
    }

    // Returns the host route to the given address.
    pub fn get_host(&self, addr: &IpAddr) -> Option<&Route> {
        self.get(&addr.to_host_prefix())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.values()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    fn add(
        &mut self,
        route: Route,
        output_tx: &UnboundedSender<ProtocolOutputMsg>,
    ) {
        southbound::route_install(output_tx, &route);
        self.routes.insert(route.prefix, route);
    }

    fn add_host(
        &mut self,
        dest: IpAddr,
        nexthop: IpAddr,
        metric: Metric,
        ifindex: u32,
        output_tx: &UnboundedSender<ProtocolOutputMsg>,
    ) {
        let route = Route {
            prefix: dest.to_host_prefix(),
            nexthop,
            metric,
            ifindex,
        };
        self.add(route, output_tx);
    }
}

// ===== global functions =====

// Rebuilds the routing table from the link, neighbor, two-hop, topology,
// MID and HNA information (RFC 3626, section 10).
//
// The previous table is kept aside while the new one is computed, and the
// forwarding table is rewritten from scratch.
pub(crate) fn calculate_routing_table(
    state: &mut InstanceState,
    interfaces: &Interfaces,
    output_tx: &UnboundedSender<ProtocolOutputMsg>,
) {
    let mirror = std::mem::take(&mut state.routes);
    southbound::route_clear(output_tx);
    let mut routes = RoutingTable::default();

    // One-hop neighbors, through each of their interfaces.
    for nbr in state.neighbors.iter().filter(|nbr| nbr.is_sym()) {
        let main_addr = nbr.main_addr;
        let dests =
            std::iter::once(&main_addr).chain(state.mid.aliases_of(&main_addr));
        for dest in dests {
            if interfaces.contains_addr(dest) {
                continue;
            }
            if let Some(link) = state.links.best_link(dest, &main_addr) {
                routes.add_host(
                    *dest,
                    link.neighbor_addr,
                    1,
                    link.ifindex,
                    output_tx,
                );
            }
        }
    }
    for link in state.links.iter() {
        if routes.get_host(&link.neighbor_addr).is_none()
            && state.neighbors.is_sym(&link.neighbor)
        {
            routes.add_host(
                link.neighbor_addr,
                link.neighbor_addr,
                1,
                link.ifindex,
                output_tx,
            );
        }
    }

    // Two-hop neighbors.
    for nbr in state
        .neighbors
        .iter()
        .filter(|nbr| nbr.is_sym() && nbr.willingness != WILL_NEVER)
    {
        let Some(link) = state.links.best_link(&nbr.main_addr, &nbr.main_addr)
        else {
            continue;
        };
        for addr2 in nbr.two_hop_list.keys() {
            if routes.get_host(addr2).is_some() || interfaces.contains_addr(addr2)
            {
                continue;
            }
            routes.add_host(
                *addr2,
                link.neighbor_addr,
                2,
                link.ifindex,
                output_tx,
            );
        }
    }

    // Topology-derived destinations, breadth first from the closest ones.
    let mut queue = routes
        .iter()
        .map(|route| (route.metric, route.prefix.ip()))
        .collect::<Vec<_>>();
    queue.sort_by_key(|(metric, _)| *metric);
    let mut queue = queue
        .into_iter()
        .map(|(_, addr)| addr)
        .collect::<VecDeque<_>>();
    while let Some(last_addr) = queue.pop_front() {
        let Some(last) = state.topology.get(&last_addr) else {
            continue;
        };
        let Some(parent) = routes.get_host(&last_addr).cloned() else {
            continue;
        };
        if !state.links.has_neighbor_addr(&parent.nexthop) {
            continue;
        }

        for dest in &last.destinations {
            if routes.get_host(dest).is_some() || interfaces.contains_addr(dest)
            {
                continue;
            }
            let metric = parent.metric + 1;
            routes.add_host(
                *dest,
                parent.nexthop,
                metric,
                parent.ifindex,
                output_tx,
            );
            queue.push_back(*dest);

            for alias in state.mid.aliases_of(dest) {
                if routes.get_host(alias).is_some()
                    || interfaces.contains_addr(alias)
                {
                    continue;
                }
                routes.add_host(
                    *alias,
                    parent.nexthop,
                    metric,
                    parent.ifindex,
                    output_tx,
                );
            }
        }
    }

    // Networks associated with reachable gateways.
    for (gateway, network) in state.hna.associations() {
        if interfaces.contains_addr(gateway) {
            continue;
        }
        let Some(gw_route) = routes.get_host(gateway) else {
            continue;
        };
        let metric = gw_route.metric + 1;
        if routes.get(network).is_some_and(|route| route.metric <= metric) {
            continue;
        }
        let route = Route {
            prefix: *network,
            nexthop: gw_route.nexthop,
            metric,
            ifindex: gw_route.ifindex,
        };
        routes.add(route, output_tx);
    }

    log_changes(&mirror, &routes);
    Debug::RoutingTableCalc(routes.len()).log();
    state.routes = routes;
}

// ===== helper functions =====

fn log_changes(old: &RoutingTable, new: &RoutingTable) {
    for route in new.iter() {
        match old.get(&route.prefix) {
            None => Debug::RouteCreate(route).log(),
            Some(old_route) if old_route != route => {
                Debug::RouteUpdate(route).log()
            }
            Some(_) => (),
        }
    }
    for route in old.iter() {
        if new.get(&route.prefix).is_none() {
            Debug::RouteDelete(&route.prefix).log();
        }
    }
}
