//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::IpAddr;

use holo_utils::UnboundedSender;
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};

use crate::route::Route;
use crate::tasks::messages::ProtocolOutputMsg;

// Forwarding table entry handed to the host.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct RouteMsg {
    pub prefix: IpNetwork,
    pub nexthop: IpAddr,
    pub ifindex: u32,
    pub metric: u16,
}

// ===== global functions =====

// Install OLSR route in the forwarding table.
pub(crate) fn route_install(
    output_tx: &UnboundedSender<ProtocolOutputMsg>,
    route: &Route,
) {
    // Fill-in message.
    let msg = RouteMsg {
        prefix: route.prefix,
        nexthop: route.nexthop,
        ifindex: route.ifindex,
        metric: route.metric,
    };

    // Send message.
    let _ = output_tx.send(ProtocolOutputMsg::RouteInstall(msg));
}

// Remove all OLSR routes from the forwarding table.
pub(crate) fn route_clear(output_tx: &UnboundedSender<ProtocolOutputMsg>) {
    let _ = output_tx.send(ProtocolOutputMsg::RouteClear);
}
