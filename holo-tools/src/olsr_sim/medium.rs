//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use holo_olsr::packet::Packet;
use holo_olsr::southbound::RouteMsg;
use holo_olsr::tasks::messages::ProtocolOutputMsg;
use holo_olsr::tasks::messages::input::NetRxPacketMsg;
use holo_utils::ip::AddressFamily;
use holo_utils::{Sender, UnboundedReceiver};
use ipnetwork::IpNetwork;

// Interface of a simulated node: (node index, ifindex).
pub type Endpoint = (usize, u32);

// Forwarding table of a simulated node.
pub type Fib = BTreeMap<IpNetwork, RouteMsg>;

// Emulated broadcast medium connecting the simulated nodes.
#[derive(Debug)]
pub struct Medium {
    pub links: Vec<MediumLink>,
    pub nodes: Vec<MediumNode>,
}

#[derive(Debug)]
pub struct MediumLink {
    pub a: Endpoint,
    pub b: Endpoint,
    pub up: AtomicBool,
}

#[derive(Debug)]
pub struct MediumNode {
    pub af: AddressFamily,
    pub net_rx: Sender<NetRxPacketMsg>,
}

// ===== impl Medium =====

impl Medium {
    pub(crate) fn set_link_state(&self, link_idx: usize, up: bool) {
        if let Some(link) = self.links.get(link_idx) {
            link.up.store(up, Ordering::Relaxed);
        }
    }

    // Returns the interfaces currently reachable from the given one.
    fn peers(&self, endpoint: Endpoint) -> Vec<Endpoint> {
        self.links
            .iter()
            .filter(|link| link.up.load(Ordering::Relaxed))
            .filter_map(|link| {
                if link.a == endpoint {
                    Some(link.b)
                } else if link.b == endpoint {
                    Some(link.a)
                } else {
                    None
                }
            })
            .collect()
    }
}

// ===== global functions =====

// Relays the packets sent by a node to its peers and maintains the node's
// forwarding table. Returns the table once the node is gone.
pub(crate) async fn node_output(
    node_idx: usize,
    medium: Arc<Medium>,
    mut output_rx: UnboundedReceiver<ProtocolOutputMsg>,
) -> Fib {
    let mut fib = Fib::new();

    while let Some(msg) = output_rx.recv().await {
        match msg {
            ProtocolOutputMsg::NetTxPacket(msg) => {
                let bytes = msg.packet.encode();
                for (peer_idx, ifindex) in medium.peers((node_idx, msg.ifindex))
                {
                    let peer = &medium.nodes[peer_idx];
                    let packet = Packet::decode(&bytes, peer.af);
                    let msg = NetRxPacketMsg {
                        ifindex,
                        src: msg.src,
                        packet,
                    };
                    // The peer may have already shut down.
                    let _ = peer.net_rx.send(msg).await;
                }
            }
            ProtocolOutputMsg::RouteInstall(msg) => {
                fib.insert(msg.prefix, msg);
            }
            ProtocolOutputMsg::RouteClear => {
                fib.clear();
            }
        }
    }

    fib
}
