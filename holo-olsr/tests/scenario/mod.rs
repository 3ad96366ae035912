//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeMap, VecDeque};
use std::net::IpAddr;
use std::time::Duration;

use bytes::Bytes;
use const_addrs::{ip, net};
use holo_olsr::config::InstanceCfg;
use holo_olsr::events;
use holo_olsr::instance::{
    Instance, InstanceChannelsTx, ProtocolInputChannelsRx,
};
use holo_olsr::interface::{Interface, Interfaces};
use holo_olsr::neighbor::NeighborStatus;
use holo_olsr::packet::consts::WILL_ALWAYS;
use holo_olsr::packet::{
    Hello, LinkBlock, LinkCode, LinkType, Message, MessageBody, MessageHdr,
    Mid, NeighborType, Packet, Tc, UnknownMsg,
};
use holo_olsr::tasks::messages::ProtocolOutputMsg;
use holo_olsr::tasks::messages::input::HoldTable;
use holo_utils::UnboundedReceiver;
use tokio::sync::mpsc;
use tokio::time::Instant;

const HOLD_TABLES: [HoldTable; 5] = [
    HoldTable::Neighbor,
    HoldTable::Topology,
    HoldTable::Duplicate,
    HoldTable::Mid,
    HoldTable::Hna,
];

struct Node {
    instance: Instance,
    output_rx: UnboundedReceiver<ProtocolOutputMsg>,
    _input_rx: ProtocolInputChannelsRx,
}

// Simulated wireless medium. Each adjacency lets two interfaces hear each
// other.
struct Network {
    nodes: Vec<Node>,
    adjacencies: Vec<((usize, u32), (usize, u32))>,
    now: Instant,
}

//
// Helper functions.
//

fn node(name: &str, ifaces: &[(u32, &str, bool)]) -> Node {
    let (protocol_input, input_rx) = Instance::protocol_input_channels();
    let (output_tx, output_rx) = mpsc::unbounded_channel();
    let interfaces = Interfaces::new(
        ifaces
            .iter()
            .map(|(ifindex, addr, olsr)| {
                Interface::new(
                    format!("eth{}", ifindex),
                    *ifindex,
                    addr.parse().unwrap(),
                    *olsr,
                )
            })
            .collect(),
    );
    let tx = InstanceChannelsTx {
        protocol_input,
        protocol_output: output_tx,
    };
    let instance =
        Instance::new(name.to_owned(), InstanceCfg::default(), interfaces, tx)
            .unwrap();

    Node {
        instance,
        output_rx,
        _input_rx: input_rx,
    }
}

impl Network {
    fn new(
        nodes: Vec<Node>,
        adjacencies: &[((usize, u32), (usize, u32))],
    ) -> Self {
        Network {
            nodes,
            adjacencies: adjacencies.to_vec(),
            now: Instant::now(),
        }
    }

    // Builds a network where each node has a single interface and the given
    // node pairs are within range of each other.
    fn single_iface(count: usize, edges: &[(usize, usize)]) -> Self {
        let nodes = (0..count)
            .map(|idx| {
                let addr = format!("10.0.0.{}/24", idx + 1);
                node(&format!("n{}", idx + 1), &[(1, addr.as_str(), true)])
            })
            .collect();
        let adjacencies = edges
            .iter()
            .map(|(a, b)| ((*a, 1), (*b, 1)))
            .collect::<Vec<_>>();
        Network::new(nodes, &adjacencies)
    }

    fn instance(&self, idx: usize) -> &Instance {
        &self.nodes[idx].instance
    }

    fn peers(&self, idx: usize, ifindex: u32) -> Vec<(usize, u32)> {
        self.adjacencies
            .iter()
            .filter_map(|(a, b)| {
                if *a == (idx, ifindex) {
                    Some(*b)
                } else if *b == (idx, ifindex) {
                    Some(*a)
                } else {
                    None
                }
            })
            .collect()
    }

    // Delivers all pending packets, including the ones generated while
    // processing them, until the medium is quiet.
    fn deliver(&mut self) {
        loop {
            let mut pending = vec![];
            for (idx, node) in self.nodes.iter_mut().enumerate() {
                while let Ok(msg) = node.output_rx.try_recv() {
                    if let ProtocolOutputMsg::NetTxPacket(msg) = msg {
                        pending.push((idx, msg));
                    }
                }
            }
            if pending.is_empty() {
                break;
            }

            for (idx, msg) in pending {
                let bytes = msg.packet.encode();
                for (peer, ifindex) in self.peers(idx, msg.ifindex) {
                    let instance = &mut self.nodes[peer].instance;
                    let packet =
                        Packet::decode(&bytes, instance.config.ip_version);
                    events::process_packet(
                        instance, self.now, ifindex, msg.src, packet,
                    );
                }
            }
        }
    }

    // Runs one emission cycle of every message type followed by a sweep of
    // all tables.
    fn round(&mut self) {
        for idx in 0..self.nodes.len() {
            events::process_hello_interval(
                &mut self.nodes[idx].instance,
                self.now,
            );
            self.deliver();
        }
        for idx in 0..self.nodes.len() {
            events::process_tc_interval(
                &mut self.nodes[idx].instance,
                self.now,
            );
            self.deliver();
        }
        for idx in 0..self.nodes.len() {
            events::process_mid_interval(
                &mut self.nodes[idx].instance,
                self.now,
            );
            events::process_hna_interval(
                &mut self.nodes[idx].instance,
                self.now,
            );
            self.deliver();
        }
        for idx in 0..self.nodes.len() {
            for table in HOLD_TABLES {
                events::process_hold_timer(
                    &mut self.nodes[idx].instance,
                    self.now,
                    table,
                );
            }
        }
        self.now += Duration::from_secs(2);
    }

    fn run(&mut self, rounds: usize) {
        for _ in 0..rounds {
            self.round();
        }
    }

    // Discards the pending output of a node and returns how many packets
    // were queued.
    fn drain(&mut self, idx: usize) -> usize {
        let mut count = 0;
        while let Ok(msg) = self.nodes[idx].output_rx.try_recv() {
            if let ProtocolOutputMsg::NetTxPacket(_) = msg {
                count += 1;
            }
        }
        count
    }

    // Takes the pending output of a node and returns the messages it sent.
    fn sent_messages(&mut self, idx: usize) -> Vec<Message> {
        let mut messages = vec![];
        while let Ok(msg) = self.nodes[idx].output_rx.try_recv() {
            if let ProtocolOutputMsg::NetTxPacket(msg) = msg {
                messages.extend(msg.packet.messages);
            }
        }
        messages
    }

    // Injects a packet into a node as if received on the given interface.
    fn inject(
        &mut self,
        idx: usize,
        ifindex: u32,
        src: IpAddr,
        msg: Message,
    ) {
        let packet = Packet {
            seqno: 0,
            messages: vec![msg],
        };
        let now = self.now;
        events::process_packet(
            &mut self.nodes[idx].instance,
            now,
            ifindex,
            src,
            Ok(packet),
        );
    }
}

fn flooded_msg(originator: IpAddr, seqno: u16, body: MessageBody) -> Message {
    Message {
        hdr: MessageHdr {
            vtime: 0xe7,
            originator,
            ttl: 255,
            hop_count: 0,
            seqno,
        },
        body,
    }
}

// Hop distances from a node, computed over the connectivity graph.
fn distances(
    count: usize,
    edges: &[(usize, usize)],
    from: usize,
) -> BTreeMap<usize, u16> {
    let mut dist = BTreeMap::from([(from, 0)]);
    let mut queue = VecDeque::from([from]);
    while let Some(idx) = queue.pop_front() {
        let metric = dist[&idx];
        for (a, b) in edges {
            let peer = if *a == idx {
                *b
            } else if *b == idx {
                *a
            } else {
                continue;
            };
            if peer < count && !dist.contains_key(&peer) {
                dist.insert(peer, metric + 1);
                queue.push_back(peer);
            }
        }
    }
    dist
}

//
// Tests.
//

#[test]
fn test_hello_symmetry() {
    let mut net = Network::single_iface(2, &[(0, 1)]);

    // A's first HELLO only makes the link asymmetric at B.
    events::process_hello_interval(&mut net.nodes[0].instance, net.now);
    net.deliver();
    let nbr = net.instance(1).state.neighbors.get(&ip!("10.0.0.1")).unwrap();
    assert_eq!(nbr.status, NeighborStatus::NotSym);

    // B's HELLO lists A, which now sees B as symmetric.
    events::process_hello_interval(&mut net.nodes[1].instance, net.now);
    net.deliver();
    let nbr = net.instance(0).state.neighbors.get(&ip!("10.0.0.2")).unwrap();
    assert_eq!(nbr.status, NeighborStatus::Sym);
    assert!(net.instance(0).state.changes_neighborhood);

    // Routes are only computed when pending changes are processed.
    assert!(net.instance(0).state.routes.is_empty());
    events::process_changes(&mut net.nodes[0].instance);
    let route = net
        .instance(0)
        .state
        .routes
        .get_host(&ip!("10.0.0.2"))
        .unwrap();
    assert_eq!(route.metric, 1);
    assert_eq!(route.nexthop, ip!("10.0.0.2"));
    assert!(!net.instance(0).state.changes_neighborhood);

    // A's next HELLO completes the handshake at B.
    events::process_hello_interval(&mut net.nodes[0].instance, net.now);
    net.deliver();
    assert!(net.instance(1).state.neighbors.is_sym(&ip!("10.0.0.1")));
}

#[test]
fn test_line_routes() {
    let mut net = Network::single_iface(4, &[(0, 1), (1, 2), (2, 3)]);
    net.run(5);

    let routes = &net.instance(0).state.routes;
    for (dest, metric) in
        [(ip!("10.0.0.2"), 1), (ip!("10.0.0.3"), 2), (ip!("10.0.0.4"), 3)]
    {
        let route = routes.get_host(&dest).unwrap();
        assert_eq!(route.metric, metric);
        assert_eq!(route.nexthop, ip!("10.0.0.2"));
    }
    let route = net
        .instance(3)
        .state
        .routes
        .get_host(&ip!("10.0.0.1"))
        .unwrap();
    assert_eq!(route.metric, 3);
    assert_eq!(route.nexthop, ip!("10.0.0.3"));

    // The inner nodes select each other as MPRs.
    let state = &net.instance(1).state;
    assert!(state.neighbors.mpr_set().contains(&ip!("10.0.0.3")));
    assert!(state.mpr_selectors.contains(&ip!("10.0.0.1")));
    assert!(state.mpr_selectors.contains(&ip!("10.0.0.3")));
    assert!(state.statistics.tc_relayed > 0);
    assert_eq!(net.instance(0).state.statistics.tc_generated, 0);
}

#[test]
fn test_routes_match_graph_distances() {
    let edges = [(0, 1), (1, 2), (2, 3), (3, 4), (1, 5), (5, 4), (4, 6)];
    let mut net = Network::single_iface(7, &edges);
    net.run(8);

    for from in 0..7 {
        let routes = &net.instance(from).state.routes;
        for (to, metric) in distances(7, &edges, from) {
            if to == from {
                continue;
            }
            let dest: IpAddr = format!("10.0.0.{}", to + 1).parse().unwrap();
            let route = routes.get_host(&dest).unwrap();
            assert_eq!(route.metric, metric, "route from {} to {}", from, to);
        }
        assert_eq!(routes.len(), 6);
    }
}

#[test]
fn test_duplicate_forwarding() {
    let mut net = Network::single_iface(4, &[(0, 1), (1, 2), (2, 3)]);
    net.run(5);
    net.drain(1);

    // A MID from C reaches B twice: it's processed and relayed once.
    let msg = flooded_msg(
        ip!("10.0.0.3"),
        40000,
        MessageBody::Mid(Mid {
            addrs: vec![ip!("10.0.9.3")],
        }),
    );
    let relayed = net.instance(1).state.statistics.mid_relayed;
    net.inject(1, 1, ip!("10.0.0.3"), msg.clone());
    assert_eq!(net.drain(1), 1);
    net.inject(1, 1, ip!("10.0.0.3"), msg);
    assert_eq!(net.drain(1), 0);

    let state = &net.instance(1).state;
    assert_eq!(state.statistics.mid_relayed, relayed + 1);
    assert_eq!(state.mid.main_addr(&ip!("10.0.9.3")), Some(ip!("10.0.0.3")));
    let entry = state.duplicates.get(ip!("10.0.0.3"), 40000).unwrap();
    assert!(entry.retransmitted);
    assert!(entry.ifaces.contains(&ip!("10.0.0.2")));
}

#[test]
fn test_no_forwarding_for_non_selector() {
    let mut net = Network::single_iface(4, &[(0, 1), (1, 2), (2, 3)]);
    net.run(5);
    net.drain(0);

    // A has no MPR selectors, so it never relays.
    let msg = flooded_msg(
        ip!("10.0.0.4"),
        40001,
        MessageBody::Mid(Mid {
            addrs: vec![ip!("10.0.9.4")],
        }),
    );
    net.inject(0, 1, ip!("10.0.0.2"), msg);
    assert_eq!(net.drain(0), 0);
    let entry = net
        .instance(0)
        .state
        .duplicates
        .get(ip!("10.0.0.4"), 40001)
        .unwrap();
    assert!(!entry.retransmitted);
}

#[test]
fn test_tc_ansn_ordering() {
    let mut net = Network::single_iface(4, &[(0, 1), (1, 2), (2, 3)]);
    net.run(5);
    net.drain(1);

    let last = ip!("10.0.0.3");
    let ansn = net.instance(1).state.topology.get(&last).unwrap().ansn;
    let tc = |seqno, ansn, addrs| {
        flooded_msg(last, seqno, MessageBody::Tc(Tc { ansn, addrs }))
    };

    // A newer ANSN replaces the advertised set.
    let newer = ansn.wrapping_add(1);
    let addrs = vec![ip!("10.0.0.4"), ip!("10.0.0.9")];
    net.inject(1, 1, last, tc(50000, newer, addrs));
    assert_eq!(net.drain(1), 1);
    let entry = net.instance(1).state.topology.get(&last).unwrap();
    let dests = &entry.destinations;
    assert!(dests.contains(&ip!("10.0.0.9")));
    assert!(dests.contains(&ip!("10.0.0.4")));
    assert_eq!(dests.len(), 2);

    // An equal ANSN adds to it and is still relayed.
    net.inject(1, 1, last, tc(50001, newer, vec![ip!("10.0.0.8")]));
    assert_eq!(net.drain(1), 1);
    let entry = net.instance(1).state.topology.get(&last).unwrap();
    let dests = &entry.destinations;
    assert!(dests.contains(&ip!("10.0.0.8")));
    assert!(dests.contains(&ip!("10.0.0.9")));

    // An older ANSN is discarded and not relayed.
    net.inject(1, 1, last, tc(50002, ansn, vec![ip!("10.0.0.7")]));
    assert_eq!(net.drain(1), 0);
    let topology = &net.instance(1).state.topology;
    let entry = topology.get(&last).unwrap();
    assert!(!entry.destinations.contains(&ip!("10.0.0.7")));
    assert_eq!(entry.ansn, newer);
}

#[test]
fn test_multi_interface_mid_hna() {
    let a = node("a", &[(1, "10.0.0.1/24", true)]);
    let b = node(
        "b",
        &[
            (1, "10.0.0.2/24", true),
            (2, "10.0.1.2/24", true),
            (3, "192.168.5.1/24", false),
        ],
    );
    let c = node("c", &[(1, "10.0.1.3/24", true)]);
    let adjacencies = [((0, 1), (1, 1)), ((1, 2), (2, 1))];
    let mut net = Network::new(vec![a, b, c], &adjacencies);
    net.run(5);

    // A reaches B's second interface through the MID declaration.
    let routes = &net.instance(0).state.routes;
    let route = routes.get_host(&ip!("10.0.1.2")).unwrap();
    assert_eq!(route.metric, 1);
    assert_eq!(route.nexthop, ip!("10.0.0.2"));
    let route = routes.get_host(&ip!("10.0.1.3")).unwrap();
    assert_eq!(route.metric, 2);
    assert_eq!(route.nexthop, ip!("10.0.0.2"));

    // Networks behind B are reached through it.
    let route = routes.get(&net!("192.168.5.0/24")).unwrap();
    assert_eq!(route.metric, 2);
    assert_eq!(route.nexthop, ip!("10.0.0.2"));

    // C only hears B's second interface.
    let routes = &net.instance(2).state.routes;
    let route = routes.get_host(&ip!("10.0.0.2")).unwrap();
    assert_eq!(route.metric, 1);
    assert_eq!(route.nexthop, ip!("10.0.1.2"));
    let route = routes.get_host(&ip!("10.0.0.1")).unwrap();
    assert_eq!(route.metric, 2);
    assert_eq!(route.nexthop, ip!("10.0.1.2"));
}

#[test]
fn test_neighbor_loss() {
    let mut net = Network::single_iface(2, &[(0, 1)]);
    net.run(3);
    let routes = &net.instance(0).state.routes;
    assert!(routes.get_host(&ip!("10.0.0.2")).is_some());

    // Out of range: everything learned from B times out.
    net.adjacencies.clear();
    net.run(8);
    let state = &net.instance(0).state;
    assert!(state.routes.is_empty());
    assert!(state.neighbors.is_empty());
    assert!(state.links.is_empty());
}

#[test]
fn test_willingness_change() {
    let mut net = Network::single_iface(2, &[(0, 1)]);
    net.run(3);
    events::process_changes(&mut net.nodes[0].instance);
    assert!(!net.instance(0).state.changes_neighborhood);
    assert!(!net.instance(0).state.changes_topology);

    // B starts advertising a different willingness.
    let hello = Message {
        hdr: MessageHdr {
            vtime: 0x86,
            originator: ip!("10.0.0.2"),
            ttl: 1,
            hop_count: 0,
            seqno: 60000,
        },
        body: MessageBody::Hello(Hello {
            htime: 0x05,
            willingness: WILL_ALWAYS,
            links: vec![LinkBlock {
                code: LinkCode::new(LinkType::Sym, NeighborType::SymNeigh),
                addrs: vec![ip!("10.0.0.1")],
            }],
        }),
    };
    net.inject(0, 1, ip!("10.0.0.2"), hello);

    let state = &net.instance(0).state;
    let nbr = state.neighbors.get(&ip!("10.0.0.2")).unwrap();
    assert_eq!(nbr.willingness, WILL_ALWAYS);
    assert!(state.changes_neighborhood);
    assert!(state.changes_topology);
}

#[test]
fn test_empty_tc_after_last_selector() {
    let mut net = Network::single_iface(4, &[(0, 1), (1, 2), (2, 3)]);
    net.run(5);
    assert!(!net.instance(1).state.mpr_selectors.is_empty());
    let valid_until = net.instance(1).state.tc_valid_until.unwrap();

    // B loses all of its neighbors, and with them its MPR selectors.
    net.adjacencies.clear();
    net.drain(1);
    net.now += Duration::from_secs(6);
    events::process_hold_timer(
        &mut net.nodes[1].instance,
        net.now,
        HoldTable::Neighbor,
    );
    let state = &net.instance(1).state;
    assert!(state.mpr_selectors.is_empty());
    assert!(state.neighbors.is_empty());
    let ansn = state.mpr_selectors.ansn;

    // Empty TCs keep being sent while the last advertisement is valid.
    assert!(net.now < valid_until);
    events::process_tc_interval(&mut net.nodes[1].instance, net.now);
    let messages = net.sent_messages(1);
    assert_eq!(messages.len(), 1);
    assert_eq!(
        messages[0].body,
        MessageBody::Tc(Tc {
            ansn,
            addrs: vec![],
        })
    );

    // Once it has expired, TC generation stops.
    net.now = valid_until;
    events::process_tc_interval(&mut net.nodes[1].instance, net.now);
    assert!(net.sent_messages(1).is_empty());
}

#[test]
fn test_unknown_message_relay() {
    let mut net = Network::single_iface(4, &[(0, 1), (1, 2), (2, 3)]);
    net.run(5);
    net.drain(1);

    // Messages of unknown type are relayed by MPRs without being parsed.
    let body = MessageBody::Unknown(UnknownMsg {
        msg_type: 200,
        data: Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]),
    });
    let msg = flooded_msg(ip!("10.0.0.3"), 45000, body.clone());
    net.inject(1, 1, ip!("10.0.0.3"), msg.clone());
    let relayed = net.sent_messages(1);
    assert_eq!(relayed.len(), 1);
    assert_eq!(relayed[0].body, body);
    assert_eq!(relayed[0].hdr.originator, ip!("10.0.0.3"));
    assert_eq!(relayed[0].hdr.seqno, 45000);
    assert_eq!(relayed[0].hdr.ttl, 254);
    assert_eq!(relayed[0].hdr.hop_count, 1);

    // A second copy is suppressed.
    net.inject(1, 1, ip!("10.0.0.3"), msg);
    assert!(net.sent_messages(1).is_empty());
    let entry = net
        .instance(1)
        .state
        .duplicates
        .get(ip!("10.0.0.3"), 45000)
        .unwrap();
    assert!(entry.retransmitted);
}
