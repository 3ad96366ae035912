//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use holo_utils::ip::IpAddrExt;
use holo_utils::task::IntervalTask;
use holo_utils::{Receiver, Sender, UnboundedSender};
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{Instrument, debug_span, info};

use crate::config::InstanceCfg;
use crate::debug::Debug;
use crate::duplicate::DuplicateTable;
use crate::error::ConfigError;
use crate::events;
use crate::hna::HnaTable;
use crate::interface::Interfaces;
use crate::link::LinkSet;
use crate::mid::MidTable;
use crate::mpr_selector::MprSelectorTable;
use crate::neighbor::{NeighborTable, TwoHopTable};
use crate::packet::MessageType;
use crate::route::RoutingTable;
use crate::tasks;
use crate::tasks::messages::input::{
    HelloIntervalMsg, HnaIntervalMsg, HoldTable, HoldTimerMsg, MidIntervalMsg,
    NetRxPacketMsg, TcIntervalMsg,
};
use crate::tasks::messages::{ProtocolInputMsg, ProtocolOutputMsg};
use crate::topology::TopologyTable;

#[derive(Debug)]
pub struct Instance {
    // Instance name.
    pub name: String,
    // Instance system data.
    pub system: InstanceSys,
    // Instance configuration data.
    pub config: InstanceCfg,
    // Instance state data.
    pub state: InstanceState,
    // Instance interfaces.
    pub interfaces: Interfaces,
    // Instance Tx channels.
    pub tx: InstanceChannelsTx,
    // Timer tasks, present while the instance is running.
    tasks: Option<InstanceTasks>,
}

#[derive(Debug)]
pub struct InstanceSys {
    // Address identifying this node in the OLSR domain.
    pub main_addr: IpAddr,
}

#[derive(Debug, Default)]
pub struct InstanceState {
    // Protocol tables.
    pub links: LinkSet,
    pub neighbors: NeighborTable,
    pub two_hop_neighbors: TwoHopTable,
    pub mpr_selectors: MprSelectorTable,
    pub topology: TopologyTable,
    pub mid: MidTable,
    pub hna: HnaTable,
    pub duplicates: DuplicateTable,
    pub routes: RoutingTable,
    // Message sequence number, shared by all generated messages.
    pub msg_seqno: u16,
    // Pending recomputations.
    pub changes_neighborhood: bool,
    pub changes_topology: bool,
    // Empty TCs keep being sent until this time after the last MPR selector
    // is gone.
    pub tc_valid_until: Option<Instant>,
    // Message statistics.
    pub statistics: MessageStatistics,
}

#[derive(Debug)]
struct InstanceTasks {
    _hello_interval: IntervalTask,
    _tc_interval: IntervalTask,
    _mid_interval: IntervalTask,
    _hna_interval: IntervalTask,
    _hold_timers: Vec<IntervalTask>,
}

// Inbound and outbound statistic counters.
#[derive(Clone, Debug, Default)]
#[derive(Deserialize, Serialize)]
pub struct MessageStatistics {
    pub discontinuity_time: Option<DateTime<Utc>>,
    pub hello_rcvd: u32,
    pub hello_sent: u32,
    pub tc_rcvd: u32,
    pub tc_generated: u32,
    pub tc_relayed: u32,
    pub mid_rcvd: u32,
    pub mid_generated: u32,
    pub mid_relayed: u32,
    pub hna_rcvd: u32,
    pub hna_generated: u32,
    pub hna_relayed: u32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MessageEvent {
    Received,
    Generated,
    Relayed,
}

#[derive(Clone, Debug)]
pub struct InstanceChannelsTx {
    pub protocol_input: ProtocolInputChannelsTx,
    pub protocol_output: UnboundedSender<ProtocolOutputMsg>,
}

#[derive(Clone, Debug)]
pub struct ProtocolInputChannelsTx {
    // Packet Rx event.
    pub net_rx: Sender<NetRxPacketMsg>,
    // HELLO interval.
    pub hello_interval: Sender<HelloIntervalMsg>,
    // TC interval.
    pub tc_interval: Sender<TcIntervalMsg>,
    // MID interval.
    pub mid_interval: Sender<MidIntervalMsg>,
    // HNA interval.
    pub hna_interval: Sender<HnaIntervalMsg>,
    // Hold timers.
    pub hold_timer: Sender<HoldTimerMsg>,
}

#[derive(Debug)]
pub struct ProtocolInputChannelsRx {
    // Packet Rx event.
    pub net_rx: Receiver<NetRxPacketMsg>,
    // HELLO interval.
    pub hello_interval: Receiver<HelloIntervalMsg>,
    // TC interval.
    pub tc_interval: Receiver<TcIntervalMsg>,
    // MID interval.
    pub mid_interval: Receiver<MidIntervalMsg>,
    // HNA interval.
    pub hna_interval: Receiver<HnaIntervalMsg>,
    // Hold timers.
    pub hold_timer: Receiver<HoldTimerMsg>,
}

// ===== impl Instance =====

impl Instance {
    // Creates a new instance. The main address is taken from the OLSR
    // interface with the lowest index.
    pub fn new(
        name: String,
        config: InstanceCfg,
        interfaces: Interfaces,
        tx: InstanceChannelsTx,
    ) -> Result<Instance, ConfigError> {
        let main_addr =
            interfaces.main_addr().ok_or(ConfigError::MissingMainAddress)?;
        if let Some(iface) = interfaces
            .olsr()
            .find(|iface| iface.ip().address_family() != config.ip_version)
        {
            return Err(ConfigError::AddressFamilyMismatch(iface.name.clone()));
        }

        Debug::InstanceCreate(&main_addr).log();

        Ok(Instance {
            name,
            system: InstanceSys { main_addr },
            config,
            state: Default::default(),
            interfaces,
            tx,
            tasks: None,
        })
    }

    // Starts the protocol timers.
    pub fn start(&mut self) {
        Debug::InstanceStart.log();

        let input = &self.tx.protocol_input;
        let config = &self.config;
        let hold_timers = [
            (HoldTable::Neighbor, config.neighbor_hold_time),
            (HoldTable::Topology, config.topology_hold_time),
            (HoldTable::Duplicate, config.duplicate_hold_time),
            (HoldTable::Mid, config.mid_hold_time),
            (HoldTable::Hna, config.hna_hold_time),
        ]
        .into_iter()
        .map(|(table, interval)| {
            tasks::hold_timer(table, interval, &input.hold_timer)
        })
        .collect();

        self.tasks = Some(InstanceTasks {
            _hello_interval: tasks::hello_interval(
                config,
                &input.hello_interval,
            ),
            _tc_interval: tasks::tc_interval(config, &input.tc_interval),
            _mid_interval: tasks::mid_interval(config, &input.mid_interval),
            _hna_interval: tasks::hna_interval(config, &input.hna_interval),
            _hold_timers: hold_timers,
        });
    }

    // Stops the protocol timers and reports the final statistics.
    pub fn shutdown(&mut self) {
        self.tasks = None;

        let stats = &self.state.statistics;
        info!(
            hello_rcvd = %stats.hello_rcvd,
            hello_sent = %stats.hello_sent,
            tc_rcvd = %stats.tc_rcvd,
            tc_generated = %stats.tc_generated,
            tc_relayed = %stats.tc_relayed,
            mid_rcvd = %stats.mid_rcvd,
            mid_generated = %stats.mid_generated,
            mid_relayed = %stats.mid_relayed,
            hna_rcvd = %stats.hna_rcvd,
            hna_generated = %stats.hna_generated,
            hna_relayed = %stats.hna_relayed,
            "message statistics"
        );
        Debug::InstanceStop.log();
    }

    // Runs the instance until a shutdown is requested, then returns it for
    // inspection.
    pub async fn run(
        mut self,
        mut protocol_input_rx: ProtocolInputChannelsRx,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) -> Instance {
        let span = debug_span!("olsr-instance", name = %self.name);
        async {
            self.start();
            loop {
                tokio::select! {
                    msg = protocol_input_rx.recv() => {
                        match msg {
                            Some(msg) => self.process_protocol_msg(msg),
                            None => break,
                        }
                    }
                    _ = &mut shutdown_rx => break,
                }
            }
            self.shutdown();
        }
        .instrument(span)
        .await;
        self
    }

    pub fn process_protocol_msg(&mut self, msg: ProtocolInputMsg) {
        let now = Instant::now();
        match msg {
            // Received OLSR packet.
            ProtocolInputMsg::NetRxPacket(msg) => {
                events::process_packet(
                    self,
                    now,
                    msg.ifindex,
                    msg.src,
                    msg.packet,
                );
            }
            // HELLO emission interval.
            ProtocolInputMsg::HelloInterval(_msg) => {
                events::process_hello_interval(self, now);
            }
            // TC emission interval.
            ProtocolInputMsg::TcInterval(_msg) => {
                events::process_tc_interval(self, now);
            }
            // MID emission interval.
            ProtocolInputMsg::MidInterval(_msg) => {
                events::process_mid_interval(self, now);
            }
            // HNA emission interval.
            ProtocolInputMsg::HnaInterval(_msg) => {
                events::process_hna_interval(self, now);
            }
            // Table sweep.
            ProtocolInputMsg::HoldTimer(msg) => {
                events::process_hold_timer(self, now, msg.table);
            }
        }
    }

    pub fn protocol_input_channels()
    -> (ProtocolInputChannelsTx, ProtocolInputChannelsRx) {
        let (net_rxp, net_rxc) = mpsc::channel(4);
        let (hello_intervalp, hello_intervalc) = mpsc::channel(4);
        let (tc_intervalp, tc_intervalc) = mpsc::channel(4);
        let (mid_intervalp, mid_intervalc) = mpsc::channel(4);
        let (hna_intervalp, hna_intervalc) = mpsc::channel(4);
        let (hold_timerp, hold_timerc) = mpsc::channel(4);

        let tx = ProtocolInputChannelsTx {
            net_rx: net_rxp,
            hello_interval: hello_intervalp,
            tc_interval: tc_intervalp,
            mid_interval: mid_intervalp,
            hna_interval: hna_intervalp,
            hold_timer: hold_timerp,
        };
        let rx = ProtocolInputChannelsRx {
            net_rx: net_rxc,
            hello_interval: hello_intervalc,
            tc_interval: tc_intervalc,
            mid_interval: mid_intervalc,
            hna_interval: hna_intervalc,
            hold_timer: hold_timerc,
        };

        (tx, rx)
    }

    // Returns the next message sequence number.
    pub(crate) fn next_msg_seqno(&mut self) -> u16 {
        self.state.msg_seqno = self.state.msg_seqno.wrapping_add(1);
        self.state.msg_seqno
    }
}

// ===== impl MessageStatistics =====

impl MessageStatistics {
    pub(crate) fn update(&mut self, msg_type: u8, event: MessageEvent) {
        let Some(msg_type) = MessageType::from_u8(msg_type) else {
            return;
        };
        self.discontinuity_time = Some(Utc::now());
        let counter = match (msg_type, event) {
            (MessageType::Hello, MessageEvent::Received) => &mut self.hello_rcvd,
            (MessageType::Hello, _) => &mut self.hello_sent,
            (MessageType::Tc, MessageEvent::Received) => &mut self.tc_rcvd,
            (MessageType::Tc, MessageEvent::Generated) => &mut self.tc_generated,
            (MessageType::Tc, MessageEvent::Relayed) => &mut self.tc_relayed,
            (MessageType::Mid, MessageEvent::Received) => &mut self.mid_rcvd,
            (MessageType::Mid, MessageEvent::Generated) => {
                &mut self.mid_generated
            }
            (MessageType::Mid, MessageEvent::Relayed) => &mut self.mid_relayed,
            (MessageType::Hna, MessageEvent::Received) => &mut self.hna_rcvd,
            (MessageType::Hna, MessageEvent::Generated) => {
                &mut self.hna_generated
            }
            (MessageType::Hna, MessageEvent::Relayed) => &mut self.hna_relayed,
        };
        *counter += 1;
    }
}

// ===== impl ProtocolInputChannelsRx =====

impl ProtocolInputChannelsRx {
    pub async fn recv(&mut self) -> Option<ProtocolInputMsg> {
        tokio::select! {
            msg = self.net_rx.recv() => {
                msg.map(ProtocolInputMsg::NetRxPacket)
            }
            msg = self.hello_interval.recv() => {
                msg.map(ProtocolInputMsg::HelloInterval)
            }
            msg = self.tc_interval.recv() => {
                msg.map(ProtocolInputMsg::TcInterval)
            }
            msg = self.mid_interval.recv() => {
                msg.map(ProtocolInputMsg::MidInterval)
            }
            msg = self.hna_interval.recv() => {
                msg.map(ProtocolInputMsg::HnaInterval)
            }
            msg = self.hold_timer.recv() => {
                msg.map(ProtocolInputMsg::HoldTimer)
            }
        }
    }
}
