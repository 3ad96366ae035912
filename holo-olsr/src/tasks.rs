//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::time::Duration;

use holo_utils::Sender;
use holo_utils::task::{IntervalTask, random_jitter};

use crate::config::InstanceCfg;
use crate::tasks::messages::input::{
    HelloIntervalMsg, HnaIntervalMsg, HoldTable, HoldTimerMsg, MidIntervalMsg,
    TcIntervalMsg,
};

//
// OLSR tasks diagram:
//
//                                 +--------------+
//                 net_rx (1x) ->  |              |
//         hello_interval (1x) ->  |              |
//            tc_interval (1x) ->  |              | -> (1x) net_tx
//           mid_interval (1x) ->  |   instance   | -> (1x) route install
//           hna_interval (1x) ->  |              |
//            hold_timer (5x)  ->  |              |
//                                 +--------------+
//

// OLSR inter-task message types.
pub mod messages {
    use std::net::{IpAddr, SocketAddr};

    use serde::{Deserialize, Serialize};

    use crate::packet::{DecodeError, Packet};
    use crate::southbound::RouteMsg;

    // Type aliases.
    pub type ProtocolInputMsg = input::ProtocolMsg;
    pub type ProtocolOutputMsg = output::ProtocolMsg;

    // Input messages (child task -> main task).
    pub mod input {
        use super::*;

        #[derive(Debug, Deserialize, Serialize)]
        pub enum ProtocolMsg {
            NetRxPacket(NetRxPacketMsg),
            HelloInterval(HelloIntervalMsg),
            TcInterval(TcIntervalMsg),
            MidInterval(MidIntervalMsg),
            HnaInterval(HnaIntervalMsg),
            HoldTimer(HoldTimerMsg),
        }

        #[derive(Debug, Deserialize, Serialize)]
        pub struct NetRxPacketMsg {
            pub ifindex: u32,
            pub src: IpAddr,
            pub packet: Result<Packet, DecodeError>,
        }

        #[derive(Debug, Deserialize, Serialize)]
        pub struct HelloIntervalMsg {}

        #[derive(Debug, Deserialize, Serialize)]
        pub struct TcIntervalMsg {}

        #[derive(Debug, Deserialize, Serialize)]
        pub struct MidIntervalMsg {}

        #[derive(Debug, Deserialize, Serialize)]
        pub struct HnaIntervalMsg {}

        #[derive(Debug, Deserialize, Serialize)]
        pub struct HoldTimerMsg {
            pub table: HoldTable,
        }

        // Table swept by a hold timer.
        #[derive(Clone, Copy, Debug, Eq, PartialEq)]
        #[derive(Deserialize, Serialize)]
        pub enum HoldTable {
            Neighbor,
            Topology,
            Duplicate,
            Mid,
            Hna,
        }
    }

    // Output messages (main task -> child task).
    pub mod output {
        use super::*;

        #[derive(Debug, Deserialize, Serialize)]
        pub enum ProtocolMsg {
            NetTxPacket(NetTxPacketMsg),
            RouteInstall(RouteMsg),
            RouteClear,
        }

        #[derive(Debug, Deserialize, Serialize)]
        pub struct NetTxPacketMsg {
            pub ifindex: u32,
            pub src: IpAddr,
            pub dst: SocketAddr,
            pub packet: Packet,
        }
    }
}

// ===== OLSR tasks =====

// HELLO interval task. The first HELLO goes out after a short random delay.
pub(crate) fn hello_interval(
    config: &InstanceCfg,
    hello_intervalp: &Sender<HelloIntervalMsg>,
) -> IntervalTask {
    let start = random_jitter(InstanceCfg::MAX_START_DELAY)
        .max(Duration::from_millis(1));
    let hello_intervalp = hello_intervalp.clone();
    IntervalTask::new(
        start,
        config.hello_interval,
        InstanceCfg::MAX_HELLO_JITTER,
        move || {
            let hello_intervalp = hello_intervalp.clone();
            async move {
                let _ = hello_intervalp.send(HelloIntervalMsg {}).await;
            }
        },
    )
}

// TC interval task.
pub(crate) fn tc_interval(
    config: &InstanceCfg,
    tc_intervalp: &Sender<TcIntervalMsg>,
) -> IntervalTask {
    let tc_intervalp = tc_intervalp.clone();
    IntervalTask::new(
        jittered(config.tc_interval, InstanceCfg::MAX_TC_JITTER),
        config.tc_interval,
        InstanceCfg::MAX_TC_JITTER,
        move || {
            let tc_intervalp = tc_intervalp.clone();
            async move {
                let _ = tc_intervalp.send(TcIntervalMsg {}).await;
            }
        },
    )
}

// MID interval task.
pub(crate) fn mid_interval(
    config: &InstanceCfg,
    mid_intervalp: &Sender<MidIntervalMsg>,
) -> IntervalTask {
    let mid_intervalp = mid_intervalp.clone();
    IntervalTask::new(
        jittered(config.mid_interval, InstanceCfg::MAX_MID_JITTER),
        config.mid_interval,
        InstanceCfg::MAX_MID_JITTER,
        move || {
            let mid_intervalp = mid_intervalp.clone();
            async move {
                let _ = mid_intervalp.send(MidIntervalMsg {}).await;
            }
        },
    )
}

// HNA interval task.
pub(crate) fn hna_interval(
    config: &InstanceCfg,
    hna_intervalp: &Sender<HnaIntervalMsg>,
) -> IntervalTask {
    let hna_intervalp = hna_intervalp.clone();
    IntervalTask::new(
        jittered(config.hna_interval, InstanceCfg::MAX_HNA_JITTER),
        config.hna_interval,
        InstanceCfg::MAX_HNA_JITTER,
        move || {
            let hna_intervalp = hna_intervalp.clone();
            async move {
                let _ = hna_intervalp.send(HnaIntervalMsg {}).await;
            }
        },
    )
}

// Periodic sweep of a table with expiring entries.
pub(crate) fn hold_timer(
    table: HoldTable,
    interval: Duration,
    hold_timerp: &Sender<HoldTimerMsg>,
) -> IntervalTask {
    let hold_timerp = hold_timerp.clone();
    IntervalTask::new(interval, interval, Duration::ZERO, move || {
        let hold_timerp = hold_timerp.clone();
        async move {
            let _ = hold_timerp.send(HoldTimerMsg { table }).await;
        }
    })
}

// ===== helper functions =====

fn jittered(interval: Duration, jitter: Duration) -> Duration {
    interval.saturating_sub(random_jitter(jitter))
}
