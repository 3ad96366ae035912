//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;

use ipnetwork::IpNetwork;
use serde::Deserialize;

// Simulation scenario, loaded from a TOML file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    // Simulated run time, in seconds.
    #[serde(default = "Scenario::default_duration")]
    pub duration: u64,
    #[serde(default)]
    pub logging: Logging,
    #[serde(rename = "node")]
    pub nodes: Vec<Node>,
    #[serde(default, rename = "link")]
    pub links: Vec<Link>,
    #[serde(default, rename = "event")]
    pub events: Vec<Event>,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Logging {
    pub style: LoggingFmtStyle,
    pub colors: bool,
    pub show_source: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggingFmtStyle {
    Compact,
    #[default]
    Full,
    Json,
    Pretty,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Node {
    pub name: String,
    // OLSR parameters, using the `OLSR-*` keys.
    #[serde(default)]
    pub olsr: BTreeMap<String, String>,
    #[serde(rename = "interface")]
    pub interfaces: Vec<NodeInterface>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeInterface {
    pub name: String,
    pub ifindex: u32,
    pub address: IpNetwork,
    #[serde(default = "NodeInterface::default_olsr")]
    pub olsr: bool,
}

// Pair of interfaces within range of each other, written as "node:iface".
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Link {
    pub a: String,
    pub b: String,
}

// Scheduled change in the state of a link.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Event {
    // Seconds since the start of the simulation.
    pub time: f64,
    pub a: String,
    pub b: String,
    pub state: LinkState,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LinkState {
    Up,
    Down,
}

// ===== impl Scenario =====

impl Scenario {
    pub(crate) fn load(path: &str) -> Result<Scenario, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|error| format!("failed to read {path}: {error}"))?;
        toml::from_str(&text)
            .map_err(|error| format!("failed to parse {path}: {error}"))
    }

    fn default_duration() -> u64 {
        60
    }
}

// ===== impl Logging =====

impl Default for Logging {
    fn default() -> Logging {
        Logging {
            style: LoggingFmtStyle::Full,
            colors: true,
            show_source: false,
        }
    }
}

// ===== impl NodeInterface =====

impl NodeInterface {
    fn default_olsr() -> bool {
        true
    }
}

// ===== unit tests =====
