//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

mod config;
mod medium;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use clap::{App, Arg};
use config::{LinkState, LoggingFmtStyle, Scenario};
use holo_olsr::config::InstanceCfg;
use holo_olsr::instance::{Instance, InstanceChannelsTx};
use holo_olsr::interface::{Interface, Interfaces};
use holo_utils::task::Task;
use medium::{Endpoint, Fib, Medium, MediumLink, MediumNode};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::info;
use tracing_subscriber::Layer;
use tracing_subscriber::prelude::*;

struct SimNode {
    name: String,
    shutdown_tx: oneshot::Sender<()>,
    instance: Task<Instance>,
    output: Task<Fib>,
}

fn init_tracing(config: &config::Logging) {
    let layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_file(config.show_source)
        .with_line_number(config.show_source)
        .with_ansi(config.colors);
    let layer = match config.style {
        LoggingFmtStyle::Compact => layer.compact().boxed(),
        LoggingFmtStyle::Full => layer.boxed(),
        LoggingFmtStyle::Json => layer.json().boxed(),
        LoggingFmtStyle::Pretty => layer.pretty().boxed(),
    };

    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive("holo=debug".parse().unwrap())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(env_filter)
        .with(layer)
        .init();
}

// Resolves a "node:iface" reference.
fn endpoint(scenario: &Scenario, name: &str) -> Result<Endpoint, String> {
    let (node_name, iface_name) = name
        .split_once(':')
        .ok_or_else(|| format!("invalid interface reference: {name}"))?;
    scenario
        .nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.name == node_name)
        .find_map(|(node_idx, node)| {
            node.interfaces
                .iter()
                .find(|iface| iface.name == iface_name)
                .map(|iface| (node_idx, iface.ifindex))
        })
        .ok_or_else(|| format!("unknown interface: {name}"))
}

// Resolves the link referenced by a scheduled event.
fn link_index(
    scenario: &Scenario,
    links: &[MediumLink],
    a: &str,
    b: &str,
) -> Result<usize, String> {
    let a = endpoint(scenario, a)?;
    let b = endpoint(scenario, b)?;
    links
        .iter()
        .position(|link| {
            (link.a == a && link.b == b) || (link.a == b && link.b == a)
        })
        .ok_or_else(|| "event refers to an unknown link".to_owned())
}

async fn simulate(scenario: Scenario) -> Result<(), String> {
    let links = scenario
        .links
        .iter()
        .map(|link| {
            Ok(MediumLink {
                a: endpoint(&scenario, &link.a)?,
                b: endpoint(&scenario, &link.b)?,
                up: AtomicBool::new(true),
            })
        })
        .collect::<Result<Vec<_>, String>>()?;
    let mut events = scenario
        .events
        .iter()
        .map(|event| {
            if !(event.time >= 0.0) {
                return Err(format!("invalid event time: {}", event.time));
            }
            let link_idx = link_index(&scenario, &links, &event.a, &event.b)?;
            Ok((event.time, link_idx, event.state))
        })
        .collect::<Result<Vec<_>, String>>()?;
    events.sort_by(|a, b| a.0.total_cmp(&b.0));

    // Create the OLSR instances.
    let mut instances = vec![];
    let mut medium_nodes = vec![];
    for node in &scenario.nodes {
        let config = InstanceCfg::from_params(
            node.olsr.iter().map(|(key, value)| (key.as_str(), value.as_str())),
        )
        .map_err(|error| format!("{}: {}", node.name, error))?;
        let interfaces = Interfaces::new(
            node.interfaces
                .iter()
                .map(|iface| {
                    Interface::new(
                        iface.name.clone(),
                        iface.ifindex,
                        iface.address,
                        iface.olsr,
                    )
                })
                .collect(),
        );

        let (protocol_input, input_rx) = Instance::protocol_input_channels();
        let (output_tx, output_rx) = mpsc::unbounded_channel();
        medium_nodes.push(MediumNode {
            af: config.ip_version,
            net_rx: protocol_input.net_rx.clone(),
        });
        let tx = InstanceChannelsTx {
            protocol_input,
            protocol_output: output_tx,
        };
        let instance = Instance::new(node.name.clone(), config, interfaces, tx)
            .map_err(|error| format!("{}: {}", node.name, error))?;
        instances.push((instance, input_rx, output_rx));
    }
    let medium = Arc::new(Medium {
        links,
        nodes: medium_nodes,
    });

    // Start them.
    let mut nodes = vec![];
    for (node_idx, (instance, input_rx, output_rx)) in
        instances.into_iter().enumerate()
    {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        nodes.push(SimNode {
            name: instance.name.clone(),
            shutdown_tx,
            instance: Task::spawn(instance.run(input_rx, shutdown_rx)),
            output: Task::spawn(medium::node_output(
                node_idx,
                medium.clone(),
                output_rx,
            )),
        });
    }

    // Play the scheduled link events.
    let start = Instant::now();
    for (time, link_idx, state) in events {
        tokio::time::sleep_until(start + Duration::from_secs_f64(time)).await;
        info!(%time, link = %link_idx, ?state, "link state change");
        medium.set_link_state(link_idx, state == LinkState::Up);
    }
    tokio::time::sleep_until(start + Duration::from_secs(scenario.duration))
        .await;

    // Stop the instances and report their final state.
    for node in nodes {
        let _ = node.shutdown_tx.send(());
        let instance = node
            .instance
            .await
            .map_err(|error| format!("{}: {}", node.name, error))?;
        let stats = serde_json::to_string_pretty(&instance.state.statistics)
            .map_err(|error| error.to_string())?;
        println!(
            "node {} (main address {})",
            node.name, instance.system.main_addr
        );
        println!("statistics: {stats}");

        // Releasing the instance closes its output channel.
        drop(instance);
        let fib = node
            .output
            .await
            .map_err(|error| format!("{}: {}", node.name, error))?;
        println!("routes:");
        for route in fib.values() {
            println!(
                "  {} via {} ifindex {} metric {}",
                route.prefix, route.nexthop, route.ifindex, route.metric
            );
        }
        println!();
    }

    Ok(())
}

// ===== main =====

fn main() {
    // Parse command-line parameters.
    let matches = App::new("OLSR network simulator")
        .about("Run OLSR instances over an emulated broadcast medium")
        .arg(
            Arg::with_name("SCENARIO")
                .help("Scenario file path")
                .required(true)
                .index(1),
        )
        .get_matches();
    let filename = matches.value_of("SCENARIO").unwrap();

    let scenario = match Scenario::load(filename) {
        Ok(scenario) => scenario,
        Err(error) => {
            eprintln!("{error}");
            std::process::exit(1);
        }
    };
    init_tracing(&scenario.logging);

    // Simulated time only advances when every task is idle.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .expect("Failed to create tokio runtime");
    if let Err(error) = runtime.block_on(simulate(scenario)) {
        eprintln!("{error}");
        std::process::exit(1);
    }
}
