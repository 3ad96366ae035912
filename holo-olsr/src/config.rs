//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::time::Duration;

use holo_utils::ip::AddressFamily;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;
use crate::packet::consts::{WILL_ALWAYS, WILL_DEFAULT};

// Per-instance OLSR configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct InstanceCfg {
    pub ip_version: AddressFamily,
    pub hello_interval: Duration,
    pub tc_interval: Duration,
    pub mid_interval: Duration,
    pub hna_interval: Duration,
    pub neighbor_hold_time: Duration,
    pub topology_hold_time: Duration,
    pub duplicate_hold_time: Duration,
    pub mid_hold_time: Duration,
    pub hna_hold_time: Duration,
    pub willingness: u8,
    pub mpr_coverage: usize,
}

// Explicitly configured values, before derived defaults are filled in.
#[derive(Debug, Default)]
struct ExplicitCfg {
    ip_version: Option<AddressFamily>,
    hello_interval: Option<Duration>,
    tc_interval: Option<Duration>,
    mid_interval: Option<Duration>,
    hna_interval: Option<Duration>,
    neighbor_hold_time: Option<Duration>,
    topology_hold_time: Option<Duration>,
    duplicate_hold_time: Option<Duration>,
    mid_hold_time: Option<Duration>,
    hna_hold_time: Option<Duration>,
    willingness: Option<u8>,
    mpr_coverage: Option<usize>,
}

// ===== impl InstanceCfg =====

impl InstanceCfg {
    pub const DFLT_HELLO_INTERVAL: Duration = Duration::from_secs(2);
    pub const DFLT_TC_INTERVAL: Duration = Duration::from_secs(5);
    pub const DFLT_DUPLICATE_HOLD_TIME: Duration = Duration::from_secs(30);
    pub const HOLD_TIME_MULTIPLIER: u32 = 3;
    // Largest accepted duration value.
    pub const MAX_DURATION: Duration = Duration::from_secs(7 * 86400);

    // Emission jitter bounds.
    pub const MAX_HELLO_JITTER: Duration = Duration::from_millis(100);
    pub const MAX_TC_JITTER: Duration = Duration::from_millis(500);
    pub const MAX_MID_JITTER: Duration = Duration::from_millis(500);
    pub const MAX_HNA_JITTER: Duration = Duration::from_millis(500);
    pub const MAX_START_DELAY: Duration = Duration::from_millis(100);

    // Builds the configuration from (key, value) parameter pairs.
    //
    // Malformed optional values are reported and replaced by their defaults.
    // An invalid IP version is fatal.
    pub fn from_params<'a, I>(params: I) -> Result<InstanceCfg, ConfigError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut explicit = ExplicitCfg::default();

        for (key, value) in params {
            let key = key.trim();
            let value = value.trim();
            let slot = match key.to_ascii_uppercase().as_str() {
                "OLSR-IP-VERSION" => {
                    let af = value.parse::<AddressFamily>().map_err(|_| {
                        ConfigError::InvalidValue(
                            key.to_owned(),
                            value.to_owned(),
                        )
                    })?;
                    explicit.ip_version = Some(af);
                    continue;
                }
                "OLSR-WILLINGNESS" => {
                    let max = WILL_ALWAYS as usize;
                    explicit.willingness = parse_bounded(key, value, 0, max)
                        .map(|value| value as u8);
                    continue;
                }
                "OLSR-MPR-COVERAGE" => {
                    explicit.mpr_coverage =
                        parse_bounded(key, value, 1, usize::MAX);
                    continue;
                }
                "OLSR-HELLO-INTERVAL" => &mut explicit.hello_interval,
                "OLSR-TC-INTERVAL" => &mut explicit.tc_interval,
                "OLSR-MID-INTERVAL" => &mut explicit.mid_interval,
                "OLSR-HNA-INTERVAL" => &mut explicit.hna_interval,
                "OLSR-NEIGHBOR-HOLD-TIME" => &mut explicit.neighbor_hold_time,
                "OLSR-TOPOLOGY-HOLD-TIME" => &mut explicit.topology_hold_time,
                "OLSR-DUPLICATE-HOLD-TIME" => {
                    &mut explicit.duplicate_hold_time
                }
                "OLSR-MID-HOLD-TIME" => &mut explicit.mid_hold_time,
                "OLSR-HNA-HOLD-TIME" => &mut explicit.hna_hold_time,
                _ => {
                    let error = ConfigError::UnknownParameter(key.to_owned());
                    warn!(%error, "ignoring parameter");
                    continue;
                }
            };

            match parse_duration(key, value) {
                Ok(duration) => *slot = Some(duration),
                Err(error) => {
                    warn!(%error, "using default value");
                }
            }
        }

        Ok(explicit.resolve())
    }

    // Parses the line-oriented key/value format: one `KEY VALUE` pair per
    // line, with `#` starting a comment.
    pub fn parse(text: &str) -> Result<InstanceCfg, ConfigError> {
        let params = text
            .lines()
            .map(|line| line.split('#').next().unwrap_or_default().trim())
            .filter(|line| !line.is_empty())
            .map(|line| {
                line.split_once(char::is_whitespace)
                    .unwrap_or((line, ""))
            });
        InstanceCfg::from_params(params)
    }
}

impl Default for InstanceCfg {
    fn default() -> InstanceCfg {
        ExplicitCfg::default().resolve()
    }
}

// ===== impl ExplicitCfg =====

impl ExplicitCfg {
    // Fills in the defaults. Derived values follow the configured base
    // intervals.
    fn resolve(self) -> InstanceCfg {
        let mult = InstanceCfg::HOLD_TIME_MULTIPLIER;
        let hello_interval = self
            .hello_interval
            .unwrap_or(InstanceCfg::DFLT_HELLO_INTERVAL);
        let tc_interval =
            self.tc_interval.unwrap_or(InstanceCfg::DFLT_TC_INTERVAL);
        let mid_interval = self.mid_interval.unwrap_or(tc_interval);
        let hna_interval = self.hna_interval.unwrap_or(tc_interval);

        InstanceCfg {
            ip_version: self.ip_version.unwrap_or(AddressFamily::Ipv4),
            hello_interval,
            tc_interval,
            mid_interval,
            hna_interval,
            neighbor_hold_time: self
                .neighbor_hold_time
                .unwrap_or(hello_interval * mult),
            topology_hold_time: self
                .topology_hold_time
                .unwrap_or(tc_interval * mult),
            duplicate_hold_time: self
                .duplicate_hold_time
                .unwrap_or(InstanceCfg::DFLT_DUPLICATE_HOLD_TIME),
            mid_hold_time: self.mid_hold_time.unwrap_or(mid_interval * mult),
            hna_hold_time: self.hna_hold_time.unwrap_or(hna_interval * mult),
            willingness: self.willingness.unwrap_or(WILL_DEFAULT),
            mpr_coverage: self.mpr_coverage.unwrap_or(1),
        }
    }
}

// ===== global functions =====

// Parses a duration of the form `<number>[NS|US|MS|S|M|H|D]`. A bare number
// is taken as seconds. Values above `InstanceCfg::MAX_DURATION` are
// rejected.
pub fn parse_duration(key: &str, value: &str) -> Result<Duration, ConfigError> {
    let invalid =
        || ConfigError::InvalidDuration(key.to_owned(), value.to_owned());

    let value_upper = value.trim().to_ascii_uppercase();
    let split = value_upper
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(value_upper.len());
    let (number, unit) = value_upper.split_at(split);
    let number = number.trim().parse::<f64>().map_err(|_| invalid())?;
    let scale = match unit.trim() {
        "NS" => 1e-9,
        "US" => 1e-6,
        "MS" => 1e-3,
        "S" | "" => 1.0,
        "M" => 60.0,
        "H" => 3600.0,
        "D" => 86400.0,
        _ => return Err(invalid()),
    };

    let secs = number * scale;
    if !secs.is_finite() {
        return Err(invalid());
    }
    if secs <= 0.0 {
        return Err(ConfigError::NonPositiveDuration(key.to_owned()));
    }
    match Duration::try_from_secs_f64(secs) {
        Ok(duration) if duration <= InstanceCfg::MAX_DURATION => Ok(duration),
        _ => Err(invalid()),
    }
}

// ===== helper functions =====

fn parse_bounded(
    key: &str,
    value: &str,
    min: usize,
    max: usize,
) -> Option<usize> {
    match value.parse::<usize>() {
        Ok(value) if value >= min && value <= max => Some(value),
        _ => {
            let error =
                ConfigError::InvalidValue(key.to_owned(), value.to_owned());
            warn!(%error, "using default value");
            None
        }
    }
}

// ===== unit tests =====
