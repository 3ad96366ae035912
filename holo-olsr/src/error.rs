//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::IpAddr;

use tracing::warn;

use crate::packet::DecodeError;

// OLSR errors.
#[derive(Debug)]
pub enum Error {
    UnknownInterface(u32),
    PacketDecodeError(String, IpAddr, DecodeError),
    PacketTooLarge(String, usize),
}

// OLSR configuration errors.
#[derive(Debug, Eq, PartialEq)]
pub enum ConfigError {
    UnknownParameter(String),
    InvalidDuration(String, String),
    NonPositiveDuration(String),
    InvalidValue(String, String),
    MissingMainAddress,
    AddressFamilyMismatch(String),
}

// ===== impl Error =====

impl Error {
    pub(crate) fn log(&self) {
        match self {
            Error::UnknownInterface(ifindex) => {
                warn!(%ifindex, "{}", self);
            }
            Error::PacketDecodeError(name, source, error) => {
                warn!(interface = %name, %source, %error, "{}", self);
            }
            Error::PacketTooLarge(name, size) => {
                warn!(interface = %name, %size, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::UnknownInterface(..) => {
                write!(f, "packet received on unknown interface")
            }
            Error::PacketDecodeError(..) => {
                write!(f, "failed to decode packet")
            }
            Error::PacketTooLarge(..) => {
                write!(f, "packet exceeds maximum size, not sending")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::PacketDecodeError(_, _, error) => Some(error),
            _ => None,
        }
    }
}

// ===== impl ConfigError =====

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::UnknownParameter(name) => {
                write!(f, "unknown parameter: {}", name)
            }
            ConfigError::InvalidDuration(name, value) => {
                write!(f, "invalid duration for {}: {}", name, value)
            }
            ConfigError::NonPositiveDuration(name) => {
                write!(f, "duration for {} must be positive", name)
            }
            ConfigError::InvalidValue(name, value) => {
                write!(f, "invalid value for {}: {}", name, value)
            }
            ConfigError::MissingMainAddress => {
                write!(f, "no OLSR interface to derive the main address from")
            }
            ConfigError::AddressFamilyMismatch(name) => {
                write!(f, "interface {} doesn't match the IP version", name)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
