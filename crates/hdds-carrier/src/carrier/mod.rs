// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Carrier plugin contract.
//!
//! A carrier is the wire-protocol policy attached to one connection. Carriers
//! are registered as named prototypes in a [`CarrierFactory`] and cloned per
//! connection with [`Carrier::create`], so an instance is never shared
//! between connections.
//!
//! # Architecture
//!
//! ```text
//! tcp+recv.priority+level.15
//!
//! ModifyingCarrier<PriorityCarrier>     <- admission, configuration
//! +-- inner: PassthroughCarrier("tcp")  <- framing, capability flags
//! ```
//!
//! Modifiers decorate a base carrier (see [`ModifyingCarrier`]) and may be
//! stacked. Framing always reaches the base carrier.

pub mod factory;
pub mod modifying;

pub use factory::CarrierFactory;
pub use modifying::{Modifier, ModifyingCarrier};

use std::fmt;

use crate::error::{CarrierError, Result};
use crate::modifier::ModifierConfig;

/// Logical route of a connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route {
    /// Sending port name.
    pub from: String,
    /// Receiving port name (the endpoint several routes may share).
    pub to: String,
    /// Full carrier specification, modifiers included.
    pub carrier: String,
}

impl Route {
    pub fn new(from: impl Into<String>, to: impl Into<String>, carrier: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            carrier: carrier.into(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} -> {}", self.from, self.carrier, self.to)
    }
}

/// Connection setup state handed to [`Carrier::configure`].
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    route: Route,
    modifiers: ModifierConfig,
}

impl ConnectionContext {
    /// Build the context for a route, parsing its carrier specification.
    pub fn new(route: Route) -> Self {
        let modifiers = ModifierConfig::parse(&route.carrier);
        Self { route, modifiers }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Key-value parameters from the carrier specification.
    pub fn modifiers(&self) -> &ModifierConfig {
        &self.modifiers
    }
}

/// One inbound data unit, as seen by carriers.
///
/// Carriers may inspect the bytes but never consume or mutate them.
pub trait ConnectionReader {
    /// Route of the connection the data arrived on.
    fn route(&self) -> &Route;

    fn bytes(&self) -> &[u8];

    fn size(&self) -> usize {
        self.bytes().len()
    }
}

/// Borrowed inbound message.
#[derive(Debug, Clone, Copy)]
pub struct InboundMessage<'a> {
    route: &'a Route,
    payload: &'a [u8],
}

impl<'a> InboundMessage<'a> {
    pub fn new(route: &'a Route, payload: &'a [u8]) -> Self {
        Self { route, payload }
    }
}

impl ConnectionReader for InboundMessage<'_> {
    fn route(&self) -> &Route {
        self.route
    }

    fn bytes(&self) -> &[u8] {
        self.payload
    }
}

/// Capability flags advertised by a carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CarrierFlags {
    /// Needs a companion carrier installed on the paired direction.
    pub requires_companion: bool,
    /// No persistent connection (datagram style).
    pub connectionless: bool,
    /// Sender pushes data without being asked.
    pub push: bool,
    /// Human-readable framing.
    pub text_mode: bool,
    /// Every message is acknowledged by the receiver.
    pub requires_ack: bool,
    /// Receiver may reply on the same connection.
    pub supports_reply: bool,
}

/// Wire-protocol plugin for one connection.
pub trait Carrier: Send {
    /// Fresh, independent instance of the same concrete carrier.
    fn create(&self) -> Box<dyn Carrier>;

    /// Protocol identifier used in carrier specifications.
    fn name(&self) -> &str;

    /// String form for diagnostics.
    fn describe(&self) -> String {
        self.name().to_string()
    }

    fn flags(&self) -> CarrierFlags {
        CarrierFlags::default()
    }

    /// True for decorators that wrap another carrier.
    fn is_modifier(&self) -> bool {
        false
    }

    /// Parse parameters and wire up any inner carrier.
    ///
    /// An error aborts setup of this connection only.
    fn configure(&mut self, _ctx: &ConnectionContext) -> Result<()> {
        Ok(())
    }

    /// Decide whether an inbound data unit is delivered (`true`) or
    /// silently discarded (`false`).
    fn accept_incoming_data(&mut self, _reader: &dyn ConnectionReader) -> bool {
        true
    }

    fn modifies_incoming_data(&self) -> bool {
        false
    }

    fn modify_incoming_data(&mut self, payload: Vec<u8>) -> Vec<u8> {
        payload
    }

    fn accept_outgoing_data(&mut self, _payload: &[u8]) -> bool {
        true
    }

    fn modifies_outgoing_data(&self) -> bool {
        false
    }

    fn modify_outgoing_data(&mut self, payload: Vec<u8>) -> Vec<u8> {
        payload
    }

    /// Append one framed message to `out`.
    fn write_frame(&mut self, payload: &[u8], out: &mut Vec<u8>) -> Result<()>;

    /// Extract the payload from one complete frame.
    fn read_frame<'a>(&mut self, frame: &'a [u8]) -> Result<&'a [u8]>;
}

impl fmt::Debug for dyn Carrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Carrier")
            .field("name", &self.name())
            .field("describe", &self.describe())
            .finish()
    }
}

const FRAME_HEADER_LEN: usize = 4;

/// Transparent base carrier.
///
/// Accepts every message and frames payloads with a 4-byte big-endian
/// length prefix. Registered under the usual transport names (`tcp`, `udp`,
/// ...); the actual stream handling lives below this layer.
#[derive(Debug, Clone)]
pub struct PassthroughCarrier {
    name: String,
    flags: CarrierFlags,
}

impl PassthroughCarrier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flags: CarrierFlags::default(),
        }
    }

    /// Stream transport defaults (`tcp`, `fast_tcp`).
    pub fn stream(name: impl Into<String>) -> Self {
        Self::new(name).with_flags(CarrierFlags {
            supports_reply: true,
            ..CarrierFlags::default()
        })
    }

    /// Datagram transport defaults (`udp`, `mcast`).
    pub fn datagram(name: impl Into<String>) -> Self {
        Self::new(name).with_flags(CarrierFlags {
            connectionless: true,
            push: true,
            ..CarrierFlags::default()
        })
    }

    pub fn with_flags(mut self, flags: CarrierFlags) -> Self {
        self.flags = flags;
        self
    }
}

impl Carrier for PassthroughCarrier {
    fn create(&self) -> Box<dyn Carrier> {
        Box::new(self.clone())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> String {
        format!("{}_carrier", self.name)
    }

    fn flags(&self) -> CarrierFlags {
        self.flags
    }

    fn write_frame(&mut self, payload: &[u8], out: &mut Vec<u8>) -> Result<()> {
        let len = u32::try_from(payload.len()).map_err(|_| {
            CarrierError::Frame(format!("payload of {} bytes exceeds u32", payload.len()))
        })?;
        out.reserve(FRAME_HEADER_LEN + payload.len());
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(payload);
        Ok(())
    }

    fn read_frame<'a>(&mut self, frame: &'a [u8]) -> Result<&'a [u8]> {
        if frame.len() < FRAME_HEADER_LEN {
            return Err(CarrierError::Frame(format!(
                "frame of {} bytes is shorter than its header",
                frame.len()
            )));
        }
        let (header, body) = frame.split_at(FRAME_HEADER_LEN);
        let len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
        if body.len() != len {
            return Err(CarrierError::Frame(format!(
                "length prefix says {} bytes, frame carries {}",
                len,
                body.len()
            )));
        }
        Ok(body)
    }
}
