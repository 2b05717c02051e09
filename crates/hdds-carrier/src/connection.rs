// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Connection glue between a route and its carrier chain.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::carrier::{Carrier, CarrierFactory, ConnectionContext, InboundMessage, Route};
use crate::error::Result;
use crate::modifier::Direction;

/// Statistics for one connection.
#[derive(Debug)]
pub struct ConnectionStats {
    /// Messages handed to the receiver.
    pub messages_delivered: AtomicU64,

    /// Bytes handed to the receiver.
    pub bytes_delivered: AtomicU64,

    /// Messages discarded by the carrier chain.
    pub messages_dropped: AtomicU64,

    /// Malformed frames.
    pub errors: AtomicU64,

    /// Connection creation time.
    pub created: Instant,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self {
            messages_delivered: AtomicU64::new(0),
            bytes_delivered: AtomicU64::new(0),
            messages_dropped: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            created: Instant::now(),
        }
    }

    pub fn record_delivered(&self, bytes: u64) {
        self.messages_delivered.fetch_add(1, Ordering::Relaxed);
        self.bytes_delivered.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.messages_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of current stats.
    pub fn snapshot(&self) -> ConnectionStatsSnapshot {
        ConnectionStatsSnapshot {
            messages_delivered: self.messages_delivered.load(Ordering::Relaxed),
            bytes_delivered: self.bytes_delivered.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            uptime_secs: self.created.elapsed().as_secs(),
        }
    }
}

impl Default for ConnectionStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of connection statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatsSnapshot {
    pub messages_delivered: u64,
    pub bytes_delivered: u64,
    pub messages_dropped: u64,
    pub errors: u64,
    pub uptime_secs: u64,
}

impl ConnectionStatsSnapshot {
    /// Fraction of inbound messages that were discarded.
    pub fn drop_ratio(&self) -> f64 {
        let total = self.messages_delivered + self.messages_dropped;
        if total > 0 {
            self.messages_dropped as f64 / total as f64
        } else {
            0.0
        }
    }
}

/// Receiving side of one route.
///
/// Dropping the connection releases the carrier chain first, so any
/// registry membership ends before the rest of the connection goes away.
pub struct InboundConnection {
    route: Route,
    carrier: Option<Box<dyn Carrier>>,
    stats: Arc<ConnectionStats>,
}

impl InboundConnection {
    /// Build and configure the receive-side chain for `route`.
    ///
    /// On error the partially built chain is dropped, which undoes any
    /// registration it made.
    pub fn open(factory: &CarrierFactory, route: Route) -> Result<Self> {
        let mut carrier = factory.build(&route.carrier, Direction::Recv)?;
        let ctx = ConnectionContext::new(route);
        if let Err(e) = carrier.configure(&ctx) {
            tracing::warn!("[Connection] Refused {}: {}", ctx.route(), e);
            return Err(e);
        }

        tracing::info!("[Connection] Opened {} ({})", ctx.route(), carrier.describe());

        Ok(Self {
            route: ctx.route().clone(),
            carrier: Some(carrier),
            stats: Arc::new(ConnectionStats::new()),
        })
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Carrier chain; `None` after [`close`](Self::close).
    pub fn carrier(&self) -> Option<&dyn Carrier> {
        self.carrier.as_deref()
    }

    pub fn stats(&self) -> &Arc<ConnectionStats> {
        &self.stats
    }

    pub fn is_open(&self) -> bool {
        self.carrier.is_some()
    }

    /// Offer one inbound payload to the chain.
    ///
    /// Returns the bytes to hand to the receiver, or `None` when the chain
    /// discards the message (or the connection is closed).
    pub fn deliver(&mut self, payload: &[u8]) -> Option<Vec<u8>> {
        let Some(carrier) = self.carrier.as_mut() else {
            self.stats.record_dropped();
            return None;
        };

        let accepted = carrier.accept_incoming_data(&InboundMessage::new(&self.route, payload));
        if !accepted {
            self.stats.record_dropped();
            return None;
        }

        let payload = if carrier.modifies_incoming_data() {
            carrier.modify_incoming_data(payload.to_vec())
        } else {
            payload.to_vec()
        };
        self.stats.record_delivered(payload.len() as u64);
        Some(payload)
    }

    /// Unframe and deliver one wire frame.
    ///
    /// A malformed frame is an error; a discarded message is `Ok(None)`.
    pub fn receive_frame(&mut self, frame: &[u8]) -> Result<Option<Vec<u8>>> {
        let Some(carrier) = self.carrier.as_mut() else {
            self.stats.record_dropped();
            return Ok(None);
        };

        let payload = match carrier.read_frame(frame) {
            Ok(payload) => payload,
            Err(e) => {
                self.stats.record_error();
                tracing::debug!("[Connection] {}: {}", self.route, e);
                return Err(e);
            }
        };
        Ok(self.deliver(payload))
    }

    /// Release the carrier chain, ending its registry membership.
    pub fn close(&mut self) {
        if let Some(carrier) = self.carrier.take() {
            tracing::info!("[Connection] Closed {}", self.route);
            drop(carrier);
        }
    }
}

impl Drop for InboundConnection {
    fn drop(&mut self) {
        self.close();
    }
}

/// Sending side of one route.
pub struct OutboundConnection {
    route: Route,
    carrier: Box<dyn Carrier>,
}

impl OutboundConnection {
    /// Build and configure the send-side chain for `route`.
    pub fn open(factory: &CarrierFactory, route: Route) -> Result<Self> {
        let mut carrier = factory.build(&route.carrier, Direction::Send)?;
        let ctx = ConnectionContext::new(route);
        carrier.configure(&ctx)?;
        Ok(Self {
            route: ctx.route().clone(),
            carrier,
        })
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Frame `payload` for the wire, or `None` if the chain refuses it.
    pub fn encode(&mut self, payload: &[u8]) -> Result<Option<Vec<u8>>> {
        if !self.carrier.accept_outgoing_data(payload) {
            return Ok(None);
        }

        let payload = if self.carrier.modifies_outgoing_data() {
            self.carrier.modify_outgoing_data(payload.to_vec())
        } else {
            payload.to_vec()
        };

        let mut frame = Vec::new();
        self.carrier.write_frame(&payload, &mut frame)?;
        Ok(Some(frame))
    }
}
