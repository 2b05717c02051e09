// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Priority-based admission modifier.
//!
//! ```text
//! tcp+recv.priority+level.15+time.2
//! tcp+recv.priority+level.30+time.0.5+inhibit
//! tcp+recv.priority+level.5+time.1+arrival.admitted
//! ```
//!
//! | Key        | Meaning                                   | Default    |
//! |------------|-------------------------------------------|------------|
//! | `level`    | peak priority (>= 0)                      | 0          |
//! | `time`     | decay time constant, seconds (> 0)        | 0 (floor)  |
//! | `inhibit`  | flag: suppress peers, never deliver       | off        |
//! | `arrival`  | `observed` or `admitted` stamping policy  | `observed` |
//!
//! Invalid numbers fall back to their defaults. An inhibitory source without
//! a positive time constant cannot take part in decay comparison, so its
//! connection is refused.

use std::fmt;
use std::sync::Arc;

use super::group::{Admission, PeerSnapshot, PriorityGroup};
use super::state::{ArrivalPolicy, PriorityState};
use crate::carrier::{ConnectionContext, ConnectionReader, Modifier};
use crate::clock::{Clock, SystemClock};
use crate::election::{Election, Registration};
use crate::error::{CarrierError, Result};

/// Registry of priority groups, keyed by receiving port name.
pub type PriorityElection = Election<PriorityGroup>;

/// Default peak priority.
pub const DEFAULT_PRIORITY_LEVEL: f64 = 0.0;
/// Default time constant (decay disabled).
pub const DEFAULT_TIME_CONSTANT: f64 = 0.0;

const NAME: &str = "priority";

/// Admission-control modifier for one connection.
pub struct PriorityCarrier {
    peers: Arc<PriorityElection>,
    clock: Arc<dyn Clock>,
    state: PriorityState,
    registration: Option<Registration<PriorityGroup>>,
}

impl PriorityCarrier {
    /// Create an unconfigured carrier bound to `peers`, reading the wall clock.
    pub fn new(peers: Arc<PriorityElection>) -> Self {
        Self {
            peers,
            clock: Arc::new(SystemClock),
            state: PriorityState::new("", DEFAULT_PRIORITY_LEVEL, DEFAULT_TIME_CONSTANT),
            registration: None,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn priority_level(&self) -> f64 {
        self.state.priority_level
    }

    pub fn time_constant(&self) -> f64 {
        self.state.time_constant
    }

    pub fn is_inhibitory(&self) -> bool {
        self.state.inhibitory
    }

    pub fn arrival_policy(&self) -> ArrivalPolicy {
        self.state.arrival_policy
    }

    pub fn source_name(&self) -> &str {
        &self.state.source_name
    }

    /// Registry key; `None` before a successful `configure`.
    pub fn endpoint(&self) -> Option<&str> {
        self.registration.as_ref().map(Registration::key)
    }

    /// Group shared with the other sources of the same endpoint.
    pub fn group(&self) -> Option<&Arc<PriorityGroup>> {
        self.registration.as_ref().map(Registration::group)
    }

    /// Current decayed score; zero before `configure`.
    pub fn actual_priority(&self, t: f64) -> f64 {
        self.registration
            .as_ref()
            .and_then(|reg| reg.group().score(reg.id(), t))
            .unwrap_or(0.0)
    }

    /// Scores of every source competing for this endpoint, now.
    pub fn peer_snapshot(&self) -> Vec<PeerSnapshot> {
        self.group()
            .map(|group| group.snapshot(self.clock.now()))
            .unwrap_or_default()
    }

    /// Full admission outcome for a message arriving now.
    pub fn admit(&self) -> Admission {
        match &self.registration {
            Some(reg) => reg.group().accept_incoming_data(reg.id(), self.clock.now()),
            None => Admission::Accepted,
        }
    }

    fn parse_state(ctx: &ConnectionContext) -> Result<PriorityState> {
        let params = ctx.modifiers();
        let source = ctx.route().from.clone();

        let mut level = params.get_f64("level", DEFAULT_PRIORITY_LEVEL);
        if level < 0.0 {
            tracing::warn!(
                "[PriorityCarrier] {}: negative level {}; using {}",
                source,
                level,
                DEFAULT_PRIORITY_LEVEL
            );
            level = DEFAULT_PRIORITY_LEVEL;
        }

        let mut time = params.get_f64("time", DEFAULT_TIME_CONSTANT);
        if time < 0.0 {
            tracing::warn!(
                "[PriorityCarrier] {}: negative time constant {}; decay disabled",
                source,
                time
            );
            time = DEFAULT_TIME_CONSTANT;
        }

        let inhibitory = params.has("inhibit") || params.has("inhibitory");

        let policy = match params.get("arrival") {
            None => ArrivalPolicy::default(),
            Some(token) => ArrivalPolicy::from_token(token).unwrap_or_else(|| {
                tracing::warn!(
                    "[PriorityCarrier] {}: unknown arrival policy '{}'; using {}",
                    source,
                    token,
                    ArrivalPolicy::default().token()
                );
                ArrivalPolicy::default()
            }),
        };

        if inhibitory && time <= 0.0 {
            return Err(CarrierError::misconfigured(
                NAME,
                format!("inhibitory source {} needs a positive 'time'", source),
            ));
        }

        if time <= 0.0 {
            tracing::warn!(
                "[PriorityCarrier] {}: no time constant; source stays at signal floor",
                source
            );
        }

        Ok(PriorityState::new(source, level, time)
            .with_inhibitory(inhibitory)
            .with_arrival_policy(policy))
    }
}

impl Modifier for PriorityCarrier {
    fn create(&self) -> Self {
        Self::new(Arc::clone(&self.peers)).with_clock(Arc::clone(&self.clock))
    }

    fn name(&self) -> &str {
        NAME
    }

    fn configure(&mut self, ctx: &ConnectionContext) -> Result<()> {
        let endpoint = &ctx.route().to;
        if endpoint.is_empty() {
            return Err(CarrierError::misconfigured(NAME, "route has no receiving port"));
        }

        let state = Self::parse_state(ctx)?;

        // Reconfiguring leaves the old group before joining the new one.
        self.registration = None;
        self.registration = Some(self.peers.register(endpoint, state.clone()));

        tracing::debug!(
            "[PriorityCarrier] {} -> {}: level={} time={} inhibitory={} arrival={}",
            state.source_name,
            endpoint,
            state.priority_level,
            state.time_constant,
            state.inhibitory,
            state.arrival_policy.token()
        );

        self.state = state;
        Ok(())
    }

    fn accept_incoming_data(&mut self, _reader: &dyn ConnectionReader) -> bool {
        self.admit().is_accepted()
    }
}

impl fmt::Debug for PriorityCarrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriorityCarrier")
            .field("state", &self.state)
            .field("registration", &self.registration)
            .finish()
    }
}
