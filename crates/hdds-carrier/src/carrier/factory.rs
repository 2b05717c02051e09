// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Named carrier prototypes.
//!
//! The factory turns a carrier specification into a ready-to-configure
//! chain:
//!
//! ```text
//! build("tcp+recv.priority+level.15", Recv)
//!   tcp prototype      -> create()
//!   priority prototype -> create(), wrapped around the tcp instance
//! ```
//!
//! Modifiers listed for the other direction, and plain parameters, are left
//! alone.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{Carrier, Modifier, ModifyingCarrier, PassthroughCarrier};
use crate::clock::Clock;
use crate::error::{CarrierError, Result};
use crate::modifier::{Direction, ModifierConfig};
use crate::priority::{PriorityCarrier, PriorityElection};

type CarrierCtor = Box<dyn Fn() -> Box<dyn Carrier> + Send + Sync>;
type ModifierCtor = Box<dyn Fn(Box<dyn Carrier>) -> Box<dyn Carrier> + Send + Sync>;

/// Table of base carriers and modifiers, by name.
#[derive(Default)]
pub struct CarrierFactory {
    carriers: HashMap<String, CarrierCtor>,
    modifiers: HashMap<String, ModifierCtor>,
}

impl CarrierFactory {
    /// Empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory with the stock transports and the `priority` modifier.
    pub fn with_defaults(peers: Arc<PriorityElection>, clock: Arc<dyn Clock>) -> Self {
        let mut factory = Self::new();
        factory.register_carrier(PassthroughCarrier::stream("tcp"));
        factory.register_carrier(PassthroughCarrier::stream("fast_tcp"));
        factory.register_carrier(PassthroughCarrier::datagram("udp"));
        factory.register_carrier(PassthroughCarrier::datagram("mcast"));
        factory.register_carrier(PassthroughCarrier::new("local"));
        factory.register_modifier(PriorityCarrier::new(peers).with_clock(clock));
        factory
    }

    /// Register a base carrier prototype under its own name.
    pub fn register_carrier<C>(&mut self, prototype: C)
    where
        C: Carrier + Sync + 'static,
    {
        let name = prototype.name().to_string();
        if self.carriers.contains_key(&name) {
            tracing::debug!("[CarrierFactory] Replacing carrier '{}'", name);
        }
        self.carriers
            .insert(name, Box::new(move || prototype.create()));
    }

    /// Register a modifier prototype under its own name.
    pub fn register_modifier<M>(&mut self, prototype: M)
    where
        M: Modifier + Sync + 'static,
    {
        let name = prototype.name().to_string();
        if self.modifiers.contains_key(&name) {
            tracing::debug!("[CarrierFactory] Replacing modifier '{}'", name);
        }
        self.modifiers.insert(
            name,
            Box::new(move |inner: Box<dyn Carrier>| -> Box<dyn Carrier> {
                Box::new(ModifyingCarrier::new(inner, prototype.create()))
            }),
        );
    }

    /// True if `name` is a registered carrier or modifier.
    pub fn contains(&self, name: &str) -> bool {
        self.carriers.contains_key(name) || self.modifiers.contains_key(name)
    }

    /// Registered base carrier names, sorted.
    pub fn carrier_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.carriers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Registered modifier names, sorted.
    pub fn modifier_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modifiers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Instantiate the chain described by `spec` for one side of a connection.
    ///
    /// Modifiers wrap in declaration order, so the last one listed is
    /// outermost and sees inbound data first.
    pub fn build(&self, spec: &str, direction: Direction) -> Result<Box<dyn Carrier>> {
        let config = ModifierConfig::parse(spec);
        if config.base().is_empty() {
            return Err(CarrierError::EmptySpec);
        }

        let base = self
            .carriers
            .get(config.base())
            .ok_or_else(|| CarrierError::UnknownCarrier(config.base().to_string()))?;
        let mut carrier = base();

        for name in config.modifiers_for(direction) {
            let wrap = self
                .modifiers
                .get(name)
                .ok_or_else(|| CarrierError::UnknownModifier(name.to_string()))?;
            carrier = wrap(carrier);
        }

        tracing::debug!(
            "[CarrierFactory] Built '{}' ({}) for {}",
            spec,
            carrier.describe(),
            direction
        );
        Ok(carrier)
    }
}

impl fmt::Debug for CarrierFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CarrierFactory")
            .field("carriers", &self.carrier_names())
            .field("modifiers", &self.modifier_names())
            .finish()
    }
}
