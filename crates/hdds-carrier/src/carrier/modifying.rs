// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Decorator carriers.
//!
//! A [`Modifier`] changes a few behaviors of a connection (admission,
//! payload transforms, configuration) without knowing which transport it
//! runs over. [`ModifyingCarrier`] pairs a modifier with an owned inner
//! carrier and forwards everything the modifier does not override.
//!
//! Ordering inside one decorator:
//!
//! - `configure`: inner first, then the modifier
//! - inbound admission: modifier first, short-circuits on rejection
//! - inbound transform: inner first (undo the outer layers last)
//! - outbound admission and transform: modifier first
//! - framing: inner only

use std::fmt;

use super::{Carrier, CarrierFlags, ConnectionContext, ConnectionReader};
use crate::error::Result;

/// The overridable part of the carrier contract.
pub trait Modifier: Send {
    /// Fresh instance for a new connection.
    fn create(&self) -> Self
    where
        Self: Sized;

    /// Name used after `recv.` / `send.` in carrier specifications.
    fn name(&self) -> &str;

    fn describe(&self) -> String {
        format!("{}_carrier", self.name())
    }

    fn configure(&mut self, _ctx: &ConnectionContext) -> Result<()> {
        Ok(())
    }

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
}

/// A modifier wrapped around an inner carrier.
pub struct ModifyingCarrier<M> {
    inner: Box<dyn Carrier>,
    modifier: M,
}

impl<M: Modifier + 'static> ModifyingCarrier<M> {
    pub fn new(inner: Box<dyn Carrier>, modifier: M) -> Self {
        Self { inner, modifier }
    }

    pub fn inner(&self) -> &dyn Carrier {
        self.inner.as_ref()
    }

    pub fn modifier(&self) -> &M {
        &self.modifier
    }

    pub fn modifier_mut(&mut self) -> &mut M {
        &mut self.modifier
    }
}

impl<M: Modifier + 'static> Carrier for ModifyingCarrier<M> {
    fn create(&self) -> Box<dyn Carrier> {
        Box::new(Self::new(self.inner.create(), self.modifier.create()))
    }

    fn name(&self) -> &str {
        self.modifier.name()
    }

    fn describe(&self) -> String {
        self.modifier.describe()
    }

    fn flags(&self) -> CarrierFlags {
        CarrierFlags {
            requires_companion: true,
            ..self.inner.flags()
        }
    }

    fn is_modifier(&self) -> bool {
        true
    }

    fn configure(&mut self, ctx: &ConnectionContext) -> Result<()> {
        self.inner.configure(ctx)?;
        self.modifier.configure(ctx)
    }

    fn accept_incoming_data(&mut self, reader: &dyn ConnectionReader) -> bool {
        self.modifier.accept_incoming_data(reader) && self.inner.accept_incoming_data(reader)
    }

    fn modifies_incoming_data(&self) -> bool {
        self.modifier.modifies_incoming_data() || self.inner.modifies_incoming_data()
    }

    fn modify_incoming_data(&mut self, payload: Vec<u8>) -> Vec<u8> {
        let payload = self.inner.modify_incoming_data(payload);
        self.modifier.modify_incoming_data(payload)
    }

    fn accept_outgoing_data(&mut self, payload: &[u8]) -> bool {
        self.modifier.accept_outgoing_data(payload) && self.inner.accept_outgoing_data(payload)
    }

    fn modifies_outgoing_data(&self) -> bool {
        self.modifier.modifies_outgoing_data() || self.inner.modifies_outgoing_data()
    }

    fn modify_outgoing_data(&mut self, payload: Vec<u8>) -> Vec<u8> {
        let payload = self.modifier.modify_outgoing_data(payload);
        self.inner.modify_outgoing_data(payload)
    }

    fn write_frame(&mut self, payload: &[u8], out: &mut Vec<u8>) -> Result<()> {
        self.inner.write_frame(payload, out)
    }

    fn read_frame<'a>(&mut self, frame: &'a [u8]) -> Result<&'a [u8]> {
        self.inner.read_frame(frame)
    }
}

impl<M: Modifier + 'static> fmt::Debug for ModifyingCarrier<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModifyingCarrier")
            .field("modifier", &self.modifier.describe())
            .field("inner", &self.inner.describe())
            .finish()
    }
}
