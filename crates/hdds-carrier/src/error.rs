// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Carrier errors.
//!
//! Only connection setup can fail. Rejected data and arbitration ties are
//! ordinary outcomes, not errors.

use thiserror::Error;

/// Errors raised while building or configuring a carrier chain.
#[derive(Debug, Error)]
pub enum CarrierError {
    #[error("Empty carrier specification")]
    EmptySpec,

    #[error("Unknown carrier: {0}")]
    UnknownCarrier(String),

    #[error("Unknown modifier: {0}")]
    UnknownModifier(String),

    #[error("Carrier '{carrier}' misconfigured: {reason}")]
    Misconfigured { carrier: String, reason: String },

    #[error("Framing error: {0}")]
    Frame(String),
}

impl CarrierError {
    /// Shorthand for [`CarrierError::Misconfigured`].
    pub fn misconfigured(carrier: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Misconfigured {
            carrier: carrier.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias for carrier operations.
pub type Result<T> = std::result::Result<T, CarrierError>;
