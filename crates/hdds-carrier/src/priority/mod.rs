// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Priority-based admission control.
//!
//! Several sources connected to the same receiving port compete for it. Each
//! source declares a peak priority and a decay time constant; its effective
//! score decays after every message it sends. Only the source with the
//! highest score at the moment its data arrives gets delivered.
//!
//! - [`state`] - per-source parameters and the decay function
//! - [`group`] - shared arbitration state per endpoint
//! - [`carrier`] - the `priority` modifier tying both to a connection

pub mod carrier;
pub mod group;
pub mod state;

pub use carrier::{PriorityCarrier, PriorityElection};
pub use group::{Admission, PeerSnapshot, PriorityGroup};
pub use state::{ArrivalPolicy, PriorityState, DECAY_STEEPNESS};
