// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shared arbitration state for one endpoint.
//!
//! Every priority-aware connection into the same receiving port is a member
//! of one [`PriorityGroup`]. For each inbound message the group compares the
//! sender's decayed score against every other member's score at the same
//! instant:
//!
//! - an inhibitory sender is never admitted
//! - any other member with a strictly higher score outranks the sender
//! - an active inhibitory member (score > 0) at or above the sender's score
//!   gates it
//! - otherwise the sender is admitted; ties admit
//!
//! The decision is a linear scan under the group lock, held for the whole
//! stamp-and-decide step, so decisions within one endpoint are linearized.

use std::fmt;

use parking_lot::Mutex;

use super::state::PriorityState;
use crate::election::{PeerGroup, PeerId};

/// Outcome of one admission decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Deliver the data.
    Accepted,
    /// A non-inhibitory peer had a strictly higher score.
    Outranked { by: PeerId },
    /// An active inhibitory peer scored at or above the sender.
    Inhibited { by: PeerId },
    /// The sender itself is inhibitory.
    Inhibitory,
    /// The sender is not (or no longer) a member.
    NotMember,
}

impl Admission {
    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Point-in-time view of one member, for external starvation monitoring.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerSnapshot {
    pub id: PeerId,
    pub source_name: String,
    pub priority_level: f64,
    pub time_arrival: Option<f64>,
    pub inhibitory: bool,
    /// Decayed score at the snapshot time.
    pub score: f64,
}

struct Peer {
    id: PeerId,
    state: PriorityState,
}

/// Members competing for one endpoint.
pub struct PriorityGroup {
    endpoint: String,
    peers: Mutex<Vec<Peer>>,
}

impl PriorityGroup {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn len(&self) -> usize {
        self.peers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.lock().is_empty()
    }

    /// Record a message from `source` at `now` without arbitrating.
    pub fn observe(&self, source: PeerId, now: f64) -> bool {
        self.update(source, |state| state.observe(now))
    }

    /// Apply `f` to the stored state of `source`.
    pub fn update<F>(&self, source: PeerId, f: F) -> bool
    where
        F: FnOnce(&mut PriorityState),
    {
        let mut peers = self.peers.lock();
        match peers.iter_mut().find(|p| p.id == source) {
            Some(peer) => {
                f(&mut peer.state);
                true
            }
            None => false,
        }
    }

    /// Decayed score of `source` at `now`.
    pub fn score(&self, source: PeerId, now: f64) -> Option<f64> {
        let peers = self.peers.lock();
        peers
            .iter()
            .find(|p| p.id == source)
            .map(|p| p.state.actual_priority(now))
    }

    /// Decide admission for `source` at `now` from stored state only.
    pub fn arbitrate(&self, source: PeerId, now: f64) -> Admission {
        let peers = self.peers.lock();
        match peers.iter().position(|p| p.id == source) {
            Some(idx) => decide(&peers, idx, now),
            None => Admission::NotMember,
        }
    }

    /// Handle one inbound message from `source` at `now`.
    ///
    /// Stamps the arrival according to the source's policy, arbitrates, and
    /// for the admitted-only policy stamps again on success. All under one
    /// lock hold.
    pub fn accept_incoming_data(&self, source: PeerId, now: f64) -> Admission {
        let mut peers = self.peers.lock();
        let Some(idx) = peers.iter().position(|p| p.id == source) else {
            tracing::debug!(
                "[PriorityGroup] {} not a member of '{}'; dropping",
                source,
                self.endpoint
            );
            return Admission::NotMember;
        };

        if peers[idx].state.stamps_on_observe() {
            peers[idx].state.observe(now);
        }

        let admission = decide(&peers, idx, now);
        if admission.is_accepted() {
            peers[idx].state.observe(now);
        }

        tracing::trace!(
            "[PriorityGroup] '{}' {} ({}) at {:.6}: {:?}",
            self.endpoint,
            source,
            peers[idx].state.source_name,
            now,
            admission
        );

        admission
    }

    /// Scores of all members at `now`, in registration order.
    pub fn snapshot(&self, now: f64) -> Vec<PeerSnapshot> {
        let peers = self.peers.lock();
        peers
            .iter()
            .map(|p| PeerSnapshot {
                id: p.id,
                source_name: p.state.source_name.clone(),
                priority_level: p.state.priority_level,
                time_arrival: p.state.time_arrival,
                inhibitory: p.state.inhibitory,
                score: p.state.actual_priority(now),
            })
            .collect()
    }
}

fn decide(peers: &[Peer], idx: usize, now: f64) -> Admission {
    let me = &peers[idx];
    if me.state.inhibitory {
        return Admission::Inhibitory;
    }

    let score = me.state.actual_priority(now);
    for other in peers.iter().filter(|p| p.id != me.id) {
        let theirs = other.state.actual_priority(now);
        if other.state.inhibitory {
            if theirs > 0.0 && theirs >= score {
                return Admission::Inhibited { by: other.id };
            }
        } else if theirs > score {
            return Admission::Outranked { by: other.id };
        }
    }

    Admission::Accepted
}

impl PeerGroup for PriorityGroup {
    type Member = PriorityState;

    fn new(key: &str) -> Self {
        Self {
            endpoint: key.to_string(),
            peers: Mutex::new(Vec::new()),
        }
    }

    fn join(&self, id: PeerId, member: PriorityState) {
        self.peers.lock().push(Peer { id, state: member });
    }

    fn leave(&self, id: PeerId) -> bool {
        let mut peers = self.peers.lock();
        let before = peers.len();
        peers.retain(|p| p.id != id);
        peers.len() != before
    }
}

impl fmt::Debug for PriorityGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriorityGroup")
            .field("endpoint", &self.endpoint)
            .field("members", &self.len())
            .finish()
    }
}
