// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Peer election: name-keyed groups shared by independent connections.
//!
//! Connections that terminate at the same endpoint never hold references to
//! each other. Instead each one registers under the endpoint name and gets
//! back the single group object for that name.
//!
//! # Architecture
//!
//! ```text
//! Election<G> (one per process, injected into carriers)
//! +-- groups: Mutex<HashMap<endpoint, Entry<G>>>
//!
//! Entry<G>
//! +-- group: Arc<G>              <- shared with every Registration
//! +-- members: HashSet<PeerId>   <- reference count
//! ```
//!
//! # Lifecycle
//!
//! 1. First `register` for a name creates the group
//! 2. Later registrations join the same group
//! 3. [`Registration`] drop deregisters; the last one retires the entry
//! 4. A new registration under a retired name gets a brand-new group
//!
//! # Thread Safety
//!
//! - Map mutex: held for insertion/removal only, never during arbitration
//! - Group state: guarded by the group's own lock (lock order: map, then group)

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

/// Identity of one registrant, unique within an [`Election`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(u64);

impl PeerId {
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer#{}", self.0)
    }
}

/// Shared state created once per endpoint name.
pub trait PeerGroup: Send + Sync {
    /// Per-registrant data handed over at registration.
    type Member;

    fn new(key: &str) -> Self;

    fn join(&self, id: PeerId, member: Self::Member);

    /// Returns false if `id` was not a member.
    fn leave(&self, id: PeerId) -> bool;
}

struct Entry<G> {
    group: Arc<G>,
    members: HashSet<PeerId>,
}

/// Registry mapping endpoint names to shared groups.
pub struct Election<G: PeerGroup> {
    groups: Mutex<HashMap<Arc<str>, Entry<G>>>,
    next_id: AtomicU64,
}

impl<G: PeerGroup> Election<G> {
    pub fn new() -> Self {
        Self {
            groups: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Join the group for `key`, creating it on first use.
    ///
    /// The returned token deregisters when dropped.
    pub fn register(self: &Arc<Self>, key: &str, member: G::Member) -> Registration<G> {
        let id = PeerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let key: Arc<str> = Arc::from(key);

        let mut groups = self.groups.lock();
        let entry = groups.entry(Arc::clone(&key)).or_insert_with(|| {
            tracing::debug!("[Election] Created group for '{}'", key);
            Entry {
                group: Arc::new(G::new(&key)),
                members: HashSet::new(),
            }
        });

        entry.group.join(id, member);
        entry.members.insert(id);
        let group = Arc::clone(&entry.group);
        let members = entry.members.len();
        drop(groups);

        tracing::debug!(
            "[Election] {} registered under '{}' ({} members)",
            id,
            key,
            members
        );

        Registration {
            election: Arc::downgrade(self),
            key,
            id,
            group,
        }
    }

    /// Leave the group for `key`; retire it when empty.
    ///
    /// Unknown names or ids are a no-op: teardown races are expected.
    /// Returns whether a member was removed.
    pub fn deregister(&self, key: &str, id: PeerId) -> bool {
        let mut groups = self.groups.lock();

        let Some(entry) = groups.get_mut(key) else {
            tracing::debug!("[Election] Deregister {} from unknown group '{}'", id, key);
            return false;
        };

        if !entry.members.remove(&id) {
            tracing::debug!("[Election] {} is not a member of '{}'", id, key);
            return false;
        }

        entry.group.leave(id);

        if entry.members.is_empty() {
            groups.remove(key);
            tracing::debug!("[Election] Retired empty group '{}'", key);
        }

        true
    }

    /// Current group for `key`, if any registrant is alive.
    pub fn lookup(&self, key: &str) -> Option<Arc<G>> {
        let groups = self.groups.lock();
        groups.get(key).map(|entry| Arc::clone(&entry.group))
    }

    /// Number of live groups.
    pub fn group_count(&self) -> usize {
        self.groups.lock().len()
    }

    /// Number of registrants under `key`.
    pub fn member_count(&self, key: &str) -> usize {
        let groups = self.groups.lock();
        groups.get(key).map_or(0, |entry| entry.members.len())
    }

    /// Names with a live group, sorted.
    pub fn keys(&self) -> Vec<String> {
        let groups = self.groups.lock();
        let mut keys: Vec<String> = groups.keys().map(|k| k.to_string()).collect();
        keys.sort();
        keys
    }
}

impl<G: PeerGroup> Default for Election<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: PeerGroup> fmt::Debug for Election<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Election")
            .field("groups", &self.keys())
            .finish()
    }
}

/// Membership token returned by [`Election::register`].
///
/// Dropping it deregisters, so membership ends on every exit path,
/// including failed connection setup.
pub struct Registration<G: PeerGroup> {
    election: Weak<Election<G>>,
    key: Arc<str>,
    id: PeerId,
    group: Arc<G>,
}

impl<G: PeerGroup> Registration<G> {
    pub fn id(&self) -> PeerId {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The group shared with every registrant under the same key.
    pub fn group(&self) -> &Arc<G> {
        &self.group
    }
}

impl<G: PeerGroup> Drop for Registration<G> {
    fn drop(&mut self) {
        match self.election.upgrade() {
            Some(election) => {
                election.deregister(&self.key, self.id);
            }
            // Registry already gone; still leave the group other peers may hold.
            None => {
                self.group.leave(self.id);
            }
        }
    }
}

impl<G: PeerGroup> fmt::Debug for Registration<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("key", &self.key)
            .field("id", &self.id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Group that just records member names.
    struct NameGroup {
        key: String,
        names: Mutex<Vec<(PeerId, String)>>,
    }

    impl NameGroup {
        fn names(&self) -> Vec<String> {
            self.names.lock().iter().map(|(_, n)| n.clone()).collect()
        }
    }

    impl PeerGroup for NameGroup {
        type Member = String;

        fn new(key: &str) -> Self {
            Self {
                key: key.to_string(),
                names: Mutex::new(Vec::new()),
            }
        }

        fn join(&self, id: PeerId, member: String) {
            self.names.lock().push((id, member));
        }

        fn leave(&self, id: PeerId) -> bool {
            let mut names = self.names.lock();
            let before = names.len();
            names.retain(|(peer, _)| *peer != id);
            names.len() != before
        }
    }

    #[test]
    fn test_register_creates_group_once() {
        let election = Arc::new(Election::<NameGroup>::new());

        let a = election.register("/port1", "a".into());
        let b = election.register("/port1", "b".into());

        assert!(Arc::ptr_eq(a.group(), b.group()));
        assert_eq!(a.group().key, "/port1");
        assert_eq!(election.group_count(), 1);
        assert_eq!(election.member_count("/port1"), 2);
        assert_eq!(a.group().names(), vec!["a", "b"]);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_lookup_is_non_mutating() {
        let election = Arc::new(Election::<NameGroup>::new());
        assert!(election.lookup("/port1").is_none());

        let reg = election.register("/port1", "a".into());
        let found = election.lookup("/port1").expect("group exists");

        assert!(Arc::ptr_eq(&found, reg.group()));
        assert_eq!(election.member_count("/port1"), 1);
    }

    #[test]
    fn test_drop_last_member_retires_group() {
        let election = Arc::new(Election::<NameGroup>::new());
        let a = election.register("/port1", "a".into());
        let b = election.register("/port1", "b".into());
        let first = Arc::clone(a.group());

        drop(a);
        assert_eq!(election.member_count("/port1"), 1);
        assert_eq!(first.names(), vec!["b"]);

        drop(b);
        assert!(election.lookup("/port1").is_none());
        assert_eq!(election.group_count(), 0);

        // Re-registering yields a fresh, empty group.
        let c = election.register("/port1", "c".into());
        assert!(!Arc::ptr_eq(&first, c.group()));
        assert_eq!(c.group().names(), vec!["c"]);
    }

    #[test]
    fn test_names_are_isolated() {
        let election = Arc::new(Election::<NameGroup>::new());
        let a = election.register("/left", "a".into());
        let b = election.register("/right", "b".into());

        assert!(!Arc::ptr_eq(a.group(), b.group()));
        assert_eq!(election.keys(), vec!["/left", "/right"]);

        drop(b);
        assert_eq!(a.group().names(), vec!["a"]);
        assert_eq!(election.keys(), vec!["/left"]);
    }

    #[test]
    fn test_deregister_unknown_is_noop() {
        let election = Arc::new(Election::<NameGroup>::new());
        let reg = election.register("/port1", "a".into());

        assert!(!election.deregister("/nowhere", reg.id()));
        assert!(!election.deregister("/port1", PeerId(9_999)));
        assert_eq!(election.member_count("/port1"), 1);
    }

    #[test]
    fn test_explicit_deregister_then_drop() {
        let election = Arc::new(Election::<NameGroup>::new());
        let reg = election.register("/port1", "a".into());

        assert!(election.deregister("/port1", reg.id()));
        assert_eq!(election.group_count(), 0);

        // Token drop after explicit removal is harmless.
        drop(reg);
        assert_eq!(election.group_count(), 0);
    }

    #[test]
    fn test_registration_outlives_election() {
        let election = Arc::new(Election::<NameGroup>::new());
        let a = election.register("/port1", "a".into());
        let b = election.register("/port1", "b".into());
        drop(election);

        drop(a);
        assert_eq!(b.group().names(), vec!["b"]);
    }
}
