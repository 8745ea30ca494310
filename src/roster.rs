//! Local copy of one roster and its reconciliation against server fetches.
//!
//! The roster keeps guests in the order the server last reported them and
//! never holds two records with the same id. Every fetch is stamped with a
//! sequence number when it is issued; local writes take a sequence number
//! too, so a response issued before a newer fetch or a local write is
//! recognised as stale and dropped.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::guest::{Guest, Partition};

/// A change to a roster, published to views after it has been applied.
#[derive(Debug, Clone, PartialEq)]
pub enum RosterEvent {
    Added(Guest),
    Removed(Guest),
    Changed { before: Guest, after: Guest },
    /// Recomputed headcount, sent once after each batch of changes.
    Count(usize),
}

/// Roster shared between the sync task and the controller.
pub type SharedRoster = Arc<Mutex<Roster>>;

#[derive(Debug)]
pub struct Roster {
    partition: Partition,
    guests: Vec<Guest>,
    issued: u64,
    last_applied: u64,
}

impl Roster {
    pub fn new(partition: Partition) -> Self {
        Self {
            partition,
            guests: Vec::new(),
            issued: 0,
            last_applied: 0,
        }
    }

    pub fn shared(partition: Partition) -> SharedRoster {
        Arc::new(Mutex::new(Self::new(partition)))
    }

    pub fn partition(&self) -> Partition {
        self.partition
    }

    pub fn guests(&self) -> &[Guest] {
        &self.guests
    }

    pub fn len(&self) -> usize {
        self.guests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guests.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Guest> {
        self.guests.iter().find(|g| g.id == Some(id))
    }

    pub fn checked_in_count(&self) -> usize {
        self.guests.iter().filter(|g| g.is_at_party).count()
    }

    /// Checked-in count once the party has started, total size before.
    pub fn headcount(&self, party_started: bool) -> usize {
        if party_started {
            self.checked_in_count()
        } else {
            self.len()
        }
    }

    /// Reserve a sequence number for a fetch that is about to be issued.
    pub fn begin_fetch(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Apply the response of the fetch stamped `seq`.
    ///
    /// Returns `None` when the response is stale, in which case nothing changes.
    pub fn apply_fetch(&mut self, seq: u64, fetched: Vec<Guest>) -> Option<Vec<RosterEvent>> {
        if seq <= self.last_applied {
            tracing::debug!(
                "Discarding stale {} roster response (seq {} <= {})",
                self.partition,
                seq,
                self.last_applied
            );
            return None;
        }
        self.last_applied = seq;
        Some(self.reconcile(fetched))
    }

    /// Run a local write. Fetches issued before it become stale.
    pub fn apply_local<F>(&mut self, write: F) -> Option<RosterEvent>
    where
        F: FnOnce(&mut Self) -> Option<RosterEvent>,
    {
        self.issued += 1;
        self.last_applied = self.issued;
        write(self)
    }

    /// Replace the roster contents with `fetched`, keyed by id.
    ///
    /// Removals are reported in the old order, additions and changes in the
    /// fetched order. Records without an id and repeated ids are skipped.
    pub fn reconcile(&mut self, fetched: Vec<Guest>) -> Vec<RosterEvent> {
        let mut seen = HashSet::with_capacity(fetched.len());
        let fetched: Vec<Guest> = fetched
            .into_iter()
            .filter(|g| match g.id {
                Some(id) => seen.insert(id),
                None => {
                    tracing::debug!("Skipping unsaved guest in fetch: {}", g.name);
                    false
                }
            })
            .collect();

        let mut events = Vec::new();
        let mut previous: HashMap<i64, Guest> = HashMap::with_capacity(self.guests.len());
        for guest in self.guests.drain(..) {
            let Some(id) = guest.id else { continue };
            if seen.contains(&id) {
                previous.insert(id, guest);
            } else {
                events.push(RosterEvent::Removed(guest));
            }
        }

        for guest in &fetched {
            let Some(id) = guest.id else { continue };
            match previous.remove(&id) {
                Some(before) if before != *guest => events.push(RosterEvent::Changed {
                    before,
                    after: guest.clone(),
                }),
                Some(_) => {}
                None => events.push(RosterEvent::Added(guest.clone())),
            }
        }

        self.guests = fetched;
        events
    }

    /// Insert a saved guest, or update it in place if it is already listed.
    pub fn upsert(&mut self, guest: Guest) -> Option<RosterEvent> {
        let id = guest.id?;
        match self.guests.iter_mut().find(|g| g.id == Some(id)) {
            Some(existing) if *existing == guest => None,
            Some(existing) => {
                let before = std::mem::replace(existing, guest.clone());
                Some(RosterEvent::Changed {
                    before,
                    after: guest,
                })
            }
            None => {
                self.guests.push(guest.clone());
                Some(RosterEvent::Added(guest))
            }
        }
    }

    pub fn remove(&mut self, id: i64) -> Option<RosterEvent> {
        let pos = self.guests.iter().position(|g| g.id == Some(id))?;
        Some(RosterEvent::Removed(self.guests.remove(pos)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guest::guest;

    fn ids(roster: &Roster) -> Vec<i64> {
        roster.guests().iter().filter_map(|g| g.id).collect()
    }

    fn roster_with(ids: &[i64]) -> Roster {
        let mut roster = Roster::new(Partition::Male);
        roster.reconcile(ids.iter().map(|&id| guest(id, "Guest", "Sam Host")).collect());
        roster
    }

    #[test]
    fn test_reconcile_adds_and_removes() {
        let mut roster = roster_with(&[1, 2, 3]);

        let events = roster.reconcile(vec![
            guest(2, "Guest", "Sam Host"),
            guest(3, "Guest", "Sam Host"),
            guest(4, "Guest", "Sam Host"),
        ]);

        assert_eq!(ids(&roster), vec![2, 3, 4]);
        assert_eq!(
            events,
            vec![
                RosterEvent::Removed(guest(1, "Guest", "Sam Host")),
                RosterEvent::Added(guest(4, "Guest", "Sam Host")),
            ]
        );
    }

    #[test]
    fn test_reconcile_changed_only_when_fields_differ() {
        let mut roster = roster_with(&[1, 2]);

        let mut checked_in = guest(2, "Guest", "Sam Host");
        checked_in.is_at_party = true;
        let events = roster.reconcile(vec![guest(1, "Guest", "Sam Host"), checked_in.clone()]);

        assert_eq!(
            events,
            vec![RosterEvent::Changed {
                before: guest(2, "Guest", "Sam Host"),
                after: checked_in,
            }]
        );
        assert_eq!(roster.checked_in_count(), 1);
    }

    #[test]
    fn test_reconcile_same_fetch_is_quiet() {
        let mut roster = roster_with(&[1, 2, 3]);
        let events = roster.reconcile(roster.guests().to_vec());
        assert!(events.is_empty());
    }

    #[test]
    fn test_reconcile_follows_server_order() {
        let mut roster = roster_with(&[1, 2, 3]);
        roster.reconcile(vec![
            guest(3, "Guest", "Sam Host"),
            guest(1, "Guest", "Sam Host"),
            guest(2, "Guest", "Sam Host"),
        ]);
        assert_eq!(ids(&roster), vec![3, 1, 2]);
    }

    #[test]
    fn test_reconcile_drops_duplicates_and_unsaved() {
        let mut roster = Roster::new(Partition::Male);
        let mut unsaved = guest(9, "Nobody", "Sam Host");
        unsaved.id = None;

        let events = roster.reconcile(vec![
            guest(1, "First", "Sam Host"),
            guest(1, "Second", "Sam Host"),
            unsaved,
        ]);

        assert_eq!(events.len(), 1);
        assert_eq!(ids(&roster), vec![1]);
        assert_eq!(roster.get(1).unwrap().name, "First");
    }

    #[test]
    fn test_stale_fetch_is_discarded() {
        let mut roster = roster_with(&[1]);
        let older = roster.begin_fetch();
        let newer = roster.begin_fetch();

        assert!(roster
            .apply_fetch(newer, vec![guest(2, "Guest", "Sam Host")])
            .is_some());
        assert!(roster.apply_fetch(older, vec![]).is_none());
        assert_eq!(ids(&roster), vec![2]);
    }

    #[test]
    fn test_local_write_invalidates_pending_fetch() {
        let mut roster = roster_with(&[1]);
        let pending = roster.begin_fetch();

        let event = roster.apply_local(|r| r.upsert(guest(5, "Newcomer", "Sam Host")));
        assert!(matches!(event, Some(RosterEvent::Added(_))));

        // response was produced before the add reached the server
        assert!(roster
            .apply_fetch(pending, vec![guest(1, "Guest", "Sam Host")])
            .is_none());
        assert_eq!(ids(&roster), vec![1, 5]);
    }

    #[test]
    fn test_upsert_and_remove() {
        let mut roster = roster_with(&[1]);
        assert!(roster.upsert(guest(1, "Guest", "Sam Host")).is_none());

        let event = roster.upsert(guest(1, "Renamed", "Sam Host"));
        assert!(matches!(event, Some(RosterEvent::Changed { .. })));

        let mut unsaved = guest(7, "Unsaved", "Sam Host");
        unsaved.id = None;
        assert!(roster.upsert(unsaved).is_none());

        assert!(matches!(roster.remove(1), Some(RosterEvent::Removed(_))));
        assert!(roster.remove(1).is_none());
        assert!(roster.is_empty());
    }

    #[test]
    fn test_headcount_depends_on_party_started() {
        let mut roster = roster_with(&[1, 2, 3]);
        let mut here = guest(2, "Guest", "Sam Host");
        here.is_at_party = true;
        roster.upsert(here);

        assert_eq!(roster.headcount(false), 3);
        assert_eq!(roster.headcount(true), 1);
    }
}
