//! Who is signed in and whether the party has started.
//!
//! Passed into every component at construction instead of living in globals.
//! Clones share the same party-started flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// The signed-in host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    pub first_name: String,
    pub last_name: String,
}

impl Host {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// "First Last", the form the server reports as a guest's host.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone)]
pub struct PartyContext {
    me: Arc<Host>,
    party_started: Arc<AtomicBool>,
}

impl PartyContext {
    pub fn new(me: Host, party_started: bool) -> Self {
        Self {
            me: Arc::new(me),
            party_started: Arc::new(AtomicBool::new(party_started)),
        }
    }

    pub fn me(&self) -> &Host {
        &self.me
    }

    pub fn party_started(&self) -> bool {
        self.party_started.load(Ordering::Acquire)
    }

    pub fn set_party_started(&self, started: bool) {
        self.party_started.store(started, Ordering::Release);
    }

    /// Whether the signed-in host put this guest on the list.
    pub fn is_host_of(&self, guest: &crate::guest::Guest) -> bool {
        guest.is_hosted_by(&self.me.full_name())
    }
}
