//! One roster's guest list: the add, remove and check-in flows.
//!
//! Every flow checks permissions against the [`PartyContext`] before the
//! request is sent, writes to the local roster only after the server
//! accepted the change, and reports the outcome as a [`Notice`].
//!
//! [`Notice`]: crate::notice::Notice

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::context::PartyContext;
use crate::error::{GuestListError, Result};
use crate::guest::{Guest, NewGuest, Partition};
use crate::notice::Notices;
use crate::remote::GuestBackend;
use crate::roster::RosterEvent;
use crate::search::GuestFilter;
use crate::sync::RosterSync;
use crate::view::{self, GuestRow};

const GUEST_ADDED: &str = "Guest successfully added to the list.";
const GUEST_REMOVED: &str = "Guest successfully removed from the list.";
const GUEST_CHECKED_IN: &str = "Successfully checked in guest";
const GUEST_CHECKED_OUT: &str = "Successfully checked out guest";
const NOT_GUESTS_HOST: &str = "You can't edit guests you didn't add";
const PARTY_ALREADY_STARTED: &str = "Guests can't be removed once the party has started";
const PARTY_NOT_STARTED: &str = "Guests can't be checked in before the party starts";

pub struct GuestList {
    partition: Partition,
    ctx: PartyContext,
    backend: Arc<dyn GuestBackend>,
    sync: Arc<RosterSync>,
    notices: Notices,
}

impl GuestList {
    pub fn new(
        partition: Partition,
        backend: Arc<dyn GuestBackend>,
        ctx: PartyContext,
        notices: Notices,
    ) -> Self {
        let sync = Arc::new(RosterSync::new(partition, Arc::clone(&backend), ctx.clone()));
        Self {
            partition,
            ctx,
            backend,
            sync,
            notices,
        }
    }

    pub fn partition(&self) -> Partition {
        self.partition
    }

    pub fn sync(&self) -> &Arc<RosterSync> {
        &self.sync
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RosterEvent> {
        self.sync.subscribe()
    }

    pub fn headcount(&self) -> usize {
        self.sync.headcount()
    }

    /// Rows for rendering, in roster order.
    pub fn rows(&self, filter: &GuestFilter) -> Vec<GuestRow> {
        view::guest_rows(&self.sync.lock_roster(), &self.ctx, filter)
    }

    pub fn guest(&self, id: i64) -> Option<Guest> {
        self.sync.lock_roster().get(id).cloned()
    }

    /// Put a guest on this roster, hosted by the signed-in host.
    pub async fn add_guest(&self, name: &str) -> Result<Guest> {
        let result = self.try_add(name).await;
        self.report(result, GUEST_ADDED)
    }

    async fn try_add(&self, name: &str) -> Result<Guest> {
        let new = NewGuest::new(name, self.partition, &self.ctx.me().full_name())?;
        let created = self.backend.create_guest(&new).await?;
        self.sync.apply_local(|r| r.upsert(created.clone()));
        Ok(created)
    }

    /// Take a guest off the list. Only the guest's host may do this, and
    /// only before the party starts.
    pub async fn remove_guest(&self, id: i64) -> Result<()> {
        let result = self.try_remove(id).await;
        self.report(result, GUEST_REMOVED)
    }

    async fn try_remove(&self, id: i64) -> Result<()> {
        let guest = self.guest(id).ok_or(GuestListError::NotFound(id))?;
        if self.ctx.party_started() {
            return Err(GuestListError::Forbidden(PARTY_ALREADY_STARTED.into()));
        }
        if !self.ctx.is_host_of(&guest) {
            return Err(GuestListError::Forbidden(NOT_GUESTS_HOST.into()));
        }

        self.backend.delete_guest(id).await?;
        self.sync.apply_local(|r| r.remove(id));
        Ok(())
    }

    /// Check a guest in, or out if already in. Only the guest's host may do
    /// this, and only once the party has started.
    pub async fn toggle_check_in(&self, id: i64) -> Result<Guest> {
        let result = self.try_toggle(id).await;
        let message = match &result {
            Ok(g) if !g.is_at_party => GUEST_CHECKED_OUT,
            _ => GUEST_CHECKED_IN,
        };
        self.report(result, message)
    }

    async fn try_toggle(&self, id: i64) -> Result<Guest> {
        let mut guest = self.guest(id).ok_or(GuestListError::NotFound(id))?;
        if !self.ctx.party_started() {
            return Err(GuestListError::Forbidden(PARTY_NOT_STARTED.into()));
        }
        if !self.ctx.is_host_of(&guest) {
            return Err(GuestListError::Forbidden(NOT_GUESTS_HOST.into()));
        }

        guest.toggle_check_in();
        self.backend.set_attendance(id, guest.is_at_party).await?;
        self.sync.apply_local(|r| r.upsert(guest.clone()));
        Ok(guest)
    }

    fn report<T>(&self, result: Result<T>, success: &str) -> Result<T> {
        match &result {
            Ok(_) => self.notices.success(success),
            Err(e) => {
                tracing::warn!("{} roster: {}", self.partition, e);
                self.notices.error(e.to_string());
            }
        }
        result
    }
}
