//! Periodic roster refresh.
//!
//! One [`RosterSync`] per roster partition. A background task re-fetches the
//! roster on a fixed interval and reconciles it into the shared [`Roster`];
//! the resulting changes, followed by the new headcount, are broadcast to
//! every subscriber.
//!
//! - Only one fetch is outstanding at a time; a tick that finds one running
//!   is skipped, and missed ticks are not replayed.
//! - Responses are sequenced: one issued before a newer fetch or a local
//!   write is dropped.
//! - A failed fetch leaves the roster untouched and publishes nothing. The
//!   failure is logged and kept in [`SyncStatus::last_error`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::context::PartyContext;
use crate::error::Result;
use crate::guest::Partition;
use crate::remote::GuestBackend;
use crate::roster::{Roster, RosterEvent, SharedRoster};

/// Default refresh period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

const EVENT_CAPACITY: usize = 256;

/// Counters and last outcome, for diagnostics.
#[derive(Debug, Clone, Default)]
pub struct SyncStatus {
    pub fetches: u64,
    pub skipped: u64,
    pub stale: u64,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// What a single refresh did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Response reconciled; holds the number of roster changes.
    Applied(usize),
    /// A newer fetch or local write landed first; response dropped.
    Stale,
    /// Another fetch was still outstanding.
    Skipped,
}

pub struct RosterSync {
    partition: Partition,
    backend: Arc<dyn GuestBackend>,
    roster: SharedRoster,
    ctx: PartyContext,
    events: broadcast::Sender<RosterEvent>,
    in_flight: AtomicBool,
    status: Mutex<SyncStatus>,
}

/// Clears the in-flight flag when the fetch finishes, however it finishes.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl RosterSync {
    pub fn new(partition: Partition, backend: Arc<dyn GuestBackend>, ctx: PartyContext) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            partition,
            backend,
            roster: Roster::shared(partition),
            ctx,
            events,
            in_flight: AtomicBool::new(false),
            status: Mutex::new(SyncStatus::default()),
        }
    }

    pub fn partition(&self) -> Partition {
        self.partition
    }

    pub fn roster(&self) -> SharedRoster {
        Arc::clone(&self.roster)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RosterEvent> {
        self.events.subscribe()
    }

    pub fn status(&self) -> SyncStatus {
        self.status.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Current headcount, as shown by the count view.
    pub fn headcount(&self) -> usize {
        self.lock_roster().headcount(self.ctx.party_started())
    }

    pub(crate) fn lock_roster(&self) -> MutexGuard<'_, Roster> {
        self.roster.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn update_status<F: FnOnce(&mut SyncStatus)>(&self, f: F) {
        f(&mut self.status.lock().unwrap_or_else(|e| e.into_inner()));
    }

    /// Fetch the roster once and reconcile it.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            tracing::debug!("{} roster fetch still outstanding, skipping", self.partition);
            self.update_status(|s| s.skipped += 1);
            return Ok(RefreshOutcome::Skipped);
        }
        let _in_flight = InFlight(&self.in_flight);

        let seq = self.lock_roster().begin_fetch();
        self.update_status(|s| s.fetches += 1);

        let fetched = match self.backend.fetch_roster(self.partition).await {
            Ok(guests) => guests,
            Err(e) => {
                tracing::warn!("Failed to refresh {} roster: {}", self.partition, e);
                self.update_status(|s| s.last_error = Some(e.to_string()));
                return Err(e);
            }
        };

        let applied = self.lock_roster().apply_fetch(seq, fetched);
        self.update_status(|s| {
            s.last_synced_at = Some(Utc::now());
            s.last_error = None;
            if applied.is_none() {
                s.stale += 1;
            }
        });

        match applied {
            Some(events) => {
                let changes = events.len();
                if changes > 0 {
                    tracing::debug!("{} roster: {} changes", self.partition, changes);
                }
                self.publish(events);
                Ok(RefreshOutcome::Applied(changes))
            }
            None => Ok(RefreshOutcome::Stale),
        }
    }

    /// Apply a local write (after a successful create/delete/update) and publish it.
    pub fn apply_local<F>(&self, write: F) -> Option<RosterEvent>
    where
        F: FnOnce(&mut Roster) -> Option<RosterEvent>,
    {
        let event = self.lock_roster().apply_local(write);
        if let Some(event) = &event {
            self.publish(vec![event.clone()]);
        }
        event
    }

    /// Broadcast a batch of changes followed by the recomputed headcount.
    fn publish(&self, events: Vec<RosterEvent>) {
        if events.is_empty() {
            return;
        }
        for event in events {
            let _ = self.events.send(event);
        }
        let _ = self.events.send(RosterEvent::Count(self.headcount()));
    }

    /// Start refreshing every `every` in the background. The first refresh
    /// runs immediately.
    pub fn spawn(self: &Arc<Self>, every: Duration) -> SyncHandle {
        let every = every.max(Duration::from_millis(1));
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let sync = Arc::clone(self);

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tracing::info!(
                "Polling {} roster every {}ms",
                sync.partition,
                every.as_millis()
            );

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        // failures are already logged and recorded in the status
                        let _ = sync.refresh().await;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            tracing::info!("Stopped polling {} roster", sync.partition);
        });

        SyncHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Handle to a running poll loop.
pub struct SyncHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SyncHandle {
    /// Stop polling and wait for the loop to exit. An in-flight fetch is
    /// allowed to finish first.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!("Roster poll task ended abnormally: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
