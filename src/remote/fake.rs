use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Semaphore};

use super::GuestBackend;
use crate::error::{GuestListError, Result};
use crate::guest::{Guest, NewGuest, Partition};

/// In-memory server for tests.
pub struct FakeBackend {
    pub guests: Mutex<Vec<Guest>>,
    pub fetch_calls: AtomicU64,
    pub write_calls: AtomicU64,
    pub fail_fetch: AtomicBool,
    pub fail_writes: AtomicBool,
    /// When set, each fetch waits for a permit before answering.
    pub gate: Option<Semaphore>,
    next_id: AtomicU64,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            guests: Mutex::new(Vec::new()),
            fetch_calls: AtomicU64::new(0),
            write_calls: AtomicU64::new(0),
            fail_fetch: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            gate: None,
            next_id: AtomicU64::new(100),
        }
    }
}

impl FakeBackend {
    pub fn with_guests(guests: Vec<Guest>) -> Self {
        Self {
            guests: Mutex::new(guests),
            ..Default::default()
        }
    }

    pub fn gated(guests: Vec<Guest>) -> Self {
        Self {
            guests: Mutex::new(guests),
            gate: Some(Semaphore::new(0)),
            ..Default::default()
        }
    }

    fn record_write(&self) -> Result<()> {
        self.write_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(GuestListError::Api {
                status: 403,
                message: "You can't edit the guests of this party".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl GuestBackend for FakeBackend {
    async fn fetch_roster(&self, partition: Partition) -> Result<Vec<Guest>> {
        self.fetch_calls.fetch_add(1, Ordering::Relaxed);
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| GuestListError::Invalid(e.to_string()))?
                .forget();
        }
        if self.fail_fetch.load(Ordering::Relaxed) {
            return Err(GuestListError::Api {
                status: 502,
                message: "server returned 502 Bad Gateway".into(),
            });
        }
        Ok(self
            .guests
            .lock()
            .await
            .iter()
            .filter(|g| g.partition() == partition)
            .cloned()
            .collect())
    }

    async fn create_guest(&self, guest: &NewGuest) -> Result<Guest> {
        self.record_write()?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) as i64;
        let created = Guest {
            id: Some(id),
            name: guest.name.clone(),
            host: guest.host.clone(),
            is_male: guest.is_male,
            is_at_party: false,
            entered_at: None,
            left_at: None,
        };
        self.guests.lock().await.push(created.clone());
        Ok(created)
    }

    async fn delete_guest(&self, id: i64) -> Result<()> {
        self.record_write()?;
        let mut guests = self.guests.lock().await;
        let before = guests.len();
        guests.retain(|g| g.id != Some(id));
        if guests.len() == before {
            return Err(GuestListError::Api {
                status: 404,
                message: "server returned 404 Not Found".into(),
            });
        }
        Ok(())
    }

    async fn set_attendance(&self, id: i64, is_at_party: bool) -> Result<()> {
        self.record_write()?;
        let mut guests = self.guests.lock().await;
        match guests.iter_mut().find(|g| g.id == Some(id)) {
            Some(g) => {
                g.is_at_party = is_at_party;
                Ok(())
            }
            None => Err(GuestListError::NotFound(id)),
        }
    }
}
