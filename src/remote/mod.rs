//! Access to the party's guest collection on the server.
//!
//! [`GuestBackend`] is the seam between the roster logic and the network:
//! [`http::GuestApi`] talks to the real endpoint, tests use an in-memory fake.

pub mod http;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;

use crate::error::Result;
use crate::guest::{Guest, NewGuest, Partition};

pub use http::GuestApi;

#[async_trait]
pub trait GuestBackend: Send + Sync {
    /// Fetch one roster in server order.
    async fn fetch_roster(&self, partition: Partition) -> Result<Vec<Guest>>;

    /// Create a guest and return the saved record.
    async fn create_guest(&self, guest: &NewGuest) -> Result<Guest>;

    async fn delete_guest(&self, id: i64) -> Result<()>;

    /// Persist a guest's check-in state.
    async fn set_attendance(&self, id: i64, is_at_party: bool) -> Result<()>;
}
