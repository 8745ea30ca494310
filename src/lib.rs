pub mod app;
pub mod context;
pub mod error;
pub mod guest;
pub mod notice;
pub mod party;
pub mod remote;
pub mod roster;
pub mod search;
pub mod settings;
pub mod sync;
pub mod view;

use std::sync::Once;

pub use app::App;
pub use context::{Host, PartyContext};
pub use error::{GuestListError, Result};
pub use guest::{Guest, NewGuest, Partition};
pub use party::GuestList;
pub use roster::{Roster, RosterEvent};
pub use search::{GuestFilter, SearchMode, SearchState};
pub use settings::Settings;

/// Install ring as the process-wide rustls crypto provider.
///
/// reqwest is built without a provider, so this must run before the first
/// client is created. Safe to call repeatedly.
pub fn ensure_tls_provider() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        if rustls::crypto::ring::default_provider()
            .install_default()
            .is_err()
        {
            tracing::debug!("rustls crypto provider already installed");
        }
    });
}

/// Initialize logging from `RUST_LOG`, defaulting to `guest_list=info`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("guest_list=info")),
        )
        .init();
}
