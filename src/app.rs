use std::sync::Arc;

use crate::context::PartyContext;
use crate::error::Result;
use crate::guest::Partition;
use crate::notice::Notices;
use crate::party::GuestList;
use crate::remote::{GuestApi, GuestBackend};
use crate::settings::Settings;
use crate::sync::SyncHandle;

/// Both rosters of one party, sharing a context and a notice channel.
pub struct App {
    pub settings: Settings,
    pub ctx: PartyContext,
    pub notices: Notices,
    male: GuestList,
    female: GuestList,
}

impl App {
    /// Connect to the party configured in `settings`.
    pub fn new(settings: Settings) -> Result<Self> {
        let api = GuestApi::new(&settings.base_url, settings.request_timeout())?;
        tracing::info!("Guest list endpoint: {}/guests", api.base_url());
        Ok(Self::with_backend(settings, Arc::new(api)))
    }

    pub fn with_backend(settings: Settings, backend: Arc<dyn GuestBackend>) -> Self {
        let ctx = settings.context();
        let notices = Notices::new();
        let list = |partition| {
            GuestList::new(partition, Arc::clone(&backend), ctx.clone(), notices.clone())
        };
        let male = list(Partition::Male);
        let female = list(Partition::Female);

        Self {
            settings,
            ctx,
            notices,
            male,
            female,
        }
    }

    pub fn roster(&self, partition: Partition) -> &GuestList {
        match partition {
            Partition::Male => &self.male,
            Partition::Female => &self.female,
        }
    }

    pub fn rosters(&self) -> [&GuestList; 2] {
        [&self.male, &self.female]
    }

    /// Fetch both rosters once.
    pub async fn refresh_all(&self) -> Result<()> {
        let (male, female) = tokio::join!(self.male.sync().refresh(), self.female.sync().refresh());
        male?;
        female?;
        Ok(())
    }

    /// Start one poll loop per roster.
    pub fn start_sync(&self) -> Vec<SyncHandle> {
        let every = self.settings.poll_interval();
        self.rosters()
            .iter()
            .map(|list| list.sync().spawn(every))
            .collect()
    }
}
