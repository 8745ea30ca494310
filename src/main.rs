use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::sync::broadcast::error::RecvError;

use guest_list::roster::RosterEvent;
use guest_list::{App, GuestList, Partition, Settings};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Settings file (default: <config dir>/guest-list/settings.json).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Party URL, overriding the settings file.
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Keep both rosters in sync and log every change until Ctrl-C.
    Watch,
    /// Fetch one roster and print it.
    List {
        #[arg(long)]
        female: bool,
        /// Only show guests whose name or host matches.
        #[arg(long)]
        query: Option<String>,
    },
    /// Add a guest hosted by you.
    Add {
        name: String,
        #[arg(long)]
        female: bool,
    },
    /// Remove one of your guests.
    Remove {
        id: i64,
        #[arg(long)]
        female: bool,
    },
    /// Check one of your guests in or out.
    CheckIn {
        id: i64,
        #[arg(long)]
        female: bool,
    },
}

fn partition(female: bool) -> Partition {
    Partition::from_is_male(!female)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    guest_list::init_tracing();
    guest_list::ensure_tls_provider();

    let args = Args::parse();
    let settings_path = args.settings.unwrap_or_else(Settings::default_path);
    let mut settings = Settings::load(&settings_path);
    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }

    tracing::info!("Starting guest-list v{}", env!("CARGO_PKG_VERSION"));
    let app = App::new(settings)?;

    match args.command {
        Command::Watch => watch(&app).await?,
        Command::List { female, query } => {
            let list = app.roster(partition(female));
            list.sync().refresh().await?;
            let filter = app.settings.search_state().submit(query.as_deref().unwrap_or(""))?;
            print_roster(list, &filter);
        }
        Command::Add { name, female } => {
            let guest = app.roster(partition(female)).add_guest(&name).await?;
            println!("Added {} (id {})", guest.name, guest.id.unwrap_or_default());
        }
        Command::Remove { id, female } => {
            let list = app.roster(partition(female));
            list.sync().refresh().await?;
            list.remove_guest(id).await?;
            println!("Removed guest {}", id);
        }
        Command::CheckIn { id, female } => {
            let list = app.roster(partition(female));
            list.sync().refresh().await?;
            let guest = list.toggle_check_in(id).await?;
            let state = if guest.is_at_party { "in" } else { "out" };
            println!("{} checked {}", guest.name, state);
        }
    }

    Ok(())
}

fn print_roster(list: &GuestList, filter: &guest_list::GuestFilter) {
    println!("{} guests: {}", list.partition(), list.headcount());
    for row in list.rows(filter).iter().filter(|r| !r.hidden) {
        let badge = if row.checked_in { " [here]" } else { "" };
        println!("{:>6}  {}{}  ({})", row.id, row.name, badge, row.added_by);
    }
}

async fn watch(app: &App) -> anyhow::Result<()> {
    let handles = app.start_sync();

    let mut male = app.roster(Partition::Male).subscribe();
    let mut female = app.roster(Partition::Female).subscribe();
    let mut notices = app.notices.subscribe();

    loop {
        tokio::select! {
            event = male.recv() => log_event(Partition::Male, event),
            event = female.recv() => log_event(Partition::Female, event),
            Ok(notice) = notices.recv() => tracing::info!("{:?}: {}", notice.level, notice.message),
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    for handle in handles {
        handle.shutdown().await;
    }
    Ok(())
}

fn log_event(partition: Partition, event: Result<RosterEvent, RecvError>) {
    match event {
        Ok(RosterEvent::Added(g)) => tracing::info!("{} +{} (added by {})", partition, g.name, g.host),
        Ok(RosterEvent::Removed(g)) => tracing::info!("{} -{}", partition, g.name),
        Ok(RosterEvent::Changed { after, .. }) => {
            let state = if after.is_at_party { "here" } else { "not here" };
            tracing::info!("{} ~{} ({})", partition, after.name, state);
        }
        Ok(RosterEvent::Count(n)) => tracing::info!("{} count: {}", partition, n),
        Err(RecvError::Lagged(n)) => tracing::warn!("{} roster: skipped {} events", partition, n),
        Err(RecvError::Closed) => {}
    }
}
