//! Subcommand dispatch.

use crate::cli::{Cli, Command, PoolCommand};
use crate::config::CliConfig;
use anyhow::{Context, Result, bail};
use rega_storage::{LocalCache, LocalStore, SqliteStore};
use rega_sync::remote::{DocumentStore, HttpDocumentStore};
use rega_sync::{
    Connectivity, FieldService, HttpProbe, Session, SyncDownReport, SyncUpReport,
};
use rega_types::{GlobalRangePool, Person, PersonDraft};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Everything a command needs, opened from the configuration.
pub struct Client {
    config: CliConfig,
    cache: LocalCache,
    remote: Arc<dyn DocumentStore>,
    connectivity: Arc<dyn Connectivity>,
}

impl Client {
    pub fn open(config: CliConfig) -> Result<Self> {
        let store: Arc<dyn LocalStore> = Arc::new(
            SqliteStore::open(&config.data_path).with_context(|| {
                format!("Failed to open local store {}", config.data_path.display())
            })?,
        );
        let remote = HttpDocumentStore::new(config.remote.clone())?;
        let probe = HttpProbe::new(
            &config.remote.base_url,
            Duration::from_secs(config.remote.timeout_secs.clamp(1, 5)),
        )?;
        debug!("Using hub at {}", config.remote.base_url);
        Ok(Self {
            cache: LocalCache::new(store),
            remote: Arc::new(remote),
            connectivity: Arc::new(probe),
            config,
        })
    }

    /// Field service for the persisted session.
    fn service(&self) -> Result<FieldService> {
        let session = Session::restore(&self.cache)
            .context("No active session, run `rega login <user-id>` first")?;
        Ok(FieldService::new(
            session,
            self.cache.clone(),
            Arc::clone(&self.remote),
            Arc::clone(&self.connectivity),
            self.config.sync.clone(),
        ))
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = CliConfig::load(cli.config.as_deref())?;
    check_remote_url(&config)?;
    let client = Client::open(config)?;
    execute(&client, cli.command).await
}

pub async fn execute(client: &Client, command: Command) -> Result<()> {
    match command {
        Command::Login { user_id } => {
            let session = Session::sign_in(
                &user_id,
                &client.cache,
                client.remote.as_ref(),
                client.connectivity.as_ref(),
                &client.config.sync,
            )
            .await?;
            println!("Signed in as {} ({})", session.user_id, session.role);
        }
        Command::Register(args) => {
            let service = client.service()?;
            let person = service.register_person(PersonDraft::from(args)).await?;
            println!("{}", person_line(&person));
        }
        Command::NextNumber { user_id } => {
            let service = client.service()?;
            let user_id = user_id.unwrap_or_else(|| service.session().user_id.clone());
            let next = service.next_number(&user_id)?;
            let remaining = service.remaining_numbers(&user_id)?;
            println!("{next} ({remaining} left in block)");
        }
        Command::Pending => {
            let pending = client.service()?.pending_persons();
            if pending.is_empty() {
                println!("Nothing pending");
            }
            for person in &pending {
                println!("{}", person_line(person));
            }
        }
        Command::Sync { up, down } => {
            let service = client.service()?;
            println!("Syncing {}", service.engine().device_name());
            if up {
                print_up(&service.sync_up().await?);
            } else if down {
                print_down(&service.sync_down().await?);
            } else {
                let (down, up) = service.sync().await?;
                print_down(&down);
                print_up(&up);
            }
        }
        Command::Refresh => {
            let report = client.service()?.refresh_directory().await?;
            if report.offline {
                println!("Offline, cached directory kept");
            } else {
                println!(
                    "{} users, {} departments, {} pool entries",
                    report.users, report.departments, report.pool_entries
                );
            }
        }
        Command::AssignGlobal { user_id } => {
            let range = client.service()?.allocate_global_range(&user_id).await?;
            println!("{user_id} now holds {range}");
        }
        Command::AssignRange { user_id, range } => {
            client
                .service()?
                .allocate_specific_range(&user_id, range)
                .await?;
            println!("{user_id} now holds {range}");
        }
        Command::SetRole { user_id, role } => {
            let mut service = client.service()?;
            let user = service.clear_role(&user_id, role).await?;
            println!("{} is now {}", user.id, user.role);
        }
        Command::Pool(PoolCommand::Show) => {
            let pool = client.service()?.global_pool().await?;
            print_pool(&pool);
        }
        Command::Pool(PoolCommand::Select { range }) => {
            let pool = client.service()?.select_global_pool(range).await?;
            print_pool(&pool);
        }
    }
    Ok(())
}

fn person_line(person: &Person) -> String {
    format!(
        "#{} {} {} {} [{}]",
        person.numero_asignado,
        person.numero_documento,
        person.nombres,
        person.apellidos,
        if person.is_synced { "synced" } else { "pending" }
    )
}

fn print_up(report: &SyncUpReport) {
    if report.offline {
        println!("Upload skipped: offline");
        return;
    }
    println!(
        "Uploaded {}, already on hub {}, failed {}",
        report.uploaded, report.confirmed, report.failed
    );
}

fn print_down(report: &SyncDownReport) {
    if report.offline {
        println!("Download skipped: offline");
        return;
    }
    println!(
        "Merged {} (added {}, updated {}, promoted {}), kept local {}, rejected {}",
        report.merged,
        report.added,
        report.updated,
        report.promoted,
        report.kept_local,
        report.rejected
    );
}

fn print_pool(pool: &GlobalRangePool) {
    let selected = pool.selected();
    for range in pool.candidates() {
        let marker = if Some(*range) == selected { "*" } else { " " };
        println!("{marker} {range}");
    }
    if selected.is_none() {
        println!("No global pool selected");
    }
}

/// Fails early with a readable message when the hub URL is unusable.
pub fn check_remote_url(config: &CliConfig) -> Result<()> {
    let url = config.remote.base_url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        bail!("remote.base_url must start with http:// or https://, got {url:?}");
    }
    Ok(())
}
