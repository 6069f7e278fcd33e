// FILE: crates/cli/src/commands.rs

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use fleetsync_config::{Config, ConfigManager};
use fleetsync_core::EntityKind;
use fleetsync_remote::{ApiClient, ClientConfig, Endpoints};
use fleetsync_resilience::RetryPolicy;
use fleetsync_store::{connect, queries, DatabaseConfig, DbPool};
use fleetsync_sync_engine::{HttpRemote, Reconciler, SweepPolicy, SyncOptions};

async fn open_store(config: &Config) -> Result<DbPool> {
    let db_config = DatabaseConfig::new(&config.store.database_path)
        .with_max_connections(config.store.max_connections)
        .with_wal(config.store.enable_wal);
    connect(db_config)
        .await
        .with_context(|| format!("Failed to open database {}", config.store.database_path))
}

fn build_remote(config: &Config) -> Result<HttpRemote> {
    let client_config = ClientConfig {
        collection_timeout: Duration::from_secs(config.remote.collection_timeout_secs),
        record_timeout: Duration::from_secs(config.remote.record_timeout_secs),
        retry_policy: RetryPolicy::new(config.remote.retry_attempts as usize)
            .with_initial_delay(Duration::from_millis(200)),
        ..ClientConfig::default()
    };
    let client = ApiClient::with_config(client_config).context("Failed to build HTTP client")?;
    let endpoints = Endpoints::new(
        &config.remote.infra_base_url,
        &config.remote.dynamics_base_url,
        &config.remote.profiles_base_url,
    );
    Ok(HttpRemote::new(client, endpoints))
}

fn selected_kinds(matches: &ArgMatches) -> Vec<EntityKind> {
    let flags = [
        ("stations", EntityKind::Station),
        ("lines", EntityKind::Line),
        ("line-stations", EntityKind::LineStation),
        ("vehicles", EntityKind::Vehicle),
        ("drivers", EntityKind::Driver),
        ("passengers", EntityKind::Passenger),
        ("rides", EntityKind::Ride),
    ];
    let picked: Vec<EntityKind> = flags
        .iter()
        .filter(|(flag, _)| matches.get_flag(flag))
        .map(|(_, kind)| *kind)
        .collect();
    if picked.is_empty() {
        EntityKind::DEPENDENCY_ORDER.to_vec()
    } else {
        picked
    }
}

fn sync_options(config: &Config, matches: &ArgMatches) -> SyncOptions {
    let sweep = if matches.get_flag("no-sweep") {
        SweepPolicy::none()
    } else {
        SweepPolicy {
            stations: config.sync.sweep_stations,
            lines: config.sync.sweep_lines,
            line_stations: config.sync.sweep_line_stations,
            vehicles: config.sync.sweep_vehicles,
            profiles: config.sync.sweep_profiles,
            rides: config.sync.sweep_rides,
        }
    };
    SyncOptions {
        sweep,
        incremental_fetch: config.sync.incremental_fetch || matches.get_flag("incremental"),
    }
}

pub async fn init(manager: &ConfigManager, config: &Config) -> Result<()> {
    if manager.path().exists() {
        println!("Configuration already present at {}", manager.path().display());
    } else {
        manager
            .save(config)
            .with_context(|| format!("Failed to write {}", manager.path().display()))?;
        println!("Wrote default configuration to {}", manager.path().display());
    }
    open_store(config).await?;
    println!("Database ready at {}", config.store.database_path);
    Ok(())
}

pub async fn run_sync(config: &Config, matches: &ArgMatches) -> Result<()> {
    let pool = open_store(config).await?;
    let remote = build_remote(config)?;
    let options = sync_options(config, matches);
    let kinds = selected_kinds(matches);

    let reconciler = Reconciler::new(pool, remote, options);
    let report = reconciler
        .run(&kinds)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    for summary in &report.entities {
        println!(
            "{:<14} {:>6} synced {:>6} skipped",
            summary.kind.label(),
            summary.counts.synced,
            summary.counts.skipped
        );
    }
    if report.failed {
        bail!("Sync finished with errors, see the log for details");
    }
    Ok(())
}

pub async fn show_status(config: &Config) -> Result<()> {
    let pool = open_store(config).await?;
    let mut conn = pool
        .acquire()
        .await
        .context("Failed to acquire a database connection")?;
    let watermarks = queries::watermarks::list_all(&mut conn)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    if watermarks.is_empty() {
        println!("No sync has run yet");
        return Ok(());
    }
    for (entity, last_sync_at) in watermarks {
        println!(
            "{:<14} last synced {}",
            entity,
            last_sync_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    Ok(())
}
