// FILE: crates/cli/src/main.rs

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Arg, Command};
use fleetsync_config::{Config, ConfigManager};

mod commands;

fn build_cli() -> Command {
    Command::new("fleetsync")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Synchronizes the local fleet store with the remote transit services")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .help("Path to the configuration file")
                .global(true),
        )
        .subcommand(Command::new("init").about("Write a default configuration file and create the database"))
        .subcommand(
            Command::new("sync")
                .about("Reconcile local records against the remote services")
                .arg(Arg::new("stations").long("stations").help("Sync stations").action(clap::ArgAction::SetTrue))
                .arg(Arg::new("lines").long("lines").help("Sync lines").action(clap::ArgAction::SetTrue))
                .arg(Arg::new("line-stations").long("line-stations").help("Sync line stops").action(clap::ArgAction::SetTrue))
                .arg(Arg::new("vehicles").long("vehicles").help("Sync vehicles").action(clap::ArgAction::SetTrue))
                .arg(Arg::new("drivers").long("drivers").help("Sync driver profiles").action(clap::ArgAction::SetTrue))
                .arg(Arg::new("passengers").long("passengers").help("Sync passenger profiles").action(clap::ArgAction::SetTrue))
                .arg(Arg::new("rides").long("rides").help("Sync rides").action(clap::ArgAction::SetTrue))
                .arg(
                    Arg::new("incremental")
                        .long("incremental")
                        .help("Fetch only records changed since the last run")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("no-sweep")
                        .long("no-sweep")
                        .help("Keep local records missing from the remote collections")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("status").about("Show the last sync time of every entity"))
}

fn config_manager(matches: &clap::ArgMatches) -> Result<ConfigManager> {
    match matches.get_one::<String>("config") {
        Some(path) => Ok(ConfigManager::with_path(PathBuf::from(path))),
        None => ConfigManager::new().context("Failed to locate the configuration directory"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let matches = build_cli().get_matches();
    let manager = config_manager(&matches)?;
    let config: Config = manager
        .load()
        .with_context(|| format!("Failed to load configuration from {}", manager.path().display()))?;

    match matches.subcommand() {
        Some(("init", _)) => commands::init(&manager, &config).await,
        Some(("sync", sub_matches)) => commands::run_sync(&config, sub_matches).await,
        Some(("status", _)) => commands::show_status(&config).await,
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}
