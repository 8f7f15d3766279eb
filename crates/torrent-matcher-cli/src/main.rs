mod commands;
mod display;
mod logging;
mod progress;
mod prompt;

use std::process;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, ConnectionArgs, MatchArgs};
use dotenv::dotenv;
use progress::CliReporter;
use torrent_matcher_core::config::{
    load_configuration, load_configuration_from, save_configuration,
};
use torrent_matcher_core::{
    AppConfig, ApplyOptions, ClientRenamer, ControlPlane, FilesystemRenamer, MatchSession,
    QbitClient, ResolvePolicy, SessionOptions,
};
use tracing::{error, info, warn};

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let args = Cli::parse();

    let loaded = match &args.config {
        Some(path) => load_configuration_from(path),
        None => load_configuration(),
    };
    let mut config = match loaded {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let result = match args.command {
        Some(Commands::Match(match_args)) => run_match(&mut config, &match_args),
        Some(Commands::Torrents { connection }) => run_torrents(&mut config, &connection),
        Some(Commands::Files { hash, connection }) => run_files(&mut config, &hash, &connection),
        Some(Commands::PrintConfig) => {
            display::print_config(&config);
            Ok(())
        }
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    if let Err(err) = result {
        error!("Error: {:#}", err);
        process::exit(1);
    }
}

fn connect(config: &mut AppConfig, connection: &ConnectionArgs) -> anyhow::Result<QbitClient> {
    connection.apply_to(config);
    let client = QbitClient::connect(config)
        .with_context(|| format!("Could not connect to qBittorrent at {}", config.url))?;
    match client.app_version() {
        Ok(version) => info!("Connected to qBittorrent {}", version),
        Err(err) => warn!("Connected, but could not read client version: {}", err),
    }
    Ok(client)
}

fn run_torrents(config: &mut AppConfig, connection: &ConnectionArgs) -> anyhow::Result<()> {
    let client = connect(config, connection)?;
    display::print_torrents(&client.torrents()?);
    Ok(())
}

fn run_files(config: &mut AppConfig, hash: &str, connection: &ConnectionArgs) -> anyhow::Result<()> {
    let client = connect(config, connection)?;
    let mut files = client.torrent_files(hash)?;
    files.sort_by_key(|f| f.index);
    display::print_files(&files);
    Ok(())
}

fn run_match(config: &mut AppConfig, args: &MatchArgs) -> anyhow::Result<()> {
    let client = connect(config, &args.connection)?;

    if args.save_config {
        let path = save_configuration(config)?;
        info!("Saved connection settings to {}", path.display());
    }

    let options = SessionOptions {
        require_same_extension: args.require_same_extension(config.require_same_extension),
        ignore_patterns: config.ignore_patterns.clone(),
        apply: ApplyOptions {
            reject_conflicts: args.strict,
        },
        content_root: None,
    };
    let reporter = CliReporter::new();
    let mut session = MatchSession::open(&client, &args.hash, &args.path, options, &reporter)?;
    display::print_match_summary(&session);

    if args.prefer_name {
        session.resolve(ResolvePolicy::ExactName);
    }
    if args.auto {
        session.resolve(ResolvePolicy::FirstCandidate);
    } else if !args.dry_run {
        prompt::resolve_interactively(&mut session)?;
    }

    for (path, positions) in session.selections().duplicate_selections() {
        warn!(
            "{} is selected for {} torrent files; only the first rename can succeed",
            path.display(),
            positions.len()
        );
    }

    let plan = session.plan()?;
    display::print_plan(&plan);

    if args.dry_run {
        if args.skip_unmatched {
            display::print_would_skip(&session.unmatched_entries());
        }
        println!("{}", "Dry run, nothing was changed.".yellow());
        return Ok(());
    }

    let mut renamed = false;
    if !plan.is_empty() {
        let confirmed = args.auto
            || prompt::prompt_confirm(&format!("Apply {} rename(s)?", plan.len()), Some(true))?;
        if !confirmed {
            info!("Aborted, nothing was changed");
            return Ok(());
        }

        let report = if args.via_client {
            let renamer = ClientRenamer::new(&client, &args.hash);
            session.apply(&plan, &renamer, &reporter)?
        } else {
            session.apply(&plan, &FilesystemRenamer, &reporter)?
        };
        display::print_apply_report(&report);
        renamed = report.any_applied();
    }

    if args.skip_unmatched {
        let skipped = session.skip_unmatched(&reporter)?;
        if skipped > 0 {
            println!("{} unmatched file(s) set to not download", skipped);
        } else {
            println!("No unmatched files to skip");
        }
    }

    if args.recheck {
        if renamed {
            session.trigger_recheck()?;
            println!("{}", "Recheck requested".green());
        } else {
            info!("No files were renamed, skipping recheck");
        }
    }

    Ok(())
}
