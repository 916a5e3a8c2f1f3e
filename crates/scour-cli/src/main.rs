mod commands;
mod logging;
mod progress;
mod report;

use std::io::{self, Write};
use std::path::Path;
use std::process;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, FloodJournalArgs, FloodStorageArgs, WipeArgs};
use dotenv::dotenv;
use progress::CliReporter;
use scour_core::config::SyncPolicy;
use scour_core::{
    platform, CancelToken, DeletionEngine, FloodReport, JournalFlood, ScourConfig, StorageFlood,
    WipeOptions,
};
use tracing::{error, info, warn};

/// Finished, but with failures, degraded directories, or a cancel.
const EXIT_INCOMPLETE: i32 = 2;

fn main() {
    dotenv().ok();

    let args = Cli::parse();
    let guard = logging::init_logger(args.verbose);

    let code = run(args);

    // process::exit skips destructors; the file writer flushes on drop.
    drop(guard);
    process::exit(code);
}

fn run(args: Cli) -> i32 {
    let config = match scour_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            return 1;
        }
    };

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    if let Err(err) = ctrlc::set_handler(move || handler_token.cancel()) {
        warn!("Could not install Ctrl-C handler: {}", err);
    }

    let result = match args.command {
        Some(Commands::Wipe(wipe)) => run_wipe(config, &wipe, args.verbose, &cancel),
        Some(Commands::FloodJournal(flood)) => run_flood_journal(&config, &flood, &cancel),
        Some(Commands::FloodStorage(flood)) => run_flood_storage(&config, &flood, &cancel),
        Some(Commands::Capacity { dir }) => run_capacity(&config, &dir),
        Some(Commands::PrintConfig) => print_config(&config),
        None => {
            let _ = Cli::command().print_long_help();
            Ok(0)
        }
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            error!("Error: {:#}", err);
            1
        }
    }
}

fn run_wipe(mut config: ScourConfig, args: &WipeArgs, verbose: bool, cancel: &CancelToken) -> Result<i32> {
    if let Some(passes) = args.passes {
        config.passes = passes;
    }
    if args.no_rename {
        config.rename = false;
    }
    if args.sync_every_pass {
        config.sync_policy = SyncPolicy::EveryPass;
    }
    config.validate()?;
    if let Some(Some(gb)) = args.flood_storage {
        check_gb(gb)?;
    }

    let options = WipeOptions {
        verbose,
        ..WipeOptions::from_config(&config)
    };
    let engine = DeletionEngine::new(options).with_cancel_token(cancel.clone());
    let inventory = engine.inventory(&args.target)?;

    let probe = platform::default_probe();
    report::print_preflight(&inventory, engine.options());
    report::print_security_warnings(
        probe.as_ref(),
        &inventory.root,
        args.flood_journal.is_some(),
        args.flood_storage.is_some(),
    );

    if !args.yes && !confirm_delete()? {
        println!("Operation cancelled.");
        return Ok(0);
    }

    let reporter = CliReporter::new();
    let wipe_report = engine.wipe(inventory, &reporter);
    report::print_wipe_report(&wipe_report);

    let mut floods_clean = true;
    if !wipe_report.cancelled {
        if let Some(requested_gib) = args.flood_storage {
            let storage = StorageFlood::from_config(&config);
            let plan = storage.plan(probe.snapshot_capacity(&wipe_report.site).as_ref(), requested_gib);
            report::print_flood_plan(&plan);
            let flood_report = storage.run(&wipe_report.site, &plan, &reporter, cancel)?;
            floods_clean &= finish_flood(&flood_report);
        }
        if let Some(requested_files) = args.flood_journal.filter(|_| !cancel.is_cancelled()) {
            let journal = JournalFlood::from_config(&config);
            let plan = journal.plan(probe.journal_capacity(&wipe_report.site).as_ref(), requested_files);
            report::print_flood_plan(&plan);
            let flood_report = journal.run(&wipe_report.site, &plan, &reporter, cancel)?;
            floods_clean &= finish_flood(&flood_report);
        }
    }

    if wipe_report.is_success() && floods_clean {
        Ok(0)
    } else {
        Ok(EXIT_INCOMPLETE)
    }
}

fn run_flood_journal(config: &ScourConfig, args: &FloodJournalArgs, cancel: &CancelToken) -> Result<i32> {
    config.validate()?;
    let site = flood_site(&args.dir)?;
    let probe = platform::default_probe();

    let journal = JournalFlood::from_config(config);
    let plan = journal.plan(probe.journal_capacity(&site).as_ref(), args.files);
    report::print_flood_plan(&plan);

    let flood_report = journal.run(&site, &plan, &CliReporter::new(), cancel)?;
    Ok(if finish_flood(&flood_report) { 0 } else { EXIT_INCOMPLETE })
}

fn run_flood_storage(config: &ScourConfig, args: &FloodStorageArgs, cancel: &CancelToken) -> Result<i32> {
    config.validate()?;
    if let Some(gb) = args.gb {
        check_gb(gb)?;
    }
    let site = flood_site(&args.dir)?;
    let probe = platform::default_probe();

    let storage = StorageFlood::from_config(config);
    let plan = storage.plan(probe.snapshot_capacity(&site).as_ref(), args.gb);
    report::print_flood_plan(&plan);

    let flood_report = storage.run(&site, &plan, &CliReporter::new(), cancel)?;
    Ok(if finish_flood(&flood_report) { 0 } else { EXIT_INCOMPLETE })
}

fn run_capacity(config: &ScourConfig, dir: &Path) -> Result<i32> {
    let site = flood_site(dir)?;
    let probe = platform::default_probe();

    let journal = JournalFlood::from_config(config).plan(probe.journal_capacity(&site).as_ref(), None);
    let storage = StorageFlood::from_config(config).plan(probe.snapshot_capacity(&site).as_ref(), None);
    report::print_capacity(probe.as_ref(), &site, &journal, &storage);
    Ok(0)
}

fn print_config(config: &ScourConfig) -> Result<i32> {
    let rendered = toml::to_string_pretty(config).context("rendering configuration")?;
    println!("{}", rendered);
    Ok(0)
}

fn flood_site(dir: &Path) -> Result<std::path::PathBuf> {
    let site = dir
        .canonicalize()
        .with_context(|| format!("cannot access {}", dir.display()))?;
    if !site.is_dir() {
        bail!("{} is not a directory", site.display());
    }
    Ok(site)
}

fn check_gb(gb: f64) -> Result<()> {
    if !gb.is_finite() || gb <= 0.0 {
        bail!("flood size must be a positive number of gigabytes, got {}", gb);
    }
    Ok(())
}

fn finish_flood(flood_report: &FloodReport) -> bool {
    report::print_flood_report(flood_report);
    info!(
        "Flood at {} finished: {} files created",
        flood_report.temp_dir.display(),
        flood_report.files_created
    );
    flood_report.is_clean()
}

/// The user must type DELETE exactly; anything else, or end of input, declines.
fn confirm_delete() -> io::Result<bool> {
    let mut input = String::new();

    println!(
        "{}",
        "This will PERMANENTLY destroy the files listed above. They cannot be recovered."
            .red()
            .bold()
    );
    print!("Type DELETE to confirm: ");
    io::stdout().flush()?;

    if io::stdin().read_line(&mut input)? == 0 {
        return Ok(false);
    }
    Ok(input.trim() == "DELETE")
}
