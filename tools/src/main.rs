//! desk-runner: headless orchestration pass for the helpdesk automation.
//!
//! Usage:
//!   desk-runner --config config.json --state-dir ./state
//!   desk-runner --config config.json --refresh-only
//!   desk-runner --config config.json --dry-run --json
//!   desk-runner --config config.json --dry-run --now 2024-05-06T15:00:00Z

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use deskops_core::{
    clock::DeskClock,
    config::DeskConfig,
    engine::{DeskEngine, PassReport},
    freshdesk::FreshdeskClient,
    roster_subsystem::RosterSubsystem,
    schedule_source::ExportedSheetSource,
    store::DeskStore,
};
use std::env;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let config_path = arg_value(&args, "--config").unwrap_or("config.json");
    let state_dir = arg_value(&args, "--state-dir").unwrap_or("./state");
    let refresh_only = args.iter().any(|a| a == "--refresh-only");
    let dry_run = args.iter().any(|a| a == "--dry-run");
    let json = args.iter().any(|a| a == "--json");
    let clock = match arg_value(&args, "--now") {
        Some(raw) => {
            let at = DateTime::parse_from_rfc3339(raw)
                .with_context(|| format!("--now '{raw}' is not an RFC 3339 timestamp"))?;
            DeskClock::Fixed(at.with_timezone(&Utc))
        }
        None => DeskClock::System,
    };

    let config = DeskConfig::load(config_path)?;
    let base_dir = Path::new(config_path)
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let source = ExportedSheetSource::new(
        resolve(&base_dir, &config.schedule_source.agents_file),
        resolve(&base_dir, &config.schedule_source.settings_file),
    );

    let store = DeskStore::open(state_dir, config.state_files.clone())
        .with_context(|| format!("Cannot open state directory {state_dir}"))?;
    let tickets = FreshdeskClient::new(&config.helpdesk)?;

    if !json {
        println!("desk-runner");
        println!("  config:     {config_path}");
        println!("  state dir:  {state_dir}");
        println!("  helpdesk:   {}", config.helpdesk.api_base());
        println!("  mode:       {}", mode_label(refresh_only, dry_run));
        println!();
    }

    let mut engine = if refresh_only {
        let mut engine = DeskEngine::new(config, clock, store, Box::new(tickets));
        engine.register(Box::new(RosterSubsystem::new(Box::new(source))));
        engine
    } else {
        DeskEngine::build(config, clock, store, Box::new(tickets), Box::new(source))
    };
    engine.dry_run = dry_run;

    let report = engine.run_pass();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&engine, &report);
    }

    let failed = report.failed_processes();
    if !failed.is_empty() {
        log::warn!("Processes that failed this pass: {}", failed.join(", "));
    }
    Ok(())
}

fn print_summary(engine: &DeskEngine, report: &PassReport) {
    println!("=== PASS SUMMARY ===");
    println!("  started:            {}", report.started_at.format("%Y-%m-%d %H:%M:%S UTC"));
    match engine.last_roster() {
        Some(roster) => {
            println!("  agents:             {}", roster.directory.len());
            println!("  operative:          {}", roster.operative.len());
            println!("  skipped rows:       {}", roster.skipped);
        }
        None => println!("  roster:             (not refreshed)"),
    }
    println!("  after-hours closed: {}", report.after_hours_closed());
    println!("  assigned:           {}", report.assigned());
    println!("  surveys sent:       {}", report.surveys_sent());
    println!("  ticket failures:    {}", report.ticket_failures());
    let failed = report.failed_processes();
    if !failed.is_empty() {
        println!("  failed processes:   {}", failed.join(", "));
    }
}

fn mode_label(refresh_only: bool, dry_run: bool) -> &'static str {
    match (refresh_only, dry_run) {
        (true, _)      => "refresh only",
        (false, true)  => "dry run",
        (false, false) => "full pass",
    }
}

fn resolve(base: &Path, file: &str) -> PathBuf {
    let path = Path::new(file);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
