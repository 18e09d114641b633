//! Roster refresh through a full engine pass.

mod common;

use common::*;
use deskops_core::{
    clock::{DeskClock, Instant, Zone},
    config::DeskConfig,
    engine::DeskEngine,
    error::{DeskError, DeskResult},
    event::DeskEvent,
    roster::{compute_roster, RosterSettings},
    schedule_source::{MemorySheetSource, ScheduleSource, SheetRecord},
    store::DeskStore,
    ticket_service::MemoryTicketService,
};

#[test]
fn pass_writes_directory_and_operative_caches() {
    let mut desk = desk(bogota(10, 0));
    let report = desk.engine.run_pass();

    let store = desk.engine.store();
    let directory = store.load_agent_directory();
    let ids: Vec<&str> = directory.keys().map(String::as_str).collect();
    assert_eq!(ids, vec!["101", "102", "103", "104", "105"]);
    assert_eq!(directory["103"], "Carla");
    assert_eq!(store.load_operative_agents(), vec!["101".to_string(), "105".to_string()]);

    assert!(report.events.iter().any(|e| matches!(
        e,
        DeskEvent::RosterRefreshed { agents: 5, operative: 2, skipped_rows: 1 }
    )));
}

#[test]
fn settings_are_cached_for_the_later_processes() {
    let mut desk = desk(bogota(10, 0));
    desk.engine.run_pass();

    let settings = desk.engine.store().load_global_settings();
    assert_eq!(settings.timezone(), Some("America/Bogota"));
    assert_eq!(settings.opening_message(), Some(OPENING));
    assert_eq!(settings.attendance_start(), Some("08:00"));
}

#[test]
fn last_roster_is_reported_after_a_pass() {
    let mut desk = desk(bogota(10, 0));
    assert!(desk.engine.last_roster().is_none());
    desk.engine.run_pass();
    let roster = desk.engine.last_roster().expect("roster ran");
    assert_eq!(roster.operative.len(), 2);
    assert_eq!(roster.skipped, 1);
}

#[test]
fn break_ends_and_agent_becomes_operative_again() {
    let mut desk = desk(bogota(10, 30));
    desk.engine.run_pass();
    let operative = desk.engine.store().load_operative_agents();
    assert!(operative.contains(&"102".to_string()));
}

#[test]
fn empty_settings_sheet_keeps_the_previous_cache() {
    let mut first = desk(bogota(10, 0));
    first.engine.run_pass();
    let cached = first.engine.store().load_global_settings();

    let config = DeskConfig::default_test();
    let store = DeskStore::open(first.dir.path(), config.state_files.clone())
        .expect("reopen");
    let tickets = MemoryTicketService::new(30);
    let source = MemorySheetSource { agents: agent_rows(), settings: Vec::new() };
    let mut engine = DeskEngine::build(
        config,
        DeskClock::Fixed(bogota(10, 0)),
        store,
        Box::new(tickets),
        Box::new(source),
    );
    engine.run_pass();
    assert_eq!(engine.store().load_global_settings(), cached);
}

/// Agent rows as given; the settings sheet always fails to load.
struct BrokenSettings;

impl ScheduleSource for BrokenSettings {
    fn agent_records(&self) -> DeskResult<Vec<SheetRecord>> {
        Ok(agent_rows())
    }

    fn settings_records(&self) -> DeskResult<Vec<SheetRecord>> {
        Err(DeskError::MissingConfig { key: "settings sheet".into() })
    }
}

fn rerun_in(dir: &std::path::Path, source: Box<dyn ScheduleSource>) -> DeskEngine {
    let config = DeskConfig::default_test();
    let store = DeskStore::open(dir, config.state_files.clone()).expect("reopen");
    let mut engine = DeskEngine::build(
        config,
        DeskClock::Fixed(bogota(10, 0)),
        store,
        Box::new(MemoryTicketService::new(30)),
        source,
    );
    engine.run_pass();
    engine
}

#[test]
fn empty_settings_sheet_judges_roster_in_the_cached_zone() {
    let mut first = desk(bogota(10, 0));
    first.engine.run_pass();
    let before = first.engine.store().load_operative_agents();
    assert_eq!(before, vec!["101".to_string(), "105".to_string()]);

    let source = MemorySheetSource { agents: agent_rows(), settings: Vec::new() };
    let engine = rerun_in(first.dir.path(), Box::new(source));
    assert_eq!(engine.store().load_operative_agents(), before);
}

#[test]
fn unreadable_settings_sheet_judges_roster_in_the_cached_zone() {
    let mut first = desk(bogota(10, 0));
    first.engine.run_pass();
    let before = first.engine.store().load_operative_agents();
    let cached = first.engine.store().load_global_settings();

    let engine = rerun_in(first.dir.path(), Box::new(BrokenSettings));
    assert_eq!(engine.store().load_operative_agents(), before);
    assert_eq!(engine.store().load_global_settings(), cached);
}

#[test]
fn ids_are_normalised_and_duplicates_append() {
    let now = Instant::at(bogota(10, 0), Zone::resolve(Some("America/Bogota")));
    let records = vec![
        agent(" 0101 ", "Ana", "activo", "08:00 a 12:00", ""),
        agent("101", "Ana Maria", "activo", "08:00 a 12:00", ""),
    ];
    let snapshot = compute_roster(&records, &RosterSettings::default(), &now);
    assert_eq!(snapshot.directory.len(), 1);
    assert_eq!(snapshot.directory["101"], "Ana Maria");
    assert_eq!(snapshot.operative, vec!["101".to_string(), "101".to_string()]);
}

#[test]
fn roster_is_judged_in_the_configured_zone() {
    // 15:00 UTC is 10:00 in Bogota but 11:00 in New York (EDT).
    let mut rows = settings_rows();
    rows.retain(|r| r.cell("ClaveConfig") != "TIMEZONE_APP");
    rows.push(setting("TIMEZONE_APP", "America/New_York"));
    let source = MemorySheetSource {
        agents: vec![agent("7", "Gil", "activo", "10:00 a 11:00", "")],
        settings: rows,
    };
    let mut desk = desk_with(DeskConfig::default_test(), source, bogota(10, 0));
    desk.engine.run_pass();
    assert!(desk.engine.store().load_operative_agents().is_empty());
}
