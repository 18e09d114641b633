//! Shared fixtures for the integration tests.
//!
//! All passes run on Monday 2024-05-06 unless a test picks its own instant.
//! TIMEZONE_APP is America/Bogota (UTC-5, no DST).

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use deskops_core::{
    clock::DeskClock,
    config::DeskConfig,
    engine::DeskEngine,
    schedule_source::{MemorySheetSource, SheetRecord, COL_SETTING_KEY, COL_SETTING_VALUE},
    store::DeskStore,
    ticket_service::{MemoryTicketService, Ticket},
    types::TicketId,
};
use std::rc::Rc;
use tempfile::TempDir;

pub const OPENING: &str = "Hola, soy {agent_name}. Ticket #{ticket_id}";
pub const SURVEY: &str = "Gracias de parte de {agent_name} (#{ticket_id})";
pub const AFTER_HOURS: &str =
    "Atendemos de {HORARIO_ATENCION_INICIO} a {HORARIO_ATENCION_FIN}. Ticket #{ticket_id}";

/// Bogota wall clock on 2024-05-06 expressed in UTC.
pub fn bogota(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 6, 0, 0, 0).unwrap()
        + chrono::Duration::hours(hour as i64 + 5)
        + chrono::Duration::minutes(minute as i64)
}

pub fn setting(key: &str, value: &str) -> SheetRecord {
    SheetRecord::new()
        .with(COL_SETTING_KEY, key)
        .with(COL_SETTING_VALUE, value)
}

pub fn settings_rows() -> Vec<SheetRecord> {
    vec![
        setting("HORARIO_ATENCION_INICIO", "08:00"),
        setting("HORARIO_ATENCION_FIN", "18:00"),
        setting("TIMEZONE_APP", "America/Bogota"),
        setting("MENSAJE_APERTURA", OPENING),
        setting("MENSAJE_CIERRE_ENCUESTA", SURVEY),
        setting("MENSAJE_FUERA_HORARIO", AFTER_HOURS),
    ]
}

/// A Monday schedule row.
pub fn agent(id: &str, name: &str, status: &str, monday_1: &str, break_start: &str) -> SheetRecord {
    SheetRecord::new()
        .with("Agent_ID", id)
        .with("Agent_name", name)
        .with("Status", status)
        .with("Lunes_1", monday_1)
        .with("Lunes_2", "")
        .with("Descanso_Inicio_Hora", break_start)
}

/// At 10:00 Bogota: 101 and 105 are operative, 102 is on break,
/// 103 is inactive, 104 is off shift and "abc" is dropped entirely.
pub fn agent_rows() -> Vec<SheetRecord> {
    vec![
        agent("101", "Ana", "Activo", "08:00 a 12:00", "11:30"),
        agent("102", "Bruno", "activo", "09:00-11:00", "09:30"),
        agent("103", "Carla", "inactivo", "08:00 a 18:00", ""),
        agent("abc", "Dario", "activo", "08:00 a 18:00", ""),
        agent("104", "Eva", "activo", "", "").with("Lunes_2", "14:00 a 18:00"),
        SheetRecord::new()
            .with("Agent_ID", 105)
            .with("Agent_name", "Fer")
            .with("Status", "activo")
            .with("Lunes_1", "07:00 a 11:00"),
    ]
}

pub fn source() -> MemorySheetSource {
    MemorySheetSource { agents: agent_rows(), settings: settings_rows() }
}

pub struct Desk {
    pub engine:  DeskEngine,
    pub tickets: Rc<MemoryTicketService>,
    pub dir:     TempDir,
}

pub fn desk_with(config: DeskConfig, source: MemorySheetSource, at: DateTime<Utc>) -> Desk {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().expect("tempdir");
    let store = DeskStore::open(dir.path(), config.state_files.clone()).expect("open store");
    let tickets = Rc::new(MemoryTicketService::new(config.params.search_page_size));
    let engine = DeskEngine::build(
        config,
        DeskClock::Fixed(at),
        store,
        Box::new(Rc::clone(&tickets)),
        Box::new(source),
    );
    Desk { engine, tickets, dir }
}

pub fn desk(at: DateTime<Utc>) -> Desk {
    desk_with(DeskConfig::default_test(), source(), at)
}

pub fn ticket(id: TicketId, status: u8) -> Ticket {
    Ticket { id, status: Some(status), ..Ticket::default() }
}
