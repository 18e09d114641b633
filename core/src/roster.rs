//! On-duty determination: who may receive work right now.
//!
//! Input: the agent schedule rows, one "now" and the roster settings.
//! Output: the agent directory plus the operative agent ids.
//!
//! RULES:
//!   - Operative = status "activo" AND (shift 1 OR shift 2 covers now) AND NOT on break.
//!   - A bad cell degrades to "no shift" / "no break"; it never fails the pass.
//!   - A bad row is skipped with a warning; the remaining rows are still judged.
//!   - Nothing here reads the clock. `now` is handed in once per pass.

use crate::{
    clock::{Instant, Zone},
    schedule_source::SheetRecord,
    types::{AgentDirectory, AgentId, OperativeAgentIds},
};
use chrono::{Duration, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

pub const COL_AGENT_ID:    &str = "Agent_ID";
pub const COL_AGENT_NAME:  &str = "Agent_name";
pub const COL_STATUS:      &str = "Status";
pub const COL_BREAK_START: &str = "Descanso_Inicio_Hora";
const SHIFT_1_SUFFIX: &str = "_1";
const SHIFT_2_SUFFIX: &str = "_2";

pub const ACTIVE_STATUS: &str = "activo";
pub const DEFAULT_BREAK_MINUTES: i64 = 60;
/// Breaks longer than a day are clamped to a day.
pub const MAX_BREAK_MINUTES: i64 = 24 * 60;
const TIME_FORMAT: &str = "%H:%M";

/// Separators tried in order when splitting a shift cell.
const SHIFT_SEPARATORS: [&str; 2] = [" a ", "-"];

/// Engine settings, built once from config and global settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RosterSettings {
    pub zone:          Zone,
    pub break_minutes: i64,
}

impl Default for RosterSettings {
    fn default() -> Self {
        Self {
            zone:          Zone::Naive,
            break_minutes: DEFAULT_BREAK_MINUTES,
        }
    }
}

// ── Time parsing ───────────────────────────────────────────────

/// Parse a 24-hour `HH:MM` time-of-day.
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), TIME_FORMAT).ok()
}

/// Split a shift cell into trimmed `(start, end)` strings.
///
/// `None` for an empty cell, "off" (any case), or a cell that does not split
/// into exactly two non-empty parts on ` a ` or `-`. Times are not validated here.
pub fn parse_shift(raw: &str) -> Option<(&str, &str)> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("off") {
        return None;
    }
    for sep in SHIFT_SEPARATORS {
        if !raw.contains(sep) {
            continue;
        }
        let parts: Vec<&str> = raw.split(sep).map(str::trim).collect();
        if let [start, end] = parts[..] {
            if !start.is_empty() && !end.is_empty() {
                return Some((start, end));
            }
        }
    }
    None
}

// ── Window evaluation ──────────────────────────────────────────

/// Whether `now` lies in the daily window `[start, end)`.
///
/// `start > end` wraps past midnight. A missing or unparseable bound is
/// never in the window.
pub fn in_window(start: Option<&str>, end: Option<&str>, now: NaiveTime) -> bool {
    let (Some(start_raw), Some(end_raw)) = (start, end) else {
        return false;
    };
    let (Some(start), Some(end)) = (parse_time(start_raw), parse_time(end_raw)) else {
        log::warn!("Unparseable window '{start_raw}-{end_raw}'; treating as closed");
        return false;
    };
    if start <= end {
        start <= now && now < end
    } else {
        now >= start || now < end
    }
}

/// Whether a raw shift cell covers `now`.
pub fn on_shift(raw: &str, now: &Instant) -> bool {
    match parse_shift(raw) {
        Some((start, end)) => in_window(Some(start), Some(end), now.time()),
        None               => false,
    }
}

/// Whether the daily break starting at `break_start` is running at `now`.
///
/// The break is anchored to today's date in now's zone and lasts
/// `duration_minutes`. When it spills past midnight, the tail of yesterday's
/// break also counts.
pub fn on_break(break_start: &str, duration_minutes: i64, now: &Instant) -> bool {
    let raw = break_start.trim();
    if raw.is_empty() {
        return false;
    }
    let Some(start) = parse_time(raw) else {
        log::warn!("Malformed {COL_BREAK_START} '{raw}'; not treated as on break");
        return false;
    };

    let zone = now.zone();
    let duration = Duration::minutes(duration_minutes.clamp(0, MAX_BREAK_MINUTES));
    let anchor = zone.to_instant(now.date(), start);
    let end = anchor.plus(duration);

    if end.date() == anchor.date() {
        return anchor <= *now && *now < end;
    }
    let yesterday_end = now
        .date()
        .pred_opt()
        .map(|d| zone.to_instant(d, start).plus(duration));
    *now >= anchor || yesterday_end.is_some_and(|e| *now < e)
}

// ── Row resolution ─────────────────────────────────────────────

/// Source columns holding today's two shift cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayColumns {
    pub shift_1: String,
    pub shift_2: String,
}

/// Map a weekday to its shift column pair, e.g. Monday -> `Lunes_1`, `Lunes_2`.
pub fn weekday_columns(weekday: Weekday) -> DayColumns {
    let prefix = match weekday {
        Weekday::Mon => "Lunes",
        Weekday::Tue => "Martes",
        Weekday::Wed => "Miercoles",
        Weekday::Thu => "Jueves",
        Weekday::Fri => "Viernes",
        Weekday::Sat => "Sabado",
        Weekday::Sun => "Domingo",
    };
    DayColumns {
        shift_1: format!("{prefix}{SHIFT_1_SUFFIX}"),
        shift_2: format!("{prefix}{SHIFT_2_SUFFIX}"),
    }
}

/// Today's view of one agent row. All fields are trimmed cell text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleRow {
    pub agent_id:    String,
    pub agent_name:  String,
    pub status:      String,
    pub shift_1:     String,
    pub shift_2:     String,
    pub break_start: String,
}

impl ScheduleRow {
    pub fn from_record(record: &SheetRecord, columns: &DayColumns) -> Self {
        Self {
            agent_id:    record.cell(COL_AGENT_ID),
            agent_name:  record.cell(COL_AGENT_NAME),
            status:      record.cell(COL_STATUS),
            shift_1:     record.cell(&columns.shift_1),
            shift_2:     record.cell(&columns.shift_2),
            break_start: record.cell(COL_BREAK_START),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentStanding {
    pub agent_id:   AgentId,
    pub agent_name: String,
    pub active:     bool,
    pub on_shift:   bool,
    pub on_break:   bool,
}

impl AgentStanding {
    pub fn operative(&self) -> bool {
        self.active && self.on_shift && !self.on_break
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingId,
    MissingName,
    InvalidId(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Parsed(AgentStanding),
    Skip(SkipReason),
}

/// Judge one row against `now`.
pub fn evaluate_row(row: &ScheduleRow, settings: &RosterSettings, now: &Instant) -> RowOutcome {
    if row.agent_id.is_empty() {
        return RowOutcome::Skip(SkipReason::MissingId);
    }
    if row.agent_name.is_empty() {
        return RowOutcome::Skip(SkipReason::MissingName);
    }
    let agent_id = match row.agent_id.parse::<i64>() {
        Ok(id) => id.to_string(),
        Err(_) => return RowOutcome::Skip(SkipReason::InvalidId(row.agent_id.clone())),
    };

    RowOutcome::Parsed(AgentStanding {
        agent_id,
        agent_name: row.agent_name.clone(),
        active:     row.status.to_lowercase() == ACTIVE_STATUS,
        on_shift:   on_shift(&row.shift_1, now) || on_shift(&row.shift_2, now),
        on_break:   on_break(&row.break_start, settings.break_minutes, now),
    })
}

// ── Aggregation ────────────────────────────────────────────────

/// Result of one roster pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSnapshot {
    pub directory: AgentDirectory,
    pub operative: OperativeAgentIds,
    pub skipped:   usize,
}

/// Evaluate every record against `now` and collect the two outputs.
///
/// Duplicate agent ids are not merged: the later row's name wins in the
/// directory and each qualifying row appends to the operative list.
pub fn compute_roster(
    records: &[SheetRecord],
    settings: &RosterSettings,
    now: &Instant,
) -> RosterSnapshot {
    let columns = weekday_columns(now.weekday());
    let mut snapshot = RosterSnapshot::default();

    for (index, record) in records.iter().enumerate() {
        // Sheet row number: header is row 1.
        let sheet_row = index + 2;
        let row = ScheduleRow::from_record(record, &columns);

        let standing = match evaluate_row(&row, settings, now) {
            RowOutcome::Parsed(standing) => standing,
            RowOutcome::Skip(reason) => {
                snapshot.skipped += 1;
                match reason {
                    SkipReason::MissingId if row.agent_name.is_empty() => {
                        log::debug!("Row {sheet_row}: blank, skipped");
                    }
                    SkipReason::MissingId => {
                        log::warn!("Row {sheet_row}: missing {COL_AGENT_ID}, skipped");
                    }
                    SkipReason::MissingName => {
                        log::warn!("Row {sheet_row} (ID: {}): missing {COL_AGENT_NAME}, skipped", row.agent_id);
                    }
                    SkipReason::InvalidId(id) => {
                        log::warn!("Row {sheet_row}: {COL_AGENT_ID} '{id}' is not a valid number, skipped");
                    }
                }
                continue;
            }
        };

        if snapshot
            .directory
            .insert(standing.agent_id.clone(), standing.agent_name.clone())
            .is_some()
        {
            log::warn!(
                "Row {sheet_row}: duplicate agent id {}; later row wins in the directory, \
                 and if both rows are operative the id takes two rotation slots",
                standing.agent_id
            );
        }

        log::debug!(
            "Row {sheet_row} (ID: {}): active={} on_shift={} on_break={}",
            standing.agent_id, standing.active, standing.on_shift, standing.on_break,
        );
        if standing.operative() {
            snapshot.operative.push(standing.agent_id);
        }
    }

    if snapshot.operative.is_empty() {
        log::info!("No operative agents at {now}");
    }
    snapshot
}
