//! After-hours acknowledgement: second process of every pass.
//!
//! Outside the attendance window, every recent unassigned ticket gets the
//! after-hours message and is closed. The ledger keeps a ticket from being
//! answered twice; an id is recorded only once both reply and close worked.

use crate::{
    config::GlobalSettings,
    error::DeskResult,
    event::DeskEvent,
    roster::{in_window, parse_time},
    subsystem::{DeskSubsystem, PassContext},
    template::{render, render_or_raw},
    ticket_service::{query, TicketUpdate},
    types::status,
};
use chrono::{Duration, NaiveTime};

const PROCESS: &str = "after_hours";

/// Whether `now` falls outside the attendance window.
///
/// No window configured, or a bound that does not parse, counts as inside
/// hours (fail-open): the desk never auto-closes tickets on bad settings.
pub fn outside_attendance(start: Option<&str>, end: Option<&str>, now: NaiveTime) -> bool {
    let (Some(start), Some(end)) = (start, end) else {
        log::warn!("Attendance window not configured; assuming inside hours");
        return false;
    };
    if parse_time(start).is_none() || parse_time(end).is_none() {
        log::error!("Attendance window '{start}'-'{end}' is malformed; assuming inside hours");
        return false;
    }
    !in_window(Some(start), Some(end), now)
}

/// Fill the window bounds into the template, keeping `{ticket_id}` for later.
fn prerender(template: &str, settings: &GlobalSettings) -> String {
    let (Some(start), Some(end)) = (settings.attendance_start(), settings.attendance_end()) else {
        return template.to_string();
    };
    let vars = [
        ("HORARIO_ATENCION_INICIO", start),
        ("HORARIO_ATENCION_FIN", end),
        ("ticket_id", "{ticket_id}"),
    ];
    match render(template, &vars) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("After-hours template: {e}; using it as is");
            template.to_string()
        }
    }
}

pub struct AfterHoursSubsystem;

impl DeskSubsystem for AfterHoursSubsystem {
    fn name(&self) -> &'static str {
        PROCESS
    }

    fn run(&mut self, ctx: &PassContext<'_>) -> DeskResult<Vec<DeskEvent>> {
        let settings = ctx.store.load_global_settings();
        let Some(template) = settings.after_hours_message() else {
            return Ok(vec![DeskEvent::skipped(PROCESS, "after-hours message not configured")]);
        };

        let zone = settings.zone();
        let now = ctx.now(zone);
        let outside = outside_attendance(settings.attendance_start(), settings.attendance_end(), now.time());
        let mut events = vec![DeskEvent::AttendanceChecked { inside_hours: !outside }];
        if !outside {
            return Ok(events);
        }
        log::info!(
            "{now} is outside attendance ({} - {} {zone}); looking for tickets",
            settings.attendance_start().unwrap_or_default(),
            settings.attendance_end().unwrap_or_default(),
        );

        let template = prerender(template, &settings);
        let processed = ctx.store.after_hours_processed();
        let since = ctx.utc_now - Duration::minutes(ctx.config.params.after_hours_lookback_minutes);
        let tickets = ctx.tickets.search(&query::recent_unassigned(since), 1)?;
        if tickets.is_empty() {
            log::info!("No recent unassigned tickets to answer after hours");
        }

        for ticket in tickets {
            let id = ticket.id;
            if processed.contains(&id.to_string()) {
                continue;
            }
            let id_text = id.to_string();
            let body = render_or_raw(&template, &[("ticket_id", id_text.as_str())], "After-hours template");

            if ctx.dry_run {
                events.push(DeskEvent::dry_run(PROCESS, id, "reply after-hours message and close"));
                continue;
            }
            if let Err(e) = ctx.tickets.reply(id, &body) {
                log::error!("Ticket #{id}: after-hours reply failed: {e}");
                events.push(DeskEvent::ticket_failed(PROCESS, id, "reply", e));
                continue;
            }
            let close = TicketUpdate { status: Some(status::CLOSED), ..TicketUpdate::default() };
            if let Err(e) = ctx.tickets.update(id, &close) {
                log::error!("Ticket #{id}: replied after hours but close failed: {e}");
                events.push(DeskEvent::ticket_failed(PROCESS, id, "close", e));
                continue;
            }
            if let Err(e) = ctx.store.record_after_hours(id) {
                log::warn!("Ticket #{id}: closed but not recorded in the after-hours ledger: {e}");
            }
            log::info!("Ticket #{id}: after-hours message sent and ticket closed");
            events.push(DeskEvent::AfterHoursClosed { ticket_id: id });
        }
        Ok(events)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
