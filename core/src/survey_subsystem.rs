//! Post-resolution surveys: last process of every pass.
//!
//! Targets tickets in a closed-like status created on the calendar day
//! (UTC) of `now - survey_lookback_minutes`. Each untagged ticket gets the
//! survey message, then is written back with its original status and
//! responder plus the survey tag, so the survey is never sent twice.

use crate::{
    error::DeskResult,
    event::DeskEvent,
    subsystem::{DeskSubsystem, PassContext},
    template::render_or_raw,
    ticket_service::{query, search_all, TicketUpdate},
    types::status,
};
use chrono::Duration;

const PROCESS: &str = "survey";
pub const SURVEY_SENT_TAG: &str = "Encuesta enviada";
pub const FALLBACK_AGENT_NAME: &str = "nuestro equipo de soporte";

/// Closed plus the two custom closed-like statuses.
pub const SURVEY_STATUSES: [u8; 3] = [status::CLOSED, 6, 7];

pub struct SurveySubsystem;

impl DeskSubsystem for SurveySubsystem {
    fn name(&self) -> &'static str {
        PROCESS
    }

    fn run(&mut self, ctx: &PassContext<'_>) -> DeskResult<Vec<DeskEvent>> {
        let settings = ctx.store.load_global_settings();
        let Some(template) = settings.survey_message() else {
            return Ok(vec![DeskEvent::skipped(PROCESS, "survey message not configured")]);
        };
        let directory = ctx.store.load_agent_directory();
        let params = &ctx.config.params;

        let reference = ctx.utc_now - Duration::minutes(params.survey_lookback_minutes);
        let search = query::closed_created_on(reference.date_naive(), &SURVEY_STATUSES);
        log::info!("Survey search: {search}");
        let tickets = search_all(ctx.tickets, &search, params.survey_max_pages, params.search_page_size);
        log::info!("{} closed tickets found for surveys", tickets.len());

        let mut events = Vec::new();
        for summary in tickets {
            let id = summary.id;
            if summary.has_tag(SURVEY_SENT_TAG) {
                log::debug!("Ticket #{id} already surveyed (search result)");
                continue;
            }
            let detail = match ctx.tickets.ticket(id) {
                Ok(detail) => detail,
                Err(e) => {
                    log::error!("Ticket #{id}: cannot load details: {e}");
                    events.push(DeskEvent::ticket_failed(PROCESS, id, "detail", e));
                    continue;
                }
            };
            if detail.has_tag(SURVEY_SENT_TAG) {
                log::debug!("Ticket #{id} already surveyed (details)");
                continue;
            }

            let responder = detail.responder_id.map(|r| r.to_string());
            let agent_name = match responder.as_deref().map(|r| (r, directory.get(r))) {
                Some((_, Some(name))) => name.as_str(),
                Some((r, None)) => {
                    log::warn!("Ticket #{id}: agent {r} not in the agent directory; using a generic name");
                    FALLBACK_AGENT_NAME
                }
                None => FALLBACK_AGENT_NAME,
            };
            let id_text = id.to_string();
            let body = render_or_raw(
                template,
                &[("agent_name", agent_name), ("ticket_id", id_text.as_str())],
                "Survey template",
            );

            if ctx.dry_run {
                events.push(DeskEvent::dry_run(PROCESS, id, format!("send survey signed by {agent_name}")));
                continue;
            }
            if let Err(e) = ctx.tickets.reply(id, &body) {
                log::error!("Ticket #{id}: survey reply failed: {e}");
                events.push(DeskEvent::ticket_failed(PROCESS, id, "reply", e));
                continue;
            }

            let mut tags = detail.tags.clone();
            if !tags.iter().any(|t| t == SURVEY_SENT_TAG) {
                tags.push(SURVEY_SENT_TAG.to_string());
            }
            let restore = TicketUpdate {
                status:       detail.status,
                responder_id: Some(detail.responder_id),
                tags:         Some(tags),
            };
            if let Err(e) = ctx.tickets.update(id, &restore) {
                log::error!("Ticket #{id}: survey sent but tagging failed: {e}");
                events.push(DeskEvent::ticket_failed(PROCESS, id, "tag", e));
                continue;
            }
            log::info!("Ticket #{id}: survey sent and tagged '{SURVEY_SENT_TAG}'");
            events.push(DeskEvent::SurveySent {
                ticket_id:  id,
                agent_name: agent_name.to_string(),
            });
        }
        Ok(events)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
