//! Round-robin assignment: third process of every pass.
//!
//! Each pending ticket with no responder goes to the next operative agent
//! after the one recorded in the rotation cursor. The greeting is posted
//! first; the ticket is assigned and opened only if the greeting went out.

use crate::{
    error::DeskResult,
    event::DeskEvent,
    subsystem::{DeskSubsystem, PassContext},
    template::render_or_raw,
    ticket_service::{query, TicketUpdate},
    types::{status, AgentId},
};

const PROCESS: &str = "assignment";
pub const FALLBACK_AGENT_NAME: &str = "nuestro equipo";

/// The agent after `last` in `operative`, wrapping around. Starts from the
/// first agent when `last` is unknown or no longer operative.
pub fn next_in_rotation<'a>(operative: &'a [AgentId], last: Option<&str>) -> Option<&'a AgentId> {
    if operative.is_empty() {
        return None;
    }
    let next = last
        .and_then(|last| operative.iter().position(|id| id == last))
        .map_or(0, |i| (i + 1) % operative.len());
    operative.get(next)
}

pub struct AssignmentSubsystem;

impl DeskSubsystem for AssignmentSubsystem {
    fn name(&self) -> &'static str {
        PROCESS
    }

    fn run(&mut self, ctx: &PassContext<'_>) -> DeskResult<Vec<DeskEvent>> {
        let operative = ctx.store.load_operative_agents();
        if operative.is_empty() {
            log::warn!("No operative agents cached; skipping ticket assignment");
            return Ok(vec![DeskEvent::skipped(PROCESS, "no operative agents")]);
        }
        let settings = ctx.store.load_global_settings();
        let Some(template) = settings.opening_message() else {
            return Ok(vec![DeskEvent::skipped(PROCESS, "opening message not configured")]);
        };
        let directory = ctx.store.load_agent_directory();

        let tickets = ctx.tickets.search(&query::pending_unassigned(), 1)?;
        if tickets.is_empty() {
            log::info!("No pending tickets to assign");
        }

        let mut events = Vec::new();
        let mut cursor = ctx.store.last_assigned_agent();

        for ticket in tickets {
            let id = ticket.id;
            if ticket.responder_id.is_some() {
                continue;
            }
            let Some(agent_id) = next_in_rotation(&operative, cursor.as_deref()).cloned() else {
                break;
            };
            cursor = Some(agent_id.clone());
            if !ctx.dry_run {
                if let Err(e) = ctx.store.set_last_assigned_agent(&agent_id) {
                    log::warn!("Cannot persist rotation cursor: {e}");
                }
            }

            let responder = match agent_id.parse::<i64>() {
                Ok(responder) => responder,
                Err(_) => {
                    log::error!("Agent id '{agent_id}' is not an integer; skipping ticket #{id}");
                    events.push(DeskEvent::ticket_failed(PROCESS, id, "select", "non-numeric agent id"));
                    continue;
                }
            };
            let agent_name = directory
                .get(&agent_id)
                .map(String::as_str)
                .unwrap_or(FALLBACK_AGENT_NAME);
            let id_text = id.to_string();
            let body = render_or_raw(
                template,
                &[("ticket_id", id_text.as_str()), ("agent_name", agent_name)],
                "Opening template",
            );

            if ctx.dry_run {
                events.push(DeskEvent::dry_run(PROCESS, id, format!("greet and assign to {agent_name} ({agent_id})")));
                continue;
            }
            if let Err(e) = ctx.tickets.reply(id, &body) {
                log::error!("Ticket #{id}: opening reply failed; not assigning: {e}");
                events.push(DeskEvent::ticket_failed(PROCESS, id, "reply", e));
                continue;
            }
            let assign = TicketUpdate {
                status:       Some(status::OPEN),
                responder_id: Some(Some(responder)),
                tags:         None,
            };
            if let Err(e) = ctx.tickets.update(id, &assign) {
                log::error!("Ticket #{id}: greeted but assignment to {agent_name} failed: {e}");
                events.push(DeskEvent::ticket_failed(PROCESS, id, "assign", e));
                continue;
            }
            log::info!("Ticket #{id}: greeted, assigned to {agent_name} (ID: {agent_id}) and opened");
            events.push(DeskEvent::TicketAssigned {
                ticket_id:  id,
                agent_id:   agent_id.clone(),
                agent_name: agent_name.to_string(),
            });
        }
        Ok(events)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
