//! Pass events: the record of what one orchestration pass did.
//!
//! RULE: Subsystems report ONLY through events.
//! A subsystem never reads another subsystem's internal state; shared
//! state flows through the store.

use crate::types::{AgentId, TicketId};
use serde::{Deserialize, Serialize};

/// Every event emitted during a pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeskEvent {
    // ── Engine events ──────────────────────────────
    PassStarted {
        at: String,
    },
    PassCompleted {
        at: String,
    },
    ProcessSkipped {
        process: String,
        reason: String,
    },
    ProcessFailed {
        process: String,
        reason: String,
    },

    // ── Roster refresh ─────────────────────────────
    RosterRefreshed {
        agents: usize,
        operative: usize,
        skipped_rows: usize,
    },

    // ── After-hours ────────────────────────────────
    AttendanceChecked {
        inside_hours: bool,
    },
    AfterHoursClosed {
        ticket_id: TicketId,
    },

    // ── Assignment ─────────────────────────────────
    TicketAssigned {
        ticket_id: TicketId,
        agent_id: AgentId,
        agent_name: String,
    },

    // ── Surveys ────────────────────────────────────
    SurveySent {
        ticket_id: TicketId,
        agent_name: String,
    },

    // ── Shared ticket outcomes ─────────────────────
    TicketFailed {
        process: String,
        ticket_id: TicketId,
        stage: String,
        reason: String,
    },
    /// Dry runs report the helpdesk write they would have made.
    DryRunAction {
        process: String,
        ticket_id: TicketId,
        action: String,
    },
}

impl DeskEvent {
    pub fn skipped(process: &str, reason: impl Into<String>) -> Self {
        DeskEvent::ProcessSkipped {
            process: process.to_string(),
            reason: reason.into(),
        }
    }

    pub fn ticket_failed(
        process: &str,
        ticket_id: TicketId,
        stage: &str,
        reason: impl ToString,
    ) -> Self {
        DeskEvent::TicketFailed {
            process: process.to_string(),
            ticket_id,
            stage: stage.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn dry_run(process: &str, ticket_id: TicketId, action: impl Into<String>) -> Self {
        DeskEvent::DryRunAction {
            process: process.to_string(),
            ticket_id,
            action: action.into(),
        }
    }
}
