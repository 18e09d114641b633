//! The desk engine: one orchestration pass over the helpdesk.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Roster refresh   (schedule source -> roster caches)
//!   2. After-hours      (acknowledge and close outside attendance)
//!   3. Assignment       (round-robin over operative agents)
//!   4. Surveys          (post-resolution survey + tag)
//!
//! RULES:
//!   - The clock is sampled once per pass; every subsystem sees the same instant.
//!   - Subsystems share state only through the store.
//!   - A failing subsystem is logged and the pass continues with the next one.

use crate::{
    after_hours_subsystem::AfterHoursSubsystem,
    assignment_subsystem::AssignmentSubsystem,
    clock::DeskClock,
    config::DeskConfig,
    event::DeskEvent,
    roster::RosterSnapshot,
    roster_subsystem::RosterSubsystem,
    schedule_source::ScheduleSource,
    store::DeskStore,
    subsystem::{DeskSubsystem, PassContext},
    survey_subsystem::SurveySubsystem,
    ticket_service::TicketService,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

pub struct DeskEngine {
    pub config:  DeskConfig,
    pub clock:   DeskClock,
    pub dry_run: bool,
    store:       DeskStore,
    tickets:     Box<dyn TicketService>,
    subsystems:  Vec<Box<dyn DeskSubsystem>>,
}

impl DeskEngine {
    pub fn new(
        config: DeskConfig,
        clock: DeskClock,
        store: DeskStore,
        tickets: Box<dyn TicketService>,
    ) -> Self {
        Self {
            config,
            clock,
            dry_run: false,
            store,
            tickets,
            subsystems: Vec::new(),
        }
    }

    /// Build a fully wired engine with all subsystems registered.
    /// Call this instead of new() + manual register() calls.
    pub fn build(
        config: DeskConfig,
        clock: DeskClock,
        store: DeskStore,
        tickets: Box<dyn TicketService>,
        source: Box<dyn ScheduleSource>,
    ) -> Self {
        let mut engine = DeskEngine::new(config, clock, store, tickets);

        // EXECUTION ORDER: fixed, documented, never reordered.
        engine.register(Box::new(RosterSubsystem::new(source)));
        engine.register(Box::new(AfterHoursSubsystem));
        engine.register(Box::new(AssignmentSubsystem));
        engine.register(Box::new(SurveySubsystem));
        engine
    }

    /// Register a subsystem. Call in the documented execution order.
    pub fn register(&mut self, subsystem: Box<dyn DeskSubsystem>) {
        self.subsystems.push(subsystem);
    }

    pub fn subsystem_names(&self) -> Vec<&'static str> {
        self.subsystems.iter().map(|s| s.name()).collect()
    }

    /// Run every registered subsystem once, in order.
    pub fn run_pass(&mut self) -> PassReport {
        let started_at = self.clock.utc_now();
        log::info!(
            "--- Desk pass started ({}){} ---",
            started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            if self.dry_run { " [dry run]" } else { "" },
        );

        log::debug!("Subsystem order: {}", self.subsystem_names().join(" -> "));

        let mut events = vec![DeskEvent::PassStarted { at: started_at.to_rfc3339() }];
        let ctx = PassContext {
            utc_now: started_at,
            config:  &self.config,
            store:   &self.store,
            tickets: self.tickets.as_ref(),
            dry_run: self.dry_run,
        };

        for subsystem in &mut self.subsystems {
            log::info!("Running {}", subsystem.name());
            match subsystem.run(&ctx) {
                Ok(new_events) => events.extend(new_events),
                Err(e) => {
                    log::error!("{} failed: {e}", subsystem.name());
                    events.push(DeskEvent::ProcessFailed {
                        process: subsystem.name().to_string(),
                        reason:  e.to_string(),
                    });
                }
            }
        }

        events.push(DeskEvent::PassCompleted { at: started_at.to_rfc3339() });
        log::info!("--- Desk pass finished ---");
        PassReport { started_at, events }
    }

    pub fn store(&self) -> &DeskStore {
        &self.store
    }

    /// The roster computed by the most recent pass, if one ran.
    /// Used by desk-runner to print end-of-pass summaries.
    pub fn last_roster(&self) -> Option<&RosterSnapshot> {
        self.subsystems.iter().find_map(|sub| {
            sub.as_any()
                .downcast_ref::<RosterSubsystem>()
                .and_then(|r| r.last.as_ref())
        })
    }
}

/// Everything one pass did, in order.
#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub started_at: DateTime<Utc>,
    pub events:     Vec<DeskEvent>,
}

impl PassReport {
    fn count(&self, pred: impl Fn(&DeskEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn assigned(&self) -> usize {
        self.count(|e| matches!(e, DeskEvent::TicketAssigned { .. }))
    }

    pub fn after_hours_closed(&self) -> usize {
        self.count(|e| matches!(e, DeskEvent::AfterHoursClosed { .. }))
    }

    pub fn surveys_sent(&self) -> usize {
        self.count(|e| matches!(e, DeskEvent::SurveySent { .. }))
    }

    pub fn ticket_failures(&self) -> usize {
        self.count(|e| matches!(e, DeskEvent::TicketFailed { .. }))
    }

    pub fn failed_processes(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                DeskEvent::ProcessFailed { process, .. } => Some(process.as_str()),
                _ => None,
            })
            .collect()
    }
}
