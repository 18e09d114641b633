//! Roster refresh: first process of every pass.
//!
//! Pulls the settings and agent sheets from the schedule source, judges
//! every agent against the pass instant and persists the agent directory,
//! the operative ids and the global settings for the later processes.
//!
//! A settings sheet that cannot be read, or comes back empty, leaves the
//! previous settings cache in place and the roster is judged with it. An agent sheet that cannot be read aborts the refresh and leaves
//! both roster caches untouched.

use crate::{
    config::GlobalSettings,
    error::DeskResult,
    event::DeskEvent,
    roster::{compute_roster, RosterSnapshot},
    schedule_source::{settings_map, ScheduleSource},
    subsystem::{DeskSubsystem, PassContext},
};

pub struct RosterSubsystem {
    source: Box<dyn ScheduleSource>,
    /// Outcome of the most recent run, for reporting.
    pub last: Option<RosterSnapshot>,
}

impl RosterSubsystem {
    pub fn new(source: Box<dyn ScheduleSource>) -> Self {
        Self { source, last: None }
    }

    fn refresh_settings(&self, ctx: &PassContext<'_>) -> DeskResult<GlobalSettings> {
        let settings = match self.source.settings_records() {
            Ok(records) => GlobalSettings::from_map(settings_map(&records)),
            Err(e) => {
                log::error!("Cannot load global settings from the schedule source: {e}");
                GlobalSettings::default()
            }
        };
        if settings.is_empty() {
            log::warn!("Global settings empty; judging the roster with the cached settings");
            return Ok(ctx.store.load_global_settings());
        }
        ctx.store.save_global_settings(&settings)?;
        Ok(settings)
    }
}

impl DeskSubsystem for RosterSubsystem {
    fn name(&self) -> &'static str {
        "roster"
    }

    fn run(&mut self, ctx: &PassContext<'_>) -> DeskResult<Vec<DeskEvent>> {
        let settings = self.refresh_settings(ctx)?;
        let records = self.source.agent_records()?;

        let roster_settings = settings.roster_settings(&ctx.config.params);
        let now = ctx.now(roster_settings.zone);
        log::info!("Judging {} agent rows at {now}", records.len());

        let snapshot = compute_roster(&records, &roster_settings, &now);
        ctx.store.save_agent_directory(&snapshot.directory)?;
        ctx.store.save_operative_agents(&snapshot.operative)?;

        let event = DeskEvent::RosterRefreshed {
            agents:       snapshot.directory.len(),
            operative:    snapshot.operative.len(),
            skipped_rows: snapshot.skipped,
        };
        self.last = Some(snapshot);
        Ok(vec![event])
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
