//! Subsystem trait and the per-pass context.
//!
//! RULE: Every process implements DeskSubsystem.
//! The engine calls run() on each registered subsystem
//! in registration order, once per pass.
//! Execution order is fixed and documented in engine.rs.

use crate::{
    clock::{Instant, Zone},
    config::DeskConfig,
    error::DeskResult,
    event::DeskEvent,
    store::DeskStore,
    ticket_service::TicketService,
};
use chrono::{DateTime, Utc};
use std::any::Any;

/// Everything a subsystem may touch during one pass.
pub struct PassContext<'a> {
    /// Sampled once when the pass starts.
    pub utc_now: DateTime<Utc>,
    pub config:  &'a DeskConfig,
    pub store:   &'a DeskStore,
    pub tickets: &'a dyn TicketService,
    /// No helpdesk writes, no cursor or ledger writes.
    pub dry_run: bool,
}

impl PassContext<'_> {
    /// The pass instant read in `zone`.
    pub fn now(&self, zone: Zone) -> Instant {
        Instant::at(self.utc_now, zone)
    }
}

/// The contract every subsystem must fulfill.
pub trait DeskSubsystem {
    /// Unique stable name for this subsystem.
    fn name(&self) -> &'static str;

    /// Called once per pass by the engine.
    ///
    /// An `Err` aborts this subsystem only; the engine logs it and moves on.
    fn run(&mut self, ctx: &PassContext<'_>) -> DeskResult<Vec<DeskEvent>>;

    /// For downcasting in tests and tooling only.
    fn as_any(&self) -> &dyn Any;
}
