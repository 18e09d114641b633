pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod freshdesk;
pub mod roster;
pub mod schedule_source;
pub mod store;
pub mod subsystem;
pub mod template;
pub mod ticket_service;
pub mod types;

pub mod after_hours_subsystem;
pub mod assignment_subsystem;
pub mod roster_subsystem;
pub mod survey_subsystem;
