//! Shared primitive types used across the desk automation.

/// A helpdesk agent identifier, normalized to its integer rendering ("007" -> "7").
pub type AgentId = String;

/// A helpdesk ticket identifier.
pub type TicketId = u64;

/// Agent id -> display name, for every schedule row with both fields present.
pub type AgentDirectory = std::collections::BTreeMap<AgentId, String>;

/// Agent ids eligible for work right now, in source row order.
pub type OperativeAgentIds = Vec<AgentId>;

/// Ticket status codes understood by the helpdesk API.
pub mod status {
    pub const OPEN:     u8 = 2;
    pub const PENDING:  u8 = 3;
    pub const RESOLVED: u8 = 4;
    pub const CLOSED:   u8 = 5;
}
