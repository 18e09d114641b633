use super::DeskStore;
use crate::{error::DeskResult, types::AgentId};

impl DeskStore {
    // ── Round-robin cursor ─────────────────────────────────────────

    /// The agent id most recently handed a ticket, if recorded.
    pub fn last_assigned_agent(&self) -> Option<AgentId> {
        self.read_text(&self.files.rotation_cursor)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    pub fn set_last_assigned_agent(&self, agent_id: &str) -> DeskResult<()> {
        self.write_text(&self.files.rotation_cursor, agent_id)
    }
}
