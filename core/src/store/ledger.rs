use super::DeskStore;
use crate::{error::{DeskError, DeskResult}, types::TicketId};
use std::collections::BTreeSet;
use std::io::Write;

impl DeskStore {
    // ── After-hours ledger ─────────────────────────────────────────

    /// Ticket ids that already received the after-hours reply.
    pub fn after_hours_processed(&self) -> BTreeSet<String> {
        self.read_text(&self.files.after_hours_ledger)
            .map(|content| {
                content
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Append one ticket id to the ledger.
    pub fn record_after_hours(&self, ticket_id: TicketId) -> DeskResult<()> {
        let path = self.path(&self.files.after_hours_ledger);
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| DeskError::io(&path, e))?;
        writeln!(file, "{ticket_id}").map_err(|e| DeskError::io(&path, e))?;
        Ok(())
    }
}
