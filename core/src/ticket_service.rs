//! Ticket Service: the helpdesk as seen by the ticket processes.

use crate::{
    error::{DeskError, DeskResult},
    types::TicketId,
};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

/// A ticket as returned by search or detail lookups. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    #[serde(default)]
    pub status: Option<u8>,
    #[serde(default)]
    pub responder_id: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Ticket {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Fields to change on a ticket. `None` leaves a field untouched;
/// `responder_id: Some(None)` explicitly clears the responder.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TicketUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responder_id: Option<Option<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// The contract every helpdesk backend must fulfill.
pub trait TicketService {
    /// One page (1-based) of a search query, without the surrounding quotes.
    fn search(&self, query: &str, page: u32) -> DeskResult<Vec<Ticket>>;

    fn ticket(&self, id: TicketId) -> DeskResult<Ticket>;

    /// Post a public reply on the ticket.
    fn reply(&self, id: TicketId, body: &str) -> DeskResult<()>;

    fn update(&self, id: TicketId, update: &TicketUpdate) -> DeskResult<()>;
}

impl<T: TicketService + ?Sized> TicketService for std::rc::Rc<T> {
    fn search(&self, query: &str, page: u32) -> DeskResult<Vec<Ticket>> {
        (**self).search(query, page)
    }

    fn ticket(&self, id: TicketId) -> DeskResult<Ticket> {
        (**self).ticket(id)
    }

    fn reply(&self, id: TicketId, body: &str) -> DeskResult<()> {
        (**self).reply(id, body)
    }

    fn update(&self, id: TicketId, update: &TicketUpdate) -> DeskResult<()> {
        (**self).update(id, update)
    }
}

/// Walk search pages until a short or empty page, or `max_pages`.
/// A failing page stops the walk and keeps what was collected so far.
pub fn search_all(
    service: &dyn TicketService,
    query: &str,
    max_pages: u32,
    page_size: usize,
) -> Vec<Ticket> {
    let mut all = Vec::new();
    for page in 1..=max_pages {
        let results = match service.search(query, page) {
            Ok(results) => results,
            Err(e) => {
                log::error!("Search page {page} failed for '{query}': {e}");
                break;
            }
        };
        if results.is_empty() {
            break;
        }
        let short = results.len() < page_size;
        all.extend(results);
        log::debug!("Search page {page}: {} tickets so far", all.len());
        if short {
            break;
        }
        if page == max_pages {
            log::warn!(
                "Search hit the {max_pages}-page limit; more tickets may exist for '{query}'"
            );
        }
    }
    all
}

/// Search query builders for the helpdesk's filter syntax.
pub mod query {
    use crate::types::status;
    use chrono::{DateTime, NaiveDate, Utc};

    /// Pending tickets nobody owns yet.
    pub fn pending_unassigned() -> String {
        format!("status:{} AND agent_id:null", status::PENDING)
    }

    /// Unresolved, unassigned tickets created after `since`.
    pub fn recent_unassigned(since: DateTime<Utc>) -> String {
        format!(
            "created_at:>'{}' AND status:<{} AND agent_id:null",
            since.format("%Y-%m-%dT%H:%M:%SZ"),
            status::RESOLVED,
        )
    }

    /// Closed-like tickets created on `date`.
    pub fn closed_created_on(date: NaiveDate, statuses: &[u8]) -> String {
        let filter = statuses
            .iter()
            .map(|s| format!("status:{s}"))
            .collect::<Vec<_>>()
            .join(" OR ");
        format!("created_at:'{}' AND ({filter})", date.format("%Y-%m-%d"))
    }
}

// ── In-memory backend ──────────────────────────────────────────────

/// A scripted helpdesk for tests and dry runs.
///
/// Searches are answered from registered patterns: the first pattern the
/// query contains decides which ticket ids come back, paged by `page_size`.
/// Replies and updates are recorded; updates are applied to the stored tickets.
#[derive(Debug, Default)]
pub struct MemoryTicketService {
    tickets:      RefCell<BTreeMap<TicketId, Ticket>>,
    searches:     RefCell<Vec<(String, Vec<TicketId>)>>,
    page_size:    usize,
    pub replies:  RefCell<Vec<(TicketId, String)>>,
    pub updates:  RefCell<Vec<(TicketId, TicketUpdate)>>,
    pub queries:  RefCell<Vec<(String, u32)>>,
    fail_reply:   RefCell<BTreeSet<TicketId>>,
    fail_update:  RefCell<BTreeSet<TicketId>>,
}

impl MemoryTicketService {
    pub fn new(page_size: usize) -> Self {
        Self { page_size: page_size.max(1), ..Self::default() }
    }

    pub fn insert(&self, ticket: Ticket) {
        self.tickets.borrow_mut().insert(ticket.id, ticket);
    }

    /// Answer queries containing `pattern` with `ids`, replacing any
    /// earlier answer for the same pattern.
    pub fn answer(&self, pattern: &str, ids: Vec<TicketId>) {
        let mut searches = self.searches.borrow_mut();
        match searches.iter_mut().find(|(p, _)| p == pattern) {
            Some(entry) => entry.1 = ids,
            None => searches.push((pattern.to_string(), ids)),
        }
    }

    pub fn fail_reply_for(&self, id: TicketId) {
        self.fail_reply.borrow_mut().insert(id);
    }

    pub fn fail_update_for(&self, id: TicketId) {
        self.fail_update.borrow_mut().insert(id);
    }

    pub fn stored(&self, id: TicketId) -> Option<Ticket> {
        self.tickets.borrow().get(&id).cloned()
    }

    fn rejected(id: TicketId, what: &str) -> DeskError {
        DeskError::Http {
            status: 500,
            url: format!("memory://tickets/{id}/{what}"),
            body: "scripted failure".into(),
        }
    }
}

impl TicketService for MemoryTicketService {
    fn search(&self, query: &str, page: u32) -> DeskResult<Vec<Ticket>> {
        self.queries.borrow_mut().push((query.to_string(), page));
        let searches = self.searches.borrow();
        let Some((_, ids)) = searches.iter().find(|(pattern, _)| query.contains(pattern.as_str())) else {
            return Ok(Vec::new());
        };
        let tickets = self.tickets.borrow();
        let skip = (page.saturating_sub(1) as usize) * self.page_size;
        Ok(ids
            .iter()
            .skip(skip)
            .take(self.page_size)
            .filter_map(|id| tickets.get(id).cloned())
            .collect())
    }

    fn ticket(&self, id: TicketId) -> DeskResult<Ticket> {
        self.stored(id).ok_or_else(|| DeskError::Http {
            status: 404,
            url: format!("memory://tickets/{id}"),
            body: "not found".into(),
        })
    }

    fn reply(&self, id: TicketId, body: &str) -> DeskResult<()> {
        if self.fail_reply.borrow().contains(&id) {
            return Err(Self::rejected(id, "reply"));
        }
        self.replies.borrow_mut().push((id, body.to_string()));
        Ok(())
    }

    fn update(&self, id: TicketId, update: &TicketUpdate) -> DeskResult<()> {
        if self.fail_update.borrow().contains(&id) {
            return Err(Self::rejected(id, "update"));
        }
        if let Some(ticket) = self.tickets.borrow_mut().get_mut(&id) {
            if let Some(status) = update.status {
                ticket.status = Some(status);
            }
            if let Some(responder) = update.responder_id {
                ticket.responder_id = responder;
            }
            if let Some(tags) = &update.tags {
                ticket.tags = tags.clone();
            }
        }
        self.updates.borrow_mut().push((id, update.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn ticket(id: TicketId) -> Ticket {
        Ticket { id, ..Ticket::default() }
    }

    #[test]
    fn queries_match_the_helpdesk_filter_syntax() {
        assert_eq!(query::pending_unassigned(), "status:3 AND agent_id:null");
        let since = Utc.with_ymd_and_hms(2024, 5, 6, 22, 15, 0).unwrap();
        assert_eq!(
            query::recent_unassigned(since),
            "created_at:>'2024-05-06T22:15:00Z' AND status:<4 AND agent_id:null"
        );
        let date = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        assert_eq!(
            query::closed_created_on(date, &[5, 6, 7]),
            "created_at:'2024-05-06' AND (status:5 OR status:6 OR status:7)"
        );
    }

    #[test]
    fn update_payload_skips_untouched_fields() {
        let update = TicketUpdate { status: Some(2), responder_id: Some(Some(9)), tags: None };
        assert_eq!(serde_json::to_value(&update).unwrap(), serde_json::json!({"status": 2, "responder_id": 9}));

        let cleared = TicketUpdate { responder_id: Some(None), ..TicketUpdate::default() };
        assert_eq!(serde_json::to_value(&cleared).unwrap(), serde_json::json!({"responder_id": null}));
    }

    #[test]
    fn search_all_stops_on_short_page() {
        let service = MemoryTicketService::new(2);
        for id in 1..=5 {
            service.insert(ticket(id));
        }
        service.answer("status:5", vec![1, 2, 3, 4, 5]);

        let found = search_all(&service, "status:5", 10, 2);
        assert_eq!(found.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
        assert_eq!(service.queries.borrow().len(), 3);
    }

    #[test]
    fn search_all_respects_page_limit() {
        let service = MemoryTicketService::new(2);
        for id in 1..=6 {
            service.insert(ticket(id));
        }
        service.answer("x", vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(search_all(&service, "x", 2, 2).len(), 4);
    }

    #[test]
    fn search_all_stops_on_empty_page() {
        let service = MemoryTicketService::new(2);
        service.insert(ticket(1));
        service.insert(ticket(2));
        service.answer("x", vec![1, 2]);
        assert_eq!(search_all(&service, "x", 10, 2).len(), 2);
        assert_eq!(service.queries.borrow().len(), 2);
    }

    #[test]
    fn ticket_deserializes_with_nulls_and_extra_fields() {
        let json = r#"{"id": 9, "status": 5, "responder_id": null, "priority": 1, "tags": ["vip"]}"#;
        let ticket: Ticket = serde_json::from_str(json).unwrap();
        assert_eq!(ticket.id, 9);
        assert_eq!(ticket.responder_id, None);
        assert!(ticket.has_tag("vip"));
    }
}
