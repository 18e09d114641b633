//! Post-resolution surveys.

mod common;

use common::*;
use deskops_core::{
    config::DeskConfig,
    event::DeskEvent,
    survey_subsystem::SURVEY_SENT_TAG,
    ticket_service::{Ticket, TicketUpdate},
    types::status,
};

const CLOSED_ON_DAY: &str = "created_at:'2024-05-06'";

fn closed(id: u64, responder: Option<i64>, status: u8, tags: &[&str]) -> Ticket {
    Ticket {
        id,
        status: Some(status),
        responder_id: responder,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        ..Ticket::default()
    }
}

#[test]
fn survey_is_sent_and_ticket_restored_with_tag() {
    let mut desk = desk(bogota(10, 0));
    desk.tickets.insert(closed(21, Some(101), status::CLOSED, &["vip"]));
    desk.tickets.answer(CLOSED_ON_DAY, vec![21]);
    let report = desk.engine.run_pass();

    assert_eq!(report.surveys_sent(), 1);
    assert_eq!(
        desk.tickets.replies.borrow()[0],
        (21, "Gracias de parte de Ana (#21)".to_string())
    );
    let updates = desk.tickets.updates.borrow();
    assert_eq!(
        updates[0],
        (
            21,
            TicketUpdate {
                status:       Some(status::CLOSED),
                responder_id: Some(Some(101)),
                tags:         Some(vec!["vip".to_string(), SURVEY_SENT_TAG.to_string()]),
            }
        )
    );
}

#[test]
fn query_targets_the_lookback_date() {
    // 00:30 Bogota on May 6 is 05:30 UTC; minus 240 minutes lands on May 6 01:30 UTC.
    let mut desk = desk(bogota(0, 30));
    desk.engine.run_pass();
    let queries = desk.tickets.queries.borrow();
    assert!(queries.iter().any(|(q, _)| {
        q == "created_at:'2024-05-06' AND (status:5 OR status:6 OR status:7)"
    }));
}

#[test]
fn tagged_tickets_are_not_surveyed_twice() {
    let mut desk = desk(bogota(10, 0));
    desk.tickets.insert(closed(21, Some(101), status::CLOSED, &[]));
    desk.tickets.insert(closed(22, Some(105), status::CLOSED, &[SURVEY_SENT_TAG]));
    desk.tickets.answer(CLOSED_ON_DAY, vec![21, 22]);

    let first = desk.engine.run_pass();
    assert_eq!(first.surveys_sent(), 1);

    let second = desk.engine.run_pass();
    assert_eq!(second.surveys_sent(), 0);
    assert_eq!(desk.tickets.replies.borrow().len(), 1);
}

#[test]
fn unknown_or_missing_responder_uses_the_generic_signature() {
    let mut desk = desk(bogota(10, 0));
    desk.tickets.insert(closed(23, Some(999), 6, &[]));
    desk.tickets.insert(closed(24, None, 7, &[]));
    desk.tickets.answer(CLOSED_ON_DAY, vec![23, 24]);
    desk.engine.run_pass();

    let replies = desk.tickets.replies.borrow();
    assert_eq!(replies[0].1, "Gracias de parte de nuestro equipo de soporte (#23)");
    assert_eq!(replies[1].1, "Gracias de parte de nuestro equipo de soporte (#24)");

    // Custom closed-like statuses survive the write-back.
    assert_eq!(desk.tickets.stored(23).unwrap().status, Some(6));
    assert_eq!(desk.tickets.stored(24).unwrap().responder_id, None);
}

#[test]
fn pagination_stops_at_the_page_limit() {
    let mut config = DeskConfig::default_test();
    config.params.search_page_size = 2;
    config.params.survey_max_pages = 2;
    let mut desk = desk_with(config, source(), bogota(10, 0));
    for id in 31..=35 {
        desk.tickets.insert(closed(id, Some(101), status::CLOSED, &[]));
    }
    desk.tickets.answer(CLOSED_ON_DAY, (31..=35).collect());
    let report = desk.engine.run_pass();

    assert_eq!(report.surveys_sent(), 4);
    let pages: Vec<u32> = desk
        .tickets
        .queries
        .borrow()
        .iter()
        .filter(|(q, _)| q.starts_with(CLOSED_ON_DAY))
        .map(|(_, page)| *page)
        .collect();
    assert_eq!(pages, vec![1, 2]);
}

#[test]
fn short_page_ends_pagination() {
    let mut config = DeskConfig::default_test();
    config.params.search_page_size = 2;
    let mut desk = desk_with(config, source(), bogota(10, 0));
    for id in 41..=43 {
        desk.tickets.insert(closed(id, Some(105), status::CLOSED, &[]));
    }
    desk.tickets.answer(CLOSED_ON_DAY, (41..=43).collect());
    let report = desk.engine.run_pass();

    assert_eq!(report.surveys_sent(), 3);
    let searched = desk.tickets.queries.borrow().iter().filter(|(q, _)| q.starts_with(CLOSED_ON_DAY)).count();
    assert_eq!(searched, 2);
}

#[test]
fn failed_reply_leaves_the_ticket_untagged() {
    let mut desk = desk(bogota(10, 0));
    desk.tickets.insert(closed(21, Some(101), status::CLOSED, &[]));
    desk.tickets.answer(CLOSED_ON_DAY, vec![21]);
    desk.tickets.fail_reply_for(21);
    let report = desk.engine.run_pass();

    assert_eq!(report.surveys_sent(), 0);
    assert!(!desk.tickets.stored(21).unwrap().has_tag(SURVEY_SENT_TAG));
    assert!(report.events.iter().any(|e| matches!(
        e,
        DeskEvent::TicketFailed { ticket_id: 21, stage, .. } if stage == "reply"
    )));
}
