//! Freshdesk REST backend for the Ticket Service, over blocking reqwest.
//!
//! Auth is HTTP basic with the API key as user and "x" as password.
//! No retries: a failed call is reported and the caller moves on.

use crate::{
    config::HelpdeskConfig,
    error::{DeskError, DeskResult},
    ticket_service::{Ticket, TicketService, TicketUpdate},
    types::TicketId,
};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    results: Vec<Ticket>,
}

pub struct FreshdeskClient {
    http:    Client,
    base:    String,
    api_key: String,
}

impl FreshdeskClient {
    pub fn new(config: &HelpdeskConfig) -> DeskResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            base: config.api_base(),
            api_key: config.api_key.clone(),
        })
    }

    fn send(&self, request: RequestBuilder, url: &str) -> DeskResult<Response> {
        let response = request.basic_auth(&self.api_key, Some("x")).send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(DeskError::Http {
            status: status.as_u16(),
            url: url.to_string(),
            body,
        })
    }
}

impl TicketService for FreshdeskClient {
    fn search(&self, query: &str, page: u32) -> DeskResult<Vec<Ticket>> {
        let url = format!("{}/search/tickets", self.base);
        let quoted = format!("\"{query}\"");
        let page = page.to_string();
        let request = self
            .http
            .get(&url)
            .query(&[("query", quoted.as_str()), ("page", page.as_str())]);
        let body: SearchPage = self.send(request, &url)?.json()?;
        Ok(body.results)
    }

    fn ticket(&self, id: TicketId) -> DeskResult<Ticket> {
        let url = format!("{}/tickets/{id}", self.base);
        let ticket = self.send(self.http.get(&url), &url)?.json()?;
        Ok(ticket)
    }

    fn reply(&self, id: TicketId, body: &str) -> DeskResult<()> {
        let url = format!("{}/tickets/{id}/reply", self.base);
        let payload = serde_json::json!({ "body": body });
        self.send(self.http.post(&url).json(&payload), &url)?;
        Ok(())
    }

    fn update(&self, id: TicketId, update: &TicketUpdate) -> DeskResult<()> {
        let url = format!("{}/tickets/{id}", self.base);
        self.send(self.http.put(&url).json(update), &url)?;
        Ok(())
    }
}
