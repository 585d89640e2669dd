//! In-memory collaborators shared by the engine integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use courier_common::error::{StoreError, TransportError};
use courier_common::types::{NotificationDocument, Route, Ticket, Volunteer};
use courier_engine::renderer::{RenderSettings, Renderer};
use courier_notifier::Transport;
use courier_store::RecordStore;

pub fn delivery_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 5, 2).unwrap()
}

pub fn renderer() -> Renderer {
    Renderer::new(RenderSettings {
        from: "noreply@example.org".to_string(),
        ops_email: "ops@example.org".to_string(),
        ops_phone: "(555) 010-0000".to_string(),
        warehouse_address: "221 Bedford Ave, Brooklyn, NY".to_string(),
        completion_form_url: "https://forms.example.org/done".to_string(),
        default_arrival_time: "between 1pm and 3pm".to_string(),
    })
}

pub fn volunteer(id: &str, full_name: &str, email: &str) -> Volunteer {
    Volunteer {
        id: id.to_string(),
        full_name: full_name.to_string(),
        email: email.to_string(),
    }
}

pub fn ticket(ticket_id: &str, household_size: u32, vulnerabilities: &[&str]) -> Ticket {
    Ticket {
        record_id: format!("rec{ticket_id}"),
        ticket_id: ticket_id.to_string(),
        requester_name: format!("Neighbor {ticket_id}"),
        address: format!("{household_size} Fulton St"),
        phone_number: "555-0100".to_string(),
        household_size,
        vulnerabilities: vulnerabilities.iter().map(|v| v.to_string()).collect(),
        grocery_list: vec!["Rice".to_string()],
        custom_items: None,
        delivery_notes: None,
        cluster_refs: vec![],
        route_refs: vec![],
        volunteer_refs: vec![],
    }
}

/// Ticket in a cluster, assigned by ticket-level volunteer reference.
pub fn cluster_ticket(ticket_id: &str, cluster: &str, volunteers: &[&str]) -> Ticket {
    let mut t = ticket(ticket_id, 1, &[]);
    t.cluster_refs = vec![cluster.to_string()];
    t.volunteer_refs = volunteers.iter().map(|v| v.to_string()).collect();
    t
}

pub fn route(id: &str, name: &str, volunteers: &[&str], tickets: &[&Ticket]) -> Route {
    Route {
        id: id.to_string(),
        name: name.to_string(),
        delivery_date: Some(delivery_date()),
        arrival_time: Some("10:30am".to_string()),
        volunteer_refs: volunteers.iter().map(|v| v.to_string()).collect(),
        ticket_refs: tickets.iter().map(|t| t.record_id.clone()).collect(),
    }
}

/// Record store over fixed data.
#[derive(Default)]
pub struct FakeStore {
    pub routes: Vec<Route>,
    pub tickets: Vec<Ticket>,
    pub volunteers: HashMap<String, Volunteer>,
    /// When set, every route and ticket listing fails with a 503.
    pub unreachable: bool,
}

impl FakeStore {
    pub fn with_volunteer(mut self, volunteer: Volunteer) -> Self {
        self.volunteers.insert(volunteer.id.clone(), volunteer);
        self
    }

    /// Add a route and its tickets, linking the tickets back to the route.
    pub fn with_route(mut self, route: Route, tickets: Vec<Ticket>) -> Self {
        for mut t in tickets {
            t.route_refs = vec![route.id.clone()];
            self.tickets.push(t);
        }
        self.routes.push(route);
        self
    }

    fn check_reachable(&self) -> Result<(), StoreError> {
        if self.unreachable {
            return Err(StoreError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for FakeStore {
    async fn bulk_delivery_tickets(&self) -> Result<Vec<Ticket>, StoreError> {
        self.check_reachable()?;
        Ok(self
            .tickets
            .iter()
            .filter(|t| t.route_refs.is_empty())
            .cloned()
            .collect())
    }

    async fn routes_for_date(&self, date: NaiveDate) -> Result<Vec<Route>, StoreError> {
        self.check_reachable()?;
        Ok(self
            .routes
            .iter()
            .filter(|r| r.delivery_date == Some(date))
            .cloned()
            .collect())
    }

    async fn route_by_name(&self, date: NaiveDate, name: &str) -> Result<Vec<Route>, StoreError> {
        Ok(self
            .routes_for_date(date)
            .await?
            .into_iter()
            .filter(|r| r.name == name)
            .collect())
    }

    async fn tickets_for_routes(&self, routes: &[Route]) -> Result<Vec<Ticket>, StoreError> {
        self.check_reachable()?;
        Ok(routes
            .iter()
            .flat_map(|r| r.ticket_refs.iter())
            .filter_map(|id| self.tickets.iter().find(|t| &t.record_id == id))
            .cloned()
            .collect())
    }

    async fn volunteer(&self, id: &str) -> Result<Volunteer, StoreError> {
        self.volunteers
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}

/// Transport that records every document and can be told to reject some recipients.
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<NotificationDocument>>,
    pub calls: Mutex<usize>,
    pub reject: Vec<String>,
}

impl RecordingTransport {
    pub fn rejecting(recipient: &str) -> Self {
        Self {
            reject: vec![recipient.to_string()],
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    pub fn sent_to(&self) -> Vec<String> {
        let mut to: Vec<String> = self
            .sent
            .lock()
            .unwrap()
            .iter()
            .flat_map(|d| d.to.clone())
            .collect();
        to.sort();
        to
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, document: &NotificationDocument) -> Result<(), TransportError> {
        *self.calls.lock().unwrap() += 1;
        if document.to.iter().any(|to| self.reject.contains(to)) {
            return Err(TransportError::Rejected {
                status: 400,
                body: Some(r#"{"errors":[{"message":"rejected"}]}"#.to_string()),
            });
        }
        self.sent.lock().unwrap().push(document.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
