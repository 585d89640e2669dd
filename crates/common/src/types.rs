use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How delivery-unit membership is determined for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupingMode {
    /// Group tickets by the cluster tag each ticket carries.
    Cluster,
    /// Use the route registry as the authoritative assignment.
    Route,
}

impl std::fmt::Display for GroupingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupingMode::Cluster => write!(f, "cluster"),
            GroupingMode::Route => write!(f, "route"),
        }
    }
}

/// A delivery request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Opaque store record id.
    pub record_id: String,
    /// Human-facing ticket identifier (e.g. "T1").
    pub ticket_id: String,
    pub requester_name: String,
    pub address: String,
    pub phone_number: String,
    pub household_size: u32,
    pub vulnerabilities: Vec<String>,
    pub grocery_list: Vec<String>,
    pub custom_items: Option<String>,
    pub delivery_notes: Option<String>,
    /// Cluster references as stored. Exactly one is expected in cluster mode.
    pub cluster_refs: Vec<String>,
    /// Route record references as stored.
    pub route_refs: Vec<String>,
    /// Volunteer record references as stored.
    pub volunteer_refs: Vec<String>,
}

/// The person delivering a unit's tickets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volunteer {
    pub id: String,
    pub full_name: String,
    pub email: String,
}

impl Volunteer {
    /// First whitespace-delimited token of the full name, if the name isn't blank.
    pub fn first_name(&self) -> Option<&str> {
        self.full_name.split_whitespace().next()
    }
}

/// A route record from the route registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub name: String,
    pub delivery_date: Option<NaiveDate>,
    pub arrival_time: Option<String>,
    /// Volunteer references assigned on the route record itself.
    pub volunteer_refs: Vec<String>,
    /// Ticket record ids linked to this route.
    pub ticket_refs: Vec<String>,
}

/// Where a unit's volunteer assignment comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Assignment {
    /// Collected from the volunteer references on the unit's tickets.
    FromTickets,
    /// Carried on the route record.
    Preassigned(Vec<String>),
}

/// A named group of tickets delivered by one volunteer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryUnit {
    pub id: String,
    pub name: String,
    pub arrival_time: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    pub assignment: Assignment,
    /// Tickets in the order the store returned them.
    pub tickets: Vec<Ticket>,
}

impl DeliveryUnit {
    /// Build an empty cluster unit; the cluster id doubles as its name.
    pub fn cluster(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            arrival_time: None,
            delivery_date: None,
            assignment: Assignment::FromTickets,
            tickets: Vec::new(),
        }
    }

    /// Build an empty unit from a route record.
    pub fn route(route: &Route) -> Self {
        Self {
            id: route.id.clone(),
            name: route.name.clone(),
            arrival_time: route.arrival_time.clone(),
            delivery_date: route.delivery_date,
            assignment: Assignment::Preassigned(route.volunteer_refs.clone()),
            tickets: Vec::new(),
        }
    }

    pub fn ticket_ids(&self) -> Vec<&str> {
        self.tickets.iter().map(|t| t.ticket_id.as_str()).collect()
    }
}

/// Rendered message ready for the transport. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationDocument {
    /// Unit this document was rendered for (not sent).
    pub unit: String,
    pub from: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub reply_to: Option<String>,
    pub subject: String,
    /// Markdown source.
    pub text: String,
    /// HTML rendering of `text`.
    pub html: String,
}
