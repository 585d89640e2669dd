//! Record store access.
//!
//! The engine only ever sees typed records through [`RecordStore`]; untyped
//! field maps are decoded and validated inside the store implementation.

pub mod airtable;
pub mod formula;
pub mod records;

use async_trait::async_trait;
use chrono::NaiveDate;

use courier_common::error::StoreError;
use courier_common::types::{Route, Ticket, Volunteer};

pub use airtable::AirtableStore;

/// Intake table holding delivery tickets.
pub const INTAKE_TABLE: &str = "Intake";
/// Volunteer sign-up table.
pub const VOLUNTEER_FORM_TABLE: &str = "Volunteer Form";
/// Route registry for bulk deliveries.
pub const BULK_ROUTES_TABLE: &str = "Bulk Delivery Routes";
/// Ticket status selected for cluster-mode runs.
pub const BULK_DELIVERY_CONFIRMED: &str = "Bulk Delivery Confirmed";

/// Read-only access to tickets, routes and volunteers.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All tickets confirmed for bulk delivery, in store order.
    async fn bulk_delivery_tickets(&self) -> Result<Vec<Ticket>, StoreError>;

    /// Every route scheduled on `date`.
    async fn routes_for_date(&self, date: NaiveDate) -> Result<Vec<Route>, StoreError>;

    /// Routes scheduled on `date` whose name is exactly `name`.
    async fn route_by_name(&self, date: NaiveDate, name: &str) -> Result<Vec<Route>, StoreError>;

    /// Tickets linked to any of `routes`, in store order.
    async fn tickets_for_routes(&self, routes: &[Route]) -> Result<Vec<Ticket>, StoreError>;

    /// A single volunteer record.
    async fn volunteer(&self, id: &str) -> Result<Volunteer, StoreError>;
}
