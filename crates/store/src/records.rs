//! Typed decoding of raw store records.
//!
//! Field names match the Airtable column names. Required columns are plain
//! fields so a record missing one fails to decode with its record id attached.

use chrono::NaiveDate;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use courier_common::error::StoreError;
use courier_common::types::{Route, Ticket, Volunteer};

/// A record as returned by the store: an opaque id plus a field mapping.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    pub id: String,
    #[serde(default)]
    pub fields: serde_json::Value,
}

impl RawRecord {
    /// Decode the field mapping into `F`.
    pub fn decode<F: DeserializeOwned>(&self) -> Result<F, StoreError> {
        serde_json::from_value(self.fields.clone()).map_err(|e| StoreError::Decode {
            record_id: self.id.clone(),
            detail: e.to_string(),
        })
    }
}

/// Converts a decoded field set into a domain record.
pub trait FromRecord: Sized {
    type Fields: DeserializeOwned;

    fn from_fields(id: String, fields: Self::Fields) -> Self;

    fn from_record(record: &RawRecord) -> Result<Self, StoreError> {
        let fields = record.decode::<Self::Fields>()?;
        Ok(Self::from_fields(record.id.clone(), fields))
    }
}

/// Blank annotations are treated the same as absent ones.
fn present(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

#[derive(Debug, Deserialize)]
pub struct TicketFields {
    #[serde(rename = "ticketID")]
    pub ticket_id: String,
    #[serde(rename = "requestName")]
    pub requester_name: String,
    pub address: String,
    #[serde(rename = "phoneNumber")]
    pub phone_number: String,
    #[serde(rename = "householdSize")]
    pub household_size: u32,
    #[serde(rename = "vulnerability", default)]
    pub vulnerabilities: Option<Vec<String>>,
    #[serde(rename = "foodOptions", default)]
    pub grocery_list: Option<Vec<String>>,
    #[serde(rename = "otherItems", default)]
    pub custom_items: Option<String>,
    #[serde(rename = "deliveryNotes", default)]
    pub delivery_notes: Option<String>,
    #[serde(rename = "Bulk Cluster", default)]
    pub cluster_refs: Option<Vec<String>>,
    #[serde(rename = "Bulk Route", default)]
    pub route_refs: Option<Vec<String>>,
    #[serde(rename = "deliveryVolunteer", default)]
    pub volunteer_refs: Option<Vec<String>>,
}

impl FromRecord for Ticket {
    type Fields = TicketFields;

    fn from_fields(id: String, f: TicketFields) -> Self {
        Ticket {
            record_id: id,
            ticket_id: f.ticket_id,
            requester_name: f.requester_name,
            address: f.address,
            phone_number: f.phone_number,
            household_size: f.household_size,
            vulnerabilities: f.vulnerabilities.unwrap_or_default(),
            grocery_list: f.grocery_list.unwrap_or_default(),
            custom_items: present(f.custom_items),
            delivery_notes: present(f.delivery_notes),
            cluster_refs: f.cluster_refs.unwrap_or_default(),
            route_refs: f.route_refs.unwrap_or_default(),
            volunteer_refs: f.volunteer_refs.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct VolunteerFields {
    #[serde(rename = "Name")]
    pub full_name: String,
    #[serde(rename = "Email")]
    pub email: String,
}

impl FromRecord for Volunteer {
    type Fields = VolunteerFields;

    fn from_fields(id: String, f: VolunteerFields) -> Self {
        Volunteer {
            id,
            full_name: f.full_name.trim().to_string(),
            email: f.email.trim().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RouteFields {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Delivery Date", default)]
    pub delivery_date: Option<NaiveDate>,
    #[serde(rename = "Arrival Time", default)]
    pub arrival_time: Option<String>,
    #[serde(rename = "Delivery Volunteer", default)]
    pub volunteer_refs: Option<Vec<String>>,
    #[serde(rename = "Intake Tickets", default)]
    pub ticket_refs: Option<Vec<String>>,
}

impl FromRecord for Route {
    type Fields = RouteFields;

    fn from_fields(id: String, f: RouteFields) -> Self {
        Route {
            id,
            name: f.name,
            delivery_date: f.delivery_date,
            arrival_time: present(f.arrival_time),
            volunteer_refs: f.volunteer_refs.unwrap_or_default(),
            ticket_refs: f.ticket_refs.unwrap_or_default(),
        }
    }
}

/// Decode every record, failing on the first one that doesn't fit.
pub fn decode_all<T: FromRecord>(records: &[RawRecord]) -> Result<Vec<T>, StoreError> {
    records.iter().map(T::from_record).collect()
}
