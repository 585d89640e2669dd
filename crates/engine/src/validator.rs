//! Assignment validator. Every delivery unit must resolve to exactly one volunteer.
//!
//! A unit that resolves to no volunteer, or to more than one, is rejected
//! before anything is rendered so that nobody receives another volunteer's
//! stops.

use std::collections::BTreeSet;

use courier_common::error::{AppError, AssignmentError};
use courier_common::types::{Assignment, DeliveryUnit, Volunteer};
use courier_store::RecordStore;

fn distinct(refs: &[String]) -> BTreeSet<&str> {
    refs.iter().map(String::as_str).collect()
}

fn exactly_one(unit: &DeliveryUnit, volunteers: BTreeSet<&str>) -> Result<String, AssignmentError> {
    let mut iter = volunteers.iter();
    match (iter.next(), iter.next()) {
        (Some(only), None) => Ok(only.to_string()),
        (None, _) => Err(AssignmentError::Unassigned {
            unit: unit.name.clone(),
        }),
        (Some(_), Some(_)) => Err(AssignmentError::Conflicting {
            unit: unit.name.clone(),
            volunteers: volunteers.iter().map(|v| v.to_string()).collect(),
        }),
    }
}

/// Resolve the single volunteer reference for `unit` without touching the store.
pub fn volunteer_ref(unit: &DeliveryUnit) -> Result<String, AssignmentError> {
    match &unit.assignment {
        Assignment::Preassigned(refs) => exactly_one(unit, distinct(refs)),
        Assignment::FromTickets => {
            let mut volunteers = BTreeSet::new();
            for ticket in &unit.tickets {
                let refs = distinct(&ticket.volunteer_refs);
                if refs.len() != 1 {
                    return Err(AssignmentError::TicketVolunteer {
                        unit: unit.name.clone(),
                        ticket: ticket.ticket_id.clone(),
                        volunteers: refs.iter().map(|v| v.to_string()).collect(),
                    });
                }
                volunteers.extend(refs);
            }
            exactly_one(unit, volunteers)
        }
    }
}

/// Resolve and fetch the volunteer responsible for `unit`.
pub async fn resolve_volunteer(
    store: &dyn RecordStore,
    unit: &DeliveryUnit,
) -> Result<Volunteer, AppError> {
    let id = volunteer_ref(unit)?;
    let volunteer = store.volunteer(&id).await?;

    tracing::debug!(unit = %unit.name, volunteer = %volunteer.id, "Resolved delivery volunteer");
    Ok(volunteer)
}
