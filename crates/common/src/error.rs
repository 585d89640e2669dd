use thiserror::Error;

/// Joins references for display, rendering an empty set as `none`.
fn refs(values: &[String]) -> String {
    if values.is_empty() {
        "none".to_string()
    } else {
        values.join(", ")
    }
}

/// A ticket does not reference exactly one delivery unit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Ticket {ticket_id} ({record_id}) does not have exactly one delivery unit: {}", refs(.units))]
pub struct GroupingError {
    pub record_id: String,
    pub ticket_id: String,
    pub units: Vec<String>,
}

/// A delivery unit does not resolve to exactly one volunteer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignmentError {
    #[error("Unit {unit} has no delivery volunteer")]
    Unassigned { unit: String },

    #[error("Unit {unit} has conflicting delivery volunteers: {}", refs(.volunteers))]
    Conflicting {
        unit: String,
        volunteers: Vec<String>,
    },

    #[error("Ticket {ticket} in unit {unit} doesn't have exactly one volunteer: {}", refs(.volunteers))]
    TicketVolunteer {
        unit: String,
        ticket: String,
        volunteers: Vec<String>,
    },
}

/// Failures talking to the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Record {record_id} could not be decoded: {detail}")]
    Decode { record_id: String, detail: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid store URL: {0}")]
    InvalidUrl(String),
}

/// The notification transport rejected or failed a send.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider rejected message with status {status}")]
    Rejected { status: u16, body: Option<String> },

    #[error("Transport not configured: {0}")]
    NotConfigured(String),
}

impl TransportError {
    /// Provider-supplied diagnostic body, if any.
    pub fn body(&self) -> Option<&str> {
        match self {
            TransportError::Rejected { body, .. } => body.as_deref(),
            _ => None,
        }
    }
}

/// Errors that abort a single delivery unit's pipeline.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Grouping error: {0}")]
    Grouping(#[from] GroupingError),

    #[error("Assignment error: {0}")]
    Assignment(#[from] AssignmentError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouping_error_names_ticket_and_refs() {
        let err = GroupingError {
            record_id: "rec1".to_string(),
            ticket_id: "T1".to_string(),
            units: vec!["c1".to_string(), "c2".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Ticket T1 (rec1) does not have exactly one delivery unit: c1, c2"
        );
    }

    #[test]
    fn test_assignment_error_lists_full_set() {
        let err = AssignmentError::Conflicting {
            unit: "Route 3".to_string(),
            volunteers: vec!["A".to_string(), "B".to_string()],
        };
        assert!(err.to_string().contains("Route 3"));
        assert!(err.to_string().contains("A, B"));

        let err = AssignmentError::TicketVolunteer {
            unit: "c1".to_string(),
            ticket: "T9".to_string(),
            volunteers: vec![],
        };
        assert!(err.to_string().ends_with("none"));
    }

    #[test]
    fn test_transport_error_body() {
        let err = TransportError::Rejected {
            status: 400,
            body: Some("{\"errors\":[]}".to_string()),
        };
        assert_eq!(err.body(), Some("{\"errors\":[]}"));
        assert_eq!(TransportError::NotConfigured("key".into()).body(), None);
    }

    #[test]
    fn test_app_error_from_assignment() {
        let err: AppError = AssignmentError::Unassigned {
            unit: "c1".to_string(),
        }
        .into();
        assert!(matches!(err, AppError::Assignment(_)));
        assert_eq!(
            err.to_string(),
            "Assignment error: Unit c1 has no delivery volunteer"
        );
    }
}
