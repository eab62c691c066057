use chrono::NaiveDateTime;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("no account executive is available at {requested_time}")]
    AssignmentUnavailable { requested_time: NaiveDateTime },
    #[error("booking `{booking_id}` has no assigned account executive")]
    UnassignedBooking { booking_id: String },
    #[error("unrecognized requested time `{0}`")]
    InvalidRequestedTime(String),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("{entity} `{id}` not found")]
    NotFound { entity: &'static str, id: String },
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("conflict: {message}")]
    Conflict { message: String, correlation_id: String },
    #[error("not found: {message}")]
    NotFound { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &str {
        match self {
            Self::BadRequest { message, .. }
            | Self::Conflict { message, .. }
            | Self::NotFound { message, .. } => message,
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::Conflict { correlation_id, .. }
            | Self::NotFound { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::Conflict { correlation_id: id, .. }
            | InterfaceError::NotFound { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::Domain(DomainError::AssignmentUnavailable { .. }) => Self::Conflict {
                message: "No AE available at the requested time.".to_owned(),
                correlation_id,
            },
            ApplicationError::Domain(DomainError::UnassignedBooking { .. }) => {
                Self::BadRequest { message: "No AE assigned to booking".to_owned(), correlation_id }
            }
            ApplicationError::Domain(DomainError::InvalidRequestedTime(raw)) => Self::BadRequest {
                message: format!("Unrecognized preferred time `{raw}`."),
                correlation_id,
            },
            ApplicationError::Domain(DomainError::InvariantViolation(_)) => Self::BadRequest {
                message: "The request could not be processed. Check inputs and try again."
                    .to_owned(),
                correlation_id,
            },
            ApplicationError::NotFound { entity, .. } => {
                Self::NotFound { message: not_found_message(entity), correlation_id }
            }
            ApplicationError::Persistence(message) | ApplicationError::Integration(message) => {
                Self::ServiceUnavailable { message, correlation_id }
            }
            ApplicationError::Configuration(message) => Self::Internal { message, correlation_id },
        }
    }
}

fn not_found_message(entity: &str) -> String {
    match entity {
        "booking" => "Merchant booking not found".to_owned(),
        "prep_brief" => "Prep brief not found".to_owned(),
        "account_executive" => "Account executive not found".to_owned(),
        other => format!("{other} not found"),
    }
}
