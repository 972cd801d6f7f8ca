use thiserror::Error;
use validator::ValidationErrors;

/// Reasons a booking request is turned down. Everything here is detected before any
/// write takes place.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Requested time is not a bookable slot")]
    InvalidSlot,

    #[error("Slot is fully booked")]
    SlotFull,

    #[error("Patient already holds an upcoming booking for this service type")]
    DuplicateBooking,

    #[error("Service type not found: {0}")]
    ServiceTypeNotFound(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl AdmissionError {
    pub fn kind(&self) -> &'static str {
        match self {
            AdmissionError::MissingField(_) => "missing_field",
            AdmissionError::InvalidSlot => "invalid_slot",
            AdmissionError::SlotFull => "slot_full",
            AdmissionError::DuplicateBooking => "duplicate_booking",
            AdmissionError::ServiceTypeNotFound(_) => "service_type_not_found",
            AdmissionError::StoreUnavailable(_) => "store_unavailable",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::NotFound(_) => "not_found",
            StoreError::Conflict(_) => "conflict",
            StoreError::Unavailable(_) => "store_unavailable",
        }
    }
}

/// Store failures met on the admission path. A lost capacity race shows up as
/// `Conflict` on insert and is reported as `SlotFull`.
impl From<StoreError> for AdmissionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => AdmissionError::ServiceTypeNotFound(id),
            StoreError::Conflict(_) => AdmissionError::SlotFull,
            StoreError::Unavailable(msg) => AdmissionError::StoreUnavailable(msg),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Notification failed: {0}")]
pub struct NotifyError(pub String);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid service type: {0}")]
    Invalid(#[from] ValidationErrors),
}

/// Failures of the administrative operations.
#[derive(Error, Debug)]
pub enum AdminError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AdminError {
    pub fn kind(&self) -> &'static str {
        match self {
            AdminError::MissingField(_) => "missing_field",
            AdminError::InvalidInput(_) => "invalid_input",
            AdminError::Config(_) => "invalid_config",
            AdminError::Store(err) => err.kind(),
        }
    }
}
