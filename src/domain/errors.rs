use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("Vehicle {0} not found or is not available")]
    ResourceUnavailable(String),
    #[error("Policy violation: {0}")]
    PolicyViolation(String),
    #[error("Promo '{0}' not found or is not available")]
    PromoNotFound(String),
    #[error("Promo '{0}' has expired")]
    PromoExpired(String),
    #[error("Rental end time must be after its start time")]
    InvalidDuration,
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },
    #[error("Order {0} is not paid")]
    NotPaid(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Errors caused by the request itself rather than by a missing record,
    /// the system state or the infrastructure.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DomainError::PolicyViolation(_)
                | DomainError::PromoNotFound(_)
                | DomainError::PromoExpired(_)
                | DomainError::InvalidDuration
                | DomainError::NotPaid(_)
                | DomainError::InvalidInput(_)
        )
    }
}
