use bigdecimal::BigDecimal;
use uuid::Uuid;

use super::errors::DomainError;

#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: Uuid,
    pub name: String,
    pub daily_price: BigDecimal,
    pub requires_driver: bool,
    pub is_available: bool,
}

impl Vehicle {
    /// A chauffeured vehicle cannot be rented for self-drive.
    pub fn check_driver_policy(&self, is_driver: bool) -> Result<(), DomainError> {
        if self.requires_driver && !is_driver {
            return Err(DomainError::PolicyViolation(format!(
                "vehicle {} must be booked with a driver",
                self.id
            )));
        }
        Ok(())
    }
}
