use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::order::{InvoiceView, NewOrder, Order, OrderChanges, OrderEvent, OrderFilter};
use super::vehicle::Vehicle;

pub trait VehicleAvailability {
    /// Returns the vehicle only while it is available. Implementations lock
    /// the vehicle until the surrounding unit of work ends.
    fn find_bookable(&mut self, vehicle_id: Uuid) -> Result<Option<Vehicle>, DomainError>;
    fn find_vehicle(&mut self, vehicle_id: Uuid) -> Result<Option<Vehicle>, DomainError>;
    fn set_availability(&mut self, vehicle_id: Uuid, available: bool) -> Result<(), DomainError>;
}

pub trait OrderStore {
    fn insert_order(&mut self, order: NewOrder) -> Result<Order, DomainError>;
    fn find_order(&mut self, id: Uuid) -> Result<Option<Order>, DomainError>;
    /// Like `find_order`, but holds the order until the unit of work ends.
    fn find_order_for_update(&mut self, id: Uuid) -> Result<Option<Order>, DomainError>;
    fn update_order(&mut self, id: Uuid, changes: OrderChanges) -> Result<Order, DomainError>;
    /// Newest first.
    fn list_orders(&mut self, filter: &OrderFilter) -> Result<Vec<Order>, DomainError>;
    fn count_paid_between(
        &mut self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, DomainError>;
    /// Serializes invoice numbering for `day` until the unit of work ends.
    fn lock_invoice_day(&mut self, day: NaiveDate) -> Result<(), DomainError>;
    fn record_event(&mut self, event: OrderEvent) -> Result<(), DomainError>;
    fn find_invoice(&mut self, order_id: Uuid) -> Result<Option<InvoiceView>, DomainError>;
}

/// Every operation of a single atomic unit of work.
pub trait RentalUnitOfWork: VehicleAvailability + OrderStore {}

impl<T: VehicleAvailability + OrderStore> RentalUnitOfWork for T {}

pub trait RentalRepository: Send + Sync + 'static {
    /// Runs `work` atomically: its writes commit together when it returns
    /// `Ok` and are discarded when it returns `Err`.
    fn transaction<T, F>(&self, work: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn RentalUnitOfWork) -> Result<T, DomainError>;
}

/// Document generation for paid orders.
pub trait InvoiceRenderer: Send + Sync + 'static {
    fn content_type(&self) -> &'static str;
    fn file_extension(&self) -> &'static str;
    fn render(&self, invoice: &InvoiceView) -> Vec<u8>;
}
