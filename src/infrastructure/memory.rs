use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{
    CustomerRef, InvoiceView, NewOrder, Order, OrderChanges, OrderEvent, OrderFilter, OrderStatus,
};
use crate::domain::ports::{OrderStore, RentalRepository, RentalUnitOfWork, VehicleAvailability};
use crate::domain::vehicle::Vehicle;

#[derive(Debug, Clone, Default)]
struct RentalState {
    vehicles: HashMap<Uuid, Vehicle>,
    orders: HashMap<Uuid, Order>,
    events: Vec<OrderEvent>,
}

/// Process-local repository. A transaction holds the lock for its whole
/// duration and works on a copy that replaces the state only on success.
#[derive(Debug, Default)]
pub struct InMemoryRentalRepository {
    state: Mutex<RentalState>,
    fail_vehicle_writes: AtomicBool,
}

impl InMemoryRentalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vehicle(&self, vehicle: Vehicle) {
        self.lock().vehicles.insert(vehicle.id, vehicle);
    }

    pub fn vehicle(&self, vehicle_id: Uuid) -> Option<Vehicle> {
        self.lock().vehicles.get(&vehicle_id).cloned()
    }

    /// Event types recorded so far, oldest first.
    pub fn event_types(&self) -> Vec<&'static str> {
        self.lock()
            .events
            .iter()
            .map(|e| e.kind.event_type())
            .collect()
    }

    /// Makes every availability write fail, to exercise rollback.
    pub fn fail_vehicle_writes(&self, fail: bool) {
        self.fail_vehicle_writes.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> MutexGuard<'_, RentalState> {
        // A panic inside a transaction never leaves a half-applied state
        // behind, so a poisoned lock is still consistent.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RentalRepository for InMemoryRentalRepository {
    fn transaction<T, F>(&self, work: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn RentalUnitOfWork) -> Result<T, DomainError>,
    {
        let mut guard = self.lock();
        let mut uow = MemoryUnitOfWork {
            state: guard.clone(),
            fail_vehicle_writes: self.fail_vehicle_writes.load(Ordering::SeqCst),
        };
        let out = work(&mut uow)?;
        *guard = uow.state;
        Ok(out)
    }
}

struct MemoryUnitOfWork {
    state: RentalState,
    fail_vehicle_writes: bool,
}

impl VehicleAvailability for MemoryUnitOfWork {
    fn find_bookable(&mut self, vehicle_id: Uuid) -> Result<Option<Vehicle>, DomainError> {
        Ok(self
            .state
            .vehicles
            .get(&vehicle_id)
            .filter(|v| v.is_available)
            .cloned())
    }

    fn find_vehicle(&mut self, vehicle_id: Uuid) -> Result<Option<Vehicle>, DomainError> {
        Ok(self.state.vehicles.get(&vehicle_id).cloned())
    }

    fn set_availability(&mut self, vehicle_id: Uuid, available: bool) -> Result<(), DomainError> {
        if self.fail_vehicle_writes {
            return Err(DomainError::Internal("vehicle store unavailable".to_string()));
        }
        let vehicle = self
            .state
            .vehicles
            .get_mut(&vehicle_id)
            .ok_or_else(|| DomainError::NotFound(format!("Vehicle {}", vehicle_id)))?;
        vehicle.is_available = available;
        Ok(())
    }
}

impl OrderStore for MemoryUnitOfWork {
    fn insert_order(&mut self, order: NewOrder) -> Result<Order, DomainError> {
        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            vehicle_id: order.vehicle_id,
            customer_id: order.customer_id,
            start_time: order.start_time,
            end_time: order.end_time,
            is_driver: order.is_driver,
            total: order.total,
            status: OrderStatus::Pending,
            order_no: None,
            receipt: None,
            promo: order.promo,
            paid_at: None,
            updated_by: order.created_by.clone(),
            created_by: order.created_by,
            created_at: now,
            updated_at: now,
        };
        self.state.orders.insert(order.id, order.clone());
        Ok(order)
    }

    fn find_order(&mut self, id: Uuid) -> Result<Option<Order>, DomainError> {
        Ok(self.state.orders.get(&id).cloned())
    }

    fn find_order_for_update(&mut self, id: Uuid) -> Result<Option<Order>, DomainError> {
        self.find_order(id)
    }

    fn update_order(&mut self, id: Uuid, changes: OrderChanges) -> Result<Order, DomainError> {
        let order = self
            .state
            .orders
            .get_mut(&id)
            .ok_or_else(|| DomainError::NotFound(format!("Order {}", id)))?;

        if let Some(status) = changes.status {
            order.status = status;
        }
        if let Some(order_no) = changes.order_no {
            order.order_no = Some(order_no);
        }
        if let Some(receipt) = changes.receipt {
            order.receipt = Some(receipt);
        }
        if let Some(paid_at) = changes.paid_at {
            order.paid_at = Some(paid_at);
        }
        if let Some(start_time) = changes.start_time {
            order.start_time = start_time;
        }
        if let Some(end_time) = changes.end_time {
            order.end_time = end_time;
        }
        if let Some(is_driver) = changes.is_driver {
            order.is_driver = is_driver;
        }
        if let Some(total) = changes.total {
            order.total = total;
        }
        if let Some(promo) = changes.promo {
            order.promo = promo;
        }
        if let Some(updated_by) = changes.updated_by {
            order.updated_by = updated_by;
        }
        order.updated_at = Utc::now();

        Ok(order.clone())
    }

    fn list_orders(&mut self, filter: &OrderFilter) -> Result<Vec<Order>, DomainError> {
        let mut orders: Vec<Order> = self
            .state
            .orders
            .values()
            .filter(|o| filter.customer_id.map_or(true, |c| o.customer_id == c))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    fn count_paid_between(
        &mut self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, DomainError> {
        let count = self
            .state
            .orders
            .values()
            .filter(|o| o.paid_at.is_some_and(|at| at >= from && at < to))
            .count();
        Ok(count as i64)
    }

    fn lock_invoice_day(&mut self, _day: NaiveDate) -> Result<(), DomainError> {
        // The repository lock already serializes transactions.
        Ok(())
    }

    fn record_event(&mut self, event: OrderEvent) -> Result<(), DomainError> {
        self.state.events.push(event);
        Ok(())
    }

    fn find_invoice(&mut self, order_id: Uuid) -> Result<Option<InvoiceView>, DomainError> {
        let Some(order) = self.state.orders.get(&order_id).cloned() else {
            return Ok(None);
        };
        let vehicle = self
            .state
            .vehicles
            .get(&order.vehicle_id)
            .cloned()
            .ok_or_else(|| DomainError::NotFound(format!("Vehicle {}", order.vehicle_id)))?;
        Ok(Some(InvoiceView {
            customer: CustomerRef::from_order(&order),
            vehicle,
            order,
        }))
    }
}
