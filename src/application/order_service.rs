use std::sync::Arc;

use uuid::Uuid;

use crate::domain::clock::{Clock, SystemClock};
use crate::domain::errors::DomainError;
use crate::domain::invoice::{day_bounds, invoice_number};
use crate::domain::order::{
    Actor, BookingRequest, InvoiceView, NewOrder, Order, OrderChanges, OrderEvent,
    OrderEventKind, OrderFilter, OrderStatus, RescheduleRequest,
};
use crate::domain::ports::RentalRepository;
use crate::domain::pricing::{compute_total, PromoCatalog};

/// Drives rental orders through `pending → paid | cancelled`.
pub struct OrderService<R> {
    repo: R,
    promos: Arc<PromoCatalog>,
    clock: Arc<dyn Clock>,
}

impl<R: RentalRepository> OrderService<R> {
    pub fn new(repo: R, promos: Arc<PromoCatalog>) -> Self {
        Self {
            repo,
            promos,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Books an available vehicle. The order insert and the vehicle lock
    /// commit together.
    pub fn create_order(
        &self,
        actor: &Actor,
        request: BookingRequest,
    ) -> Result<Order, DomainError> {
        let today = self.clock.now().date_naive();

        let order = self.repo.transaction(|uow| {
            let vehicle = uow
                .find_bookable(request.vehicle_id)?
                .ok_or_else(|| DomainError::ResourceUnavailable(request.vehicle_id.to_string()))?;

            vehicle.check_driver_policy(request.is_driver)?;

            let total = compute_total(
                request.start_time,
                request.end_time,
                &vehicle.daily_price,
                request.promo.as_deref(),
                &self.promos,
                today,
            )?;

            let order = uow.insert_order(NewOrder {
                vehicle_id: vehicle.id,
                customer_id: actor.id,
                start_time: request.start_time,
                end_time: request.end_time,
                is_driver: request.is_driver,
                total,
                promo: request.promo.clone(),
                created_by: actor.name.clone(),
            })?;
            uow.set_availability(vehicle.id, false)?;
            uow.record_event(OrderEvent::for_order(OrderEventKind::Created, &order))?;

            Ok(order)
        });

        match &order {
            Ok(order) => log::info!(
                "order {} created for vehicle {} by {} (total {})",
                order.id,
                order.vehicle_id,
                actor.id,
                order.total
            ),
            Err(e) => log::debug!(
                "order creation for vehicle {} rejected: {}",
                request.vehicle_id,
                e
            ),
        }
        order
    }

    /// Changes the period or driver option of a pending order and reprices it.
    pub fn update_order(
        &self,
        actor: &Actor,
        order_id: Uuid,
        request: RescheduleRequest,
    ) -> Result<Order, DomainError> {
        let today = self.clock.now().date_naive();

        let order = self.repo.transaction(|uow| {
            let order = uow
                .find_order_for_update(order_id)?
                .ok_or_else(|| DomainError::NotFound(format!("Order {}", order_id)))?;
            order.ensure_pending()?;

            let vehicle = uow
                .find_vehicle(order.vehicle_id)?
                .ok_or_else(|| DomainError::NotFound(format!("Vehicle {}", order.vehicle_id)))?;
            vehicle.check_driver_policy(request.is_driver)?;

            let total = compute_total(
                request.start_time,
                request.end_time,
                &vehicle.daily_price,
                request.promo.as_deref(),
                &self.promos,
                today,
            )?;

            let updated = uow.update_order(
                order.id,
                OrderChanges {
                    start_time: Some(request.start_time),
                    end_time: Some(request.end_time),
                    is_driver: Some(request.is_driver),
                    total: Some(total),
                    promo: Some(request.promo.clone()),
                    updated_by: Some(actor.name.clone()),
                    ..OrderChanges::default()
                },
            )?;
            uow.record_event(OrderEvent::for_order(OrderEventKind::Updated, &updated))?;

            Ok(updated)
        })?;

        log::info!("order {} rescheduled by {}", order.id, actor.id);
        Ok(order)
    }

    /// Confirms payment and assigns the next invoice number of the day.
    pub fn pay_order(
        &self,
        actor: &Actor,
        order_id: Uuid,
        receipt: String,
    ) -> Result<Order, DomainError> {
        let now = self.clock.now();
        let today = now.date_naive();

        let order = self.repo.transaction(|uow| {
            let order = uow
                .find_order_for_update(order_id)?
                .ok_or_else(|| DomainError::NotFound(format!("Order {}", order_id)))?;
            order.ensure_transition(OrderStatus::Paid)?;

            uow.lock_invoice_day(today)?;
            let (from, to) = day_bounds(today);
            let paid_today = uow.count_paid_between(from, to)?;
            let order_no = invoice_number(today, paid_today);

            let paid = uow.update_order(
                order.id,
                OrderChanges {
                    status: Some(OrderStatus::Paid),
                    order_no: Some(order_no),
                    receipt: Some(receipt),
                    paid_at: Some(now),
                    updated_by: Some(actor.name.clone()),
                    ..OrderChanges::default()
                },
            )?;
            uow.record_event(OrderEvent::for_order(OrderEventKind::Paid, &paid))?;

            Ok(paid)
        });

        match &order {
            Ok(order) => log::info!(
                "order {} paid as {}",
                order.id,
                order.order_no.as_deref().unwrap_or_default()
            ),
            Err(e) => log::debug!("payment of order {} rejected: {}", order_id, e),
        }
        order
    }

    /// Cancels a pending order and releases its vehicle.
    pub fn cancel_order(&self, actor: &Actor, order_id: Uuid) -> Result<Order, DomainError> {
        let order = self.repo.transaction(|uow| {
            let order = uow
                .find_order_for_update(order_id)?
                .ok_or_else(|| DomainError::NotFound(format!("Order {}", order_id)))?;
            order.ensure_transition(OrderStatus::Cancelled)?;

            let vehicle = uow
                .find_vehicle(order.vehicle_id)?
                .ok_or_else(|| DomainError::NotFound(format!("Vehicle {}", order.vehicle_id)))?;

            uow.set_availability(vehicle.id, true)?;
            let cancelled = uow.update_order(
                order.id,
                OrderChanges {
                    status: Some(OrderStatus::Cancelled),
                    updated_by: Some(actor.name.clone()),
                    ..OrderChanges::default()
                },
            )?;
            uow.record_event(OrderEvent::for_order(OrderEventKind::Cancelled, &cancelled))?;

            Ok(cancelled)
        });

        match &order {
            Ok(order) => log::info!(
                "order {} cancelled, vehicle {} released",
                order.id,
                order.vehicle_id
            ),
            Err(e) => log::debug!("cancellation of order {} rejected: {}", order_id, e),
        }
        order
    }

    pub fn get_order(&self, order_id: Uuid) -> Result<Option<Order>, DomainError> {
        self.repo.transaction(|uow| uow.find_order(order_id))
    }

    pub fn list_orders(&self) -> Result<Vec<Order>, DomainError> {
        self.repo.transaction(|uow| uow.list_orders(&OrderFilter::default()))
    }

    pub fn list_customer_orders(&self, customer_id: Uuid) -> Result<Vec<Order>, DomainError> {
        let filter = OrderFilter {
            customer_id: Some(customer_id),
        };
        self.repo.transaction(|uow| uow.list_orders(&filter))
    }

    /// The invoice projection of a paid order; unpaid orders are refused
    /// before any document is produced.
    pub fn invoice(&self, order_id: Uuid) -> Result<InvoiceView, DomainError> {
        let view = self
            .repo
            .transaction(|uow| uow.find_invoice(order_id))?
            .ok_or_else(|| DomainError::NotFound(format!("Order {}", order_id)))?;

        if view.order.status != OrderStatus::Paid {
            return Err(DomainError::NotPaid(order_id.to_string()));
        }
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Barrier;
    use std::thread;

    use bigdecimal::BigDecimal;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::*;
    use crate::domain::clock::FixedClock;
    use crate::domain::vehicle::Vehicle;
    use crate::infrastructure::memory::InMemoryRentalRepository;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 10, 8, 30, 0).unwrap()
    }

    fn actor() -> Actor {
        Actor {
            id: Uuid::new_v4(),
            name: "Budi Santoso".to_string(),
        }
    }

    fn vehicle(requires_driver: bool) -> Vehicle {
        Vehicle {
            id: Uuid::new_v4(),
            name: "Toyota Avanza".to_string(),
            daily_price: BigDecimal::from(100),
            requires_driver,
            is_available: true,
        }
    }

    fn service_with(vehicles: Vec<Vehicle>) -> OrderService<InMemoryRentalRepository> {
        let repo = InMemoryRentalRepository::new();
        for v in vehicles {
            repo.add_vehicle(v);
        }
        OrderService::new(repo, Arc::new(PromoCatalog::builtin()))
            .with_clock(Arc::new(FixedClock::new(now())))
    }

    fn booking(vehicle_id: Uuid, days: i64) -> BookingRequest {
        let start = now() + Duration::days(1);
        BookingRequest {
            vehicle_id,
            start_time: start,
            end_time: start + Duration::days(days),
            is_driver: false,
            promo: None,
        }
    }

    #[test]
    fn create_books_vehicle_and_starts_pending() {
        let v = vehicle(false);
        let service = service_with(vec![v.clone()]);

        let order = service.create_order(&actor(), booking(v.id, 2)).unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total, BigDecimal::from(200));
        assert!(order.order_no.is_none());
        assert!(!service.repository().vehicle(v.id).unwrap().is_available);
        assert_eq!(service.repository().event_types(), vec!["OrderCreated"]);
    }

    #[test]
    fn create_records_audit_fields_from_actor() {
        let v = vehicle(false);
        let service = service_with(vec![v.clone()]);
        let who = actor();

        let order = service.create_order(&who, booking(v.id, 1)).unwrap();

        assert_eq!(order.customer_id, who.id);
        assert_eq!(order.created_by, who.name);
        assert_eq!(order.updated_by, who.name);
    }

    #[test]
    fn create_applies_promo_discount() {
        let v = vehicle(false);
        let service = service_with(vec![v.clone()]);
        let mut request = booking(v.id, 2);
        request.promo = Some("NEWUSER".to_string());

        let order = service.create_order(&actor(), request).unwrap();

        assert_eq!(order.total, BigDecimal::from(150));
        assert_eq!(order.promo.as_deref(), Some("NEWUSER"));
    }

    #[test]
    fn driver_policy_violation_leaves_no_trace() {
        let v = vehicle(true);
        let service = service_with(vec![v.clone()]);

        let err = service
            .create_order(&actor(), booking(v.id, 2))
            .unwrap_err();

        assert!(matches!(err, DomainError::PolicyViolation(_)));
        assert!(service.repository().vehicle(v.id).unwrap().is_available);
        assert!(service.list_orders().unwrap().is_empty());
        assert!(service.repository().event_types().is_empty());
    }

    #[test]
    fn chauffeured_vehicle_books_with_driver() {
        let v = vehicle(true);
        let service = service_with(vec![v.clone()]);
        let mut request = booking(v.id, 1);
        request.is_driver = true;

        let order = service.create_order(&actor(), request).unwrap();
        assert!(order.is_driver);
    }

    #[test]
    fn booked_or_unknown_vehicle_is_unavailable() {
        let v = vehicle(false);
        let service = service_with(vec![v.clone()]);
        service.create_order(&actor(), booking(v.id, 1)).unwrap();

        let err = service
            .create_order(&actor(), booking(v.id, 1))
            .unwrap_err();
        assert!(matches!(err, DomainError::ResourceUnavailable(_)));

        let err = service
            .create_order(&actor(), booking(Uuid::new_v4(), 1))
            .unwrap_err();
        assert!(matches!(err, DomainError::ResourceUnavailable(_)));
    }

    #[test]
    fn pricing_failures_propagate_without_booking() {
        let v = vehicle(false);
        let service = service_with(vec![v.clone()]);

        let mut expired = booking(v.id, 1);
        expired.promo = Some("SEWASUKASUKA".to_string());
        let after_expiry = FixedClock::new(Utc.with_ymd_and_hms(2024, 11, 21, 0, 0, 0).unwrap());
        let service = service.with_clock(Arc::new(after_expiry));
        let err = service.create_order(&actor(), expired).unwrap_err();
        assert!(matches!(err, DomainError::PromoExpired(_)));

        let mut unknown = booking(v.id, 1);
        unknown.promo = Some("HALFOFF".to_string());
        let err = service.create_order(&actor(), unknown).unwrap_err();
        assert!(matches!(err, DomainError::PromoNotFound(_)));

        let mut inverted = booking(v.id, 1);
        inverted.end_time = inverted.start_time;
        let err = service.create_order(&actor(), inverted).unwrap_err();
        assert!(matches!(err, DomainError::InvalidDuration));

        assert!(service.repository().vehicle(v.id).unwrap().is_available);
        assert!(service.list_orders().unwrap().is_empty());
    }

    #[test]
    fn failed_vehicle_write_rolls_back_the_order() {
        let v = vehicle(false);
        let service = service_with(vec![v.clone()]);
        service.repository().fail_vehicle_writes(true);

        let err = service
            .create_order(&actor(), booking(v.id, 1))
            .unwrap_err();

        assert!(matches!(err, DomainError::Internal(_)));
        assert!(service.list_orders().unwrap().is_empty());
        assert!(service.repository().vehicle(v.id).unwrap().is_available);
        assert!(service.repository().event_types().is_empty());
    }

    #[test]
    fn failed_vehicle_release_rolls_back_the_cancel() {
        let v = vehicle(false);
        let service = service_with(vec![v.clone()]);
        let order = service.create_order(&actor(), booking(v.id, 1)).unwrap();
        service.repository().fail_vehicle_writes(true);

        let err = service.cancel_order(&actor(), order.id).unwrap_err();

        assert!(matches!(err, DomainError::Internal(_)));
        let reloaded = service.get_order(order.id).unwrap().unwrap();
        assert_eq!(reloaded.status, OrderStatus::Pending);
        assert!(!service.repository().vehicle(v.id).unwrap().is_available);
        assert_eq!(service.repository().event_types(), vec!["OrderCreated"]);

        service.repository().fail_vehicle_writes(false);
        let cancelled = service.cancel_order(&actor(), order.id).unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
    }

    #[test]
    fn payments_on_one_day_get_consecutive_invoice_numbers() {
        let (a, b) = (vehicle(false), vehicle(false));
        let service = service_with(vec![a.clone(), b.clone()]);
        let first = service.create_order(&actor(), booking(a.id, 1)).unwrap();
        let second = service.create_order(&actor(), booking(b.id, 1)).unwrap();

        let first = service
            .pay_order(&actor(), first.id, "TRX-001".to_string())
            .unwrap();
        let second = service
            .pay_order(&actor(), second.id, "TRX-002".to_string())
            .unwrap();

        assert_eq!(first.status, OrderStatus::Paid);
        assert_eq!(first.order_no.as_deref(), Some("INV/2024/11/10/0"));
        assert_eq!(second.order_no.as_deref(), Some("INV/2024/11/10/1"));
        assert_eq!(first.receipt.as_deref(), Some("TRX-001"));
        assert_eq!(first.paid_at, Some(now()));
    }

    #[test]
    fn invoice_sequence_restarts_on_a_new_day() {
        let (a, b) = (vehicle(false), vehicle(false));
        let service = service_with(vec![a.clone(), b.clone()]);
        let first = service.create_order(&actor(), booking(a.id, 1)).unwrap();
        let second = service.create_order(&actor(), booking(b.id, 1)).unwrap();
        service
            .pay_order(&actor(), first.id, "TRX-001".to_string())
            .unwrap();

        let tomorrow = service.with_clock(Arc::new(FixedClock::new(now() + Duration::days(1))));
        let second = tomorrow
            .pay_order(&actor(), second.id, "TRX-002".to_string())
            .unwrap();

        assert_eq!(second.order_no.as_deref(), Some("INV/2024/11/11/0"));
    }

    #[test]
    fn paying_twice_or_after_cancel_is_rejected() {
        let (a, b) = (vehicle(false), vehicle(false));
        let service = service_with(vec![a.clone(), b.clone()]);
        let paid = service.create_order(&actor(), booking(a.id, 1)).unwrap();
        let cancelled = service.create_order(&actor(), booking(b.id, 1)).unwrap();
        service
            .pay_order(&actor(), paid.id, "TRX-001".to_string())
            .unwrap();
        service.cancel_order(&actor(), cancelled.id).unwrap();

        let err = service
            .pay_order(&actor(), paid.id, "TRX-002".to_string())
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidStateTransition { .. }));

        let err = service
            .pay_order(&actor(), cancelled.id, "TRX-003".to_string())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid state transition from cancelled to paid"
        );
        let reloaded = service.get_order(cancelled.id).unwrap().unwrap();
        assert!(reloaded.order_no.is_none());
    }

    #[test]
    fn paying_unknown_order_is_not_found() {
        let service = service_with(vec![]);
        let err = service
            .pay_order(&actor(), Uuid::new_v4(), "TRX".to_string())
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn cancel_releases_vehicle() {
        let v = vehicle(false);
        let service = service_with(vec![v.clone()]);
        let order = service.create_order(&actor(), booking(v.id, 1)).unwrap();

        let cancelled = service.cancel_order(&actor(), order.id).unwrap();

        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert!(service.repository().vehicle(v.id).unwrap().is_available);
        assert_eq!(
            service.repository().event_types(),
            vec!["OrderCreated", "OrderCancelled"]
        );
    }

    #[test]
    fn cancel_of_unknown_order_changes_nothing() {
        let v = vehicle(false);
        let service = service_with(vec![v.clone()]);
        let order = service.create_order(&actor(), booking(v.id, 1)).unwrap();

        let err = service.cancel_order(&actor(), Uuid::new_v4()).unwrap_err();

        assert!(matches!(err, DomainError::NotFound(_)));
        assert!(!service.repository().vehicle(v.id).unwrap().is_available);
        let reloaded = service.get_order(order.id).unwrap().unwrap();
        assert_eq!(reloaded.status, OrderStatus::Pending);
    }

    #[test]
    fn repeated_cancel_does_not_release_a_rebooked_vehicle() {
        let v = vehicle(false);
        let service = service_with(vec![v.clone()]);
        let first = service.create_order(&actor(), booking(v.id, 1)).unwrap();
        service.cancel_order(&actor(), first.id).unwrap();
        let second = service.create_order(&actor(), booking(v.id, 1)).unwrap();

        let err = service.cancel_order(&actor(), first.id).unwrap_err();

        assert!(matches!(err, DomainError::InvalidStateTransition { .. }));
        assert!(!service.repository().vehicle(v.id).unwrap().is_available);
        let second = service.get_order(second.id).unwrap().unwrap();
        assert_eq!(second.status, OrderStatus::Pending);
    }

    #[test]
    fn paid_order_cannot_be_cancelled() {
        let v = vehicle(false);
        let service = service_with(vec![v.clone()]);
        let order = service.create_order(&actor(), booking(v.id, 1)).unwrap();
        service
            .pay_order(&actor(), order.id, "TRX".to_string())
            .unwrap();

        let err = service.cancel_order(&actor(), order.id).unwrap_err();

        assert!(matches!(err, DomainError::InvalidStateTransition { .. }));
        assert!(!service.repository().vehicle(v.id).unwrap().is_available);
    }

    #[test]
    fn racing_creates_book_the_vehicle_once() {
        let v = vehicle(false);
        let service = Arc::new(service_with(vec![v.clone()]));
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let service = Arc::clone(&service);
                let barrier = Arc::clone(&barrier);
                let request = booking(v.id, 1);
                thread::spawn(move || {
                    barrier.wait();
                    service.create_order(&actor(), request)
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(DomainError::ResourceUnavailable(_))))
                .count(),
            1
        );
        assert_eq!(service.list_orders().unwrap().len(), 1);
    }

    #[test]
    fn reschedule_reprices_pending_order() {
        let v = vehicle(false);
        let service = service_with(vec![v.clone()]);
        let order = service.create_order(&actor(), booking(v.id, 1)).unwrap();
        let editor = Actor {
            id: order.customer_id,
            name: "Admin".to_string(),
        };

        let updated = service
            .update_order(
                &editor,
                order.id,
                RescheduleRequest {
                    start_time: order.start_time,
                    end_time: order.start_time + Duration::hours(60),
                    is_driver: true,
                    promo: Some("NEWUSER".to_string()),
                },
            )
            .unwrap();

        assert_eq!(updated.total, BigDecimal::from_str("187.50").unwrap());
        assert!(updated.is_driver);
        assert_eq!(updated.updated_by, "Admin");
        assert_eq!(updated.status, OrderStatus::Pending);
    }

    #[test]
    fn reschedule_keeps_driver_policy_and_state_guard() {
        let v = vehicle(true);
        let service = service_with(vec![v.clone()]);
        let mut request = booking(v.id, 1);
        request.is_driver = true;
        let order = service.create_order(&actor(), request).unwrap();

        let self_drive = RescheduleRequest {
            start_time: order.start_time,
            end_time: order.end_time,
            is_driver: false,
            promo: None,
        };
        let err = service
            .update_order(&actor(), order.id, self_drive.clone())
            .unwrap_err();
        assert!(matches!(err, DomainError::PolicyViolation(_)));

        service.cancel_order(&actor(), order.id).unwrap();
        let err = service
            .update_order(
                &actor(),
                order.id,
                RescheduleRequest {
                    is_driver: true,
                    ..self_drive
                },
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidStateTransition { .. }));
    }

    #[test]
    fn lists_only_the_customers_orders() {
        let (a, b) = (vehicle(false), vehicle(false));
        let service = service_with(vec![a.clone(), b.clone()]);
        let alice = actor();
        let bob = actor();
        let mine = service.create_order(&alice, booking(a.id, 1)).unwrap();
        service.create_order(&bob, booking(b.id, 1)).unwrap();

        let orders = service.list_customer_orders(alice.id).unwrap();

        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, mine.id);
        assert_eq!(service.list_orders().unwrap().len(), 2);
    }

    #[test]
    fn invoice_requires_payment() {
        let v = vehicle(false);
        let service = service_with(vec![v.clone()]);
        let who = actor();
        let order = service.create_order(&who, booking(v.id, 2)).unwrap();

        let err = service.invoice(order.id).unwrap_err();
        assert!(matches!(err, DomainError::NotPaid(_)));

        service
            .pay_order(&who, order.id, "TRX".to_string())
            .unwrap();
        let view = service.invoice(order.id).unwrap();
        assert_eq!(view.order.order_no.as_deref(), Some("INV/2024/11/10/0"));
        assert_eq!(view.vehicle.id, v.id);
        assert_eq!(view.customer.id, who.id);
        assert_eq!(view.customer.name, who.name);

        let err = service.invoice(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
