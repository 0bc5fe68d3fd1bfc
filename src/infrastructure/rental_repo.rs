use chrono::{DateTime, Datelike, NaiveDate, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    CustomerRef, InvoiceView, NewOrder, Order, OrderChanges, OrderEvent, OrderFilter, OrderStatus,
};
use crate::domain::ports::{OrderStore, RentalRepository, RentalUnitOfWork, VehicleAvailability};
use crate::domain::vehicle::Vehicle;
use crate::schema::{rental_order_outbox, rental_orders, vehicles};

use super::models::{NewOrderRow, NewOutboxEventRow, OrderChangeset, OrderRow, VehicleRow};

const AGGREGATE_TYPE: &str = "RentalOrder";

/// High bits of the advisory lock key that serializes invoice numbering.
const INVOICE_LOCK_NAMESPACE: i64 = 0x494E_5600_0000_0000;

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselRentalRepository {
    pool: DbPool,
}

impl DieselRentalRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl RentalRepository for DieselRentalRepository {
    fn transaction<T, F>(&self, work: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn RentalUnitOfWork) -> Result<T, DomainError>,
    {
        let mut pooled = self.pool.get()?;
        let conn: &mut PgConnection = &mut pooled;
        conn.transaction::<_, DomainError, _>(|conn| work(&mut PgUnitOfWork { conn }))
    }
}

/// One PostgreSQL transaction; dropped before commit or rollback.
struct PgUnitOfWork<'c> {
    conn: &'c mut PgConnection,
}

impl VehicleAvailability for PgUnitOfWork<'_> {
    fn find_bookable(&mut self, vehicle_id: Uuid) -> Result<Option<Vehicle>, DomainError> {
        // Row lock: a concurrent booking waits here and then sees the flag
        // already cleared.
        let row = vehicles::table
            .filter(vehicles::id.eq(vehicle_id))
            .filter(vehicles::is_available.eq(true))
            .select(VehicleRow::as_select())
            .for_update()
            .first(self.conn)
            .optional()?;
        Ok(row.map(Vehicle::from))
    }

    fn find_vehicle(&mut self, vehicle_id: Uuid) -> Result<Option<Vehicle>, DomainError> {
        let row = vehicles::table
            .filter(vehicles::id.eq(vehicle_id))
            .select(VehicleRow::as_select())
            .for_update()
            .first(self.conn)
            .optional()?;
        Ok(row.map(Vehicle::from))
    }

    fn set_availability(&mut self, vehicle_id: Uuid, available: bool) -> Result<(), DomainError> {
        let updated = diesel::update(vehicles::table.find(vehicle_id))
            .set((
                vehicles::is_available.eq(available),
                vehicles::updated_at.eq(Utc::now()),
            ))
            .execute(self.conn)?;
        if updated == 0 {
            return Err(DomainError::NotFound(format!("Vehicle {}", vehicle_id)));
        }
        Ok(())
    }
}

impl OrderStore for PgUnitOfWork<'_> {
    fn insert_order(&mut self, order: NewOrder) -> Result<Order, DomainError> {
        let row = diesel::insert_into(rental_orders::table)
            .values(&NewOrderRow {
                id: Uuid::new_v4(),
                vehicle_id: order.vehicle_id,
                customer_id: order.customer_id,
                start_time: order.start_time,
                end_time: order.end_time,
                is_driver: order.is_driver,
                total: order.total,
                status: OrderStatus::Pending.as_str().to_string(),
                promo: order.promo,
                updated_by: order.created_by.clone(),
                created_by: order.created_by,
            })
            .returning(OrderRow::as_returning())
            .get_result(self.conn)?;
        Order::try_from(row)
    }

    fn find_order(&mut self, id: Uuid) -> Result<Option<Order>, DomainError> {
        rental_orders::table
            .filter(rental_orders::id.eq(id))
            .select(OrderRow::as_select())
            .first(self.conn)
            .optional()?
            .map(Order::try_from)
            .transpose()
    }

    fn find_order_for_update(&mut self, id: Uuid) -> Result<Option<Order>, DomainError> {
        rental_orders::table
            .filter(rental_orders::id.eq(id))
            .select(OrderRow::as_select())
            .for_update()
            .first(self.conn)
            .optional()?
            .map(Order::try_from)
            .transpose()
    }

    fn update_order(&mut self, id: Uuid, changes: OrderChanges) -> Result<Order, DomainError> {
        let row = diesel::update(rental_orders::table.find(id))
            .set(OrderChangeset::new(changes, Utc::now()))
            .returning(OrderRow::as_returning())
            .get_result(self.conn)
            .optional()?
            .ok_or_else(|| DomainError::NotFound(format!("Order {}", id)))?;
        Order::try_from(row)
    }

    fn list_orders(&mut self, filter: &OrderFilter) -> Result<Vec<Order>, DomainError> {
        let mut query = rental_orders::table
            .select(OrderRow::as_select())
            .order(rental_orders::created_at.desc())
            .into_boxed();
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(rental_orders::customer_id.eq(customer_id));
        }

        query
            .load(self.conn)?
            .into_iter()
            .map(Order::try_from)
            .collect()
    }

    fn count_paid_between(
        &mut self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, DomainError> {
        let count = rental_orders::table
            .filter(rental_orders::paid_at.ge(from))
            .filter(rental_orders::paid_at.lt(to))
            .count()
            .get_result(self.conn)?;
        Ok(count)
    }

    fn lock_invoice_day(&mut self, day: NaiveDate) -> Result<(), DomainError> {
        diesel::sql_query("SELECT pg_advisory_xact_lock($1)")
            .bind::<BigInt, _>(INVOICE_LOCK_NAMESPACE + i64::from(day.num_days_from_ce()))
            .execute(self.conn)?;
        Ok(())
    }

    fn record_event(&mut self, event: OrderEvent) -> Result<(), DomainError> {
        diesel::insert_into(rental_order_outbox::table)
            .values(&NewOutboxEventRow {
                id: Uuid::new_v4(),
                aggregate_type: AGGREGATE_TYPE.to_string(),
                aggregate_id: event.order_id.to_string(),
                event_type: event.kind.event_type().to_string(),
                payload: event.payload,
            })
            .execute(self.conn)?;
        Ok(())
    }

    fn find_invoice(&mut self, order_id: Uuid) -> Result<Option<InvoiceView>, DomainError> {
        let row = rental_orders::table
            .inner_join(vehicles::table)
            .filter(rental_orders::id.eq(order_id))
            .select((OrderRow::as_select(), VehicleRow::as_select()))
            .first::<(OrderRow, VehicleRow)>(self.conn)
            .optional()?;

        let Some((order, vehicle)) = row else {
            return Ok(None);
        };
        let order = Order::try_from(order)?;
        Ok(Some(InvoiceView {
            customer: CustomerRef::from_order(&order),
            vehicle: vehicle.into(),
            order,
        }))
    }
}
