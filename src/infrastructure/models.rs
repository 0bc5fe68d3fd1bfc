use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderChanges};
use crate::domain::vehicle::Vehicle;
use crate::schema::{rental_order_outbox, rental_orders, vehicles};

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = vehicles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct VehicleRow {
    pub id: Uuid,
    pub name: String,
    pub daily_price: BigDecimal,
    pub requires_driver: bool,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<VehicleRow> for Vehicle {
    fn from(row: VehicleRow) -> Self {
        Vehicle {
            id: row.id,
            name: row.name,
            daily_price: row.daily_price,
            requires_driver: row.requires_driver,
            is_available: row.is_available,
        }
    }
}

#[derive(
    Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Associations,
)]
#[diesel(table_name = rental_orders)]
#[diesel(belongs_to(VehicleRow, foreign_key = vehicle_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub customer_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_driver: bool,
    pub total: BigDecimal,
    pub status: String,
    pub order_no: Option<String>,
    pub receipt: Option<String>,
    pub promo: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_by: String,
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = DomainError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            id: row.id,
            vehicle_id: row.vehicle_id,
            customer_id: row.customer_id,
            start_time: row.start_time,
            end_time: row.end_time,
            is_driver: row.is_driver,
            total: row.total,
            status: row.status.parse()?,
            order_no: row.order_no,
            receipt: row.receipt,
            promo: row.promo,
            paid_at: row.paid_at,
            created_by: row.created_by,
            updated_by: row.updated_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = rental_orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub customer_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_driver: bool,
    pub total: BigDecimal,
    pub status: String,
    pub promo: Option<String>,
    pub created_by: String,
    pub updated_by: String,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = rental_orders)]
pub struct OrderChangeset {
    pub status: Option<String>,
    pub order_no: Option<String>,
    pub receipt: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub is_driver: Option<bool>,
    pub total: Option<BigDecimal>,
    pub promo: Option<Option<String>>,
    pub updated_by: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl OrderChangeset {
    pub fn new(changes: OrderChanges, updated_at: DateTime<Utc>) -> Self {
        Self {
            status: changes.status.map(|s| s.as_str().to_string()),
            order_no: changes.order_no,
            receipt: changes.receipt,
            paid_at: changes.paid_at,
            start_time: changes.start_time,
            end_time: changes.end_time,
            is_driver: changes.is_driver,
            total: changes.total,
            promo: changes.promo,
            updated_by: changes.updated_by,
            updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = rental_order_outbox)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OutboxEventRow {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = rental_order_outbox)]
pub struct NewOutboxEventRow {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
}
