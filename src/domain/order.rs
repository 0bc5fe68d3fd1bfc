use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::vehicle::Vehicle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Paid,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Only a pending order can move; paid and cancelled are terminal.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Paid)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "paid" => Ok(OrderStatus::Paid),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::Internal(format!(
                "unknown order status '{}'",
                other
            ))),
        }
    }
}

/// The authenticated user on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Order {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub customer_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_driver: bool,
    pub total: BigDecimal,
    pub status: OrderStatus,
    pub order_no: Option<String>,
    pub receipt: Option<String>,
    pub promo: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_by: String,
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn ensure_transition(&self, next: OrderStatus) -> Result<(), DomainError> {
        if self.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            })
        }
    }

    /// Rescheduling keeps the order in `pending`.
    pub fn ensure_pending(&self) -> Result<(), DomainError> {
        if self.status == OrderStatus::Pending {
            Ok(())
        } else {
            Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: OrderStatus::Pending.to_string(),
            })
        }
    }
}

/// Input for booking a vehicle.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub vehicle_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_driver: bool,
    pub promo: Option<String>,
}

/// Input for changing the period or driver option of a pending order.
#[derive(Debug, Clone)]
pub struct RescheduleRequest {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_driver: bool,
    pub promo: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub vehicle_id: Uuid,
    pub customer_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_driver: bool,
    pub total: BigDecimal,
    pub promo: Option<String>,
    pub created_by: String,
}

/// Partial update of an order; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct OrderChanges {
    pub status: Option<OrderStatus>,
    pub order_no: Option<String>,
    pub receipt: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub is_driver: Option<bool>,
    pub total: Option<BigDecimal>,
    /// `Some(None)` clears the promo.
    pub promo: Option<Option<String>>,
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub customer_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct CustomerRef {
    pub id: Uuid,
    pub name: String,
}

impl CustomerRef {
    /// The booking customer as recorded at creation time.
    pub fn from_order(order: &Order) -> Self {
        Self {
            id: order.customer_id,
            name: order.created_by.clone(),
        }
    }
}

/// Everything the invoice document needs about a paid order.
#[derive(Debug, Clone)]
pub struct InvoiceView {
    pub order: Order,
    pub vehicle: Vehicle,
    pub customer: CustomerRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEventKind {
    Created,
    Updated,
    Paid,
    Cancelled,
}

impl OrderEventKind {
    pub fn event_type(&self) -> &'static str {
        match self {
            OrderEventKind::Created => "OrderCreated",
            OrderEventKind::Updated => "OrderUpdated",
            OrderEventKind::Paid => "OrderPaid",
            OrderEventKind::Cancelled => "OrderCancelled",
        }
    }
}

/// Lifecycle event appended to the outbox alongside the state change.
#[derive(Debug, Clone)]
pub struct OrderEvent {
    pub kind: OrderEventKind,
    pub order_id: Uuid,
    pub payload: serde_json::Value,
}

impl OrderEvent {
    pub fn for_order(kind: OrderEventKind, order: &Order) -> Self {
        let payload = serde_json::json!({
            "order_id": order.id,
            "vehicle_id": order.vehicle_id,
            "customer_id": order.customer_id,
            "status": order.status.as_str(),
            "total": order.total.to_string(),
            "order_no": order.order_no,
            "start_time": order.start_time.to_rfc3339(),
            "end_time": order.end_time.to_rfc3339(),
        });
        Self {
            kind,
            order_id: order.id,
            payload,
        }
    }
}
