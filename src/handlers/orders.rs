use actix_web::http::header;
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::order_service::OrderService;
use crate::domain::order::{Actor, BookingRequest, Order, RescheduleRequest};
use crate::domain::ports::{InvoiceRenderer, RentalRepository};
use crate::errors::AppError;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub vehicle_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Whether a chauffeur is booked with the vehicle.
    pub is_driver: bool,
    /// Promo title, matched exactly.
    #[serde(default)]
    pub promo: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RescheduleOrderRequest {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_driver: bool,
    #[serde(default)]
    pub promo: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentRequest {
    /// Payment reference from the payment provider.
    pub receipt: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub customer_id: Uuid,
    pub start_time: String,
    pub end_time: String,
    pub is_driver: bool,
    /// Decimal amount as a string, e.g. "150.00"
    pub total: String,
    pub status: String,
    pub order_no: Option<String>,
    pub receipt: Option<String>,
    pub promo: Option<String>,
    pub paid_at: Option<String>,
    pub created_by: String,
    pub updated_by: String,
    pub created_at: String,
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        Self {
            id: o.id,
            vehicle_id: o.vehicle_id,
            customer_id: o.customer_id,
            start_time: o.start_time.to_rfc3339(),
            end_time: o.end_time.to_rfc3339(),
            is_driver: o.is_driver,
            total: o.total.to_string(),
            status: o.status.to_string(),
            order_no: o.order_no,
            receipt: o.receipt,
            promo: o.promo,
            paid_at: o.paid_at.map(|t| t.to_rfc3339()),
            created_by: o.created_by,
            updated_by: o.updated_by,
            created_at: o.created_at.to_rfc3339(),
        }
    }
}

fn blocking_error(e: actix_web::error::BlockingError) -> AppError {
    AppError::Internal(e.to_string())
}

fn empty_promo_as_none(promo: Option<String>) -> Option<String> {
    promo.filter(|p| !p.trim().is_empty())
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Books an available vehicle for the acting customer. The order and the
/// vehicle's availability change are committed in one transaction.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderResponse),
        (status = 400, description = "Driver policy, promo or period rejected"),
        (status = 401, description = "Missing user identity"),
        (status = 409, description = "Vehicle not available"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn create_order<R: RentalRepository>(
    service: web::Data<OrderService<R>>,
    actor: Actor,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let request = BookingRequest {
        vehicle_id: body.vehicle_id,
        start_time: body.start_time,
        end_time: body.end_time,
        is_driver: body.is_driver,
        promo: empty_promo_as_none(body.promo),
    };

    let order = web::block(move || service.create_order(&actor, request))
        .await
        .map_err(blocking_error)??;

    Ok(HttpResponse::Created().json(OrderResponse::from(order)))
}

/// GET /orders
///
/// Returns every order, newest first.
#[utoipa::path(
    get,
    path = "/orders",
    responses(
        (status = 200, description = "All orders", body = Vec<OrderResponse>),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_orders<R: RentalRepository>(
    service: web::Data<OrderService<R>>,
) -> Result<HttpResponse, AppError> {
    let orders = web::block(move || service.list_orders())
        .await
        .map_err(blocking_error)??;

    let items: Vec<OrderResponse> = orders.into_iter().map(OrderResponse::from).collect();
    Ok(HttpResponse::Ok().json(items))
}

/// GET /orders/mine
///
/// Returns the acting customer's orders, newest first.
#[utoipa::path(
    get,
    path = "/orders/mine",
    responses(
        (status = 200, description = "The caller's orders", body = Vec<OrderResponse>),
        (status = 401, description = "Missing user identity"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn my_orders<R: RentalRepository>(
    service: web::Data<OrderService<R>>,
    actor: Actor,
) -> Result<HttpResponse, AppError> {
    let orders = web::block(move || service.list_customer_orders(actor.id))
        .await
        .map_err(blocking_error)??;

    let items: Vec<OrderResponse> = orders.into_iter().map(OrderResponse::from).collect();
    Ok(HttpResponse::Ok().json(items))
}

/// GET /orders/{id}
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order<R: RentalRepository>(
    service: web::Data<OrderService<R>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let order = web::block(move || service.get_order(order_id))
        .await
        .map_err(blocking_error)??;

    match order {
        Some(order) => Ok(HttpResponse::Ok().json(OrderResponse::from(order))),
        None => Err(AppError::NotFound(format!("Order {} not found", order_id))),
    }
}

/// PUT /orders/{id}
///
/// Changes the period, driver option or promo of a pending order and
/// recomputes its total.
#[utoipa::path(
    put,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    request_body = RescheduleOrderRequest,
    responses(
        (status = 200, description = "Order updated", body = OrderResponse),
        (status = 400, description = "Driver policy, promo or period rejected"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order is no longer pending"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn update_order<R: RentalRepository>(
    service: web::Data<OrderService<R>>,
    actor: Actor,
    path: web::Path<Uuid>,
    body: web::Json<RescheduleOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let body = body.into_inner();
    let request = RescheduleRequest {
        start_time: body.start_time,
        end_time: body.end_time,
        is_driver: body.is_driver,
        promo: empty_promo_as_none(body.promo),
    };

    let order = web::block(move || service.update_order(&actor, order_id, request))
        .await
        .map_err(blocking_error)??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// PUT /orders/{id}/payment
///
/// Records the payment receipt and assigns the invoice number.
#[utoipa::path(
    put,
    path = "/orders/{id}/payment",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    request_body = PaymentRequest,
    responses(
        (status = 200, description = "Order paid", body = OrderResponse),
        (status = 400, description = "Receipt missing"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order is not pending"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn pay_order<R: RentalRepository>(
    service: web::Data<OrderService<R>>,
    actor: Actor,
    path: web::Path<Uuid>,
    body: web::Json<PaymentRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let receipt = body.into_inner().receipt.trim().to_string();
    if receipt.is_empty() {
        return Err(AppError::BadRequest("receipt must not be empty".to_string()));
    }

    let order = web::block(move || service.pay_order(&actor, order_id, receipt))
        .await
        .map_err(blocking_error)??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// PUT /orders/{id}/cancel
///
/// Cancels a pending order and makes its vehicle bookable again.
#[utoipa::path(
    put,
    path = "/orders/{id}/cancel",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order cancelled", body = OrderResponse),
        (status = 404, description = "Order or vehicle not found"),
        (status = 409, description = "Order is not pending"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn cancel_order<R: RentalRepository>(
    service: web::Data<OrderService<R>>,
    actor: Actor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let order = web::block(move || service.cancel_order(&actor, order_id))
        .await
        .map_err(blocking_error)??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// GET /orders/{id}/invoice
///
/// Downloads the invoice of a paid order.
#[utoipa::path(
    get,
    path = "/orders/{id}/invoice",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Invoice", body = String, content_type = "text/plain"),
        (status = 400, description = "Order not paid"),
        (status = 401, description = "Missing user identity"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn download_invoice<R: RentalRepository>(
    service: web::Data<OrderService<R>>,
    renderer: web::Data<dyn InvoiceRenderer>,
    _actor: Actor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let invoice = web::block(move || service.invoice(order_id))
        .await
        .map_err(blocking_error)??;

    let filename = format!("invoice-{}.{}", order_id, renderer.file_extension());
    Ok(HttpResponse::Ok()
        .content_type(renderer.content_type())
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ))
        .body(renderer.render(&invoice)))
}

pub fn configure<R: RentalRepository>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/orders")
            .route("", web::post().to(create_order::<R>))
            .route("", web::get().to(list_orders::<R>))
            .route("/mine", web::get().to(my_orders::<R>))
            .route("/{id}", web::get().to(get_order::<R>))
            .route("/{id}", web::put().to(update_order::<R>))
            .route("/{id}/payment", web::put().to(pay_order::<R>))
            .route("/{id}/cancel", web::put().to(cancel_order::<R>))
            .route("/{id}/invoice", web::get().to(download_invoice::<R>)),
    );
}
