use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use siphon_auth::{AuthContext, Owner, Role, require_owner_or_role, require_role};
use siphon_core::{CustomerId, DomainError, OrderId};
use siphon_sales::Order;

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(place_order).get(list_orders))
        .route("/recent", get(recent_orders))
        .route("/customer/:id", get(orders_by_customer))
        .route(
            "/:id",
            get(get_order).put(transition_order).delete(delete_order),
        )
}

#[derive(Debug, Serialize)]
struct PlacedOrder {
    #[serde(flatten)]
    order: Order,
    details: Vec<dto::OrderDetailOut>,
}

async fn place_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<dto::PlaceOrderRequest>,
) -> ApiResult<(StatusCode, Json<PlacedOrder>)> {
    require_role(&ctx, &[Role::Admin, Role::Customer])?;

    // Customers order for themselves; admins must name the customer.
    let customer_id = match ctx.role {
        Role::Customer => ctx
            .customer_id
            .ok_or(siphon_auth::AuthError::Malformed)?,
        _ => body
            .customer_id
            .ok_or(DomainError::MissingField("customer_id"))?,
    };

    let (order, details) = services.place_order(customer_id, &body.items).await?;
    Ok((
        StatusCode::CREATED,
        Json(PlacedOrder {
            order,
            details: details.into_iter().map(dto::OrderDetailOut::from).collect(),
        }),
    ))
}

async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Order>>> {
    require_role(&ctx, &[Role::Admin])?;
    Ok(Json(services.list_orders().await?))
}

async fn recent_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Order>>> {
    require_role(&ctx, &[Role::Admin])?;
    Ok(Json(services.recent_orders().await?))
}

async fn orders_by_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<Order>>> {
    let id = CustomerId::new(id);
    require_owner_or_role(&ctx, &[Role::Admin], Owner::Customer(id))?;
    Ok(Json(services.orders_by_customer(id).await?))
}

async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Order>> {
    let order = services.get_order(OrderId::new(id)).await?;
    require_owner_or_role(&ctx, &[Role::Admin], Owner::Customer(order.customer_id))?;
    Ok(Json(order))
}

/// Lines and totals are immutable after creation; an order update is a
/// status transition.
async fn transition_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(body): Json<dto::OrderStatusRequest>,
) -> ApiResult<Json<Order>> {
    let id = OrderId::new(id);
    let order = services.get_order(id).await?;
    require_owner_or_role(&ctx, &[Role::Admin], Owner::Customer(order.customer_id))?;
    Ok(Json(services.transition_order(id, &body.status).await?))
}

async fn delete_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    require_role(&ctx, &[Role::Admin])?;
    services.delete_order(OrderId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
