use std::sync::Arc;

use axum::extract::{Extension, Path, Query};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use siphon_auth::{AuthContext, Owner, Role, require_owner_or_role, require_role};
use siphon_core::{CustomerId, OrderDetailId, OrderId, SupplierId};

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;

/// Order lines. Admin manages them directly; customers and suppliers get
/// scoped read views (own orders, own supplied products).
pub fn router() -> Router {
    Router::new()
        .route("/", post(create_detail).get(list_details))
        .route("/order/:id", get(details_for_order))
        .route("/customer/:id", get(details_for_customer))
        .route("/supplier/:id", get(details_for_supplier))
        .route(
            "/:id",
            get(get_detail).put(update_detail).delete(delete_detail),
        )
}

async fn create_detail(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<dto::OrderDetailPayload>,
) -> ApiResult<(StatusCode, Json<dto::OrderDetailOut>)> {
    require_role(&ctx, &[Role::Admin])?;
    let detail = services.create_order_detail(body).await?;
    Ok((StatusCode::CREATED, Json(detail.into())))
}

async fn list_details(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Vec<dto::OrderDetailOut>>> {
    require_role(&ctx, &[Role::Admin])?;
    let items = services
        .list_order_details()
        .await?
        .into_iter()
        .map(dto::OrderDetailOut::from)
        .collect();
    Ok(Json(items))
}

async fn details_for_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<dto::OrderDetailOut>>> {
    let id = OrderId::new(id);
    let order = services.get_order(id).await?;
    require_owner_or_role(&ctx, &[Role::Admin], Owner::Customer(order.customer_id))?;
    let items = services
        .details_for_order(id)
        .await?
        .into_iter()
        .map(dto::OrderDetailOut::from)
        .collect();
    Ok(Json(items))
}

async fn details_for_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<dto::OrderDetailOut>>> {
    let id = CustomerId::new(id);
    require_owner_or_role(&ctx, &[Role::Admin], Owner::Customer(id))?;
    let items = services
        .detail_rows_for_customer(id)
        .await?
        .into_iter()
        .map(dto::OrderDetailOut::from)
        .collect();
    Ok(Json(items))
}

async fn details_for_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
    Query(range): Query<dto::DateRangeQuery>,
) -> ApiResult<Json<Vec<dto::OrderDetailOut>>> {
    let id = SupplierId::new(id);
    require_owner_or_role(&ctx, &[Role::Admin], Owner::Supplier(id))?;
    let items = services
        .detail_rows_for_supplier(id, range.start_date, range.end_date)
        .await?
        .into_iter()
        .map(dto::OrderDetailOut::from)
        .collect();
    Ok(Json(items))
}

async fn get_detail(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<dto::OrderDetailOut>> {
    require_role(&ctx, &[Role::Admin])?;
    Ok(Json(
        services.get_order_detail(OrderDetailId::new(id)).await?.into(),
    ))
}

async fn update_detail(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(body): Json<dto::OrderDetailUpdatePayload>,
) -> ApiResult<Json<dto::OrderDetailOut>> {
    require_role(&ctx, &[Role::Admin])?;
    Ok(Json(
        services
            .update_order_detail(OrderDetailId::new(id), body.quantity)
            .await?
            .into(),
    ))
}

async fn delete_detail(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    require_role(&ctx, &[Role::Admin])?;
    services.delete_order_detail(OrderDetailId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
