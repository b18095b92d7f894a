use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use siphon_auth::{AuthContext, AuthError, Role, require_role};
use siphon_core::StockOperationId;
use siphon_inventory::StockOperation;

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;

/// Stock movement audit trail. Admin-only.
pub fn router() -> Router {
    Router::new()
        .route("/", post(record_operation).get(list_operations))
        .route("/:id", get(get_operation))
}

async fn record_operation(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<dto::StockOperationPayload>,
) -> ApiResult<(StatusCode, Json<StockOperation>)> {
    require_role(&ctx, &[Role::Admin])?;
    let employee_id = ctx.employee_id.ok_or(AuthError::Malformed)?;
    let operation = services.adjust_stock(body, employee_id).await?;
    Ok((StatusCode::CREATED, Json(operation)))
}

async fn list_operations(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Vec<StockOperation>>> {
    require_role(&ctx, &[Role::Admin])?;
    Ok(Json(services.list_stock_operations().await?))
}

async fn get_operation(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<StockOperation>> {
    require_role(&ctx, &[Role::Admin])?;
    Ok(Json(
        services.get_stock_operation(StockOperationId::new(id)).await?,
    ))
}
