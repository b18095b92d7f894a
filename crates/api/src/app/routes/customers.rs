use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};

use siphon_auth::{AuthContext, Owner, Role, require_owner_or_role, require_role};
use siphon_core::CustomerId;

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;

/// Authenticated customer endpoints. Registration (`POST /customers`) is
/// wired separately without auth.
pub fn protected_router() -> Router {
    Router::new()
        .route("/customers", get(list_customers))
        .route(
            "/customers/:id",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route("/customers/:id/password", patch(change_password))
}

pub async fn register_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CustomerPayload>,
) -> ApiResult<(StatusCode, Json<dto::CustomerOut>)> {
    let customer = services.register_customer(body).await?;
    Ok((StatusCode::CREATED, Json(customer.into())))
}

async fn list_customers(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Vec<dto::CustomerOut>>> {
    require_role(&ctx, &[Role::Admin])?;
    let items = services
        .list_customers()
        .await?
        .into_iter()
        .map(dto::CustomerOut::from)
        .collect();
    Ok(Json(items))
}

async fn get_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<dto::CustomerOut>> {
    let id = CustomerId::new(id);
    require_owner_or_role(&ctx, &[Role::Admin], Owner::Customer(id))?;
    Ok(Json(services.get_customer(id).await?.into()))
}

async fn update_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(body): Json<dto::CustomerPayload>,
) -> ApiResult<Json<dto::CustomerOut>> {
    let id = CustomerId::new(id);
    require_owner_or_role(&ctx, &[Role::Admin], Owner::Customer(id))?;
    Ok(Json(services.update_customer(id, body).await?.into()))
}

async fn delete_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let id = CustomerId::new(id);
    require_owner_or_role(&ctx, &[Role::Admin], Owner::Customer(id))?;
    services.delete_customer(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn change_password(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(body): Json<dto::PasswordChangeRequest>,
) -> ApiResult<StatusCode> {
    let id = CustomerId::new(id);
    require_owner_or_role(&ctx, &[Role::Admin], Owner::Customer(id))?;
    services.change_customer_password(id, &body.password).await?;
    Ok(StatusCode::NO_CONTENT)
}
