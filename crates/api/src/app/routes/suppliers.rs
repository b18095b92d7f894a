use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};

use siphon_auth::{AuthContext, Owner, Role, require_owner_or_role, require_role};
use siphon_core::SupplierId;

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;

/// Supplier administration. Writes are admin-only; a supplier may read its
/// own record and change its own password.
pub fn router() -> Router {
    Router::new()
        .route("/", post(create_supplier).get(list_suppliers))
        .route(
            "/:id",
            get(get_supplier).put(update_supplier).delete(delete_supplier),
        )
        .route("/:id/password", patch(change_password))
}

async fn create_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<dto::SupplierPayload>,
) -> ApiResult<(StatusCode, Json<dto::SupplierOut>)> {
    require_role(&ctx, &[Role::Admin])?;
    let supplier = services.create_supplier(body).await?;
    Ok((StatusCode::CREATED, Json(supplier.into())))
}

async fn list_suppliers(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Vec<dto::SupplierOut>>> {
    require_role(&ctx, &[Role::Admin])?;
    let items = services
        .list_suppliers()
        .await?
        .into_iter()
        .map(dto::SupplierOut::from)
        .collect();
    Ok(Json(items))
}

async fn get_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<dto::SupplierOut>> {
    let id = SupplierId::new(id);
    require_owner_or_role(&ctx, &[Role::Admin], Owner::Supplier(id))?;
    Ok(Json(services.get_supplier(id).await?.into()))
}

async fn update_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(body): Json<dto::SupplierPayload>,
) -> ApiResult<Json<dto::SupplierOut>> {
    require_role(&ctx, &[Role::Admin])?;
    Ok(Json(
        services.update_supplier(SupplierId::new(id), body).await?.into(),
    ))
}

async fn delete_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    require_role(&ctx, &[Role::Admin])?;
    services.delete_supplier(SupplierId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn change_password(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(body): Json<dto::PasswordChangeRequest>,
) -> ApiResult<StatusCode> {
    let id = SupplierId::new(id);
    require_owner_or_role(&ctx, &[Role::Admin], Owner::Supplier(id))?;
    services.change_supplier_password(id, &body.password).await?;
    Ok(StatusCode::NO_CONTENT)
}
