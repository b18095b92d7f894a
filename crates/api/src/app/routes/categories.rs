use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use siphon_auth::{AuthContext, Role, require_role};
use siphon_core::CategoryId;
use siphon_products::ProductCategory;

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;

/// Category tree administration. Admin-only.
pub fn router() -> Router {
    Router::new()
        .route("/", post(create_category).get(list_categories))
        .route(
            "/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
        .route("/:id/children", get(child_categories))
}

async fn create_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<dto::CategoryPayload>,
) -> ApiResult<(StatusCode, Json<ProductCategory>)> {
    require_role(&ctx, &[Role::Admin])?;
    Ok((StatusCode::CREATED, Json(services.create_category(body).await?)))
}

async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Vec<ProductCategory>>> {
    require_role(&ctx, &[Role::Admin])?;
    Ok(Json(services.list_categories().await?))
}

async fn get_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ProductCategory>> {
    require_role(&ctx, &[Role::Admin])?;
    Ok(Json(services.get_category(CategoryId::new(id)).await?))
}

async fn update_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(body): Json<dto::CategoryPayload>,
) -> ApiResult<Json<ProductCategory>> {
    require_role(&ctx, &[Role::Admin])?;
    Ok(Json(
        services.update_category(CategoryId::new(id), body).await?,
    ))
}

async fn delete_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    require_role(&ctx, &[Role::Admin])?;
    services.delete_category(CategoryId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn child_categories(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<ProductCategory>>> {
    require_role(&ctx, &[Role::Admin])?;
    Ok(Json(services.child_categories(CategoryId::new(id)).await?))
}
