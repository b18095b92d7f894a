use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};

use siphon_auth::{AuthContext, AuthError, Role, require_role};
use siphon_core::{ProductId, SupplierId};
use siphon_products::Product;

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;

/// Product catalog. Any authenticated role may read; writes are admin-only.
pub fn router() -> Router {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route("/supplier/:id", get(products_by_supplier))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/:id/stock", patch(set_stock))
}

async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<dto::ProductPayload>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    require_role(&ctx, &[Role::Admin])?;
    Ok((StatusCode::CREATED, Json(services.create_product(body).await?)))
}

async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(services.list_products().await?))
}

async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Product>> {
    Ok(Json(services.get_product(ProductId::new(id)).await?))
}

async fn products_by_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(services.products_by_supplier(SupplierId::new(id)).await?))
}

async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(body): Json<dto::ProductPayload>,
) -> ApiResult<Json<Product>> {
    require_role(&ctx, &[Role::Admin])?;
    Ok(Json(services.update_product(ProductId::new(id), body).await?))
}

async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    require_role(&ctx, &[Role::Admin])?;
    services.delete_product(ProductId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(body): Json<dto::StockUpdateRequest>,
) -> ApiResult<Json<Product>> {
    require_role(&ctx, &[Role::Admin])?;
    let employee_id = ctx.employee_id.ok_or(AuthError::Malformed)?;
    Ok(Json(
        services
            .set_stock(ProductId::new(id), body.stock_quantity, employee_id)
            .await?,
    ))
}
