use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};

use siphon_auth::{AuthContext, Role, require_role};
use siphon_core::EmployeeId;

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;

/// Employee administration. Admin-only throughout.
pub fn router() -> Router {
    Router::new()
        .route("/", post(create_employee).get(list_employees))
        .route(
            "/:id",
            get(get_employee).put(update_employee).delete(delete_employee),
        )
        .route("/:id/password", patch(change_password))
}

async fn create_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<dto::EmployeePayload>,
) -> ApiResult<(StatusCode, Json<dto::EmployeeOut>)> {
    require_role(&ctx, &[Role::Admin])?;
    let employee = services.create_employee(body).await?;
    Ok((StatusCode::CREATED, Json(employee.into())))
}

async fn list_employees(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Vec<dto::EmployeeOut>>> {
    require_role(&ctx, &[Role::Admin])?;
    let items = services
        .list_employees()
        .await?
        .into_iter()
        .map(dto::EmployeeOut::from)
        .collect();
    Ok(Json(items))
}

async fn get_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<dto::EmployeeOut>> {
    require_role(&ctx, &[Role::Admin])?;
    Ok(Json(services.get_employee(EmployeeId::new(id)).await?.into()))
}

async fn update_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(body): Json<dto::EmployeePayload>,
) -> ApiResult<Json<dto::EmployeeOut>> {
    require_role(&ctx, &[Role::Admin])?;
    Ok(Json(
        services.update_employee(EmployeeId::new(id), body).await?.into(),
    ))
}

async fn delete_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    require_role(&ctx, &[Role::Admin])?;
    services.delete_employee(EmployeeId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn change_password(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(body): Json<dto::PasswordChangeRequest>,
) -> ApiResult<StatusCode> {
    require_role(&ctx, &[Role::Admin])?;
    services
        .change_employee_password(EmployeeId::new(id), &body.password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
