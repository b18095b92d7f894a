use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use siphon_auth::{AuthContext, Role, require_role};
use siphon_core::ReportId;
use siphon_reporting::FinancialReport;

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;

/// Financial report snapshots. Admin-only.
pub fn router() -> Router {
    Router::new()
        .route("/", post(create_report).get(list_reports))
        .route("/:id", get(get_report))
}

async fn create_report(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<dto::ReportRequest>,
) -> ApiResult<(StatusCode, Json<FinancialReport>)> {
    require_role(&ctx, &[Role::Admin])?;
    Ok((
        StatusCode::CREATED,
        Json(services.create_report(body.report_date).await?),
    ))
}

async fn list_reports(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Vec<FinancialReport>>> {
    require_role(&ctx, &[Role::Admin])?;
    Ok(Json(services.list_reports().await?))
}

async fn get_report(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<FinancialReport>> {
    require_role(&ctx, &[Role::Admin])?;
    Ok(Json(services.get_report(ReportId::new(id)).await?))
}
