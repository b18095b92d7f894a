use std::sync::Arc;

use axum::extract::{Extension, Form};
use axum::Json;

use siphon_auth::AuthContext;

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;

/// Form-encoded username+password exchange for a bearer token.
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Form(form): Form<dto::LoginForm>,
) -> ApiResult<Json<dto::TokenResponse>> {
    Ok(Json(services.login(&form.username, &form.password).await?))
}

pub async fn me(Extension(ctx): Extension<AuthContext>) -> Json<dto::MeResponse> {
    Json(dto::MeResponse {
        username: ctx.username,
        role: ctx.role,
    })
}
