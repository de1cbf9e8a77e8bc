use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use crate::app::services::AppServices;
use crate::context::ActorContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
) -> impl IntoResponse {
    let principal = services.policy().resolve(ctx.actor());
    Json(serde_json::json!({
        "actor_id": ctx.actor_id().to_string(),
        "roles": ctx.roles().iter().map(|r| r.as_str()).collect::<Vec<_>>(),
        "permissions": principal.permissions.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
        "scope": principal.scope,
    }))
}
