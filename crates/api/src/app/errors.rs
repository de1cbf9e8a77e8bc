use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stockroom_auth::AuthzError;
use stockroom_core::StockError;

/// Map an engine failure to `{error, message, ...details}`.
///
/// Stock shortfalls carry the current and requested quantities.
pub fn stock_error_to_response(err: StockError) -> axum::response::Response {
    let code = err.code();
    let message = err.to_string();
    match err {
        StockError::InsufficientStock {
            item,
            available,
            requested,
        } => (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({
                "error": code,
                "message": message,
                "item": item,
                "available": available,
                "requested": requested,
            })),
        )
            .into_response(),
        StockError::NegativeStock {
            item,
            current,
            adjustment,
        } => (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({
                "error": code,
                "message": message,
                "item": item,
                "current": current,
                "adjustment": adjustment,
            })),
        )
            .into_response(),
        StockError::InvalidOperation(_) | StockError::Validation(_) => {
            json_error(StatusCode::BAD_REQUEST, code, message)
        }
        StockError::Unauthorized(_) => json_error(StatusCode::FORBIDDEN, code, message),
        StockError::NotFound(_) => json_error(StatusCode::NOT_FOUND, code, message),
        StockError::Storage(_) => {
            tracing::error!(error = %message, "storage failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, code, message)
        }
    }
}

pub fn authz_error_to_response(err: AuthzError) -> axum::response::Response {
    tracing::warn!(error = %err, "permission denied");
    json_error(StatusCode::FORBIDDEN, "forbidden", err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
