use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;

use stockroom_auth::Permission;
use stockroom_core::{LocationId, PackagingItemId, ProductId};
use stockroom_infra::ledger::InventoryLedger;
use stockroom_infra::movement_log::MovementLog;
use stockroom_inventory::{
    DispatchRequest, MovementFilter, MovementType, Operation, StockItem, StockKey, StockLevels,
};

use crate::app::errors;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::ActorContext;

const DEFAULT_MOVEMENT_LIMIT: usize = 100;
const MAX_MOVEMENT_LIMIT: usize = 1000;

pub fn router() -> Router {
    Router::new()
        .route("/dispatch", post(dispatch))
        .route("/records/:product_id/:location_id", get(get_record))
        .route("/movements", get(list_movements))
}

/// `POST /inventory/dispatch` with `{operation, data}`.
pub async fn dispatch(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    body: Result<Json<DispatchRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(e) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.body_text());
        }
    };

    let operation: Operation = match request.operation.parse() {
        Ok(op) => op,
        Err(e) => return errors::stock_error_to_response(e),
    };

    if let Err(e) = authz::authorize_operation(services.policy(), &ctx, operation) {
        return errors::authz_error_to_response(e);
    }

    match services.engine().dispatch(ctx.actor(), request).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => errors::stock_error_to_response(e),
    }
}

/// `GET /inventory/records/{product}/{location}`; zero-valued when absent.
pub async fn get_record(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path((product_id, location_id)): Path<(String, String)>,
) -> axum::response::Response {
    if let Err(e) = authz::authorize_permission(services.policy(), &ctx, &Permission::INVENTORY_READ)
    {
        return errors::authz_error_to_response(e);
    }

    let product_id: ProductId = match product_id.parse() {
        Ok(v) => v,
        Err(e) => return errors::stock_error_to_response(e),
    };
    let location_id: LocationId = match location_id.parse() {
        Ok(v) => v,
        Err(e) => return errors::stock_error_to_response(e),
    };

    match services
        .engine()
        .ledger()
        .get(StockKey::new(product_id, location_id))
        .await
    {
        Ok(record) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "stock": StockLevels::from(&record),
                "lastRestockedAt": record.last_restocked_at,
                "updatedAt": record.updated_at,
            })),
        )
            .into_response(),
        Err(e) => errors::stock_error_to_response(e),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementsQuery {
    pub product: Option<ProductId>,
    pub packaging_item: Option<PackagingItemId>,
    pub location: Option<LocationId>,
    pub reference: Option<String>,
    #[serde(rename = "type")]
    pub movement_type: Option<String>,
    pub limit: Option<usize>,
}

/// `GET /inventory/movements?product=&location=&limit=`, newest first.
pub async fn list_movements(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Query(query): Query<MovementsQuery>,
) -> axum::response::Response {
    if let Err(e) = authz::authorize_permission(services.policy(), &ctx, &Permission::INVENTORY_READ)
    {
        return errors::authz_error_to_response(e);
    }

    let item = match (query.product, query.packaging_item) {
        (Some(_), Some(_)) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                "filter by product or packagingItem, not both",
            );
        }
        (Some(p), None) => Some(StockItem::Product(p)),
        (None, Some(p)) => Some(StockItem::Packaging(p)),
        (None, None) => None,
    };

    let movement_type = match query.movement_type.as_deref().map(str::parse::<MovementType>) {
        Some(Ok(t)) => Some(t),
        Some(Err(e)) => return errors::stock_error_to_response(e),
        None => None,
    };

    let filter = MovementFilter {
        item,
        location_id: query.location,
        reference_id: query.reference,
        movement_type,
        limit: Some(
            query
                .limit
                .unwrap_or(DEFAULT_MOVEMENT_LIMIT)
                .clamp(1, MAX_MOVEMENT_LIMIT),
        ),
    };

    match services.engine().movements().list(&filter).await {
        Ok(movements) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "count": movements.len(),
                "movements": movements,
            })),
        )
            .into_response(),
        Err(e) => errors::stock_error_to_response(e),
    }
}
