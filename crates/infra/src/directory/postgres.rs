//! Postgres-backed bundle catalog and location assignments.
//!
//! Tables: `bundle_products` (the bundle flag), `bundle_components`
//! (component rows) and `location_assignments` (`role` is `manager` or `staff`).

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::instrument;

use stockroom_auth::LocationAssignments;
use stockroom_core::{ActorId, LocationId, ProductId, StockError, StockResult};
use stockroom_inventory::{BundleComponent, BundleDefinition};

use super::r#trait::{AssignmentDirectory, BundleCatalog};
use crate::error::sqlx_to_stock;

#[derive(Debug, Clone)]
pub struct PostgresDirectory {
    pool: Arc<PgPool>,
}

impl PostgresDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl BundleCatalog for PostgresDirectory {
    async fn is_bundle(&self, product_id: ProductId) -> StockResult<bool> {
        let row = sqlx::query(
            r#"
            SELECT is_bundle
            FROM bundle_products
            WHERE product_id = $1
            "#,
        )
        .bind(product_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(sqlx_to_stock("get_bundle_flag"))?;

        match row {
            Some(row) => row
                .try_get::<bool, _>("is_bundle")
                .map_err(sqlx_to_stock("decode_bundle_flag")),
            None => Ok(false),
        }
    }

    #[instrument(skip(self), fields(bundle_id = %bundle_id), err)]
    async fn definition(&self, bundle_id: ProductId) -> StockResult<Option<BundleDefinition>> {
        let rows = sqlx::query(
            r#"
            SELECT component_id, quantity_per_bundle
            FROM bundle_components
            WHERE bundle_id = $1
            ORDER BY component_id
            "#,
        )
        .bind(bundle_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(sqlx_to_stock("list_bundle_components"))?;

        if rows.is_empty() {
            return Ok(None);
        }

        let components = rows
            .iter()
            .map(|row| {
                let component_id: uuid::Uuid = row.try_get("component_id")?;
                let quantity: i32 = row.try_get("quantity_per_bundle")?;
                Ok(BundleComponent::new(
                    ProductId::from_uuid(component_id),
                    i64::from(quantity),
                ))
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(sqlx_to_stock("decode_bundle_component"))?;

        BundleDefinition::new(bundle_id, components)
            .map(Some)
            .map_err(|e| StockError::storage(format!("stored bundle is invalid: {e}")))
    }
}

#[async_trait]
impl AssignmentDirectory for PostgresDirectory {
    async fn assignments(&self, actor_id: ActorId) -> StockResult<LocationAssignments> {
        let rows = sqlx::query(
            r#"
            SELECT location_id, role
            FROM location_assignments
            WHERE actor_id = $1
            "#,
        )
        .bind(actor_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(sqlx_to_stock("list_assignments"))?;

        let mut assignments = LocationAssignments::new();
        for row in &rows {
            let location: uuid::Uuid = row
                .try_get("location_id")
                .map_err(sqlx_to_stock("decode_assignment"))?;
            let role: String = row
                .try_get("role")
                .map_err(sqlx_to_stock("decode_assignment"))?;
            let location = LocationId::from_uuid(location);
            match role.as_str() {
                "manager" => {
                    assignments.managed.insert(location);
                }
                "staff" => {
                    assignments.staffed.insert(location);
                }
                other => {
                    return Err(StockError::storage(format!(
                        "unknown assignment role '{other}'"
                    )));
                }
            }
        }
        Ok(assignments)
    }
}
