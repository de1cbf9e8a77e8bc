//! Backend selection.
//!
//! `DATABASE_URL` set → Postgres ledger, movement log and directory sharing
//! one pool. Otherwise everything lives in memory (dev/test).

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use stockroom_auth::RolePolicy;
use stockroom_infra::InventoryEngine;
use stockroom_infra::directory::{
    AssignmentDirectory, BundleCatalog, InMemoryAssignments, InMemoryBundleCatalog,
    PostgresDirectory,
};
use stockroom_infra::ledger::{InMemoryLedger, InventoryLedger, PostgresLedger};
use stockroom_infra::movement_log::{InMemoryMovementLog, MovementLog, PostgresMovementLog};

use crate::config::ApiConfig;

/// Engine over type-erased backends.
pub type DynEngine = InventoryEngine<
    Arc<dyn InventoryLedger>,
    Arc<dyn MovementLog>,
    Arc<dyn BundleCatalog>,
    Arc<dyn AssignmentDirectory>,
>;

/// Shared state for all handlers.
pub struct AppServices {
    engine: DynEngine,
}

/// Configuration handles for the in-memory backend (bundles, assignments).
///
/// Lets tests and local setups declare bundles and location assignments,
/// which have no HTTP surface.
#[derive(Clone)]
pub struct InMemoryHandles {
    pub ledger: Arc<InMemoryLedger>,
    pub catalog: Arc<InMemoryBundleCatalog>,
    pub assignments: Arc<InMemoryAssignments>,
}

impl AppServices {
    pub fn in_memory() -> (Self, InMemoryHandles) {
        let handles = InMemoryHandles {
            ledger: Arc::new(InMemoryLedger::new()),
            catalog: Arc::new(InMemoryBundleCatalog::new()),
            assignments: Arc::new(InMemoryAssignments::new()),
        };
        let engine = InventoryEngine::new(
            handles.ledger.clone() as Arc<dyn InventoryLedger>,
            Arc::new(InMemoryMovementLog::new()) as Arc<dyn MovementLog>,
            handles.catalog.clone() as Arc<dyn BundleCatalog>,
            handles.assignments.clone() as Arc<dyn AssignmentDirectory>,
        );
        (Self { engine }, handles)
    }

    pub async fn postgres(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        let engine = InventoryEngine::new(
            Arc::new(PostgresLedger::new(pool.clone())) as Arc<dyn InventoryLedger>,
            Arc::new(PostgresMovementLog::new(pool.clone())) as Arc<dyn MovementLog>,
            Arc::new(PostgresDirectory::new(pool.clone())) as Arc<dyn BundleCatalog>,
            Arc::new(PostgresDirectory::new(pool)) as Arc<dyn AssignmentDirectory>,
        );
        Ok(Self { engine })
    }

    pub fn with_policy(self, policy: RolePolicy) -> Self {
        Self {
            engine: self.engine.with_policy(policy),
        }
    }

    pub fn engine(&self) -> &DynEngine {
        &self.engine
    }

    pub fn policy(&self) -> &RolePolicy {
        self.engine.policy()
    }
}

pub async fn build_services(config: &ApiConfig) -> Result<AppServices, sqlx::Error> {
    match &config.database_url {
        Some(url) => {
            tracing::info!(
                max_connections = config.database_max_connections,
                "using postgres inventory backend"
            );
            AppServices::postgres(url, config.database_max_connections).await
        }
        None => {
            tracing::info!("DATABASE_URL not set; using in-memory inventory backend");
            Ok(AppServices::in_memory().0)
        }
    }
}
