use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;

use stockroom_auth::LocationAssignments;
use stockroom_core::{ActorId, LocationId, ProductId, StockResult};
use stockroom_inventory::{BundleComponent, BundleDefinition};

use super::r#trait::{AssignmentDirectory, BundleCatalog};
use crate::error::StoreError;

/// In-memory bundle catalog for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryBundleCatalog {
    flagged: RwLock<HashSet<ProductId>>,
    definitions: RwLock<HashMap<ProductId, BundleDefinition>>,
}

impl InMemoryBundleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag `bundle_id` as a bundle and store its components.
    pub fn define(&self, bundle_id: ProductId, components: Vec<BundleComponent>) -> StockResult<()> {
        let definition = BundleDefinition::new(bundle_id, components)?;
        self.flag(bundle_id)?;
        self.definitions
            .write()
            .map_err(|_| StoreError::Poisoned("bundle definitions"))?
            .insert(bundle_id, definition);
        Ok(())
    }

    /// Flag a product as a bundle without declaring components.
    pub fn flag(&self, bundle_id: ProductId) -> StockResult<()> {
        self.flagged
            .write()
            .map_err(|_| StoreError::Poisoned("bundle flags"))?
            .insert(bundle_id);
        Ok(())
    }
}

#[async_trait]
impl BundleCatalog for InMemoryBundleCatalog {
    async fn is_bundle(&self, product_id: ProductId) -> StockResult<bool> {
        let flagged = self
            .flagged
            .read()
            .map_err(|_| StoreError::Poisoned("bundle flags"))?;
        Ok(flagged.contains(&product_id))
    }

    async fn definition(&self, bundle_id: ProductId) -> StockResult<Option<BundleDefinition>> {
        let definitions = self
            .definitions
            .read()
            .map_err(|_| StoreError::Poisoned("bundle definitions"))?;
        Ok(definitions.get(&bundle_id).cloned())
    }
}

/// In-memory location assignments for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryAssignments {
    inner: RwLock<HashMap<ActorId, LocationAssignments>>,
}

impl InMemoryAssignments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign_manager(&self, actor_id: ActorId, location: LocationId) -> StockResult<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::Poisoned("location assignments"))?;
        inner.entry(actor_id).or_default().managed.insert(location);
        Ok(())
    }

    pub fn assign_staff(&self, actor_id: ActorId, location: LocationId) -> StockResult<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::Poisoned("location assignments"))?;
        inner.entry(actor_id).or_default().staffed.insert(location);
        Ok(())
    }
}

#[async_trait]
impl AssignmentDirectory for InMemoryAssignments {
    async fn assignments(&self, actor_id: ActorId) -> StockResult<LocationAssignments> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::Poisoned("location assignments"))?;
        Ok(inner.get(&actor_id).cloned().unwrap_or_default())
    }
}
