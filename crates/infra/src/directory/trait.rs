use std::sync::Arc;

use async_trait::async_trait;

use stockroom_auth::LocationAssignments;
use stockroom_core::{ActorId, ProductId, StockResult};
use stockroom_inventory::BundleDefinition;

/// Read-only bundle configuration.
#[async_trait]
pub trait BundleCatalog: Send + Sync {
    /// Whether the product is flagged as a bundle.
    async fn is_bundle(&self, product_id: ProductId) -> StockResult<bool>;

    /// The bundle's components, or `None` when no component rows exist.
    async fn definition(&self, bundle_id: ProductId) -> StockResult<Option<BundleDefinition>>;
}

/// Which locations an actor manages or staffs.
#[async_trait]
pub trait AssignmentDirectory: Send + Sync {
    /// Empty assignments when the actor is unknown.
    async fn assignments(&self, actor_id: ActorId) -> StockResult<LocationAssignments>;
}

#[async_trait]
impl<C> BundleCatalog for Arc<C>
where
    C: BundleCatalog + ?Sized,
{
    async fn is_bundle(&self, product_id: ProductId) -> StockResult<bool> {
        (**self).is_bundle(product_id).await
    }

    async fn definition(&self, bundle_id: ProductId) -> StockResult<Option<BundleDefinition>> {
        (**self).definition(bundle_id).await
    }
}

#[async_trait]
impl<D> AssignmentDirectory for Arc<D>
where
    D: AssignmentDirectory + ?Sized,
{
    async fn assignments(&self, actor_id: ActorId) -> StockResult<LocationAssignments> {
        (**self).assignments(actor_id).await
    }
}
