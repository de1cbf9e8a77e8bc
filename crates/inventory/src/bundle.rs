//! Bundle decomposition and weakest-link availability.
//!
//! A bundle holds no stock of its own. Its availability at a location is
//! `min(floor(component.available / quantity_per_bundle))` over all declared
//! components, and the component(s) producing that minimum are reported as
//! limiting so callers can explain a shortage.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use stockroom_core::{LocationId, ProductId, StockError, StockResult, ensure_positive};

/// One (component, quantity-per-bundle) row of a bundle definition.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleComponent {
    pub component_id: ProductId,
    pub quantity_per_bundle: i64,
}

impl BundleComponent {
    pub fn new(component_id: ProductId, quantity_per_bundle: i64) -> Self {
        Self {
            component_id,
            quantity_per_bundle,
        }
    }
}

/// A validated bundle: non-empty, positive multipliers, no repeated component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleDefinition {
    bundle_id: ProductId,
    components: Vec<BundleComponent>,
}

impl BundleDefinition {
    pub fn new(bundle_id: ProductId, components: Vec<BundleComponent>) -> StockResult<Self> {
        if components.is_empty() {
            return Err(StockError::not_found(format!(
                "bundle {bundle_id} has no components"
            )));
        }

        let mut seen = BTreeSet::new();
        for c in &components {
            ensure_positive("quantity_per_bundle", c.quantity_per_bundle)?;
            if c.component_id == bundle_id {
                return Err(StockError::validation(format!(
                    "bundle {bundle_id} cannot contain itself"
                )));
            }
            if !seen.insert(c.component_id) {
                return Err(StockError::validation(format!(
                    "bundle {bundle_id} lists component {} twice",
                    c.component_id
                )));
            }
        }

        Ok(Self {
            bundle_id,
            components,
        })
    }

    pub fn components(&self) -> &[BundleComponent] {
        &self.components
    }

    /// Per-component quantities needed for `bundles` bundles, in declaration order.
    pub fn requirements(&self, bundles: i64) -> StockResult<Vec<(ProductId, i64)>> {
        ensure_positive("quantity", bundles)?;
        self.components
            .iter()
            .map(|c| {
                c.quantity_per_bundle
                    .checked_mul(bundles)
                    .map(|qty| (c.component_id, qty))
                    .ok_or_else(|| StockError::validation("bundle quantity overflow"))
            })
            .collect()
    }

    /// Weakest-link availability given each component's available quantity.
    ///
    /// `available_of` should return zero for components with no record at the
    /// location.
    pub fn evaluate(
        &self,
        location_id: LocationId,
        requested: i64,
        available_of: impl Fn(ProductId) -> i64,
    ) -> BundleAvailability {
        let mut components: Vec<ComponentAvailability> = self
            .components
            .iter()
            .map(|c| {
                let available = available_of(c.component_id).max(0);
                ComponentAvailability {
                    component_id: c.component_id,
                    required_per_bundle: c.quantity_per_bundle,
                    required_total: c.quantity_per_bundle.saturating_mul(requested.max(0)),
                    available,
                    bundles_possible: available / c.quantity_per_bundle,
                    is_limiting: false,
                }
            })
            .collect();

        let bundle_availability = components
            .iter()
            .map(|c| c.bundles_possible)
            .min()
            .unwrap_or(0);

        for c in &mut components {
            c.is_limiting = c.bundles_possible == bundle_availability;
        }

        BundleAvailability {
            bundle_id: self.bundle_id,
            location_id,
            requested,
            is_bundle: true,
            available: bundle_availability >= requested,
            bundle_availability,
            components,
        }
    }
}

/// Availability of one component toward a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentAvailability {
    pub component_id: ProductId,
    pub required_per_bundle: i64,
    /// `required_per_bundle × requested`.
    pub required_total: i64,
    pub available: i64,
    pub bundles_possible: i64,
    pub is_limiting: bool,
}

/// Aggregate answer to "can `requested` bundles be had at this location?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleAvailability {
    pub bundle_id: ProductId,
    pub location_id: LocationId,
    pub requested: i64,
    pub is_bundle: bool,
    pub available: bool,
    pub bundle_availability: i64,
    pub components: Vec<ComponentAvailability>,
}

impl BundleAvailability {
    pub fn limiting(&self) -> impl Iterator<Item = &ComponentAvailability> {
        self.components.iter().filter(|c| c.is_limiting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn weakest_component_limits_the_bundle() {
        let a = ProductId::new();
        let b = ProductId::new();
        let def = BundleDefinition::new(
            ProductId::new(),
            vec![BundleComponent::new(a, 2), BundleComponent::new(b, 1)],
        )
        .unwrap();
        let stock: HashMap<ProductId, i64> = [(a, 10), (b, 3)].into_iter().collect();

        let report = def.evaluate(LocationId::new(), 1, |p| stock.get(&p).copied().unwrap_or(0));

        assert_eq!(report.bundle_availability, 3);
        assert!(report.available);
        let limiting: Vec<_> = report.limiting().map(|c| c.component_id).collect();
        assert_eq!(limiting, vec![b]);
        let a_row = report.components.iter().find(|c| c.component_id == a).unwrap();
        assert_eq!(a_row.bundles_possible, 5);
        assert!(!a_row.is_limiting);
    }

    #[test]
    fn missing_component_stock_counts_as_zero() {
        let a = ProductId::new();
        let b = ProductId::new();
        let def = BundleDefinition::new(
            ProductId::new(),
            vec![BundleComponent::new(a, 1), BundleComponent::new(b, 1)],
        )
        .unwrap();

        let report = def.evaluate(LocationId::new(), 1, |p| if p == a { 7 } else { 0 });
        assert_eq!(report.bundle_availability, 0);
        assert!(!report.available);
        assert!(report.components.iter().any(|c| c.component_id == b && c.is_limiting));
    }

    #[test]
    fn requirements_scale_by_quantity_per_bundle() {
        let a = ProductId::new();
        let b = ProductId::new();
        let def = BundleDefinition::new(
            ProductId::new(),
            vec![BundleComponent::new(a, 3), BundleComponent::new(b, 1)],
        )
        .unwrap();

        assert_eq!(def.requirements(4).unwrap(), vec![(a, 12), (b, 4)]);
        assert!(def.requirements(0).is_err());
    }

    #[test]
    fn empty_or_malformed_definitions_are_rejected() {
        let bundle = ProductId::new();
        let a = ProductId::new();

        assert!(matches!(
            BundleDefinition::new(bundle, vec![]),
            Err(StockError::NotFound(_))
        ));
        assert!(BundleDefinition::new(bundle, vec![BundleComponent::new(a, 0)]).is_err());
        assert!(
            BundleDefinition::new(
                bundle,
                vec![BundleComponent::new(a, 1), BundleComponent::new(a, 2)]
            )
            .is_err()
        );
        assert!(BundleDefinition::new(bundle, vec![BundleComponent::new(bundle, 1)]).is_err());
    }
}
