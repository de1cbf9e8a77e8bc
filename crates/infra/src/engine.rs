//! Inventory engine (application-level orchestration).
//!
//! The engine is the single entry point for every stock operation. It composes
//! the storage traits and runs each request through the same pipeline:
//!
//! ```text
//! DispatchRequest { operation, data }
//!   ↓
//! 1. Parse into a typed Command (unknown operation → InvalidOperation)
//!   ↓
//! 2. Location authorization (adjustments, transfers, outlet packaging)
//!   ↓
//! 3. Commit one LedgerBatch (all-or-nothing; bundle fan-out and transfers included)
//!   ↓
//! 4. Append movements (best-effort; failures are logged, the change stands)
//!   ↓
//! Outcome
//! ```
//!
//! Permission checks (`inventory.read` / `inventory.reserve` / `inventory.adjust`)
//! belong to the caller's surface. The engine only enforces location scope,
//! since that needs the assignment directory.

use std::collections::HashMap;

use chrono::Utc;
use tracing::{error, instrument, warn};

use stockroom_auth::{Actor, RolePolicy};
use stockroom_core::{LocationId, ProductId, StockError, StockResult, ensure_positive};
use stockroom_inventory::{
    AdjustmentOutcome, Applied, AvailabilityQuery, AvailabilityReport, BundleOutcome, Command,
    Direction, DispatchRequest, MovementRecord, MovementType, OrderLine, Outcome,
    PackagingAdjustment, PackagingKey, ReturnLine, StockAdjustment, StockChange, StockItem,
    StockKey, StockLevels, StockOutcome, StockTransfer, TransferOutcome,
};

use crate::directory::{AssignmentDirectory, BundleCatalog};
use crate::ledger::{InventoryLedger, LedgerBatch};
use crate::movement_log::MovementLog;

/// Reservation lifecycle step applied to a single (product, location).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Lifecycle {
    Reserve,
    Release,
    Sale,
    Return,
}

impl Lifecycle {
    fn change(self, quantity: i64) -> StockChange {
        match self {
            Lifecycle::Reserve => StockChange::Reserve(quantity),
            Lifecycle::Release => StockChange::Release(quantity),
            Lifecycle::Sale => StockChange::Sell(quantity),
            Lifecycle::Return => StockChange::Return(quantity),
        }
    }

    fn movement_type(self) -> MovementType {
        match self {
            Lifecycle::Reserve => MovementType::Reservation,
            Lifecycle::Release => MovementType::Release,
            Lifecycle::Sale => MovementType::Sale,
            Lifecycle::Return => MovementType::Return,
        }
    }

    fn direction(self) -> Direction {
        match self {
            Lifecycle::Reserve | Lifecycle::Release => Direction::None,
            Lifecycle::Sale => Direction::Out,
            Lifecycle::Return => Direction::In,
        }
    }

    /// Movement describing one applied change. Release movements carry the
    /// quantity actually released.
    fn movement(
        self,
        actor: &Actor,
        applied: &Applied,
        requested: i64,
        reference: Option<String>,
        context: Option<&str>,
    ) -> MovementRecord {
        let quantity = match self {
            Lifecycle::Release => requested - applied.clamped,
            _ => requested,
        };

        let mut notes: Vec<String> = context.map(str::to_string).into_iter().collect();
        if applied.clamped > 0 {
            match self {
                Lifecycle::Release => notes.push(format!(
                    "release of {requested} clamped by {} to the reserved quantity",
                    applied.clamped
                )),
                Lifecycle::Sale => notes.push(format!(
                    "{} sold without a matching reservation",
                    applied.clamped
                )),
                Lifecycle::Reserve | Lifecycle::Return => {}
            }
        }

        MovementRecord::new(
            StockItem::Product(applied.after.key.product_id),
            Some(applied.after.key.location_id),
            self.movement_type(),
            quantity,
            self.direction(),
            applied.after.updated_at.unwrap_or_else(Utc::now),
        )
        .reference(reference)
        .notes((!notes.is_empty()).then(|| notes.join("; ")))
        .actor(Some(actor.actor_id))
    }
}

fn stock_outcome(applied: &Applied, quantity: i64) -> StockOutcome {
    StockOutcome {
        success: true,
        quantity,
        clamped: applied.clamped,
        stock: StockLevels::from(&applied.after),
    }
}

fn take_single(mut applied: Vec<Applied>) -> StockResult<Applied> {
    applied
        .pop()
        .ok_or_else(|| StockError::storage("ledger returned no result for a single change"))
}

/// Reusable inventory engine over pluggable storage.
///
/// ## Generic Parameters
///
/// - `L`: stock ledger ([`InventoryLedger`])
/// - `M`: audit trail ([`MovementLog`])
/// - `C`: bundle configuration ([`BundleCatalog`])
/// - `D`: actor/location assignments ([`AssignmentDirectory`])
///
/// All four are implemented for `Arc<T>`, so shared handles can be passed in
/// directly.
pub struct InventoryEngine<L, M, C, D> {
    ledger: L,
    movements: M,
    catalog: C,
    directory: D,
    policy: RolePolicy,
}

impl<L, M, C, D> InventoryEngine<L, M, C, D>
where
    L: InventoryLedger,
    M: MovementLog,
    C: BundleCatalog,
    D: AssignmentDirectory,
{
    pub fn new(ledger: L, movements: M, catalog: C, directory: D) -> Self {
        Self {
            ledger,
            movements,
            catalog,
            directory,
            policy: RolePolicy::standard(),
        }
    }

    /// Replace the role policy used to resolve location scope.
    pub fn with_policy(mut self, policy: RolePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn movements(&self) -> &M {
        &self.movements
    }

    pub fn policy(&self) -> &RolePolicy {
        &self.policy
    }

    /// Parse and execute one `{operation, data}` request.
    #[instrument(skip(self, actor, request), fields(actor_id = %actor.actor_id, operation = %request.operation))]
    pub async fn dispatch(&self, actor: &Actor, request: DispatchRequest) -> StockResult<Outcome> {
        let command = Command::parse(request)?;
        self.execute(actor, command).await
    }

    pub async fn execute(&self, actor: &Actor, command: Command) -> StockResult<Outcome> {
        match command {
            Command::CheckAvailability(q) => {
                self.check_availability(&q).await.map(Outcome::Availability)
            }
            Command::ReserveStock(line) => {
                self.reserve_stock(actor, &line).await.map(Outcome::Stock)
            }
            Command::ReleaseStock(line) => {
                self.release_stock(actor, &line).await.map(Outcome::Stock)
            }
            Command::RecordSale(line) => self.record_sale(actor, &line).await.map(Outcome::Stock),
            Command::ProcessReturn(line) => {
                self.process_return(actor, &line).await.map(Outcome::Stock)
            }
            Command::AdjustStock(adj) => {
                self.adjust_stock(actor, &adj).await.map(Outcome::Adjustment)
            }
            Command::TransferStock(t) => {
                self.transfer_stock(actor, &t).await.map(Outcome::Transfer)
            }
            Command::AdjustPackagingStock(adj) => self
                .adjust_packaging_stock(actor, &adj)
                .await
                .map(Outcome::Adjustment),
            Command::CheckBundleAvailability(q) => self.check_bundle_availability(&q).await,
            Command::ReserveBundleStock(line) => self
                .reserve_bundle_stock(actor, &line)
                .await
                .map(Outcome::Bundle),
            Command::ReleaseBundleStock(line) => self
                .release_bundle_stock(actor, &line)
                .await
                .map(Outcome::Bundle),
            Command::RecordBundleSale(line) => self
                .record_bundle_sale(actor, &line)
                .await
                .map(Outcome::Bundle),
        }
    }

    // ---------------------------------------------------------------------
    // Reservation lifecycle
    // ---------------------------------------------------------------------

    #[instrument(skip(self), fields(product_id = %query.product_id, location_id = %query.location_id), err)]
    pub async fn check_availability(
        &self,
        query: &AvailabilityQuery,
    ) -> StockResult<AvailabilityReport> {
        ensure_positive("quantity", query.quantity)?;
        let record = self
            .ledger
            .get(StockKey::new(query.product_id, query.location_id))
            .await?;
        Ok(AvailabilityReport {
            product_id: query.product_id,
            location_id: query.location_id,
            requested: query.quantity,
            available: record.available() >= query.quantity,
            current_quantity: record.available(),
            is_bundle: false,
        })
    }

    #[instrument(skip(self, actor, line), fields(actor_id = %actor.actor_id, product_id = %line.product_id, location_id = %line.location_id, quantity = line.quantity), err)]
    pub async fn reserve_stock(&self, actor: &Actor, line: &OrderLine) -> StockResult<StockOutcome> {
        self.apply_lifecycle(
            actor,
            Lifecycle::Reserve,
            line.product_id,
            line.location_id,
            line.quantity,
            line.order_id.clone(),
        )
        .await
    }

    /// Release a reservation. Releasing more than is reserved clamps at zero,
    /// so repeating a release is harmless.
    #[instrument(skip(self, actor, line), fields(actor_id = %actor.actor_id, product_id = %line.product_id, location_id = %line.location_id, quantity = line.quantity), err)]
    pub async fn release_stock(&self, actor: &Actor, line: &OrderLine) -> StockResult<StockOutcome> {
        self.apply_lifecycle(
            actor,
            Lifecycle::Release,
            line.product_id,
            line.location_id,
            line.quantity,
            line.order_id.clone(),
        )
        .await
    }

    #[instrument(skip(self, actor, line), fields(actor_id = %actor.actor_id, product_id = %line.product_id, location_id = %line.location_id, quantity = line.quantity), err)]
    pub async fn record_sale(&self, actor: &Actor, line: &OrderLine) -> StockResult<StockOutcome> {
        self.apply_lifecycle(
            actor,
            Lifecycle::Sale,
            line.product_id,
            line.location_id,
            line.quantity,
            line.order_id.clone(),
        )
        .await
    }

    #[instrument(skip(self, actor, line), fields(actor_id = %actor.actor_id, product_id = %line.product_id, location_id = %line.location_id, quantity = line.quantity), err)]
    pub async fn process_return(&self, actor: &Actor, line: &ReturnLine) -> StockResult<StockOutcome> {
        self.apply_lifecycle(
            actor,
            Lifecycle::Return,
            line.product_id,
            line.location_id,
            line.quantity,
            line.return_id.clone(),
        )
        .await
    }

    async fn apply_lifecycle(
        &self,
        actor: &Actor,
        step: Lifecycle,
        product_id: ProductId,
        location_id: LocationId,
        quantity: i64,
        reference: Option<String>,
    ) -> StockResult<StockOutcome> {
        ensure_positive("quantity", quantity)?;
        let key = StockKey::new(product_id, location_id);
        let batch = LedgerBatch::single(key, step.change(quantity), Utc::now());
        let applied = take_single(self.ledger.commit(batch).await?)?;

        if step == Lifecycle::Release && applied.clamped > 0 {
            warn!(
                %key,
                requested = quantity,
                clamped = applied.clamped,
                "release exceeded reserved quantity; clamped at zero"
            );
        }

        let movement = step.movement(actor, &applied, quantity, reference, None);
        self.record(vec![movement]).await;
        Ok(stock_outcome(&applied, quantity))
    }

    // ---------------------------------------------------------------------
    // Adjustment & transfer
    // ---------------------------------------------------------------------

    #[instrument(skip(self, actor, adj), fields(actor_id = %actor.actor_id, product_id = %adj.product_id, location_id = %adj.location_id, adjustment = adj.adjustment), err)]
    pub async fn adjust_stock(
        &self,
        actor: &Actor,
        adj: &StockAdjustment,
    ) -> StockResult<AdjustmentOutcome> {
        require_reason(&adj.reason)?;
        self.authorize_locations(actor, &[adj.location_id]).await?;

        let key = StockKey::new(adj.product_id, adj.location_id);
        let batch = LedgerBatch::single(key, StockChange::Adjust(adj.adjustment), Utc::now());
        let applied = take_single(self.ledger.commit(batch).await?)?;

        let movement = MovementRecord::new(
            StockItem::Product(adj.product_id),
            Some(adj.location_id),
            MovementType::Adjustment,
            adj.adjustment,
            Direction::of_delta(adj.adjustment),
            applied.after.updated_at.unwrap_or_else(Utc::now),
        )
        .notes(Some(adj.reason.clone()))
        .actor(Some(actor.actor_id));
        self.record(vec![movement]).await;

        Ok(AdjustmentOutcome {
            success: true,
            previous_quantity: applied.before.on_hand,
            new_quantity: applied.after.on_hand,
            adjustment: adj.adjustment,
            packaging_item_id: None,
            location_id: Some(adj.location_id),
        })
    }

    /// Move free quantity between locations. Both legs commit together.
    #[instrument(skip(self, actor, transfer), fields(actor_id = %actor.actor_id, product_id = %transfer.product_id, from = %transfer.from_location_id, to = %transfer.to_location_id, quantity = transfer.quantity), err)]
    pub async fn transfer_stock(
        &self,
        actor: &Actor,
        transfer: &StockTransfer,
    ) -> StockResult<TransferOutcome> {
        ensure_positive("quantity", transfer.quantity)?;
        if transfer.from_location_id == transfer.to_location_id {
            return Err(StockError::invalid_operation(
                "transfer source and destination must differ",
            ));
        }
        self.authorize_locations(actor, &[transfer.from_location_id, transfer.to_location_id])
            .await?;

        let source = StockKey::new(transfer.product_id, transfer.from_location_id);
        let destination = StockKey::new(transfer.product_id, transfer.to_location_id);
        let batch = LedgerBatch::new(Utc::now())
            .with(source, StockChange::TransferOut(transfer.quantity))
            .with(destination, StockChange::TransferIn(transfer.quantity));
        let [source_applied, dest_applied]: [Applied; 2] = self
            .ledger
            .commit(batch)
            .await?
            .try_into()
            .map_err(|_| StockError::storage("ledger returned a partial transfer result"))?;

        let movement = MovementRecord::new(
            StockItem::Product(transfer.product_id),
            Some(transfer.from_location_id),
            MovementType::Transfer,
            transfer.quantity,
            Direction::Out,
            source_applied.after.updated_at.unwrap_or_else(Utc::now),
        )
        .destination(transfer.to_location_id)
        .notes(transfer.notes.clone())
        .actor(Some(actor.actor_id));
        self.record(vec![movement]).await;

        Ok(TransferOutcome {
            success: true,
            quantity: transfer.quantity,
            source: StockLevels::from(&source_applied.after),
            destination: StockLevels::from(&dest_applied.after),
        })
    }

    /// Central packaging when `location_id` is absent; outlet packaging
    /// (location-authorized) otherwise.
    #[instrument(skip(self, actor, adj), fields(actor_id = %actor.actor_id, packaging_item_id = %adj.packaging_item_id, adjustment = adj.adjustment), err)]
    pub async fn adjust_packaging_stock(
        &self,
        actor: &Actor,
        adj: &PackagingAdjustment,
    ) -> StockResult<AdjustmentOutcome> {
        require_reason(&adj.reason)?;
        let key = match adj.location_id {
            Some(location) => {
                self.authorize_locations(actor, &[location]).await?;
                PackagingKey::at(adj.packaging_item_id, location)
            }
            None => PackagingKey::central(adj.packaging_item_id),
        };

        let (before, after) = self
            .ledger
            .adjust_packaging(key, adj.adjustment, Utc::now())
            .await?;

        let movement = MovementRecord::new(
            StockItem::Packaging(adj.packaging_item_id),
            adj.location_id,
            MovementType::Adjustment,
            adj.adjustment,
            Direction::of_delta(adj.adjustment),
            after.updated_at.unwrap_or_else(Utc::now),
        )
        .notes(Some(adj.reason.clone()))
        .actor(Some(actor.actor_id));
        self.record(vec![movement]).await;

        Ok(AdjustmentOutcome {
            success: true,
            previous_quantity: before.quantity,
            new_quantity: after.quantity,
            adjustment: adj.adjustment,
            packaging_item_id: Some(adj.packaging_item_id),
            location_id: adj.location_id,
        })
    }

    // ---------------------------------------------------------------------
    // Bundles
    // ---------------------------------------------------------------------

    /// Weakest-link availability for bundles; plain availability otherwise.
    #[instrument(skip(self), fields(product_id = %query.product_id, location_id = %query.location_id), err)]
    pub async fn check_bundle_availability(&self, query: &AvailabilityQuery) -> StockResult<Outcome> {
        ensure_positive("quantity", query.quantity)?;
        if !self.catalog.is_bundle(query.product_id).await? {
            return self.check_availability(query).await.map(Outcome::Availability);
        }

        let definition = self
            .catalog
            .definition(query.product_id)
            .await?
            .ok_or_else(|| no_components(query.product_id))?;

        let mut available = HashMap::new();
        for component in definition.components() {
            let record = self
                .ledger
                .get(StockKey::new(component.component_id, query.location_id))
                .await?;
            available.insert(component.component_id, record.available());
        }

        let report = definition.evaluate(query.location_id, query.quantity, |id| {
            available.get(&id).copied().unwrap_or(0)
        });
        Ok(Outcome::BundleAvailability(report))
    }

    #[instrument(skip(self, actor, line), fields(actor_id = %actor.actor_id, bundle_id = %line.product_id, location_id = %line.location_id, quantity = line.quantity), err)]
    pub async fn reserve_bundle_stock(&self, actor: &Actor, line: &OrderLine) -> StockResult<BundleOutcome> {
        self.fan_out(actor, Lifecycle::Reserve, line).await
    }

    #[instrument(skip(self, actor, line), fields(actor_id = %actor.actor_id, bundle_id = %line.product_id, location_id = %line.location_id, quantity = line.quantity), err)]
    pub async fn release_bundle_stock(&self, actor: &Actor, line: &OrderLine) -> StockResult<BundleOutcome> {
        self.fan_out(actor, Lifecycle::Release, line).await
    }

    #[instrument(skip(self, actor, line), fields(actor_id = %actor.actor_id, bundle_id = %line.product_id, location_id = %line.location_id, quantity = line.quantity), err)]
    pub async fn record_bundle_sale(&self, actor: &Actor, line: &OrderLine) -> StockResult<BundleOutcome> {
        self.fan_out(actor, Lifecycle::Sale, line).await
    }

    /// Apply `step` to every component of the bundle in one batch.
    ///
    /// A product that is not a bundle is treated as a bundle of itself.
    async fn fan_out(
        &self,
        actor: &Actor,
        step: Lifecycle,
        line: &OrderLine,
    ) -> StockResult<BundleOutcome> {
        ensure_positive("quantity", line.quantity)?;

        let requirements = if self.catalog.is_bundle(line.product_id).await? {
            self.catalog
                .definition(line.product_id)
                .await?
                .ok_or_else(|| no_components(line.product_id))?
                .requirements(line.quantity)?
        } else {
            vec![(line.product_id, line.quantity)]
        };

        let mut batch = LedgerBatch::new(Utc::now());
        for (component_id, quantity) in &requirements {
            batch.push(
                StockKey::new(*component_id, line.location_id),
                step.change(*quantity),
            );
        }
        let applied = self.ledger.commit(batch).await?;

        let context = format!("bundle {}", line.product_id);
        let mut movements = Vec::with_capacity(applied.len());
        let mut components = Vec::with_capacity(applied.len());
        for ((_, quantity), applied) in requirements.iter().zip(&applied) {
            if step == Lifecycle::Release && applied.clamped > 0 {
                warn!(
                    key = %applied.after.key,
                    bundle_id = %line.product_id,
                    requested = *quantity,
                    clamped = applied.clamped,
                    "bundle component release exceeded reserved quantity; clamped at zero"
                );
            }
            movements.push(step.movement(
                actor,
                applied,
                *quantity,
                line.order_id.clone(),
                Some(&context),
            ));
            components.push(stock_outcome(applied, *quantity));
        }
        self.record(movements).await;

        Ok(BundleOutcome {
            success: true,
            bundle_id: line.product_id,
            location_id: line.location_id,
            quantity: line.quantity,
            components,
        })
    }

    // ---------------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------------

    /// Location-scoped actors must be assigned (as manager or staff) to
    /// every location touched; unrestricted actors pass.
    async fn authorize_locations(&self, actor: &Actor, locations: &[LocationId]) -> StockResult<()> {
        let principal = self.policy.resolve(actor);
        if !principal.is_location_scoped() {
            return Ok(());
        }

        let assignments = self.directory.assignments(actor.actor_id).await?;
        for location in locations {
            if let Err(e) = principal.authorize_location(*location, &assignments) {
                warn!(actor_id = %actor.actor_id, location_id = %location, "location authorization denied");
                return Err(e.into());
            }
        }
        Ok(())
    }

    /// Append movements after a committed change. The audit trail is
    /// best-effort: a failure here is logged and never undoes the change.
    async fn record(&self, movements: Vec<MovementRecord>) {
        let count = movements.len();
        if let Err(e) = self.movements.append(movements).await {
            error!(error = %e, count, "failed to append movement log entries");
        }
    }
}

fn require_reason(reason: &str) -> StockResult<()> {
    if reason.trim().is_empty() {
        return Err(StockError::validation("reason is required"));
    }
    Ok(())
}

fn no_components(bundle_id: ProductId) -> StockError {
    StockError::not_found(format!("bundle {bundle_id} has no components"))
}
