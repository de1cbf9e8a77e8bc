//! Movement log entries (immutable audit trail).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{ActorId, LocationId, MovementId, PackagingItemId, ProductId};

/// What a movement is about: catalog stock or packaging stock.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum StockItem {
    Product(ProductId),
    Packaging(PackagingItemId),
}

impl core::fmt::Display for StockItem {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StockItem::Product(id) => write!(f, "product {id}"),
            StockItem::Packaging(id) => write!(f, "packaging item {id}"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Sale,
    Return,
    Adjustment,
    Transfer,
    /// Quantity promised to an order; no physical change.
    Reservation,
    /// Reservation handed back; no physical change.
    Release,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Sale => "sale",
            MovementType::Return => "return",
            MovementType::Adjustment => "adjustment",
            MovementType::Transfer => "transfer",
            MovementType::Reservation => "reservation",
            MovementType::Release => "release",
        }
    }
}

impl core::str::FromStr for MovementType {
    type Err = stockroom_core::StockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sale" => Ok(MovementType::Sale),
            "return" => Ok(MovementType::Return),
            "adjustment" => Ok(MovementType::Adjustment),
            "transfer" => Ok(MovementType::Transfer),
            "reservation" => Ok(MovementType::Reservation),
            "release" => Ok(MovementType::Release),
            other => Err(stockroom_core::StockError::validation(format!(
                "unknown movement type '{other}'"
            ))),
        }
    }
}

/// Direction of the physical quantity recorded on a movement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    In,
    Out,
    /// Reservation bookkeeping only.
    None,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
            Direction::None => "none",
        }
    }

    pub fn of_delta(delta: i64) -> Self {
        match delta {
            d if d > 0 => Direction::In,
            d if d < 0 => Direction::Out,
            _ => Direction::None,
        }
    }
}

impl core::str::FromStr for Direction {
    type Err = stockroom_core::StockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(Direction::In),
            "out" => Ok(Direction::Out),
            "none" => Ok(Direction::None),
            other => Err(stockroom_core::StockError::validation(format!(
                "unknown movement direction '{other}'"
            ))),
        }
    }
}

/// One immutable audit entry.
///
/// `quantity` is always non-negative; `direction` carries the sign. For
/// reservation/release movements `quantity` is the reserved amount and
/// `direction` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRecord {
    pub id: MovementId,
    pub item: StockItem,
    pub location_id: Option<LocationId>,
    pub destination_location_id: Option<LocationId>,
    pub quantity: i64,
    pub direction: Direction,
    pub movement_type: MovementType,
    pub reference_id: Option<String>,
    pub notes: Option<String>,
    pub actor_id: Option<ActorId>,
    pub created_at: DateTime<Utc>,
}

impl MovementRecord {
    /// Start a movement with the mandatory fields; optional ones are added
    /// with the builder methods.
    pub fn new(
        item: StockItem,
        location_id: Option<LocationId>,
        movement_type: MovementType,
        quantity: i64,
        direction: Direction,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MovementId::new(),
            item,
            location_id,
            destination_location_id: None,
            quantity: quantity.abs(),
            direction,
            movement_type,
            reference_id: None,
            notes: None,
            actor_id: None,
            created_at,
        }
    }

    pub fn reference(mut self, reference_id: Option<String>) -> Self {
        self.reference_id = reference_id;
        self
    }

    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    pub fn actor(mut self, actor_id: Option<ActorId>) -> Self {
        self.actor_id = actor_id;
        self
    }

    pub fn destination(mut self, location_id: LocationId) -> Self {
        self.destination_location_id = Some(location_id);
        self
    }

    /// Signed physical delta (reservation bookkeeping is zero).
    pub fn signed_quantity(&self) -> i64 {
        match self.direction {
            Direction::In => self.quantity,
            Direction::Out => -self.quantity,
            Direction::None => 0,
        }
    }
}

/// Query over the movement log. Empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementFilter {
    pub item: Option<StockItem>,
    pub location_id: Option<LocationId>,
    pub reference_id: Option<String>,
    pub movement_type: Option<MovementType>,
    pub limit: Option<usize>,
}

impl MovementFilter {
    /// Matches when the movement touches the filtered location on either leg.
    pub fn matches(&self, movement: &MovementRecord) -> bool {
        if let Some(item) = &self.item {
            if &movement.item != item {
                return false;
            }
        }
        if let Some(location) = self.location_id {
            if movement.location_id != Some(location)
                && movement.destination_location_id != Some(location)
            {
                return false;
            }
        }
        if let Some(reference) = &self.reference_id {
            if movement.reference_id.as_deref() != Some(reference.as_str()) {
                return false;
            }
        }
        if let Some(kind) = self.movement_type {
            if movement.movement_type != kind {
                return false;
            }
        }
        true
    }
}
