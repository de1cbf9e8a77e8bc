//! Dispatch vocabulary: operation names and their payloads.
//!
//! Callers send `{ "operation": "<name>", "data": { ... } }`. The name is
//! resolved to an [`Operation`], then the payload is decoded into the typed
//! [`Command`] for that operation. Payload fields are camelCase.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use stockroom_core::{LocationId, PackagingItemId, ProductId, StockError, StockResult};

/// Raw request as received on the dispatch surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub operation: String,
    #[serde(default)]
    pub data: JsonValue,
}

impl DispatchRequest {
    pub fn new(operation: impl Into<String>, data: JsonValue) -> Self {
        Self {
            operation: operation.into(),
            data,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Operation {
    CheckAvailability,
    ReserveStock,
    ReleaseStock,
    RecordSale,
    ProcessReturn,
    AdjustStock,
    TransferStock,
    AdjustPackagingStock,
    CheckBundleAvailability,
    ReserveBundleStock,
    ReleaseBundleStock,
    RecordBundleSale,
}

impl Operation {
    pub const ALL: [Operation; 12] = [
        Operation::CheckAvailability,
        Operation::ReserveStock,
        Operation::ReleaseStock,
        Operation::RecordSale,
        Operation::ProcessReturn,
        Operation::AdjustStock,
        Operation::TransferStock,
        Operation::AdjustPackagingStock,
        Operation::CheckBundleAvailability,
        Operation::ReserveBundleStock,
        Operation::ReleaseBundleStock,
        Operation::RecordBundleSale,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::CheckAvailability => "checkAvailability",
            Operation::ReserveStock => "reserveStock",
            Operation::ReleaseStock => "releaseStock",
            Operation::RecordSale => "recordSale",
            Operation::ProcessReturn => "processReturn",
            Operation::AdjustStock => "adjustStock",
            Operation::TransferStock => "transferStock",
            Operation::AdjustPackagingStock => "adjustPackagingStock",
            Operation::CheckBundleAvailability => "checkBundleAvailability",
            Operation::ReserveBundleStock => "reserveBundleStock",
            Operation::ReleaseBundleStock => "releaseBundleStock",
            Operation::RecordBundleSale => "recordBundleSale",
        }
    }

    /// Read-only operations never touch the ledger's write path.
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            Operation::CheckAvailability | Operation::CheckBundleAvailability
        )
    }
}

impl core::fmt::Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Operation {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| StockError::invalid_operation(s))
    }
}

/// `checkAvailability` / `checkBundleAvailability`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub product_id: ProductId,
    pub location_id: LocationId,
    pub quantity: i64,
}

/// Reservation lifecycle line (`reserveStock`, `releaseStock`, `recordSale`
/// and their bundle counterparts).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub location_id: LocationId,
    pub quantity: i64,
    #[serde(default, alias = "referenceId")]
    pub order_id: Option<String>,
}

/// `processReturn`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnLine {
    pub product_id: ProductId,
    pub location_id: LocationId,
    pub quantity: i64,
    #[serde(default, alias = "referenceId")]
    pub return_id: Option<String>,
}

/// `adjustStock`: signed correction with a human reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustment {
    pub product_id: ProductId,
    pub location_id: LocationId,
    pub adjustment: i64,
    pub reason: String,
}

/// `transferStock`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockTransfer {
    pub product_id: ProductId,
    pub from_location_id: LocationId,
    pub to_location_id: LocationId,
    pub quantity: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

/// `adjustPackagingStock`; central unless `locationId` is given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackagingAdjustment {
    pub packaging_item_id: PackagingItemId,
    pub adjustment: i64,
    pub reason: String,
    #[serde(default)]
    pub location_id: Option<LocationId>,
}

/// A decoded dispatch request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CheckAvailability(AvailabilityQuery),
    ReserveStock(OrderLine),
    ReleaseStock(OrderLine),
    RecordSale(OrderLine),
    ProcessReturn(ReturnLine),
    AdjustStock(StockAdjustment),
    TransferStock(StockTransfer),
    AdjustPackagingStock(PackagingAdjustment),
    CheckBundleAvailability(AvailabilityQuery),
    ReserveBundleStock(OrderLine),
    ReleaseBundleStock(OrderLine),
    RecordBundleSale(OrderLine),
}

impl Command {
    /// Resolve the operation name, then decode its payload.
    ///
    /// Unknown names fail with `InvalidOperation`; payloads that do not fit
    /// the operation fail with `Validation`.
    pub fn parse(request: DispatchRequest) -> StockResult<Command> {
        let operation: Operation = request.operation.parse()?;
        let data = request.data;

        Ok(match operation {
            Operation::CheckAvailability => Command::CheckAvailability(decode(operation, data)?),
            Operation::ReserveStock => Command::ReserveStock(decode(operation, data)?),
            Operation::ReleaseStock => Command::ReleaseStock(decode(operation, data)?),
            Operation::RecordSale => Command::RecordSale(decode(operation, data)?),
            Operation::ProcessReturn => Command::ProcessReturn(decode(operation, data)?),
            Operation::AdjustStock => Command::AdjustStock(decode(operation, data)?),
            Operation::TransferStock => Command::TransferStock(decode(operation, data)?),
            Operation::AdjustPackagingStock => {
                Command::AdjustPackagingStock(decode(operation, data)?)
            }
            Operation::CheckBundleAvailability => {
                Command::CheckBundleAvailability(decode(operation, data)?)
            }
            Operation::ReserveBundleStock => Command::ReserveBundleStock(decode(operation, data)?),
            Operation::ReleaseBundleStock => Command::ReleaseBundleStock(decode(operation, data)?),
            Operation::RecordBundleSale => Command::RecordBundleSale(decode(operation, data)?),
        })
    }

    pub fn operation(&self) -> Operation {
        match self {
            Command::CheckAvailability(_) => Operation::CheckAvailability,
            Command::ReserveStock(_) => Operation::ReserveStock,
            Command::ReleaseStock(_) => Operation::ReleaseStock,
            Command::RecordSale(_) => Operation::RecordSale,
            Command::ProcessReturn(_) => Operation::ProcessReturn,
            Command::AdjustStock(_) => Operation::AdjustStock,
            Command::TransferStock(_) => Operation::TransferStock,
            Command::AdjustPackagingStock(_) => Operation::AdjustPackagingStock,
            Command::CheckBundleAvailability(_) => Operation::CheckBundleAvailability,
            Command::ReserveBundleStock(_) => Operation::ReserveBundleStock,
            Command::ReleaseBundleStock(_) => Operation::ReleaseBundleStock,
            Command::RecordBundleSale(_) => Operation::RecordBundleSale,
        }
    }
}

fn decode<T: DeserializeOwned>(operation: Operation, data: JsonValue) -> StockResult<T> {
    serde_json::from_value(data)
        .map_err(|e| StockError::validation(format!("invalid payload for {operation}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_operation_name_round_trips() {
        for op in Operation::ALL {
            assert_eq!(op.as_str().parse::<Operation>().unwrap(), op);
        }
    }

    #[test]
    fn unknown_operation_is_invalid_operation() {
        let err = Command::parse(DispatchRequest::new("teleportStock", json!({}))).unwrap_err();
        assert_eq!(err, StockError::invalid_operation("teleportStock"));
    }

    #[test]
    fn reserve_payload_decodes_with_reference_alias() {
        let product = ProductId::new();
        let location = LocationId::new();
        let cmd = Command::parse(DispatchRequest::new(
            "reserveStock",
            json!({
                "productId": product,
                "locationId": location,
                "quantity": 3,
                "referenceId": "SO-1001",
            }),
        ))
        .unwrap();

        assert_eq!(
            cmd,
            Command::ReserveStock(OrderLine {
                product_id: product,
                location_id: location,
                quantity: 3,
                order_id: Some("SO-1001".to_string()),
            })
        );
        assert_eq!(cmd.operation(), Operation::ReserveStock);
    }

    #[test]
    fn malformed_payload_is_a_validation_error() {
        let err = Command::parse(DispatchRequest::new(
            "adjustStock",
            json!({ "productId": "nope", "adjustment": 1 }),
        ))
        .unwrap_err();
        assert!(matches!(err, StockError::Validation(msg) if msg.contains("adjustStock")));
    }

    #[test]
    fn packaging_location_is_optional() {
        let cmd = Command::parse(DispatchRequest::new(
            "adjustPackagingStock",
            json!({
                "packagingItemId": PackagingItemId::new(),
                "adjustment": -2,
                "reason": "damaged",
            }),
        ))
        .unwrap();
        match cmd {
            Command::AdjustPackagingStock(p) => assert!(p.location_id.is_none()),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
