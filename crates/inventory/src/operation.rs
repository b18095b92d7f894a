use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use siphon_core::{EmployeeId, ProductId, StockOperationId};

/// Stock movement failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StockError {
    /// An outbound operation would drive stock below zero.
    #[error("insufficient stock: have {available}, requested {requested}")]
    Insufficient { available: i64, requested: i64 },

    /// Operation quantities are strictly positive.
    #[error("quantity must be positive")]
    NonPositiveQuantity,
}

/// Direction of a stock movement. Wire values are the Russian strings stored
/// in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockOperationType {
    #[serde(rename = "приход")]
    Inbound,
    #[serde(rename = "расход")]
    Outbound,
}

impl StockOperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockOperationType::Inbound => "приход",
            StockOperationType::Outbound => "расход",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "приход" | "inbound" => Some(StockOperationType::Inbound),
            "расход" | "outbound" => Some(StockOperationType::Outbound),
            _ => None,
        }
    }

    /// Apply this movement to a stock level. Fails without side effects when
    /// the quantity is non-positive or an outbound would go negative.
    pub fn apply_to(&self, stock: i64, quantity: i64) -> Result<i64, StockError> {
        if quantity <= 0 {
            return Err(StockError::NonPositiveQuantity);
        }
        match self {
            StockOperationType::Inbound => Ok(stock + quantity),
            StockOperationType::Outbound => {
                if quantity > stock {
                    Err(StockError::Insufficient {
                        available: stock,
                        requested: quantity,
                    })
                } else {
                    Ok(stock - quantity)
                }
            }
        }
    }
}

/// Audit row recorded alongside every stock change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockOperation {
    pub id: StockOperationId,
    pub product_id: ProductId,
    pub operation_type: StockOperationType,
    pub quantity: i64,
    pub operation_date: DateTime<Utc>,
    pub employee_id: EmployeeId,
}

/// Payload for recording a stock operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStockOperation {
    pub product_id: ProductId,
    pub operation_type: StockOperationType,
    pub quantity: i64,
    pub operation_date: DateTime<Utc>,
    pub employee_id: EmployeeId,
}

impl NewStockOperation {
    pub fn into_record(self, id: StockOperationId) -> StockOperation {
        StockOperation {
            id,
            product_id: self.product_id,
            operation_type: self.operation_type,
            quantity: self.quantity,
            operation_date: self.operation_date,
            employee_id: self.employee_id,
        }
    }
}

/// Derive a movement from an admin stock edit: the difference between the old
/// and new quantity. Zero difference means no operation at all.
pub fn derive_operation(old_quantity: i64, new_quantity: i64) -> Option<(StockOperationType, i64)> {
    let diff = new_quantity - old_quantity;
    match diff {
        0 => None,
        d if d > 0 => Some((StockOperationType::Inbound, d)),
        d => Some((StockOperationType::Outbound, -d)),
    }
}
