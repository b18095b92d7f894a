//! `siphon-inventory` — audited stock movements.
//!
//! Every change to a product's stock quantity is paired with a
//! `StockOperation` audit row. The arithmetic here is pure; the atomic
//! "write the audit row and the new quantity together" pairing is the
//! storage layer's contract.

pub mod operation;

pub use operation::{
    NewStockOperation, StockError, StockOperation, StockOperationType, derive_operation,
};
