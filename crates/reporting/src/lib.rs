//! `siphon-reporting` — financial report snapshots.
//!
//! A report is a manually triggered snapshot, not a live view: an admin asks
//! for one, the totals are computed from the data at that moment and stored.

pub mod report;

pub use report::{FinancialReport, NewFinancialReport, snapshot};
