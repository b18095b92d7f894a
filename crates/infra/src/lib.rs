//! `siphon-infra` — storage backends.
//!
//! The [`Store`] trait is the single persistence boundary the HTTP layer
//! talks to. Two implementations ship: [`MemoryStore`] (default, one mutex,
//! good for tests and demos) and a Postgres store behind the `postgres`
//! feature. Both uphold the same contracts:
//!
//! * an order header and its lines are created together or not at all;
//! * a stock operation row and the product's new quantity land together.

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod store;

pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PgStore;
pub use store::{OrderDetailRow, Store, StoreError, StoreResult};
