//! `siphon-parties` — principal records: customers, employees, suppliers.
//!
//! These are the three tables a login username is looked up in. Each record
//! may carry credentials (`username` + `password_hash`); rows created by an
//! admin without credentials exist but cannot authenticate.

pub mod customer;
pub mod employee;
pub mod supplier;

pub use customer::{Customer, NewCustomer};
pub use employee::{Employee, NewEmployee};
pub use supplier::{NewSupplier, Supplier};
