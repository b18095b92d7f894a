//! Strongly-typed identifiers used across the domain.
//!
//! Records are keyed by integer serial ids assigned by storage. Wrapping them
//! in newtypes keeps a `ProductId` from silently standing in for an `OrderId`.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

macro_rules! impl_record_id {
    ($t:ident, $name:literal) => {
        #[doc = concat!("Identifier of a ", $name, " row.")]
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(i64);

        impl $t {
            pub fn new(raw: i64) -> Self {
                Self(raw)
            }

            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $t {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for i64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = i64::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", stringify!($t), e)))?;
                Ok(Self(raw))
            }
        }
    };
}

impl_record_id!(CustomerId, "customer");
impl_record_id!(EmployeeId, "employee");
impl_record_id!(SupplierId, "supplier");
impl_record_id!(CategoryId, "product category");
impl_record_id!(ProductId, "product");
impl_record_id!(OrderId, "order");
impl_record_id!(OrderDetailId, "order detail");
impl_record_id!(StockOperationId, "stock operation");
impl_record_id!(ReportId, "financial report");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_strings() {
        let id: ProductId = "42".parse().unwrap();
        assert_eq!(id, ProductId::new(42));
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn non_numeric_id_is_rejected() {
        let err = "pipe".parse::<OrderId>().unwrap_err();
        assert!(matches!(err, DomainError::InvalidId(_)));
    }
}
