use serde::{Deserialize, Serialize};

use siphon_core::{CustomerId, DomainError, DomainResult};

/// Customer record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub username: Option<String>,
    pub password_hash: Option<String>,
}

/// Payload for creating a customer. Validated before any row is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub username: Option<String>,
    pub password_hash: Option<String>,
}

impl NewCustomer {
    pub fn validate(&self) -> DomainResult<()> {
        DomainError::require_field("full_name", &self.full_name)?;
        DomainError::require_field("phone", &self.phone)?;
        Ok(())
    }

    pub fn into_record(self, id: CustomerId) -> Customer {
        Customer {
            id,
            full_name: self.full_name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: self.email,
            address: self.address,
            username: self.username,
            password_hash: self.password_hash,
        }
    }
}

impl Customer {
    /// Apply a profile update. Username is immutable; credentials change only
    /// when a new hash is supplied.
    pub fn apply_update(&mut self, update: NewCustomer) -> DomainResult<()> {
        update.validate()?;
        self.full_name = update.full_name.trim().to_string();
        self.phone = update.phone.trim().to_string();
        self.email = update.email;
        self.address = update.address;
        if let Some(hash) = update.password_hash {
            self.password_hash = Some(hash);
        }
        Ok(())
    }
}
