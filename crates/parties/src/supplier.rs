use serde::{Deserialize, Serialize};

use siphon_core::{DomainError, DomainResult, SupplierId};

/// Supplier record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: SupplierId,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub username: Option<String>,
    pub password_hash: Option<String>,
}

/// Payload for creating a supplier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSupplier {
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub username: Option<String>,
    pub password_hash: Option<String>,
}

impl NewSupplier {
    pub fn validate(&self) -> DomainResult<()> {
        DomainError::require_field("name", &self.name)?;
        DomainError::require_field("phone", &self.phone)?;
        Ok(())
    }

    pub fn into_record(self, id: SupplierId) -> Supplier {
        Supplier {
            id,
            name: self.name.trim().to_string(),
            contact_person: self.contact_person,
            phone: self.phone.trim().to_string(),
            email: self.email,
            address: self.address,
            username: self.username,
            password_hash: self.password_hash,
        }
    }
}

impl Supplier {
    /// Apply a profile update. Credentials are untouched: the supplier update
    /// flow never carries a password.
    pub fn apply_update(&mut self, update: NewSupplier) -> DomainResult<()> {
        update.validate()?;
        self.name = update.name.trim().to_string();
        self.contact_person = update.contact_person;
        self.phone = update.phone.trim().to_string();
        self.email = update.email;
        self.address = update.address;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_never_touches_credentials() {
        let mut supplier = NewSupplier {
            name: "SantehTorg".into(),
            contact_person: None,
            phone: "+7 812 000-00-02".into(),
            email: None,
            address: None,
            username: Some("santeh".into()),
            password_hash: Some("$argon2id$stub".into()),
        }
        .into_record(SupplierId::new(2));

        let update = NewSupplier {
            name: "SantehTorg LLC".into(),
            contact_person: Some("D. Orlov".into()),
            phone: "+7 812 000-00-02".into(),
            email: None,
            address: None,
            username: None,
            password_hash: None,
        };
        supplier.apply_update(update).unwrap();

        assert_eq!(supplier.name, "SantehTorg LLC");
        assert_eq!(supplier.username.as_deref(), Some("santeh"));
        assert_eq!(supplier.password_hash.as_deref(), Some("$argon2id$stub"));
    }
}
