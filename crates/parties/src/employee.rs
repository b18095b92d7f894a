use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use siphon_core::{DomainError, DomainResult, EmployeeId};

/// Employee record. Employees authenticate with the `admin` role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub full_name: String,
    pub position: String,
    pub phone: String,
    pub hire_date: NaiveDate,
    pub username: Option<String>,
    pub password_hash: Option<String>,
}

/// Payload for creating an employee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployee {
    pub full_name: String,
    pub position: String,
    pub phone: String,
    pub hire_date: NaiveDate,
    pub username: Option<String>,
    pub password_hash: Option<String>,
}

impl NewEmployee {
    pub fn validate(&self) -> DomainResult<()> {
        DomainError::require_field("full_name", &self.full_name)?;
        DomainError::require_field("position", &self.position)?;
        DomainError::require_field("phone", &self.phone)?;
        Ok(())
    }

    pub fn into_record(self, id: EmployeeId) -> Employee {
        Employee {
            id,
            full_name: self.full_name.trim().to_string(),
            position: self.position.trim().to_string(),
            phone: self.phone.trim().to_string(),
            hire_date: self.hire_date,
            username: self.username,
            password_hash: self.password_hash,
        }
    }
}

impl Employee {
    pub fn apply_update(&mut self, update: NewEmployee) -> DomainResult<()> {
        update.validate()?;
        self.full_name = update.full_name.trim().to_string();
        self.position = update.position.trim().to_string();
        self.phone = update.phone.trim().to_string();
        self.hire_date = update.hire_date;
        if let Some(hash) = update.password_hash {
            self.password_hash = Some(hash);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_is_required() {
        let payload = NewEmployee {
            full_name: "Oleg Markov".into(),
            position: "".into(),
            phone: "+7 900 000-00-01".into(),
            hire_date: NaiveDate::from_ymd_opt(2023, 4, 1).unwrap(),
            username: None,
            password_hash: None,
        };
        assert_eq!(payload.validate(), Err(DomainError::MissingField("position")));
    }
}
