use serde::{Deserialize, Serialize};

use siphon_core::{CategoryId, DomainError, DomainResult};

/// Product category. `parent_id` forms a tree; the only structural check is
/// that a category cannot be its own parent. Deeper cycles are not detected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCategory {
    pub id: CategoryId,
    pub name: String,
    pub parent_id: Option<CategoryId>,
}

/// Payload for creating or updating a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub parent_id: Option<CategoryId>,
}

impl NewCategory {
    pub fn validate(&self) -> DomainResult<()> {
        DomainError::require_field("name", &self.name)?;
        Ok(())
    }

    pub fn into_record(self, id: CategoryId) -> ProductCategory {
        ProductCategory {
            id,
            name: self.name.trim().to_string(),
            parent_id: self.parent_id,
        }
    }
}

impl ProductCategory {
    pub fn apply_update(&mut self, update: NewCategory) -> DomainResult<()> {
        update.validate()?;
        if update.parent_id == Some(self.id) {
            return Err(DomainError::validation("category cannot be its own parent"));
        }
        self.name = update.name.trim().to_string();
        self.parent_id = update.parent_id;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_cannot_become_its_own_parent() {
        let mut category = NewCategory {
            name: "Fittings".into(),
            parent_id: None,
        }
        .into_record(CategoryId::new(3));

        let err = category
            .apply_update(NewCategory {
                name: "Fittings".into(),
                parent_id: Some(CategoryId::new(3)),
            })
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(category.parent_id, None);
    }
}
