use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use siphon_core::{CategoryId, DomainError, DomainResult, ProductId, SupplierId, round_money};

/// Product record.
///
/// `stock_quantity` is mutated only through stock operations (audited) or a
/// full admin edit; it never goes negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category_id: CategoryId,
    pub supplier_id: SupplierId,
    pub price: Decimal,
    pub description: Option<String>,
    pub stock_quantity: i64,
}

/// Payload for creating or replacing a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub category_id: CategoryId,
    pub supplier_id: SupplierId,
    pub price: Decimal,
    pub description: Option<String>,
    pub stock_quantity: i64,
}

impl NewProduct {
    pub fn validate(&self) -> DomainResult<()> {
        DomainError::require_field("name", &self.name)?;
        if self.price < Decimal::ZERO {
            return Err(DomainError::validation("price must not be negative"));
        }
        if self.stock_quantity < 0 {
            return Err(DomainError::validation("stock_quantity must not be negative"));
        }
        Ok(())
    }

    pub fn into_record(self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name.trim().to_string(),
            category_id: self.category_id,
            supplier_id: self.supplier_id,
            price: round_money(self.price),
            description: self.description,
            stock_quantity: self.stock_quantity,
        }
    }
}

impl Product {
    pub fn apply_update(&mut self, update: NewProduct) -> DomainResult<()> {
        update.validate()?;
        self.name = update.name.trim().to_string();
        self.category_id = update.category_id;
        self.supplier_id = update.supplier_id;
        self.price = round_money(update.price);
        self.description = update.description;
        self.stock_quantity = update.stock_quantity;
        Ok(())
    }
}
