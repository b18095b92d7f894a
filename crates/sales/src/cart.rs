//! Session-scoped checkout cart.
//!
//! A value object owned by a client session: every operation returns a new
//! cart instead of mutating shared state, which keeps the arithmetic trivially
//! testable. The cart only ever lives in memory; it reaches storage as line
//! items at checkout.

use std::collections::BTreeMap;

use siphon_core::ProductId;

use crate::order::LineItem;

/// Immutable cart keyed by product id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    items: BTreeMap<ProductId, i64>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` of a product, merging with any existing line.
    /// Non-positive quantities leave the cart unchanged.
    pub fn add(&self, product_id: ProductId, quantity: i64) -> Cart {
        if quantity <= 0 {
            return self.clone();
        }
        let mut items = self.items.clone();
        *items.entry(product_id).or_insert(0) += quantity;
        Cart { items }
    }

    /// Drop a product's line entirely.
    pub fn remove(&self, product_id: ProductId) -> Cart {
        let mut items = self.items.clone();
        items.remove(&product_id);
        Cart { items }
    }

    /// Set a product's quantity. Zero or negative removes the line.
    pub fn change_quantity(&self, product_id: ProductId, quantity: i64) -> Cart {
        let mut items = self.items.clone();
        if quantity <= 0 {
            items.remove(&product_id);
        } else {
            items.insert(product_id, quantity);
        }
        Cart { items }
    }

    pub fn quantity_of(&self, product_id: ProductId) -> i64 {
        self.items.get(&product_id).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Materialize the cart as checkout line items.
    pub fn line_items(&self) -> Vec<LineItem> {
        self.items
            .iter()
            .map(|(&product_id, &quantity)| LineItem {
                product_id,
                quantity,
            })
            .collect()
    }
}
