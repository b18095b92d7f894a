//! `siphon-products` — the product catalog: products and their category tree.

pub mod category;
pub mod product;

pub use category::{NewCategory, ProductCategory};
pub use product::{NewProduct, Product};
