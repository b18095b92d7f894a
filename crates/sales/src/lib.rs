//! `siphon-sales` — orders, order lines, and the checkout cart.
//!
//! Totals are computed here, server-side, from price snapshots taken at
//! order time. Creating the order row and its lines together is the storage
//! layer's atomicity contract; the pricing and status rules are pure.

pub mod cart;
pub mod order;

pub use cart::Cart;
pub use order::{
    LineItem, NewOrder, NewOrderLine, Order, OrderDetail, OrderError, OrderStatus, price_lines,
};
