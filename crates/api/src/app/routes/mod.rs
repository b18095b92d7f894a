use axum::{Router, routing::get};

pub mod auth;
pub mod categories;
pub mod customers;
pub mod employees;
pub mod order_details;
pub mod orders;
pub mod products;
pub mod reports;
pub mod stock;
pub mod suppliers;
pub mod system;

/// Router for all authenticated endpoints. The caller applies the bearer
/// middleware; `/auth/login`, `/health`, and customer registration stay
/// outside.
pub fn protected_router() -> Router {
    Router::new()
        .route("/auth/me", get(auth::me))
        .merge(customers::protected_router())
        .nest("/employees", employees::router())
        .nest("/suppliers", suppliers::router())
        .nest("/product-categories", categories::router())
        .nest("/products", products::router())
        .nest("/orders", orders::router())
        .nest("/order-details", order_details::router())
        .nest("/stock-operations", stock::router())
        .nest("/financial-reports", reports::router())
}
