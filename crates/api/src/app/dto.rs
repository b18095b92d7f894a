//! Request/response DTOs and JSON mapping.
//!
//! Password hashes never leave the service: principal responses are separate
//! structs rather than the storage records. Requests carry plaintext
//! passwords that the service layer hashes before anything is stored.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use siphon_auth::Role;
use siphon_core::{
    CategoryId, CustomerId, EmployeeId, OrderDetailId, OrderId, ProductId, SupplierId,
};
use siphon_infra::OrderDetailRow;
use siphon_parties::{Customer, Employee, Supplier};
use siphon_sales::OrderDetail;

// ── auth ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct PasswordChangeRequest {
    pub password: String,
}

// ── parties ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CustomerPayload {
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EmployeePayload {
    pub full_name: String,
    pub position: String,
    pub phone: String,
    pub hire_date: NaiveDate,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SupplierPayload {
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CustomerOut {
    pub id: CustomerId,
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub username: Option<String>,
}

impl From<Customer> for CustomerOut {
    fn from(c: Customer) -> Self {
        Self {
            id: c.id,
            full_name: c.full_name,
            phone: c.phone,
            email: c.email,
            address: c.address,
            username: c.username,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EmployeeOut {
    pub id: EmployeeId,
    pub full_name: String,
    pub position: String,
    pub phone: String,
    pub hire_date: NaiveDate,
    pub username: Option<String>,
}

impl From<Employee> for EmployeeOut {
    fn from(e: Employee) -> Self {
        Self {
            id: e.id,
            full_name: e.full_name,
            position: e.position,
            phone: e.phone,
            hire_date: e.hire_date,
            username: e.username,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SupplierOut {
    pub id: SupplierId,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub username: Option<String>,
}

impl From<Supplier> for SupplierOut {
    fn from(s: Supplier) -> Self {
        Self {
            id: s.id,
            name: s.name,
            contact_person: s.contact_person,
            phone: s.phone,
            email: s.email,
            address: s.address,
            username: s.username,
        }
    }
}

// ── catalog ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CategoryPayload {
    pub name: String,
    pub parent_id: Option<CategoryId>,
}

#[derive(Debug, Deserialize)]
pub struct ProductPayload {
    pub name: String,
    pub category_id: CategoryId,
    pub supplier_id: SupplierId,
    pub price: Decimal,
    pub description: Option<String>,
    pub stock_quantity: i64,
}

/// Admin stock edit: the new absolute quantity. The movement is derived from
/// the difference against the current value.
#[derive(Debug, Deserialize)]
pub struct StockUpdateRequest {
    pub stock_quantity: i64,
}

// ── sales ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LineItemRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    /// Required for admins; customers always order for themselves.
    pub customer_id: Option<CustomerId>,
    pub items: Vec<LineItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct OrderStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct OrderDetailPayload {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct OrderDetailUpdatePayload {
    pub quantity: i64,
}

/// Order line as returned by the API. List endpoints that join against
/// orders/products carry `product_name` and `order_date`; plain reads leave
/// them out.
#[derive(Debug, Serialize, Deserialize)]
pub struct OrderDetailOut {
    pub id: OrderDetailId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub price_per_unit: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_date: Option<DateTime<Utc>>,
}

impl From<OrderDetail> for OrderDetailOut {
    fn from(d: OrderDetail) -> Self {
        Self {
            id: d.id,
            order_id: d.order_id,
            product_id: d.product_id,
            quantity: d.quantity,
            price_per_unit: d.price_per_unit,
            product_name: None,
            order_date: None,
        }
    }
}

impl From<OrderDetailRow> for OrderDetailOut {
    fn from(row: OrderDetailRow) -> Self {
        Self {
            product_name: Some(row.product_name),
            order_date: Some(row.order_date),
            ..row.detail.into()
        }
    }
}

// ── inventory / reporting ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StockOperationPayload {
    pub product_id: ProductId,
    pub operation_type: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    /// Defaults to today.
    pub report_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}
