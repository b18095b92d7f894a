use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use siphon_core::{
    CategoryId, CustomerId, EmployeeId, OrderDetailId, OrderId, ProductId, ReportId,
    StockOperationId, SupplierId,
};
use siphon_inventory::{NewStockOperation, StockOperation};
use siphon_parties::{Customer, Employee, NewCustomer, NewEmployee, NewSupplier, Supplier};
use siphon_products::{NewCategory, NewProduct, Product, ProductCategory};
use siphon_reporting::{FinancialReport, NewFinancialReport};
use siphon_sales::{NewOrder, NewOrderLine, Order, OrderDetail};

/// Storage failure.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The targeted record does not exist.
    #[error("record not found")]
    NotFound,

    /// The backend itself failed (connection, constraint, corrupt row).
    #[error("storage backend failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// An order line joined with the fields list endpoints need alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetailRow {
    pub detail: OrderDetail,
    pub product_name: String,
    pub order_date: DateTime<Utc>,
}

/// Persistence boundary for the whole catalog, party, and sales state.
///
/// Writes follow check-then-act: callers validate and resolve references
/// first, then hand the store a complete record. Concurrent edits to the
/// same row are last-write-wins.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    // ── customers ──────────────────────────────────────────────────────

    async fn list_customers(&self) -> StoreResult<Vec<Customer>>;
    async fn get_customer(&self, id: CustomerId) -> StoreResult<Option<Customer>>;
    async fn find_customer_by_username(&self, username: &str) -> StoreResult<Option<Customer>>;
    async fn insert_customer(&self, new: NewCustomer) -> StoreResult<Customer>;
    async fn update_customer(&self, record: Customer) -> StoreResult<()>;
    async fn delete_customer(&self, id: CustomerId) -> StoreResult<()>;

    // ── employees ──────────────────────────────────────────────────────

    async fn list_employees(&self) -> StoreResult<Vec<Employee>>;
    async fn get_employee(&self, id: EmployeeId) -> StoreResult<Option<Employee>>;
    async fn find_employee_by_username(&self, username: &str) -> StoreResult<Option<Employee>>;
    async fn insert_employee(&self, new: NewEmployee) -> StoreResult<Employee>;
    async fn update_employee(&self, record: Employee) -> StoreResult<()>;
    async fn delete_employee(&self, id: EmployeeId) -> StoreResult<()>;

    // ── suppliers ──────────────────────────────────────────────────────

    async fn list_suppliers(&self) -> StoreResult<Vec<Supplier>>;
    async fn get_supplier(&self, id: SupplierId) -> StoreResult<Option<Supplier>>;
    async fn find_supplier_by_username(&self, username: &str) -> StoreResult<Option<Supplier>>;
    async fn insert_supplier(&self, new: NewSupplier) -> StoreResult<Supplier>;
    async fn update_supplier(&self, record: Supplier) -> StoreResult<()>;
    async fn delete_supplier(&self, id: SupplierId) -> StoreResult<()>;

    // ── categories ─────────────────────────────────────────────────────

    async fn list_categories(&self) -> StoreResult<Vec<ProductCategory>>;
    async fn get_category(&self, id: CategoryId) -> StoreResult<Option<ProductCategory>>;
    async fn insert_category(&self, new: NewCategory) -> StoreResult<ProductCategory>;
    async fn update_category(&self, record: ProductCategory) -> StoreResult<()>;
    async fn delete_category(&self, id: CategoryId) -> StoreResult<()>;
    async fn list_child_categories(&self, id: CategoryId) -> StoreResult<Vec<ProductCategory>>;
    async fn category_has_products(&self, id: CategoryId) -> StoreResult<bool>;

    // ── products ───────────────────────────────────────────────────────

    async fn list_products(&self) -> StoreResult<Vec<Product>>;
    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>>;
    async fn list_products_by_supplier(&self, id: SupplierId) -> StoreResult<Vec<Product>>;
    async fn insert_product(&self, new: NewProduct) -> StoreResult<Product>;
    async fn update_product(&self, record: Product) -> StoreResult<()>;
    async fn delete_product(&self, id: ProductId) -> StoreResult<()>;

    // ── orders ─────────────────────────────────────────────────────────

    async fn list_orders(&self) -> StoreResult<Vec<Order>>;
    async fn get_order(&self, id: OrderId) -> StoreResult<Option<Order>>;
    async fn list_orders_by_customer(&self, id: CustomerId) -> StoreResult<Vec<Order>>;
    async fn list_orders_since(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<Order>>;

    /// Insert the order header and all of its lines atomically.
    async fn create_order_with_details(
        &self,
        new: NewOrder,
    ) -> StoreResult<(Order, Vec<OrderDetail>)>;

    async fn update_order(&self, record: Order) -> StoreResult<()>;
    async fn delete_order(&self, id: OrderId) -> StoreResult<()>;

    // ── order details ──────────────────────────────────────────────────

    async fn list_order_details(&self) -> StoreResult<Vec<OrderDetail>>;
    async fn get_order_detail(&self, id: OrderDetailId) -> StoreResult<Option<OrderDetail>>;
    async fn insert_order_detail(
        &self,
        order_id: OrderId,
        line: NewOrderLine,
    ) -> StoreResult<OrderDetail>;
    async fn update_order_detail(&self, record: OrderDetail) -> StoreResult<()>;
    async fn delete_order_detail(&self, id: OrderDetailId) -> StoreResult<()>;
    async fn list_details_for_order(&self, id: OrderId) -> StoreResult<Vec<OrderDetail>>;
    async fn list_detail_rows_for_customer(
        &self,
        id: CustomerId,
    ) -> StoreResult<Vec<OrderDetailRow>>;

    /// Lines for products supplied by `id`, optionally bounded by order date
    /// (inclusive on both ends).
    async fn list_detail_rows_for_supplier(
        &self,
        id: SupplierId,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> StoreResult<Vec<OrderDetailRow>>;

    // ── stock operations ───────────────────────────────────────────────

    async fn list_stock_operations(&self) -> StoreResult<Vec<StockOperation>>;
    async fn get_stock_operation(
        &self,
        id: StockOperationId,
    ) -> StoreResult<Option<StockOperation>>;

    /// Insert the audit row and set the product's stock to `new_quantity`
    /// atomically. The caller has already applied the movement arithmetic.
    async fn record_stock_operation(
        &self,
        new: NewStockOperation,
        new_quantity: i64,
    ) -> StoreResult<StockOperation>;

    // ── financial reports ──────────────────────────────────────────────

    async fn list_reports(&self) -> StoreResult<Vec<FinancialReport>>;
    async fn get_report(&self, id: ReportId) -> StoreResult<Option<FinancialReport>>;
    async fn insert_report(&self, new: NewFinancialReport) -> StoreResult<FinancialReport>;
}
