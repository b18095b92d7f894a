//! Postgres-backed store.
//!
//! Schema lives in `schema.sql` next to this crate. The two composite writes
//! (`create_order_with_details`, `record_stock_operation`) run inside a
//! transaction; everything else is a single statement.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use siphon_core::{
    CategoryId, CustomerId, EmployeeId, OrderDetailId, OrderId, ProductId, ReportId,
    StockOperationId, SupplierId,
};
use siphon_inventory::{NewStockOperation, StockOperation, StockOperationType};
use siphon_parties::{Customer, Employee, NewCustomer, NewEmployee, NewSupplier, Supplier};
use siphon_products::{NewCategory, NewProduct, Product, ProductCategory};
use siphon_reporting::{FinancialReport, NewFinancialReport};
use siphon_sales::{NewOrder, NewOrderLine, Order, OrderDetail, OrderStatus};

use crate::store::{OrderDetailRow, Store, StoreError, StoreResult};

/// Postgres store. Clone is cheap; the pool is shared.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: Arc<PgPool>,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

fn map_sqlx_error(operation: &str, e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        other => StoreError::Backend(format!("{operation}: {other}")),
    }
}

fn bad_row(operation: &str, detail: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(format!("{operation}: corrupt row: {detail}"))
}

fn expect_hit(operation: &str, rows_affected: u64) -> StoreResult<()> {
    if rows_affected == 0 {
        Err(StoreError::NotFound)
    } else {
        Ok(())
    }
}

// ── row mapping ────────────────────────────────────────────────────────

fn customer_from_row(row: &PgRow) -> Customer {
    Customer {
        id: CustomerId::new(row.get("id")),
        full_name: row.get("full_name"),
        phone: row.get("phone"),
        email: row.get("email"),
        address: row.get("address"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
    }
}

fn employee_from_row(row: &PgRow) -> Employee {
    Employee {
        id: EmployeeId::new(row.get("id")),
        full_name: row.get("full_name"),
        position: row.get("position"),
        phone: row.get("phone"),
        hire_date: row.get("hire_date"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
    }
}

fn supplier_from_row(row: &PgRow) -> Supplier {
    Supplier {
        id: SupplierId::new(row.get("id")),
        name: row.get("name"),
        contact_person: row.get("contact_person"),
        phone: row.get("phone"),
        email: row.get("email"),
        address: row.get("address"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
    }
}

fn category_from_row(row: &PgRow) -> ProductCategory {
    ProductCategory {
        id: CategoryId::new(row.get("id")),
        name: row.get("name"),
        parent_id: row.get::<Option<i64>, _>("parent_id").map(CategoryId::new),
    }
}

fn product_from_row(row: &PgRow) -> Product {
    Product {
        id: ProductId::new(row.get("id")),
        name: row.get("name"),
        category_id: CategoryId::new(row.get("category_id")),
        supplier_id: SupplierId::new(row.get("supplier_id")),
        price: row.get("price"),
        description: row.get("description"),
        stock_quantity: row.get("stock_quantity"),
    }
}

fn order_from_row(operation: &str, row: &PgRow) -> StoreResult<Order> {
    let status: String = row.get("status");
    let status = OrderStatus::parse(&status)
        .ok_or_else(|| bad_row(operation, format!("unknown order status {status:?}")))?;
    Ok(Order {
        id: OrderId::new(row.get("id")),
        customer_id: CustomerId::new(row.get("customer_id")),
        order_date: row.get("order_date"),
        status,
        total_amount: row.get("total_amount"),
    })
}

fn detail_from_row(row: &PgRow) -> OrderDetail {
    OrderDetail {
        id: OrderDetailId::new(row.get("id")),
        order_id: OrderId::new(row.get("order_id")),
        product_id: ProductId::new(row.get("product_id")),
        quantity: row.get("quantity"),
        price_per_unit: row.get("price_per_unit"),
    }
}

fn detail_row_from_row(row: &PgRow) -> OrderDetailRow {
    OrderDetailRow {
        detail: detail_from_row(row),
        product_name: row.get("product_name"),
        order_date: row.get("order_date"),
    }
}

fn operation_from_row(operation: &str, row: &PgRow) -> StoreResult<StockOperation> {
    let kind: String = row.get("operation_type");
    let operation_type = StockOperationType::parse(&kind)
        .ok_or_else(|| bad_row(operation, format!("unknown operation type {kind:?}")))?;
    Ok(StockOperation {
        id: StockOperationId::new(row.get("id")),
        product_id: ProductId::new(row.get("product_id")),
        operation_type,
        quantity: row.get("quantity"),
        operation_date: row.get("operation_date"),
        employee_id: EmployeeId::new(row.get("employee_id")),
    })
}

fn report_from_row(row: &PgRow) -> FinancialReport {
    FinancialReport {
        id: ReportId::new(row.get("id")),
        report_date: row.get("report_date"),
        total_revenue: row.get("total_revenue"),
        total_expenses: row.get("total_expenses"),
        profit: row.get("profit"),
    }
}

const DETAIL_ROW_SELECT: &str = "
    SELECT d.id, d.order_id, d.product_id, d.quantity, d.price_per_unit,
           p.name AS product_name, o.order_date
    FROM order_details d
    JOIN products p ON p.id = d.product_id
    JOIN orders o ON o.id = d.order_id
";

#[async_trait::async_trait]
impl Store for PgStore {
    // ── customers ──────────────────────────────────────────────────────

    async fn list_customers(&self) -> StoreResult<Vec<Customer>> {
        let rows = sqlx::query("SELECT * FROM customers ORDER BY id")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_customers", e))?;
        Ok(rows.iter().map(customer_from_row).collect())
    }

    async fn get_customer(&self, id: CustomerId) -> StoreResult<Option<Customer>> {
        let row = sqlx::query("SELECT * FROM customers WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_customer", e))?;
        Ok(row.as_ref().map(customer_from_row))
    }

    async fn find_customer_by_username(&self, username: &str) -> StoreResult<Option<Customer>> {
        let row = sqlx::query("SELECT * FROM customers WHERE username = $1")
            .bind(username)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_customer_by_username", e))?;
        Ok(row.as_ref().map(customer_from_row))
    }

    async fn insert_customer(&self, new: NewCustomer) -> StoreResult<Customer> {
        let row = sqlx::query(
            "INSERT INTO customers (full_name, phone, email, address, username, password_hash)
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(new.full_name.trim())
        .bind(new.phone.trim())
        .bind(&new.email)
        .bind(&new.address)
        .bind(&new.username)
        .bind(&new.password_hash)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_customer", e))?;
        Ok(new.into_record(CustomerId::new(row.get("id"))))
    }

    async fn update_customer(&self, record: Customer) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE customers
             SET full_name = $2, phone = $3, email = $4, address = $5,
                 username = $6, password_hash = $7
             WHERE id = $1",
        )
        .bind(record.id.as_i64())
        .bind(&record.full_name)
        .bind(&record.phone)
        .bind(&record.email)
        .bind(&record.address)
        .bind(&record.username)
        .bind(&record.password_hash)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_customer", e))?;
        expect_hit("update_customer", result.rows_affected())
    }

    async fn delete_customer(&self, id: CustomerId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id.as_i64())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_customer", e))?;
        expect_hit("delete_customer", result.rows_affected())
    }

    // ── employees ──────────────────────────────────────────────────────

    async fn list_employees(&self) -> StoreResult<Vec<Employee>> {
        let rows = sqlx::query("SELECT * FROM employees ORDER BY id")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_employees", e))?;
        Ok(rows.iter().map(employee_from_row).collect())
    }

    async fn get_employee(&self, id: EmployeeId) -> StoreResult<Option<Employee>> {
        let row = sqlx::query("SELECT * FROM employees WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_employee", e))?;
        Ok(row.as_ref().map(employee_from_row))
    }

    async fn find_employee_by_username(&self, username: &str) -> StoreResult<Option<Employee>> {
        let row = sqlx::query("SELECT * FROM employees WHERE username = $1")
            .bind(username)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_employee_by_username", e))?;
        Ok(row.as_ref().map(employee_from_row))
    }

    async fn insert_employee(&self, new: NewEmployee) -> StoreResult<Employee> {
        let row = sqlx::query(
            "INSERT INTO employees (full_name, position, phone, hire_date, username, password_hash)
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(new.full_name.trim())
        .bind(new.position.trim())
        .bind(new.phone.trim())
        .bind(new.hire_date)
        .bind(&new.username)
        .bind(&new.password_hash)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_employee", e))?;
        Ok(new.into_record(EmployeeId::new(row.get("id"))))
    }

    async fn update_employee(&self, record: Employee) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE employees
             SET full_name = $2, position = $3, phone = $4, hire_date = $5,
                 username = $6, password_hash = $7
             WHERE id = $1",
        )
        .bind(record.id.as_i64())
        .bind(&record.full_name)
        .bind(&record.position)
        .bind(&record.phone)
        .bind(record.hire_date)
        .bind(&record.username)
        .bind(&record.password_hash)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_employee", e))?;
        expect_hit("update_employee", result.rows_affected())
    }

    async fn delete_employee(&self, id: EmployeeId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM employees WHERE id = $1")
            .bind(id.as_i64())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_employee", e))?;
        expect_hit("delete_employee", result.rows_affected())
    }

    // ── suppliers ──────────────────────────────────────────────────────

    async fn list_suppliers(&self) -> StoreResult<Vec<Supplier>> {
        let rows = sqlx::query("SELECT * FROM suppliers ORDER BY id")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_suppliers", e))?;
        Ok(rows.iter().map(supplier_from_row).collect())
    }

    async fn get_supplier(&self, id: SupplierId) -> StoreResult<Option<Supplier>> {
        let row = sqlx::query("SELECT * FROM suppliers WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_supplier", e))?;
        Ok(row.as_ref().map(supplier_from_row))
    }

    async fn find_supplier_by_username(&self, username: &str) -> StoreResult<Option<Supplier>> {
        let row = sqlx::query("SELECT * FROM suppliers WHERE username = $1")
            .bind(username)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_supplier_by_username", e))?;
        Ok(row.as_ref().map(supplier_from_row))
    }

    async fn insert_supplier(&self, new: NewSupplier) -> StoreResult<Supplier> {
        let row = sqlx::query(
            "INSERT INTO suppliers (name, contact_person, phone, email, address, username, password_hash)
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(new.name.trim())
        .bind(&new.contact_person)
        .bind(new.phone.trim())
        .bind(&new.email)
        .bind(&new.address)
        .bind(&new.username)
        .bind(&new.password_hash)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_supplier", e))?;
        Ok(new.into_record(SupplierId::new(row.get("id"))))
    }

    async fn update_supplier(&self, record: Supplier) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE suppliers
             SET name = $2, contact_person = $3, phone = $4, email = $5,
                 address = $6, username = $7, password_hash = $8
             WHERE id = $1",
        )
        .bind(record.id.as_i64())
        .bind(&record.name)
        .bind(&record.contact_person)
        .bind(&record.phone)
        .bind(&record.email)
        .bind(&record.address)
        .bind(&record.username)
        .bind(&record.password_hash)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_supplier", e))?;
        expect_hit("update_supplier", result.rows_affected())
    }

    async fn delete_supplier(&self, id: SupplierId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM suppliers WHERE id = $1")
            .bind(id.as_i64())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_supplier", e))?;
        expect_hit("delete_supplier", result.rows_affected())
    }

    // ── categories ─────────────────────────────────────────────────────

    async fn list_categories(&self) -> StoreResult<Vec<ProductCategory>> {
        let rows = sqlx::query("SELECT * FROM product_categories ORDER BY id")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_categories", e))?;
        Ok(rows.iter().map(category_from_row).collect())
    }

    async fn get_category(&self, id: CategoryId) -> StoreResult<Option<ProductCategory>> {
        let row = sqlx::query("SELECT * FROM product_categories WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_category", e))?;
        Ok(row.as_ref().map(category_from_row))
    }

    async fn insert_category(&self, new: NewCategory) -> StoreResult<ProductCategory> {
        let row = sqlx::query(
            "INSERT INTO product_categories (name, parent_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(new.name.trim())
        .bind(new.parent_id.map(|id| id.as_i64()))
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_category", e))?;
        Ok(new.into_record(CategoryId::new(row.get("id"))))
    }

    async fn update_category(&self, record: ProductCategory) -> StoreResult<()> {
        let result =
            sqlx::query("UPDATE product_categories SET name = $2, parent_id = $3 WHERE id = $1")
                .bind(record.id.as_i64())
                .bind(&record.name)
                .bind(record.parent_id.map(|id| id.as_i64()))
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("update_category", e))?;
        expect_hit("update_category", result.rows_affected())
    }

    async fn delete_category(&self, id: CategoryId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM product_categories WHERE id = $1")
            .bind(id.as_i64())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_category", e))?;
        expect_hit("delete_category", result.rows_affected())
    }

    async fn list_child_categories(&self, id: CategoryId) -> StoreResult<Vec<ProductCategory>> {
        let rows = sqlx::query("SELECT * FROM product_categories WHERE parent_id = $1 ORDER BY id")
            .bind(id.as_i64())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_child_categories", e))?;
        Ok(rows.iter().map(category_from_row).collect())
    }

    async fn category_has_products(&self, id: CategoryId) -> StoreResult<bool> {
        let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM products WHERE category_id = $1) AS present")
            .bind(id.as_i64())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("category_has_products", e))?;
        Ok(row.get("present"))
    }

    // ── products ───────────────────────────────────────────────────────

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query("SELECT * FROM products ORDER BY id")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_products", e))?;
        Ok(rows.iter().map(product_from_row).collect())
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        let row = sqlx::query("SELECT * FROM products WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_product", e))?;
        Ok(row.as_ref().map(product_from_row))
    }

    async fn list_products_by_supplier(&self, id: SupplierId) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query("SELECT * FROM products WHERE supplier_id = $1 ORDER BY id")
            .bind(id.as_i64())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_products_by_supplier", e))?;
        Ok(rows.iter().map(product_from_row).collect())
    }

    async fn insert_product(&self, new: NewProduct) -> StoreResult<Product> {
        let record = new.into_record(ProductId::new(0));
        let row = sqlx::query(
            "INSERT INTO products (name, category_id, supplier_id, price, description, stock_quantity)
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(&record.name)
        .bind(record.category_id.as_i64())
        .bind(record.supplier_id.as_i64())
        .bind(record.price)
        .bind(&record.description)
        .bind(record.stock_quantity)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;
        Ok(Product {
            id: ProductId::new(row.get("id")),
            ..record
        })
    }

    async fn update_product(&self, record: Product) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE products
             SET name = $2, category_id = $3, supplier_id = $4, price = $5,
                 description = $6, stock_quantity = $7
             WHERE id = $1",
        )
        .bind(record.id.as_i64())
        .bind(&record.name)
        .bind(record.category_id.as_i64())
        .bind(record.supplier_id.as_i64())
        .bind(record.price)
        .bind(&record.description)
        .bind(record.stock_quantity)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?;
        expect_hit("update_product", result.rows_affected())
    }

    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_i64())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;
        expect_hit("delete_product", result.rows_affected())
    }

    // ── orders ─────────────────────────────────────────────────────────

    async fn list_orders(&self) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query("SELECT * FROM orders ORDER BY id")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_orders", e))?;
        rows.iter().map(|r| order_from_row("list_orders", r)).collect()
    }

    async fn get_order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_order", e))?;
        row.as_ref().map(|r| order_from_row("get_order", r)).transpose()
    }

    async fn list_orders_by_customer(&self, id: CustomerId) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query("SELECT * FROM orders WHERE customer_id = $1 ORDER BY id")
            .bind(id.as_i64())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_orders_by_customer", e))?;
        rows.iter()
            .map(|r| order_from_row("list_orders_by_customer", r))
            .collect()
    }

    async fn list_orders_since(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query("SELECT * FROM orders WHERE order_date >= $1 ORDER BY id")
            .bind(cutoff)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_orders_since", e))?;
        rows.iter()
            .map(|r| order_from_row("list_orders_since", r))
            .collect()
    }

    #[instrument(skip(self, new), fields(lines = new.lines.len()), err)]
    async fn create_order_with_details(
        &self,
        new: NewOrder,
    ) -> StoreResult<(Order, Vec<OrderDetail>)> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("create_order_with_details", e))?;

        let row = sqlx::query(
            "INSERT INTO orders (customer_id, order_date, status, total_amount)
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(new.customer_id.as_i64())
        .bind(new.order_date)
        .bind(new.status.as_str())
        .bind(new.total_amount)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_order_with_details", e))?;
        let order_id = OrderId::new(row.get("id"));

        let mut details = Vec::with_capacity(new.lines.len());
        for line in &new.lines {
            let row = sqlx::query(
                "INSERT INTO order_details (order_id, product_id, quantity, price_per_unit)
                 VALUES ($1, $2, $3, $4) RETURNING id",
            )
            .bind(order_id.as_i64())
            .bind(line.product_id.as_i64())
            .bind(line.quantity)
            .bind(line.price_per_unit)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("create_order_with_details", e))?;
            details.push(OrderDetail {
                id: OrderDetailId::new(row.get("id")),
                order_id,
                product_id: line.product_id,
                quantity: line.quantity,
                price_per_unit: line.price_per_unit,
            });
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("create_order_with_details", e))?;

        let order = Order {
            id: order_id,
            customer_id: new.customer_id,
            order_date: new.order_date,
            status: new.status,
            total_amount: new.total_amount,
        };
        Ok((order, details))
    }

    async fn update_order(&self, record: Order) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE orders
             SET customer_id = $2, order_date = $3, status = $4, total_amount = $5
             WHERE id = $1",
        )
        .bind(record.id.as_i64())
        .bind(record.customer_id.as_i64())
        .bind(record.order_date)
        .bind(record.status.as_str())
        .bind(record.total_amount)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_order", e))?;
        expect_hit("update_order", result.rows_affected())
    }

    async fn delete_order(&self, id: OrderId) -> StoreResult<()> {
        // order_details has ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_i64())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_order", e))?;
        expect_hit("delete_order", result.rows_affected())
    }

    // ── order details ──────────────────────────────────────────────────

    async fn list_order_details(&self) -> StoreResult<Vec<OrderDetail>> {
        let rows = sqlx::query("SELECT * FROM order_details ORDER BY id")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_order_details", e))?;
        Ok(rows.iter().map(detail_from_row).collect())
    }

    async fn get_order_detail(&self, id: OrderDetailId) -> StoreResult<Option<OrderDetail>> {
        let row = sqlx::query("SELECT * FROM order_details WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_order_detail", e))?;
        Ok(row.as_ref().map(detail_from_row))
    }

    async fn insert_order_detail(
        &self,
        order_id: OrderId,
        line: NewOrderLine,
    ) -> StoreResult<OrderDetail> {
        let row = sqlx::query(
            "INSERT INTO order_details (order_id, product_id, quantity, price_per_unit)
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(order_id.as_i64())
        .bind(line.product_id.as_i64())
        .bind(line.quantity)
        .bind(line.price_per_unit)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_order_detail", e))?;
        Ok(OrderDetail {
            id: OrderDetailId::new(row.get("id")),
            order_id,
            product_id: line.product_id,
            quantity: line.quantity,
            price_per_unit: line.price_per_unit,
        })
    }

    async fn update_order_detail(&self, record: OrderDetail) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE order_details
             SET order_id = $2, product_id = $3, quantity = $4, price_per_unit = $5
             WHERE id = $1",
        )
        .bind(record.id.as_i64())
        .bind(record.order_id.as_i64())
        .bind(record.product_id.as_i64())
        .bind(record.quantity)
        .bind(record.price_per_unit)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_order_detail", e))?;
        expect_hit("update_order_detail", result.rows_affected())
    }

    async fn delete_order_detail(&self, id: OrderDetailId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM order_details WHERE id = $1")
            .bind(id.as_i64())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_order_detail", e))?;
        expect_hit("delete_order_detail", result.rows_affected())
    }

    async fn list_details_for_order(&self, id: OrderId) -> StoreResult<Vec<OrderDetail>> {
        let rows = sqlx::query("SELECT * FROM order_details WHERE order_id = $1 ORDER BY id")
            .bind(id.as_i64())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_details_for_order", e))?;
        Ok(rows.iter().map(detail_from_row).collect())
    }

    async fn list_detail_rows_for_customer(
        &self,
        id: CustomerId,
    ) -> StoreResult<Vec<OrderDetailRow>> {
        let sql = format!("{DETAIL_ROW_SELECT} WHERE o.customer_id = $1 ORDER BY d.id");
        let rows = sqlx::query(&sql)
            .bind(id.as_i64())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_detail_rows_for_customer", e))?;
        Ok(rows.iter().map(detail_row_from_row).collect())
    }

    async fn list_detail_rows_for_supplier(
        &self,
        id: SupplierId,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> StoreResult<Vec<OrderDetailRow>> {
        let sql = format!(
            "{DETAIL_ROW_SELECT}
             WHERE p.supplier_id = $1
               AND ($2::date IS NULL OR o.order_date::date >= $2)
               AND ($3::date IS NULL OR o.order_date::date <= $3)
             ORDER BY d.id"
        );
        let rows = sqlx::query(&sql)
            .bind(id.as_i64())
            .bind(start_date)
            .bind(end_date)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_detail_rows_for_supplier", e))?;
        Ok(rows.iter().map(detail_row_from_row).collect())
    }

    // ── stock operations ───────────────────────────────────────────────

    async fn list_stock_operations(&self) -> StoreResult<Vec<StockOperation>> {
        let rows = sqlx::query("SELECT * FROM stock_operations ORDER BY id")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_stock_operations", e))?;
        rows.iter()
            .map(|r| operation_from_row("list_stock_operations", r))
            .collect()
    }

    async fn get_stock_operation(
        &self,
        id: StockOperationId,
    ) -> StoreResult<Option<StockOperation>> {
        let row = sqlx::query("SELECT * FROM stock_operations WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_stock_operation", e))?;
        row.as_ref()
            .map(|r| operation_from_row("get_stock_operation", r))
            .transpose()
    }

    #[instrument(skip(self, new), fields(product_id = %new.product_id), err)]
    async fn record_stock_operation(
        &self,
        new: NewStockOperation,
        new_quantity: i64,
    ) -> StoreResult<StockOperation> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("record_stock_operation", e))?;

        let updated = sqlx::query("UPDATE products SET stock_quantity = $2 WHERE id = $1")
            .bind(new.product_id.as_i64())
            .bind(new_quantity)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("record_stock_operation", e))?;
        expect_hit("record_stock_operation", updated.rows_affected())?;

        let row = sqlx::query(
            "INSERT INTO stock_operations (product_id, operation_type, quantity, operation_date, employee_id)
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(new.product_id.as_i64())
        .bind(new.operation_type.as_str())
        .bind(new.quantity)
        .bind(new.operation_date)
        .bind(new.employee_id.as_i64())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("record_stock_operation", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("record_stock_operation", e))?;
        Ok(new.into_record(StockOperationId::new(row.get("id"))))
    }

    // ── financial reports ──────────────────────────────────────────────

    async fn list_reports(&self) -> StoreResult<Vec<FinancialReport>> {
        let rows = sqlx::query("SELECT * FROM financial_reports ORDER BY id")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_reports", e))?;
        Ok(rows.iter().map(report_from_row).collect())
    }

    async fn get_report(&self, id: ReportId) -> StoreResult<Option<FinancialReport>> {
        let row = sqlx::query("SELECT * FROM financial_reports WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_report", e))?;
        Ok(row.as_ref().map(report_from_row))
    }

    async fn insert_report(&self, new: NewFinancialReport) -> StoreResult<FinancialReport> {
        let row = sqlx::query(
            "INSERT INTO financial_reports (report_date, total_revenue, total_expenses, profit)
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(new.report_date)
        .bind(new.total_revenue)
        .bind(new.total_expenses)
        .bind(new.profit)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_report", e))?;
        Ok(new.into_record(ReportId::new(row.get("id"))))
    }
}
