//! Service orchestration: storage wiring plus the operations handlers call.
//!
//! Authorization stays in the route layer; everything here assumes the
//! caller is already allowed to do what it asks. Reference checks are
//! check-then-act: resolve every foreign id before the first write.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;

use siphon_auth::{AuthError, Claims, TokenCodec, hash_password, verify_password};
use siphon_core::{
    CategoryId, CustomerId, DomainError, EmployeeId, OrderDetailId, OrderId, ProductId, ReportId,
    StockOperationId, SupplierId,
};
use siphon_infra::{MemoryStore, OrderDetailRow, Store};
use siphon_inventory::{NewStockOperation, StockOperation, StockOperationType, derive_operation};
use siphon_parties::{Customer, Employee, NewCustomer, NewEmployee, NewSupplier, Supplier};
use siphon_products::{NewCategory, NewProduct, Product, ProductCategory};
use siphon_reporting::{FinancialReport, snapshot};
use siphon_sales::{LineItem, NewOrder, NewOrderLine, Order, OrderDetail, OrderStatus};

use crate::app::dto;
use crate::app::errors::{ApiError, ApiResult};
use crate::config::Config;

/// Window for `GET /orders/recent`.
const RECENT_ORDER_DAYS: i64 = 3;

pub struct AppServices {
    store: Arc<dyn Store>,
    codec: Arc<TokenCodec>,
}

/// Pick the storage backend from configuration.
pub async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    if config.use_persistent_store {
        #[cfg(feature = "postgres")]
        {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set with USE_PERSISTENT_STORE"))?;
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await?;
            tracing::info!("using postgres store");
            return Ok(Arc::new(siphon_infra::PgStore::new(pool)));
        }
        #[cfg(not(feature = "postgres"))]
        anyhow::bail!("USE_PERSISTENT_STORE is set but this build lacks the `postgres` feature");
    }
    tracing::info!("using in-memory store");
    Ok(Arc::new(MemoryStore::new()))
}

fn hash_new_password(password: Option<String>) -> ApiResult<Option<String>> {
    password
        .map(|p| hash_password(&p).map_err(|_| ApiError::internal("password hashing failed")))
        .transpose()
}

impl AppServices {
    pub fn new(store: Arc<dyn Store>, codec: Arc<TokenCodec>) -> Self {
        Self { store, codec }
    }

    // ── auth ───────────────────────────────────────────────────────────

    /// Issue a token for a username+password pair.
    ///
    /// Tables are searched in a fixed order (employee, customer, supplier);
    /// the first one containing the username is authoritative for role. All
    /// failure paths collapse into `InvalidCredentials`.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<dto::TokenResponse> {
        let now = Utc::now();

        if let Some(employee) = self.store.find_employee_by_username(username).await? {
            let claims = Claims::for_admin(username, employee.id, now);
            return self.issue(claims, employee.password_hash.as_deref(), password);
        }
        if let Some(customer) = self.store.find_customer_by_username(username).await? {
            let claims = Claims::for_customer(username, customer.id, now);
            return self.issue(claims, customer.password_hash.as_deref(), password);
        }
        if let Some(supplier) = self.store.find_supplier_by_username(username).await? {
            let claims = Claims::for_supplier(username, supplier.id, now);
            return self.issue(claims, supplier.password_hash.as_deref(), password);
        }

        Err(AuthError::InvalidCredentials.into())
    }

    fn issue(
        &self,
        claims: Claims,
        stored_hash: Option<&str>,
        password: &str,
    ) -> ApiResult<dto::TokenResponse> {
        let hash = stored_hash.ok_or(AuthError::InvalidCredentials)?;
        if !verify_password(password, hash) {
            return Err(AuthError::InvalidCredentials.into());
        }
        Ok(dto::TokenResponse::bearer(self.codec.encode(&claims)?))
    }

    // ── customers ──────────────────────────────────────────────────────

    pub async fn register_customer(&self, payload: dto::CustomerPayload) -> ApiResult<Customer> {
        let new = NewCustomer {
            full_name: payload.full_name,
            phone: payload.phone,
            email: payload.email,
            address: payload.address,
            username: payload.username,
            password_hash: hash_new_password(payload.password)?,
        };
        new.validate()?;
        Ok(self.store.insert_customer(new).await?)
    }

    pub async fn list_customers(&self) -> ApiResult<Vec<Customer>> {
        Ok(self.store.list_customers().await?)
    }

    pub async fn get_customer(&self, id: CustomerId) -> ApiResult<Customer> {
        self.store
            .get_customer(id)
            .await?
            .ok_or_else(ApiError::not_found)
    }

    pub async fn update_customer(
        &self,
        id: CustomerId,
        payload: dto::CustomerPayload,
    ) -> ApiResult<Customer> {
        let mut record = self.get_customer(id).await?;
        record.apply_update(NewCustomer {
            full_name: payload.full_name,
            phone: payload.phone,
            email: payload.email,
            address: payload.address,
            username: payload.username,
            password_hash: hash_new_password(payload.password)?,
        })?;
        self.store.update_customer(record.clone()).await?;
        Ok(record)
    }

    pub async fn delete_customer(&self, id: CustomerId) -> ApiResult<()> {
        Ok(self.store.delete_customer(id).await?)
    }

    pub async fn change_customer_password(
        &self,
        id: CustomerId,
        password: &str,
    ) -> ApiResult<()> {
        let mut record = self.get_customer(id).await?;
        record.password_hash =
            Some(hash_password(password).map_err(|_| ApiError::internal("password hashing failed"))?);
        Ok(self.store.update_customer(record).await?)
    }

    // ── employees ──────────────────────────────────────────────────────

    pub async fn create_employee(&self, payload: dto::EmployeePayload) -> ApiResult<Employee> {
        let new = NewEmployee {
            full_name: payload.full_name,
            position: payload.position,
            phone: payload.phone,
            hire_date: payload.hire_date,
            username: payload.username,
            password_hash: hash_new_password(payload.password)?,
        };
        new.validate()?;
        Ok(self.store.insert_employee(new).await?)
    }

    pub async fn list_employees(&self) -> ApiResult<Vec<Employee>> {
        Ok(self.store.list_employees().await?)
    }

    pub async fn get_employee(&self, id: EmployeeId) -> ApiResult<Employee> {
        self.store
            .get_employee(id)
            .await?
            .ok_or_else(ApiError::not_found)
    }

    pub async fn update_employee(
        &self,
        id: EmployeeId,
        payload: dto::EmployeePayload,
    ) -> ApiResult<Employee> {
        let mut record = self.get_employee(id).await?;
        record.apply_update(NewEmployee {
            full_name: payload.full_name,
            position: payload.position,
            phone: payload.phone,
            hire_date: payload.hire_date,
            username: payload.username,
            password_hash: hash_new_password(payload.password)?,
        })?;
        self.store.update_employee(record.clone()).await?;
        Ok(record)
    }

    pub async fn delete_employee(&self, id: EmployeeId) -> ApiResult<()> {
        Ok(self.store.delete_employee(id).await?)
    }

    pub async fn change_employee_password(
        &self,
        id: EmployeeId,
        password: &str,
    ) -> ApiResult<()> {
        let mut record = self.get_employee(id).await?;
        record.password_hash =
            Some(hash_password(password).map_err(|_| ApiError::internal("password hashing failed"))?);
        Ok(self.store.update_employee(record).await?)
    }

    // ── suppliers ──────────────────────────────────────────────────────

    pub async fn create_supplier(&self, payload: dto::SupplierPayload) -> ApiResult<Supplier> {
        let new = NewSupplier {
            name: payload.name,
            contact_person: payload.contact_person,
            phone: payload.phone,
            email: payload.email,
            address: payload.address,
            username: payload.username,
            password_hash: hash_new_password(payload.password)?,
        };
        new.validate()?;
        Ok(self.store.insert_supplier(new).await?)
    }

    pub async fn list_suppliers(&self) -> ApiResult<Vec<Supplier>> {
        Ok(self.store.list_suppliers().await?)
    }

    pub async fn get_supplier(&self, id: SupplierId) -> ApiResult<Supplier> {
        self.store
            .get_supplier(id)
            .await?
            .ok_or_else(ApiError::not_found)
    }

    pub async fn update_supplier(
        &self,
        id: SupplierId,
        payload: dto::SupplierPayload,
    ) -> ApiResult<Supplier> {
        let mut record = self.get_supplier(id).await?;
        record.apply_update(NewSupplier {
            name: payload.name,
            contact_person: payload.contact_person,
            phone: payload.phone,
            email: payload.email,
            address: payload.address,
            username: payload.username,
            password_hash: None,
        })?;
        self.store.update_supplier(record.clone()).await?;
        Ok(record)
    }

    pub async fn delete_supplier(&self, id: SupplierId) -> ApiResult<()> {
        Ok(self.store.delete_supplier(id).await?)
    }

    pub async fn change_supplier_password(
        &self,
        id: SupplierId,
        password: &str,
    ) -> ApiResult<()> {
        let mut record = self.get_supplier(id).await?;
        record.password_hash =
            Some(hash_password(password).map_err(|_| ApiError::internal("password hashing failed"))?);
        Ok(self.store.update_supplier(record).await?)
    }

    // ── categories ─────────────────────────────────────────────────────

    async fn require_category(&self, id: CategoryId) -> ApiResult<ProductCategory> {
        self.store
            .get_category(id)
            .await?
            .ok_or_else(ApiError::not_found)
    }

    async fn check_parent_exists(&self, parent_id: Option<CategoryId>) -> ApiResult<()> {
        if let Some(parent) = parent_id
            && self.store.get_category(parent).await?.is_none()
        {
            return Err(
                DomainError::bad_reference(format!("category {parent} does not exist")).into(),
            );
        }
        Ok(())
    }

    pub async fn create_category(
        &self,
        payload: dto::CategoryPayload,
    ) -> ApiResult<ProductCategory> {
        let new = NewCategory {
            name: payload.name,
            parent_id: payload.parent_id,
        };
        new.validate()?;
        self.check_parent_exists(new.parent_id).await?;
        Ok(self.store.insert_category(new).await?)
    }

    pub async fn list_categories(&self) -> ApiResult<Vec<ProductCategory>> {
        Ok(self.store.list_categories().await?)
    }

    pub async fn get_category(&self, id: CategoryId) -> ApiResult<ProductCategory> {
        self.require_category(id).await
    }

    pub async fn update_category(
        &self,
        id: CategoryId,
        payload: dto::CategoryPayload,
    ) -> ApiResult<ProductCategory> {
        let mut record = self.require_category(id).await?;
        self.check_parent_exists(payload.parent_id).await?;
        record.apply_update(NewCategory {
            name: payload.name,
            parent_id: payload.parent_id,
        })?;
        self.store.update_category(record.clone()).await?;
        Ok(record)
    }

    /// Delete a category; refused while children or products still point at
    /// it. Check-then-act: nothing is touched on refusal.
    pub async fn delete_category(&self, id: CategoryId) -> ApiResult<()> {
        self.require_category(id).await?;
        if !self.store.list_child_categories(id).await?.is_empty() {
            return Err(DomainError::validation("category has child categories").into());
        }
        if self.store.category_has_products(id).await? {
            return Err(DomainError::validation("category has products").into());
        }
        Ok(self.store.delete_category(id).await?)
    }

    pub async fn child_categories(&self, id: CategoryId) -> ApiResult<Vec<ProductCategory>> {
        self.require_category(id).await?;
        Ok(self.store.list_child_categories(id).await?)
    }

    // ── products ───────────────────────────────────────────────────────

    async fn check_product_refs(
        &self,
        category_id: CategoryId,
        supplier_id: SupplierId,
    ) -> ApiResult<()> {
        if self.store.get_category(category_id).await?.is_none() {
            return Err(
                DomainError::bad_reference(format!("category {category_id} does not exist")).into(),
            );
        }
        if self.store.get_supplier(supplier_id).await?.is_none() {
            return Err(
                DomainError::bad_reference(format!("supplier {supplier_id} does not exist")).into(),
            );
        }
        Ok(())
    }

    pub async fn create_product(&self, payload: dto::ProductPayload) -> ApiResult<Product> {
        let new = NewProduct {
            name: payload.name,
            category_id: payload.category_id,
            supplier_id: payload.supplier_id,
            price: payload.price,
            description: payload.description,
            stock_quantity: payload.stock_quantity,
        };
        new.validate()?;
        self.check_product_refs(new.category_id, new.supplier_id).await?;
        Ok(self.store.insert_product(new).await?)
    }

    pub async fn list_products(&self) -> ApiResult<Vec<Product>> {
        Ok(self.store.list_products().await?)
    }

    pub async fn get_product(&self, id: ProductId) -> ApiResult<Product> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(ApiError::not_found)
    }

    pub async fn products_by_supplier(&self, id: SupplierId) -> ApiResult<Vec<Product>> {
        Ok(self.store.list_products_by_supplier(id).await?)
    }

    pub async fn update_product(
        &self,
        id: ProductId,
        payload: dto::ProductPayload,
    ) -> ApiResult<Product> {
        let mut record = self.get_product(id).await?;
        self.check_product_refs(payload.category_id, payload.supplier_id)
            .await?;
        record.apply_update(NewProduct {
            name: payload.name,
            category_id: payload.category_id,
            supplier_id: payload.supplier_id,
            price: payload.price,
            description: payload.description,
            stock_quantity: payload.stock_quantity,
        })?;
        self.store.update_product(record.clone()).await?;
        Ok(record)
    }

    pub async fn delete_product(&self, id: ProductId) -> ApiResult<()> {
        Ok(self.store.delete_product(id).await?)
    }

    /// Admin stock edit: set the absolute quantity, recording the derived
    /// movement as an audit row. Equal old/new quantity is a no-op.
    pub async fn set_stock(
        &self,
        id: ProductId,
        new_quantity: i64,
        employee_id: EmployeeId,
    ) -> ApiResult<Product> {
        if new_quantity < 0 {
            return Err(DomainError::validation("stock_quantity must not be negative").into());
        }
        let mut product = self.get_product(id).await?;

        let Some((operation_type, quantity)) =
            derive_operation(product.stock_quantity, new_quantity)
        else {
            return Ok(product);
        };
        // The derived movement reproduces the edit exactly.
        let applied = operation_type.apply_to(product.stock_quantity, quantity)?;

        self.store
            .record_stock_operation(
                NewStockOperation {
                    product_id: id,
                    operation_type,
                    quantity,
                    operation_date: Utc::now(),
                    employee_id,
                },
                applied,
            )
            .await?;
        product.stock_quantity = applied;
        Ok(product)
    }

    // ── stock operations ───────────────────────────────────────────────

    pub async fn list_stock_operations(&self) -> ApiResult<Vec<StockOperation>> {
        Ok(self.store.list_stock_operations().await?)
    }

    pub async fn get_stock_operation(&self, id: StockOperationId) -> ApiResult<StockOperation> {
        self.store
            .get_stock_operation(id)
            .await?
            .ok_or_else(ApiError::not_found)
    }

    /// Record an explicit inbound/outbound movement and update the product's
    /// quantity as one atomic pair.
    pub async fn adjust_stock(
        &self,
        payload: dto::StockOperationPayload,
        employee_id: EmployeeId,
    ) -> ApiResult<StockOperation> {
        let operation_type = StockOperationType::parse(&payload.operation_type).ok_or_else(|| {
            DomainError::validation(format!(
                "unknown operation type {:?}",
                payload.operation_type
            ))
        })?;
        let product = self.get_product(payload.product_id).await?;
        let new_quantity = operation_type.apply_to(product.stock_quantity, payload.quantity)?;

        Ok(self
            .store
            .record_stock_operation(
                NewStockOperation {
                    product_id: payload.product_id,
                    operation_type,
                    quantity: payload.quantity,
                    operation_date: Utc::now(),
                    employee_id,
                },
                new_quantity,
            )
            .await?)
    }

    // ── orders ─────────────────────────────────────────────────────────

    /// Checkout: snapshot current prices, compute the total server-side, and
    /// create the order with all its lines or nothing.
    ///
    /// Stock is deliberately not decremented here; quantities move only
    /// through stock operations. See DESIGN.md for the trade-off.
    pub async fn place_order(
        &self,
        customer_id: CustomerId,
        items: &[dto::LineItemRequest],
    ) -> ApiResult<(Order, Vec<OrderDetail>)> {
        if self.store.get_customer(customer_id).await?.is_none() {
            return Err(
                DomainError::bad_reference(format!("customer {customer_id} does not exist")).into(),
            );
        }

        let mut prices: BTreeMap<ProductId, Decimal> = BTreeMap::new();
        for item in items {
            if !prices.contains_key(&item.product_id)
                && let Some(product) = self.store.get_product(item.product_id).await?
            {
                prices.insert(item.product_id, product.price);
            }
        }

        let line_items: Vec<LineItem> = items
            .iter()
            .map(|i| LineItem {
                product_id: i.product_id,
                quantity: i.quantity,
            })
            .collect();
        let new = NewOrder::checkout(
            customer_id,
            &line_items,
            |id| prices.get(&id).copied(),
            Utc::now(),
        )?;

        Ok(self.store.create_order_with_details(new).await?)
    }

    pub async fn list_orders(&self) -> ApiResult<Vec<Order>> {
        Ok(self.store.list_orders().await?)
    }

    pub async fn get_order(&self, id: OrderId) -> ApiResult<Order> {
        self.store
            .get_order(id)
            .await?
            .ok_or_else(ApiError::not_found)
    }

    pub async fn orders_by_customer(&self, id: CustomerId) -> ApiResult<Vec<Order>> {
        Ok(self.store.list_orders_by_customer(id).await?)
    }

    pub async fn recent_orders(&self) -> ApiResult<Vec<Order>> {
        let cutoff = Utc::now() - Duration::days(RECENT_ORDER_DAYS);
        Ok(self.store.list_orders_since(cutoff).await?)
    }

    /// Lines and totals are immutable after creation, so an order update is
    /// a status transition.
    pub async fn transition_order(&self, id: OrderId, status: &str) -> ApiResult<Order> {
        let to = OrderStatus::parse(status)
            .ok_or_else(|| DomainError::validation(format!("unknown order status {status:?}")))?;
        let mut order = self.get_order(id).await?;
        order.transition_to(to)?;
        self.store.update_order(order.clone()).await?;
        Ok(order)
    }

    pub async fn delete_order(&self, id: OrderId) -> ApiResult<()> {
        Ok(self.store.delete_order(id).await?)
    }

    // ── order details ──────────────────────────────────────────────────

    pub async fn list_order_details(&self) -> ApiResult<Vec<OrderDetail>> {
        Ok(self.store.list_order_details().await?)
    }

    pub async fn get_order_detail(&self, id: OrderDetailId) -> ApiResult<OrderDetail> {
        self.store
            .get_order_detail(id)
            .await?
            .ok_or_else(ApiError::not_found)
    }

    /// Admin-only manual line insertion. The price snapshot is taken now;
    /// the order's stored total is not recomputed.
    pub async fn create_order_detail(
        &self,
        payload: dto::OrderDetailPayload,
    ) -> ApiResult<OrderDetail> {
        if payload.quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive").into());
        }
        if self.store.get_order(payload.order_id).await?.is_none() {
            return Err(DomainError::bad_reference(format!(
                "order {} does not exist",
                payload.order_id
            ))
            .into());
        }
        let product = self
            .store
            .get_product(payload.product_id)
            .await?
            .ok_or_else(|| {
                DomainError::bad_reference(format!("product {} does not exist", payload.product_id))
            })?;

        Ok(self
            .store
            .insert_order_detail(
                payload.order_id,
                NewOrderLine {
                    product_id: payload.product_id,
                    quantity: payload.quantity,
                    price_per_unit: product.price,
                },
            )
            .await?)
    }

    pub async fn update_order_detail(
        &self,
        id: OrderDetailId,
        quantity: i64,
    ) -> ApiResult<OrderDetail> {
        if quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive").into());
        }
        let mut record = self.get_order_detail(id).await?;
        record.quantity = quantity;
        self.store.update_order_detail(record.clone()).await?;
        Ok(record)
    }

    pub async fn delete_order_detail(&self, id: OrderDetailId) -> ApiResult<()> {
        Ok(self.store.delete_order_detail(id).await?)
    }

    pub async fn details_for_order(&self, id: OrderId) -> ApiResult<Vec<OrderDetail>> {
        Ok(self.store.list_details_for_order(id).await?)
    }

    pub async fn detail_rows_for_customer(
        &self,
        id: CustomerId,
    ) -> ApiResult<Vec<OrderDetailRow>> {
        Ok(self.store.list_detail_rows_for_customer(id).await?)
    }

    pub async fn detail_rows_for_supplier(
        &self,
        id: SupplierId,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> ApiResult<Vec<OrderDetailRow>> {
        Ok(self
            .store
            .list_detail_rows_for_supplier(id, start_date, end_date)
            .await?)
    }

    // ── financial reports ──────────────────────────────────────────────

    /// Compute and persist a snapshot for the given day (default today).
    pub async fn create_report(&self, report_date: Option<NaiveDate>) -> ApiResult<FinancialReport> {
        let report_date = report_date.unwrap_or_else(|| Utc::now().date_naive());
        let orders = self.store.list_orders().await?;
        let operations = self.store.list_stock_operations().await?;
        let prices: BTreeMap<ProductId, Decimal> = self
            .store
            .list_products()
            .await?
            .into_iter()
            .map(|p| (p.id, p.price))
            .collect();

        let new = snapshot(report_date, &orders, &operations, |id| {
            prices.get(&id).copied()
        });
        Ok(self.store.insert_report(new).await?)
    }

    pub async fn list_reports(&self) -> ApiResult<Vec<FinancialReport>> {
        Ok(self.store.list_reports().await?)
    }

    pub async fn get_report(&self, id: ReportId) -> ApiResult<FinancialReport> {
        self.store
            .get_report(id)
            .await?
            .ok_or_else(ApiError::not_found)
    }
}
