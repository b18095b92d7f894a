use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, NaiveDate, Utc};

use siphon_core::{
    CategoryId, CustomerId, EmployeeId, OrderDetailId, OrderId, ProductId, ReportId,
    StockOperationId, SupplierId,
};
use siphon_inventory::{NewStockOperation, StockOperation};
use siphon_parties::{Customer, Employee, NewCustomer, NewEmployee, NewSupplier, Supplier};
use siphon_products::{NewCategory, NewProduct, Product, ProductCategory};
use siphon_reporting::{FinancialReport, NewFinancialReport};
use siphon_sales::{NewOrder, NewOrderLine, Order, OrderDetail};

use crate::store::{OrderDetailRow, Store, StoreError, StoreResult};

/// In-memory store backed by one lock.
///
/// Intended for tests/dev. Atomicity of the composite writes falls out of
/// the single write lock; ids are per-table serial counters starting at 1.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

#[derive(Debug, Default)]
struct State {
    customers: BTreeMap<i64, Customer>,
    employees: BTreeMap<i64, Employee>,
    suppliers: BTreeMap<i64, Supplier>,
    categories: BTreeMap<i64, ProductCategory>,
    products: BTreeMap<i64, Product>,
    orders: BTreeMap<i64, Order>,
    order_details: BTreeMap<i64, OrderDetail>,
    stock_operations: BTreeMap<i64, StockOperation>,
    reports: BTreeMap<i64, FinancialReport>,
    seq: Sequences,
}

#[derive(Debug, Default)]
struct Sequences {
    customers: i64,
    employees: i64,
    suppliers: i64,
    categories: i64,
    products: i64,
    orders: i64,
    order_details: i64,
    stock_operations: i64,
    reports: i64,
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }
}

impl State {
    fn detail_row(&self, detail: &OrderDetail) -> Option<OrderDetailRow> {
        let order = self.orders.get(&detail.order_id.as_i64())?;
        let product = self.products.get(&detail.product_id.as_i64())?;
        Some(OrderDetailRow {
            detail: detail.clone(),
            product_name: product.name.clone(),
            order_date: order.order_date,
        })
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    // ── customers ──────────────────────────────────────────────────────

    async fn list_customers(&self) -> StoreResult<Vec<Customer>> {
        Ok(self.read()?.customers.values().cloned().collect())
    }

    async fn get_customer(&self, id: CustomerId) -> StoreResult<Option<Customer>> {
        Ok(self.read()?.customers.get(&id.as_i64()).cloned())
    }

    async fn find_customer_by_username(&self, username: &str) -> StoreResult<Option<Customer>> {
        Ok(self
            .read()?
            .customers
            .values()
            .find(|c| c.username.as_deref() == Some(username))
            .cloned())
    }

    async fn insert_customer(&self, new: NewCustomer) -> StoreResult<Customer> {
        let mut state = self.write()?;
        let id = next(&mut state.seq.customers);
        let record = new.into_record(CustomerId::new(id));
        state.customers.insert(id, record.clone());
        Ok(record)
    }

    async fn update_customer(&self, record: Customer) -> StoreResult<()> {
        let mut state = self.write()?;
        let slot = state
            .customers
            .get_mut(&record.id.as_i64())
            .ok_or(StoreError::NotFound)?;
        *slot = record;
        Ok(())
    }

    async fn delete_customer(&self, id: CustomerId) -> StoreResult<()> {
        self.write()?
            .customers
            .remove(&id.as_i64())
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    // ── employees ──────────────────────────────────────────────────────

    async fn list_employees(&self) -> StoreResult<Vec<Employee>> {
        Ok(self.read()?.employees.values().cloned().collect())
    }

    async fn get_employee(&self, id: EmployeeId) -> StoreResult<Option<Employee>> {
        Ok(self.read()?.employees.get(&id.as_i64()).cloned())
    }

    async fn find_employee_by_username(&self, username: &str) -> StoreResult<Option<Employee>> {
        Ok(self
            .read()?
            .employees
            .values()
            .find(|e| e.username.as_deref() == Some(username))
            .cloned())
    }

    async fn insert_employee(&self, new: NewEmployee) -> StoreResult<Employee> {
        let mut state = self.write()?;
        let id = next(&mut state.seq.employees);
        let record = new.into_record(EmployeeId::new(id));
        state.employees.insert(id, record.clone());
        Ok(record)
    }

    async fn update_employee(&self, record: Employee) -> StoreResult<()> {
        let mut state = self.write()?;
        let slot = state
            .employees
            .get_mut(&record.id.as_i64())
            .ok_or(StoreError::NotFound)?;
        *slot = record;
        Ok(())
    }

    async fn delete_employee(&self, id: EmployeeId) -> StoreResult<()> {
        self.write()?
            .employees
            .remove(&id.as_i64())
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    // ── suppliers ──────────────────────────────────────────────────────

    async fn list_suppliers(&self) -> StoreResult<Vec<Supplier>> {
        Ok(self.read()?.suppliers.values().cloned().collect())
    }

    async fn get_supplier(&self, id: SupplierId) -> StoreResult<Option<Supplier>> {
        Ok(self.read()?.suppliers.get(&id.as_i64()).cloned())
    }

    async fn find_supplier_by_username(&self, username: &str) -> StoreResult<Option<Supplier>> {
        Ok(self
            .read()?
            .suppliers
            .values()
            .find(|s| s.username.as_deref() == Some(username))
            .cloned())
    }

    async fn insert_supplier(&self, new: NewSupplier) -> StoreResult<Supplier> {
        let mut state = self.write()?;
        let id = next(&mut state.seq.suppliers);
        let record = new.into_record(SupplierId::new(id));
        state.suppliers.insert(id, record.clone());
        Ok(record)
    }

    async fn update_supplier(&self, record: Supplier) -> StoreResult<()> {
        let mut state = self.write()?;
        let slot = state
            .suppliers
            .get_mut(&record.id.as_i64())
            .ok_or(StoreError::NotFound)?;
        *slot = record;
        Ok(())
    }

    async fn delete_supplier(&self, id: SupplierId) -> StoreResult<()> {
        self.write()?
            .suppliers
            .remove(&id.as_i64())
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    // ── categories ─────────────────────────────────────────────────────

    async fn list_categories(&self) -> StoreResult<Vec<ProductCategory>> {
        Ok(self.read()?.categories.values().cloned().collect())
    }

    async fn get_category(&self, id: CategoryId) -> StoreResult<Option<ProductCategory>> {
        Ok(self.read()?.categories.get(&id.as_i64()).cloned())
    }

    async fn insert_category(&self, new: NewCategory) -> StoreResult<ProductCategory> {
        let mut state = self.write()?;
        let id = next(&mut state.seq.categories);
        let record = new.into_record(CategoryId::new(id));
        state.categories.insert(id, record.clone());
        Ok(record)
    }

    async fn update_category(&self, record: ProductCategory) -> StoreResult<()> {
        let mut state = self.write()?;
        let slot = state
            .categories
            .get_mut(&record.id.as_i64())
            .ok_or(StoreError::NotFound)?;
        *slot = record;
        Ok(())
    }

    async fn delete_category(&self, id: CategoryId) -> StoreResult<()> {
        self.write()?
            .categories
            .remove(&id.as_i64())
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn list_child_categories(&self, id: CategoryId) -> StoreResult<Vec<ProductCategory>> {
        Ok(self
            .read()?
            .categories
            .values()
            .filter(|c| c.parent_id == Some(id))
            .cloned()
            .collect())
    }

    async fn category_has_products(&self, id: CategoryId) -> StoreResult<bool> {
        Ok(self.read()?.products.values().any(|p| p.category_id == id))
    }

    // ── products ───────────────────────────────────────────────────────

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        Ok(self.read()?.products.values().cloned().collect())
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(self.read()?.products.get(&id.as_i64()).cloned())
    }

    async fn list_products_by_supplier(&self, id: SupplierId) -> StoreResult<Vec<Product>> {
        Ok(self
            .read()?
            .products
            .values()
            .filter(|p| p.supplier_id == id)
            .cloned()
            .collect())
    }

    async fn insert_product(&self, new: NewProduct) -> StoreResult<Product> {
        let mut state = self.write()?;
        let id = next(&mut state.seq.products);
        let record = new.into_record(ProductId::new(id));
        state.products.insert(id, record.clone());
        Ok(record)
    }

    async fn update_product(&self, record: Product) -> StoreResult<()> {
        let mut state = self.write()?;
        let slot = state
            .products
            .get_mut(&record.id.as_i64())
            .ok_or(StoreError::NotFound)?;
        *slot = record;
        Ok(())
    }

    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        self.write()?
            .products
            .remove(&id.as_i64())
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    // ── orders ─────────────────────────────────────────────────────────

    async fn list_orders(&self) -> StoreResult<Vec<Order>> {
        Ok(self.read()?.orders.values().cloned().collect())
    }

    async fn get_order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        Ok(self.read()?.orders.get(&id.as_i64()).cloned())
    }

    async fn list_orders_by_customer(&self, id: CustomerId) -> StoreResult<Vec<Order>> {
        Ok(self
            .read()?
            .orders
            .values()
            .filter(|o| o.customer_id == id)
            .cloned()
            .collect())
    }

    async fn list_orders_since(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<Order>> {
        Ok(self
            .read()?
            .orders
            .values()
            .filter(|o| o.order_date >= cutoff)
            .cloned()
            .collect())
    }

    async fn create_order_with_details(
        &self,
        new: NewOrder,
    ) -> StoreResult<(Order, Vec<OrderDetail>)> {
        let mut state = self.write()?;
        let order_id = OrderId::new(next(&mut state.seq.orders));
        let order = Order {
            id: order_id,
            customer_id: new.customer_id,
            order_date: new.order_date,
            status: new.status,
            total_amount: new.total_amount,
        };
        state.orders.insert(order_id.as_i64(), order.clone());

        let mut details = Vec::with_capacity(new.lines.len());
        for line in new.lines {
            let detail_id = next(&mut state.seq.order_details);
            let detail = OrderDetail {
                id: OrderDetailId::new(detail_id),
                order_id,
                product_id: line.product_id,
                quantity: line.quantity,
                price_per_unit: line.price_per_unit,
            };
            state.order_details.insert(detail_id, detail.clone());
            details.push(detail);
        }
        Ok((order, details))
    }

    async fn update_order(&self, record: Order) -> StoreResult<()> {
        let mut state = self.write()?;
        let slot = state
            .orders
            .get_mut(&record.id.as_i64())
            .ok_or(StoreError::NotFound)?;
        *slot = record;
        Ok(())
    }

    async fn delete_order(&self, id: OrderId) -> StoreResult<()> {
        let mut state = self.write()?;
        state
            .orders
            .remove(&id.as_i64())
            .ok_or(StoreError::NotFound)?;
        // Lines never outlive their order.
        state.order_details.retain(|_, d| d.order_id != id);
        Ok(())
    }

    // ── order details ──────────────────────────────────────────────────

    async fn list_order_details(&self) -> StoreResult<Vec<OrderDetail>> {
        Ok(self.read()?.order_details.values().cloned().collect())
    }

    async fn get_order_detail(&self, id: OrderDetailId) -> StoreResult<Option<OrderDetail>> {
        Ok(self.read()?.order_details.get(&id.as_i64()).cloned())
    }

    async fn insert_order_detail(
        &self,
        order_id: OrderId,
        line: NewOrderLine,
    ) -> StoreResult<OrderDetail> {
        let mut state = self.write()?;
        let id = next(&mut state.seq.order_details);
        let detail = OrderDetail {
            id: OrderDetailId::new(id),
            order_id,
            product_id: line.product_id,
            quantity: line.quantity,
            price_per_unit: line.price_per_unit,
        };
        state.order_details.insert(id, detail.clone());
        Ok(detail)
    }

    async fn update_order_detail(&self, record: OrderDetail) -> StoreResult<()> {
        let mut state = self.write()?;
        let slot = state
            .order_details
            .get_mut(&record.id.as_i64())
            .ok_or(StoreError::NotFound)?;
        *slot = record;
        Ok(())
    }

    async fn delete_order_detail(&self, id: OrderDetailId) -> StoreResult<()> {
        self.write()?
            .order_details
            .remove(&id.as_i64())
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn list_details_for_order(&self, id: OrderId) -> StoreResult<Vec<OrderDetail>> {
        Ok(self
            .read()?
            .order_details
            .values()
            .filter(|d| d.order_id == id)
            .cloned()
            .collect())
    }

    async fn list_detail_rows_for_customer(
        &self,
        id: CustomerId,
    ) -> StoreResult<Vec<OrderDetailRow>> {
        let state = self.read()?;
        Ok(state
            .order_details
            .values()
            .filter(|d| {
                state
                    .orders
                    .get(&d.order_id.as_i64())
                    .is_some_and(|o| o.customer_id == id)
            })
            .filter_map(|d| state.detail_row(d))
            .collect())
    }

    async fn list_detail_rows_for_supplier(
        &self,
        id: SupplierId,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> StoreResult<Vec<OrderDetailRow>> {
        let state = self.read()?;
        Ok(state
            .order_details
            .values()
            .filter(|d| {
                state
                    .products
                    .get(&d.product_id.as_i64())
                    .is_some_and(|p| p.supplier_id == id)
            })
            .filter_map(|d| state.detail_row(d))
            .filter(|row| {
                let day = row.order_date.date_naive();
                start_date.is_none_or(|s| day >= s) && end_date.is_none_or(|e| day <= e)
            })
            .collect())
    }

    // ── stock operations ───────────────────────────────────────────────

    async fn list_stock_operations(&self) -> StoreResult<Vec<StockOperation>> {
        Ok(self.read()?.stock_operations.values().cloned().collect())
    }

    async fn get_stock_operation(
        &self,
        id: StockOperationId,
    ) -> StoreResult<Option<StockOperation>> {
        Ok(self.read()?.stock_operations.get(&id.as_i64()).cloned())
    }

    async fn record_stock_operation(
        &self,
        new: NewStockOperation,
        new_quantity: i64,
    ) -> StoreResult<StockOperation> {
        let mut state = self.write()?;
        let product = state
            .products
            .get_mut(&new.product_id.as_i64())
            .ok_or(StoreError::NotFound)?;
        product.stock_quantity = new_quantity;

        let id = next(&mut state.seq.stock_operations);
        let record = new.into_record(StockOperationId::new(id));
        state.stock_operations.insert(id, record.clone());
        Ok(record)
    }

    // ── financial reports ──────────────────────────────────────────────

    async fn list_reports(&self) -> StoreResult<Vec<FinancialReport>> {
        Ok(self.read()?.reports.values().cloned().collect())
    }

    async fn get_report(&self, id: ReportId) -> StoreResult<Option<FinancialReport>> {
        Ok(self.read()?.reports.get(&id.as_i64()).cloned())
    }

    async fn insert_report(&self, new: NewFinancialReport) -> StoreResult<FinancialReport> {
        let mut state = self.write()?;
        let id = next(&mut state.seq.reports);
        let record = new.into_record(ReportId::new(id));
        state.reports.insert(id, record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    use siphon_inventory::StockOperationType;
    use siphon_sales::OrderStatus;

    use super::*;

    fn supplier() -> NewSupplier {
        NewSupplier {
            name: "TruboProm".into(),
            contact_person: None,
            phone: "+7 812 000-00-01".into(),
            email: None,
            address: None,
            username: Some("trubo".into()),
            password_hash: Some("$argon2id$stub".into()),
        }
    }

    fn product(category_id: CategoryId, supplier_id: SupplierId, stock: i64) -> NewProduct {
        NewProduct {
            name: "Coupling 3/4\"".into(),
            category_id,
            supplier_id,
            price: dec!(120.00),
            description: None,
            stock_quantity: stock,
        }
    }

    async fn seeded() -> (MemoryStore, Product) {
        let store = MemoryStore::new();
        let category = store
            .insert_category(NewCategory {
                name: "Fittings".into(),
                parent_id: None,
            })
            .await
            .unwrap();
        let supplier = store.insert_supplier(supplier()).await.unwrap();
        let product = store
            .insert_product(product(category.id, supplier.id, 10))
            .await
            .unwrap();
        (store, product)
    }

    #[tokio::test]
    async fn ids_are_serial_per_table() {
        let store = MemoryStore::new();
        let a = store
            .insert_category(NewCategory {
                name: "Pipes".into(),
                parent_id: None,
            })
            .await
            .unwrap();
        let b = store
            .insert_category(NewCategory {
                name: "Valves".into(),
                parent_id: None,
            })
            .await
            .unwrap();
        assert_eq!(a.id.as_i64(), 1);
        assert_eq!(b.id.as_i64(), 2);
    }

    #[tokio::test]
    async fn update_of_a_missing_row_is_not_found() {
        let store = MemoryStore::new();
        let record = NewCategory {
            name: "Pipes".into(),
            parent_id: None,
        }
        .into_record(CategoryId::new(42));
        assert!(matches!(
            store.update_category(record).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn order_and_lines_are_created_together() {
        let (store, product) = seeded().await;
        let customer = store
            .insert_customer(NewCustomer {
                full_name: "Vera Pavlova".into(),
                phone: "+7 900 111-22-33".into(),
                email: None,
                address: None,
                username: None,
                password_hash: None,
            })
            .await
            .unwrap();

        let new = NewOrder {
            customer_id: customer.id,
            order_date: Utc::now(),
            status: OrderStatus::Paid,
            total_amount: dec!(240.00),
            lines: vec![NewOrderLine {
                product_id: product.id,
                quantity: 2,
                price_per_unit: dec!(120.00),
            }],
        };
        let (order, details) = store.create_order_with_details(new).await.unwrap();

        assert_eq!(details.len(), 1);
        assert_eq!(details[0].order_id, order.id);
        let listed = store.list_details_for_order(order.id).await.unwrap();
        assert_eq!(listed, details);
    }

    #[tokio::test]
    async fn deleting_an_order_drops_its_lines() {
        let (store, product) = seeded().await;
        let customer_id = CustomerId::new(1);
        store
            .insert_customer(NewCustomer {
                full_name: "Vera Pavlova".into(),
                phone: "+7 900 111-22-33".into(),
                email: None,
                address: None,
                username: None,
                password_hash: None,
            })
            .await
            .unwrap();
        let (order, _) = store
            .create_order_with_details(NewOrder {
                customer_id,
                order_date: Utc::now(),
                status: OrderStatus::Paid,
                total_amount: dec!(120.00),
                lines: vec![NewOrderLine {
                    product_id: product.id,
                    quantity: 1,
                    price_per_unit: dec!(120.00),
                }],
            })
            .await
            .unwrap();

        store.delete_order(order.id).await.unwrap();
        assert!(store.list_order_details().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stock_operation_updates_quantity_and_audit_together() {
        let (store, product) = seeded().await;
        let employee = store
            .insert_employee(NewEmployee {
                full_name: "Oleg Markov".into(),
                position: "storekeeper".into(),
                phone: "+7 900 000-00-01".into(),
                hire_date: NaiveDate::from_ymd_opt(2023, 4, 1).unwrap(),
                username: None,
                password_hash: None,
            })
            .await
            .unwrap();

        let op = store
            .record_stock_operation(
                NewStockOperation {
                    product_id: product.id,
                    operation_type: StockOperationType::Inbound,
                    quantity: 5,
                    operation_date: Utc::now(),
                    employee_id: employee.id,
                },
                15,
            )
            .await
            .unwrap();

        assert_eq!(op.quantity, 5);
        let reloaded = store.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(reloaded.stock_quantity, 15);
        assert_eq!(store.list_stock_operations().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn supplier_detail_rows_honor_the_date_range() {
        let (store, product) = seeded().await;
        let customer = store
            .insert_customer(NewCustomer {
                full_name: "Vera Pavlova".into(),
                phone: "+7 900 111-22-33".into(),
                email: None,
                address: None,
                username: None,
                password_hash: None,
            })
            .await
            .unwrap();

        for day in [5u32, 20u32] {
            store
                .create_order_with_details(NewOrder {
                    customer_id: customer.id,
                    order_date: Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap(),
                    status: OrderStatus::Paid,
                    total_amount: dec!(120.00),
                    lines: vec![NewOrderLine {
                        product_id: product.id,
                        quantity: 1,
                        price_per_unit: dec!(120.00),
                    }],
                })
                .await
                .unwrap();
        }

        let rows = store
            .list_detail_rows_for_supplier(
                product.supplier_id,
                Some(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()),
                Some(NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()),
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].product_name, "Coupling 3/4\"");
        assert_eq!(
            rows[0].order_date.date_naive(),
            NaiveDate::from_ymd_opt(2026, 3, 5).unwrap()
        );
    }

    #[tokio::test]
    async fn username_lookup_is_exact() {
        let store = MemoryStore::new();
        store.insert_supplier(supplier()).await.unwrap();
        assert!(
            store
                .find_supplier_by_username("trubo")
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            store
                .find_supplier_by_username("Trubo")
                .await
                .unwrap()
                .is_none()
        );
    }
}
