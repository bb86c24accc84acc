//! Customer Store
//!
//! Read-only access to the Contoso customer database. Every operation opens
//! its own connection, runs its reads on it and drops it before returning.
//! Multi-statement lookups read inside one deferred transaction so every row
//! comes from the same snapshot. Row sets are handed to [`crate::assembly`]
//! for nesting.

use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::assembly::{
    assemble_customer, assemble_invoices, assemble_subscription, CustomerRow, InvoiceRow,
    PaymentRow, SubscriptionRow,
};
use crate::error::{ToolError, ToolResult};
use crate::models::{
    CustomerDetail, CustomerSummary, Payment, RowMap, ServiceIncident, SubscriptionDetail,
};

/// Handle to the customer database file
#[derive(Debug, Clone)]
pub struct CustomerStore {
    db_path: PathBuf,
    busy_timeout: Duration,
    deadline: Option<Instant>,
}

impl CustomerStore {
    pub fn new(db_path: impl Into<PathBuf>, busy_timeout: Duration) -> Self {
        Self {
            db_path: db_path.into(),
            busy_timeout,
            deadline: None,
        }
    }

    /// Bound every connection opened by this handle to `deadline`.
    ///
    /// Lock waits are capped to the time left and running statements are
    /// interrupted once it passes, so the connection closes promptly.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Open a fresh read-only connection
    fn connect(&self) -> ToolResult<Connection> {
        let busy_timeout = match self.deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Err(ToolError::Timeout(
                        "deadline passed before connecting".to_string(),
                    ));
                }
                self.busy_timeout.min(remaining)
            }
            None => self.busy_timeout,
        };

        let conn = Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            ToolError::DatastoreUnavailable(format!("{}: {}", self.db_path.display(), e))
        })?;
        conn.busy_timeout(busy_timeout)?;

        if let Some(deadline) = self.deadline {
            conn.progress_handler(1000, Some(move || Instant::now() >= deadline));
        }

        Ok(conn)
    }

    /// Run `read` inside a deferred read transaction on a fresh connection
    fn snapshot<T>(&self, read: impl FnOnce(&Connection) -> ToolResult<T>) -> ToolResult<T> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let value = read(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// List all customers with basic info
    pub fn get_all_customers(&self) -> ToolResult<Vec<CustomerSummary>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT customer_id, first_name, last_name, email, loyalty_level FROM Customers",
        )?;

        let customers = stmt
            .query_map([], |row| {
                Ok(CustomerSummary {
                    customer_id: row.get("customer_id")?,
                    first_name: row.get("first_name")?,
                    last_name: row.get("last_name")?,
                    email: row.get("email")?,
                    loyalty_level: row.get("loyalty_level")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Loaded {} customers", customers.len());
        Ok(customers)
    }

    /// Full customer profile with raw subscription rows
    pub fn get_customer_detail(&self, customer_id: i64) -> ToolResult<CustomerDetail> {
        self.snapshot(|conn| read_customer_detail(conn, customer_id))
    }

    /// Subscription with product, invoices (with payments) and service incidents
    pub fn get_subscription_detail(&self, subscription_id: i64) -> ToolResult<SubscriptionDetail> {
        self.snapshot(|conn| read_subscription_detail(conn, subscription_id))
    }

    /// Payments for an invoice; empty for an unknown invoice
    pub fn get_invoice_payments(&self, invoice_id: i64) -> ToolResult<Vec<Payment>> {
        let conn = self.connect()?;
        query_payments(&conn, invoice_id)
    }
}

fn read_customer_detail(conn: &Connection, customer_id: i64) -> ToolResult<CustomerDetail> {
    let customer = conn
        .query_row(
            "SELECT customer_id, first_name, last_name, email, phone, address, loyalty_level
             FROM Customers WHERE customer_id = ?1",
            params![customer_id],
            |row| {
                Ok(CustomerRow {
                    customer_id: row.get("customer_id")?,
                    first_name: row.get("first_name")?,
                    last_name: row.get("last_name")?,
                    email: row.get("email")?,
                    phone: row.get("phone")?,
                    address: row.get("address")?,
                    loyalty_level: row.get("loyalty_level")?,
                })
            },
        )
        .optional()?
        .ok_or_else(|| ToolError::not_found("Customer", customer_id))?;

    let mut stmt = conn.prepare("SELECT * FROM Subscriptions WHERE customer_id = ?1")?;
    let subscriptions = stmt
        .query_map(params![customer_id], row_to_map)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(assemble_customer(customer, subscriptions))
}

fn read_subscription_detail(
    conn: &Connection,
    subscription_id: i64,
) -> ToolResult<SubscriptionDetail> {
    // Inner join: a subscription pointing at a missing product is reported as not found
    let subscription = conn
        .query_row(
            "SELECT s.subscription_id, s.product_id, s.start_date, s.end_date, s.status,
                    s.roaming_enabled, s.service_status, s.speed_tier, s.data_cap_gb,
                    s.autopay_enabled,
                    p.name AS product_name, p.description AS product_description,
                    p.category, p.monthly_fee
             FROM Subscriptions s
             JOIN Products p ON p.product_id = s.product_id
             WHERE s.subscription_id = ?1",
            params![subscription_id],
            |row| {
                Ok(SubscriptionRow {
                    subscription_id: row.get("subscription_id")?,
                    product_id: row.get("product_id")?,
                    start_date: row.get("start_date")?,
                    end_date: row.get("end_date")?,
                    status: row.get("status")?,
                    roaming_enabled: row.get("roaming_enabled")?,
                    service_status: row.get("service_status")?,
                    speed_tier: row.get("speed_tier")?,
                    data_cap_gb: row.get("data_cap_gb")?,
                    autopay_enabled: row.get("autopay_enabled")?,
                    product_name: row.get("product_name")?,
                    product_description: row.get("product_description")?,
                    category: row.get("category")?,
                    monthly_fee: row.get("monthly_fee")?,
                })
            },
        )
        .optional()?
        .ok_or_else(|| ToolError::not_found("Subscription", subscription_id))?;

    let mut stmt = conn.prepare(
        "SELECT invoice_id, invoice_date, amount, description, due_date
         FROM Invoices WHERE subscription_id = ?1",
    )?;
    let invoice_rows = stmt
        .query_map(params![subscription_id], |row| {
            Ok(InvoiceRow {
                invoice_id: row.get("invoice_id")?,
                invoice_date: row.get("invoice_date")?,
                amount: row.get("amount")?,
                description: row.get("description")?,
                due_date: row.get("due_date")?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut payment_rows = Vec::new();
    for invoice in &invoice_rows {
        payment_rows.extend(
            query_payments(conn, invoice.invoice_id)?
                .into_iter()
                .map(|payment| PaymentRow {
                    invoice_id: invoice.invoice_id,
                    payment,
                }),
        );
    }

    let mut stmt = conn.prepare(
        "SELECT incident_id, incident_date, description, resolution_status
         FROM ServiceIncidents WHERE subscription_id = ?1",
    )?;
    let incidents = stmt
        .query_map(params![subscription_id], |row| {
            Ok(ServiceIncident {
                incident_id: row.get("incident_id")?,
                incident_date: row.get("incident_date")?,
                description: row.get("description")?,
                resolution_status: row.get("resolution_status")?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        "Subscription {}: {} invoices, {} payments, {} incidents",
        subscription_id,
        invoice_rows.len(),
        payment_rows.len(),
        incidents.len()
    );

    let invoices = assemble_invoices(invoice_rows, payment_rows);
    Ok(assemble_subscription(subscription, invoices, incidents))
}

fn query_payments(conn: &Connection, invoice_id: i64) -> ToolResult<Vec<Payment>> {
    let mut stmt = conn.prepare(
        "SELECT payment_id, payment_date, amount, method, status
         FROM Payments WHERE invoice_id = ?1",
    )?;
    let payments = stmt
        .query_map(params![invoice_id], |row| {
            Ok(Payment {
                payment_id: row.get("payment_id")?,
                payment_date: row.get("payment_date")?,
                amount: row.get("amount")?,
                method: row.get("method")?,
                status: row.get("status")?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(payments)
}

/// Convert a row into a column-name keyed JSON object
fn row_to_map(row: &Row<'_>) -> rusqlite::Result<RowMap> {
    let stmt: &rusqlite::Statement<'_> = row.as_ref();
    let mut map = RowMap::new();

    for (idx, name) in stmt.column_names().into_iter().enumerate() {
        let value = match row.get_ref(idx)? {
            ValueRef::Null => serde_json::Value::Null,
            ValueRef::Integer(i) => serde_json::Value::from(i),
            ValueRef::Real(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            ValueRef::Text(t) => serde_json::Value::String(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => serde_json::Value::from(b.to_vec()),
        };
        map.insert(name.to_string(), value);
    }

    Ok(map)
}
