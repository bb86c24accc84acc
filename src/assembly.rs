//! Response Assembly
//!
//! Pure functions that turn already-fetched row sets into nested response
//! objects. No database access happens here.

use std::collections::HashMap;

use crate::models::{
    CustomerDetail, Invoice, Payment, RowMap, ServiceIncident, SubscriptionDetail,
};

/// `Customers` row
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRow {
    pub customer_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub loyalty_level: String,
}

/// `Subscriptions` row joined with its `Products` row
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionRow {
    pub subscription_id: i64,
    pub product_id: i64,
    pub start_date: String,
    pub end_date: String,
    pub status: String,
    pub roaming_enabled: i64,
    pub service_status: String,
    pub speed_tier: Option<String>,
    pub data_cap_gb: Option<i64>,
    pub autopay_enabled: i64,
    pub product_name: String,
    pub product_description: Option<String>,
    pub category: Option<String>,
    pub monthly_fee: Option<f64>,
}

/// `Invoices` row
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceRow {
    pub invoice_id: i64,
    pub invoice_date: String,
    pub amount: f64,
    pub description: String,
    pub due_date: String,
}

/// `Payments` row tagged with the invoice it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRow {
    pub invoice_id: i64,
    pub payment: Payment,
}

/// Balance left on an invoice after successful payments, floored at zero
pub fn outstanding(amount: f64, payments: &[Payment]) -> f64 {
    let paid: f64 = payments
        .iter()
        .filter(|p| p.is_successful())
        .map(|p| p.amount)
        .sum();

    (amount - paid).max(0.0)
}

pub fn assemble_customer(row: CustomerRow, subscriptions: Vec<RowMap>) -> CustomerDetail {
    CustomerDetail {
        customer_id: row.customer_id,
        first_name: row.first_name,
        last_name: row.last_name,
        email: row.email,
        phone: row.phone,
        address: row.address,
        loyalty_level: row.loyalty_level,
        subscriptions,
    }
}

/// Attach payments to their invoices by `invoice_id`.
///
/// Invoice order and per-invoice payment order follow the input order.
/// Payments whose `invoice_id` matches no invoice are dropped.
pub fn assemble_invoices(invoices: Vec<InvoiceRow>, payments: Vec<PaymentRow>) -> Vec<Invoice> {
    let mut by_invoice: HashMap<i64, Vec<Payment>> = HashMap::new();
    for row in payments {
        by_invoice.entry(row.invoice_id).or_default().push(row.payment);
    }

    invoices
        .into_iter()
        .map(|inv| {
            let payments = by_invoice.remove(&inv.invoice_id).unwrap_or_default();
            let outstanding = outstanding(inv.amount, &payments);
            Invoice {
                invoice_id: inv.invoice_id,
                invoice_date: inv.invoice_date,
                amount: inv.amount,
                description: inv.description,
                due_date: inv.due_date,
                payments,
                outstanding,
            }
        })
        .collect()
}

pub fn assemble_subscription(
    sub: SubscriptionRow,
    invoices: Vec<Invoice>,
    service_incidents: Vec<ServiceIncident>,
) -> SubscriptionDetail {
    SubscriptionDetail {
        subscription_id: sub.subscription_id,
        product_id: sub.product_id,
        start_date: sub.start_date,
        end_date: sub.end_date,
        status: sub.status,
        roaming_enabled: sub.roaming_enabled,
        service_status: sub.service_status,
        speed_tier: sub.speed_tier,
        data_cap_gb: sub.data_cap_gb,
        autopay_enabled: sub.autopay_enabled,
        product_name: sub.product_name,
        product_description: sub.product_description,
        category: sub.category,
        monthly_fee: sub.monthly_fee,
        invoices,
        service_incidents,
    }
}
