//! Customer API Models
//!
//! Response, request and parameter shapes for the customer tools. Every type
//! is a read-only view built fresh from database rows per request.

use serde::{Deserialize, Serialize};

/// Untyped row: column name -> value
pub type RowMap = serde_json::Map<String, serde_json::Value>;

/// Payment status that reduces an invoice balance
pub const PAYMENT_SUCCESSFUL: &str = "successful";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSummary {
    pub customer_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub loyalty_level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerDetail {
    pub customer_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub loyalty_level: String,
    /// Raw subscription rows
    pub subscriptions: Vec<RowMap>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub payment_id: i64,
    pub payment_date: Option<String>,
    pub amount: f64,
    pub method: String,
    pub status: String,
}

impl Payment {
    pub fn is_successful(&self) -> bool {
        self.status == PAYMENT_SUCCESSFUL
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_id: i64,
    pub invoice_date: String,
    pub amount: f64,
    pub description: String,
    pub due_date: String,
    pub payments: Vec<Payment>,
    pub outstanding: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceIncident {
    pub incident_id: i64,
    pub incident_date: String,
    pub description: String,
    pub resolution_status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionDetail {
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
    pub invoices: Vec<Invoice>,
    pub service_incidents: Vec<ServiceIncident>,
}

// Declared shapes with no tool wired to them yet.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Promotion {
    pub promotion_id: i64,
    pub product_id: i64,
    pub name: String,
    pub description: String,
    pub eligibility_criteria: Option<String>,
    pub start_date: String,
    pub end_date: String,
    pub discount_percent: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KbSearchParams {
    /// Natural language query
    pub query: String,
    /// Number of top documents to return
    #[serde(default = "default_topk")]
    pub topk: Option<usize>,
}

fn default_topk() -> Option<usize> {
    Some(3)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KbDoc {
    pub title: String,
    pub doc_type: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityLog {
    pub log_id: i64,
    pub event_type: String,
    pub event_timestamp: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: i64,
    pub order_date: String,
    pub product_name: String,
    pub amount: f64,
    pub order_status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataUsageRecord {
    pub usage_date: String,
    pub data_used_mb: i64,
    pub voice_minutes: i64,
    pub sms_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportTicket {
    pub ticket_id: i64,
    pub subscription_id: i64,
    pub category: String,
    pub opened_at: String,
    pub closed_at: Option<String>,
    pub status: String,
    pub priority: String,
    pub subject: String,
    pub description: String,
    pub cs_agent: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionUpdateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roaming_enabled: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autopay_enabled: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_tier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_cap_gb: Option<i64>,
}

// ========== Tool parameters ==========

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomerIdParam {
    pub customer_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubscriptionIdParam {
    pub subscription_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InvoiceIdParam {
    pub invoice_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_exact_successful_counts() {
        let mut payment = Payment {
            payment_id: 1,
            payment_date: None,
            amount: 10.0,
            method: "card".to_string(),
            status: "successful".to_string(),
        };
        assert!(payment.is_successful());

        payment.status = "Successful".to_string();
        assert!(!payment.is_successful());
    }

    #[test]
    fn test_params_reject_unknown_fields() {
        let ok: CustomerIdParam = serde_json::from_value(serde_json::json!({ "customer_id": 7 })).unwrap();
        assert_eq!(ok.customer_id, 7);

        let bad = serde_json::from_value::<CustomerIdParam>(
            serde_json::json!({ "customer_id": 7, "extra": true }),
        );
        assert!(bad.is_err());

        let wrong_type = serde_json::from_value::<InvoiceIdParam>(
            serde_json::json!({ "invoice_id": "seven" }),
        );
        assert!(wrong_type.is_err());
    }

    #[test]
    fn test_kb_search_default_topk() {
        let params: KbSearchParams =
            serde_json::from_value(serde_json::json!({ "query": "roaming charges" })).unwrap();
        assert_eq!(params.topk, Some(3));
    }

    #[test]
    fn test_update_request_omits_unset_fields() {
        let req = SubscriptionUpdateRequest {
            roaming_enabled: Some(1),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            serde_json::json!({ "roaming_enabled": 1 })
        );
    }
}
