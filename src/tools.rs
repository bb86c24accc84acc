//! MCP Tool Registry
//!
//! Declares the customer tools (name, description, input and output schema)
//! and dispatches calls to the [`CustomerStore`]. Arguments are validated
//! against the typed parameter structs before any database work happens.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::Config;
use crate::embeddings::{embedder_from_config, Embedder};
use crate::error::{ToolError, ToolResult};
use crate::models::{CustomerIdParam, InvoiceIdParam, SubscriptionIdParam};
use crate::store::CustomerStore;

/// Tool definition for MCP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
    #[serde(rename = "outputSchema")]
    pub output_schema: Value,
}

/// Tool registry over the customer store
pub struct ToolRegistry {
    store: CustomerStore,
    embedder: Embedder,
    tool_timeout: Duration,
}

impl ToolRegistry {
    /// Build from configuration; decides the embedding provider once
    pub fn new(config: &Config) -> Self {
        let store = CustomerStore::new(config.db_path.clone(), config.busy_timeout);
        let embedder = embedder_from_config(&config.azure, config.embedding_timeout);
        Self::with_parts(store, embedder, config.tool_timeout)
    }

    pub fn with_parts(store: CustomerStore, embedder: Embedder, tool_timeout: Duration) -> Self {
        Self {
            store,
            embedder,
            tool_timeout,
        }
    }

    pub fn store(&self) -> &CustomerStore {
        &self.store
    }

    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }

    /// List all tool definitions
    pub fn list_definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                name: "get_all_customers".to_string(),
                description: "List all customers with basic info".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {}
                }),
                output_schema: list_schema(customer_summary_schema()),
            },
            ToolDefinition {
                name: "get_customer_detail".to_string(),
                description: "Get a full customer profile including their subscriptions"
                    .to_string(),
                input_schema: id_param_schema("customer_id", "Customer ID"),
                output_schema: customer_detail_schema(),
            },
            ToolDefinition {
                name: "get_subscription_detail".to_string(),
                description:
                    "Detailed subscription view → invoices (with payments) + service incidents."
                        .to_string(),
                input_schema: id_param_schema("subscription_id", "Subscription ID"),
                output_schema: subscription_detail_schema(),
            },
            ToolDefinition {
                name: "get_invoice_payments".to_string(),
                description: "Return invoice-level payments list".to_string(),
                input_schema: id_param_schema("invoice_id", "Invoice ID"),
                output_schema: list_schema(payment_schema()),
            },
        ]
    }

    /// Call a tool by name, returning its structured result
    pub async fn call(&self, name: &str, args: Value) -> ToolResult<Value> {
        info!("Tool call: {} with args: {}", name, args);
        let start = Instant::now();

        let store = self.store.clone().with_deadline(start + self.tool_timeout);
        let result = match name {
            "get_all_customers" => {
                parse_args::<NoParams>(args)?;
                self.run_blocking(move || to_value(store.get_all_customers()?))
                    .await
            }
            "get_customer_detail" => {
                let p: CustomerIdParam = parse_args(args)?;
                self.run_blocking(move || to_value(store.get_customer_detail(p.customer_id)?))
                    .await
            }
            "get_subscription_detail" => {
                let p: SubscriptionIdParam = parse_args(args)?;
                self.run_blocking(move || {
                    to_value(store.get_subscription_detail(p.subscription_id)?)
                })
                .await
            }
            "get_invoice_payments" => {
                let p: InvoiceIdParam = parse_args(args)?;
                self.run_blocking(move || to_value(store.get_invoice_payments(p.invoice_id)?))
                    .await
            }
            _ => Err(ToolError::UnknownTool(name.to_string())),
        };

        let elapsed = start.elapsed();
        if elapsed > Duration::from_millis(100) {
            info!("Tool {} completed in {}ms", name, elapsed.as_millis());
        } else {
            debug!("Tool {} completed in {}ms", name, elapsed.as_millis());
        }

        result
    }

    /// Run a blocking store operation off the async runtime, bounded by the tool deadline.
    ///
    /// The store handle carries the same deadline, so a task still running when
    /// the timer fires is interrupted by SQLite and closes its connection shortly after.
    async fn run_blocking<F>(&self, f: F) -> ToolResult<Value>
    where
        F: FnOnce() -> ToolResult<Value> + Send + 'static,
    {
        let task = tokio::task::spawn_blocking(f);
        match tokio::time::timeout(self.tool_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(ToolError::Internal(format!(
                "Tool task failed: {}",
                join_err
            ))),
            Err(_) => Err(ToolError::Timeout(format!(
                "Tool call exceeded {}s",
                self.tool_timeout.as_secs_f64()
            ))),
        }
    }
}

/// Argument shape for tools without parameters
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NoParams {}

fn parse_args<T: DeserializeOwned>(args: Value) -> ToolResult<T> {
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args).map_err(|e| ToolError::InvalidParams(e.to_string()))
}

fn to_value<T: Serialize>(value: T) -> ToolResult<Value> {
    Ok(serde_json::to_value(value)?)
}

// ========== Schemas ==========

fn id_param_schema(field: &str, description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            field: {
                "type": "integer",
                "description": description
            }
        },
        "required": [field],
        "additionalProperties": false
    })
}

/// MCP structured output must be an object, so sequences are wrapped in `result`
fn list_schema(item: Value) -> Value {
    json!({
        "type": "object",
        "properties": {
            "result": { "type": "array", "items": item }
        },
        "required": ["result"]
    })
}

fn customer_summary_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "customer_id": { "type": "integer" },
            "first_name": { "type": "string" },
            "last_name": { "type": "string" },
            "email": { "type": "string" },
            "loyalty_level": { "type": "string" }
        },
        "required": ["customer_id", "first_name", "last_name", "email", "loyalty_level"]
    })
}

fn customer_detail_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "customer_id": { "type": "integer" },
            "first_name": { "type": "string" },
            "last_name": { "type": "string" },
            "email": { "type": "string" },
            "phone": { "type": ["string", "null"] },
            "address": { "type": ["string", "null"] },
            "loyalty_level": { "type": "string" },
            "subscriptions": { "type": "array", "items": { "type": "object" } }
        },
        "required": ["customer_id", "first_name", "last_name", "email", "loyalty_level", "subscriptions"]
    })
}

fn payment_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "payment_id": { "type": "integer" },
            "payment_date": { "type": ["string", "null"] },
            "amount": { "type": "number" },
            "method": { "type": "string" },
            "status": { "type": "string" }
        },
        "required": ["payment_id", "amount", "method", "status"]
    })
}

fn invoice_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "invoice_id": { "type": "integer" },
            "invoice_date": { "type": "string" },
            "amount": { "type": "number" },
            "description": { "type": "string" },
            "due_date": { "type": "string" },
            "payments": { "type": "array", "items": payment_schema() },
            "outstanding": { "type": "number", "minimum": 0 }
        },
        "required": ["invoice_id", "invoice_date", "amount", "description", "due_date", "payments", "outstanding"]
    })
}

fn subscription_detail_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "subscription_id": { "type": "integer" },
            "product_id": { "type": "integer" },
            "start_date": { "type": "string" },
            "end_date": { "type": "string" },
            "status": { "type": "string" },
            "roaming_enabled": { "type": "integer" },
            "service_status": { "type": "string" },
            "speed_tier": { "type": ["string", "null"] },
            "data_cap_gb": { "type": ["integer", "null"] },
            "autopay_enabled": { "type": "integer" },
            "product_name": { "type": "string" },
            "product_description": { "type": ["string", "null"] },
            "category": { "type": ["string", "null"] },
            "monthly_fee": { "type": ["number", "null"] },
            "invoices": { "type": "array", "items": invoice_schema() },
            "service_incidents": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "incident_id": { "type": "integer" },
                        "incident_date": { "type": "string" },
                        "description": { "type": "string" },
                        "resolution_status": { "type": "string" }
                    },
                    "required": ["incident_id", "incident_date", "description", "resolution_status"]
                }
            }
        },
        "required": ["subscription_id", "product_id", "status", "product_name", "invoices", "service_incidents"]
    })
}
