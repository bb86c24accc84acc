//! Fixture database shared by the integration tests.

#![allow(dead_code)]

use contoso_mcp::CustomerStore;
use rusqlite::Connection;
use std::time::Duration;
use tempfile::TempDir;

const SCHEMA: &str = r#"
CREATE TABLE Customers (
    customer_id INTEGER PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT NOT NULL,
    phone TEXT,
    address TEXT,
    loyalty_level TEXT NOT NULL
);
CREATE TABLE Products (
    product_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    category TEXT,
    monthly_fee REAL
);
CREATE TABLE Subscriptions (
    subscription_id INTEGER PRIMARY KEY,
    customer_id INTEGER NOT NULL REFERENCES Customers(customer_id),
    product_id INTEGER NOT NULL,
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL,
    status TEXT NOT NULL,
    roaming_enabled INTEGER NOT NULL DEFAULT 0,
    service_status TEXT NOT NULL,
    speed_tier TEXT,
    data_cap_gb INTEGER,
    autopay_enabled INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE Invoices (
    invoice_id INTEGER PRIMARY KEY,
    subscription_id INTEGER NOT NULL REFERENCES Subscriptions(subscription_id),
    invoice_date TEXT NOT NULL,
    amount REAL NOT NULL,
    description TEXT NOT NULL,
    due_date TEXT NOT NULL
);
CREATE TABLE Payments (
    payment_id INTEGER PRIMARY KEY,
    invoice_id INTEGER NOT NULL REFERENCES Invoices(invoice_id),
    payment_date TEXT,
    amount REAL NOT NULL,
    method TEXT NOT NULL,
    status TEXT NOT NULL
);
CREATE TABLE ServiceIncidents (
    incident_id INTEGER PRIMARY KEY,
    subscription_id INTEGER NOT NULL REFERENCES Subscriptions(subscription_id),
    incident_date TEXT NOT NULL,
    description TEXT NOT NULL,
    resolution_status TEXT NOT NULL
);
"#;

const SEED: &str = r#"
INSERT INTO Customers VALUES
    (1, 'John', 'Doe', 'john.doe@example.com', '555-0100', '1 Main St', 'Gold'),
    (2, 'Jane', 'Roe', 'jane.roe@example.com', NULL, NULL, 'Silver');

INSERT INTO Products VALUES
    (1, 'Contoso Mobile Unlimited', 'Unlimited talk, text and data', 'mobile', 65.0),
    (2, 'Contoso Fiber 1G', NULL, 'internet', 80.0);

INSERT INTO Subscriptions VALUES
    (10, 1, 1, '2023-01-01', '2025-01-01', 'active', 1, 'normal', NULL, 100, 1),
    (11, 1, 2, '2023-06-01', '2025-06-01', 'active', 0, 'slowed', '1G', NULL, 0),
    (20, 2, 1, '2024-01-01', '2026-01-01', 'active', 0, 'normal', NULL, 50, 1),
    -- references a product that does not exist
    (30, 2, 99, '2024-02-01', '2026-02-01', 'active', 0, 'normal', NULL, NULL, 0);

INSERT INTO Invoices VALUES
    (100, 10, '2024-02-01', 100.0, 'February service', '2024-02-28'),
    (101, 10, '2024-03-01', 65.0, 'March service', '2024-03-31'),
    (200, 20, '2024-02-01', 65.0, 'February service', '2024-02-28');

INSERT INTO Payments VALUES
    (1000, 100, '2024-02-10', 40.0, 'credit_card', 'successful'),
    (1001, 100, '2024-02-11', 1000.0, 'credit_card', 'failed'),
    (1010, 101, '2024-03-05', 50.0, 'bank_transfer', 'successful'),
    (1011, 101, '2024-03-06', 50.0, 'bank_transfer', 'successful'),
    (2000, 200, NULL, 65.0, 'autopay', 'pending');

INSERT INTO ServiceIncidents VALUES
    (500, 10, '2024-02-15', 'No signal downtown', 'resolved'),
    (501, 20, '2024-03-02', 'Dropped calls', 'open');
"#;

/// Create a seeded customer database in a temp dir
pub fn seeded_db() -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("contoso.db");
    let conn = Connection::open(&path).expect("Failed to create db");
    conn.execute_batch(SCHEMA).expect("Failed to create schema");
    conn.execute_batch(SEED).expect("Failed to seed");
    (dir, path)
}

pub fn seeded_store() -> (CustomerStore, TempDir) {
    let (dir, path) = seeded_db();
    (CustomerStore::new(path, Duration::from_millis(500)), dir)
}
