//! Contoso Customer MCP Server
//!
//! Exposes a customer, subscription and billing database as Model Context
//! Protocol tools.
//!
//! # Architecture
//!
//! ```text
//! Agent ──► MCP Protocol ──► ToolRegistry ──► CustomerStore ──► SQLite
//!             (stdio)             │                 │
//!                                 │                 └── assembly (pure nesting)
//!                                 └── Embedder (Azure OpenAI | zero stub)
//! ```

pub mod assembly;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod mcp;
pub mod models;
pub mod store;
pub mod tools;

pub use config::Config;
pub use embeddings::{cosine_similarity, get_embedding, Embedder, EmbeddingProvider};
pub use error::{ToolError, ToolResult};
pub use mcp::{McpRequest, McpResponse, McpServer};
pub use store::CustomerStore;
pub use tools::{ToolDefinition, ToolRegistry};
