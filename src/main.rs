//! Contoso Customer MCP Server - Entry Point
//!
//! Modes:
//! - Default: MCP server over stdio
//! - --list-tools: print tool definitions as JSON and exit

use contoso_mcp::{Config, McpServer, ToolRegistry};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Parse args
    let args: Vec<String> = std::env::args().collect();
    let help_mode = args.iter().any(|a| a == "--help" || a == "-h");
    let list_tools = args.iter().any(|a| a == "--list-tools");
    let db_override = args
        .iter()
        .position(|a| a == "--db")
        .map(|i| args.get(i + 1).cloned());

    if help_mode {
        println!("Contoso Customer MCP Server v{}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Usage: contoso-mcp [OPTIONS]");
        println!();
        println!("Options:");
        println!("  --db <path>        SQLite customer database");
        println!("  --list-tools       Print tool definitions and exit");
        println!("  --help, -h         Show this help");
        println!();
        println!("Default: Run as MCP server (stdio)");
        println!();
        println!("Environment variables:");
        println!("  CONTOSO_DB_PATH                         Database path (default: contoso.db)");
        println!("  CONTOSO_DB_BUSY_TIMEOUT_MS              SQLite busy timeout (default: 5000)");
        println!("  CONTOSO_TOOL_TIMEOUT_SECS               Per-call deadline (default: 30)");
        println!("  RUST_LOG                                Log filter directives (default: info)");
        println!("  AZURE_OPENAI_ENDPOINT                   Embedding endpoint");
        println!("  AZURE_OPENAI_API_KEY                    Embedding API key");
        println!("  AZURE_OPENAI_API_VERSION                Embedding API version");
        println!("  AZURE_OPENAI_EMBEDDING_DEPLOYMENT_NAME  Embedding deployment");
        return Ok(());
    }

    // Log to stderr as JSON; stdout carries the protocol
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .json()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = Config::from_env()?;
    match db_override {
        Some(Some(path)) => config = config.with_db_path(path),
        Some(None) => anyhow::bail!("--db requires a path"),
        None => {}
    }

    if list_tools {
        let registry = ToolRegistry::new(&config);
        println!("{}", serde_json::to_string_pretty(&registry.list_definitions())?);
        return Ok(());
    }

    info!("Contoso Customer MCP Server v{}", env!("CARGO_PKG_VERSION"));
    info!("Customer database: {}", config.db_path.display());

    let server = McpServer::new(&config);
    server.run().await?;

    Ok(())
}
