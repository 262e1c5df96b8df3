//! PhaserDocs CLI - documentation access from the command line or over MCP

mod mcp;

use clap::{Parser, Subcommand};
use phaserdocs::{
    DocsConfig, DocsTool, GetApiReferenceParams, ReadDocumentationParams,
    SearchDocumentationParams,
};
use std::io::{self, Write};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// PhaserDocs - Phaser documentation retrieval tool
#[derive(Parser, Debug)]
#[command(name = "phaserdocs")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Logging level (overrides FASTMCP_LOG_LEVEL environment variable)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Request timeout in seconds (overrides PHASER_DOCS_TIMEOUT)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Maximum number of retries (overrides PHASER_DOCS_MAX_RETRIES)
    #[arg(long, global = true)]
    max_retries: Option<u32>,

    /// Print server information and exit
    #[arg(long)]
    info: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run as MCP (Model Context Protocol) server over stdio
    Mcp,
    /// Read a documentation page as Markdown
    Read {
        /// URL of the documentation page
        url: String,

        /// Maximum number of characters to print
        #[arg(long, default_value_t = 5000)]
        max_length: usize,

        /// Character offset to start from
        #[arg(long, default_value_t = 0)]
        start_index: usize,
    },
    /// Search the documentation catalog
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(long, short, default_value_t = 10)]
        limit: usize,
    },
    /// Show the API reference for a Phaser class
    Api {
        /// Class name, e.g. Sprite or Phaser.Scene
        class_name: String,
    },
    /// Check connectivity to the documentation site and exit
    HealthCheck,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.log_level.as_deref());

    let mut config = DocsConfig::from_env();
    if let Some(timeout) = cli.timeout {
        if timeout == 0 {
            eprintln!("Error: timeout must be positive");
            std::process::exit(1);
        }
        config = config.with_timeout(Duration::from_secs(timeout));
    }
    if let Some(max_retries) = cli.max_retries {
        config = config.with_max_retries(max_retries);
    }

    if cli.info {
        print_server_info(&config);
        std::process::exit(0);
    }

    let tool = match DocsTool::new(&config) {
        Ok(tool) => tool,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Mcp) => {
            mcp::run_server(tool).await;
        }
        Some(Commands::Read {
            url,
            max_length,
            start_index,
        }) => {
            let params = ReadDocumentationParams {
                url,
                max_length,
                start_index,
            };
            match tool.read_documentation(params).await {
                Ok(markdown) => writeln_safe(&markdown),
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Search { query, limit }) => {
            let params = SearchDocumentationParams { query, limit };
            match tool.search_documentation(params).await {
                Ok(results) => {
                    let json = serde_json::to_string_pretty(&results).unwrap_or_default();
                    writeln_safe(&json);
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Api { class_name }) => {
            let params = GetApiReferenceParams { class_name };
            match tool.get_api_reference(params).await {
                Ok(markdown) => writeln_safe(&markdown),
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::HealthCheck) => match tool.health_check().await {
            Ok(()) => writeln_safe("Health check passed"),
            Err(e) => {
                eprintln!("Health check failed: {e}");
                std::process::exit(1);
            }
        },
        None => {
            eprintln!("Usage: phaserdocs read <URL>");
            eprintln!("   or: phaserdocs search <QUERY>");
            eprintln!("   or: phaserdocs api <CLASS>");
            eprintln!("   or: phaserdocs mcp");
            eprintln!("   or: phaserdocs --help");
            std::process::exit(1);
        }
    }
}

/// Initialize tracing; logs go to stderr so MCP stdio stays clean
fn init_logging(cli_level: Option<&str>) {
    let filter = match cli_level {
        Some(level) => EnvFilter::new(level.to_lowercase()),
        None => EnvFilter::try_from_env("FASTMCP_LOG_LEVEL")
            .unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn print_server_info(config: &DocsConfig) {
    let info = serde_json::json!({
        "name": "phaserdocs",
        "version": env!("CARGO_PKG_VERSION"),
        "base_url": config.base_url,
        "timeout_secs": config.timeout.as_secs(),
        "max_retries": config.max_retries,
        "retry_delay_ms": config.retry_delay.as_millis() as u64,
        "cache_ttl_secs": config.cache_ttl.as_secs(),
    });
    writeln_safe(&serde_json::to_string_pretty(&info).unwrap_or_default());
}

/// Write to stdout, exit silently on broken pipe
fn writeln_safe(s: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{s}") {
        if e.kind() == io::ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        eprintln!("Error writing to stdout: {e}");
        std::process::exit(1);
    }
}
