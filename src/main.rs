//! Orchestra MCP CLI - run the stdio server or initialize a workspace.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use orchestra_mcp::engine::{self, Bridge};
use orchestra_mcp::{bootstrap, mcp, tools};

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("ORCHESTRA_GIT_COMMIT"),
    ", built ",
    env!("ORCHESTRA_BUILD_TIMESTAMP"),
    ")"
);

/// Orchestra MCP - AI-powered project management via Model Context Protocol.
#[derive(Parser, Debug)]
#[command(
    name = "orchestra-mcp",
    about = "AI-powered project management via Model Context Protocol",
    version = VERSION,
    disable_version_flag = true
)]
struct Cli {
    /// Print version and exit
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: (),

    /// Set workspace directory
    #[arg(long, global = true, default_value = ".", value_name = "path")]
    workspace: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Initialize MCP workspace (.mcp.json, .projects/)
    Init,
}

fn main() {
    // Stdout carries JSON-RPC; every diagnostic goes to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Init) => {
            if let Err(e) = bootstrap::run(&cli.workspace) {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
        None => serve(cli.workspace),
    }
}

fn serve(workspace: PathBuf) {
    // The gRPC memory-engine client is wired in by the embedding host;
    // a standalone server uses the local memory store.
    let bridge = Arc::new(Bridge::local(workspace.clone()));
    let server = tools::build_server(&workspace, bridge);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        tools = server.tool_count(),
        memory = "local store",
        engine_port = engine::port(),
        "orchestra-mcp server running"
    );
    mcp::stdio::run(&server);
}
