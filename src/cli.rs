use clap::{Parser, Subcommand};

const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Parser)]
#[command(
    name = "openfda-mcp",
    version,
    about = "MCP server exposing FDA drug-label query tools backed by openFDA"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the MCP server over stdio.
    Serve,
    /// Run the MCP server over HTTP with SSE transport.
    ServeHttp {
        /// Address to bind.
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Port to bind. Falls back to the PORT environment variable, then 8080.
        #[arg(long)]
        port: Option<u16>,
    },
}

/// Resolves the listen port: `--port` flag, then the `PORT` environment
/// variable (Cloud Run convention), then the default.
pub fn resolve_port(flag: Option<u16>) -> u16 {
    port_from(flag, std::env::var("PORT").ok())
}

fn port_from(flag: Option<u16>, env: Option<String>) -> u16 {
    flag.or_else(|| env.and_then(|v| v.trim().parse().ok()))
        .unwrap_or(DEFAULT_PORT)
}
