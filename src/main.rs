use clap::Parser;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    init_tracing();

    let cli = openfda_mcp::cli::Cli::parse();
    match cli.command {
        openfda_mcp::cli::Commands::Serve => match openfda_mcp::mcp::run_stdio().await {
            Ok(()) => std::process::ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("Error: {err}");
                std::process::ExitCode::from(1)
            }
        },
        openfda_mcp::cli::Commands::ServeHttp { host, port } => {
            let port = openfda_mcp::cli::resolve_port(port);
            match openfda_mcp::mcp::run_http(&host, port).await {
                Ok(()) => std::process::ExitCode::SUCCESS,
                Err(err) => {
                    eprintln!("Error: {err}");
                    std::process::ExitCode::from(1)
                }
            }
        }
    }
}
