//! # nanorpc CLI Entry Point
//!
//! ## Usage
//!
//! ```bash
//! # Serve the demo endpoints
//! nanorpc serve -b 127.0.0.1:8080
//!
//! # Call an endpoint (outputs raw JSON)
//! nanorpc call http://127.0.0.1:8080 hello -a '"reddec"'
//!
//! # Retry up to 5 times, 200ms apart, giving up after 10 seconds
//! nanorpc call http://127.0.0.1:8080 add -a '{"a": 1, "b": 2}' \
//!   --retries 5 --retry-delay-ms 200 --timeout-ms 10000
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use argh::FromArgs;
use nanorpc_cli::demo::demo_server;
use nanorpc_cli::validate_http_url;
use nanorpc_client::{Client, ClientConfig, RetryPolicy};
use nanorpc_server::ServerConfig;

/// Main CLI structure parsed from command-line arguments.
#[derive(FromArgs)]
/// nanorpc - functions over HTTP and JSON
struct Cli {
    #[argh(subcommand)]
    command: Commands,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    Serve(ServeArgs),
    Call(CallArgs),
}

#[derive(FromArgs)]
#[argh(subcommand, name = "serve")]
/// serve the built-in demo endpoints until Ctrl-C
struct ServeArgs {
    /// address to bind the HTTP server to
    #[argh(option, short = 'b', default = "\"127.0.0.1:8080\".into()")]
    bind: String,

    /// milliseconds open connections may keep running after Ctrl-C
    #[argh(option, long = "shutdown-grace-ms", default = "1000")]
    shutdown_grace_ms: u64,
}

/// Arguments for making a single call.
///
/// The result is printed as raw JSON on stdout so the command composes with
/// other unix tools (e.g. `jq`).
#[derive(FromArgs)]
#[argh(subcommand, name = "call")]
/// call an endpoint and print the JSON result
struct CallArgs {
    /// base URL of the server, e.g. http://127.0.0.1:8080
    #[argh(positional)]
    server_address: String,

    /// name of the endpoint to call
    #[argh(positional)]
    endpoint: String,

    /// JSON encoding of the single argument (default: null)
    #[argh(option, short = 'a', long = "args", default = "\"null\".into()")]
    args: String,

    /// retries after the first attempt; negative retries until the timeout
    #[argh(option, long = "retries", default = "0")]
    retries: i64,

    /// milliseconds to wait between attempts
    #[argh(option, long = "retry-delay-ms", default = "0")]
    retry_delay_ms: u64,

    /// also retry when the server answers with an error status
    #[argh(switch, long = "retry-remote")]
    retry_remote: bool,

    /// overall deadline in milliseconds
    #[argh(option, long = "timeout-ms", default = "30000")]
    timeout_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    // call keeps stdout clean for piping
    if !matches!(cli.command, Commands::Call(_)) {
        // Set default log level to INFO, but allow RUST_LOG env var to override
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    match cli.command {
        Commands::Serve(args) => run_serve(args).await,
        Commands::Call(args) => run_call(args).await,
    }
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let addr: SocketAddr = args
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address '{}'", args.bind))?;

    let config =
        ServerConfig::default().with_shutdown_grace(Duration::from_millis(args.shutdown_grace_ms));
    let server = demo_server(config)?;

    tracing::info!("Serving endpoints: {:?}", server.names());

    server
        .listen_and_serve(addr, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn run_call(args: CallArgs) -> Result<()> {
    validate_http_url(&args.server_address, "server address")?;

    let argument: serde_json::Value = serde_json::from_str(&args.args)
        .map_err(|e| anyhow::anyhow!("Invalid JSON in args: {}", e))?;

    let retry = RetryPolicy::from_retry_num(args.retries, Duration::from_millis(args.retry_delay_ms))
        .with_retry_remote_errors(args.retry_remote);
    let config = ClientConfig::new(args.server_address)
        .with_retry(retry)
        .with_default_timeout(Duration::from_millis(args.timeout_ms));

    let client = Client::with_config(config);
    let result: serde_json::Value = client.invoke(&args.endpoint, &argument).await?;

    println!("{}", serde_json::to_string(&result)?);

    Ok(())
}
