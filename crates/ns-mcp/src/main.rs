use anyhow::Context as _;
use clap::Parser as _;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use unrelated_ns_api::NsApiClient;
use unrelated_ns_mcp::{Dispatcher, LogFormat, ServerArgs, serve};

fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();
    init_tracing(&args);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("build tokio runtime")?;
    let result = runtime.block_on(run(args));
    // The stdin reader sits in a blocking read that cannot be cancelled.
    runtime.shutdown_timeout(Duration::from_millis(250));
    result
}

async fn run(args: ServerArgs) -> anyhow::Result<()> {
    let config = args.gateway_config().context("invalid configuration")?;
    args.log_resolved_api_url(&config);

    let gateway = NsApiClient::new(config).context("build NetSapiens API client")?;
    let dispatcher = Arc::new(Dispatcher::new(gateway));
    info!(
        tools = dispatcher.list_tools().len(),
        "NetSapiens MCP server running on stdio"
    );

    serve(
        dispatcher,
        tokio::io::stdin(),
        tokio::io::stdout(),
        shutdown_signal(),
    )
    .await
    .context("stdio transport failed")?;

    info!("NetSapiens MCP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for ctrl-c; relying on stdin EOF");
        std::future::pending::<()>().await;
    }
}

/// Logs go to stderr; stdout carries the protocol.
fn init_tracing(args: &ServerArgs) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_filter()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false);

    let _ = match args.log_format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
