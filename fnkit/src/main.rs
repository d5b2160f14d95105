//! fnkit sample function host
//!
//! Picks one of the sample handlers and serves it on the Fn-style
//! invoke endpoint. Function identity and config come from the FN_*
//! environment contract.

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fnkit::handlers;
use fnkit_runtime::RuntimeConfig;

#[derive(Parser, Debug)]
#[command(name = "fnkit")]
#[command(about = "Sample runtime-context functions", long_about = None)]
struct Args {
    /// Handler to serve: print-all, print-env, or print-three
    #[arg(long, default_value = "print-all", env = "FNKIT_HANDLER")]
    handler: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "FNKIT_LOG_LEVEL")]
    log_level: String,
}

/// Default filter directive covering both the samples and the
/// runtime boundary; invocation failures are logged from the runtime
/// crate and must not be filtered out by default.
fn default_log_filter(level: &str) -> String {
    format!("fnkit={level},fnkit_runtime={level}")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_log_filter(&args.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = RuntimeConfig::from_env()?;
    info!(
        app_id = %config.app_id,
        fn_id = %config.fn_id,
        handler = %args.handler,
        "starting function host"
    );

    match args.handler.as_str() {
        "print-all" => fnkit_runtime::serve(config, handlers::print_all).await,
        "print-env" => fnkit_runtime::serve(config, handlers::print_env).await,
        "print-three" => fnkit_runtime::serve(config, handlers::print_three).await,
        other => anyhow::bail!("unknown handler: {other}"),
    }
}
