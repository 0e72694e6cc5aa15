use anyhow::Context;
use clap::Parser;
use hv_market_dash::config::toml_config::LogFormat;
use hv_market_dash::utils::error::{DashboardError, ErrorSeverity};
use hv_market_dash::utils::{logger, validation::Validate};
use hv_market_dash::{server, CliConfig, Dashboard};
use std::sync::Arc;

fn exit_code(e: &DashboardError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn fail(context: &str, e: &DashboardError) -> ! {
    tracing::error!(
        "❌ {}: {} (Category: {:?}, Severity: {:?})",
        context,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(exit_code(e).max(1));
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(exit_code(&e).max(1));
        }
    };

    match config.logging.format {
        LogFormat::Json => logger::init_json_logger(),
        LogFormat::Compact => logger::init_cli_logger(cli.verbose),
    }

    tracing::info!("Starting hv-market-dash");
    if cli.verbose {
        tracing::debug!("Resolved config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        fail("Configuration validation failed", &e);
    }

    let bind_address = config.bind_address();
    let dashboard = match Dashboard::load(config).await {
        Ok(dashboard) => dashboard,
        Err(e) => fail("Loading dashboard data failed", &e),
    };

    if cli.check {
        println!(
            "✅ Loaded {} municipalities across {} counties",
            dashboard.dataset().municipalities.len(),
            dashboard.dataset().counties.len()
        );
        return Ok(());
    }

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;

    if let Err(e) = server::serve(Arc::new(dashboard), listener).await {
        fail("Server stopped", &e);
    }

    Ok(())
}
