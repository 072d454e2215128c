use std::sync::Arc;

use inbox_autoreply::config::AutoReplyConfig;
use inbox_autoreply::gmail::FileAuthenticator;
use inbox_autoreply::pipeline::{PollScheduler, PollSettings};
use inbox_autoreply::server::{TriggerState, trigger_routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AutoReplyConfig::from_env()?;

    eprintln!("📬 Inbox Auto-Reply v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Label: {}", config.label_name);
    eprintln!("   Trigger phrases: {}", config.keywords.len());
    eprintln!(
        "   Interval: {}-{}s, batch of {}",
        config.interval.min_secs, config.interval.max_secs, config.page_size
    );
    eprintln!("   Trigger: http://0.0.0.0:{}/\n", config.port);

    let authenticator = Arc::new(FileAuthenticator::new(config.auth.clone()));
    let scheduler = Arc::new(PollScheduler::new(
        authenticator,
        PollSettings::from_config(&config),
    ));

    let app = trigger_routes(TriggerState { scheduler });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!(port = config.port, "Server is running");
    axum::serve(listener, app).await?;

    Ok(())
}
