use std::sync::Arc;

use rent_finder::channels::{LogNotifier, MessengerNotifier, Notifier};
use rent_finder::config::BotConfig;
use rent_finder::conversation::{self, Orchestrator, WebhookState, webhook_routes};
use rent_finder::dataset::{DatasetSource, HttpDatasetSource};
use rent_finder::matching::MatchEngine;

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

    let config = BotConfig::from_env()?;

    eprintln!("🏠 Rent Finder v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Dataset: {}", config.dataset.url);
    eprintln!("   Records at: {}", config.dataset.records_pointer);
    eprintln!("   Webhook: http://0.0.0.0:{}/webhook", config.port);
    eprintln!(
        "   Message delay: {}ms",
        config.conversation.message_delay.as_millis()
    );

    let source: Arc<dyn DatasetSource> = Arc::new(HttpDatasetSource::new(&config.dataset)?);

    let notifier: Arc<dyn Notifier> = match config.messenger.clone() {
        Some(messenger) => {
            eprintln!("   Messenger: enabled ({})", messenger.api_base);
            Arc::new(MessengerNotifier::new(messenger))
        }
        None => {
            eprintln!("   Messenger: disabled (replies are logged only)");
            Arc::new(LogNotifier)
        }
    };

    let orchestrator = Arc::new(Orchestrator::new(
        config.conversation.clone(),
        MatchEngine::default(),
        source,
        notifier,
    ));
    let _prune_handle = conversation::spawn_prune_task(Arc::clone(&orchestrator));

    let app = webhook_routes(WebhookState {
        orchestrator,
        verify_token: config
            .messenger
            .as_ref()
            .map(|m| m.verify_token.clone())
            .filter(|token| !token.is_empty()),
    });

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(port = config.port, "Webhook server started");
    axum::serve(listener, app).await?;

    Ok(())
}
