use std::sync::Arc;

use quiz_flow::config::HostConfig;
use quiz_flow::loader::HttpConfigSource;
use quiz_flow::mount::Embedder;
use quiz_flow::signals::TracingSink;
use quiz_flow::terminal;
use quiz_flow::webhook::HttpWebhook;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = HostConfig::from_env();

    eprintln!("🧭 Quiz Flow v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Mount: {}", config.root);
    eprintln!(
        "   Config: {}",
        config.config_url.as_deref().unwrap_or("(unset, export QUIZ_CONFIG_URL=...)")
    );
    eprintln!("   Type an option number and press Enter. 'quit' to exit.\n");

    let client = reqwest::Client::new();
    let embedder = Embedder::new(
        Arc::new(HttpConfigSource::new(client.clone())),
        Arc::new(HttpWebhook::new(client)),
        Arc::new(TracingSink),
    );

    let descriptor = config.descriptor();
    let mut session = match embedder.boot(&descriptor).await {
        Ok(Some(session)) => session,
        Ok(None) => return Ok(()),
        Err(e) => {
            eprintln!("{}", e.indicator());
            std::process::exit(1);
        }
    };

    let outcome = terminal::run(&mut session).await;
    session.flush().await;
    outcome
}
