//! Lurk CLI entry point.

use anyhow::Context as _;
use clap::Parser;
use futures::StreamExt as _;
use lurk::messaging::Messaging as _;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lurk")]
#[command(about = "Discord relay with a rolling per-channel memory")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.debug {
            EnvFilter::new("lurk=debug,info")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("starting lurk");

    let config = lurk::config::Config::load_from_env().context("failed to load configuration")?;

    let completion = Arc::new(
        lurk::llm::OpenAiClient::new(&config.llm).context("failed to initialize completion client")?,
    );
    let store = Arc::new(lurk::conversation::ConversationStore::new(
        config.max_context_turns,
    ));
    let persona = Arc::new(lurk::persona::PersonaDirectives::new(
        config.system_directives.clone(),
    ));
    let adapter = Arc::new(lurk::messaging::DiscordAdapter::new(&config.discord.token));

    tracing::info!(
        model = %config.llm.model,
        endpoint = %completion.endpoint(),
        max_context_turns = store.max_turns(),
        directives = persona.directives().len(),
        "configuration loaded"
    );

    let router = Arc::new(lurk::router::ResponseRouter::new(
        adapter.clone(),
        completion,
        store,
        persona,
        lurk::router::RouterSettings::from_config(&config),
    ));

    let mut inbound = adapter
        .start()
        .await
        .context("failed to start discord adapter")?;

    if let Err(error) = adapter.health_check().await {
        tracing::warn!(%error, "discord health check failed");
    }

    loop {
        tokio::select! {
            message = inbound.next() => {
                let Some(message) = message else {
                    tracing::warn!("inbound stream ended");
                    break;
                };
                // Admission runs inline so turns are recorded in arrival order.
                router.dispatch(message);
            }
            result = tokio::signal::ctrl_c() => {
                result.context("failed to listen for shutdown signal")?;
                tracing::info!("shutdown signal received");
                break;
            }
        }
    }

    if let Err(error) = adapter.shutdown().await {
        tracing::warn!(%error, "failed to shut down discord adapter");
    }

    tracing::info!("lurk stopped");
    Ok(())
}
