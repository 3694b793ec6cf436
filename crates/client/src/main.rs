//! Game Builder realtime client - command line entry point.
//!
//! Connects the general channel (and the game channel when
//! `GAMEBUILDER_GAME_ID` is set), logs every inbound message and disconnects
//! on Ctrl-C.

use std::sync::Arc;

use gamebuilder_client::infrastructure::{bind_notifier, TracingNotifier};
use gamebuilder_client::{ChannelClient, ClientConfig, Clients};
use gamebuilder_shared::MessageKind;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const ENV_TOKEN: &str = "GAMEBUILDER_TOKEN";
const ENV_GAME_ID: &str = "GAMEBUILDER_GAME_ID";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv_from_repo_root();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gamebuilder_client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ClientConfig::from_env();
    tracing::info!(
        general_url = %config.general_url,
        game_url = %config.game_url,
        "Starting Game Builder client"
    );

    let clients = Clients::desktop(&config);
    if let Some(token) = env_value(ENV_TOKEN) {
        clients.session().set_token(&token);
    }

    let notifier = Arc::new(TracingNotifier);
    bind_notifier(&clients.general, notifier.clone(), "General");
    bind_notifier(&clients.game, notifier, "Game");
    log_inbound(&clients.general);
    log_inbound(&clients.game);

    clients.general.connect().await?;

    if let Some(game_id) = env_value(ENV_GAME_ID) {
        clients.selection.select(game_id);
        clients.game.connect().await?;
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    clients.disconnect_all();

    Ok(())
}

fn log_inbound(client: &ChannelClient) {
    let channel = client.channel();
    for kind in MessageKind::ALL.iter().copied().filter(|k| !k.is_control()) {
        client.register_handler(kind, move |message| {
            tracing::info!(channel, %kind, ?message, "Received message");
        });
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
