mod admin;
mod config;
mod error;
mod event;
mod gateway;
mod health;
mod replies;
mod router;
mod transport;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::prelude::*;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::admin::AdminIdentity;
use crate::config::{Config, TransportMode};
use crate::gateway::telegram::TelegramGateway;
use crate::gateway::Gateway;
use crate::router::ContactRouter;

#[tokio::main]
async fn main() -> Result<()> {
    // .env values never override the real environment
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,contact_router=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = Config::load(&config_path).context("Invalid configuration")?;

    info!("Configuration loaded successfully");
    info!("  Admin: @{}", config.admin_handle);
    info!("  Transport: {}", config.mode);
    info!("  HTTP port: {}", config.port);
    info!("  Verify contact owner: {}", config.policy.verify_ownership);
    info!("  Share-phone button: {}", config.policy.share_phone_button);

    let bot = Bot::new(&config.bot_token);
    let me = bot.get_me().await.context("Failed to reach Telegram")?;
    info!("Logged in as @{}", me.username());

    let gateway: Arc<dyn Gateway> = Arc::new(TelegramGateway::new(bot.clone()));
    let admin = Arc::new(AdminIdentity::new(config.admin_handle.clone(), gateway.clone()));
    let router = Arc::new(ContactRouter::new(gateway, admin, config.policy.clone()));

    let listener = health::bind(config.port).await?;

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        transport::shutdown_signal().await;
        let _ = stop_tx.send(true);
    });

    match (config.mode, &config.webhook) {
        (TransportMode::Webhook, Some(webhook)) => {
            transport::run_webhook(bot, router, webhook, listener, stop_rx).await?;
        }
        _ => {
            let server = tokio::spawn(health::serve(
                listener,
                health::app(None),
                transport::stopped(stop_rx.clone()),
            ));
            transport::run_polling(bot, router, stop_rx).await;
            server.await.context("HTTP server task failed")??;
        }
    }

    info!("Bye");
    Ok(())
}
