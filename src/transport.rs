use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use teloxide::prelude::*;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::WebhookConfig;
use crate::event::InboundEvent;
use crate::gateway::telegram::inbound_event;
use crate::health;
use crate::router::ContactRouter;

/// Resolves on SIGINT (Ctrl-C) or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

/// Resolves once the stop flag flips to `true`
pub async fn stopped(mut stop: watch::Receiver<bool>) {
    let _ = stop.wait_for(|stop| *stop).await;
}

async fn route_event(event: InboundEvent, router: Arc<ContactRouter>) -> ResponseResult<()> {
    router.handle(event).await;
    Ok(())
}

/// Receive updates by long polling until the stop flag is raised
pub async fn run_polling(bot: Bot, router: Arc<ContactRouter>, stop: watch::Receiver<bool>) {
    let handler = Update::filter_message()
        .filter_map(|msg: Message| inbound_event(&msg))
        .endpoint(route_event);

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![router])
        .default_handler(|upd| async move {
            debug!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("contact router"))
        .build();

    let token = dispatcher.shutdown_token();
    tokio::spawn(async move {
        stopped(stop).await;
        // Shutdown is refused until the dispatcher has started polling.
        loop {
            match token.shutdown() {
                Ok(done) => {
                    done.await;
                    break;
                }
                Err(_) => tokio::time::sleep(Duration::from_millis(100)).await,
            }
        }
    });

    info!("Bot started (long polling)");
    dispatcher.dispatch().await;
    info!("Dispatcher stopped");
}

/// Register the webhook and serve it, together with the health probe, until
/// the stop flag is raised. The webhook is removed again on the way out.
pub async fn run_webhook(
    bot: Bot,
    router: Arc<ContactRouter>,
    webhook: &WebhookConfig,
    listener: TcpListener,
    stop: watch::Receiver<bool>,
) -> Result<()> {
    let app = health::app(Some((webhook.path(), router)));
    let url = reqwest::Url::parse(&webhook.url())
        .with_context(|| format!("Invalid webhook URL: {}", webhook.public_url))?;
    bot.set_webhook(url)
        .await
        .context("Failed to register webhook")?;
    info!(
        "Bot started (webhook at {}/webhook/<secret>)",
        webhook.public_url
    );

    let served = health::serve(listener, app, stopped(stop)).await;

    if let Err(e) = bot.delete_webhook().await {
        warn!("Failed to remove webhook: {}", e);
    }
    served
}
