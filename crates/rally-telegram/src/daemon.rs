//! Long-running bot process.
//!
//! One poller task long-polls `getUpdates` and feeds normalised updates
//! into a bounded queue. The dispatcher drains the queue on the calling
//! task and processes each update to completion before taking the next,
//! so two presses on the same rally never interleave.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use rally_core::{Engine, InMemoryModeration, RallyConfig};

use crate::bot::{BotApi, TelegramBot};
use crate::error::TelegramError;
use crate::handler::RallyHandler;
use crate::inbound::Inbound;
use crate::service::TelegramService;

const RETRY_DELAY: Duration = Duration::from_secs(5);

/// The Rally bot daemon.
pub struct RallyDaemon {
    service: TelegramService,
    config: RallyConfig,
}

impl RallyDaemon {
    pub fn new(service: TelegramService, config: RallyConfig) -> Self {
        Self { service, config }
    }

    /// Run until `SIGINT`/`SIGTERM`.
    pub async fn run(self) -> anyhow::Result<()> {
        let bot = self.service.bot();
        let username = bot.username().await?;
        info!(
            account = %username,
            token = %self.service.bot_token_masked(),
            "bot authorized"
        );

        let shutdown = shutdown_signal();
        let (tx, rx) = mpsc::channel(self.config.queue_capacity);

        let poller = tokio::spawn(poll_loop(
            self.service.bot(),
            self.service.poll_timeout_secs(),
            tx,
            shutdown.clone(),
        ));

        let engine = Engine::from_config(&self.config, Arc::new(InMemoryModeration::new()));
        let handler = RallyHandler::new(bot, engine, &self.config);
        dispatch(&handler, rx, shutdown).await;

        if let Err(e) = poller.await {
            warn!(error = %e, "poller task failed");
        }
        info!("bot stopped");
        Ok(())
    }
}

/// Drain `rx` until the poller hangs up or shutdown is requested.
pub async fn dispatch<B: BotApi>(
    handler: &RallyHandler<B>,
    mut rx: mpsc::Receiver<Inbound>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            inbound = rx.recv() => match inbound {
                Some(inbound) => handler.handle(inbound).await,
                None => break,
            },
        }
    }
}

async fn poll_loop(
    bot: TelegramBot,
    timeout_secs: u32,
    tx: mpsc::Sender<Inbound>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut offset: i32 = 0;

    while !*shutdown.borrow() {
        let updates = tokio::select! {
            _ = shutdown.changed() => break,
            result = poll_updates(&bot, timeout_secs, offset) => result,
        };
        let updates = match updates {
            Ok(u) => u,
            Err(e) => {
                warn!(error = %e, "Telegram poll failed, retrying");
                tokio::select! {
                    _ = shutdown.changed() => break,
                    () = tokio::time::sleep(RETRY_DELAY) => continue,
                }
            }
        };

        for (update_id, inbound) in updates {
            offset = update_id + 1;
            let Some(inbound) = inbound else {
                continue;
            };
            if tx.send(inbound).await.is_err() {
                debug!("dispatcher gone, stopping poller");
                return;
            }
        }
    }
}

/// Long-poll `getUpdates` once, normalising what comes back.
async fn poll_updates(
    bot: &TelegramBot,
    timeout_secs: u32,
    offset: i32,
) -> Result<Vec<(i32, Option<Inbound>)>, TelegramError> {
    use teloxide::payloads::GetUpdatesSetters;
    use teloxide::requests::Requester;

    let updates = bot
        .inner()
        .get_updates()
        .offset(offset)
        .timeout(timeout_secs)
        .await
        .map_err(|e| TelegramError::Receive(e.to_string()))?;

    Ok(updates
        .iter()
        .map(|update| {
            #[allow(clippy::cast_possible_wrap)]
            let id = update.id.0 as i32;
            (id, Inbound::from_update(update))
        })
        .collect())
}

/// A receiver that flips to `true` on Ctrl+C or `SIGTERM`.
fn shutdown_signal() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    let tx = Arc::new(tx);
    {
        let tx = tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, shutting down");
                let _ = tx.send(true);
            }
        });
    }
    #[cfg(unix)]
    {
        tokio::spawn(async move {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                    info!("SIGTERM received, shutting down");
                    let _ = tx.send(true);
                }
                Err(e) => warn!(error = %e, "failed to register SIGTERM handler"),
            }
        });
    }
    rx
}
