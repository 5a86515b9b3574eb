use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use teloxide::dispatching::ShutdownToken;
use teloxide::net::Download;
use teloxide::payloads::AnswerInlineQuerySetters;
use teloxide::prelude::*;
use teloxide::types::{
    InlineQueryResult, InlineQueryResultCachedGif, InlineQueryResultCachedPhoto,
    InlineQueryResultCachedSticker, InlineQueryResultPhoto,
};
use teloxide::update_listeners::Polling;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{normalize_message, BotContext, MediaFetcher};
use crate::config::TelegramConfig;
use crate::media::MediaKind;
use crate::query::{QueryAnswer, ResultSource};

/// Longest result id the Bot API accepts.
pub const MAX_RESULT_ID_BYTES: usize = 64;

/// Telegram channel implementation using the Bot API via teloxide.
pub struct TelegramChannel {
    bot: Bot,
    poll_timeout: Duration,
}

/// A dispatcher polling in the background.
pub struct RunningChannel {
    handle: JoinHandle<()>,
    shutdown: ShutdownToken,
}

impl TelegramChannel {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let token = config
            .bot_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .context("Telegram bot token not configured")?;

        info!(
            "Telegram channel configured (token ends ...{})",
            token_suffix(token)
        );

        Ok(Self {
            bot: Bot::new(token),
            poll_timeout: Duration::from_secs(u64::from(config.poll_timeout_secs)),
        })
    }

    /// A fetcher downloading media through this bot.
    pub fn fetcher(&self) -> TelegramFetcher {
        TelegramFetcher {
            bot: self.bot.clone(),
        }
    }

    /// Start long polling. Messages and inline queries are routed into
    /// `context`; every other update is dropped.
    pub fn start(&self, context: BotContext) -> RunningChannel {
        let handler = dptree::entry()
            .branch(Update::filter_message().endpoint(handle_message))
            .branch(Update::filter_inline_query().endpoint(handle_inline_query));

        let mut dispatcher = Dispatcher::builder(self.bot.clone(), handler)
            .dependencies(dptree::deps![context])
            .default_handler(|_| async {})
            .build();
        let shutdown = dispatcher.shutdown_token();

        let listener = Polling::builder(self.bot.clone())
            .timeout(self.poll_timeout)
            .build();

        info!("Telegram channel starting");
        let handle = tokio::spawn(async move {
            dispatcher
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("Telegram update listener error"),
                )
                .await;
        });

        RunningChannel { handle, shutdown }
    }
}

impl RunningChannel {
    /// Stop the dispatcher and wait for in-flight handlers to finish.
    pub async fn stop(self) {
        info!("Telegram channel stopping");
        match self.shutdown.shutdown() {
            Ok(done) => done.await,
            Err(_) => debug!("Telegram dispatcher was not running"),
        }
        let _ = self.handle.await;
    }
}

async fn handle_message(bot: Bot, msg: Message, context: BotContext) -> ResponseResult<()> {
    let event = normalize_message(&msg);
    if let Some(reply) = context.handle(event).await {
        bot.send_message(msg.chat.id, reply).await?;
    }
    Ok(())
}

async fn handle_inline_query(
    bot: Bot,
    query: InlineQuery,
    context: BotContext,
) -> ResponseResult<()> {
    let answer = context.answer(&query.query);
    debug!(
        query = %query.query,
        results = answer.results.len(),
        "answering inline query"
    );

    bot.answer_inline_query(query.id.clone(), to_inline_results(&answer))
        .cache_time(answer.cache_time_secs)
        .await?;
    Ok(())
}

/// Convert resolver output into Bot API inline results.
pub fn to_inline_results(answer: &QueryAnswer) -> Vec<InlineQueryResult> {
    answer
        .results
        .iter()
        .map(|result| {
            let id = telegram_result_id(&result.id);
            match &result.source {
                ResultSource::Cached(reference) => match result.kind {
                    MediaKind::Sticker => InlineQueryResult::CachedSticker(
                        InlineQueryResultCachedSticker::new(id, reference.clone()),
                    ),
                    MediaKind::Animated => InlineQueryResult::CachedGif(
                        InlineQueryResultCachedGif::new(id, reference.clone()),
                    ),
                    MediaKind::Photo => InlineQueryResult::CachedPhoto(
                        InlineQueryResultCachedPhoto::new(id, reference.clone()),
                    ),
                },
                ResultSource::Rendered(url) => InlineQueryResult::Photo(
                    InlineQueryResultPhoto::new(id, url.clone(), url.clone()),
                ),
            }
        })
        .collect()
}

/// Last four characters of `token`, for logs.
fn token_suffix(token: &str) -> String {
    let mut tail: Vec<char> = token.chars().rev().take(4).collect();
    tail.reverse();
    tail.into_iter().collect()
}

/// `id` itself when the Bot API accepts it, otherwise its hex SHA-256.
pub fn telegram_result_id(id: &str) -> String {
    if id.len() <= MAX_RESULT_ID_BYTES {
        id.to_string()
    } else {
        hex::encode(Sha256::digest(id.as_bytes()))
    }
}

// ============================================================================
// Media Fetcher
// ============================================================================

/// Downloads media with `getFile` and the Bot API file endpoint.
#[derive(Clone)]
pub struct TelegramFetcher {
    bot: Bot,
}

#[async_trait]
impl MediaFetcher for TelegramFetcher {
    async fn fetch(&self, reference: &str) -> Result<Vec<u8>> {
        let file = self
            .bot
            .get_file(reference)
            .await
            .with_context(|| format!("getFile failed for {reference}"))?;

        let mut buf = Vec::new();
        self.bot
            .download_file(&file.path, &mut buf)
            .await
            .with_context(|| format!("download failed for {reference}"))?;

        debug!(reference, bytes = buf.len(), "fetched media");
        Ok(buf)
    }
}
