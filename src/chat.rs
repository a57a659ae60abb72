//! Chat turn orchestration: AI call, normalization, quote enrichment.

use crate::chat_normalizer;
use crate::chat_session::SharedChat;
use crate::config::Config;
use crate::errors::AppError;
use crate::models::ChatMessage;
use crate::quote_enrichment;
use crate::services::{GeminiService, HistoryService, QuoteService};
use serde::Serialize;

pub const ASSISTANT_FAILURE_TEXT: &str = "Erro ao conectar ao assistente ou recuperar dados.";

/// Messages produced by one send, in transcript order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatExchange {
    pub messages: Vec<ChatMessage>,
}

pub struct ChatAssistant {
    gemini: GeminiService,
    quotes: QuoteService,
    history: HistoryService,
}

impl ChatAssistant {
    pub fn new(config: &Config) -> Self {
        Self {
            gemini: GeminiService::new(config),
            quotes: QuoteService::new(config),
            history: HistoryService::new(config),
        }
    }

    /// Bot messages for `text`. The turn is recorded in the session history
    /// only when the AI call succeeds. The session stays locked for the whole
    /// turn, so a user's messages are answered one at a time.
    pub async fn reply(&self, session: &SharedChat, text: &str) -> Result<Vec<ChatMessage>, AppError> {
        let mut session = session.lock().await;

        let raw = self
            .gemini
            .generate(session.system_instruction(), session.history(), text)
            .await?;
        session.record_turn(text, &raw);

        let replies = chat_normalizer::normalize(&raw);
        tracing::debug!("Assistant reply normalized into {} message(s)", replies.len());

        let enriched = quote_enrichment::enrich_replies(replies, &self.quotes, &self.history).await;
        Ok(enriched.into_iter().map(ChatMessage::from).collect())
    }

    /// The user's message followed by the bot's. An AI failure becomes a bot
    /// message carrying the failure description.
    pub async fn send(&self, session: &SharedChat, text: &str) -> ChatExchange {
        let mut messages = vec![ChatMessage::user(text)];
        match self.reply(session, text).await {
            Ok(bot) => messages.extend(bot),
            Err(e) => {
                tracing::error!("Assistant turn failed: {}", e);
                messages.push(ChatMessage::bot(format!("{}\n{}", ASSISTANT_FAILURE_TEXT, e)));
            }
        }
        ChatExchange { messages }
    }
}
