//! Completes financial-data cards with authoritative market data.
//!
//! For each card the quote service is asked first, then the history service,
//! one card at a time. A real quote wins; without one, price, date and daily
//! change are derived from the last two candles. The history payload is always
//! attached under `historico`.

use crate::models::{AssistantReply, FinancialCard};
use crate::services::{HistoryService, Quote, QuoteService};
use chrono::{DateTime, NaiveDate};
use serde_json::Value;

/// Display fields derived from a candle history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryDerived {
    pub valor: Option<String>,
    pub data: Option<String>,
    pub variacao_dia: Option<String>,
}

/// Candle list of a history payload: a bare array or `{"candles": [...]}`.
pub fn candles(history: &Value) -> Option<&Vec<Value>> {
    match history {
        Value::Array(items) => Some(items),
        Value::Object(obj) => obj.get("candles").and_then(Value::as_array),
        _ => None,
    }
}

/// Derives price, date and change from the last two candles. Fewer than two
/// candles yields nothing.
pub fn derive_from_history(history: &Value) -> HistoryDerived {
    let Some(list) = candles(history) else {
        return HistoryDerived::default();
    };
    let [.., prev, last] = list.as_slice() else {
        return HistoryDerived::default();
    };

    let last_close = last.get("close").and_then(Value::as_f64);
    let prev_close = prev.get("close").and_then(Value::as_f64);

    let variacao_dia = match (last_close, prev_close) {
        (Some(last), Some(prev)) if prev != 0.0 => {
            let diff = last - prev;
            let pct = diff / prev * 100.0;
            Some(format!("{}{:.2}%", if diff >= 0.0 { "+" } else { "" }, pct))
        }
        _ => None,
    };

    HistoryDerived {
        valor: last_close.map(|close| format!("R$ {:.2}", close)),
        data: last.get("date").and_then(format_candle_date),
        variacao_dia,
    }
}

/// Formats a candle date as `dd/mm/yyyy`. Accepts `YYYY-MM-DD`, RFC 3339 and
/// epoch timestamps (seconds or milliseconds). The calendar date is kept as
/// given, with no timezone shift.
pub fn format_candle_date(value: &Value) -> Option<String> {
    let date = match value {
        Value::String(s) => parse_date_text(s.trim())?,
        Value::Number(n) => {
            let ts = n.as_i64()?;
            let dt = if ts.abs() >= 100_000_000_000 {
                DateTime::from_timestamp_millis(ts)?
            } else {
                DateTime::from_timestamp(ts, 0)?
            };
            dt.date_naive()
        }
        _ => return None,
    };
    Some(date.format("%d/%m/%Y").to_string())
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    text.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

/// Applies lookup results to a card. Without a live quote the price fields
/// come only from history, so the model's own `valor`, `variacao_dia` and
/// `data` are dropped even when fewer than two candles leave them empty.
pub fn merge(mut card: FinancialCard, quote: Option<Quote>, history: Value) -> FinancialCard {
    match quote {
        Some(quote) => {
            card.codigo = quote.codigo;
            card.valor = Some(quote.valor);
            card.variacao_dia = quote.variacao_dia;
            card.data = quote.data;
        }
        None => {
            let derived = derive_from_history(&history);
            card.valor = derived.valor;
            card.variacao_dia = derived.variacao_dia;
            card.data = derived.data;
        }
    }
    card.historico = Some(history);
    card
}

/// Enriches one card. Lookup failures degrade to missing fields.
pub async fn enrich(
    card: FinancialCard,
    quotes: &QuoteService,
    history: &HistoryService,
) -> FinancialCard {
    let ticker = card.codigo.clone();

    let quote = match quotes.get_quote(&ticker).await {
        Ok(quote) => quote,
        Err(e) => {
            tracing::warn!("Quote lookup for {} failed: {}", ticker, e);
            None
        }
    };
    let candles = history.fetch_history(&ticker).await;

    if quote.is_none() {
        tracing::info!("No live quote for {}, using price history", ticker);
    }
    merge(card, quote, candles)
}

/// Enriches every card in `replies`, in order. Plain messages pass through.
pub async fn enrich_replies(
    replies: Vec<AssistantReply>,
    quotes: &QuoteService,
    history: &HistoryService,
) -> Vec<AssistantReply> {
    let mut enriched = Vec::with_capacity(replies.len());
    for reply in replies {
        let reply = match reply {
            AssistantReply::FinancialData(card) => {
                AssistantReply::FinancialData(enrich(card, quotes, history).await)
            }
            message @ AssistantReply::Message { .. } => message,
        };
        enriched.push(reply);
    }
    enriched
}
