//! Turns raw assistant text into typed replies.
//!
//! The model is told to answer in JSON but routinely wraps it in a fenced block,
//! surrounds it with prose, or ignores the contract entirely. Parsing never
//! fails: anything unparseable becomes a plain message.

use crate::models::{AssistantReply, FinancialCard};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

const FINANCIAL_DATA_TAG: &str = "dado_financeiro";
pub const MISSING_TEXT_FALLBACK: &str = "Erro ao obter resposta.";
pub const UNPRINTABLE_TEXT_FALLBACK: &str = "Erro ao processar resposta do assistente.";

static FENCED_JSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)```json[\s\n]*([\s\S]*?)[\s\n]*```").expect("fenced json pattern")
});

static BRACED_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\{[\s\S]*\})").expect("braced object pattern"));

static SURROUNDING_QUOTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^["\s]+|["\s]+$"#).expect("surrounding quotes pattern"));

/// Normalizes one raw assistant reply into one or more typed replies, in order.
pub fn normalize(raw: &str) -> Vec<AssistantReply> {
    classify(&extract_json(raw))
}

/// Pulls a JSON payload out of `raw`. The first attempt that parses wins:
/// a ```` ```json ```` fenced block, the outermost `{...}` span, the whole text.
/// Falls back to a plain-message object carrying the trimmed text.
pub fn extract_json(raw: &str) -> Value {
    if let Some(block) = FENCED_JSON.captures(raw).and_then(|c| c.get(1)) {
        if let Ok(value) = serde_json::from_str(block.as_str()) {
            return value;
        }
    }

    if let Some(span) = BRACED_OBJECT.captures(raw).and_then(|c| c.get(1)) {
        if let Ok(value) = serde_json::from_str(span.as_str()) {
            return value;
        }
    }

    if let Ok(value) = serde_json::from_str(raw) {
        return value;
    }

    tracing::debug!("Assistant reply is not JSON, treating as plain text");
    serde_json::json!({ "tipo": "mensagem", "resposta": raw.trim() })
}

/// Classifies a parsed payload. Arrays are classified element by element.
pub fn classify(value: &Value) -> Vec<AssistantReply> {
    match value {
        Value::Array(items) if items.is_empty() => {
            vec![AssistantReply::message(MISSING_TEXT_FALLBACK)]
        }
        Value::Array(items) => items.iter().map(classify_one).collect(),
        other => vec![classify_one(other)],
    }
}

fn classify_one(value: &Value) -> AssistantReply {
    match value {
        Value::Object(obj) => match financial_card(obj) {
            Some(card) => AssistantReply::FinancialData(card),
            None => AssistantReply::message(message_text(obj)),
        },
        Value::String(s) => AssistantReply::message(clean_display_text(s)),
        Value::Null => AssistantReply::message(MISSING_TEXT_FALLBACK),
        scalar => AssistantReply::message(scalar.to_string()),
    }
}

/// A card needs the financial-data tag and a non-empty ticker.
fn financial_card(obj: &Map<String, Value>) -> Option<FinancialCard> {
    if obj.get("tipo").and_then(Value::as_str) != Some(FINANCIAL_DATA_TAG) {
        return None;
    }
    let codigo = scalar_text(obj.get("codigo")?)?;
    if codigo.trim().is_empty() {
        return None;
    }

    let field = |key: &str| obj.get(key).and_then(scalar_text);
    Some(FinancialCard {
        titulo: field("titulo"),
        codigo: codigo.trim().to_string(),
        descricao: field("descricao"),
        valor: field("valor"),
        variacao_dia: field("variacao_dia"),
        fonte: field("fonte"),
        data: field("data"),
        historico: None,
    })
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Display text of a plain message: `resposta`, else `text`; empty or falsy
/// values count as missing.
fn message_text(obj: &Map<String, Value>) -> String {
    let chosen = ["resposta", "text"]
        .iter()
        .filter_map(|key| obj.get(*key))
        .find(|v| is_present(v));

    match chosen {
        None => MISSING_TEXT_FALLBACK.to_string(),
        Some(Value::String(s)) => clean_display_text(s),
        Some(other) => match serde_json::to_string_pretty(other) {
            Ok(text) => clean_display_text(&text),
            Err(_) => UNPRINTABLE_TEXT_FALLBACK.to_string(),
        },
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Strips leading/trailing double quotes and whitespace.
pub fn clean_display_text(text: &str) -> String {
    SURROUNDING_QUOTES.replace_all(text.trim(), "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_block() {
        let replies = normalize("```json\n{\"tipo\":\"mensagem\",\"resposta\":\"oi\"}\n```");
        assert_eq!(replies, vec![AssistantReply::message("oi")]);
    }

    #[test]
    fn test_plain_text_falls_back() {
        let replies = normalize("olá mundo");
        assert_eq!(replies, vec![AssistantReply::message("olá mundo")]);
    }

    #[test]
    fn test_object_inside_prose() {
        let raw = "Claro! Aqui está: {\"tipo\":\"mensagem\",\"resposta\":\"**Renda fixa** é uma opção\"} Espero ter ajudado.";
        assert_eq!(
            normalize(raw),
            vec![AssistantReply::message("**Renda fixa** é uma opção")]
        );
    }

    #[test]
    fn test_broken_fence_uses_brace_span() {
        let raw = "```json\n{\"tipo\": \"mensagem\", \"resposta\": \"a\"\n``` {\"tipo\":\"mensagem\",\"resposta\":\"b\"}";
        // Neither the fenced block nor the greedy span parses, so the text is kept.
        let replies = normalize(raw);
        assert_eq!(replies.len(), 1);
        assert!(matches!(&replies[0], AssistantReply::Message { resposta } if resposta.contains("```json")));
    }

    #[test]
    fn test_financial_card_requires_ticker() {
        let with_code = normalize(r#"{"tipo":"dado_financeiro","titulo":"Petrobras","codigo":"PETR4.SA","valor":"R$ 36,45"}"#);
        match &with_code[0] {
            AssistantReply::FinancialData(card) => {
                assert_eq!(card.codigo, "PETR4.SA");
                assert_eq!(card.titulo.as_deref(), Some("Petrobras"));
                assert_eq!(card.valor.as_deref(), Some("R$ 36,45"));
            }
            other => panic!("expected card, got {:?}", other),
        }

        let without_code = normalize(r#"{"tipo":"dado_financeiro","titulo":"Petrobras"}"#);
        assert_eq!(without_code, vec![AssistantReply::message(MISSING_TEXT_FALLBACK)]);
    }

    #[test]
    fn test_array_is_classified_per_element() {
        let raw = r#"[
            {"tipo":"dado_financeiro","codigo":"PETR4.SA"},
            {"tipo":"mensagem","resposta":"Veja acima"},
            {"tipo":"dado_financeiro","codigo":"VALE3.SA"}
        ]"#;
        let replies = normalize(raw);

        assert_eq!(replies.len(), 3);
        assert!(matches!(&replies[0], AssistantReply::FinancialData(c) if c.codigo == "PETR4.SA"));
        assert_eq!(replies[1], AssistantReply::message("Veja acima"));
        assert!(matches!(&replies[2], AssistantReply::FinancialData(c) if c.codigo == "VALE3.SA"));
    }

    #[test]
    fn test_text_field_and_stringified_object() {
        assert_eq!(
            normalize(r#"{"text":"  \"citação\"  "}"#),
            vec![AssistantReply::message("citação")]
        );

        let replies = normalize(r#"{"tipo":"mensagem","resposta":{"a":1}}"#);
        assert_eq!(replies, vec![AssistantReply::message("{\n  \"a\": 1\n}")]);
    }

    #[test]
    fn test_empty_resposta_falls_through_to_text() {
        let replies = normalize(r#"{"resposta":"","text":"usado"}"#);
        assert_eq!(replies, vec![AssistantReply::message("usado")]);
    }

    #[test]
    fn test_bare_json_string() {
        assert_eq!(normalize("\"oi\""), vec![AssistantReply::message("oi")]);
    }

    #[test]
    fn test_empty_array_still_yields_a_message() {
        assert_eq!(normalize("[]"), vec![AssistantReply::message(MISSING_TEXT_FALLBACK)]);
    }
}
