use crate::config::Config;
use crate::errors::AppError;
use crate::models::Allocation;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Shared outbound client with the configured request timeout.
pub fn http_client(config: &Config) -> Client {
    Client::builder()
        .timeout(config.http_timeout())
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("Falling back to default HTTP client: {}", e);
            Client::new()
        })
}

async fn error_body(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string())
}

// ============ Real-time quotes (Alpha Vantage) ============

/// Authoritative quote for one ticker, already formatted for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub codigo: String,
    pub valor: String,
    pub variacao_dia: Option<String>,
    pub data: Option<String>,
}

pub struct QuoteService {
    client: Client,
    base_url: String,
    api_key: String,
}

impl QuoteService {
    pub fn new(config: &Config) -> Self {
        Self {
            client: http_client(config),
            base_url: config.alpha_vantage_base_url.clone(),
            api_key: config.alpha_vantage_api_key.clone(),
        }
    }

    async fn query(&self, params: &[(&str, &str)]) -> Result<Value, AppError> {
        let mut all: Vec<(&str, &str)> = params.to_vec();
        all.push(("apikey", self.api_key.as_str()));

        let url = reqwest::Url::parse_with_params(&format!("{}/query", self.base_url), &all)
            .map_err(|e| AppError::ExternalApiError(format!("Failed to build URL: {}", e)))?;

        // Redact key from logs
        tracing::debug!(
            "Alpha Vantage URL: {}/query?{}&apikey=[REDACTED]",
            self.base_url,
            params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("&")
        );

        let response = self.client.get(url).send().await.map_err(|e| {
            AppError::ExternalApiError(format!("Alpha Vantage request failed: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = error_body(response).await;
            return Err(AppError::ExternalApiError(format!(
                "Alpha Vantage returned status {}: {}",
                status, error_text
            )));
        }

        response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse Alpha Vantage response: {}", e))
        })
    }

    /// Latest quote for `symbol`, or `None` when the ticker is unknown or the
    /// service answered without a quote (rate-limit notes included).
    pub async fn get_quote(&self, symbol: &str) -> Result<Option<Quote>, AppError> {
        tracing::info!("Fetching quote for {}", symbol);

        let body = self
            .query(&[("function", "GLOBAL_QUOTE"), ("symbol", symbol)])
            .await?;

        let Some(global) = body
            .get("Global Quote")
            .and_then(Value::as_object)
            .filter(|q| !q.is_empty())
        else {
            tracing::warn!("No quote available for {}", symbol);
            return Ok(None);
        };

        let field = |key: &str| {
            global
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let Some(price) = field("05. price").and_then(|p| p.parse::<f64>().ok()) else {
            tracing::warn!("Quote for {} has no usable price", symbol);
            return Ok(None);
        };

        let currency = self.currency_for(symbol).await;

        Ok(Some(Quote {
            codigo: field("01. symbol").unwrap_or_else(|| symbol.to_string()),
            valor: format_price(price, &currency),
            variacao_dia: field("10. change percent"),
            data: field("07. latest trading day"),
        }))
    }

    /// Trading currency from the best symbol-search match. Defaults to BRL,
    /// including when the lookup itself fails.
    pub async fn currency_for(&self, symbol: &str) -> String {
        match self
            .query(&[("function", "SYMBOL_SEARCH"), ("keywords", symbol)])
            .await
        {
            Ok(body) => body
                .get("bestMatches")
                .and_then(Value::as_array)
                .and_then(|matches| matches.first())
                .and_then(|m| m.get("8. currency"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| "BRL".to_string()),
            Err(e) => {
                tracing::warn!("Currency lookup for {} failed, assuming BRL: {}", symbol, e);
                "BRL".to_string()
            }
        }
    }
}

pub fn format_price(price: f64, currency: &str) -> String {
    match currency {
        "USD" => format!("US$ {:.2}", price),
        "BRL" => format!("R$ {:.2}", price),
        other => format!("{} {:.2}", other, price),
    }
}

// ============ Historical candles ============

pub struct HistoryService {
    client: Client,
    url: String,
    token: String,
}

impl HistoryService {
    pub fn new(config: &Config) -> Self {
        Self {
            client: http_client(config),
            url: config.history_service_url.clone(),
            token: config.history_service_token.clone(),
        }
    }

    /// Raw history payload for `symbol`. Never fails: any failure is returned
    /// as `{"error": "<description>"}` so it can travel with the card.
    pub async fn fetch_history(&self, symbol: &str) -> Value {
        match self.request(symbol).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("History lookup for {} failed: {}", symbol, e);
                json!({ "error": e.to_string() })
            }
        }
    }

    async fn request(&self, symbol: &str) -> Result<Value, AppError> {
        let url = reqwest::Url::parse_with_params(&self.url, &[("symbol", symbol)])
            .map_err(|e| AppError::ExternalApiError(format!("Failed to build URL: {}", e)))?;

        tracing::info!("Fetching price history for {}", symbol);

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalApiError(format!("History service request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = error_body(response).await;
            return Err(AppError::ExternalApiError(format!(
                "History service returned status {}: {}",
                status, error_text
            )));
        }

        response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse history response: {}", e))
        })
    }
}

// ============ Generative AI (Gemini) ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

/// One conversation turn, in the `generateContent` wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part { text: text.into() }],
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: "model".to_string(),
            parts: vec![Part { text: text.into() }],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

pub struct GeminiService {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiService {
    pub fn new(config: &Config) -> Self {
        Self {
            client: http_client(config),
            base_url: config.gemini_base_url.clone(),
            model: config.gemini_model.clone(),
            api_key: config.gemini_api_key.clone(),
        }
    }

    /// Sends `message` after `history` under `system_instruction` and returns
    /// the reply text. `history` is not modified.
    pub async fn generate(
        &self,
        system_instruction: &str,
        history: &[Content],
        message: &str,
    ) -> Result<String, AppError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let mut contents = history.to_vec();
        contents.push(Content::user(message));

        let payload = json!({
            "systemInstruction": { "parts": [{ "text": system_instruction }] },
            "contents": contents,
            "generationConfig": {
                "temperature": 1.0,
                "topP": 0.95,
                "maxOutputTokens": 8192
            }
        });

        tracing::info!(
            "Sending message to Gemini ({}), {} prior turn(s)",
            self.model,
            history.len()
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("Gemini request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = error_body(response).await;
            tracing::error!("Gemini returned error {}: {}", status, error_text);
            return Err(AppError::ExternalApiError(format!(
                "Gemini returned status {}: {}",
                status, error_text
            )));
        }

        let body: GenerateContentResponse = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse Gemini response: {}", e))
        })?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            let reason = body
                .prompt_feedback
                .as_ref()
                .and_then(|f| f.get("blockReason"))
                .and_then(Value::as_str)
                .unwrap_or("no candidates");
            return Err(AppError::ExternalApiError(format!(
                "Gemini returned an empty reply ({})",
                reason
            )));
        }

        tracing::debug!("Gemini reply: {} chars", text.len());
        Ok(text)
    }
}

// ============ Diversification simulator ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRequest {
    pub risk_tolerance: String,
    pub investment_amount: f64,
    pub asset_interests: Vec<String>,
}

pub struct DiversificationService {
    client: Client,
    base_url: Option<String>,
}

impl DiversificationService {
    pub fn new(config: &Config) -> Self {
        Self {
            client: http_client(config),
            base_url: config.diversification_api_url.clone(),
        }
    }

    pub async fn fetch_allocation(
        &self,
        request: &AllocationRequest,
    ) -> Result<Allocation, AppError> {
        let base_url = self.base_url.as_ref().ok_or_else(|| {
            AppError::ServiceUnavailable("Simulador de diversificação indisponível".to_string())
        })?;
        let url = format!("{}/allocations", base_url);

        tracing::info!(
            "Requesting allocation (risk: {}, {} asset class(es))",
            request.risk_tolerance,
            request.asset_interests.len()
        );

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalApiError(format!("Diversification API request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = error_body(response).await;
            return Err(AppError::ExternalApiError(format!(
                "Diversification API returned status {}: {}",
                status, error_text
            )));
        }

        response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse allocation response: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_prefix_by_currency() {
        assert_eq!(format_price(36.454, "BRL"), "R$ 36.45");
        assert_eq!(format_price(189.0, "USD"), "US$ 189.00");
        assert_eq!(format_price(12.5, "EUR"), "EUR 12.50");
    }

    #[test]
    fn test_content_wire_shape() {
        let value = serde_json::to_value(Content::model("oi")).unwrap();
        assert_eq!(value, json!({"role": "model", "parts": [{"text": "oi"}]}));
    }
}
