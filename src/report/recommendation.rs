//! Business recommendations from a generative language model.

use crate::error::{ForecastError, Result};
use crate::pipeline::ForecastSummary;
use crate::storage::{BusinessSnapshot, TransactionSource};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-pro";

/// Returned when the model answers without any text.
pub const EMPTY_ANSWER: &str = "Nenhuma recomendação gerada.";

/// Sent instead of the data prompt when business figures are unavailable.
pub const FALLBACK_PROMPT: &str = "Não foi possível gerar recomendações no momento.";

const MISSING_NAME: &str = "Nenhum";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Prompt asking for up to three short recommendations.
pub fn build_prompt(snapshot: &BusinessSnapshot, summary: &ForecastSummary) -> String {
    format!(
        "Você é um assistente financeiro. Com base nos seguintes dados, forneça até 3 recomendações de negócio claras, objetivas e práticas:\n\
         \n\
         - Receita média diária: R${:.2}\n\
         - Despesa média diária: R${:.2}\n\
         - Produto mais vendido: {}\n\
         - Produto com menor margem de lucro: {}\n\
         - Previsão total de {} para os próximos {} dias: R${:.2}\n\
         \n\
         Use frases curtas e diretas para um gestor de pequenas empresas.\n\
         Responda em formato de tópicos.",
        snapshot.average_revenue,
        snapshot.average_expense,
        snapshot.top_product.as_deref().unwrap_or(MISSING_NAME),
        snapshot.lowest_margin_product.as_deref().unwrap_or(MISSING_NAME),
        summary.label(),
        summary.horizon,
        summary.total,
    )
}

/// Read the business snapshot from `source` and build the prompt, or fall
/// back to [`FALLBACK_PROMPT`] when the snapshot cannot be read.
pub fn prompt_from_source<S: TransactionSource>(source: &S, summary: &ForecastSummary) -> String {
    match source.business_snapshot() {
        Ok(snapshot) => build_prompt(&snapshot, summary),
        Err(err) => {
            tracing::error!(%err, "could not read business figures for the prompt");
            FALLBACK_PROMPT.to_string()
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

/// Request body for a single-prompt `generateContent` call.
pub fn request_body(prompt: &str) -> serde_json::Value {
    let body = GenerateRequest {
        contents: [Content {
            parts: [Part { text: prompt }],
        }],
    };
    serde_json::to_value(body).unwrap_or(serde_json::Value::Null)
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<AnswerPart>,
}

#[derive(Debug, Default, Deserialize)]
struct AnswerPart {
    text: Option<String>,
}

/// Text of the first part of the first candidate, trimmed, or
/// [`EMPTY_ANSWER`] when the response has none.
pub fn extract_text(response: &serde_json::Value) -> String {
    let parsed: GenerateResponse =
        serde_json::from_value(response.clone()).unwrap_or_default();
    parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content.parts.into_iter().next())
        .and_then(|p| p.text)
        .unwrap_or_else(|| EMPTY_ANSWER.to_string())
        .trim()
        .to_string()
}

/// Client for the `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: model.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    /// Point the client at another host.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// URL of the `generateContent` call, without the key.
    pub fn url(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.endpoint, self.model)
    }

    /// Send `prompt` and return the model's answer.
    ///
    /// Fails with [`ForecastError::Recommendation`] when no API key is
    /// configured or the call cannot be completed.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let key = self.api_key.as_deref().ok_or_else(|| {
            ForecastError::Recommendation("GEMINI_API_KEY is not configured".to_string())
        })?;

        let response = self
            .http
            .post(self.url())
            .query(&[("key", key)])
            .json(&request_body(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, model = %self.model, "recommendation request was not successful");
        }

        let body: serde_json::Value = response.json().await?;
        Ok(extract_text(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Category, InMemorySource, TransactionRow};
    use serde_json::json;

    fn summary() -> ForecastSummary {
        ForecastSummary {
            category: Category::Receita,
            horizon: 7,
            total: 1234.5,
        }
    }

    #[test]
    fn prompt_lists_figures() {
        let snapshot = BusinessSnapshot {
            top_product: Some("Café".to_string()),
            lowest_margin_product: None,
            average_revenue: 150.0,
            average_expense: 42.333,
        };
        let prompt = build_prompt(&snapshot, &summary());

        assert!(prompt.starts_with("Você é um assistente financeiro."));
        assert!(prompt.contains("- Receita média diária: R$150.00"));
        assert!(prompt.contains("- Despesa média diária: R$42.33"));
        assert!(prompt.contains("- Produto mais vendido: Café"));
        assert!(prompt.contains("- Produto com menor margem de lucro: Nenhum"));
        assert!(prompt.contains("- Previsão total de receita para os próximos 7 dias: R$1234.50"));
        assert!(prompt.ends_with("Responda em formato de tópicos."));
    }

    #[test]
    fn unreadable_snapshot_falls_back() {
        struct NoFigures;

        impl TransactionSource for NoFigures {
            fn transactions(&self, _category: Option<Category>) -> Result<Vec<TransactionRow>> {
                Ok(Vec::new())
            }

            fn business_snapshot(&self) -> Result<BusinessSnapshot> {
                Err(ForecastError::Storage("no such table: produtos".to_string()))
            }
        }

        assert_eq!(prompt_from_source(&NoFigures, &summary()), FALLBACK_PROMPT);
        assert!(prompt_from_source(&InMemorySource::new(), &summary()).contains("Nenhum"));
    }

    #[test]
    fn request_body_shape() {
        assert_eq!(
            request_body("olá"),
            json!({"contents": [{"parts": [{"text": "olá"}]}]})
        );
    }

    #[test]
    fn extracts_first_candidate_text() {
        let response = json!({
            "candidates": [
                {"content": {"parts": [{"text": "  - Reduza custos\n"}, {"text": "ignored"}]}},
                {"content": {"parts": [{"text": "second"}]}}
            ]
        });
        assert_eq!(extract_text(&response), "- Reduza custos");
    }

    #[test]
    fn missing_text_uses_placeholder() {
        assert_eq!(extract_text(&json!({})), EMPTY_ANSWER);
        assert_eq!(extract_text(&json!({"candidates": []})), EMPTY_ANSWER);
        assert_eq!(extract_text(&json!({"candidates": [{}]})), EMPTY_ANSWER);
        assert_eq!(
            extract_text(&json!({"error": {"code": 403, "message": "denied"}})),
            EMPTY_ANSWER
        );
    }

    #[test]
    fn url_uses_model_and_endpoint() {
        let client = GeminiClient::new(Some("k".to_string()), "gemini-pro")
            .unwrap()
            .with_endpoint("http://localhost:9000/");
        assert_eq!(
            client.url(),
            "http://localhost:9000/v1beta/models/gemini-pro:generateContent"
        );
    }

    #[tokio::test]
    async fn missing_key_is_an_error() {
        let client = GeminiClient::new(Some("   ".to_string()), DEFAULT_MODEL).unwrap();
        assert!(!client.has_api_key());
        assert!(matches!(
            client.generate("oi").await,
            Err(ForecastError::Recommendation(_))
        ));
    }
}
