use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::InsightError;

pub const DEFAULT_LOCATION: &str = "Aparecida de Goiânia, Goiás, Brasil";
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
const ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteInsights {
    pub safety_tips: Vec<String>,
    pub scenic_highlight: String,
}

impl RouteInsights {
    /// Shown whenever the model cannot be reached or answers garbage.
    pub fn fallback() -> Self {
        Self {
            safety_tips: vec![
                "Mantenha a manutenção em dia".into(),
                "Use equipamentos de proteção".into(),
                "Respeite a sinalização local".into(),
            ],
            scenic_highlight: "As belas estradas do cerrado goiano.".into(),
        }
    }
}

#[async_trait::async_trait]
pub trait InsightProvider: Send + Sync {
    /// Never fails; falls back to a fixed payload.
    async fn route_insights(&self, route_name: &str, location: &str) -> RouteInsights;
}

pub struct GeminiInsights {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
}

impl GeminiInsights {
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            model: model.into(),
            endpoint: ENDPOINT.to_string(),
        }
    }

    /// Reads the key from `API_KEY`, then `GEMINI_API_KEY`.
    pub fn from_env(model: impl Into<String>) -> Self {
        let api_key = std::env::var("API_KEY")
            .or_else(|_| std::env::var("GEMINI_API_KEY"))
            .ok();
        Self::new(api_key, model)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn request(&self, route_name: &str, location: &str) -> Result<RouteInsights, InsightError> {
        let key = self.api_key.as_deref().ok_or(InsightError::MissingApiKey)?;
        let url = format!("{}/{}:generateContent", self.endpoint, self.model);

        let response = self.client
            .post(url)
            .query(&[("key", key)])
            .json(&request_body(route_name, location))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(InsightError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        parse_response(&body)
    }
}

#[async_trait::async_trait]
impl InsightProvider for GeminiInsights {
    async fn route_insights(&self, route_name: &str, location: &str) -> RouteInsights {
        match self.request(route_name, location).await {
            Ok(insights) => insights,
            Err(err) => {
                tracing::error!("Failed to fetch insights for {route_name}: {err}");
                RouteInsights::fallback()
            }
        }
    }
}

pub fn prompt(route_name: &str, location: &str) -> String {
    format!(
        "Forneça 3 dicas de segurança e 1 destaque paisagístico para uma viagem de moto chamada \"{}\" perto de {}. A resposta DEVE estar em Português Brasil. Retorne como JSON.",
        route_name, location
    )
}

fn request_body(route_name: &str, location: &str) -> serde_json::Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt(route_name, location) }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "safetyTips": { "type": "ARRAY", "items": { "type": "STRING" } },
                    "scenicHighlight": { "type": "STRING" }
                },
                "required": ["safetyTips", "scenicHighlight"]
            }
        }
    })
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

/// Pulls the model's JSON answer out of a generateContent response.
pub fn parse_response(body: &str) -> Result<RouteInsights, InsightError> {
    let response: GenerateContentResponse = serde_json::from_str(body)?;

    let text = response.candidates
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts)
        .filter_map(|part| part.text)
        .collect::<String>();

    let text = text.trim();
    if text.is_empty() {
        return Err(InsightError::EmptyResponse);
    }

    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_model_answer() {
        let body = r#"{
            "candidates": [{
                "content": { "parts": [{ "text": " {\"safetyTips\": [\"a\", \"b\", \"c\"], \"scenicHighlight\": \"serra\"} " }] }
            }]
        }"#;

        let insights = parse_response(body).unwrap();
        assert_eq!(insights.safety_tips, vec!["a", "b", "c"]);
        assert_eq!(insights.scenic_highlight, "serra");
    }

    #[test]
    fn empty_and_malformed_answers_fail() {
        assert!(matches!(parse_response(r#"{"candidates": []}"#), Err(InsightError::EmptyResponse)));
        assert!(matches!(parse_response(r#"{}"#), Err(InsightError::EmptyResponse)));
        assert!(matches!(
            parse_response(r#"{"candidates": [{"content": {"parts": [{"text": "not json"}]}}]}"#),
            Err(InsightError::Json(_))
        ));
        assert!(matches!(parse_response("<html>"), Err(InsightError::Json(_))));
    }

    #[test]
    fn prompt_names_route_and_location() {
        let text = prompt("Estrada Real de Goiás", DEFAULT_LOCATION);
        assert!(text.contains("\"Estrada Real de Goiás\""));
        assert!(text.contains("perto de Aparecida de Goiânia, Goiás, Brasil"));

        let body = request_body("x", "y");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    }

    #[tokio::test]
    async fn missing_key_falls_back() {
        let provider = GeminiInsights::new(Some("  ".into()), DEFAULT_MODEL);
        let insights = provider.route_insights("Rota", DEFAULT_LOCATION).await;
        assert_eq!(insights, RouteInsights::fallback());
    }

    #[tokio::test]
    async fn broken_endpoint_falls_back() {
        let provider = GeminiInsights::new(Some("key".into()), DEFAULT_MODEL)
            .with_endpoint("http://[::1");
        let insights = provider.route_insights("Rota", DEFAULT_LOCATION).await;
        assert_eq!(insights.safety_tips.len(), 3);
        assert_eq!(insights.scenic_highlight, "As belas estradas do cerrado goiano.");
    }
}
