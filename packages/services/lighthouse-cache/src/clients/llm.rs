use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::RecommendationGenerator;
use crate::models::*;
use crate::tenant::TenantId;

const RECOMMENDATION_PROMPT: &str = "You are a cloud security assistant. Given a summary of recent \
security scans, reply with one short, actionable recommendation (a single sentence, no markdown). \
If the summary shows nothing worth acting on, reply with an empty message.";

/// Recommendation generator backed by an OpenAI-compatible chat completions endpoint.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl LlmClient {
    pub fn new(base_url: String, api_key: Option<String>, model: String, timeout_ms: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }
}

fn first_choice_content(result: &Value) -> Option<String> {
    result
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(str::to_string)
}

#[async_trait]
impl RecommendationGenerator for LlmClient {
    async fn generate_recommendation(&self, tenant: &TenantId, summary: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": RECOMMENDATION_PROMPT },
                { "role": "user", "content": summary },
            ],
            "temperature": 0.2,
        });

        let url = format!("{}/chat/completions", self.base_url);
        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(LighthouseError::ExternalService(format!(
                "Recommendation error: status={} body={}",
                status, text
            )));
        }

        let result: Value = response.json().await?;
        let content = first_choice_content(&result).unwrap_or_default();
        tracing::debug!(tenant = %tenant, length = content.len(), "Generated recommendation");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_first_choice() {
        let result = json!({"choices": [{"message": {"role": "assistant", "content": "Rotate the exposed keys."}}]});
        assert_eq!(first_choice_content(&result).as_deref(), Some("Rotate the exposed keys."));
        assert!(first_choice_content(&json!({"choices": []})).is_none());
    }
}
