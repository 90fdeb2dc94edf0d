use crate::{
    config::GeminiConfig,
    error::{Result, StylegenError},
    gemini::ContentGenerator,
    logger,
    models::{gemini::ApiErrorEnvelope, GenerateContentRequest},
};
use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde_json::Value;

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    model: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| StylegenError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint(),
            model: config.model.clone(),
        })
    }

    async fn error_from_response(response: Response) -> StylegenError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
            .ok()
            .map(|envelope| envelope.error.message)
            .filter(|message| !message.trim().is_empty())
            .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
            .or_else(|| status.canonical_reason().map(String::from))
            .unwrap_or_default();

        log::error!("Gemini returned {}: {}", status, message);
        StylegenError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl ContentGenerator for GeminiClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate_content(
        &self,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<Value> {
        let payload = serde_json::to_string(request)?;

        log::info!("Generating image with model: {}", self.model);
        log::debug!("generateContent payload: {}", payload);

        let _timer = logger::timer("generateContent");
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", api_key)
            .header(header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| {
                log::error!("Gemini request failed: {:?}", e);
                StylegenError::Request(e.to_string())
            })?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| StylegenError::Response(format!("response is not valid JSON: {}", e)))
    }
}
