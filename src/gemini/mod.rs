pub mod client;

use crate::{error::Result, models::GenerateContentRequest};
use async_trait::async_trait;

pub use client::GeminiClient;

/// The one external call the controller makes.
///
/// The raw JSON body is returned untouched so that the caller can both
/// classify it and dump it verbatim into a diagnostic trace.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    fn model(&self) -> &str;

    async fn generate_content(
        &self,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<serde_json::Value>;
}
