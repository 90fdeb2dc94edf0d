use std::sync::Arc;

use tokio::sync::watch;

use crate::{
    config::GeminiConfig,
    error::{Result, StylegenError},
    gemini::{ContentGenerator, GeminiClient},
    models::{
        DiagnosticTrace, FailureKind, GenerateContentRequest, GenerateContentResponse,
        GenerationOutcome, GenerationRequest, ImagePayload, Snapshot,
    },
};

pub const NO_IMAGE_DATA: &str = "no image data returned";
pub const UNKNOWN_ERROR: &str = "Unknown error";
pub const MISSING_CREDENTIAL: &str =
    "API key is not configured. Set GEMINI_API_KEY before generating images.";

/// Owns the single outcome slot and the diagnostic trace for one user.
///
/// `submit` borrows the controller mutably for the whole round trip, so a
/// second submission cannot start while one is in flight. Subscribers get
/// every state change, including `InFlight`, through a watch channel.
pub struct Controller {
    generator: Arc<dyn ContentGenerator>,
    api_key: Option<String>,
    snapshot: Snapshot,
    last_request: Option<GenerationRequest>,
    state_tx: watch::Sender<Snapshot>,
}

impl Controller {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let client = GeminiClient::new(config)?;
        Ok(Self::with_generator(
            config.credential().map(String::from),
            Arc::new(client),
        ))
    }

    pub fn with_generator(api_key: Option<String>, generator: Arc<dyn ContentGenerator>) -> Self {
        let (state_tx, _) = watch::channel(Snapshot::default());
        Self {
            generator,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            snapshot: Snapshot::default(),
            last_request: None,
            state_tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.state_tx.subscribe()
    }

    pub fn outcome(&self) -> &GenerationOutcome {
        &self.snapshot.outcome
    }

    pub fn trace(&self) -> &DiagnosticTrace {
        &self.snapshot.trace
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn is_busy(&self) -> bool {
        self.snapshot.outcome.is_in_flight()
    }

    /// The last request that passed validation.
    pub fn last_request(&self) -> Option<&GenerationRequest> {
        self.last_request.as_ref()
    }

    pub async fn submit(&mut self, subject: &str, style: &str) -> GenerationOutcome {
        self.snapshot.trace.clear();

        let request = match GenerationRequest::new(subject, style) {
            Ok(request) => request,
            Err(e) => {
                self.snapshot.trace.push(format!("Validation failed: {}", e));
                return self.finish(GenerationOutcome::failed(
                    FailureKind::Validation,
                    e.to_string(),
                ));
            }
        };

        let Some(api_key) = self.api_key.clone() else {
            self.snapshot.trace.push("Validation failed: missing API key");
            return self.finish(GenerationOutcome::failed(
                FailureKind::Validation,
                MISSING_CREDENTIAL,
            ));
        };

        let prompt = request.prompt();
        self.last_request = Some(request);
        self.snapshot.outcome = GenerationOutcome::InFlight;
        self.snapshot.trace.push(format!(
            "Request sent to {}: {}",
            self.generator.model(),
            prompt
        ));
        self.publish();

        let wire_request = GenerateContentRequest::user_prompt(prompt);
        let outcome = match self.generator.generate_content(&api_key, &wire_request).await {
            Ok(raw) => {
                self.snapshot.trace.push("Response received");
                classify(&raw, &mut self.snapshot.trace)
            }
            Err(e) => {
                let (kind, message) = failure_from_error(&e);
                self.snapshot.trace.push(format!("Request failed: {}", message));
                GenerationOutcome::failed(kind, message)
            }
        };

        self.finish(outcome)
    }

    fn finish(&mut self, outcome: GenerationOutcome) -> GenerationOutcome {
        match &outcome {
            GenerationOutcome::Succeeded { payload } => {
                log::info!("Image generated ({})", payload.mime_type)
            }
            GenerationOutcome::Blocked => log::warn!("Image blocked by safety filters"),
            GenerationOutcome::Failed { kind, message } => {
                log::error!("Image generation failed ({:?}): {}", kind, message)
            }
            GenerationOutcome::Empty | GenerationOutcome::InFlight => {}
        }
        log::debug!("Outcome: {}", outcome.label());

        self.snapshot.outcome = outcome.clone();
        self.publish();
        outcome
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.snapshot.clone());
    }
}

/// Turns a raw `generateContent` body into an outcome.
///
/// Checks run in a fixed order: safety block on the first candidate, then
/// the first part carrying inline data, then failure. Anything that does not
/// fit the expected shape fails closed.
pub fn classify(raw: &serde_json::Value, trace: &mut DiagnosticTrace) -> GenerationOutcome {
    let response: GenerateContentResponse = match serde_json::from_value(raw.clone()) {
        Ok(response) => response,
        Err(e) => {
            trace.push(format!("Classification: malformed response ({})", e));
            trace.push(format!("Raw response: {}", raw));
            return GenerationOutcome::failed(
                FailureKind::MalformedResponse,
                "malformed response from image service",
            );
        }
    };

    let candidate = response.candidates.first();

    if candidate.map_or(false, |c| c.blocked_for_image_safety()) {
        trace.push("Classification: blocked by image safety filter");
        return GenerationOutcome::Blocked;
    }

    let parts = candidate.map(|c| c.parts()).unwrap_or_default();

    for text in parts.iter().filter_map(|part| part.text.as_deref()) {
        trace.push(format!("Model text: {}", text));
    }

    if let Some(inline) = parts.iter().find_map(|part| part.inline_data.as_ref()) {
        let payload = ImagePayload::new(inline.mime_type.clone(), inline.data.clone());
        if payload.decode().is_err() {
            trace.push("Classification: inline data is not valid base64");
            return GenerationOutcome::failed(
                FailureKind::MalformedResponse,
                "image data returned by the service is not valid base64",
            );
        }
        trace.push(format!("Classification: image received ({})", payload.mime_type));
        return GenerationOutcome::Succeeded { payload };
    }

    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|feedback| feedback.block_reason.as_deref())
    {
        trace.push(format!("Classification: prompt blocked ({})", reason));
        return GenerationOutcome::Blocked;
    }

    trace.push(format!("Classification: {}", NO_IMAGE_DATA));
    trace.push(format!("Raw response: {}", raw));
    GenerationOutcome::failed(FailureKind::EmptyResponse, NO_IMAGE_DATA)
}

fn failure_from_error(e: &StylegenError) -> (FailureKind, String) {
    let kind = match e {
        StylegenError::Response(_) | StylegenError::Serialization(_) => {
            FailureKind::MalformedResponse
        }
        _ => FailureKind::Transport,
    };

    let detail = match e {
        StylegenError::Config(m)
        | StylegenError::Validation(m)
        | StylegenError::Request(m)
        | StylegenError::Response(m)
        | StylegenError::Serialization(m)
        | StylegenError::Export(m)
        | StylegenError::Api { message: m, .. } => m.trim().to_string(),
        StylegenError::Io(io) => io.to_string(),
    };

    let message = if detail.is_empty() {
        UNKNOWN_ERROR.to_string()
    } else {
        e.to_string()
    };
    (kind, message)
}
