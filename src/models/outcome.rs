use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::{Result, StylegenError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime_type: String,
    pub base64_data: String,
}

impl ImagePayload {
    pub fn new(mime_type: impl Into<String>, base64_data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            base64_data: base64_data.into(),
        }
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(self.base64_data.trim())
            .map_err(|e| StylegenError::Export(format!("invalid base64 image data: {}", e)))
    }

    /// File extension taken from the MIME subtype, `png` when there is none.
    pub fn extension(&self) -> String {
        extension_for_mime(&self.mime_type)
    }
}

pub(crate) fn extension_for_mime(mime_type: &str) -> String {
    let essence = mime_type.split(';').next().unwrap_or_default().trim();
    let subtype = essence
        .split_once('/')
        .map(|(kind, subtype)| (kind.trim(), subtype.trim()))
        .filter(|(kind, _)| !kind.is_empty())
        .map(|(_, subtype)| subtype.split('+').next().unwrap_or_default().to_ascii_lowercase());

    match subtype {
        Some(ext)
            if !ext.is_empty()
                && ext
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.') =>
        {
            ext
        }
        _ => "png".to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Missing subject, style or credential. No call was made.
    Validation,
    /// The call succeeded but carried no image.
    EmptyResponse,
    /// The response did not have the expected shape.
    MalformedResponse,
    /// The call itself failed, either in transport or with an API error status.
    Transport,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GenerationOutcome {
    #[default]
    Empty,
    InFlight,
    Blocked,
    Failed {
        kind: FailureKind,
        message: String,
    },
    Succeeded {
        payload: ImagePayload,
    },
}

impl GenerationOutcome {
    pub fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        GenerationOutcome::Failed {
            kind,
            message: message.into(),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, GenerationOutcome::InFlight)
    }

    pub fn payload(&self) -> Option<&ImagePayload> {
        match self {
            GenerationOutcome::Succeeded { payload } => Some(payload),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            GenerationOutcome::Failed { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GenerationOutcome::Empty => "empty",
            GenerationOutcome::InFlight => "in flight",
            GenerationOutcome::Blocked => "blocked",
            GenerationOutcome::Failed { .. } => "failed",
            GenerationOutcome::Succeeded { .. } => "succeeded",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiagnosticTrace {
    lines: Vec<String>,
}

impl DiagnosticTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        log::debug!("trace: {}", line);
        self.lines.push(line);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// What a presentation layer renders: the current outcome plus the trace
/// of the request that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub outcome: GenerationOutcome,
    pub trace: DiagnosticTrace,
}
