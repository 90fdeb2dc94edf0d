//! Turn a subject and a style into a single generated image.
//!
//! [`Controller`] builds the prompt, makes one `generateContent` call and
//! classifies the reply into a [`GenerationOutcome`]. [`export_image`]
//! decodes a successful payload and hands it to a [`SaveTarget`].

pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod gemini;
pub mod logger;
pub mod models;

pub use config::{Config, GeminiConfig};
pub use controller::{classify, Controller};
pub use error::{Result, StylegenError};
pub use export::{
    export_image, suggested_file_stem, DirectoryTarget, ExportOutcome, SaveRequest, SaveTarget,
};
pub use gemini::{ContentGenerator, GeminiClient};
pub use models::{
    DiagnosticTrace, FailureKind, GenerationOutcome, GenerationRequest, ImagePayload, Snapshot,
};
