use std::fs;
use std::path::PathBuf;

use crate::{
    error::{Result, StylegenError},
    models::ImagePayload,
};

/// A decoded image ready to be written somewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    NothingToExport,
    Saved(PathBuf),
}

/// Where exported images end up.
pub trait SaveTarget {
    fn save(&self, request: &SaveRequest) -> Result<PathBuf>;
}

/// Writes files into a directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct DirectoryTarget {
    dir: PathBuf,
}

impl DirectoryTarget {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SaveTarget for DirectoryTarget {
    fn save(&self, request: &SaveRequest) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(sanitize_file_name(&request.file_name));
        fs::write(&path, &request.bytes)?;
        log::info!("💾 Image saved to: {}", path.display());
        Ok(path)
    }
}

pub fn export_image(
    payload: Option<&ImagePayload>,
    suggested_name: &str,
    target: &dyn SaveTarget,
) -> Result<ExportOutcome> {
    let Some(payload) = payload else {
        log::warn!("No generated image to save");
        return Ok(ExportOutcome::NothingToExport);
    };

    let bytes = payload.decode().map_err(|e| {
        log::error!("❌ Failed to decode base64 image: {}", e);
        e
    })?;

    let stem = suggested_name.trim();
    if stem.is_empty() {
        return Err(StylegenError::Export("file name must not be empty".into()));
    }

    let request = SaveRequest {
        file_name: format!("{}.{}", stem, payload.extension()),
        mime_type: payload.mime_type.clone(),
        bytes,
    };
    log::debug!(
        "Saving {} ({}, {} bytes)",
        request.file_name,
        request.mime_type,
        request.bytes.len()
    );

    target.save(&request).map(ExportOutcome::Saved)
}

/// Default file stem for an image of `subject` in `style`, safe to use as a
/// file name on any platform.
pub fn suggested_file_stem(subject: &str, style: &str) -> String {
    let slug = |text: &str| {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("-")
    };

    let stem = [slug(subject), slug(style)]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    if stem.is_empty() {
        "generated-image".to_string()
    } else {
        stem
    }
}

fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "image.png".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingTarget {
        saved: RefCell<Vec<SaveRequest>>,
    }

    impl SaveTarget for RecordingTarget {
        fn save(&self, request: &SaveRequest) -> Result<PathBuf> {
            self.saved.borrow_mut().push(request.clone());
            Ok(PathBuf::from(&request.file_name))
        }
    }

    #[test]
    fn jpeg_payload_is_saved_with_subtype_extension() {
        let target = RecordingTarget::default();
        let payload = ImagePayload::new("image/jpeg", "YWJj");

        let outcome = export_image(Some(&payload), "cat", &target).unwrap();

        assert_eq!(outcome, ExportOutcome::Saved(PathBuf::from("cat.jpeg")));
        let saved = target.saved.borrow();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].file_name, "cat.jpeg");
        assert_eq!(saved[0].mime_type, "image/jpeg");
        assert_eq!(saved[0].bytes, b"abc");
    }

    #[test]
    fn missing_payload_is_a_no_op() {
        let target = RecordingTarget::default();
        let outcome = export_image(None, "cat", &target).unwrap();
        assert_eq!(outcome, ExportOutcome::NothingToExport);
        assert!(target.saved.borrow().is_empty());
    }

    #[test]
    fn malformed_base64_is_an_export_error() {
        let target = RecordingTarget::default();
        let payload = ImagePayload::new("image/png", "@@not-base64@@");

        let err = export_image(Some(&payload), "cat", &target).unwrap_err();
        assert!(matches!(err, StylegenError::Export(_)));
        assert!(target.saved.borrow().is_empty());
    }

    #[test]
    fn unknown_mime_defaults_to_png() {
        let target = RecordingTarget::default();
        let payload = ImagePayload::new("application", "YWJj");
        export_image(Some(&payload), "cat", &target).unwrap();
        assert_eq!(target.saved.borrow()[0].file_name, "cat.png");
    }

    #[test]
    fn file_stem_from_subject_and_style() {
        assert_eq!(suggested_file_stem("Red Fox", "Water color!"), "red-fox_water-color");
        assert_eq!(suggested_file_stem("fox", ""), "fox");
        assert_eq!(suggested_file_stem("../", "??"), "generated-image");
    }

    #[test]
    fn sanitizes_path_separators() {
        assert_eq!(sanitize_file_name("../etc/passwd.png"), "_etc_passwd.png");
        assert_eq!(sanitize_file_name("a:b.png"), "a_b.png");
        assert_eq!(sanitize_file_name("..."), "image.png");
    }
}
