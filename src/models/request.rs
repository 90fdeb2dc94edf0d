use crate::error::{Result, StylegenError};

/// A subject and the style to render it in. Both are stored trimmed and
/// are guaranteed non-empty once constructed through [`GenerationRequest::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub subject: String,
    pub style: String,
}

impl GenerationRequest {
    pub fn new(subject: &str, style: &str) -> Result<Self> {
        let subject = subject.trim();
        let style = style.trim();

        if subject.is_empty() || style.is_empty() {
            return Err(StylegenError::Validation(
                "Please enter both a subject and a style.".into(),
            ));
        }

        Ok(Self {
            subject: subject.to_string(),
            style: style.to_string(),
        })
    }

    pub fn prompt(&self) -> String {
        format!(
            "Create a high-quality, clear image of a '{subject}' in the style of {style}. \
             The object should be the central focus of the image, and visually styled \
             according to the description: {style}. Make it visually appealing and artistic.",
            subject = self.subject,
            style = self.style,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_fields() {
        for (subject, style) in [("", "watercolor"), ("fox", ""), ("   ", "oil"), ("fox", "\t\n")] {
            let err = GenerationRequest::new(subject, style).unwrap_err();
            assert!(matches!(err, StylegenError::Validation(_)));
        }
    }

    #[test]
    fn prompt_places_subject_and_style() {
        let request = GenerationRequest::new("fox", "watercolor").unwrap();
        let prompt = request.prompt();

        assert_eq!(prompt.matches("fox").count(), 1);
        assert_eq!(prompt.matches("watercolor").count(), 2);
        assert!(prompt.starts_with(
            "Create a high-quality, clear image of a 'fox' in the style of watercolor."
        ));
        assert!(prompt.contains("according to the description: watercolor. Make it"));
        assert!(prompt.ends_with("Make it visually appealing and artistic."));
    }

    #[test]
    fn fields_are_trimmed() {
        let request = GenerationRequest::new("  owl ", " ink wash ").unwrap();
        assert_eq!(request.subject, "owl");
        assert_eq!(request.style, "ink wash");
        assert!(request.prompt().contains("'owl' in the style of ink wash."));
    }
}
