//! Connection note templating.
//!
//! Placeholders: `{name}`, `{first_name}`, `{company}`. Unknown braces are
//! left as written.

use crate::types::Candidate;

/// LinkedIn rejects connection notes longer than this.
pub const MAX_NOTE_CHARS: usize = 300;

#[derive(Debug, Clone)]
pub struct NoteTemplate {
    template: String,
}

impl NoteTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.template.trim().is_empty()
    }

    /// Fill the placeholders for `candidate`, truncated to [`MAX_NOTE_CHARS`].
    pub fn render(&self, candidate: &Candidate) -> String {
        let rendered = self
            .template
            .replace("{first_name}", candidate.first_name())
            .replace("{name}", candidate.name.trim())
            .replace("{company}", candidate.company.trim());
        truncate_chars(&rendered, MAX_NOTE_CHARS)
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> Candidate {
        Candidate {
            name: "Priya Raman".to_string(),
            title: "Senior Product Manager".to_string(),
            company: "Blinkit".to_string(),
            profile_reference: "https://www.linkedin.com/in/priya".to_string(),
        }
    }

    #[test]
    fn test_render_placeholders() {
        let template =
            NoteTemplate::new("Hi {first_name}! ({name}) Loved {company}'s launch. {other}");
        assert_eq!(
            template.render(&candidate()),
            "Hi Priya! (Priya Raman) Loved Blinkit's launch. {other}"
        );
    }

    #[test]
    fn test_render_truncates_on_char_boundary() {
        let template = NoteTemplate::new("é".repeat(400));
        let note = template.render(&candidate());
        assert_eq!(note.chars().count(), MAX_NOTE_CHARS);
    }

    #[test]
    fn test_empty_template() {
        assert!(NoteTemplate::new("  ").is_empty());
        assert_eq!(NoteTemplate::new("").render(&candidate()), "");
    }
}
