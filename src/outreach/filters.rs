//! Heuristics applied to text scraped from search results and profiles.

use std::sync::OnceLock;

use regex::Regex;

const ROLE_KEYWORDS: &[&str] = &["product", "manager", "lead"];
const NOISE_WORDS: &[&str] = &["view", "connect", "message", "follow", "linkedin"];

fn pm_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bpm\b").expect("pm regex"))
}

/// Whether a search-result title looks like a product-management role.
///
/// Titles are button or caption text as often as real headlines, so UI
/// words and implausible lengths are rejected first.
pub fn matches_target_role(title: &str) -> bool {
    let title = title.trim();
    let len = title.chars().count();
    if len <= 5 || len >= 100 {
        return false;
    }
    let lower = title.to_lowercase();
    if NOISE_WORDS.iter().any(|w| lower.contains(w)) {
        return false;
    }
    ROLE_KEYWORDS.iter().any(|k| lower.contains(k)) || pm_re().is_match(title)
}

/// Reduce a scraped employer label to the company name, if it looks like one.
///
/// "Acme Corp · Full-time\nJan 2021" becomes "Acme Corp". Labels that end up
/// shorter than 3 or longer than 79 chars, or with no uppercase letter, are
/// treated as unreadable.
pub fn clean_employer(label: &str) -> Option<String> {
    let mut text = label.split('\n').next().unwrap_or("");
    text = text.split('·').next().unwrap_or("");
    text = text.split(" - ").next().unwrap_or("");
    let text = text.trim();

    let len = text.chars().count();
    if !(3..80).contains(&len) {
        return None;
    }
    if !text.chars().any(char::is_uppercase) {
        return None;
    }
    Some(text.to_string())
}
