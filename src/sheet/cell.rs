//! Cell payload helpers: hyperlink formulas and person column labels.

use std::sync::OnceLock;

use regex::Regex;

/// Prefix shared by every person column header.
pub const PERSON_COLUMN_PREFIX: &str = "Person ";

fn hyperlink_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)^=HYPERLINK\(\s*"((?:[^"]|"")*)"\s*[,;]\s*"((?:[^"]|"")*)"\s*\)$"#)
            .expect("static hyperlink regex")
    })
}

fn person_label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^Person\s+(\d+)\s*$").expect("static person label regex"))
}

/// Build a clickable `=HYPERLINK("url","name")` formula.
///
/// Double quotes inside either argument are doubled, as spreadsheet formulas
/// require.
pub fn hyperlink_formula(url: &str, name: &str) -> String {
    format!(
        "=HYPERLINK(\"{}\",\"{}\")",
        url.replace('"', "\"\""),
        name.replace('"', "\"\"")
    )
}

/// Recover `(url, name)` from a hyperlink formula written by [`hyperlink_formula`].
pub fn parse_hyperlink(payload: &str) -> Option<(String, String)> {
    let caps = hyperlink_regex().captures(payload.trim())?;
    let url = caps.get(1)?.as_str().replace("\"\"", "\"");
    let name = caps.get(2)?.as_str().replace("\"\"", "\"");
    if url.trim().is_empty() {
        return None;
    }
    Some((url, name))
}

/// Number of a `Person N` header, if the label is one.
pub fn person_column_number(label: &str) -> Option<u32> {
    let caps = person_label_regex().captures(label.trim())?;
    caps.get(1)?.as_str().parse().ok()
}

pub fn person_column_label(number: u32) -> String {
    format!("{}{}", PERSON_COLUMN_PREFIX, number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hyperlink_formula_escapes_quotes() {
        let formula = hyperlink_formula("https://linkedin.com/in/x", "Jo \"JJ\" Smith");
        assert_eq!(
            formula,
            r#"=HYPERLINK("https://linkedin.com/in/x","Jo ""JJ"" Smith")"#
        );
        let (url, name) = parse_hyperlink(&formula).unwrap();
        assert_eq!(url, "https://linkedin.com/in/x");
        assert_eq!(name, "Jo \"JJ\" Smith");
    }

    #[test]
    fn test_parse_hyperlink_tolerates_locale_separator() {
        let (url, name) = parse_hyperlink(r#"=hyperlink("https://a/in/b"; "B")"#).unwrap();
        assert_eq!(url, "https://a/in/b");
        assert_eq!(name, "B");
    }

    #[test]
    fn test_parse_hyperlink_rejects_plain_text() {
        assert!(parse_hyperlink("Jane Doe").is_none());
        assert!(parse_hyperlink("https://linkedin.com/in/jane").is_none());
        assert!(parse_hyperlink(r#"=HYPERLINK("","Nobody")"#).is_none());
    }

    #[test]
    fn test_person_column_number() {
        assert_eq!(person_column_number("Person 1"), Some(1));
        assert_eq!(person_column_number("Person 12 "), Some(12));
        assert_eq!(person_column_number("Person 007"), Some(7));
        assert_eq!(person_column_number("Person"), None);
        assert_eq!(person_column_number("Person x"), None);
        assert_eq!(person_column_number("Comments"), None);
        assert_eq!(person_column_label(4), "Person 4");
    }
}
