use serde::{Deserialize, Serialize};

use crate::sheet::cell;

/// Configuration stored in ~/.outreach/config.json
///
/// Accepts both camelCase keys and the snake_case keys written by the older
/// tooling (`max_connections_per_company`, `delay_between_requests`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(
        default = "default_max_connections",
        alias = "max_connections_per_company"
    )]
    pub max_connections_per_company: usize,
    #[serde(default, alias = "connection_message_template")]
    pub connection_message_template: String,
    /// Pause after each sent request, in seconds (min, max).
    #[serde(default = "default_request_delay", alias = "delay_between_requests")]
    pub delay_between_requests: (f64, f64),
    /// Pause after each processed company, in seconds (min, max).
    #[serde(default = "default_company_delay", alias = "delay_between_companies")]
    pub delay_between_companies: (f64, f64),
    /// Browser visibility, passed through to the helper.
    #[serde(default)]
    pub headless: bool,
    /// Page-settle pause in seconds, passed through to the helper.
    #[serde(default = "default_waiting_time", alias = "waiting_time")]
    pub waiting_time: u64,
    #[serde(default = "default_search_keywords", alias = "search_keywords")]
    pub search_keywords: String,
    #[serde(default = "default_max_search_results", alias = "max_search_results")]
    pub max_search_results: usize,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "workbook_path")]
    pub workbook_path: Option<String>,
    #[serde(default)]
    pub bridge: BridgeConfig,
}

fn default_max_connections() -> usize {
    3
}

fn default_request_delay() -> (f64, f64) {
    (5.0, 10.0)
}

fn default_company_delay() -> (f64, f64) {
    (10.0, 20.0)
}

fn default_waiting_time() -> u64 {
    3
}

fn default_search_keywords() -> String {
    "product".to_string()
}

fn default_max_search_results() -> usize {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_connections_per_company: default_max_connections(),
            connection_message_template: String::new(),
            delay_between_requests: default_request_delay(),
            delay_between_companies: default_company_delay(),
            headless: false,
            waiting_time: default_waiting_time(),
            search_keywords: default_search_keywords(),
            max_search_results: default_max_search_results(),
            workbook_path: None,
            bridge: BridgeConfig::default(),
        }
    }
}

/// External browser helper invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
    #[serde(default = "default_bridge_command")]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_bridge_timeout", alias = "timeout_secs")]
    pub timeout_secs: u64,
}

fn default_bridge_command() -> String {
    "outreach-browser".to_string()
}

fn default_bridge_timeout() -> u64 {
    120
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            command: default_bridge_command(),
            args: Vec::new(),
            timeout_secs: default_bridge_timeout(),
        }
    }
}

// =============================================================================
// Companies
// =============================================================================

/// Outreach status of a company row.
///
/// Anything other than `Pending` means "already handled" to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "detail")]
pub enum CompanyStatus {
    Pending,
    InProgress,
    Completed,
    Error(String),
    Other(String),
}

pub const STATUS_IN_PROGRESS: &str = "In Progress";
pub const STATUS_COMPLETED: &str = "Completed";
const ERROR_PREFIX: &str = "Error";

impl CompanyStatus {
    pub fn parse(cell: &str) -> Self {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            return CompanyStatus::Pending;
        }
        if trimmed == STATUS_IN_PROGRESS {
            return CompanyStatus::InProgress;
        }
        if trimmed == STATUS_COMPLETED {
            return CompanyStatus::Completed;
        }
        if let Some(rest) = trimmed.strip_prefix(ERROR_PREFIX) {
            if rest.is_empty() {
                return CompanyStatus::Error(String::new());
            }
            if let Some(message) = rest.strip_prefix(':') {
                return CompanyStatus::Error(message.trim().to_string());
            }
        }
        CompanyStatus::Other(trimmed.to_string())
    }

    pub fn error(reason: &str) -> Self {
        CompanyStatus::Error(reason.trim().to_string())
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, CompanyStatus::Pending)
    }

    /// Text written into the Status column.
    pub fn as_cell(&self) -> String {
        match self {
            CompanyStatus::Pending => String::new(),
            CompanyStatus::InProgress => STATUS_IN_PROGRESS.to_string(),
            CompanyStatus::Completed => STATUS_COMPLETED.to_string(),
            CompanyStatus::Error(message) if message.is_empty() => ERROR_PREFIX.to_string(),
            CompanyStatus::Error(message) => format!("{}: {}", ERROR_PREFIX, message),
            CompanyStatus::Other(raw) => raw.clone(),
        }
    }
}

/// A person already recorded against a company, parsed from its cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonEntry {
    /// Header label of the column, e.g. "Person 3".
    pub column: String,
    /// Raw cell payload as stored.
    pub payload: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl PersonEntry {
    pub fn from_cell(column: &str, payload: &str) -> Self {
        let (profile_reference, display_name) = match cell::parse_hyperlink(payload) {
            Some((url, name)) => (Some(normalize_profile_reference(&url)), Some(name)),
            None => (None, None),
        };
        Self {
            column: column.to_string(),
            payload: payload.to_string(),
            profile_reference,
            display_name,
        }
    }

    /// Whether this entry records the given profile.
    ///
    /// Structured entries compare [`profile_key`]s, so an absolute URL and
    /// a relative `/in/<slug>` href name the same person. Cells that are not
    /// hyperlink formulas fall back to substring matching.
    pub fn refers_to(&self, profile_reference: &str) -> bool {
        let wanted = normalize_profile_reference(profile_reference);
        if wanted.is_empty() {
            return false;
        }
        match &self.profile_reference {
            Some(stored) => {
                let key = profile_key(&wanted);
                !key.is_empty() && profile_key(stored) == key
            }
            None => {
                self.payload.contains(profile_reference.trim()) || self.payload.contains(&wanted)
            }
        }
    }
}

/// One company row as read from the workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    /// 1-indexed sheet row holding this company.
    pub row_number: usize,
    pub id: String,
    pub name: String,
    pub status: CompanyStatus,
    pub comments: String,
    pub people: Vec<PersonEntry>,
}

impl Company {
    pub fn has_contacted(&self, profile_reference: &str) -> bool {
        self.people.iter().any(|p| p.refers_to(profile_reference))
    }
}

// =============================================================================
// People
// =============================================================================

/// A person found by search; transient until recorded against a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub name: String,
    #[serde(default)]
    pub title: String,
    /// Employer label. Starts as the searched company, replaced by the
    /// employer read from the profile.
    #[serde(default)]
    pub company: String,
    #[serde(alias = "profile_url", alias = "profileUrl")]
    pub profile_reference: String,
}

impl Candidate {
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("")
    }
}

/// Result of one connect attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    Sent,
    AlreadyConnected,
    EmployerUnknown,
    ActionFailed(String),
}

/// Canonical form of a profile reference used for deduplication.
///
/// URLs lose their query string, fragment and trailing slash; anything else
/// is only trimmed.
pub fn normalize_profile_reference(reference: &str) -> String {
    let trimmed = reference.trim();
    match url::Url::parse(trimmed) {
        Ok(mut parsed) if parsed.has_host() => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            parsed.as_str().trim_end_matches('/').to_string()
        }
        _ => trimmed.trim_end_matches('/').to_string(),
    }
}

/// Host-less, lowercased profile path used to compare references.
///
/// `https://www.linkedin.com/in/Ann/?trk=x`, `www.linkedin.com/in/ann` and
/// `/in/ann` all map to `/in/ann`. A bare host or root maps to "".
pub fn profile_key(reference: &str) -> String {
    let trimmed = reference.trim();
    let path = match url::Url::parse(trimmed) {
        Ok(parsed) if parsed.has_host() => parsed.path().to_string(),
        _ => {
            let without_query = trimmed
                .split(|c| c == '?' || c == '#')
                .next()
                .unwrap_or("");
            strip_bare_host(without_query).to_string()
        }
    };

    let path = path.trim_matches('/');
    if path.is_empty() {
        return String::new();
    }
    format!("/{}", path.to_lowercase())
}

/// Drop a leading `host.tld` segment from a scheme-less reference.
fn strip_bare_host(reference: &str) -> &str {
    if reference.starts_with('/') {
        return reference;
    }
    match reference.split_once('/') {
        Some((first, rest)) if first.contains('.') => rest,
        None if reference.contains('.') => "",
        _ => reference,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_accepts_snake_case_keys() {
        let json = r#"{
            "max_connections_per_company": 2,
            "connection_message_template": "Hi {name}, saw your work at {company}.",
            "delay_between_requests": [5, 10],
            "headless": true,
            "waiting_time": 4
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.max_connections_per_company, 2);
        assert_eq!(config.delay_between_requests, (5.0, 10.0));
        assert_eq!(config.delay_between_companies, (10.0, 20.0));
        assert!(config.headless);
        assert_eq!(config.waiting_time, 4);
        assert_eq!(config.search_keywords, "product");
        assert_eq!(config.bridge.command, "outreach-browser");
    }

    #[test]
    fn test_config_camel_case_roundtrip() {
        let config = Config {
            max_connections_per_company: 5,
            ..Config::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"maxConnectionsPerCompany\":5"));
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.max_connections_per_company, 5);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(CompanyStatus::parse(""), CompanyStatus::Pending);
        assert_eq!(CompanyStatus::parse("   "), CompanyStatus::Pending);
        assert_eq!(CompanyStatus::parse("Completed"), CompanyStatus::Completed);
        assert_eq!(CompanyStatus::parse("In Progress"), CompanyStatus::InProgress);
        assert_eq!(
            CompanyStatus::parse("Error: no connect button"),
            CompanyStatus::Error("no connect button".to_string())
        );
        assert_eq!(CompanyStatus::parse("Error"), CompanyStatus::Error(String::new()));
        assert_eq!(
            CompanyStatus::parse("Errored out"),
            CompanyStatus::Other("Errored out".to_string())
        );
    }

    #[test]
    fn test_status_cell_text() {
        assert_eq!(CompanyStatus::Pending.as_cell(), "");
        assert_eq!(
            CompanyStatus::error("no connect button").as_cell(),
            "Error: no connect button"
        );
        assert_eq!(CompanyStatus::Completed.as_cell(), "Completed");
    }

    #[test]
    fn test_normalize_profile_reference() {
        assert_eq!(
            normalize_profile_reference("https://www.linkedin.com/in/jane-doe/?miniProfileUrn=x"),
            "https://www.linkedin.com/in/jane-doe"
        );
        assert_eq!(normalize_profile_reference(" /in/a/ "), "/in/a");
    }

    #[test]
    fn test_person_entry_structured_match_is_exact() {
        let entry = PersonEntry::from_cell(
            "Person 1",
            r#"=HYPERLINK("https://www.linkedin.com/in/ann","Ann")"#,
        );
        assert_eq!(entry.display_name.as_deref(), Some("Ann"));
        assert!(entry.refers_to("https://www.linkedin.com/in/ann/"));
        assert!(entry.refers_to("https://www.linkedin.com/in/ann?trk=search"));
        // A prefix of the stored reference is a different profile.
        assert!(!entry.refers_to("https://www.linkedin.com/in/an"));
    }

    #[test]
    fn test_profile_key() {
        assert_eq!(profile_key("https://www.linkedin.com/in/Ann/?trk=x#top"), "/in/ann");
        assert_eq!(profile_key("www.linkedin.com/in/ann"), "/in/ann");
        assert_eq!(profile_key(" /in/ann/ "), "/in/ann");
        assert_eq!(profile_key("in/ann"), "/in/ann");
        assert_eq!(profile_key("https://www.linkedin.com/"), "");
        assert_eq!(profile_key("www.linkedin.com"), "");
    }

    #[test]
    fn test_person_entry_absolute_url_matches_relative_href() {
        let entry = PersonEntry::from_cell(
            "Person 1",
            r#"=HYPERLINK("https://www.linkedin.com/in/a","A")"#,
        );
        assert!(entry.refers_to("/in/a"));
        assert!(entry.refers_to("/in/a/"));
        assert!(entry.refers_to("https://www.linkedin.com/in/a"));
        assert!(!entry.refers_to("/in/ab"));

        let relative = PersonEntry::from_cell("Person 2", r#"=HYPERLINK("/in/b","B")"#);
        assert!(relative.refers_to("https://www.linkedin.com/in/b?trk=people"));
    }

    #[test]
    fn test_person_entry_legacy_substring_match() {
        let entry = PersonEntry::from_cell("Person 2", "Bob - /in/bob");
        assert!(entry.profile_reference.is_none());
        assert!(entry.refers_to("/in/bob"));
        assert!(!entry.refers_to("/in/carol"));
        assert!(!entry.refers_to("  "));
    }

    #[test]
    fn test_candidate_first_name() {
        let candidate = Candidate {
            name: "Jane Q Doe".to_string(),
            title: String::new(),
            company: String::new(),
            profile_reference: "/in/jane".to_string(),
        };
        assert_eq!(candidate.first_name(), "Jane");
    }
}
