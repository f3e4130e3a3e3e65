//! What a run did, company by company.

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;

use crate::error::ErrorSummary;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Disposition {
    /// Status was already set when the run reached the company.
    Skipped,
    /// Search failed or returned nobody.
    NoCandidates,
    /// Candidates were tried but none was sent.
    NoneSent,
    Completed,
    /// At least one send, then the status turned non-empty before completion.
    StatusChanged,
    /// At least one send, but the completion write could not be made.
    Unrecorded,
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyOutcome {
    pub company_id: String,
    pub company_name: String,
    pub sent: usize,
    pub disposition: Disposition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_error: Option<ErrorSummary>,
}

impl CompanyOutcome {
    pub fn new(company_id: &str, company_name: &str, disposition: Disposition) -> Self {
        Self {
            company_id: company_id.to_string(),
            company_name: company_name.to_string(),
            sent: 0,
            disposition,
            search_error: None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.disposition == Disposition::Skipped
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: String,
    pub started_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
    pub outcomes: Vec<CompanyOutcome>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at: Utc::now().to_rfc3339(),
            finished_at: None,
            outcomes: Vec::new(),
        }
    }

    pub fn push(&mut self, outcome: CompanyOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now().to_rfc3339());
    }

    /// Connections sent per processed company. Skipped companies are absent.
    pub fn sent_counts(&self) -> HashMap<String, usize> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_skipped())
            .map(|o| (o.company_id.clone(), o.sent))
            .collect()
    }

    pub fn total_sent(&self) -> usize {
        self.outcomes.iter().map(|o| o.sent).sum()
    }

    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string_pretty(self).map_err(|e| format!("Failed to serialize report: {}", e))
    }
}
