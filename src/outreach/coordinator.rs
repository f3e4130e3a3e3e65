//! Per-company outreach loop.
//!
//! For each company in order:
//! - non-empty status: skip, no reads or writes beyond the initial one
//! - search; a failed or empty search moves on without touching the row
//! - per candidate, until the cap: re-read the row for dedup, resolve the
//!   employer, render the note, connect
//! - `Sent` records the person, `ActionFailed` marks the row `Error: ...`
//!   and abandons the company
//! - after at least one send, mark `Completed` unless the status changed
//!
//! Store failures are logged and never stop the run.

use std::sync::Arc;

use super::delay::{DelayPolicy, RandomDelay};
use super::note::NoteTemplate;
use super::report::{CompanyOutcome, Disposition, RunReport};
use super::{PersonFinder, ProfileScraper, SpreadsheetStore};
use crate::error::ErrorSummary;
use crate::types::{Candidate, Company, CompanyStatus, Config, ConnectOutcome};

pub struct OutreachCoordinator {
    store: Arc<dyn SpreadsheetStore>,
    finder: Arc<dyn PersonFinder>,
    scraper: Arc<dyn ProfileScraper>,
    request_delay: Box<dyn DelayPolicy>,
    company_delay: Box<dyn DelayPolicy>,
    max_connections: usize,
    note: NoteTemplate,
}

impl OutreachCoordinator {
    pub fn new(
        config: &Config,
        store: Arc<dyn SpreadsheetStore>,
        finder: Arc<dyn PersonFinder>,
        scraper: Arc<dyn ProfileScraper>,
    ) -> Self {
        Self {
            store,
            finder,
            scraper,
            request_delay: Box::new(RandomDelay::from_bounds(config.delay_between_requests)),
            company_delay: Box::new(RandomDelay::from_bounds(config.delay_between_companies)),
            max_connections: config.max_connections_per_company,
            note: NoteTemplate::new(config.connection_message_template.clone()),
        }
    }

    /// Replace both pause policies.
    pub fn with_delays(
        mut self,
        request_delay: impl DelayPolicy + 'static,
        company_delay: impl DelayPolicy + 'static,
    ) -> Self {
        self.request_delay = Box::new(request_delay);
        self.company_delay = Box::new(company_delay);
        self
    }

    /// Read every company from the store and run over them.
    pub async fn run_all(&self) -> Result<RunReport, crate::sheet::SheetError> {
        let companies = self.store.get_all_companies().await?;
        log::info!("Outreach run: {} companies in workbook", companies.len());
        Ok(self.run(&companies).await)
    }

    /// Process `companies` in order. Never fails; see the report for results.
    pub async fn run(&self, companies: &[Company]) -> RunReport {
        let mut report = RunReport::new();
        if self.note.is_empty() {
            log::warn!("Outreach run: connection message template is empty");
        }

        for (idx, company) in companies.iter().enumerate() {
            let outcome = self.process_company(company).await;
            let processed = !outcome.is_skipped();
            report.push(outcome);

            if processed && idx + 1 < companies.len() {
                pause(self.company_delay.as_ref(), "next company").await;
            }
        }

        report.finish();
        log::info!(
            "Outreach run {} finished: {} connection requests sent",
            report.run_id,
            report.total_sent()
        );
        report
    }

    async fn process_company(&self, company: &Company) -> CompanyOutcome {
        if !company.status.is_pending() {
            log::info!(
                "Skipping company {} ({}): status is '{}'",
                company.id,
                company.name,
                company.status.as_cell()
            );
            return CompanyOutcome::new(&company.id, &company.name, Disposition::Skipped);
        }

        log::info!("Processing company {} ({})", company.id, company.name);

        let candidates = match self.finder.search(&company.name).await {
            Ok(found) if found.is_empty() => {
                log::info!("No candidates found for company {}", company.id);
                return CompanyOutcome::new(&company.id, &company.name, Disposition::NoCandidates);
            }
            Ok(found) => found,
            Err(e) => {
                log::warn!("Search failed for company {}: {}", company.id, e);
                let mut outcome =
                    CompanyOutcome::new(&company.id, &company.name, Disposition::NoCandidates);
                outcome.search_error = Some(ErrorSummary::from(&e));
                return outcome;
            }
        };
        log::info!(
            "Found {} candidates for company {}",
            candidates.len(),
            company.id
        );

        let mut sent = 0usize;
        for mut candidate in candidates {
            if sent >= self.max_connections {
                log::info!(
                    "Reached {} connection requests for company {}",
                    self.max_connections,
                    company.id
                );
                break;
            }

            if self.already_contacted(&company.id, &candidate).await {
                continue;
            }

            match self.attempt(&mut candidate).await {
                ConnectOutcome::Sent => {
                    sent += 1;
                    log::info!(
                        "Sent connection request to {} for company {}",
                        candidate.name,
                        company.id
                    );
                    if let Err(e) = self
                        .store
                        .append_person(&company.id, &candidate.name, &candidate.profile_reference)
                        .await
                    {
                        log::error!(
                            "Failed to record {} against company {}: {}",
                            candidate.name,
                            company.id,
                            e
                        );
                    }
                    pause(self.request_delay.as_ref(), "next request").await;
                }
                ConnectOutcome::AlreadyConnected => {
                    log::info!(
                        "Already connected to {} for company {}",
                        candidate.name,
                        company.id
                    );
                }
                ConnectOutcome::EmployerUnknown => {
                    log::info!(
                        "Could not confirm employer of {} for company {}",
                        candidate.name,
                        company.id
                    );
                }
                ConnectOutcome::ActionFailed(reason) => {
                    self.record_failure(company, &candidate, &reason).await;
                    let mut outcome = CompanyOutcome::new(
                        &company.id,
                        &company.name,
                        Disposition::Failed { reason },
                    );
                    outcome.sent = sent;
                    return outcome;
                }
            }
        }

        let disposition = if sent == 0 {
            log::info!("No connection requests sent for company {}", company.id);
            Disposition::NoneSent
        } else {
            self.mark_completed(company, sent).await
        };

        let mut outcome = CompanyOutcome::new(&company.id, &company.name, disposition);
        outcome.sent = sent;
        outcome
    }

    /// Re-read the row and check whether `candidate` is already recorded.
    ///
    /// A failed read is logged and treated as "not contacted".
    async fn already_contacted(&self, company_id: &str, candidate: &Candidate) -> bool {
        match self.store.get_company(company_id).await {
            Ok(Some(current)) if current.has_contacted(&candidate.profile_reference) => {
                log::info!(
                    "Already contacted {} for company {}, skipping",
                    candidate.name,
                    company_id
                );
                true
            }
            Ok(_) => false,
            Err(e) => {
                log::warn!(
                    "Could not check existing contacts for company {}: {}",
                    company_id,
                    e
                );
                false
            }
        }
    }

    async fn attempt(&self, candidate: &mut Candidate) -> ConnectOutcome {
        let employer = match self
            .scraper
            .resolve_employer(&candidate.profile_reference)
            .await
        {
            Ok(Some(employer)) => employer,
            Ok(None) => return ConnectOutcome::EmployerUnknown,
            Err(e) => {
                log::warn!("Employer lookup failed for {}: {}", candidate.name, e);
                return ConnectOutcome::EmployerUnknown;
            }
        };
        candidate.company = employer;

        let note = self.note.render(candidate);
        match self
            .scraper
            .connect(&candidate.profile_reference, &note)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => ConnectOutcome::ActionFailed(e.to_string()),
        }
    }

    async fn record_failure(&self, company: &Company, candidate: &Candidate, reason: &str) {
        log::error!(
            "Connection request to {} failed for company {}: {}",
            candidate.name,
            company.id,
            reason
        );
        let comments = format!(
            "Failed to send connection request to {}: {}",
            candidate.name, reason
        );
        if let Err(e) = self
            .store
            .update_status(&company.id, &CompanyStatus::error(reason), Some(&comments))
            .await
        {
            log::error!("Failed to record error for company {}: {}", company.id, e);
        }
    }

    /// Write `Completed` if the status is still empty.
    async fn mark_completed(&self, company: &Company, sent: usize) -> Disposition {
        let current = match self.store.get_company(&company.id).await {
            Ok(Some(current)) => current,
            Ok(None) => {
                log::warn!("Company {} disappeared before completion", company.id);
                return Disposition::Unrecorded;
            }
            Err(e) => {
                log::error!("Failed to re-read company {}: {}", company.id, e);
                return Disposition::Unrecorded;
            }
        };

        if !current.status.is_pending() {
            log::info!(
                "Company {} status changed to '{}' during the run, leaving it",
                company.id,
                current.status.as_cell()
            );
            return Disposition::StatusChanged;
        }

        let comments = format!("Successfully sent {} connection requests", sent);
        match self
            .store
            .update_status(&company.id, &CompanyStatus::Completed, Some(&comments))
            .await
        {
            Ok(()) => {
                log::info!("Company {} completed: {}", company.id, comments);
                Disposition::Completed
            }
            Err(e) => {
                log::error!("Failed to mark company {} completed: {}", company.id, e);
                Disposition::Unrecorded
            }
        }
    }
}

async fn pause(policy: &dyn DelayPolicy, before: &str) {
    let delay = policy.next_delay();
    if delay.is_zero() {
        return;
    }
    log::debug!("Waiting {:.1}s before {}", delay.as_secs_f64(), before);
    tokio::time::sleep(delay).await;
}
