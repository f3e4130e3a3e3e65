//! Outreach workflow: per-company search, dedup, connect, and status tracking.
//!
//! The coordinator only talks to its collaborators through the traits below,
//! so the workbook, the people search and the profile actions can each be
//! swapped (command bridge in production, fakes in tests).
//!
//! Modules:
//! - coordinator: the per-company policy loop
//! - delay: randomized pause policies
//! - filters: role and employer heuristics applied to scraped text
//! - note: connection note templating
//! - report: run outcome report

pub mod coordinator;
pub mod delay;
pub mod filters;
pub mod note;
pub mod report;

use async_trait::async_trait;

use crate::error::CollaboratorError;
use crate::sheet::SheetError;
use crate::types::{Candidate, Company, CompanyStatus, ConnectOutcome, PersonEntry};

pub use coordinator::OutreachCoordinator;
pub use delay::{DelayPolicy, FixedDelay, NoDelay, RandomDelay};
pub use note::NoteTemplate;
pub use report::{CompanyOutcome, Disposition, RunReport};

/// Durable company rows: status, comments, and contacted people.
#[async_trait]
pub trait SpreadsheetStore: Send + Sync {
    /// Full read of every company row.
    async fn get_all_companies(&self) -> Result<Vec<Company>, SheetError>;

    async fn get_company(&self, company_id: &str) -> Result<Option<Company>, SheetError>;

    /// Write the status cell, and the comments cell when `comments` is given.
    async fn update_status(
        &self,
        company_id: &str,
        status: &CompanyStatus,
        comments: Option<&str>,
    ) -> Result<(), SheetError>;

    /// Allocate (or reuse) a `Person N` column and write the person's cell.
    async fn append_person(
        &self,
        company_id: &str,
        display_name: &str,
        profile_reference: &str,
    ) -> Result<PersonEntry, SheetError>;

    /// Write base headers if the header row is empty.
    async fn initialize_headers(&self) -> Result<bool, SheetError>;
}

/// People search for a company. Results are bounded and role-filtered.
#[async_trait]
pub trait PersonFinder: Send + Sync {
    async fn search(&self, company_name: &str) -> Result<Vec<Candidate>, CollaboratorError>;
}

/// Profile page actions.
#[async_trait]
pub trait ProfileScraper: Send + Sync {
    /// Current employer shown on the profile, `None` when it cannot be read.
    async fn resolve_employer(
        &self,
        profile_reference: &str,
    ) -> Result<Option<String>, CollaboratorError>;

    /// Send a connection request with `note` attached.
    async fn connect(
        &self,
        profile_reference: &str,
        note: &str,
    ) -> Result<ConnectOutcome, CollaboratorError>;
}
