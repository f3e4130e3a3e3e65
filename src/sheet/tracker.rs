//! Company tracker schema over a sheet backend.
//!
//! Layout: `Company ID | Company Name | Status | Comments | Person 1 | Person 2 | ...`
//!
//! Person columns are shared by every row: the header row is global state,
//! so allocation always re-reads it instead of caching the next index.

use async_trait::async_trait;

use super::cell::{hyperlink_formula, person_column_label, person_column_number};
use super::{SheetBackend, SheetError};
use crate::outreach::SpreadsheetStore;
use crate::types::{Company, CompanyStatus, PersonEntry};

pub const BASE_COLUMNS: [&str; 4] = ["Company ID", "Company Name", "Status", "Comments"];

const ID_COL: usize = 1;
const STATUS_COL: usize = 3;
const COMMENTS_COL: usize = 4;
const HEADER_ROW: usize = 1;

pub struct CompanyTracker<B> {
    backend: B,
}

impl<B: SheetBackend> CompanyTracker<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Write the base headers if the header row is empty.
    ///
    /// Returns `true` when headers were written.
    pub fn initialize_spreadsheet(&self) -> Result<bool, SheetError> {
        let first_row = self.backend.row_values(HEADER_ROW)?;
        if !first_row.is_empty() {
            log::info!("Workbook already has headers");
            return Ok(false);
        }
        let headers: Vec<String> = BASE_COLUMNS.iter().map(|h| h.to_string()).collect();
        self.backend.update_row(HEADER_ROW, &headers)?;
        log::info!("Initialized workbook with base headers");
        Ok(true)
    }

    /// Look up one company by id.
    pub fn get_company_row(&self, company_id: &str) -> Result<Option<Company>, SheetError> {
        let all_data = self.backend.get_all_values()?;
        let Some((headers, rows)) = all_data.split_first() else {
            return Ok(None);
        };

        for (idx, row) in rows.iter().enumerate() {
            if row.first().map(String::as_str) == Some(company_id) {
                let company = company_from_row(idx + 2, headers, row);
                log::debug!("Found company {} at row {}", company_id, company.row_number);
                return Ok(Some(company));
            }
        }

        log::info!("Company {} not found", company_id);
        Ok(None)
    }

    /// Every row with a non-empty Company ID, in sheet order.
    pub fn get_all_companies(&self) -> Result<Vec<Company>, SheetError> {
        let all_data = self.backend.get_all_values()?;
        if all_data.len() < 2 {
            return Ok(Vec::new());
        }
        let headers = &all_data[0];

        let companies: Vec<Company> = all_data[1..]
            .iter()
            .enumerate()
            .filter(|(_, row)| row.first().is_some_and(|id| !id.is_empty()))
            .map(|(idx, row)| company_from_row(idx + 2, headers, row))
            .collect();

        log::info!("Retrieved {} companies", companies.len());
        Ok(companies)
    }

    pub fn update_company_status(
        &self,
        company_id: &str,
        status: &str,
        comments: Option<&str>,
    ) -> Result<(), SheetError> {
        let company = self
            .get_company_row(company_id)?
            .ok_or_else(|| SheetError::CompanyNotFound(company_id.to_string()))?;

        self.backend.update_cell(company.row_number, STATUS_COL, status)?;
        if let Some(comments) = comments {
            self.backend.update_cell(company.row_number, COMMENTS_COL, comments)?;
        }

        log::info!("Updated company {} status to {:?}", company_id, status);
        Ok(())
    }

    /// Label the next person column would get: `max(Person N) + 1`, or 1.
    pub fn next_person_column(&self) -> Result<String, SheetError> {
        let headers = self.backend.row_values(HEADER_ROW)?;
        let next = match headers.iter().filter_map(|h| person_column_number(h)).max() {
            Some(n) => n
                .checked_add(1)
                .ok_or(SheetError::PersonColumnsExhausted(n))?,
            None => 1,
        };
        Ok(person_column_label(next))
    }

    /// Claim a person column: compute the next label, then re-read the
    /// header and reuse the column if another writer created it meanwhile.
    ///
    /// Returns `(label, 1-indexed column)`.
    pub fn allocate_person_column(&self) -> Result<(String, usize), SheetError> {
        let label = self.next_person_column()?;
        let headers = self.backend.row_values(HEADER_ROW)?;

        if let Some(idx) = headers.iter().position(|h| h.trim() == label) {
            return Ok((label, idx + 1));
        }

        let col = headers.len().max(BASE_COLUMNS.len()) + 1;
        self.backend.update_cell(HEADER_ROW, col, &label)?;
        log::info!("Allocated person column {} at index {}", label, col);
        Ok((label, col))
    }

    /// Record a contacted person against a company as a hyperlink cell.
    pub fn add_person_to_company(
        &self,
        company_id: &str,
        person_name: &str,
        profile_url: &str,
    ) -> Result<PersonEntry, SheetError> {
        let company = self
            .get_company_row(company_id)?
            .ok_or_else(|| SheetError::CompanyNotFound(company_id.to_string()))?;

        let (label, col) = self.allocate_person_column()?;
        let payload = hyperlink_formula(profile_url, person_name);
        self.backend.update_cell(company.row_number, col, &payload)?;

        log::info!(
            "Added {} to company {} in column {}",
            person_name,
            company_id,
            label
        );
        Ok(PersonEntry::from_cell(&label, &payload))
    }

    /// Append a new company row. Ids must be unique.
    pub fn add_company(&self, company_id: &str, company_name: &str) -> Result<usize, SheetError> {
        if self.get_company_row(company_id)?.is_some() {
            return Err(SheetError::DuplicateCompany(company_id.to_string()));
        }
        self.initialize_spreadsheet()?;
        let row = self
            .backend
            .append_row(&[company_id.to_string(), company_name.to_string()])?;
        log::info!("Added company {} ({}) at row {}", company_id, company_name, row);
        Ok(row)
    }

    /// Clear status and comments so the next run picks the company up again.
    pub fn reset_company(&self, company_id: &str) -> Result<(), SheetError> {
        self.update_company_status(company_id, "", Some(""))
    }
}

fn company_from_row(row_number: usize, headers: &[String], row: &[String]) -> Company {
    let field = |col: usize| row.get(col - 1).cloned().unwrap_or_default();

    let people = row
        .iter()
        .enumerate()
        .skip(BASE_COLUMNS.len())
        .filter(|(idx, value)| *idx < headers.len() && !value.is_empty())
        .map(|(idx, value)| PersonEntry::from_cell(&headers[idx], value))
        .collect();

    Company {
        row_number,
        id: field(ID_COL),
        name: field(2),
        status: CompanyStatus::parse(&field(STATUS_COL)),
        comments: field(COMMENTS_COL),
        people,
    }
}

#[async_trait]
impl<B: SheetBackend> SpreadsheetStore for CompanyTracker<B> {
    async fn get_all_companies(&self) -> Result<Vec<Company>, SheetError> {
        CompanyTracker::get_all_companies(self)
    }

    async fn get_company(&self, company_id: &str) -> Result<Option<Company>, SheetError> {
        self.get_company_row(company_id)
    }

    async fn update_status(
        &self,
        company_id: &str,
        status: &CompanyStatus,
        comments: Option<&str>,
    ) -> Result<(), SheetError> {
        self.update_company_status(company_id, &status.as_cell(), comments)
    }

    async fn append_person(
        &self,
        company_id: &str,
        display_name: &str,
        profile_reference: &str,
    ) -> Result<PersonEntry, SheetError> {
        self.add_person_to_company(company_id, display_name, profile_reference)
    }

    async fn initialize_headers(&self) -> Result<bool, SheetError> {
        self.initialize_spreadsheet()
    }
}
