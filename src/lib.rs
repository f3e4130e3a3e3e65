//! LinkedIn outreach over a company workbook.
//!
//! Reads companies from a workbook, finds product people at each one through
//! a browser helper, sends connection requests with a templated note, and
//! records who was contacted and how each company ended up.

pub mod bridge;
pub mod cli;
pub mod error;
pub mod outreach;
pub mod sheet;
pub mod state;
pub mod types;
pub mod util;
