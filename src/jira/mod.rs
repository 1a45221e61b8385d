//! Issue-tracker export: saved filters, field definitions and issue lists.
//!
//! [`JiraClient`] talks to the REST API; [`export`] turns search results
//! into a spreadsheet-friendly CSV and [`select`] lets the operator pick a
//! saved filter interactively.

pub mod client;
pub mod export;
pub mod select;

pub use client::{JiraClient, JiraUser, SavedFilter};
pub use export::{IssueRow, export_issues_csv, render_field, write_fields_dump};
pub use select::select_filter;
