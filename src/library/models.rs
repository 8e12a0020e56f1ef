//! Row-level enumerations, operation inputs and transactional outcomes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::engine::QueryResult;
use crate::error::{LibraryError, Result};

/// `copies.status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyStatus {
    InStock,
    Loaned,
}

impl CopyStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InStock => "in_stock",
            Self::Loaned => "loaned",
        }
    }
}

impl fmt::Display for CopyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `readers.status`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReaderStatus {
    #[default]
    Active,
    Inactive,
}

impl ReaderStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    /// Blank input means the default (`active`)
    pub fn parse_or_default(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            Ok(Self::default())
        } else {
            trimmed.parse()
        }
    }
}

impl FromStr for ReaderStatus {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(LibraryError::invalid_input(format!(
                "reader status must be 'active' or 'inactive', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ReaderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input for adding a reader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReader {
    pub full_name: String,
    pub group: Option<String>,
    pub email: Option<String>,
    pub status: ReaderStatus,
}

impl NewReader {
    /// Build from raw prompt answers; blank optional answers become `None`
    pub fn from_answers(full_name: &str, group: &str, email: &str, status: &str) -> Result<Self> {
        let full_name = full_name.trim();
        if full_name.is_empty() {
            return Err(LibraryError::invalid_input("reader full name cannot be empty"));
        }

        Ok(Self {
            full_name: full_name.to_string(),
            group: non_blank(group),
            email: non_blank(email),
            status: ReaderStatus::parse_or_default(status)?,
        })
    }
}

/// Input for adding a book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub genre_id: i32,
    pub isbn: Option<String>,
    pub published_year: Option<i32>,
    pub language: Option<String>,
    pub is_reference: bool,
}

impl NewBook {
    /// Build from raw prompt answers
    pub fn from_answers(
        title: &str,
        genre_id: i32,
        isbn: &str,
        year: &str,
        language: &str,
        is_reference: &str,
    ) -> Result<Self> {
        let title = title.trim();
        if title.is_empty() {
            return Err(LibraryError::invalid_input("book title cannot be empty"));
        }

        Ok(Self {
            title: title.to_string(),
            genre_id,
            isbn: non_blank(isbn),
            published_year: parse_optional_year(year)?,
            language: non_blank(language),
            is_reference: parse_yes(is_reference),
        })
    }
}

/// `book_id` and title of a freshly inserted book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddedBook {
    pub book_id: i32,
    pub title: String,
}

/// Result of closing a loan
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReturnOutcome {
    /// No open loan with that id
    NotFound { loan_id: i32 },
    /// Loan closed and copy back in stock; `details` is the closed loan row
    Returned { loan_id: i32, copy_id: i32, details: QueryResult },
}

/// Result of issuing a loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IssueOutcome {
    CopyNotFound { copy_id: i32 },
    /// Copy exists but is not `in_stock`
    CopyUnavailable { copy_id: i32, status: String },
    Issued { loan_id: i32, copy_id: i32, title: String },
}

/// Blank input becomes `None`, anything else is trimmed
#[must_use]
pub fn non_blank(input: &str) -> Option<String> {
    let trimmed = input.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Reference-book answer: `да`, `Да`, `yes` and `y` mean true
#[must_use]
pub fn parse_yes(input: &str) -> bool {
    matches!(input.trim(), "да" | "Да" | "yes" | "y")
}

/// Blank means unknown year
pub fn parse_optional_year(input: &str) -> Result<Option<i32>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<i32>()
        .map(Some)
        .map_err(|_| {
            LibraryError::invalid_input(format!(
                "publication year must be a number, got '{trimmed}'"
            ))
        })
}

/// Due dates are entered as `YYYY-MM-DD`
pub fn parse_due_date(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| {
        LibraryError::invalid_input(format!("due date must be YYYY-MM-DD, got '{trimmed}'"))
    })
}
