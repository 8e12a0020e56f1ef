//! library-admin - Library Lending Database Administration
//!
//! An interactive tool over a `PostgreSQL` database of books, authors, genres,
//! readers, copies and loans. It runs a fixed set of reports and two
//! transactional operations (issuing and returning loans), and demonstrates
//! SQL-injection attacks next to their parameterized fixes.
//!
//! # Principles
//! - Every user value is bound as a statement parameter; only the injection
//!   demos splice text, and they never write
//! - Ad-hoc SQL must be a single read-only statement
//! - Multi-step operations run in one transaction each
//! - Logs go to stderr; stdout carries results (text or JSON envelopes)
//!
//! # Module Organization
//! - [`error`] - Error types and codes
//! - [`config`] - Connection settings resolution
//! - [`engine`] - Connection, retry and result conversion
//! - [`library`] - The data-access object and all operations
//! - [`guard`] - Read-only validation and injection markers
//! - [`injection`] - The injection demonstrations
//! - [`action`] - Operations as values, run and printed
//! - [`render`] - Record-style text output
//! - [`output`] - JSON envelopes
//! - [`menu`] - Interactive menu

pub mod action;
pub mod config;
pub mod engine;
pub mod error;
pub mod guard;
pub mod injection;
pub mod library;
pub mod menu;
pub mod output;
pub mod render;

// Re-export commonly used types for convenience
pub use action::{execute_and_print, Action, Outcome, OutputFormat};
pub use config::{resolve_settings, ConnectionOverrides, Settings};
pub use engine::{ConnectionConfig, QueryResult, RetryPolicy};
pub use error::{LibraryError, Result};
pub use guard::{injection_markers, validate_read_only, InjectionMarker};
pub use injection::{InjectionDemo, InjectionReport, DEMOS};
pub use library::{
    AddedBook, CopyStatus, IssueOutcome, LibraryDb, NewBook, NewReader, ReaderStatus,
    ReturnOutcome,
};
pub use output::{ErrorEnvelope, ErrorInfo, Metadata, SuccessEnvelope};
