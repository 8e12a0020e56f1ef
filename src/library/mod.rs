//! The Library Data-Access Object
//!
//! [`LibraryDb`] owns the single database client for a session. Every
//! operation is one statement or one short transaction; user values are
//! always bound as parameters.
//!
//! # Operations
//! - Reports (this module): books by genre, multi-author books, author book
//!   counts, available copies, active and overdue loans, popular genres
//! - [`loans`]: return a loan with fine computation, issue a loan under a row lock
//! - [`readers`]: add a reader
//! - [`books`]: safe search and safe insert
//! - [`schema`]: table creation and sample data
//! - Ad-hoc read-only SQL, checked by [`crate::guard`]

use tokio_postgres::Client;
use tracing::info;

use crate::config::Settings;
use crate::engine::postgres::{commit, db_error_text, fetch};
use crate::engine::{connect_with_retry, QueryResult};
use crate::error::{LibraryError, Result};
use crate::guard::validate_read_only;

pub mod books;
pub mod loans;
pub mod models;
pub mod readers;
pub mod schema;

pub use models::{
    AddedBook, CopyStatus, IssueOutcome, NewBook, NewReader, ReaderStatus, ReturnOutcome,
};

/// Data-access object around one `PostgreSQL` client
pub struct LibraryDb {
    client: Client,
    fine_per_day: i32,
}

impl LibraryDb {
    /// Wrap an already connected client
    #[must_use]
    pub fn new(client: Client, fine_per_day: i32) -> Self {
        Self { client, fine_per_day }
    }

    /// Connect using resolved settings, retrying per the configured policy
    pub async fn connect(settings: &Settings) -> Result<Self> {
        let client = connect_with_retry(&settings.connection, settings.retry).await?;
        Ok(Self::new(client, settings.fine_per_day))
    }

    /// Fine charged per overdue day
    #[must_use]
    pub const fn fine_per_day(&self) -> i32 {
        self.fine_per_day
    }

    /// 1. Books of one genre
    pub async fn books_by_genre(&self, genre: &str) -> Result<QueryResult> {
        fetch(
            &self.client,
            "SELECT b.title, g.genre, b.published_year, b.language, \
             CASE WHEN b.is_reference THEN 'Да' ELSE 'Нет' END AS is_reference \
             FROM books b \
             JOIN genres g ON b.genre_id = g.genre_id \
             WHERE g.genre = $1 \
             ORDER BY b.title",
            &[&genre.trim()],
        )
        .await
    }

    /// 2. Books written by more than one author
    pub async fn multi_author_books(&self) -> Result<QueryResult> {
        fetch(
            &self.client,
            "SELECT b.title, COUNT(ba.author_id) AS author_count \
             FROM books b \
             JOIN book_authors ba ON b.book_id = ba.book_id \
             GROUP BY b.book_id, b.title \
             HAVING COUNT(ba.author_id) > 1 \
             ORDER BY author_count DESC, b.title",
            &[],
        )
        .await
    }

    /// 3. Every author with the number of their books
    pub async fn author_book_counts(&self) -> Result<QueryResult> {
        fetch(
            &self.client,
            "SELECT a.full_name, COUNT(ba.book_id) AS book_count \
             FROM authors a \
             LEFT JOIN book_authors ba ON a.author_id = ba.author_id \
             GROUP BY a.author_id, a.full_name \
             ORDER BY book_count DESC, a.full_name",
            &[],
        )
        .await
    }

    /// 4. In-stock copies of the book with exactly this title
    pub async fn available_copies(&self, title: &str) -> Result<QueryResult> {
        fetch(
            &self.client,
            "SELECT b.title, c.inventory_number, c.location \
             FROM copies c \
             JOIN books b ON c.book_id = b.book_id \
             WHERE b.title = $1 AND c.status = $2 \
             ORDER BY c.inventory_number",
            &[&title.trim(), &CopyStatus::InStock.as_str()],
        )
        .await
    }

    /// 5. Loans not yet returned
    pub async fn active_loans(&self) -> Result<QueryResult> {
        fetch(
            &self.client,
            "SELECT r.full_name AS reader, b.title AS book, \
             c.inventory_number, l.loan_date, l.due_date \
             FROM loans l \
             JOIN readers r ON l.reader_id = r.reader_id \
             JOIN copies c ON l.copy_id = c.copy_id \
             JOIN books b ON c.book_id = b.book_id \
             WHERE l.return_date IS NULL \
             ORDER BY l.due_date, r.full_name",
            &[],
        )
        .await
    }

    /// 6. Open loans past their due date
    pub async fn overdue_loans(&self) -> Result<QueryResult> {
        fetch(
            &self.client,
            "SELECT r.full_name AS reader, b.title AS book, \
             l.due_date, (CURRENT_DATE - l.due_date) AS days_overdue, \
             l.fine_amount \
             FROM loans l \
             JOIN readers r ON l.reader_id = r.reader_id \
             JOIN copies c ON l.copy_id = c.copy_id \
             JOIN books b ON c.book_id = b.book_id \
             WHERE l.return_date IS NULL AND l.due_date < CURRENT_DATE \
             ORDER BY days_overdue DESC",
            &[],
        )
        .await
    }

    /// 7. Genres ranked by number of loans
    pub async fn popular_genres(&self) -> Result<QueryResult> {
        fetch(
            &self.client,
            "SELECT g.genre, COUNT(l.loan_id) AS loan_count \
             FROM loans l \
             JOIN copies c ON l.copy_id = c.copy_id \
             JOIN books b ON c.book_id = b.book_id \
             JOIN genres g ON b.genre_id = g.genre_id \
             GROUP BY g.genre \
             ORDER BY loan_count DESC, g.genre",
            &[],
        )
        .await
    }

    /// Ad-hoc SQL, allowed only when it is a single read-only statement
    ///
    /// The statement also runs inside a `READ ONLY` transaction, so the server
    /// refuses writes the guard failed to spot.
    pub async fn run_read_only(&mut self, sql: &str) -> Result<QueryResult> {
        validate_read_only(sql)?;
        info!("running ad-hoc read-only query");

        let tx = self
            .client
            .build_transaction()
            .read_only(true)
            .start()
            .await
            .map_err(|e| {
                LibraryError::query_failed(format!(
                    "Failed to start transaction: {}",
                    db_error_text(&e)
                ))
            })?;

        let result = fetch(&tx, sql.trim(), &[]).await?;
        commit(tx).await?;

        Ok(result)
    }
}
