//! Safe search and safe insert.
//!
//! These are the parameterized counterparts of the vulnerable queries shown
//! by [`crate::injection`].

use tracing::info;

use crate::engine::postgres::fetch;
use crate::engine::QueryResult;
use crate::error::{LibraryError, Result};
use crate::library::models::{AddedBook, NewBook};
use crate::library::LibraryDb;

/// `ILIKE` pattern for a substring search
///
/// `%` and `_` typed by the user stay wildcards; they cannot break out of the
/// bound parameter.
#[must_use]
pub fn contains_pattern(term: &str) -> String {
    format!("%{term}%")
}

impl LibraryDb {
    /// Case-insensitive title search with the pattern bound as `$1`
    pub async fn search_books(&self, term: &str) -> Result<QueryResult> {
        let pattern = contains_pattern(term);
        fetch(
            &self.client,
            "SELECT title, published_year, language \
             FROM books \
             WHERE title ILIKE $1 \
             ORDER BY title",
            &[&pattern],
        )
        .await
    }

    /// Insert a book with every field bound
    pub async fn add_book(&self, book: &NewBook) -> Result<AddedBook> {
        let result = fetch(
            &self.client,
            "INSERT INTO books (title, genre_id, isbn, published_year, language, is_reference) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING book_id, title",
            &[
                &book.title,
                &book.genre_id,
                &book.isbn,
                &book.published_year,
                &book.language,
                &book.is_reference,
            ],
        )
        .await?;

        let book_id = result
            .first_value("book_id")
            .and_then(serde_json::Value::as_i64)
            .and_then(|id| i32::try_from(id).ok())
            .ok_or_else(|| LibraryError::query_failed("INSERT INTO books returned no book_id"))?;
        let title = result
            .first_value("title")
            .and_then(serde_json::Value::as_str)
            .unwrap_or(&book.title)
            .to_string();

        info!(book_id, "book added");
        Ok(AddedBook { book_id, title })
    }
}
