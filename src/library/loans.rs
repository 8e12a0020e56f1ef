//! Loan transactions: return with fine, issue under a row lock.

use chrono::NaiveDate;
use tracing::{info, warn};

use tokio_postgres::Row;

use crate::engine::postgres::{begin, commit, db_error_text, fetch, run};
use crate::error::{LibraryError, Result};
use crate::library::models::{CopyStatus, IssueOutcome, ReturnOutcome};
use crate::library::LibraryDb;

impl LibraryDb {
    /// 8. Close an open loan
    ///
    /// In one transaction: stamp `return_date` and compute the fine from the
    /// days overdue, put the copy back in stock, then read back the closed loan.
    pub async fn return_loan(&mut self, loan_id: i32) -> Result<ReturnOutcome> {
        let fine_per_day = self.fine_per_day;
        let tx = begin(&mut self.client).await?;

        let updated = fetch(
            &tx,
            "UPDATE loans \
             SET return_date = CURRENT_DATE, \
             fine_amount = GREATEST(0, CURRENT_DATE - due_date) * $2::int4 \
             WHERE loan_id = $1 AND return_date IS NULL \
             RETURNING loan_id, copy_id",
            &[&loan_id, &fine_per_day],
        )
        .await?;

        let Some(copy_id) = updated.first_value("copy_id").and_then(serde_json::Value::as_i64)
        else {
            commit(tx).await?;
            info!(loan_id, "no open loan to return");
            return Ok(ReturnOutcome::NotFound { loan_id });
        };
        let copy_id = i32::try_from(copy_id)
            .map_err(|_| LibraryError::query_failed(format!("copy_id {copy_id} out of range")))?;

        run(
            &tx,
            "UPDATE copies SET status = $1 WHERE copy_id = $2",
            &[&CopyStatus::InStock.as_str(), &copy_id],
        )
        .await?;

        let details = fetch(
            &tx,
            "SELECT l.loan_id, r.full_name AS reader, b.title AS book, \
             l.due_date, l.return_date, l.fine_amount \
             FROM loans l \
             JOIN readers r ON l.reader_id = r.reader_id \
             JOIN copies c ON l.copy_id = c.copy_id \
             JOIN books b ON c.book_id = b.book_id \
             WHERE l.loan_id = $1",
            &[&loan_id],
        )
        .await?;

        commit(tx).await?;
        info!(loan_id, copy_id, "loan returned");

        Ok(ReturnOutcome::Returned { loan_id, copy_id, details })
    }

    /// 10. Issue a copy to a reader
    ///
    /// The copy row is locked with `FOR UPDATE` before its status is checked,
    /// so two concurrent issues of the same copy cannot both succeed.
    pub async fn issue_loan(
        &mut self,
        reader_id: i32,
        copy_id: i32,
        due_date: NaiveDate,
    ) -> Result<IssueOutcome> {
        let tx = begin(&mut self.client).await?;

        let copy = tx
            .query_opt(
                "SELECT c.copy_id, c.status, b.title \
                 FROM copies c \
                 JOIN books b ON c.book_id = b.book_id \
                 WHERE c.copy_id = $1 FOR UPDATE OF c",
                &[&copy_id],
            )
            .await
            .map_err(|e| {
                LibraryError::query_failed(format!(
                    "Failed to lock copy: {}",
                    db_error_text(&e)
                ))
            })?;

        let Some(copy) = copy else {
            commit(tx).await?;
            info!(copy_id, "copy not found");
            return Ok(IssueOutcome::CopyNotFound { copy_id });
        };

        let status: String = column(&copy, "status")?;
        let title: String = column(&copy, "title")?;

        if status != CopyStatus::InStock.as_str() {
            commit(tx).await?;
            warn!(copy_id, %status, "copy is not available for loan");
            return Ok(IssueOutcome::CopyUnavailable { copy_id, status });
        }

        let inserted = tx
            .query_one(
                "INSERT INTO loans (reader_id, copy_id, due_date) \
                 VALUES ($1, $2, $3) \
                 RETURNING loan_id",
                &[&reader_id, &copy_id, &due_date],
            )
            .await
            .map_err(|e| {
                LibraryError::query_failed(format!(
                    "Failed to create loan: {}",
                    db_error_text(&e)
                ))
            })?;
        let loan_id: i32 = column(&inserted, "loan_id")?;

        run(
            &tx,
            "UPDATE copies SET status = $1 WHERE copy_id = $2",
            &[&CopyStatus::Loaned.as_str(), &copy_id],
        )
        .await?;

        commit(tx).await?;
        info!(loan_id, reader_id, copy_id, "loan issued");

        Ok(IssueOutcome::Issued { loan_id, copy_id, title })
    }
}

fn column<'a, T: tokio_postgres::types::FromSql<'a>>(row: &'a Row, name: &str) -> Result<T> {
    row.try_get(name)
        .map_err(|e| LibraryError::query_failed(format!("Failed to read column {name}: {e}")))
}
