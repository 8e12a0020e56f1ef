//! Reader registration.

use tracing::info;

use crate::engine::postgres::fetch;
use crate::engine::QueryResult;
use crate::error::Result;
use crate::library::models::NewReader;
use crate::library::LibraryDb;

impl LibraryDb {
    /// 9. Register a reader, returning `reader_id`, `full_name` and `status`
    pub async fn add_reader(&self, reader: &NewReader) -> Result<QueryResult> {
        let result = fetch(
            &self.client,
            "INSERT INTO readers (full_name, \"group\", email, status) \
             VALUES ($1, $2, $3, $4) \
             RETURNING reader_id, full_name, status",
            &[&reader.full_name, &reader.group, &reader.email, &reader.status.as_str()],
        )
        .await?;

        info!(status = %reader.status, "reader added");
        Ok(result)
    }
}
