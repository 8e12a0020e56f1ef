//! Operations as Values
//!
//! Both the interactive menu and the one-shot subcommands build an [`Action`]
//! and hand it to [`execute_and_print`]. Running an action yields an
//! [`Outcome`], which is printed either as text (banner plus records) or as a
//! single JSON envelope on stdout.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::Write;
use std::time::Instant;
use tracing::debug;

use crate::engine::QueryResult;
use crate::error::{LibraryError, Result};
use crate::injection::{run_demo, InjectionReport};
use crate::library::{AddedBook, IssueOutcome, LibraryDb, NewBook, NewReader, ReturnOutcome};
use crate::output::{ErrorEnvelope, Metadata, SuccessEnvelope};
use crate::render::{banner, render_injection, render_records};

/// One operation together with its inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    InitSchema,
    Seed,
    BooksByGenre { genre: String },
    MultiAuthorBooks,
    AuthorBookCounts,
    AvailableCopies { title: String },
    ActiveLoans,
    OverdueLoans,
    PopularGenres,
    ReturnLoan { loan_id: i32 },
    AddReader(NewReader),
    IssueLoan { reader_id: i32, copy_id: i32, due_date: NaiveDate },
    SearchBooks { term: String },
    AddBook(NewBook),
    Injection { demo: u8 },
    ReadOnlySql { sql: String },
}

impl Action {
    /// Subcommand name, also used as `command` in JSON envelopes
    #[must_use]
    pub const fn command(&self) -> &'static str {
        match self {
            Self::InitSchema => "init",
            Self::Seed => "seed",
            Self::BooksByGenre { .. } => "books-by-genre",
            Self::MultiAuthorBooks => "multi-author-books",
            Self::AuthorBookCounts => "author-book-counts",
            Self::AvailableCopies { .. } => "available-copies",
            Self::ActiveLoans => "active-loans",
            Self::OverdueLoans => "overdue-loans",
            Self::PopularGenres => "popular-genres",
            Self::ReturnLoan { .. } => "return-loan",
            Self::AddReader(_) => "add-reader",
            Self::IssueLoan { .. } => "issue-loan",
            Self::SearchBooks { .. } => "search-books",
            Self::AddBook(_) => "add-book",
            Self::Injection { .. } => "injection",
            Self::ReadOnlySql { .. } => "sql",
        }
    }

    /// Banner title for text output
    #[must_use]
    pub fn title(&self) -> String {
        match self {
            Self::InitSchema => "Инициализация базы данных".to_string(),
            Self::Seed => "Заполнение тестовыми данными".to_string(),
            Self::BooksByGenre { genre } => format!("1. Книги жанра: {genre}"),
            Self::MultiAuthorBooks => "2. Книги с несколькими авторами".to_string(),
            Self::AuthorBookCounts => "3. Авторы и количество книг".to_string(),
            Self::AvailableCopies { title } => format!("4. Доступные экземпляры: {title}"),
            Self::ActiveLoans => "5. Текущие выдачи".to_string(),
            Self::OverdueLoans => "6. Просроченные выдачи".to_string(),
            Self::PopularGenres => "7. Популярные жанры (по выдачам)".to_string(),
            Self::ReturnLoan { loan_id } => format!("8. Возврат книги (loan_id = {loan_id})"),
            Self::AddReader(_) => "9. Добавление читателя".to_string(),
            Self::IssueLoan { .. } => "10. Выдать книгу".to_string(),
            Self::SearchBooks { .. } => "Безопасный поиск книги".to_string(),
            Self::AddBook(_) => "Безопасное добавление книги".to_string(),
            Self::Injection { demo } => format!("SQL-инъекция {demo}"),
            Self::ReadOnlySql { .. } => "Произвольный запрос (только чтение)".to_string(),
        }
    }

    /// Run against the database
    pub async fn run(self, db: &mut LibraryDb) -> Result<Outcome> {
        debug!(command = self.command(), "running action");

        Ok(match self {
            Self::InitSchema => {
                db.init_schema().await?;
                Outcome::SchemaReady
            }
            Self::Seed => {
                db.seed().await?;
                Outcome::Seeded
            }
            Self::BooksByGenre { genre } => Outcome::Rows(db.books_by_genre(&genre).await?),
            Self::MultiAuthorBooks => Outcome::Rows(db.multi_author_books().await?),
            Self::AuthorBookCounts => Outcome::Rows(db.author_book_counts().await?),
            Self::AvailableCopies { title } => Outcome::Rows(db.available_copies(&title).await?),
            Self::ActiveLoans => Outcome::Rows(db.active_loans().await?),
            Self::OverdueLoans => Outcome::Rows(db.overdue_loans().await?),
            Self::PopularGenres => Outcome::Rows(db.popular_genres().await?),
            Self::ReturnLoan { loan_id } => Outcome::Returned(db.return_loan(loan_id).await?),
            Self::AddReader(reader) => Outcome::ReaderAdded(db.add_reader(&reader).await?),
            Self::IssueLoan { reader_id, copy_id, due_date } => {
                Outcome::Issued(db.issue_loan(reader_id, copy_id, due_date).await?)
            }
            Self::SearchBooks { term } => {
                let result = db.search_books(&term).await?;
                Outcome::Search { term, result }
            }
            Self::AddBook(book) => Outcome::BookAdded(db.add_book(&book).await?),
            Self::Injection { demo } => Outcome::Injection(run_demo(db, demo).await?),
            Self::ReadOnlySql { sql } => Outcome::Rows(db.run_read_only(&sql).await?),
        })
    }
}

/// What an action produced
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    SchemaReady,
    Seeded,
    Rows(QueryResult),
    Returned(ReturnOutcome),
    ReaderAdded(QueryResult),
    Issued(IssueOutcome),
    Search { term: String, result: QueryResult },
    BookAdded(AddedBook),
    Injection(InjectionReport),
}

impl Outcome {
    /// Row count reported in JSON metadata
    #[must_use]
    pub fn rows(&self) -> Option<usize> {
        match self {
            Self::Rows(result) | Self::ReaderAdded(result) | Self::Search { result, .. } => {
                Some(result.len())
            }
            Self::Returned(ReturnOutcome::Returned { details, .. }) => Some(details.len()),
            _ => None,
        }
    }

    /// Text form, without the banner
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::SchemaReady => "Таблицы созданы успешно!".to_string(),
            Self::Seeded => "Все тестовые данные успешно добавлены!".to_string(),
            Self::Rows(result) | Self::ReaderAdded(result) => render_records(result),
            Self::Returned(ReturnOutcome::NotFound { .. }) => {
                "Выдача не найдена или уже закрыта".to_string()
            }
            Self::Returned(ReturnOutcome::Returned { details, .. }) => render_records(details),
            Self::Issued(IssueOutcome::CopyNotFound { .. }) => "Экземпляр не найден".to_string(),
            Self::Issued(IssueOutcome::CopyUnavailable { status, .. }) => {
                format!("Экземпляр недоступен (status = {status})")
            }
            Self::Issued(IssueOutcome::Issued { loan_id, .. }) => {
                format!("Выдача создана. loan_id = {loan_id}")
            }
            Self::Search { term, result } => {
                let mut out = String::new();
                let _ = writeln!(out, "Поиск: {term}");
                let _ = writeln!(out, "Найдено записей: {}", result.len());
                out.push_str(&render_records(result));
                out
            }
            Self::BookAdded(book) => {
                format!(
                    "\nКнига успешно добавлена!\nID: {}\nНазвание: {}",
                    book.book_id, book.title
                )
            }
            Self::Injection(report) => render_injection(report),
        }
    }
}

/// How results are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Run `action` and print its outcome or error; `true` on success
///
/// Text mode prints the banner before running, errors go to stderr as
/// `Ошибка: ...`. JSON mode prints exactly one envelope on stdout.
pub async fn execute_and_print(db: &mut LibraryDb, action: Action, format: OutputFormat) -> bool {
    let command = action.command();

    // Injection demos render their own banner
    if format == OutputFormat::Text && !matches!(action, Action::Injection { .. }) {
        println!("{}", banner(&action.title()));
    }

    let start = Instant::now();
    let result = action.run(db).await;
    let execution_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    match (format, result) {
        (OutputFormat::Text, Ok(outcome)) => {
            println!("{}", outcome.to_text());
            true
        }
        (OutputFormat::Text, Err(err)) => {
            eprintln!("Ошибка: {}", err.message());
            false
        }
        (OutputFormat::Json, Ok(outcome)) => {
            let meta = match outcome.rows() {
                Some(rows) => Metadata::with_rows(execution_ms, rows),
                None => Metadata::new(execution_ms),
            };
            print_json(&SuccessEnvelope::new(command, &outcome, meta));
            true
        }
        (OutputFormat::Json, Err(err)) => {
            print_json(&ErrorEnvelope::from_error(command, &err));
            false
        }
    }
}

/// Print `err` the way a failed action would be printed
pub fn print_error(command: &str, err: &LibraryError, format: OutputFormat) {
    match format {
        OutputFormat::Text => eprintln!("Ошибка: {}", err.message()),
        OutputFormat::Json => print_json(&ErrorEnvelope::from_error(command, err)),
    }
}

fn print_json(value: &impl Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Failed to serialize output: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::injection::{demo, InjectionReport};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_commands_are_unique() {
        let actions = [
            Action::InitSchema,
            Action::Seed,
            Action::BooksByGenre { genre: String::new() },
            Action::MultiAuthorBooks,
            Action::AuthorBookCounts,
            Action::AvailableCopies { title: String::new() },
            Action::ActiveLoans,
            Action::OverdueLoans,
            Action::PopularGenres,
            Action::ReturnLoan { loan_id: 1 },
            Action::IssueLoan { reader_id: 1, copy_id: 1, due_date: NaiveDate::MIN },
            Action::SearchBooks { term: String::new() },
            Action::Injection { demo: 1 },
            Action::ReadOnlySql { sql: String::new() },
        ];
        let mut commands: Vec<&str> = actions.iter().map(Action::command).collect();
        commands.sort_unstable();
        commands.dedup();
        assert_eq!(commands.len(), actions.len());
    }

    #[test]
    fn test_titles_carry_inputs() {
        assert_eq!(
            Action::BooksByGenre { genre: "Фантастика".to_string() }.title(),
            "1. Книги жанра: Фантастика"
        );
        assert_eq!(Action::ReturnLoan { loan_id: 7 }.title(), "8. Возврат книги (loan_id = 7)");
    }

    #[test]
    fn test_return_and_issue_messages() {
        assert_eq!(
            Outcome::Returned(ReturnOutcome::NotFound { loan_id: 1 }).to_text(),
            "Выдача не найдена или уже закрыта"
        );
        assert_eq!(
            Outcome::Issued(IssueOutcome::CopyUnavailable {
                copy_id: 2,
                status: "loaned".to_string()
            })
            .to_text(),
            "Экземпляр недоступен (status = loaned)"
        );
        assert_eq!(
            Outcome::Issued(IssueOutcome::Issued {
                loan_id: 3,
                copy_id: 1,
                title: "Основание".to_string()
            })
            .to_text(),
            "Выдача создана. loan_id = 3"
        );
        assert_eq!(
            Outcome::Issued(IssueOutcome::CopyNotFound { copy_id: 99 }).to_text(),
            "Экземпляр не найден"
        );
    }

    #[test]
    fn test_search_text_reports_count() {
        let outcome = Outcome::Search {
            term: "мир".to_string(),
            result: QueryResult {
                columns: vec!["title".to_string()],
                rows: vec![vec![json!("Война и мир")]],
                rows_affected: None,
            },
        };
        let text = outcome.to_text();
        assert!(text.starts_with("Поиск: мир\nНайдено записей: 1\n"));
        assert!(text.contains("--- Запись 1 ---"));
        assert_eq!(outcome.rows(), Some(1));
    }

    #[test]
    fn test_book_added_text() {
        let text =
            Outcome::BookAdded(AddedBook { book_id: 5, title: "Солярис".to_string() }).to_text();
        assert_eq!(text, "\nКнига успешно добавлена!\nID: 5\nНазвание: Солярис");
    }

    #[test]
    fn test_outcome_json_shape() {
        let outcome = Outcome::Returned(ReturnOutcome::NotFound { loan_id: 4 });
        let json = serde_json::to_value(outcome).unwrap();
        assert_eq!(json, json!({"kind": "returned", "outcome": "not_found", "loan_id": 4}));

        let json = serde_json::to_value(Outcome::Seeded).unwrap();
        assert_eq!(json, json!({"kind": "seeded"}));
    }

    #[test]
    fn test_injection_outcome_json() {
        let report = InjectionReport::explain(demo(3).unwrap());
        let json = serde_json::to_value(Outcome::Injection(report)).unwrap();
        assert_eq!(json["kind"], "injection");
        assert_eq!(json["demo"]["title"], "UNION-атака");
        assert_eq!(json["markers"], json!(["union"]));
        assert!(json.get("comparison").is_none());
    }
}
