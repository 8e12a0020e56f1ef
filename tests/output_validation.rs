//! Output Format Validation Tests
//!
//! Checks the two output contracts without a database:
//! - `--json` envelopes serialize to the documented shape
//! - Text rendering of outcomes matches what the menu prints

use library_admin::render::{render_records, NO_DATA};
use library_admin::{
    AddedBook, ErrorEnvelope, InjectionReport, IssueOutcome, LibraryError, Metadata, Outcome,
    QueryResult, ReturnOutcome, SuccessEnvelope, DEMOS,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn overdue_loan_row() -> QueryResult {
    QueryResult {
        columns: vec![
            "loan_id".to_string(),
            "reader".to_string(),
            "book".to_string(),
            "due_date".to_string(),
            "return_date".to_string(),
            "fine_amount".to_string(),
        ],
        rows: vec![vec![
            json!(1),
            json!("Иван Петров"),
            json!("Основание"),
            json!("2024-02-25"),
            json!("2024-03-01"),
            json!("50.00"),
        ]],
        rows_affected: None,
    }
}

// ============================================================================
// JSON Envelopes
// ============================================================================

#[test]
fn test_rows_outcome_envelope() {
    let outcome = Outcome::Rows(overdue_loan_row());
    let envelope = SuccessEnvelope::new("overdue-loans", &outcome, Metadata::with_rows(12, 1));

    let value = serde_json::to_value(&envelope).expect("Should serialize");
    assert_eq!(value["ok"], true);
    assert_eq!(value["command"], "overdue-loans");
    assert_eq!(value["data"]["kind"], "rows");
    assert_eq!(value["data"]["columns"][5], "fine_amount");
    assert_eq!(value["data"]["rows"][0][5], "50.00");
    assert_eq!(value["meta"]["rows_returned"], 1);
    assert!(value["data"].get("rows_affected").is_none());
}

#[test]
fn test_returned_outcome_envelope() {
    let outcome = Outcome::Returned(ReturnOutcome::Returned {
        loan_id: 1,
        copy_id: 2,
        details: overdue_loan_row(),
    });
    assert_eq!(outcome.rows(), Some(1));

    let value = serde_json::to_value(&outcome).expect("Should serialize");
    assert_eq!(value["kind"], "returned");
    assert_eq!(value["outcome"], "returned");
    assert_eq!(value["copy_id"], 2);
    assert_eq!(value["details"]["rows"][0][1], "Иван Петров");
}

#[test]
fn test_issue_outcome_envelope() {
    let outcome = Outcome::Issued(IssueOutcome::Issued {
        loan_id: 3,
        copy_id: 1,
        title: "Основание".to_string(),
    });
    let envelope = SuccessEnvelope::new("issue-loan", &outcome, Metadata::new(4));

    let value = serde_json::to_value(&envelope).expect("Should serialize");
    assert_eq!(
        value["data"],
        json!({
            "kind": "issued",
            "outcome": "issued",
            "loan_id": 3,
            "copy_id": 1,
            "title": "Основание"
        })
    );
    assert!(value["meta"].get("rows_returned").is_none());
}

#[test]
fn test_error_envelope_snapshot() {
    let err = LibraryError::unsafe_query("Multiple statements in one query are not allowed");
    let envelope = ErrorEnvelope::from_error("sql", &err);

    let json_str = serde_json::to_string_pretty(&envelope).expect("Should serialize");
    insta::assert_snapshot!(json_str, @r#"
    {
      "ok": false,
      "command": "sql",
      "error": {
        "code": "UNSAFE_QUERY",
        "message": "Unsafe query: Multiple statements in one query are not allowed"
      }
    }
    "#);
}

#[test]
fn test_all_error_codes_are_consistent() {
    let valid_codes = [
        "CONNECTION_FAILED",
        "QUERY_FAILED",
        "INVALID_INPUT",
        "UNSAFE_QUERY",
        "CONFIG_ERROR",
        "PROMPT_FAILED",
    ];

    assert!(valid_codes.contains(&LibraryError::connection_failed("test").error_code()));
    assert!(valid_codes.contains(&LibraryError::query_failed("test").error_code()));
    assert!(valid_codes.contains(&LibraryError::invalid_input("test").error_code()));
    assert!(valid_codes.contains(&LibraryError::unsafe_query("test").error_code()));
    assert!(valid_codes.contains(&LibraryError::config_error("test").error_code()));
    assert!(valid_codes.contains(&LibraryError::prompt_failed("test").error_code()));
}

#[test]
fn test_every_injection_demo_serializes() {
    for demo in &DEMOS {
        let value = serde_json::to_value(Outcome::Injection(InjectionReport::explain(demo)))
            .expect("Should serialize");
        assert_eq!(value["demo"]["id"], demo.id);
        assert!(value["spliced_sql"].as_str().is_some_and(|sql| !sql.contains('$')));
        assert!(!value["markers"].as_array().is_some_and(Vec::is_empty), "demo {}", demo.id);
    }
}

// ============================================================================
// Text Rendering
// ============================================================================

#[test]
fn test_return_details_text() {
    let outcome = Outcome::Returned(ReturnOutcome::Returned {
        loan_id: 1,
        copy_id: 2,
        details: overdue_loan_row(),
    });

    insta::assert_snapshot!(outcome.to_text().trim_start(), @r"
    --- Запись 1 ---
    loan_id:                      1
    Читатель:                     Иван Петров
    Книга:                        Основание
    Срок возврата:                2024-02-25
    Дата возврата:                2024-03-01
    Штраф:                        50.00
    ");
}

#[test]
fn test_null_fields_and_empty_results() {
    let result = QueryResult {
        columns: vec!["full_name".to_string(), "group".to_string()],
        rows: vec![vec![json!("Алексей Ким"), serde_json::Value::Null]],
        rows_affected: None,
    };
    let text = render_records(&result);
    assert!(text.contains("ФИО:"));
    assert!(text.contains(&format!("Группа:{}{NO_DATA}", " ".repeat(23))));

    assert_eq!(Outcome::Rows(QueryResult::default()).to_text(), NO_DATA);
}

#[test]
fn test_status_messages() {
    assert_eq!(Outcome::SchemaReady.to_text(), "Таблицы созданы успешно!");
    assert_eq!(Outcome::Seeded.to_text(), "Все тестовые данные успешно добавлены!");
    assert!(Outcome::BookAdded(AddedBook { book_id: 5, title: "Солярис".to_string() })
        .to_text()
        .contains("Книга успешно добавлена!"));
}
