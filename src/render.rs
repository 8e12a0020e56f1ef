//! Text rendering for the interactive tool
//!
//! Results are printed record by record:
//!
//! ```text
//! --- Запись 1 ---
//! Название:                     Война и мир
//! Год:                          1869
//! ```
//!
//! Column names are translated through a fixed label table; columns without a
//! label keep their raw name. NULL values and empty results print `Нет данных`.

use serde_json::Value;
use std::fmt::Write;

use crate::engine::QueryResult;
use crate::guard::InjectionMarker;
use crate::injection::InjectionReport;

/// Placeholder for NULL values and empty results
pub const NO_DATA: &str = "Нет данных";

/// Width of the `label:` column
pub const LABEL_WIDTH: usize = 30;

const RULE: &str = "═══════════════════════════════════════════";

/// Russian label for a result column
#[must_use]
pub fn column_label(column: &str) -> &str {
    match column {
        "genre" => "Жанр",
        "title" => "Название",
        "published_year" => "Год",
        "language" => "Язык",
        "is_reference" => "Справочное",
        "full_name" => "ФИО",
        "country" => "Страна",
        "book_count" => "Книг",
        "author_count" => "Авторов",
        "inventory_number" => "Инвентарный номер",
        "location" => "Местоположение",
        "status" => "Статус",
        "loan_date" => "Дата выдачи",
        "due_date" => "Срок возврата",
        "return_date" => "Дата возврата",
        "fine_amount" => "Штраф",
        "days_overdue" => "Дней просрочки",
        "loan_count" => "Выдач",
        "reader" => "Читатель",
        "book" => "Книга",
        "email" => "Email",
        "group" => "Группа",
        "isbn" => "ISBN",
        "registration_date" => "Дата регистрации",
        other => other,
    }
}

/// One value as shown to the user
#[must_use]
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => NO_DATA.to_string(),
        Value::Bool(true) => "Да".to_string(),
        Value::Bool(false) => "Нет".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Title framed by double rules, preceded by a blank line
#[must_use]
pub fn banner(title: &str) -> String {
    format!("\n{RULE}\n{title}\n{RULE}")
}

/// All rows of `result` in record layout
#[must_use]
pub fn render_records(result: &QueryResult) -> String {
    if result.is_empty() {
        return NO_DATA.to_string();
    }

    let mut out = String::new();
    for (idx, row) in result.rows.iter().enumerate() {
        let _ = writeln!(out, "\n--- Запись {} ---", idx + 1);
        for (column, value) in result.columns.iter().zip(row) {
            let label = format!("{}:", column_label(column));
            let _ = writeln!(out, "{label:<LABEL_WIDTH$}{}", display_value(value));
        }
    }
    out
}

/// Full text for one injection demo
#[must_use]
pub fn render_injection(report: &InjectionReport) -> String {
    let demo = report.demo;
    let mut out = banner(&format!("SQL-инъекция {}: {}", demo.id, demo.title));

    let _ = write!(out, "\nУязвимый запрос:\n{}\n\nАтака:\n", demo.template);
    for (name, input) in demo.inputs {
        let _ = writeln!(out, "{name}: {input}");
    }
    let _ = write!(out, "\nИтоговый SQL:\n{}\n\nРезультат: {}\n", report.spliced_sql, demo.effect);

    if !report.markers.is_empty() {
        out.push_str("\nПризнаки атаки:\n");
        for marker in &report.markers {
            let _ = writeln!(out, "- {}", InjectionMarker::describe(marker));
        }
    }

    if let Some(comparison) = report.comparison {
        let _ = write!(
            out,
            "\nНайдено записей: {}\nБезопасный поиск с тем же вводом, найдено записей: {}\n",
            comparison.vulnerable_rows, comparison.safe_rows
        );
    }

    let _ = write!(out, "\nБезопасный вариант:\n{}", demo.safe_sql);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::injection::{demo, SearchComparison};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn result(columns: &[&str], rows: Vec<Vec<Value>>) -> QueryResult {
        QueryResult {
            columns: columns.iter().map(ToString::to_string).collect(),
            rows,
            rows_affected: None,
        }
    }

    #[test]
    fn test_known_and_unknown_labels() {
        assert_eq!(column_label("fine_amount"), "Штраф");
        assert_eq!(column_label("days_overdue"), "Дней просрочки");
        assert_eq!(column_label("loan_id"), "loan_id");
    }

    #[test]
    fn test_display_values() {
        assert_eq!(display_value(&Value::Null), "Нет данных");
        assert_eq!(display_value(&json!(true)), "Да");
        assert_eq!(display_value(&json!("50.00")), "50.00");
        assert_eq!(display_value(&json!(1869)), "1869");
    }

    #[test]
    fn test_empty_result() {
        assert_eq!(render_records(&QueryResult::default()), "Нет данных");
    }

    #[test]
    fn test_banner() {
        assert!(banner("x").starts_with('\n'));
        insta::assert_snapshot!(banner("5. Текущие выдачи").trim_start(), @r"
        ═══════════════════════════════════════════
        5. Текущие выдачи
        ═══════════════════════════════════════════
        ");
    }

    #[test]
    fn test_record_layout() {
        let rendered = render_records(&result(
            &["title", "published_year", "return_date"],
            vec![
                vec![json!("Война и мир"), json!(1869), Value::Null],
                vec![json!("Sapiens"), json!(2011), json!("2024-03-01")],
            ],
        ));

        let expected = "\n--- Запись 1 ---\n\
                        Название:                     Война и мир\n\
                        Год:                          1869\n\
                        Дата возврата:                Нет данных\n\
                        \n--- Запись 2 ---\n\
                        Название:                     Sapiens\n\
                        Год:                          2011\n\
                        Дата возврата:                2024-03-01\n";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_long_label_is_not_truncated() {
        let rendered =
            render_records(&result(&["a_very_long_column_name_over_thirty"], vec![vec![json!(1)]]));
        assert!(rendered.contains("a_very_long_column_name_over_thirty:1"));
    }

    #[test]
    fn test_injection_text() {
        let mut report = InjectionReport::explain(demo(2).unwrap());
        report.comparison = Some(SearchComparison { vulnerable_rows: 4, safe_rows: 0 });

        insta::assert_snapshot!(render_injection(&report).trim_start(), @r"
        ═══════════════════════════════════════════
        SQL-инъекция 2: Уязвимый поиск
        ═══════════════════════════════════════════
        Уязвимый запрос:
        SELECT * FROM books WHERE title LIKE '%$search%'

        Атака:
        search: %' OR '1'='1

        Итоговый SQL:
        SELECT * FROM books WHERE title LIKE '%%' OR '1'='1%'

        Результат: покажет ВСЕ книги

        Признаки атаки:
        - тавтология (условие всегда истинно)

        Найдено записей: 4
        Безопасный поиск с тем же вводом, найдено записей: 0

        Безопасный вариант:
        SELECT title, published_year, language FROM books WHERE title ILIKE $1
        ");
    }
}
