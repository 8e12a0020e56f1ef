//! SQL-Injection Demonstrations
//!
//! Five classic attacks against queries built by string concatenation. Each
//! demo carries the vulnerable template, the attacker's input, the SQL that
//! naive splicing produces and the parameterized statement that defeats it.
//!
//! Only the search demo touches the database. Its spliced SQL is first
//! checked by [`crate::guard::validate_read_only`] and then runs in a
//! read-only transaction. The safe search runs next with the same input so
//! the two row counts can be compared.

use serde::Serialize;
use tracing::info;

use crate::error::{LibraryError, Result};
use crate::guard::{injection_markers, InjectionMarker};
use crate::library::LibraryDb;

/// One vulnerable query and the attack against it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InjectionDemo {
    pub id: u8,
    pub title: &'static str,
    /// Query text with `$name` placeholders filled by concatenation
    pub template: &'static str,
    /// `(placeholder, attacker input)` pairs
    pub inputs: &'static [(&'static str, &'static str)],
    /// What the attacker gains
    pub effect: &'static str,
    /// Parameterized equivalent
    pub safe_sql: &'static str,
    /// Whether the demo runs its spliced SQL against the database
    pub executes: bool,
}

pub static DEMOS: [InjectionDemo; 5] = [
    InjectionDemo {
        id: 1,
        title: "Уязвимый логин",
        template: "SELECT * FROM readers WHERE email = '$email' AND status = '$status'",
        inputs: &[("email", "any' OR '1'='1"), ("status", "любой")],
        effect: "выдаст всех читателей",
        safe_sql: "SELECT * FROM readers WHERE email = $1 AND status = $2",
        executes: false,
    },
    InjectionDemo {
        id: 2,
        title: "Уязвимый поиск",
        template: "SELECT * FROM books WHERE title LIKE '%$search%'",
        inputs: &[("search", "%' OR '1'='1")],
        effect: "покажет ВСЕ книги",
        safe_sql: "SELECT title, published_year, language FROM books WHERE title ILIKE $1",
        executes: true,
    },
    InjectionDemo {
        id: 3,
        title: "UNION-атака",
        template: "SELECT title, published_year FROM books WHERE book_id = $id",
        inputs: &[("id", "1 UNION SELECT full_name, 0 FROM readers")],
        effect: "получаем список читателей",
        safe_sql: "SELECT title, published_year FROM books WHERE book_id = $1",
        executes: false,
    },
    InjectionDemo {
        id: 4,
        title: "Error-based",
        template: "SELECT * FROM books WHERE book_id = $id",
        inputs: &[("id", "1 AND 1=CAST((SELECT version()) AS INT)")],
        effect: "ошибка БД покажет версию PostgreSQL",
        safe_sql: "SELECT * FROM books WHERE book_id = $1",
        executes: false,
    },
    InjectionDemo {
        id: 5,
        title: "Time-based (Blind)",
        template: "SELECT * FROM readers WHERE email = '$email'",
        inputs: &[("email", "test' AND (SELECT pg_sleep(5))--")],
        effect: "если ответ задерживается 5 сек, значит запись существует",
        safe_sql: "SELECT * FROM readers WHERE email = $1",
        executes: false,
    },
];

/// Look up a demo by its menu number
pub fn demo(id: u8) -> Result<&'static InjectionDemo> {
    DEMOS
        .iter()
        .find(|d| d.id == id)
        .ok_or_else(|| {
            LibraryError::invalid_input(format!(
                "injection demo must be 1-{}, got {id}",
                DEMOS.len()
            ))
        })
}

/// Replace each `$name` in `template` with its value, verbatim
///
/// Unknown placeholders are left as they are. This is exactly the unsafe
/// concatenation the demos warn against.
#[must_use]
pub fn splice(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + 64);
    let mut rest = template;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let name_len = after
            .find(|c: char| !(c.is_ascii_lowercase() || c == '_'))
            .unwrap_or(after.len());
        let name = &after[..name_len];

        match values.iter().find(|(key, _)| *key == name) {
            Some((_, value)) if !name.is_empty() => out.push_str(value),
            _ => {
                out.push('$');
                out.push_str(name);
            }
        }
        rest = &after[name_len..];
    }

    out.push_str(rest);
    out
}

/// Row counts from running the vulnerable and the safe search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchComparison {
    pub vulnerable_rows: usize,
    pub safe_rows: usize,
}

/// Everything shown for one demo
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InjectionReport {
    pub demo: &'static InjectionDemo,
    pub spliced_sql: String,
    pub markers: Vec<InjectionMarker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<SearchComparison>,
}

impl InjectionReport {
    /// Offline part of a demo: splicing and marker detection
    #[must_use]
    pub fn explain(demo: &'static InjectionDemo) -> Self {
        let mut markers = Vec::new();
        for (_, input) in demo.inputs {
            for marker in injection_markers(input) {
                if !markers.contains(&marker) {
                    markers.push(marker);
                }
            }
        }

        Self { demo, spliced_sql: splice(demo.template, demo.inputs), markers, comparison: None }
    }
}

/// Show demo `id`, running it against the database when it is executable
pub async fn run_demo(db: &mut LibraryDb, id: u8) -> Result<InjectionReport> {
    let demo = demo(id)?;
    let mut report = InjectionReport::explain(demo);

    if demo.executes {
        let term = demo.inputs.first().map_or("", |(_, input)| *input);
        let vulnerable = db.run_read_only(&report.spliced_sql).await?;
        let safe = db.search_books(term).await?;

        info!(
            demo = demo.id,
            vulnerable_rows = vulnerable.len(),
            safe_rows = safe.len(),
            "injection demo executed"
        );
        report.comparison =
            Some(SearchComparison { vulnerable_rows: vulnerable.len(), safe_rows: safe.len() });
    }

    Ok(report)
}
