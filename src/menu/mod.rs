//! Interactive Menu
//!
//! Main menu with two submenus (the ten queries and the injection demos).
//! Every choice becomes an [`Action`] run through [`execute_and_print`].
//!
//! The loop is best-effort: a failed operation or invalid input prints
//! `Ошибка: ...` and the menu comes back. Only a broken terminal (closed stdin,
//! no TTY) ends the loop with an error.

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use tracing::debug;

use crate::action::{execute_and_print, print_error, Action, OutputFormat};
use crate::error::{LibraryError, Result};
use crate::injection::DEMOS;
use crate::library::models::parse_due_date;
use crate::library::{LibraryDb, NewBook, NewReader};
use crate::render::banner;

/// Main menu entries, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainItem {
    InitSchema,
    Seed,
    Queries,
    Injections,
    SafeSearch,
    SafeInsert,
    AdHocSql,
    Exit,
}

impl MainItem {
    pub const ALL: [Self; 8] = [
        Self::InitSchema,
        Self::Seed,
        Self::Queries,
        Self::Injections,
        Self::SafeSearch,
        Self::SafeInsert,
        Self::AdHocSql,
        Self::Exit,
    ];

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::InitSchema => "1. Инициализировать таблицы",
            Self::Seed => "2. Заполнить тестовыми данными",
            Self::Queries => "3. Выполнить 10 основных запросов",
            Self::Injections => "4. Демонстрация SQL-инъекций",
            Self::SafeSearch => "5. Безопасный поиск книги",
            Self::SafeInsert => "6. Безопасное добавление книги",
            Self::AdHocSql => "7. Произвольный запрос (только чтение)",
            Self::Exit => "0. Выход",
        }
    }
}

/// Labels of the query submenu; index 10 returns to the main menu
pub const QUERY_LABELS: [&str; 11] = [
    "1. Книги по жанру",
    "2. Книги с несколькими авторами",
    "3. Авторы и количество книг",
    "4. Доступные экземпляры книги",
    "5. Текущие выдачи",
    "6. Просроченные выдачи",
    "7. Популярные жанры",
    "8. Возврат книги",
    "9. Добавление читателя",
    "10. Выдача книги",
    BACK,
];

const BACK: &str = "0. Выход в главное меню";

/// Labels of the injection submenu, one per demo plus "back"
#[must_use]
pub fn injection_labels() -> Vec<String> {
    DEMOS
        .iter()
        .map(|demo| format!("{}. {}", demo.id, demo.title))
        .chain(std::iter::once(BACK.to_string()))
        .collect()
}

/// Run the menu until the user exits
pub async fn run(db: &mut LibraryDb, format: OutputFormat) -> Result<()> {
    let theme = ColorfulTheme::default();
    let labels: Vec<&str> = MainItem::ALL.iter().map(MainItem::label).collect();

    loop {
        println!("{}", banner("          БИБЛИОТЕЧНАЯ БАЗА ДАННЫХ"));
        let item = match choose(&theme, labels.as_slice())? {
            Some(idx) => MainItem::ALL[idx],
            None => MainItem::Exit,
        };
        debug!(?item, "main menu choice");

        let action = match item {
            MainItem::Exit => {
                println!("Выход из программы...");
                return Ok(());
            }
            MainItem::Queries => {
                queries_menu(db, &theme, format).await?;
                continue;
            }
            MainItem::Injections => {
                injection_menu(db, &theme, format).await?;
                continue;
            }
            MainItem::InitSchema => Ok(Action::InitSchema),
            MainItem::Seed => Ok(Action::Seed),
            MainItem::SafeSearch => {
                ask(&theme, "Введите название для поиска").map(|term| Action::SearchBooks { term })
            }
            MainItem::SafeInsert => prompt_book(&theme).map(Action::AddBook),
            MainItem::AdHocSql => {
                ask(&theme, "SQL (только чтение)").map(|sql| Action::ReadOnlySql { sql })
            }
        };

        dispatch(db, action, format).await?;
    }
}

async fn queries_menu(
    db: &mut LibraryDb,
    theme: &ColorfulTheme,
    format: OutputFormat,
) -> Result<()> {
    println!("{}", banner("   ВЫПОЛНЕНИЕ 10 ОСНОВНЫХ ЗАПРОСОВ"));

    loop {
        let Some(idx) = choose(theme, QUERY_LABELS.as_slice())?.filter(|idx| *idx < 10) else {
            println!("Возврат в главное меню...");
            return Ok(());
        };

        let action = match idx {
            0 => ask(theme, "Введите жанр (например: Фантастика)")
                .map(|genre| Action::BooksByGenre { genre }),
            1 => Ok(Action::MultiAuthorBooks),
            2 => Ok(Action::AuthorBookCounts),
            3 => {
                ask(theme, "Введите название книги").map(|title| Action::AvailableCopies { title })
            }
            4 => Ok(Action::ActiveLoans),
            5 => Ok(Action::OverdueLoans),
            6 => Ok(Action::PopularGenres),
            7 => ask_number(theme, "Введите loan_id").map(|loan_id| Action::ReturnLoan { loan_id }),
            8 => prompt_reader(theme).map(Action::AddReader),
            _ => prompt_issue(theme),
        };

        dispatch(db, action, format).await?;
    }
}

async fn injection_menu(
    db: &mut LibraryDb,
    theme: &ColorfulTheme,
    format: OutputFormat,
) -> Result<()> {
    println!("{}", banner("      ДЕМОНСТРАЦИЯ SQL-ИНЪЕКЦИЙ"));
    let labels = injection_labels();

    loop {
        let Some(demo) = choose(theme, labels.as_slice())?.and_then(|idx| DEMOS.get(idx)) else {
            println!("Возврат в главное меню...");
            return Ok(());
        };

        dispatch(db, Ok(Action::Injection { demo: demo.id }), format).await?;
    }
}

/// Run a prompted action; input errors are reported, terminal errors end the menu
async fn dispatch(db: &mut LibraryDb, action: Result<Action>, format: OutputFormat) -> Result<()> {
    match action {
        Ok(action) => {
            execute_and_print(db, action, format).await;
            Ok(())
        }
        Err(err @ LibraryError::PromptFailed(_)) => Err(err),
        Err(err) => {
            print_error("menu", &err, format);
            Ok(())
        }
    }
}

fn choose<T: ToString>(theme: &ColorfulTheme, items: &[T]) -> Result<Option<usize>> {
    Ok(Select::with_theme(theme).with_prompt("Выбор").items(items).default(0).interact_opt()?)
}

fn ask(theme: &ColorfulTheme, prompt: &str) -> Result<String> {
    Ok(Input::<String>::with_theme(theme).with_prompt(prompt).allow_empty(true).interact_text()?)
}

fn ask_number(theme: &ColorfulTheme, prompt: &str) -> Result<i32> {
    Ok(Input::<i32>::with_theme(theme).with_prompt(prompt).interact_text()?)
}

fn prompt_reader(theme: &ColorfulTheme) -> Result<NewReader> {
    let full_name = ask(theme, "ФИО")?;
    let group = ask(theme, "Группа (опционально)")?;
    let email = ask(theme, "Email (опционально)")?;
    let status = ask(theme, "Статус (active/inactive), по умолчанию active")?;

    NewReader::from_answers(&full_name, &group, &email, &status)
}

fn prompt_issue(theme: &ColorfulTheme) -> Result<Action> {
    let reader_id = ask_number(theme, "Введите reader_id")?;
    let copy_id = ask_number(theme, "Введите copy_id")?;
    let due_date = parse_due_date(&ask(theme, "Введите due_date (YYYY-MM-DD)")?)?;

    Ok(Action::IssueLoan { reader_id, copy_id, due_date })
}

fn prompt_book(theme: &ColorfulTheme) -> Result<NewBook> {
    let title = ask(theme, "Название")?;
    let genre_id = ask_number(theme, "ID жанра")?;
    let isbn = ask(theme, "ISBN (опционально)")?;
    let year = ask(theme, "Год издания (опционально)")?;
    let language = ask(theme, "Язык (опционально)")?;
    let is_reference = ask(theme, "Справочная книга? (да/нет)")?;

    NewBook::from_answers(&title, genre_id, &isbn, &year, &language, &is_reference)
}
