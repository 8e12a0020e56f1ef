//! library-admin CLI Entry Point
//!
//! Without a subcommand the interactive menu starts. Every other subcommand
//! runs one operation and exits; status 1 means it failed.
//!
//! Results go to stdout (text, or JSON envelopes with `--json`). Logs go to
//! stderr, filtered by `RUST_LOG` (default `warn`).

use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use library_admin::action::print_error;
use library_admin::library::models::parse_due_date;
use library_admin::{
    execute_and_print, menu, resolve_settings, Action, ConnectionOverrides, LibraryDb, NewBook,
    NewReader, OutputFormat,
};

/// Library lending database administration
#[derive(Parser)]
#[command(name = "library-admin")]
#[command(about = "Administration CLI for a PostgreSQL library lending database")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Print results as JSON envelopes
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Connection overrides; these win over environment and config files
#[derive(Args)]
struct ConnectionArgs {
    #[arg(long, global = true)]
    host: Option<String>,

    #[arg(long, global = true)]
    port: Option<u16>,

    #[arg(long, global = true)]
    dbname: Option<String>,

    #[arg(long, global = true)]
    user: Option<String>,

    #[arg(long, global = true)]
    password: Option<String>,
}

impl From<ConnectionArgs> for ConnectionOverrides {
    fn from(args: ConnectionArgs) -> Self {
        Self {
            host: args.host,
            port: args.port,
            database: args.dbname,
            user: args.user,
            password: args.password,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive menu (default)
    Menu,

    /// Create all tables
    Init,

    /// Replace all data with the sample set
    Seed,

    /// 1. Books of one genre
    BooksByGenre { genre: String },

    /// 2. Books with more than one author
    MultiAuthorBooks,

    /// 3. Authors with their number of books
    AuthorBookCounts,

    /// 4. In-stock copies of a title
    AvailableCopies { title: String },

    /// 5. Open loans
    ActiveLoans,

    /// 6. Open loans past due
    OverdueLoans,

    /// 7. Genres by number of loans
    PopularGenres,

    /// 8. Return a loan and compute the fine
    ReturnLoan { loan_id: i32 },

    /// 9. Register a reader
    AddReader {
        full_name: String,
        #[arg(long, default_value = "")]
        group: String,
        #[arg(long, default_value = "")]
        email: String,
        /// active or inactive
        #[arg(long, default_value = "")]
        status: String,
    },

    /// 10. Issue a copy to a reader
    IssueLoan {
        reader_id: i32,
        copy_id: i32,
        /// YYYY-MM-DD
        due_date: String,
    },

    /// Case-insensitive title search
    SearchBooks { term: String },

    /// Add a book
    AddBook {
        title: String,
        #[arg(long)]
        genre_id: i32,
        #[arg(long, default_value = "")]
        isbn: String,
        #[arg(long, default_value = "")]
        year: String,
        #[arg(long, default_value = "")]
        language: String,
        /// да/нет
        #[arg(long, default_value = "нет")]
        reference: String,
    },

    /// Show an SQL-injection demo (1-5)
    Injection { demo: u8 },

    /// Run one read-only SQL statement
    Sql { sql: String },
}

impl Commands {
    /// `None` for the menu
    fn into_action(self) -> library_admin::Result<Option<Action>> {
        Ok(Some(match self {
            Self::Menu => return Ok(None),
            Self::Init => Action::InitSchema,
            Self::Seed => Action::Seed,
            Self::BooksByGenre { genre } => Action::BooksByGenre { genre },
            Self::MultiAuthorBooks => Action::MultiAuthorBooks,
            Self::AuthorBookCounts => Action::AuthorBookCounts,
            Self::AvailableCopies { title } => Action::AvailableCopies { title },
            Self::ActiveLoans => Action::ActiveLoans,
            Self::OverdueLoans => Action::OverdueLoans,
            Self::PopularGenres => Action::PopularGenres,
            Self::ReturnLoan { loan_id } => Action::ReturnLoan { loan_id },
            Self::AddReader { full_name, group, email, status } => {
                Action::AddReader(NewReader::from_answers(&full_name, &group, &email, &status)?)
            }
            Self::IssueLoan { reader_id, copy_id, due_date } => {
                Action::IssueLoan { reader_id, copy_id, due_date: parse_due_date(&due_date)? }
            }
            Self::SearchBooks { term } => Action::SearchBooks { term },
            Self::AddBook { title, genre_id, isbn, year, language, reference } => Action::AddBook(
                NewBook::from_answers(&title, genre_id, &isbn, &year, &language, &reference)?,
            ),
            Self::Injection { demo } => Action::Injection { demo },
            Self::Sql { sql } => Action::ReadOnlySql { sql },
        }))
    }
}

fn init_logging() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!(e))
        .context("Failed to initialize logging")
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_logging()?;

    let cli = Cli::parse();
    let format = if cli.json { OutputFormat::Json } else { OutputFormat::Text };
    let command = cli.command.unwrap_or(Commands::Menu);

    // Reject bad arguments before spending up to 20 connection attempts
    let action = match command.into_action() {
        Ok(action) => action,
        Err(err) => {
            print_error("cli", &err, format);
            return Ok(ExitCode::FAILURE);
        }
    };
    let command_name = action.as_ref().map_or("menu", Action::command);

    match run(&cli.connection.into(), action, format).await {
        Ok(true) => Ok(ExitCode::SUCCESS),
        Ok(false) => Ok(ExitCode::FAILURE),
        Err(err) => {
            print_error(command_name, &err, format);
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(
    overrides: &ConnectionOverrides,
    action: Option<Action>,
    format: OutputFormat,
) -> library_admin::Result<bool> {
    let settings = resolve_settings(overrides)?;
    let mut db = LibraryDb::connect(&settings).await?;

    if format == OutputFormat::Text {
        println!("Подключение к БД установлено");
    }

    match action {
        Some(action) => Ok(execute_and_print(&mut db, action, format).await),
        None => {
            menu::run(&mut db, format).await?;
            Ok(true)
        }
    }
}
