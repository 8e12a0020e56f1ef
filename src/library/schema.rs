//! Table creation and the sample data set.

use tracing::info;

use crate::engine::postgres::{begin, commit, run};
use crate::error::Result;
use crate::library::LibraryDb;

/// `CREATE TABLE` statements, in dependency order
pub const CREATE_TABLES: [&str; 7] = [
    "CREATE TABLE IF NOT EXISTS genres (
        genre_id SERIAL PRIMARY KEY,
        genre VARCHAR(100) NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS authors (
        author_id SERIAL PRIMARY KEY,
        full_name VARCHAR(200) NOT NULL,
        country VARCHAR(100)
    )",
    "CREATE TABLE IF NOT EXISTS readers (
        reader_id SERIAL PRIMARY KEY,
        full_name VARCHAR(200) NOT NULL,
        \"group\" VARCHAR(50),
        email VARCHAR(150) UNIQUE,
        status VARCHAR(50) NOT NULL DEFAULT 'active',
        registration_date DATE NOT NULL DEFAULT CURRENT_DATE
    )",
    "CREATE TABLE IF NOT EXISTS books (
        book_id SERIAL PRIMARY KEY,
        genre_id INT REFERENCES genres(genre_id),
        title VARCHAR(255) NOT NULL,
        isbn VARCHAR(32) UNIQUE,
        published_year INT,
        language VARCHAR(50),
        is_reference BOOLEAN NOT NULL DEFAULT FALSE
    )",
    "CREATE TABLE IF NOT EXISTS book_authors (
        book_id INT NOT NULL REFERENCES books(book_id) ON DELETE CASCADE,
        author_id INT NOT NULL REFERENCES authors(author_id) ON DELETE CASCADE,
        PRIMARY KEY (book_id, author_id)
    )",
    "CREATE TABLE IF NOT EXISTS copies (
        copy_id SERIAL PRIMARY KEY,
        book_id INT NOT NULL REFERENCES books(book_id) ON DELETE CASCADE,
        inventory_number VARCHAR(50) UNIQUE,
        location VARCHAR(100),
        status VARCHAR(50) NOT NULL DEFAULT 'in_stock'
    )",
    "CREATE TABLE IF NOT EXISTS loans (
        loan_id SERIAL PRIMARY KEY,
        reader_id INT NOT NULL REFERENCES readers(reader_id),
        copy_id INT NOT NULL REFERENCES copies(copy_id),
        loan_date DATE NOT NULL DEFAULT CURRENT_DATE,
        due_date DATE NOT NULL,
        return_date DATE,
        fine_amount NUMERIC(10,2) NOT NULL DEFAULT 0
    )",
];

const TRUNCATE_ALL: &str =
    "TRUNCATE loans, copies, book_authors, books, authors, readers, genres CASCADE";

/// Sample rows: one overdue loan (copy 2) and one current loan (copy 3)
pub const SEED_INSERTS: [&str; 7] = [
    "INSERT INTO genres (genre_id, genre) VALUES
        (1, 'Фантастика'), (2, 'История'), (3, 'Классика'), (4, 'Научпоп')",
    "INSERT INTO authors (author_id, full_name, country) VALUES
        (1, 'Айзек Азимов', 'США'),
        (2, 'Лев Толстой', 'Россия'),
        (3, 'Юваль Харари', 'Израиль'),
        (4, 'Братья Стругацкие', 'Россия')",
    "INSERT INTO readers (reader_id, full_name, \"group\", email, status, registration_date) VALUES
        (1, 'Иван Петров', 'БИБ-101', 'ivan@example.com', 'active', CURRENT_DATE - 30),
        (2, 'Мария Соколова', 'БИБ-102', 'maria@example.com', 'active', CURRENT_DATE - 10),
        (3, 'Алексей Ким', NULL, 'alex@example.com', 'inactive', CURRENT_DATE - 100)",
    "INSERT INTO books (book_id, genre_id, title, isbn, published_year, language, is_reference) VALUES
        (1, 1, 'Основание', '978-1-234', 1951, 'ru', false),
        (2, 3, 'Война и мир', '978-1-235', 1869, 'ru', false),
        (3, 4, 'Sapiens', '978-1-236', 2011, 'en', false),
        (4, 1, 'Понедельник начинается в субботу', '978-1-237', 1965, 'ru', false)",
    "INSERT INTO book_authors (book_id, author_id) VALUES (1, 1), (2, 2), (3, 3), (4, 4)",
    "INSERT INTO copies (copy_id, book_id, inventory_number, location, status) VALUES
        (1, 1, 'INV-001', 'Абонемент', 'in_stock'),
        (2, 1, 'INV-002', 'Зал 1', 'loaned'),
        (3, 2, 'INV-003', 'Абонемент', 'loaned'),
        (4, 3, 'INV-004', 'Зал 2', 'in_stock'),
        (5, 4, 'INV-005', 'Зал 1', 'in_stock')",
    "INSERT INTO loans (loan_id, reader_id, copy_id, loan_date, due_date, return_date, fine_amount) VALUES
        (1, 1, 2, CURRENT_DATE - 15, CURRENT_DATE - 5, NULL, 0),
        (2, 2, 3, CURRENT_DATE - 7, CURRENT_DATE + 7, NULL, 0)",
];

/// `(table, id column)` of every SERIAL key
pub const SERIAL_KEYS: [(&str, &str); 6] = [
    ("genres", "genre_id"),
    ("authors", "author_id"),
    ("readers", "reader_id"),
    ("books", "book_id"),
    ("copies", "copy_id"),
    ("loans", "loan_id"),
];

/// Move a sequence past the highest explicit id so later inserts don't collide
#[must_use]
pub fn sequence_reset_sql(table: &str, id_column: &str) -> String {
    format!(
        "SELECT setval('{table}_{id_column}_seq', COALESCE((SELECT MAX({id_column}) FROM {table}), 0) + 1, false)"
    )
}

impl LibraryDb {
    /// Create every table that does not exist yet
    pub async fn init_schema(&mut self) -> Result<()> {
        let tx = begin(&mut self.client).await?;
        for ddl in CREATE_TABLES {
            run(&tx, ddl, &[]).await?;
        }
        commit(tx).await?;

        info!(tables = CREATE_TABLES.len(), "schema ready");
        Ok(())
    }

    /// Replace all data with the sample set
    pub async fn seed(&mut self) -> Result<()> {
        let tx = begin(&mut self.client).await?;

        run(&tx, TRUNCATE_ALL, &[]).await?;
        for insert in SEED_INSERTS {
            run(&tx, insert, &[]).await?;
        }
        for (table, id_column) in SERIAL_KEYS {
            // setval returns a row; execute discards it
            run(&tx, &sequence_reset_sql(table, id_column), &[]).await?;
        }

        commit(tx).await?;
        info!("sample data loaded");
        Ok(())
    }
}
