//! Books repository for database operations
//!
//! Every mutation is a single conditional statement so that the check and
//! the write happen atomically inside SQLite.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
};

const BOOK_COLUMNS: &str =
    "id, title, author, category, available, active, loan_timestamp, borrower";

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Sqlite>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// List active books matching every supplied filter
    ///
    /// Text filters are Unicode case-insensitive substring matches applied
    /// to the fetched rows.
    pub async fn list(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        let mut sql = format!("SELECT {} FROM books WHERE active = 1", BOOK_COLUMNS);
        if query.solo_disponible {
            sql.push_str(" AND available = 1");
        }
        sql.push_str(" ORDER BY id");

        let books = sqlx::query_as::<_, Book>(&sql)
            .fetch_all(&self.pool)
            .await?;

        let title = folded_filter(&query.title);
        let author = folded_filter(&query.author);
        let category = folded_filter(&query.category);
        let borrower = folded_filter(&query.usuario);

        Ok(books
            .into_iter()
            .filter(|book| {
                filter_matches(&title, Some(&book.title))
                    && filter_matches(&author, Some(&book.author))
                    && filter_matches(&category, Some(&book.category))
                    && filter_matches(&borrower, book.borrower.as_ref())
            })
            .collect())
    }

    /// Get an active book by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Book> {
        self.find_active(id)
            .await?
            .ok_or_else(AppError::book_not_found)
    }

    /// Active book by ID, if any
    pub async fn find_active(&self, id: i64) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books WHERE id = ? AND active = 1",
            BOOK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(book)
    }

    /// Insert a new book. Returns `None` when the id is already taken,
    /// including by a soft-deleted book.
    pub async fn create(&self, book: &CreateBook) -> AppResult<Option<Book>> {
        let created = sqlx::query_as::<_, Book>(&format!(
            r#"
            INSERT INTO books (id, title, author, category, available, active)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO NOTHING
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(book.id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.category)
        .bind(book.available)
        .bind(book.active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(created)
    }

    /// Overwrite title, author and availability of an active book.
    ///
    /// Making a lent book available clears its loan fields. Making an
    /// available book unavailable matches no row, since there is no borrower
    /// to record.
    pub async fn update(&self, id: i64, data: &UpdateBook) -> AppResult<Option<Book>> {
        let updated = sqlx::query_as::<_, Book>(&format!(
            r#"
            UPDATE books
            SET title = ?,
                author = ?,
                available = ?,
                loan_timestamp = CASE WHEN ? THEN NULL ELSE loan_timestamp END,
                borrower = CASE WHEN ? THEN NULL ELSE borrower END
            WHERE id = ? AND active = 1 AND (? OR available = 0)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(&data.title)
        .bind(&data.author)
        .bind(data.available)
        .bind(data.available)
        .bind(data.available)
        .bind(id)
        .bind(data.available)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    /// Mark an active book as deleted. Returns false if there was none.
    pub async fn soft_delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("UPDATE books SET active = 0 WHERE id = ? AND active = 1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Available -> OnLoan, only if the book is active and available
    pub async fn mark_borrowed(
        &self,
        id: i64,
        borrower: &str,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!(
            r#"
            UPDATE books
            SET available = 0, loan_timestamp = ?, borrower = ?
            WHERE id = ? AND active = 1 AND available = 1
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(at)
        .bind(borrower)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(book)
    }

    /// Any state -> Available, only if the book is active
    pub async fn mark_returned(&self, id: i64) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!(
            r#"
            UPDATE books
            SET available = 1, loan_timestamp = NULL, borrower = NULL
            WHERE id = ? AND active = 1
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(book)
    }

    /// Active books on loan since `cutoff` or earlier
    pub async fn list_lent_before(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!(
            r#"
            SELECT {}
            FROM books
            WHERE active = 1
              AND available = 0
              AND julianday(loan_timestamp) <= julianday(?)
            ORDER BY loan_timestamp
            "#,
            BOOK_COLUMNS
        ))
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }
}

/// Lowercased filter text, `None` when absent or empty
fn folded_filter(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}

fn filter_matches(filter: &Option<String>, field: Option<&String>) -> bool {
    match filter {
        None => true,
        Some(needle) => field.is_some_and(|value| value.to_lowercase().contains(needle.as_str())),
    }
}
