//! Lending workflow: borrow, return and the overdue report
//!
//! A book is either `Available` or `OnLoan`. Borrowing moves it from
//! `Available` to `OnLoan` and records who took it and when; returning moves
//! it back from either state and clears both loan fields.

use chrono::{Duration, Utc};

use crate::{
    config::LendingConfig,
    error::{AppError, AppResult},
    models::book::Book,
    repository::Repository,
};

/// Shown when a lent book has no recorded borrower
const UNKNOWN_BORROWER: &str = "otro usuario";

#[derive(Clone)]
pub struct LendingService {
    repository: Repository,
    config: LendingConfig,
}

impl LendingService {
    pub fn new(repository: Repository, config: LendingConfig) -> Self {
        Self { repository, config }
    }

    /// Lend an active, available book to `borrower`
    pub async fn borrow(&self, id: i64, borrower: &str) -> AppResult<Book> {
        let now = Utc::now();

        if let Some(book) = self.repository.books.mark_borrowed(id, borrower, now).await? {
            tracing::info!("Lending: book id={} lent to {}", id, borrower);
            return Ok(book);
        }

        let current = self.repository.books.get_by_id(id).await?;
        let holder = current.borrower.as_deref().unwrap_or(UNKNOWN_BORROWER);
        tracing::debug!("Lending: book id={} already lent to {}", id, holder);
        Err(AppError::OnLoan(format!("El libro ya lo tiene {}", holder)))
    }

    /// Take a book back. Returning a book that is not lent is accepted.
    pub async fn return_book(&self, id: i64) -> AppResult<Book> {
        let book = self
            .repository
            .books
            .mark_returned(id)
            .await?
            .ok_or_else(AppError::book_not_found)?;

        tracing::info!("Lending: book id={} returned", id);
        Ok(book)
    }

    /// Active books lent `threshold_days` days ago or earlier
    pub async fn overdue_report(&self, threshold_days: Option<i64>) -> AppResult<Vec<Book>> {
        let days = threshold_days.unwrap_or(self.config.default_overdue_days);
        if days < 1 {
            return Err(AppError::Validation(
                "dias: debe ser mayor o igual a 1".to_string(),
            ));
        }

        let cutoff = Duration::try_days(days)
            .and_then(|span| Utc::now().checked_sub_signed(span))
            .ok_or_else(|| AppError::Validation(format!("dias: {} fuera de rango", days)))?;

        let books = self.repository.books.list_lent_before(cutoff).await?;
        tracing::debug!("Overdue report: {} books lent before {}", books.len(), cutoff);
        Ok(books)
    }
}
