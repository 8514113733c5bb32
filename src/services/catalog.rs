//! Catalog management service

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Search active books with filters
    pub async fn list_books(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        self.repository.books.list(query).await
    }

    /// Get an active book by ID
    pub async fn get_book(&self, id: i64) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Create a new book. Ids are never reused, even after a soft delete.
    pub async fn create_book(&self, book: CreateBook) -> AppResult<Book> {
        if !book.available {
            return Err(AppError::Validation(
                "Un libro nuevo no puede registrarse como prestado".to_string(),
            ));
        }

        match self.repository.books.create(&book).await? {
            Some(created) => {
                tracing::info!("Catalog create: book id={} ({})", created.id, created.title);
                Ok(created)
            }
            None => {
                tracing::debug!("Catalog create: id {} already taken", book.id);
                Err(AppError::Conflict(format!(
                    "Error: Ya existe un libro con el ID {}. Intenta con otro.",
                    book.id
                )))
            }
        }
    }

    /// Overwrite title, author and availability of an active book
    pub async fn update_book(&self, id: i64, data: UpdateBook) -> AppResult<Book> {
        if let Some(updated) = self.repository.books.update(id, &data).await? {
            return Ok(updated);
        }

        // Nothing matched: either the book is missing, or an available book
        // was asked to become unavailable without a borrower.
        self.repository.books.get_by_id(id).await?;
        Err(AppError::Validation(
            "Para marcar un libro como no disponible use el préstamo".to_string(),
        ))
    }

    /// Soft-delete an active book
    pub async fn delete_book(&self, id: i64) -> AppResult<()> {
        if !self.repository.books.soft_delete(id).await? {
            return Err(AppError::book_not_found());
        }
        tracing::info!("Catalog delete: book id={} deactivated", id);
        Ok(())
    }

    /// Check database connectivity
    pub async fn check_database(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_repository;

    fn new_book(id: i64, title: &str, author: &str, category: &str) -> CreateBook {
        CreateBook {
            id,
            title: title.to_string(),
            author: author.to_string(),
            category: category.to_string(),
            available: true,
            active: true,
        }
    }

    async fn service() -> (CatalogService, Repository) {
        let repository = test_repository().await;
        (CatalogService::new(repository.clone()), repository)
    }

    async fn row_count(repository: &Repository, id: i64) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE id = ?")
            .bind(id)
            .fetch_one(&repository.pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (catalog, _) = service().await;

        let created = catalog
            .create_book(new_book(1, "Dune", "Herbert", "Sci-Fi"))
            .await
            .unwrap();
        assert!(created.available);
        assert!(created.active);
        assert_eq!(created.loan_timestamp, None);
        assert_eq!(created.borrower, None);

        let fetched = catalog.get_book(1).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_create_duplicate_id_conflicts() {
        let (catalog, repository) = service().await;

        catalog
            .create_book(new_book(1, "Dune", "Herbert", "Sci-Fi"))
            .await
            .unwrap();
        let err = catalog
            .create_book(new_book(1, "Emma", "Austen", "Classic"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(ref msg) if msg.contains("ID 1")));
        assert_eq!(row_count(&repository, 1).await, 1);
        assert_eq!(catalog.get_book(1).await.unwrap().title, "Dune");
    }

    #[tokio::test]
    async fn test_create_rejects_unavailable_book() {
        let (catalog, repository) = service().await;

        let mut book = new_book(1, "Dune", "Herbert", "Sci-Fi");
        book.available = false;
        let err = catalog.create_book(book).await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(row_count(&repository, 1).await, 0);
    }

    #[tokio::test]
    async fn test_soft_delete() {
        let (catalog, repository) = service().await;
        catalog
            .create_book(new_book(7, "Dune", "Herbert", "Sci-Fi"))
            .await
            .unwrap();

        catalog.delete_book(7).await.unwrap();

        assert!(matches!(catalog.get_book(7).await, Err(AppError::NotFound(_))));
        assert!(matches!(catalog.delete_book(7).await, Err(AppError::NotFound(_))));
        assert!(catalog.list_books(&BookQuery::default()).await.unwrap().is_empty());
        // still stored, still blocks the id
        assert_eq!(row_count(&repository, 7).await, 1);
        assert!(matches!(
            catalog.create_book(new_book(7, "Emma", "Austen", "Classic")).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_create_inactive_book_is_hidden() {
        let (catalog, _) = service().await;

        let mut book = new_book(3, "Dune", "Herbert", "Sci-Fi");
        book.active = false;
        let created = catalog.create_book(book).await.unwrap();
        assert!(!created.active);

        assert!(matches!(catalog.get_book(3).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_overwrites_only_writable_fields() {
        let (catalog, _) = service().await;
        catalog
            .create_book(new_book(1, "Dune", "Herbert", "Sci-Fi"))
            .await
            .unwrap();

        let updated = catalog
            .update_book(
                1,
                UpdateBook {
                    title: "Dune Messiah".into(),
                    author: "Frank Herbert".into(),
                    available: true,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Dune Messiah");
        assert_eq!(updated.author, "Frank Herbert");
        assert_eq!(updated.category, "Sci-Fi");
        assert!(updated.active);
    }

    #[tokio::test]
    async fn test_update_missing_or_deleted_book() {
        let (catalog, _) = service().await;
        let data = UpdateBook {
            title: "Dune".into(),
            author: "Herbert".into(),
            available: true,
        };

        assert!(matches!(
            catalog.update_book(99, data.clone()).await,
            Err(AppError::NotFound(_))
        ));

        catalog
            .create_book(new_book(1, "Dune", "Herbert", "Sci-Fi"))
            .await
            .unwrap();
        catalog.delete_book(1).await.unwrap();
        assert!(matches!(
            catalog.update_book(1, data).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_cannot_lend_without_borrower() {
        let (catalog, _) = service().await;
        catalog
            .create_book(new_book(1, "Dune", "Herbert", "Sci-Fi"))
            .await
            .unwrap();

        let err = catalog
            .update_book(
                1,
                UpdateBook {
                    title: "Changed".into(),
                    author: "Herbert".into(),
                    available: false,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        let book = catalog.get_book(1).await.unwrap();
        assert_eq!(book.title, "Dune");
        assert!(book.available);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let (catalog, repository) = service().await;
        for book in [
            new_book(1, "Dune", "Frank Herbert", "Sci-Fi"),
            new_book(2, "Dune Messiah", "Frank Herbert", "Sci-Fi"),
            new_book(3, "Emma", "Jane Austen", "Classic"),
            new_book(4, "Persuasion", "Jane Austen", "Classic"),
        ] {
            catalog.create_book(book).await.unwrap();
        }
        repository
            .books
            .mark_borrowed(4, "Alice", chrono::Utc::now())
            .await
            .unwrap();

        let ids = |books: Vec<Book>| books.into_iter().map(|b| b.id).collect::<Vec<_>>();

        let all = catalog.list_books(&BookQuery::default()).await.unwrap();
        assert_eq!(ids(all), vec![1, 2, 3, 4]);

        let query = BookQuery {
            title: Some("dUNE".into()),
            ..Default::default()
        };
        assert_eq!(ids(catalog.list_books(&query).await.unwrap()), vec![1, 2]);

        let query = BookQuery {
            author: Some("austen".into()),
            category: Some("CLASS".into()),
            ..Default::default()
        };
        assert_eq!(ids(catalog.list_books(&query).await.unwrap()), vec![3, 4]);

        let query = BookQuery {
            author: Some("austen".into()),
            solo_disponible: true,
            ..Default::default()
        };
        assert_eq!(ids(catalog.list_books(&query).await.unwrap()), vec![3]);

        let query = BookQuery {
            usuario: Some("ali".into()),
            ..Default::default()
        };
        assert_eq!(ids(catalog.list_books(&query).await.unwrap()), vec![4]);

        let query = BookQuery {
            title: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(catalog.list_books(&query).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_filter_text_is_not_a_pattern() {
        let (catalog, _) = service().await;
        catalog
            .create_book(new_book(1, "Dune", "Herbert", "Sci-Fi"))
            .await
            .unwrap();

        let query = BookQuery {
            title: Some("%".into()),
            ..Default::default()
        };
        assert!(catalog.list_books(&query).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_filters_fold_non_ascii_case() {
        let (catalog, repository) = service().await;
        catalog
            .create_book(new_book(1, "Ética para Amador", "Fernando Savater", "Ensayo"))
            .await
            .unwrap();
        catalog
            .create_book(new_book(2, "Dune", "Herbert", "Sci-Fi"))
            .await
            .unwrap();
        repository
            .books
            .mark_borrowed(1, "ñañ", chrono::Utc::now())
            .await
            .unwrap();

        let query = BookQuery {
            usuario: Some("ÑAÑ".into()),
            ..Default::default()
        };
        let books = catalog.list_books(&query).await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].id, 1);

        let query = BookQuery {
            title: Some("ÉTICA".into()),
            ..Default::default()
        };
        let books = catalog.list_books(&query).await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].id, 1);
    }
}
