//! Borrow, return and overdue report endpoints

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::book::{Book, BorrowQuery, OverdueQuery},
};

use super::{MessageResponse, ValidatedPath, ValidatedQuery};

/// Books lent at least `dias` days ago
#[utoipa::path(
    get,
    path = "/libros/reporte/atrasados",
    tag = "prestamos",
    params(OverdueQuery),
    responses(
        (status = 200, description = "Overdue books", body = Vec<Book>),
        (status = 422, description = "dias must be at least 1", body = crate::error::ErrorResponse)
    )
)]
pub async fn overdue_report(
    State(state): State<crate::AppState>,
    ValidatedQuery(query): ValidatedQuery<OverdueQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.lending.overdue_report(query.dias).await?;
    Ok(Json(books))
}

/// Borrow a book
#[utoipa::path(
    post,
    path = "/libros/{id}/prestar",
    tag = "prestamos",
    params(
        ("id" = i64, Path, description = "Book ID"),
        BorrowQuery
    ),
    responses(
        (status = 200, description = "Book lent", body = MessageResponse),
        (status = 400, description = "Book already on loan", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 422, description = "Invalid borrower name", body = crate::error::ErrorResponse)
    )
)]
pub async fn borrow_book(
    State(state): State<crate::AppState>,
    ValidatedPath(id): ValidatedPath<i64>,
    ValidatedQuery(query): ValidatedQuery<BorrowQuery>,
) -> AppResult<Json<MessageResponse>> {
    let book = state.services.lending.borrow(id, &query.usuario).await?;

    Ok(Json(MessageResponse {
        message: format!("Has pedido prestado: {}", book.title),
    }))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/libros/{id}/devolver",
    tag = "prestamos",
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = MessageResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    ValidatedPath(id): ValidatedPath<i64>,
) -> AppResult<Json<MessageResponse>> {
    let book = state.services.lending.return_book(id).await?;

    Ok(Json(MessageResponse {
        message: format!("Has devuelto: {}. ¡Gracias!", book.title),
    }))
}
