//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, health, lending};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Mi Biblioteca API",
        version = "1.0.0",
        description = "Book catalog and lending REST API"
    ),
    paths(
        // Health
        health::home,
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Lending
        lending::overdue_report,
        lending::borrow_book,
        lending::return_book,
    ),
    components(
        schemas(
            crate::models::book::Book,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            crate::api::MessageResponse,
            health::HealthResponse,
            health::WelcomeResponse,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "libros", description = "Book catalog management"),
        (name = "prestamos", description = "Borrowing and returns")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();

        for expected in [
            "/",
            "/health",
            "/ready",
            "/libros",
            "/libros/{id}",
            "/libros/{id}/prestar",
            "/libros/{id}/devolver",
            "/libros/reporte/atrasados",
        ] {
            assert!(paths.contains(&expected), "missing path {}", expected);
        }
    }
}
