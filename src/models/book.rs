//! Book model and the request shapes validated at the API boundary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

pub const DEFAULT_CATEGORY: &str = "General";

/// Book record as stored in the `books` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub category: String,
    /// False while the book is on loan
    pub available: bool,
    /// False once the book has been soft-deleted
    pub active: bool,
    pub loan_timestamp: Option<DateTime<Utc>>,
    pub borrower: Option<String>,
}

impl Book {
    /// Availability flag and loan fields agree with each other
    #[cfg(test)]
    pub(crate) fn loan_fields_consistent(&self) -> bool {
        if self.available {
            self.loan_timestamp.is_none() && self.borrower.is_none()
        } else {
            self.loan_timestamp.is_some() && self.borrower.is_some()
        }
    }
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

fn default_true() -> bool {
    true
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    /// Caller-chosen identifier, never reusable
    pub id: i64,
    #[serde(alias = "titulo")]
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[serde(alias = "autor")]
    #[validate(length(min = 3, max = 50))]
    pub author: String,
    #[serde(alias = "categoria", default = "default_category")]
    #[validate(length(min = 3, max = 20))]
    pub category: String,
    #[serde(alias = "disponible", default = "default_true")]
    pub available: bool,
    #[serde(alias = "activo", default = "default_true")]
    pub active: bool,
}

/// Update book request. Only these fields are writable after creation.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[serde(alias = "titulo")]
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[serde(alias = "autor")]
    #[validate(length(min = 3, max = 50))]
    pub author: String,
    #[serde(alias = "disponible", default = "default_true")]
    pub available: bool,
}

/// Book list filters. Text filters are case-insensitive substring matches.
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    #[serde(alias = "titulo")]
    pub title: Option<String>,
    #[serde(alias = "autor")]
    pub author: Option<String>,
    #[serde(alias = "categoria")]
    pub category: Option<String>,
    /// Only return books that are not on loan
    #[serde(default)]
    pub solo_disponible: bool,
    /// Borrower name
    pub usuario: Option<String>,
}

/// Borrow request parameters
#[derive(Debug, Clone, Deserialize, Validate, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BorrowQuery {
    /// Name of the borrower
    #[validate(length(min = 3, max = 50))]
    pub usuario: String,
}

/// Overdue report parameters
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct OverdueQuery {
    /// Days a loan may last before it is reported (default 7)
    #[validate(range(min = 1))]
    pub dias: Option<i64>,
}
