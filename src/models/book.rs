//! Book (catalog record) model and related types

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::error::{AppError, AppResult, ErrorCode};

static ISBN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\d{9}[\dX]|\d{13})$").expect("ISBN pattern is valid"));

/// Accepts ISBN-10 and ISBN-13, ignoring hyphens and spaces
pub fn validate_isbn(isbn: &str) -> Result<(), ValidationError> {
    let compact: String = isbn
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if ISBN_RE.is_match(&compact) {
        Ok(())
    } else {
        let mut err = ValidationError::new("isbn");
        err.message = Some("ISBN must have 10 or 13 digits".into());
        Err(err)
    }
}

/// Book record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category: String,
    pub published_year: Option<i32>,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    /// Copies owned by the library
    pub total_copies: i32,
    /// Copies currently on the shelf
    pub available_copies: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Copies currently out on loan
    pub fn issued_copies(&self) -> i32 {
        self.total_copies - self.available_copies
    }
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    #[validate(custom(function = "validate_isbn"))]
    pub isbn: String,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,
    #[validate(range(min = 1, max = 2100, message = "Invalid publication year"))]
    pub published_year: Option<i32>,
    pub description: Option<String>,
    #[validate(url(message = "Invalid cover URL"))]
    pub cover_url: Option<String>,
    #[validate(range(min = 1, message = "A book needs at least one copy"))]
    pub total_copies: i32,
}

/// Update book request. Absent fields are left untouched.
///
/// Changing `totalCopies` shifts `availableCopies` by the same amount.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBook {
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Author cannot be empty"))]
    pub author: Option<String>,
    #[validate(custom(function = "validate_isbn"))]
    pub isbn: Option<String>,
    #[validate(length(min = 1, message = "Category cannot be empty"))]
    pub category: Option<String>,
    #[validate(range(min = 1, max = 2100, message = "Invalid publication year"))]
    pub published_year: Option<i32>,
    pub description: Option<String>,
    #[validate(url(message = "Invalid cover URL"))]
    pub cover_url: Option<String>,
    #[validate(range(min = 1, message = "A book needs at least one copy"))]
    pub total_copies: Option<i32>,
}

impl UpdateBook {
    /// Apply the present fields onto an existing record.
    ///
    /// Fails without touching the record when the new total would leave
    /// fewer copies than are currently issued.
    pub fn apply_to(&self, book: &mut Book) -> AppResult<()> {
        if let Some(total) = self.total_copies {
            let available = book.available_copies + (total - book.total_copies);
            if available < 0 {
                return Err(AppError::BusinessRule(
                    ErrorCode::BookIssued,
                    format!(
                        "Cannot reduce total copies to {}: {} copies are issued",
                        total,
                        book.issued_copies()
                    ),
                ));
            }
            book.total_copies = total;
            book.available_copies = available;
        }
        if let Some(ref title) = self.title {
            book.title = title.clone();
        }
        if let Some(ref author) = self.author {
            book.author = author.clone();
        }
        if let Some(ref isbn) = self.isbn {
            book.isbn = isbn.clone();
        }
        if let Some(ref category) = self.category {
            book.category = category.clone();
        }
        if self.published_year.is_some() {
            book.published_year = self.published_year;
        }
        if self.description.is_some() {
            book.description = self.description.clone();
        }
        if self.cover_url.is_some() {
            book.cover_url = self.cover_url.clone();
        }
        Ok(())
    }
}

/// Book list filters
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Case-insensitive match on title, author or ISBN
    pub search: Option<String>,
    /// Exact category
    pub category: Option<String>,
}

impl BookQuery {
    pub fn matches(&self, book: &Book) -> bool {
        let matches_search = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                book.title.to_lowercase().contains(&term)
                    || book.author.to_lowercase().contains(&term)
                    || book.isbn.to_lowercase().contains(&term)
            }
        };

        let matches_category = match self.category.as_deref() {
            None | Some("") => true,
            Some(category) => book.category == category,
        };

        matches_search && matches_category
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn book(title: &str, author: &str, category: &str, total: i32) -> Book {
        let now = Utc::now();
        Book {
            id: Uuid::new_v4(),
            title: title.to_string(),
            author: author.to_string(),
            isbn: "978-0-452-28423-4".to_string(),
            category: category.to_string(),
            published_year: None,
            description: None,
            cover_url: None,
            total_copies: total,
            available_copies: total,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn isbn_validation() {
        assert!(validate_isbn("978-0-7432-7356-5").is_ok());
        assert!(validate_isbn("0-306-40615-x").is_ok());
        assert!(validate_isbn("12345").is_err());
        assert!(validate_isbn("978-0-7432-7356-5-1").is_err());
    }

    #[test]
    fn create_book_rejects_zero_copies() {
        let request = CreateBook {
            title: "1984".to_string(),
            author: "George Orwell".to_string(),
            isbn: "978-0-452-28423-4".to_string(),
            category: "Science Fiction".to_string(),
            published_year: Some(1949),
            description: None,
            cover_url: None,
            total_copies: 0,
        };
        assert!(request.validate().is_err());
        assert!(CreateBook { total_copies: 6, ..request }.validate().is_ok());
    }

    #[test]
    fn update_shifts_available_copies_with_total() {
        let mut orwell = book("1984", "George Orwell", "Science Fiction", 6);
        orwell.available_copies = 4;

        UpdateBook { total_copies: Some(8), ..Default::default() }
            .apply_to(&mut orwell)
            .unwrap();
        assert_eq!((orwell.total_copies, orwell.available_copies), (8, 6));

        let shrink = UpdateBook {
            title: Some("Nineteen Eighty-Four".to_string()),
            total_copies: Some(1),
            ..Default::default()
        };
        assert!(shrink.apply_to(&mut orwell).is_err());
        assert_eq!(orwell.title, "1984");
        assert_eq!((orwell.total_copies, orwell.available_copies), (8, 6));
    }

    #[test]
    fn query_matches_title_author_and_category() {
        let gatsby = book("The Great Gatsby", "F. Scott Fitzgerald", "Fiction", 5);

        let by_author = BookQuery { search: Some("fitz".to_string()), category: None };
        assert!(by_author.matches(&gatsby));

        let wrong_category = BookQuery {
            search: Some("gatsby".to_string()),
            category: Some("History".to_string()),
        };
        assert!(!wrong_category.matches(&gatsby));

        assert!(BookQuery::default().matches(&gatsby));
    }
}
