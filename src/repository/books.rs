//! Books repository for database operations

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::{BookStore, DeleteOutcome};
use crate::{
    error::{AppError, AppResult, ErrorCode},
    models::{
        book::{Book, CreateBook, UpdateBook},
        enums::TransactionStatus,
    },
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for BooksRepository {
    async fn list(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY seq")
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn create(&self, data: &CreateBook) -> AppResult<Book> {
        let now = Utc::now();
        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (
                id, title, author, isbn, category, published_year, description,
                cover_url, total_copies, available_copies, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9, $10, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.title)
        .bind(&data.author)
        .bind(&data.isbn)
        .bind(&data.category)
        .bind(data.published_year)
        .bind(&data.description)
        .bind(&data.cover_url)
        .bind(data.total_copies)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(book)
    }

    async fn update(&self, id: Uuid, data: &UpdateBook) -> AppResult<Option<Book>> {
        let now = Utc::now();
        let mut sets = vec!["updated_at = $1".to_string()];
        let mut idx = 2;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, idx));
                    idx += 1;
                }
            };
        }

        add_field!(data.title, "title");
        add_field!(data.author, "author");
        add_field!(data.isbn, "isbn");
        add_field!(data.category, "category");
        add_field!(data.published_year, "published_year");
        add_field!(data.description, "description");
        add_field!(data.cover_url, "cover_url");

        // The available count follows the total; refuse to drop below the issued copies
        let mut guard = String::new();
        if data.total_copies.is_some() {
            sets.push(format!(
                "total_copies = ${0}, available_copies = available_copies + (${0} - total_copies)",
                idx
            ));
            guard = format!(" AND available_copies + (${} - total_copies) >= 0", idx);
            idx += 1;
        }

        let query = format!(
            "UPDATE books SET {} WHERE id = ${}{} RETURNING *",
            sets.join(", "),
            idx,
            guard
        );

        let mut builder = sqlx::query_as::<_, Book>(&query).bind(now);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(data.title);
        bind_field!(data.author);
        bind_field!(data.isbn);
        bind_field!(data.category);
        bind_field!(data.published_year);
        bind_field!(data.description);
        bind_field!(data.cover_url);
        bind_field!(data.total_copies);

        if let Some(book) = builder.bind(id).fetch_optional(&self.pool).await? {
            return Ok(Some(book));
        }

        // Either the book is gone or the guard refused the new total
        match (self.find_by_id(id).await?, data.total_copies) {
            (Some(book), Some(total)) => Err(AppError::BusinessRule(
                ErrorCode::BookIssued,
                format!(
                    "Cannot reduce total copies to {}: {} copies are issued",
                    total,
                    book.issued_copies()
                ),
            )),
            _ => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> AppResult<DeleteOutcome> {
        let mut tx = self.pool.begin().await?;

        // Row lock: reserve/release on this book wait until we commit
        let copies: Option<(i32, i32)> = sqlx::query_as(
            "SELECT total_copies, available_copies FROM books WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((total, available)) = copies else {
            return Ok(DeleteOutcome::NotFound);
        };

        let active: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM transactions WHERE book_id = $1 AND status <> $2)",
        )
        .bind(id)
        .bind(TransactionStatus::Returned)
        .fetch_one(&mut *tx)
        .await?;

        if active || available < total {
            return Ok(DeleteOutcome::InUse);
        }

        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(DeleteOutcome::Deleted)
    }

    async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn reserve_copy(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET available_copies = available_copies - 1, updated_at = $2
            WHERE id = $1 AND available_copies > 0
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn release_copy(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET available_copies = available_copies + 1, updated_at = $2
            WHERE id = $1 AND available_copies < total_copies
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
