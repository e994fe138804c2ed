//! Catalog service for books

use std::collections::BTreeSet;

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult, ErrorCode},
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
    repository::{DeleteOutcome, Repository},
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        let books = self.repository.books.list().await?;
        Ok(books.into_iter().filter(|b| query.matches(b)).collect())
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Book> {
        self.repository
            .books
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }

    pub async fn create(&self, data: &CreateBook) -> AppResult<Book> {
        let book = self.repository.books.create(data).await?;
        tracing::info!("Added book {} ({} copies)", book.id, book.total_copies);
        Ok(book)
    }

    pub async fn update(&self, id: Uuid, data: &UpdateBook) -> AppResult<Book> {
        self.repository
            .books
            .update(id, data)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }

    /// Remove a book from the catalog. Refused while copies are out.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        match self.repository.books.delete(id).await? {
            DeleteOutcome::Deleted => {
                tracing::info!("Removed book {}", id);
                Ok(())
            }
            DeleteOutcome::NotFound => Err(AppError::NotFound(format!("Book {} not found", id))),
            DeleteOutcome::InUse => Err(AppError::BusinessRule(
                ErrorCode::BookIssued,
                "Book is currently issued".to_string(),
            )),
        }
    }

    /// Distinct categories, sorted
    pub async fn categories(&self) -> AppResult<Vec<String>> {
        let books = self.repository.books.list().await?;
        Ok(books
            .into_iter()
            .map(|b| b.category)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::repository::{MockBookStore, MockMemberStore, MockTransactionStore};

    fn create(title: &str, category: &str, total_copies: i32) -> CreateBook {
        CreateBook {
            title: title.to_string(),
            author: "Harper Lee".to_string(),
            isbn: "978-0-06-112008-4".to_string(),
            category: category.to_string(),
            published_year: Some(1960),
            description: None,
            cover_url: None,
            total_copies,
        }
    }

    #[tokio::test]
    async fn created_books_start_fully_available() {
        let service = CatalogService::new(Repository::in_memory());
        let book = service.create(&create("To Kill a Mockingbird", "Fiction", 3)).await.unwrap();

        assert_eq!(book.total_copies, 3);
        assert_eq!(book.available_copies, 3);
        assert_eq!(service.get_by_id(book.id).await.unwrap(), book);
    }

    #[tokio::test]
    async fn missing_books_are_not_found() {
        let service = CatalogService::new(Repository::in_memory());
        let id = Uuid::new_v4();

        assert!(matches!(service.get_by_id(id).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            service.update(id, &UpdateBook::default()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(service.delete(id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn categories_are_distinct_and_sorted() {
        let service = CatalogService::new(Repository::in_memory());
        service.create(&create("Dune", "Science Fiction", 1)).await.unwrap();
        service.create(&create("Emma", "Fiction", 1)).await.unwrap();
        service.create(&create("Persuasion", "Fiction", 1)).await.unwrap();

        assert_eq!(service.categories().await.unwrap(), vec!["Fiction", "Science Fiction"]);

        let query = BookQuery { search: None, category: Some("Fiction".to_string()) };
        let titles: Vec<_> = service
            .list(&query)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, vec!["Emma", "Persuasion"]);
    }

    #[tokio::test]
    async fn reserved_copy_blocks_delete_until_released() {
        let repository = Repository::in_memory();
        let service = CatalogService::new(repository.clone());
        let book = service.create(&create("Emma", "Fiction", 1)).await.unwrap();

        // Copy taken off the shelf by an issue whose ledger entry is not written yet
        assert!(repository.books.reserve_copy(book.id).await.unwrap());
        assert!(matches!(
            service.delete(book.id).await,
            Err(AppError::BusinessRule(ErrorCode::BookIssued, _))
        ));
        assert!(service.get_by_id(book.id).await.is_ok());

        assert!(repository.books.release_copy(book.id).await.unwrap());
        service.delete(book.id).await.unwrap();
        assert!(matches!(service.get_by_id(book.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn issued_books_cannot_be_deleted() {
        let mut books = MockBookStore::new();
        books
            .expect_delete()
            .times(1)
            .returning(|_| Ok(DeleteOutcome::InUse));

        let service = CatalogService::new(Repository::new(
            Arc::new(books),
            Arc::new(MockMemberStore::new()),
            Arc::new(MockTransactionStore::new()),
        ));

        assert!(matches!(
            service.delete(Uuid::new_v4()).await,
            Err(AppError::BusinessRule(ErrorCode::BookIssued, _))
        ));
    }
}
