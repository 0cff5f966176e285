//! Catalog service
//!
//! Thin layer over [`BookStore`]: converts records to API models and maps
//! store failures to API errors.

use crate::error::ApiError;
use crate::repositories::{BookDraft, BookRecord, BookStore};
use library_catalog_shared::models::Book;
use library_catalog_shared::types::{BookSort, CreateBookRequest};
use tracing::info;

fn to_books(records: Vec<BookRecord>) -> Vec<Book> {
    records.into_iter().map(Book::from).collect()
}

/// Catalog operations
pub struct CatalogService;

impl CatalogService {
    /// Whole catalog in the requested order
    pub async fn list(books: &dyn BookStore, sort: BookSort) -> Result<Vec<Book>, ApiError> {
        let records = match sort {
            BookSort::Title => books.sorted_by_title().await?,
            BookSort::PublishYear => books.sorted_by_publish_year().await?,
        };
        Ok(to_books(records))
    }

    pub async fn find_by_isbn(books: &dyn BookStore, isbn: &str) -> Result<Book, ApiError> {
        books
            .find_by_isbn(isbn.trim())
            .await?
            .map(Book::from)
            .ok_or_else(|| ApiError::NotFound {
                field: "isbn",
                message: "No book with this ISBN".to_string(),
            })
    }

    /// Search by author and/or title fragment. With both given, a book
    /// must match both; with neither, the whole catalog is returned.
    pub async fn search(
        books: &dyn BookStore,
        author: Option<&str>,
        title: Option<&str>,
    ) -> Result<Vec<Book>, ApiError> {
        let author = author.map(str::trim).filter(|s| !s.is_empty());
        let title = title.map(str::trim).filter(|s| !s.is_empty());

        let records = match (author, title) {
            (Some(author), Some(title)) => books.search(author, title).await?,
            (Some(author), None) => books.find_by_author(author).await?,
            (None, Some(title)) => books.find_by_title(title).await?,
            (None, None) => books.sorted_by_title().await?,
        };
        Ok(to_books(records))
    }

    /// Books whose genre contains `genre` and with at least `min_stock` copies
    pub async fn filter(
        books: &dyn BookStore,
        genre: &str,
        min_stock: i32,
    ) -> Result<Vec<Book>, ApiError> {
        Ok(to_books(books.filter(genre.trim(), min_stock).await?))
    }

    /// Add a book after schema validation
    pub async fn create(books: &dyn BookStore, req: CreateBookRequest) -> Result<Book, ApiError> {
        let draft = BookDraft::from(req);
        draft.check()?;

        let record = books.create(draft).await?;
        info!(book_id = %record.id, isbn = %record.isbn, "Book added to catalog");
        Ok(record.into())
    }
}
