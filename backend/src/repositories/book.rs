//! Catalog store: books
//!
//! Sorting, searching and filtering are single SQL queries; the
//! database indexes do the work.

use super::StoreError;
use crate::error::ApiError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use library_catalog_shared::models::{cover_image_path, Book};
use library_catalog_shared::types::CreateBookRequest;
use library_catalog_shared::validation::validate_publish_year;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

const BOOK_COLUMNS: &str = "id, isbn, title, author, publish_year, page_count, genre, \
                            description, stock, cover_image, created_at, updated_at";

/// Book record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookRecord {
    pub id: Uuid,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub publish_year: String,
    pub page_count: i32,
    pub genre: String,
    pub description: String,
    pub stock: i32,
    pub cover_image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BookRecord> for Book {
    fn from(r: BookRecord) -> Self {
        let cover_image_path = cover_image_path(&r.cover_image);
        Book {
            id: r.id,
            isbn: r.isbn,
            title: r.title,
            author: r.author,
            publish_year: r.publish_year,
            page_count: r.page_count,
            genre: r.genre,
            description: r.description,
            stock: r.stock,
            cover_image: r.cover_image,
            cover_image_path,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Book data as submitted, checked before insert
#[derive(Debug, Clone, Validate)]
pub struct BookDraft {
    #[validate(length(min = 1, message = "isbn is required"))]
    pub isbn: String,
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "author is required"))]
    pub author: String,
    #[validate(custom(function = "validate_publish_year"))]
    pub publish_year: String,
    #[validate(range(min = 1, message = "Page count must be positive"))]
    pub page_count: i32,
    #[validate(length(min = 1, message = "genre is required"))]
    pub genre: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: i32,
    #[validate(length(min = 1, message = "cover_image is required"))]
    pub cover_image: String,
}

impl From<CreateBookRequest> for BookDraft {
    fn from(req: CreateBookRequest) -> Self {
        Self {
            isbn: req.isbn.trim().to_string(),
            title: req.title.trim().to_string(),
            author: req.author.trim().to_string(),
            publish_year: req.publish_year.trim().to_string(),
            page_count: req.page_count,
            genre: req.genre.trim().to_string(),
            description: req.description,
            stock: req.stock,
            cover_image: req.cover_image.trim().to_string(),
        }
    }
}

impl BookDraft {
    /// Run the book schema rules
    pub fn check(&self) -> Result<(), ApiError> {
        self.validate()
            .map_err(|errors| ApiError::from_validation("book", &errors))
    }
}

/// Escape `%`, `_` and `\` so a search fragment matches literally in LIKE
pub fn escape_like(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Persistent collection of catalog entries
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Insert a book. A taken ISBN fails with
    /// [`StoreError::UniqueViolation`] on `books_isbn_key`.
    async fn create(&self, book: BookDraft) -> Result<BookRecord, StoreError>;

    /// All books, title ascending
    async fn sorted_by_title(&self) -> Result<Vec<BookRecord>, StoreError>;

    /// All books, newest publish year first
    async fn sorted_by_publish_year(&self) -> Result<Vec<BookRecord>, StoreError>;

    /// Exact ISBN match
    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<BookRecord>, StoreError>;

    /// Case-insensitive substring match on author
    async fn find_by_author(&self, fragment: &str) -> Result<Vec<BookRecord>, StoreError>;

    /// Case-insensitive substring match on title
    async fn find_by_title(&self, fragment: &str) -> Result<Vec<BookRecord>, StoreError>;

    /// Case-insensitive substring match on both author and title
    async fn search(&self, author: &str, title: &str) -> Result<Vec<BookRecord>, StoreError>;

    /// Genre substring (case-insensitive) and at least `min_stock` copies
    async fn filter(&self, genre: &str, min_stock: i32) -> Result<Vec<BookRecord>, StoreError>;
}

/// PostgreSQL-backed catalog store
#[derive(Clone)]
pub struct PgBookRepository {
    pool: PgPool,
}

impl PgBookRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_all_ordered(&self, order_by: &str) -> Result<Vec<BookRecord>, StoreError> {
        let sql = format!("SELECT {} FROM books ORDER BY {}", BOOK_COLUMNS, order_by);
        let records = sqlx::query_as::<_, BookRecord>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    async fn fetch_matching(&self, column: &str, fragment: &str) -> Result<Vec<BookRecord>, StoreError> {
        let sql = format!(
            r#"SELECT {} FROM books WHERE {} ILIKE '%' || $1 || '%' ESCAPE '\' ORDER BY title ASC"#,
            BOOK_COLUMNS, column
        );
        let records = sqlx::query_as::<_, BookRecord>(&sql)
            .bind(escape_like(fragment))
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }
}

#[async_trait]
impl BookStore for PgBookRepository {
    async fn create(&self, book: BookDraft) -> Result<BookRecord, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO books (isbn, title, author, publish_year, page_count, genre,
                               description, stock, cover_image)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        );
        let record = sqlx::query_as::<_, BookRecord>(&sql)
            .bind(&book.isbn)
            .bind(&book.title)
            .bind(&book.author)
            .bind(&book.publish_year)
            .bind(book.page_count)
            .bind(&book.genre)
            .bind(&book.description)
            .bind(book.stock)
            .bind(&book.cover_image)
            .fetch_one(&self.pool)
            .await?;

        Ok(record)
    }

    async fn sorted_by_title(&self) -> Result<Vec<BookRecord>, StoreError> {
        self.fetch_all_ordered("title ASC").await
    }

    async fn sorted_by_publish_year(&self) -> Result<Vec<BookRecord>, StoreError> {
        // publish_year is 3-4 digits (CHECK constraint), so the cast is safe
        self.fetch_all_ordered("CAST(publish_year AS INTEGER) DESC, title ASC")
            .await
    }

    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<BookRecord>, StoreError> {
        let sql = format!("SELECT {} FROM books WHERE isbn = $1", BOOK_COLUMNS);
        let record = sqlx::query_as::<_, BookRecord>(&sql)
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn find_by_author(&self, fragment: &str) -> Result<Vec<BookRecord>, StoreError> {
        self.fetch_matching("author", fragment).await
    }

    async fn find_by_title(&self, fragment: &str) -> Result<Vec<BookRecord>, StoreError> {
        self.fetch_matching("title", fragment).await
    }

    async fn search(&self, author: &str, title: &str) -> Result<Vec<BookRecord>, StoreError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM books
            WHERE author ILIKE '%' || $1 || '%' ESCAPE '\'
              AND title ILIKE '%' || $2 || '%' ESCAPE '\'
            ORDER BY title ASC
            "#,
            BOOK_COLUMNS
        );
        let records = sqlx::query_as::<_, BookRecord>(&sql)
            .bind(escape_like(author))
            .bind(escape_like(title))
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    async fn filter(&self, genre: &str, min_stock: i32) -> Result<Vec<BookRecord>, StoreError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM books
            WHERE genre ILIKE '%' || $1 || '%' ESCAPE '\'
              AND stock >= $2
            ORDER BY title ASC
            "#,
            BOOK_COLUMNS
        );
        let records = sqlx::query_as::<_, BookRecord>(&sql)
            .bind(escape_like(genre))
            .bind(min_stock)
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }
}
