//! Common test utilities for integration tests
//!
//! The router runs over in-memory stores and a channel-backed mailer, so
//! these tests need no database or SMTP server. The pool handed to the
//! state is lazy and never connects.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use chrono::Utc;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use library_catalog_backend::{
    config::AppConfig,
    db::create_lazy_pool,
    mail::{Mailer, OutgoingMail},
    repositories::{BookDraft, BookRecord, BookStore, NewUser, UserRecord, UserStore},
    repositories::StoreError,
    routes,
    state::AppState,
};
use library_catalog_shared::models::Role;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

/// User store backed by a vector, with the same uniqueness rule as the
/// `users_email_key` constraint
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<UserRecord>>,
}

impl MemoryUserStore {
    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn find(&self, email: &str) -> Option<UserRecord> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned()
    }

    /// Grant the admin role to an existing account
    pub fn promote(&self, email: &str) {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.email == email)
            .expect("user to promote exists");
        user.role = Role::Admin.as_str().to_string();
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation {
                constraint: "users_email_key".to_string(),
            });
        }

        let now = Utc::now();
        let record = UserRecord {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role.as_str().to_string(),
            created_at: now,
            updated_at: now,
        };
        users.push(record.clone());
        Ok(record)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.find(email))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, StoreError> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Book store backed by a vector, mirroring the SQL ordering and matching
#[derive(Default)]
pub struct MemoryBookStore {
    books: Mutex<Vec<BookRecord>>,
}

impl MemoryBookStore {
    fn all(&self) -> Vec<BookRecord> {
        self.books.lock().unwrap().clone()
    }

    fn sorted_titles(mut books: Vec<BookRecord>) -> Vec<BookRecord> {
        books.sort_by(|a, b| a.title.cmp(&b.title));
        books
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn create(&self, book: BookDraft) -> Result<BookRecord, StoreError> {
        let mut books = self.books.lock().unwrap();
        if books.iter().any(|b| b.isbn == book.isbn) {
            return Err(StoreError::UniqueViolation {
                constraint: "books_isbn_key".to_string(),
            });
        }

        let now = Utc::now();
        let record = BookRecord {
            id: Uuid::new_v4(),
            isbn: book.isbn,
            title: book.title,
            author: book.author,
            publish_year: book.publish_year,
            page_count: book.page_count,
            genre: book.genre,
            description: book.description,
            stock: book.stock,
            cover_image: book.cover_image,
            created_at: now,
            updated_at: now,
        };
        books.push(record.clone());
        Ok(record)
    }

    async fn sorted_by_title(&self) -> Result<Vec<BookRecord>, StoreError> {
        Ok(Self::sorted_titles(self.all()))
    }

    async fn sorted_by_publish_year(&self) -> Result<Vec<BookRecord>, StoreError> {
        let mut books = Self::sorted_titles(self.all());
        books.sort_by_key(|b| std::cmp::Reverse(b.publish_year.parse::<i32>().unwrap_or(0)));
        Ok(books)
    }

    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<BookRecord>, StoreError> {
        Ok(self.all().into_iter().find(|b| b.isbn == isbn))
    }

    async fn find_by_author(&self, fragment: &str) -> Result<Vec<BookRecord>, StoreError> {
        let books = self
            .all()
            .into_iter()
            .filter(|b| contains_ci(&b.author, fragment))
            .collect();
        Ok(Self::sorted_titles(books))
    }

    async fn find_by_title(&self, fragment: &str) -> Result<Vec<BookRecord>, StoreError> {
        let books = self
            .all()
            .into_iter()
            .filter(|b| contains_ci(&b.title, fragment))
            .collect();
        Ok(Self::sorted_titles(books))
    }

    async fn search(&self, author: &str, title: &str) -> Result<Vec<BookRecord>, StoreError> {
        let books = self
            .all()
            .into_iter()
            .filter(|b| contains_ci(&b.author, author) && contains_ci(&b.title, title))
            .collect();
        Ok(Self::sorted_titles(books))
    }

    async fn filter(&self, genre: &str, min_stock: i32) -> Result<Vec<BookRecord>, StoreError> {
        let books = self
            .all()
            .into_iter()
            .filter(|b| contains_ci(&b.genre, genre) && b.stock >= min_stock)
            .collect();
        Ok(Self::sorted_titles(books))
    }
}

/// Mailer that hands every message to the test instead of sending it
pub struct ChannelMailer {
    tx: mpsc::UnboundedSender<OutgoingMail>,
}

#[async_trait]
impl Mailer for ChannelMailer {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()> {
        self.tx
            .send(mail)
            .map_err(|_| anyhow::anyhow!("test mailbox closed"))
    }
}

/// Response captured from the router
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }

    /// Raw `Set-Cookie` header, if any
    pub fn set_cookie(&self) -> Option<String> {
        self.headers
            .get(header::SET_COOKIE)
            .map(|v| v.to_str().unwrap().to_string())
    }

    /// `name=value` pair from `Set-Cookie`, ready to send back as `Cookie`
    pub fn session_cookie(&self) -> Option<String> {
        self.set_cookie()
            .and_then(|c| c.split(';').next().map(|pair| pair.trim().to_string()))
    }

    /// Message stored under `field` in an error body
    pub fn error(&self, field: &str) -> String {
        self.json()["errors"][field]
            .as_str()
            .unwrap_or_default()
            .to_string()
    }
}

/// Test application wrapper
pub struct TestApp {
    pub app: Router,
    pub config: AppConfig,
    pub users: Arc<MemoryUserStore>,
    pub books: Arc<MemoryBookStore>,
    mailbox: tokio::sync::Mutex<mpsc::UnboundedReceiver<OutgoingMail>>,
}

impl TestApp {
    pub fn new() -> Self {
        let config = test_config();
        let users = Arc::new(MemoryUserStore::default());
        let books = Arc::new(MemoryBookStore::default());
        let (tx, rx) = mpsc::unbounded_channel();

        let pool = create_lazy_pool(&config.database.url).expect("lazy pool");
        let state = AppState::with_stores(
            pool,
            config.clone(),
            users.clone(),
            books.clone(),
            Arc::new(ChannelMailer { tx }),
        );

        Self {
            app: routes::create_router(state),
            config,
            users,
            books,
            mailbox: tokio::sync::Mutex::new(rx),
        }
    }

    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.send(builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    /// Send a body verbatim with the given content type
    pub async fn request_raw(
        &self,
        method: &str,
        path: &str,
        content_type: &str,
        body: &str,
    ) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None, None).await
    }

    /// Make a GET request carrying a cookie header
    pub async fn get_with_cookie(&self, path: &str, cookie: &str) -> TestResponse {
        self.request("GET", path, None, Some(cookie)).await
    }

    /// Make a POST request with JSON body
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body), None).await
    }

    pub async fn post_with_cookie(&self, path: &str, body: Value, cookie: &str) -> TestResponse {
        self.request("POST", path, Some(body), Some(cookie)).await
    }

    /// Register an account and return its session cookie
    pub async fn register(&self, name: &str, email: &str, password: &str) -> String {
        let res = self
            .post(
                "/register",
                serde_json::json!({
                    "name": name,
                    "email": email,
                    "password": password,
                    "confirmPassword": password,
                }),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "register failed: {}", res.body);
        res.session_cookie().expect("session cookie set")
    }

    /// Register an account, promote it and log in again as admin
    pub async fn admin_session(&self) -> String {
        let email = fake_email();
        self.register(&fake_name(), &email, "admin-pass").await;
        self.users.promote(&email);

        let res = self
            .post(
                "/login",
                serde_json::json!({ "email": email, "password": "admin-pass" }),
            )
            .await;
        assert_eq!(res.json()["role"], "admin");
        res.session_cookie().expect("session cookie set")
    }

    /// Next mail handed to the mailer, waiting briefly for the background task
    pub async fn next_mail(&self) -> Option<OutgoingMail> {
        let mut rx = self.mailbox.lock().await;
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .ok()
            .flatten()
    }

    /// True when nothing reaches the mailer within a short grace period
    pub async fn no_mail_sent(&self) -> bool {
        tokio::time::sleep(Duration::from_millis(100)).await;
        self.mailbox.lock().await.try_recv().is_err()
    }

    /// Put a book straight into the store
    pub async fn seed_book(&self, isbn: &str, title: &str, author: &str, year: &str, genre: &str, stock: i32) {
        self.books
            .create(BookDraft {
                isbn: isbn.to_string(),
                title: title.to_string(),
                author: author.to_string(),
                publish_year: year.to_string(),
                page_count: 200,
                genre: genre.to_string(),
                description: format!("{} by {}", title, author),
                stock,
                cover_image: format!("{}.jpg", isbn),
            })
            .await
            .unwrap();
    }
}

pub fn fake_name() -> String {
    Name().fake()
}

pub fn fake_email() -> String {
    let email: String = SafeEmail().fake();
    // Unique local part so generated addresses never collide within a test
    format!("{}.{}", Uuid::new_v4().simple(), email.to_lowercase())
}

/// Pool on a real database with migrations applied and tables emptied.
/// Uses `TEST_DATABASE_URL`, falling back to the configured default.
pub async fn pg_pool() -> sqlx::PgPool {
    let url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| test_config().database.url);
    let pool = sqlx::PgPool::connect(&url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    sqlx::query("TRUNCATE users, books")
        .execute(&pool)
        .await
        .expect("Failed to clean tables");

    pool
}

/// Get test configuration
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.jwt.secret = "test-secret-key-for-integration-tests".to_string();
    config.app.public_url = "http://library.test".to_string();
    config
}
