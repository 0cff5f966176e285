//! Catalog routes

use crate::auth::SessionUser;
use crate::error::{ApiError, ApiResult};
use crate::services::CatalogService;
use crate::state::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use library_catalog_shared::models::{Book, Role};
use library_catalog_shared::types::{
    BookFilterQuery, BookListQuery, BookSearchQuery, CreateBookRequest,
};

/// Create catalog routes
pub fn book_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/isbn/:isbn", get(find_by_isbn))
        .route("/search", get(search_books))
        .route("/filter", get(filter_books))
}

/// GET /books?sort=title|publish_year
async fn list_books(
    State(state): State<AppState>,
    query: Result<Query<BookListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Book>>> {
    let Query(query) = query?;
    Ok(Json(CatalogService::list(state.books(), query.sort).await?))
}

/// GET /books/isbn/:isbn
async fn find_by_isbn(
    State(state): State<AppState>,
    Path(isbn): Path<String>,
) -> ApiResult<Json<Book>> {
    Ok(Json(CatalogService::find_by_isbn(state.books(), &isbn).await?))
}

/// GET /books/search?author=..&title=..
async fn search_books(
    State(state): State<AppState>,
    query: Result<Query<BookSearchQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Book>>> {
    let Query(query) = query?;
    let books = CatalogService::search(
        state.books(),
        query.author.as_deref(),
        query.title.as_deref(),
    )
    .await?;
    Ok(Json(books))
}

/// GET /books/filter?genre=..&min_stock=..
async fn filter_books(
    State(state): State<AppState>,
    query: Result<Query<BookFilterQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Book>>> {
    let Query(query) = query?;
    let books = CatalogService::filter(state.books(), &query.genre, query.min_stock).await?;
    Ok(Json(books))
}

/// POST /books (admin session required)
async fn create_book(
    State(state): State<AppState>,
    session: SessionUser,
    body: Result<Json<CreateBookRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Book>)> {
    if state.auth().role_of(session.user_id).await? != Role::Admin {
        return Err(ApiError::Forbidden(
            "Only administrators can add books".to_string(),
        ));
    }

    let Json(req) = body?;
    let book = CatalogService::create(state.books(), req).await?;
    Ok((StatusCode::CREATED, Json(book)))
}
