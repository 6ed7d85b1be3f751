use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use bookshelf_http::{ApiResult, AppError};

use super::models::{BookFields, BookPage, Confirmation};
use super::query::ListBooksParams;
use super::store::BookStore;

type SharedStore = Arc<dyn BookStore>;

/// Routes of the books module, relative to its mount point.
pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/{id}", get(get_book).put(update_book).delete(delete_book))
        .with_state(store)
}

async fn list_books(
    State(store): State<SharedStore>,
    params: Result<Query<ListBooksParams>, QueryRejection>,
) -> ApiResult<Json<BookPage>> {
    let Query(params) = params.map_err(AppError::operation_failed)?;
    let query = params.into_query();

    let batch = store.list(&query).await?;
    tracing::debug!(
        page = query.window.page,
        limit = query.window.limit,
        total = batch.total,
        "listed books"
    );

    Ok(Json(BookPage::from_batch(batch, &query.window)))
}

async fn create_book(
    State(store): State<SharedStore>,
    payload: Result<Json<BookFields>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(book) = payload.map_err(AppError::operation_failed)?;

    let outcome = store.create(book).await?;
    tracing::info!(id = %outcome.inserted_id, "book created");

    Ok((StatusCode::CREATED, Json(outcome)))
}

async fn get_book(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    match store.get(&id).await? {
        Some(book) => Ok(Json(book)),
        None => Err(AppError::not_found("Book not found")),
    }
}

async fn update_book(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
    payload: Result<Json<BookFields>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(changes) = payload.map_err(AppError::operation_failed)?;

    let outcome = store.update(&id, changes).await?;
    tracing::info!(
        %id,
        matched = outcome.matched_count,
        modified = outcome.modified_count,
        "book updated"
    );

    Ok(Json(outcome))
}

async fn delete_book(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let deleted = store.delete(&id).await?;
    tracing::info!(%id, deleted, "book deleted");

    Ok(Json(Confirmation::new("Book deleted")))
}
