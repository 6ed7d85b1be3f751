//! Storage seam for the catalog.

mod memory;
mod mongo;

use std::sync::Arc;

use async_trait::async_trait;
use bookshelf_http::AppError;
use bookshelf_kernel::settings::{DatabaseSettings, StorageBackend};
use mongodb::bson::oid::ObjectId;
use thiserror::Error;

use super::models::{Book, BookBatch, BookFields, InsertOutcome, UpdateOutcome};
use super::query::BookQuery;

pub use memory::MemoryBookStore;
pub use mongo::MongoBookStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid book id '{0}': expected a 24 character hex string")]
    InvalidId(String),

    #[error(transparent)]
    Database(#[from] mongodb::error::Error),

    #[error("failed to encode document: {0}")]
    Encoding(#[from] mongodb::bson::ser::Error),

    #[error("storage returned an unexpected identifier: {0}")]
    UnexpectedId(String),
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        AppError::OperationFailed(error.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Document-collection operations behind the books routes.
#[async_trait]
pub trait BookStore: Send + Sync + 'static {
    /// Count and fetch one page of books matching `query`.
    async fn list(&self, query: &BookQuery) -> StoreResult<BookBatch>;

    async fn get(&self, id: &str) -> StoreResult<Option<Book>>;

    /// Insert the fields as given; storage assigns the id.
    async fn create(&self, book: BookFields) -> StoreResult<InsertOutcome>;

    /// Merge `changes` into the book; a missing book is not an error.
    async fn update(&self, id: &str, changes: BookFields) -> StoreResult<UpdateOutcome>;

    /// Remove the book, returning how many records were deleted.
    async fn delete(&self, id: &str) -> StoreResult<u64>;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}

pub(crate) fn parse_id(id: &str) -> StoreResult<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| StoreError::InvalidId(id.to_string()))
}

/// Open the configured backend.
pub async fn open(settings: &DatabaseSettings) -> anyhow::Result<Arc<dyn BookStore>> {
    match settings.backend {
        StorageBackend::Mongodb => {
            let database = bookshelf_db::connect(settings).await?;
            tracing::info!(collection = %settings.collection, "using MongoDB book store");
            Ok(Arc::new(MongoBookStore::new(
                database.collection(&settings.collection),
            )))
        }
        StorageBackend::Memory => {
            tracing::warn!("using in-memory book store; records are lost on exit");
            Ok(Arc::new(MemoryBookStore::default()))
        }
    }
}
