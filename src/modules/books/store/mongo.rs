use async_trait::async_trait;
use futures::TryStreamExt as _;
use mongodb::{
    bson::{doc, Bson, Document},
    Collection,
};

use super::{parse_id, BookStore, StoreError, StoreResult};
use crate::modules::books::models::{Book, BookBatch, BookFields, InsertOutcome, UpdateOutcome};
use crate::modules::books::query::{BookFilter, BookQuery, Bounds, SortDirection, SortSpec};

/// Books collection accessed as untyped documents, so records written by
/// other clients decode whatever fields they carry.
pub struct MongoBookStore {
    books: Collection<Document>,
}

impl MongoBookStore {
    pub fn new(books: Collection<Document>) -> Self {
        Self { books }
    }
}

#[async_trait]
impl BookStore for MongoBookStore {
    async fn list(&self, query: &BookQuery) -> StoreResult<BookBatch> {
        let filter = filter_document(&query.filter);
        let limit = i64::try_from(query.window.limit).unwrap_or(i64::MAX);

        let fetch = async {
            let cursor = self
                .books
                .find(filter.clone())
                .sort(sort_document(&query.sort))
                .skip(query.window.skip())
                .limit(limit)
                .await?;
            cursor.try_collect::<Vec<Document>>().await
        };
        let count = async { self.books.count_documents(filter.clone()).await };

        let (documents, total) = tokio::try_join!(fetch, count)?;

        Ok(BookBatch {
            books: documents.into_iter().map(book_from_document).collect(),
            total,
        })
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Book>> {
        let id = parse_id(id)?;
        let document = self.books.find_one(doc! { "_id": id }).await?;
        Ok(document.map(book_from_document))
    }

    async fn create(&self, book: BookFields) -> StoreResult<InsertOutcome> {
        let document = mongodb::bson::to_document(&book)?;
        let result = self.books.insert_one(document).await?;

        Ok(InsertOutcome {
            acknowledged: true,
            inserted_id: id_to_string(result.inserted_id)?,
        })
    }

    async fn update(&self, id: &str, changes: BookFields) -> StoreResult<UpdateOutcome> {
        let id = parse_id(id)?;
        let set = mongodb::bson::to_document(&changes)?;
        let result = self
            .books
            .update_one(doc! { "_id": id }, doc! { "$set": set })
            .await?;

        let upserted_id = result.upserted_id.map(id_to_string).transpose()?;
        Ok(UpdateOutcome {
            acknowledged: true,
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_count: u64::from(upserted_id.is_some()),
            upserted_id,
        })
    }

    async fn delete(&self, id: &str) -> StoreResult<u64> {
        let id = parse_id(id)?;
        let result = self.books.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count)
    }

    fn backend(&self) -> &'static str {
        "mongodb"
    }
}

/// Stored document to API record. Values without a plain JSON form are
/// rendered as relaxed extended JSON.
pub(super) fn book_from_document(mut document: Document) -> Book {
    let id = match document.remove("_id") {
        Some(Bson::ObjectId(id)) => id.to_hex(),
        Some(Bson::String(id)) => id,
        Some(other) => other.to_string(),
        None => String::new(),
    };

    Book {
        id,
        fields: document
            .into_iter()
            .map(|(field, value)| (field, value.into_relaxed_extjson()))
            .collect(),
    }
}

fn id_to_string(id: Bson) -> StoreResult<String> {
    match id {
        Bson::ObjectId(id) => Ok(id.to_hex()),
        other => Err(StoreError::UnexpectedId(other.to_string())),
    }
}

/// Translate the listing filter into a query document; absent predicates
/// contribute no key at all.
pub(super) fn filter_document(filter: &BookFilter) -> Document {
    let mut document = Document::new();

    if let Some(search) = &filter.search {
        let pattern = contains_ignore_case(search);
        document.insert(
            "$or",
            vec![
                doc! { "title": pattern.clone() },
                doc! { "description": pattern },
            ],
        );
    }

    if let Some(genre) = &filter.genre {
        document.insert("genre", genre.as_str());
    }

    if let Some(range) = range_document(&filter.published_year) {
        document.insert("publishedYear", range);
    }

    if let Some(author) = &filter.author {
        document.insert("author", contains_ignore_case(author));
    }

    if let Some(range) = range_document(&filter.price) {
        document.insert("price", range);
    }

    document
}

pub(super) fn sort_document(sort: &SortSpec) -> Document {
    let direction = match sort.direction {
        SortDirection::Ascending => 1,
        SortDirection::Descending => -1,
    };
    let mut document = Document::new();
    document.insert(sort.field.as_str(), direction);
    document
}

fn contains_ignore_case(needle: &str) -> Document {
    doc! { "$regex": escape_regex(needle), "$options": "i" }
}

fn range_document<T>(bounds: &Bounds<T>) -> Option<Document>
where
    T: Into<Bson> + PartialOrd + Copy,
{
    if bounds.is_unbounded() {
        return None;
    }

    let mut range = Document::new();
    if let Some(min) = bounds.min {
        range.insert("$gte", min);
    }
    if let Some(max) = bounds.max {
        range.insert("$lte", max);
    }
    Some(range)
}

/// Escape PCRE metacharacters so user input matches literally.
fn escape_regex(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(
            c,
            '\\' | '^' | '$' | '.' | '|' | '?' | '*' | '+' | '(' | ')' | '[' | ']' | '{' | '}' | '-'
                | '/' | '#'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
