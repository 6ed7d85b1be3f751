use std::cmp::Ordering;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use super::{parse_id, BookStore, StoreResult};
use serde_json::Value;

use crate::modules::books::models::{Book, BookBatch, BookFields, InsertOutcome, UpdateOutcome};
use crate::modules::books::query::{BookQuery, SortDirection};

/// Process-local collection with the same query semantics as MongoDB.
///
/// Records keep insertion order, which breaks ties between equal sort keys.
#[derive(Default)]
pub struct MemoryBookStore {
    books: RwLock<Vec<Book>>,
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn list(&self, query: &BookQuery) -> StoreResult<BookBatch> {
        let books = self.books.read().await;

        let mut matching: Vec<&Book> = books
            .iter()
            .filter(|book| query.filter.matches(book))
            .collect();
        matching.sort_by(|a, b| {
            let ordering = compare_field(a, b, &query.sort.field);
            match query.sort.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });

        let skip = usize::try_from(query.window.skip()).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.window.limit).unwrap_or(usize::MAX);
        let page = matching
            .iter()
            .skip(skip)
            .take(limit)
            .map(|book| (*book).clone())
            .collect();

        Ok(BookBatch {
            books: page,
            total: matching.len() as u64,
        })
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Book>> {
        let id = parse_id(id)?.to_hex();
        let books = self.books.read().await;
        Ok(books.iter().find(|book| book.id == id).cloned())
    }

    async fn create(&self, book: BookFields) -> StoreResult<InsertOutcome> {
        let id = ObjectId::new().to_hex();
        self.books.write().await.push(Book::new(id.clone(), book));

        Ok(InsertOutcome {
            acknowledged: true,
            inserted_id: id,
        })
    }

    async fn update(&self, id: &str, changes: BookFields) -> StoreResult<UpdateOutcome> {
        let id = parse_id(id)?.to_hex();
        let mut books = self.books.write().await;

        let (matched_count, modified_count) = match books.iter_mut().find(|book| book.id == id) {
            Some(book) => (1, u64::from(book.merge(changes))),
            None => (0, 0),
        };

        Ok(UpdateOutcome {
            acknowledged: true,
            matched_count,
            modified_count,
            upserted_id: None,
            upserted_count: 0,
        })
    }

    async fn delete(&self, id: &str) -> StoreResult<u64> {
        let id = parse_id(id)?.to_hex();
        let mut books = self.books.write().await;

        let before = books.len();
        books.retain(|book| book.id != id);
        Ok((before - books.len()) as u64)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Sortable view of one field, ranked by type the way BSON compares
/// mixed values: missing and null first, then numbers, strings, objects,
/// arrays and booleans.
#[derive(PartialEq, PartialOrd)]
enum SortKey<'a> {
    Missing,
    Number(f64),
    Text(&'a str),
    Object,
    Array,
    Boolean(bool),
}

fn sort_key<'a>(book: &'a Book, field: &str) -> SortKey<'a> {
    if field == "_id" {
        return SortKey::Text(&book.id);
    }
    match book.get(field) {
        None | Some(Value::Null) => SortKey::Missing,
        Some(Value::Number(number)) => number.as_f64().map_or(SortKey::Missing, SortKey::Number),
        Some(Value::String(text)) => SortKey::Text(text),
        Some(Value::Object(_)) => SortKey::Object,
        Some(Value::Array(_)) => SortKey::Array,
        Some(Value::Bool(flag)) => SortKey::Boolean(*flag),
    }
}

fn compare_field(a: &Book, b: &Book, field: &str) -> Ordering {
    sort_key(a, field)
        .partial_cmp(&sort_key(b, field))
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::query::ListBooksParams;
    use crate::modules::books::store::StoreError;
    use serde_json::json;

    fn fields(value: Value) -> BookFields {
        serde_json::from_value(value).unwrap()
    }

    fn create_book(title: &str, genre: &str, year: i32, price: f64) -> BookFields {
        fields(json!({
            "title": title,
            "author": "Ursula K. Le Guin",
            "description": format!("{title} description"),
            "genre": genre,
            "publishedYear": year,
            "price": price
        }))
    }

    async fn seeded() -> MemoryBookStore {
        let store = MemoryBookStore::default();
        for (title, genre, year, price) in [
            ("The Left Hand of Darkness", "Science Fiction", 1969, 14.0),
            ("A Wizard of Earthsea", "Fantasy", 1968, 9.5),
            ("The Dispossessed", "Science Fiction", 1974, 16.25),
            ("The Lathe of Heaven", "Science Fiction", 1971, 11.0),
            ("Tehanu", "Fantasy", 1990, 12.0),
        ] {
            store
                .create(create_book(title, genre, year, price))
                .await
                .unwrap();
        }
        store
    }

    fn titles(batch: &BookBatch) -> Vec<&str> {
        batch.books.iter().filter_map(|b| b.text("title")).collect()
    }

    #[tokio::test]
    async fn list_sorts_by_title_by_default() {
        let store = seeded().await;
        let batch = store
            .list(&ListBooksParams::default().into_query())
            .await
            .unwrap();

        assert_eq!(batch.total, 5);
        assert_eq!(
            titles(&batch),
            vec![
                "A Wizard of Earthsea",
                "Tehanu",
                "The Dispossessed",
                "The Lathe of Heaven",
                "The Left Hand of Darkness",
            ]
        );
    }

    #[tokio::test]
    async fn list_pages_after_filtering_and_sorting() {
        let store = seeded().await;
        let query = ListBooksParams {
            genre: Some("Science Fiction".to_string()),
            sort_by: Some("publishedYear".to_string()),
            order: Some("desc".to_string()),
            limit: Some("2".to_string()),
            page: Some("2".to_string()),
            ..ListBooksParams::default()
        }
        .into_query();

        let batch = store.list(&query).await.unwrap();
        assert_eq!(batch.total, 3);
        assert_eq!(titles(&batch), vec!["The Left Hand of Darkness"]);
    }

    #[tokio::test]
    async fn unknown_sort_field_keeps_insertion_order() {
        let store = seeded().await;
        let query = ListBooksParams {
            sort_by: Some("isbn".to_string()),
            ..ListBooksParams::default()
        }
        .into_query();

        let batch = store.list(&query).await.unwrap();
        assert_eq!(batch.books[0].text("title"), Some("The Left Hand of Darkness"));
        assert_eq!(batch.books[4].text("title"), Some("Tehanu"));
    }

    #[tokio::test]
    async fn page_past_the_end_is_empty_but_counted() {
        let store = seeded().await;
        let query = ListBooksParams {
            page: Some("9".to_string()),
            ..ListBooksParams::default()
        }
        .into_query();

        let batch = store.list(&query).await.unwrap();
        assert!(batch.books.is_empty());
        assert_eq!(batch.total, 5);
    }

    #[tokio::test]
    async fn update_reports_match_and_modification() {
        let store = seeded().await;
        let created = store
            .create(create_book("Lavinia", "Fantasy", 2008, 13.0))
            .await
            .unwrap();

        let changes = fields(json!({ "price": 9.99 }));
        let outcome = store
            .update(&created.inserted_id, changes.clone())
            .await
            .unwrap();
        assert_eq!((outcome.matched_count, outcome.modified_count), (1, 1));

        let repeated = store.update(&created.inserted_id, changes).await.unwrap();
        assert_eq!((repeated.matched_count, repeated.modified_count), (1, 0));

        let book = store.get(&created.inserted_id).await.unwrap().unwrap();
        assert_eq!(book.number("price"), Some(9.99));
        assert_eq!(book.number("publishedYear"), Some(2008.0));
    }

    #[tokio::test]
    async fn update_and_delete_of_missing_book_succeed() {
        let store = seeded().await;
        let missing = ObjectId::new().to_hex();

        let outcome = store
            .update(&missing, BookFields::default())
            .await
            .unwrap();
        assert_eq!(outcome.matched_count, 0);
        assert_eq!(store.delete(&missing).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_removes_the_book() {
        let store = seeded().await;
        let created = store
            .create(create_book("Always Coming Home", "Fantasy", 1985, 18.0))
            .await
            .unwrap();

        assert_eq!(store.delete(&created.inserted_id).await.unwrap(), 1);
        assert!(store.get(&created.inserted_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn malformed_ids_are_rejected() {
        let store = seeded().await;
        assert!(matches!(
            store.get("42").await,
            Err(StoreError::InvalidId(_))
        ));
        assert!(matches!(
            store.delete("42").await,
            Err(StoreError::InvalidId(_))
        ));
    }

    #[tokio::test]
    async fn partial_records_are_stored_and_listed() {
        let store = seeded().await;
        let created = store
            .create(fields(json!({ "title": "Untitled draft", "isbn": "978-0" })))
            .await
            .unwrap();

        let book = store.get(&created.inserted_id).await.unwrap().unwrap();
        assert_eq!(book.text("isbn"), Some("978-0"));
        assert_eq!(book.get("genre"), None);

        let query = ListBooksParams {
            sort_by: Some("publishedYear".to_string()),
            ..ListBooksParams::default()
        }
        .into_query();
        let batch = store.list(&query).await.unwrap();
        assert_eq!(batch.total, 6);
        assert_eq!(batch.books[0].text("title"), Some("Untitled draft"));
    }

    #[tokio::test]
    async fn mixed_types_sort_numbers_before_strings() {
        let store = MemoryBookStore::default();
        for price in [json!("free"), json!(3), json!(null), json!(1.5)] {
            store
                .create(fields(json!({ "title": price.to_string(), "price": price })))
                .await
                .unwrap();
        }

        let query = ListBooksParams {
            sort_by: Some("price".to_string()),
            ..ListBooksParams::default()
        }
        .into_query();
        let batch = store.list(&query).await.unwrap();
        assert_eq!(titles(&batch), vec!["null", "1.5", "3", "\"free\""]);
    }
}
