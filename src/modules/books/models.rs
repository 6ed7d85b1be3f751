use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::query::PageWindow;

/// A catalog record as returned by the API: the storage id plus every field
/// the client stored, verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Storage-assigned document id (24 hex characters)
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Book {
    pub fn new(id: String, fields: BookFields) -> Self {
        Self {
            id,
            fields: fields.into(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// The field's value when it is stored as a string.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// The field's value when it is stored as a number.
    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }

    /// Overwrite the fields present in `changes`, returning whether anything changed.
    pub fn merge(&mut self, changes: BookFields) -> bool {
        let mut changed = false;
        for (field, value) in Map::from(changes) {
            if self.fields.get(&field) != Some(&value) {
                self.fields.insert(field, value);
                changed = true;
            }
        }
        changed
    }
}

/// Request body of create and update: any JSON object, kept as sent.
///
/// A client-supplied `_id` is discarded; identifiers are assigned by storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct BookFields(Map<String, Value>);

impl BookFields {
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for BookFields {
    fn from(mut fields: Map<String, Value>) -> Self {
        fields.remove("_id");
        Self(fields)
    }
}

impl From<BookFields> for Map<String, Value> {
    fn from(fields: BookFields) -> Self {
        fields.0
    }
}

/// Storage acknowledgement for an insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOutcome {
    pub acknowledged: bool,
    pub inserted_id: String,
}

/// Storage acknowledgement for an update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<String>,
    pub upserted_count: u64,
}

/// Plain `{"message": ..}` confirmation body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Confirmation {
    pub message: String,
}

impl Confirmation {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One page of matching books plus the totals for the whole filter.
#[derive(Debug, Clone, PartialEq)]
pub struct BookBatch {
    pub books: Vec<Book>,
    pub total: u64,
}

/// Paginated listing envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPage {
    pub books: Vec<Book>,
    pub total_books: u64,
    pub current_page: u64,
    pub total_pages: u64,
}

impl BookPage {
    pub fn from_batch(batch: BookBatch, window: &PageWindow) -> Self {
        Self {
            total_pages: window.total_pages(batch.total),
            total_books: batch.total,
            current_page: window.page,
            books: batch.books,
        }
    }
}
