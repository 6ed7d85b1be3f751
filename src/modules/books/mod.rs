pub mod models;
pub mod query;
pub mod routes;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use bookshelf_kernel::{InitCtx, Module};

use store::BookStore;

/// Catalog module: CRUD and filtered listing over the books collection
pub struct BooksModule {
    store: Arc<dyn BookStore>,
}

impl BooksModule {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            backend = self.store.backend(),
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.store.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module(store: Arc<dyn BookStore>) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(store))
}

fn query_parameter(name: &str, description: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "in": "query",
        "required": false,
        "description": description,
        "schema": { "type": "string" }
    })
}

fn error_response() -> serde_json::Value {
    serde_json::json!({
        "description": "Operation failed",
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn json_response(description: &str, schema: &str) -> serde_json::Value {
    serde_json::json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": format!("#/components/schemas/{}", schema) }
            }
        }
    })
}

fn json_body(schema: &str) -> serde_json::Value {
    serde_json::json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": format!("#/components/schemas/{}", schema) }
            }
        }
    })
}

fn openapi_fragment() -> serde_json::Value {
    let id_parameter = serde_json::json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "string" }
    });

    let book_fields = serde_json::json!({
        "title": { "type": "string" },
        "author": { "type": "string" },
        "description": { "type": "string" },
        "genre": { "type": "string" },
        "publishedYear": { "type": "integer", "format": "int32" },
        "price": { "type": "number", "format": "double" }
    });

    let mut book_properties = book_fields.clone();
    book_properties["_id"] = serde_json::json!({
        "type": "string",
        "description": "Storage-assigned document id"
    });

    serde_json::json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List books",
                    "tags": ["Books"],
                    "parameters": [
                        query_parameter("page", "One-based page number (default 1)"),
                        query_parameter("limit", "Page size (default 10)"),
                        query_parameter("search", "Case-insensitive substring of title or description"),
                        query_parameter("genre", "Exact genre"),
                        query_parameter("author", "Case-insensitive substring of author"),
                        query_parameter("minYear", "Inclusive lower bound on publishedYear"),
                        query_parameter("maxYear", "Inclusive upper bound on publishedYear"),
                        query_parameter("minPrice", "Inclusive lower bound on price"),
                        query_parameter("maxPrice", "Inclusive upper bound on price"),
                        query_parameter("sortBy", "Field to sort by (default title)"),
                        query_parameter("order", "\"desc\" for descending, ascending otherwise")
                    ],
                    "responses": {
                        "200": json_response("Page of matching books", "BookPage"),
                        "500": error_response()
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": json_body("BookFields"),
                    "responses": {
                        "201": json_response("Insert acknowledgement", "InsertResult"),
                        "500": error_response()
                    }
                }
            },
            "/{id}": {
                "get": {
                    "summary": "Get a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter.clone()],
                    "responses": {
                        "200": json_response("The book", "Book"),
                        "404": json_response("No book with this id", "Message"),
                        "500": error_response()
                    }
                },
                "put": {
                    "summary": "Update some fields of a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter.clone()],
                    "requestBody": json_body("BookFields"),
                    "responses": {
                        "200": json_response("Update acknowledgement", "UpdateResult"),
                        "500": error_response()
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter],
                    "responses": {
                        "200": json_response("Deletion confirmation", "Message"),
                        "500": error_response()
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": book_properties,
                    "required": ["_id"],
                    "additionalProperties": true
                },
                "BookFields": {
                    "type": "object",
                    "description": "Stored verbatim; any additional fields are kept",
                    "properties": book_fields,
                    "additionalProperties": true
                },
                "BookPage": {
                    "type": "object",
                    "properties": {
                        "books": {
                            "type": "array",
                            "items": { "$ref": "#/components/schemas/Book" }
                        },
                        "totalBooks": { "type": "integer" },
                        "currentPage": { "type": "integer" },
                        "totalPages": { "type": "integer" }
                    },
                    "required": ["books", "totalBooks", "currentPage", "totalPages"]
                },
                "InsertResult": {
                    "type": "object",
                    "properties": {
                        "acknowledged": { "type": "boolean" },
                        "insertedId": { "type": "string" }
                    }
                },
                "UpdateResult": {
                    "type": "object",
                    "properties": {
                        "acknowledged": { "type": "boolean" },
                        "matchedCount": { "type": "integer" },
                        "modifiedCount": { "type": "integer" },
                        "upsertedId": { "type": "string", "nullable": true },
                        "upsertedCount": { "type": "integer" }
                    }
                },
                "Message": {
                    "type": "object",
                    "properties": {
                        "message": { "type": "string" }
                    },
                    "required": ["message"]
                }
            }
        }
    })
}
