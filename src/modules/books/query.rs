//! Listing query builder.
//!
//! Turns the raw query-string parameters of `GET /books` into a filter, a sort
//! order and a page window. Every storage backend executes the same
//! [`BookQuery`], so coercion rules live here and nowhere else.

use serde::Deserialize;

use super::models::Book;
use crate::utils::{leading_decimal, leading_integer};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const DEFAULT_SORT_FIELD: &str = "title";

/// Query parameters of the listing endpoint, exactly as received.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBooksParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub genre: Option<String>,
    pub author: Option<String>,
    pub min_year: Option<String>,
    pub max_year: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

impl ListBooksParams {
    /// Coerce the raw parameters into an executable query.
    ///
    /// Empty values count as absent. Unreadable numbers fall back to the
    /// defaults (`page`, `limit`) or drop the bound (year and price ranges).
    pub fn into_query(self) -> BookQuery {
        let page = present(self.page)
            .and_then(|raw| leading_integer(&raw))
            .map_or(DEFAULT_PAGE, |page| page.max(1) as u64);
        let limit = present(self.limit)
            .and_then(|raw| leading_integer(&raw))
            .filter(|limit| *limit >= 1)
            .map_or(DEFAULT_LIMIT, |limit| limit as u64);

        let filter = BookFilter {
            search: present(self.search),
            genre: present(self.genre),
            author: present(self.author),
            published_year: Bounds {
                min: present(self.min_year).and_then(|raw| leading_integer(&raw)),
                max: present(self.max_year).and_then(|raw| leading_integer(&raw)),
            },
            price: Bounds {
                min: present(self.min_price).and_then(|raw| leading_decimal(&raw)),
                max: present(self.max_price).and_then(|raw| leading_decimal(&raw)),
            },
        };

        let sort = SortSpec {
            field: present(self.sort_by).unwrap_or_else(|| DEFAULT_SORT_FIELD.to_string()),
            direction: match self.order.as_deref() {
                Some("desc") => SortDirection::Descending,
                _ => SortDirection::Ascending,
            },
        };

        BookQuery {
            filter,
            sort,
            window: PageWindow { page, limit },
        }
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// A fully coerced listing request.
#[derive(Debug, Clone, PartialEq)]
pub struct BookQuery {
    pub filter: BookFilter,
    pub sort: SortSpec,
    pub window: PageWindow,
}

/// Inclusive range; either side may be open.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

impl<T: PartialOrd + Copy> Bounds<T> {
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn contains(&self, value: T) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

/// Predicates derived from the query string. Every present predicate must
/// hold; `search` alone is an OR across title and description.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BookFilter {
    pub search: Option<String>,
    pub genre: Option<String>,
    pub author: Option<String>,
    pub published_year: Bounds<i64>,
    pub price: Bounds<f64>,
}

impl BookFilter {
    /// Evaluate the filter against a stored record. A predicate only holds
    /// when the field has the type it compares against: text predicates need
    /// a string, bounds need a number, and a missing field satisfies nothing.
    pub fn matches(&self, book: &Book) -> bool {
        if let Some(search) = &self.search {
            let in_field = |field: &str| {
                book.text(field)
                    .is_some_and(|text| contains_ignore_case(text, search))
            };
            if !in_field("title") && !in_field("description") {
                return false;
            }
        }

        if let Some(genre) = &self.genre {
            if book.text("genre") != Some(genre.as_str()) {
                return false;
            }
        }

        if let Some(author) = &self.author {
            if !book
                .text("author")
                .is_some_and(|text| contains_ignore_case(text, author))
            {
                return false;
            }
        }

        let years = Bounds {
            min: self.published_year.min.map(|year| year as f64),
            max: self.published_year.max.map(|year| year as f64),
        };
        within(&years, book.number("publishedYear")) && within(&self.price, book.number("price"))
    }
}

fn within(bounds: &Bounds<f64>, value: Option<f64>) -> bool {
    if bounds.is_unbounded() {
        return true;
    }
    value.is_some_and(|value| bounds.contains(value))
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Single-field sort order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

/// One-based page number and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub limit: u64,
}

impl PageWindow {
    /// Number of matching records before this page.
    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> ListBooksParams {
        let object = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect();
        serde_json::from_value(serde_json::Value::Object(object)).unwrap()
    }

    fn book(title: &str, description: &str, author: &str, genre: &str, year: i32, price: f64) -> Book {
        book_from(serde_json::json!({
            "title": title,
            "author": author,
            "description": description,
            "genre": genre,
            "publishedYear": year,
            "price": price
        }))
    }

    fn book_from(value: serde_json::Value) -> Book {
        Book::new(
            "65a1b2c3d4e5f60718293a4b".to_string(),
            serde_json::from_value(value).unwrap(),
        )
    }

    #[test]
    fn no_parameters_yield_defaults() {
        let query = ListBooksParams::default().into_query();
        assert_eq!(query.filter, BookFilter::default());
        assert_eq!(query.window, PageWindow { page: 1, limit: 10 });
        assert_eq!(
            query.sort,
            SortSpec {
                field: "title".to_string(),
                direction: SortDirection::Ascending,
            }
        );
    }

    #[test]
    fn page_is_floored_at_one() {
        for raw in ["0", "-4", "abc", ""] {
            let query = params(&[("page", raw)]).into_query();
            assert_eq!(query.window.page, 1, "page={raw}");
        }
        assert_eq!(params(&[("page", "3")]).into_query().window.page, 3);
        assert_eq!(params(&[("page", "2.7")]).into_query().window.page, 2);
    }

    #[test]
    fn limit_falls_back_to_default() {
        for raw in ["0", "-5", "many", ""] {
            let query = params(&[("limit", raw)]).into_query();
            assert_eq!(query.window.limit, DEFAULT_LIMIT, "limit={raw}");
        }
        assert_eq!(params(&[("limit", "25")]).into_query().window.limit, 25);
        assert_eq!(params(&[("limit", "5000")]).into_query().window.limit, 5000);
    }

    #[test]
    fn camel_case_parameters_are_read() {
        let query = params(&[
            ("minYear", "1950"),
            ("maxYear", "1999"),
            ("minPrice", "5"),
            ("maxPrice", "20.5"),
            ("sortBy", "price"),
            ("order", "desc"),
        ])
        .into_query();

        assert_eq!(
            query.filter.published_year,
            Bounds {
                min: Some(1950),
                max: Some(1999)
            }
        );
        assert_eq!(
            query.filter.price,
            Bounds {
                min: Some(5.0),
                max: Some(20.5)
            }
        );
        assert_eq!(query.sort.field, "price");
        assert_eq!(query.sort.direction, SortDirection::Descending);
    }

    #[test]
    fn unreadable_bounds_are_dropped() {
        let query = params(&[("minYear", "early"), ("maxPrice", "cheap")]).into_query();
        assert!(query.filter.published_year.is_unbounded());
        assert!(query.filter.price.is_unbounded());
    }

    #[test]
    fn only_exact_desc_sorts_descending() {
        for raw in ["asc", "DESC", "descending", ""] {
            let query = params(&[("order", raw)]).into_query();
            assert_eq!(query.sort.direction, SortDirection::Ascending, "order={raw}");
        }
    }

    #[test]
    fn empty_text_parameters_are_absent() {
        let query = params(&[("search", ""), ("genre", ""), ("author", ""), ("sortBy", "")])
            .into_query();
        assert_eq!(query.filter, BookFilter::default());
        assert_eq!(query.sort.field, DEFAULT_SORT_FIELD);
    }

    #[test]
    fn window_math() {
        let window = PageWindow { page: 3, limit: 10 };
        assert_eq!(window.skip(), 20);
        assert_eq!(window.total_pages(0), 0);
        assert_eq!(window.total_pages(20), 2);
        assert_eq!(window.total_pages(21), 3);

        let huge = PageWindow {
            page: u64::MAX,
            limit: u64::MAX,
        };
        assert_eq!(huge.skip(), u64::MAX);
    }

    #[test]
    fn search_matches_title_or_description() {
        let filter = BookFilter {
            search: Some("RING".to_string()),
            ..BookFilter::default()
        };
        assert!(filter.matches(&book("The Lord of the Rings", "", "Tolkien", "Fantasy", 1954, 20.0)));
        assert!(filter.matches(&book("Hobbit", "a ring of power", "Tolkien", "Fantasy", 1937, 10.0)));
        assert!(!filter.matches(&book("Dune", "sand", "Herbert", "Science Fiction", 1965, 12.0)));
    }

    #[test]
    fn genre_is_exact_and_author_is_substring() {
        let dune = book("Dune", "sand", "Frank Herbert", "Science Fiction", 1965, 12.0);

        let genre = BookFilter {
            genre: Some("science fiction".to_string()),
            ..BookFilter::default()
        };
        assert!(!genre.matches(&dune));

        let author = BookFilter {
            author: Some("herb".to_string()),
            genre: Some("Science Fiction".to_string()),
            ..BookFilter::default()
        };
        assert!(author.matches(&dune));
    }

    #[test]
    fn bounds_are_inclusive_and_independent() {
        let dune = book("Dune", "sand", "Frank Herbert", "Science Fiction", 1965, 12.0);

        let exact = BookFilter {
            published_year: Bounds {
                min: Some(1965),
                max: Some(1965),
            },
            price: Bounds {
                min: Some(12.0),
                max: None,
            },
            ..BookFilter::default()
        };
        assert!(exact.matches(&dune));

        let too_cheap = BookFilter {
            price: Bounds {
                min: None,
                max: Some(11.99),
            },
            ..BookFilter::default()
        };
        assert!(!too_cheap.matches(&dune));
    }

    #[test]
    fn predicates_need_matching_field_types() {
        let partial = book_from(serde_json::json!({
            "title": "Ring cycle",
            "publishedYear": "1954",
            "price": 12
        }));

        let search = BookFilter {
            search: Some("ring".to_string()),
            ..BookFilter::default()
        };
        assert!(search.matches(&partial));

        let by_author = BookFilter {
            author: Some("a".to_string()),
            ..BookFilter::default()
        };
        assert!(!by_author.matches(&partial));

        let by_year = BookFilter {
            published_year: Bounds {
                min: Some(1900),
                max: None,
            },
            ..BookFilter::default()
        };
        assert!(!by_year.matches(&partial));

        let by_price = BookFilter {
            price: Bounds {
                min: Some(12.0),
                max: Some(12.0),
            },
            ..BookFilter::default()
        };
        assert!(by_price.matches(&partial));
        assert!(BookFilter::default().matches(&partial));
    }
}
