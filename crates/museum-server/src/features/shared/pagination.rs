//! Filtering, sorting and pagination for list endpoints
//!
//! A list request is turned into a [`Filters`] value by [`Filters::parse`].
//! The sort token of a `Filters` is always an entry of the endpoint's
//! [`SortSafelist`], so `sort_column()` and `sort_direction()` are the only
//! values ever formatted into an `ORDER BY` clause.
//!
//! # Examples
//!
//! ```rust,ignore
//! const SAFELIST: SortSafelist = SortSafelist::new(&["artifact_id", "title", "-artifact_id", "-title"]);
//!
//! let mut v = Validator::new();
//! let filters = Filters::parse(&qs, &SAFELIST, &mut v);
//! v.into_result()?;
//!
//! let sql = format!("ORDER BY {} {}, artifact_id ASC", filters.sort_column(), filters.sort_direction());
//! ```

use serde::{Deserialize, Serialize};

use super::query::QueryParams;
use super::validation::{ValidationErrors, Validator};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE: i64 = 10_000_000;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Sort tokens accepted by one list endpoint. The first entry is the default.
#[derive(Debug, Clone, Copy)]
pub struct SortSafelist {
    tokens: &'static [&'static str],
}

impl SortSafelist {
    pub const fn new(tokens: &'static [&'static str]) -> Self {
        Self { tokens }
    }

    pub fn default_token(&self) -> &'static str {
        self.tokens.first().copied().unwrap_or("id")
    }

    /// The safelist's own copy of `token`, if permitted
    pub fn resolve(&self, token: &str) -> Option<&'static str> {
        self.tokens.iter().copied().find(|t| *t == token)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Validated page, page size and sort token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Filters {
    page: i64,
    page_size: i64,
    sort: &'static str,
}

fn validate_bounds(v: &mut Validator, page: i64, page_size: i64) {
    v.check(page > 0, "page", "must be greater than zero");
    v.check(page <= MAX_PAGE, "page", "must be a maximum of 10 million");
    v.check(page_size > 0, "page_size", "must be greater than zero");
    v.check(page_size <= MAX_PAGE_SIZE, "page_size", "must be a maximum of 100");
}

impl Filters {
    /// Read `page`, `page_size` and `sort` from the query string.
    ///
    /// Problems are recorded on `v`; callers must check it before using the
    /// result. An unknown sort token is replaced with the safelist default,
    /// never passed through.
    pub fn parse(qs: &QueryParams, safelist: &SortSafelist, v: &mut Validator) -> Self {
        let page = qs.int("page", DEFAULT_PAGE, v);
        let page_size = qs.int("page_size", DEFAULT_PAGE_SIZE, v);
        let raw_sort = qs.string_or("sort", safelist.default_token());

        validate_bounds(v, page, page_size);
        let sort = safelist.resolve(&raw_sort).unwrap_or_else(|| {
            v.add_error("sort", "invalid sort value");
            safelist.default_token()
        });

        Self { page, page_size, sort }
    }

    /// Build filters from already-typed values
    pub fn new(
        page: i64,
        page_size: i64,
        sort: &str,
        safelist: &SortSafelist,
    ) -> Result<Self, ValidationErrors> {
        let mut v = Validator::new();
        validate_bounds(&mut v, page, page_size);
        let resolved = safelist.resolve(sort);
        v.check(resolved.is_some(), "sort", "invalid sort value");
        v.into_result()?;

        Ok(Self {
            page,
            page_size,
            sort: resolved.unwrap_or_else(|| safelist.default_token()),
        })
    }

    /// First page, default size, default sort
    pub fn first_page(safelist: &SortSafelist) -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            sort: safelist.default_token(),
        }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    pub fn sort_column(&self) -> &'static str {
        self.sort.strip_prefix('-').unwrap_or(self.sort)
    }

    pub fn sort_direction(&self) -> SortDirection {
        if self.sort.starts_with('-') {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

/// Page summary returned next to every list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub current_page: i64,
    pub page_size: i64,
    pub first_page: i64,
    pub last_page: i64,
    pub total_records: i64,
}

impl Metadata {
    /// Summary for `total_records` matches; all zero when nothing matched
    pub fn calculate(total_records: i64, page: i64, page_size: i64) -> Self {
        if total_records == 0 || page_size <= 0 {
            return Self::default();
        }

        Self {
            current_page: page,
            page_size,
            first_page: 1,
            last_page: (total_records + page_size - 1) / page_size,
            total_records,
        }
    }
}

/// One page of records plus its summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub metadata: Metadata,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, metadata: Metadata) -> Self {
        Self { items, metadata }
    }

    /// Assemble a page from `(total_records, record)` rows of a windowed query
    pub fn from_counted_rows(rows: Vec<(i64, T)>, filters: &Filters) -> Self {
        let total = rows.first().map(|(total, _)| *total).unwrap_or(0);
        Self {
            items: rows.into_iter().map(|(_, item)| item).collect(),
            metadata: Metadata::calculate(total, filters.page(), filters.page_size()),
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            metadata: self.metadata,
        }
    }
}
