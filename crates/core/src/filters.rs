//! Pagination and sorting for list endpoints.
//!
//! Sort column names cannot be bound as query parameters, so the only thing
//! standing between user input and the `ORDER BY` clause is the safelist.
//! [`Filters::validate`] rejects unknown keys up front; [`Filters::sort_column`]
//! only ever hands back a `&'static str` taken from the safelist itself.

use std::fmt;

use serde::Serialize;

use crate::error::InvariantViolation;
use crate::validation::{permitted_value, Validator};

/// Largest accepted page number.
pub const MAX_PAGE: i64 = 10_000_000;

/// Largest accepted page size.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Prefix marking a descending sort.
const DESC_PREFIX: char = '-';

/// User-supplied paging and sorting parameters plus the server-defined
/// set of sortable columns.
#[derive(Debug, Clone)]
pub struct Filters {
    pub page: i64,
    pub page_size: i64,
    /// A safelist entry, optionally prefixed with `-` for descending order.
    pub sort: String,
    pub sort_safelist: &'static [&'static str],
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

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl Filters {
    /// Record every paging/sorting violation on `v`.
    pub fn validate(&self, v: &mut Validator) {
        v.check(self.page > 0, "page", "must be greater than zero");
        v.check(self.page <= MAX_PAGE, "page", "must be a maximum of 10 million");
        v.check(self.page_size > 0, "page_size", "must be greater than zero");
        v.check(
            self.page_size <= MAX_PAGE_SIZE,
            "page_size",
            "must be a maximum of 100",
        );
        v.check(
            permitted_value(self.sort_key(), self.sort_safelist),
            "sort",
            "invalid sort value",
        );
    }

    /// The sort key with a single leading `-` removed.
    fn sort_key(&self) -> &str {
        self.sort.strip_prefix(DESC_PREFIX).unwrap_or(&self.sort)
    }

    /// Column to interpolate into `ORDER BY`.
    ///
    /// Only reachable after [`Filters::validate`] passed. A key outside the
    /// safelist at this point means validation and the query layer disagree,
    /// and the caller must abort rather than fall back to any default.
    pub fn sort_column(&self) -> Result<&'static str, InvariantViolation> {
        let key = self.sort_key();
        self.sort_safelist
            .iter()
            .copied()
            .find(|safe| *safe == key)
            .ok_or_else(|| InvariantViolation(format!("unsafe sort parameter: {}", self.sort)))
    }

    pub fn sort_direction(&self) -> SortDirection {
        if self.sort.starts_with(DESC_PREFIX) {
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

fn is_zero(n: &i64) -> bool {
    *n == 0
}

/// Pagination details for a list response. All-zero means "no results".
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "is_zero")]
    pub current_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub page_size: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub first_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub last_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub total_records: i64,
}

pub fn calculate_metadata(total_records: i64, page: i64, page_size: i64) -> Metadata {
    if total_records == 0 || page_size <= 0 {
        return Metadata::default();
    }

    Metadata {
        current_page: page,
        page_size,
        first_page: 1,
        last_page: (total_records + page_size - 1) / page_size,
        total_records,
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const SAFELIST: &[&str] = &["id", "title", "year", "runtime"];

    fn filters(page: i64, page_size: i64, sort: &str) -> Filters {
        Filters {
            page,
            page_size,
            sort: sort.to_string(),
            sort_safelist: SAFELIST,
        }
    }

    fn violations(f: &Filters) -> Validator {
        let mut v = Validator::new();
        f.validate(&mut v);
        v
    }

    #[test]
    fn valid_filters_pass_and_strip_prefix() {
        for sort in ["id", "-id", "title", "-title", "year", "-runtime"] {
            let f = filters(3, 25, sort);
            assert!(violations(&f).valid(), "{sort} should be accepted");
            assert_eq!(f.sort_column(), Ok(sort.trim_start_matches('-')));
        }
    }

    #[test]
    fn unknown_sort_reports_exactly_one_violation() {
        for sort in ["rating", "-rating", "title; DROP TABLE movies", "--id", "", "-"] {
            let v = violations(&filters(1, 20, sort));
            assert_eq!(v.errors().len(), 1, "{sort:?}");
            assert_eq!(v.errors().get("sort"), Some("invalid sort value"));
        }
    }

    #[test]
    fn page_bounds() {
        let v = violations(&filters(0, 20, "id"));
        assert_eq!(v.errors().get("page"), Some("must be greater than zero"));

        let v = violations(&filters(MAX_PAGE + 1, 20, "id"));
        assert_eq!(v.errors().get("page"), Some("must be a maximum of 10 million"));

        assert!(violations(&filters(MAX_PAGE, 20, "id")).valid());
    }

    #[test]
    fn page_size_bounds() {
        let v = violations(&filters(1, 0, "id"));
        assert_eq!(v.errors().get("page_size"), Some("must be greater than zero"));

        let v = violations(&filters(1, 101, "id"));
        assert_eq!(v.errors().get("page_size"), Some("must be a maximum of 100"));

        assert!(violations(&filters(1, MAX_PAGE_SIZE, "id")).valid());
    }

    #[test]
    fn violations_are_not_short_circuited() {
        let v = violations(&filters(-1, 500, "bogus"));
        assert_eq!(v.errors().len(), 3);
    }

    #[test]
    fn sort_column_outside_safelist_is_an_invariant_violation() {
        assert_matches!(filters(1, 20, "rating").sort_column(), Err(InvariantViolation(_)));
    }

    #[test]
    fn sort_direction_follows_prefix() {
        assert_eq!(filters(1, 20, "year").sort_direction(), SortDirection::Asc);
        assert_eq!(filters(1, 20, "-year").sort_direction(), SortDirection::Desc);
        assert_eq!(SortDirection::Desc.to_string(), "DESC");
    }

    #[test]
    fn limit_and_offset() {
        let f = filters(1, 20, "id");
        assert_eq!((f.limit(), f.offset()), (20, 0));

        let f = filters(4, 15, "id");
        assert_eq!((f.limit(), f.offset()), (15, 45));
    }

    #[test]
    fn metadata_for_partial_last_page() {
        assert_eq!(
            calculate_metadata(17, 2, 5),
            Metadata {
                current_page: 2,
                page_size: 5,
                first_page: 1,
                last_page: 4,
                total_records: 17,
            }
        );
    }

    #[test]
    fn metadata_for_exact_multiple() {
        assert_eq!(calculate_metadata(20, 1, 5).last_page, 4);
        assert_eq!(calculate_metadata(1, 1, 100).last_page, 1);
    }

    #[test]
    fn empty_result_set_yields_zero_metadata() {
        for (page, page_size) in [(1, 20), (7, 3), (10_000_000, 100)] {
            assert_eq!(calculate_metadata(0, page, page_size), Metadata::default());
        }
    }

    #[test]
    fn zero_metadata_serializes_to_empty_object() {
        let json = serde_json::to_value(Metadata::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));

        let json = serde_json::to_value(calculate_metadata(17, 2, 5)).unwrap();
        assert_eq!(json["last_page"], 4);
        assert_eq!(json["total_records"], 17);
    }
}
