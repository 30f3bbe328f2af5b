use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use sea_orm::{EntityTrait, QuerySelect, Select};
use serde::Deserialize;
use tracing::debug;
use utoipa::IntoParams;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PER_PAGE: u64 = 10;
pub const MAX_PER_PAGE: u64 = 100;

/// Query parameters accepted by list endpoints.
///
/// Values are parsed leniently: anything that is not a positive integer
/// falls back to the default.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationQuery {
    /// Page number, starting at 1 (default: 1)
    #[param(value_type = Option<u64>)]
    pub page: Option<String>,
    /// Page size (default: 10, capped at 100)
    #[param(value_type = Option<u64>)]
    pub per_page: Option<String>,
}

/// A resolved page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u64,
    pub size: u64,
}

fn positive(value: Option<&str>) -> Option<u64> {
    value
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
}

impl PaginationQuery {
    pub fn resolve(&self) -> Page {
        Page {
            number: positive(self.page.as_deref()).unwrap_or(DEFAULT_PAGE),
            size: positive(self.per_page.as_deref())
                .unwrap_or(DEFAULT_PER_PAGE)
                .min(MAX_PER_PAGE),
        }
    }
}

impl Page {
    pub fn offset(&self) -> u64 {
        // Databases take signed offsets
        self.size.saturating_mul(self.number - 1).min(i64::MAX as u64)
    }

    /// Restrict `select` to this page. The caller is responsible for a
    /// stable ordering.
    pub fn apply<E: EntityTrait>(&self, select: Select<E>) -> Select<E> {
        select.offset(self.offset()).limit(self.size)
    }
}

/// A query string that does not even parse (say `?page=1&page=2`) yields the
/// default page, like any other unusable value.
#[async_trait]
impl<S> FromRequestParts<S> for Page
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let query = match Query::<PaginationQuery>::from_request_parts(parts, state).await {
            Ok(Query(query)) => query,
            Err(rejection) => {
                debug!(reason = %rejection.body_text(), "Ignoring malformed pagination query");
                PaginationQuery::default()
            }
        };
        Ok(query.resolve())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, per_page: Option<&str>) -> PaginationQuery {
        PaginationQuery {
            page: page.map(str::to_string),
            per_page: per_page.map(str::to_string),
        }
    }

    #[test]
    fn test_defaults() {
        let page = PaginationQuery::default().resolve();

        assert_eq!(page, Page { number: 1, size: 10 });
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_window() {
        let page = query(Some("3"), Some("20")).resolve();

        assert_eq!(page, Page { number: 3, size: 20 });
        assert_eq!(page.offset(), 40);
    }

    #[test]
    fn test_per_page_is_capped() {
        assert_eq!(query(None, Some("500")).resolve().size, MAX_PER_PAGE);
        assert_eq!(query(None, Some("100")).resolve().size, 100);
    }

    #[test]
    fn test_invalid_values_fall_back_to_defaults() {
        assert_eq!(query(Some("abc"), Some("-5")).resolve(), Page { number: 1, size: 10 });
        assert_eq!(query(Some("0"), Some("0")).resolve(), Page { number: 1, size: 10 });
    }
}
