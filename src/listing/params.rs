use super::page::{DEFAULT_LIMIT, DEFAULT_PAGE};
use super::{Listing, Order, Page, SortColumn};
use crate::types::ApiError;

pub const INVALID_QUERY_TYPE: &str = "invalid query type";
pub const UNKNOWN_COLUMN: &str = "column does not exist in the table";

/// Listing parameters exactly as they arrived in the query string.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawParams<'a> {
    pub limit: Option<&'a str>,
    pub sort_by: Option<&'a str>,
    pub p: Option<&'a str>,
    pub sort_ascending: Option<&'a str>,
}

fn number(raw: Option<&str>, default: i64) -> Result<i64, ApiError> {
    match raw {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|_| ApiError::InvalidQuery(INVALID_QUERY_TYPE)),
    }
}

impl<'a> RawParams<'a> {
    /// Numbers are checked first, then the sort column. The direction flag
    /// never fails.
    pub fn validate<C: SortColumn>(&self) -> Result<Listing<C>, ApiError> {
        let limit = number(self.limit, DEFAULT_LIMIT)?;
        let page = number(self.p, DEFAULT_PAGE)?;
        if limit < 0 {
            return Err(ApiError::InvalidQuery(INVALID_QUERY_TYPE));
        }

        let sort_by = match self.sort_by {
            None => C::DEFAULT,
            Some(name) => C::from_name(name).ok_or(ApiError::InvalidQuery(UNKNOWN_COLUMN))?,
        };

        Ok(Listing {
            sort_by,
            order: Order::from_flag(self.sort_ascending),
            page: Page::new(limit, page),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::{ArticleColumn, CommentColumn};
    use rstest::rstest;

    fn raw<'a>(limit: Option<&'a str>, p: Option<&'a str>) -> RawParams<'a> {
        RawParams {
            limit,
            p,
            ..RawParams::default()
        }
    }

    #[test]
    fn defaults() {
        let listing = RawParams::default().validate::<ArticleColumn>().unwrap();
        assert_eq!(
            listing,
            Listing {
                sort_by: ArticleColumn::CreatedAt,
                order: Order::Descending,
                page: Page { limit: 10, offset: 0 },
            }
        );
    }

    #[test]
    fn page_and_limit_set_the_offset() {
        let listing = raw(Some("5"), Some("3")).validate::<CommentColumn>().unwrap();
        assert_eq!(listing.page, Page { limit: 5, offset: 10 });
    }

    #[rstest]
    #[case(Some("ten"), None)]
    #[case(None, Some("two"))]
    #[case(Some(""), None)]
    #[case(Some("2.5"), None)]
    #[case(Some("-1"), None)]
    fn bad_numbers_are_rejected(#[case] limit: Option<&str>, #[case] p: Option<&str>) {
        assert_eq!(
            raw(limit, p).validate::<ArticleColumn>(),
            Err(ApiError::InvalidQuery(INVALID_QUERY_TYPE))
        );
    }

    #[test]
    fn numbers_are_checked_before_the_column() {
        let params = RawParams {
            limit: Some("x"),
            sort_by: Some("not_a_real_column"),
            ..RawParams::default()
        };
        assert_eq!(
            params.validate::<ArticleColumn>(),
            Err(ApiError::InvalidQuery(INVALID_QUERY_TYPE))
        );
    }

    #[test]
    fn unknown_sort_column_is_rejected() {
        let params = RawParams {
            sort_by: Some("not_a_real_column"),
            ..RawParams::default()
        };
        assert_eq!(
            params.validate::<ArticleColumn>(),
            Err(ApiError::InvalidQuery(UNKNOWN_COLUMN))
        );
    }

    #[test]
    fn malformed_direction_falls_back_to_descending() {
        let params = RawParams {
            sort_by: Some("votes"),
            sort_ascending: Some("yes please"),
            ..RawParams::default()
        };
        let listing = params.validate::<ArticleColumn>().unwrap();
        assert_eq!(listing.sort_by, ArticleColumn::Votes);
        assert_eq!(listing.order, Order::Descending);
    }
}
