pub const DEFAULT_LIMIT: i64 = 10;
pub const DEFAULT_PAGE: i64 = 1;

/// The `LIMIT`/`OFFSET` pair of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    /// `offset = limit * (page - 1)`. Pages below 1 are read as page 1.
    pub fn new(limit: i64, page: i64) -> Page {
        let page = page.max(1);
        Page {
            limit,
            offset: limit.saturating_mul(page - 1),
        }
    }
}

impl Default for Page {
    fn default() -> Page {
        Page::new(DEFAULT_LIMIT, DEFAULT_PAGE)
    }
}
