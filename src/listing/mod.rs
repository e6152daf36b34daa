//! Bounded, sorted listings over articles and comments.
//!
//! Raw query-string values are validated into a [`Listing`] (sort column,
//! direction and page), which the query builder turns into a single
//! parameterised statement. Sort columns are closed enumerations, so no
//! client text ever reaches the SQL as an identifier.

pub mod page;
pub mod params;
pub mod query;
pub mod results;

pub use self::page::Page;
pub use self::params::RawParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

impl Order {
    /// Only the literal `"true"` sorts ascending.
    pub fn from_flag(sort_ascending: Option<&str>) -> Order {
        match sort_ascending {
            Some("true") => Order::Ascending,
            _ => Order::Descending,
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            Order::Ascending => "ASC",
            Order::Descending => "DESC",
        }
    }
}

/// A column a listing may be ordered by.
pub trait SortColumn: Copy + Sized {
    const DEFAULT: Self;

    fn from_name(name: &str) -> Option<Self>;

    /// The SQL expression placed in `ORDER BY`.
    fn expression(self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleColumn {
    Author,
    Title,
    ArticleId,
    Votes,
    CreatedAt,
    Topic,
    CommentCount,
}

impl SortColumn for ArticleColumn {
    const DEFAULT: Self = ArticleColumn::CreatedAt;

    fn from_name(name: &str) -> Option<Self> {
        let column = match name {
            "author" => ArticleColumn::Author,
            "title" => ArticleColumn::Title,
            "article_id" => ArticleColumn::ArticleId,
            "votes" => ArticleColumn::Votes,
            "created_at" => ArticleColumn::CreatedAt,
            "topic" => ArticleColumn::Topic,
            "comment_count" => ArticleColumn::CommentCount,
            _ => return None,
        };
        Some(column)
    }

    fn expression(self) -> &'static str {
        match self {
            ArticleColumn::Author => "users.username",
            ArticleColumn::Title => "articles.title",
            ArticleColumn::ArticleId => "articles.article_id",
            ArticleColumn::Votes => "articles.votes",
            ArticleColumn::CreatedAt => "articles.created_at",
            ArticleColumn::Topic => "articles.topic",
            ArticleColumn::CommentCount => "comment_count",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentColumn {
    CommentId,
    Author,
    Votes,
    CreatedAt,
    Body,
}

impl SortColumn for CommentColumn {
    const DEFAULT: Self = CommentColumn::CreatedAt;

    fn from_name(name: &str) -> Option<Self> {
        let column = match name {
            "comment_id" => CommentColumn::CommentId,
            "author" => CommentColumn::Author,
            "votes" => CommentColumn::Votes,
            "created_at" => CommentColumn::CreatedAt,
            "body" => CommentColumn::Body,
            _ => return None,
        };
        Some(column)
    }

    fn expression(self) -> &'static str {
        match self {
            CommentColumn::CommentId => "comments.comment_id",
            CommentColumn::Author => "users.username",
            CommentColumn::Votes => "comments.votes",
            CommentColumn::CreatedAt => "comments.created_at",
            CommentColumn::Body => "comments.body",
        }
    }
}

/// A validated listing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Listing<C> {
    pub sort_by: C,
    pub order: Order,
    pub page: Page,
}
