use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::deserialize::QueryableByName;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Integer, Text};
use tracing::debug;

use super::{ArticleColumn, CommentColumn, Listing, Order, Page, SortColumn};

const ARTICLE_COLUMNS: &[&str] = &[
    "users.username AS author",
    "articles.title",
    "articles.article_id",
    "articles.votes",
    "articles.created_at",
    "articles.topic",
    "COUNT(comments.comment_id) AS comment_count",
];

const COMMENT_COLUMNS: &[&str] = &[
    "comments.comment_id",
    "users.username AS author",
    "comments.body",
    "comments.votes",
    "comments.created_at",
];

/// The bound value of an equality filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Integer(i32),
}

/// Which articles a listing covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleScope {
    All,
    Topic(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct OrderBy {
    expression: &'static str,
    order: Order,
    tiebreak: &'static str,
}

/// A single `SELECT` over joined tables. Identifiers are always static
/// strings; the filter value and page bounds travel as bind parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select {
    columns: Vec<&'static str>,
    from: &'static str,
    joins: Vec<String>,
    filter: Option<(&'static str, FilterValue)>,
    group_by: Vec<&'static str>,
    order_by: Option<OrderBy>,
    page: Option<Page>,
}

impl Select {
    pub fn from(table: &'static str) -> Select {
        Select {
            columns: Vec::new(),
            from: table,
            joins: Vec::new(),
            filter: None,
            group_by: Vec::new(),
            order_by: None,
            page: None,
        }
    }

    pub fn columns(mut self, columns: &[&'static str]) -> Select {
        self.columns.extend_from_slice(columns);
        self
    }

    pub fn inner_join(mut self, table: &str, on: &str) -> Select {
        self.joins.push(format!("INNER JOIN {} ON {}", table, on));
        self
    }

    /// Rows of `self.from` without a match are kept.
    pub fn left_join(mut self, table: &str, on: &str) -> Select {
        self.joins.push(format!("LEFT JOIN {} ON {}", table, on));
        self
    }

    pub fn filter_eq(mut self, column: &'static str, value: FilterValue) -> Select {
        self.filter = Some((column, value));
        self
    }

    pub fn group_by(mut self, columns: &[&'static str]) -> Select {
        self.group_by.extend_from_slice(columns);
        self
    }

    pub fn order_by(mut self, expression: &'static str, order: Order, tiebreak: &'static str) -> Select {
        self.order_by = Some(OrderBy {
            expression,
            order,
            tiebreak,
        });
        self
    }

    pub fn paginate(mut self, page: Page) -> Select {
        self.page = Some(page);
        self
    }

    pub fn to_sql(&self) -> String {
        let mut sql = format!("SELECT {} FROM {}", self.columns.join(", "), self.from);
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }

        let mut placeholder = 0;
        if let Some((column, _)) = &self.filter {
            placeholder += 1;
            sql.push_str(&format!(" WHERE {} = ${}", column, placeholder));
        }
        if !self.group_by.is_empty() {
            sql.push_str(&format!(" GROUP BY {}", self.group_by.join(", ")));
        }
        if let Some(order_by) = &self.order_by {
            let direction = order_by.order.sql();
            sql.push_str(&format!(
                " ORDER BY {} {}, {} {}",
                order_by.expression, direction, order_by.tiebreak, direction
            ));
        }
        if self.page.is_some() {
            sql.push_str(&format!(" LIMIT ${} OFFSET ${}", placeholder + 1, placeholder + 2));
        }
        sql
    }

    /// Binds the filter, then limit and offset, in placeholder order.
    pub fn load<T>(self, conn: &mut PgConnection) -> QueryResult<Vec<T>>
    where
        T: QueryableByName<Pg> + 'static,
    {
        let sql = self.to_sql();
        debug!(%sql, "running listing query");
        let mut query = sql_query(sql).into_boxed::<Pg>();
        if let Some((_, value)) = self.filter {
            query = match value {
                FilterValue::Text(text) => query.bind::<Text, _>(text),
                FilterValue::Integer(id) => query.bind::<Integer, _>(id),
            };
        }
        if let Some(page) = self.page {
            query = query
                .bind::<BigInt, _>(page.limit)
                .bind::<BigInt, _>(page.offset);
        }
        query.load::<T>(conn)
    }
}

fn articles_with_counts() -> Select {
    Select::from("articles")
        .inner_join("users", "users.username = articles.author")
        .left_join("comments", "comments.article_id = articles.article_id")
}

/// Article rows with their author and derived comment count.
pub fn article_listing(scope: ArticleScope, listing: &Listing<ArticleColumn>) -> Select {
    let select = articles_with_counts().columns(ARTICLE_COLUMNS);
    let select = match scope {
        ArticleScope::All => select,
        ArticleScope::Topic(slug) => select.filter_eq("articles.topic", FilterValue::Text(slug)),
    };
    select
        .group_by(&["articles.article_id", "users.username"])
        .order_by(
            listing.sort_by.expression(),
            listing.order,
            "articles.article_id",
        )
        .paginate(listing.page)
}

/// One article, with body, by identifier.
pub fn article_detail(article_id: i32) -> Select {
    articles_with_counts()
        .columns(ARTICLE_COLUMNS)
        .columns(&["articles.body"])
        .filter_eq("articles.article_id", FilterValue::Integer(article_id))
        .group_by(&["articles.article_id", "users.username"])
}

/// Comments of one article with their author.
pub fn comment_listing(article_id: i32, listing: &Listing<CommentColumn>) -> Select {
    Select::from("comments")
        .columns(COMMENT_COLUMNS)
        .inner_join("users", "users.username = comments.author")
        .filter_eq("comments.article_id", FilterValue::Integer(article_id))
        .order_by(
            listing.sort_by.expression(),
            listing.order,
            "comments.comment_id",
        )
        .paginate(listing.page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::RawParams;

    fn listing<C: SortColumn>(params: RawParams) -> Listing<C> {
        params.validate::<C>().unwrap()
    }

    #[test]
    fn global_article_listing() {
        let sql = article_listing(ArticleScope::All, &listing(RawParams::default())).to_sql();
        assert_eq!(
            sql,
            "SELECT users.username AS author, articles.title, articles.article_id, \
             articles.votes, articles.created_at, articles.topic, \
             COUNT(comments.comment_id) AS comment_count \
             FROM articles \
             INNER JOIN users ON users.username = articles.author \
             LEFT JOIN comments ON comments.article_id = articles.article_id \
             GROUP BY articles.article_id, users.username \
             ORDER BY articles.created_at DESC, articles.article_id DESC \
             LIMIT $1 OFFSET $2"
        );
    }

    #[test]
    fn topic_listing_binds_the_topic_first() {
        let params = RawParams {
            sort_by: Some("comment_count"),
            sort_ascending: Some("true"),
            ..RawParams::default()
        };
        let select = article_listing(ArticleScope::Topic(String::from("cats")), &listing(params));
        let sql = select.to_sql();
        assert!(sql.contains(" WHERE articles.topic = $1 GROUP BY"));
        assert!(sql.ends_with("ORDER BY comment_count ASC, articles.article_id ASC LIMIT $2 OFFSET $3"));
        assert_eq!(
            select.filter,
            Some(("articles.topic", FilterValue::Text(String::from("cats"))))
        );
    }

    #[test]
    fn counts_use_an_outer_join() {
        let sql = article_listing(ArticleScope::All, &listing(RawParams::default())).to_sql();
        assert!(sql.contains("LEFT JOIN comments"));
        assert!(!sql.contains("INNER JOIN comments"));
    }

    #[test]
    fn detail_is_unbounded_and_unordered() {
        let select = article_detail(7);
        let sql = select.to_sql();
        assert!(sql.contains("articles.body"));
        assert!(sql.contains("WHERE articles.article_id = $1"));
        assert!(!sql.contains("ORDER BY"));
        assert!(!sql.contains("LIMIT"));
        assert_eq!(select.page, None);
    }

    #[test]
    fn comment_listing_has_no_aggregate() {
        let params = RawParams {
            limit: Some("3"),
            p: Some("2"),
            sort_by: Some("votes"),
            ..RawParams::default()
        };
        let select = comment_listing(1, &listing(params));
        assert_eq!(
            select.to_sql(),
            "SELECT comments.comment_id, users.username AS author, comments.body, \
             comments.votes, comments.created_at \
             FROM comments \
             INNER JOIN users ON users.username = comments.author \
             WHERE comments.article_id = $1 \
             ORDER BY comments.votes DESC, comments.comment_id DESC \
             LIMIT $2 OFFSET $3"
        );
        assert_eq!(select.page, Some(Page { limit: 3, offset: 3 }));
    }
}
