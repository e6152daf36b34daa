use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Integer, Text, Timestamptz};
use diesel::{delete as diesel_delete, insert_into, update};
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{delete, get, patch, post, State};

use crate::db::schema::articles;
use crate::db::{self, Pool};
use crate::listing::query::{self, ArticleScope};
use crate::listing::results::{self, Listed};
use crate::listing::{ArticleColumn, Listing, RawParams};
use crate::types::{created, parse_id, ApiError, ApiResult, Body, Created};
use crate::utils::serialize_date;

pub const ARTICLE_NOT_FOUND: &str = "article not found";

/// A stored article row, as returned by inserts and vote updates.
#[derive(Debug, Queryable, Identifiable, Serialize, PartialEq)]
#[diesel(table_name = articles, primary_key(article_id))]
pub struct Article {
    pub article_id: i32,
    pub title: String,
    pub body: String,
    pub votes: i32,
    pub topic: String,
    pub author: String,
    #[serde(serialize_with = "serialize_date")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = articles)]
pub struct NewArticle {
    title: String,
    body: String,
    topic: String,
    author: String,
}

impl NewArticle {
    /// `username` names the author; the topic comes from the path.
    pub fn from_body(topic: &str, body: &Body) -> Result<NewArticle, ApiError> {
        Ok(NewArticle {
            title: body.text("title")?,
            body: body.text("body")?,
            author: body.text("username")?,
            topic: topic.to_owned(),
        })
    }
}

/// A listed article: author identity and derived comment count, no body.
#[derive(Debug, QueryableByName, Serialize)]
pub struct ArticleSummary {
    #[diesel(sql_type = Text)]
    pub author: String,
    #[diesel(sql_type = Text)]
    pub title: String,
    #[diesel(sql_type = Integer)]
    pub article_id: i32,
    #[diesel(sql_type = Integer)]
    pub votes: i32,
    #[diesel(sql_type = Timestamptz)]
    #[serde(serialize_with = "serialize_date")]
    pub created_at: DateTime<Utc>,
    #[diesel(sql_type = Text)]
    pub topic: String,
    #[diesel(sql_type = BigInt)]
    pub comment_count: i64,
}

#[derive(Debug, QueryableByName, Serialize)]
pub struct ArticleDetail {
    #[diesel(embed)]
    #[serde(flatten)]
    pub summary: ArticleSummary,
    #[diesel(sql_type = Text)]
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct ArticlesResponse {
    articles: Vec<ArticleSummary>,
}

#[derive(Debug, Serialize)]
pub struct ArticleResponse<T> {
    article: T,
}

impl Article {
    pub fn insert(new_article: &NewArticle, connection: &mut PgConnection) -> Result<Article, ApiError> {
        insert_into(articles::table)
            .values(new_article)
            .get_result::<Article>(connection)
            .map_err(|e| e.into())
    }

    /// `votes = votes + inc_votes`, applied by the database in one statement.
    pub fn vote(article_id: i32, inc_votes: i32, connection: &mut PgConnection) -> Result<Article, ApiError> {
        update(articles::table.find(article_id))
            .set(articles::votes.eq(articles::votes + inc_votes))
            .get_result::<Article>(connection)
            .optional()?
            .ok_or(ApiError::NotFound(Some(ARTICLE_NOT_FOUND)))
    }

    /// Comments go with the article through the foreign key cascade.
    pub fn delete(article_id: i32, connection: &mut PgConnection) -> Result<(), ApiError> {
        let deleted = diesel_delete(articles::table.find(article_id)).execute(connection)?;
        if deleted == 0 {
            Err(ApiError::NotFound(Some(ARTICLE_NOT_FOUND)))
        } else {
            Ok(())
        }
    }
}

impl ArticleDetail {
    pub fn load(article_id: i32, connection: &mut PgConnection) -> Result<ArticleDetail, ApiError> {
        let rows = query::article_detail(article_id).load::<ArticleDetail>(connection)?;
        results::single(rows, ARTICLE_NOT_FOUND)
    }
}

impl ArticleSummary {
    pub fn list(
        scope: ArticleScope,
        listing: &Listing<ArticleColumn>,
        connection: &mut PgConnection,
    ) -> Result<Vec<ArticleSummary>, ApiError> {
        let listed = match scope {
            ArticleScope::All => Listed::AllArticles,
            ArticleScope::Topic(_) => Listed::TopicArticles,
        };
        let rows = query::article_listing(scope, listing).load::<ArticleSummary>(connection)?;
        results::non_empty(rows, listed)
    }
}

async fn list_articles(pool: &Pool, scope: ArticleScope, params: RawParams<'_>) -> ApiResult<ArticlesResponse> {
    let listing = params.validate::<ArticleColumn>()?;
    let articles = db::with_connection(pool, move |connection| {
        ArticleSummary::list(scope, &listing, connection)
    })
    .await?;
    Ok(Json(ArticlesResponse { articles }))
}

#[get("/articles?<limit>&<sort_by>&<p>&<sort_ascending>")]
pub async fn list(
    pool: &State<Pool>,
    limit: Option<&str>,
    sort_by: Option<&str>,
    p: Option<&str>,
    sort_ascending: Option<&str>,
) -> ApiResult<ArticlesResponse> {
    let params = RawParams {
        limit,
        sort_by,
        p,
        sort_ascending,
    };
    list_articles(pool, ArticleScope::All, params).await
}

#[get("/topics/<slug>/articles?<limit>&<sort_by>&<p>&<sort_ascending>")]
pub async fn list_by_topic(
    pool: &State<Pool>,
    slug: &str,
    limit: Option<&str>,
    sort_by: Option<&str>,
    p: Option<&str>,
    sort_ascending: Option<&str>,
) -> ApiResult<ArticlesResponse> {
    let params = RawParams {
        limit,
        sort_by,
        p,
        sort_ascending,
    };
    list_articles(pool, ArticleScope::Topic(slug.to_owned()), params).await
}

#[post("/topics/<slug>/articles", data = "<body>")]
pub async fn create(
    pool: &State<Pool>,
    slug: &str,
    body: Result<Body, ApiError>,
) -> Created<ArticleResponse<Article>> {
    let new_article = NewArticle::from_body(slug, &body?)?;
    let article = db::with_connection(pool, move |connection| {
        Article::insert(&new_article, connection)
    })
    .await?;
    Ok(created(ArticleResponse { article }))
}

#[get("/articles/<article_id>")]
pub async fn get(pool: &State<Pool>, article_id: Result<i32, &str>) -> ApiResult<ArticleResponse<ArticleDetail>> {
    let article_id = parse_id(article_id)?;
    let article = db::with_connection(pool, move |connection| {
        ArticleDetail::load(article_id, connection)
    })
    .await?;
    Ok(Json(ArticleResponse { article }))
}

#[patch("/articles/<article_id>", data = "<body>")]
pub async fn vote(
    pool: &State<Pool>,
    article_id: Result<i32, &str>,
    body: Result<Body, ApiError>,
) -> ApiResult<ArticleResponse<Article>> {
    let article_id = parse_id(article_id)?;
    let inc_votes = body?.inc_votes()?;
    let article = db::with_connection(pool, move |connection| {
        Article::vote(article_id, inc_votes, connection)
    })
    .await?;
    Ok(Json(ArticleResponse { article }))
}

#[delete("/articles/<article_id>")]
pub async fn remove(pool: &State<Pool>, article_id: Result<i32, &str>) -> Result<Status, ApiError> {
    let article_id = parse_id(article_id)?;
    db::with_connection(pool, move |connection| Article::delete(article_id, connection)).await?;
    Ok(Status::NoContent)
}
