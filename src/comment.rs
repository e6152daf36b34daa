use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{Integer, Text, Timestamptz};
use diesel::{delete as diesel_delete, insert_into, update};
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{delete, get, patch, post, State};

use crate::db::schema::comments;
use crate::db::{self, Pool};
use crate::listing::query;
use crate::listing::results::{self, Listed};
use crate::listing::{CommentColumn, Listing, RawParams};
use crate::types::{created, parse_id, ApiError, ApiResult, Body, Created};
use crate::utils::serialize_date;

pub const COMMENT_NOT_FOUND: &str = "comment not found";

#[derive(Debug, Serialize, PartialEq, Identifiable, Queryable)]
#[diesel(table_name = comments, primary_key(comment_id))]
pub struct Comment {
    pub comment_id: i32,
    pub author: String,
    pub article_id: i32,
    pub votes: i32,
    #[serde(serialize_with = "serialize_date")]
    pub created_at: DateTime<Utc>,
    pub body: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = comments)]
pub struct NewComment {
    article_id: i32,
    author: String,
    body: String,
}

impl NewComment {
    pub fn from_body(article_id: i32, body: &Body) -> Result<NewComment, ApiError> {
        Ok(NewComment {
            article_id,
            author: body.text("username")?,
            body: body.text("body")?,
        })
    }
}

/// A listed comment with its author's identity.
#[derive(Debug, QueryableByName, Serialize)]
pub struct CommentView {
    #[diesel(sql_type = Integer)]
    pub comment_id: i32,
    #[diesel(sql_type = Text)]
    pub author: String,
    #[diesel(sql_type = Text)]
    pub body: String,
    #[diesel(sql_type = Integer)]
    pub votes: i32,
    #[diesel(sql_type = Timestamptz)]
    #[serde(serialize_with = "serialize_date")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CommentContainer<T> {
    comment: T,
}

#[derive(Debug, Serialize)]
pub struct CommentsContainer<T> {
    comments: T,
}

impl Comment {
    pub fn insert(new_comment: &NewComment, conn: &mut PgConnection) -> Result<Comment, ApiError> {
        insert_into(comments::table)
            .values(new_comment)
            .get_result::<Comment>(conn)
            .map_err(|e| e.into())
    }

    /// Atomic `votes = votes + inc_votes` on a comment of the given article.
    /// A miss is a bad request rather than a missing resource.
    pub fn vote(
        article_id: i32,
        comment_id: i32,
        inc_votes: i32,
        conn: &mut PgConnection,
    ) -> Result<Comment, ApiError> {
        let target = comments::table
            .filter(comments::comment_id.eq(comment_id))
            .filter(comments::article_id.eq(article_id));
        update(target)
            .set(comments::votes.eq(comments::votes + inc_votes))
            .get_result::<Comment>(conn)
            .optional()?
            .ok_or(ApiError::InvalidInput(COMMENT_NOT_FOUND))
    }

    pub fn delete(article_id: i32, comment_id: i32, conn: &mut PgConnection) -> Result<(), ApiError> {
        let target = comments::table
            .filter(comments::comment_id.eq(comment_id))
            .filter(comments::article_id.eq(article_id));
        match diesel_delete(target).execute(conn)? {
            0 => Err(ApiError::NotFound(Some(COMMENT_NOT_FOUND))),
            _ => Ok(()),
        }
    }
}

impl CommentView {
    pub fn list(
        article_id: i32,
        listing: &Listing<CommentColumn>,
        conn: &mut PgConnection,
    ) -> Result<Vec<CommentView>, ApiError> {
        let rows = query::comment_listing(article_id, listing).load::<CommentView>(conn)?;
        results::non_empty(rows, Listed::ArticleComments)
    }
}

#[get("/articles/<article_id>/comments?<limit>&<sort_by>&<p>&<sort_ascending>")]
pub async fn list(
    pool: &State<Pool>,
    article_id: Result<i32, &str>,
    limit: Option<&str>,
    sort_by: Option<&str>,
    p: Option<&str>,
    sort_ascending: Option<&str>,
) -> ApiResult<CommentsContainer<Vec<CommentView>>> {
    let article_id = parse_id(article_id)?;
    let params = RawParams {
        limit,
        sort_by,
        p,
        sort_ascending,
    };
    let listing = params.validate::<CommentColumn>()?;
    let comments = db::with_connection(pool, move |conn| {
        CommentView::list(article_id, &listing, conn)
    })
    .await?;
    Ok(Json(CommentsContainer { comments }))
}

#[post("/articles/<article_id>/comments", data = "<details>")]
pub async fn add(
    pool: &State<Pool>,
    article_id: Result<i32, &str>,
    details: Result<Body, ApiError>,
) -> Created<CommentContainer<Comment>> {
    let article_id = parse_id(article_id)?;
    let new_comment = NewComment::from_body(article_id, &details?)?;
    let comment = db::with_connection(pool, move |conn| Comment::insert(&new_comment, conn)).await?;
    Ok(created(CommentContainer { comment }))
}

#[patch("/articles/<article_id>/comments/<comment_id>", data = "<details>")]
pub async fn vote(
    pool: &State<Pool>,
    article_id: Result<i32, &str>,
    comment_id: Result<i32, &str>,
    details: Result<Body, ApiError>,
) -> ApiResult<CommentContainer<Comment>> {
    let article_id = parse_id(article_id)?;
    let comment_id = parse_id(comment_id)?;
    let inc_votes = details?.inc_votes()?;
    let comment = db::with_connection(pool, move |conn| {
        Comment::vote(article_id, comment_id, inc_votes, conn)
    })
    .await?;
    Ok(Json(CommentContainer { comment }))
}

#[delete("/articles/<article_id>/comments/<comment_id>")]
pub async fn remove(
    pool: &State<Pool>,
    article_id: Result<i32, &str>,
    comment_id: Result<i32, &str>,
) -> Result<Status, ApiError> {
    let article_id = parse_id(article_id)?;
    let comment_id = parse_id(comment_id)?;
    db::with_connection(pool, move |conn| Comment::delete(article_id, comment_id, conn)).await?;
    Ok(Status::NoContent)
}
