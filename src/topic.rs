use diesel::insert_into;
use diesel::prelude::*;
use rocket::serde::json::Json;
use rocket::{get, post, State};

use crate::db::schema::topics;
use crate::db::{self, Pool};
use crate::types::{created, ApiError, ApiResult, Body, Created};

#[derive(Debug, Queryable, Insertable, Serialize, PartialEq)]
#[diesel(table_name = topics)]
pub struct Topic {
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct TopicResponse {
    topic: Topic,
}

#[derive(Debug, Serialize)]
pub struct TopicsResponse {
    topics: Vec<Topic>,
}

impl Topic {
    pub fn from_body(body: &Body) -> Result<Topic, ApiError> {
        Ok(Topic {
            slug: body.text("slug")?,
            description: body.text("description")?,
        })
    }

    pub fn all(connection: &mut PgConnection) -> Result<Vec<Topic>, ApiError> {
        topics::table
            .order(topics::slug.asc())
            .load::<Topic>(connection)
            .map_err(|e| e.into())
    }

    pub fn insert(&self, connection: &mut PgConnection) -> Result<Topic, ApiError> {
        insert_into(topics::table)
            .values(self)
            .get_result::<Topic>(connection)
            .map_err(|e| e.into())
    }
}

#[get("/topics")]
pub async fn list(pool: &State<Pool>) -> ApiResult<TopicsResponse> {
    let topics = db::with_connection(pool, Topic::all).await?;
    Ok(Json(TopicsResponse { topics }))
}

#[post("/topics", data = "<body>")]
pub async fn create(pool: &State<Pool>, body: Result<Body, ApiError>) -> Created<TopicResponse> {
    let new_topic = Topic::from_body(&body?)?;
    let topic = db::with_connection(pool, move |connection| new_topic.insert(connection)).await?;
    Ok(created(TopicResponse { topic }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(raw: &str) -> Body {
        Body::parse(raw.as_bytes()).unwrap()
    }

    #[test]
    fn topics_need_slug_and_description() {
        let topic = Topic::from_body(&body(r#"{"slug": "cats", "description": "not dogs"}"#));
        assert_eq!(
            topic,
            Ok(Topic {
                slug: String::from("cats"),
                description: String::from("not dogs"),
            })
        );
        assert_eq!(
            Topic::from_body(&body(r#"{"slug": "", "description": "x"}"#)),
            Err(ApiError::InvalidInput("invalid data entry"))
        );
        assert_eq!(
            Topic::from_body(&body(r#"{"slug": "cats"}"#)),
            Err(ApiError::InvalidInput("invalid data entry"))
        );
    }
}
