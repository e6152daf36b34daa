use diesel::insert_into;
use diesel::prelude::*;

use crate::db::schema::users;
use crate::types::{ApiError, Body};

#[derive(Debug, Queryable, Insertable, Serialize, PartialEq)]
#[diesel(table_name = users)]
pub struct User {
    pub username: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

impl User {
    /// `username` and `name` are required; `avatar_url` may be left out.
    pub fn from_body(body: &Body) -> Result<User, ApiError> {
        Ok(User {
            username: body.text("username")?,
            name: body.text("name")?,
            avatar_url: body.optional_text("avatar_url")?,
        })
    }

    pub fn all(connection: &mut PgConnection) -> Result<Vec<User>, ApiError> {
        users::table
            .order(users::username.asc())
            .load::<User>(connection)
            .map_err(|e| e.into())
    }

    pub fn insert(&self, connection: &mut PgConnection) -> Result<User, ApiError> {
        insert_into(users::table)
            .values(self)
            .get_result::<User>(connection)
            .map_err(|e| e.into())
    }

    pub fn load_by_name(name: &str, connection: &mut PgConnection) -> Result<Option<User>, ApiError> {
        users::table
            .find(name)
            .get_result::<User>(connection)
            .optional()
            .map_err(|e| e.into())
    }
}
