use rocket::serde::json::Json;
use rocket::{get, post, State};

use crate::db::{self, Pool};
use crate::types::{created, ApiError, ApiResult, Body, Created};

pub mod models;

use self::models::User;

pub const USER_NOT_FOUND: &str = "user not found";

#[derive(Debug, Serialize)]
pub struct UserResponse {
    user: User,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    users: Vec<User>,
}

#[get("/users")]
pub async fn list(pool: &State<Pool>) -> ApiResult<UsersResponse> {
    let users = db::with_connection(pool, User::all).await?;
    Ok(Json(UsersResponse { users }))
}

#[post("/users", data = "<registration>")]
pub async fn register(pool: &State<Pool>, registration: Result<Body, ApiError>) -> Created<UserResponse> {
    let new_user = User::from_body(&registration?)?;
    let user = db::with_connection(pool, move |connection| new_user.insert(connection)).await?;
    Ok(created(UserResponse { user }))
}

#[get("/users/<username>")]
pub async fn profile(pool: &State<Pool>, username: &str) -> ApiResult<UserResponse> {
    let username = username.to_owned();
    let user = db::with_connection(pool, move |connection| User::load_by_name(&username, connection))
        .await?
        .ok_or(ApiError::NotFound(Some(USER_NOT_FOUND)))?;
    Ok(Json(UserResponse { user }))
}
