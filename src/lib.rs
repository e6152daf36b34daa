#[macro_use]
extern crate diesel;
#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate serde_json;

pub mod api;
pub mod article;
pub mod comment;
pub mod db;
pub mod listing;
pub mod topic;
pub mod types;
pub mod users;
pub mod utils;

use rocket::http::Status;
use rocket::request::Request;
use rocket::serde::json::Value;
use rocket::{catch, catchers, routes, Build, Rocket};

use crate::db::Pool;

pub const API_BASE: &str = "/api";

#[catch(404)]
fn not_found(_req: &Request) -> Value {
    json!({ "msg": "route not found" })
}

#[catch(default)]
fn default_catcher(status: Status, _req: &Request) -> Value {
    json!({ "msg": status.reason().unwrap_or("unexpected error") })
}

/// Assembles the service around an already built pool.
pub fn rocket(pool: Pool) -> Rocket<Build> {
    rocket::build()
        .manage(pool)
        .mount(API_BASE, routes![api::index])
        .mount(API_BASE, routes![topic::list, topic::create])
        .mount(
            API_BASE,
            routes![
                article::list,
                article::list_by_topic,
                article::create,
                article::get,
                article::vote,
                article::remove,
            ],
        )
        .mount(
            API_BASE,
            routes![comment::list, comment::add, comment::vote, comment::remove],
        )
        .mount(
            API_BASE,
            routes![users::list, users::register, users::profile],
        )
        .mount(API_BASE, api::method_not_allowed())
        .register("/", catchers![not_found, default_catcher])
}

/// Launches `rocket` and waits for it to shut down. A failed launch, such
/// as a port already in use, is an error.
pub async fn serve(rocket: Rocket<Build>) -> db::Result<()> {
    rocket
        .launch()
        .await
        .map_err(|e| db::ErrorKind::Launch(e.to_string()))?;
    Ok(())
}
