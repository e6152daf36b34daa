//! Outcomes decided before any database work. The pool points at a closed
//! port, so a request that gets as far as a checkout answers 503.

use std::net::{Ipv4Addr, TcpListener};
use std::time::{Duration, Instant};

use newsdesk::db::{self, Config};
use rocket::http::{ContentType, Status};
use rocket::local::asynchronous;
use rocket::local::blocking::Client;
use rstest::{fixture, rstest};
use serde_json::{json, Value};

fn unreachable_pool(timeout: Duration) -> db::Pool {
    let config = Config {
        database_url: String::from("postgres://newsdesk@127.0.0.1:1/newsdesk"),
        pool_size: 1,
        connection_timeout: timeout,
    };
    db::lazy_pool(&config)
}

#[fixture]
fn client() -> Client {
    let pool = unreachable_pool(Duration::from_millis(200));
    Client::tracked(newsdesk::rocket(pool)).expect("valid rocket instance")
}

fn body_of(response: rocket::local::blocking::LocalResponse) -> Value {
    response.into_json::<Value>().expect("json body")
}

#[rstest]
fn index_describes_endpoints(client: Client) {
    let response = client.get("/api").dispatch();
    assert_eq!(response.status(), Status::Ok);
    let body = body_of(response);
    let endpoints = body["endpoints"].as_object().expect("endpoint map");
    assert!(endpoints.contains_key("GET /api/articles"));
    assert!(endpoints.contains_key("DELETE /api/articles/<article_id>"));
}

#[rstest]
#[case("/api/nowhere")]
#[case("/api/topics/cats/hello")]
#[case("/not-the-api")]
fn unknown_paths_are_not_found(client: Client, #[case] path: &str) {
    let response = client.get(path).dispatch();
    assert_eq!(response.status(), Status::NotFound);
    assert_eq!(body_of(response), json!({ "msg": "route not found" }));
}

#[rstest]
fn unserved_methods_are_not_allowed(client: Client) {
    let requests = vec![
        client.post("/api/articles"),
        client.put("/api/topics"),
        client.delete("/api/users"),
        client.patch("/api/users/butter_bridge"),
        client.put("/api/articles/1"),
        client.patch("/api/articles/1/comments"),
        client.get("/api/articles/1/comments/2"),
        client.delete("/api/topics/cats/articles"),
        client.post("/api"),
        client.options("/api/topics"),
        client.options("/api/articles/1/comments/2"),
    ];
    for request in requests {
        let response = request.dispatch();
        assert_eq!(response.status(), Status::MethodNotAllowed);
        assert_eq!(body_of(response), json!({ "msg": "method not allowed" }));
    }
}

#[rstest]
#[case("/api/articles?limit=ten", "invalid query type")]
#[case("/api/articles?p=second", "invalid query type")]
#[case("/api/articles?sort_by=not_a_real_column", "column does not exist in the table")]
#[case("/api/topics/cats/articles?limit=x", "invalid query type")]
#[case("/api/articles/1/comments?sort_by=comment_count", "column does not exist in the table")]
#[case("/api/articles/1/comments?p=x", "invalid query type")]
#[case("/api/articles/dog", "invalid input syntax for integer")]
#[case("/api/articles/dog/comments", "invalid input syntax for integer")]
fn bad_queries_are_rejected(client: Client, #[case] uri: &str, #[case] msg: &str) {
    let response = client.get(uri).dispatch();
    assert_eq!(response.status(), Status::BadRequest);
    assert_eq!(body_of(response), json!({ "msg": msg }));
}

#[rstest]
#[case("/api/topics", r#"{"slug": "", "description": "x"}"#)]
#[case("/api/topics", r#"{"slug": "   ", "description": "x"}"#)]
#[case("/api/topics", r#"{"description": "x"}"#)]
#[case("/api/topics", "not json")]
#[case("/api/users", r#"{"username": "lurker"}"#)]
#[case("/api/users", r#"{"username": "lurker", "name": "x", "avatar_url": 3}"#)]
#[case("/api/topics/cats/articles", r#"{"title": "t", "body": "b"}"#)]
#[case("/api/topics/cats/articles", r#"{"title": "t", "body": " ", "username": "u"}"#)]
#[case("/api/articles/1/comments", r#"{"username": 5, "body": "x"}"#)]
#[case("/api/articles/1/comments", r#"{"username": "icellusedkars"}"#)]
fn invalid_entries_are_rejected(client: Client, #[case] uri: &str, #[case] payload: &str) {
    let response = client
        .post(uri)
        .header(ContentType::JSON)
        .body(payload)
        .dispatch();
    assert_eq!(response.status(), Status::BadRequest);
    assert_eq!(body_of(response), json!({ "msg": "invalid data entry" }));
}

#[rstest]
#[case("/api/articles/1", r#"{"inc_votes": "cats"}"#)]
#[case("/api/articles/1", r#"{"inc_votes": ""}"#)]
#[case("/api/articles/1/comments/2", r#"{"inc_votes": [1]}"#)]
#[case("/api/articles/1/comments/2", r#"{"inc_votes": 0.5}"#)]
fn non_numeric_votes_are_rejected(client: Client, #[case] uri: &str, #[case] payload: &str) {
    let response = client
        .patch(uri)
        .header(ContentType::JSON)
        .body(payload)
        .dispatch();
    assert_eq!(response.status(), Status::BadRequest);
    assert_eq!(body_of(response), json!({ "msg": "invalid data input" }));
}

#[rstest]
fn valid_requests_reach_the_pool(client: Client) {
    let response = client.get("/api/articles?limit=5&sort_ascending=true2").dispatch();
    assert_eq!(response.status(), Status::ServiceUnavailable);
    assert_eq!(body_of(response), json!({ "msg": "database unavailable" }));
}

// A single async worker: the index must not queue behind a checkout that
// is still waiting out its timeout.
#[rocket::async_test]
async fn index_answers_while_a_checkout_waits() {
    let pool = unreachable_pool(Duration::from_millis(1500));
    let client = asynchronous::Client::tracked(newsdesk::rocket(pool))
        .await
        .expect("valid rocket instance");
    let started = Instant::now();

    let waiting = async {
        let response = client.get("/api/topics").dispatch().await;
        (response.status(), started.elapsed())
    };
    let index = async {
        let response = client.get("/api").dispatch().await;
        (response.status(), started.elapsed())
    };
    let ((waiting_status, waited), (index_status, answered)) = rocket::tokio::join!(waiting, index);

    assert_eq!(waiting_status, Status::ServiceUnavailable);
    assert_eq!(index_status, Status::Ok);
    assert!(answered < waited, "index took {:?}, checkout {:?}", answered, waited);
}

#[rocket::async_test]
async fn launch_failure_is_an_error() {
    let taken = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).expect("free port");
    let port = taken.local_addr().expect("bound address").port();
    let config = rocket::Config {
        address: Ipv4Addr::LOCALHOST.into(),
        port,
        ..rocket::Config::debug_default()
    };
    let rocket = newsdesk::rocket(unreachable_pool(Duration::from_millis(200))).configure(config);

    let error = newsdesk::serve(rocket).await.expect_err("port is taken");
    assert!(matches!(error.kind(), db::ErrorKind::Launch(_)));
}
