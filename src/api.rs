//! The endpoint table. It backs both `GET /api` and the 405 answers for
//! methods a known path does not serve.

use rocket::http::Method;
use rocket::route::{Handler, Outcome, Route};
use rocket::serde::json::Json;
use rocket::{get, Data, Request};
use serde_json::{Map, Value};

use crate::types::ApiError;

pub struct Endpoint {
    pub path: &'static str,
    pub methods: &'static [(Method, &'static str)],
}

pub const ENDPOINTS: &[Endpoint] = &[
    Endpoint {
        path: "/",
        methods: &[(Method::Get, "describes every endpoint")],
    },
    Endpoint {
        path: "/topics",
        methods: &[
            (Method::Get, "lists all topics"),
            (Method::Post, "adds a topic from {slug, description}"),
        ],
    },
    Endpoint {
        path: "/topics/<slug>/articles",
        methods: &[
            (
                Method::Get,
                "lists a topic's articles; accepts limit, sort_by, p, sort_ascending",
            ),
            (Method::Post, "adds an article to the topic from {title, body, username}"),
        ],
    },
    Endpoint {
        path: "/articles",
        methods: &[(
            Method::Get,
            "lists articles with comment counts; accepts limit, sort_by, p, sort_ascending",
        )],
    },
    Endpoint {
        path: "/articles/<article_id>",
        methods: &[
            (Method::Get, "serves one article with its body"),
            (Method::Patch, "adds {inc_votes} to the article's votes"),
            (Method::Delete, "deletes the article and its comments"),
        ],
    },
    Endpoint {
        path: "/articles/<article_id>/comments",
        methods: &[
            (
                Method::Get,
                "lists an article's comments; accepts limit, sort_by, p, sort_ascending",
            ),
            (Method::Post, "adds a comment from {username, body}"),
        ],
    },
    Endpoint {
        path: "/articles/<article_id>/comments/<comment_id>",
        methods: &[
            (Method::Patch, "adds {inc_votes} to the comment's votes"),
            (Method::Delete, "deletes the comment"),
        ],
    },
    Endpoint {
        path: "/users",
        methods: &[
            (Method::Get, "lists all users"),
            (Method::Post, "adds a user from {username, name, avatar_url}"),
        ],
    },
    Endpoint {
        path: "/users/<username>",
        methods: &[(Method::Get, "serves one user")],
    },
];

const ROUTABLE: &[Method] = &[
    Method::Get,
    Method::Post,
    Method::Put,
    Method::Patch,
    Method::Delete,
    Method::Options,
];

impl Endpoint {
    fn serves(&self, method: Method) -> bool {
        self.methods.iter().any(|(served, _)| *served == method)
    }
}

#[derive(Clone)]
struct MethodNotAllowed;

#[rocket::async_trait]
impl Handler for MethodNotAllowed {
    async fn handle<'r>(&self, req: &'r Request<'_>, _data: Data<'r>) -> Outcome<'r> {
        Outcome::from(req, ApiError::MethodNotAllowed)
    }
}

/// One route per (known path, unserved method) pair.
pub fn method_not_allowed() -> Vec<Route> {
    ENDPOINTS
        .iter()
        .flat_map(|endpoint| {
            ROUTABLE
                .iter()
                .filter(move |method| !endpoint.serves(**method))
                .map(move |method| Route::new(*method, endpoint.path, MethodNotAllowed))
        })
        .collect()
}

/// `"GET /api/articles/<article_id>" -> description` for every endpoint.
pub fn describe(base: &str) -> Map<String, Value> {
    let base = base.trim_end_matches('/');
    let mut endpoints = Map::new();
    for endpoint in ENDPOINTS {
        let path = match endpoint.path {
            "/" => base.to_owned(),
            path => format!("{}{}", base, path),
        };
        for (method, description) in endpoint.methods {
            endpoints.insert(
                format!("{} {}", method.as_str(), path),
                Value::from(*description),
            );
        }
    }
    endpoints
}

#[get("/")]
pub fn index() -> Json<Value> {
    Json(json!({ "endpoints": describe(crate::API_BASE) }))
}
