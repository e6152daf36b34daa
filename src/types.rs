use diesel::result::Error as DieselError;
use rocket::data::{self, Data, FromData, ToByteUnit};
use rocket::http::Status;
use rocket::outcome::Outcome;
use rocket::request::Request;
use rocket::response::{self, status, Responder};
use rocket::serde::json::Json;
use serde_json::{self, Map, Value};
use std::fmt;
use tracing::error;

use crate::db::failure;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InvalidQuery(&'static str),
    InvalidInput(&'static str),
    /// `None` renders an empty JSON object.
    NotFound(Option<&'static str>),
    Conflict(&'static str),
    MethodNotAllowed,
    Unavailable,
    Unhandled(String),
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

pub type Created<T> = Result<status::Custom<Json<T>>, ApiError>;

pub const INVALID_DATA_ENTRY: &str = "invalid data entry";
pub const INVALID_DATA_INPUT: &str = "invalid data input";

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::InvalidQuery(_) | ApiError::InvalidInput(_) => Status::BadRequest,
            ApiError::NotFound(_) => Status::NotFound,
            ApiError::Conflict(_) => Status::UnprocessableEntity,
            ApiError::MethodNotAllowed => Status::MethodNotAllowed,
            ApiError::Unavailable => Status::ServiceUnavailable,
            ApiError::Unhandled(_) => Status::InternalServerError,
        }
    }

    pub fn body(&self) -> Value {
        let msg = match self {
            ApiError::InvalidQuery(msg)
            | ApiError::InvalidInput(msg)
            | ApiError::Conflict(msg)
            | ApiError::NotFound(Some(msg)) => *msg,
            ApiError::NotFound(None) => return Value::Object(Map::new()),
            ApiError::MethodNotAllowed => "method not allowed",
            ApiError::Unavailable => "database unavailable",
            ApiError::Unhandled(_) => "internal server error",
        };
        json!({ "msg": msg })
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApiError::Unhandled(reason) => write!(f, "unhandled: {}", reason),
            other => write!(f, "{} {}", other.status().code, other.body()),
        }
    }
}

impl From<DieselError> for ApiError {
    fn from(err: DieselError) -> ApiError {
        failure::translate(err)
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        if let ApiError::Unhandled(ref reason) = self {
            error!(uri = %req.uri(), %reason, "request failed");
        }
        status::Custom(self.status(), Json(self.body())).respond_to(req)
    }
}

/// A path identifier that failed to parse reads like the engine's own
/// type-mismatch failure.
pub fn parse_id(raw: Result<i32, &str>) -> Result<i32, ApiError> {
    raw.map_err(|_| ApiError::InvalidQuery("invalid input syntax for integer"))
}

pub fn created<T>(value: T) -> status::Custom<Json<T>> {
    status::Custom(Status::Created, Json(value))
}

/// A JSON object request body. An empty body reads as `{}`.
#[derive(Debug, Default)]
pub struct Body(Map<String, Value>);

impl Body {
    pub fn parse(bytes: &[u8]) -> Result<Body, ApiError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Body::default());
        }
        match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(fields)) => Ok(Body(fields)),
            _ => Err(ApiError::InvalidInput(INVALID_DATA_ENTRY)),
        }
    }

    /// A required text field: present, a JSON string, and not blank.
    pub fn text(&self, key: &str) -> Result<String, ApiError> {
        match self.0.get(key) {
            Some(Value::String(value)) if !value.trim().is_empty() => Ok(value.clone()),
            _ => Err(ApiError::InvalidInput(INVALID_DATA_ENTRY)),
        }
    }

    /// An optional text field; when present it must be a string.
    pub fn optional_text(&self, key: &str) -> Result<Option<String>, ApiError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.clone())),
            Some(_) => Err(ApiError::InvalidInput(INVALID_DATA_ENTRY)),
        }
    }

    /// The signed vote delta; absent means zero.
    pub fn inc_votes(&self) -> Result<i32, ApiError> {
        match self.0.get("inc_votes") {
            None => Ok(0),
            Some(Value::Number(n)) => n
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .ok_or(ApiError::InvalidInput(INVALID_DATA_INPUT)),
            Some(_) => Err(ApiError::InvalidInput(INVALID_DATA_INPUT)),
        }
    }
}

#[rocket::async_trait]
impl<'r> FromData<'r> for Body {
    type Error = ApiError;

    async fn from_data(req: &'r Request<'_>, data: Data<'r>) -> data::Outcome<'r, Self> {
        let limit = req.limits().get("json").unwrap_or_else(|| 64.kibibytes());
        let bytes = match data.open(limit).into_bytes().await {
            Ok(bytes) if bytes.is_complete() => bytes.into_inner(),
            Ok(_) => {
                let e = ApiError::InvalidInput(INVALID_DATA_ENTRY);
                return Outcome::Error((Status::PayloadTooLarge, e));
            }
            Err(e) => {
                let e = ApiError::Unhandled(e.to_string());
                return Outcome::Error((Status::InternalServerError, e));
            }
        };
        match Body::parse(&bytes) {
            Ok(body) => Outcome::Success(body),
            Err(e) => Outcome::Error((e.status(), e)),
        }
    }
}
