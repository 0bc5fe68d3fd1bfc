use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::http::header::HeaderMap;
use actix_web::{FromRequest, HttpRequest};
use uuid::Uuid;

use crate::domain::order::Actor;
use crate::errors::AppError;

/// Set by the authenticating gateway in front of this service.
pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_NAME_HEADER: &str = "X-User-Name";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, AppError> {
    let value = headers
        .get(name)
        .ok_or_else(|| AppError::Unauthorized(format!("missing {} header", name)))?;
    let value = value
        .to_str()
        .map_err(|_| AppError::Unauthorized(format!("{} header is not valid text", name)))?
        .trim();
    if value.is_empty() {
        return Err(AppError::Unauthorized(format!("{} header is empty", name)));
    }
    Ok(value)
}

pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, AppError> {
    let id = header(headers, USER_ID_HEADER)?;
    let id = Uuid::parse_str(id)
        .map_err(|_| AppError::Unauthorized(format!("{} is not a valid UUID", USER_ID_HEADER)))?;
    let name = header(headers, USER_NAME_HEADER)?.to_string();
    Ok(Actor { id, name })
}

impl FromRequest for Actor {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(actor_from_headers(req.headers()))
    }
}
