//! Request-context extraction from the identity headers set by the
//! upstream auth layer.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Json, Response},
};
use shared::{ErrorResponse, Role};

use crate::domain::context::RequestContext;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

fn unauthenticated(message: String) -> Response {
    let body = ErrorResponse {
        code: "unauthenticated".to_string(),
        message,
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor_id = header(parts, ACTOR_ID_HEADER)
            .ok_or_else(|| unauthenticated(format!("Missing {} header", ACTOR_ID_HEADER)))?;
        let role = header(parts, ACTOR_ROLE_HEADER)
            .ok_or_else(|| unauthenticated(format!("Missing {} header", ACTOR_ROLE_HEADER)))?
            .parse::<Role>()
            .map_err(unauthenticated)?;

        Ok(RequestContext {
            actor_id: actor_id.to_string(),
            role,
        })
    }
}
