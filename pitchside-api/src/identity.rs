use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use pitchside_core::identity::{Actor, Role};

/// Caller identity as asserted by the upstream gateway in `x-actor-*`
/// headers. Missing or malformed headers fall back to an anonymous
/// user; authorization decisions belong to the engine, not this
/// extractor.
pub struct CallerIdentity(pub Actor);

impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default()
                .to_string()
        };

        let role = header("x-actor-role").parse().unwrap_or(Role::User);
        Ok(Self(Actor {
            id: header("x-actor-id"),
            name: header("x-actor-name"),
            email: header("x-actor-email"),
            role,
        }))
    }
}
