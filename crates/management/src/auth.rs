//! Caller identity.
//!
//! Authentication happens upstream; the gateway forwards the signed-in user's
//! id in the `x-user-id` header and every handler scopes its data to it.

use crate::handlers::ApiError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use reseller_core::ResellerError;
use uuid::Uuid;

pub const USER_HEADER: &str = "x-user-id";

/// The owner every row touched by a request must belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner(pub Uuid);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Owner
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_HEADER)
            .ok_or_else(|| ResellerError::Unauthorized(format!("missing {USER_HEADER} header")))?;
        let id = value
            .to_str()
            .ok()
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .ok_or_else(|| ResellerError::Unauthorized(format!("malformed {USER_HEADER} header")))?;
        Ok(Owner(id))
    }
}
