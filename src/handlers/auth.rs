use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, StatusCode},
    response::Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

use crate::models::MemberRequest;
use crate::services::MemberService;

/// Credentials presented in an HTTP Basic Authorization header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub email: String,
    pub password: String,
}

/// Extractor that authenticates the caller from Basic credentials.
///
/// The wrapped request carries the RESOLVED member id together with the
/// presented credentials, so downstream service calls never have to trust a
/// client-claimed id.
pub struct AuthenticatedMember(pub MemberRequest);

/// Parse an `Authorization: Basic base64(email:password)` header value
pub fn parse_basic_credentials(header_value: &str) -> Option<BasicCredentials> {
    let encoded = header_value.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (email, password) = decoded.split_once(':')?;

    Some(BasicCredentials {
        email: email.to_string(),
        password: password.to_string(),
    })
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedMember
where
    Arc<MemberService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<Value>);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| unauthorized("Missing Authorization header"))?;

        let credentials = parse_basic_credentials(header_value)
            .ok_or_else(|| unauthorized("Malformed Basic Authorization header"))?;

        let member_service = Arc::<MemberService>::from_ref(state);

        match member_service
            .find_by_email_and_password(&credentials.email, &credentials.password)
            .await
        {
            Ok(member) => {
                let member_id = member.id.ok_or_else(|| {
                    warn!("Authenticated member has no id");
                    internal_error("Authenticated member has no id")
                })?;

                Ok(AuthenticatedMember(MemberRequest::new(
                    member_id,
                    credentials.email,
                    credentials.password,
                )))
            }
            Err(err) if err.is_not_found() => {
                warn!("Credential match failed for {}", credentials.email);
                Err(unauthorized("Invalid credentials"))
            }
            Err(err) => {
                warn!("Authentication lookup failed: {}", err);
                Err(internal_error("Authentication lookup failed"))
            }
        }
    }
}

fn unauthorized(message: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": message,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}

fn internal_error(message: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": message,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}
