//! Request middleware and the session extractor

use axum::{
    async_trait,
    body::Body,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use cookie::{time::Duration, Cookie, SameSite};
use greenleaf_core::{PublicUser, Role};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "token";

/// Security headers middleware
pub async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(
            "default-src 'self'; img-src 'self' https://i.imgur.com https://i.ibb.co data:",
        ),
    );

    response
}

/// Session credential carried by a request: the `token` cookie, or else an
/// `Authorization: Bearer` header
pub fn session_credential(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == SESSION_COOKIE && !c.value().is_empty())
        .map(|c| c.value().to_string());

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")
            .map(|t| t.trim().to_string())
    })
}

/// `Set-Cookie` value carrying a fresh session
pub fn session_cookie(token: &str, max_age_seconds: u64, secure: bool) -> HeaderValue {
    let cookie = Cookie::build((SESSION_COOKIE, token.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(Duration::seconds(max_age_seconds as i64))
        .build();
    // Token and attributes are plain ASCII
    HeaderValue::from_str(&cookie.to_string()).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// `Set-Cookie` value that removes the session
pub fn clear_session_cookie(secure: bool) -> HeaderValue {
    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(Duration::ZERO)
        .build();
    HeaderValue::from_str(&cookie.to_string()).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// The authenticated caller
#[derive(Debug, Clone)]
pub struct CurrentUser(pub PublicUser);

impl CurrentUser {
    /// Fail with 403 unless the caller holds one of `allowed`
    pub fn require_role(&self, state: &AppState, allowed: &[Role]) -> ApiResult<()> {
        state.gate.authorize(&self.0, allowed).map_err(ApiError::from)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let credential = session_credential(&parts.headers);
        let user = state.gate.authenticate(credential.as_deref()).await?;
        Ok(CurrentUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_takes_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; token=from-cookie"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(session_credential(&headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn test_bearer_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(session_credential(&headers).as_deref(), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        assert_eq!(session_credential(&headers), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let value = session_cookie("abc", 604800, true);
        let text = value.to_str().unwrap();
        assert!(text.starts_with("token=abc"));
        assert!(text.contains("HttpOnly"));
        assert!(text.contains("Secure"));
        assert!(text.contains("SameSite=Strict"));
        assert!(text.contains("Path=/"));
        assert!(text.contains("Max-Age=604800"));

        let cleared = clear_session_cookie(false);
        assert!(cleared.to_str().unwrap().contains("Max-Age=0"));
    }
}
