use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::{validate_jwt, Claims};
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated actor extracted from the verified bearer token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            name: claims.name,
            email: claims.email,
            image: claims.picture,
        }
    }
}

/// Bearer-token middleware guarding every mutating route. Any failure yields
/// a uniform 401 with no detail about which check tripped.
pub async fn require_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token =
        extract_bearer_token(&headers).ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;

    let claims = validate_jwt(&token, &state.config.security.jwt_secret).map_err(|e| {
        tracing::debug!("Token validation failed: {}", e);
        ApiError::unauthorized("Unauthorized")
    })?;

    request.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_str = headers.get("authorization")?.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();

    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(
            extract_bearer_token(&headers_with("Bearer abc.def.ghi")),
            Some("abc.def.ghi".to_string())
        );
    }

    #[test]
    fn rejects_missing_header() {
        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn rejects_non_bearer_scheme() {
        assert_eq!(extract_bearer_token(&headers_with("Basic dXNlcg==")), None);
    }

    #[test]
    fn rejects_empty_token() {
        assert_eq!(extract_bearer_token(&headers_with("Bearer   ")), None);
    }
}
