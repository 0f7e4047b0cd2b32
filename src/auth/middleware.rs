//! Access guard for Axum

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use super::jwt::{TokenClaims, TokenService};

/// Exact, case-sensitive prefix of a bearer `Authorization` value
pub const BEARER_PREFIX: &str = "Bearer ";

/// Guard rejection. Every token failure collapses into this one kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Unauthorized")]
    Unauthorized,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// Identity forwarded to guarded handlers as a request extension
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub roles: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthenticatedUser {
    pub fn from_claims(claims: TokenClaims) -> Self {
        let expires_at = claims.expires_at();
        Self {
            user_id: claims.sub,
            roles: claims.roles,
            expires_at,
        }
    }
}

/// Pull the token out of an `Authorization` header value.
///
/// Anything other than `Bearer ` followed by at least one character yields no token.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix(BEARER_PREFIX)
        .filter(|token| !token.is_empty())
}

/// Stateless gate in front of protected routes.
#[derive(Clone)]
pub struct AccessGuard {
    tokens: TokenService,
}

impl AccessGuard {
    pub fn new(tokens: TokenService) -> Self {
        Self { tokens }
    }

    pub fn authorize(&self, headers: &HeaderMap) -> Result<TokenClaims, AuthError> {
        let Some(token) = headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(extract_bearer_token)
        else {
            debug!("Rejected request without bearer token");
            return Err(AuthError::Unauthorized);
        };

        self.tokens.validate(token).map_err(|e| {
            debug!(reason = %e, "Rejected bearer token");
            AuthError::Unauthorized
        })
    }
}

/// Bearer-token middleware. Does no role check; handlers see the claims.
pub async fn auth_middleware(
    State(guard): State<AccessGuard>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match guard.authorize(request.headers()) {
        Ok(claims) => {
            request
                .extensions_mut()
                .insert(AuthenticatedUser::from_claims(claims));
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::JwtConfig;
    use axum::{middleware, routing::get, Extension, Router};
    use chrono::Duration;
    use tower::Service;

    fn tokens(secret: &str) -> TokenService {
        TokenService::new(&JwtConfig::new(secret, 600))
    }

    async fn whoami(Extension(user): Extension<AuthenticatedUser>) -> String {
        format!("{}:{}", user.user_id, user.roles.join(","))
    }

    fn app() -> Router {
        let guard = AccessGuard::new(tokens("guard-secret"));
        Router::new()
            .route("/protected", get(whoami))
            .layer(middleware::from_fn_with_state(guard, auth_middleware))
    }

    async fn send(auth: Option<&str>) -> (StatusCode, String) {
        let mut builder = Request::builder().uri("/protected");
        if let Some(value) = auth {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let req = builder.body(Body::empty()).unwrap();

        let mut svc = app().into_service();
        let resp = svc.call(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn bearer_prefix_is_exact() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token(""), None);
        assert_eq!(extract_bearer_token("bearer abc"), None);
        assert_eq!(extract_bearer_token("Bearer  abc"), Some(" abc"));
        assert_eq!(extract_bearer_token("Token abc"), None);
        assert_eq!(extract_bearer_token("abc"), None);
    }

    #[test]
    fn authorize_returns_claims() {
        let tokens = tokens("guard-secret");
        let token = tokens.issue("u1", ["admin"], 600).unwrap();
        let guard = AccessGuard::new(tokens);

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            format!("Bearer {}", token).parse().unwrap(),
        );

        let claims = guard.authorize(&headers).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.roles, vec!["admin"]);
    }

    #[test]
    fn authenticated_user_carries_token_expiry() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let tokens = tokens("guard-secret");
        let token = tokens.issue_at("u1", ["admin"], 600, now).unwrap();
        let claims = tokens.validate_at(&token, now).unwrap();

        let user = AuthenticatedUser::from_claims(claims);
        assert_eq!(user.user_id, "u1");
        assert_eq!(user.expires_at, Some(now + Duration::seconds(600)));
    }

    #[tokio::test]
    async fn valid_token_reaches_handler_with_claims() {
        let token = tokens("guard-secret")
            .issue("u1", ["admin", "member"], 600)
            .unwrap();

        let (status, body) = send(Some(&format!("Bearer {}", token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "u1:admin,member");
    }

    #[tokio::test]
    async fn any_valid_token_passes_regardless_of_role() {
        let token = tokens("guard-secret").issue("u2", ["member"], 600).unwrap();

        let (status, _) = send(Some(&format!("Bearer {}", token))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn every_failure_looks_the_same() {
        let expired = tokens("guard-secret")
            .issue_at(
                "u1",
                ["admin"],
                600,
                Utc::now() - Duration::seconds(601),
            )
            .unwrap();
        let foreign = tokens("other-secret").issue("u1", ["admin"], 600).unwrap();

        let cases = vec![
            None,
            Some(String::new()),
            Some("Bearer ".to_string()),
            Some("Bearer not-a-token".to_string()),
            Some(format!("bearer {}", foreign)),
            Some(format!("Bearer {}", expired)),
            Some(format!("Bearer {}", foreign)),
        ];

        for case in cases {
            let (status, body) = send(case.as_deref()).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "case {:?}", case);
            assert_eq!(body, r#"{"error":"Unauthorized"}"#, "case {:?}", case);
        }
    }
}
