//! Request extractors.
//!
//! [`CurrentUser`] resolves the caller from the `Authorization` header.
//! [`JsonBody`] and [`QueryParams`] report malformed input in the service's
//! error format.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;

use super::error::ApiErrorResponse;
use super::handlers::AppState;
use crate::domain::{AuthToken, UserId};

/// Schemes accepted in the `Authorization` header.
const AUTH_SCHEMES: [&str; 2] = ["Token", "Bearer"];

// =============================================================================
// CurrentUser
// =============================================================================

/// The authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: UserId,
}

/// Splits an `Authorization` header value into its token.
///
/// Returns `Ok(None)` for a scheme this service does not handle and `Err`
/// for a recognized scheme with a malformed credential.
fn parse_authorization(value: &str) -> Result<Option<AuthToken>, &'static str> {
    let mut parts = value.split_whitespace();
    let Some(scheme) = parts.next() else {
        return Ok(None);
    };
    if !AUTH_SCHEMES
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(scheme))
    {
        return Ok(None);
    }

    match (parts.next(), parts.next()) {
        (Some(key), None) => Ok(Some(AuthToken::from_string(key))),
        (None, _) => Err("Invalid token header. No credentials provided."),
        (Some(_), Some(_)) => Err("Invalid token header. Token string should not contain spaces."),
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiErrorResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Err(ApiErrorResponse::not_authenticated());
        };
        let header = header.to_str().map_err(|_| {
            ApiErrorResponse::authentication_failed(
                "Invalid token header. Token string should not contain invalid characters.",
            )
        })?;

        let token = match parse_authorization(header) {
            Ok(Some(token)) => token,
            Ok(None) => return Err(ApiErrorResponse::not_authenticated()),
            Err(message) => {
                tracing::warn!(reason = message, "Rejected malformed authorization header");
                return Err(ApiErrorResponse::authentication_failed(message));
            }
        };

        match state.tokens.resolve(token).await? {
            Some(user_id) => Ok(Self { user_id }),
            None => {
                tracing::warn!("Rejected unknown authentication token");
                Err(ApiErrorResponse::authentication_failed("Invalid token."))
            }
        }
    }
}

// =============================================================================
// JsonBody
// =============================================================================

/// JSON body extractor that rejects with `INVALID_JSON`.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiErrorResponse;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(request, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(&rejection)),
        }
    }
}

fn json_rejection(rejection: &JsonRejection) -> ApiErrorResponse {
    tracing::debug!(%rejection, "Rejected request body");
    ApiErrorResponse::invalid_json(rejection.body_text())
}

// =============================================================================
// QueryParams
// =============================================================================

/// Query string extractor that rejects with `INVALID_QUERY`.
#[derive(Debug, Clone)]
pub struct QueryParams<T>(pub T);

impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiErrorResponse;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(query_rejection(&rejection)),
        }
    }
}

fn query_rejection(rejection: &QueryRejection) -> ApiErrorResponse {
    tracing::debug!(%rejection, "Rejected query string");
    ApiErrorResponse::bad_request("INVALID_QUERY", rejection.body_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Token abc123", Some("abc123"))]
    #[case("Bearer abc123", Some("abc123"))]
    #[case("token abc123", Some("abc123"))]
    #[case("Basic dXNlcjpwYXNz", None)]
    #[case("", None)]
    fn test_parse_authorization(#[case] header: &str, #[case] expected: Option<&str>) {
        let token = parse_authorization(header).unwrap();
        assert_eq!(token.as_ref().map(AuthToken::as_str), expected);
    }

    #[rstest]
    #[case("Token")]
    #[case("Token abc def")]
    fn test_parse_authorization_malformed(#[case] header: &str) {
        assert!(parse_authorization(header).is_err());
    }

    fn parts(uri: &str) -> Parts {
        axum::http::Request::builder()
            .uri(uri)
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[rstest]
    #[tokio::test]
    async fn test_query_params_keeps_repeated_keys() {
        let QueryParams(pairs) = QueryParams::<Vec<(String, String)>>::from_request_parts(
            &mut parts("/todos?status=completed&status=pending"),
            &(),
        )
        .await
        .unwrap();

        assert_eq!(
            pairs,
            vec![
                ("status".to_string(), "completed".to_string()),
                ("status".to_string(), "pending".to_string()),
            ]
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_query_params_rejection_uses_error_body() {
        #[derive(Debug, serde::Deserialize)]
        struct Page {
            #[allow(dead_code)]
            page: u32,
        }

        let rejection = QueryParams::<Page>::from_request_parts(&mut parts("/todos?page=x"), &())
            .await
            .unwrap_err();

        assert_eq!(rejection.status, axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(rejection.error.code, "INVALID_QUERY");
    }
}
