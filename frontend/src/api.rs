//! JSON calls to the `/api` endpoints over `gloo_net`.
//!
//! Every helper turns a non-2xx answer into an [`ApiFailure`] so pages can
//! tell an expired session (`401`), a rejected payload (`400` with field
//! errors) and any other server error apart.

use common::validation::ValidationFailure;
use gloo_net::http::{Request, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ApiFailure {
    /// The request never got an answer, or the answer could not be decoded.
    Network(String),
    Unauthorized,
    Rejected(ValidationFailure),
    Status { status: u16, message: String },
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiFailure::Network(e) => write!(f, "could not reach the server ({})", e),
            ApiFailure::Unauthorized => write!(f, "your session has expired"),
            ApiFailure::Rejected(failure) => write!(f, "{}", failure),
            ApiFailure::Status { status, message } => write!(f, "{} ({})", message, status),
        }
    }
}

impl From<gloo_net::Error> for ApiFailure {
    fn from(err: gloo_net::Error) -> Self {
        ApiFailure::Network(err.to_string())
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Classifies an error answer from its status and raw body.
pub fn failure_from(status: u16, body: &str) -> ApiFailure {
    if status == 401 {
        return ApiFailure::Unauthorized;
    }
    if status == 400 {
        if let Ok(failure) = serde_json::from_str::<ValidationFailure>(body) {
            return ApiFailure::Rejected(failure);
        }
    }
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| {
            if body.trim().is_empty() {
                "request failed".to_string()
            } else {
                body.trim().to_string()
            }
        });
    ApiFailure::Status { status, message }
}

/// Passes 2xx answers through, decodes the error body of anything else.
pub async fn ensure_ok(resp: Response) -> Result<Response, ApiFailure> {
    if resp.ok() {
        return Ok(resp);
    }
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    Err(failure_from(status, &body))
}

pub async fn get_json<T: DeserializeOwned>(url: &str) -> Result<T, ApiFailure> {
    let resp = Request::get(url).send().await?;
    Ok(ensure_ok(resp).await?.json::<T>().await?)
}

/// POSTs `body` as JSON and returns the raw successful response.
pub async fn post(url: &str, body: &impl Serialize) -> Result<Response, ApiFailure> {
    let resp = Request::post(url).json(body)?.send().await?;
    ensure_ok(resp).await
}

pub async fn post_json<B: Serialize, T: DeserializeOwned>(url: &str, body: &B) -> Result<T, ApiFailure> {
    Ok(post(url, body).await?.json::<T>().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_error_bodies() {
        assert_eq!(failure_from(401, ""), ApiFailure::Unauthorized);

        let body = r#"{"error":"validation","fields":[{"field":"file","message":"missing column name"}]}"#;
        match failure_from(400, body) {
            ApiFailure::Rejected(failure) => assert!(failure.has_field("file")),
            other => panic!("unexpected {:?}", other),
        }

        assert_eq!(
            failure_from(400, r#"{"error":"bad_request","message":"malformed input"}"#),
            ApiFailure::Status {
                status: 400,
                message: "malformed input".into()
            }
        );
        assert_eq!(
            failure_from(502, "  "),
            ApiFailure::Status {
                status: 502,
                message: "request failed".into()
            }
        );
    }
}
