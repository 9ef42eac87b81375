//! Extractors that validate a request before the handler body runs.
//!
//! `ValidatedJson<T>` / `ValidatedQuery<T>` deserialize like `web::Json` /
//! `web::Query` and then apply the `Validate` rules of `T`. Both deserialize
//! and rule failures become a `400` with a [`ValidationFailure`] body, so a
//! handler only ever sees a payload that passed every rule.

use crate::error::ApiError;
use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use common::validation::{check, ValidationFailure, BODY_FIELD};
use futures_util::future::LocalBoxFuture;
use serde::de::DeserializeOwned;
use std::future::{ready, Ready};
use std::ops::Deref;
use validator::Validate;

/// Field reported when the query string cannot be deserialized.
const QUERY_FIELD: &str = "query";

pub struct ValidatedJson<T>(pub T);

impl<T> ValidatedJson<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> FromRequest for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
{
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let json = web::Json::<T>::from_request(req, payload);
        Box::pin(async move {
            let value = json
                .await
                .map_err(|e| ValidationFailure::single(BODY_FIELD, e.to_string()))?
                .into_inner();
            check(&value)?;
            Ok(ValidatedJson(value))
        })
    }
}

pub struct ValidatedQuery<T>(pub T);

impl<T> ValidatedQuery<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for ValidatedQuery<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> FromRequest for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
{
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = web::Query::<T>::from_query(req.query_string())
            .map_err(|e| ApiError::from(ValidationFailure::single(QUERY_FIELD, e.to_string())))
            .and_then(|q| {
                let value = q.into_inner();
                check(&value)?;
                Ok(ValidatedQuery(value))
            });
        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use common::model::pagination::Pagination;

    #[actix_web::test]
    async fn query_defaults_and_bounds() {
        let (req, mut pl) = TestRequest::get().uri("/x").to_http_parts();
        let q = ValidatedQuery::<Pagination>::from_request(&req, &mut pl).await.ok().unwrap();
        assert_eq!((q.page, q.limit), (1, 25));

        let (req, mut pl) = TestRequest::get().uri("/x?limit=150").to_http_parts();
        match ValidatedQuery::<Pagination>::from_request(&req, &mut pl).await {
            Err(ApiError::Validation(f)) => assert!(f.has_field("limit")),
            _ => panic!("limit=150 must be rejected"),
        }
    }

    #[actix_web::test]
    async fn malformed_query_reports_query_field() {
        let (req, mut pl) = TestRequest::get().uri("/x?page=abc").to_http_parts();
        match ValidatedQuery::<Pagination>::from_request(&req, &mut pl).await {
            Err(ApiError::Validation(f)) => assert!(f.has_field("query")),
            _ => panic!("page=abc must be rejected"),
        }
    }
}
