use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use service_core::error::AppError;
use validator::Validate;

/// JSON body extractor that runs `validator` rules.
///
/// Malformed bodies and rule failures are both rejected with 400.
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| {
            AppError::BadRequest(anyhow::anyhow!("Invalid request body: {}", e.body_text()))
        })?;

        value.validate()?;

        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtos::QueryRequest;
    use axum::body::Body;
    use axum::http::header::CONTENT_TYPE;

    async fn extract(body: &str) -> Result<ValidatedJson<QueryRequest>, AppError> {
        let req = Request::builder()
            .method("POST")
            .uri("/api/v1/query")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        ValidatedJson::<QueryRequest>::from_request(req, &()).await
    }

    #[tokio::test]
    async fn accepts_valid_body() {
        let ValidatedJson(req) = extract(r#"{"query":"fees?"}"#).await.unwrap();
        assert_eq!(req.query, "fees?");
    }

    #[tokio::test]
    async fn missing_query_is_bad_request() {
        let err = extract(r#"{"session_id":"abc"}"#).await.err().unwrap();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_query_is_bad_request() {
        let err = extract(r#"{"query":""}"#).await.err().unwrap();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let err = extract("{not json").await.err().unwrap();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
