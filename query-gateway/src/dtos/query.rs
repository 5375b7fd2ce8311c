use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Maximum query length in characters.
pub const MAX_QUERY_CHARS: u64 = 1000;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct QueryRequest {
    /// The user's question.
    #[validate(length(min = 1, max = MAX_QUERY_CHARS, message = "query must be 1 to 1000 characters"))]
    #[schema(example = "What are the transaction fees for domestic transfers?", min_length = 1, max_length = 1000)]
    pub query: String,

    /// Session to continue; a new one is created when absent or unknown.
    #[serde(default)]
    pub session_id: Option<String>,

    /// Caller-side user identifier, stored as-is.
    #[serde(default)]
    pub user_id: Option<String>,

    /// Free-form metadata, accepted and ignored.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QueryResponse {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub query_id: String,
    #[schema(example = "6f1c2d9e-8a4b-4c1e-9d2f-3b5a7c9e1f20")]
    pub session_id: String,
    pub query: String,
    pub response: String,
    /// Always null.
    pub confidence: Option<f64>,
    /// Always null.
    pub source_documents: Option<Vec<String>>,
    /// ISO-8601 time the answer was recorded.
    pub timestamp: DateTime<Utc>,
    pub processing_time_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(query: &str) -> QueryRequest {
        QueryRequest {
            query: query.to_string(),
            session_id: None,
            user_id: None,
            metadata: None,
        }
    }

    #[test]
    fn query_length_bounds() {
        assert!(request("").validate().is_err());
        assert!(request("a").validate().is_ok());
        assert!(request(&"a".repeat(MAX_QUERY_CHARS as usize)).validate().is_ok());
        assert!(request(&"a".repeat(MAX_QUERY_CHARS as usize + 1)).validate().is_err());
    }

    #[test]
    fn length_is_counted_in_characters() {
        // 1000 two-byte characters are still within bounds
        assert!(request(&"ж".repeat(1000)).validate().is_ok());
    }

    #[test]
    fn optional_fields_default_to_none() {
        let req: QueryRequest = serde_json::from_str(r#"{"query":"fees?"}"#).unwrap();
        assert!(req.session_id.is_none());
        assert!(req.metadata.is_none());

        let req: QueryRequest =
            serde_json::from_str(r#"{"query":"fees?","metadata":{"lang":"en","n":1}}"#).unwrap();
        assert_eq!(req.metadata.unwrap()["lang"], "en");
    }

    #[test]
    fn response_serializes_null_extension_fields() {
        let response = QueryResponse {
            query_id: "q".into(),
            session_id: "s".into(),
            query: "fees?".into(),
            response: "1%".into(),
            confidence: None,
            source_documents: None,
            timestamp: Utc::now(),
            processing_time_ms: 1.5,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json["confidence"].is_null());
        assert!(json["source_documents"].is_null());
        assert!(json.as_object().unwrap().contains_key("confidence"));
        assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));
    }
}
