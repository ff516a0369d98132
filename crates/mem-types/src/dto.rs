//! Request and response DTOs for the Memory Management API.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Largest accepted `content`, in bytes.
pub const MAX_CONTENT_BYTES: usize = 100_000;

/// Accepted range for `metadata.importance`.
pub const IMPORTANCE_RANGE: std::ops::RangeInclusive<u8> = 1..=10;

/// Kind of content a memory carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Text,
    Json,
    Markdown,
    Image,
    Audio,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Json => "json",
            ContentType::Markdown => "markdown",
            ContentType::Image => "image",
            ContentType::Audio => "audio",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(ContentType::Text),
            "json" => Ok(ContentType::Json),
            "markdown" => Ok(ContentType::Markdown),
            "image" => Ok(ContentType::Image),
            "audio" => Ok(ContentType::Audio),
            other => Err(format!("unknown content type: {}", other)),
        }
    }
}

/// Metadata attached to a memory. Unknown keys are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryMetadata {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Create-memory request (POST /memory).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateMemoryRequest {
    pub user_id: String,
    pub persona_id: String,
    pub content: String,
    #[serde(default)]
    pub content_type: ContentType,
    #[serde(default)]
    pub metadata: MemoryMetadata,
}

impl CreateMemoryRequest {
    /// Check field-level rules. Returns the first violation found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.user_id.trim().is_empty() {
            return Err(ValidationError::EmptyField("user_id"));
        }
        if self.persona_id.trim().is_empty() {
            return Err(ValidationError::EmptyField("persona_id"));
        }
        if self.content.trim().is_empty() {
            return Err(ValidationError::EmptyField("content"));
        }
        if self.content.len() > MAX_CONTENT_BYTES {
            return Err(ValidationError::ContentTooLarge(self.content.len()));
        }
        if let Some(importance) = self.metadata.importance {
            if !IMPORTANCE_RANGE.contains(&importance) {
                return Err(ValidationError::ImportanceOutOfRange(importance));
            }
        }
        Ok(())
    }

    /// The fixed record the deployment checker submits.
    pub fn deployment_probe() -> Self {
        Self {
            user_id: "test_user_123".to_string(),
            persona_id: "test_persona_456".to_string(),
            content: "This is a test memory for deployment verification".to_string(),
            content_type: ContentType::Text,
            metadata: MemoryMetadata {
                tags: vec!["test".to_string(), "deployment".to_string()],
                importance: Some(5),
                topic: Some("deployment_test".to_string()),
                extra: HashMap::new(),
            },
        }
    }
}

/// Stored memory as returned by GET /memory/{id}.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub memory_id: String,
    pub user_id: String,
    pub persona_id: String,
    pub content: String,
    pub content_type: ContentType,
    #[serde(default)]
    pub metadata: MemoryMetadata,
    /// RFC 3339, UTC.
    pub created_at: String,
    pub updated_at: String,
}

impl MemoryRecord {
    /// Build a new record from a validated request.
    pub fn from_request(memory_id: String, req: CreateMemoryRequest, now: String) -> Self {
        Self {
            memory_id,
            user_id: req.user_id,
            persona_id: req.persona_id,
            content: req.content,
            content_type: req.content_type,
            metadata: req.metadata,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Response body of a successful create (201).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMemoryResponse {
    pub memory_id: String,
    pub status: String,
    pub created_at: String,
}

/// Filter and pagination for listing a user's memories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryListQuery {
    pub user_id: String,
    pub persona_id: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

/// Response body of GET /memory/user/{user_id}.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryListResponse {
    pub memories: Vec<MemoryRecord>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// Response body of GET /memory/health.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: String,
    pub memory_count: usize,
}

/// Body of every JSON error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl ErrorResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    #[error("content is {0} bytes; the limit is 100000")]
    ContentTooLarge(usize),
    #[error("importance must be between 1 and 10, got {0}")]
    ImportanceOutOfRange(u8),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn probe_payload_matches_wire_shape() {
        let v = serde_json::to_value(CreateMemoryRequest::deployment_probe()).unwrap();
        assert_eq!(
            v,
            json!({
                "user_id": "test_user_123",
                "persona_id": "test_persona_456",
                "content": "This is a test memory for deployment verification",
                "content_type": "text",
                "metadata": {
                    "tags": ["test", "deployment"],
                    "importance": 5,
                    "topic": "deployment_test"
                }
            })
        );
    }

    #[test]
    fn defaults_and_extra_metadata() {
        let req: CreateMemoryRequest = serde_json::from_value(json!({
            "user_id": "u1",
            "persona_id": "p1",
            "content": "hello",
            "metadata": { "source": "chat", "tags": ["a"] }
        }))
        .unwrap();
        assert_eq!(req.content_type, ContentType::Text);
        assert_eq!(req.metadata.tags, vec!["a".to_string()]);
        assert_eq!(req.metadata.extra["source"], "chat");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_fields_and_bad_importance() {
        let mut req = CreateMemoryRequest::deployment_probe();
        req.persona_id = "  ".to_string();
        assert_eq!(req.validate(), Err(ValidationError::EmptyField("persona_id")));

        let mut req = CreateMemoryRequest::deployment_probe();
        req.metadata.importance = Some(11);
        assert_eq!(
            req.validate(),
            Err(ValidationError::ImportanceOutOfRange(11))
        );

        let mut req = CreateMemoryRequest::deployment_probe();
        req.content = "x".repeat(MAX_CONTENT_BYTES + 1);
        assert!(matches!(
            req.validate(),
            Err(ValidationError::ContentTooLarge(_))
        ));
    }

    #[test]
    fn unknown_content_type_is_rejected() {
        let res: Result<CreateMemoryRequest, _> = serde_json::from_value(json!({
            "user_id": "u1",
            "persona_id": "p1",
            "content": "hello",
            "content_type": "video"
        }));
        assert!(res.is_err());
        assert_eq!("markdown".parse::<ContentType>(), Ok(ContentType::Markdown));
    }
}
