//! Wire-format data model for feedback submission and review.

use serde::{Deserialize, Serialize};

use crate::transform::types::AnalysisResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Satisfied,
    NeedsImprovement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackType {
    Tone,
    Accuracy,
    Naturalness,
    Length,
    Other,
}

/// Snapshot of the settings the rated transform ran with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSettings {
    pub purpose: String,
    pub intent: String,
    pub politeness: u8,
    pub smart_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_result: Option<AnalysisResult>,
}

pub const MAX_COMMENT_CHARS: usize = 500;

/// Client submission. The server stamps id/timestamp/requester metadata on
/// write; a client-sent timestamp is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub session_id: String,
    pub original_text: String,
    pub transformed_text: String,
    pub transform_settings: FeedbackSettings,
    pub rating: Rating,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_type: Option<FeedbackType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl FeedbackRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.session_id.trim().is_empty()
            || self.original_text.trim().is_empty()
            || self.transformed_text.trim().is_empty()
        {
            return Err("잘못된 피드백 요청입니다.".to_string());
        }
        if let Some(comment) = &self.comment {
            if comment.chars().count() > MAX_COMMENT_CHARS {
                return Err("잘못된 피드백 요청입니다.".to_string());
            }
        }
        Ok(())
    }
}

/// One line of the append-only log: the submission plus server stamps.
/// Created once, never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    #[serde(flatten)]
    pub submission: FeedbackRequest,
    pub feedback_id: String,
    /// ISO-8601, assigned at write time.
    pub timestamp: String,
    pub user_agent: String,
    pub ip: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeedbackStats {
    pub satisfied: usize,
    pub needs_improvement: usize,
}

/// Admin listing: recent records plus whole-log statistics.
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackListing {
    pub feedbacks: Vec<FeedbackRecord>,
    pub total: usize,
    pub stats: FeedbackStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission() -> FeedbackRequest {
        serde_json::from_value(serde_json::json!({
            "sessionId": "sess-1",
            "originalText": "왜 이렇게 늦게 주시는 거예요?!",
            "transformedText": "전달 일정 확인 부탁드립니다.",
            "transformSettings": {
                "purpose": "email",
                "intent": "request",
                "politeness": 2,
                "smartMode": true
            },
            "rating": "satisfied"
        }))
        .unwrap()
    }

    #[test]
    fn test_rating_wire_names() {
        assert_eq!(
            serde_json::to_string(&Rating::NeedsImprovement).unwrap(),
            "\"needs_improvement\""
        );
        let r: Rating = serde_json::from_str("\"satisfied\"").unwrap();
        assert_eq!(r, Rating::Satisfied);
    }

    #[test]
    fn test_submission_validates() {
        assert!(submission().validate().is_ok());

        let mut bad = submission();
        bad.session_id = "  ".to_string();
        assert!(bad.validate().is_err());

        let mut long_comment = submission();
        long_comment.comment = Some("아".repeat(MAX_COMMENT_CHARS + 1));
        assert!(long_comment.validate().is_err());

        let mut ok_comment = submission();
        ok_comment.comment = Some("아".repeat(MAX_COMMENT_CHARS));
        assert!(ok_comment.validate().is_ok());
    }

    #[test]
    fn test_record_flattens_submission_fields() {
        let record = FeedbackRecord {
            submission: submission(),
            feedback_id: "fb_1_abc".to_string(),
            timestamp: "2025-01-01T00:00:00+00:00".to_string(),
            user_agent: "test-agent".to_string(),
            ip: "unknown".to_string(),
        };
        let value = serde_json::to_value(&record).unwrap();
        // Submission fields sit at the top level of the JSONL line
        assert_eq!(value["sessionId"], "sess-1");
        assert_eq!(value["rating"], "satisfied");
        assert_eq!(value["feedbackId"], "fb_1_abc");
        assert_eq!(value["userAgent"], "test-agent");

        let back: FeedbackRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }
}
