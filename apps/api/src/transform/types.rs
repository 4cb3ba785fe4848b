//! Wire-format data model for the transform pipeline.
//!
//! Field names are camelCase on the wire — the web client predates this
//! service and its JSON shape is the contract.

use serde::{Deserialize, Serialize};

/// Document purpose. Drives layout rules in the transform prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Purpose {
    #[default]
    Email,
    Report,
    Memo,
    Messenger,
    Minutes,
}

impl Purpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Purpose::Email => "email",
            Purpose::Report => "report",
            Purpose::Memo => "memo",
            Purpose::Messenger => "messenger",
            Purpose::Minutes => "minutes",
        }
    }
}

/// Communicative intent. Selects guidance and the phrase bank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    #[default]
    Request,
    Decline,
    Rebuttal,
    Apology,
    Persuade,
    Notice,
    Escalation,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Request => "request",
            Intent::Decline => "decline",
            Intent::Rebuttal => "rebuttal",
            Intent::Apology => "apology",
            Intent::Persuade => "persuade",
            Intent::Notice => "notice",
            Intent::Escalation => "escalation",
        }
    }
}

/// Politeness level, 1..=3 on the wire.
/// 1 = concise peer tone, 2 = standard business, 3 = deferential.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Politeness {
    Concise = 1,
    #[default]
    Standard = 2,
    Deferential = 3,
}

impl TryFrom<u8> for Politeness {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Politeness::Concise),
            2 => Ok(Politeness::Standard),
            3 => Ok(Politeness::Deferential),
            other => Err(format!("politeness must be 1..=3, got {other}")),
        }
    }
}

impl From<Politeness> for u8 {
    fn from(value: Politeness) -> Self {
        value as u8
    }
}

/// Output language of the revision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ko,
    En,
}

/// Optional tone modifier layered on top of the politeness rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TonePreset {
    #[default]
    Default,
    Friendly,
    Firm,
    Cautious,
}

/// Selectable generation models. gpt-4o-mini is the free tier default;
/// gpt-4o requires a premium caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Model {
    #[default]
    #[serde(rename = "gpt-4o-mini")]
    Gpt4oMini,
    #[serde(rename = "gpt-4o")]
    Gpt4o,
}

impl Model {
    pub fn as_str(&self) -> &'static str {
        match self {
            Model::Gpt4oMini => "gpt-4o-mini",
            Model::Gpt4o => "gpt-4o",
        }
    }
}

/// Fully-resolved settings for one transform — either user-supplied
/// (manual mode) or produced by stage-1 analysis (smart mode).
#[derive(Debug, Clone, Copy)]
pub struct TransformSettings {
    pub purpose: Purpose,
    pub intent: Intent,
    pub politeness: Politeness,
    pub language: Language,
    pub tone_preset: TonePreset,
}

/// Emotional read of the input text, produced by stage-1 analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionAnalysis {
    pub detected_emotions: Vec<String>,
    pub emotion_intensity: EmotionIntensity,
    pub context_clues: Vec<String>,
    pub reasoning: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionIntensity {
    High,
    #[default]
    Medium,
    Low,
}

/// An alternative settings suggestion surfaced when confidence is low.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeOption {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<Purpose>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub politeness: Option<Politeness>,
    pub reason: String,
}

/// Full stage-1 output. Immutable once returned; consumed by stage-2 prompt
/// construction and by the confirmation flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub purpose: Purpose,
    pub intent: Intent,
    pub politeness: Politeness,
    /// 0.0..=1.0 — below the configured threshold the pipeline pauses.
    pub confidence: f64,
    pub analysis: EmotionAnalysis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_options: Option<Vec<AlternativeOption>>,
}

/// Incoming transform request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformRequest {
    pub text: String,
    #[serde(default)]
    pub purpose: Option<Purpose>,
    #[serde(default)]
    pub intent: Option<Intent>,
    #[serde(default)]
    pub politeness: Option<Politeness>,
    #[serde(default)]
    pub tone_preset: TonePreset,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub smart_mode: bool,
    #[serde(default)]
    pub model: Model,
    #[serde(default)]
    pub premium: bool,
    /// Premium key checked server-side against the configured allow-list.
    #[serde(default)]
    pub premium_key: Option<String>,
    /// Analysis echoed back by a confirming client. With all three settings
    /// present this skips stage 1 and reuses the enhanced prompt.
    #[serde(default)]
    pub analysis_result: Option<AnalysisResult>,
}

pub const MAX_TEXT_CHARS: usize = 500;

impl TransformRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.text.trim().is_empty() {
            return Err("텍스트를 입력해주세요".to_string());
        }
        if self.text.chars().count() > MAX_TEXT_CHARS {
            return Err("텍스트는 500자를 초과할 수 없습니다".to_string());
        }
        Ok(())
    }

    /// True when all three manual settings are explicitly provided.
    pub fn has_explicit_settings(&self) -> bool {
        self.purpose.is_some() && self.intent.is_some() && self.politeness.is_some()
    }
}

/// The stage-2 LLM output shape (also embedded as a schema in the prompt).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformPayload {
    pub revision: String,
    #[serde(default)]
    pub tips: Vec<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub summary: String,
}

/// Final result returned to the caller.
/// `needs_confirmation = true` means stage 2 was skipped and the text fields
/// are empty — the client must confirm the surfaced analysis first.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformResult {
    pub revision: String,
    pub tips: Vec<String>,
    pub subject: String,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisResult>,
    pub needs_confirmation: bool,
    pub model_used: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_politeness_roundtrips_as_integer() {
        let json = serde_json::to_string(&Politeness::Deferential).unwrap();
        assert_eq!(json, "3");
        let back: Politeness = serde_json::from_str("1").unwrap();
        assert_eq!(back, Politeness::Concise);
    }

    #[test]
    fn test_politeness_rejects_out_of_range() {
        assert!(serde_json::from_str::<Politeness>("0").is_err());
        assert!(serde_json::from_str::<Politeness>("4").is_err());
    }

    #[test]
    fn test_model_serde_names() {
        assert_eq!(
            serde_json::to_string(&Model::Gpt4oMini).unwrap(),
            "\"gpt-4o-mini\""
        );
        let m: Model = serde_json::from_str("\"gpt-4o\"").unwrap();
        assert_eq!(m, Model::Gpt4o);
    }

    #[test]
    fn test_transform_request_defaults() {
        let req: TransformRequest =
            serde_json::from_str(r#"{"text": "회의 자료 공유 부탁드립니다"}"#).unwrap();
        assert_eq!(req.language, Language::Ko);
        assert_eq!(req.tone_preset, TonePreset::Default);
        assert_eq!(req.model, Model::Gpt4oMini);
        assert!(!req.smart_mode);
        assert!(!req.premium);
        assert!(!req.has_explicit_settings());
    }

    #[test]
    fn test_transform_request_validation_bounds() {
        let mut req: TransformRequest = serde_json::from_str(r#"{"text": "a"}"#).unwrap();
        assert!(req.validate().is_ok());

        req.text = " ".to_string();
        assert!(req.validate().is_err());

        // 500 Hangul chars are fine; 501 are not (char count, not bytes)
        req.text = "가".repeat(MAX_TEXT_CHARS);
        assert!(req.validate().is_ok());
        req.text.push('가');
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_analysis_result_wire_shape() {
        let json = r#"{
            "purpose": "email",
            "intent": "escalation",
            "politeness": 3,
            "confidence": 0.85,
            "analysis": {
                "detectedEmotions": ["분노", "조급함"],
                "emotionIntensity": "high",
                "contextClues": ["느낌표", "왜"],
                "reasoning": "항의성 메시지"
            },
            "alternativeOptions": [
                {"intent": "request", "reason": "단순 요청일 수 있음"}
            ]
        }"#;

        let parsed: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.purpose, Purpose::Email);
        assert_eq!(parsed.intent, Intent::Escalation);
        assert_eq!(parsed.politeness, Politeness::Deferential);
        assert!((parsed.confidence - 0.85).abs() < f64::EPSILON);
        assert_eq!(parsed.analysis.emotion_intensity, EmotionIntensity::High);
        let alts = parsed.alternative_options.as_ref().unwrap();
        assert_eq!(alts[0].intent, Some(Intent::Request));
        assert!(alts[0].purpose.is_none());
    }

    #[test]
    fn test_transform_payload_missing_optionals_default_empty() {
        let payload: TransformPayload =
            serde_json::from_str(r#"{"revision": "검토 부탁드립니다."}"#).unwrap();
        assert!(payload.tips.is_empty());
        assert_eq!(payload.subject, "");
        assert_eq!(payload.summary, "");
    }

    #[test]
    fn test_transform_result_serializes_camel_case() {
        let result = TransformResult {
            revision: String::new(),
            tips: vec![],
            subject: String::new(),
            summary: String::new(),
            analysis: None,
            needs_confirmation: true,
            model_used: "gpt-4o-mini".to_string(),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["needsConfirmation"], true);
        assert_eq!(value["modelUsed"], "gpt-4o-mini");
        assert!(value.get("analysis").is_none());
    }
}
