//! Orchestrator — the two-stage transform pipeline.
//!
//! Flow: admission (tier/quota) → stage 1 analysis (smart mode) →
//!       confidence gate → stage 2 transform → usage charge.
//!
//! The outcome is an explicit tagged variant so callers handle every terminal
//! state exhaustively instead of inspecting flags. The two generation calls
//! within one request are strictly sequential; there is no caching and no
//! cancellation of in-flight calls.

use tracing::{info, warn};

use crate::config::Config;
use crate::errors::AppError;
use crate::llm_client::{strip_json_fences, GenerationCall, TextGenerator};
use crate::transform::prompts::{
    analysis_output_schema, analysis_system_prompt, analysis_user_prompt, enhanced_system_prompt,
    enhanced_user_prompt, transform_output_schema, transform_system_prompt, transform_user_prompt,
    ANALYSIS_SCHEMA_NAME, TRANSFORM_SCHEMA_NAME,
};
use crate::transform::types::{
    AnalysisResult, Model, TransformPayload, TransformRequest, TransformResult, TransformSettings,
};
use crate::usage::{can_use_model, resolve_tier, UsageGate, UserTier};

/// Terminal states of one transform request.
#[derive(Debug, Clone)]
pub enum TransformOutcome {
    /// Stage-1 confidence fell below the threshold: stage 2 was NOT invoked,
    /// no usage was charged, and the caller must confirm the analysis.
    NeedsConfirmation {
        analysis: AnalysisResult,
        model_used: Model,
    },
    /// Stage 2 completed.
    Done {
        payload: TransformPayload,
        /// Present when stage 1 ran and parsed (smart mode or confirmation).
        analysis: Option<AnalysisResult>,
        model_used: Model,
    },
}

impl TransformOutcome {
    /// Flattens the outcome into the wire-format result.
    pub fn into_result(self) -> TransformResult {
        match self {
            TransformOutcome::NeedsConfirmation {
                analysis,
                model_used,
            } => TransformResult {
                revision: String::new(),
                tips: vec!["분석 신뢰도가 낮아 설정을 확인해주세요.".to_string()],
                subject: String::new(),
                summary: String::new(),
                analysis: Some(analysis),
                needs_confirmation: true,
                model_used: model_used.as_str().to_string(),
            },
            TransformOutcome::Done {
                payload,
                analysis,
                model_used,
            } => TransformResult {
                revision: payload.revision,
                tips: payload.tips,
                subject: payload.subject,
                summary: payload.summary,
                analysis,
                needs_confirmation: false,
                model_used: model_used.as_str().to_string(),
            },
        }
    }
}

/// Runs the full pipeline for one request.
///
/// Admission (model permission, daily quota) happens before any generation
/// call; a rejected request makes zero calls and charges nothing.
pub async fn run_transform(
    generator: &dyn TextGenerator,
    gate: &UsageGate,
    config: &Config,
    request: TransformRequest,
) -> Result<TransformOutcome, AppError> {
    request.validate().map_err(AppError::Validation)?;

    let model = request.model;
    let tier = caller_tier(&request, config);

    if !can_use_model(model, tier) {
        return Err(AppError::Forbidden(format!(
            "{} 모델을 사용할 권한이 없습니다. 프리미엄 구독이 필요합니다.",
            model.as_str()
        )));
    }

    let quota = gate.check(model, tier);
    if !quota.can_use {
        return Err(AppError::QuotaExceeded(format!(
            "오늘 {} 모델 사용량을 모두 사용했습니다. (일일 한도: {}회)",
            model.as_str(),
            quota.limit
        )));
    }

    info!(
        "Transform request: model={}, tier={:?}, smart={}, len={}",
        model.as_str(),
        tier,
        request.smart_mode,
        request.text.chars().count()
    );

    // Confirmation path: the client echoes back a previously-surfaced analysis
    // together with the settings it confirmed. Proceeds directly to stage 2
    // regardless of the analysis confidence.
    if let Some(analysis) = request.analysis_result.clone() {
        if request.has_explicit_settings() {
            let settings = settings_from_request(&request);
            info!("Confirmation path: reusing surfaced analysis, skipping stage 1");
            let system = enhanced_system_prompt(&settings, &analysis.analysis);
            let user = enhanced_user_prompt(&request.text, &settings, &analysis);
            let payload = run_stage_two(generator, gate, model, system, user).await?;
            return Ok(TransformOutcome::Done {
                payload,
                analysis: Some(analysis),
                model_used: model,
            });
        }
    }

    if request.smart_mode || !request.has_explicit_settings() {
        return run_smart_transform(generator, gate, config, &request).await;
    }

    // Direct path: all three settings explicitly provided, no analysis needed.
    let settings = settings_from_request(&request);
    let system = transform_system_prompt(&settings);
    let user = transform_user_prompt(&request.text);
    let payload = run_stage_two(generator, gate, model, system, user).await?;

    Ok(TransformOutcome::Done {
        payload,
        analysis: None,
        model_used: model,
    })
}

/// Smart path: stage-1 analysis, confidence gate, then stage 2.
///
/// Any stage-1 failure (transport error, empty output, unparseable JSON)
/// degrades silently to the direct path with caller-supplied or default
/// settings — the user never sees an analysis error.
async fn run_smart_transform(
    generator: &dyn TextGenerator,
    gate: &UsageGate,
    config: &Config,
    request: &TransformRequest,
) -> Result<TransformOutcome, AppError> {
    let model = request.model;

    info!("Stage 1: analyzing input with {}", model.as_str());

    let analysis = match run_stage_one(generator, model, &request.text).await {
        Ok(analysis) => analysis,
        Err(cause) => {
            // Degraded path per design: fall back to manual-equivalent
            // behavior. The warn! is the observability signal for it.
            warn!("Stage 1 analysis failed ({cause}); falling back to default settings");
            let settings = settings_from_request(request);
            let system = transform_system_prompt(&settings);
            let user = transform_user_prompt(&request.text);
            let payload = run_stage_two(generator, gate, model, system, user).await?;
            return Ok(TransformOutcome::Done {
                payload,
                analysis: None,
                model_used: model,
            });
        }
    };

    if analysis.confidence < config.confidence_threshold {
        info!(
            "Stage 1 confidence {:.2} below threshold {:.2}; pausing for confirmation",
            analysis.confidence, config.confidence_threshold
        );
        return Ok(TransformOutcome::NeedsConfirmation {
            analysis,
            model_used: model,
        });
    }

    info!(
        "Stage 2: transforming with {} (confidence {:.2})",
        model.as_str(),
        analysis.confidence
    );

    let settings = TransformSettings {
        purpose: analysis.purpose,
        intent: analysis.intent,
        politeness: analysis.politeness,
        language: request.language,
        tone_preset: request.tone_preset,
    };
    let system = enhanced_system_prompt(&settings, &analysis.analysis);
    let user = enhanced_user_prompt(&request.text, &settings, &analysis);
    let payload = run_stage_two(generator, gate, model, system, user).await?;

    Ok(TransformOutcome::Done {
        payload,
        analysis: Some(analysis),
        model_used: model,
    })
}

/// Stage-1 call + defensive parse. The error is internal only — callers
/// translate it into the silent fallback.
async fn run_stage_one(
    generator: &dyn TextGenerator,
    model: Model,
    text: &str,
) -> Result<AnalysisResult, String> {
    let raw = generator
        .generate(GenerationCall {
            model: model.as_str().to_string(),
            system: analysis_system_prompt(),
            user: analysis_user_prompt(text),
            schema_name: ANALYSIS_SCHEMA_NAME,
            schema: analysis_output_schema(),
        })
        .await
        .map_err(|e| format!("call failed: {e}"))?;

    serde_json::from_str(strip_json_fences(&raw)).map_err(|e| format!("unparseable output: {e}"))
}

/// Stage-2 call. A transport/service error is fatal for the request; an
/// unparseable body is recovered by wrapping the raw text as the revision.
/// Usage is charged here — only transformations that happened count.
async fn run_stage_two(
    generator: &dyn TextGenerator,
    gate: &UsageGate,
    model: Model,
    system: String,
    user: String,
) -> Result<TransformPayload, AppError> {
    let raw = generator
        .generate(GenerationCall {
            model: model.as_str().to_string(),
            system,
            user,
            schema_name: TRANSFORM_SCHEMA_NAME,
            schema: transform_output_schema(),
        })
        .await
        .map_err(|e| AppError::Llm(format!("Transform call failed: {e}")))?;

    let stripped = strip_json_fences(&raw);
    let payload = match serde_json::from_str::<TransformPayload>(stripped) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Stage 2 output was not valid JSON ({e}); wrapping raw text");
            TransformPayload {
                revision: stripped.trim().to_string(),
                ..Default::default()
            }
        }
    };

    gate.record_use(model);
    Ok(payload)
}

fn caller_tier(request: &TransformRequest, config: &Config) -> UserTier {
    match request.premium_key.as_deref() {
        // An explicit key wins over the advisory flag.
        Some(key) => resolve_tier(Some(key), &config.premium_keys),
        None if request.premium => UserTier::Premium,
        None => UserTier::Free,
    }
}

fn settings_from_request(request: &TransformRequest) -> TransformSettings {
    TransformSettings {
        purpose: request.purpose.unwrap_or_default(),
        intent: request.intent.unwrap_or_default(),
        politeness: request.politeness.unwrap_or_default(),
        language: request.language,
        tone_preset: request.tone_preset,
    }
}
