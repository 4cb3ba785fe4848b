// Transform pipeline: policy tables, prompt construction, two-stage
// orchestration. All LLM calls go through llm_client — no direct API calls here.

pub mod handlers;
pub mod pipeline;
pub mod policy;
pub mod prompts;
pub mod types;
