pub mod enrichment;
pub mod jflap;
pub mod json_recovery;
pub mod llm_service;
pub mod output_writer;
pub mod rate_limiter;
pub mod retry;

pub use enrichment::{EnrichedQuestion, EnrichmentResult, EnrichmentService, LlmEnricher, PromptBuilder};
pub use llm_service::LlmService;
pub use output_writer::{OutputLayout, OutputWriter};
pub use rate_limiter::SlidingWindowLimiter;
pub use retry::RetryPolicy;
