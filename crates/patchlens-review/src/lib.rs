//! Review prompt composition and analysis-agent invocation for patchlens.
//!
//! Provides the final pipeline stages: [`build_review_prompt`] /
//! [`ReviewPrompt`] assemble the fetched patch, aggregated comments, and the
//! fixed question battery into one persisted prompt; [`AnalysisAgent`] pipes
//! it to the external agent; [`ReviewStore`] keeps the latest analysis per
//! change for follow-up runs.

mod agent;
mod prompt;
mod session;

pub use agent::AnalysisAgent;
pub use prompt::{
    build_review_prompt, render_comments, PromptContext, ReviewPrompt, QUESTION_BATTERY,
};
pub use session::{ReviewStore, SavedReview};
