// Summarization pipeline: text extraction, the hosted-LLM client, the
// per-document pipeline and the detached background worker.
pub mod extract;
pub mod llm;
pub mod pipeline;
pub mod worker;

pub use llm::{ClaudeSummarizer, Summarizer};
pub use pipeline::SummaryPipeline;
pub use worker::{spawn_summary_worker, SummaryJob};
