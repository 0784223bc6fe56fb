pub mod config;
pub mod heuristic;
pub mod kv;
pub mod llm;
pub mod network;
pub mod normalize;
pub mod page;
pub mod pipeline;
pub mod prompts;
pub mod response;
pub mod segmenter;
pub mod server;
pub mod service;
pub mod store;
pub mod summarizer;
pub mod worker;

pub use config::ServiceConfig;
pub use heuristic::{IntentCategory, IntentClassifier};
pub use kv::{KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore};
pub use llm::{LLMClient, LLMConfig, LLMProvider, LanguageModel, PromptRequest};
pub use network::{FixedProbe, HttpProbe, ReachabilityProbe};
pub use page::{PageSource, SubmittedPage};
pub use pipeline::{CapturePipeline, CaptureStrategy};
pub use service::{RequestError, SnapmarkService};
pub use store::{SaveOutcome, SnapshotStore};
pub use summarizer::summarize_fallback;
pub use worker::{StoreHandle, StoreWorker};
