//! Three-tier conversational memory (spec §4.4): [`hot`] sliding window,
//! [`warm`] rolling summary, [`cold`] vector similarity recall, joined by
//! [`compose`] into the single message list a provider sees.

pub mod cold;
pub mod compose;
pub mod hot;
pub mod warm;

pub use cold::{ColdMemory, EmbeddingProvider, LocalEmbeddingProvider};
pub use compose::MemoryComposer;
pub use hot::HotWindow;
pub use warm::WarmSummarizer;
