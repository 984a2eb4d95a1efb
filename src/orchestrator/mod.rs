//! Reasoning Loop & Output Sanitizer (spec §4.6, §4.7) — the core state
//! machine, grounded on the teacher's `Client::auto_execute_loop`.

pub mod loop_;
pub mod sanitizer;

pub use loop_::{select_path, ReasoningLoop};
pub use sanitizer::{ExecutionPath, OutputSanitizer};
