//! Tool-Host Client & Tool Registry (spec §4.2, §4.3).
//!
//! The teacher's `tools.rs` modeled a tool as an in-process Rust closure
//! (`ToolHandler = Arc<dyn Fn(Value) -> Pin<Box<dyn Future<...>>> + Send +
//! Sync>`) invoked directly by the client. The orchestrator's tools live in
//! separate MCP-style child processes instead, so [`host::ToolHostClient`]
//! and [`registry::ToolRegistry`] replace that handler map with a JSON-RPC
//! client per host and an aggregating registry — but the shape of "name +
//! schema + async execute" carries over unchanged.

pub mod host;
pub mod registry;

pub use host::ToolHostClient;
pub use registry::ToolRegistry;
