//! `ToolRegistry` — aggregates schemas across hosts, enforces the
//! allowlist, and narrows the advertised set per intent (spec §4.3).
//!
//! Grounded on the teacher's `Client::execute_tool_internal` (name lookup
//! by linear scan over a small `Vec`, spec-compliant since the allowlist
//! caps at 15 entries) and on `retry.rs`'s conditional-retry pattern for
//! `execute`'s timeout handling.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::types::ToolSchema;

use super::host::ToolHostClient;

/// Default keyword buckets used to narrow the schemas offered to the model
/// for a given intent (spec §4.3 "keyword relevance filter"). Intentionally
/// coarse: a handful of domain keywords per bucket, not a classifier.
/// Overridable via [`ToolRegistry::with_keyword_table`] (Open Question
/// decision, see DESIGN.md).
fn default_keyword_table() -> HashMap<&'static str, Vec<&'static str>> {
    let mut table = HashMap::new();
    table.insert(
        "CODE",
        vec!["file", "directory", "path", "code", "repo", "git", "compile", "run"],
    );
    table.insert(
        "RESEARCH",
        vec!["search", "web", "lookup", "fetch", "browse", "url"],
    );
    table.insert(
        "DATA",
        vec!["query", "database", "sql", "table", "schema", "record"],
    );
    table
}

/// Aggregates tool schemas from every attached host, namespaced by
/// `host::name` (spec §3 `ToolSchema::qualified_name`), and routes
/// `execute` calls to the right host.
pub struct ToolRegistry {
    hosts: HashMap<String, Arc<ToolHostClient>>,
    /// At most 15 qualified names (spec §4.3); empty means "no restriction".
    allowlist: Vec<String>,
    keyword_table: HashMap<&'static str, Vec<&'static str>>,
    filter_max: usize,
    /// Snapshot refreshed by `refresh()`, read by `schemas_for`/`get`.
    cache: RwLock<HashMap<String, ToolSchema>>,
}

impl ToolRegistry {
    pub fn new(allowlist: Vec<String>, filter_max: usize) -> Result<Self> {
        if allowlist.len() > 15 {
            return Err(Error::config("tool_allowlist must have at most 15 entries"));
        }
        Ok(ToolRegistry {
            hosts: HashMap::new(),
            allowlist,
            keyword_table: default_keyword_table(),
            filter_max,
            cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn with_keyword_table(mut self, table: HashMap<&'static str, Vec<&'static str>>) -> Self {
        self.keyword_table = table;
        self
    }

    pub fn attach_host(&mut self, client: ToolHostClient) {
        self.hosts.insert(client.name().to_string(), Arc::new(client));
    }

    /// Re-poll every attached host's `list_tools` and atomically swap the
    /// cache (spec §4.3). Hosts that are `Dead` are skipped, not failed.
    pub async fn refresh(&self) -> Result<()> {
        let mut fresh = HashMap::new();
        for host in self.hosts.values() {
            if host.state().await == crate::types::ToolHostState::Dead {
                continue;
            }
            let schemas = host.list_tools().await?;
            for schema in schemas {
                let qualified = schema.qualified_name();
                if self.allowlist.is_empty() || self.allowlist.contains(&qualified) {
                    fresh.insert(qualified, schema);
                }
            }
        }
        *self.cache.write().await = fresh;
        Ok(())
    }

    /// Every schema currently in the cache, unfiltered.
    pub async fn all_schemas(&self) -> Vec<ToolSchema> {
        self.cache.read().await.values().cloned().collect()
    }

    pub async fn get(&self, qualified_name: &str) -> Option<ToolSchema> {
        self.cache.read().await.get(qualified_name).cloned()
    }

    /// Narrow the cached schema set to the `filter_max` entries most
    /// relevant to `intent`/`query` by keyword overlap (spec §4.3). Ties
    /// keep cache iteration order; result is always `⊆` the allowlist and
    /// `|result| ≤ filter_max` (spec §8 testable property).
    pub async fn schemas_for(&self, intent: &str, query: &str) -> Vec<ToolSchema> {
        let all = self.all_schemas().await;
        if all.len() <= self.filter_max {
            return all;
        }

        let keywords = self.keyword_table.get(intent).cloned().unwrap_or_default();
        let query_lower = query.to_lowercase();

        let mut scored: Vec<(usize, ToolSchema)> = all
            .into_iter()
            .map(|schema| {
                let haystack = format!("{} {}", schema.name, schema.description).to_lowercase();
                let score = keywords
                    .iter()
                    .filter(|kw| haystack.contains(*kw) || query_lower.contains(*kw))
                    .count();
                (score, schema)
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored
            .into_iter()
            .take(self.filter_max)
            .map(|(_, schema)| schema)
            .collect()
    }

    /// Dispatch to the owning host, translating `ToolNotFound` when the
    /// qualified name isn't in the cache at all.
    pub async fn execute(
        &self,
        qualified_name: &str,
        arguments: serde_json::Value,
        timeout_duration: Duration,
    ) -> Result<serde_json::Value> {
        let schema = self
            .get(qualified_name)
            .await
            .ok_or_else(|| Error::tool_not_found(qualified_name))?;

        let host = self
            .hosts
            .get(&schema.origin_host)
            .ok_or_else(|| Error::host_dead(schema.origin_host.clone()))?;

        host.call_tool(&schema.name, arguments, timeout_duration).await
    }
}
