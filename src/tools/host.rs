//! `ToolHostClient` — a JSON-RPC 2.0 client speaking to one MCP-style tool
//! host over its child process's stdio (spec §4.2).
//!
//! No teacher file spawns subprocesses (the SDK only ever spoke to a
//! long-running HTTP server), so the process/pipe plumbing is new. The
//! concurrency shape is grounded on two teacher patterns: the pending-id
//! dispatch table mirrors `hooks.rs`'s `Arc<dyn Fn(...) -> Pin<Box<dyn
//! Future<...>>>>` style of type-erased async handoff, and the restart
//! backoff reuses `retry::RetryConfig` as-is.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{oneshot, Mutex, RwLock};
use tokio::time::timeout;

use crate::error::{Error, Result};
use crate::retry::RetryConfig;
use crate::types::{ToolHostSpec, ToolHostState, ToolSchema};

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    id: u64,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(default)]
    message: String,
}

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<std::result::Result<Value, String>>>>>;

/// One live (or dead-but-retryable) connection to a tool host's child
/// process. Every public method goes through [`Self::call`], which writes
/// a framed request line under [`Self::writer`] and waits on a oneshot slot
/// that the reader task resolves.
pub struct ToolHostClient {
    spec: ToolHostSpec,
    child: Mutex<Option<Child>>,
    stdin: Mutex<Option<ChildStdin>>,
    next_id: AtomicU64,
    pending: PendingMap,
    state: Arc<RwLock<ToolHostState>>,
    retry: RetryConfig,
}

impl ToolHostClient {
    /// Spawn the host process and start its background reader task. Leaves
    /// state at `Starting` until [`Self::initialize`] succeeds.
    pub async fn spawn(spec: ToolHostSpec) -> Result<Self> {
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let state = Arc::new(RwLock::new(ToolHostState::Starting));

        let mut child = Self::launch(&spec)?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::host_dead(format!("{}: no stdout pipe", spec.name)))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::host_dead(format!("{}: no stdin pipe", spec.name)))?;

        spawn_reader_task(spec.name.clone(), stdout, pending.clone(), state.clone());

        Ok(ToolHostClient {
            spec,
            child: Mutex::new(Some(child)),
            stdin: Mutex::new(Some(stdin)),
            next_id: AtomicU64::new(1),
            pending,
            state,
            retry: RetryConfig::default()
                .with_max_attempts(5)
                .with_initial_delay(Duration::from_millis(500))
                .with_max_delay(Duration::from_secs(30)),
        })
    }

    fn launch(spec: &ToolHostSpec) -> Result<Child> {
        Command::new(&spec.launch_command)
            .args(&spec.args)
            .envs(&spec.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::host_dead(format!("{}: failed to spawn: {e}", spec.name)))
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub async fn state(&self) -> ToolHostState {
        *self.state.read().await
    }

    /// MCP handshake. Must succeed before `list_tools`/`call_tool`.
    pub async fn initialize(&self) -> Result<()> {
        self.call("initialize", serde_json::json!({}), Duration::from_secs(10))
            .await?;
        *self.state.write().await = ToolHostState::Ready;
        Ok(())
    }

    /// Fetch this host's advertised tool schemas, stamped with its own name
    /// as `origin_host` (spec §4.3 namespacing).
    pub async fn list_tools(&self) -> Result<Vec<ToolSchema>> {
        let result = self
            .call("tools/list", serde_json::json!({}), Duration::from_secs(10))
            .await?;
        let raw: Vec<RawToolSchema> = serde_json::from_value(result)
            .map_err(|e| Error::provider_bad_output(format!("list_tools response: {e}")))?;
        Ok(raw
            .into_iter()
            .map(|r| ToolSchema {
                name: r.name,
                description: r.description,
                parameter_schema: r.parameter_schema,
                origin_host: self.spec.name.clone(),
            })
            .collect())
    }

    /// Invoke one tool, bounded by `timeout_duration` (spec §6
    /// `TOOL_TIMEOUT_MS`). A timeout here does not necessarily mean the
    /// host is dead — only the reader task's EOF/error observation flips
    /// state to `Dead`.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
        timeout_duration: Duration,
    ) -> Result<Value> {
        if *self.state.read().await == ToolHostState::Dead {
            return Err(Error::host_dead(self.spec.name.clone()));
        }
        self.call(
            "tools/call",
            serde_json::json!({ "name": name, "arguments": arguments }),
            timeout_duration,
        )
        .await
    }

    pub async fn shutdown(&self) -> Result<()> {
        let _ = self
            .call("shutdown", serde_json::json!({}), Duration::from_secs(5))
            .await;
        if let Some(mut child) = self.child.lock().await.take() {
            let _ = child.kill().await;
        }
        *self.state.write().await = ToolHostState::Dead;
        Ok(())
    }

    /// Kill and respawn the child, retrying with bounded exponential
    /// backoff (spec §4.2). On success, re-runs `initialize`.
    pub async fn restart(&mut self) -> Result<()> {
        if let Some(mut child) = self.child.lock().await.take() {
            let _ = child.kill().await;
        }

        let spec = self.spec.clone();
        let child = crate::retry::retry_with_backoff(self.retry.clone(), move || {
            let spec = spec.clone();
            async move { Self::launch(&spec) }
        })
        .await?;

        let mut child = child;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::host_dead(format!("{}: no stdout pipe", self.spec.name)))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::host_dead(format!("{}: no stdin pipe", self.spec.name)))?;

        *self.child.lock().await = Some(child);
        *self.stdin.lock().await = Some(stdin);
        *self.state.write().await = ToolHostState::Starting;
        spawn_reader_task(
            self.spec.name.clone(),
            stdout,
            self.pending.clone(),
            self.state.clone(),
        );

        self.initialize().await
    }

    async fn call(&self, method: &str, params: Value, timeout_duration: Duration) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        let request = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };
        let mut line = serde_json::to_string(&request)
            .map_err(|e| Error::invariant_violated(format!("encode rpc request: {e}")))?;
        line.push('\n');

        {
            let mut guard = self.stdin.lock().await;
            let stdin = guard
                .as_mut()
                .ok_or_else(|| Error::host_dead(self.spec.name.clone()))?;
            stdin
                .write_all(line.as_bytes())
                .await
                .map_err(|e| Error::host_dead(format!("{}: write failed: {e}", self.spec.name)))?;
            stdin
                .flush()
                .await
                .map_err(|e| Error::host_dead(format!("{}: flush failed: {e}", self.spec.name)))?;
        }

        match timeout(timeout_duration, rx).await {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(message))) => Err(Error::tool_execution_error(method, message)),
            Ok(Err(_canceled)) => Err(Error::host_dead(self.spec.name.clone())),
            Err(_elapsed) => {
                self.pending.lock().await.remove(&id);
                Err(Error::tool_timeout(format!("{}::{}", self.spec.name, method)))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawToolSchema {
    name: String,
    description: String,
    #[serde(rename = "inputSchema")]
    parameter_schema: Value,
}

fn spawn_reader_task(
    host_name: String,
    stdout: tokio::process::ChildStdout,
    pending: PendingMap,
    state: Arc<RwLock<ToolHostState>>,
) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stdout).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<RpcResponse>(&line) {
                        Ok(response) => {
                            if let Some(tx) = pending.lock().await.remove(&response.id) {
                                let outcome = match response.result {
                                    Some(value) => Ok(value),
                                    None => Err(response
                                        .error
                                        .map(|e| e.message)
                                        .unwrap_or_else(|| "empty response".to_string())),
                                };
                                let _ = tx.send(outcome);
                            }
                        }
                        Err(e) => {
                            log::warn!("tool host {host_name}: malformed response line: {e}");
                        }
                    }
                }
                Ok(None) => {
                    log::warn!("tool host {host_name}: stdout closed, marking dead");
                    break;
                }
                Err(e) => {
                    log::warn!("tool host {host_name}: read error: {e}, marking dead");
                    break;
                }
            }
        }

        *state.write().await = ToolHostState::Dead;
        let mut pending = pending.lock().await;
        for (_, tx) in pending.drain() {
            let _ = tx.send(Err(format!("{host_name}: host process exited")));
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as StdHashMap;

    fn echo_spec() -> ToolHostSpec {
        ToolHostSpec {
            name: "echo-host".to_string(),
            launch_command: "cat".to_string(),
            args: vec![],
            env: StdHashMap::new(),
        }
    }

    #[tokio::test]
    async fn test_spawn_starts_in_starting_state() {
        let client = ToolHostClient::spawn(echo_spec()).await.unwrap();
        assert_eq!(client.state().await, ToolHostState::Starting);
        assert_eq!(client.name(), "echo-host");
    }

    #[tokio::test]
    async fn test_call_tool_on_dead_host_is_host_dead() {
        let spec = ToolHostSpec {
            name: "nonexistent".to_string(),
            launch_command: "/bin/nonexistent-binary-xyz".to_string(),
            args: vec![],
            env: StdHashMap::new(),
        };
        let result = ToolHostClient::spawn(spec).await;
        assert!(result.is_err());
    }
}
