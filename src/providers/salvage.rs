//! Salvage parser (spec §4.1, §9).
//!
//! Some models never emit a structured `tool_calls` delta and instead put
//! `{"name": "...", "parameters"|"arguments": {...}}` straight into their
//! text content. This scans for that shape using balanced-brace counting
//! with string-aware skipping — a strict subset of JSON (object,
//! string/number/bool/null, no comments), rejecting anything it can't
//! fully parse rather than falling back to permissive regex (spec §9).
//!
//! No teacher file implements this (the teacher's tools are always
//! structured function calls); the scanner itself is a small, self
//! contained state machine, not adapted from any one example file.

use serde_json::Value;

/// The raw shape the salvage parser looks for, before the caller
/// synthesizes a [`crate::types::ToolCall`] (which also needs a freshly
/// generated id and a check against the active tool set — both the
/// caller's responsibility, since only the reasoning loop knows which
/// tools are currently in scope).
#[derive(Debug, Clone, PartialEq)]
pub struct SalvagedCall {
    pub name: String,
    pub arguments: Value,
}

/// Scan `text` for the first balanced `{...}` object and, if it parses as
/// JSON and has a `name` string field plus a `parameters` or `arguments`
/// object field, return it. Returns `None` if no balanced object is found,
/// if it doesn't parse, or if it's missing `name`.
pub fn salvage_tool_call(text: &str) -> Option<SalvagedCall> {
    let candidate = extract_balanced_object(text)?;
    let value: Value = serde_json::from_str(&candidate).ok()?;
    let obj = value.as_object()?;

    let name = obj.get("name")?.as_str()?.to_string();
    let arguments = obj
        .get("parameters")
        .or_else(|| obj.get("arguments"))
        .cloned()
        .unwrap_or_else(|| Value::Object(Default::default()));

    if !arguments.is_object() {
        return None;
    }

    Some(SalvagedCall { name, arguments })
}

/// Scan from the first `{` to its matching `}`, tracking string state (so
/// braces inside string literals don't affect the count) and backslash
/// escapes within strings. Returns the slice as an owned `String` if a
/// balanced object is found, `None` otherwise (e.g. truncated stream).
fn extract_balanced_object(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        let ch = b as char;
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + 1;
                    return Some(text[start..end].to_string());
                }
            }
            _ => {}
        }
    }

    None
}
