//! # Exception Reporting
//!
//! Writes reported errors to their log channel together with the request that
//! caused them. Request input is redacted before it reaches the log.

use serde_json::{Map, Value};
use tracing::{error, warn};

use crate::backend::error::{ErrorChannel, ReportedError};

const REDACTED: &str = "[REDACTED]";

/// Any input key containing one of these (case-insensitive) is redacted
const SENSITIVE_KEY_PARTS: [&str; 5] = ["password", "secret", "token", "key", "card"];

/// Request details captured by the request-context middleware
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub method: String,
    pub path: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub user_id: Option<String>,
    /// Request input (JSON body or query string), already redacted
    pub input: Value,
}

pub fn is_sensitive_key(key: &str) -> bool {
    let key = key.to_lowercase();
    SENSITIVE_KEY_PARTS.iter().any(|part| key.contains(part))
}

/// Replace the values of sensitive keys, at any depth
pub fn redact_input(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let redacted: Map<String, Value> = map
                .into_iter()
                .map(|(key, value)| {
                    if is_sensitive_key(&key) {
                        (key, Value::String(REDACTED.to_string()))
                    } else {
                        (key, redact_input(value))
                    }
                })
                .collect();
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(redact_input).collect()),
        other => other,
    }
}

/// Turn a raw query string into a JSON object so it can be redacted like a body.
/// Keys and values are percent-decoded first.
pub fn query_to_input(query: &str) -> Value {
    match serde_urlencoded::from_str::<Vec<(String, String)>>(query) {
        Ok(pairs) => Value::Object(
            pairs
                .into_iter()
                .map(|(key, value)| (key, Value::String(value)))
                .collect(),
        ),
        Err(_) => Value::String(format!("<{} bytes>", query.len())),
    }
}

/// Log an error report on its channel with the request context
pub fn report_error(report: &ReportedError, context: &RequestContext) {
    let user_id = context.user_id.as_deref().unwrap_or("guest");
    let ip = context.ip.as_deref().unwrap_or("unknown");
    let user_agent = context.user_agent.as_deref().unwrap_or("unknown");

    match report.channel {
        ErrorChannel::Database => error!(
            target: "database",
            code = report.code.as_deref().unwrap_or("unknown"),
            method = %context.method,
            path = %context.path,
            user_id,
            ip,
            input = %context.input,
            "Database error: {}",
            report.message
        ),
        ErrorChannel::Auth => warn!(
            target: "auth",
            method = %context.method,
            path = %context.path,
            ip,
            user_agent,
            "Authentication failed: {}",
            report.message
        ),
        ErrorChannel::App => error!(
            target: "app",
            method = %context.method,
            path = %context.path,
            user_id,
            ip,
            user_agent,
            input = %context.input,
            "Unhandled error: {}",
            report.message
        ),
    }
}
