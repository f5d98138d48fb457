use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error codes carried on the wire inside [`CallError`].
pub mod code {
    /// No handler is bound to the addressed channel.
    pub const NOT_IMPLEMENTED: &str = "not_implemented";
    /// The incoming line could not be decoded as a method call.
    pub const BAD_REQUEST: &str = "bad_request";
    /// The platform API backing a handler could not be read.
    pub const PLATFORM_QUERY_FAILURE: &str = "platform_query_failure";
}

/// One incoming request addressed to a named channel.
///
/// `method` and `args` are optional on the wire; handlers that serve a
/// single-purpose channel are free to ignore both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodCall {
    pub channel: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub args: Value,
}

impl MethodCall {
    pub fn new(channel: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            method: method.into(),
            args: Value::Null,
        }
    }

    pub fn with_args(mut self, args: Value) -> Self {
        self.args = args;
        self
    }
}

/// Reply envelope: `{"ok": <value>}` or `{"err": {...}}` on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CallOutcome {
    #[serde(rename = "ok")]
    Ok(Value),
    #[serde(rename = "err")]
    Err(CallError),
}

impl CallOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, CallOutcome::Ok(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            CallOutcome::Ok(_) => "ok",
            CallOutcome::Err(_) => "err",
        }
    }
}

/// Structured error object returned to the caller instead of a value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallError {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: Value,
}

impl CallError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Value::Null,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    pub fn not_implemented(channel: &str) -> Self {
        Self::new(
            code::NOT_IMPLEMENTED,
            format!("no handler registered for channel `{channel}`"),
        )
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(code::BAD_REQUEST, message)
    }
}

/// Decodes one stdio line into a method call.
pub fn decode_call(line: &str) -> Result<MethodCall> {
    serde_json::from_str(line.trim()).context("malformed method call")
}

/// Encodes a reply envelope as a single stdio line (no trailing newline).
pub fn encode_outcome(outcome: &CallOutcome) -> Result<String> {
    serde_json::to_string(outcome).context("failed to encode call outcome")
}
