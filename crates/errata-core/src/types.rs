use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Coarse importance of a reported error. Defaults to `Error`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    #[default]
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized description of one error: message, class tag and frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorInstance {
    pub message: String,
    pub class: String,
    pub stacktrace: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<ErrorInstance>>,
}

impl ErrorInstance {
    /// Build an instance by hand, for errors that are not Rust error values.
    pub fn custom(
        message: impl Into<String>,
        class: impl Into<String>,
        stacktrace: Vec<String>,
    ) -> Self {
        Self {
            message: message.into(),
            class: class.into(),
            stacktrace,
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: ErrorInstance) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

/// Request details attached to an occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HttpContext {
    pub request_method: String,
    #[serde(rename = "RequestURL")]
    pub request_url: String,
    #[serde(default)]
    pub request_headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<String>,
}

/// One reported occurrence, as stored in a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Occurrence {
    pub error: ErrorInstance,
    pub uuid: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub observed_at: OffsetDateTime,
    pub severity: Severity,
    #[serde(
        rename = "HTTPContext",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub http_context: Option<HttpContext>,
}

impl Occurrence {
    /// Stamp a new occurrence with a fresh id and the current UTC time.
    pub fn new(error: ErrorInstance, severity: Severity, http_context: Option<HttpContext>) -> Self {
        Self {
            error,
            uuid: Uuid::new_v4(),
            observed_at: OffsetDateTime::now_utc(),
            severity,
            http_context,
        }
    }
}
