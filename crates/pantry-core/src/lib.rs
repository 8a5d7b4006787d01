//! Core domain types shared by every pantry tool.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Open mapping of upstream query parameters. Only the keys a tool actually
/// inspects are validated; everything else is forwarded untouched.
pub type SearchParameters = Map<String, Value>;

pub const DEFAULT_UNIT: &str = "each";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Value,
}

/// A named invocation as it arrives from the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRequest {
    #[serde(rename = "name")]
    pub tool_name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

/// The single string every tool hands back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroceryItem {
    pub name: String,
    pub quantity: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
}

impl GroceryItem {
    pub fn new(name: impl Into<String>, quantity: f64) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit: default_unit(),
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }
}

fn default_unit() -> String {
    DEFAULT_UNIT.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptDefinition {
    pub name: String,
    pub description: Option<String>,
    pub text: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("{0}")]
    MissingConfiguration(String),
    #[error("{0}")]
    Unavailable(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("{0}")]
    Backend(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("internal error: {0}")]
    Internal(String),
    #[error("tool not found: {0}")]
    UnknownTool(String),
}

impl ToolError {
    /// Errors the dispatcher reports itself instead of handing them to a tool
    /// for rendering.
    pub fn is_dispatch_error(&self) -> bool {
        matches!(self, Self::UnknownTool(_) | Self::InvalidArguments(_))
    }
}
