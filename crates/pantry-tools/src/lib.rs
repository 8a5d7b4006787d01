//! Tool trait, argument marshaling and the name-based dispatcher.

mod arguments;
pub mod schema;

pub use arguments::Arguments;

use async_trait::async_trait;
use pantry_core::{ToolDefinition, ToolError, ToolOutput};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

#[async_trait]
pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    async fn invoke(&self, arguments: Arguments) -> Result<String, ToolError>;

    /// Turns a failed invocation into the text the caller sees.
    fn render_error(&self, error: &ToolError) -> String {
        format!("Error: {error}")
    }
}

#[async_trait]
pub trait ToolExecutor: Send + Sync {
    fn definitions(&self) -> Vec<ToolDefinition>;

    async fn call(&self, name: &str, input: Value) -> Result<ToolOutput, ToolError>;
}

#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) -> &mut Self {
        let name = tool.definition().name;
        if self.tools.insert(name.clone(), tool).is_some() {
            warn!(tool = %name, "replacing previously registered tool");
        }
        self
    }

    pub fn with(mut self, tool: impl Tool + 'static) -> Self {
        self.register(Arc::new(tool));
        self
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }
}

#[async_trait]
impl ToolExecutor for ToolRegistry {
    fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|tool| tool.definition()).collect()
    }

    async fn call(&self, name: &str, input: Value) -> Result<ToolOutput, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        let arguments = Arguments::from_value(input)?;

        match tool.invoke(arguments).await {
            Ok(text) => {
                info!(tool = name, "tool call succeeded");
                Ok(ToolOutput::success(text))
            }
            Err(error) if error.is_dispatch_error() => Err(error),
            Err(error) => {
                warn!(tool = name, %error, "tool call failed");
                Ok(ToolOutput::failure(tool.render_error(&error)))
            }
        }
    }
}
