//! Per-conversation tool registry.

use crate::structured::check_tool_schema;
use crate::tools::ToolDescriptor;
use crate::types::ToolDefinition;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("tool '{0}' is registered more than once")]
    DuplicateTool(String),

    #[error("tool names must not be empty")]
    EmptyName,

    #[error("tool '{name}' has an unusable schema: {reason}")]
    InvalidSchema { name: String, reason: String },
}

/// The exact set of tools offered in one conversation.
///
/// Built from an explicit list for every call; there is no process-wide registry, so one
/// tenant's tool set cannot leak into another's conversation.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new(tools: impl IntoIterator<Item = ToolDescriptor>) -> Result<Self, RegistryError> {
        let tools: Vec<ToolDescriptor> = tools.into_iter().collect();
        let mut index = HashMap::with_capacity(tools.len());

        for (i, tool) in tools.iter().enumerate() {
            if tool.name().trim().is_empty() {
                return Err(RegistryError::EmptyName);
            }
            check_tool_schema(tool.schema()).map_err(|reason| RegistryError::InvalidSchema {
                name: tool.name().to_string(),
                reason,
            })?;
            if index.insert(tool.name().to_string(), i).is_some() {
                return Err(RegistryError::DuplicateTool(tool.name().to_string()));
            }
        }

        Ok(Self { tools, index })
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Signatures in registration order.
    pub fn signatures(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.signature()).collect()
    }
}
