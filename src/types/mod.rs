//! Core data types shared by the model adapters and the orchestrator.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Message`] | Prompt message with role and text |
//! | [`ToolDefinition`] | Tool signature offered to the model |
//! | [`ToolCall`] | Tool invocation chosen by the model |
//! | [`ModelOutput`] | Tool calls or plain text returned by the model |

pub mod message;
pub mod tool;

pub use message::{Message, MessageRole};
pub use tool::{FunctionDefinition, ModelOutput, ToolCall, ToolDefinition};
