//! # newsletter-agent
//!
//! LLM tool-dispatch runtime for a newsletter platform.
//!
//! A natural-language agent may invoke one of a few declared, schema-validated,
//! tenant-scoped operations ("create a social media post", "record insights"). The
//! runtime reconciles the model's freeform output against each tool's contract before
//! anything is persisted.
//!
//! ## Flow
//!
//! 1. The caller builds prompts, a [`tools::ToolRegistry`] and a [`tools::TenantContext`].
//! 2. [`converse::converse`] sends the prompts and tool signatures to a
//!    [`model::ModelCapability`].
//! 3. The chosen call is validated against the tool schema and dispatched once.
//! 4. The handler writes to a [`store::PersistenceSink`]; the caller re-reads by key.
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`converse`] | Conversation orchestrator and its failure taxonomy |
//! | [`tools`] | Tool trait, descriptors, registry, dispatch |
//! | [`structured`] | Argument validation against JSON Schema |
//! | [`model`] | Model capability adapters (OpenAI-compatible, Anthropic, scripted) |
//! | [`store`] | Persistence sink and key conventions |
//! | [`newsletter`] | Newsletter tools and workflow steps |
//! | [`telemetry`] | Per-conversation dispatch events |
//! | [`config`] | YAML + environment configuration |
//! | [`transport`] | HTTP transport for remote models |
//! | [`types`] | Messages, tool signatures, tool calls |

pub mod config;
pub mod converse;
pub mod model;
pub mod newsletter;
pub mod store;
pub mod structured;
pub mod telemetry;
pub mod tools;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use config::AgentConfig;
pub use converse::{
    converse, ConversationRequest, ConverseError, ConverseOutcome, ConverseState, Converser,
    FailureKind,
};
pub use model::{ModelCapability, ModelRequest};
pub use store::{MemoryStore, PersistenceSink, Record, RowKey};
pub use tools::{
    dispatch, DispatchError, RegistryError, TenantContext, Tool, ToolDescriptor, ToolRegistry,
    ToolResult,
};
pub use types::{ModelOutput, ToolCall, ToolDefinition};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
