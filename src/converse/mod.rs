//! Conversation orchestrator: one model exchange, at most one tool dispatch.
//!
//! ```text
//! Prepared -> AwaitingModel -> ToolSelected -> Validating -> Dispatching -> Completed
//!                   |                              |              |
//!                   +------------> Failed <--------+--------------+
//! ```
//!
//! Every failure is terminal and comes back inside [`ConverseOutcome`]; nothing here
//! retries. The orchestrator never touches the persistence sink: handlers write, callers
//! re-read.
//!
//! # Example
//!
//! ```
//! use newsletter_agent::converse::{converse, ConversationRequest, ConverseState};
//! use newsletter_agent::model::ScriptedModel;
//! use newsletter_agent::tools::{TenantContext, ToolRegistry};
//! use newsletter_agent::types::ModelOutput;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let model = Arc::new(ScriptedModel::new().with_output(ModelOutput::text("no thanks")));
//! let request = ConversationRequest::new(
//!     "gpt-4o-mini",
//!     "You draft social posts.",
//!     "Issue 198 is about Rust.",
//!     ToolRegistry::new(Vec::new()).unwrap(),
//!     TenantContext::new("t1"),
//! );
//! let outcome = converse(model, request).await;
//! assert_eq!(outcome.state, ConverseState::Failed);
//! # }
//! ```

mod error;

pub use error::{ConverseError, FailureKind};

use crate::config::ToolChoice;
use crate::model::{ModelCapability, ModelRequest};
use crate::telemetry::{noop_sink, DispatchEvent, DispatchSink, OUTCOME_COMPLETED};
use crate::tools::{prepare, TenantContext, ToolRegistry, ToolResult};
use crate::types::{ModelOutput, ToolCall};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConverseState {
    Prepared,
    AwaitingModel,
    ToolSelected,
    Validating,
    Dispatching,
    Completed,
    Failed,
}

/// Input of one conversation. The registry is this conversation's whole tool set.
#[derive(Debug, Clone)]
pub struct ConversationRequest {
    pub model_id: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub tools: ToolRegistry,
    pub context: TenantContext,
}

impl ConversationRequest {
    pub fn new(
        model_id: impl Into<String>,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
        tools: ToolRegistry,
        context: TenantContext,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            tools,
            context,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConverseOutcome {
    pub request_id: String,
    /// Terminal state: `Completed` or `Failed`.
    pub state: ConverseState,
    /// Every state visited, in order, ending with `state`.
    pub path: Vec<ConverseState>,
    /// Tool the model selected, if any.
    pub tool: Option<String>,
    /// Names of extra tool calls the model emitted that were not dispatched.
    pub dropped_calls: Vec<String>,
    pub outcome: Result<ToolResult, ConverseError>,
}

impl ConverseOutcome {
    pub fn is_completed(&self) -> bool {
        self.state == ConverseState::Completed
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.outcome.as_ref().err().map(ConverseError::kind)
    }

    pub fn error(&self) -> Option<&ConverseError> {
        self.outcome.as_ref().err()
    }

    /// Caller-facing result: the handler's own result when one exists, otherwise a
    /// `success: false` result carrying the failure message.
    pub fn to_tool_result(&self) -> ToolResult {
        match &self.outcome {
            Ok(result) => result.clone(),
            Err(ConverseError::HandlerFailure {
                result: Some(result),
                ..
            }) => result.clone(),
            Err(err) => ToolResult::failed(err.to_string()),
        }
    }
}

/// Runs conversations against one model capability.
pub struct Converser {
    model: Arc<dyn ModelCapability>,
    sink: Arc<dyn DispatchSink>,
    tool_choice: ToolChoice,
}

impl Converser {
    pub fn new(model: Arc<dyn ModelCapability>) -> Self {
        Self {
            model,
            sink: noop_sink(),
            tool_choice: ToolChoice::default(),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn DispatchSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = choice;
        self
    }

    pub async fn run(&self, request: ConversationRequest) -> ConverseOutcome {
        let started = Instant::now();
        let mut run = Run::new(&request);

        let outcome = self.drive(&request, &mut run).await;
        let outcome = run.finish(outcome);

        let event = DispatchEvent::new(
            &outcome.request_id,
            outcome
                .failure_kind()
                .map(|k| k.as_str())
                .unwrap_or(OUTCOME_COMPLETED),
        )
        .with_tenant(request.context.tenant_id())
        .with_trace_id(request.context.trace_id.as_deref())
        .with_tool(outcome.tool.as_deref())
        .with_latency(started.elapsed().as_millis() as u64);

        if let Err(e) = self.sink.report(event).await {
            debug!(request_id = %outcome.request_id, error = %e, "dispatch event dropped");
        }
        outcome
    }

    async fn drive(
        &self,
        request: &ConversationRequest,
        run: &mut Run,
    ) -> Result<ToolResult, ConverseError> {
        let ctx = &request.context;

        run.advance(ConverseState::AwaitingModel);
        let model_request = ModelRequest::new(
            request.model_id.clone(),
            request.system_prompt.clone(),
            request.user_prompt.clone(),
            request.tools.signatures(),
        )
        .with_tool_choice(self.tool_choice)
        .with_request_id(run.request_id.clone());

        let output = self.model.invoke(&model_request).await.map_err(|e| {
            warn!(
                request_id = %run.request_id,
                tenant_id = ?ctx.tenant_id(),
                adapter = self.model.name(),
                error = %e,
                "model invocation failed"
            );
            ConverseError::ModelError {
                message: e.to_string(),
            }
        })?;

        let call = select_call(output, run)?;
        run.tool = Some(call.name.clone());
        run.advance(ConverseState::ToolSelected);

        run.advance(ConverseState::Validating);
        let prepared = prepare(&request.tools, &call.name, &call.arguments, ctx)?;

        run.advance(ConverseState::Dispatching);
        let result = prepared.invoke(ctx).await?;
        if result.success {
            return Ok(result);
        }

        let message = result
            .error
            .clone()
            .unwrap_or_else(|| "handler reported failure".to_string());
        warn!(
            request_id = %run.request_id,
            tenant_id = ?ctx.tenant_id(),
            tool = %call.name,
            %message,
            "tool handler reported failure"
        );
        Err(ConverseError::HandlerFailure {
            tool: call.name,
            message,
            result: Some(result),
        })
    }
}

/// Pick the single call to dispatch. Prose is a decline; extra calls are dropped.
fn select_call(output: ModelOutput, run: &mut Run) -> Result<ToolCall, ConverseError> {
    match output {
        ModelOutput::Text { text } => {
            debug!(request_id = %run.request_id, "model answered without a tool call");
            Err(ConverseError::NoToolSelected { text })
        }
        ModelOutput::ToolCalls { calls } => {
            let mut calls = calls.into_iter();
            let Some(first) = calls.next() else {
                return Err(ConverseError::NoToolSelected {
                    text: String::new(),
                });
            };
            run.dropped = calls.map(|c| c.name).collect();
            if !run.dropped.is_empty() {
                warn!(
                    request_id = %run.request_id,
                    dispatched = %first.name,
                    dropped = ?run.dropped,
                    "model emitted several tool calls, dispatching only the first"
                );
            }
            Ok(first)
        }
    }
}

/// Bookkeeping for one in-flight conversation.
struct Run {
    request_id: String,
    tenant_id: Option<String>,
    path: Vec<ConverseState>,
    tool: Option<String>,
    dropped: Vec<String>,
}

impl Run {
    fn new(request: &ConversationRequest) -> Self {
        let request_id = uuid::Uuid::new_v4().to_string();
        debug!(
            request_id = %request_id,
            tenant_id = ?request.context.tenant_id(),
            trace_id = ?request.context.trace_id,
            tools = ?request.tools.names(),
            "conversation prepared"
        );
        Self {
            request_id,
            tenant_id: request.context.tenant_id().map(str::to_string),
            path: vec![ConverseState::Prepared],
            tool: None,
            dropped: Vec::new(),
        }
    }

    fn advance(&mut self, next: ConverseState) {
        debug!(request_id = %self.request_id, state = ?next, "conversation state");
        self.path.push(next);
    }

    fn finish(mut self, outcome: Result<ToolResult, ConverseError>) -> ConverseOutcome {
        let state = match &outcome {
            Ok(_) => ConverseState::Completed,
            Err(_) => ConverseState::Failed,
        };
        self.advance(state);

        match &outcome {
            Ok(_) => info!(
                request_id = %self.request_id,
                tenant_id = ?self.tenant_id,
                tool = ?self.tool,
                "conversation completed"
            ),
            Err(e) => info!(
                request_id = %self.request_id,
                tenant_id = ?self.tenant_id,
                tool = ?self.tool,
                failure = e.kind().as_str(),
                "conversation failed"
            ),
        }

        ConverseOutcome {
            request_id: self.request_id,
            state,
            path: self.path,
            tool: self.tool,
            dropped_calls: self.dropped,
            outcome,
        }
    }
}

/// Run one conversation with the default sink and tool choice.
pub async fn converse(
    model: Arc<dyn ModelCapability>,
    request: ConversationRequest,
) -> ConverseOutcome {
    Converser::new(model).run(request).await
}
