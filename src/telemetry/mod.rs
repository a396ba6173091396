//! Dispatch telemetry: one event per conversation, reported to a pluggable sink.
//!
//! Collection is opt-in. [`Converser`](crate::converse::Converser) reports to
//! [`NoopDispatchSink`] unless a sink is supplied.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`DispatchEvent`] | Outcome, latency and correlation ids of one `converse` |
//! | [`DispatchSink`] | Trait for event destinations |
//! | [`NoopDispatchSink`] | Default sink, drops everything |
//! | [`InMemoryDispatchSink`] | Bounded in-memory sink for tests |

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

fn timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Outcome code reported for a completed conversation.
pub const OUTCOME_COMPLETED: &str = "completed";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchEvent {
    pub request_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    /// Tool the model selected, if it selected one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    /// `completed` or a failure code such as `invalid_arguments`.
    pub outcome: String,
    pub latency_ms: u64,
    pub timestamp: f64,
}

impl DispatchEvent {
    pub fn new(request_id: impl Into<String>, outcome: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            tenant_id: None,
            trace_id: None,
            tool: None,
            outcome: outcome.into(),
            latency_ms: 0,
            timestamp: timestamp(),
        }
    }

    pub fn with_tenant(mut self, tenant_id: Option<&str>) -> Self {
        self.tenant_id = tenant_id.map(str::to_string);
        self
    }

    pub fn with_trace_id(mut self, trace_id: Option<&str>) -> Self {
        self.trace_id = trace_id.map(str::to_string);
        self
    }

    pub fn with_tool(mut self, tool: Option<&str>) -> Self {
        self.tool = tool.map(str::to_string);
        self
    }

    pub fn with_latency(mut self, ms: u64) -> Self {
        self.latency_ms = ms;
        self
    }

    pub fn is_completed(&self) -> bool {
        self.outcome == OUTCOME_COMPLETED
    }
}

#[async_trait]
pub trait DispatchSink: Send + Sync {
    async fn report(&self, event: DispatchEvent) -> Result<()>;
}

pub struct NoopDispatchSink;

#[async_trait]
impl DispatchSink for NoopDispatchSink {
    async fn report(&self, _event: DispatchEvent) -> Result<()> {
        Ok(())
    }
}

pub fn noop_sink() -> Arc<dyn DispatchSink> {
    Arc::new(NoopDispatchSink)
}

/// Keeps the newest `max_events` events.
pub struct InMemoryDispatchSink {
    events: Arc<RwLock<VecDeque<DispatchEvent>>>,
    max_events: usize,
}

impl InMemoryDispatchSink {
    pub fn new(max: usize) -> Self {
        Self {
            events: Arc::new(RwLock::new(VecDeque::new())),
            max_events: max.max(1),
        }
    }

    pub fn events(&self) -> Vec<DispatchEvent> {
        self.events
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    pub fn events_for_tenant(&self, tenant_id: &str) -> Vec<DispatchEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.tenant_id.as_deref() == Some(tenant_id))
            .collect()
    }

    pub fn clear(&self) {
        self.events.write().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub fn len(&self) -> usize {
        self.events.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DispatchSink for InMemoryDispatchSink {
    async fn report(&self, event: DispatchEvent) -> Result<()> {
        let mut events = self.events.write().unwrap_or_else(|e| e.into_inner());
        events.push_back(event);
        while events.len() > self.max_events {
            events.pop_front();
        }
        Ok(())
    }
}
