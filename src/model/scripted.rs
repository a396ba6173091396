use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::types::ModelOutput;
use crate::{Error, Result};

use super::{ModelCapability, ModelRequest};

enum Scripted {
    Output(ModelOutput),
    Failure(String),
}

/// Deterministic capability: pops one queued answer per request and records the request.
/// An empty queue answers with a prose decline.
#[derive(Default)]
pub struct ScriptedModel {
    queue: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(self, output: ModelOutput) -> Self {
        self.push_output(output);
        self
    }

    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.lock_queue().push_back(Scripted::Failure(message.into()));
        self
    }

    pub fn push_output(&self, output: ModelOutput) {
        self.lock_queue().push_back(Scripted::Output(output));
    }

    /// Requests seen so far, oldest first.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn remaining(&self) -> usize {
        self.lock_queue().len()
    }

    fn lock_queue(&self) -> std::sync::MutexGuard<'_, VecDeque<Scripted>> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ModelCapability for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn invoke(&self, request: &ModelRequest) -> Result<ModelOutput> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        match self.lock_queue().pop_front() {
            Some(Scripted::Output(output)) => Ok(output),
            Some(Scripted::Failure(message)) => Err(Error::model(message, false)),
            None => Ok(ModelOutput::text("No scripted answer left.")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_replays_in_order_and_records() {
        let model = ScriptedModel::new()
            .with_output(ModelOutput::tool_call("a", json!({})))
            .with_failure("timeout");
        let req = ModelRequest::new("m", "s", "u", Vec::new());

        assert_eq!(
            model.invoke(&req).await.unwrap(),
            ModelOutput::tool_call("a", json!({}))
        );
        assert!(model.invoke(&req).await.is_err());
        assert!(matches!(
            model.invoke(&req).await.unwrap(),
            ModelOutput::Text { .. }
        ));
        assert_eq!(model.requests().len(), 3);
        assert_eq!(model.remaining(), 0);
    }
}
