//! In-memory model doubles for tests.

use super::{CompletionModel, CompletionParams};
use crate::error::ModelError;
use async_trait::async_trait;
use std::sync::Mutex;

type Responder = dyn Fn(&str) -> Result<String, ModelError> + Send + Sync;

/// A model whose replies are computed from the prompt by a closure.
///
/// Every prompt is recorded so tests can assert on call count and order.
pub struct ScriptedModel {
    responder: Box<Responder>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Result<String, ModelError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A model that always replies with the same text.
    pub fn constant(reply: &str) -> Self {
        let reply = reply.to_string();
        Self::new(move |_| Ok(reply.clone()))
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionModel for ScriptedModel {
    async fn complete(&self, prompt: &str, _params: &CompletionParams) -> Result<String, ModelError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        (self.responder)(prompt)
    }
}

pub fn params() -> CompletionParams {
    CompletionParams {
        model: "test-model".to_string(),
        temperature: 0.3,
    }
}
