//! Scripted adapter for pipeline tests. Records every request it receives.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{InferenceAdapter, InferenceFailure, OutputContract};

#[derive(Debug, Default)]
pub struct StubAdapter {
    replies: Mutex<VecDeque<Result<Value, String>>>,
    requests: Mutex<Vec<(String, &'static str)>>,
}

impl StubAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, value: Value) -> Self {
        self.replies.lock().unwrap().push_back(Ok(value));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<String> {
        self.requests.lock().unwrap().last().map(|(r, _)| r.clone())
    }

    pub fn contract_names(&self) -> Vec<&'static str> {
        self.requests.lock().unwrap().iter().map(|(_, c)| *c).collect()
    }
}

#[async_trait]
impl InferenceAdapter for StubAdapter {
    async fn infer(
        &self,
        request: &str,
        contract: &OutputContract,
    ) -> Result<Value, InferenceFailure> {
        self.requests
            .lock()
            .unwrap()
            .push((request.to_string(), contract.name));

        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(InferenceFailure(message)),
            None => Err(InferenceFailure("stub adapter has no scripted reply".to_string())),
        }
    }
}
