//! Scripted provider fakes (testing only)
//!
//! `ScriptedProvider` answers creation calls with a fixed response and
//! status probes from a queue, falling back to `"processing"` once the
//! queue is drained.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::provider::{
    PredictionData, PredictionEnvelope, ProviderClient, ProviderError, RawCreateResponse,
    RawStatusResponse,
};

/// Envelope with the given status and outputs.
pub fn status_envelope(status: &str, outputs: &[&str]) -> PredictionEnvelope {
    PredictionEnvelope {
        code: Some(200),
        message: Some("success".to_string()),
        data: Some(PredictionData {
            id: None,
            status: Some(status.to_string()),
            outputs: Some(outputs.iter().map(|s| s.to_string()).collect()),
        }),
    }
}

/// Creation envelope carrying only a task handle.
pub fn pending_envelope(task_id: &str) -> PredictionEnvelope {
    PredictionEnvelope {
        code: Some(200),
        message: Some("success".to_string()),
        data: Some(PredictionData {
            id: Some(task_id.to_string()),
            status: Some("created".to_string()),
            outputs: Some(Vec::new()),
        }),
    }
}

#[derive(Debug, Clone)]
enum CreateBehavior {
    Respond(Result<RawCreateResponse, ProviderError>),
    Panic(String),
}

/// Provider whose answers are scripted up front.
#[derive(Debug)]
pub struct ScriptedProvider {
    create: CreateBehavior,
    statuses: Mutex<VecDeque<Result<RawStatusResponse, ProviderError>>>,
    create_calls: Mutex<Vec<String>>,
    probes: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(create: Result<RawCreateResponse, ProviderError>) -> Self {
        Self::with_behavior(CreateBehavior::Respond(create))
    }

    /// Creation returns outputs immediately.
    pub fn immediate(image_url: &str) -> Self {
        Self::new(Ok(status_envelope("completed", &[image_url])))
    }

    /// Creation returns a task handle.
    pub fn pending(task_id: &str) -> Self {
        Self::new(Ok(pending_envelope(task_id)))
    }

    /// Creation panics with `message`.
    pub fn panicking(message: &str) -> Self {
        Self::with_behavior(CreateBehavior::Panic(message.to_string()))
    }

    fn with_behavior(create: CreateBehavior) -> Self {
        Self {
            create,
            statuses: Mutex::new(VecDeque::new()),
            create_calls: Mutex::new(Vec::new()),
            probes: Mutex::new(Vec::new()),
        }
    }

    /// Queue the next probe answer.
    pub fn then_status(self, response: Result<RawStatusResponse, ProviderError>) -> Self {
        self.statuses.lock().unwrap().push_back(response);
        self
    }

    /// Queue `n` copies of a probe answer.
    pub fn then_repeat(self, n: usize, response: Result<RawStatusResponse, ProviderError>) -> Self {
        {
            let mut statuses = self.statuses.lock().unwrap();
            for _ in 0..n {
                statuses.push_back(response.clone());
            }
        }
        self
    }

    pub fn create_calls(&self) -> Vec<String> {
        self.create_calls.lock().unwrap().clone()
    }

    /// Task ids probed so far, in order.
    pub fn probes(&self) -> Vec<String> {
        self.probes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProviderClient for ScriptedProvider {
    async fn create(&self, prompt: &str) -> Result<RawCreateResponse, ProviderError> {
        self.create_calls.lock().unwrap().push(prompt.to_string());
        match &self.create {
            CreateBehavior::Respond(r) => r.clone(),
            CreateBehavior::Panic(msg) => panic!("{}", msg),
        }
    }

    async fn check_status(&self, task_id: &str) -> Result<RawStatusResponse, ProviderError> {
        self.probes.lock().unwrap().push(task_id.to_string());
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(status_envelope("processing", &[])))
    }
}
