//! Test doubles for the workflow services.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use uuid::Uuid;

use crate::calls::{CallDetails, CallProvider, CallRequest, CallStatus};
use crate::customer::{Customer, CustomerUpdate, NewCustomer};
use crate::error::{CallError, DatabaseError, LlmError};
use crate::llm::LlmProvider;
use crate::store::{CustomerStore, LibSqlBackend};

/// LLM that echoes a canned script and records every prompt.
pub struct StubLlm {
    pub response: Option<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl StubLlm {
    pub fn replying(response: &str) -> Self {
        Self {
            response: Some(response.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for StubLlm {
    fn model_name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.response.clone().ok_or_else(|| LlmError::RequestFailed {
            provider: "stub".into(),
            reason: "boom".into(),
        })
    }
}

/// Call provider that hands out sequential ids and replays scripted statuses.
pub struct StubCalls {
    pub fail_place: bool,
    pub fail_get: bool,
    pub requests: Mutex<Vec<CallRequest>>,
    pub statuses: Mutex<VecDeque<(CallStatus, Option<String>)>>,
    pub gets: AtomicUsize,
    pub counter: AtomicUsize,
}

impl StubCalls {
    pub fn new() -> Self {
        Self {
            fail_place: false,
            fail_get: false,
            requests: Mutex::new(Vec::new()),
            statuses: Mutex::new(VecDeque::new()),
            gets: AtomicUsize::new(0),
            counter: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_place: true,
            ..Self::new()
        }
    }

    /// Each `get_call` pops the next status; the last one repeats.
    pub fn with_statuses(statuses: Vec<(CallStatus, Option<&str>)>) -> Self {
        let stub = Self::new();
        *stub.statuses.lock().unwrap() = statuses
            .into_iter()
            .map(|(s, t)| (s, t.map(str::to_string)))
            .collect();
        stub
    }

    pub fn placed(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CallProvider for StubCalls {
    async fn place_call(&self, request: &CallRequest) -> Result<String, CallError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail_place {
            return Err(CallError::Status {
                provider: "stub".into(),
                status: 500,
                body: "down".into(),
            });
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("call-{n}"))
    }

    async fn get_call(&self, call_id: &str) -> Result<CallDetails, CallError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_get {
            return Err(CallError::RequestFailed {
                provider: "stub".into(),
                reason: "timeout".into(),
            });
        }
        let mut statuses = self.statuses.lock().unwrap();
        let (status, transcript) = if statuses.len() > 1 {
            statuses.pop_front().unwrap()
        } else {
            statuses
                .front()
                .cloned()
                .unwrap_or((CallStatus::InProgress, None))
        };
        Ok(CallDetails {
            call_id: call_id.to_string(),
            status,
            transcript,
            error_message: (status == CallStatus::Failed).then(|| "busy".to_string()),
        })
    }
}

/// Call provider whose `get_call` never returns.
#[derive(Default)]
pub struct StallingCalls {
    pub gets: AtomicUsize,
}

#[async_trait]
impl CallProvider for StallingCalls {
    async fn place_call(&self, _request: &CallRequest) -> Result<String, CallError> {
        Ok("call-1".to_string())
    }

    async fn get_call(&self, _call_id: &str) -> Result<CallDetails, CallError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}

/// Real in-memory store whose `update` always fails.
pub struct ReadOnlyStore {
    pub inner: LibSqlBackend,
}

impl ReadOnlyStore {
    pub async fn new() -> Self {
        Self {
            inner: LibSqlBackend::new_memory().await.unwrap(),
        }
    }
}

#[async_trait]
impl CustomerStore for ReadOnlyStore {
    async fn init_schema(&self) -> Result<(), DatabaseError> {
        self.inner.init_schema().await
    }

    async fn create(&self, fields: NewCustomer) -> Result<Customer, DatabaseError> {
        self.inner.create(fields).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, DatabaseError> {
        self.inner.find_by_id(id).await
    }

    async fn update(&self, _id: Uuid, _update: CustomerUpdate) -> Result<Customer, DatabaseError> {
        Err(DatabaseError::Query("disk I/O error".into()))
    }
}

pub fn alice() -> NewCustomer {
    NewCustomer {
        name: "Alice".into(),
        phone: "+919876543210".into(),
        email: None,
        conversation_history: Some("Asked about annual pricing last week".into()),
        topics: "renewal".into(),
    }
}
