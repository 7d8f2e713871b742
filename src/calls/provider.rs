//! `CallProvider` trait and the request/response types it speaks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::options::CallOptions;
use crate::error::CallError;

/// One outbound call placement.
#[derive(Debug, Clone, Serialize)]
pub struct CallRequest {
    /// Destination in international format.
    pub phone_number: String,
    /// What the call agent should say and do.
    pub task: String,
    #[serde(flatten)]
    pub options: CallOptions,
}

/// Lifecycle of a placed call as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Queued,
    InProgress,
    Completed,
    Failed,
}

impl CallStatus {
    /// No further transcript updates will arrive.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Snapshot of a call fetched from the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallDetails {
    pub call_id: String,
    pub status: CallStatus,
    /// Full transcript so far, `None` until the provider has one.
    pub transcript: Option<String>,
    pub error_message: Option<String>,
}

/// A third-party service that dials phone numbers.
#[async_trait]
pub trait CallProvider: Send + Sync {
    /// Place a call and return the provider's call id.
    async fn place_call(&self, request: &CallRequest) -> Result<String, CallError>;

    /// Fetch the current status and transcript of a call.
    async fn get_call(&self, call_id: &str) -> Result<CallDetails, CallError>;
}
