//! Transcript retrieval: read a placed call back from the provider and keep
//! the customer's transcript current.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::load_customer;
use crate::calls::{CallProvider, CallStatus};
use crate::customer::CustomerUpdate;
use crate::error::WorkflowError;
use crate::store::CustomerStore;

/// What the last fetch saw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptSnapshot {
    pub call_id: String,
    pub status: CallStatus,
    pub transcript: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// One-shot transcript fetches for a customer's latest call.
pub struct TranscriptService {
    store: Arc<dyn CustomerStore>,
    calls: Arc<dyn CallProvider>,
}

impl TranscriptService {
    pub fn new(store: Arc<dyn CustomerStore>, calls: Arc<dyn CallProvider>) -> Self {
        Self { store, calls }
    }

    /// Fetch the call status and transcript, persisting a new transcript.
    pub async fn fetch(&self, customer_id: Uuid) -> Result<TranscriptSnapshot, WorkflowError> {
        let customer = load_customer(self.store.as_ref(), customer_id).await?;

        let Some(call_id) = customer.call_id else {
            return Err(WorkflowError::PreconditionFailed(
                "No call has been placed for this customer".to_string(),
            ));
        };

        let details = self.calls.get_call(&call_id).await.map_err(|e| {
            warn!(customer_id = %customer_id, call_id = %call_id, error = %e, "Transcript fetch failed");
            WorkflowError::Provider(e)
        })?;

        debug!(
            customer_id = %customer_id,
            call_id = %call_id,
            status = ?details.status,
            "Fetched call details"
        );

        let changed = match (&details.transcript, &customer.transcript) {
            (Some(new), Some(old)) => new != old,
            (Some(_), None) => true,
            _ => false,
        };
        if changed {
            if let Some(ref transcript) = details.transcript {
                self.store
                    .update(customer_id, CustomerUpdate::transcript(transcript))
                    .await?;
                info!(
                    customer_id = %customer_id,
                    transcript_len = transcript.len(),
                    "Transcript updated"
                );
            }
        }

        Ok(TranscriptSnapshot {
            call_id,
            status: details.status,
            transcript: details.transcript.or(customer.transcript),
            error_message: details.error_message,
        })
    }
}
