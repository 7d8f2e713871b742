//! Call initiation: dial the customer with their stored script as the task.

use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use super::load_customer;
use crate::calls::{CallOptions, CallProvider, CallRequest};
use crate::customer::CustomerUpdate;
use crate::error::WorkflowError;
use crate::store::CustomerStore;

/// Places outbound calls for customers that have a script.
///
/// There is no idempotency key: every successful `initiate` places a new
/// call, and only the latest call id is kept on the record.
pub struct CallInitiator {
    store: Arc<dyn CustomerStore>,
    calls: Arc<dyn CallProvider>,
    options: CallOptions,
}

impl CallInitiator {
    pub fn new(
        store: Arc<dyn CustomerStore>,
        calls: Arc<dyn CallProvider>,
        options: CallOptions,
    ) -> Self {
        Self {
            store,
            calls,
            options,
        }
    }

    /// Place a call and record its id on the customer. Returns the call id.
    pub async fn initiate(&self, customer_id: Uuid) -> Result<String, WorkflowError> {
        let customer = load_customer(self.store.as_ref(), customer_id).await?;

        if !customer.has_script() {
            warn!(customer_id = %customer_id, "Call requested before a script exists");
            return Err(WorkflowError::PreconditionFailed(
                "No sales script available".to_string(),
            ));
        }

        let request = CallRequest {
            phone_number: customer.phone,
            task: customer.sales_script.unwrap_or_default(),
            options: self.options.clone(),
        };

        info!(
            customer_id = %customer_id,
            voice = %self.options.voice,
            max_duration = self.options.max_duration,
            "Initiating call"
        );

        let call_id = self.calls.place_call(&request).await.map_err(|e| {
            error!(customer_id = %customer_id, error = %e, "Call initiation failed");
            WorkflowError::CallInitiationFailed(e)
        })?;

        self.store
            .update(customer_id, CustomerUpdate::call_id(&call_id))
            .await
            .map_err(|e| {
                error!(
                    customer_id = %customer_id,
                    call_id = %call_id,
                    error = %e,
                    "Call placed but id not persisted"
                );
                WorkflowError::PersistedStateInconsistent {
                    customer_id,
                    stage: "call initiation",
                    value: call_id.clone(),
                    source: e,
                }
            })?;

        info!(customer_id = %customer_id, call_id = %call_id, "Call initiated");
        Ok(call_id)
    }
}
