//! Script generation: prompt an LLM with the customer's context and store
//! the resulting sales script on their record.

use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use super::load_customer;
use crate::customer::{Customer, CustomerUpdate};
use crate::error::WorkflowError;
use crate::llm::LlmProvider;
use crate::store::CustomerStore;

/// Build the script-writing prompt for a customer.
///
/// Name, history and topics are substituted verbatim; a missing history
/// renders as an empty line.
pub fn build_prompt(customer: &Customer) -> String {
    format!(
        "Create a sales script for a call with {name}.\n\
         Previous conversation history: {history}\n\
         Topics to discuss: {topics}\n\
         \n\
         Please create a natural, conversational script that:\n\
         1. Introduces the sales representative\n\
         2. Acknowledges any previous conversations\n\
         3. Addresses the topics to discuss\n\
         4. Maintains a professional yet friendly tone\n\
         5. Includes key points to cover\n\
         6. Has a clear call to action",
        name = customer.name,
        history = customer.conversation_history.as_deref().unwrap_or_default(),
        topics = customer.topics,
    )
}

/// Generates and persists sales scripts.
pub struct ScriptGenerator {
    store: Arc<dyn CustomerStore>,
    llm: Arc<dyn LlmProvider>,
}

impl ScriptGenerator {
    pub fn new(store: Arc<dyn CustomerStore>, llm: Arc<dyn LlmProvider>) -> Self {
        Self { store, llm }
    }

    /// Generate a script for `customer_id`, overwrite it onto the record and
    /// return it.
    ///
    /// The LLM is not called when the customer does not exist. If the LLM
    /// succeeds but the write fails, the error carries the script so the
    /// caller can retry with [`ScriptGenerator::persist_script`].
    pub async fn generate(&self, customer_id: Uuid) -> Result<String, WorkflowError> {
        let customer = load_customer(self.store.as_ref(), customer_id).await?;
        let prompt = build_prompt(&customer);

        info!(
            customer_id = %customer_id,
            model = self.llm.model_name(),
            "Generating sales script"
        );

        let script = self.llm.complete(&prompt).await.map_err(|e| {
            error!(customer_id = %customer_id, error = %e, "Script generation failed");
            WorkflowError::GenerationFailed(e)
        })?;

        self.persist_script(customer_id, &script).await?;

        info!(
            customer_id = %customer_id,
            script_len = script.len(),
            "Sales script generated"
        );
        Ok(script)
    }

    /// Store an already generated script.
    pub async fn persist_script(
        &self,
        customer_id: Uuid,
        script: &str,
    ) -> Result<Customer, WorkflowError> {
        self.store
            .update(customer_id, CustomerUpdate::sales_script(script))
            .await
            .map_err(|e| {
                error!(customer_id = %customer_id, error = %e, "Generated script not persisted");
                WorkflowError::PersistedStateInconsistent {
                    customer_id,
                    stage: "script generation",
                    value: script.to_string(),
                    source: e,
                }
            })
    }
}
