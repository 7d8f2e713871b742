//! Customer lifecycle: capture, script generation, call initiation and
//! transcript retrieval.
//!
//! Each step is its own service so the HTTP layer can expose them one by
//! one; [`Workflow`] bundles them over a shared store and [`Wizard`] drives
//! them as the three-step client flow.

pub mod clock;
pub mod dialer;
pub mod poller;
pub mod script;
pub mod transcript;
pub mod wizard;

#[cfg(test)]
pub(crate) mod testing;

pub use clock::{Clock, ManualClock, SystemClock};
pub use dialer::CallInitiator;
pub use poller::{PollConfig, PollHandle, PollOutcome, spawn_transcript_poller};
pub use script::{ScriptGenerator, build_prompt};
pub use transcript::{TranscriptService, TranscriptSnapshot};
pub use wizard::{Wizard, WizardStep};

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::calls::{CallOptions, CallProvider};
use crate::customer::{Customer, CustomerForm};
use crate::error::WorkflowError;
use crate::llm::LlmProvider;
use crate::store::CustomerStore;

/// Fetch a customer or fail with `NotFound`.
pub(crate) async fn load_customer(
    store: &dyn CustomerStore,
    id: Uuid,
) -> Result<Customer, WorkflowError> {
    store.find_by_id(id).await?.ok_or(WorkflowError::NotFound(id))
}

/// All lifecycle services over one store.
pub struct Workflow {
    store: Arc<dyn CustomerStore>,
    scripts: ScriptGenerator,
    dialer: CallInitiator,
    transcripts: Arc<TranscriptService>,
    poll: PollConfig,
    clock: Arc<dyn Clock>,
}

impl Workflow {
    pub fn new(
        store: Arc<dyn CustomerStore>,
        llm: Arc<dyn LlmProvider>,
        calls: Arc<dyn CallProvider>,
        options: CallOptions,
        poll: PollConfig,
    ) -> Self {
        Self {
            scripts: ScriptGenerator::new(Arc::clone(&store), llm),
            dialer: CallInitiator::new(Arc::clone(&store), Arc::clone(&calls), options),
            transcripts: Arc::new(TranscriptService::new(Arc::clone(&store), calls)),
            store,
            poll,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used for poll deadlines.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validate a submitted form and store it as a new customer.
    ///
    /// Nothing is written when any field fails validation.
    pub async fn create_customer(&self, form: CustomerForm) -> Result<Customer, WorkflowError> {
        let fields = form.validate().map_err(|errors| {
            warn!(fields = %errors, "Customer form rejected");
            WorkflowError::Validation(errors)
        })?;

        let customer = self.store.create(fields).await?;
        info!(customer_id = %customer.id, "Customer created");
        Ok(customer)
    }

    pub async fn find_customer(&self, id: Uuid) -> Result<Customer, WorkflowError> {
        load_customer(self.store.as_ref(), id).await
    }

    pub async fn generate_script(&self, customer_id: Uuid) -> Result<String, WorkflowError> {
        self.scripts.generate(customer_id).await
    }

    pub async fn initiate_call(&self, customer_id: Uuid) -> Result<String, WorkflowError> {
        self.dialer.initiate(customer_id).await
    }

    pub async fn fetch_transcript(
        &self,
        customer_id: Uuid,
    ) -> Result<TranscriptSnapshot, WorkflowError> {
        self.transcripts.fetch(customer_id).await
    }

    /// Start a background poll of the customer's latest call.
    pub fn start_polling(&self, customer_id: Uuid) -> PollHandle {
        spawn_transcript_poller(
            Arc::clone(&self.transcripts),
            customer_id,
            self.poll,
            Arc::clone(&self.clock),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{StubCalls, StubLlm};
    use super::*;
    use crate::store::LibSqlBackend;

    async fn workflow() -> Workflow {
        let store = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        Workflow::new(
            store,
            Arc::new(StubLlm::replying("script")),
            Arc::new(StubCalls::new()),
            CallOptions::default(),
            PollConfig::default(),
        )
    }

    fn form() -> CustomerForm {
        CustomerForm {
            name: "  Alice ".into(),
            country_code: Some("+91".into()),
            phone: "98765 43210".into(),
            email: Some("alice@example.com".into()),
            conversation_history: None,
            topics: "renewal".into(),
        }
    }

    #[tokio::test]
    async fn create_customer_normalizes_and_stores() {
        let workflow = workflow().await;
        let customer = workflow.create_customer(form()).await.unwrap();

        assert_eq!(customer.name, "Alice");
        assert_eq!(customer.phone, "+919876543210");
        assert!(customer.sales_script.is_none());
        let found = workflow.find_customer(customer.id).await.unwrap();
        assert_eq!(found.id, customer.id);
        assert_eq!(found.email.as_deref(), Some("alice@example.com"));
    }

    #[tokio::test]
    async fn invalid_form_writes_nothing() {
        let workflow = workflow().await;
        let err = workflow
            .create_customer(CustomerForm {
                phone: "12345".into(),
                topics: String::new(),
                ..form()
            })
            .await
            .unwrap_err();

        match err {
            WorkflowError::Validation(errors) => {
                assert_eq!(
                    errors.get("phone"),
                    Some("Please enter a valid 10-digit phone number")
                );
                assert_eq!(errors.get("topics"), Some("Topics to discuss are required"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn find_missing_customer() {
        let workflow = workflow().await;
        let id = Uuid::new_v4();
        assert!(matches!(
            workflow.find_customer(id).await,
            Err(WorkflowError::NotFound(missing)) if missing == id
        ));
    }
}
