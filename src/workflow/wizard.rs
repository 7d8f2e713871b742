//! Three-step call wizard.
//!
//! Mirrors what the browser flow does: capture the customer and generate a
//! script, review it, then place the call and watch the transcript. Moving
//! back is purely local; nothing already written or dialed is undone.

use std::sync::Arc;

use tracing::{debug, warn};

use super::Workflow;
use super::poller::PollHandle;
use super::transcript::TranscriptSnapshot;
use crate::customer::{Customer, CustomerForm};
use crate::error::WorkflowError;

const SAVE_FAILED: &str = "Failed to save customer data";
const GENERATE_FAILED: &str = "Failed to generate sales script";
const CALL_FAILED: &str = "Failed to initiate call";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    AwaitingCustomerInfo,
    ScriptGenerated,
    CallInProgress,
}

impl WizardStep {
    pub fn number(self) -> u8 {
        match self {
            Self::AwaitingCustomerInfo => 1,
            Self::ScriptGenerated => 2,
            Self::CallInProgress => 3,
        }
    }
}

/// One client's pass through the flow.
pub struct Wizard {
    workflow: Arc<Workflow>,
    step: WizardStep,
    customer: Option<Customer>,
    script: Option<String>,
    call_id: Option<String>,
    poll: Option<PollHandle>,
    last_error: Option<String>,
}

impl Wizard {
    pub fn new(workflow: Arc<Workflow>) -> Self {
        Self {
            workflow,
            step: WizardStep::AwaitingCustomerInfo,
            customer: None,
            script: None,
            call_id: None,
            poll: None,
            last_error: None,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn customer(&self) -> Option<&Customer> {
        self.customer.as_ref()
    }

    pub fn script(&self) -> Option<&str> {
        self.script.as_deref()
    }

    pub fn call_id(&self) -> Option<&str> {
        self.call_id.as_deref()
    }

    /// Banner text for the most recent failure.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Latest transcript seen by the running poll.
    pub fn transcript(&self) -> Option<TranscriptSnapshot> {
        self.poll.as_ref().and_then(PollHandle::latest)
    }

    pub fn poll(&self) -> Option<&PollHandle> {
        self.poll.as_ref()
    }

    /// Create the customer, then generate their script.
    ///
    /// Every submit creates a new record, including a resubmit after going
    /// back. The step only advances when both requests succeed.
    pub async fn submit(&mut self, form: CustomerForm) -> Result<(), WorkflowError> {
        self.expect_step(WizardStep::AwaitingCustomerInfo)?;

        let customer = match self.workflow.create_customer(form).await {
            Ok(customer) => customer,
            Err(e) => {
                let banner = match &e {
                    WorkflowError::Validation(errors) => errors.to_string(),
                    _ => SAVE_FAILED.to_string(),
                };
                return Err(self.fail(banner, e));
            }
        };
        let customer_id = customer.id;
        self.customer = Some(customer);
        self.script = None;
        self.call_id = None;

        let script = match self.workflow.generate_script(customer_id).await {
            Ok(script) => script,
            Err(e) => return Err(self.fail(GENERATE_FAILED.to_string(), e)),
        };

        self.script = Some(script);
        self.last_error = None;
        self.advance(WizardStep::ScriptGenerated);
        Ok(())
    }

    /// Review done, move to the call step.
    pub fn proceed_to_call(&mut self) -> Result<(), WorkflowError> {
        self.expect_step(WizardStep::ScriptGenerated)?;
        self.advance(WizardStep::CallInProgress);
        Ok(())
    }

    /// Place the call and start polling for its transcript.
    ///
    /// A poll left over from an earlier call is cancelled first.
    pub async fn start_call(&mut self) -> Result<String, WorkflowError> {
        self.expect_step(WizardStep::CallInProgress)?;
        let customer_id = match &self.customer {
            Some(customer) => customer.id,
            None => {
                return Err(WorkflowError::PreconditionFailed(
                    "No customer has been captured".to_string(),
                ));
            }
        };

        self.stop_polling();

        let call_id = match self.workflow.initiate_call(customer_id).await {
            Ok(call_id) => call_id,
            Err(e) => return Err(self.fail(CALL_FAILED.to_string(), e)),
        };

        self.call_id = Some(call_id.clone());
        self.poll = Some(self.workflow.start_polling(customer_id));
        self.last_error = None;
        Ok(call_id)
    }

    /// Step back one screen. A no-op on the first step.
    pub fn back(&mut self) {
        match self.step {
            WizardStep::AwaitingCustomerInfo => {}
            WizardStep::ScriptGenerated => self.advance(WizardStep::AwaitingCustomerInfo),
            WizardStep::CallInProgress => {
                self.stop_polling();
                self.advance(WizardStep::ScriptGenerated);
            }
        }
    }

    fn stop_polling(&mut self) {
        if let Some(poll) = self.poll.take() {
            poll.cancel();
        }
    }

    fn advance(&mut self, to: WizardStep) {
        debug!(from = self.step.number(), to = to.number(), "Wizard step");
        self.step = to;
    }

    fn expect_step(&self, expected: WizardStep) -> Result<(), WorkflowError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(WorkflowError::PreconditionFailed(format!(
                "Wizard is on step {}, expected step {}",
                self.step.number(),
                expected.number()
            )))
        }
    }

    fn fail(&mut self, banner: String, error: WorkflowError) -> WorkflowError {
        warn!(step = self.step.number(), error = %error, "Wizard step failed");
        self.last_error = Some(banner);
        error
    }
}
