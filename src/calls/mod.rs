//! Voice-call integration: placing outbound calls and reading transcripts.

pub mod bland;
pub mod options;
pub mod provider;

pub use bland::BlandClient;
pub use options::{CallOptions, VoicemailAction};
pub use provider::{CallDetails, CallProvider, CallRequest, CallStatus};
