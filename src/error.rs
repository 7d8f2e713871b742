//! Error types for the sales caller.

use uuid::Uuid;

use crate::customer::validation::ValidationErrors;

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Call provider error: {0}")]
    Call(#[from] CallError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Migration failed: {0}")]
    Migration(String),
}

/// Generative-text provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },
}

/// Voice-call provider errors.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error("Request to {provider} failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("{provider} returned HTTP {status}: {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Errors surfaced by the customer lifecycle operations.
///
/// Each variant maps to one HTTP status and one generic message; the
/// wrapped provider/database detail is only ever logged.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Customer {0} not found")]
    NotFound(Uuid),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Script generation failed: {0}")]
    GenerationFailed(#[source] LlmError),

    #[error("Call initiation failed: {0}")]
    CallInitiationFailed(#[source] CallError),

    #[error("Provider error: {0}")]
    Provider(#[source] CallError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] DatabaseError),

    /// The provider call succeeded but its result could not be stored.
    /// `value` is the provider output (script text or call id) so the caller
    /// can retry only the persistence step.
    #[error("{stage} succeeded for customer {customer_id} but was not persisted: {source}")]
    PersistedStateInconsistent {
        customer_id: Uuid,
        stage: &'static str,
        value: String,
        #[source]
        source: DatabaseError,
    },
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
