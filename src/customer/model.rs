//! Customer data model: the single persisted entity of the call workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A prospective call recipient and the state of their script/call lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    /// Normalized international number, e.g. `+919876543210`.
    pub phone: String,
    pub email: Option<String>,
    pub conversation_history: Option<String>,
    pub topics: String,
    /// Set by script generation; overwritten on regeneration.
    pub sales_script: Option<String>,
    /// Provider-assigned id of the most recently placed call.
    pub call_id: Option<String>,
    pub transcript: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Build a fresh record from validated fields. No script or call data yet.
    pub fn new(fields: NewCustomer) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: fields.name,
            phone: fields.phone,
            email: fields.email,
            conversation_history: fields.conversation_history,
            topics: fields.topics,
            sales_script: None,
            call_id: None,
            transcript: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether a call may be placed for this customer.
    pub fn has_script(&self) -> bool {
        self.sales_script.is_some()
    }
}

/// Validated fields for creating a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub conversation_history: Option<String>,
    pub topics: String,
}

/// Partial update of the lifecycle fields. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerUpdate {
    pub sales_script: Option<String>,
    pub call_id: Option<String>,
    pub transcript: Option<String>,
}

impl CustomerUpdate {
    pub fn sales_script(script: impl Into<String>) -> Self {
        Self {
            sales_script: Some(script.into()),
            ..Default::default()
        }
    }

    pub fn call_id(call_id: impl Into<String>) -> Self {
        Self {
            call_id: Some(call_id.into()),
            ..Default::default()
        }
    }

    pub fn transcript(transcript: impl Into<String>) -> Self {
        Self {
            transcript: Some(transcript.into()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> NewCustomer {
        NewCustomer {
            name: "Alice".into(),
            phone: "+919876543210".into(),
            email: None,
            conversation_history: Some("Met at the expo".into()),
            topics: "renewal".into(),
        }
    }

    #[test]
    fn new_customer_has_no_lifecycle_fields() {
        let customer = Customer::new(fields());
        assert!(!customer.has_script());
        assert!(customer.call_id.is_none());
        assert!(customer.transcript.is_none());
        assert_eq!(customer.created_at, customer.updated_at);
    }

    #[test]
    fn serializes_camel_case() {
        let customer = Customer::new(fields());
        let json = serde_json::to_value(&customer).unwrap();
        assert_eq!(json["conversationHistory"], "Met at the expo");
        assert!(json["salesScript"].is_null());
        assert!(json["callId"].is_null());
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn update_constructors_set_one_field() {
        let update = CustomerUpdate::transcript("t");
        assert_eq!(update.transcript.as_deref(), Some("t"));
        assert!(update.sales_script.is_none());
        assert!(update.call_id.is_none());
    }
}
