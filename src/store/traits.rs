//! `CustomerStore` trait: async interface to the customer record store.

use async_trait::async_trait;
use uuid::Uuid;

use crate::customer::{Customer, CustomerUpdate, NewCustomer};
use crate::error::DatabaseError;

/// Backend-agnostic customer persistence.
///
/// Each method is a single-record read or write; the backend is expected to
/// make each one atomic on its own. Nothing spans calls.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Run all pending schema migrations.
    async fn init_schema(&self) -> Result<(), DatabaseError>;

    /// Insert a new customer and return the stored record.
    async fn create(&self, fields: NewCustomer) -> Result<Customer, DatabaseError>;

    /// Fetch a customer by id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, DatabaseError>;

    /// Apply a partial update and return the updated record.
    ///
    /// Fails with [`DatabaseError::NotFound`] if the customer does not exist.
    async fn update(&self, id: Uuid, update: CustomerUpdate) -> Result<Customer, DatabaseError>;
}
