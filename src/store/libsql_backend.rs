//! libSQL backend: async `CustomerStore` implementation.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::customer::{Customer, CustomerUpdate, NewCustomer};
use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::CustomerStore;

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.init_schema().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.init_schema().await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

/// Convert `Option<&str>` to libsql Value.
fn opt_text(s: Option<&str>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s.to_string()),
        None => libsql::Value::Null,
    }
}

const CUSTOMER_COLUMNS: &str = "id, name, phone, email, conversation_history, topics, sales_script, call_id, transcript, created_at, updated_at";

/// Map a libsql Row to a Customer. Column order matches CUSTOMER_COLUMNS.
fn row_to_customer(row: &libsql::Row) -> Result<Customer, libsql::Error> {
    let id_str: String = row.get(0)?;
    let created_str: String = row.get(9)?;
    let updated_str: String = row.get(10)?;

    Ok(Customer {
        id: Uuid::parse_str(&id_str).unwrap_or_default(),
        name: row.get(1)?,
        phone: row.get(2)?,
        email: row.get(3).ok(),
        conversation_history: row.get(4).ok(),
        topics: row.get(5)?,
        sales_script: row.get(6).ok(),
        call_id: row.get(7).ok(),
        transcript: row.get(8).ok(),
        created_at: parse_datetime(&created_str),
        updated_at: parse_datetime(&updated_str),
    })
}

// ── Trait implementation ────────────────────────────────────────────

#[async_trait]
impl CustomerStore for LibSqlBackend {
    async fn init_schema(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    async fn create(&self, fields: NewCustomer) -> Result<Customer, DatabaseError> {
        let customer = Customer::new(fields);
        let conn = self.conn();
        conn.execute(
            "INSERT INTO customers (id, name, phone, email, conversation_history, topics,
                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                customer.id.to_string(),
                customer.name.as_str(),
                customer.phone.as_str(),
                opt_text(customer.email.as_deref()),
                opt_text(customer.conversation_history.as_deref()),
                customer.topics.as_str(),
                customer.created_at.to_rfc3339(),
                customer.updated_at.to_rfc3339(),
            ],
        )
        .await
        .map_err(|e| DatabaseError::Query(format!("create customer: {e}")))?;

        debug!(customer_id = %customer.id, "Customer inserted into DB");
        Ok(customer)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("find_by_id: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let customer = row_to_customer(&row)
                    .map_err(|e| DatabaseError::Query(format!("row parse: {e}")))?;
                Ok(Some(customer))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("find_by_id: {e}"))),
        }
    }

    async fn update(&self, id: Uuid, update: CustomerUpdate) -> Result<Customer, DatabaseError> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();
        let changed = conn
            .execute(
                "UPDATE customers SET
                    sales_script = COALESCE(?1, sales_script),
                    call_id = COALESCE(?2, call_id),
                    transcript = COALESCE(?3, transcript),
                    updated_at = ?4
                 WHERE id = ?5",
                params![
                    opt_text(update.sales_script.as_deref()),
                    opt_text(update.call_id.as_deref()),
                    opt_text(update.transcript.as_deref()),
                    now,
                    id.to_string(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("update customer: {e}")))?;

        if changed == 0 {
            return Err(DatabaseError::NotFound {
                entity: "customer".into(),
                id: id.to_string(),
            });
        }

        debug!(customer_id = %id, "Customer updated in DB");
        self.find_by_id(id).await?.ok_or_else(|| DatabaseError::NotFound {
            entity: "customer".into(),
            id: id.to_string(),
        })
    }
}
