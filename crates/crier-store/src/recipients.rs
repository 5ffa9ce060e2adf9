use async_trait::async_trait;
use chrono::Utc;
use tracing::instrument;

use crier_core::delivery::RecipientSource;
use crier_core::errors::SourceError;
use crier_core::ids::RecipientId;

use crate::database::Database;
use crate::error::StoreError;

/// Persistent recipient roster. Rows are append-only from this
/// subsystem's point of view; registration is idempotent.
pub struct RecipientRepo {
    db: Database,
}

impl RecipientRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Register a recipient. Returns true if the row was newly added.
    #[instrument(skip(self), fields(recipient = %id))]
    pub fn register(&self, id: &RecipientId) -> Result<bool, StoreError> {
        let now = Utc::now().to_rfc3339();
        self.db.with_conn(|conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO recipients (id, registered_at) VALUES (?1, ?2)",
                rusqlite::params![id.as_str(), now],
            )?;
            Ok(changed > 0)
        })
    }

    /// List the full roster in registration order.
    pub fn list(&self) -> Result<Vec<RecipientId>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id FROM recipients ORDER BY rowid")?;
            let rows = stmt
                .query_map([], |row| {
                    let raw: String = row.get(0)?;
                    Ok(RecipientId::from_raw(raw))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        self.db.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM recipients", [], |row| row.get(0))?;
            Ok(n as usize)
        })
    }
}

#[async_trait]
impl RecipientSource for RecipientRepo {
    async fn list_recipients(&self) -> Result<Vec<RecipientId>, SourceError> {
        self.list().map_err(|e| SourceError(e.to_string()))
    }
}
