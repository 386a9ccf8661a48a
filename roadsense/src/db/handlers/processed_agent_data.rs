//! Database repository for processed agent data records.

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::errors::Result;
use crate::db::models::processed_agent_data::{ProcessedAgentDataCreateDBRequest, ProcessedAgentDataRow};
use crate::types::RecordId;

/// Repository for processed agent data operations.
///
/// Wraps a connection or transaction; the caller owns the transaction
/// boundary and commits or rolls back around each logical operation.
pub struct ProcessedAgentDataRecords<'c> {
    db: &'c mut PgConnection,
}

impl<'c> ProcessedAgentDataRecords<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Insert a new record, letting the store assign the id.
    #[instrument(skip(self, request), fields(user_id = request.user_id), err)]
    pub async fn create(&mut self, request: &ProcessedAgentDataCreateDBRequest) -> Result<ProcessedAgentDataRow> {
        let row = sqlx::query_as::<_, ProcessedAgentDataRow>(
            r#"
            INSERT INTO processed_agent_data (road_state, user_id, x, y, z, latitude, longitude, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&request.road_state)
        .bind(request.user_id)
        .bind(request.x)
        .bind(request.y)
        .bind(request.z)
        .bind(request.latitude)
        .bind(request.longitude)
        .bind(request.timestamp)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(row)
    }

    /// Get a record by id.
    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: RecordId) -> Result<Option<ProcessedAgentDataRow>> {
        let row = sqlx::query_as::<_, ProcessedAgentDataRow>(r#"SELECT * FROM processed_agent_data WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(row)
    }

    /// List all stored records. Ordered by id for determinism; callers must
    /// not rely on the ordering.
    #[instrument(skip(self), err)]
    pub async fn list(&mut self) -> Result<Vec<ProcessedAgentDataRow>> {
        let rows = sqlx::query_as::<_, ProcessedAgentDataRow>(r#"SELECT * FROM processed_agent_data ORDER BY id"#)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(rows)
    }

    /// Replace every field of the row matching `id` except the id itself.
    /// Returns `None` when no row matched.
    #[instrument(skip(self, request), fields(user_id = request.user_id), err)]
    pub async fn update(
        &mut self,
        id: RecordId,
        request: &ProcessedAgentDataCreateDBRequest,
    ) -> Result<Option<ProcessedAgentDataRow>> {
        let row = sqlx::query_as::<_, ProcessedAgentDataRow>(
            r#"
            UPDATE processed_agent_data
            SET
                road_state = $2,
                user_id = $3,
                x = $4,
                y = $5,
                z = $6,
                latitude = $7,
                longitude = $8,
                timestamp = $9
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.road_state)
        .bind(request.user_id)
        .bind(request.x)
        .bind(request.y)
        .bind(request.z)
        .bind(request.latitude)
        .bind(request.longitude)
        .bind(request.timestamp)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(row)
    }

    /// Delete the row matching `id`, returning it as it existed immediately
    /// before deletion. Returns `None` when no row matched.
    #[instrument(skip(self), err)]
    pub async fn delete(&mut self, id: RecordId) -> Result<Option<ProcessedAgentDataRow>> {
        let row = sqlx::query_as::<_, ProcessedAgentDataRow>(
            r#"
            DELETE FROM processed_agent_data
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(row)
    }
}
