//! HTTP handlers for processed agent data endpoints.

use axum::{
    extract::{Path, State},
    response::Json,
};
use tracing::{debug, instrument};

use crate::{
    AppState,
    api::models::processed_agent_data::{ProcessedAgentData, ProcessedAgentDataResponse, RecordPathParams},
    db::handlers::ProcessedAgentDataRecords,
    db::models::processed_agent_data::ProcessedAgentDataCreateDBRequest,
    errors::{Error, Result},
};

/// Create a batch of processed agent data records.
///
/// Items are committed independently, in order: each item gets its own
/// transaction, and the stored record is broadcast to subscribers of its user
/// id only after that transaction commits. The first failing item aborts the
/// batch; previously committed items stay committed and the failure is
/// surfaced to the caller.
#[utoipa::path(
    post,
    path = "/processed_agent_data/",
    tag = "processed-agent-data",
    summary = "Create records",
    description = "Validate and store a batch of processed agent data readings, fanning each stored record out to live subscribers of its user id.",
    request_body = Vec<ProcessedAgentData>,
    responses(
        (status = 200, description = "Records created", body = [ProcessedAgentDataResponse]),
        (status = 400, description = "Validation failed"),
        (status = 500, description = "Internal server error"),
    )
)]
#[instrument(skip_all, fields(items = payload.len()))]
pub async fn create_processed_agent_data(
    State(state): State<AppState>,
    Json(payload): Json<Vec<ProcessedAgentData>>,
) -> Result<Json<Vec<ProcessedAgentDataResponse>>> {
    let mut created = Vec::with_capacity(payload.len());

    for (index, item) in payload.iter().enumerate() {
        item.validate().map_err(|err| err.at_index(index))?;

        let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
        let mut repo = ProcessedAgentDataRecords::new(&mut tx);
        let row = repo.create(&ProcessedAgentDataCreateDBRequest::from(item)).await?;
        tx.commit().await.map_err(|e| Error::Database(e.into()))?;

        // Commit happens-before broadcast: subscribers never observe a record
        // that is not durably stored. Delivery itself is best-effort.
        let record = ProcessedAgentDataResponse::from(row);
        let delivered = state.subscriptions.broadcast(record.user_id, &record);
        debug!(record_id = record.id, user_id = record.user_id, delivered, "record stored and broadcast");

        created.push(record);
    }

    Ok(Json(created))
}

/// Get a record by id.
#[utoipa::path(
    get,
    path = "/processed_agent_data/{id}",
    tag = "processed-agent-data",
    summary = "Get record",
    params(("id" = i32, Path, description = "Record id")),
    responses(
        (status = 200, description = "Record details", body = ProcessedAgentDataResponse),
        (status = 404, description = "Record not found"),
        (status = 500, description = "Internal server error"),
    )
)]
#[instrument(skip_all, fields(id = params.id))]
pub async fn read_processed_agent_data(
    State(state): State<AppState>,
    Path(params): Path<RecordPathParams>,
) -> Result<Json<ProcessedAgentDataResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ProcessedAgentDataRecords::new(&mut conn);

    let row = repo.get_by_id(params.id).await?.ok_or(Error::NotFound {
        resource: "ProcessedAgentData",
        id: params.id,
    })?;

    Ok(Json(row.into()))
}

/// List all records.
#[utoipa::path(
    get,
    path = "/processed_agent_data/",
    tag = "processed-agent-data",
    summary = "List records",
    responses(
        (status = 200, description = "All stored records", body = [ProcessedAgentDataResponse]),
        (status = 500, description = "Internal server error"),
    )
)]
#[instrument(skip_all)]
pub async fn list_processed_agent_data(State(state): State<AppState>) -> Result<Json<Vec<ProcessedAgentDataResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ProcessedAgentDataRecords::new(&mut conn);

    let rows = repo.list().await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// Replace a record.
#[utoipa::path(
    put,
    path = "/processed_agent_data/{id}",
    tag = "processed-agent-data",
    summary = "Update record",
    description = "Replace every field of the record except its id.",
    params(("id" = i32, Path, description = "Record id")),
    request_body = ProcessedAgentData,
    responses(
        (status = 200, description = "Post-update record", body = ProcessedAgentDataResponse),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Record not found"),
        (status = 500, description = "Internal server error"),
    )
)]
#[instrument(skip_all, fields(id = params.id))]
pub async fn update_processed_agent_data(
    State(state): State<AppState>,
    Path(params): Path<RecordPathParams>,
    Json(payload): Json<ProcessedAgentData>,
) -> Result<Json<ProcessedAgentDataResponse>> {
    payload.validate()?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ProcessedAgentDataRecords::new(&mut tx);

    let row = repo
        .update(params.id, &ProcessedAgentDataCreateDBRequest::from(&payload))
        .await?
        .ok_or(Error::NotFound {
            resource: "ProcessedAgentData",
            id: params.id,
        })?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(row.into()))
}

/// Delete a record, returning it as it existed immediately before deletion.
#[utoipa::path(
    delete,
    path = "/processed_agent_data/{id}",
    tag = "processed-agent-data",
    summary = "Delete record",
    params(("id" = i32, Path, description = "Record id")),
    responses(
        (status = 200, description = "The deleted record", body = ProcessedAgentDataResponse),
        (status = 404, description = "Record not found"),
        (status = 500, description = "Internal server error"),
    )
)]
#[instrument(skip_all, fields(id = params.id))]
pub async fn delete_processed_agent_data(
    State(state): State<AppState>,
    Path(params): Path<RecordPathParams>,
) -> Result<Json<ProcessedAgentDataResponse>> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ProcessedAgentDataRecords::new(&mut tx);

    let row = repo.delete(params.id).await?.ok_or(Error::NotFound {
        resource: "ProcessedAgentData",
        id: params.id,
    })?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(row.into()))
}

#[cfg(test)]
mod tests {
    use crate::api::models::processed_agent_data::ProcessedAgentDataResponse;
    use crate::test_utils::{create_test_server, sample_payload};
    use axum::http::StatusCode;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn create_then_read_round_trips(pool: PgPool) {
        let (server, _state) = create_test_server(pool).await;

        let response = server
            .post("/processed_agent_data/")
            .json(&serde_json::json!([sample_payload(42, "normal")]))
            .await;
        response.assert_status(StatusCode::OK);
        let created: Vec<ProcessedAgentDataResponse> = response.json();
        assert_eq!(created.len(), 1);

        // Concrete scenario: first record in a fresh store gets id 1 and all
        // fields are preserved.
        let record = &created[0];
        assert_eq!(record.id, 1);
        assert_eq!(record.road_state, "normal");
        assert_eq!(record.user_id, 42);
        assert_eq!(record.x, 0.1);
        assert_eq!(record.y, 0.2);
        assert_eq!(record.z, 9.8);
        assert_eq!(record.latitude, 50.45);
        assert_eq!(record.longitude, 30.52);

        let response = server.get("/processed_agent_data/1").await;
        response.assert_status(StatusCode::OK);
        let fetched: ProcessedAgentDataResponse = response.json();
        assert_eq!(&fetched, record);
    }

    #[sqlx::test]
    async fn create_accepts_a_batch_and_assigns_distinct_ids(pool: PgPool) {
        let (server, _state) = create_test_server(pool).await;

        let response = server
            .post("/processed_agent_data/")
            .json(&serde_json::json!([
                sample_payload(1, "normal"),
                sample_payload(2, "bumpy"),
                sample_payload(1, "pothole"),
            ]))
            .await;
        response.assert_status(StatusCode::OK);
        let created: Vec<ProcessedAgentDataResponse> = response.json();
        assert_eq!(created.len(), 3);
        assert_eq!(created[0].id, 1);
        assert_eq!(created[1].id, 2);
        assert_eq!(created[2].id, 3);

        let response = server.get("/processed_agent_data/").await;
        response.assert_status(StatusCode::OK);
        let listed: Vec<ProcessedAgentDataResponse> = response.json();
        assert_eq!(listed.len(), 3);
    }

    #[sqlx::test]
    async fn create_rejects_empty_road_state_and_writes_nothing(pool: PgPool) {
        let (server, _state) = create_test_server(pool).await;

        let response = server
            .post("/processed_agent_data/")
            .json(&serde_json::json!([sample_payload(1, "")]))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(response.text().contains("road_state"));

        let response = server.get("/processed_agent_data/").await;
        let listed: Vec<ProcessedAgentDataResponse> = response.json();
        assert!(listed.is_empty(), "rejected payload must not be persisted");
    }

    #[sqlx::test]
    async fn create_reports_the_failing_batch_index(pool: PgPool) {
        let (server, _state) = create_test_server(pool).await;

        let response = server
            .post("/processed_agent_data/")
            .json(&serde_json::json!([sample_payload(1, "normal"), sample_payload(1, "")]))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(response.text().contains("[1].road_state"));

        // Items are committed independently: the valid first item survives.
        let response = server.get("/processed_agent_data/").await;
        let listed: Vec<ProcessedAgentDataResponse> = response.json();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].road_state, "normal");
    }

    #[sqlx::test]
    async fn create_rejects_malformed_numbers_at_the_boundary(pool: PgPool) {
        let (server, _state) = create_test_server(pool).await;

        let mut item = sample_payload(1, "normal");
        item["agent_data"]["accelerometer"]["x"] = serde_json::json!("not-a-number");
        let response = server.post("/processed_agent_data/").json(&serde_json::json!([item])).await;
        assert!(
            response.status_code().is_client_error(),
            "malformed payload should be a client error, got {}",
            response.status_code()
        );

        let response = server.get("/processed_agent_data/").await;
        let listed: Vec<ProcessedAgentDataResponse> = response.json();
        assert!(listed.is_empty());
    }

    #[sqlx::test]
    async fn update_is_idempotent_and_replaces_all_fields(pool: PgPool) {
        let (server, _state) = create_test_server(pool).await;

        server
            .post("/processed_agent_data/")
            .json(&serde_json::json!([sample_payload(1, "normal")]))
            .await
            .assert_status(StatusCode::OK);

        let mut replacement = sample_payload(9, "bumpy");
        replacement["agent_data"]["gps"]["latitude"] = serde_json::json!(48.45);

        let first = server.put("/processed_agent_data/1").json(&replacement).await;
        first.assert_status(StatusCode::OK);
        let first: ProcessedAgentDataResponse = first.json();

        let second = server.put("/processed_agent_data/1").json(&replacement).await;
        second.assert_status(StatusCode::OK);
        let second: ProcessedAgentDataResponse = second.json();

        assert_eq!(first, second);
        assert_eq!(first.id, 1);
        assert_eq!(first.user_id, 9);
        assert_eq!(first.road_state, "bumpy");
        assert_eq!(first.latitude, 48.45);
    }

    #[sqlx::test]
    async fn delete_returns_the_record_and_makes_it_unreachable(pool: PgPool) {
        let (server, _state) = create_test_server(pool).await;

        server
            .post("/processed_agent_data/")
            .json(&serde_json::json!([sample_payload(3, "pothole")]))
            .await
            .assert_status(StatusCode::OK);

        let response = server.delete("/processed_agent_data/1").await;
        response.assert_status(StatusCode::OK);
        let deleted: ProcessedAgentDataResponse = response.json();
        assert_eq!(deleted.id, 1);
        assert_eq!(deleted.road_state, "pothole");

        server.get("/processed_agent_data/1").await.assert_status(StatusCode::NOT_FOUND);
        server.delete("/processed_agent_data/1").await.assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    async fn read_update_delete_on_missing_ids_return_404(pool: PgPool) {
        let (server, _state) = create_test_server(pool).await;

        server.get("/processed_agent_data/123").await.assert_status(StatusCode::NOT_FOUND);
        server
            .put("/processed_agent_data/123")
            .json(&sample_payload(1, "normal"))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .delete("/processed_agent_data/123")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
