//! OpenAPI document assembly.

use utoipa::OpenApi;

use crate::api::handlers;
use crate::api::models::processed_agent_data::{
    Accelerometer, AgentData, Gps, ProcessedAgentData, ProcessedAgentDataResponse,
};

/// API documentation served at `/docs`. The WebSocket subscribe channel at
/// `/ws/{user_id}` is outside the OpenAPI surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "roadsense",
        description = "Ingestion and live fan-out service for processed road-state agent readings"
    ),
    paths(
        handlers::processed_agent_data::create_processed_agent_data,
        handlers::processed_agent_data::read_processed_agent_data,
        handlers::processed_agent_data::list_processed_agent_data,
        handlers::processed_agent_data::update_processed_agent_data,
        handlers::processed_agent_data::delete_processed_agent_data,
    ),
    components(schemas(
        Accelerometer,
        AgentData,
        Gps,
        ProcessedAgentData,
        ProcessedAgentDataResponse,
    )),
    tags(
        (name = "processed-agent-data", description = "Stored processed agent readings")
    )
)]
pub struct ApiDoc;
