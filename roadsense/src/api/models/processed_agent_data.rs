//! API request and response models for processed agent data endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::processed_agent_data::{ProcessedAgentDataCreateDBRequest, ProcessedAgentDataRow};
use crate::errors::Error;
use crate::types::{RecordId, UserId};

/// 3-axis accelerometer reading.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Accelerometer {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// GPS coordinate.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Gps {
    pub latitude: f64,
    pub longitude: f64,
}

/// Raw sensor data captured by an agent, tied to a user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AgentData {
    pub user_id: UserId,
    pub accelerometer: Accelerometer,
    pub gps: Gps,
    pub timestamp: DateTime<Utc>,
}

/// A sensor reading with its road-state classification, as submitted by a
/// client. Never mutated after validation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProcessedAgentData {
    /// Free-form classification label, e.g. "normal" or "pothole"
    pub road_state: String,
    pub agent_data: AgentData,
}

impl ProcessedAgentData {
    /// Enforce field constraints that serde cannot express, reporting the
    /// offending field path. Runs before any persistence attempt.
    ///
    /// `user_id` being an integer and `timestamp` being a valid datetime are
    /// already guaranteed at the deserialization boundary; JSON cannot carry
    /// non-finite numbers, but the finiteness checks keep the contract
    /// independent of the transport.
    pub fn validate(&self) -> Result<(), Error> {
        if self.road_state.is_empty() {
            return Err(validation_error("road_state", "must be a non-empty string"));
        }

        let finite_fields = [
            ("agent_data.accelerometer.x", self.agent_data.accelerometer.x),
            ("agent_data.accelerometer.y", self.agent_data.accelerometer.y),
            ("agent_data.accelerometer.z", self.agent_data.accelerometer.z),
            ("agent_data.gps.latitude", self.agent_data.gps.latitude),
            ("agent_data.gps.longitude", self.agent_data.gps.longitude),
        ];
        for (field, value) in finite_fields {
            if !value.is_finite() {
                return Err(validation_error(field, "must be a finite number"));
            }
        }

        Ok(())
    }
}

fn validation_error(field: &str, message: &str) -> Error {
    Error::Validation {
        field: field.to_string(),
        message: message.to_string(),
    }
}

/// A stored record: the flattened projection of [`ProcessedAgentData`] plus
/// the store-assigned id. This is also the payload pushed to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProcessedAgentDataResponse {
    pub id: RecordId,
    pub road_state: String,
    pub user_id: UserId,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

impl From<ProcessedAgentDataRow> for ProcessedAgentDataResponse {
    fn from(row: ProcessedAgentDataRow) -> Self {
        Self {
            id: row.id,
            road_state: row.road_state,
            user_id: row.user_id,
            x: row.x,
            y: row.y,
            z: row.z,
            latitude: row.latitude,
            longitude: row.longitude,
            timestamp: row.timestamp,
        }
    }
}

impl From<&ProcessedAgentData> for ProcessedAgentDataCreateDBRequest {
    fn from(data: &ProcessedAgentData) -> Self {
        Self {
            road_state: data.road_state.clone(),
            user_id: data.agent_data.user_id,
            x: data.agent_data.accelerometer.x,
            y: data.agent_data.accelerometer.y,
            z: data.agent_data.accelerometer.z,
            latitude: data.agent_data.gps.latitude,
            longitude: data.agent_data.gps.longitude,
            timestamp: data.agent_data.timestamp,
        }
    }
}

/// Path parameters for record endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordPathParams {
    pub id: RecordId,
}

/// Path parameters for the subscribe endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscribePathParams {
    pub user_id: UserId,
}
