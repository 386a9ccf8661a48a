//! Database models for processed agent data records.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::{RecordId, UserId};

/// Database row for a stored processed agent reading.
///
/// A flat projection of the nested API payload: accelerometer and GPS
/// components are stored as individual columns.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ProcessedAgentDataRow {
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

/// Write-model for creating or fully replacing a record. The row id is never
/// part of this request; the store assigns and owns it.
#[derive(Debug, Clone)]
pub struct ProcessedAgentDataCreateDBRequest {
    pub road_state: String,
    pub user_id: UserId,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}
