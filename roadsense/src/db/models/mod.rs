//! Database record structures matching table schemas.

pub mod processed_agent_data;
