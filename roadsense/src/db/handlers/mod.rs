//! Repository implementations for database access.
//!
//! Each repository wraps a SQLx connection or transaction, provides
//! strongly-typed operations over one table, and returns domain models from
//! [`crate::db::models`]. Transaction boundaries belong to the caller: begin
//! a transaction, construct the repository from it, and commit.

pub mod processed_agent_data;

pub use processed_agent_data::ProcessedAgentDataRecords;
