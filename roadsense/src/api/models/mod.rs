//! Request/response data structures for API communication.

pub mod processed_agent_data;
