//! Common type definitions.
//!
//! All entity identifiers are 32-bit integers assigned by PostgreSQL
//! (`SERIAL` for record ids; user ids arrive from agents as-is and are
//! treated as opaque grouping keys).

/// Identifier of a stored processed agent data record.
pub type RecordId = i32;

/// Identifier of the user an agent reading belongs to.
///
/// Not a foreign key: the service never resolves it against a user table,
/// it only routes subscription fan-out by it.
pub type UserId = i32;

/// Process-unique identifier of a live subscriber handle.
pub type SubscriberId = u64;
