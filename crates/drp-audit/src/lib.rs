//! Append-only JSON-lines event log, queryable by time/type/user (C10,
//! Audit Log).

pub mod event;
pub mod log;
pub mod statistics;

pub use event::{AuditEvent, EventType, Level};
pub use log::{AuditLog, QueryFilter};
pub use statistics::AuditStatistics;
