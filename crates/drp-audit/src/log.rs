//! Append-only JSON-lines event log (C10). One JSON object per line;
//! buffered only as long as it takes to format and write it — the
//! implementation never accumulates lines in memory waiting to flush
//! (§4.10).

use crate::event::{AuditEvent, EventType, Level};
use crate::statistics::AuditStatistics;
use drp_core::{DrpError, DrpResult, Timestamp};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{error, info};

/// A time-bounded query over the log (§4.10: "filters by time window,
/// event type, user").
#[derive(Debug, Clone, Default)]
pub struct QueryFilter {
    pub t_lo: Option<Timestamp>,
    pub t_hi: Option<Timestamp>,
    pub event_type: Option<EventType>,
    pub user_id: Option<drp_core::UserHash>,
}

/// Append-only audit log over `<dir>/audit.log`, with `level >= Error`
/// events additionally mirrored to `<dir>/errors.log` so operational
/// tooling can tail error-only output (§4.10, supplemental).
///
/// Queries and statistics are served from an in-process in-memory copy
/// rather than re-scanning the file, since the log is the durable record,
/// not the query engine; the copy is rebuilt from the file at `open`.
pub struct AuditLog {
    audit_path: PathBuf,
    errors_path: PathBuf,
    events: RwLock<Vec<AuditEvent>>,
}

impl AuditLog {
    pub fn open(dir: impl AsRef<Path>) -> DrpResult<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .map_err(|e| DrpError::Internal(format!("creating audit log dir: {e}")))?;
        let audit_path = dir.join("audit.log");
        let errors_path = dir.join("errors.log");
        let events = load_existing(&audit_path)?;
        Ok(Self {
            audit_path,
            errors_path,
            events: RwLock::new(events),
        })
    }

    /// Appends `event` to `audit.log`, mirroring it to `errors.log` when
    /// `level >= Error`, and emits a matching `tracing` event so operators
    /// can observe the process without opening the audit file (§10).
    pub async fn log(&self, event: AuditEvent) -> DrpResult<()> {
        let line =
            serde_json::to_string(&event).map_err(|e| DrpError::Internal(format!("serializing audit event: {e}")))?;
        append_line(&self.audit_path, &line)?;
        if event.level >= Level::Error {
            append_line(&self.errors_path, &line)?;
        }
        match event.level {
            Level::Error | Level::Critical => {
                error!(event_type = event.event_type.as_str(), message = %event.message, "audit")
            }
            _ => info!(event_type = event.event_type.as_str(), message = %event.message, "audit"),
        }
        self.events.write().await.push(event);
        Ok(())
    }

    pub async fn query(&self, filter: &QueryFilter) -> Vec<AuditEvent> {
        self.events
            .read()
            .await
            .iter()
            .filter(|e| filter.t_lo.map_or(true, |lo| e.timestamp >= lo))
            .filter(|e| filter.t_hi.map_or(true, |hi| e.timestamp <= hi))
            .filter(|e| filter.event_type.map_or(true, |t| e.event_type == t))
            .filter(|e| filter.user_id.as_ref().map_or(true, |u| e.user_id.as_ref() == Some(u)))
            .cloned()
            .collect()
    }

    /// `get_audit_statistics(window)` (§3, supplemental).
    pub async fn statistics(&self, t_lo: Timestamp, t_hi: Timestamp) -> AuditStatistics {
        let guard = self.events.read().await;
        let window = guard.iter().filter(|e| e.timestamp >= t_lo && e.timestamp <= t_hi);
        AuditStatistics::compute(window)
    }
}

fn load_existing(path: &Path) -> DrpResult<Vec<AuditEvent>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = std::fs::read_to_string(path)
        .map_err(|e| DrpError::Internal(format!("reading audit log: {e}")))?;
    let mut events = Vec::new();
    for line in raw.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<AuditEvent>(line) {
            Ok(event) => events.push(event),
            Err(e) => error!(error = %e, "skipping unparseable audit log line"),
        }
    }
    Ok(events)
}

fn append_line(path: &Path, line: &str) -> DrpResult<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| DrpError::Internal(format!("opening {}: {e}", path.display())))?;
    writeln!(file, "{line}").map_err(|e| DrpError::Internal(format!("appending to {}: {e}", path.display())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use drp_core::UserHash;

    fn temp_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("drp-audit-test-{tag}-{}", std::process::id()))
    }

    #[tokio::test]
    async fn append_then_query_by_type_and_time() {
        let dir = temp_dir("query");
        let log = AuditLog::open(&dir).unwrap();
        log.log(AuditEvent::new(EventType::ProofSubmission, Level::Info, "submitted"))
            .await
            .unwrap();
        log.log(AuditEvent::new(EventType::ProofError, Level::Error, "boom"))
            .await
            .unwrap();

        let errors = log
            .query(&QueryFilter {
                event_type: Some(EventType::ProofError),
                ..Default::default()
            })
            .await;
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "boom");

        assert!(log.errors_path.exists());
        let error_lines = std::fs::read_to_string(&log.errors_path).unwrap();
        assert_eq!(error_lines.lines().count(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn reopen_rebuilds_in_memory_copy_from_file() {
        let dir = temp_dir("reopen");
        {
            let log = AuditLog::open(&dir).unwrap();
            log.log(
                AuditEvent::new(EventType::ConsentCreated, Level::Info, "created")
                    .with_user(UserHash("u1".to_string())),
            )
            .await
            .unwrap();
        }
        let reopened = AuditLog::open(&dir).unwrap();
        let all = reopened.query(&QueryFilter::default()).await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].user_id, Some(UserHash("u1".to_string())));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn statistics_aggregate_counts_and_unique_users() {
        let dir = temp_dir("stats");
        let log = AuditLog::open(&dir).unwrap();
        log.log(
            AuditEvent::new(EventType::ProofSubmission, Level::Info, "a")
                .with_user(UserHash("u1".to_string())),
        )
        .await
        .unwrap();
        log.log(
            AuditEvent::new(EventType::ProofSubmission, Level::Info, "b")
                .with_user(UserHash("u2".to_string())),
        )
        .await
        .unwrap();
        log.log(AuditEvent::new(EventType::AnchorError, Level::Error, "c"))
            .await
            .unwrap();

        let stats = log.statistics(0, i64::MAX).await;
        assert_eq!(stats.proofs_processed, 2);
        assert_eq!(stats.error_count, 1);
        assert_eq!(stats.unique_users, 2);
        assert_eq!(*stats.event_type_counts.get("proof_submission").unwrap(), 2);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
