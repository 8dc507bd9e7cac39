use crate::event::{AuditEvent, EventType, Level};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// `get_audit_statistics(window)` (§3, supplemental): counts per type and
/// unique user count over a time window.
#[derive(Debug, Clone, Serialize)]
pub struct AuditStatistics {
    pub event_type_counts: BTreeMap<String, u64>,
    pub error_count: u64,
    pub warning_count: u64,
    pub unique_users: u64,
    pub proofs_processed: u64,
    pub consent_events: u64,
}

impl AuditStatistics {
    pub fn compute<'a>(events: impl Iterator<Item = &'a AuditEvent>) -> Self {
        let mut stats = AuditStatistics {
            event_type_counts: BTreeMap::new(),
            error_count: 0,
            warning_count: 0,
            unique_users: 0,
            proofs_processed: 0,
            consent_events: 0,
        };
        let mut users = HashSet::new();
        for event in events {
            *stats.event_type_counts.entry(event.event_type.as_str().to_string()).or_insert(0) += 1;
            match event.level {
                Level::Error | Level::Critical => stats.error_count += 1,
                Level::Warn => stats.warning_count += 1,
                _ => {}
            }
            if let Some(user) = &event.user_id {
                users.insert(user.clone());
            }
            if event.event_type == EventType::ProofSubmission {
                stats.proofs_processed += 1;
            }
            if matches!(
                event.event_type,
                EventType::ConsentCreated | EventType::ConsentValidated | EventType::ConsentRevoked
            ) {
                stats.consent_events += 1;
            }
        }
        stats.unique_users = users.len() as u64;
        stats
    }
}
