use crate::token::ConsentToken;
use drp_core::Timestamp;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// A derived, read-only view over the token table.
#[derive(Debug, Clone, Serialize)]
pub struct ConsentStatistics {
    pub total_tokens: u64,
    pub active_tokens: u64,
    pub expired_tokens: u64,
    pub revoked_tokens: u64,
    pub unique_users: u64,
    pub consent_types: BTreeMap<String, u64>,
}

impl ConsentStatistics {
    pub fn compute<'a>(tokens: impl Iterator<Item = &'a ConsentToken>, now: Timestamp) -> Self {
        let mut stats = ConsentStatistics {
            total_tokens: 0,
            active_tokens: 0,
            expired_tokens: 0,
            revoked_tokens: 0,
            unique_users: 0,
            consent_types: BTreeMap::new(),
        };
        let mut users = HashSet::new();
        for token in tokens {
            stats.total_tokens += 1;
            users.insert(token.user_id.clone());
            if token.revoked {
                stats.revoked_tokens += 1;
            } else if token.is_expired(now) {
                stats.expired_tokens += 1;
            } else {
                stats.active_tokens += 1;
            }
            for ty in &token.consent_types {
                *stats.consent_types.entry(ty.clone()).or_insert(0) += 1;
            }
        }
        stats.unique_users = users.len() as u64;
        stats
    }
}
