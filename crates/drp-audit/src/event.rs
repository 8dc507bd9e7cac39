use drp_core::{now, Timestamp, UserHash};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use uuid::Uuid;

/// The finite `event_type` tag set the audit log accepts (§4.10). Every
/// caller in the gateway picks one of these; there is no open extension
/// point — new event kinds are a spec change, not a runtime one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    ProofSubmission,
    ProofUpload,
    ProofAnchor,
    ProofError,
    AnchorError,
    ElderSignature,
    ConsentCreated,
    ConsentValidated,
    ConsentRevoked,
    SystemStartup,
    SystemShutdown,
    SecurityEvent,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::ProofSubmission => "proof_submission",
            EventType::ProofUpload => "proof_upload",
            EventType::ProofAnchor => "proof_anchor",
            EventType::ProofError => "proof_error",
            EventType::AnchorError => "anchor_error",
            EventType::ElderSignature => "elder_signature",
            EventType::ConsentCreated => "consent_created",
            EventType::ConsentValidated => "consent_validated",
            EventType::ConsentRevoked => "consent_revoked",
            EventType::SystemStartup => "system_startup",
            EventType::SystemShutdown => "system_shutdown",
            EventType::SecurityEvent => "security_event",
        }
    }
}

/// Severity, ordered so `level >= Error` (the mirror-to-`errors.log`
/// condition, §4.10) is a plain comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
    Critical,
}

/// One line of the append-only audit log (§3, §4.10).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: Uuid,
    pub event_type: EventType,
    pub timestamp: Timestamp,
    pub level: Level,
    pub message: String,
    pub data: Json,
    pub user_id: Option<UserHash>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl AuditEvent {
    pub fn new(event_type: EventType, level: Level, message: impl Into<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type,
            timestamp: now(),
            level,
            message: message.into(),
            data: Json::Null,
            user_id: None,
            ip: None,
            user_agent: None,
        }
    }

    pub fn with_data(mut self, data: Json) -> Self {
        self.data = data;
        self
    }

    pub fn with_user(mut self, user_hash: UserHash) -> Self {
        self.user_id = Some(user_hash);
        self
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }
}
