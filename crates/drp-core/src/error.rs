use thiserror::Error;

/// Error taxonomy shared by every component in the gateway. Surfaced to HTTP
/// status codes and audit levels by the submission pipeline and read API.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DrpError {
    // ── Consent ──────────────────────────────────────────────────────────────
    #[error("consent denied: {0}")]
    ConsentDenied(String),

    // ── Input validation ─────────────────────────────────────────────────────
    #[error("invalid input: {0}")]
    InvalidInput(String),

    // ── Cryptography ─────────────────────────────────────────────────────────
    #[error("key vault not initialized")]
    KeyNotInitialized,

    #[error("decryption failed")]
    DecryptionFailed,

    #[error("unsupported key scheme: {0}")]
    UnsupportedScheme(String),

    #[error("cryptographic operation failed: {0}")]
    CryptoFailure(String),

    // ── Backing stores ───────────────────────────────────────────────────────
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("{0} not found")]
    NotFound(String),

    // ── Elder quorum ─────────────────────────────────────────────────────────
    #[error("insufficient elders: need {need}, have {have}")]
    InsufficientElders { need: usize, have: usize },

    #[error("unknown elder: {0}")]
    UnknownElder(String),

    #[error("elder revoked: {0}")]
    RevokedElder(String),

    #[error("bad signature")]
    BadSignature,

    // ── Consent-token specific ───────────────────────────────────────────────
    #[error("consent token expired")]
    Expired,

    #[error("consent token revoked")]
    Revoked,

    #[error("consent token does not belong to this user")]
    UserMismatch,

    // ── Session channel ──────────────────────────────────────────────────────
    #[error("unknown session key")]
    UnknownKey,

    #[error("replay detected: message already seen")]
    Replay,

    #[error("message outside freshness window")]
    Stale,

    #[error("MAC mismatch")]
    MacMismatch,

    // ── Catch-all ─────────────────────────────────────────────────────────────
    #[error("internal error: {0}")]
    Internal(String),
}

pub type DrpResult<T> = Result<T, DrpError>;
