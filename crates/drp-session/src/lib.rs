//! Ephemeral session keys, HMAC-authenticated messages, and replay/freshness
//! defense for peer-to-peer traffic (C8, Session Channel).

pub mod facade;
pub mod keys;
pub mod protector;
pub mod types;

pub use facade::P2PNetworkSecurity;
pub use keys::{SessionKeyManager, DEFAULT_SESSION_TTL_SECS};
pub use protector::MessageProtector;
pub use types::{
    ProtectedMessage, SessionKey, SessionKeyStatus, SessionStats, PROTOCOL_VERSION,
};
