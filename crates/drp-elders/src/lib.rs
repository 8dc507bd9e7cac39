//! Key-share lifecycle, m-of-n signature aggregation over a canonical
//! anchor payload, and weighted quorum verification (C6, Elder Quorum).

pub mod quorum;
pub mod types;

pub use quorum::ElderQuorum;
pub use types::{ElderInfo, ElderSignature, PersistedElder, QuorumStatus};
