//! Anchor payload construction, Elder co-signing, ledger submission and
//! verification (C7, Anchor Service).

pub mod digest;
pub mod ledger;
pub mod service;
pub mod types;

pub use digest::DigestLedger;
pub use ledger::Ledger;
pub use service::AnchorService;
pub use types::{AnchorHistoryEntry, AnchorPayload, AnchorTransaction, BlockInfo, ChainInfo, CostEstimate};
