//! Long-term signing keys, per-user derived keys, and envelope encryption
//! (C2, KeyVault).

pub mod field;
pub mod identity;
pub mod master;
pub mod raw_key_file;
pub mod sensitive;
pub mod vault;

pub use field::{decrypt_field, encrypt_field};
pub use identity::{verify, IdentityKeyPair, KeyScheme};
pub use master::MasterKey;
pub use raw_key_file::load_or_generate_ed25519;
pub use sensitive::{is_sensitive_field, SENSITIVE_FIELDS};
pub use vault::KeyVault;
