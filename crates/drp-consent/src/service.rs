use crate::statistics::ConsentStatistics;
use crate::token::ConsentToken;
use drp_core::{jsonfile, now, ConsentTokenId, DrpError, DrpResult, Timestamp};
use drp_crypto::{verify, IdentityKeyPair, KeyScheme};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use tokio::sync::RwLock;

pub const DEFAULT_TTL_SECS: i64 = 365 * 24 * 3600;

/// Issues, validates, and revokes signed, expiring capability tokens bound
/// to a user identity (C3). Token state is persisted as JSON; reads are
/// concurrent, writes are serialized through the `RwLock` write guard.
pub struct ConsentService {
    signing_key: IdentityKeyPair,
    tokens_path: PathBuf,
    default_ttl: Timestamp,
    tokens: RwLock<BTreeMap<ConsentTokenId, ConsentToken>>,
}

impl ConsentService {
    pub fn open(
        tokens_path: impl Into<PathBuf>,
        private_key_path: impl AsRef<std::path::Path>,
    ) -> DrpResult<Self> {
        let tokens_path = tokens_path.into();
        let signing_key = drp_crypto::load_or_generate_ed25519(private_key_path)?;
        let loaded: BTreeMap<ConsentTokenId, ConsentToken> =
            jsonfile::load(&tokens_path)?.unwrap_or_default();
        Ok(Self {
            signing_key,
            tokens_path,
            default_ttl: DEFAULT_TTL_SECS,
            tokens: RwLock::new(loaded),
        })
    }

    pub fn service_public_key(&self) -> &[u8] {
        &self.signing_key.public_key
    }

    /// `create(user_id, consent_types, ttl?) → token_id` (§4.3).
    pub async fn create(
        &self,
        user_id: &str,
        consent_types: BTreeSet<String>,
        ttl: Option<Timestamp>,
    ) -> DrpResult<ConsentTokenId> {
        let token_id = ConsentTokenId::new();
        let granted_at = now();
        let ttl = ttl.unwrap_or(self.default_ttl);
        let expires_at = Some(granted_at + ttl);

        let signing_bytes = ConsentToken::signing_bytes(
            token_id,
            user_id,
            &consent_types,
            granted_at,
            expires_at,
        );
        let signature = hex::encode(self.signing_key.sign(&signing_bytes)?);

        let token = ConsentToken {
            token_id,
            user_id: user_id.to_string(),
            consent_types,
            granted_at,
            expires_at,
            signature,
            revoked: false,
            revoked_at: None,
        };

        let mut guard = self.tokens.write().await;
        guard.insert(token_id, token);
        self.persist(&guard)?;
        Ok(token_id)
    }

    /// `validate(token_id, user_id) → bool` (§4.3, invariant 4).
    pub async fn validate(&self, token_id: ConsentTokenId, user_id: &str) -> DrpResult<bool> {
        let guard = self.tokens.read().await;
        let token = match guard.get(&token_id) {
            Some(t) => t,
            None => return Ok(false),
        };
        if token.revoked {
            return Ok(false);
        }
        if token.is_expired(now()) {
            return Ok(false);
        }
        if token.user_id != user_id {
            return Ok(false);
        }
        let signing_bytes = ConsentToken::signing_bytes(
            token.token_id,
            &token.user_id,
            &token.consent_types,
            token.granted_at,
            token.expires_at,
        );
        let sig_bytes = hex::decode(&token.signature)
            .map_err(|_| DrpError::BadSignature)?;
        let ok = verify(
            KeyScheme::Ed25519,
            self.service_public_key(),
            &signing_bytes,
            &sig_bytes,
        )?;
        Ok(ok)
    }

    /// `revoke(token_id, user_id)`: only succeeds if the caller identity
    /// matches the token's `user_id` (§4.3).
    pub async fn revoke(&self, token_id: ConsentTokenId, user_id: &str) -> DrpResult<()> {
        let mut guard = self.tokens.write().await;
        let token = guard
            .get_mut(&token_id)
            .ok_or_else(|| DrpError::NotFound("consent token".into()))?;
        if token.user_id != user_id {
            return Err(DrpError::UserMismatch);
        }
        token.revoked = true;
        token.revoked_at = Some(now());
        self.persist(&guard)?;
        Ok(())
    }

    /// Removes rows where `expires_at < now` (§4.3).
    pub async fn cleanup_expired(&self) -> DrpResult<usize> {
        let mut guard = self.tokens.write().await;
        let current = now();
        let before = guard.len();
        guard.retain(|_, t| !t.is_expired(current));
        let removed = before - guard.len();
        if removed > 0 {
            self.persist(&guard)?;
        }
        Ok(removed)
    }

    /// All tokens issued to `user_id`, most recent first by insertion.
    pub async fn list_for_user(&self, user_id: &str) -> Vec<ConsentToken> {
        let guard = self.tokens.read().await;
        guard
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Aggregate counts over the token table.
    pub async fn statistics(&self) -> ConsentStatistics {
        let guard = self.tokens.read().await;
        ConsentStatistics::compute(guard.values(), now())
    }

    fn persist(&self, tokens: &BTreeMap<ConsentTokenId, ConsentToken>) -> DrpResult<()> {
        jsonfile::save(&self.tokens_path, tokens)
    }
}
