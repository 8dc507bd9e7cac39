//! Identity keypairs: `generate_identity_keypair(scheme) / sign / verify`.
//! Two schemes are supported: Ed25519 and RSA.

use drp_core::{DrpError, DrpResult};
use ed25519_dalek::{Signature as EdSignature, Signer, SigningKey, Verifier, VerifyingKey};
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey};
use rsa::signature::{RandomizedSigner, Verifier as RsaVerifierTrait};
use rsa::RsaPrivateKey;
use sha2::Sha256;
use zeroize::Zeroize;

const RSA_KEY_BITS: usize = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyScheme {
    Ed25519,
    Rsa,
}

impl KeyScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyScheme::Ed25519 => "ed25519",
            KeyScheme::Rsa => "rsa",
        }
    }

    pub fn parse(s: &str) -> DrpResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ed25519" => Ok(KeyScheme::Ed25519),
            "rsa" => Ok(KeyScheme::Rsa),
            other => Err(DrpError::UnsupportedScheme(other.to_string())),
        }
    }
}

enum SecretMaterial {
    Ed25519(SigningKey),
    Rsa(Box<RsaPrivateKey>),
}

/// An identity keypair under one of the supported schemes. The secret half
/// never leaves the process; only `public_key` and signatures produced by
/// `sign` cross component boundaries.
pub struct IdentityKeyPair {
    pub scheme: KeyScheme,
    pub public_key: Vec<u8>,
    secret: SecretMaterial,
}

impl IdentityKeyPair {
    pub fn generate(scheme: KeyScheme) -> DrpResult<Self> {
        match scheme {
            KeyScheme::Ed25519 => {
                let signing_key = SigningKey::generate(&mut rand_core_0_6());
                let public_key = signing_key.verifying_key().to_bytes().to_vec();
                Ok(Self {
                    scheme,
                    public_key,
                    secret: SecretMaterial::Ed25519(signing_key),
                })
            }
            KeyScheme::Rsa => {
                let mut rng = rand_core_0_6();
                let private_key = RsaPrivateKey::new(&mut rng, RSA_KEY_BITS)
                    .map_err(|e| DrpError::CryptoFailure(format!("rsa keygen: {e}")))?;
                let public_key = rsa::RsaPublicKey::from(&private_key)
                    .to_public_key_der()
                    .map_err(|e| DrpError::CryptoFailure(format!("rsa pubkey encode: {e}")))?
                    .into_vec();
                Ok(Self {
                    scheme,
                    public_key,
                    secret: SecretMaterial::Rsa(Box::new(private_key)),
                })
            }
        }
    }

    /// Rebuild an Ed25519 identity from a raw 32-byte secret, e.g. loaded
    /// from the Elder key file or the consent-signing key file.
    pub fn from_ed25519_secret_bytes(secret: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(secret);
        let public_key = signing_key.verifying_key().to_bytes().to_vec();
        Self {
            scheme: KeyScheme::Ed25519,
            public_key,
            secret: SecretMaterial::Ed25519(signing_key),
        }
    }

    pub fn ed25519_secret_bytes(&self) -> Option<[u8; 32]> {
        match &self.secret {
            SecretMaterial::Ed25519(sk) => Some(sk.to_bytes()),
            SecretMaterial::Rsa(_) => None,
        }
    }

    pub fn sign(&self, msg: &[u8]) -> DrpResult<Vec<u8>> {
        match &self.secret {
            SecretMaterial::Ed25519(sk) => Ok(sk.sign(msg).to_bytes().to_vec()),
            SecretMaterial::Rsa(sk) => {
                let signing_key = rsa::pss::SigningKey::<Sha256>::new(sk.as_ref().clone());
                let mut rng = rand_core_0_6();
                let sig = signing_key.sign_with_rng(&mut rng, msg);
                Ok(rsa::signature::SignatureEncoding::to_vec(&sig))
            }
        }
    }
}

/// Verifies a signature produced by [`IdentityKeyPair::sign`] without
/// needing the keypair itself — used by Elders and consent validation,
/// which hold only a public key.
pub fn verify(scheme: KeyScheme, public_key: &[u8], msg: &[u8], sig: &[u8]) -> DrpResult<bool> {
    match scheme {
        KeyScheme::Ed25519 => {
            let pk_bytes: [u8; 32] = public_key
                .try_into()
                .map_err(|_| DrpError::CryptoFailure("ed25519 public key must be 32 bytes".into()))?;
            let vk = VerifyingKey::from_bytes(&pk_bytes)
                .map_err(|e| DrpError::CryptoFailure(format!("bad ed25519 public key: {e}")))?;
            let sig_bytes: [u8; 64] = sig
                .try_into()
                .map_err(|_| DrpError::CryptoFailure("ed25519 signature must be 64 bytes".into()))?;
            let signature = EdSignature::from_bytes(&sig_bytes);
            Ok(vk.verify(msg, &signature).is_ok())
        }
        KeyScheme::Rsa => {
            let pk = rsa::RsaPublicKey::from_public_key_der(public_key)
                .map_err(|e| DrpError::CryptoFailure(format!("bad rsa public key: {e}")))?;
            let verifying_key = rsa::pss::VerifyingKey::<Sha256>::new(pk);
            let signature = rsa::pss::Signature::try_from(sig)
                .map_err(|e| DrpError::CryptoFailure(format!("bad rsa signature: {e}")))?;
            Ok(verifying_key.verify(msg, &signature).is_ok())
        }
    }
}

impl Drop for IdentityKeyPair {
    fn drop(&mut self) {
        if let SecretMaterial::Ed25519(sk) = &mut self.secret {
            let mut bytes = sk.to_bytes();
            bytes.zeroize();
        }
    }
}

impl std::fmt::Debug for IdentityKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "IdentityKeyPair {{ scheme: {:?}, public_key: {} }}",
            self.scheme,
            hex::encode(&self.public_key)
        )
    }
}

fn rand_core_0_6() -> impl rand_core::RngCore + rand_core::CryptoRng {
    rand::rngs::OsRng
}
