//! RS256 key material, loaded once at startup and shared read-only.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::json;
use tracing::debug;

use super::claims::Claims;
use super::error::KeyLoadError;

/// Signing algorithm for all credentials.
pub const ALGORITHM: Algorithm = Algorithm::RS256;

/// Private signing key plus public verification key.
///
/// Immutable after construction; share it behind an `Arc`.
pub struct KeyMaterial {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl KeyMaterial {
    /// Parse a PEM key pair and prove it signs and verifies.
    ///
    /// # Errors
    ///
    /// Returns [`KeyLoadError`] if either PEM is malformed or the pair does
    /// not match.
    pub fn from_pem(private_pem: &[u8], public_pem: &[u8]) -> Result<Self, KeyLoadError> {
        let encoding = EncodingKey::from_rsa_pem(private_pem).map_err(KeyLoadError::PrivateKey)?;
        let decoding = DecodingKey::from_rsa_pem(public_pem).map_err(KeyLoadError::PublicKey)?;

        // Expiry and issuer are checked by the validator against its own clock.
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        let keys = Self {
            encoding,
            decoding,
            validation,
        };
        keys.self_test()?;
        Ok(keys)
    }

    /// Read the PEM pair from disk.
    ///
    /// # Errors
    ///
    /// Returns [`KeyLoadError::Io`] if a file cannot be read, otherwise as
    /// [`KeyMaterial::from_pem`].
    pub fn from_pem_files(private_path: &Path, public_path: &Path) -> Result<Self, KeyLoadError> {
        let read = |path: &Path| {
            std::fs::read(path).map_err(|source| KeyLoadError::Io {
                path: path.display().to_string(),
                source,
            })
        };
        let private_pem = read(private_path)?;
        let public_pem = read(public_path)?;
        Self::from_pem(&private_pem, &public_pem)
    }

    /// Sign a claim set into a compact JWT.
    ///
    /// # Errors
    ///
    /// Returns the underlying `jsonwebtoken` error if signing fails.
    pub fn sign(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        jsonwebtoken::encode(&Header::new(ALGORITHM), claims, &self.encoding)
    }

    /// Verify a compact JWT's signature and decode its claims.
    ///
    /// Does not look at `exp`.
    ///
    /// # Errors
    ///
    /// Returns the underlying `jsonwebtoken` error on a bad signature,
    /// structure, algorithm or claim shape.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation).map(|data| data.claims)
    }

    fn self_test(&self) -> Result<(), KeyLoadError> {
        let probe = jsonwebtoken::encode(&Header::new(ALGORITHM), &json!({ "probe": true }), &self.encoding)
            .map_err(|e| KeyLoadError::SelfTest(format!("sign: {e}")))?;
        jsonwebtoken::decode::<serde_json::Value>(&probe, &self.decoding, &self.validation)
            .map_err(|e| KeyLoadError::SelfTest(format!("verify: {e}")))?;
        debug!("Key pair self-test passed");
        Ok(())
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("algorithm", &ALGORITHM)
            .finish_non_exhaustive()
    }
}
