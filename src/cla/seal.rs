//! Ed25519 server seal over the event digest.
//!
//! The seal key is either derived from the application secret (SHA-256 of the secret used as
//! the Ed25519 seed) or provisioned explicitly as a 32-byte seed. Derivation ties seal validity
//! to the secret: rotating the secret changes the public key, so keep the old public key to
//! verify older records.

// crates.io
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	config::CredentialConfig,
	error::{ConfigError, RitualError},
};

/// Where a [`SealKey`] came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SealKeySource {
	/// Seed is the SHA-256 of the application secret.
	Derived,
	/// Seed was provisioned explicitly.
	Provisioned,
}

/// Ed25519 key sealing contributor agreement records.
#[derive(Clone)]
pub struct SealKey {
	signing: SigningKey,
	source: SealKeySource,
}
impl SealKey {
	/// Derives the key from the application secret.
	pub fn derive_from_secret(secret: impl AsRef<[u8]>) -> Result<Self, ConfigError> {
		let secret = secret.as_ref();

		if secret.is_empty() {
			return Err(ConfigError::MissingSealKey);
		}

		let seed: [u8; 32] = Sha256::digest(secret).into();

		Ok(Self { signing: SigningKey::from_bytes(&seed), source: SealKeySource::Derived })
	}

	/// Uses an explicitly provisioned 32-byte seed.
	pub fn from_seed(seed: [u8; 32]) -> Self {
		Self { signing: SigningKey::from_bytes(&seed), source: SealKeySource::Provisioned }
	}

	/// Parses a provisioned seed from 64 hex characters.
	pub fn from_seed_hex(seed: &str) -> Result<Self, ConfigError> {
		let seed = hex::decode(seed.trim()).map_err(|_| ConfigError::InvalidSealSeed)?;
		let seed = <[u8; 32]>::try_from(seed.as_slice()).map_err(|_| ConfigError::InvalidSealSeed)?;

		Ok(Self::from_seed(seed))
	}

	/// Prefers a provisioned seed and falls back to deriving from the application secret.
	pub fn from_config(config: &CredentialConfig) -> Result<Self, ConfigError> {
		if let Some(seed) = config.cla_seal_seed.as_deref().filter(|s| !s.trim().is_empty()) {
			return Self::from_seed_hex(seed);
		}

		match config.app_secret.as_deref() {
			Some(secret) if !secret.is_empty() => Self::derive_from_secret(secret),
			_ => Err(ConfigError::MissingSealKey),
		}
	}

	/// How the key was obtained.
	pub fn source(&self) -> SealKeySource {
		self.source
	}

	/// Public half used to verify seals.
	pub fn verifying_key(&self) -> VerifyingKey {
		self.signing.verifying_key()
	}

	/// Hex-encoded public key.
	pub fn public_key_hex(&self) -> String {
		hex::encode(self.verifying_key().as_bytes())
	}

	/// Signs the hex text of `event_digest` and returns the hex signature.
	pub fn seal(&self, event_digest: &str) -> String {
		hex::encode(self.signing.sign(event_digest.as_bytes()).to_bytes())
	}
}
impl Debug for SealKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SealKey")
			.field("source", &self.source)
			.field("public_key", &self.public_key_hex())
			.finish()
	}
}

/// Checks a hex seal over `event_digest` with only the public key.
pub fn verify_seal(
	public_key: &VerifyingKey,
	event_digest: &str,
	server_signature: &str,
) -> Result<(), RitualError> {
	let raw = hex::decode(server_signature.trim()).map_err(|_| RitualError::SignatureMismatch)?;
	let signature = Signature::from_slice(&raw).map_err(|_| RitualError::SignatureMismatch)?;

	public_key
		.verify(event_digest.as_bytes(), &signature)
		.map_err(|_| RitualError::SignatureMismatch)
}
