//! Secure token secret wrapper that redacts sensitive material.

// crates.io
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Redacted bearer secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Hex SHA-256 of the secret; safe to use as a cache key or log field.
	pub fn fingerprint(&self) -> String {
		hex::encode(Sha256::digest(self.0.as_bytes()))
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("ghp_super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn fingerprint_is_stable_and_hides_the_token() {
		let a = TokenSecret::new("ghp_one");
		let b = TokenSecret::new("ghp_two");

		assert_eq!(a.fingerprint(), TokenSecret::new("ghp_one").fingerprint());
		assert_ne!(a.fingerprint(), b.fingerprint());
		assert_eq!(a.fingerprint().len(), 64);
		assert!(!a.fingerprint().contains("ghp_one"));
	}
}
