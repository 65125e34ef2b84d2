//! Digests shown to the signer and the short human-entered challenge.

// crates.io
use sha2::{Digest, Sha256};

/// Number of trailing hex characters the signer must type back.
pub const CHALLENGE_LEN: usize = 6;

/// Hex SHA-256 of `data`.
pub fn sha256_hex(data: impl AsRef<[u8]>) -> String {
	hex::encode(Sha256::digest(data))
}

/// Hex SHA-256 of the agreement text.
pub fn document_digest(agreement_text: &str) -> String {
	sha256_hex(agreement_text)
}

/// Hex SHA-256 of the normalized (trimmed, lower-cased) email address.
pub fn email_digest(email: &str) -> String {
	sha256_hex(normalize_email(email))
}

/// Digest binding the live document to the signer's identities.
///
/// Hashes `document_digest ‖ lower(trim(email)) ‖ github_username ‖ gitlab_username`, with an
/// absent secondary username contributing nothing.
pub fn ritual_digest(
	document_digest: &str,
	email: &str,
	github_username: &str,
	gitlab_username: Option<&str>,
) -> String {
	let mut hasher = Sha256::new();

	hasher.update(document_digest);
	hasher.update(normalize_email(email));
	hasher.update(github_username);
	hasher.update(gitlab_username.unwrap_or_default());

	hex::encode(hasher.finalize())
}

/// Last [`CHALLENGE_LEN`] characters of the ritual digest.
pub fn challenge(
	document_digest: &str,
	email: &str,
	github_username: &str,
	gitlab_username: Option<&str>,
) -> String {
	let digest = ritual_digest(document_digest, email, github_username, gitlab_username);

	digest[digest.len() - CHALLENGE_LEN..].to_owned()
}

/// Compares a typed challenge against the expected one, ignoring case and surrounding space.
pub fn challenge_matches(expected: &str, input: &str) -> bool {
	let input = input.trim();

	!input.is_empty() && input.eq_ignore_ascii_case(expected)
}

fn normalize_email(email: &str) -> String {
	email.trim().to_lowercase()
}
