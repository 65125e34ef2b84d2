//! GitHub App credential and RS256 assertion minting.

// crates.io
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use rsa::{
	RsaPrivateKey,
	pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey},
	pkcs8::DecodePrivateKey,
};
// self
use crate::{
	_prelude::*,
	auth::{AppId, TokenSecret},
	error::ConfigError,
};

/// Assertion lifetime; GitHub refuses assertions valid for more than ten minutes.
pub const ASSERTION_TTL: Duration = Duration::minutes(10);
/// Backdating applied to `iat` to absorb clock skew against GitHub.
pub const ASSERTION_BACKDATE: Duration = Duration::seconds(60);

#[derive(Serialize)]
struct AssertionClaims {
	iat: i64,
	exp: i64,
	iss: u64,
}

/// Immutable App identity loaded once at startup.
#[derive(Clone)]
pub struct AppCredential {
	app_id: AppId,
	signing_key: EncodingKey,
}
impl AppCredential {
	/// Parses a PEM private key (PKCS#1 or PKCS#8) for `app_id`.
	pub fn new(app_id: AppId, private_key_pem: &str) -> Result<Self, ConfigError> {
		let pem = clean_private_key(private_key_pem);

		if pem.is_empty() {
			return Err(ConfigError::MissingPrivateKey);
		}

		let key = RsaPrivateKey::from_pkcs1_pem(&pem)
			.or_else(|_| RsaPrivateKey::from_pkcs8_pem(&pem))
			.map_err(|e| ConfigError::InvalidPrivateKey { reason: e.to_string() })?;
		let der = key
			.to_pkcs1_der()
			.map_err(|e| ConfigError::InvalidPrivateKey { reason: e.to_string() })?;

		Ok(Self { app_id, signing_key: EncodingKey::from_rsa_der(der.as_bytes()) })
	}

	/// Builds a credential from raw configuration strings.
	pub fn from_parts(app_id: &str, private_key_pem: &str) -> Result<Self, ConfigError> {
		let app_id = app_id.parse::<AppId>().map_err(|_| ConfigError::MissingAppId)?;

		if private_key_pem.trim().is_empty() {
			return Err(ConfigError::MissingPrivateKey);
		}

		Self::new(app_id, private_key_pem)
	}

	/// App identifier used as the assertion issuer.
	pub fn app_id(&self) -> AppId {
		self.app_id
	}

	/// Mints an assertion valid from `now - 60s` until `now + 10min`.
	pub fn mint_assertion_at(&self, now: OffsetDateTime) -> Result<AppAssertion, ConfigError> {
		let issued_at = now - ASSERTION_BACKDATE;
		let expires_at = now + ASSERTION_TTL;
		let claims = AssertionClaims {
			iat: issued_at.unix_timestamp(),
			exp: expires_at.unix_timestamp(),
			iss: self.app_id.get(),
		};
		let token =
			jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
				.map_err(|e| ConfigError::AssertionSigning { reason: e.to_string() })?;

		Ok(AppAssertion { token: TokenSecret::new(token), expires_at })
	}

	/// Mints an assertion against the current clock.
	pub fn mint_assertion(&self) -> Result<AppAssertion, ConfigError> {
		self.mint_assertion_at(OffsetDateTime::now_utc())
	}
}
impl Debug for AppCredential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AppCredential")
			.field("app_id", &self.app_id)
			.field("private_key", &"<redacted>")
			.finish()
	}
}

/// Short-lived App assertion (`header.claims.signature`, RS256).
#[derive(Clone, Debug)]
pub struct AppAssertion {
	/// Encoded assertion.
	pub token: TokenSecret,
	/// Instant after which GitHub rejects the assertion.
	pub expires_at: OffsetDateTime,
}

/// Normalizes a PEM pasted into an environment variable.
///
/// Surrounding quotes are stripped, literal `\n`/`\r\n`/`\r` escapes become newlines, and any
/// byte outside printable ASCII (other than newline) is dropped.
pub fn clean_private_key(raw: &str) -> String {
	raw.trim()
		.trim_matches(|c| c == '"' || c == '\'')
		.replace("\\r\\n", "\n")
		.replace("\\n", "\n")
		.replace("\\r", "\n")
		.chars()
		.filter(|c| *c == '\n' || (' '..='~').contains(c))
		.collect()
}
