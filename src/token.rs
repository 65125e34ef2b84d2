//! HMAC-SHA256 keyed tokens in the three-segment `header.claims.signature` shape.
//!
//! Tokens are produced by [`KeyedTokenService::issue`] and checked with
//! [`KeyedTokenService::validate`]. The service holds nothing but the shared secret, so any
//! instance configured with the same secret validates tokens minted by another. Revocation
//! ("does this token still match the one on file") is the caller's bookkeeping.

pub mod claims;

pub use claims::*;

// crates.io
use jsonwebtoken::{
	Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind,
};
use serde_json::{Map, Value};
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TokenError},
};

/// Claim set carried by a keyed token.
pub type Claims = Map<String, Value>;

/// Claim injected with the expiry instant (unix seconds).
pub const EXPIRES_AT_CLAIM: &str = "exp";
/// Claim injected with the issue instant (unix seconds).
pub const ISSUED_AT_CLAIM: &str = "iat";

/// Issues and validates symmetric keyed tokens.
#[derive(Clone)]
pub struct KeyedTokenService {
	encoding: EncodingKey,
	decoding: DecodingKey,
	validation: Validation,
}
impl KeyedTokenService {
	/// Creates a service keyed by `secret`.
	pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, ConfigError> {
		let secret = secret.as_ref();

		if secret.is_empty() {
			return Err(ConfigError::EmptyTokenSecret);
		}

		// Expiry is checked against the caller's clock; tokens without `exp` stay valid.
		let mut validation = Validation::new(Algorithm::HS256);

		validation.leeway = 0;
		validation.validate_exp = false;
		validation.validate_aud = false;
		validation.required_spec_claims.clear();

		Ok(Self {
			encoding: EncodingKey::from_secret(secret),
			decoding: DecodingKey::from_secret(secret),
			validation,
		})
	}

	/// Issues a token valid for `ttl` from now.
	pub fn issue(&self, claims: Claims, ttl: Duration) -> String {
		self.issue_at(claims, ttl, OffsetDateTime::now_utc())
	}

	/// Issues a token valid for `ttl` from `now`, overwriting any `exp`/`iat` claims.
	///
	/// Expiries past the representable range saturate instead of wrapping.
	pub fn issue_at(&self, mut claims: Claims, ttl: Duration, now: OffsetDateTime) -> String {
		let issued_at = now.unix_timestamp();
		let expires_at = issued_at.saturating_add(ttl.whole_seconds());

		claims.insert(EXPIRES_AT_CLAIM.into(), Value::from(expires_at));
		claims.insert(ISSUED_AT_CLAIM.into(), Value::from(issued_at));

		// HS256 over an in-memory JSON object has no failure path.
		jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
			.unwrap_or_default()
	}

	/// Validates a token against the current clock.
	pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
		self.validate_at(token, OffsetDateTime::now_utc())
	}

	/// Validates a token against `now`, returning its claim set.
	///
	/// The signature is checked before the claims are parsed.
	pub fn validate_at(&self, token: &str, now: OffsetDateTime) -> Result<Claims, TokenError> {
		let claims = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
			.map_err(|e| match e.kind() {
				ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm =>
					TokenError::InvalidSignature,
				_ => TokenError::Malformed,
			})?
			.claims;

		if let Some(exp) = claims.get(EXPIRES_AT_CLAIM) {
			let expired_at = exp.as_i64().ok_or(TokenError::Malformed)?;

			if expired_at < now.unix_timestamp() {
				return Err(TokenError::Expired { expired_at });
			}
		}

		Ok(claims)
	}
}
impl Debug for KeyedTokenService {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("KeyedTokenService(<redacted>)")
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
	use serde_json::json;
	use time::macros;
	// self
	use super::*;

	fn service() -> KeyedTokenService {
		KeyedTokenService::new("tick_id_secret").expect("Fixture secret should be accepted.")
	}

	fn claims(value: Value) -> Claims {
		match value {
			Value::Object(map) => map,
			_ => panic!("Fixture claims must be a JSON object."),
		}
	}

	#[test]
	fn empty_secret_is_a_configuration_error() {
		assert!(matches!(KeyedTokenService::new(""), Err(ConfigError::EmptyTokenSecret)));
	}

	#[test]
	fn header_segment_is_the_fixed_hs256_header() {
		let token = service().issue(Claims::new(), Duration::hours(1));
		let header = token.split('.').next().expect("Token should have a header segment.");

		let decoded = URL_SAFE_NO_PAD.decode(header).expect("Header should decode.");

		assert_eq!(decoded, br#"{"typ":"JWT","alg":"HS256"}"#);
	}

	#[test]
	fn issue_is_deterministic_for_identical_inputs() {
		let now = macros::datetime!(2026-03-01 10:00 UTC);
		let input = claims(json!({ "product": "ProjT Launcher", "owner": "alice" }));
		let a = service().issue_at(input.clone(), Duration::days(365), now);
		let b = service().issue_at(input, Duration::days(365), now);

		assert_eq!(a, b);
	}

	#[test]
	fn round_trip_preserves_claims_and_injects_times() {
		let now = macros::datetime!(2026-03-01 10:00 UTC);
		let input = claims(json!({ "id": 7, "roles": ["ROLE_USER"], "email": "a@example.com" }));
		let token = service().issue_at(input.clone(), Duration::hours(1), now);
		let validated = service()
			.validate_at(&token, now + Duration::minutes(59))
			.expect("Token should validate before expiry.");

		for (key, value) in &input {
			assert_eq!(validated.get(key), Some(value));
		}

		assert_eq!(validated[ISSUED_AT_CLAIM], json!(now.unix_timestamp()));
		assert_eq!(validated[EXPIRES_AT_CLAIM], json!(now.unix_timestamp() + 3600));
	}

	#[test]
	fn negative_ttl_is_rejected() {
		let token = service().issue(Claims::new(), Duration::seconds(-1));

		assert!(matches!(service().validate(&token), Err(TokenError::Expired { .. })));
	}

	#[test]
	fn expired_token_is_rejected_after_expiry() {
		let now = macros::datetime!(2026-03-01 10:00 UTC);
		let token = service().issue_at(Claims::new(), Duration::minutes(5), now);

		assert!(service().validate_at(&token, now + Duration::minutes(5)).is_ok());
		assert_eq!(
			service().validate_at(&token, now + Duration::minutes(5) + Duration::seconds(1)),
			Err(TokenError::Expired { expired_at: now.unix_timestamp() + 300 })
		);
	}

	#[test]
	fn flipping_any_claim_bit_invalidates_the_token() {
		let token = service().issue(claims(json!({ "owner": "bob" })), Duration::hours(1));
		let bytes = token.as_bytes();
		let start = token.find('.').expect("Token should contain a separator.") + 1;
		let end = token.rfind('.').expect("Token should contain a second separator.");

		for idx in start..end {
			for bit in 0..8 {
				let mut tampered = bytes.to_vec();

				tampered[idx] ^= 1 << bit;

				let tampered = String::from_utf8_lossy(&tampered).into_owned();

				assert!(
					service().validate(&tampered).is_err(),
					"Bit {bit} of byte {idx} should invalidate the token."
				);
			}
		}
	}

	#[test]
	fn wrong_secret_and_wrong_shape_are_rejected() {
		let token = service().issue(Claims::new(), Duration::hours(1));
		let other = KeyedTokenService::new("another-secret").expect("Secret should be accepted.");

		assert_eq!(other.validate(&token), Err(TokenError::InvalidSignature));
		assert_eq!(service().validate("a.b"), Err(TokenError::Malformed));
		assert_eq!(service().validate(&format!("{token}.extra")), Err(TokenError::Malformed));
	}

	#[test]
	fn tokens_without_expiry_claim_are_accepted() {
		let legacy = jsonwebtoken::encode(
			&Header::default(),
			&json!({ "id": 1 }),
			&EncodingKey::from_secret(b"tick_id_secret"),
		)
		.expect("Legacy fixture should encode.");
		let claims =
			service().validate(&legacy).expect("Legacy token without exp should validate.");

		assert_eq!(claims["id"], json!(1));
	}

	#[test]
	fn unbounded_ttl_saturates_the_expiry() {
		let now = macros::datetime!(2026-01-01 00:00 UTC);
		let token = service().issue_at(Claims::new(), Duration::MAX, now);
		let claims = service()
			.validate_at(&token, now + Duration::days(36_500))
			.expect("Saturated expiry should still validate.");

		assert_eq!(claims[EXPIRES_AT_CLAIM], json!(i64::MAX));
		assert_eq!(claims[ISSUED_AT_CLAIM], json!(now.unix_timestamp()));
	}

	#[test]
	fn tokens_signed_with_another_algorithm_are_rejected() {
		let foreign = jsonwebtoken::encode(
			&Header::new(Algorithm::HS512),
			&json!({ "id": 1 }),
			&EncodingKey::from_secret(b"tick_id_secret"),
		)
		.expect("Foreign fixture should encode.");

		assert_eq!(service().validate(&foreign), Err(TokenError::InvalidSignature));
	}
}
