//! Typed claim sets for the two keyed-token consumers: commercial license keys and API identity
//! tokens.

// crates.io
use serde_json::Value;
use time::{format_description::BorrowedFormatItem, macros::format_description};
// self
use crate::{
	_prelude::*,
	error::TokenError,
	token::{Claims, EXPIRES_AT_CLAIM, KeyedTokenService},
};

/// `YYYY-MM-DDTHH:MM:SSZ`, the wire format for UTC instants.
pub const UTC_SECONDS_FORMAT: &[BorrowedFormatItem<'static>] =
	format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");

/// License family label embedded in product license keys.
pub const PRODUCT_LICENSE_KIND: &str = "Full-Stack Licensing";
/// Schema version embedded in product license keys.
pub const PRODUCT_LICENSE_VERSION: &str = "1.0";
/// Lifetime of API identity tokens (ten years); revocation happens by replacing the stored token.
pub const API_TOKEN_TTL: Duration = Duration::days(3650);

const SECONDS_PER_DAY: i64 = 86_400;

/// Claims carried by a product license key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductLicenseClaims {
	/// Product title.
	pub product: String,
	/// Owner identifier (user identifier or free-form owner string).
	pub owner: String,
	/// Numeric owner id, when the key is bound to a stored user.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub owner_id: Option<u64>,
	/// License family label.
	#[serde(rename = "type", default = "default_kind")]
	pub kind: String,
	/// Claim schema version.
	#[serde(rename = "v", default = "default_version")]
	pub version: String,
}
impl ProductLicenseClaims {
	/// Creates claims for `product` owned by `owner`.
	pub fn new(product: impl Into<String>, owner: impl Into<String>) -> Self {
		Self {
			product: product.into(),
			owner: owner.into(),
			owner_id: None,
			kind: default_kind(),
			version: default_version(),
		}
	}

	/// Binds the key to a stored user id.
	pub fn with_owner_id(mut self, owner_id: u64) -> Self {
		self.owner_id = Some(owner_id);

		self
	}
}

/// Claims carried by a personal API identity token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiIdentityClaims {
	/// Stored user id.
	pub id: u64,
	/// User identifier (email).
	pub email: String,
	/// Granted roles.
	#[serde(default)]
	pub roles: Vec<String>,
}

/// Public view of a validated license key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LicenseKeySummary {
	/// Product title, or `Generic Product` when absent.
	pub product: String,
	/// Owner, or `anonymous` when absent.
	pub owner: String,
	/// Expiry rendered as `YYYY-MM-DDTHH:MM:SSZ`, when present.
	pub expires_at: Option<String>,
}

impl KeyedTokenService {
	/// Issues a product license key valid for `days` days; absurd counts saturate.
	pub fn issue_product_license(&self, claims: &ProductLicenseClaims, days: i64) -> String {
		self.issue(to_claims(claims), Duration::seconds(days.saturating_mul(SECONDS_PER_DAY)))
	}

	/// Validates a product license key and summarizes it for API responses.
	pub fn validate_product_license(&self, key: &str) -> Result<LicenseKeySummary, TokenError> {
		let claims = self.validate(key)?;
		let text = |name: &str, fallback: &str| {
			claims.get(name).and_then(Value::as_str).unwrap_or(fallback).to_owned()
		};
		let expires_at = claims
			.get(EXPIRES_AT_CLAIM)
			.and_then(Value::as_i64)
			.and_then(|exp| OffsetDateTime::from_unix_timestamp(exp).ok())
			.and_then(|at| at.format(UTC_SECONDS_FORMAT).ok());

		Ok(LicenseKeySummary {
			product: text("product", "Generic Product"),
			owner: text("owner", "anonymous"),
			expires_at,
		})
	}

	/// Issues a long-lived API identity token.
	pub fn issue_api_token(&self, claims: &ApiIdentityClaims) -> String {
		self.issue(to_claims(claims), API_TOKEN_TTL)
	}

	/// Validates an API identity token; tokens without an `id` claim are rejected.
	pub fn validate_api_token(&self, token: &str) -> Result<ApiIdentityClaims, TokenError> {
		let claims = self.validate(token)?;

		serde_json::from_value(Value::Object(claims)).map_err(|_| TokenError::Malformed)
	}
}

fn to_claims(value: &impl Serialize) -> Claims {
	match serde_json::to_value(value) {
		Ok(Value::Object(map)) => map,
		_ => Claims::new(),
	}
}

fn default_kind() -> String {
	PRODUCT_LICENSE_KIND.into()
}

fn default_version() -> String {
	PRODUCT_LICENSE_VERSION.into()
}
