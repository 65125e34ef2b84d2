//! Signed license payload layouts.
//!
//! Two layouts are accepted. The legacy positional layout is
//! `PT-INTERNAL-PRO-<year>-<tier>-<domain>`, where the edition is the third dash-separated field
//! and the domain keeps any dashes of its own. The tagged layout is
//! `PTL2;type=<edition>;year=<year>;tier=<tier>;domain=<domain>`, whose first field names the
//! schema so new claims can be added without shifting positions.

// self
use crate::_prelude::*;

/// Prefix every legacy payload must start with.
pub const LEGACY_PREFIX: &str = "PT-INTERNAL-PRO";
/// Schema id opening every tagged payload.
pub const TAGGED_SCHEMA_ID: &str = "PTL2";

const DEFAULT_EDITION: &str = "PRO";
const DEFAULT_YEAR: &str = "2026";
const DEFAULT_TIER: &str = "OFFICIAL";

/// Payload layout a license was issued with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadSchema {
	/// Dash-separated positional fields.
	Legacy,
	/// Semicolon-separated `key=value` fields.
	Tagged,
}

/// Claims carried by a verified payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LicenseClaims {
	/// Layout the claims were read from.
	pub schema: PayloadSchema,
	/// Edition, such as `PRO` or `ENTERPRISE`.
	pub edition: String,
	/// Issue year.
	pub year: String,
	/// Support tier.
	pub tier: String,
	/// Bound host name, when the license is domain-locked.
	pub domain: Option<String>,
}

/// Parses a payload whose signature has already been checked.
///
/// Returns `None` when the payload matches neither layout's prefix.
pub fn parse_payload(payload: &str) -> Option<LicenseClaims> {
	if let Some(rest) = payload.strip_prefix(TAGGED_SCHEMA_ID) {
		return rest.strip_prefix(';').or(rest.is_empty().then_some("")).map(parse_tagged);
	}
	if payload.starts_with(LEGACY_PREFIX) {
		return Some(parse_legacy(payload));
	}

	None
}

fn parse_legacy(payload: &str) -> LicenseClaims {
	let parts = payload.splitn(6, '-').collect::<Vec<_>>();
	let field = |idx: usize| parts.get(idx).copied().filter(|v| !v.is_empty());

	LicenseClaims {
		schema: PayloadSchema::Legacy,
		edition: field(2).unwrap_or(DEFAULT_EDITION).into(),
		year: field(3).unwrap_or(DEFAULT_YEAR).into(),
		tier: field(4).unwrap_or(DEFAULT_TIER).into(),
		domain: field(5).map(Into::into),
	}
}

fn parse_tagged(rest: &str) -> LicenseClaims {
	let mut claims = LicenseClaims {
		schema: PayloadSchema::Tagged,
		edition: DEFAULT_EDITION.into(),
		year: DEFAULT_YEAR.into(),
		tier: DEFAULT_TIER.into(),
		domain: None,
	};

	for (key, value) in rest.split(';').filter_map(|field| field.split_once('=')) {
		let value = value.trim();

		if value.is_empty() {
			continue;
		}

		match key.trim() {
			"type" => claims.edition = value.into(),
			"year" => claims.year = value.into(),
			"tier" => claims.tier = value.into(),
			"domain" => claims.domain = Some(value.into()),
			_ => {},
		}
	}

	claims
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn legacy_fields_are_positional() {
		let claims = parse_payload("PT-INTERNAL-PRO-2027-GOLD-example.com")
			.expect("Legacy payload should parse.");

		assert_eq!(claims.schema, PayloadSchema::Legacy);
		assert_eq!(claims.edition, "PRO");
		assert_eq!(claims.year, "2027");
		assert_eq!(claims.tier, "GOLD");
		assert_eq!(claims.domain.as_deref(), Some("example.com"));
	}

	#[test]
	fn legacy_domain_keeps_its_dashes_and_missing_fields_default() {
		let dashed = parse_payload("PT-INTERNAL-PRO-2026-OFFICIAL-my-site.example.org")
			.expect("Dashed domain should parse.");

		assert_eq!(dashed.domain.as_deref(), Some("my-site.example.org"));

		let bare = parse_payload("PT-INTERNAL-PRO").expect("Bare prefix should parse.");

		assert_eq!((bare.year.as_str(), bare.tier.as_str()), ("2026", "OFFICIAL"));
		assert_eq!(bare.domain, None);
	}

	#[test]
	fn tagged_fields_are_named() {
		let claims = parse_payload("PTL2;tier=SILVER;type=ENTERPRISE;domain=tick.example;x=1")
			.expect("Tagged payload should parse.");

		assert_eq!(claims.schema, PayloadSchema::Tagged);
		assert_eq!(claims.edition, "ENTERPRISE");
		assert_eq!(claims.year, "2026");
		assert_eq!(claims.tier, "SILVER");
		assert_eq!(claims.domain.as_deref(), Some("tick.example"));
	}

	#[test]
	fn unknown_prefixes_are_rejected() {
		assert_eq!(parse_payload("PT-EXTERNAL-PRO-2026"), None);
		assert_eq!(parse_payload("PTL2X;type=PRO"), None);
		assert_eq!(parse_payload(""), None);
	}
}
