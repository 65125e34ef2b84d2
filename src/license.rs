//! Offline license verification.
//!
//! A license artifact is `<payload>.<base64 signature>`, signed with RSA PKCS#1 v1.5 over
//! SHA-256 by the vendor's private key. [`LicenseVerifier`] checks the signature against a
//! fixed public key, reads the edition/year/tier/domain claims, enforces the domain binding for
//! request-serving callers, and falls back to the first-party infrastructure rule when no
//! valid artifact is present. Nothing is cached; verification is cheap.

pub mod gate;
pub mod infra;
pub mod payload;
pub mod platform;

pub use gate::*;
pub use infra::*;
pub use payload::*;
pub use platform::*;

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use rsa::{
	RsaPublicKey,
	pkcs1v15::{Signature, VerifyingKey},
	pkcs8::DecodePublicKey,
	signature::Verifier,
};
use sha2::Sha256;
// self
use crate::{
	_prelude::*,
	config::CredentialConfig,
	error::ConfigError,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Vendor public key every artifact is verified against.
pub const LICENSE_PUBLIC_KEY_PEM: &str = "-----BEGIN PUBLIC KEY-----
MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEAj1yMXn9G56PLnW4vrF0A
1GXAZ6co3csElpLyFKGIqXmePen7OsD2neW5ljxNDI2o9s9sFotfXp/g+UVXcEYM
Dcnx91WwXHsq3Fwep9NdaF8r+asfh/DNElo0RrrUKjIDC3d/bADklqJ1lsSUYTYP
ZnfVcG/eC0A3HaP0ymztOefOJmIFEx1wluHFlJbx3uzGIrWLZTeJE3Tu+rCwhEj2
UYxKbfmFHvhGu+Eln8KIYJI+IFRWFjNtBpU8LUyAva/lFedwLowgy7OLNkl2pjKd
ovQyCMcxDZG+Vdj4EPkMFP7cHUT7CB3zohTTjZ8719/ojZGVUGDESqew0Nqr6olM
zwIDAQAB
-----END PUBLIC KEY-----
";
/// Environment name that short-circuits verification.
pub const DEV_ENVIRONMENT: &str = "dev";
/// Artifact location used when none is configured, relative to the working directory.
pub const DEFAULT_LICENSE_KEY_PATH: &str = "LICENSE_KEY";
/// Edition reported when no license applies.
pub const COMMUNITY_EDITION: &str = "COMMUNITY";
/// Edition granted to development and first-party hosts.
pub const ENTERPRISE_EDITION: &str = "ENTERPRISE";
/// Tier reported when no license applies.
pub const OPEN_SOURCE_TIER: &str = "OPEN-SOURCE";

/// Outcome of license verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LicenseStatus {
	/// No artifact present.
	CommunityMode,
	/// Development environment; verification skipped.
	DevMode,
	/// Signature and domain binding checked out.
	Verified,
	/// Artifact unparsable or signature invalid.
	InvalidSignature,
	/// Signed payload lacks a known prefix.
	InvalidPrefix,
	/// Domain claim does not match the serving host.
	InvalidDomain,
	/// No valid artifact, but the host is first-party infrastructure.
	OfficialInfra,
}
impl LicenseStatus {
	/// Returns the stable upper-case label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::CommunityMode => "COMMUNITY_MODE",
			Self::DevMode => "DEV_MODE",
			Self::Verified => "VERIFIED",
			Self::InvalidSignature => "INVALID_SIGNATURE",
			Self::InvalidPrefix => "INVALID_PREFIX",
			Self::InvalidDomain => "INVALID_DOMAIN",
			Self::OfficialInfra => "OFFICIAL_INFRA",
		}
	}
}
impl Display for LicenseStatus {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Verification result consumed by feature gates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LicenseInfo {
	/// Verification outcome.
	pub status: LicenseStatus,
	/// Edition (`type` claim).
	#[serde(rename = "type")]
	pub edition: String,
	/// Issue year, when known.
	pub year: Option<String>,
	/// Support tier.
	pub tier: String,
	/// Bound domain, when known.
	pub domain: Option<String>,
	/// Verified payload text.
	pub payload: Option<String>,
	/// Layout of the verified payload.
	pub schema: Option<PayloadSchema>,
}
impl LicenseInfo {
	/// Community defaults: no edition, open-source tier.
	pub fn community() -> Self {
		Self::with_status(LicenseStatus::CommunityMode)
	}

	fn with_status(status: LicenseStatus) -> Self {
		Self {
			status,
			edition: COMMUNITY_EDITION.into(),
			year: None,
			tier: OPEN_SOURCE_TIER.into(),
			domain: None,
			payload: None,
			schema: None,
		}
	}
}

/// Caller environment a verification runs in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LicenseContext {
	/// Deployment environment name (`APP_ENV`).
	pub environment: Option<String>,
	/// Host the current request was addressed to, possibly with a port.
	pub host: Option<String>,
	/// `false` for one-off or offline contexts (CLI, cron) where domain binding is skipped.
	pub serving_requests: bool,
	/// Local server address, for the first-party infrastructure rule.
	pub server_address: Option<String>,
}
impl LicenseContext {
	/// Offline context: domain binding is not enforced.
	pub fn offline() -> Self {
		Self::default()
	}

	/// Request-serving context for `host`.
	pub fn request(host: impl Into<String>) -> Self {
		Self { host: Some(host.into()), serving_requests: true, ..Default::default() }
	}

	/// Sets the deployment environment.
	pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
		self.environment = Some(environment.into());

		self
	}

	/// Sets the local server address.
	pub fn with_server_address(mut self, address: impl Into<String>) -> Self {
		self.server_address = Some(address.into());

		self
	}

	/// Returns `true` in the development environment.
	pub fn is_dev(&self) -> bool {
		self.environment.as_deref() == Some(DEV_ENVIRONMENT)
	}

	fn host_matches(&self, domain: &str) -> bool {
		let host = self.host.as_deref().unwrap_or_default();
		let host = host.split(':').next().unwrap_or_default();

		host.eq_ignore_ascii_case(domain)
	}
}

/// Verifies signed license artifacts.
#[derive(Clone, Debug)]
pub struct LicenseVerifier {
	key: VerifyingKey<Sha256>,
	infra: OfficialInfra,
}
impl LicenseVerifier {
	/// Creates a verifier trusting the vendor key.
	pub fn new() -> Result<Self, ConfigError> {
		Self::with_public_key_pem(LICENSE_PUBLIC_KEY_PEM)
	}

	/// Creates a verifier trusting an SPKI PEM public key.
	pub fn with_public_key_pem(pem: &str) -> Result<Self, ConfigError> {
		let key = RsaPublicKey::from_public_key_pem(pem.trim())
			.map_err(|e| ConfigError::InvalidPublicKey { reason: e.to_string() })?;

		Ok(Self { key: VerifyingKey::new(key), infra: OfficialInfra::default() })
	}

	/// Replaces the first-party infrastructure rule.
	pub fn with_infra(mut self, infra: OfficialInfra) -> Self {
		self.infra = infra;

		self
	}

	/// Verifies the artifact at `path` for the given caller context.
	///
	/// A missing or unreadable file yields community defaults. Any status other than
	/// `VERIFIED`, `DEV_MODE`, or `INVALID_DOMAIN` is upgraded to `OFFICIAL_INFRA` when the
	/// host is first-party infrastructure.
	pub fn verify(&self, path: &Path, context: &LicenseContext) -> LicenseInfo {
		const KIND: FlowKind = FlowKind::License;

		let span = FlowSpan::new(KIND, "verify");
		let _guard = span.clone().entered();

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let info = if context.is_dev() {
			LicenseInfo {
				edition: ENTERPRISE_EDITION.into(),
				..LicenseInfo::with_status(LicenseStatus::DevMode)
			}
		} else {
			let artifact = match std::fs::read_to_string(path) {
				Ok(raw) => raw,
				Err(e) => {
					obs::event!(
						debug,
						path = %path.display(),
						error = %e,
						"License artifact not readable."
					);

					#[cfg(not(feature = "tracing"))]
					let _ = e;

					String::new()
				},
			};
			let mut info = self.verify_artifact(&artifact, context);

			if !matches!(
				info.status,
				LicenseStatus::Verified | LicenseStatus::DevMode | LicenseStatus::InvalidDomain
			) && self.infra.matches(context.server_address.as_deref())
			{
				info.status = LicenseStatus::OfficialInfra;
				info.edition = ENTERPRISE_EDITION.into();
			}

			info
		};

		obs::event!(info, status = %info.status, edition = %info.edition, "License verified.");
		span.record_license_status(info.status);
		obs::record_license_status(info.status);

		match info.status {
			LicenseStatus::Verified | LicenseStatus::DevMode | LicenseStatus::OfficialInfra =>
				obs::record_flow_outcome(KIND, FlowOutcome::Success),
			_ => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		info
	}

	/// Verifies the artifact at the configured location.
	///
	/// The configured `APP_ENV` applies when `context` names no environment of its own.
	pub fn verify_configured(
		&self,
		config: &CredentialConfig,
		context: &LicenseContext,
	) -> LicenseInfo {
		let context = LicenseContext {
			environment: context.environment.clone().or_else(|| config.app_env.clone()),
			..context.clone()
		};

		self.verify(config.license_path(), &context)
	}

	/// Verifies artifact text without consulting the environment or the infrastructure rule.
	///
	/// A correctly signed artifact bound to another host reports `INVALID_DOMAIN` with every
	/// signed claim intact; gates treat the status, not the edition, as authoritative.
	pub fn verify_artifact(&self, artifact: &str, context: &LicenseContext) -> LicenseInfo {
		let artifact = artifact.trim();

		if artifact.is_empty() {
			return LicenseInfo::community();
		}

		let Some((payload, signature)) = artifact.rsplit_once('.') else {
			return LicenseInfo::with_status(LicenseStatus::InvalidSignature);
		};

		if !self.signature_matches(payload, signature) {
			return LicenseInfo::with_status(LicenseStatus::InvalidSignature);
		}

		let Some(claims) = parse_payload(payload) else {
			return LicenseInfo::with_status(LicenseStatus::InvalidPrefix);
		};

		let bound_elsewhere = claims
			.domain
			.as_deref()
			.is_some_and(|domain| context.serving_requests && !context.host_matches(domain));

		LicenseInfo {
			status: if bound_elsewhere {
				LicenseStatus::InvalidDomain
			} else {
				LicenseStatus::Verified
			},
			edition: claims.edition,
			year: Some(claims.year),
			tier: claims.tier,
			domain: claims.domain,
			payload: Some(payload.into()),
			schema: Some(claims.schema),
		}
	}

	fn signature_matches(&self, payload: &str, signature: &str) -> bool {
		let Ok(raw) = STANDARD.decode(signature.trim()) else {
			return false;
		};
		let Ok(signature) = Signature::try_from(raw.as_slice()) else {
			return false;
		};

		self.key.verify(payload.as_bytes(), &signature).is_ok()
	}
}
