//! Canonical seal payload and the persisted signature record.
//!
//! The canonical payload is a fixed-order, pipe-joined field list. Its byte layout is frozen
//! per schema: [`SealSchema::V1`] is the ten-field layout every seal uses unless told otherwise,
//! [`SealSchema::V2`] prefixes the same fields with a schema id so later versions can extend
//! the list without breaking older seals.

// self
use crate::{_prelude::*, auth::ClaSlug, cla::challenge};

/// Schema id opening every V2 canonical payload.
pub const SEAL_SCHEMA_V2_ID: &str = "cla-seal/v2";
/// Field delimiter of the canonical payload.
pub const CANONICAL_DELIMITER: &str = "|";

/// Canonical payload layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SealSchema {
	/// Ten positional fields, no schema id.
	#[default]
	V1,
	/// Schema id followed by the V1 fields.
	V2,
}

/// Inputs of the canonical payload, in their frozen order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanonicalPayload {
	/// Hex SHA-256 of the agreement text.
	pub document_digest: String,
	/// Declared legal name as typed.
	pub signer_name: String,
	/// Numeric GitHub account id.
	pub github_id: u64,
	/// Numeric GitLab account id.
	pub gitlab_id: u64,
	/// Hex SHA-256 of the normalized email.
	pub email_digest: String,
	/// Hex SHA-256 of the drawn signature payload.
	pub image_digest: String,
	/// Signing instant (UTC).
	pub signed_at: OffsetDateTime,
	/// Client address.
	pub client_ip: String,
	/// Client user agent as sent.
	pub user_agent: String,
	/// 64 hex characters of randomness.
	pub nonce: String,
}
impl CanonicalPayload {
	/// Ordered field values for `schema`.
	pub fn fields(&self, schema: SealSchema) -> Vec<String> {
		let mut fields = Vec::with_capacity(11);

		if schema == SealSchema::V2 {
			fields.push(SEAL_SCHEMA_V2_ID.to_owned());
		}

		fields.extend([
			self.document_digest.clone(),
			self.signer_name.trim().to_uppercase(),
			self.github_id.to_string(),
			self.gitlab_id.to_string(),
			self.email_digest.clone(),
			self.image_digest.clone(),
			format_timestamp(self.signed_at),
			self.client_ip.clone(),
			self.user_agent.trim().to_owned(),
			self.nonce.clone(),
		]);

		fields
	}

	/// Pipe-joined payload text.
	pub fn render(&self, schema: SealSchema) -> String {
		self.fields(schema).join(CANONICAL_DELIMITER)
	}

	/// Hex SHA-256 of the rendered payload (the event digest).
	pub fn digest(&self, schema: SealSchema) -> String {
		challenge::sha256_hex(self.render(schema))
	}
}

/// Sealed signature record handed to persistence and printing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaSignatureRecord {
	/// Agreement version signed.
	pub slug: ClaSlug,
	/// GitHub login at signing time.
	pub github_username: String,
	/// GitLab login at signing time.
	pub gitlab_username: String,
	/// Numeric GitHub account id.
	pub github_id: u64,
	/// Numeric GitLab account id.
	pub gitlab_id: u64,
	/// Declared legal name as typed.
	pub signer_name: String,
	/// Drawn signature payload.
	pub signature_image: String,
	/// Hex SHA-256 of the normalized email.
	pub email_digest: String,
	/// Client address.
	pub client_ip: String,
	/// Client user agent as sent.
	pub user_agent: String,
	/// Random nonce included in the payload.
	pub nonce: String,
	/// Signing instant.
	#[serde(with = "time::serde::rfc3339")]
	pub signed_at: OffsetDateTime,
	/// Canonical payload layout; records stored before the field existed are V1.
	#[serde(default)]
	pub schema: SealSchema,
	/// Hex SHA-256 of the canonical payload.
	pub event_digest: String,
	/// Hex Ed25519 signature over the event digest text.
	pub server_signature: String,
	/// Set once the ritual completed.
	pub verified: bool,
}

/// Formats `at` as `YYYY-MM-DDTHH:MM:SSZ` in UTC.
pub fn format_timestamp(at: OffsetDateTime) -> String {
	let at = at.to_offset(time::UtcOffset::UTC);

	format!(
		"{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
		at.year(),
		u8::from(at.month()),
		at.day(),
		at.hour(),
		at.minute(),
		at.second()
	)
}
