//! Contributor license agreement ceremony.
//!
//! Phase A renders a [`ClaView`] carrying a six-character challenge derived from the live
//! document and the signer's identities. Phase B ([`AttestationRitual::verify_submission`])
//! re-derives that challenge, checks the typed agreement phrase, the drawn signature, and the
//! legal name. [`AttestationRitual::seal`] then hashes the canonical payload and signs the
//! digest with the server's Ed25519 key, producing a [`ClaSignatureRecord`].

pub mod agreement;
pub mod challenge;
pub mod record;
pub mod seal;

pub use agreement::*;
pub use challenge::*;
pub use record::*;
pub use seal::*;

// crates.io
use ed25519_dalek::VerifyingKey;
// self
use crate::{
	_prelude::*,
	auth::ClaSlug,
	error::RitualError,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Drawn signatures shorter than this many bytes are treated as missing.
pub const MIN_SIGNATURE_IMAGE_LEN: usize = 100;

/// Published agreement version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaDocument {
	/// Version slug.
	pub slug: ClaSlug,
	/// Full agreement text.
	pub content: String,
}

/// Identities of the person signing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaSigner {
	/// Account email.
	pub email: String,
	/// GitHub login.
	pub github_username: String,
	/// Numeric GitHub account id.
	pub github_id: u64,
	/// Linked GitLab login, if any.
	pub gitlab_username: Option<String>,
	/// Linked numeric GitLab account id, if any.
	pub gitlab_id: Option<u64>,
}
impl ClaSigner {
	fn linked_gitlab(&self) -> Option<(&str, u64)> {
		let username = self.gitlab_username.as_deref().filter(|u| !u.trim().is_empty())?;
		let id = self.gitlab_id.filter(|id| *id != 0)?;

		Some((username, id))
	}
}

/// Form values submitted in phase B.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClaSubmission {
	/// Challenge typed by the signer.
	pub challenge: String,
	/// Agreement phrase typed by the signer.
	pub agreement_text: String,
	/// Drawn signature payload (usually a data URL).
	pub signature_image: String,
	/// Declared legal name.
	pub signer_name: String,
	/// Client address.
	pub client_ip: String,
	/// Client user agent.
	pub user_agent: String,
}

/// Everything the signing page shows before submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClaView {
	/// Version slug.
	pub slug: ClaSlug,
	/// Six-character challenge.
	pub challenge: String,
	/// Hex SHA-256 of the agreement text.
	pub document_digest: String,
	/// Hex SHA-256 of the normalized email.
	pub email_digest: String,
	/// Numeric GitHub account id.
	pub github_id: u64,
	/// Linked numeric GitLab account id.
	pub gitlab_id: Option<u64>,
	/// Raw agreement template with placeholders.
	pub agreement_template: String,
	/// Template rendered with the GitHub login as the name.
	pub agreement_preview: String,
	/// Whether the caller already holds a verified signature for this version.
	pub already_signed: bool,
}

/// Runs the two-phase ceremony and seals accepted submissions.
#[derive(Clone, Debug)]
pub struct AttestationRitual {
	key: SealKey,
	template: AgreementTemplate,
	schema: SealSchema,
}
impl AttestationRitual {
	/// Creates a ritual sealing with `key`, the default template, and the V1 payload layout.
	pub fn new(key: SealKey) -> Self {
		Self { key, template: AgreementTemplate::default(), schema: SealSchema::default() }
	}

	/// Replaces the agreement template.
	pub fn with_template(mut self, template: AgreementTemplate) -> Self {
		self.template = template;

		self
	}

	/// Selects the canonical payload layout for new seals; V2 is opt-in.
	pub fn with_schema(mut self, schema: SealSchema) -> Self {
		self.schema = schema;

		self
	}

	/// Public key that verifies this ritual's seals.
	pub fn verifying_key(&self) -> VerifyingKey {
		self.key.verifying_key()
	}

	/// Phase A: what the signer is shown.
	pub fn view(
		&self,
		document: &ClaDocument,
		signer: &ClaSigner,
		already_signed: bool,
	) -> ClaView {
		let document_digest = document_digest(&document.content);

		ClaView {
			slug: document.slug.clone(),
			challenge: self.expected_challenge(&document_digest, signer),
			email_digest: email_digest(&signer.email),
			github_id: signer.github_id,
			gitlab_id: signer.gitlab_id,
			agreement_template: self.template.as_str().to_owned(),
			agreement_preview: self.template.render("", &signer.github_username, &document.slug),
			document_digest,
			already_signed,
		}
	}

	/// Phase B: validates a submission without sealing it.
	///
	/// Checks run in a fixed order and the first failure is returned: linked GitLab account,
	/// challenge, agreement phrase, signature image, legal name.
	pub fn verify_submission(
		&self,
		document: &ClaDocument,
		signer: &ClaSigner,
		submission: &ClaSubmission,
	) -> Result<(), RitualError> {
		signer.linked_gitlab().ok_or(RitualError::MissingLinkedAccount)?;

		let expected = self.expected_challenge(&document_digest(&document.content), signer);

		if !challenge_matches(&expected, &submission.challenge) {
			return Err(RitualError::ChallengeMismatch);
		}
		if !self.template.matches(
			&submission.agreement_text,
			&submission.signer_name,
			&signer.github_username,
			&document.slug,
		) {
			return Err(RitualError::AgreementTextMismatch);
		}
		if submission.signature_image.len() < MIN_SIGNATURE_IMAGE_LEN {
			return Err(RitualError::MissingSignatureImage);
		}
		if submission.signer_name.trim().is_empty() {
			return Err(RitualError::MissingSignerName);
		}

		Ok(())
	}

	/// Verifies and seals a submission with a fresh nonce at the current instant.
	pub fn seal(
		&self,
		document: &ClaDocument,
		signer: &ClaSigner,
		submission: &ClaSubmission,
	) -> Result<ClaSignatureRecord, RitualError> {
		self.seal_with(document, signer, submission, rand::random(), OffsetDateTime::now_utc())
	}

	/// [`AttestationRitual::seal`] with an explicit nonce and instant.
	pub fn seal_with(
		&self,
		document: &ClaDocument,
		signer: &ClaSigner,
		submission: &ClaSubmission,
		nonce: [u8; 32],
		signed_at: OffsetDateTime,
	) -> Result<ClaSignatureRecord, RitualError> {
		const KIND: FlowKind = FlowKind::ClaSeal;

		let _span = FlowSpan::new(KIND, "seal").entered();

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		if let Err(e) = self.verify_submission(document, signer, submission) {
			obs::event!(
				info,
				slug = %document.slug,
				reason = %e,
				"Agreement submission rejected."
			);
			obs::record_flow_outcome(KIND, FlowOutcome::Failure);

			return Err(e);
		}

		let (gitlab_username, gitlab_id) =
			signer.linked_gitlab().ok_or(RitualError::MissingLinkedAccount)?;
		let signed_at = signed_at.to_offset(time::UtcOffset::UTC);
		let payload = CanonicalPayload {
			document_digest: document_digest(&document.content),
			signer_name: submission.signer_name.clone(),
			github_id: signer.github_id,
			gitlab_id,
			email_digest: email_digest(&signer.email),
			image_digest: sha256_hex(&submission.signature_image),
			signed_at,
			client_ip: submission.client_ip.clone(),
			user_agent: submission.user_agent.clone(),
			nonce: hex::encode(nonce),
		};
		let event_digest = payload.digest(self.schema);
		let server_signature = self.key.seal(&event_digest);

		obs::event!(
			info,
			slug = %document.slug,
			event_digest = %event_digest,
			"Agreement sealed."
		);
		obs::record_flow_outcome(KIND, FlowOutcome::Success);

		Ok(ClaSignatureRecord {
			slug: document.slug.clone(),
			github_username: signer.github_username.clone(),
			gitlab_username: gitlab_username.to_owned(),
			github_id: signer.github_id,
			gitlab_id,
			signer_name: submission.signer_name.clone(),
			signature_image: submission.signature_image.clone(),
			email_digest: payload.email_digest,
			client_ip: payload.client_ip,
			user_agent: payload.user_agent,
			nonce: payload.nonce,
			signed_at,
			schema: self.schema,
			event_digest,
			server_signature,
			verified: true,
		})
	}

	/// Checks a stored record's seal with this ritual's public key.
	pub fn verify_record(&self, record: &ClaSignatureRecord) -> Result<(), RitualError> {
		verify_seal(&self.verifying_key(), &record.event_digest, &record.server_signature)
	}

	fn expected_challenge(&self, document_digest: &str, signer: &ClaSigner) -> String {
		challenge(
			document_digest,
			&signer.email,
			&signer.github_username,
			signer.gitlab_username.as_deref(),
		)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn document() -> ClaDocument {
		ClaDocument {
			slug: ClaSlug::new("pt-cla-2.0").expect("Slug should be valid."),
			content: "Contributor License Agreement, version 2.0.".into(),
		}
	}

	fn signer() -> ClaSigner {
		ClaSigner {
			email: "Ada@Example.com".into(),
			github_username: "ada".into(),
			github_id: 583_231,
			gitlab_username: Some("ada-gl".into()),
			gitlab_id: Some(11_702),
		}
	}

	fn ritual() -> AttestationRitual {
		AttestationRitual::new(SealKey::from_seed([3; 32]))
	}

	fn submission(ritual: &AttestationRitual) -> ClaSubmission {
		let view = ritual.view(&document(), &signer(), false);

		ClaSubmission {
			challenge: view.challenge.to_uppercase(),
			agreement_text: ritual.template.render("Ada Lovelace", "ada", "pt-cla-2.0"),
			signature_image: format!("data:image/png;base64,{}", "A".repeat(120)),
			signer_name: "Ada Lovelace".into(),
			client_ip: "203.0.113.7".into(),
			user_agent: "Mozilla/5.0".into(),
		}
	}

	#[test]
	fn view_exposes_challenge_and_digests() {
		let view = ritual().view(&document(), &signer(), true);

		assert_eq!(view.challenge.len(), CHALLENGE_LEN);
		assert_eq!(view.document_digest, document_digest(&document().content));
		assert_eq!(view.email_digest, email_digest("ada@example.com"));
		assert!(view.agreement_preview.starts_with("I, ADA, HEREBY"));
		assert!(view.agreement_preview.ends_with("CLA PT-CLA-2.0"));
		assert!(view.already_signed);
	}

	#[test]
	fn checks_run_in_order() {
		let ritual = ritual();
		let valid = submission(&ritual);
		let unlinked = ClaSigner { gitlab_id: None, ..signer() };

		assert_eq!(
			ritual.verify_submission(&document(), &unlinked, &ClaSubmission::default()),
			Err(RitualError::MissingLinkedAccount)
		);
		assert_eq!(
			ritual.verify_submission(&document(), &signer(), &ClaSubmission::default()),
			Err(RitualError::ChallengeMismatch)
		);

		let wrong_text = ClaSubmission { agreement_text: "I AGREE".into(), ..valid.clone() };

		assert_eq!(
			ritual.verify_submission(&document(), &signer(), &wrong_text),
			Err(RitualError::AgreementTextMismatch)
		);

		let short_image = ClaSubmission { signature_image: "x".repeat(99), ..valid.clone() };

		assert_eq!(
			ritual.verify_submission(&document(), &signer(), &short_image),
			Err(RitualError::MissingSignatureImage)
		);

		let exact_image = ClaSubmission { signature_image: "x".repeat(100), ..valid.clone() };

		assert_eq!(ritual.verify_submission(&document(), &signer(), &exact_image), Ok(()));
	}

	#[test]
	fn blank_legal_name_is_rejected_after_the_phrase_check() {
		let ritual = ritual();
		let nameless = ClaSubmission {
			signer_name: "  ".into(),
			agreement_text: ritual.template.render("", "ada", "pt-cla-2.0"),
			..submission(&ritual)
		};

		assert_eq!(
			ritual.verify_submission(&document(), &signer(), &nameless),
			Err(RitualError::MissingSignerName)
		);
	}

	#[test]
	fn sealed_record_verifies_and_carries_inputs() {
		let ritual = ritual();
		let record = ritual
			.seal(&document(), &signer(), &submission(&ritual))
			.expect("Valid submission should be sealed.");

		assert!(record.verified);
		assert_eq!(record.gitlab_username, "ada-gl");
		assert_eq!(record.nonce.len(), 64);
		assert_eq!(record.schema, SealSchema::V1);
		assert_eq!(ritual.verify_record(&record), Ok(()));
	}

	#[test]
	fn default_seal_digest_is_recomputable_from_the_record() {
		let ritual = ritual();
		let record = ritual
			.seal(&document(), &signer(), &submission(&ritual))
			.expect("Valid submission should be sealed.");
		let payload = [
			document_digest(&document().content),
			"ADA LOVELACE".into(),
			record.github_id.to_string(),
			record.gitlab_id.to_string(),
			record.email_digest.clone(),
			sha256_hex(&record.signature_image),
			format_timestamp(record.signed_at),
			record.client_ip.clone(),
			record.user_agent.clone(),
			record.nonce.clone(),
		]
		.join("|");

		assert_eq!(record.event_digest, sha256_hex(payload));
	}

	#[test]
	fn prefixed_layout_is_opt_in() {
		let ritual = ritual().with_schema(SealSchema::V2);
		let record = ritual
			.seal(&document(), &signer(), &submission(&ritual))
			.expect("Valid submission should be sealed.");

		assert_eq!(record.schema, SealSchema::V2);
		assert_eq!(ritual.verify_record(&record), Ok(()));
	}
}
