//! Agreement phrase the signer must type verbatim.

// self
use crate::_prelude::*;

/// Phrase used when no custom template is configured.
pub const DEFAULT_AGREEMENT_TEMPLATE: &str = "I, [NAME], HEREBY ASSIGN AND TRANSFER ALL RIGHT, TITLE, \
	AND INTEREST IN AND TO MY CONTRIBUTIONS UNDER PROJECT TICK CLA [SLUG]";
/// Placeholder replaced by the signer's legal name.
pub const NAME_PLACEHOLDER: &str = "[NAME]";
/// Placeholder replaced by the agreement slug.
pub const SLUG_PLACEHOLDER: &str = "[SLUG]";

/// Agreement phrase template with `[NAME]` and `[SLUG]` placeholders.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgreementTemplate(String);
impl AgreementTemplate {
	/// Wraps a custom template.
	pub fn new(template: impl Into<String>) -> Self {
		Self(template.into())
	}

	/// Raw template text.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Renders the phrase for `signer_name`, falling back to `username` when the name is blank.
	pub fn render(&self, signer_name: &str, username: &str, slug: &str) -> String {
		let name = match signer_name.trim() {
			"" => username.trim(),
			name => name,
		};

		self.0
			.replace(NAME_PLACEHOLDER, &name.to_uppercase())
			.replace(SLUG_PLACEHOLDER, &slug.to_uppercase())
	}

	/// Returns `true` when the typed phrase equals the rendered one after normalization.
	///
	/// An empty submission never matches.
	pub fn matches(&self, submitted: &str, signer_name: &str, username: &str, slug: &str) -> bool {
		let expected = self.render(signer_name, username, slug);

		!submitted.trim().is_empty() && normalize_phrase(submitted) == normalize_phrase(&expected)
	}
}
impl Default for AgreementTemplate {
	fn default() -> Self {
		Self::new(DEFAULT_AGREEMENT_TEMPLATE)
	}
}

/// Trims, upper-cases, and collapses every whitespace run to a single space.
pub fn normalize_phrase(text: &str) -> String {
	text.trim().to_uppercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn render_substitutes_upper_cased_name_and_slug() {
		let rendered = AgreementTemplate::default().render(" Ada Lovelace ", "ada", "pt-cla-2.0");

		assert_eq!(
			rendered,
			"I, ADA LOVELACE, HEREBY ASSIGN AND TRANSFER ALL RIGHT, TITLE, AND INTEREST IN AND TO MY \
			 CONTRIBUTIONS UNDER PROJECT TICK CLA PT-CLA-2.0"
		);
	}

	#[test]
	fn blank_name_falls_back_to_username() {
		let template = AgreementTemplate::new("[NAME] signs [SLUG]");

		assert_eq!(template.render("  ", "octocat", "v1"), "OCTOCAT signs V1");
	}

	#[test]
	fn matching_tolerates_case_and_spacing_but_not_punctuation() {
		let template = AgreementTemplate::new("I, [NAME], AGREE TO [SLUG]");

		assert!(template.matches("  i,   ada,\tagree to  v1 ", "Ada", "ada", "v1"));
		assert!(!template.matches("I ADA AGREE TO V1", "Ada", "ada", "v1"));
		assert!(!template.matches("", "Ada", "ada", "v1"));
	}
}
