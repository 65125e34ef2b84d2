//! Ready-to-use credentials handed back by the identity broker.

// self
use crate::{_prelude::*, auth::InstallationId, auth::TokenSecret};

/// Which identity produced a handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Identity {
	/// Bare App assertion (no installation was requested).
	AppAssertion,
	/// Installation-scoped token minted for the App.
	Installation(InstallationId),
	/// Personal access token picked from the pool.
	PersonalToken {
		/// Pool slot of the selected token.
		index: usize,
		/// `true` when every pooled token was below the low-water mark.
		exhausted: bool,
	},
}
impl Identity {
	/// Returns `true` for identities that act as the GitHub App.
	pub fn is_bot(self) -> bool {
		matches!(self, Self::AppAssertion | Self::Installation(_))
	}
}

/// Bearer credential ready to be attached to GitHub API requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedHandle {
	/// Identity backing the credential.
	pub identity: Identity,
	/// Bearer secret.
	pub secret: TokenSecret,
	/// Known expiry; `None` for personal tokens.
	pub expires_at: Option<OffsetDateTime>,
}
impl AuthenticatedHandle {
	/// Renders the `Authorization` header value.
	pub fn authorization_header(&self) -> String {
		format!("Bearer {}", self.secret.expose())
	}
}

/// Attaches a broker-issued handle to an outbound request without constraining the client type.
pub trait RequestSignerExt<Request>
where
	Self: Send + Sync,
{
	/// Injects the handle's bearer credential into `request`.
	fn sign_request(&self, request: Request) -> Request;
}
#[cfg(feature = "reqwest")]
impl RequestSignerExt<reqwest::RequestBuilder> for AuthenticatedHandle {
	fn sign_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
		request.bearer_auth(self.secret.expose())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn handle(identity: Identity) -> AuthenticatedHandle {
		AuthenticatedHandle { identity, secret: TokenSecret::new("ghs_abc"), expires_at: None }
	}

	#[test]
	fn header_uses_bearer_scheme_and_debug_redacts() {
		let handle = handle(Identity::Installation(InstallationId::new(9)));

		assert_eq!(handle.authorization_header(), "Bearer ghs_abc");
		assert!(!format!("{handle:?}").contains("ghs_abc"));
	}

	#[test]
	fn bot_identities_are_distinguished_from_personal_tokens() {
		assert!(Identity::AppAssertion.is_bot());
		assert!(Identity::Installation(InstallationId::new(1)).is_bot());
		assert!(!Identity::PersonalToken { index: 0, exhausted: false }.is_bot());
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn reqwest_requests_receive_the_authorization_header() {
		let client = ReqwestClient::new();
		let request = handle(Identity::AppAssertion)
			.sign_request(client.get("https://api.github.com/rate_limit"))
			.build()
			.expect("Request should build.");

		assert_eq!(
			request.headers().get(reqwest::header::AUTHORIZATION).map(|v| v.as_bytes()),
			Some(b"Bearer ghs_abc".as_slice())
		);
	}
}
