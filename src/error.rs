//! Crate-level error types shared across the identity broker, token codec, license verifier, and
//! attestation ritual.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem; fatal and never retried.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The external API rejected an assertion or token.
	#[error(transparent)]
	Upstream(#[from] UpstreamError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Keyed token could not be validated.
	#[error(transparent)]
	Token(#[from] TokenError),
	/// Contributor agreement submission failed validation.
	#[error(transparent)]
	Ritual(#[from] RitualError),
	/// License enforcement refused to continue.
	#[error(transparent)]
	License(#[from] LicenseError),
}

/// Configuration and validation failures raised at construction time.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// GitHub App identifier is missing or not numeric.
	#[error("GitHub App identifier is missing or invalid.")]
	MissingAppId,
	/// GitHub App private key is missing.
	#[error("GitHub App private key is missing.")]
	MissingPrivateKey,
	/// GitHub App private key could not be parsed as PKCS#1 or PKCS#8 PEM.
	#[error("GitHub App private key is not a valid RSA PEM: {reason}.")]
	InvalidPrivateKey {
		/// Parser failure summary.
		reason: String,
	},
	/// No App credential was configured but the bot identity was requested.
	#[error("GitHub App credentials are missing for the bot identity.")]
	MissingAppCredential,
	/// An installation identifier is required for this call.
	#[error("Installation identifier is required to mint a bot token.")]
	MissingInstallation,
	/// Personal token pool is empty.
	#[error("No GitHub tokens are available for the scanner identity.")]
	EmptyTokenPool,
	/// Keyed token secret is empty.
	#[error("Keyed token secret cannot be empty.")]
	EmptyTokenSecret,
	/// Seal seed is not 32 hex-encoded bytes.
	#[error("Seal seed must be 32 hex-encoded bytes.")]
	InvalidSealSeed,
	/// Neither an application secret nor a provisioned seed is configured.
	#[error("No seal key source is configured.")]
	MissingSealKey,
	/// License verification public key could not be parsed.
	#[error("License public key is not a valid SPKI PEM: {reason}.")]
	InvalidPublicKey {
		/// Parser failure summary.
		reason: String,
	},
	/// API base URL cannot be parsed.
	#[error("API base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Assertion signing failed.
	#[error("Failed to sign the App assertion: {reason}.")]
	AssertionSigning {
		/// Signer failure summary.
		reason: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Responses from the external API that are surfaced to the caller without retry.
#[derive(Debug, ThisError)]
pub enum UpstreamError {
	/// Non-success HTTP status returned by the API.
	#[error("GitHub API rejected the request with status {status}: {message}.")]
	Rejected {
		/// HTTP status code.
		status: u16,
		/// Message extracted from the response body.
		message: String,
	},
	/// Response body could not be parsed.
	#[error("GitHub API returned malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code.
		status: u16,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the GitHub API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the GitHub API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Keyed token validation failures; every variant means "invalid or expired".
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum TokenError {
	/// Token does not have three decodable segments.
	#[error("Token is malformed.")]
	Malformed,
	/// Keyed hash does not match.
	#[error("Token signature is invalid.")]
	InvalidSignature,
	/// Token expired.
	#[error("Token expired at {expired_at}.")]
	Expired {
		/// Expiry claim, in unix seconds.
		expired_at: i64,
	},
}

/// User-facing validation failures raised while signing a contributor agreement.
///
/// All variants are recoverable: the caller re-presents the form to the signer.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RitualError {
	/// Signer has not linked the secondary platform account.
	#[error("A linked GitLab account is required before signing.")]
	MissingLinkedAccount,
	/// Entered challenge does not match the current document.
	#[error("Challenge verification failed; enter the last 6 characters shown.")]
	ChallengeMismatch,
	/// Typed agreement phrase does not match the rendered template.
	#[error("Agreement phrase does not match the expected text.")]
	AgreementTextMismatch,
	/// Drawn signature payload is missing or too small.
	#[error("A drawn signature is required.")]
	MissingSignatureImage,
	/// Legal name is empty.
	#[error("The signer's full legal name is required.")]
	MissingSignerName,
	/// Seal does not verify against the supplied public key.
	#[error("Seal signature does not match the event digest.")]
	SignatureMismatch,
}

/// License enforcement failures.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum LicenseError {
	/// An enterprise-only code path was reached without a valid license. Callers must stop
	/// serving the request (or terminate the process) instead of continuing.
	#[error("Enterprise module halted: license status {status}, edition {edition}.")]
	MustHalt {
		/// License status observed by the verifier.
		status: crate::license::LicenseStatus,
		/// Edition (type) claim observed by the verifier.
		edition: String,
	},
}
