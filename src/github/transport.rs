//! Transport contract for the two GitHub endpoints the broker calls.
//!
//! [`GithubTransport`] is the broker's only dependency on an HTTP stack. The default
//! [`ReqwestGithubTransport`] talks to the REST API; tests substitute an in-process stub that
//! counts calls. Implementations never retry: any failure is returned as-is so the broker can
//! decide whether to rotate (rate-limit probes) or surface it (token exchange).

// crates.io
#[cfg(feature = "reqwest")]
use reqwest::{
	Method, Response,
	header::{ACCEPT, USER_AGENT},
};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc3339;
// self
use crate::{_prelude::*, auth::InstallationId, auth::TokenSecret};
#[cfg(feature = "reqwest")]
use crate::error::{ConfigError, TransportError, UpstreamError};

/// Boxed future returned by [`GithubTransport`] calls.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Default GitHub REST API root.
pub const DEFAULT_API_URL: &str = "https://api.github.com/";

/// Outbound calls required by the identity broker.
pub trait GithubTransport
where
	Self: 'static + Send + Sync,
{
	/// Redeems an App assertion for an installation-scoped token.
	fn create_installation_token<'a>(
		&'a self,
		assertion: &'a str,
		installation: InstallationId,
	) -> TransportFuture<'a, InstallationGrant>;

	/// Returns the remaining `core` rate-limit budget for a bearer token.
	fn core_rate_limit_remaining<'a>(&'a self, token: &'a str) -> TransportFuture<'a, u64>;
}

/// Delegated token returned by the token-exchange endpoint.
#[derive(Clone, Debug)]
pub struct InstallationGrant {
	/// Installation-scoped bearer token.
	pub token: TokenSecret,
	/// Upstream expiry, when reported.
	pub expires_at: Option<OffsetDateTime>,
}

#[derive(Deserialize)]
struct InstallationTokenBody {
	token: String,
	#[serde(default)]
	expires_at: Option<String>,
}

#[derive(Deserialize)]
struct RateLimitBody {
	resources: RateLimitResources,
}

#[derive(Deserialize)]
struct RateLimitResources {
	#[serde(default)]
	core: Option<RateLimitResource>,
}

#[derive(Deserialize)]
struct RateLimitResource {
	remaining: u64,
}

#[derive(Deserialize)]
struct ErrorBody {
	#[serde(default)]
	message: Option<String>,
}

/// Reqwest-backed [`GithubTransport`] for the public (or an Enterprise Server) REST API.
///
/// Requests do not follow redirects' semantics beyond reqwest defaults and carry no timeout of
/// their own; configure the wrapped [`ReqwestClient`] to apply one.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestGithubTransport {
	client: ReqwestClient,
	base_url: Url,
}
#[cfg(feature = "reqwest")]
impl ReqwestGithubTransport {
	/// Creates a transport for `https://api.github.com/`.
	pub fn new() -> Result<Self, ConfigError> {
		Self::with_base_url(DEFAULT_API_URL)
	}

	/// Creates a transport rooted at `base_url` (for GitHub Enterprise Server or mocks).
	pub fn with_base_url(base_url: &str) -> Result<Self, ConfigError> {
		let mut base_url =
			Url::parse(base_url).map_err(|source| ConfigError::InvalidBaseUrl { source })?;

		if !base_url.path().ends_with('/') {
			let path = format!("{}/", base_url.path());

			base_url.set_path(&path);
		}

		Ok(Self { client: ReqwestClient::new(), base_url })
	}

	/// Replaces the underlying reqwest client.
	pub fn with_client(mut self, client: ReqwestClient) -> Self {
		self.client = client;

		self
	}

	/// API root every endpoint is resolved against.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	fn endpoint(&self, path: &str) -> Result<Url> {
		self.base_url
			.join(path)
			.map_err(|source| ConfigError::InvalidBaseUrl { source }.into())
	}

	async fn send(&self, method: Method, url: Url, bearer: &str) -> Result<(u16, Vec<u8>)> {
		let response: Response = self
			.client
			.request(method, url)
			.bearer_auth(bearer)
			.header(ACCEPT, "application/vnd.github+json")
			.header(USER_AGENT, concat!("tick-credentials/", env!("CARGO_PKG_VERSION")))
			.header("X-GitHub-Api-Version", "2022-11-28")
			.send()
			.await
			.map_err(TransportError::from)?;
		let status = response.status();
		let body = response.bytes().await.map_err(TransportError::from)?.to_vec();

		if !status.is_success() {
			let message = serde_json::from_slice::<ErrorBody>(&body)
				.ok()
				.and_then(|b| b.message)
				.unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").into());

			return Err(UpstreamError::Rejected { status: status.as_u16(), message }.into());
		}

		Ok((status.as_u16(), body))
	}
}
#[cfg(feature = "reqwest")]
impl GithubTransport for ReqwestGithubTransport {
	fn create_installation_token<'a>(
		&'a self,
		assertion: &'a str,
		installation: InstallationId,
	) -> TransportFuture<'a, InstallationGrant> {
		Box::pin(async move {
			let url = self.endpoint(&format!("app/installations/{installation}/access_tokens"))?;
			let (status, body) = self.send(Method::POST, url, assertion).await?;
			let parsed: InstallationTokenBody = parse_body(status, &body)?;

			Ok(InstallationGrant {
				token: TokenSecret::new(parsed.token),
				expires_at: parsed
					.expires_at
					.and_then(|raw| OffsetDateTime::parse(&raw, &Rfc3339).ok()),
			})
		})
	}

	fn core_rate_limit_remaining<'a>(&'a self, token: &'a str) -> TransportFuture<'a, u64> {
		Box::pin(async move {
			let url = self.endpoint("rate_limit")?;
			let (status, body) = self.send(Method::GET, url, token).await?;
			let parsed: RateLimitBody = parse_body(status, &body)?;

			Ok(parsed.resources.core.map(|core| core.remaining).unwrap_or(0))
		})
	}
}

fn parse_body<T>(status: u16, body: &[u8]) -> Result<T>
where
	T: for<'de> Deserialize<'de>,
{
	let mut de = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut de)
		.map_err(|source| crate::error::UpstreamError::ResponseParse { source, status }.into())
}
