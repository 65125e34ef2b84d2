//! Identity broker: App assertions, cached installation tokens, and the rotating PAT pool.
//!
//! Callers ask for an [`AuthenticatedHandle`] and never deal with assertions or token
//! exchanges directly. The bot identity ([`IdentityBroker::bot_handle`]) only ever acts as the
//! GitHub App; the scanner identity ([`IdentityBroker::scanner_handle`]) only ever draws from
//! the personal token pool. Neither falls back to the other.

// self
use crate::{
	_prelude::*,
	auth::InstallationId,
	error::ConfigError,
	github::{
		app::AppCredential,
		handle::{AuthenticatedHandle, Identity},
		installation::{InstallationCache, InstallationToken},
		pool::PatPool,
		transport::GithubTransport,
	},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};
#[cfg(feature = "reqwest")]
use crate::{
	config::CredentialConfig,
	github::{pool, transport::ReqwestGithubTransport},
};

/// Broker specialized for the crate's default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestIdentityBroker = IdentityBroker<ReqwestGithubTransport>;

/// Hands out GitHub credentials for the bot and scanner identities.
pub struct IdentityBroker<T>
where
	T: ?Sized + GithubTransport,
{
	transport: Arc<T>,
	app: Option<AppCredential>,
	installations: InstallationCache,
	pool: PatPool,
}
impl<T> IdentityBroker<T>
where
	T: ?Sized + GithubTransport,
{
	/// Creates a broker over a caller-provided transport.
	pub fn with_transport(
		app: Option<AppCredential>,
		pool: PatPool,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self { transport: transport.into(), app, installations: InstallationCache::new(), pool }
	}

	/// Replaces the installation cache (for example to shorten its TTL).
	pub fn with_installation_cache(mut self, cache: InstallationCache) -> Self {
		self.installations = cache;

		self
	}

	/// Transport used for outbound calls.
	pub fn transport(&self) -> &Arc<T> {
		&self.transport
	}

	/// Installation-token cache.
	pub fn installations(&self) -> &InstallationCache {
		&self.installations
	}

	/// Personal token pool.
	pub fn pool(&self) -> &PatPool {
		&self.pool
	}

	/// Returns `true` when App credentials are configured.
	pub fn has_app(&self) -> bool {
		self.app.is_some()
	}

	/// Dispatches to the scanner identity when `force_pat` is set, else to the bot identity.
	pub async fn handle(
		&self,
		installation: Option<InstallationId>,
		force_pat: bool,
	) -> Result<AuthenticatedHandle> {
		if force_pat { self.scanner_handle().await } else { self.bot_handle(installation).await }
	}

	/// Returns a handle acting as the GitHub App.
	///
	/// With an installation id the handle carries a (possibly cached) installation token;
	/// without one it carries the bare App assertion.
	pub async fn bot_handle(
		&self,
		installation: Option<InstallationId>,
	) -> Result<AuthenticatedHandle> {
		self.bot_handle_at(installation, OffsetDateTime::now_utc()).await
	}

	/// [`IdentityBroker::bot_handle`] against an explicit clock.
	pub async fn bot_handle_at(
		&self,
		installation: Option<InstallationId>,
		now: OffsetDateTime,
	) -> Result<AuthenticatedHandle> {
		let app = self.app()?;

		match installation {
			Some(installation) => {
				let token = self.installation_token_at(Some(installation), now).await?;

				Ok(AuthenticatedHandle {
					identity: Identity::Installation(installation),
					secret: token.token,
					expires_at: Some(token.expires_at),
				})
			},
			None => {
				let assertion = app.mint_assertion_at(now)?;

				Ok(AuthenticatedHandle {
					identity: Identity::AppAssertion,
					secret: assertion.token,
					expires_at: Some(assertion.expires_at),
				})
			},
		}
	}

	/// Returns the installation token for `installation`, exchanging on a cache miss.
	pub async fn installation_token(
		&self,
		installation: Option<InstallationId>,
	) -> Result<InstallationToken> {
		self.installation_token_at(installation, OffsetDateTime::now_utc()).await
	}

	/// [`IdentityBroker::installation_token`] against an explicit clock.
	pub async fn installation_token_at(
		&self,
		installation: Option<InstallationId>,
		now: OffsetDateTime,
	) -> Result<InstallationToken> {
		let installation = installation.ok_or(ConfigError::MissingInstallation)?;
		let app = self.app()?;

		let span = FlowSpan::for_installation(installation, "installation_token");

		observed(&span, async move {
			self.installations
				.get_or_exchange(installation, now, || async move {
					let assertion = app.mint_assertion_at(now)?;

					self.transport
						.create_installation_token(assertion.token.expose(), installation)
						.await
				})
				.await
		})
		.await
	}

	/// Returns a handle backed by the pooled personal token with the most headroom.
	pub async fn scanner_handle(&self) -> Result<AuthenticatedHandle> {
		self.scanner_handle_at(OffsetDateTime::now_utc()).await
	}

	/// [`IdentityBroker::scanner_handle`] against an explicit clock.
	pub async fn scanner_handle_at(&self, now: OffsetDateTime) -> Result<AuthenticatedHandle> {
		if self.pool.is_empty() {
			return Err(ConfigError::EmptyTokenPool.into());
		}

		let span = FlowSpan::new(FlowKind::PatRotation, "scanner_handle");

		observed(&span, async {
			let selection = self
				.pool
				.select_at(self.transport.as_ref(), now)
				.await
				.ok_or(ConfigError::EmptyTokenPool)?;

			span.record_pool_slot(selection.index, selection.exhausted);

			Ok(AuthenticatedHandle {
				identity: Identity::PersonalToken {
					index: selection.index,
					exhausted: selection.exhausted,
				},
				secret: selection.token,
				expires_at: None,
			})
		})
		.await
	}

	fn app(&self) -> Result<&AppCredential, ConfigError> {
		self.app.as_ref().ok_or(ConfigError::MissingAppCredential)
	}
}
#[cfg(feature = "reqwest")]
impl IdentityBroker<ReqwestGithubTransport> {
	/// Builds a reqwest-backed broker from configuration.
	///
	/// App credentials are optional as a pair; supplying only one half is an error.
	pub fn from_config(config: &CredentialConfig) -> Result<Self, ConfigError> {
		let transport = ReqwestGithubTransport::with_base_url(config.api_url())?;
		let app = config.app_credential()?;
		let tokens = pool::parse_token_list(config.github_tokens.as_deref().unwrap_or_default());

		Ok(Self::with_transport(app, PatPool::new(tokens), transport))
	}
}
impl<T> Debug for IdentityBroker<T>
where
	T: ?Sized + GithubTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IdentityBroker")
			.field("app", &self.app)
			.field("pool_size", &self.pool.len())
			.field("installation_ttl", &self.installations.ttl())
			.finish()
	}
}

async fn observed<V, Fut>(span: &FlowSpan, fut: Fut) -> Result<V>
where
	Fut: Future<Output = Result<V>>,
{
	let kind = span.kind();

	obs::record_flow_outcome(kind, FlowOutcome::Attempt);

	let result = span.instrument(fut).await;

	match &result {
		Ok(_) => obs::record_flow_outcome(kind, FlowOutcome::Success),
		Err(_) => obs::record_flow_outcome(kind, FlowOutcome::Failure),
	}

	result
}
