//! Installation-token cache with per-installation singleflight guards.
//!
//! Entries live for [`INSTALLATION_TOKEN_TTL`], deliberately shorter than GitHub's one-hour
//! expiry so a cached token never races its upstream deadline. Concurrent misses for the same
//! installation serialize on a guard; the first caller performs the exchange and the rest
//! re-read the cache once the guard is released. Failed exchanges are never stored.

// self
use crate::{
	_prelude::*,
	auth::{InstallationId, TokenSecret},
	github::transport::InstallationGrant,
	obs,
};

/// Local lifetime of a cached installation token.
pub const INSTALLATION_TOKEN_TTL: Duration = Duration::minutes(55);

/// Delegated, installation-scoped bearer token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallationToken {
	/// Installation the token is scoped to.
	pub installation: InstallationId,
	/// Bearer secret.
	pub token: TokenSecret,
	/// Instant the token was obtained.
	pub issued_at: OffsetDateTime,
	/// Instant after which the cache stops serving the token.
	pub expires_at: OffsetDateTime,
}
impl InstallationToken {
	/// Builds a cache entry from an exchange response received at `now`.
	///
	/// The local expiry is the earlier of `now + ttl` and the upstream expiry.
	pub fn from_grant(
		installation: InstallationId,
		grant: InstallationGrant,
		now: OffsetDateTime,
		ttl: Duration,
	) -> Self {
		let local = now + ttl;
		let expires_at = grant.expires_at.map_or(local, |upstream| upstream.min(local));

		Self { installation, token: grant.token, issued_at: now, expires_at }
	}

	/// Returns `true` once `now` reaches the local expiry.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		now >= self.expires_at
	}
}

/// Concurrent get-or-exchange cache keyed by installation id.
#[derive(Debug)]
pub struct InstallationCache {
	ttl: Duration,
	entries: RwLock<HashMap<InstallationId, InstallationToken>>,
	guards: Mutex<HashMap<InstallationId, Arc<AsyncMutex<()>>>>,
}
impl InstallationCache {
	/// Creates an empty cache with the default TTL.
	pub fn new() -> Self {
		Self::with_ttl(INSTALLATION_TOKEN_TTL)
	}

	/// Creates an empty cache with a custom TTL.
	pub fn with_ttl(ttl: Duration) -> Self {
		Self { ttl, entries: Default::default(), guards: Default::default() }
	}

	/// Local TTL applied to new entries.
	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	/// Returns the cached token when it is still fresh at `now`.
	pub fn get_fresh(
		&self,
		installation: InstallationId,
		now: OffsetDateTime,
	) -> Option<InstallationToken> {
		self.entries.read().get(&installation).filter(|token| !token.is_expired_at(now)).cloned()
	}

	/// Drops any cached token for `installation`.
	pub fn invalidate(&self, installation: InstallationId) {
		self.entries.write().remove(&installation);
	}

	/// Returns a fresh cached token or runs `exchange` exactly once per concurrent miss.
	pub async fn get_or_exchange<F, Fut>(
		&self,
		installation: InstallationId,
		now: OffsetDateTime,
		exchange: F,
	) -> Result<InstallationToken>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<InstallationGrant>>,
	{
		if let Some(hit) = self.get_fresh(installation, now) {
			obs::event!(debug, installation = installation.get(), "Installation token cache hit.");
			obs::record_installation_cache(true);

			return Ok(hit);
		}

		let guard = self.guard(installation);
		let result: Result<InstallationToken> = async {
			let _singleflight = guard.lock().await;

			if let Some(hit) = self.get_fresh(installation, now) {
				obs::record_installation_cache(true);

				return Ok(hit);
			}

			obs::event!(
				debug,
				installation = installation.get(),
				"Installation token cache miss."
			);
			obs::record_installation_cache(false);

			let grant = exchange().await?;
			let token = InstallationToken::from_grant(installation, grant, now, self.ttl);

			self.entries.write().insert(installation, token.clone());

			Ok(token)
		}
		.await;

		self.release_guard(installation, guard);

		result
	}

	fn guard(&self, installation: InstallationId) -> Arc<AsyncMutex<()>> {
		let mut guards = self.guards.lock();

		guards.entry(installation).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
	}

	// Clones are only taken under the map lock, so a count of two means the map and `guard`
	// are the sole holders.
	fn release_guard(&self, installation: InstallationId, guard: Arc<AsyncMutex<()>>) {
		let mut guards = self.guards.lock();

		if Arc::strong_count(&guard) == 2 {
			guards.remove(&installation);
		}
	}

	#[cfg(test)]
	fn pending_guards(&self) -> usize {
		self.guards.lock().len()
	}
}
impl Default for InstallationCache {
	fn default() -> Self {
		Self::new()
	}
}
