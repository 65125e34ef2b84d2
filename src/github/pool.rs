//! Personal-access-token pool rotated by remaining rate-limit budget.
//!
//! Selection starts at a shared cursor and probes at most one token per pool slot. Probe
//! results are cached for [`PROBE_TTL`] under the token's fingerprint so repeated selections
//! do not spend the very budget they are measuring. A failed probe counts as "unknown budget",
//! is logged, and moves the cursor on; it is never cached.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	github::transport::GithubTransport,
	obs,
};

/// Lifetime of a cached rate-limit probe.
pub const PROBE_TTL: Duration = Duration::seconds(60);
/// A token is only selected while its remaining budget is strictly above this mark.
pub const LOW_WATER_MARK: u64 = 10;

/// Splits a comma-separated token list, trimming entries and dropping empty ones.
pub fn parse_token_list(raw: &str) -> Vec<TokenSecret> {
	raw.split(',').map(str::trim).filter(|t| !t.is_empty()).map(TokenSecret::new).collect()
}

/// Cached remaining-budget observation for one token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitEstimate {
	/// Remaining `core` requests reported by the API.
	pub remaining: u64,
	/// Instant of the probe.
	pub checked_at: OffsetDateTime,
}
impl RateLimitEstimate {
	fn is_fresh_at(&self, now: OffsetDateTime, ttl: Duration) -> bool {
		now - self.checked_at < ttl
	}
}

/// Token chosen by [`PatPool::select_at`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatSelection {
	/// Selected bearer token.
	pub token: TokenSecret,
	/// Position of the token in the pool.
	pub index: usize,
	/// Budget estimate that drove the choice; `None` when the last probe failed.
	pub remaining: Option<u64>,
	/// `true` when no token cleared the low-water mark and the last-tried one was returned.
	pub exhausted: bool,
}

/// Rotating pool of personal access tokens.
#[derive(Debug)]
pub struct PatPool {
	tokens: Vec<TokenSecret>,
	cursor: AtomicUsize,
	probe_ttl: Duration,
	probes: RwLock<HashMap<String, RateLimitEstimate>>,
}
impl PatPool {
	/// Creates a pool whose cursor starts at a random slot to spread load across processes.
	pub fn new(tokens: Vec<TokenSecret>) -> Self {
		let start = if tokens.is_empty() { 0 } else { rand::random_range(0..tokens.len()) };

		Self::with_cursor(tokens, start)
	}

	/// Creates a pool whose cursor starts at `start` (modulo the pool size).
	pub fn with_cursor(tokens: Vec<TokenSecret>, start: usize) -> Self {
		let start = if tokens.is_empty() { 0 } else { start % tokens.len() };

		Self {
			tokens,
			cursor: AtomicUsize::new(start),
			probe_ttl: PROBE_TTL,
			probes: Default::default(),
		}
	}

	/// Overrides the probe cache lifetime.
	pub fn with_probe_ttl(mut self, ttl: Duration) -> Self {
		self.probe_ttl = ttl;

		self
	}

	/// Number of configured tokens.
	pub fn len(&self) -> usize {
		self.tokens.len()
	}

	/// Returns `true` when no token is configured.
	pub fn is_empty(&self) -> bool {
		self.tokens.is_empty()
	}

	/// Current cursor position.
	pub fn cursor(&self) -> usize {
		self.cursor.load(Ordering::Relaxed)
	}

	/// Cached budget for `token`, if a probe younger than the TTL exists.
	pub fn cached_estimate(&self, token: &TokenSecret, now: OffsetDateTime) -> Option<u64> {
		self.probes
			.read()
			.get(&token.fingerprint())
			.filter(|estimate| estimate.is_fresh_at(now, self.probe_ttl))
			.map(|estimate| estimate.remaining)
	}

	/// Picks the first token, from the cursor onward, whose budget exceeds [`LOW_WATER_MARK`].
	///
	/// Returns `None` only for an empty pool. When every token is low or unprobeable the
	/// last-tried token is returned with `exhausted = true`; callers must tolerate a
	/// subsequent 403/429.
	pub async fn select_at<T>(&self, transport: &T, now: OffsetDateTime) -> Option<PatSelection>
	where
		T: ?Sized + GithubTransport,
	{
		let len = self.tokens.len();
		let mut last = None;

		for _ in 0..len {
			let index = self.cursor() % len;
			let token = &self.tokens[index];
			let remaining = self.probe(transport, token, now).await;

			if let Some(remaining) = remaining {
				obs::record_pat_budget(index, remaining);
			}

			match remaining {
				Some(remaining) if remaining > LOW_WATER_MARK =>
					return Some(PatSelection {
						token: token.clone(),
						index,
						remaining: Some(remaining),
						exhausted: false,
					}),
				Some(remaining) => obs::event!(
					info,
					index,
					remaining,
					"Token has low or no remaining rate limit; rotating."
				),
				None => {},
			}

			last = Some((index, remaining));

			self.advance(len);
		}

		let (index, remaining) = last?;

		obs::event!(warn, index, "Every pooled token is below the low-water mark.");

		Some(PatSelection { token: self.tokens[index].clone(), index, remaining, exhausted: true })
	}

	async fn probe<T>(
		&self,
		transport: &T,
		token: &TokenSecret,
		now: OffsetDateTime,
	) -> Option<u64>
	where
		T: ?Sized + GithubTransport,
	{
		if let Some(remaining) = self.cached_estimate(token, now) {
			return Some(remaining);
		}

		match transport.core_rate_limit_remaining(token.expose()).await {
			Ok(remaining) => {
				self.probes
					.write()
					.insert(token.fingerprint(), RateLimitEstimate { remaining, checked_at: now });

				Some(remaining)
			},
			Err(e) => {
				obs::event!(
					error,
					token = %token.fingerprint(),
					error = %e,
					"Rate-limit probe failed; treating the budget as unknown."
				);

				#[cfg(not(feature = "tracing"))]
				let _ = e;

				None
			},
		}
	}

	fn advance(&self, len: usize) {
		let _ = self
			.cursor
			.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |c| Some((c + 1) % len));
	}
}
