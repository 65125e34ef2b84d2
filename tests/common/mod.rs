//! Helpers shared by the integration tests.

#![allow(dead_code)]

// std
use std::{
	collections::HashMap,
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration as StdDuration,
};
// crates.io
use time::OffsetDateTime;
// self
use tick_credentials::{
	auth::{AppId, InstallationId, TokenSecret},
	error::{TransportError, UpstreamError},
	github::{
		AppCredential, GithubTransport, IdentityBroker, InstallationGrant, PatPool, TransportFuture,
	},
};

pub const APP_ID: u64 = 271_828;
pub const APP_PRIVATE_KEY: &str = include_str!("../fixtures/github_app.pem");
pub const APP_PUBLIC_KEY: &str = include_str!("../fixtures/github_app_public.pem");
pub const LICENSE_SIGNING_KEY: &str = include_str!("../fixtures/license_signing.pem");
pub const LICENSE_PUBLIC_KEY: &str = include_str!("../fixtures/license_public.pem");
pub const LICENSE_KEY_PATH: &str =
	concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/LICENSE_KEY");

/// Outcome a stubbed rate-limit probe reports for one token.
#[derive(Clone, Copy, Debug)]
pub enum Budget {
	Remaining(u64),
	ProbeFails,
}

/// In-process [`GithubTransport`] with call counters.
#[derive(Debug, Default)]
pub struct StubTransport {
	exchanges: AtomicUsize,
	probes: AtomicUsize,
	rejections_left: AtomicUsize,
	exchange_delay: Option<StdDuration>,
	upstream_expiry: Option<OffsetDateTime>,
	budgets: Mutex<HashMap<String, Budget>>,
	probed: Mutex<Vec<String>>,
}
impl StubTransport {
	pub fn new() -> Self {
		Self::default()
	}

	/// Sleeps inside every exchange so concurrent callers overlap.
	pub fn with_exchange_delay(mut self, delay: StdDuration) -> Self {
		self.exchange_delay = Some(delay);

		self
	}

	/// Reports `expires_at` on every grant.
	pub fn with_upstream_expiry(mut self, expires_at: OffsetDateTime) -> Self {
		self.upstream_expiry = Some(expires_at);

		self
	}

	/// Rejects the next `count` exchanges with a 401.
	pub fn reject_next_exchanges(self, count: usize) -> Self {
		self.rejections_left.store(count, Ordering::SeqCst);

		self
	}

	pub fn with_budget(self, token: &str, budget: Budget) -> Self {
		self.set_budget(token, budget);

		self
	}

	pub fn set_budget(&self, token: &str, budget: Budget) {
		self.budgets
			.lock()
			.expect("Budget table should not be poisoned.")
			.insert(token.into(), budget);
	}

	pub fn exchanges(&self) -> usize {
		self.exchanges.load(Ordering::SeqCst)
	}

	pub fn probes(&self) -> usize {
		self.probes.load(Ordering::SeqCst)
	}

	/// Tokens probed so far, in call order.
	pub fn probed(&self) -> Vec<String> {
		self.probed.lock().expect("Probe log should not be poisoned.").clone()
	}
}
impl GithubTransport for StubTransport {
	fn create_installation_token<'a>(
		&'a self,
		assertion: &'a str,
		installation: InstallationId,
	) -> TransportFuture<'a, InstallationGrant> {
		Box::pin(async move {
			let call = self.exchanges.fetch_add(1, Ordering::SeqCst) + 1;

			assert_eq!(assertion.split('.').count(), 3, "Exchange should receive a signed JWT.");

			if let Some(delay) = self.exchange_delay {
				tokio::time::sleep(delay).await;
			}

			let rejected = self
				.rejections_left
				.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
				.is_ok();

			if rejected {
				return Err(UpstreamError::Rejected {
					status: 401,
					message: "A JSON web token could not be decoded".into(),
				}
				.into());
			}

			Ok(InstallationGrant {
				token: TokenSecret::new(format!("ghs_{installation}_{call}")),
				expires_at: self.upstream_expiry,
			})
		})
	}

	fn core_rate_limit_remaining<'a>(&'a self, token: &'a str) -> TransportFuture<'a, u64> {
		Box::pin(async move {
			self.probes.fetch_add(1, Ordering::SeqCst);
			self.probed.lock().expect("Probe log should not be poisoned.").push(token.into());

			let budget = self
				.budgets
				.lock()
				.expect("Budget table should not be poisoned.")
				.get(token)
				.copied()
				.unwrap_or(Budget::Remaining(5_000));

			match budget {
				Budget::Remaining(remaining) => Ok(remaining),
				Budget::ProbeFails => Err(TransportError::Io(std::io::Error::new(
					std::io::ErrorKind::ConnectionReset,
					"connection reset by peer",
				))
				.into()),
			}
		})
	}
}

pub fn app_credential() -> AppCredential {
	AppCredential::new(AppId::new(APP_ID), APP_PRIVATE_KEY)
		.expect("Fixture App key should parse for integration tests.")
}

pub fn tokens(values: &[&str]) -> Vec<TokenSecret> {
	values.iter().copied().map(TokenSecret::new).collect()
}

/// Broker over `transport` with the fixture App and a pool starting at slot zero.
pub fn broker(
	transport: &Arc<StubTransport>,
	pool: &[&str],
) -> IdentityBroker<StubTransport> {
	IdentityBroker::with_transport(
		Some(app_credential()),
		PatPool::with_cursor(tokens(pool), 0),
		transport.clone(),
	)
}

/// Broker without App credentials.
pub fn scanner_only_broker(
	transport: &Arc<StubTransport>,
	pool: &[&str],
) -> IdentityBroker<StubTransport> {
	IdentityBroker::with_transport(None, PatPool::with_cursor(tokens(pool), 0), transport.clone())
}
