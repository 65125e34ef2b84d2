//! Optional observability helpers for credential flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit spans named `tick_credentials.flow`. Each carries `flow` and
//!   `stage`, plus `installation`, `pool_index`/`exhausted`, or `license_status` once known.
//! - Enable `metrics` for the flow outcome counter, installation cache hit/miss counts, a
//!   per-slot gauge of probed PAT budgets, and license verifications by status.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Emits a `tracing` event when the feature is enabled; compiles to nothing otherwise.
macro_rules! event {
	($level:ident, $($arg:tt)+) => {{
		#[cfg(feature = "tracing")]
		{
			::tracing::$level!(target: "tick_credentials", $($arg)+);
		}
	}};
}
pub(crate) use event;

/// Credential flows observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// App assertion minting plus installation-token exchange.
	Installation,
	/// PAT pool selection by remaining budget.
	PatRotation,
	/// Signed license verification.
	License,
	/// Contributor agreement sealing.
	ClaSeal,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Installation => "installation",
			FlowKind::PatRotation => "pat_rotation",
			FlowKind::License => "license",
			FlowKind::ClaSeal => "cla_seal",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a flow helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
