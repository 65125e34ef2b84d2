// self
use crate::{
	license::LicenseStatus,
	obs::{FlowKind, FlowOutcome},
};

/// Records a flow outcome (`tick_credentials_flow_total`).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(
		"tick_credentials_flow_total",
		"flow" => kind.as_str(),
		"outcome" => outcome.as_str()
	)
	.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (kind, outcome);
}

/// Counts installation-token cache lookups (`tick_credentials_installation_cache_total`).
pub fn record_installation_cache(hit: bool) {
	#[cfg(feature = "metrics")]
	metrics::counter!(
		"tick_credentials_installation_cache_total",
		"result" => if hit { "hit" } else { "miss" }
	)
	.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = hit;
}

/// Publishes the last probed core budget of a pool slot (`tick_credentials_pat_remaining`).
pub fn record_pat_budget(index: usize, remaining: u64) {
	#[cfg(feature = "metrics")]
	metrics::gauge!("tick_credentials_pat_remaining", "slot" => index.to_string())
		.set(remaining as f64);
	#[cfg(not(feature = "metrics"))]
	let _ = (index, remaining);
}

/// Counts license verifications by final status (`tick_credentials_license_total`).
pub fn record_license_status(status: LicenseStatus) {
	#[cfg(feature = "metrics")]
	metrics::counter!("tick_credentials_license_total", "status" => status.as_str()).increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = status;
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_are_safe_without_an_installed_recorder() {
		record_flow_outcome(FlowKind::PatRotation, FlowOutcome::Failure);
		record_installation_cache(true);
		record_pat_budget(0, 4_999);
		record_license_status(LicenseStatus::CommunityMode);
	}
}
