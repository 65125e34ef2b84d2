//! Feature gating and the fail-closed enforcement point.

// self
use crate::{
	_prelude::*,
	error::LicenseError,
	license::{LicenseInfo, LicenseStatus, platform::PlatformProbe},
};

/// Modules that require an enterprise edition.
pub const ENTERPRISE_ONLY_MODULES: [&str; 4] = ["gitlab_bridge", "cla", "monitor", "license_keys"];
/// Editions that unlock enterprise-only modules.
pub const ENTERPRISE_EDITIONS: [&str; 3] = ["PRO", "ENTERPRISE", "SAAS"];
/// Editions accepted by the coarse authorization check and the enforcement point.
pub const AUTHORIZED_EDITIONS: [&str; 4] = ["PRO", "ENTERPRISE", "SAAS", "OFFICIAL"];
/// Statuses the enforcement point trusts.
pub const TRUSTED_STATUSES: [LicenseStatus; 3] =
	[LicenseStatus::Verified, LicenseStatus::DevMode, LicenseStatus::OfficialInfra];

impl LicenseInfo {
	/// Returns `true` when the edition unlocks enterprise-only modules.
	///
	/// This reads the edition alone; pair it with [`LicenseInfo::is_trusted`] before unlocking.
	pub fn is_enterprise(&self) -> bool {
		ENTERPRISE_EDITIONS.contains(&self.edition.as_str())
	}

	/// Returns `true` when the status is one the enforcement point accepts.
	pub fn is_trusted(&self) -> bool {
		TRUSTED_STATUSES.contains(&self.status)
	}

	/// Returns `true` when the edition is any paid or first-party edition.
	pub fn is_authorized(&self) -> bool {
		AUTHORIZED_EDITIONS.contains(&self.edition.as_str())
	}
}

/// Returns `true` when `module` is reserved for enterprise editions.
pub fn is_enterprise_only(module: &str) -> bool {
	ENTERPRISE_ONLY_MODULES.contains(&module.to_ascii_lowercase().as_str())
}

/// Enforcement point for enterprise-only code paths.
///
/// Returns [`LicenseError::MustHalt`] unless the status is trusted and the edition is
/// authorized. Callers must stop serving (or exit) on the error instead of continuing.
pub fn require_enterprise(info: &LicenseInfo) -> Result<(), LicenseError> {
	if info.is_trusted() && info.is_authorized() {
		return Ok(());
	}

	crate::obs::event!(
		error,
		status = %info.status,
		edition = %info.edition,
		"Enterprise module reached without a valid license; halting."
	);

	Err(LicenseError::MustHalt { status: info.status, edition: info.edition.clone() })
}

/// Decides whether an optional module may run on this host.
#[derive(Clone, Debug, Default)]
pub struct ModuleGate {
	platform: PlatformProbe,
}
impl ModuleGate {
	/// Creates a gate probing the given platform files.
	pub fn new(platform: PlatformProbe) -> Self {
		Self { platform }
	}

	/// Returns `true` when the platform check passes, a trusted license covers `module`, and
	/// the operator has not switched it off.
	///
	/// Development mode skips the platform check.
	pub fn is_enabled(&self, module: &str, info: &LicenseInfo, switched_on: bool) -> bool {
		if info.status != LicenseStatus::DevMode && !self.platform.is_rhel_family() {
			return false;
		}
		if is_enterprise_only(module) && !(info.is_trusted() && info.is_enterprise()) {
			return false;
		}

		switched_on
	}
}
