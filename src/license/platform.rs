//! Host platform integrity: enterprise modules only run on RHEL-family systems.

// self
use crate::_prelude::*;

/// Distribution ids accepted in `ID` or `ID_LIKE`.
pub const RHEL_FAMILY_IDS: [&str; 5] = ["rhel", "centos", "rocky", "almalinux", "fedora"];

/// Files consulted to identify the host distribution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlatformProbe {
	/// `os-release` file.
	pub os_release: PathBuf,
	/// Legacy Red Hat marker file.
	pub redhat_release: PathBuf,
}
impl PlatformProbe {
	/// Returns `true` on a RHEL-family host. Missing files count as a foreign platform.
	pub fn is_rhel_family(&self) -> bool {
		let listed = std::fs::read_to_string(&self.os_release)
			.map(|contents| os_release_is_rhel_family(&contents))
			.unwrap_or(false);

		listed || (self.os_release.is_file() && self.redhat_release.is_file())
	}
}
impl Default for PlatformProbe {
	fn default() -> Self {
		Self {
			os_release: PathBuf::from("/etc/os-release"),
			redhat_release: PathBuf::from("/etc/redhat-release"),
		}
	}
}

/// Returns `true` when an `ID=` or `ID_LIKE=` line names a RHEL-family distribution.
pub fn os_release_is_rhel_family(contents: &str) -> bool {
	contents
		.lines()
		.filter_map(|line| line.strip_prefix("ID=").or_else(|| line.strip_prefix("ID_LIKE=")))
		.any(|value| RHEL_FAMILY_IDS.iter().any(|id| value.contains(id)))
}
