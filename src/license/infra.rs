//! First-party infrastructure detection.
//!
//! A deployment that cannot present a verified license is still trusted when it runs on the
//! operator's own host: either the server address equals the master address, or the operator's
//! private signing key is present on disk. This is a narrow, explicit bypass and is only
//! consulted after artifact verification failed.

// self
use crate::_prelude::*;

/// Public address of the operator's master host.
pub const MASTER_ADDRESS: &str = "152.53.231.231";
/// Key file only present on the operator's own hosts.
pub const OPERATOR_KEY_PATH: &str = "/var/www/projt-website/config/jwt/projt_private.pem";

/// Rule deciding whether the current host is first-party infrastructure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OfficialInfra {
	/// Address compared against the caller-reported server address.
	pub master_address: String,
	/// File whose presence marks an operator host.
	pub operator_key_path: PathBuf,
}
impl OfficialInfra {
	/// Creates a rule from an explicit address and key path.
	pub fn new(master_address: impl Into<String>, operator_key_path: impl Into<PathBuf>) -> Self {
		Self { master_address: master_address.into(), operator_key_path: operator_key_path.into() }
	}

	/// Returns `true` when `server_address` is the master address or the key file exists.
	pub fn matches(&self, server_address: Option<&str>) -> bool {
		server_address.is_some_and(|addr| addr.trim() == self.master_address)
			|| self.operator_key_path.is_file()
	}
}
impl Default for OfficialInfra {
	fn default() -> Self {
		Self::new(MASTER_ADDRESS, OPERATOR_KEY_PATH)
	}
}
