//! Startup configuration shared by the broker, token codec, seal key, and license verifier.

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	github::{AppCredential, DEFAULT_API_URL},
	license::{DEFAULT_LICENSE_KEY_PATH, LicenseContext},
	token::KeyedTokenService,
};

/// Raw credential configuration, usually read from the process environment.
///
/// Every field is optional so partially configured deployments still load; the constructors
/// that consume a field validate it and report what is missing.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CredentialConfig {
	/// Numeric GitHub App identifier (`GITHUB_APP_ID`).
	pub github_app_id: Option<String>,
	/// GitHub App private key PEM (`GITHUB_APP_PRIVATE_KEY`).
	pub github_app_private_key: Option<String>,
	/// Comma-separated personal access tokens (`GITHUB_TOKENS`).
	pub github_tokens: Option<String>,
	/// Keyed token secret (`JWT_SECRET`).
	pub jwt_secret: Option<String>,
	/// Application secret the seal key is derived from (`APP_SECRET`).
	pub app_secret: Option<String>,
	/// Hex-encoded 32-byte seal seed overriding derivation (`CLA_SEAL_SEED`).
	pub cla_seal_seed: Option<String>,
	/// License artifact location (`LICENSE_KEY_PATH`).
	pub license_key_path: Option<PathBuf>,
	/// GitHub API base URL (`GITHUB_API_URL`).
	pub github_api_url: Option<String>,
	/// Deployment environment name (`APP_ENV`).
	pub app_env: Option<String>,
}
impl CredentialConfig {
	/// Reads the configuration from the process environment.
	pub fn from_env() -> Self {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Reads the configuration through `lookup`; blank values count as absent.
	pub fn from_lookup<F>(lookup: F) -> Self
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

		Self {
			github_app_id: get("GITHUB_APP_ID"),
			github_app_private_key: get("GITHUB_APP_PRIVATE_KEY"),
			github_tokens: get("GITHUB_TOKENS"),
			jwt_secret: get("JWT_SECRET"),
			app_secret: get("APP_SECRET"),
			cla_seal_seed: get("CLA_SEAL_SEED"),
			license_key_path: get("LICENSE_KEY_PATH").map(PathBuf::from),
			github_api_url: get("GITHUB_API_URL"),
			app_env: get("APP_ENV"),
		}
	}

	/// API base URL, defaulting to the public GitHub API.
	pub fn api_url(&self) -> &str {
		self.github_api_url.as_deref().unwrap_or(DEFAULT_API_URL)
	}

	/// Returns `true` when running in the development environment.
	pub fn is_dev(&self) -> bool {
		self.app_env.as_deref() == Some(crate::license::DEV_ENVIRONMENT)
	}

	/// Parses the App credential pair.
	///
	/// Both halves absent means the bot identity is simply not configured; a lone half is an
	/// error.
	pub fn app_credential(&self) -> Result<Option<AppCredential>, ConfigError> {
		match (self.github_app_id.as_deref(), self.github_app_private_key.as_deref()) {
			(None, None) => Ok(None),
			(None, Some(_)) => Err(ConfigError::MissingAppId),
			(Some(_), None) => Err(ConfigError::MissingPrivateKey),
			(Some(id), Some(pem)) => AppCredential::from_parts(id, pem).map(Some),
		}
	}

	/// Builds the keyed token codec from `jwt_secret`.
	pub fn token_service(&self) -> Result<KeyedTokenService, ConfigError> {
		KeyedTokenService::new(self.jwt_secret.as_deref().unwrap_or_default())
	}

	/// License artifact location, falling back to [`DEFAULT_LICENSE_KEY_PATH`].
	pub fn license_path(&self) -> &Path {
		self.license_key_path.as_deref().unwrap_or(Path::new(DEFAULT_LICENSE_KEY_PATH))
	}

	/// Offline license context carrying the configured environment.
	pub fn license_context(&self) -> LicenseContext {
		LicenseContext { environment: self.app_env.clone(), ..LicenseContext::offline() }
	}
}
impl Debug for CredentialConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		fn present(value: &Option<String>) -> &'static str {
			if value.is_some() { "<set>" } else { "<unset>" }
		}

		f.debug_struct("CredentialConfig")
			.field("github_app_id", &self.github_app_id)
			.field("github_app_private_key", &present(&self.github_app_private_key))
			.field("github_tokens", &present(&self.github_tokens))
			.field("jwt_secret", &present(&self.jwt_secret))
			.field("app_secret", &present(&self.app_secret))
			.field("cla_seal_seed", &present(&self.cla_seal_seed))
			.field("license_key_path", &self.license_key_path)
			.field("github_api_url", &self.api_url())
			.field("app_env", &self.app_env)
			.finish()
	}
}
