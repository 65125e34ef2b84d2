mod common;

// std
use std::path::{Path, PathBuf};
// self
use tick_credentials::{
	config::CredentialConfig,
	error::LicenseError,
	license::{
		LicenseContext, LicenseInfo, LicenseStatus, LicenseVerifier, ModuleGate, OfficialInfra,
		PlatformProbe, require_enterprise,
	},
};

const MASTER: &str = "198.51.100.23";

fn verifier() -> LicenseVerifier {
	LicenseVerifier::with_public_key_pem(common::LICENSE_PUBLIC_KEY)
		.expect("Fixture public key should parse.")
		.with_infra(OfficialInfra::new(MASTER, "/nonexistent/tick/operator.pem"))
}

fn scratch(name: &str, contents: &str) -> PathBuf {
	let path =
		std::env::temp_dir().join(format!("tick-credentials-{}-{name}", std::process::id()));

	std::fs::write(&path, contents).expect("Scratch file should be writable.");

	path
}

fn fixture_artifact() -> String {
	std::fs::read_to_string(common::LICENSE_KEY_PATH).expect("Fixture license should be readable.")
}

fn tampered_artifact() -> String {
	let artifact = fixture_artifact();
	let (payload, signature) =
		artifact.trim().rsplit_once('.').expect("Fixture license should contain a signature.");
	let mut signature = signature.to_owned();
	let replacement = if signature.starts_with('A') { "B" } else { "A" };

	signature.replace_range(0..1, replacement);

	format!("{payload}.{signature}")
}

#[test]
fn fixture_license_verifies_for_its_domain() {
	let path = Path::new(common::LICENSE_KEY_PATH);
	let info = verifier().verify(path, &LicenseContext::request("example.com"));

	assert_eq!(info.status, LicenseStatus::Verified);
	assert_eq!(info.edition, "PRO");
	assert_eq!(info.year.as_deref(), Some("2026"));
	assert_eq!(info.tier, "OFFICIAL");
	assert_eq!(info.domain.as_deref(), Some("example.com"));
	assert_eq!(info.payload.as_deref(), Some("PT-INTERNAL-PRO-2026-OFFICIAL-example.com"));
	assert!(require_enterprise(&info).is_ok());

	let json = serde_json::to_value(&info).expect("License info should serialize.");

	assert_eq!(json["status"], "VERIFIED");
	assert_eq!(json["type"], "PRO");
}

#[test]
fn foreign_host_is_rejected_and_never_upgraded() {
	let path = Path::new(common::LICENSE_KEY_PATH);
	let context = LicenseContext::request("other.com").with_server_address(MASTER);
	let info = verifier().verify(path, &context);

	assert_eq!(info.status, LicenseStatus::InvalidDomain);
	assert_eq!(info.edition, "PRO");
	assert_eq!(info.tier, "OFFICIAL");
	assert_eq!(info.domain.as_deref(), Some("example.com"));
	assert_eq!(
		require_enterprise(&info),
		Err(LicenseError::MustHalt {
			status: LicenseStatus::InvalidDomain,
			edition: "PRO".into()
		})
	);
}

#[test]
fn offline_callers_skip_domain_binding() {
	let info = verifier().verify(Path::new(common::LICENSE_KEY_PATH), &LicenseContext::offline());

	assert_eq!(info.status, LicenseStatus::Verified);
}

#[test]
fn tampered_signature_falls_back_to_official_infra_only_on_the_master_host() {
	let path = scratch("tampered", &tampered_artifact());
	let foreign = verifier().verify(&path, &LicenseContext::request("example.com"));
	let master = verifier()
		.verify(&path, &LicenseContext::request("example.com").with_server_address(MASTER));

	assert_eq!(foreign.status, LicenseStatus::InvalidSignature);
	assert!(require_enterprise(&foreign).is_err());
	assert_eq!(master.status, LicenseStatus::OfficialInfra);
	assert_eq!(master.edition, "ENTERPRISE");
	assert!(require_enterprise(&master).is_ok());

	let _ = std::fs::remove_file(path);
}

#[test]
fn missing_artifact_is_community_mode() {
	let path = Path::new("/nonexistent/tick/LICENSE_KEY");
	let info = verifier().verify(path, &LicenseContext::request("example.com"));

	assert_eq!(info, LicenseInfo::community());
	assert_eq!(
		require_enterprise(&info),
		Err(LicenseError::MustHalt {
			status: LicenseStatus::CommunityMode,
			edition: "COMMUNITY".into()
		})
	);

	let infra = verifier().verify(path, &LicenseContext::offline().with_server_address(MASTER));

	assert_eq!(infra.status, LicenseStatus::OfficialInfra);
}

#[test]
fn development_environment_short_circuits() {
	let context = LicenseContext::request("anything.test").with_environment("dev");
	let info = verifier().verify(Path::new("/nonexistent/tick/LICENSE_KEY"), &context);

	assert_eq!(info.status, LicenseStatus::DevMode);
	assert_eq!(info.edition, "ENTERPRISE");
	assert!(require_enterprise(&info).is_ok());
}

#[test]
fn vendor_key_rejects_artifacts_signed_by_another_key() {
	let vendor = LicenseVerifier::new()
		.expect("Vendor key should parse.")
		.with_infra(OfficialInfra::new(MASTER, "/nonexistent/tick/operator.pem"));
	let info = vendor.verify_artifact(&fixture_artifact(), &LicenseContext::offline());

	assert_eq!(info.status, LicenseStatus::InvalidSignature);
}

#[test]
fn module_gate_combines_platform_license_and_switch() {
	let rhel = scratch(
		"os-release",
		"NAME=\"Rocky Linux\"\nID=\"rocky\"\nID_LIKE=\"rhel centos fedora\"\n",
	);
	let gate = ModuleGate::new(PlatformProbe {
		os_release: rhel.clone(),
		redhat_release: PathBuf::from("/nonexistent/redhat-release"),
	});
	let verified =
		verifier().verify(Path::new(common::LICENSE_KEY_PATH), &LicenseContext::offline());
	let community = LicenseInfo::community();

	assert!(gate.is_enabled("cla", &verified, true));
	assert!(!gate.is_enabled("cla", &verified, false));
	assert!(!gate.is_enabled("cla", &community, true));
	assert!(gate.is_enabled("dashboard", &community, true));

	let copied = verifier()
		.verify(Path::new(common::LICENSE_KEY_PATH), &LicenseContext::request("other.com"));

	assert_eq!(copied.edition, "PRO");
	assert!(!gate.is_enabled("cla", &copied, true));
	assert!(gate.is_enabled("dashboard", &copied, true));

	let foreign = ModuleGate::new(PlatformProbe {
		os_release: PathBuf::from("/nonexistent/os-release"),
		redhat_release: PathBuf::from("/nonexistent/redhat-release"),
	});
	let dev = verifier().verify(
		Path::new("/nonexistent/tick/LICENSE_KEY"),
		&LicenseContext::offline().with_environment("dev"),
	);

	assert!(!foreign.is_enabled("dashboard", &verified, true));
	assert!(foreign.is_enabled("cla", &dev, true));

	let _ = std::fs::remove_file(rhel);
}

#[test]
fn configured_location_and_environment_drive_verification() {
	let config = CredentialConfig {
		license_key_path: Some(PathBuf::from(common::LICENSE_KEY_PATH)),
		..Default::default()
	};
	let info = verifier().verify_configured(&config, &LicenseContext::request("example.com"));

	assert_eq!(info.status, LicenseStatus::Verified);
	assert_eq!(info.edition, "PRO");

	let dev = CredentialConfig { app_env: Some("dev".into()), ..config.clone() };
	let foreign = LicenseContext::request("other.com");

	assert_eq!(verifier().verify_configured(&dev, &foreign).status, LicenseStatus::DevMode);
	assert_eq!(
		verifier().verify_configured(&dev, &foreign.clone().with_environment("prod")).status,
		LicenseStatus::InvalidDomain
	);

	let unset = CredentialConfig {
		license_key_path: Some(PathBuf::from("/nonexistent/tick/LICENSE_KEY")),
		..Default::default()
	};

	assert_eq!(
		verifier().verify_configured(&unset, &LicenseContext::request("example.com")),
		LicenseInfo::community()
	);
}
