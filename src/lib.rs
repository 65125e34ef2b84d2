//! Credential and attestation core: GitHub App + PAT-pool identity brokering, HMAC-keyed tokens,
//! RSA-signed enterprise licenses, and Ed25519-sealed contributor license agreements.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod cla;
pub mod config;
pub mod error;
pub mod github;
pub mod license;
pub mod obs;
pub mod token;

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		hash::Hash,
		path::{Path, PathBuf},
		pin::Pin,
		str::FromStr,
		sync::{
			Arc,
			atomic::{AtomicUsize, Ordering},
		},
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
