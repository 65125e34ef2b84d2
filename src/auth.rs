//! Identity primitives shared by the broker, license, and attestation modules.

pub mod id;
pub mod secret;

pub use id::*;
pub use secret::*;
