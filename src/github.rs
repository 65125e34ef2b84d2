//! GitHub identity brokering.
//!
//! The bot identity signs short-lived RS256 assertions with the App private key and trades
//! them for installation tokens, cached per installation. The scanner identity rotates over a
//! pool of personal access tokens, preferring whichever still has rate-limit headroom. Both are
//! reached through [`IdentityBroker`], which returns an [`AuthenticatedHandle`].

pub mod app;
pub mod broker;
pub mod handle;
pub mod installation;
pub mod pool;
pub mod transport;

pub use app::*;
pub use broker::*;
pub use handle::*;
pub use installation::*;
pub use pool::*;
pub use transport::*;
