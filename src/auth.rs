//! Bearer token authentication: credential extraction, structural decoding, revocation hooks,
//! and the [`Authenticator`] pipeline that ties them to secret resolution and verification.

pub mod authenticator;
pub mod config;
pub mod credentials;
pub mod decode;
pub mod error;
pub mod request;
pub mod revocation;

pub use authenticator::*;
pub use config::*;
pub use credentials::*;
pub use decode::*;
pub use error::*;
pub use request::*;
pub use revocation::*;

// self
use crate::_prelude::*;

/// Claims carried by a token payload.
pub type Claims = JsonMap<String, JsonValue>;
