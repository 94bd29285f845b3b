//! Request-scoped bearer token guard: verify JWTs against static secrets, request-aware callbacks,
//! or cached remote key sets, honor revocation hooks, and admit requests by scope.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod authz;
pub mod error;
pub mod jwks;
pub mod obs;
pub mod secret;
pub mod verify;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test` crate
	//! feature.

	pub use crate::_prelude::*;

	// crates.io
	use jsonwebtoken::{Algorithm, EncodingKey, Header};
	// self
	use crate::auth::{Claims, RequestParts};

	/// Shared HMAC secret used by test fixtures.
	pub const TEST_HMAC_SECRET: &str = "shhhhh-this-is-a-test-secret";
	/// RSA private key signing RS256 test tokens.
	pub const TEST_RSA_PRIVATE_PEM: &str = include_str!("../tests/fixtures/rsa_private.pem");
	/// Public half of [`TEST_RSA_PRIVATE_PEM`].
	pub const TEST_RSA_PUBLIC_PEM: &str = include_str!("../tests/fixtures/rsa_public.pem");
	/// Key set publishing [`TEST_RSA_PUBLIC_PEM`] as signing key `primary`, plus one encryption
	/// key.
	pub const TEST_JWKS: &str = include_str!("../tests/fixtures/jwks.json");

	/// Signs `claims` with HS256 using [`TEST_HMAC_SECRET`] unless another secret is supplied.
	pub fn mint_hs256(claims: serde_json::Value, secret: Option<&str>) -> String {
		let secret = secret.unwrap_or(TEST_HMAC_SECRET);

		jsonwebtoken::encode(
			&Header::new(Algorithm::HS256),
			&claims,
			&EncodingKey::from_secret(secret.as_bytes()),
		)
		.expect("HS256 test token should encode.")
	}

	/// Signs `claims` with RS256 using [`TEST_RSA_PRIVATE_PEM`], tagging the header with `kid`.
	pub fn mint_rs256(kid: Option<&str>, claims: serde_json::Value) -> String {
		let mut header = Header::new(Algorithm::RS256);

		header.kid = kid.map(str::to_owned);

		jsonwebtoken::encode(
			&header,
			&claims,
			&EncodingKey::from_rsa_pem(TEST_RSA_PRIVATE_PEM.as_bytes())
				.expect("RSA test key should parse."),
		)
		.expect("RS256 test token should encode.")
	}

	/// Builds a `GET` request carrying `Authorization: Bearer <token>`.
	pub fn bearer_request(token: &str) -> RequestParts {
		RequestParts::new("GET").with_header("authorization", format!("Bearer {token}"))
	}

	/// Current Unix timestamp in seconds.
	pub fn unix_now() -> i64 {
		OffsetDateTime::now_utc().unix_timestamp()
	}

	/// Converts a JSON object literal into [`Claims`].
	pub fn claims(value: serde_json::Value) -> Claims {
		match value {
			serde_json::Value::Object(map) => map,
			other => panic!("Claims fixture must be a JSON object, got {other}."),
		}
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap, VecDeque},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::{Map as JsonMap, Value as JsonValue};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use jsonwebtoken;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
