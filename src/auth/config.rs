//! Immutable authenticator configuration and its validating builder.

// crates.io
use jsonwebtoken::Algorithm;
// self
use crate::{
	_prelude::*,
	auth::{NeverRevoked, RevocationCheck},
	error::ConfigError,
	secret::SecretSource,
	verify::VerifyOptions,
};

/// Validated authenticator configuration.
#[derive(Clone)]
pub struct AuthConfig {
	secret: SecretSource,
	algorithms: Vec<Algorithm>,
	verify_options: VerifyOptions,
	credentials_required: bool,
	strict_format: bool,
	revocation: Arc<dyn RevocationCheck>,
}
impl AuthConfig {
	/// Starts a builder with the defaults: credentials required, strict header format, and no
	/// revocation.
	pub fn builder() -> AuthConfigBuilder {
		AuthConfigBuilder::default()
	}

	/// Secret resolution strategy.
	pub fn secret(&self) -> &SecretSource {
		&self.secret
	}

	/// Accepted signature algorithms; never empty.
	pub fn algorithms(&self) -> &[Algorithm] {
		&self.algorithms
	}

	/// Claim validation options.
	pub fn verify_options(&self) -> &VerifyOptions {
		&self.verify_options
	}

	/// Whether requests without a token are rejected.
	pub fn credentials_required(&self) -> bool {
		self.credentials_required
	}

	/// Whether the header must be exactly `<scheme> <token>`.
	pub fn strict_format(&self) -> bool {
		self.strict_format
	}

	/// Revocation check run after verification.
	pub fn revocation(&self) -> &dyn RevocationCheck {
		self.revocation.as_ref()
	}
}
impl Debug for AuthConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthConfig")
			.field("secret", &self.secret)
			.field("algorithms", &self.algorithms)
			.field("verify_options", &self.verify_options)
			.field("credentials_required", &self.credentials_required)
			.field("strict_format", &self.strict_format)
			.finish_non_exhaustive()
	}
}

/// Builder for [`AuthConfig`] values.
pub struct AuthConfigBuilder {
	secret: Option<SecretSource>,
	algorithms: Vec<Algorithm>,
	verify_options: VerifyOptions,
	credentials_required: bool,
	strict_format: bool,
	revocation: Arc<dyn RevocationCheck>,
}
impl AuthConfigBuilder {
	/// Sets the secret resolution strategy.
	pub fn secret(mut self, secret: impl Into<SecretSource>) -> Self {
		self.secret = Some(secret.into());

		self
	}

	/// Adds one accepted algorithm.
	pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
		if !self.algorithms.contains(&algorithm) {
			self.algorithms.push(algorithm);
		}

		self
	}

	/// Adds several accepted algorithms.
	pub fn algorithms<I>(mut self, algorithms: I) -> Self
	where
		I: IntoIterator<Item = Algorithm>,
	{
		for algorithm in algorithms {
			self = self.algorithm(algorithm);
		}

		self
	}

	/// Replaces the claim validation options.
	pub fn verify_options(mut self, options: VerifyOptions) -> Self {
		self.verify_options = options;

		self
	}

	/// Controls whether requests without a token are rejected.
	pub fn credentials_required(mut self, required: bool) -> Self {
		self.credentials_required = required;

		self
	}

	/// Controls the two-part header check; disable only for legacy clients.
	pub fn strict_format(mut self, strict: bool) -> Self {
		self.strict_format = strict;

		self
	}

	/// Installs a revocation check.
	pub fn is_revoked(mut self, check: impl 'static + RevocationCheck) -> Self {
		self.revocation = Arc::new(check);

		self
	}

	/// Validates and freezes the configuration.
	pub fn build(self) -> Result<AuthConfig, ConfigError> {
		let secret = self.secret.ok_or(ConfigError::MissingSecret)?;

		if self.algorithms.is_empty() {
			return Err(ConfigError::MissingAlgorithms);
		}

		Ok(AuthConfig {
			secret,
			algorithms: self.algorithms,
			verify_options: self.verify_options,
			credentials_required: self.credentials_required,
			strict_format: self.strict_format,
			revocation: self.revocation,
		})
	}
}
impl Default for AuthConfigBuilder {
	fn default() -> Self {
		Self {
			secret: None,
			algorithms: Vec::new(),
			verify_options: VerifyOptions::default(),
			credentials_required: true,
			strict_format: true,
			revocation: Arc::new(NeverRevoked),
		}
	}
}
impl Debug for AuthConfigBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthConfigBuilder")
			.field("secret", &self.secret)
			.field("algorithms", &self.algorithms)
			.field("credentials_required", &self.credentials_required)
			.field("strict_format", &self.strict_format)
			.finish_non_exhaustive()
	}
}
