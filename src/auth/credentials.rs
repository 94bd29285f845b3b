//! Bearer credential extraction from the `Authorization` header.

// self
use crate::auth::{AuthError, AuthRequest};

/// Header carrying the credential.
pub const AUTHORIZATION: &str = "authorization";

const BEARER: &str = "Bearer";

/// Extracts a bearer token from an `Authorization` header value.
///
/// Returns `Ok(None)` when no credential is present; the caller decides whether that passes
/// based on `credentials_required`. With `strict_format` disabled, headers that do not split
/// into exactly two space-separated parts are read leniently: the first part is the scheme and
/// the second (if any) the token.
pub fn extract_bearer(
	header: Option<&str>,
	credentials_required: bool,
	strict_format: bool,
) -> Result<Option<&str>, AuthError> {
	let Some(header) = header.filter(|value| !value.is_empty()) else {
		return Ok(None);
	};
	let parts = header.split(' ').collect::<Vec<_>>();

	if strict_format && parts.len() != 2 {
		return Err(AuthError::CredentialsBadFormat);
	}

	let scheme = parts.first().copied().unwrap_or_default();

	if scheme.eq_ignore_ascii_case(BEARER) {
		return Ok(parts.get(1).copied().filter(|token| !token.is_empty()));
	}
	if credentials_required {
		return Err(AuthError::CredentialsBadScheme);
	}

	Ok(None)
}

/// Extracts the bearer token from `request`.
pub fn token_from_request(
	request: &dyn AuthRequest,
	credentials_required: bool,
	strict_format: bool,
) -> Result<Option<&str>, AuthError> {
	extract_bearer(request.header(AUTHORIZATION), credentials_required, strict_format)
}

/// Returns true for CORS preflight requests announcing an `authorization` header.
pub fn is_authorization_preflight(request: &dyn AuthRequest) -> bool {
	if !request.method().eq_ignore_ascii_case("OPTIONS") {
		return false;
	}

	request
		.header("access-control-request-headers")
		.map(|headers| {
			headers.split(',').map(str::trim).any(|name| name.eq_ignore_ascii_case(AUTHORIZATION))
		})
		.unwrap_or(false)
}
