//! Request abstraction consumed by the pipeline and by caller callbacks.

// self
use crate::_prelude::*;

/// HTTP-like request view.
///
/// Header lookups must be case-insensitive. Implementations exist for [`http::Request`],
/// [`http::request::Parts`], and the framework-neutral [`RequestParts`].
pub trait AuthRequest
where
	Self: Send + Sync,
{
	/// Request method, e.g. `GET` or `OPTIONS`.
	fn method(&self) -> &str;

	/// First value of header `name`, if present and valid UTF-8.
	fn header(&self, name: &str) -> Option<&str>;
}
impl<B> AuthRequest for http::Request<B>
where
	B: Send + Sync,
{
	fn method(&self) -> &str {
		self.method().as_str()
	}

	fn header(&self, name: &str) -> Option<&str> {
		self.headers().get(name).and_then(|value| value.to_str().ok())
	}
}
impl AuthRequest for http::request::Parts {
	fn method(&self) -> &str {
		self.method.as_str()
	}

	fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).and_then(|value| value.to_str().ok())
	}
}

/// Owned request view for hosts that do not use the `http` types.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestParts {
	/// Request method.
	pub method: String,
	/// Header pairs in arrival order.
	pub headers: Vec<(String, String)>,
}
impl RequestParts {
	/// Creates a request with the provided method and no headers.
	pub fn new(method: impl Into<String>) -> Self {
		Self { method: method.into(), headers: Vec::new() }
	}

	/// Appends a header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}
}
impl AuthRequest for RequestParts {
	fn method(&self) -> &str {
		&self.method
	}

	fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn request_parts_lookup_is_case_insensitive() {
		let request = RequestParts::new("GET").with_header("Authorization", "Bearer abc");

		assert_eq!(AuthRequest::header(&request, "authorization"), Some("Bearer abc"));
		assert_eq!(AuthRequest::header(&request, "AUTHORIZATION"), Some("Bearer abc"));
		assert_eq!(AuthRequest::header(&request, "accept"), None);
	}

	#[test]
	fn http_request_exposes_method_and_headers() {
		let request = http::Request::builder()
			.method("OPTIONS")
			.header("Access-Control-Request-Headers", "authorization")
			.body(())
			.expect("Request fixture should build.");

		assert_eq!(AuthRequest::method(&request), "OPTIONS");
		assert_eq!(
			AuthRequest::header(&request, "access-control-request-headers"),
			Some("authorization")
		);

		let (parts, _) = request.into_parts();

		assert_eq!(AuthRequest::method(&parts), "OPTIONS");
	}
}
