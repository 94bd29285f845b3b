//! Scope validation and claim parsing for scope admission.

// std
use std::collections::BTreeSet;
// self
use crate::_prelude::*;

/// Errors emitted when validating expected scopes.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ScopeValidationError {
	/// Empty scope entries are not allowed.
	#[error("Scope entries cannot be empty.")]
	Empty,
	/// Scopes cannot contain embedded whitespace characters.
	#[error("Scope contains whitespace: {scope}.")]
	ContainsWhitespace {
		/// The offending scope string.
		scope: String,
	},
}

/// Validates scopes while preserving their order and duplicates.
///
/// Used for the expected scopes of an endpoint, which are echoed back verbatim in challenges.
pub fn validate_scopes<I, S>(scopes: I) -> Result<Vec<String>, ScopeValidationError>
where
	I: IntoIterator<Item = S>,
	S: Into<String>,
{
	scopes.into_iter().map(|scope| validate(scope.into())).collect()
}

/// Scopes granted by a token's scope claim.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScopeSet(BTreeSet<String>);
impl ScopeSet {
	/// Reads the scopes granted by a claim value.
	///
	/// Accepts a space-delimited string or an array. Array entries are kept verbatim and
	/// non-string entries are skipped; neither can match a validated expected scope. Any other
	/// shape yields `None`.
	pub fn from_claim(value: &JsonValue) -> Option<Self> {
		match value {
			JsonValue::String(raw) => Some(raw.split_whitespace().map(str::to_owned).collect()),
			JsonValue::Array(items) =>
				Some(items.iter().filter_map(JsonValue::as_str).map(str::to_owned).collect()),
			_ => None,
		}
	}

	/// Returns true if the claim granted `scope`.
	pub fn contains(&self, scope: &str) -> bool {
		self.0.contains(scope)
	}
}
impl FromIterator<String> for ScopeSet {
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = String>,
	{
		Self(iter.into_iter().collect())
	}
}

fn validate(scope: String) -> Result<String, ScopeValidationError> {
	if scope.is_empty() {
		return Err(ScopeValidationError::Empty);
	}
	if scope.chars().any(char::is_whitespace) {
		return Err(ScopeValidationError::ContainsWhitespace { scope });
	}

	Ok(scope)
}
