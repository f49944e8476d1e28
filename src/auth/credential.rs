//! Credential pair persisted by the token store, with redacted secrets.

// self
use crate::_prelude::*;

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` for an empty secret, which is treated as absent.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("TokenSecret(<redacted>)")
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Access + refresh token pair issued by the auth service.
///
/// Either token may be absent in persisted data. Fields the auth service adds beyond the two
/// tokens are kept in [`CredentialPair::extra`] and written back unchanged.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CredentialPair {
	/// Short-lived bearer token.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub access: Option<TokenSecret>,
	/// Long-lived token exchanged for a new pair.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh: Option<TokenSecret>,
	/// Opaque fields supplied by the auth service.
	#[serde(flatten)]
	pub extra: BTreeMap<String, serde_json::Value>,
}
impl CredentialPair {
	/// Builds a pair from both tokens.
	pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
		Self {
			access: Some(TokenSecret::new(access)),
			refresh: Some(TokenSecret::new(refresh)),
			extra: BTreeMap::new(),
		}
	}

	/// Adds an opaque field.
	pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
		self.extra.insert(key.into(), value);

		self
	}

	/// Non-empty access token, if present.
	pub fn access_token(&self) -> Option<&str> {
		self.access.as_ref().filter(|secret| !secret.is_empty()).map(TokenSecret::expose)
	}

	/// Non-empty refresh token, if present.
	pub fn refresh_token(&self) -> Option<&str> {
		self.refresh.as_ref().filter(|secret| !secret.is_empty()).map(TokenSecret::expose)
	}
}
impl Debug for CredentialPair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialPair")
			.field("access", &self.access)
			.field("refresh", &self.refresh)
			.field("extra_keys", &self.extra.keys().collect::<Vec<_>>())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn debug_output_redacts_secrets() {
		let pair = CredentialPair::new("access-secret", "refresh-secret");
		let rendered = format!("{pair:?}");

		assert!(!rendered.contains("access-secret"));
		assert!(!rendered.contains("refresh-secret"));
		assert_eq!(format!("{}", TokenSecret::new("x")), "<redacted>");
	}

	#[test]
	fn extra_fields_survive_round_trip() {
		let raw = r#"{"access":"a","refresh":"r","expiresIn":3600,"user":{"id":7}}"#;
		let pair: CredentialPair = serde_json::from_str(raw).expect("Pair should deserialize.");

		assert_eq!(pair.access_token(), Some("a"));
		assert_eq!(pair.refresh_token(), Some("r"));
		assert_eq!(pair.extra.get("expiresIn"), Some(&serde_json::json!(3600)));

		let encoded = serde_json::to_value(&pair).expect("Pair should serialize.");

		assert_eq!(encoded["user"]["id"], 7);
		assert_eq!(encoded["access"], "a");
	}

	#[test]
	fn empty_tokens_count_as_absent() {
		let pair: CredentialPair =
			serde_json::from_str(r#"{"access":"","refresh":null}"#).expect("Pair should parse.");

		assert_eq!(pair.access_token(), None);
		assert_eq!(pair.refresh_token(), None);
	}
}
