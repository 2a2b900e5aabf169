//! Issued OAuth credential sets ("auth data") and their lifecycle helpers.

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, token::secret::Secret},
};

/// Lifetime Reddit assigns to access tokens handed over by the implicit flow.
pub const IMPLICIT_EXPIRES_IN: u64 = 3600;

/// Token store slot a credential set occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthSlot {
	/// Credentials acting on behalf of a Reddit user.
	Authenticated,
	/// Credentials representing the app itself.
	ApplicationOnly,
}
impl AuthSlot {
	/// Picks the slot from an application-only flag.
	pub const fn from_application_only(application_only: bool) -> Self {
		if application_only { AuthSlot::ApplicationOnly } else { AuthSlot::Authenticated }
	}
}

/// One issued OAuth credential set.
///
/// Deserializes from the token endpoint's JSON shape, so callers can also hand a stored
/// response back to [`Client::auth`](crate::client::Client::auth).
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthData {
	/// Access token presented on every API call.
	pub access_token: Secret,
	/// Token type prefix for the `Authorization` header (Reddit issues `bearer`).
	pub token_type: String,
	/// Lifetime in seconds.
	pub expires_in: u64,
	/// Scopes granted to the token.
	#[serde(default)]
	pub scope: ScopeSet,
	/// Refresh token, present for permanent explicit grants.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<Secret>,
}
impl AuthData {
	/// Creates a credential set without a refresh token.
	pub fn new(
		access_token: impl Into<Secret>,
		token_type: impl Into<String>,
		expires_in: u64,
		scope: ScopeSet,
	) -> Self {
		Self {
			access_token: access_token.into(),
			token_type: token_type.into(),
			expires_in,
			scope,
			refresh_token: None,
		}
	}

	/// Synthesizes the credential set for an access token received via the implicit flow.
	pub fn implicit(access_token: impl Into<Secret>, scope: ScopeSet) -> Self {
		Self::new(access_token, "bearer", IMPLICIT_EXPIRES_IN, scope)
	}

	/// Attaches a refresh token.
	pub fn with_refresh_token(mut self, token: impl Into<Secret>) -> Self {
		self.refresh_token = Some(token.into());

		self
	}

	/// Value for the `Authorization` header: `<token_type> <access_token>`.
	pub fn authorization(&self) -> String {
		format!("{} {}", self.token_type, self.access_token.expose())
	}
}
impl Debug for AuthData {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthData")
			.field("access_token", &"<redacted>")
			.field("token_type", &self.token_type)
			.field("expires_in", &self.expires_in)
			.field("scope", &self.scope)
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn implicit_tokens_are_bearer_for_an_hour() {
		let data = AuthData::implicit("tok", ScopeSet::default());

		assert_eq!(data.token_type, "bearer");
		assert_eq!(data.expires_in, 3600);
		assert_eq!(data.authorization(), "bearer tok");
		assert!(data.refresh_token.is_none());
	}

	#[test]
	fn token_endpoint_json_deserializes() {
		let data: AuthData = serde_json::from_str(
			r#"{"access_token":"a","token_type":"bearer","expires_in":3600,"scope":"identity read","refresh_token":"r"}"#,
		)
		.expect("Token endpoint payload should deserialize.");

		assert_eq!(data.access_token.expose(), "a");
		assert!(data.scope.contains("read"));
		assert_eq!(data.refresh_token.as_ref().map(Secret::expose), Some("r"));
	}

	#[test]
	fn debug_redacts_tokens() {
		let data = AuthData::implicit("visible?", ScopeSet::default()).with_refresh_token("nope");
		let rendered = format!("{data:?}");

		assert!(!rendered.contains("visible?"));
		assert!(!rendered.contains("nope"));
	}
}
