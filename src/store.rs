//! Per-client token storage.
//!
//! A [`TokenStore`] holds at most one authenticated credential set, at most one
//! application-only credential set, and the refresh token that outlives both. Every call
//! made by a [`Client`](crate::client::Client) reads its headers from here, and any call may
//! overwrite a slot as a side effect of re-authentication.

// self
use crate::{
	_prelude::*,
	auth::{AuthData, AuthSlot, Secret},
};

#[derive(Debug, Default)]
struct Slots {
	authenticated: Option<AuthData>,
	application_only: Option<AuthData>,
	refresh_token: Option<Secret>,
}

/// Thread-safe holder for the two credential slots and the persisted refresh token.
#[derive(Debug, Default)]
pub struct TokenStore(RwLock<Slots>);
impl TokenStore {
	/// Returns a clone of the credential set in `slot`.
	pub fn get(&self, slot: AuthSlot) -> Option<AuthData> {
		let guard = self.0.read();

		match slot {
			AuthSlot::Authenticated => guard.authenticated.clone(),
			AuthSlot::ApplicationOnly => guard.application_only.clone(),
		}
	}

	/// Replaces the credential set in `slot`.
	pub fn set(&self, slot: AuthSlot, data: AuthData) {
		let mut guard = self.0.write();

		match slot {
			AuthSlot::Authenticated => guard.authenticated = Some(data),
			AuthSlot::ApplicationOnly => guard.application_only = Some(data),
		}
	}

	/// Empties `slot`, returning what it held.
	pub fn clear(&self, slot: AuthSlot) -> Option<AuthData> {
		let mut guard = self.0.write();

		match slot {
			AuthSlot::Authenticated => guard.authenticated.take(),
			AuthSlot::ApplicationOnly => guard.application_only.take(),
		}
	}

	/// Returns `true` when `slot` holds a credential set.
	pub fn has(&self, slot: AuthSlot) -> bool {
		let guard = self.0.read();

		match slot {
			AuthSlot::Authenticated => guard.authenticated.is_some(),
			AuthSlot::ApplicationOnly => guard.application_only.is_some(),
		}
	}

	/// `Authorization` header value for `slot`, when it holds credentials.
	pub fn authorization(&self, slot: AuthSlot) -> Option<String> {
		let guard = self.0.read();
		let data = match slot {
			AuthSlot::Authenticated => guard.authenticated.as_ref(),
			AuthSlot::ApplicationOnly => guard.application_only.as_ref(),
		};

		data.map(AuthData::authorization)
	}

	/// Returns the persisted refresh token.
	pub fn refresh_token(&self) -> Option<Secret> {
		self.0.read().refresh_token.clone()
	}

	/// Persists a refresh token.
	pub fn set_refresh_token(&self, token: Secret) {
		self.0.write().refresh_token = Some(token);
	}

	/// Returns `true` when a refresh token is persisted.
	pub fn has_refresh_token(&self) -> bool {
		self.0.read().refresh_token.is_some()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::ScopeSet;

	#[test]
	fn slots_are_independent() {
		let store = TokenStore::default();

		store.set(AuthSlot::ApplicationOnly, AuthData::implicit("app", ScopeSet::default()));

		assert!(store.has(AuthSlot::ApplicationOnly));
		assert!(!store.has(AuthSlot::Authenticated));
		assert_eq!(store.authorization(AuthSlot::ApplicationOnly).as_deref(), Some("bearer app"));
		assert_eq!(store.authorization(AuthSlot::Authenticated), None);

		store.set(AuthSlot::Authenticated, AuthData::implicit("user", ScopeSet::default()));

		let cleared = store.clear(AuthSlot::Authenticated).expect("Slot should hold data.");

		assert_eq!(cleared.access_token.expose(), "user");
		assert!(store.has(AuthSlot::ApplicationOnly));
	}

	#[test]
	fn refresh_token_outlives_slots() {
		let store = TokenStore::default();

		store.set_refresh_token(Secret::new("r"));
		store.set(AuthSlot::Authenticated, AuthData::implicit("user", ScopeSet::default()));
		store.clear(AuthSlot::Authenticated);

		assert!(store.has_refresh_token());
		assert_eq!(store.refresh_token().as_ref().map(Secret::expose), Some("r"));
	}
}
