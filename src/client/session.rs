//! Session lifecycle: authentication, refresh, revocation and authorization URLs.
//!
//! A client moves between three states. Without authenticated data it is application-only
//! (calls use the application-only slot once one exists); after a user grant it is
//! authenticated, optionally backed by a refresh token for unattended renewal.

// crates.io
use rand::Rng;
// self
use crate::{
	_prelude::*,
	auth::{AuthData, AuthSlot, Secret},
	client::Client,
	config::{OAuthCredentials, OAuthType},
	http::HttpTransport,
	oauth::{self, OAuthGrant, RedditOAuth},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Input accepted by [`Client::auth`].
#[derive(Clone, Debug)]
pub enum AuthCredential {
	/// Code from an explicit app's authorization redirect.
	AuthorizationCode(String),
	/// Access token from an implicit app's authorization redirect.
	AccessToken(String),
	/// Credential set obtained elsewhere; stored without a network call.
	AuthData(AuthData),
}

/// Overrides for session flows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionOptions {
	/// Overrides the authorization/token host.
	pub server_www: Option<String>,
}
impl SessionOptions {
	/// Targets another authorization/token host.
	pub fn server_www(mut self, host: impl Into<String>) -> Self {
		self.server_www = Some(host.into());

		self
	}
}

impl<T> Client<T>
where
	T: HttpTransport,
{
	/// Authenticates and stores the resulting credential set.
	///
	/// Script apps use the owner's credentials, explicit apps exchange `credential` as an
	/// authorization code and implicit apps store `credential` as the access token. With
	/// `application_only` the app authenticates as itself instead. Returns the refresh token
	/// when the grant issued one; it is also kept for automatic renewal.
	pub async fn auth(
		&self,
		credential: Option<AuthCredential>,
		application_only: bool,
		options: &SessionOptions,
	) -> Result<Option<Secret>> {
		let kind = if application_only { FlowKind::ApplicationOnlyAuth } else { FlowKind::Auth };
		let span = FlowSpan::new(kind, "auth");

		obs::record_flow_outcome(kind, FlowOutcome::Attempt);

		let result = span.instrument(self.auth_inner(credential, application_only, options)).await;

		obs::record_flow_outcome(
			kind,
			if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure },
		);

		result
	}

	/// Authenticates the app itself, without a user.
	pub async fn application_only_auth(&self) -> Result<Option<Secret>> {
		self.auth(None, true, &SessionOptions::default()).await
	}

	/// Exchanges `refresh_token` for a new authenticated credential set.
	///
	/// The token is persisted only after the token endpoint accepts it.
	pub async fn refresh(&self, refresh_token: Secret, options: &SessionOptions) -> Result<()> {
		let span = FlowSpan::new(FlowKind::Refresh, "refresh");

		obs::record_flow_outcome(FlowKind::Refresh, FlowOutcome::Attempt);

		let result = span
			.instrument(async {
				let data = self
					.oauth(options)?
					.get_auth_data(OAuthGrant::RefreshToken { refresh_token: refresh_token.clone() })
					.await?;

				self.tokens.set_refresh_token(refresh_token);
				self.tokens.set(AuthSlot::Authenticated, data);

				Ok::<_, Error>(())
			})
			.await;

		obs::record_flow_outcome(
			FlowKind::Refresh,
			if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure },
		);

		result
	}

	/// Revokes the session and forgets the authenticated credential set.
	///
	/// Revokes `refresh_token` when given, the stored access token otherwise. Does nothing
	/// when no user is authenticated. Application-only credentials are left untouched.
	pub async fn deauth(
		&self,
		refresh_token: Option<Secret>,
		options: &SessionOptions,
	) -> Result<()> {
		let Some(data) = self.tokens.get(AuthSlot::Authenticated) else {
			return Ok(());
		};
		let span = FlowSpan::new(FlowKind::Deauth, "deauth");

		obs::record_flow_outcome(FlowKind::Deauth, FlowOutcome::Attempt);

		let result = span
			.instrument(async {
				let oauth = self.oauth(options)?;

				match &refresh_token {
					Some(token) => oauth.revoke_token(token, true).await?,
					None => oauth.revoke_token(&data.access_token, false).await?,
				}

				self.tokens.clear(AuthSlot::Authenticated);

				Ok::<_, Error>(())
			})
			.await;

		obs::record_flow_outcome(
			FlowKind::Deauth,
			if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure },
		);

		result
	}

	/// Authorization page URL for explicit apps; `state` defaults to a random number.
	pub fn explicit_auth_url(&self, state: Option<&str>, options: &SessionOptions) -> Result<Url> {
		let state = state.map_or_else(random_state, str::to_owned);

		Ok(self.oauth(options)?.explicit_auth_url(&state))
	}

	/// Authorization page URL for implicit apps; `state` defaults to a random number.
	pub fn implicit_auth_url(&self, state: Option<&str>, options: &SessionOptions) -> Result<Url> {
		let state = state.map_or_else(random_state, str::to_owned);

		Ok(self.oauth(options)?.implicit_auth_url(&state))
	}

	/// Returns `true` when a user credential set is stored.
	pub fn has_authenticated_data(&self) -> bool {
		self.tokens.has(AuthSlot::Authenticated)
	}

	/// Returns `true` when an application-only credential set is stored.
	pub fn has_application_only_data(&self) -> bool {
		self.tokens.has(AuthSlot::ApplicationOnly)
	}

	/// Returns `true` when a refresh token is stored.
	pub fn has_refresh_token(&self) -> bool {
		self.tokens.has_refresh_token()
	}

	/// Returns `true` while no user is authenticated.
	pub fn is_application_only(&self) -> bool {
		!self.has_authenticated_data()
	}

	/// Returns `true` when the configured app type is `kind`.
	pub fn is_oauth_type(&self, kind: OAuthType) -> bool {
		self.config.oauth_type() == kind
	}

	/// Headers for an API call: `User-Agent` plus `Authorization` from the selected slot.
	pub fn headers(&self, bypass_auth: bool) -> BTreeMap<String, String> {
		let slot = if bypass_auth || self.is_application_only() {
			AuthSlot::ApplicationOnly
		} else {
			AuthSlot::Authenticated
		};
		let mut headers = BTreeMap::new();

		headers.insert("user-agent".to_owned(), self.config.user_agent.clone());

		if let Some(authorization) = self.tokens.authorization(slot) {
			headers.insert("authorization".to_owned(), authorization);
		}

		headers
	}

	pub(crate) fn oauth(&self, options: &SessionOptions) -> Result<RedditOAuth<T>> {
		let server_www = options.server_www.as_deref().unwrap_or(&self.config.server_www);

		RedditOAuth::new(&self.config, Arc::clone(&self.transport), server_www)
	}

	async fn auth_inner(
		&self,
		credential: Option<AuthCredential>,
		application_only: bool,
		options: &SessionOptions,
	) -> Result<Option<Secret>> {
		let data = match credential {
			Some(AuthCredential::AuthData(data)) => data,
			credential => self.resolve(credential, application_only, options).await?,
		};
		let slot = AuthSlot::from_application_only(application_only);
		let refresh_token = data.refresh_token.clone();

		#[cfg(feature = "tracing")]
		tracing::debug!(?slot, refresh = refresh_token.is_some(), "Storing credential set.");

		self.tokens.set(slot, data);

		if let Some(token) = &refresh_token {
			self.tokens.set_refresh_token(token.clone());
		}

		Ok(refresh_token)
	}

	async fn resolve(
		&self,
		credential: Option<AuthCredential>,
		application_only: bool,
		options: &SessionOptions,
	) -> Result<AuthData> {
		let credentials = &self.config.oauth.credentials;

		if let Some(grant) =
			oauth::grant_for(credentials, &self.config.oauth.device_id, application_only)
		{
			return self.oauth(options)?.get_auth_data(grant).await;
		}

		match (credentials, credential) {
			(OAuthCredentials::Explicit { .. }, Some(AuthCredential::AuthorizationCode(code))) =>
				self.oauth(options)?.get_auth_data(OAuthGrant::AuthorizationCode { code }).await,
			(OAuthCredentials::Implicit { .. }, Some(AuthCredential::AccessToken(token))) =>
				Ok(AuthData::implicit(token, self.config.oauth.scope.clone())),
			(OAuthCredentials::Explicit { .. }, _) => Err(Error::Authentication {
				reason: "an authorization code is required for explicit apps".into(),
			}),
			_ => Err(Error::Authentication {
				reason: "an access token is required for implicit apps".into(),
			}),
		}
	}
}

fn random_state() -> String {
	rand::rng().random_range(1..=1000_u32).to_string()
}
