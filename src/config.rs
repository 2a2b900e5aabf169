//! Client configuration, validated once at construction.
//!
//! [`UserConfig`] is immutable after [`UserConfigBuilder::build`] succeeds. The OAuth app
//! type is modeled as [`OAuthCredentials`], a tagged variant that only carries the fields
//! valid for that type, so flows never re-check which fields are present.
//!
//! Configs can also be decoded from a JSON document using the camelCase keys Reddit app
//! settings are usually written with (see [`RawUserConfig`]).

// std
use std::time::Duration;
// self
use crate::{_prelude::*, auth::ScopeSet, auth::Secret, error::ConfigError};

/// Default number of attempts for a call that keeps hitting server errors.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 60;
/// Default pause between server-error retries.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(5000);
/// Default host for OAuth API calls.
pub const DEFAULT_SERVER_OAUTH: &str = "oauth.reddit.com";
/// Default host for authorization pages and the token endpoint.
pub const DEFAULT_SERVER_WWW: &str = "www.reddit.com";
/// Default `api_type` injected into endpoints that need JSON API responses.
pub const DEFAULT_API_TYPE: &str = "json";
/// Device identifier sent with installed-client grants when none is configured.
pub const DEFAULT_DEVICE_ID: &str = "DO_NOT_TRACK_THIS_DEVICE";

const DEVICE_ID_LEN: std::ops::RangeInclusive<usize> = 20..=30;

/// Reddit app types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OAuthType {
	/// Web app that exchanges authorization codes server-side.
	Explicit,
	/// Installed app that receives access tokens directly in the redirect.
	Implicit,
	/// Personal-use script that authenticates with the owner's username and password.
	Script,
}
impl OAuthType {
	/// Returns the Reddit app-type label.
	pub const fn as_str(self) -> &'static str {
		match self {
			OAuthType::Explicit => "explicit",
			OAuthType::Implicit => "implicit",
			OAuthType::Script => "script",
		}
	}
}
impl Display for OAuthType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for OAuthType {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"explicit" => Ok(OAuthType::Explicit),
			"implicit" => Ok(OAuthType::Implicit),
			"script" => Ok(OAuthType::Script),
			other => Err(ConfigError::InvalidOAuthType { given: other.into() }),
		}
	}
}

/// Lifetime requested for explicit grants.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenDuration {
	/// One-hour access token without a refresh token.
	#[default]
	Temporary,
	/// Access token plus a refresh token for renewal without user interaction.
	Permanent,
}
impl TokenDuration {
	/// Returns the wire label.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenDuration::Temporary => "temporary",
			TokenDuration::Permanent => "permanent",
		}
	}
}
impl FromStr for TokenDuration {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"temporary" => Ok(TokenDuration::Temporary),
			"permanent" => Ok(TokenDuration::Permanent),
			other => Err(ConfigError::InvalidDuration { given: other.into() }),
		}
	}
}

/// URL scheme used to reach both servers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scheme {
	/// TLS; the only scheme Reddit serves.
	#[default]
	Https,
	/// Plain HTTP for local test servers.
	Http,
}
impl Scheme {
	/// Returns the scheme label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Scheme::Https => "https",
			Scheme::Http => "http",
		}
	}
}
impl FromStr for Scheme {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"https" => Ok(Scheme::Https),
			"http" => Ok(Scheme::Http),
			other => Err(ConfigError::InvalidScheme { given: other.into() }),
		}
	}
}

/// App credentials; each variant holds exactly the fields its app type requires.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OAuthCredentials {
	/// Personal-use script.
	Script {
		/// App client id.
		key: String,
		/// App client secret.
		secret: Secret,
		/// Reddit username of the script owner.
		username: String,
		/// Reddit password of the script owner.
		password: Secret,
	},
	/// Web app.
	Explicit {
		/// App client id.
		key: String,
		/// App client secret.
		secret: Secret,
		/// Registered redirect URI.
		redirect_uri: Url,
	},
	/// Installed app.
	Implicit {
		/// App client id.
		key: String,
		/// Registered redirect URI.
		redirect_uri: Url,
	},
}
impl OAuthCredentials {
	/// App type of these credentials.
	pub fn kind(&self) -> OAuthType {
		match self {
			Self::Script { .. } => OAuthType::Script,
			Self::Explicit { .. } => OAuthType::Explicit,
			Self::Implicit { .. } => OAuthType::Implicit,
		}
	}

	/// App client id.
	pub fn key(&self) -> &str {
		match self {
			Self::Script { key, .. } | Self::Explicit { key, .. } | Self::Implicit { key, .. } =>
				key,
		}
	}

	/// App client secret; implicit apps have none.
	pub fn secret(&self) -> Option<&Secret> {
		match self {
			Self::Script { secret, .. } | Self::Explicit { secret, .. } => Some(secret),
			Self::Implicit { .. } => None,
		}
	}

	/// Registered redirect URI; scripts have none.
	pub fn redirect_uri(&self) -> Option<&Url> {
		match self {
			Self::Explicit { redirect_uri, .. } | Self::Implicit { redirect_uri, .. } =>
				Some(redirect_uri),
			Self::Script { .. } => None,
		}
	}
}

/// OAuth settings shared by every flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OAuthSettings {
	/// App credentials.
	pub credentials: OAuthCredentials,
	/// Scopes requested by every grant.
	pub scope: ScopeSet,
	/// Device identifier for installed-client grants (20 to 30 characters).
	pub device_id: String,
	/// Lifetime requested by explicit authorization URLs.
	pub duration: TokenDuration,
}

/// Validated, immutable client configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserConfig {
	/// `User-Agent` header sent with every request.
	pub user_agent: String,
	/// OAuth settings.
	pub oauth: OAuthSettings,
	/// `api_type` injected into endpoints that need JSON API responses; `None` disables it.
	pub api_type: Option<String>,
	/// Decode HTML entities in success bodies by default.
	pub decode_html_entities: bool,
	/// Total attempts for a call that keeps hitting server errors.
	pub retry_attempts: u32,
	/// Pause between server-error retries.
	pub retry_delay: Duration,
	/// Host for OAuth API calls.
	pub server_oauth: String,
	/// Host for authorization pages and the token endpoint.
	pub server_www: String,
	/// URL scheme used for both hosts.
	pub scheme: Scheme,
}
impl UserConfig {
	/// Returns a builder seeded with the documented defaults.
	pub fn builder() -> UserConfigBuilder {
		UserConfigBuilder::default()
	}

	/// Decodes and validates a JSON config document.
	pub fn from_json(document: &str) -> Result<Self, ConfigError> {
		let raw: RawUserConfig =
			serde_json::from_str(document).map_err(|source| ConfigError::Document { source })?;

		Self::try_from(raw)
	}

	/// App type shortcut.
	pub fn oauth_type(&self) -> OAuthType {
		self.oauth.credentials.kind()
	}

	/// Base URL (`scheme://host/`) for the provided host.
	pub fn server_url(&self, host: &str) -> Result<Url, ConfigError> {
		server_url(self.scheme, host)
	}
}

/// Builder for [`UserConfig`]; every field is optional until [`build`](Self::build).
#[derive(Clone, Debug, Default)]
pub struct UserConfigBuilder {
	user_agent: Option<String>,
	oauth_type: Option<OAuthType>,
	key: Option<String>,
	secret: Option<String>,
	username: Option<String>,
	password: Option<String>,
	redirect_uri: Option<String>,
	scope: Vec<String>,
	device_id: Option<String>,
	duration: TokenDuration,
	api_type: Option<Option<String>>,
	decode_html_entities: bool,
	retry_attempts: Option<u32>,
	retry_delay: Option<Duration>,
	server_oauth: Option<String>,
	server_www: Option<String>,
	scheme: Scheme,
}
impl UserConfigBuilder {
	/// Sets the `User-Agent` header.
	pub fn user_agent(mut self, value: impl Into<String>) -> Self {
		self.user_agent = Some(value.into());

		self
	}

	/// Sets the app type.
	pub fn oauth_type(mut self, value: OAuthType) -> Self {
		self.oauth_type = Some(value);

		self
	}

	/// Sets the app client id.
	pub fn key(mut self, value: impl Into<String>) -> Self {
		self.key = Some(value.into());

		self
	}

	/// Sets the app client secret (explicit and script apps).
	pub fn secret(mut self, value: impl Into<String>) -> Self {
		self.secret = Some(value.into());

		self
	}

	/// Sets the script owner's username.
	pub fn username(mut self, value: impl Into<String>) -> Self {
		self.username = Some(value.into());

		self
	}

	/// Sets the script owner's password.
	pub fn password(mut self, value: impl Into<String>) -> Self {
		self.password = Some(value.into());

		self
	}

	/// Sets the registered redirect URI (explicit and implicit apps).
	pub fn redirect_uri(mut self, value: impl Into<String>) -> Self {
		self.redirect_uri = Some(value.into());

		self
	}

	/// Sets the requested scopes.
	pub fn scope<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scope = scopes.into_iter().map(Into::into).collect();

		self
	}

	/// Sets the installed-client device identifier.
	pub fn device_id(mut self, value: impl Into<String>) -> Self {
		self.device_id = Some(value.into());

		self
	}

	/// Sets the explicit-grant duration.
	pub fn duration(mut self, value: TokenDuration) -> Self {
		self.duration = value;

		self
	}

	/// Overrides the injected `api_type`; `None` disables injection.
	pub fn api_type(mut self, value: Option<impl Into<String>>) -> Self {
		self.api_type = Some(value.map(Into::into));

		self
	}

	/// Toggles HTML entity decoding of success bodies.
	pub fn decode_html_entities(mut self, value: bool) -> Self {
		self.decode_html_entities = value;

		self
	}

	/// Sets the total attempts for server-error retries.
	pub fn retry_attempts(mut self, value: u32) -> Self {
		self.retry_attempts = Some(value);

		self
	}

	/// Sets the pause between server-error retries.
	pub fn retry_delay(mut self, value: Duration) -> Self {
		self.retry_delay = Some(value);

		self
	}

	/// Sets the OAuth API host.
	pub fn server_oauth(mut self, value: impl Into<String>) -> Self {
		self.server_oauth = Some(value.into());

		self
	}

	/// Sets the authorization/token host.
	pub fn server_www(mut self, value: impl Into<String>) -> Self {
		self.server_www = Some(value.into());

		self
	}

	/// Sets the URL scheme.
	pub fn scheme(mut self, value: Scheme) -> Self {
		self.scheme = value;

		self
	}

	/// Validates the collected values and produces a [`UserConfig`].
	pub fn build(self) -> Result<UserConfig, ConfigError> {
		let user_agent = require(self.user_agent, "userAgent", "")?;
		let oauth_type = require(self.oauth_type, "oauth.type", "")?;
		let key = require(self.key, "oauth.key", "")?;
		let credentials = match oauth_type {
			OAuthType::Script => {
				let secret = require(self.secret, "oauth.secret", " for type explicit/script")?;
				let username = require(self.username, "oauth.username", " for type script")?;
				let password = require(self.password, "oauth.password", " for type script")?;

				OAuthCredentials::Script {
					key,
					secret: Secret::new(secret),
					username,
					password: Secret::new(password),
				}
			},
			OAuthType::Explicit => {
				let secret = require(self.secret, "oauth.secret", " for type explicit/script")?;
				let redirect_uri = parse_redirect(self.redirect_uri)?;

				OAuthCredentials::Explicit { key, secret: Secret::new(secret), redirect_uri }
			},
			OAuthType::Implicit =>
				OAuthCredentials::Implicit { key, redirect_uri: parse_redirect(self.redirect_uri)? },
		};
		let device_id = self.device_id.unwrap_or_else(|| DEFAULT_DEVICE_ID.into());
		let device_id_len = device_id.chars().count();

		if !DEVICE_ID_LEN.contains(&device_id_len) {
			return Err(ConfigError::InvalidDeviceId { length: device_id_len });
		}

		let scope = ScopeSet::new(self.scope)?;
		let server_oauth = self.server_oauth.unwrap_or_else(|| DEFAULT_SERVER_OAUTH.into());
		let server_www = self.server_www.unwrap_or_else(|| DEFAULT_SERVER_WWW.into());

		server_url(self.scheme, &server_oauth)?;
		server_url(self.scheme, &server_www)?;

		Ok(UserConfig {
			user_agent,
			oauth: OAuthSettings { credentials, scope, device_id, duration: self.duration },
			api_type: self.api_type.unwrap_or_else(|| Some(DEFAULT_API_TYPE.into())),
			decode_html_entities: self.decode_html_entities,
			retry_attempts: self.retry_attempts.unwrap_or(DEFAULT_RETRY_ATTEMPTS),
			retry_delay: self.retry_delay.unwrap_or(DEFAULT_RETRY_DELAY),
			server_oauth,
			server_www,
			scheme: self.scheme,
		})
	}
}

/// Serialized config document (camelCase keys).
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawUserConfig {
	/// `User-Agent` header.
	pub user_agent: Option<String>,
	/// OAuth section.
	pub oauth: RawOAuthConfig,
	/// `api_type` override; any non-string value (such as `false`) disables injection.
	pub api_type: Option<Value>,
	/// HTML entity decoding default.
	pub decode_html_entities: Option<bool>,
	/// Total attempts for server-error retries.
	pub retry_attempts: Option<u32>,
	/// Pause between server-error retries, in milliseconds.
	pub retry_delay: Option<u64>,
	/// OAuth API host.
	#[serde(rename = "serverOAuth")]
	pub server_oauth: Option<String>,
	/// Authorization/token host.
	#[serde(rename = "serverWWW")]
	pub server_www: Option<String>,
	/// URL scheme (`https` or `http`).
	pub scheme: Option<String>,
}

/// Serialized `oauth` section of a config document.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawOAuthConfig {
	/// App type label.
	#[serde(rename = "type")]
	pub kind: Option<String>,
	/// App client id.
	pub key: Option<String>,
	/// App client secret.
	pub secret: Option<String>,
	/// Script owner's username.
	pub username: Option<String>,
	/// Script owner's password.
	pub password: Option<String>,
	/// Registered redirect URI.
	pub redirect_uri: Option<String>,
	/// Requested scopes.
	pub scope: Option<Vec<String>>,
	/// Installed-client device identifier.
	pub device_id: Option<String>,
	/// Explicit-grant duration label.
	pub duration: Option<String>,
}

impl TryFrom<RawUserConfig> for UserConfig {
	type Error = ConfigError;

	fn try_from(raw: RawUserConfig) -> Result<Self, Self::Error> {
		let RawUserConfig {
			user_agent,
			oauth,
			api_type,
			decode_html_entities,
			retry_attempts,
			retry_delay,
			server_oauth,
			server_www,
			scheme,
		} = raw;
		let mut builder = UserConfig::builder();

		if let Some(value) = user_agent {
			builder = builder.user_agent(value);
		} else {
			return Err(ConfigError::MissingField { field: "userAgent", requirement: "" });
		}
		if let Some(kind) = oauth.kind {
			builder = builder.oauth_type(kind.parse()?);
		}
		if let Some(value) = oauth.key {
			builder = builder.key(value);
		}
		if let Some(duration) = oauth.duration {
			builder = builder.duration(duration.parse()?);
		}
		if let Some(value) = oauth.secret {
			builder = builder.secret(value);
		}
		if let Some(value) = oauth.username {
			builder = builder.username(value);
		}
		if let Some(value) = oauth.password {
			builder = builder.password(value);
		}
		if let Some(value) = oauth.redirect_uri {
			builder = builder.redirect_uri(value);
		}
		if let Some(value) = oauth.scope {
			builder = builder.scope(value);
		}
		if let Some(value) = oauth.device_id {
			builder = builder.device_id(value);
		}
		if let Some(value) = api_type {
			builder = builder.api_type(match value {
				Value::String(label) => Some(label),
				_ => None,
			});
		}
		if let Some(value) = decode_html_entities {
			builder = builder.decode_html_entities(value);
		}
		if let Some(value) = retry_attempts {
			builder = builder.retry_attempts(value);
		}
		if let Some(value) = retry_delay {
			builder = builder.retry_delay(Duration::from_millis(value));
		}
		if let Some(value) = server_oauth {
			builder = builder.server_oauth(value);
		}
		if let Some(value) = server_www {
			builder = builder.server_www(value);
		}
		if let Some(value) = scheme {
			builder = builder.scheme(value.parse()?);
		}

		builder.build()
	}
}

fn require<T>(
	value: Option<T>,
	field: &'static str,
	requirement: &'static str,
) -> Result<T, ConfigError> {
	value.ok_or(ConfigError::MissingField { field, requirement })
}

fn parse_redirect(value: Option<String>) -> Result<Url, ConfigError> {
	let raw = require(value, "oauth.redirectUri", " for type implicit/explicit")?;

	Url::parse(&raw).map_err(|source| ConfigError::InvalidRedirect { source })
}

pub(crate) fn server_url(scheme: Scheme, host: &str) -> Result<Url, ConfigError> {
	Url::parse(&format!("{}://{host}/", scheme.as_str()))
		.map_err(|source| ConfigError::InvalidServer { server: host.into(), source })
}
