//! Reddit OAuth collaborator: token grants, authorization URLs and revocation.
//!
//! Standard grants (password, authorization code, client credentials, refresh token) and the
//! authorization URLs go through the `oauth2` crate's [`BasicClient`]. Reddit's
//! installed-client grant and token revocation are plain form posts, because the former is
//! an extension grant and the latter answers `204 No Content`.

pub use oauth2;

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use oauth2::{
	AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
	HttpClientError, RedirectUrl, RefreshToken, RequestTokenError, ResourceOwnerPassword,
	ResourceOwnerUsername, Scope, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError, BasicTokenResponse},
};
// self
use crate::{
	_prelude::*,
	auth::{AuthData, ScopeSet, Secret},
	config::{OAuthCredentials, Scheme, TokenDuration, UserConfig, server_url},
	endpoint::{Args, HttpMethod},
	error::{ConfigError, TransientError, TransportError},
	http::{ApiRequest, ApiResponse, HttpTransport, OAuthHttpBridge},
};

/// Extension grant type for installed apps acting without a user.
pub const INSTALLED_CLIENT_GRANT: &str = "https://oauth.reddit.com/grants/installed_client";
/// Token endpoint path on the www server.
pub const TOKEN_PATH: &str = "/api/v1/access_token";
/// Authorization page path on the www server.
pub const AUTHORIZE_PATH: &str = "/api/v1/authorize";
/// Token revocation path on the www server.
pub const REVOKE_PATH: &str = "/api/v1/revoke_token";

type ConfiguredBasicClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Grants the token endpoint accepts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OAuthGrant {
	/// Script apps exchanging the owner's credentials.
	Password {
		/// Reddit username.
		username: String,
		/// Reddit password.
		password: Secret,
	},
	/// Explicit apps exchanging the code from the authorization redirect.
	AuthorizationCode {
		/// Code received on the redirect URI.
		code: String,
	},
	/// Confidential apps acting without a user.
	ClientCredentials,
	/// Installed apps acting without a user.
	InstalledClient {
		/// Device identifier (20 to 30 characters).
		device_id: String,
	},
	/// Renewal of a permanent grant.
	RefreshToken {
		/// Refresh token issued with the original grant.
		refresh_token: Secret,
	},
}
impl OAuthGrant {
	/// Returns the `grant_type` value sent on the wire.
	pub const fn as_str(&self) -> &'static str {
		match self {
			OAuthGrant::Password { .. } => "password",
			OAuthGrant::AuthorizationCode { .. } => "authorization_code",
			OAuthGrant::ClientCredentials => "client_credentials",
			OAuthGrant::InstalledClient { .. } => INSTALLED_CLIENT_GRANT,
			OAuthGrant::RefreshToken { .. } => "refresh_token",
		}
	}
}

/// Token endpoint error categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TokenErrorKind {
	InvalidGrant,
	InvalidClient,
	InsufficientScope,
	Transient,
}

/// OAuth operations bound to one app configuration and one www host.
pub struct RedditOAuth<T>
where
	T: ?Sized + HttpTransport,
{
	oauth_client: ConfiguredBasicClient,
	bridge: OAuthHttpBridge<T>,
	transport: Arc<T>,
	key: String,
	secret: Option<Secret>,
	scope: ScopeSet,
	duration: TokenDuration,
	user_agent: String,
	scheme: Scheme,
	server_www: String,
}
impl<T> RedditOAuth<T>
where
	T: ?Sized + HttpTransport,
{
	/// Prepares OAuth operations against `server_www` (usually `www.reddit.com`).
	pub fn new(config: &UserConfig, transport: Arc<T>, server_www: &str) -> Result<Self> {
		let base = server_url(config.scheme, server_www)?;
		let auth_url = AuthUrl::from_url(join(&base, AUTHORIZE_PATH)?);
		let token_url = TokenUrl::from_url(join(&base, TOKEN_PATH)?);
		let credentials = &config.oauth.credentials;
		let mut oauth_client = BasicClient::new(ClientId::new(credentials.key().to_owned()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url);

		if let Some(secret) = credentials.secret() {
			oauth_client =
				oauth_client.set_client_secret(ClientSecret::new(secret.expose().to_owned()));
		}
		if let Some(redirect) = credentials.redirect_uri() {
			oauth_client = oauth_client.set_redirect_uri(RedirectUrl::from_url(redirect.clone()));
		}

		Ok(Self {
			oauth_client,
			bridge: OAuthHttpBridge::new(Arc::clone(&transport), config.user_agent.clone()),
			transport,
			key: credentials.key().to_owned(),
			secret: credentials.secret().cloned(),
			scope: config.oauth.scope.clone(),
			duration: config.oauth.duration,
			user_agent: config.user_agent.clone(),
			scheme: config.scheme,
			server_www: server_www.to_owned(),
		})
	}

	/// Requests a credential set from the token endpoint.
	pub async fn get_auth_data(&self, grant: OAuthGrant) -> Result<AuthData> {
		match grant {
			OAuthGrant::Password { username, password } => {
				let username = ResourceOwnerUsername::new(username);
				let password = ResourceOwnerPassword::new(password.expose().to_owned());
				let response = self
					.oauth_client
					.exchange_password(&username, &password)
					.add_scopes(self.scopes())
					.request_async(&self.bridge)
					.await
					.map_err(map_request_error)?;

				self.auth_data(response)
			},
			OAuthGrant::AuthorizationCode { code } => {
				let response = self
					.oauth_client
					.exchange_code(AuthorizationCode::new(code))
					.request_async(&self.bridge)
					.await
					.map_err(map_request_error)?;

				self.auth_data(response)
			},
			OAuthGrant::ClientCredentials => {
				let response = self
					.oauth_client
					.exchange_client_credentials()
					.add_scopes(self.scopes())
					.request_async(&self.bridge)
					.await
					.map_err(map_request_error)?;

				self.auth_data(response)
			},
			OAuthGrant::RefreshToken { refresh_token } => {
				let token = RefreshToken::new(refresh_token.expose().to_owned());
				let response = self
					.oauth_client
					.exchange_refresh_token(&token)
					.request_async(&self.bridge)
					.await
					.map_err(map_request_error)?;

				self.auth_data(response)
			},
			OAuthGrant::InstalledClient { device_id } => {
				let mut form = Args::new();

				form.insert("grant_type".into(), INSTALLED_CLIENT_GRANT.into());
				form.insert("device_id".into(), device_id);

				if !self.scope.is_empty() {
					form.insert("scope".into(), self.scope.joined(' '));
				}

				let response = self.post_form(TOKEN_PATH, &form).await?;

				parse_raw_token_response(response.status, &response.body, &self.scope)
			},
		}
	}

	/// Authorization page URL for explicit (code) apps.
	pub fn explicit_auth_url(&self, state: &str) -> Url {
		let (url, _) = self
			.oauth_client
			.authorize_url(|| CsrfToken::new(state.to_owned()))
			.add_scopes(self.scopes())
			.add_extra_param("duration", self.duration.as_str())
			.url();

		url
	}

	/// Authorization page URL for implicit (token) apps.
	pub fn implicit_auth_url(&self, state: &str) -> Url {
		let (url, _) = self
			.oauth_client
			.authorize_url(|| CsrfToken::new(state.to_owned()))
			.add_scopes(self.scopes())
			.use_implicit_flow()
			.url();

		url
	}

	/// Revokes an access or refresh token.
	pub async fn revoke_token(&self, token: &Secret, is_refresh_token: bool) -> Result<()> {
		let mut form = Args::new();
		let hint = if is_refresh_token { "refresh_token" } else { "access_token" };

		form.insert("token".into(), token.expose().to_owned());
		form.insert("token_type_hint".into(), hint.into());

		let response = self.post_form(REVOKE_PATH, &form).await?;

		if response.status_class() == 2 {
			return Ok(());
		}

		Err(TransientError::TokenEndpoint {
			message: format!("token revocation returned status {}", response.status),
			status: Some(response.status),
		}
		.into())
	}

	fn scopes(&self) -> Vec<Scope> {
		self.scope.iter().map(|scope| Scope::new(scope.to_owned())).collect()
	}

	fn auth_data(&self, response: BasicTokenResponse) -> Result<AuthData> {
		let expires_in = response.expires_in().ok_or(ConfigError::MissingExpiresIn)?.as_secs();
		let scope = match response.scopes() {
			Some(scopes) =>
				ScopeSet::new(scopes.iter().map(|scope| scope.as_str())).map_err(ConfigError::from)?,
			None => self.scope.clone(),
		};
		let token_type: &str = response.token_type().as_ref();
		let mut data =
			AuthData::new(response.access_token().secret().to_owned(), token_type, expires_in, scope);

		if let Some(refresh) = response.refresh_token() {
			data = data.with_refresh_token(refresh.secret().to_owned());
		}

		Ok(data)
	}

	async fn post_form(&self, path: &str, form: &Args) -> Result<ApiResponse> {
		let base = server_url(self.scheme, &self.server_www)?;
		let credentials = format!(
			"{}:{}",
			self.key,
			self.secret.as_ref().map(Secret::expose).unwrap_or_default()
		);
		let request = ApiRequest::new(HttpMethod::Post, join(&base, path)?)
			.with_header("user-agent", self.user_agent.as_str())
			.with_header("authorization", format!("Basic {}", STANDARD.encode(credentials)))
			.with_form(form);

		Ok(self.transport.send(request).await?)
	}
}
impl<T> Debug for RedditOAuth<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RedditOAuth")
			.field("key", &self.key)
			.field("server_www", &self.server_www)
			.field("scope", &self.scope)
			.finish_non_exhaustive()
	}
}

/// Picks the grant for an app type; `None` means no network grant applies.
pub fn grant_for(
	credentials: &OAuthCredentials,
	device_id: &str,
	application_only: bool,
) -> Option<OAuthGrant> {
	match (credentials, application_only) {
		(OAuthCredentials::Implicit { .. }, true) =>
			Some(OAuthGrant::InstalledClient { device_id: device_id.to_owned() }),
		(_, true) => Some(OAuthGrant::ClientCredentials),
		(OAuthCredentials::Script { username, password, .. }, false) =>
			Some(OAuthGrant::Password { username: username.clone(), password: password.clone() }),
		_ => None,
	}
}

fn join(base: &Url, path: &str) -> Result<Url, ConfigError> {
	base.join(path)
		.map_err(|source| ConfigError::InvalidServer { server: base.to_string(), source })
}

fn parse_raw_token_response(status: u16, body: &str, requested: &ScopeSet) -> Result<AuthData> {
	if let Some(error) = token_error_from_body(Some(status), body) {
		return Err(error);
	}
	if status != 200 {
		return Err(classify(None, None, Some(status)));
	}

	let mut deserializer = serde_json::Deserializer::from_str(body);
	let mut data: AuthData = serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| TransientError::TokenResponseParse { source, status: Some(status) })?;

	if data.scope.is_empty() {
		data.scope = requested.clone();
	}

	Ok(data)
}

fn token_error_from_body(status: Option<u16>, body: &str) -> Option<Error> {
	let value: Value = serde_json::from_str(body).ok()?;
	let error = value.get("error")?;
	let description = value.get("error_description").and_then(Value::as_str);

	match error {
		Value::String(code) => Some(classify(Some(code), description, status)),
		Value::Number(code) =>
			Some(classify(None, description, code.as_u64().and_then(|c| u16::try_from(c).ok()))),
		_ => None,
	}
}

fn map_request_error(err: BasicRequestTokenError<HttpClientError<TransportError>>) -> Error {
	match err {
		RequestTokenError::ServerResponse(response) => map_server_response(&response),
		RequestTokenError::Request(HttpClientError::Reqwest(inner)) => Error::Transport(*inner),
		RequestTokenError::Request(HttpClientError::Http(inner)) => ConfigError::from(inner).into(),
		RequestTokenError::Request(HttpClientError::Io(inner)) => TransportError::Io(inner).into(),
		RequestTokenError::Request(HttpClientError::Other(message)) =>
			TransientError::TokenEndpoint { message, status: None }.into(),
		RequestTokenError::Request(other) =>
			TransientError::TokenEndpoint { message: other.to_string(), status: None }.into(),
		// Reddit reports some grant failures with 200 and an `error` body.
		RequestTokenError::Parse(source, body) => {
			let text = String::from_utf8_lossy(&body);

			token_error_from_body(None, &text).unwrap_or_else(|| {
				TransientError::TokenResponseParse { source, status: None }.into()
			})
		},
		RequestTokenError::Other(message) =>
			TransientError::TokenEndpoint { message, status: None }.into(),
	}
}

fn map_server_response(response: &BasicErrorResponse) -> Error {
	let code: &str = response.error().as_ref();

	classify(Some(code), response.error_description().map(String::as_str), None)
}

fn classify(oauth_error: Option<&str>, description: Option<&str>, status: Option<u16>) -> Error {
	let kind = oauth_error
		.and_then(match_exact_value)
		.or_else(|| description.and_then(match_exact_value))
		.unwrap_or_else(|| classify_status(status));
	let message = match (description, oauth_error) {
		(Some(description), _) => format!("Token endpoint returned an OAuth error: {description}"),
		(None, Some(code)) => format!("Token endpoint returned an OAuth error: {code}"),
		(None, None) => format!(
			"Token endpoint returned status {}",
			status.map(|s| s.to_string()).unwrap_or_else(|| "unknown".into())
		),
	};

	match kind {
		TokenErrorKind::InvalidGrant => Error::InvalidGrant { reason: message },
		TokenErrorKind::InvalidClient => Error::InvalidClient { reason: message },
		TokenErrorKind::InsufficientScope => Error::InsufficientScope { reason: message },
		TokenErrorKind::Transient => TransientError::TokenEndpoint { message, status }.into(),
	}
}

fn match_exact_value(value: &str) -> Option<TokenErrorKind> {
	if value.eq_ignore_ascii_case("invalid_grant") || value.eq_ignore_ascii_case("access_denied") {
		Some(TokenErrorKind::InvalidGrant)
	} else if value.eq_ignore_ascii_case("invalid_client")
		|| value.eq_ignore_ascii_case("unauthorized_client")
	{
		Some(TokenErrorKind::InvalidClient)
	} else if value.eq_ignore_ascii_case("invalid_scope")
		|| value.eq_ignore_ascii_case("insufficient_scope")
	{
		Some(TokenErrorKind::InsufficientScope)
	} else if value.eq_ignore_ascii_case("temporarily_unavailable")
		|| value.eq_ignore_ascii_case("server_error")
	{
		Some(TokenErrorKind::Transient)
	} else {
		None
	}
}

fn classify_status(status: Option<u16>) -> TokenErrorKind {
	match status {
		Some(400 | 404 | 410) => TokenErrorKind::InvalidGrant,
		Some(401) => TokenErrorKind::InvalidClient,
		Some(403) => TokenErrorKind::InsufficientScope,
		_ => TokenErrorKind::Transient,
	}
}
