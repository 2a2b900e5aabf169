//! Broker-level error types shared across configuration, session flows, and API calls.

// self
use crate::{_prelude::*, auth::ScopeValidationError, client::ListingError, endpoint::Args};

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical broker error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS); never retried by the broker.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Temporary token endpoint failure.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Listing result could not be paginated.
	#[error(transparent)]
	Listing(#[from] ListingError),

	/// Endpoint path references a `$token` the caller did not supply.
	#[error("Missing required url parameter {parameter}.")]
	UrlParameter {
		/// The unresolved `$token`, including the leading `$`.
		parameter: String,
	},
	/// The user session expired and cannot be renewed without the caller.
	#[error(
		"Access token has expired. Listen for the \"access_token_expired\" event to handle this gracefully in your app."
	)]
	AccessTokenExpired,
	/// The endpoint requires a user-authenticated session.
	#[error("Must be authenticated with a user to make a call to this endpoint.")]
	UserRequired,
	/// The token is valid but the call is outside its scopes or gated (e.g. reddit gold).
	#[error("{0}")]
	ScopeOrGating(Box<ResponseError>),
	/// Every server-error retry was spent; wraps the last server response.
	#[error("All retry attempts exhausted.\n\n{0}")]
	RetriesExhausted(Box<ResponseError>),
	/// Every re-authentication attempt was spent.
	#[error("Unable to refresh the access_token.")]
	ReauthExhausted,
	/// The response status is outside the 2xx/4xx/5xx classes.
	#[error("Invalid reddit response status of {status}.")]
	InvalidStatus {
		/// Status code returned by the server.
		status: u16,
	},
	/// Authentication could not produce usable credentials.
	#[error("There was a problem authenticating: {reason}.")]
	Authentication {
		/// Broker-supplied reason string.
		reason: String,
	},
	/// Token endpoint rejected the grant (bad code, password, or refresh token).
	#[error("Provider rejected the grant: {reason}.")]
	InvalidGrant {
		/// Provider- or broker-supplied reason string.
		reason: String,
	},
	/// Client authentication failed or credentials are malformed.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Provider- or broker-supplied reason string.
		reason: String,
	},
	/// Token endpoint refused the requested scopes.
	#[error("Token lacks the required scopes: {reason}.")]
	InsufficientScope {
		/// Provider- or broker-supplied reason string.
		reason: String,
	},
}
impl Error {
	/// Returns the server response that caused this error, when one exists.
	pub fn response(&self) -> Option<&ResponseError> {
		match self {
			Self::ScopeOrGating(response) | Self::RetriesExhausted(response) => Some(response),
			_ => None,
		}
	}
}

/// Diagnostic snapshot of a classified server response.
///
/// Carries everything needed to diagnose a failed call without re-deriving the request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseError {
	/// Short human-readable summary.
	pub message: String,
	/// HTTP status code.
	pub status: u16,
	/// Fully resolved endpoint URL.
	pub url: String,
	/// Arguments sent with the request (URL-substitution keys stripped).
	pub args: Args,
	/// Raw response body.
	pub body: String,
	/// Remaining server-error retries after this response, when tracked.
	pub retry_attempts_left: Option<u32>,
}
impl ResponseError {
	/// Creates a snapshot for the provided response.
	pub fn new(
		message: impl Into<String>,
		status: u16,
		url: impl Into<String>,
		args: Args,
		body: impl Into<String>,
	) -> Self {
		Self {
			message: message.into(),
			status,
			url: url.into(),
			args,
			body: body.into(),
			retry_attempts_left: None,
		}
	}

	/// Records the remaining retry budget.
	pub fn with_retry_attempts_left(mut self, left: u32) -> Self {
		self.retry_attempts_left = Some(left);

		self
	}
}
impl Display for ResponseError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let args = serde_json::to_string_pretty(&self.args).unwrap_or_else(|_| "{}".into());

		write!(
			f,
			"{}\n\n>>> Response Status: {}\n\n>>> Endpoint URL: {}\n\n>>> Arguments: {}\n\n>>> Response Body:\n\n{}",
			self.message, self.status, self.url, args, self.body
		)
	}
}
impl StdError for ResponseError {}

/// Configuration and validation failures; always fatal to the constructing call.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A field required for the selected OAuth type is absent.
	#[error("Missing required config value `{field}`{requirement}.")]
	MissingField {
		/// Dotted field name (e.g. `oauth.secret`).
		field: &'static str,
		/// Suffix naming the OAuth types that require the field; empty when always required.
		requirement: &'static str,
	},
	/// `oauth.type` is not one of the supported app types.
	#[error("Invalid `oauth.type`. Must be one of: explicit, implicit, or script.")]
	InvalidOAuthType {
		/// Value supplied by the caller.
		given: String,
	},
	/// `oauth.duration` is not a supported token duration.
	#[error("Invalid `oauth.duration`. Must be one of: permanent, temporary.")]
	InvalidDuration {
		/// Value supplied by the caller.
		given: String,
	},
	/// `scheme` is neither `https` nor `http`.
	#[error("Invalid `scheme`. Must be one of: https, http.")]
	InvalidScheme {
		/// Value supplied by the caller.
		given: String,
	},
	/// Device identifiers must be 20 to 30 characters long.
	#[error("Invalid device_id length. Must be 20-30 characters.")]
	InvalidDeviceId {
		/// Observed character count.
		length: usize,
	},
	/// Redirect URI cannot be parsed.
	#[error("Redirect URI is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A server host does not form a valid URL.
	#[error("Server `{server}` does not form a valid URL.")]
	InvalidServer {
		/// Offending host string.
		server: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Config document could not be decoded.
	#[error("Config document is invalid: {source}.")]
	Document {
		/// Underlying decoding failure.
		#[source]
		source: serde_json::Error,
	},
	/// Configured scopes cannot be normalized.
	#[error("Configured scopes are invalid.")]
	InvalidScope(#[from] ScopeValidationError),
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Token endpoint response omitted `expires_in`.
	#[error("Token endpoint response is missing expires_in.")]
	MissingExpiresIn,
	/// Token endpoint returned an excessively large `expires_in`.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Temporary token endpoint failures (safe to retry by the caller).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Token endpoint returned an unexpected but non-fatal response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Broker-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint responded with JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures (network, IO); no response was received.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {host}.")]
	Network {
		/// Host the request was addressed to.
		host: String,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during transport.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		host: impl Into<String>,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { host: host.into(), source: Box::new(src) }
	}
}
