//! Transport primitives shared by API calls and OAuth token exchanges.
//!
//! The client depends on exactly one HTTP abstraction, [`HttpTransport`]. It receives a fully
//! built [`ApiRequest`] and returns the raw status and body, or a [`TransportError`] when no
//! response arrived at all. Classifying statuses is the client's job, never the transport's.
//!
//! Token exchanges run through the `oauth2` crate, which speaks its own
//! [`AsyncHttpClient`] trait. [`OAuthHttpBridge`] adapts any [`HttpTransport`] to it, so a
//! test transport sees token requests and API calls on the same channel.

// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
#[cfg(feature = "reqwest")] use reqwest::redirect::Policy;
// self
use crate::{
	_prelude::*,
	endpoint::{Args, HttpMethod},
	error::{ConfigError, TransportError},
};

/// Boxed future returned by [`HttpTransport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Performs one HTTP exchange.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared by every
/// clone of a [`Client`](crate::client::Client). Transport-level retries, if any, belong
/// here; the client never retries a request that produced no response.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and resolves with the response status and body.
	fn send(&self, request: ApiRequest) -> TransportFuture<'_>;
}

/// Outbound request handed to an [`HttpTransport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiRequest {
	/// HTTP verb.
	pub method: HttpMethod,
	/// Absolute URL, query string included.
	pub url: Url,
	/// Header map keyed by lowercase header name.
	pub headers: BTreeMap<String, String>,
	/// Request body, if any.
	pub body: Option<Vec<u8>>,
}
impl ApiRequest {
	/// Creates a request without headers or body.
	pub fn new(method: HttpMethod, url: Url) -> Self {
		Self { method, url, headers: BTreeMap::new(), body: None }
	}

	/// Adds a header; names are stored lowercase.
	pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
		self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());

		self
	}

	/// Sets a `application/x-www-form-urlencoded` body built from `args`.
	pub fn with_form(mut self, args: &Args) -> Self {
		let body =
			url::form_urlencoded::Serializer::new(String::new()).extend_pairs(args).finish();

		self.headers.insert("content-type".into(), "application/x-www-form-urlencoded".into());
		self.body = Some(body.into_bytes());

		self
	}

	/// Looks up a header value by case-insensitive name.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
	}

	/// Host the request is addressed to.
	pub fn hostname(&self) -> &str {
		self.url.host_str().unwrap_or_default()
	}

	/// Path plus query string.
	pub fn path(&self) -> String {
		match self.url.query() {
			Some(query) => format!("{}?{query}", self.url.path()),
			None => self.url.path().to_owned(),
		}
	}

	/// Explicit port, when the URL carries one.
	pub fn port(&self) -> Option<u16> {
		self.url.port()
	}

	/// Body as UTF-8 text.
	pub fn body_text(&self) -> Option<&str> {
		self.body.as_deref().and_then(|bytes| std::str::from_utf8(bytes).ok())
	}

	/// Decodes the form body, or the query string when there is no body.
	pub fn form(&self) -> Args {
		match &self.body {
			Some(bytes) => url::form_urlencoded::parse(bytes).into_owned().collect(),
			None => self.url.query_pairs().into_owned().collect(),
		}
	}
}

/// Raw response returned by an [`HttpTransport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response body as text.
	pub body: String,
}
impl ApiResponse {
	/// Creates a response.
	pub fn new(status: u16, body: impl Into<String>) -> Self {
		Self { status, body: body.into() }
	}

	/// Leading digit of the status code (2 for success, 4 for client errors, ...).
	pub fn status_class(&self) -> u16 {
		self.status / 100
	}
}

/// Adapts an [`HttpTransport`] to the `oauth2` crate's [`AsyncHttpClient`].
///
/// Every token request also carries the configured `User-Agent`, which Reddit requires on
/// the token endpoint as much as on API calls.
#[derive(Debug)]
pub struct OAuthHttpBridge<T>
where
	T: ?Sized + HttpTransport,
{
	transport: Arc<T>,
	user_agent: String,
}
impl<T> OAuthHttpBridge<T>
where
	T: ?Sized + HttpTransport,
{
	/// Wraps a shared transport.
	pub fn new(transport: Arc<T>, user_agent: impl Into<String>) -> Self {
		Self { transport, user_agent: user_agent.into() }
	}
}
impl<'c, T> AsyncHttpClient<'c> for OAuthHttpBridge<T>
where
	T: ?Sized + HttpTransport,
{
	type Error = HttpClientError<TransportError>;
	type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		Box::pin(async move {
			let request = to_api_request(request, &self.user_agent)?;
			let response = self.transport.send(request).await.map_err(Box::new)?;

			oauth2::http::Response::builder()
				.status(response.status)
				.body(response.body.into_bytes())
				.map_err(HttpClientError::Http)
		})
	}
}

fn to_api_request(
	request: HttpRequest,
	user_agent: &str,
) -> Result<ApiRequest, HttpClientError<TransportError>> {
	let method = match request.method().as_str() {
		"GET" => HttpMethod::Get,
		"POST" => HttpMethod::Post,
		"PUT" => HttpMethod::Put,
		"PATCH" => HttpMethod::Patch,
		"DELETE" => HttpMethod::Delete,
		other => return Err(HttpClientError::Other(format!("Unsupported method {other}."))),
	};
	let url = Url::parse(&request.uri().to_string())
		.map_err(|err| HttpClientError::Other(format!("Invalid token URL: {err}.")))?;
	let mut api_request = ApiRequest::new(method, url).with_header("user-agent", user_agent);

	for (name, value) in request.headers() {
		if let Ok(value) = value.to_str() {
			api_request = api_request.with_header(name.as_str(), value);
		}
	}

	let body = request.into_body();

	if !body.is_empty() {
		api_request.body = Some(body);
	}

	Ok(api_request)
}

/// Default [`HttpTransport`] backed by [`ReqwestClient`].
///
/// Redirects are not followed: the token endpoint answers directly, and API responses are
/// classified by their own status.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a transport with redirect following disabled.
	pub fn new() -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.redirect(Policy::none())
			.build()
			.map_err(ConfigError::http_client_build)?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let host = request.hostname().to_owned();
			let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
				.map_err(|err| TransportError::network(&host, err))?;
			let mut builder = self.0.request(method, request.url);

			for (name, value) in &request.headers {
				builder = builder.header(name.as_str(), value.as_str());
			}
			if let Some(body) = request.body {
				builder = builder.body(body);
			}

			let response = builder.send().await.map_err(|err| map_reqwest_error(&host, err))?;
			let status = response.status().as_u16();
			let body = response.text().await.map_err(|err| map_reqwest_error(&host, err))?;

			Ok(ApiResponse { status, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(host: &str, err: ReqwestError) -> TransportError {
	#[cfg(feature = "tracing")]
	tracing::debug!(
		host,
		timeout = err.is_timeout(),
		connect = err.is_connect(),
		"Transport failure."
	);

	TransportError::network(host, err)
}
