//! Scripted in-process transport and config fixtures shared by the integration tests.

#![allow(dead_code)]

// std
use std::{collections::VecDeque, time::Duration};
// crates.io
use parking_lot::Mutex;
// self
use reddit_broker::{
	UserConfig,
	config::{OAuthType, TokenDuration},
	endpoint::Args,
	error::TransportError,
	http::{ApiRequest, ApiResponse, HttpTransport, TransportFuture},
};

pub const TOKEN_PATH: &str = "/api/v1/access_token";
pub const REVOKE_PATH: &str = "/api/v1/revoke_token";
pub const PROBE_PATH: &str = "/api/needs_captcha";

/// Replies keyed by URL path; the last queued reply for a path repeats forever.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
	routes: Mutex<Vec<(String, VecDeque<ApiResponse>)>>,
	requests: Mutex<Vec<ApiRequest>>,
}
impl ScriptedTransport {
	pub fn new() -> Self {
		Self::default()
	}

	/// Queues a reply for `path`.
	pub fn reply(&self, path: &str, status: u16, body: &str) -> &Self {
		let mut routes = self.routes.lock();
		let response = ApiResponse::new(status, body);

		match routes.iter_mut().find(|(route, _)| route == path) {
			Some((_, queue)) => queue.push_back(response),
			None => routes.push((path.to_owned(), VecDeque::from([response]))),
		}

		self
	}

	/// Queues a token endpoint reply issuing `access_token`.
	pub fn token(&self, access_token: &str, refresh_token: Option<&str>) -> &Self {
		let body = match refresh_token {
			Some(refresh) => format!(
				r#"{{"access_token":"{access_token}","token_type":"bearer","expires_in":3600,"scope":"*","refresh_token":"{refresh}"}}"#
			),
			None => format!(
				r#"{{"access_token":"{access_token}","token_type":"bearer","expires_in":3600,"scope":"*"}}"#
			),
		};

		self.reply(TOKEN_PATH, 200, &body)
	}

	/// Every request sent so far, in order.
	pub fn requests(&self) -> Vec<ApiRequest> {
		self.requests.lock().clone()
	}

	/// Requests sent to `path`.
	pub fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
		self.requests.lock().iter().filter(|request| request.url.path() == path).cloned().collect()
	}

	/// Form fields of every token request, in order.
	pub fn grants(&self) -> Vec<String> {
		self.requests_to(TOKEN_PATH)
			.iter()
			.filter_map(|request| request.form().get("grant_type").cloned())
			.collect()
	}

	fn next_reply(&self, path: &str) -> Option<ApiResponse> {
		let mut routes = self.routes.lock();
		let (_, queue) = routes.iter_mut().find(|(route, _)| route == path)?;

		if queue.len() > 1 { queue.pop_front() } else { queue.front().cloned() }
	}
}
impl HttpTransport for ScriptedTransport {
	fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
		let path = request.url.path().to_owned();

		self.requests.lock().push(request);

		let reply = self.next_reply(&path);

		Box::pin(async move {
			reply.ok_or_else(|| {
				TransportError::Io(std::io::Error::other(format!("No scripted reply for {path}.")))
			})
		})
	}
}

pub fn args(pairs: &[(&str, &str)]) -> Args {
	pairs.iter().map(|(key, value)| ((*key).to_owned(), (*value).to_owned())).collect()
}

pub fn script_config() -> UserConfig {
	UserConfig::builder()
		.user_agent("reddit-broker-tests")
		.oauth_type(OAuthType::Script)
		.key("script-key")
		.secret("script-secret")
		.username("owner")
		.password("hunter2")
		.scope(["identity", "read"])
		.retry_delay(Duration::from_millis(100))
		.build()
		.expect("Script config should build.")
}

pub fn explicit_config() -> UserConfig {
	UserConfig::builder()
		.user_agent("reddit-broker-tests")
		.oauth_type(OAuthType::Explicit)
		.key("explicit-key")
		.secret("explicit-secret")
		.redirect_uri("https://app.example/callback")
		.scope(["identity", "read"])
		.duration(TokenDuration::Permanent)
		.retry_delay(Duration::from_millis(100))
		.build()
		.expect("Explicit config should build.")
}

pub fn implicit_config() -> UserConfig {
	UserConfig::builder()
		.user_agent("reddit-broker-tests")
		.oauth_type(OAuthType::Implicit)
		.key("implicit-key")
		.redirect_uri("https://app.example/callback")
		.scope(["read"])
		.retry_delay(Duration::from_millis(100))
		.build()
		.expect("Implicit config should build.")
}
