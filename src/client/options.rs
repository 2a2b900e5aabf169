//! Per-call overrides and the normalized context a call runs with.

// std
use std::time::Duration;
// self
use crate::config::UserConfig;

/// Optional overrides for one call; unset fields fall back to the client configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallOptions {
	/// Authorize with the application-only credentials even when a user is authenticated.
	pub bypass_auth: bool,
	/// Overrides HTML entity decoding of the success body.
	pub decode_html_entities: Option<bool>,
	/// Overrides the total attempts for server errors.
	pub retry_attempts: Option<u32>,
	/// Overrides the pause between server-error retries.
	pub retry_delay: Option<Duration>,
	/// Overrides the re-authentication budget (defaults to the retry budget).
	pub reauth_attempts: Option<u32>,
	/// Overrides the OAuth API host.
	pub server_oauth: Option<String>,
	/// Selects one listing out of a multi-listing response.
	pub listing_index: Option<usize>,
}
impl CallOptions {
	/// Authorizes with the application-only credentials.
	pub fn bypass_auth(mut self) -> Self {
		self.bypass_auth = true;

		self
	}

	/// Overrides HTML entity decoding.
	pub fn decode_html_entities(mut self, value: bool) -> Self {
		self.decode_html_entities = Some(value);

		self
	}

	/// Overrides the total attempts for server errors.
	pub fn retry_attempts(mut self, value: u32) -> Self {
		self.retry_attempts = Some(value);

		self
	}

	/// Overrides the pause between server-error retries.
	pub fn retry_delay(mut self, value: Duration) -> Self {
		self.retry_delay = Some(value);

		self
	}

	/// Overrides the re-authentication budget.
	pub fn reauth_attempts(mut self, value: u32) -> Self {
		self.reauth_attempts = Some(value);

		self
	}

	/// Overrides the OAuth API host.
	pub fn server_oauth(mut self, host: impl Into<String>) -> Self {
		self.server_oauth = Some(host.into());

		self
	}

	/// Selects one listing out of a multi-listing response.
	pub fn listing_index(mut self, index: usize) -> Self {
		self.listing_index = Some(index);

		self
	}
}

/// Normalized state of one call; budgets shrink as the call retries and re-authenticates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallContext {
	/// Authorize with the application-only credentials.
	pub bypass_auth: bool,
	/// Decode HTML entities in the success body.
	pub decode_html_entities: bool,
	/// Server-error attempts still available.
	pub retry_attempts_left: u32,
	/// Pause between server-error retries.
	pub retry_delay: Duration,
	/// Re-authentication attempts still available.
	pub reauth_attempts_left: u32,
	/// OAuth API host.
	pub server_oauth: String,
}
impl CallContext {
	/// Fills the unset options from `config`.
	pub fn new(options: &CallOptions, config: &UserConfig) -> Self {
		let retry_attempts_left = options.retry_attempts.unwrap_or(config.retry_attempts);

		Self {
			bypass_auth: options.bypass_auth,
			decode_html_entities: options
				.decode_html_entities
				.unwrap_or(config.decode_html_entities),
			retry_attempts_left,
			retry_delay: options.retry_delay.unwrap_or(config.retry_delay),
			reauth_attempts_left: options.reauth_attempts.unwrap_or(retry_attempts_left),
			server_oauth: options
				.server_oauth
				.clone()
				.unwrap_or_else(|| config.server_oauth.clone()),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::config::OAuthType;

	fn config() -> UserConfig {
		UserConfig::builder()
			.user_agent("options-test")
			.oauth_type(OAuthType::Implicit)
			.key("k")
			.redirect_uri("https://app.example/cb")
			.retry_attempts(7)
			.build()
			.expect("Config should build.")
	}

	#[test]
	fn defaults_come_from_config() {
		let context = CallContext::new(&CallOptions::default(), &config());

		assert!(!context.bypass_auth);
		assert!(!context.decode_html_entities);
		assert_eq!(context.retry_attempts_left, 7);
		assert_eq!(context.reauth_attempts_left, 7);
		assert_eq!(context.retry_delay, Duration::from_millis(5000));
		assert_eq!(context.server_oauth, "oauth.reddit.com");
	}

	#[test]
	fn reauth_budget_follows_retry_override() {
		let options = CallOptions::default().retry_attempts(3).bypass_auth();
		let context = CallContext::new(&options, &config());

		assert!(context.bypass_auth);
		assert_eq!(context.retry_attempts_left, 3);
		assert_eq!(context.reauth_attempts_left, 3);

		let context = CallContext::new(&options.reauth_attempts(1), &config());

		assert_eq!(context.reauth_attempts_left, 1);
	}
}
