//! Request orchestration: throttled sends and the response classification loop.
//!
//! Every call runs as a small state machine. A send produces a response; classification
//! decides whether the call is done, retries after a server error, or re-authenticates and
//! sends again after a client error. Both loops are bounded by the budgets in
//! [`CallContext`].

// crates.io
use tokio::time;
// self
use crate::{
	_prelude::*,
	auth::Secret,
	client::{CallContext, CallOptions, Client, SessionOptions},
	config::OAuthType,
	endpoint::{Args, Endpoint, HttpMethod},
	error::{ConfigError, ResponseError},
	event::ClientEvent,
	http::{ApiRequest, ApiResponse, HttpTransport},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Path probed to tell a stale token apart from a missing scope.
pub const SCOPE_PROBE_PATH: &str = "/api/needs_captcha";

const SERVER_ERROR_MESSAGE: &str = "Server Error Response";
const SCOPE_ERROR_MESSAGE: &str = "Missing a required scope or this call requires reddit gold";

enum CallState {
	Send,
	Classify(ApiResponse),
	Retrying,
	Reauthenticating(ReauthStrategy),
	Done(Value),
	Failed(Error),
}

#[derive(Debug)]
enum ReauthStrategy {
	ApplicationOnly,
	Refresh(Secret),
	Script,
}

/// Fully resolved request shared by every attempt of one call.
struct Prepared<'a> {
	method: HttpMethod,
	url: String,
	args: Args,
	context: &'a mut CallContext,
}

impl<T> Client<T>
where
	T: HttpTransport,
{
	/// Calls `endpoint` with `args`, retrying server errors and renewing stale sessions.
	///
	/// Arguments whose key starts with `$` fill the matching path tokens and are not sent.
	/// A successful body is returned as JSON, or as a JSON string when it does not parse.
	pub async fn call(
		&self,
		endpoint: &Endpoint,
		args: &Args,
		options: &CallOptions,
	) -> Result<Value> {
		let span = FlowSpan::new(FlowKind::Call, "call");

		obs::record_flow_outcome(FlowKind::Call, FlowOutcome::Attempt);

		let result = span.instrument(self.call_inner(endpoint, args, options)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(FlowKind::Call, FlowOutcome::Success),
			Err(_err) => {
				#[cfg(feature = "tracing")]
				tracing::warn!(path = %endpoint.path, error = %_err, "Call failed.");

				obs::record_flow_outcome(FlowKind::Call, FlowOutcome::Failure);
			},
		}

		result
	}

	async fn call_inner(
		&self,
		endpoint: &Endpoint,
		given: &Args,
		options: &CallOptions,
	) -> Result<Value> {
		let mut context = CallContext::new(options, &self.config);
		let url = endpoint.url(self.config.scheme, &context.server_oauth, given)?;
		let args = endpoint.args(given, self.config.api_type.as_deref());
		let mut prepared = Prepared { method: endpoint.method, url, args, context: &mut context };
		let mut state = CallState::Send;

		loop {
			state = match state {
				CallState::Send => CallState::Classify(self.send(&prepared).await?),
				CallState::Classify(response) => self.classify(response, &mut prepared).await,
				CallState::Retrying => {
					obs::record_flow_outcome(FlowKind::Call, FlowOutcome::Retry);
					time::sleep(prepared.context.retry_delay).await;

					CallState::Send
				},
				CallState::Reauthenticating(strategy) => {
					obs::record_flow_outcome(FlowKind::Call, FlowOutcome::Reauth);

					match self.reauthenticate(strategy).await {
						Ok(()) => CallState::Send,
						Err(err) => CallState::Failed(err),
					}
				},
				CallState::Done(value) => return Ok(value),
				CallState::Failed(err) => return Err(err),
			};
		}
	}

	async fn send(&self, prepared: &Prepared<'_>) -> Result<ApiResponse> {
		let permit = self.throttle.acquire();

		permit.ready().await;

		let request = self.build_request(prepared)?;

		#[cfg(feature = "tracing")]
		tracing::debug!(method = %prepared.method, url = %request.url, "Sending request.");

		let response = self.transport.send(request).await;

		drop(permit);

		Ok(response?)
	}

	fn build_request(&self, prepared: &Prepared<'_>) -> Result<ApiRequest> {
		let mut url = parse_url(&prepared.url)?;

		if prepared.method.uses_query() && !prepared.args.is_empty() {
			url.query_pairs_mut().extend_pairs(&prepared.args);
		}

		let mut request = self
			.headers(prepared.context.bypass_auth)
			.into_iter()
			.fold(ApiRequest::new(prepared.method, url), |request, (name, value)| {
				request.with_header(name, value)
			});

		if !prepared.method.uses_query() {
			request = request.with_form(&prepared.args);
		}

		Ok(request)
	}

	async fn classify(&self, response: ApiResponse, prepared: &mut Prepared<'_>) -> CallState {
		match response.status_class() {
			2 => CallState::Done(decode_body(response.body, prepared.context.decode_html_entities)),
			4 => self.classify_client_error(response, prepared).await,
			5 => self.classify_server_error(response, prepared),
			_ => CallState::Failed(Error::InvalidStatus { status: response.status }),
		}
	}

	fn classify_server_error(&self, response: ApiResponse, prepared: &mut Prepared<'_>) -> CallState {
		let context = &mut *prepared.context;

		context.retry_attempts_left = context.retry_attempts_left.saturating_sub(1);

		let error = ResponseError::new(
			SERVER_ERROR_MESSAGE,
			response.status,
			prepared.url.clone(),
			prepared.args.clone(),
			response.body,
		)
		.with_retry_attempts_left(context.retry_attempts_left);

		#[cfg(feature = "tracing")]
		tracing::warn!(
			status = error.status,
			url = %error.url,
			retry_attempts_left = context.retry_attempts_left,
			"Server error response."
		);

		self.emit(ClientEvent::ServerError(error.clone()));

		if context.retry_attempts_left == 0 {
			CallState::Failed(Error::RetriesExhausted(Box::new(error)))
		} else {
			CallState::Retrying
		}
	}

	async fn classify_client_error(
		&self,
		response: ApiResponse,
		prepared: &mut Prepared<'_>,
	) -> CallState {
		if !self.is_application_only()
			&& !self.has_refresh_token()
			&& !self.is_oauth_type(OAuthType::Script)
		{
			self.emit(ClientEvent::AccessTokenExpired);

			return CallState::Failed(Error::AccessTokenExpired);
		}
		if requires_user(&response.body) {
			return CallState::Failed(Error::UserRequired);
		}

		let probe = match self.probe(prepared).await {
			Ok(probe) => probe,
			Err(err) => return CallState::Failed(err),
		};

		if probe.status_class() != 4 {
			return CallState::Failed(Error::ScopeOrGating(Box::new(ResponseError::new(
				SCOPE_ERROR_MESSAGE,
				response.status,
				prepared.url.clone(),
				prepared.args.clone(),
				response.body,
			))));
		}

		let context = &mut *prepared.context;

		context.reauth_attempts_left = context.reauth_attempts_left.saturating_sub(1);

		if context.reauth_attempts_left == 0 {
			return CallState::Failed(Error::ReauthExhausted);
		}

		let strategy = self.reauth_strategy(context.bypass_auth);

		#[cfg(feature = "tracing")]
		tracing::debug!(
			status = response.status,
			?strategy,
			reauth_attempts_left = context.reauth_attempts_left,
			"Stale token, re-authenticating."
		);

		CallState::Reauthenticating(strategy)
	}

	// The probe shares the call's headers but bypasses the throttle.
	async fn probe(&self, prepared: &Prepared<'_>) -> Result<ApiResponse> {
		let url = parse_url(&format!(
			"{}://{}{SCOPE_PROBE_PATH}",
			self.config.scheme.as_str(),
			prepared.context.server_oauth
		))?;
		let request = self
			.headers(prepared.context.bypass_auth)
			.into_iter()
			.fold(ApiRequest::new(prepared.method, url), |request, (name, value)| {
				request.with_header(name, value)
			});

		Ok(self.transport.send(request).await?)
	}

	fn reauth_strategy(&self, bypass_auth: bool) -> ReauthStrategy {
		if self.is_application_only() || bypass_auth {
			ReauthStrategy::ApplicationOnly
		} else if let Some(refresh_token) = self.tokens.refresh_token() {
			ReauthStrategy::Refresh(refresh_token)
		} else {
			ReauthStrategy::Script
		}
	}

	async fn reauthenticate(&self, strategy: ReauthStrategy) -> Result<()> {
		let options = SessionOptions::default();

		match strategy {
			ReauthStrategy::ApplicationOnly => self.auth(None, true, &options).await.map(|_| ()),
			ReauthStrategy::Refresh(refresh_token) => self.refresh(refresh_token, &options).await,
			ReauthStrategy::Script => self.auth(None, false, &options).await.map(|_| ()),
		}
	}
}

fn parse_url(url: &str) -> Result<Url> {
	Url::parse(url)
		.map_err(|source| ConfigError::InvalidServer { server: url.to_owned(), source }.into())
}

fn requires_user(body: &str) -> bool {
	serde_json::from_str::<Value>(body)
		.ok()
		.and_then(|body| body.get("reason").and_then(Value::as_str).map(|r| r == "USER_REQUIRED"))
		.unwrap_or(false)
}

/// Turns a success body into JSON.
///
/// An empty body becomes `{}`; a body that is not JSON is returned as a JSON string.
pub fn decode_body(body: String, decode_html_entities: bool) -> Value {
	let body = if body.is_empty() { "{}".to_owned() } else { body };
	let body = if decode_html_entities {
		html_escape::decode_html_entities(&body).into_owned()
	} else {
		body
	};

	match serde_json::from_str(&body) {
		Ok(value) => value,
		Err(_) => Value::String(body),
	}
}
