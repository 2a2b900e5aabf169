mod support;

// std
use std::sync::Arc;
// crates.io
use serde_json::{Value, json};
// self
use reddit_broker::{
	Client, UserConfig,
	auth::{AuthData, ScopeSet},
	client::{AuthCredential, CallOptions, SessionOptions},
	error::Error,
	event::ClientEvent,
};
use support::*;

const ME: &str = "/api/v1/me";

fn client_with(config: UserConfig) -> (Client<ScriptedTransport>, Arc<ScriptedTransport>) {
	let transport = Arc::new(ScriptedTransport::new());

	(Client::with_shared_transport(config, Arc::clone(&transport)), transport)
}

async fn me(client: &Client<ScriptedTransport>, options: &CallOptions) -> Result<Value, Error> {
	client.path(ME).get(&args(&[]), options).await
}

#[tokio::test(start_paused = true)]
async fn expired_sessions_without_renewal_emit_an_event() {
	let (client, transport) = client_with(explicit_config());
	let mut events = client.subscribe();

	client
		.auth(
			Some(AuthCredential::AuthData(AuthData::new(
				"stale",
				"bearer",
				3600,
				ScopeSet::default(),
			))),
			false,
			&SessionOptions::default(),
		)
		.await
		.expect("Pass-through auth should succeed.");
	transport.reply(ME, 401, "");

	let err = me(&client, &CallOptions::default()).await.expect_err("Stale session should fail.");

	assert!(matches!(err, Error::AccessTokenExpired));
	assert_eq!(events.try_recv().ok(), Some(ClientEvent::AccessTokenExpired));
	assert!(transport.requests_to(PROBE_PATH).is_empty());
}

#[tokio::test(start_paused = true)]
async fn stale_script_tokens_reauthenticate_once() {
	let (client, transport) = client_with(script_config());

	transport.token("first", None).token("second", None);
	client.auth(None, false, &SessionOptions::default()).await.expect("Auth should succeed.");
	transport.reply(ME, 401, "").reply(ME, 200, r#"{"name":"owner"}"#).reply(PROBE_PATH, 403, "");

	let value =
		me(&client, &CallOptions::default()).await.expect("Reauthenticated call should succeed.");
	let calls = transport.requests_to(ME);
	let probe = &transport.requests_to(PROBE_PATH)[0];

	assert_eq!(value, json!({ "name": "owner" }));
	assert_eq!(transport.grants(), ["password", "password"]);
	assert_eq!(calls.len(), 2);
	assert_eq!(calls[0].header("authorization"), Some("bearer first"));
	assert_eq!(calls[1].header("authorization"), Some("bearer second"));
	assert_eq!(probe.hostname(), "oauth.reddit.com");
	assert_eq!(probe.header("authorization"), Some("bearer first"));
	assert_eq!(transport.requests_to(PROBE_PATH).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn passing_probe_means_missing_scope() {
	let (client, transport) = client_with(script_config());

	transport.token("token", None);
	client.auth(None, false, &SessionOptions::default()).await.expect("Auth should succeed.");
	transport.reply(ME, 403, "forbidden").reply(PROBE_PATH, 200, "false");

	let err = me(&client, &CallOptions::default()).await.expect_err("Gated call should fail.");
	let response = err.response().expect("Scope errors carry the original response.");

	assert!(matches!(err, Error::ScopeOrGating(_)));
	assert_eq!(response.status, 403);
	assert_eq!(response.body, "forbidden");
	assert_eq!(transport.grants(), ["password"]);
}

#[tokio::test(start_paused = true)]
async fn user_required_fails_fast() {
	let (client, transport) = client_with(implicit_config());

	transport.token("app", None);
	client.application_only_auth().await.expect("Application-only auth should succeed.");
	transport.reply(ME, 403, r#"{"reason":"USER_REQUIRED"}"#);

	let err = me(&client, &CallOptions::default()).await.expect_err("User-only call should fail.");

	assert!(matches!(err, Error::UserRequired));
	assert!(transport.requests_to(PROBE_PATH).is_empty());
}

#[tokio::test(start_paused = true)]
async fn reauth_budget_is_bounded() {
	let (client, transport) = client_with(script_config());

	transport.token("token", None);
	client.auth(None, false, &SessionOptions::default()).await.expect("Auth should succeed.");
	transport.reply(ME, 401, "").reply(PROBE_PATH, 401, "");

	let err = me(&client, &CallOptions::default().reauth_attempts(2))
		.await
		.expect_err("Persistent 401 should exhaust the reauth budget.");

	assert!(matches!(err, Error::ReauthExhausted));
	assert_eq!(transport.requests_to(ME).len(), 2);
	assert_eq!(transport.grants(), ["password", "password"]);
}

#[tokio::test(start_paused = true)]
async fn application_only_sessions_renew_themselves() {
	let (client, transport) = client_with(implicit_config());

	transport.token("app-1", None).token("app-2", None);
	client.application_only_auth().await.expect("Application-only auth should succeed.");
	transport.reply("/hot", 401, "").reply("/hot", 200, "{}").reply(PROBE_PATH, 401, "");
	client
		.path("/hot")
		.get(&args(&[]), &CallOptions::default())
		.await
		.expect("Call should recover.");

	assert_eq!(transport.grants().len(), 2);
	assert!(transport.grants().iter().all(|grant| grant.ends_with("installed_client")));
	assert_eq!(transport.requests_to("/hot")[1].header("authorization"), Some("bearer app-2"));
}

#[tokio::test(start_paused = true)]
async fn refresh_tokens_take_priority() {
	let (client, transport) = client_with(explicit_config());

	transport.token("code-token", Some("refresh-1")).token("refreshed", None);
	client
		.auth(Some(AuthCredential::AuthorizationCode("c".into())), false, &SessionOptions::default())
		.await
		.expect("Code exchange should succeed.");
	transport.reply(ME, 401, "").reply(ME, 200, "{}").reply(PROBE_PATH, 401, "");

	me(&client, &CallOptions::default()).await.expect("Call should recover through refresh.");

	let refresh_form = transport.requests_to(TOKEN_PATH)[1].form();

	assert_eq!(transport.grants(), ["authorization_code", "refresh_token"]);
	assert_eq!(refresh_form.get("refresh_token").map(String::as_str), Some("refresh-1"));
	assert_eq!(transport.requests_to(ME)[1].header("authorization"), Some("bearer refreshed"));
}
