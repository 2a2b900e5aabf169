mod support;

// std
use std::{sync::Arc, time::Duration};
// crates.io
use serde_json::{Value, json};
use tokio::{sync::broadcast::error::TryRecvError, time::Instant};
// self
use reddit_broker::{
	Client,
	client::CallOptions,
	endpoint::{Endpoint, HttpMethod},
	error::Error,
	event::ClientEvent,
};
use support::*;

fn client() -> (Client<ScriptedTransport>, Arc<ScriptedTransport>) {
	let transport = Arc::new(ScriptedTransport::new());

	(Client::with_shared_transport(script_config(), Arc::clone(&transport)), transport)
}

#[tokio::test(start_paused = true)]
async fn server_errors_retry_until_success() {
	let (client, transport) = client();
	let mut events = client.subscribe();

	transport.reply("/hot", 500, "down").reply("/hot", 502, "still down").reply(
		"/hot",
		200,
		r#"{"ok":true}"#,
	);

	let started = Instant::now();
	let value = client
		.path("/hot")
		.get(&args(&[]), &CallOptions::default().retry_attempts(5))
		.await
		.expect("Third attempt should succeed.");

	assert_eq!(value, json!({ "ok": true }));
	assert_eq!(transport.requests_to("/hot").len(), 3);
	assert!(started.elapsed() >= Duration::from_millis(200));

	for expected_left in [4, 3] {
		match events.try_recv() {
			Ok(ClientEvent::ServerError(response)) => {
				assert_eq!(response.retry_attempts_left, Some(expected_left));
				assert_eq!(response.url, "https://oauth.reddit.com/hot");
			},
			other => panic!("Expected a server error event, got {other:?}."),
		}
	}

	assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_surface_the_last_response() {
	let (client, transport) = client();

	transport.reply("/hot", 503, "unavailable");

	let err = client
		.path("/hot")
		.get(&args(&[("limit", "5")]), &CallOptions::default().retry_attempts(1))
		.await
		.expect_err("A single attempt should exhaust the budget.");
	let response = match err {
		Error::RetriesExhausted(response) => response,
		other => panic!("Expected exhausted retries, got {other:?}."),
	};

	assert_eq!(response.status, 503);
	assert_eq!(response.body, "unavailable");
	assert_eq!(response.retry_attempts_left, Some(0));
	assert_eq!(response.args.get("limit").map(String::as_str), Some("5"));
	assert_eq!(transport.requests_to("/hot").len(), 1);
}

#[tokio::test(start_paused = true)]
async fn transport_failures_are_not_retried() {
	let (client, transport) = client();
	let err = client
		.path("/unrouted")
		.get(&args(&[]), &CallOptions::default())
		.await
		.expect_err("Missing route should fail in the transport.");

	assert!(matches!(err, Error::Transport(_)));
	assert_eq!(transport.requests().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn unexpected_status_classes_fail() {
	let (client, transport) = client();

	transport.reply("/moved", 302, "");

	let err = client
		.path("/moved")
		.get(&args(&[]), &CallOptions::default())
		.await
		.expect_err("Redirects are not a valid outcome.");

	assert!(matches!(err, Error::InvalidStatus { status: 302 }));
}

#[tokio::test(start_paused = true)]
async fn success_bodies_are_decoded() {
	let (client, transport) = client();

	transport
		.reply("/empty", 200, "")
		.reply("/text", 200, "plain text")
		.reply("/html", 200, r#"{"title":"a &amp; b"}"#);

	let options = CallOptions::default();

	assert_eq!(client.path("/empty").get(&args(&[]), &options).await.ok(), Some(json!({})));
	assert_eq!(
		client.path("/text").get(&args(&[]), &options).await.ok(),
		Some(Value::String("plain text".into()))
	);
	assert_eq!(
		client.path("/html").get(&args(&[]), &options.clone().decode_html_entities(true)).await.ok(),
		Some(json!({ "title": "a & b" }))
	);
}

#[tokio::test(start_paused = true)]
async fn arguments_are_templated_and_placed_by_verb() {
	let (client, transport) = client();

	transport.reply("/r/rust/hot", 200, "{}").reply("/api/submit", 200, "{}");
	client
		.path("https://www.reddit.com/r/$subreddit/hot")
		.get(&args(&[("$subreddit", "rust"), ("limit", "2")]), &CallOptions::default())
		.await
		.expect("GET should succeed.");
	client
		.call(
			&Endpoint::new(HttpMethod::Post, "/api/submit").with_api_type_json(),
			&args(&[("title", "hello")]),
			&CallOptions::default(),
		)
		.await
		.expect("POST should succeed.");

	let get = &transport.requests_to("/r/rust/hot")[0];
	let post = &transport.requests_to("/api/submit")[0];

	assert_eq!(get.method, HttpMethod::Get);
	assert_eq!(get.hostname(), "oauth.reddit.com");
	assert_eq!(get.path(), "/r/rust/hot?limit=2");
	assert!(get.body.is_none());
	assert_eq!(get.header("user-agent"), Some("reddit-broker-tests"));
	assert_eq!(post.method, HttpMethod::Post);
	assert_eq!(post.form(), args(&[("api_type", "json"), ("title", "hello")]));
}

#[tokio::test(start_paused = true)]
async fn missing_url_parameters_fail_before_sending() {
	let (client, transport) = client();
	let err = client
		.path("/r/$subreddit/hot")
		.get(&args(&[]), &CallOptions::default())
		.await
		.expect_err("Unresolved token should fail.");

	assert!(matches!(err, Error::UrlParameter { ref parameter } if parameter == "$subreddit"));
	assert!(transport.requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn concurrent_calls_are_spaced_by_the_throttle() {
	let (client, transport) = client();

	transport.reply("/a", 200, "{}").reply("/b", 200, "{}").reply("/c", 200, "{}");

	let started = Instant::now();
	let options = CallOptions::default();
	let empty = args(&[]);
	let (a_path, b_path, c_path) = (client.path("/a"), client.path("/b"), client.path("/c"));
	let (a, b, c) = tokio::join!(
		a_path.get(&empty, &options),
		b_path.get(&empty, &options),
		c_path.get(&empty, &options),
	);

	assert!(a.is_ok() && b.is_ok() && c.is_ok());
	assert!(started.elapsed() >= Duration::from_millis(2000));
	assert_eq!(transport.requests().len(), 3);
}
