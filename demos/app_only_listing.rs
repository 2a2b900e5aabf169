//! Authenticates an implicit app without a user and pages through a listing, against a local
//! mock of Reddit's token endpoint and OAuth API.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use reddit_broker::{
	Client, UserConfig,
	client::CallOptions,
	config::{OAuthType, Scheme},
	endpoint::Args,
	event::ClientEvent,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let host = server.address().to_string();
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/access_token").form_urlencoded_tuple(
				"grant_type",
				"https://oauth.reddit.com/grants/installed_client",
			);
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-app\",\"token_type\":\"bearer\",\"expires_in\":3600,\"scope\":\"*\"}",
			);
		})
		.await;
	let listing_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/r/rust/new").header("authorization", "bearer demo-app");
			then.status(200).header("content-type", "application/json").body(
				"{\"kind\":\"Listing\",\"data\":{\"after\":\"t3_b\",\"before\":null,\"children\":[\
				{\"kind\":\"t3\",\"data\":{\"name\":\"t3_rules\",\"stickied\":true,\"title\":\"Rules\"}},\
				{\"kind\":\"t3\",\"data\":{\"name\":\"t3_a\",\"title\":\"Hello &amp; welcome\"}},\
				{\"kind\":\"t3\",\"data\":{\"name\":\"t3_b\",\"title\":\"Second post\"}}]}}",
			);
		})
		.await;
	let config = UserConfig::builder()
		.user_agent("reddit-broker-demo/0.1")
		.oauth_type(OAuthType::Implicit)
		.key("demo-key")
		.redirect_uri("http://localhost/callback")
		.scope(["read"])
		.decode_html_entities(true)
		.scheme(Scheme::Http)
		.server_oauth(host.clone())
		.server_www(host)
		.build()?;
	let client = Client::reqwest(config)?;
	let mut events = client.subscribe();

	client.application_only_auth().await?;

	let mut args = Args::new();

	args.insert("$subreddit".into(), "rust".into());
	args.insert("limit".into(), "2".into());

	let slice = client.path("/r/$subreddit/new").listing(&args, &CallOptions::default()).await?;

	for thing in &slice.stickied {
		println!("Pinned: {}.", thing.data["title"]);
	}
	for thing in &slice.children {
		println!("Post {}: {}.", thing.name().unwrap_or("?"), thing.data["title"]);
	}

	let next = slice.next().await?;

	println!("Second page starts at count {} with {} posts.", next.count, next.children.len());

	while let Ok(event) = events.try_recv() {
		if let ClientEvent::ServerError(response) = event {
			println!("Server error seen: {}.", response.status);
		}
	}

	token_mock.assert_async().await;
	listing_mock.assert_calls_async(2).await;

	Ok(())
}
