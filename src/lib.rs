//! Rust's turnkey Reddit API broker: OAuth sessions, adaptive request throttling and bounded
//! retry/re-authentication, with listing pagination on top.
//!
//! A [`Client`](client::Client) owns one token store and one throttle. Every call goes
//! through the same pipeline: build the URL and arguments for an [`Endpoint`](endpoint::Endpoint),
//! wait for the throttle, hand the request to the injected [`HttpTransport`](http::HttpTransport),
//! and classify the response (retry on 5xx, re-authenticate on a stale token, fail fast on
//! everything else).

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod event;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod store;
pub mod throttle;

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value;
	pub use thiserror::Error as ThisError;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use client::Client;
pub use config::UserConfig;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
