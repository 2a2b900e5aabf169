//! The Reddit client: one token store, one throttle, one transport.
//!
//! [`Client`] is cheap to clone; clones share the same session state, throttle counter and
//! event channel, so concurrent calls from several tasks are spaced and re-authenticated
//! together.

pub mod call;
pub mod listing;
pub mod options;
pub mod path;
pub mod session;

pub use listing::*;
pub use options::*;
pub use path::*;
pub use session::*;

// crates.io
use tokio::sync::broadcast;
// self
use crate::{
	_prelude::*,
	config::UserConfig,
	event::{self, ClientEvent},
	http::HttpTransport,
	store::TokenStore,
	throttle::Throttle,
};
#[cfg(feature = "reqwest")] use crate::{error::ConfigError, http::ReqwestTransport};

/// Reddit API client parameterized over its HTTP transport.
pub struct Client<T>
where
	T: HttpTransport,
{
	pub(crate) transport: Arc<T>,
	pub(crate) config: Arc<UserConfig>,
	pub(crate) tokens: Arc<TokenStore>,
	pub(crate) throttle: Arc<Throttle>,
	pub(crate) events: broadcast::Sender<ClientEvent>,
}
impl<T> Client<T>
where
	T: HttpTransport,
{
	/// Creates a client that owns `transport`.
	pub fn new(config: UserConfig, transport: T) -> Self {
		Self::with_shared_transport(config, Arc::new(transport))
	}

	/// Creates a client over a transport shared with other owners.
	pub fn with_shared_transport(config: UserConfig, transport: Arc<T>) -> Self {
		Self {
			transport,
			config: Arc::new(config),
			tokens: Arc::new(TokenStore::default()),
			throttle: Arc::new(Throttle::default()),
			events: event::channel(),
		}
	}

	/// Replaces the throttle (for example to change the per-request cost).
	pub fn with_throttle(mut self, throttle: Throttle) -> Self {
		self.throttle = Arc::new(throttle);

		self
	}

	/// Validated configuration.
	pub fn config(&self) -> &UserConfig {
		&self.config
	}

	/// Session token store.
	pub fn tokens(&self) -> &TokenStore {
		&self.tokens
	}

	/// Request throttle shared by every clone.
	pub fn throttle(&self) -> &Throttle {
		&self.throttle
	}

	/// Transport used for API calls and token requests.
	pub fn transport(&self) -> &Arc<T> {
		&self.transport
	}

	/// Subscribes to [`ClientEvent`]s emitted from now on.
	pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
		self.events.subscribe()
	}

	pub(crate) fn emit(&self, event: ClientEvent) {
		event::emit(&self.events, event);
	}
}
#[cfg(feature = "reqwest")]
impl Client<ReqwestTransport> {
	/// Creates a client backed by the default reqwest transport.
	pub fn reqwest(config: UserConfig) -> Result<Self, ConfigError> {
		Ok(Self::new(config, ReqwestTransport::new()?))
	}
}
impl<T> Clone for Client<T>
where
	T: HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: Arc::clone(&self.transport),
			config: Arc::clone(&self.config),
			tokens: Arc::clone(&self.tokens),
			throttle: Arc::clone(&self.throttle),
			events: self.events.clone(),
		}
	}
}
impl<T> Debug for Client<T>
where
	T: HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client")
			.field("user_agent", &self.config.user_agent)
			.field("oauth_type", &self.config.oauth_type())
			.field("tokens", &self.tokens)
			.field("throttle", &self.throttle)
			.finish_non_exhaustive()
	}
}
