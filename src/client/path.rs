//! Path-addressed call surface: `client.path("/r/$subreddit/hot").get(&args, &options)`.

// self
use crate::{
	_prelude::*,
	client::{CallOptions, Client, ListingSlice},
	endpoint::{Args, Endpoint, HttpMethod},
	http::HttpTransport,
};

/// Calls bound to one endpoint path.
pub struct PathHandle<T>
where
	T: HttpTransport,
{
	client: Client<T>,
	path: String,
	needs_api_type_json: bool,
}
impl<T> PathHandle<T>
where
	T: HttpTransport,
{
	/// Path template the handle calls.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Sends the configured `api_type` with every call made through this handle.
	pub fn with_api_type_json(mut self) -> Self {
		self.needs_api_type_json = true;

		self
	}

	/// Endpoint for `method` on this path.
	pub fn endpoint(&self, method: HttpMethod) -> Endpoint {
		let endpoint = Endpoint::new(method, self.path.clone());

		if self.needs_api_type_json { endpoint.with_api_type_json() } else { endpoint }
	}

	/// `GET` this path.
	pub async fn get(&self, args: &Args, options: &CallOptions) -> Result<Value> {
		self.client.call(&self.endpoint(HttpMethod::Get), args, options).await
	}

	/// `POST` to this path.
	pub async fn post(&self, args: &Args, options: &CallOptions) -> Result<Value> {
		self.client.call(&self.endpoint(HttpMethod::Post), args, options).await
	}

	/// `PUT` to this path.
	pub async fn put(&self, args: &Args, options: &CallOptions) -> Result<Value> {
		self.client.call(&self.endpoint(HttpMethod::Put), args, options).await
	}

	/// `PATCH` this path.
	pub async fn patch(&self, args: &Args, options: &CallOptions) -> Result<Value> {
		self.client.call(&self.endpoint(HttpMethod::Patch), args, options).await
	}

	/// `DELETE` this path.
	pub async fn delete(&self, args: &Args, options: &CallOptions) -> Result<Value> {
		self.client.call(&self.endpoint(HttpMethod::Delete), args, options).await
	}

	/// `UPDATE` this path.
	pub async fn update(&self, args: &Args, options: &CallOptions) -> Result<Value> {
		self.client.call(&self.endpoint(HttpMethod::Update), args, options).await
	}

	/// First page of the listing at this path.
	pub async fn listing(&self, args: &Args, options: &CallOptions) -> Result<ListingSlice<T>> {
		self.client.listing(&self.endpoint(HttpMethod::Get), args, options).await
	}
}
impl<T> Debug for PathHandle<T>
where
	T: HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PathHandle")
			.field("path", &self.path)
			.field("needs_api_type_json", &self.needs_api_type_json)
			.finish_non_exhaustive()
	}
}

impl<T> Client<T>
where
	T: HttpTransport,
{
	/// Binds the call surface to `url_or_path`.
	///
	/// Absolute URLs are reduced to their path; calls always go to the OAuth API host.
	pub fn path(&self, url_or_path: &str) -> PathHandle<T> {
		let path = match Url::parse(url_or_path) {
			Ok(url) => url.path().to_owned(),
			Err(_) => url_or_path.to_owned(),
		};

		PathHandle { client: self.clone(), path, needs_api_type_json: false }
	}
}
