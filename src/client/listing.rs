//! Listing pagination as immutable snapshots.
//!
//! A [`ListingSlice`] is one fetched page plus the [`ListingCursor`] that produced it.
//! Navigating never mutates the slice: `next`, `previous`, `start` and `requery` derive a new
//! cursor and fetch a new slice, so sibling slices can be navigated independently.

// self
use crate::{
	_prelude::*,
	client::{CallOptions, Client},
	endpoint::{Args, Endpoint},
	http::HttpTransport,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Page size Reddit applies when `limit` is not given.
pub const DEFAULT_LISTING_LIMIT: u64 = 25;

/// Errors raised while turning a call result into a listing slice.
#[derive(Debug, ThisError)]
pub enum ListingError {
	/// The endpoint answered with several listings and no index was selected.
	#[error("Must specify a `listingIndex` for this listing.")]
	MissingListingIndex,
	/// The selected listing index does not exist in the response.
	#[error("Listing index {index} is out of range for {len} listings.")]
	IndexOutOfRange {
		/// Requested index.
		index: usize,
		/// Number of listings in the response.
		len: usize,
	},
	/// The response does not have the listing shape.
	#[error("Response is not a listing: {source}.")]
	Malformed {
		/// Structured decoding failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Navigation needs a child to anchor on, but the slice has none.
	#[error("Cannot page {direction} from a slice without children.")]
	NoAnchor {
		/// `"next"` or `"previous"`.
		direction: &'static str,
	},
}

/// One entry of a listing (`t3_...` links, `t1_...` comments, and so on).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Thing {
	/// Kind prefix such as `t3`.
	#[serde(default)]
	pub kind: String,
	/// Raw payload.
	#[serde(default)]
	pub data: Value,
}
impl Thing {
	/// Fullname used as a pagination anchor (`data.name`).
	pub fn name(&self) -> Option<&str> {
		self.data.get("name").and_then(Value::as_str)
	}

	/// Returns `true` when the entry is pinned.
	pub fn is_stickied(&self) -> bool {
		self.data.get("stickied").and_then(Value::as_bool).unwrap_or(false)
	}
}

/// Query state a slice was fetched with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListingCursor {
	/// Listing endpoint.
	pub endpoint: Endpoint,
	/// Arguments sent with the request, cursor fields included.
	pub args: Args,
	/// Call overrides applied on every page.
	pub options: CallOptions,
	/// Results loaded before this page.
	pub count: u64,
	/// Page size used to move `count`.
	pub limit: u64,
	/// `after` anchor the listing started from.
	pub start: Option<String>,
}
impl ListingCursor {
	/// Cursor for the first page of `endpoint`.
	pub fn new(endpoint: Endpoint, args: Args, options: CallOptions) -> Self {
		let limit = args
			.get("limit")
			.and_then(|limit| limit.parse().ok())
			.unwrap_or(DEFAULT_LISTING_LIMIT);
		let start = args.get("after").cloned();

		Self { endpoint, args, options, count: 0, limit, start }
	}

	/// Cursor for the page after the one anchored on `after`.
	pub fn next(&self, after: &str) -> Self {
		let mut cursor = self.clone();

		cursor.count = cursor.count.saturating_add(cursor.limit);
		cursor.args.remove("before");
		cursor.args.insert("after".into(), after.to_owned());
		cursor.args.insert("count".into(), cursor.count.to_string());

		cursor
	}

	/// Cursor for the page before the one anchored on `before`.
	pub fn previous(&self, before: &str) -> Self {
		let mut cursor = self.clone();

		cursor.count = cursor.count.saturating_sub(cursor.limit);
		cursor.args.insert("before".into(), before.to_owned());
		cursor.args.remove("after");
		cursor.args.insert("count".into(), cursor.count.to_string());

		cursor
	}

	/// Cursor back at the listing's starting anchor.
	pub fn start(&self) -> Self {
		let mut cursor = self.clone();

		cursor.count = 0;
		cursor.args.remove("before");

		match &cursor.start {
			Some(start) => cursor.args.insert("after".into(), start.clone()),
			None => cursor.args.remove("after"),
		};

		cursor.args.insert("count".into(), "0".into());

		cursor
	}
}

/// One fetched page of a listing.
pub struct ListingSlice<T>
where
	T: HttpTransport,
{
	client: Client<T>,
	cursor: ListingCursor,
	/// Results loaded before this page.
	pub count: u64,
	/// Anchor of the page before this one.
	pub before: Option<String>,
	/// Anchor of the page after this one.
	pub after: Option<String>,
	/// Every entry of the page.
	pub all_children: Vec<Thing>,
	/// Entries that are not pinned.
	pub children: Vec<Thing>,
	/// Pinned entries.
	pub stickied: Vec<Thing>,
	/// `true` when the page has no entries at all.
	pub empty: bool,
	/// Raw call result the slice was built from.
	pub get: Value,
}
impl<T> ListingSlice<T>
where
	T: HttpTransport,
{
	/// Cursor this slice was fetched with.
	pub fn cursor(&self) -> &ListingCursor {
		&self.cursor
	}

	/// Fetches the following page.
	pub async fn next(&self) -> Result<Self> {
		let anchor = self
			.children
			.last()
			.and_then(Thing::name)
			.ok_or(ListingError::NoAnchor { direction: "next" })?;

		self.client.fetch_slice(self.cursor.next(anchor)).await
	}

	/// Fetches the preceding page.
	pub async fn previous(&self) -> Result<Self> {
		let anchor = self
			.children
			.first()
			.and_then(Thing::name)
			.ok_or(ListingError::NoAnchor { direction: "previous" })?;

		self.client.fetch_slice(self.cursor.previous(anchor)).await
	}

	/// Fetches the first page again.
	pub async fn start(&self) -> Result<Self> {
		self.client.fetch_slice(self.cursor.start()).await
	}

	/// Fetches this page again.
	pub async fn requery(&self) -> Result<Self> {
		self.client.fetch_slice(self.cursor.clone()).await
	}
}
impl<T> Debug for ListingSlice<T>
where
	T: HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ListingSlice")
			.field("cursor", &self.cursor)
			.field("count", &self.count)
			.field("before", &self.before)
			.field("after", &self.after)
			.field("children", &self.children.len())
			.field("stickied", &self.stickied.len())
			.finish_non_exhaustive()
	}
}

#[derive(Deserialize)]
struct RawListing {
	data: RawListingData,
}
#[derive(Deserialize)]
struct RawListingData {
	#[serde(default)]
	before: Option<String>,
	#[serde(default)]
	after: Option<String>,
	#[serde(default)]
	children: Vec<Thing>,
}

impl<T> Client<T>
where
	T: HttpTransport,
{
	/// Fetches the first page of a listing endpoint.
	///
	/// `limit` and `after` in `args` set the page size and the starting anchor. Endpoints that
	/// answer with several listings need [`CallOptions::listing_index`].
	pub async fn listing(
		&self,
		endpoint: &Endpoint,
		args: &Args,
		options: &CallOptions,
	) -> Result<ListingSlice<T>> {
		self.fetch_slice(ListingCursor::new(endpoint.clone(), args.clone(), options.clone())).await
	}

	pub(crate) async fn fetch_slice(&self, cursor: ListingCursor) -> Result<ListingSlice<T>> {
		let span = FlowSpan::new(FlowKind::Listing, "fetch_slice");

		obs::record_flow_outcome(FlowKind::Listing, FlowOutcome::Attempt);

		let result = span
			.instrument(async {
				let get = self.call(&cursor.endpoint, &cursor.args, &cursor.options).await?;
				let listing = select_listing(&get, cursor.options.listing_index)?;
				let data = serde_path_to_error::deserialize::<_, RawListing>(listing)
					.map_err(|source| ListingError::Malformed { source })?
					.data;

				Ok::<_, Error>(self.build_slice(cursor, data, get))
			})
			.await;

		obs::record_flow_outcome(
			FlowKind::Listing,
			if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure },
		);

		result
	}

	fn build_slice(
		&self,
		cursor: ListingCursor,
		data: RawListingData,
		get: Value,
	) -> ListingSlice<T> {
		let (stickied, children) =
			data.children.iter().cloned().partition::<Vec<_>, _>(Thing::is_stickied);

		ListingSlice {
			client: self.clone(),
			count: cursor.count,
			cursor,
			before: data.before,
			after: data.after,
			empty: data.children.is_empty(),
			all_children: data.children,
			children,
			stickied,
			get,
		}
	}
}

fn select_listing(result: &Value, index: Option<usize>) -> Result<&Value, ListingError> {
	match result {
		Value::Array(listings) => {
			let index = index.ok_or(ListingError::MissingListingIndex)?;

			listings.get(index).ok_or(ListingError::IndexOutOfRange { index, len: listings.len() })
		},
		listing => Ok(listing),
	}
}
