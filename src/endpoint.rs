//! Endpoint descriptions and the URL/argument templating every call goes through.
//!
//! Endpoint paths may contain `$name` tokens (`/r/$subreddit/about`). Callers supply the
//! substitutions in the same [`Args`] map as the request arguments; keys starting with `$`
//! are consumed by the path and never sent to Reddit.

// std
use std::sync::LazyLock;
// crates.io
use regex::{Captures, Regex};
// self
use crate::{_prelude::*, config::Scheme};

static URL_PARAM: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"\$[A-Za-z0-9_.]+").expect("URL parameter pattern should compile.")
});

/// Request arguments keyed by name; `$`-prefixed keys are URL substitutions.
pub type Args = BTreeMap<String, String>;

/// HTTP verbs exposed by the call surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
	/// `GET`; arguments travel in the query string.
	Get,
	/// `POST`.
	Post,
	/// `PUT`.
	Put,
	/// `PATCH`.
	Patch,
	/// `DELETE`.
	Delete,
	/// Non-standard `UPDATE` verb a few Reddit endpoints document.
	Update,
}
impl HttpMethod {
	/// Returns the method token as sent on the wire.
	pub const fn as_str(self) -> &'static str {
		match self {
			HttpMethod::Get => "GET",
			HttpMethod::Post => "POST",
			HttpMethod::Put => "PUT",
			HttpMethod::Patch => "PATCH",
			HttpMethod::Delete => "DELETE",
			HttpMethod::Update => "UPDATE",
		}
	}

	/// Returns `true` when arguments belong in the query string rather than the body.
	pub const fn uses_query(self) -> bool {
		matches!(self, HttpMethod::Get)
	}
}
impl Display for HttpMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// One remote operation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint {
	/// HTTP verb.
	pub method: HttpMethod,
	/// Path template, possibly containing `$name` tokens.
	pub path: String,
	/// Whether the endpoint only answers with JSON when `api_type=json` is sent.
	pub needs_api_type_json: bool,
}
impl Endpoint {
	/// Creates an endpoint that does not need `api_type`.
	pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
		Self { method, path: path.into(), needs_api_type_json: false }
	}

	/// Marks the endpoint as requiring `api_type`.
	pub fn with_api_type_json(mut self) -> Self {
		self.needs_api_type_json = true;

		self
	}

	/// Resolves the full URL on `host`, substituting every `$token` from `args`.
	pub fn url(&self, scheme: Scheme, host: &str, args: &Args) -> Result<String> {
		let path = if self.path.starts_with('/') {
			self.path.clone()
		} else {
			format!("/{}", self.path)
		};

		replace_url_params(&format!("{}://{host}{path}", scheme.as_str()), args)
	}

	/// Builds the arguments sent to Reddit for this endpoint.
	pub fn args(&self, given: &Args, api_type: Option<&str>) -> Args {
		build_args(self, given, api_type)
	}
}

/// Substitutes every `$token` (`$` followed by word characters or dots) with the matching
/// entry from `args`.
///
/// ```
/// use reddit_broker::endpoint::{Args, replace_url_params};
///
/// let mut args = Args::new();
///
/// args.insert("$foo".into(), "hello".into());
/// args.insert("$bar".into(), "world".into());
///
/// assert_eq!(
/// 	replace_url_params("http://example.com/$foo/$bar/test.html", &args).unwrap(),
/// 	"http://example.com/hello/world/test.html"
/// );
/// ```
pub fn replace_url_params(template: &str, args: &Args) -> Result<String> {
	if let Some(missing) =
		URL_PARAM.find_iter(template).find(|token| !args.contains_key(token.as_str()))
	{
		return Err(Error::UrlParameter { parameter: missing.as_str().to_owned() });
	}

	Ok(URL_PARAM
		.replace_all(template, |caps: &Captures| args.get(&caps[0]).cloned().unwrap_or_default())
		.into_owned())
}

/// Drops `$`-prefixed substitution keys and injects `api_type` when the endpoint needs it.
///
/// An `api_type` present in `given` wins over the configured default.
pub fn build_args(endpoint: &Endpoint, given: &Args, api_type: Option<&str>) -> Args {
	let mut args: Args = given
		.iter()
		.filter(|(key, _)| !key.starts_with('$'))
		.map(|(key, value)| (key.clone(), value.clone()))
		.collect();
	let api_type = given.get("api_type").map(String::as_str).or(api_type);

	if endpoint.needs_api_type_json
		&& let Some(api_type) = api_type
	{
		args.insert("api_type".into(), api_type.into());
	}

	args
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn args(pairs: &[(&str, &str)]) -> Args {
		pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
	}

	#[test]
	fn url_tokens_are_substituted() {
		let given = args(&[("$a", "1"), ("$b", "2")]);

		assert_eq!(
			replace_url_params("https://x/$a/$b", &given).expect("Tokens should resolve."),
			"https://x/1/2"
		);
		assert_eq!(
			replace_url_params("https://x/plain", &Args::new()).expect("Plain URL should pass."),
			"https://x/plain"
		);
	}

	#[test]
	fn missing_token_names_the_parameter() {
		let err = replace_url_params("https://x/$a/$b", &args(&[("$a", "1")]))
			.expect_err("Missing token should fail.");

		assert!(matches!(&err, Error::UrlParameter { parameter } if parameter == "$b"));
		assert!(err.to_string().contains("$b"));
	}

	#[test]
	fn dotted_tokens_and_lone_dollars() {
		let given = args(&[("$where.kind", "hot")]);

		assert_eq!(
			replace_url_params("https://x/$where.kind/$", &given).expect("Tokens should resolve."),
			"https://x/hot/$"
		);
	}

	#[test]
	fn repeated_tokens_share_one_value() {
		let given = args(&[("$a", "x"), ("$b.c", "y")]);

		assert_eq!(
			replace_url_params("https://x/$a-$a?q=$b.c&$", &given)
				.expect("Tokens should resolve."),
			"https://x/x-x?q=y&$"
		);
	}

	#[test]
	fn endpoint_urls_join_host_and_path() {
		let endpoint = Endpoint::new(HttpMethod::Get, "r/$subreddit/hot");
		let url = endpoint
			.url(Scheme::Https, "oauth.reddit.com", &args(&[("$subreddit", "rust")]))
			.expect("URL should build.");

		assert_eq!(url, "https://oauth.reddit.com/r/rust/hot");
	}

	#[test]
	fn args_strip_tokens_and_inject_api_type() {
		let endpoint = Endpoint::new(HttpMethod::Post, "/api/submit").with_api_type_json();
		let built = build_args(&endpoint, &args(&[("$sub", "x"), ("title", "t")]), Some("json"));

		assert_eq!(built, args(&[("api_type", "json"), ("title", "t")]));

		let overridden = build_args(&endpoint, &args(&[("api_type", "xml")]), Some("json"));

		assert_eq!(overridden, args(&[("api_type", "xml")]));

		let plain = Endpoint::new(HttpMethod::Get, "/hot");

		assert_eq!(
			build_args(&plain, &args(&[("limit", "5")]), Some("json")),
			args(&[("limit", "5")])
		);
		assert!(build_args(&endpoint, &Args::new(), None).is_empty());
	}

	#[test]
	fn update_verb_is_preserved() {
		assert_eq!(HttpMethod::Update.as_str(), "UPDATE");
		assert!(HttpMethod::Get.uses_query());
		assert!(!HttpMethod::Delete.uses_query());
	}
}
