//! Reddit OAuth scope sets.

// std
use std::collections::{BTreeSet, btree_set::Iter};
// crates.io
use serde::{Deserializer, Serializer};
// self
use crate::_prelude::*;

/// Errors emitted when validating scopes.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ScopeValidationError {
	/// Empty scope entries are not allowed.
	#[error("Scope entries cannot be empty.")]
	Empty,
	/// Scopes cannot contain whitespace or commas; both act as separators on the wire.
	#[error("Scope contains a separator: {scope}.")]
	ContainsSeparator {
		/// The offending scope string.
		scope: String,
	},
}

/// Deduplicated, sorted set of OAuth scopes (`identity`, `read`, `*`, ...).
///
/// Reddit reports granted scopes space-separated and the authorization URLs send them the same
/// way. Comma-separated input is accepted too, and [`joined`](Self::joined) renders with any
/// delimiter.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeSet(BTreeSet<String>);
impl ScopeSet {
	/// Scope Reddit reports when a token carries every scope.
	pub const WILDCARD: &'static str = "*";

	/// Creates a validated scope set from any iterator.
	pub fn new<I, S>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut set = BTreeSet::new();

		for scope in scopes {
			let owned: String = scope.into();

			if owned.is_empty() {
				return Err(ScopeValidationError::Empty);
			}
			if owned.chars().any(is_separator) {
				return Err(ScopeValidationError::ContainsSeparator { scope: owned });
			}

			set.insert(owned);
		}

		Ok(Self(set))
	}

	/// Leniently parses a space- or comma-separated scope string, skipping empty entries.
	pub fn parse(raw: &str) -> Self {
		Self(raw.split(is_separator).filter(|s| !s.is_empty()).map(str::to_owned).collect())
	}

	/// Returns true if no scopes are defined.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if the set contains the provided scope or the wildcard.
	pub fn contains(&self, scope: &str) -> bool {
		self.0.contains(scope) || self.is_wildcard()
	}

	/// Returns true if the set grants every scope.
	pub fn is_wildcard(&self) -> bool {
		self.0.contains(Self::WILDCARD)
	}

	/// Iterator over scopes in sorted order.
	pub fn iter(&self) -> Iter<'_, String> {
		self.0.iter()
	}

	/// Joins the scopes with the provided delimiter.
	pub fn joined(&self, delimiter: char) -> String {
		let mut buf = String::new();

		for (idx, value) in self.0.iter().enumerate() {
			if idx > 0 {
				buf.push(delimiter);
			}

			buf.push_str(value);
		}

		buf
	}
}
impl Display for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.joined(' '))
	}
}
impl FromStr for ScopeSet {
	type Err = ScopeValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if !s.is_empty() && s.chars().all(is_separator) {
			return Err(ScopeValidationError::Empty);
		}

		Ok(Self::parse(s))
	}
}
impl<'a> IntoIterator for &'a ScopeSet {
	type IntoIter = Iter<'a, String>;
	type Item = &'a String;

	fn into_iter(self) -> Self::IntoIter {
		self.0.iter()
	}
}
impl Serialize for ScopeSet {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&self.joined(' '))
	}
}
impl<'de> Deserialize<'de> for ScopeSet {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Wire {
			Joined(String),
			List(Vec<String>),
		}

		match Wire::deserialize(deserializer)? {
			Wire::Joined(raw) => Ok(Self::parse(&raw)),
			Wire::List(values) => Self::new(values).map_err(serde::de::Error::custom),
		}
	}
}

fn is_separator(c: char) -> bool {
	c == ',' || c.is_whitespace()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn scopes_deduplicate_and_sort() {
		let scope = ScopeSet::new(["read", "identity", "read"])
			.expect("Scope fixture should be valid.");

		assert_eq!(scope.len(), 2);
		assert_eq!(scope.joined(','), "identity,read");
		assert_eq!(scope.to_string(), "identity read");
	}

	#[test]
	fn separators_are_rejected_in_entries() {
		assert_eq!(ScopeSet::new([""]), Err(ScopeValidationError::Empty));
		assert!(matches!(
			ScopeSet::new(["read,write"]),
			Err(ScopeValidationError::ContainsSeparator { .. })
		));
	}

	#[test]
	fn parse_accepts_both_wire_forms() {
		assert_eq!(ScopeSet::parse("identity read"), ScopeSet::parse("read,identity"));
		assert!(ScopeSet::from_str("").expect("Empty scope should parse.").is_empty());
		assert!(ScopeSet::from_str(" , ").is_err());
	}

	#[test]
	fn wildcard_contains_everything() {
		let scope = ScopeSet::parse("*");

		assert!(scope.is_wildcard());
		assert!(scope.contains("modposts"));
	}

	#[test]
	fn deserializes_from_string_or_list() {
		let joined: ScopeSet =
			serde_json::from_str("\"identity read\"").expect("Joined scope should deserialize.");
		let listed: ScopeSet = serde_json::from_str("[\"read\",\"identity\"]")
			.expect("Listed scope should deserialize.");

		assert_eq!(joined, listed);
		assert_eq!(
			serde_json::to_string(&joined).expect("Scope should serialize."),
			"\"identity read\""
		);
	}
}
