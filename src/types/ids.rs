use super::ValidationError;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// A Notion id tagged with the kind of object it names.
///
/// The stored value is always the canonical hyphenated form
/// (`8-4-4-4-12` lowercase hex) whenever the input was a 32-hex id, so two
/// raw ids that differ only by hyphenation compare equal and hash alike.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id<T> {
    value: String,
    _phantom: PhantomData<T>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageMarker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockMarker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatabaseMarker;

pub type PageId = Id<PageMarker>;
pub type BlockId = Id<BlockMarker>;
pub type DatabaseId = Id<DatabaseMarker>;

lazy_static! {
    static ref HEX32: Regex = Regex::new(r"^[0-9a-fA-F]{32}$").expect("static regex");
}

impl<T> Id<T> {
    /// Parse a raw id, rejecting anything that is not 32 hex digits once
    /// hyphens are removed.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let compact = dehyphenate(input.trim());
        if !HEX32.is_match(&compact) {
            return Err(ValidationError::InvalidId(format!(
                "expected 32 hexadecimal characters, got '{}'",
                input
            )));
        }
        Ok(Self::from_canonical(canonicalize(&compact)))
    }

    /// Wrap an id coming from the API or a cache file.
    ///
    /// Never fails: well-formed ids are canonicalized, anything else is kept
    /// verbatim so opaque upstream ids still round-trip.
    pub fn from_raw(input: &str) -> Self {
        Self::from_canonical(canonicalize(input))
    }

    fn from_canonical(value: String) -> Self {
        Self {
            value,
            _phantom: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// The 32-hex form used in page-relative hrefs.
    pub fn to_compact(&self) -> String {
        dehyphenate(&self.value)
    }

    /// Reinterpret the id as another kind. Notion pages are blocks too.
    pub fn cast<U>(&self) -> Id<U> {
        Id::from_canonical(self.value.clone())
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value)
    }
}

/// Cache files and API payloads may carry either hyphenation.
impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(|raw| Self::from_raw(&raw))
    }
}

/// Removes every hyphen from a raw id.
pub fn dehyphenate(raw: &str) -> String {
    raw.chars().filter(|c| *c != '-').collect()
}

/// Canonical block/page id: hyphens at offsets 8, 12, 16 and 20 of the
/// 32-hex form, lowercase. Inputs that are not 32 hex digits after removing
/// hyphens are returned trimmed but otherwise untouched.
pub fn canonicalize(raw: &str) -> String {
    let trimmed = raw.trim();
    let compact = dehyphenate(trimmed);
    if !HEX32.is_match(&compact) {
        return trimmed.to_string();
    }
    let compact = compact.to_ascii_lowercase();
    format!(
        "{}-{}-{}-{}-{}",
        &compact[0..8],
        &compact[8..12],
        &compact[12..16],
        &compact[16..20],
        &compact[20..32]
    )
}
