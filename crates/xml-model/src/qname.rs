//! Qualified names and namespace maps.
//!
//! Names are resolved once, when serializers are built, into Clark notation
//! (`{http://example.com}tag`). The tree and the text layer only ever see
//! the resolved form.

use std::collections::BTreeMap;
use std::fmt;

/// Prefix to namespace URI mapping. The empty prefix is the default namespace.
pub type NsMap = BTreeMap<String, String>;

/// A local name together with its resolved namespace URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    pub tag: String,
    pub ns: Option<String>,
}

impl QName {
    pub fn new(tag: impl Into<String>, ns: Option<String>) -> Self {
        Self {
            tag: tag.into(),
            ns,
        }
    }

    /// Resolves `tag` against a namespace prefix and namespace map.
    ///
    /// Elements fall back to the default namespace (empty prefix) when no
    /// prefix is given; unprefixed attributes never carry a namespace.
    /// Returns `None` when an explicit prefix is not declared in `nsmap`.
    pub fn from_alias(
        tag: &str,
        ns: Option<&str>,
        nsmap: Option<&NsMap>,
        is_attr: bool,
    ) -> Option<Self> {
        if is_attr && ns.is_none() {
            return Some(Self::new(tag, None));
        }

        let prefix = ns.unwrap_or("");
        let uri = nsmap.and_then(|map| map.get(prefix)).cloned();
        if uri.is_none() && !prefix.is_empty() {
            return None;
        }

        Some(Self::new(tag, uri))
    }

    /// Parses a Clark notation identifier.
    pub fn from_uri(uri: &str) -> Self {
        match uri.strip_prefix('{').and_then(|rest| rest.split_once('}')) {
            Some((ns, tag)) => Self::new(tag, Some(ns.to_string())),
            None => Self::new(uri, None),
        }
    }

    /// Clark notation identifier used as the tree key.
    pub fn uri(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ns {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.tag),
            None => write!(f, "{}", self.tag),
        }
    }
}

/// Merges namespace maps. Entries of earlier maps win on conflicting prefixes.
pub fn merge_nsmaps(maps: &[Option<&NsMap>]) -> Option<NsMap> {
    let mut merged: Option<NsMap> = None;
    for map in maps.iter().rev().flatten() {
        merged
            .get_or_insert_with(NsMap::new)
            .extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    merged
}
