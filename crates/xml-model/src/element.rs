//! Mutable XML tree node shared by all field serializers.
//!
//! Serialization writes into an [`XmlElement`]; deserialization consumes it.
//! Every read accessor named `pop_*` removes what it returns, so fields that
//! are decoded one after another from the same parent never see data an
//! earlier field has already claimed.

use std::collections::VecDeque;

use crate::qname::NsMap;

/// An element with its text, attributes and children.
///
/// Tags and attribute names are stored in Clark notation
/// (`{namespace}local`), see [`crate::qname::QName::uri`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    tag: String,
    text: Option<String>,
    attributes: Vec<(String, String)>,
    children: VecDeque<XmlElement>,
    nsmap: Option<NsMap>,
}

impl XmlElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Creates an element that declares `nsmap` when rendered.
    pub fn with_nsmap(tag: impl Into<String>, nsmap: Option<NsMap>) -> Self {
        Self {
            tag: tag.into(),
            nsmap,
            ..Default::default()
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn nsmap(&self) -> Option<&NsMap> {
        self.nsmap.as_ref()
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Replaces the element text.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    /// Removes and returns the element text.
    pub fn pop_text(&mut self) -> Option<String> {
        self.text.take()
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Sets an attribute, overwriting a previous value with the same name.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Removes and returns an attribute value.
    pub fn pop_attribute(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|(key, _)| key == name)?;
        Some(self.attributes.remove(index).1)
    }

    /// Appends a child and returns a handle to it.
    pub fn append_child(&mut self, child: XmlElement) -> &mut XmlElement {
        self.children.push_back(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    pub fn children(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter()
    }

    /// Removes and returns the next unconsumed child if its tag is `tag`.
    ///
    /// Only the first remaining child is inspected. A child with another tag
    /// blocks the lookup, so repeated calls yield a contiguous run of
    /// matching siblings.
    pub fn pop_element(&mut self, tag: &str) -> Option<XmlElement> {
        if self.children.front()?.tag == tag {
            self.children.pop_front()
        } else {
            None
        }
    }

    /// True when the element carries no text, attributes or children.
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.attributes.is_empty() && self.children.is_empty()
    }
}
