//! Rendering of [`XmlElement`] trees as XML text.
//!
//! Elements and attributes carry Clark notation names. The writer maps each
//! namespace URI back to a prefix that is in scope, preferring the
//! declarations recorded on the elements, and declares a generated `nsN`
//! prefix when no binding exists.

use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::config::XmlConfig;
use crate::element::XmlElement;
use crate::error::{Result, XmlError};
use crate::qname::QName;

/// Renders `element` as an XML string.
pub fn to_xml_string(element: &XmlElement, config: &XmlConfig) -> Result<String> {
    let mut buffer = Vec::new();
    write_element(element, &mut buffer, config)?;
    String::from_utf8(buffer).map_err(|e| XmlError::Custom(e.to_string()))
}

/// Renders `element` into `writer`.
pub fn write_element<W: Write>(
    element: &XmlElement,
    writer: W,
    config: &XmlConfig,
) -> Result<()> {
    let mut writer = match config.indent {
        Some(indent) => Writer::new_with_indent(writer, b' ', indent),
        None => Writer::new(writer),
    };

    if config.xml_declaration {
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    }

    let mut generated = 0;
    write_node(&mut writer, element, &[], &mut generated)
}

/// In-scope namespace bindings of one element.
struct Scope {
    /// `(prefix, uri)` pairs, innermost last.
    bindings: Vec<(String, String)>,
    /// Declarations to emit on the current element.
    declared: Vec<(String, String)>,
}

impl Scope {
    fn new(parent: &[(String, String)]) -> Self {
        Self {
            bindings: parent.to_vec(),
            declared: Vec::new(),
        }
    }

    fn lookup(&self, prefix: &str) -> Option<&str> {
        self.bindings
            .iter()
            .rev()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    fn declare(&mut self, prefix: &str, uri: &str) {
        let unchanged = self.lookup(prefix) == Some(uri);
        let nothing_to_undeclare = prefix.is_empty() && uri.is_empty() && self.lookup("").is_none();
        if unchanged || nothing_to_undeclare {
            return;
        }
        self.bindings.push((prefix.to_string(), uri.to_string()));
        self.declared.push((prefix.to_string(), uri.to_string()));
    }

    /// Finds a usable prefix for `uri`. Attributes cannot use the default
    /// namespace.
    fn prefix_for(&self, uri: &str, is_attr: bool) -> Option<String> {
        if !is_attr && self.lookup("") == Some(uri) {
            return Some(String::new());
        }
        self.bindings
            .iter()
            .rev()
            .map(|(prefix, _)| prefix)
            .find(|prefix| !prefix.is_empty() && self.lookup(prefix) == Some(uri))
            .cloned()
    }

    fn qualify(&mut self, name: &str, is_attr: bool, generated: &mut usize) -> String {
        let qname = QName::from_uri(name);
        let Some(uri) = qname.ns else {
            if !is_attr {
                // Unqualified element under a default namespace.
                self.declare("", "");
            }
            return qname.tag;
        };

        let prefix = match self.prefix_for(&uri, is_attr) {
            Some(prefix) => prefix,
            None => {
                let mut prefix = format!("ns{}", generated);
                while self.lookup(&prefix).is_some() {
                    *generated += 1;
                    prefix = format!("ns{}", generated);
                }
                *generated += 1;
                self.declare(&prefix, &uri);
                prefix
            }
        };

        if prefix.is_empty() {
            qname.tag
        } else {
            format!("{}:{}", prefix, qname.tag)
        }
    }
}

fn write_node<W: Write>(
    writer: &mut Writer<W>,
    element: &XmlElement,
    parent_scope: &[(String, String)],
    generated: &mut usize,
) -> Result<()> {
    let mut scope = Scope::new(parent_scope);
    if let Some(nsmap) = element.nsmap() {
        for (prefix, uri) in nsmap {
            scope.declare(prefix, uri);
        }
    }

    let tag = scope.qualify(element.tag(), false, generated);
    let attributes: Vec<(String, &str)> = element
        .attributes()
        .map(|(name, value)| (scope.qualify(name, true, generated), value))
        .collect();

    let mut start = BytesStart::new(tag.as_str());
    for (prefix, uri) in &scope.declared {
        let key = if prefix.is_empty() {
            "xmlns".to_string()
        } else {
            format!("xmlns:{}", prefix)
        };
        start.push_attribute((key.as_str(), uri.as_str()));
    }
    for (name, value) in &attributes {
        start.push_attribute((name.as_str(), *value));
    }

    let mut children = element.children().peekable();
    if element.text().is_none() && children.peek().is_none() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if let Some(text) = element.text() {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    }
    for child in children {
        write_node(writer, child, &scope.bindings, generated)?;
    }
    writer.write_event(Event::End(BytesEnd::new(tag.as_str())))?;
    Ok(())
}
