//! Parsing of XML documents into [`XmlElement`] trees.
//!
//! Names are resolved with quick-xml's `NsReader` and stored in Clark
//! notation. Namespace declarations are consumed by the resolver and do not
//! show up as attributes.

use quick_xml::NsReader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{LocalName, ResolveResult};

use crate::element::XmlElement;
use crate::error::{Result, XmlError};

/// Parses an XML document and returns its root element.
pub fn parse_element(xml: &str) -> Result<XmlElement> {
    let mut reader = NsReader::from_str(xml);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let element = open_element(&reader, &start)?;
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = open_element(&reader, &start)?;
                close_element(element, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| XmlError::Custom("unexpected closing tag".to_string()))?;
                close_element(element, &mut stack, &mut root)?;
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    let decoded = text.decode()?;
                    append_text(current, &decoded);
                }
            }
            Event::CData(cdata) => {
                if let Some(current) = stack.last_mut() {
                    let decoded = cdata.decode()?;
                    append_text(current, &decoded);
                }
            }
            Event::GeneralRef(reference) => {
                if let Some(current) = stack.last_mut() {
                    let resolved = match reference.resolve_char_ref()? {
                        Some(ch) => ch.to_string(),
                        None => {
                            let name = reference.decode()?;
                            resolve_predefined_entity(&name)
                                .ok_or_else(|| {
                                    XmlError::Custom(format!("unknown entity &{};", name))
                                })?
                                .to_string()
                        }
                    };
                    append_text(current, &resolved);
                }
            }
            Event::Comment(_) | Event::PI(_) | Event::Decl(_) | Event::DocType(_) => {}
            Event::Eof => break,
        }
    }

    if !stack.is_empty() {
        return Err(XmlError::Custom(format!(
            "unexpected end of document inside <{}>",
            stack[stack.len() - 1].tag()
        )));
    }
    root.ok_or(XmlError::MissingRoot)
}

fn open_element(reader: &NsReader<&[u8]>, start: &BytesStart) -> Result<XmlElement> {
    let (resolved, local) = reader.resolve_element(start.name());
    let mut element = XmlElement::new(clark_name(resolved, local)?);

    for attr in start.attributes() {
        let attr = attr?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let (resolved, local) = reader.resolve_attribute(attr.key);
        let name = clark_name(resolved, local)?;
        let value = attr.decode_and_unescape_value(reader.decoder())?;
        element.set_attribute(name, value.into_owned());
    }

    Ok(element)
}

fn close_element(
    mut element: XmlElement,
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
) -> Result<()> {
    // Indentation between child elements is not content.
    if element.children().next().is_some()
        && element.text().is_some_and(|text| text.trim().is_empty())
    {
        element.pop_text();
    }

    match stack.last_mut() {
        Some(parent) => {
            parent.append_child(element);
        }
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(XmlError::Custom(format!(
                "multiple root elements: <{}>",
                element.tag()
            )));
        }
    }
    Ok(())
}

fn append_text(element: &mut XmlElement, text: &str) {
    let mut combined = element.pop_text().unwrap_or_default();
    combined.push_str(text);
    element.set_text(combined);
}

fn clark_name(resolved: ResolveResult, local: LocalName) -> Result<String> {
    let local = String::from_utf8_lossy(local.as_ref());
    match resolved {
        ResolveResult::Bound(ns) => Ok(format!(
            "{{{}}}{}",
            String::from_utf8_lossy(ns.as_ref()),
            local
        )),
        ResolveResult::Unbound => Ok(local.into_owned()),
        ResolveResult::Unknown(prefix) => Err(XmlError::Custom(format!(
            "unknown namespace prefix '{}'",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_namespaces() -> Result<()> {
        let xml = r#"<?xml version="1.0"?>
<root xmlns="http://default" xmlns:t="http://test" t:ids="1 2" plain="x">
  <t:item>a</t:item>
  <item>b</item>
</root>"#;
        let root = parse_element(xml)?;
        assert_eq!(root.tag(), "{http://default}root");
        assert_eq!(root.attribute("{http://test}ids"), Some("1 2"));
        assert_eq!(root.attribute("plain"), Some("x"));
        assert_eq!(root.attributes().count(), 2);
        assert_eq!(root.text(), None);

        let tags: Vec<_> = root.children().map(|c| c.tag()).collect();
        assert_eq!(tags, ["{http://test}item", "{http://default}item"]);
        Ok(())
    }

    #[test]
    fn test_parse_entities_and_cdata() -> Result<()> {
        let root = parse_element("<a>x &amp; y &#65;<![CDATA[ <z> ]]></a>")?;
        assert_eq!(root.text(), Some("x & y A <z> "));

        let root = parse_element(r#"<a v="1 &lt; 2"/>"#)?;
        assert_eq!(root.attribute("v"), Some("1 < 2"));
        Ok(())
    }

    #[test]
    fn test_parse_keeps_text_of_leaf_elements() -> Result<()> {
        let root = parse_element("<a>  padded  </a>")?;
        assert_eq!(root.text(), Some("  padded  "));
        Ok(())
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_element(""), Err(XmlError::MissingRoot)));
        assert!(parse_element("<a><b></b>").is_err());
        assert!(parse_element("<a/><b/>").is_err());
        assert!(parse_element("<p:a/>").is_err());
    }
}
