//! XML text layer.
//!
//! Converts between XML documents and [`XmlElement`](crate::element::XmlElement)
//! trees using quick-xml. Field serializers never touch XML text directly;
//! they only read and write trees.
//!
//! - **Parsing** ([`de`]): namespace-aware reading with `NsReader`. Element
//!   and attribute names are resolved to Clark notation, entities are
//!   unescaped, and whitespace between child elements is dropped.
//! - **Rendering** ([`ser`]): writes declarations recorded on elements,
//!   reuses in-scope prefixes and generates `nsN` prefixes for namespaces
//!   that have no binding yet.

pub mod de;
pub mod ser;

pub use de::parse_element;
pub use ser::{to_xml_string, write_element};
