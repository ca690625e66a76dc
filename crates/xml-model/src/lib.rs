//! # Helios XML Model
//!
//! Maps typed model fields onto XML. Each field of a registered model gets a
//! serializer that is built once, validated up front, and then reused for
//! every document encoded or decoded against that model.
//!
//! ## Collections
//!
//! Homogeneous collection fields (`Vec<T>` of one scalar type) have three
//! representations, selected by the field's [`Location`]:
//!
//! | Location | XML |
//! |----------|-----|
//! | `Missing` | `<Model>a b c</Model>` |
//! | `Attribute` | `<Model values="a b c"/>` |
//! | `Element` | `<Model><value>a</value><value>b</value><value>c</value></Model>` |
//!
//! Decoding distinguishes a field that is absent (`None`) from one that is
//! present but empty (`Some([])`). Decoded scalars are returned as raw
//! strings; converting them to typed values is left to the model layer.
//!
//! ## Architecture
//!
//! - **Descriptors** ([`model`]): fields and models as produced by model
//!   registration.
//! - **Serializers** ([`serializers`]): a closed set of serializers built
//!   from descriptors. Construction is the only step that can fail.
//! - **Tree** ([`element`]): the mutable node serializers write to and
//!   consume from. Reads remove what they return.
//! - **Text layer** ([`xml`]): quick-xml based parsing and rendering.
//!
//! ## Examples
//!
//! ```rust
//! use helios_xml_model::{FieldDescriptor, ModelDescriptor, XmlConfig, XmlModel};
//! use serde_json::json;
//!
//! let model = ModelDescriptor::new("Order")
//!     .field(FieldDescriptor::list("tags", FieldDescriptor::scalar("tags")).attribute())
//!     .field(FieldDescriptor::list("item", FieldDescriptor::scalar("item")).element())
//!     .into_arc();
//!
//! let xml_model = XmlModel::build(model).unwrap().with_config(XmlConfig {
//!     xml_declaration: false,
//!     ..Default::default()
//! });
//!
//! let value = json!({"tags": ["new", "paid"], "item": ["apple", "pear"]});
//! let xml = xml_model.to_xml_string(&value).unwrap();
//! assert_eq!(xml, r#"<Order tags="new paid"><item>apple</item><item>pear</item></Order>"#);
//!
//! assert_eq!(xml_model.from_xml_str(&xml).unwrap(), value);
//! ```

pub mod config;
pub mod element;
pub mod encoder;
pub mod error;
pub mod model;
pub mod qname;
pub mod serializers;
pub mod xml;

use std::sync::Arc;

use serde_json::Value;

pub use config::XmlConfig;
pub use element::XmlElement;
pub use encoder::{DefaultEncoder, XmlEncoder};
pub use error::{ModelFieldError, Result, XmlError};
pub use model::{EntityInfo, FieldDescriptor, FieldShape, FieldType, Location, ModelDescriptor};
pub use qname::{NsMap, QName};
pub use serializers::{Context, HomogeneousSerializer, Serializer, build_field_serializer};

use serializers::ModelSerializer;

/// A model registered for XML encoding and decoding.
///
/// Building validates every field of the model, including nested models.
/// The instance is immutable afterwards and may be shared between threads.
pub struct XmlModel {
    descriptor: Arc<ModelDescriptor>,
    serializer: ModelSerializer,
    config: XmlConfig,
    encoder: Arc<dyn XmlEncoder + Send + Sync>,
}

impl XmlModel {
    pub fn build(descriptor: Arc<ModelDescriptor>) -> std::result::Result<Self, ModelFieldError> {
        let serializer = ModelSerializer::build_root(&descriptor)?;
        Ok(Self {
            descriptor,
            serializer,
            config: XmlConfig::default(),
            encoder: Arc::new(DefaultEncoder),
        })
    }

    pub fn with_config(mut self, config: XmlConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_encoder(mut self, encoder: impl XmlEncoder + Send + Sync + 'static) -> Self {
        self.encoder = Arc::new(encoder);
        self
    }

    pub fn descriptor(&self) -> &ModelDescriptor {
        &self.descriptor
    }

    pub fn config(&self) -> &XmlConfig {
        &self.config
    }

    /// Encodes `value` into a new root element.
    pub fn to_xml_tree(&self, value: &Value) -> XmlElement {
        self.serializer
            .to_element(value, self.encoder.as_ref(), self.config.skip_empty)
    }

    /// Decodes a model value from its root element.
    pub fn from_xml_tree(&self, mut element: XmlElement) -> Result<Value> {
        if element.tag() != self.serializer.element_name() {
            return Err(XmlError::UnexpectedRoot {
                expected: self.serializer.element_name().to_string(),
                found: element.tag().to_string(),
            });
        }

        let value = self.serializer.from_element(&mut element);
        if !element.is_empty() {
            tracing::warn!(
                model = %self.descriptor.name,
                "Document contains content not mapped to any field"
            );
        }
        Ok(value)
    }

    pub fn to_xml_string(&self, value: &Value) -> Result<String> {
        xml::to_xml_string(&self.to_xml_tree(value), &self.config)
    }

    pub fn from_xml_str(&self, xml: &str) -> Result<Value> {
        let element = xml::parse_element(xml)?;
        self.from_xml_tree(element)
    }
}

impl std::fmt::Debug for XmlModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XmlModel")
            .field("model", &self.descriptor.name)
            .field("serializer", &self.serializer)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
