//! Model and field descriptors.
//!
//! Descriptors are produced once when a model is registered and are read
//! by the serializer builders. They carry everything the builders need to
//! know about a field, so no type inspection happens while documents are
//! encoded or decoded.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::qname::NsMap;

/// XML construct a field is mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    /// Child element(s) of the model element.
    Element,
    /// Attribute of the model element.
    Attribute,
    /// No explicit mapping: the field is the model element's text.
    #[default]
    Missing,
}

/// Field shape as classified by the model layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    Singleton,
    /// Sequence whose items share one type (`Vec<T>`).
    Homogeneous,
    /// Fixed size sequence with per-position types (tuples).
    Heterogeneous,
}

impl FieldShape {
    pub fn is_collection(self) -> bool {
        matches!(self, FieldShape::Homogeneous | FieldShape::Heterogeneous)
    }
}

/// Declared type of a field, or of its items for collections.
#[derive(Debug, Clone)]
pub enum FieldType {
    Scalar,
    Tuple,
    Model(Arc<ModelDescriptor>),
}

impl FieldType {
    pub fn is_model(&self) -> bool {
        matches!(self, FieldType::Model(_))
    }
}

/// XML mapping metadata attached to a field.
#[derive(Debug, Clone, Default)]
pub struct EntityInfo {
    pub location: Location,
    /// Explicit tag (or attribute name) overriding the field alias.
    pub tag: Option<String>,
    /// Namespace prefix, looked up in the namespace maps.
    pub ns: Option<String>,
    pub nsmap: Option<NsMap>,
}

/// Description of a single model field.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    /// Public name used as the default tag.
    pub alias: String,
    pub shape: FieldShape,
    pub ty: FieldType,
    pub sub_fields: Vec<FieldDescriptor>,
    pub info: EntityInfo,
}

impl FieldDescriptor {
    fn with_shape(name: &str, shape: FieldShape, ty: FieldType, sub_fields: Vec<Self>) -> Self {
        Self {
            name: name.to_string(),
            alias: name.to_string(),
            shape,
            ty,
            sub_fields,
            info: EntityInfo::default(),
        }
    }

    pub fn scalar(name: &str) -> Self {
        Self::with_shape(name, FieldShape::Singleton, FieldType::Scalar, Vec::new())
    }

    pub fn model(name: &str, model: Arc<ModelDescriptor>) -> Self {
        Self::with_shape(name, FieldShape::Singleton, FieldType::Model(model), Vec::new())
    }

    /// A homogeneous collection of `item`. The declared type is the item type.
    pub fn list(name: &str, item: FieldDescriptor) -> Self {
        let ty = item.ty.clone();
        Self::with_shape(name, FieldShape::Homogeneous, ty, vec![item])
    }

    /// A fixed size tuple with one sub-field per position.
    pub fn tuple(name: &str, items: Vec<FieldDescriptor>) -> Self {
        Self::with_shape(name, FieldShape::Heterogeneous, FieldType::Tuple, items)
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = alias.to_string();
        self
    }

    pub fn element(mut self) -> Self {
        self.info.location = Location::Element;
        self
    }

    pub fn attribute(mut self) -> Self {
        self.info.location = Location::Attribute;
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.info.tag = Some(tag.to_string());
        self
    }

    pub fn ns(mut self, prefix: &str) -> Self {
        self.info.ns = Some(prefix.to_string());
        self
    }

    pub fn nsmap(mut self, nsmap: NsMap) -> Self {
        self.info.nsmap = Some(nsmap);
        self
    }

    /// The single item descriptor of a homogeneous collection.
    ///
    /// # Panics
    ///
    /// Panics if the descriptor does not have exactly one sub-field.
    pub fn item_field(&self) -> &FieldDescriptor {
        assert_eq!(
            self.sub_fields.len(),
            1,
            "unexpected subfields number for field {}",
            self.name
        );
        &self.sub_fields[0]
    }
}

/// Description of a model: its element name and fields.
#[derive(Debug, Clone)]
pub struct ModelDescriptor {
    pub name: String,
    pub tag: Option<String>,
    pub ns: Option<String>,
    pub nsmap: Option<NsMap>,
    /// Custom root model: the single field is the model value itself.
    pub root: bool,
    pub fields: Vec<FieldDescriptor>,
}

impl ModelDescriptor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tag: None,
            ns: None,
            nsmap: None,
            root: false,
            fields: Vec::new(),
        }
    }

    /// A custom root model whose value is `field`'s value.
    pub fn root(name: &str, field: FieldDescriptor) -> Self {
        Self {
            root: true,
            fields: vec![field],
            ..Self::new(name)
        }
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    pub fn ns(mut self, prefix: &str) -> Self {
        self.ns = Some(prefix.to_string());
        self
    }

    pub fn nsmap(mut self, nsmap: NsMap) -> Self {
        self.nsmap = Some(nsmap);
        self
    }

    /// Element tag of the model, the model name unless overridden.
    pub fn element_tag(&self) -> &str {
        self.tag.as_deref().unwrap_or(&self.name)
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}
