//! Field serializers.
//!
//! A [`Serializer`] is built once per model field and reused for every
//! document. Building validates the field mapping and resolves names; the
//! resulting value holds only immutable configuration, so `serialize` and
//! `deserialize` cannot fail. Absence is reported as `None`.
//!
//! The variants form a closed set:
//!
//! | Field shape | Serializer |
//! |-------------|------------|
//! | scalar | [`PrimitiveSerializer`] (text, attribute or element) |
//! | homogeneous collection | [`HomogeneousSerializer`] (text, attribute or element) |
//! | nested model | [`ModelSerializer`] |

pub mod homogeneous;
pub mod model;
pub mod primitive;

use serde_json::Value;

use crate::element::XmlElement;
use crate::encoder::XmlEncoder;
use crate::error::ModelFieldError;
use crate::model::{FieldDescriptor, FieldShape, FieldType, ModelDescriptor};
use crate::qname::{NsMap, QName};

pub use homogeneous::HomogeneousSerializer;
pub use model::ModelSerializer;
pub use primitive::PrimitiveSerializer;

/// Inherited state threaded through serializer construction.
///
/// Nested builds derive a new context from their parent's and never modify
/// it in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    /// Namespace prefix of the enclosing element.
    pub parent_ns: Option<String>,
    /// Namespace map in scope at the enclosing element.
    pub parent_nsmap: Option<NsMap>,
    /// Whether the enclosing model is a custom root model.
    pub parent_is_root: bool,
}

impl Context {
    pub fn for_model(model: &ModelDescriptor) -> Self {
        Self {
            parent_ns: model.ns.clone(),
            parent_nsmap: model.nsmap.clone(),
            parent_is_root: model.root,
        }
    }
}

/// A field serializer.
#[derive(Debug, Clone)]
pub enum Serializer {
    Primitive(PrimitiveSerializer),
    Homogeneous(HomogeneousSerializer),
    Model(ModelSerializer),
}

impl Serializer {
    /// Writes `value` into `element`. `Value::Null` means the field is absent.
    pub fn serialize<'a>(
        &self,
        element: &'a mut XmlElement,
        value: &Value,
        encoder: &dyn XmlEncoder,
        skip_empty: bool,
    ) -> &'a mut XmlElement {
        match self {
            Serializer::Primitive(s) => s.serialize(element, value, encoder, skip_empty),
            Serializer::Homogeneous(s) => s.serialize(element, value, encoder, skip_empty),
            Serializer::Model(s) => s.serialize(element, value, encoder, skip_empty),
        }
    }

    /// Tag of the child element this serializer writes, if it writes one.
    pub fn element_name(&self) -> Option<&str> {
        match self {
            Serializer::Primitive(s) => s.element_name(),
            Serializer::Homogeneous(HomogeneousSerializer::Element(s)) => Some(s.element_name()),
            Serializer::Homogeneous(_) => None,
            Serializer::Model(s) => Some(s.element_name()),
        }
    }

    /// Consumes the field's data from `element`.
    pub fn deserialize(&self, element: Option<&mut XmlElement>) -> Option<Value> {
        match self {
            Serializer::Primitive(s) => s.deserialize(element),
            Serializer::Homogeneous(s) => s.deserialize(element),
            Serializer::Model(s) => s.deserialize(element),
        }
    }
}

/// Builds the serializer for any field shape of `model`.
pub fn build_field_serializer(
    model: &ModelDescriptor,
    field: &FieldDescriptor,
    ctx: &Context,
) -> Result<Serializer, ModelFieldError> {
    match (field.shape, &field.ty) {
        (FieldShape::Homogeneous, _) => {
            HomogeneousSerializer::build(model, field, field.info.location, ctx)
                .map(Serializer::Homogeneous)
        }
        (FieldShape::Heterogeneous, _) | (FieldShape::Singleton, FieldType::Tuple) => Err(
            ModelFieldError::new(
                &model.name,
                &field.name,
                "heterogeneous collections are not supported",
            ),
        ),
        (FieldShape::Singleton, FieldType::Model(inner)) => {
            ModelSerializer::build_element(model, field, inner, ctx).map(Serializer::Model)
        }
        (FieldShape::Singleton, FieldType::Scalar) => {
            PrimitiveSerializer::build(model, field, field.info.location, ctx)
                .map(Serializer::Primitive)
        }
    }
}

/// Resolves a name to Clark notation, reporting undeclared prefixes.
pub(crate) fn resolve_name(
    model: &ModelDescriptor,
    field_name: &str,
    tag: &str,
    ns: Option<&str>,
    nsmap: Option<&NsMap>,
    is_attr: bool,
) -> Result<String, ModelFieldError> {
    QName::from_alias(tag, ns, nsmap, is_attr)
        .map(|name| name.uri())
        .ok_or_else(|| {
            ModelFieldError::new(
                &model.name,
                field_name,
                format!("namespace prefix '{}' is not declared", ns.unwrap_or_default()),
            )
        })
}
