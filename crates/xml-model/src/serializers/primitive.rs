//! Scalar field serializers.

use serde_json::Value;

use crate::element::XmlElement;
use crate::encoder::XmlEncoder;
use crate::error::ModelFieldError;
use crate::model::{FieldDescriptor, Location, ModelDescriptor};
use crate::qname::{NsMap, merge_nsmaps};
use crate::serializers::{Context, resolve_name};

/// Serializer for a single scalar value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimitiveSerializer {
    /// Value is the text of the enclosing element.
    Text,
    /// Value is an attribute of the enclosing element.
    Attribute { attr_name: String },
    /// Value is the text of a child element.
    Element {
        element_name: String,
        nsmap: Option<NsMap>,
    },
}

impl PrimitiveSerializer {
    pub fn build(
        model: &ModelDescriptor,
        field: &FieldDescriptor,
        location: Location,
        ctx: &Context,
    ) -> Result<Self, ModelFieldError> {
        let info = &field.info;
        let name = info.tag.as_deref().unwrap_or(&field.alias);

        let serializer = match location {
            Location::Missing => PrimitiveSerializer::Text,
            Location::Attribute => {
                let nsmap = merge_nsmaps(&[info.nsmap.as_ref(), ctx.parent_nsmap.as_ref()]);
                PrimitiveSerializer::Attribute {
                    attr_name: resolve_name(
                        model,
                        &field.name,
                        name,
                        info.ns.as_deref(),
                        nsmap.as_ref(),
                        true,
                    )?,
                }
            }
            Location::Element => {
                let ns = info.ns.as_deref().or(ctx.parent_ns.as_deref());
                let nsmap = merge_nsmaps(&[info.nsmap.as_ref(), ctx.parent_nsmap.as_ref()]);
                let element_name =
                    resolve_name(model, &field.name, name, ns, nsmap.as_ref(), false)?;
                PrimitiveSerializer::Element {
                    element_name,
                    nsmap: info.nsmap.clone(),
                }
            }
        };

        tracing::trace!(
            model = %model.name,
            field = %field.name,
            serializer = ?serializer,
            "Built primitive serializer"
        );
        Ok(serializer)
    }

    pub fn element_name(&self) -> Option<&str> {
        match self {
            PrimitiveSerializer::Element { element_name, .. } => Some(element_name.as_str()),
            PrimitiveSerializer::Text | PrimitiveSerializer::Attribute { .. } => None,
        }
    }

    pub fn serialize<'a>(
        &self,
        element: &'a mut XmlElement,
        value: &Value,
        encoder: &dyn XmlEncoder,
        skip_empty: bool,
    ) -> &'a mut XmlElement {
        match self {
            PrimitiveSerializer::Text => {
                if !value.is_null() {
                    element.set_text(encoder.encode(value));
                }
            }
            PrimitiveSerializer::Attribute { attr_name } => {
                if !value.is_null() {
                    element.set_attribute(attr_name.as_str(), encoder.encode(value));
                }
            }
            PrimitiveSerializer::Element {
                element_name,
                nsmap,
            } => {
                if value.is_null() && skip_empty {
                    return element;
                }
                let child = element
                    .append_child(XmlElement::with_nsmap(element_name.as_str(), nsmap.clone()));
                if !value.is_null() {
                    child.set_text(encoder.encode(value));
                }
            }
        }
        element
    }

    /// Decodes the raw text of the field. An element without text decodes
    /// to `Value::Null` so that it still counts as present.
    pub fn deserialize(&self, element: Option<&mut XmlElement>) -> Option<Value> {
        let element = element?;
        match self {
            PrimitiveSerializer::Text => element.pop_text().map(Value::String),
            PrimitiveSerializer::Attribute { attr_name } => {
                element.pop_attribute(attr_name).map(Value::String)
            }
            PrimitiveSerializer::Element { element_name, .. } => {
                let mut child = element.pop_element(element_name)?;
                Some(child.pop_text().map(Value::String).unwrap_or(Value::Null))
            }
        }
    }
}
