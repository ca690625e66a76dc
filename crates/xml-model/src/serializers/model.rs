//! Nested model and document root serializers.

use serde_json::{Map, Value};

use crate::element::XmlElement;
use crate::encoder::XmlEncoder;
use crate::error::ModelFieldError;
use crate::model::{FieldDescriptor, Location, ModelDescriptor};
use crate::qname::{NsMap, merge_nsmaps};
use crate::serializers::{Context, Serializer, build_field_serializer, resolve_name};

/// Serializer for a model mapped onto an element.
///
/// Used both for the document root and for model-typed fields. The value
/// of a regular model is a JSON object keyed by field name; the value of a
/// custom root model is the value of its single field.
#[derive(Debug, Clone)]
pub struct ModelSerializer {
    model_name: String,
    element_name: String,
    nsmap: Option<NsMap>,
    root: bool,
    fields: Vec<(String, Serializer)>,
}

impl ModelSerializer {
    /// Builds the serializer for a document root model.
    pub fn build_root(model: &ModelDescriptor) -> Result<Self, ModelFieldError> {
        let element_name = resolve_name(
            model,
            &model.name,
            model.element_tag(),
            model.ns.as_deref(),
            model.nsmap.as_ref(),
            false,
        )?;
        Self::build(
            model,
            element_name,
            model.nsmap.clone(),
            Context::for_model(model),
        )
    }

    /// Builds the serializer for a field of `owner` whose type is `inner`.
    pub fn build_element(
        owner: &ModelDescriptor,
        field: &FieldDescriptor,
        inner: &ModelDescriptor,
        ctx: &Context,
    ) -> Result<Self, ModelFieldError> {
        if field.info.location == Location::Attribute {
            return Err(ModelFieldError::new(
                &owner.name,
                &field.name,
                "model fields can't be attributes",
            ));
        }

        let info = &field.info;
        let name = info.tag.as_deref().unwrap_or(&field.alias);
        let ns = info
            .ns
            .clone()
            .or_else(|| inner.ns.clone())
            .or_else(|| ctx.parent_ns.clone());
        let nsmap = merge_nsmaps(&[
            info.nsmap.as_ref(),
            inner.nsmap.as_ref(),
            ctx.parent_nsmap.as_ref(),
        ]);
        let element_name =
            resolve_name(owner, &field.name, name, ns.as_deref(), nsmap.as_ref(), false)?;
        let declared = merge_nsmaps(&[info.nsmap.as_ref(), inner.nsmap.as_ref()]);

        Self::build(
            inner,
            element_name,
            declared,
            Context {
                parent_ns: ns,
                parent_nsmap: nsmap,
                parent_is_root: inner.root,
            },
        )
    }

    fn build(
        model: &ModelDescriptor,
        element_name: String,
        nsmap: Option<NsMap>,
        ctx: Context,
    ) -> Result<Self, ModelFieldError> {
        if model.root {
            assert_eq!(
                model.fields.len(),
                1,
                "root model {} must have exactly one field",
                model.name
            );
        }

        let fields = model
            .fields
            .iter()
            .map(|field| Ok((field.name.clone(), build_field_serializer(model, field, &ctx)?)))
            .collect::<Result<Vec<_>, ModelFieldError>>()?;

        tracing::debug!(
            model = %model.name,
            element = %element_name,
            fields = fields.len(),
            "Built model serializer"
        );
        Ok(Self {
            model_name: model.name.clone(),
            element_name,
            nsmap,
            root: model.root,
            fields,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Resolved element tag in Clark notation.
    pub fn element_name(&self) -> &str {
        &self.element_name
    }

    /// Creates the model element and writes `value` into it.
    pub fn to_element(
        &self,
        value: &Value,
        encoder: &dyn XmlEncoder,
        skip_empty: bool,
    ) -> XmlElement {
        let mut element = XmlElement::with_nsmap(self.element_name.as_str(), self.nsmap.clone());
        self.serialize_fields(&mut element, value, encoder, skip_empty);
        element
    }

    /// Reads the model value from its own element.
    pub fn from_element(&self, element: &mut XmlElement) -> Value {
        if self.root {
            let (_, serializer) = &self.fields[0];
            return serializer.deserialize(Some(element)).unwrap_or(Value::Null);
        }

        let mut object = Map::new();
        for (name, serializer) in &self.fields {
            if let Some(value) = serializer.deserialize(Some(&mut *element)) {
                object.insert(name.clone(), value);
            }
        }
        Value::Object(object)
    }

    /// Appends the model element to `element`. A null value writes an
    /// empty element unless `skip_empty` is set.
    pub fn serialize<'a>(
        &self,
        element: &'a mut XmlElement,
        value: &Value,
        encoder: &dyn XmlEncoder,
        skip_empty: bool,
    ) -> &'a mut XmlElement {
        if value.is_null() && skip_empty {
            return element;
        }
        element.append_child(self.to_element(value, encoder, skip_empty));
        element
    }

    /// Pops the next matching child and reads the model value from it.
    pub fn deserialize(&self, element: Option<&mut XmlElement>) -> Option<Value> {
        let mut child = element?.pop_element(&self.element_name)?;
        Some(self.from_element(&mut child))
    }

    fn serialize_fields(
        &self,
        element: &mut XmlElement,
        value: &Value,
        encoder: &dyn XmlEncoder,
        skip_empty: bool,
    ) {
        if value.is_null() {
            return;
        }

        if self.root {
            let (_, serializer) = &self.fields[0];
            serializer.serialize(element, value, encoder, skip_empty);
            return;
        }

        for (name, serializer) in &self.fields {
            let field_value = value.get(name).unwrap_or(&Value::Null);
            serializer.serialize(element, field_value, encoder, skip_empty);
        }
    }
}
