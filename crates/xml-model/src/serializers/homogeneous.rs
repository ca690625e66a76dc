//! Homogeneous collection serializers.
//!
//! A collection field is mapped onto one of three XML shapes depending on
//! its [`Location`]:
//!
//! ```xml
//! <!-- Location::Missing: whitespace separated element text -->
//! <Model>1 2 3</Model>
//!
//! <!-- Location::Attribute: whitespace separated attribute value -->
//! <Model values="1 2 3"/>
//!
//! <!-- Location::Element: one sibling element per item -->
//! <Model><value>1</value><value>2</value><value>3</value></Model>
//! ```
//!
//! Text and attribute forms only hold scalars. The element form delegates
//! every item to an inner serializer built for the item type, so items may
//! also be nested models.

use serde_json::Value;

use crate::element::XmlElement;
use crate::encoder::XmlEncoder;
use crate::error::ModelFieldError;
use crate::model::{EntityInfo, FieldDescriptor, FieldType, Location, ModelDescriptor};
use crate::qname::merge_nsmaps;
use crate::serializers::{Context, Serializer, build_field_serializer, resolve_name};

/// Serializer for a homogeneous collection field.
#[derive(Debug, Clone)]
pub enum HomogeneousSerializer {
    Text(TextSerializer),
    Attribute(AttributeSerializer),
    Element(ElementSerializer),
}

impl HomogeneousSerializer {
    /// Validates the collection field and builds the variant for `location`.
    pub fn build(
        model: &ModelDescriptor,
        field: &FieldDescriptor,
        location: Location,
        ctx: &Context,
    ) -> Result<Self, ModelFieldError> {
        let item_field = field.item_field();

        if item_field.shape.is_collection() {
            return Err(ModelFieldError::new(
                &model.name,
                &field.name,
                "collection elements can't be of collection type",
            ));
        }

        if model.root && location == Location::Missing {
            return Err(ModelFieldError::new(
                &model.name,
                &field.name,
                "root model collections should be marked as elements",
            ));
        }

        let serializer = match location {
            Location::Element => {
                HomogeneousSerializer::Element(ElementSerializer::build(model, field, ctx)?)
            }
            Location::Missing => HomogeneousSerializer::Text(TextSerializer::build(model, field)?),
            Location::Attribute => {
                HomogeneousSerializer::Attribute(AttributeSerializer::build(model, field, ctx)?)
            }
        };

        tracing::debug!(
            model = %model.name,
            field = %field.name,
            location = ?location,
            "Built homogeneous collection serializer"
        );
        Ok(serializer)
    }

    pub fn serialize<'a>(
        &self,
        element: &'a mut XmlElement,
        value: &Value,
        encoder: &dyn XmlEncoder,
        skip_empty: bool,
    ) -> &'a mut XmlElement {
        match self {
            HomogeneousSerializer::Text(s) => s.serialize(element, value, encoder, skip_empty),
            HomogeneousSerializer::Attribute(s) => s.serialize(element, value, encoder, skip_empty),
            HomogeneousSerializer::Element(s) => s.serialize(element, value, encoder, skip_empty),
        }
    }

    pub fn deserialize(&self, element: Option<&mut XmlElement>) -> Option<Value> {
        match self {
            HomogeneousSerializer::Text(s) => s.deserialize(element),
            HomogeneousSerializer::Attribute(s) => s.deserialize(element),
            HomogeneousSerializer::Element(s) => s.deserialize(element),
        }
    }
}

/// Collection stored as whitespace separated text of the enclosing element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSerializer;

impl TextSerializer {
    pub fn build(model: &ModelDescriptor, field: &FieldDescriptor) -> Result<Self, ModelFieldError> {
        ensure_scalar_items(model, field)?;
        Ok(TextSerializer)
    }

    pub fn serialize<'a>(
        &self,
        element: &'a mut XmlElement,
        value: &Value,
        encoder: &dyn XmlEncoder,
        skip_empty: bool,
    ) -> &'a mut XmlElement {
        if let Some(encoded) = join_items(value, encoder, skip_empty) {
            element.set_text(encoded);
        }
        element
    }

    pub fn deserialize(&self, element: Option<&mut XmlElement>) -> Option<Value> {
        let element = element?;
        Some(match element.pop_text() {
            Some(text) => split_items(&text),
            None => Value::Array(Vec::new()),
        })
    }
}

/// Collection stored as a whitespace separated attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSerializer {
    attr_name: String,
}

impl AttributeSerializer {
    pub fn build(
        model: &ModelDescriptor,
        field: &FieldDescriptor,
        ctx: &Context,
    ) -> Result<Self, ModelFieldError> {
        ensure_scalar_items(model, field)?;

        let name = field.name.as_str();
        assert!(!name.is_empty(), "attribute must have a name");

        let nsmap = merge_nsmaps(&[field.info.nsmap.as_ref(), ctx.parent_nsmap.as_ref()]);
        let attr_name = resolve_name(
            model,
            &field.name,
            name,
            field.info.ns.as_deref(),
            nsmap.as_ref(),
            true,
        )?;
        Ok(Self { attr_name })
    }

    /// Resolved attribute identifier in Clark notation.
    pub fn attr_name(&self) -> &str {
        &self.attr_name
    }

    pub fn serialize<'a>(
        &self,
        element: &'a mut XmlElement,
        value: &Value,
        encoder: &dyn XmlEncoder,
        skip_empty: bool,
    ) -> &'a mut XmlElement {
        if let Some(encoded) = join_items(value, encoder, skip_empty) {
            element.set_attribute(self.attr_name.as_str(), encoded);
        }
        element
    }

    pub fn deserialize(&self, element: Option<&mut XmlElement>) -> Option<Value> {
        let element = element?;
        Some(match element.pop_attribute(&self.attr_name) {
            Some(attribute) => split_items(&attribute),
            None => Value::Array(Vec::new()),
        })
    }
}

/// Collection stored as repeated sibling elements sharing one tag.
#[derive(Debug, Clone)]
pub struct ElementSerializer {
    element_name: String,
    inner: Box<Serializer>,
}

impl ElementSerializer {
    pub fn build(
        model: &ModelDescriptor,
        field: &FieldDescriptor,
        ctx: &Context,
    ) -> Result<Self, ModelFieldError> {
        let info = &field.info;
        let ns = info.ns.clone().or_else(|| ctx.parent_ns.clone());
        let nsmap = merge_nsmaps(&[info.nsmap.as_ref(), ctx.parent_nsmap.as_ref()]);

        // Items keep the collection's name and mapping so that errors raised
        // while building them point at this field.
        let item = field.item_field();
        let item_field = FieldDescriptor {
            name: field.name.clone(),
            alias: field.alias.clone(),
            shape: item.shape,
            ty: item.ty.clone(),
            sub_fields: item.sub_fields.clone(),
            info: EntityInfo {
                location: Location::Element,
                ..info.clone()
            },
        };

        let inner = build_field_serializer(
            model,
            &item_field,
            &Context {
                parent_ns: ns,
                parent_nsmap: nsmap,
                parent_is_root: false,
            },
        )?;

        // The item serializer owns the tag it writes, including any namespace
        // taken from an item model.
        let element_name = inner.element_name().map(str::to_owned).ok_or_else(|| {
            ModelFieldError::new(
                &model.name,
                &field.name,
                "collection items must be written as elements",
            )
        })?;

        Ok(Self {
            element_name,
            inner: Box::new(inner),
        })
    }

    /// Resolved item tag in Clark notation.
    pub fn element_name(&self) -> &str {
        &self.element_name
    }

    pub fn serialize<'a>(
        &self,
        element: &'a mut XmlElement,
        value: &Value,
        encoder: &dyn XmlEncoder,
        skip_empty: bool,
    ) -> &'a mut XmlElement {
        let Some(items) = collection_items(value) else {
            return element;
        };
        if skip_empty && items.is_empty() {
            return element;
        }

        for item in items {
            if skip_empty && item.is_null() {
                continue;
            }
            self.inner.serialize(element, item, encoder, skip_empty);
        }
        element
    }

    /// Collects items until the inner serializer finds no further matching
    /// child. Returns `None` rather than an empty array when no item is found.
    pub fn deserialize(&self, element: Option<&mut XmlElement>) -> Option<Value> {
        let element = element?;

        let mut result = Vec::new();
        while let Some(value) = self.inner.deserialize(Some(&mut *element)) {
            result.push(value);
        }

        if result.is_empty() {
            tracing::trace!(element = %self.element_name, "No collection items found");
            None
        } else {
            Some(Value::Array(result))
        }
    }
}

fn ensure_scalar_items(
    model: &ModelDescriptor,
    field: &FieldDescriptor,
) -> Result<(), ModelFieldError> {
    match field.ty {
        FieldType::Scalar => Ok(()),
        FieldType::Model(_) | FieldType::Tuple => Err(ModelFieldError::new(
            &model.name,
            &field.name,
            "Inline list value should be of scalar type",
        )),
    }
}

/// Items of a collection value. Null is an absent collection; a scalar is
/// treated as a single item.
fn collection_items(value: &Value) -> Option<&[Value]> {
    match value {
        Value::Null => None,
        Value::Array(items) => Some(items),
        other => Some(std::slice::from_ref(other)),
    }
}

/// Space joined encoded items, or `None` when nothing should be written.
fn join_items(value: &Value, encoder: &dyn XmlEncoder, skip_empty: bool) -> Option<String> {
    let items = collection_items(value)?;
    if skip_empty && items.is_empty() {
        return None;
    }
    Some(
        items
            .iter()
            .map(|item| encoder.encode(item))
            .collect::<Vec<_>>()
            .join(" "),
    )
}

fn split_items(text: &str) -> Value {
    Value::Array(
        text.split_whitespace()
            .map(|item| Value::String(item.to_string()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::DefaultEncoder;
    use crate::qname::NsMap;
    use serde_json::json;

    fn model() -> ModelDescriptor {
        ModelDescriptor::new("Model")
    }

    fn list(name: &str) -> FieldDescriptor {
        FieldDescriptor::list(name, FieldDescriptor::scalar(name))
    }

    fn build(field: &FieldDescriptor, location: Location) -> HomogeneousSerializer {
        let model = model();
        HomogeneousSerializer::build(&model, field, location, &Context::for_model(&model)).unwrap()
    }

    #[test]
    fn test_text_round_trip() {
        let serializer = build(&list("values"), Location::Missing);
        let mut element = XmlElement::new("Model");

        serializer.serialize(&mut element, &json!(["a", "b", "c"]), &DefaultEncoder, false);
        assert_eq!(element.text(), Some("a b c"));
        assert_eq!(
            serializer.deserialize(Some(&mut element)),
            Some(json!(["a", "b", "c"]))
        );
        assert_eq!(element.text(), None);
    }

    #[test]
    fn test_text_overwrites_existing_text() {
        let serializer = build(&list("values"), Location::Missing);
        let mut element = XmlElement::new("Model");
        element.set_text("old");

        serializer.serialize(&mut element, &json!([1, 2.5, true]), &DefaultEncoder, false);
        assert_eq!(element.text(), Some("1 2.5 true"));
    }

    #[test]
    fn test_text_whitespace_runs() {
        let serializer = build(&list("values"), Location::Missing);
        let mut element = XmlElement::new("Model");
        element.set_text("  a   b\tc\n ");

        assert_eq!(
            serializer.deserialize(Some(&mut element)),
            Some(json!(["a", "b", "c"]))
        );
    }

    #[test]
    fn test_text_empty_vs_absent() {
        let serializer = build(&list("values"), Location::Missing);
        let mut element = XmlElement::new("Model");

        assert_eq!(serializer.deserialize(Some(&mut element)), Some(json!([])));
        assert_eq!(serializer.deserialize(None), None);
    }

    #[test]
    fn test_text_skip_empty() {
        let serializer = build(&list("values"), Location::Missing);
        let mut element = XmlElement::new("Model");
        element.set_text("keep");
        let before = element.clone();

        serializer.serialize(&mut element, &json!([]), &DefaultEncoder, true);
        assert_eq!(element, before);

        serializer.serialize(&mut element, &Value::Null, &DefaultEncoder, false);
        assert_eq!(element, before);

        serializer.serialize(&mut element, &json!([]), &DefaultEncoder, false);
        assert_eq!(element.text(), Some(""));
    }

    #[test]
    fn test_attribute_round_trip() {
        let serializer = build(&list("values"), Location::Attribute);
        let mut element = XmlElement::new("Model");

        serializer.serialize(&mut element, &json!(["x", "y"]), &DefaultEncoder, false);
        assert_eq!(element.attribute("values"), Some("x y"));
        assert_eq!(
            serializer.deserialize(Some(&mut element)),
            Some(json!(["x", "y"]))
        );
        assert_eq!(element.attribute("values"), None);
    }

    #[test]
    fn test_attribute_whitespace_and_emptiness() {
        let serializer = build(&list("values"), Location::Attribute);
        let mut element = XmlElement::new("Model");

        assert_eq!(serializer.deserialize(Some(&mut element)), Some(json!([])));
        assert_eq!(serializer.deserialize(None), None);

        element.set_attribute("values", "a   b\tc");
        assert_eq!(
            serializer.deserialize(Some(&mut element)),
            Some(json!(["a", "b", "c"]))
        );
    }

    #[test]
    fn test_attribute_skip_empty() {
        let serializer = build(&list("values"), Location::Attribute);
        let mut element = XmlElement::new("Model");
        let before = element.clone();

        serializer.serialize(&mut element, &json!([]), &DefaultEncoder, true);
        assert_eq!(element, before);
    }

    #[test]
    fn test_attribute_uses_field_name_and_namespace() {
        let nsmap: NsMap = [("tst".to_string(), "http://test".to_string())].into();
        let field = list("values").alias("Values").ns("tst").nsmap(nsmap);
        let HomogeneousSerializer::Attribute(serializer) = build(&field, Location::Attribute) else {
            panic!("expected attribute serializer");
        };
        assert_eq!(serializer.attr_name(), "{http://test}values");
    }

    #[test]
    fn test_attribute_ignores_tag_override() {
        let field = list("values").tag("v");
        let HomogeneousSerializer::Attribute(serializer) = build(&field, Location::Attribute) else {
            panic!("expected attribute serializer");
        };
        assert_eq!(serializer.attr_name(), "values");

        let mut element = XmlElement::new("Model");
        serializer.serialize(&mut element, &json!(["a"]), &DefaultEncoder, false);
        assert_eq!(element.attribute("values"), Some("a"));
        assert_eq!(element.attribute("v"), None);
    }

    #[test]
    fn test_attribute_resolves_prefix_from_parent_nsmap() {
        // Prefixes declared on the enclosing model are visible to the
        // attribute, not only those in the field's own map. Lookup against
        // the field map alone would drop `tst` and leave the name unqualified.
        let nsmap: NsMap = [
            ("".to_string(), "http://default".to_string()),
            ("tst".to_string(), "http://test".to_string()),
        ]
        .into();
        let model = ModelDescriptor::new("Model").nsmap(nsmap);
        let ctx = Context::for_model(&model);

        let field = list("values").ns("tst");
        let serializer = AttributeSerializer::build(&model, &field, &ctx).unwrap();
        assert_eq!(serializer.attr_name(), "{http://test}values");

        let field = list("values");
        let serializer = AttributeSerializer::build(&model, &field, &ctx).unwrap();
        assert_eq!(serializer.attr_name(), "values");

        let field = list("values").ns("missing");
        let err = AttributeSerializer::build(&model, &field, &ctx).unwrap_err();
        assert_eq!(err.message, "namespace prefix 'missing' is not declared");
    }

    #[test]
    fn test_element_round_trip_preserves_order() {
        let serializer = build(&list("value"), Location::Element);
        let mut element = XmlElement::new("Model");

        serializer.serialize(&mut element, &json!(["x", "y", "z"]), &DefaultEncoder, false);
        let texts: Vec<_> = element.children().map(|c| c.text().unwrap()).collect();
        assert_eq!(texts, ["x", "y", "z"]);
        assert!(element.children().all(|c| c.tag() == "value"));

        assert_eq!(
            serializer.deserialize(Some(&mut element)),
            Some(json!(["x", "y", "z"]))
        );
        assert!(element.is_empty());
    }

    #[test]
    fn test_element_absent_vs_missing_items() {
        let serializer = build(&list("value"), Location::Element);
        let mut element = XmlElement::new("Model");

        assert_eq!(serializer.deserialize(Some(&mut element)), None);
        assert_eq!(serializer.deserialize(None), None);
    }

    #[test]
    fn test_element_skip_empty_items() {
        let serializer = build(&list("value"), Location::Element);
        let mut element = XmlElement::new("Model");
        let before = element.clone();

        serializer.serialize(&mut element, &json!([]), &DefaultEncoder, true);
        assert_eq!(element, before);

        serializer.serialize(&mut element, &json!(["a", null, "b"]), &DefaultEncoder, true);
        assert_eq!(element.children().count(), 2);

        let mut element = XmlElement::new("Model");
        serializer.serialize(&mut element, &json!(["a", null, "b"]), &DefaultEncoder, false);
        assert_eq!(element.children().count(), 3);
        assert_eq!(
            serializer.deserialize(Some(&mut element)),
            Some(json!(["a", null, "b"]))
        );
    }

    #[test]
    fn test_element_stops_at_first_non_matching_child() {
        // Decoding reads a contiguous run of matching siblings; a later
        // matching sibling after a foreign element is left in place.
        let serializer = build(&list("value"), Location::Element);
        let mut element = XmlElement::new("Model");
        for tag in ["value", "value", "other", "value"] {
            let child = element.append_child(XmlElement::new(tag));
            child.set_text(tag);
        }

        assert_eq!(
            serializer.deserialize(Some(&mut element)),
            Some(json!(["value", "value"]))
        );
        let remaining: Vec<_> = element.children().map(|c| c.tag()).collect();
        assert_eq!(remaining, ["other", "value"]);
    }

    #[test]
    fn test_element_inherits_parent_namespace() {
        let nsmap: NsMap = [("tst".to_string(), "http://test".to_string())].into();
        let model = ModelDescriptor::new("Model").ns("tst").nsmap(nsmap);
        let field = list("value").alias("item");
        let serializer =
            HomogeneousSerializer::build(&model, &field, Location::Element, &Context::for_model(&model))
                .unwrap();
        let HomogeneousSerializer::Element(serializer) = serializer else {
            panic!("expected element serializer");
        };
        assert_eq!(serializer.element_name(), "{http://test}item");

        let mut element = XmlElement::new("Model");
        serializer.serialize(&mut element, &json!([1, 2]), &DefaultEncoder, false);
        assert!(element.children().all(|c| c.tag() == "{http://test}item"));
    }

    #[test]
    fn test_element_field_nsmap_wins_over_parent() {
        let parent: NsMap = [("p".to_string(), "http://parent".to_string())].into();
        let own: NsMap = [("p".to_string(), "http://field".to_string())].into();
        let model = ModelDescriptor::new("Model").nsmap(parent);
        let field = list("value").ns("p").nsmap(own);
        let HomogeneousSerializer::Element(serializer) =
            HomogeneousSerializer::build(&model, &field, Location::Element, &Context::for_model(&model))
                .unwrap()
        else {
            panic!("expected element serializer");
        };
        assert_eq!(serializer.element_name(), "{http://field}value");
    }

    #[test]
    fn test_element_model_items() {
        let item = ModelDescriptor::new("Item")
            .field(FieldDescriptor::scalar("id").attribute())
            .into_arc();
        let field = FieldDescriptor::list("item", FieldDescriptor::model("item", item));
        let serializer = build(&field, Location::Element);

        let mut element = XmlElement::new("Model");
        serializer.serialize(
            &mut element,
            &json!([{"id": "1"}, {"id": "2"}]),
            &DefaultEncoder,
            false,
        );
        assert_eq!(element.children().count(), 2);
        assert_eq!(
            serializer.deserialize(Some(&mut element)),
            Some(json!([{"id": "1"}, {"id": "2"}]))
        );
    }

    #[test]
    fn test_element_name_matches_namespaced_item_model() {
        let nsmap: NsMap = [("p".to_string(), "http://p".to_string())].into();
        let item = ModelDescriptor::new("Item")
            .ns("p")
            .nsmap(nsmap)
            .field(FieldDescriptor::scalar("id").attribute())
            .into_arc();
        let field = FieldDescriptor::list("item", FieldDescriptor::model("item", item));
        let HomogeneousSerializer::Element(serializer) = build(&field, Location::Element) else {
            panic!("expected element serializer");
        };
        assert_eq!(serializer.element_name(), "{http://p}item");

        let mut element = XmlElement::new("Model");
        serializer.serialize(&mut element, &json!([{"id": "1"}]), &DefaultEncoder, false);
        let tags: Vec<_> = element.children().map(|c| c.tag()).collect();
        assert_eq!(tags, [serializer.element_name()]);
        assert_eq!(
            serializer.deserialize(Some(&mut element)),
            Some(json!([{"id": "1"}]))
        );
    }

    #[test]
    fn test_rejects_nested_collections() {
        let model = model();
        let field = FieldDescriptor::list("values", list("values"));
        for location in [Location::Element, Location::Attribute, Location::Missing] {
            let err = HomogeneousSerializer::build(&model, &field, location, &Context::default())
                .unwrap_err();
            assert_eq!(err.model, "Model");
            assert_eq!(err.field, "values");
            assert_eq!(err.message, "collection elements can't be of collection type");
        }

        let tuple = FieldDescriptor::tuple(
            "pairs",
            vec![FieldDescriptor::scalar("a"), FieldDescriptor::scalar("b")],
        );
        let field = FieldDescriptor::list("pairs", tuple);
        let err = HomogeneousSerializer::build(&model, &field, Location::Element, &Context::default())
            .unwrap_err();
        assert_eq!(err.message, "collection elements can't be of collection type");
    }

    #[test]
    fn test_rejects_model_items_inline() {
        let model = model();
        let item = ModelDescriptor::new("Item").into_arc();
        let field = FieldDescriptor::list("items", FieldDescriptor::model("items", item));

        for location in [Location::Missing, Location::Attribute] {
            let err = HomogeneousSerializer::build(&model, &field, location, &Context::default())
                .unwrap_err();
            assert_eq!(err.message, "Inline list value should be of scalar type");
        }
        assert!(
            HomogeneousSerializer::build(&model, &field, Location::Element, &Context::default())
                .is_ok()
        );
    }

    #[test]
    fn test_rejects_root_model_text_collection() {
        let field = list("root");
        let model = ModelDescriptor::root("Values", field.clone());
        let err = HomogeneousSerializer::build(&model, &field, Location::Missing, &Context::default())
            .unwrap_err();
        assert_eq!(err.model, "Values");
        assert_eq!(err.message, "root model collections should be marked as elements");

        assert!(
            HomogeneousSerializer::build(&model, &field, Location::Element, &Context::default())
                .is_ok()
        );
    }

    #[test]
    #[should_panic(expected = "unexpected subfields number")]
    fn test_requires_single_item_descriptor() {
        let model = model();
        let mut field = list("values");
        field.sub_fields.clear();
        let _ = HomogeneousSerializer::build(&model, &field, Location::Element, &Context::default());
    }
}
