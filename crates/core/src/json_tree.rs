// ABOUTME: Converts JSON documents into element trees so metadata lookups can treat them like markup.
// ABOUTME: Object keys become child elements, arrays repeat the key name, nulls follow NullBehavior.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dom::{Element, Node};

/// What to do with JSON `null` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullBehavior {
    /// Drop the element entirely.
    Ignore,
    /// Keep an empty element marked with `isNull="true"`.
    Report,
    /// Keep an empty element.
    #[default]
    Empty,
}

/// Parses `json` and converts it into an element named `root_name`.
pub fn to_tree(
    json: &str,
    root_name: &str,
    nulls: NullBehavior,
) -> Result<Element, serde_json::Error> {
    let value: Value = serde_json::from_str(json)?;
    Ok(value_to_tree(&value, root_name, nulls))
}

/// Converts `value` into an element named `root_name`.
pub fn value_to_tree(value: &Value, root_name: &str, nulls: NullBehavior) -> Element {
    let mut root = Element::new(root_name);
    append_value_into(&mut root, value, nulls);
    root
}

/// Appends the JSON `value` under `parent`, as if `parent` were the value's own element.
pub fn append_value_into(parent: &mut Element, value: &Value, nulls: NullBehavior) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                append_named(parent, key, child, nulls);
            }
        }
        Value::Array(items) => {
            let name = parent.name.clone();
            append_array(parent, &name, items, nulls);
        }
        scalar => {
            if let Some(text) = scalar_text(scalar) {
                parent.children.push(Node::Text(text));
            }
        }
    }
}

fn append_named(parent: &mut Element, name: &str, value: &Value, nulls: NullBehavior) {
    match value {
        Value::Array(items) => append_array(parent, name, items, nulls),
        Value::Null => append_null(parent, name, nulls),
        other => {
            let mut child = Element::new(name);
            append_value_into(&mut child, other, nulls);
            parent.children.push(Node::Element(child));
        }
    }
}

fn append_array(parent: &mut Element, name: &str, items: &[Value], nulls: NullBehavior) {
    for item in items {
        match item {
            Value::Null => append_null(parent, name, nulls),
            Value::Array(nested) => {
                let mut child = Element::new(name);
                append_array(&mut child, name, nested, nulls);
                parent.children.push(Node::Element(child));
            }
            other => {
                let mut child = Element::new(name);
                append_value_into(&mut child, other, nulls);
                parent.children.push(Node::Element(child));
            }
        }
    }
}

fn append_null(parent: &mut Element, name: &str, nulls: NullBehavior) {
    match nulls {
        NullBehavior::Ignore => {}
        NullBehavior::Report => parent
            .children
            .push(Node::Element(Element::new(name).with_attr("isNull", "true"))),
        NullBehavior::Empty => parent.children.push(Node::Element(Element::new(name))),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Bool(b) => Some(if *b { "true" } else { "false" }.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}
