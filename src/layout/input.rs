//! Input tree definitions.
//!
//! The input tree is what an external markup parser produces: tag names,
//! attributes and ordered children for arbitrary markup. It derives Serde
//! traits so a pre-parsed document can be loaded from JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single attribute on an element.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Attribute {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A node of the generic input tree.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum InputNode {
    Element {
        tag: String,
        #[serde(default)]
        attrs: Vec<Attribute>,
        #[serde(default)]
        children: Vec<InputNode>,
    },
    Text {
        value: String,
    },
    Comment {
        value: String,
    },
    Doctype {
        #[serde(default = "default_doctype")]
        name: String,
    },
}

fn default_doctype() -> String {
    "html".to_string()
}

impl InputNode {
    /// Build an element node.
    pub fn element(tag: &str, attrs: &[(&str, &str)], children: Vec<InputNode>) -> Self {
        InputNode::Element {
            tag: tag.to_string(),
            attrs: attrs.iter().map(|(n, v)| Attribute::new(*n, *v)).collect(),
            children,
        }
    }

    /// Build a text node.
    pub fn text(value: &str) -> Self {
        InputNode::Text {
            value: value.to_string(),
        }
    }

    /// Lower-cased tag name for elements.
    pub fn tag(&self) -> Option<String> {
        match self {
            InputNode::Element { tag, .. } => Some(tag.to_ascii_lowercase()),
            _ => None,
        }
    }

    /// Look up an attribute value by case-insensitive name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            InputNode::Element { attrs, .. } => attrs
                .iter()
                .find(|a| a.name.eq_ignore_ascii_case(name))
                .map(|a| a.value.as_str()),
            _ => None,
        }
    }

    pub fn children(&self) -> &[InputNode] {
        match self {
            InputNode::Element { children, .. } => children,
            _ => &[],
        }
    }

    /// Whitespace-only text, which routing levels ignore.
    pub fn is_blank_text(&self) -> bool {
        matches!(self, InputNode::Text { value } if value.trim().is_empty())
    }
}

/// Values bound by name from the layout markup.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LayoutData {
    /// Prop values referenced by `props="a,b"` attributes.
    pub props: BTreeMap<String, serde_json::Value>,
    /// Loader markup referenced by `loader="name"`.
    pub loaders: BTreeMap<String, Vec<InputNode>>,
    /// Error display markup referenced by `error="name"`.
    pub errors: BTreeMap<String, Vec<InputNode>>,
}

impl LayoutData {
    /// Merge the JSON data island written by the server renderer.
    ///
    /// Props already present are kept; the island only fills in the
    /// values the server had to fetch.
    pub fn merge_island(&mut self, island: &str) -> Result<(), serde_json::Error> {
        #[derive(Deserialize)]
        struct Island {
            #[serde(default)]
            props: BTreeMap<String, serde_json::Value>,
        }

        let island: Island = serde_json::from_str(island)?;
        for (name, value) in island.props {
            self.props.entry(name).or_insert(value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_document() {
        let json = r#"{"kind":"element","tag":"div","attrs":[{"name":"class","value":"x"}],
            "children":[{"kind":"text","value":"hi"},{"kind":"doctype"}]}"#;
        let node: InputNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.tag().as_deref(), Some("div"));
        assert_eq!(node.attr("CLASS"), Some("x"));
        assert_eq!(node.children().len(), 2);
        assert_eq!(
            node.children()[1],
            InputNode::Doctype {
                name: "html".into()
            }
        );
    }

    #[test]
    fn test_merge_island_keeps_existing() {
        let mut data = LayoutData::default();
        data.props.insert("user".into(), serde_json::json!("local"));
        data.merge_island(r#"{"props":{"user":"server","theme":"dark"}}"#)
            .unwrap();
        assert_eq!(data.props["user"], "local");
        assert_eq!(data.props["theme"], "dark");
    }
}
