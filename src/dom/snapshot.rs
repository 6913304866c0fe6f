use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::dom::document::{Document, Element, NodeId, Style};
use crate::dom::geometry::{Rect, Viewport};
use crate::error::EngineError;

// ============================================================================
// Serialized page description handed over by a host
// ============================================================================

/// JSON description of a page: `{ "viewport": {...}, "body": {...} }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSnapshot {
    #[serde(default)]
    pub viewport: Viewport,
    pub body: ElementSnapshot,
}

/// A node is either an element object or `{ "text": "..." }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeSnapshot {
    Element(ElementSnapshot),
    Text { text: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElementSnapshot {
    #[serde(default = "default_tag")]
    pub tag: String,
    #[serde(default)]
    pub attrs: HashMap<String, String>,
    #[serde(default)]
    pub style: Style,
    #[serde(default)]
    pub rect: Rect,
    /// Current value; defaults to the `value` attribute for inputs.
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub checked: Option<bool>,
    #[serde(default)]
    pub selected: Option<bool>,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub children: Vec<NodeSnapshot>,
}

fn default_tag() -> String {
    "div".to_string()
}

impl ElementSnapshot {
    fn to_element(&self, tag_override: Option<&str>) -> Element {
        let mut element = Element::new(tag_override.unwrap_or(&self.tag));
        element.attributes = self
            .attrs
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.clone()))
            .collect();
        element.style = self.style.clone();
        element.rect = self.rect;
        element.locked = self.locked;
        element.value = self
            .value
            .clone()
            .or_else(|| match element.tag.as_str() {
                "input" | "textarea" => element.attributes.get("value").cloned(),
                _ => None,
            })
            .unwrap_or_default();
        element.checked = self
            .checked
            .unwrap_or_else(|| element.attributes.contains_key("checked"));
        element.selected = self
            .selected
            .unwrap_or_else(|| element.attributes.contains_key("selected"));
        element
    }
}

// ============================================================================
// Loading
// ============================================================================

impl Document {
    /// Build a document from a snapshot. The snapshot's root always becomes
    /// `<body>` regardless of its declared tag.
    pub fn from_snapshot(snapshot: &PageSnapshot) -> Document {
        let mut doc = Document::new();
        doc.set_viewport(snapshot.viewport);

        let body = doc.body();
        let root = snapshot.body.to_element(Some("body"));
        for (name, value) in &root.attributes {
            // body is a live element, so these writes cannot fail
            let _ = doc.set_attribute(body, name, value);
        }
        let _ = doc.set_style(body, root.style.clone());
        let _ = doc.set_rect(body, root.rect);

        for child in &snapshot.body.children {
            build_node(&mut doc, body, child);
        }
        doc
    }

    pub fn from_json(json: &str) -> Result<Document, EngineError> {
        let snapshot: PageSnapshot = serde_json::from_str(json)?;
        Ok(Document::from_snapshot(&snapshot))
    }

    pub fn from_value(value: serde_json::Value) -> Result<Document, EngineError> {
        let snapshot: PageSnapshot = serde_json::from_value(value)?;
        Ok(Document::from_snapshot(&snapshot))
    }
}

fn build_node(doc: &mut Document, parent: NodeId, snapshot: &NodeSnapshot) {
    let id = match snapshot {
        NodeSnapshot::Text { text } => doc.create_text(text),
        NodeSnapshot::Element(el) => {
            let id = doc.create_element_with(el.to_element(None));
            for child in &el.children {
                build_node(doc, id, child);
            }
            id
        }
    };
    // both handles were just created, so appending cannot fail
    let _ = doc.append_child(parent, id);
}
