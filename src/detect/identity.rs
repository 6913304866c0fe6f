use sha1::{Digest, Sha1};

use crate::detect::field_model::FieldType;
use crate::dom::document::collapse_whitespace;
use crate::dom::{Document, NodeId};

pub const UNNAMED_FIELD: &str = "Unnamed Field";

/// Longest normalized label accepted as a field name.
const MAX_NAME_FROM_LABEL: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub id: String,
    pub label: String,
}

/// Where a label came from, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSource {
    ForAttribute,
    WrappingLabel,
    Placeholder,
    AriaLabel,
    Title,
    PrecedingText,
    ParentText,
    HumanizedName,
    Fallback,
}

impl LabelSource {
    /// Whether the label was read off the page rather than made up.
    pub fn is_page_text(&self) -> bool {
        !matches!(self, LabelSource::HumanizedName | LabelSource::Fallback)
    }
}

/// Resolve name, id and label of a control. `ordinal` is the control's
/// position among same-tag elements of the scanning scope.
pub fn resolve_identity(
    doc: &Document,
    node: NodeId,
    field_type: FieldType,
    ordinal: usize,
    max_parent_text: usize,
) -> Identity {
    let (label, source) = extract_label(doc, node, max_parent_text);
    let name = resolve_name(doc, node, field_type, ordinal, &label, source);
    let id = resolve_id(doc, node);

    Identity { name, id, label }
}

fn non_empty_attr<'a>(doc: &'a Document, node: NodeId, attr: &str) -> Option<&'a str> {
    doc.attr(node, attr).map(str::trim).filter(|v| !v.is_empty())
}

fn resolve_name(
    doc: &Document,
    node: NodeId,
    field_type: FieldType,
    ordinal: usize,
    label: &str,
    source: LabelSource,
) -> String {
    if let Some(name) = non_empty_attr(doc, node, "name") {
        return name.to_string();
    }
    if let Some(id) = non_empty_attr(doc, node, "id") {
        return id.to_string();
    }

    if source.is_page_text() {
        let normalized = normalize_label(label);
        if is_meaningful_name(&normalized) {
            return normalized;
        }
    }

    if let Some(data_name) =
        non_empty_attr(doc, node, "data-name").or_else(|| non_empty_attr(doc, node, "data-field"))
    {
        return data_name.to_string();
    }

    format!("{}_field_{}", field_type, ordinal)
}

fn is_meaningful_name(normalized: &str) -> bool {
    !normalized.is_empty()
        && normalized.len() <= MAX_NAME_FROM_LABEL
        && normalized.chars().any(|c| c.is_alphabetic())
}

fn resolve_id(doc: &Document, node: NodeId) -> String {
    non_empty_attr(doc, node, "id")
        .or_else(|| non_empty_attr(doc, node, "name"))
        .map(str::to_string)
        .unwrap_or_else(|| element_token(doc, node))
}

/// Token derived from the element's tree position. Only unique within one
/// snapshot of the page.
pub fn element_token(doc: &Document, node: NodeId) -> String {
    let mut path = Vec::new();
    let mut current = node;
    while let Some(parent) = doc.parent(current) {
        let index = doc
            .children(parent)
            .iter()
            .position(|c| *c == current)
            .unwrap_or(0);
        path.push(format!("{}{}", doc.tag(current).unwrap_or("#"), index));
        current = parent;
    }
    path.reverse();

    let mut hasher = Sha1::new();
    hasher.update(path.join("/").as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("field_{}", &digest[..10])
}

// ============================================================================
// Labels
// ============================================================================

/// Human-readable label of a control and where it was found.
pub fn extract_label(doc: &Document, node: NodeId, max_parent_text: usize) -> (String, LabelSource) {
    let own_text = clean_text(&doc.text_content(node));

    if let Some(id) = non_empty_attr(doc, node, "id") {
        let explicit = doc
            .descendants(doc.body())
            .into_iter()
            .filter(|n| doc.tag(*n) == Some("label") && doc.attr(*n, "for") == Some(id))
            .map(|n| clean_text(&doc.text_content(n)))
            .find(|t| !t.is_empty());
        if let Some(text) = explicit {
            return (text, LabelSource::ForAttribute);
        }
    }

    if let Some(label) = doc
        .ancestors(node)
        .into_iter()
        .find(|n| doc.tag(*n) == Some("label"))
    {
        let full = clean_text(&doc.text_content(label));
        let text = if own_text.is_empty() {
            full
        } else {
            clean_text(&full.replacen(&own_text, "", 1))
        };
        if !text.is_empty() {
            return (text, LabelSource::WrappingLabel);
        }
    }

    let attribute_sources = [
        ("placeholder", LabelSource::Placeholder),
        ("aria-label", LabelSource::AriaLabel),
        ("title", LabelSource::Title),
    ];
    for (attr, source) in attribute_sources {
        if let Some(text) = doc.attr(node, attr).map(clean_text).filter(|t| !t.is_empty()) {
            return (text, source);
        }
    }

    let preceding = doc
        .previous_siblings(node)
        .into_iter()
        .filter(|s| !matches!(doc.tag(*s), Some("select" | "script" | "style")))
        .map(|s| clean_text(&doc.text_content(s)))
        .find(|t| !t.is_empty());
    if let Some(text) = preceding {
        return (text, LabelSource::PrecedingText);
    }

    if let Some(parent) = doc.parent(node) {
        let text = clean_text(&doc.text_content(parent));
        if !text.is_empty() && text.chars().count() < max_parent_text {
            return (text, LabelSource::ParentText);
        }
    }

    let raw_name = non_empty_attr(doc, node, "name").or_else(|| non_empty_attr(doc, node, "id"));
    if let Some(name) = raw_name {
        let text = humanize(name);
        if !text.is_empty() {
            return (text, LabelSource::HumanizedName);
        }
    }

    (UNNAMED_FIELD.to_string(), LabelSource::Fallback)
}

/// Collapse whitespace and strip trailing `:` and `*` markers.
pub fn clean_text(text: &str) -> String {
    let collapsed = collapse_whitespace(text);
    collapsed
        .trim_end_matches(|c: char| c == ':' || c == '*' || c.is_whitespace())
        .to_string()
}

/// `"First Name:"` becomes `"first_name"`.
pub fn normalize_label(label: &str) -> String {
    let mut out = String::new();
    for c in label.to_lowercase().chars() {
        if c.is_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

/// `"billing_firstName"` becomes `"Billing First Name"`.
pub fn humanize(name: &str) -> String {
    let mut spaced = String::new();
    let mut prev_lower = false;
    for c in name.chars() {
        if c == '_' || c == '-' || c == '.' || c == '[' || c == ']' {
            spaced.push(' ');
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower {
            spaced.push(' ');
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        spaced.push(c);
    }

    spaced
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
