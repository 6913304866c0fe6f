use crate::detect::vocabulary::{
    CLICKABLE_CLASS_HINTS, FORM_KEYWORDS, INTERACTIVE_ROLES, NON_DATA_INPUT_TYPES, contains_any,
};
use crate::dom::{Document, NodeId};

/// Longest text content searched for form keywords. Containers with more
/// text than this are layout, not controls.
const KEYWORD_TEXT_LIMIT: usize = 200;

/// Whether an element is a legal autofill target. Never fails: anything
/// that cannot be inspected is simply not fillable.
pub fn is_fillable(doc: &Document, node: NodeId) -> bool {
    let Some(tag) = doc.tag(node) else {
        return false;
    };

    if is_disabled(doc, node) || !doc.is_rendered(node) {
        return false;
    }

    if is_native_control(tag) {
        if tag == "input" {
            let input_type = doc.attr(node, "type").unwrap_or("text").to_lowercase();
            return !NON_DATA_INPUT_TYPES.contains(&input_type.as_str());
        }
        return true;
    }

    has_interactive_signal(doc, node)
}

pub fn is_native_control(tag: &str) -> bool {
    matches!(tag, "input" | "select" | "textarea")
}

/// Native `disabled`/`readonly`, or their ARIA counterparts.
pub fn is_disabled(doc: &Document, node: NodeId) -> bool {
    doc.has_attr(node, "disabled")
        || doc.has_attr(node, "readonly")
        || doc.attr(node, "aria-disabled") == Some("true")
        || doc.attr(node, "aria-readonly") == Some("true")
}

pub fn is_content_editable(doc: &Document, node: NodeId) -> bool {
    doc.attr(node, "contenteditable")
        .is_some_and(|v| !v.eq_ignore_ascii_case("false"))
}

/// A custom element needs at least one positive sign of being a control.
fn has_interactive_signal(doc: &Document, node: NodeId) -> bool {
    if doc
        .attr(node, "role")
        .is_some_and(|r| INTERACTIVE_ROLES.contains(&r))
    {
        return true;
    }

    if is_content_editable(doc, node) {
        return true;
    }

    let class = doc.class_name(node).to_lowercase();
    if contains_any(&class, CLICKABLE_CLASS_HINTS) {
        return true;
    }

    let aria = doc.attr(node, "aria-label").unwrap_or("").to_lowercase();
    let text = doc.text_content(node);
    let text = if text.len() <= KEYWORD_TEXT_LIMIT {
        text.to_lowercase()
    } else {
        String::new()
    };

    [class.as_str(), aria.as_str(), text.as_str()]
        .iter()
        .any(|haystack| contains_any(haystack, FORM_KEYWORDS))
}
