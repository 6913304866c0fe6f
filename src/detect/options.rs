use std::collections::HashSet;

use crate::detect::field_model::FieldType;
use crate::detect::identity::clean_text;
use crate::detect::vocabulary::{dictionary_for, is_placeholder_option};
use crate::dom::{Document, NodeId};

/// Closed value set of a choice field, deduplicated in page order. Empty for
/// free-text fields.
pub fn extract_options(
    doc: &Document,
    node: NodeId,
    field_type: FieldType,
    scope: NodeId,
) -> Vec<String> {
    match field_type {
        FieldType::Select if doc.tag(node) == Some("select") => select_options(doc, node),
        FieldType::Select => custom_dropdown_options(doc, node),
        FieldType::Radio | FieldType::Checkbox => group_options(doc, node, field_type, scope),
        _ => vec![],
    }
}

fn dedup_preserving_order(values: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

// ============================================================================
// Native controls
// ============================================================================

fn select_options(doc: &Document, select: NodeId) -> Vec<String> {
    let values = doc.options(select).into_iter().filter_map(|option| {
        let value = doc.option_value(option);
        let text = clean_text(&doc.text_content(option));
        if value.trim().is_empty() || is_placeholder_option(&text) || is_placeholder_option(&value)
        {
            None
        } else {
            Some(value)
        }
    });
    dedup_preserving_order(values)
}

/// Controls sharing `node`'s name and input type. Radios look inside the
/// nearest `radiogroup` first. A nameless control is a group of one.
pub fn group_members(
    doc: &Document,
    node: NodeId,
    field_type: FieldType,
    scope: NodeId,
) -> Vec<NodeId> {
    let Some(name) = doc.attr(node, "name").filter(|n| !n.is_empty()) else {
        return vec![node];
    };

    let group_scope = if field_type == FieldType::Radio {
        doc.ancestors(node)
            .into_iter()
            .take_while(|a| *a != scope)
            .find(|a| doc.attr(*a, "role") == Some("radiogroup"))
            .unwrap_or(scope)
    } else {
        scope
    };

    let members: Vec<NodeId> = doc
        .descendants(group_scope)
        .into_iter()
        .filter(|n| {
            doc.tag(*n) == Some("input")
                && doc.attr(*n, "name") == Some(name)
                && doc
                    .attr(*n, "type")
                    .is_some_and(|t| t.eq_ignore_ascii_case(field_type.as_str()))
        })
        .collect();

    if members.is_empty() { vec![node] } else { members }
}

/// Value a group member contributes: its `value` or its `aria-label`.
/// Whether a checkbox shares its name with other checkboxes under `scope`.
/// Decided by the controls on the page, not by how many of them carry values.
pub fn is_checkbox_group(doc: &Document, node: NodeId, scope: NodeId) -> bool {
    group_members(doc, node, FieldType::Checkbox, scope).len() > 1
}

pub fn member_value(doc: &Document, member: NodeId) -> Option<String> {
    doc.attr(member, "value")
        .or_else(|| doc.attr(member, "aria-label"))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn group_options(doc: &Document, node: NodeId, field_type: FieldType, scope: NodeId) -> Vec<String> {
    let values = group_members(doc, node, field_type, scope)
        .into_iter()
        .filter_map(|m| member_value(doc, m));
    dedup_preserving_order(values)
}

// ============================================================================
// Custom dropdowns
// ============================================================================

const LIST_CLASS_HINTS: &[&str] = &["menu", "options", "listbox", "dropdown-list", "dropdown-content"];
const SIBLING_CLASS_HINTS: &[&str] = &["dropdown", "menu", "options", "list"];

/// Options of a widget that only looks like a select. Sources are tried in
/// order and the first one that yields values wins.
fn custom_dropdown_options(doc: &Document, node: NodeId) -> Vec<String> {
    let sources: [fn(&Document, NodeId) -> Vec<String>; 5] = [
        controlled_list_options,
        nearby_list_options,
        sibling_dropdown_options,
        data_attribute_options,
        dictionary_options,
    ];

    for source in sources {
        let values = filter_candidates(source(doc, node));
        if !values.is_empty() {
            return values;
        }
    }
    vec![]
}

fn filter_candidates(values: Vec<String>) -> Vec<String> {
    dedup_preserving_order(
        values
            .into_iter()
            .map(|v| clean_text(&v))
            .filter(|v| !is_placeholder_option(v)),
    )
}

fn controlled_list_options(doc: &Document, node: NodeId) -> Vec<String> {
    doc.attr(node, "aria-controls")
        .and_then(|id| doc.get_element_by_id(id))
        .map(|list| list_item_values(doc, list))
        .unwrap_or_default()
}

fn is_list_container(doc: &Document, node: NodeId) -> bool {
    if matches!(doc.attr(node, "role"), Some("listbox") | Some("menu")) {
        return true;
    }
    let class = doc.class_name(node).to_lowercase();
    LIST_CLASS_HINTS.iter().any(|h| class.contains(h))
}

/// A list container inside the widget, or next to it under the same parent.
fn nearby_list_options(doc: &Document, node: NodeId) -> Vec<String> {
    let inside = doc.descendants(node).into_iter();
    let around = doc
        .parent(node)
        .map(|p| doc.descendants(p))
        .unwrap_or_default()
        .into_iter()
        .filter(|n| *n != node && !doc.is_descendant_of(*n, node));

    inside
        .chain(around)
        .filter(|n| is_list_container(doc, *n))
        .map(|list| list_item_values(doc, list))
        .find(|values| !values.is_empty())
        .unwrap_or_default()
}

fn sibling_dropdown_options(doc: &Document, node: NodeId) -> Vec<String> {
    let Some(sibling) = doc.next_element_sibling(node) else {
        return vec![];
    };
    let class = doc.class_name(sibling).to_lowercase();
    if SIBLING_CLASS_HINTS.iter().any(|h| class.contains(h)) {
        list_item_values(doc, sibling)
    } else {
        vec![]
    }
}

/// `data-options` as a JSON array, or a `,`/`;`/`|` separated string.
fn data_attribute_options(doc: &Document, node: NodeId) -> Vec<String> {
    let Some(raw) = doc.attr(node, "data-options") else {
        return vec![];
    };
    parse_option_list(raw)
}

pub fn parse_option_list(raw: &str) -> Vec<String> {
    if let Ok(serde_json::Value::Array(items)) = serde_json::from_str::<serde_json::Value>(raw) {
        return items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) => Some(s),
                serde_json::Value::Number(n) => Some(n.to_string()),
                serde_json::Value::Object(map) => map
                    .get("value")
                    .or_else(|| map.get("label"))
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
                _ => None,
            })
            .collect();
    }

    raw.split([',', ';', '|'])
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn dictionary_options(doc: &Document, node: NodeId) -> Vec<String> {
    let haystack = format!(
        "{} {} {}",
        doc.class_name(node),
        doc.attr(node, "aria-label").unwrap_or(""),
        doc.text_content(node)
    )
    .to_lowercase();

    dictionary_for(&haystack)
        .map(|values| values.iter().map(|v| v.to_string()).collect())
        .unwrap_or_default()
}

/// Values of the option-like items of a list container.
fn list_item_values(doc: &Document, list: NodeId) -> Vec<String> {
    let items: Vec<NodeId> = doc
        .descendants(list)
        .into_iter()
        .filter(|n| {
            doc.attr(*n, "role") == Some("option")
                || matches!(doc.tag(*n), Some("option") | Some("li"))
                || doc.has_attr(*n, "data-value")
        })
        .collect();

    let items = if items.is_empty() {
        doc.element_children(list)
    } else {
        items
    };

    items
        .into_iter()
        .map(|item| {
            doc.attr(item, "data-value")
                .map(str::to_string)
                .unwrap_or_else(|| clean_text(&doc.text_content(item)))
        })
        .filter(|v| !v.is_empty())
        .collect()
}
