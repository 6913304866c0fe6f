use std::sync::LazyLock;

use regex::Regex;

use crate::detect::field_model::FieldType;
use crate::detect::fillable::is_content_editable;
use crate::detect::vocabulary::{DATE_KEYWORDS, SELECT_KEYWORDS, UPLOAD_KEYWORDS, contains_any};
use crate::dom::{Document, NodeId};

static DATE_SHAPED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2}[/.-]\d{1,2}[/.-]\d{2,4}|\d{4}-\d{2}-\d{2})\b")
        .expect("date pattern is valid")
});

/// Map an element onto a [`FieldType`]. Total: unknown shapes are text.
pub fn classify_element(doc: &Document, node: NodeId) -> FieldType {
    match doc.tag(node) {
        Some("select") => return FieldType::Select,
        Some("textarea") => return FieldType::Textarea,
        Some("input") => {
            return doc
                .attr(node, "type")
                .and_then(FieldType::from_input_type)
                .unwrap_or(FieldType::Text);
        }
        None => return FieldType::Text,
        _ => {}
    }

    match doc.attr(node, "role") {
        Some("combobox") | Some("listbox") => return FieldType::Select,
        Some("textbox") | Some("searchbox") => return FieldType::Text,
        Some("spinbutton") => return FieldType::Number,
        Some("slider") => return FieldType::Range,
        _ => {}
    }

    if is_content_editable(doc, node) {
        return FieldType::Text;
    }

    classify_by_pattern(doc, node)
}

/// Secondary classification of generic widgets over class, aria-label and
/// text. First matching category wins: date, file, select, then text.
fn classify_by_pattern(doc: &Document, node: NodeId) -> FieldType {
    let text = doc.text_content(node);
    let haystack = format!(
        "{} {} {}",
        doc.class_name(node),
        doc.attr(node, "aria-label").unwrap_or(""),
        text
    )
    .to_lowercase();

    if contains_any(&haystack, DATE_KEYWORDS) || DATE_SHAPED.is_match(&text) {
        return FieldType::Date;
    }

    if contains_any(&haystack, UPLOAD_KEYWORDS) {
        return FieldType::File;
    }

    if contains_any(&haystack, SELECT_KEYWORDS)
        || doc.has_attr(node, "aria-expanded")
        || doc.attr(node, "aria-haspopup") == Some("listbox")
    {
        return FieldType::Select;
    }

    FieldType::Text
}
