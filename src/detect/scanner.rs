use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::config::DetectionConfig;
use crate::detect::classifier::classify_element;
use crate::detect::field_model::{FieldType, FormField};
use crate::detect::fillable::{is_content_editable, is_fillable, is_native_control};
use crate::detect::identity::{clean_text, resolve_identity};
use crate::detect::options::{extract_options, group_members, member_value};
use crate::dom::document::collapse_whitespace;
use crate::dom::selector::matches_any;
use crate::dom::{Document, NodeId, Rect, Selector};

// ============================================================================
// Candidate enumeration
// ============================================================================

/// Elements under `scope` matching any selector, in document order.
pub fn collect_candidates(doc: &Document, scope: NodeId, selectors: &[Selector]) -> Vec<NodeId> {
    doc.descendants(scope)
        .into_iter()
        .filter(|n| matches_any(doc, *n, selectors))
        .collect()
}

/// Scan one container with a selector vocabulary.
pub fn scan_container(
    doc: &Document,
    scope: NodeId,
    selectors: &[Selector],
    config: &DetectionConfig,
) -> Vec<FormField> {
    let candidates = collect_candidates(doc, scope, selectors);
    Scanner::new(doc, scope, config).scan(&candidates)
}

/// Turns candidate elements into deduplicated fields, keeping first-seen
/// order. Radio and checkbox groups contribute one field per name. Repeated
/// `scan` calls share one dedup state, so later passes skip controls an
/// earlier pass already produced.
pub struct Scanner<'a> {
    doc: &'a Document,
    scope: NodeId,
    config: &'a DetectionConfig,
    ordinals: HashMap<NodeId, usize>,
    seen_groups: HashSet<String>,
    dedup: Deduplicator,
}

impl<'a> Scanner<'a> {
    pub fn new(doc: &'a Document, scope: NodeId, config: &'a DetectionConfig) -> Self {
        Self {
            doc,
            scope,
            config,
            ordinals: same_tag_ordinals(doc, scope),
            seen_groups: HashSet::new(),
            dedup: Deduplicator::new(config),
        }
    }

    pub fn scan(&mut self, candidates: &[NodeId]) -> Vec<FormField> {
        let doc = self.doc;
        let mut fields = Vec::new();

        for &node in candidates {
            if !is_fillable(doc, node) {
                debug!(%node, tag = doc.tag(node).unwrap_or("?"), "skipping non-fillable element");
                continue;
            }

            let field_type = classify_element(doc, node);

            if field_type.is_grouped() {
                let Some(name) = doc.attr(node, "name").filter(|n| !n.is_empty()) else {
                    debug!(%node, %field_type, "skipping ungroupable control without a name");
                    continue;
                };
                if !self.seen_groups.insert(format!("{}:{}", field_type, name)) {
                    continue;
                }
            }

            let ordinal = self.ordinals.get(&node).copied().unwrap_or(0);
            let field = build_field(doc, node, field_type, self.scope, ordinal, self.config);

            let key = dedup_key(doc, &field);
            let rect = doc.rect(node);
            if self.dedup.is_duplicate(&key, &rect) {
                debug!(%node, key = %key, "dropping duplicate detection");
                continue;
            }
            self.dedup.accept(key, rect);
            fields.push(field);
        }

        fields
    }
}

fn same_tag_ordinals(doc: &Document, scope: NodeId) -> HashMap<NodeId, usize> {
    let mut counters: HashMap<String, usize> = HashMap::new();
    let mut ordinals = HashMap::new();
    for node in doc.descendants(scope) {
        let tag = doc.tag(node).unwrap_or_default().to_string();
        let counter = counters.entry(tag).or_insert(0);
        ordinals.insert(node, *counter);
        *counter += 1;
    }
    ordinals
}

fn build_field(
    doc: &Document,
    node: NodeId,
    field_type: FieldType,
    scope: NodeId,
    ordinal: usize,
    config: &DetectionConfig,
) -> FormField {
    let identity = resolve_identity(doc, node, field_type, ordinal, config.max_parent_label_len);
    let options = extract_options(doc, node, field_type, scope);
    let current_value = current_value(doc, node, field_type, scope);

    let placeholder = doc
        .attr(node, "placeholder")
        .or_else(|| doc.attr(node, "data-placeholder"))
        .map(clean_text)
        .filter(|p| !p.is_empty());

    FormField {
        id: identity.id,
        name: identity.name,
        field_type,
        current_value,
        label: identity.label,
        placeholder,
        required: doc.has_attr(node, "required") || doc.attr(node, "aria-required") == Some("true"),
        options,
        element: node,
    }
}

fn current_value(doc: &Document, node: NodeId, field_type: FieldType, scope: NodeId) -> String {
    match field_type {
        FieldType::Select if doc.tag(node) == Some("select") => {
            doc.select_value(node).unwrap_or_default()
        }
        FieldType::Radio | FieldType::Checkbox => {
            let members = group_members(doc, node, field_type, scope);
            if field_type == FieldType::Checkbox && members.len() == 1 {
                return doc.checked(node).to_string();
            }
            members
                .into_iter()
                .filter(|m| doc.checked(*m))
                .filter_map(|m| member_value(doc, m))
                .collect::<Vec<_>>()
                .join(",")
        }
        _ if is_content_editable(doc, node) => clean_text(&doc.text_content(node)),
        _ => doc.value(node).unwrap_or_default().to_string(),
    }
}

// ============================================================================
// Deduplication
// ============================================================================

/// Composite identity of a detection. Custom widgets also carry their text
/// and aria-label since their id and class are often generated.
pub fn dedup_key(doc: &Document, field: &FormField) -> String {
    let mut key = format!(
        "{}:{}:{}:{}",
        field.field_type,
        field.name,
        field.id,
        doc.class_name(field.element)
    );

    let native = doc.tag(field.element).is_some_and(is_native_control);
    if !native {
        key.push_str(&format!(
            ":{}:{}",
            collapse_whitespace(&doc.text_content(field.element)),
            doc.attr(field.element, "aria-label").unwrap_or("")
        ));
    }
    key
}

/// Suppresses repeated detections of one physical control: either the same
/// key, or a nearby position with a mostly matching key.
#[derive(Debug)]
pub struct Deduplicator {
    tolerance: f64,
    segment_ratio: f64,
    accepted: Vec<(String, Rect)>,
}

impl Deduplicator {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            tolerance: config.spatial_tolerance_px,
            segment_ratio: config.segment_match_ratio,
            accepted: Vec::new(),
        }
    }

    pub fn is_duplicate(&self, key: &str, rect: &Rect) -> bool {
        self.accepted.iter().any(|(existing, existing_rect)| {
            if existing == key {
                return true;
            }
            has_geometry(rect)
                && has_geometry(existing_rect)
                && rect.centers_within(existing_rect, self.tolerance)
                && segments_match(key, existing, self.segment_ratio)
        })
    }

    pub fn accept(&mut self, key: String, rect: Rect) {
        self.accepted.push((key, rect));
    }
}

fn has_geometry(rect: &Rect) -> bool {
    rect.width > 0.0 && rect.height > 0.0
}

/// Whether at least `ratio` of the candidate's segments occur in `existing`.
/// Empty segments never count as a match.
pub fn segments_match(candidate: &str, existing: &str, ratio: f64) -> bool {
    let candidate_parts: Vec<&str> = candidate.split(':').collect();
    let existing_parts: HashSet<&str> = existing.split(':').filter(|p| !p.is_empty()).collect();

    let matched = candidate_parts
        .iter()
        .filter(|p| existing_parts.contains(*p))
        .count();

    matched as f64 >= ratio * candidate_parts.len() as f64
}
