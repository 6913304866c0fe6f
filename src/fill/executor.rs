use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::config::FillConfig;
use crate::detect::field_model::{FieldType, FormField};
use crate::detect::fillable::is_native_control;
use crate::detect::identity::extract_label;
use crate::detect::options::{group_members, is_checkbox_group, member_value};
use crate::detect::vocabulary::NON_DATA_INPUT_TYPES;
use crate::dom::document::collapse_whitespace;
use crate::dom::{Document, NodeId, SharedDocument};
use crate::fill::fill_model::{
    FieldFailure, FieldReport, FieldValue, FillOutcome, FillState, ValueBag,
};
use crate::fill::format::format_value;
use crate::fill::mapper::resolve_value;
use crate::scheduler::Scheduler;

/// Label text budget when matching radio and checkbox members by label.
const MEMBER_LABEL_LEN: usize = 100;

// ============================================================================
// Executor
// ============================================================================

/// Writes a value bag into detected fields, one field at a time, with a
/// bounded number of attempts per field.
pub struct FillExecutor {
    config: FillConfig,
    scheduler: Rc<dyn Scheduler>,
}

impl FillExecutor {
    pub fn new(config: FillConfig, scheduler: Rc<dyn Scheduler>) -> Self {
        Self { config, scheduler }
    }

    pub fn config(&self) -> &FillConfig {
        &self.config
    }

    /// Fill `fields` in order. A failing field never aborts the batch.
    pub async fn fill(
        &self,
        page: &SharedDocument,
        fields: &[FormField],
        bag: &ValueBag,
    ) -> FillOutcome {
        if fields.is_empty() {
            return FillOutcome::nothing_to_fill();
        }

        let mut reports = Vec::with_capacity(fields.len());
        for field in fields {
            reports.push(self.fill_field(page, field, bag).await);
        }

        let outcome = FillOutcome::from_reports(reports);
        info!(
            filled = outcome.filled,
            failed = outcome.errors.len(),
            "fill complete"
        );
        outcome
    }

    async fn fill_field(&self, page: &SharedDocument, field: &FormField, bag: &ValueBag) -> FieldReport {
        let mut run = FieldRun::new(field);

        if field.field_type == FieldType::File {
            return run.fail(FieldFailure::UnsupportedType);
        }
        let Some(value) = resolve_value(bag, &field.name) else {
            return run.fail(FieldFailure::ValueMissing);
        };

        self.scheduler.sleep(self.config.field_delay()).await;

        let budget = self.config.retry_budget.max(1);
        loop {
            run.begin_attempt();
            let result = {
                let mut doc = page.borrow_mut();
                write_field(&mut doc, field, value)
            };

            match result {
                Ok(()) => return run.done(),
                Err(failure) if failure.is_retryable() && run.attempts < budget => {
                    warn!(
                        field = %field.name,
                        attempt = run.attempts,
                        error = %failure,
                        "fill attempt failed, retrying"
                    );
                    run.retry();
                    self.scheduler.sleep(self.config.retry_delay()).await;
                }
                Err(failure) => return run.fail(failure),
            }
        }
    }
}

/// Lifecycle of one field: Pending, Attempting, optionally Retrying back to
/// Attempting, then Done or Failed.
struct FieldRun<'a> {
    field: &'a FormField,
    state: FillState,
    attempts: u32,
}

impl<'a> FieldRun<'a> {
    fn new(field: &'a FormField) -> Self {
        Self {
            field,
            state: FillState::Pending,
            attempts: 0,
        }
    }

    fn transition(&mut self, next: FillState) {
        debug!(field = %self.field.name, from = ?self.state, to = ?next, "fill state");
        self.state = next;
    }

    fn begin_attempt(&mut self) {
        self.attempts += 1;
        self.transition(FillState::Attempting);
    }

    fn retry(&mut self) {
        self.transition(FillState::Retrying);
    }

    fn done(mut self) -> FieldReport {
        self.transition(FillState::Done);
        self.report(None)
    }

    fn fail(mut self, failure: FieldFailure) -> FieldReport {
        self.transition(FillState::Failed);
        let message = format!("{} ({}): {}", self.field.label, self.field.name, failure);
        warn!(field = %self.field.name, attempts = self.attempts, error = %failure, "field not filled");
        self.report(Some(message))
    }

    fn report(self, error: Option<String>) -> FieldReport {
        FieldReport {
            name: self.field.name.clone(),
            field_type: self.field.field_type,
            state: self.state,
            attempts: self.attempts,
            error,
        }
    }
}

// ============================================================================
// Writes
// ============================================================================

/// One attempt at writing `value` into `field`. Re-checks the element first,
/// since the page may have changed since detection.
pub fn write_field(doc: &mut Document, field: &FormField, value: &FieldValue) -> Result<(), FieldFailure> {
    let node = field.element;
    if !doc.is_attached(node) || !doc.is_element(node) {
        return Err(FieldFailure::ElementGone);
    }
    check_input_type(doc, node)?;

    match field.field_type {
        FieldType::File => Err(FieldFailure::UnsupportedType),
        FieldType::Select if doc.tag(node) == Some("select") => write_native_select(doc, node, value),
        FieldType::Select => write_custom_select(doc, field, value),
        FieldType::Radio => write_radio(doc, node, value),
        FieldType::Checkbox if is_checkbox_group(doc, node, group_scope(doc, node)) => {
            write_checkbox_group(doc, node, value)
        }
        FieldType::Checkbox => write_checkbox(doc, node, value),
        _ => write_text(doc, field, value),
    }
}

/// An input that turned into a button or file picker after detection can no
/// longer take the value.
fn check_input_type(doc: &Document, node: NodeId) -> Result<(), FieldFailure> {
    if doc.tag(node) != Some("input") {
        return Ok(());
    }
    let input_type = doc.attr(node, "type").unwrap_or("text").to_lowercase();
    if input_type == "file" || NON_DATA_INPUT_TYPES.contains(&input_type.as_str()) {
        return Err(FieldFailure::WriteRejected(format!(
            "element is now a {} input",
            input_type
        )));
    }
    Ok(())
}

/// Custom text widgets usually wrap the real input; write there if one exists.
fn write_target(doc: &Document, node: NodeId) -> NodeId {
    if doc.tag(node).is_some_and(is_native_control) {
        return node;
    }
    doc.descendants(node)
        .into_iter()
        .find(|n| matches!(doc.tag(*n), Some("input") | Some("textarea")))
        .unwrap_or(node)
}

fn write_text(doc: &mut Document, field: &FormField, value: &FieldValue) -> Result<(), FieldFailure> {
    let target = write_target(doc, field.element);
    let formatted = format_value(&value.as_text(), field.field_type);

    doc.focus(target)?;
    doc.set_value(target, &formatted)?;
    doc.dispatch_write_events(target)?;

    if doc.value(target) != Some(formatted.as_str()) {
        return Err(FieldFailure::WriteRejected("value was not retained".to_string()));
    }
    Ok(())
}

fn write_native_select(doc: &mut Document, node: NodeId, value: &FieldValue) -> Result<(), FieldFailure> {
    let wanted = value.as_text();
    let options = doc.options(node);

    let by_value = options.iter().find(|o| doc.option_value(**o) == wanted);
    let by_text = || {
        options
            .iter()
            .find(|o| option_text(doc, **o).eq_ignore_ascii_case(wanted.trim()))
    };
    let by_substring = || {
        options.iter().find(|o| {
            loosely_matches(&option_text(doc, **o), &wanted)
                || loosely_matches(&doc.option_value(**o), &wanted)
        })
    };

    let option = by_value
        .or_else(by_text)
        .or_else(by_substring)
        .copied()
        .ok_or_else(|| FieldFailure::WriteRejected(format!("no option matches '{}'", wanted)))?;

    doc.focus(node)?;
    doc.select_option(node, option)?;
    doc.dispatch_write_events(node)?;
    Ok(())
}

fn option_text(doc: &Document, option: NodeId) -> String {
    collapse_whitespace(&doc.text_content(option))
}

fn write_custom_select(doc: &mut Document, field: &FormField, value: &FieldValue) -> Result<(), FieldFailure> {
    let wanted = value.as_text();
    if field.options.is_empty() {
        return Err(FieldFailure::WriteRejected(format!(
            "no options to match '{}'",
            wanted
        )));
    }
    let chosen = field
        .options
        .iter()
        .find(|o| o.eq_ignore_ascii_case(wanted.trim()))
        .or_else(|| field.options.iter().find(|o| loosely_matches(o, &wanted)))
        .cloned()
        .ok_or_else(|| FieldFailure::WriteRejected(format!("no option matches '{}'", wanted)))?;

    let node = field.element;
    doc.focus(node)?;
    doc.set_value(node, &chosen)?;
    doc.dispatch_write_events(node)?;
    Ok(())
}

fn group_scope(doc: &Document, node: NodeId) -> NodeId {
    doc.closest(node, "form").unwrap_or_else(|| doc.body())
}

/// Texts a group member can be addressed by: its value and its label.
fn member_texts(doc: &Document, member: NodeId) -> Vec<String> {
    let mut texts = Vec::new();
    texts.extend(member_value(doc, member));
    texts.push(extract_label(doc, member, MEMBER_LABEL_LEN).0);
    texts.retain(|t| !t.trim().is_empty());
    texts
}

/// Members whose value or label equals `wanted`, or failing that, contains it
/// or is contained in it.
fn matching_members(doc: &Document, members: &[NodeId], wanted: &str) -> Vec<NodeId> {
    let exact: Vec<NodeId> = members
        .iter()
        .copied()
        .filter(|m| {
            member_texts(doc, *m)
                .iter()
                .any(|t| t.trim().eq_ignore_ascii_case(wanted.trim()))
        })
        .collect();
    if !exact.is_empty() {
        return exact;
    }

    members
        .iter()
        .copied()
        .filter(|m| member_texts(doc, *m).iter().any(|t| loosely_matches(t, wanted)))
        .collect()
}

fn write_radio(doc: &mut Document, node: NodeId, value: &FieldValue) -> Result<(), FieldFailure> {
    let wanted = value.as_text();
    let members = group_members(doc, node, FieldType::Radio, group_scope(doc, node));
    let chosen = matching_members(doc, &members, &wanted)
        .first()
        .copied()
        .ok_or_else(|| FieldFailure::WriteRejected(format!("no radio option matches '{}'", wanted)))?;

    for member in members.iter().copied().filter(|m| *m != chosen) {
        if doc.checked(member) {
            doc.set_checked(member, false)?;
        }
    }
    doc.focus(chosen)?;
    doc.set_checked(chosen, true)?;
    doc.dispatch_write_events(chosen)?;
    Ok(())
}

fn write_checkbox(doc: &mut Document, node: NodeId, value: &FieldValue) -> Result<(), FieldFailure> {
    doc.focus(node)?;
    doc.set_checked(node, value.as_bool())?;
    doc.dispatch_write_events(node)?;
    Ok(())
}

/// Checks every member matching a requested value. Members not requested are
/// left as they are.
fn write_checkbox_group(doc: &mut Document, node: NodeId, value: &FieldValue) -> Result<(), FieldFailure> {
    let wanted = value.as_list();
    let members = group_members(doc, node, FieldType::Checkbox, group_scope(doc, node));

    let mut targets: Vec<NodeId> = Vec::new();
    for requested in &wanted {
        for member in matching_members(doc, &members, requested) {
            if !targets.contains(&member) {
                targets.push(member);
            }
        }
    }
    if targets.is_empty() {
        return Err(FieldFailure::WriteRejected(format!(
            "no checkbox matches '{}'",
            wanted.join(", ")
        )));
    }

    for member in targets {
        doc.focus(member)?;
        doc.set_checked(member, true)?;
        doc.dispatch_write_events(member)?;
    }
    Ok(())
}

/// Case-insensitive containment in either direction, ignoring empty text.
fn loosely_matches(candidate: &str, wanted: &str) -> bool {
    let candidate = candidate.trim().to_lowercase();
    let wanted = wanted.trim().to_lowercase();
    !candidate.is_empty()
        && !wanted.is_empty()
        && (candidate.contains(&wanted) || wanted.contains(&candidate))
}
