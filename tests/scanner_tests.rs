use std::rc::Rc;
use std::time::Duration;

use form_autofill::config::DetectionConfig;
use form_autofill::detect::{
    aggregator::{FormDetector, Framework, detect_forms, detect_framework, detect_in_container},
    field_model::{FieldType, ScanResult},
    options::is_checkbox_group,
    scanner::{Deduplicator, scan_container, segments_match},
};
use form_autofill::dom::selector::form_vocabulary;
use form_autofill::dom::{Document, Rect};
use form_autofill::error::EngineError;
use form_autofill::scheduler::ManualScheduler;
use serde_json::json;

use crate::common::pages::{by_id, detection_config, page, rect, signup_form, text};

mod common;

// ============================================================================
// Scanning a form
// ============================================================================

#[test]
fn signup_form_yields_one_field_per_control_or_group() {
    let doc = page(signup_form());
    let forms = ScanResult::from_forms(detect_forms(&doc, &detection_config()));

    assert!(forms.success);
    assert_eq!(forms.form_count, 1);
    let form = &forms.forms[0];
    assert_eq!(form.element, Some(by_id(&doc, "signup")));

    let summary: Vec<(&str, FieldType)> = form
        .fields
        .iter()
        .map(|f| (f.name.as_str(), f.field_type))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("email", FieldType::Email),
            ("country", FieldType::Select),
            ("topics", FieldType::Checkbox),
            ("plan", FieldType::Radio),
            ("resume", FieldType::File),
        ]
    );
    assert_eq!(form.field_count, 5);
}

#[test]
fn field_details_are_populated() {
    let doc = page(signup_form());
    let result = ScanResult::from_forms(detect_forms(&doc, &detection_config()));
    let fields: Vec<_> = result.fields().collect();

    let email = fields[0];
    assert_eq!(email.label, "Email Address");
    assert!(email.required);
    assert_eq!(email.id, "email");
    assert_eq!(email.element, by_id(&doc, "email"));

    let country = fields[1];
    assert_eq!(country.options, vec!["US", "CA", "FR"]);
    assert!(!country.required);

    let topics = fields[2];
    assert_eq!(topics.options, vec!["A", "B", "C"]);
    assert!(is_checkbox_group(&doc, topics.element, by_id(&doc, "signup")));
    assert_eq!(topics.current_value, "");

    let plan = fields[3];
    assert_eq!(plan.options, vec!["free", "pro"]);
    assert_eq!(plan.label, "Free");
}

#[test]
fn current_values_reflect_page_state() {
    let doc = page(json!([
        { "tag": "form", "children": [
            { "tag": "input", "attrs": { "name": "city", "value": "Paris" } },
            { "tag": "input", "attrs": { "type": "checkbox", "name": "agree", "checked": "" } },
            { "tag": "input", "attrs": { "type": "checkbox", "name": "tags", "value": "x", "checked": "" } },
            { "tag": "input", "attrs": { "type": "checkbox", "name": "tags", "value": "y" } },
            { "tag": "input", "attrs": { "type": "checkbox", "name": "tags", "value": "z", "checked": "" } },
            { "tag": "input", "attrs": { "type": "radio", "name": "size", "value": "s" } },
            { "tag": "input", "attrs": { "type": "radio", "name": "size", "value": "m", "checked": "" } },
            { "tag": "div", "attrs": { "name": "bio", "contenteditable": "true" }, "children": [text("Hi there")] }
        ]}
    ]));
    let form = doc.descendants(doc.body())[0];
    let fields = scan_container(&doc, form, &form_vocabulary(), &detection_config());

    let values: Vec<(&str, &str)> = fields
        .iter()
        .map(|f| (f.name.as_str(), f.current_value.as_str()))
        .collect();
    assert_eq!(
        values,
        vec![
            ("city", "Paris"),
            ("agree", "true"),
            ("tags", "x,z"),
            ("size", "m"),
            ("bio", "Hi there"),
        ]
    );
}

#[test]
fn nameless_radio_is_skipped() {
    let doc = page(json!([
        { "tag": "form", "children": [
            { "tag": "input", "attrs": { "type": "radio", "value": "a" } },
            { "tag": "input", "attrs": { "name": "q" } }
        ]}
    ]));
    let form = doc.descendants(doc.body())[0];
    let fields = scan_container(&doc, form, &form_vocabulary(), &detection_config());

    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].name, "q");
}

#[test]
fn placeholder_and_aria_required_are_read() {
    let doc = page(json!([
        { "tag": "form", "children": [
            { "tag": "div", "attrs": { "role": "textbox", "aria-label": "Nickname", "aria-required": "true", "data-placeholder": "e.g. Ace" } }
        ]}
    ]));
    let form = doc.descendants(doc.body())[0];
    let fields = scan_container(&doc, form, &form_vocabulary(), &detection_config());

    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].name, "nickname");
    assert!(fields[0].required);
    assert_eq!(fields[0].placeholder.as_deref(), Some("e.g. Ace"));
}

#[test]
fn anonymous_controls_are_named_by_position_among_same_tag() {
    let doc = page(json!([
        { "tag": "form", "children": [
            { "tag": "input", "attrs": { "type": "text" } },
            { "tag": "input", "attrs": { "type": "text" } }
        ]}
    ]));
    let result = ScanResult::from_forms(detect_forms(&doc, &detection_config()));
    let names: Vec<&str> = result.fields().map(|f| f.name.as_str()).collect();

    assert_eq!(names, vec!["text_field_0", "text_field_1"]);
}

// ============================================================================
// Deduplication
// ============================================================================

#[test]
fn exact_key_repeat_is_dropped() {
    let doc = page(json!([
        { "tag": "form", "children": [
            { "tag": "input", "attrs": { "name": "q", "class": "search" } },
            { "tag": "input", "attrs": { "name": "q", "class": "search" } }
        ]}
    ]));
    let form = doc.descendants(doc.body())[0];
    let fields = scan_container(&doc, form, &form_vocabulary(), &detection_config());

    assert_eq!(fields.len(), 1);
}

fn wrapped_input_page(input_rect: serde_json::Value) -> Document {
    page(json!([
        { "tag": "div", "attrs": { "class": "MuiInput-root", "aria-label": "Email" }, "rect": rect(100.0, 100.0, 200.0, 40.0), "children": [
            { "tag": "input", "attrs": { "type": "text", "name": "email" }, "rect": input_rect }
        ]}
    ]))
}

#[test]
fn wrapper_and_native_input_at_same_spot_are_one_field() {
    let doc = wrapped_input_page(rect(102.0, 102.0, 196.0, 36.0));
    let result = ScanResult::from_forms(detect_forms(&doc, &detection_config()));

    assert_eq!(result.field_count(), 1);
    let field = result.fields().next().unwrap();
    assert_eq!(field.name, "email");
    assert_eq!(field.label, "Email");
    assert!(result.forms[0].is_synthetic());
}

#[test]
fn distant_controls_with_similar_keys_are_kept() {
    let doc = wrapped_input_page(rect(100.0, 400.0, 200.0, 40.0));
    let result = ScanResult::from_forms(detect_forms(&doc, &detection_config()));

    assert_eq!(result.field_count(), 2);
    assert_eq!(result.form_count, 2);
}

#[test]
fn zero_area_boxes_never_trigger_the_spatial_rule() {
    let config = detection_config();
    let mut dedup = Deduplicator::new(&config);
    dedup.accept("text:a:a:".into(), Rect::default());

    assert!(!dedup.is_duplicate("text:a:b:", &Rect::default()));
    assert!(dedup.is_duplicate("text:a:a:", &Rect::default()));
}

#[test]
fn spatial_rule_uses_configured_tolerance() {
    let config = DetectionConfig {
        spatial_tolerance_px: 3.0,
        ..DetectionConfig::default()
    };
    let mut dedup = Deduplicator::new(&config);
    dedup.accept("text:email:email:".into(), Rect::new(0.0, 0.0, 100.0, 20.0));

    assert!(dedup.is_duplicate("text:email:x1:", &Rect::new(2.0, 2.0, 100.0, 20.0)));
    assert!(!dedup.is_duplicate("text:email:x1:", &Rect::new(5.0, 0.0, 100.0, 20.0)));
}

#[test]
fn segment_matching() {
    assert!(segments_match("text:email:email:", "text:email:field_1:MuiInput::Email", 0.5));
    assert!(!segments_match("email:email_field_0:field_2:", "text:email:field_1:Mui", 0.5));
    // empty segments on either side never match
    assert!(!segments_match(":::", ":::", 0.5));
}

// ============================================================================
// Aggregation
// ============================================================================

#[test]
fn forms_then_framework_then_standalone() {
    let doc = page(json!([
        { "tag": "form", "attrs": { "id": "login" }, "children": [
            { "tag": "input", "attrs": { "name": "user" } }
        ]},
        { "tag": "div", "attrs": { "class": "ant-select", "aria-label": "Language", "data-options": "en,fr" } },
        { "tag": "input", "attrs": { "name": "newsletter_email", "type": "email" } },
        { "tag": "form", "attrs": { "id": "empty" } }
    ]));
    let result = ScanResult::from_forms(detect_forms(&doc, &detection_config()));

    assert_eq!(result.form_count, 3);
    assert_eq!(result.forms[0].element, Some(by_id(&doc, "login")));
    assert!(result.forms[1].is_synthetic());
    assert!(result.forms[2].is_synthetic());

    let language = &result.forms[1].fields[0];
    assert_eq!(language.name, "language");
    assert_eq!(language.field_type, FieldType::Select);
    assert_eq!(language.options, vec!["en", "fr"]);

    assert_eq!(result.forms[2].fields[0].name, "newsletter_email");
}

#[test]
fn page_without_controls_is_a_successful_empty_scan() {
    let doc = page(json!([{ "tag": "p", "children": [text("Nothing to see")] }]));
    let result = ScanResult::from_forms(detect_forms(&doc, &detection_config()));

    assert!(result.success);
    assert_eq!(result.form_count, 0);
    assert!(result.forms.is_empty());
}

#[test]
fn detection_is_idempotent() {
    let doc = page(signup_form());
    let first = ScanResult::from_forms(detect_forms(&doc, &detection_config()));
    let second = ScanResult::from_forms(detect_forms(&doc, &detection_config()));

    assert_eq!(first, second);
}

#[test]
fn detect_in_container_scans_only_that_subtree() {
    let doc = page(json!([
        { "tag": "section", "attrs": { "id": "billing" }, "children": [
            { "tag": "input", "attrs": { "name": "card" } }
        ]},
        { "tag": "input", "attrs": { "name": "elsewhere" } },
        { "tag": "div", "attrs": { "id": "empty" } }
    ]));
    let config = detection_config();

    let billing = detect_in_container(&doc, by_id(&doc, "billing"), &config).unwrap();
    assert_eq!(billing.form_count, 1);
    assert_eq!(billing.fields().map(|f| f.name.as_str()).collect::<Vec<_>>(), vec!["card"]);

    let empty = detect_in_container(&doc, by_id(&doc, "empty"), &config).unwrap();
    assert!(empty.success);
    assert_eq!(empty.form_count, 0);
}

#[test]
fn detect_in_container_rejects_stale_handle() {
    let mut doc = page(json!([{ "tag": "div", "attrs": { "id": "gone" } }]));
    let gone = by_id(&doc, "gone");
    doc.remove(gone).unwrap();

    let result = detect_in_container(&doc, gone, &detection_config());
    assert!(matches!(result, Err(EngineError::InvalidContainer(id)) if id == gone));
}

// ============================================================================
// Framework mount wait
// ============================================================================

#[test]
fn framework_markers_are_recognized() {
    let react = page(json!([{ "tag": "div", "attrs": { "data-reactroot": "" } }]));
    let next = page(json!([{ "tag": "div", "attrs": { "id": "__next" }, "children": [{ "tag": "main" }] }]));
    let empty_next = page(json!([{ "tag": "div", "attrs": { "id": "__next" } }]));
    let generic = page(json!([{ "tag": "div", "attrs": { "id": "app" }, "children": [{ "tag": "main" }] }]));

    assert_eq!(detect_framework(&react), Some(Framework::React));
    assert_eq!(detect_framework(&next), Some(Framework::Next));
    assert_eq!(detect_framework(&empty_next), None);
    assert_eq!(detect_framework(&generic), Some(Framework::Generic));
}

#[tokio::test]
async fn mount_wait_gives_up_after_the_limit() {
    let scheduler = Rc::new(ManualScheduler::new());
    let mut detector = FormDetector::new(detection_config(), scheduler.clone());
    let shared = page(signup_form()).into_shared();

    let result = detector.detect(&shared).await;

    assert_eq!(result.field_count(), 5);
    assert_eq!(scheduler.elapsed(), Duration::from_millis(2000));
    assert_eq!(scheduler.sleep_count(), 20);
}

#[tokio::test]
async fn mount_wait_stops_once_framework_renders() {
    let shared = page(json!([{ "tag": "div", "attrs": { "id": "root" } }])).into_shared();
    let root = by_id(&shared.borrow(), "root");

    let page_handle = shared.clone();
    let scheduler = Rc::new(ManualScheduler::with_hook(move |index, _| {
        if index == 4 {
            let mut doc = page_handle.borrow_mut();
            doc.append_element(root, "input", &[("name", "late")]).unwrap();
        }
    }));
    let mut detector = FormDetector::new(detection_config(), scheduler.clone());

    let framework = detector.wait_for_framework(&shared).await;
    assert_eq!(framework, Some(Framework::Generic));
    assert_eq!(scheduler.sleep_count(), 5);

    let result = detector.detect(&shared).await;
    assert_eq!(result.fields().next().map(|f| f.name.as_str()), Some("late"));
}

#[tokio::test]
async fn zero_wait_scans_immediately() {
    let config = DetectionConfig {
        mount_wait_ms: 0,
        ..DetectionConfig::default()
    };
    let scheduler = Rc::new(ManualScheduler::new());
    let mut detector = FormDetector::new(config, scheduler.clone());
    let shared = page(signup_form()).into_shared();

    detector.detect(&shared).await;
    assert_eq!(scheduler.sleep_count(), 0);
}

// ============================================================================
// Page watcher
// ============================================================================

#[test]
fn detection_replaces_the_previous_watcher() {
    let mut doc = page(signup_form());
    let mut detector = FormDetector::new(detection_config(), Rc::new(ManualScheduler::new()));

    detector.detect_now(&mut doc);
    let first = detector.rescan_signal().unwrap();
    assert_eq!(doc.observer_count(), 1);

    detector.detect_now(&mut doc);
    assert_eq!(doc.observer_count(), 1);
    assert!(detector.is_watching());
    // the old stream is closed once its watcher is disposed
    assert!(first.has_changed().is_err());
}

#[test]
fn watcher_signals_when_controls_are_added() {
    let mut doc = page(signup_form());
    let mut detector = FormDetector::new(detection_config(), Rc::new(ManualScheduler::new()));
    detector.detect_now(&mut doc);
    let mut signal = detector.rescan_signal().unwrap();
    let body = doc.body();

    doc.append_element(body, "p", &[]).unwrap();
    assert!(!signal.has_changed().unwrap());

    let wrapper = doc.create_element("div");
    let late = doc.append_element(wrapper, "select", &[("name", "late")]).unwrap();
    doc.append_child(body, wrapper).unwrap();

    assert!(signal.has_changed().unwrap());
    let seen = *signal.borrow_and_update();
    assert_eq!(seen.generation, 1);
    assert_eq!(seen.last_added, Some(wrapper));
    assert!(doc.is_attached(late));

    let rescan = detector.detect_now(&mut doc);
    assert!(rescan.fields().any(|f| f.name == "late"));
}

#[test]
fn stop_watching_disconnects_observer() {
    let mut doc = page(signup_form());
    let mut detector = FormDetector::new(detection_config(), Rc::new(ManualScheduler::new()));
    detector.detect_now(&mut doc);

    detector.stop_watching(&mut doc);
    assert_eq!(doc.observer_count(), 0);
    assert!(!detector.is_watching());
    assert!(detector.rescan_signal().is_none());
}
