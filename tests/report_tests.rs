use form_autofill::detect::aggregator::detect_forms;
use form_autofill::detect::field_model::{FieldType, ScanResult};
use form_autofill::fill::fill_model::{FieldReport, FillOutcome, FillState};
use form_autofill::report::console::{format_fill_report, format_final_values, format_scan_report};
use serde_json::json;

use crate::common::pages::{detection_config, page, signup_form};

mod common;

fn report(name: &str, field_type: FieldType, state: FillState, attempts: u32, error: Option<&str>) -> FieldReport {
    FieldReport {
        name: name.to_string(),
        field_type,
        state,
        attempts,
        error: error.map(String::from),
    }
}

// ============================================================================
// Scan report
// ============================================================================

#[test]
fn scan_report_lists_forms_and_totals() {
    let doc = page(signup_form());
    let result = ScanResult::from_forms(detect_forms(&doc, &detection_config()));

    let output = format_scan_report(&result);

    assert!(output.starts_with("=== Form 1: <form> (5 fields) ===\n"));
    assert!(output.ends_with("=== Detected: 1 forms, 5 fields ===\n"));

    let email_line = output
        .lines()
        .find(|l| l.trim_start().starts_with("email"))
        .unwrap();
    assert!(email_line.contains("email"));
    assert!(email_line.ends_with(" *"));

    let plan_line = output.lines().find(|l| l.contains("radio")).unwrap();
    assert!(plan_line.contains("plan"));
}

#[test]
fn scan_report_marks_standalone_fields_and_values() {
    let doc = page(json!([
        { "tag": "input", "attrs": { "type": "text", "name": "search", "value": "shoes" } }
    ]));
    let result = ScanResult::from_forms(detect_forms(&doc, &detection_config()));

    let output = format_scan_report(&result);

    assert!(output.contains("=== Form 1: standalone (1 fields) ==="));
    assert!(output.contains("= \"shoes\""));
    assert!(output.contains("=== Detected: 1 forms, 1 fields ==="));
}

#[test]
fn scan_report_empty_page() {
    let output = format_scan_report(&ScanResult::empty());
    assert_eq!(output, "=== Detected: 0 forms, 0 fields ===\n");
}

#[test]
fn final_values_list_every_field() {
    let doc = page(json!([
        { "tag": "form", "children": [
            { "tag": "input", "attrs": { "type": "text", "name": "city", "value": "Oslo" } },
            { "tag": "input", "attrs": { "type": "text", "name": "zip" } }
        ]}
    ]));
    let result = ScanResult::from_forms(detect_forms(&doc, &detection_config()));

    let output = format_final_values(&result);

    assert!(output.starts_with("=== Final values ===\n"));
    assert!(output.contains("  city  \"Oslo\"\n"));
    assert!(output.contains("  zip   \"\"\n"));
}

// ============================================================================
// Fill report
// ============================================================================

#[test]
fn fill_report_lists_each_field() {
    let outcome = FillOutcome::from_reports(vec![
        report("email", FieldType::Email, FillState::Done, 1, None),
        report("country", FieldType::Select, FillState::Done, 2, None),
        report("topics", FieldType::Checkbox, FillState::Done, 1, None),
        report("plan", FieldType::Radio, FillState::Done, 1, None),
        report(
            "resume",
            FieldType::File,
            FillState::Failed,
            0,
            Some("Resume (resume): file inputs cannot be filled"),
        ),
    ]);

    let output = format_fill_report(&outcome);

    assert!(output.contains("\u{2713} FILLED  email (1 attempt)\n"));
    assert!(output.contains("\u{2713} FILLED  country (2 attempts)\n"));
    assert!(output.contains("\u{2717} FAILED  resume (0 attempts)\n"));
    assert!(output.contains("    Resume (resume): file inputs cannot be filled\n"));
    assert!(output.ends_with("=== Filled: 4 of 5 fields ===\n"));
    assert!(!output.contains("[ERROR]"));
}

#[test]
fn fill_report_shows_batch_errors() {
    let output = format_fill_report(&FillOutcome::nothing_to_fill());

    assert!(output.starts_with("[ERROR] no fields to fill\n"));
    assert!(output.ends_with("=== Filled: 0 of 0 fields ===\n"));
}

#[test]
fn fill_outcome_serializes_for_json_output() {
    let outcome = FillOutcome::from_reports(vec![report(
        "email",
        FieldType::Email,
        FillState::Done,
        1,
        None,
    )]);

    let value = serde_json::to_value(&outcome).unwrap();
    assert_eq!(value["success"], json!(true));
    assert_eq!(value["filled"], json!(1));
    assert_eq!(value["reports"][0]["type"], json!("email"));
    assert_eq!(value["reports"][0]["state"], json!("done"));
}
