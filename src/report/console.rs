use crate::detect::field_model::{DetectedForm, FormField, ScanResult};
use crate::fill::fill_model::{FillOutcome, FillState};

// ============================================================================
// Console reporter (formatted terminal output)
// ============================================================================

/// Format a detection result for terminal output.
///
/// Produces output like:
/// ```text
/// === Form 1: <form> (2 fields) ===
///   email     email     Email Address *
///   country   select    Country [US, CA, FR]
///
/// === Detected: 1 forms, 2 fields ===
/// ```
pub fn format_scan_report(result: &ScanResult) -> String {
    let mut out = String::new();

    for (i, form) in result.forms.iter().enumerate() {
        out.push_str(&format!(
            "=== Form {}: {} ({} fields) ===\n",
            i + 1,
            container_name(form),
            form.field_count
        ));

        let name_width = form.fields.iter().map(|f| f.name.len()).max().unwrap_or(0);
        for field in &form.fields {
            out.push_str(&format_field_line(field, name_width));
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "=== Detected: {} forms, {} fields ===\n",
        result.form_count,
        result.field_count()
    ));
    out
}

fn container_name(form: &DetectedForm) -> &'static str {
    if form.is_synthetic() { "standalone" } else { "<form>" }
}

fn format_field_line(field: &FormField, name_width: usize) -> String {
    let mut line = format!(
        "  {:<width$}  {:<9} {}",
        field.name,
        field.field_type.as_str(),
        field.label,
        width = name_width
    );
    if field.required {
        line.push_str(" *");
    }
    if !field.options.is_empty() {
        line.push_str(&format!(" [{}]", field.options.join(", ")));
    }
    if !field.current_value.is_empty() {
        line.push_str(&format!(" = {:?}", field.current_value));
    }
    line.push('\n');
    line
}

/// Format a fill outcome for terminal output.
///
/// ```text
/// ✓ FILLED  email (1 attempt)
/// ✗ FAILED  resume (0 attempts)
///     Resume (resume): file inputs cannot be filled
///
/// === Filled: 1 of 2 fields ===
/// ```
pub fn format_fill_report(outcome: &FillOutcome) -> String {
    let mut out = String::new();

    for report in &outcome.reports {
        let marker = if report.state == FillState::Done {
            "\u{2713} FILLED"
        } else {
            "\u{2717} FAILED"
        };
        let plural = if report.attempts == 1 { "" } else { "s" };
        out.push_str(&format!(
            "{}  {} ({} attempt{})\n",
            marker, report.name, report.attempts, plural
        ));
        if let Some(ref error) = report.error {
            out.push_str(&format!("    {}\n", error));
        }
    }

    // Batch-level errors have no per-field report
    if outcome.reports.is_empty() {
        for error in &outcome.errors {
            out.push_str(&format!("[ERROR] {}\n", error));
        }
    }

    out.push_str(&format!(
        "\n=== Filled: {} of {} fields ===\n",
        outcome.filled,
        outcome.reports.len()
    ));
    out
}

/// Final value of every detected field, one `name = "value"` line each.
pub fn format_final_values(result: &ScanResult) -> String {
    let mut out = String::from("=== Final values ===\n");
    let name_width = result.fields().map(|f| f.name.len()).max().unwrap_or(0);
    for field in result.fields() {
        out.push_str(&format!(
            "  {:<width$}  {:?}\n",
            field.name,
            field.current_value,
            width = name_width
        ));
    }
    out
}
