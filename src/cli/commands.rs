use std::path::Path;
use std::rc::Rc;

use tracing::info;

use crate::AutofillEngine;
use crate::cli::config::OutputFormat;
use crate::config::EngineConfig;
use crate::detect::aggregator::detect_forms;
use crate::detect::field_model::ScanResult;
use crate::dom::Document;
use crate::error::EngineError;
use crate::fill::fill_model::ValueBag;
use crate::report::console::{format_fill_report, format_final_values, format_scan_report};
use crate::scheduler::Scheduler;

// ============================================================================
// detect subcommand
// ============================================================================

pub async fn cmd_detect(
    page_path: &str,
    format: OutputFormat,
    config: EngineConfig,
    scheduler: Rc<dyn Scheduler>,
) -> Result<(), EngineError> {
    let page = load_page(page_path)?.into_shared();
    let mut engine = AutofillEngine::new(config, scheduler);

    let result = engine.detect(&page).await;
    engine.stop_watching(&page);

    let output = match format {
        OutputFormat::Json => to_json(&result)?,
        OutputFormat::Console => format_scan_report(&result),
    };
    print!("{}", output);
    Ok(())
}

// ============================================================================
// fill subcommand
// ============================================================================

/// Detect and fill; returns whether at least one field was filled.
pub async fn cmd_fill(
    page_path: &str,
    values_path: &str,
    format: OutputFormat,
    config: EngineConfig,
    scheduler: Rc<dyn Scheduler>,
) -> Result<bool, EngineError> {
    let page = load_page(page_path)?.into_shared();
    let bag = ValueBag::from_json(&std::fs::read_to_string(values_path)?)?;
    info!(values = bag.len(), path = values_path, "loaded value bag");

    let detection = config.detection.clone();
    let mut engine = AutofillEngine::new(config, scheduler);
    let (scan, outcome) = engine.detect_and_fill(&page, &bag).await;
    engine.stop_watching(&page);

    let output = match format {
        OutputFormat::Json => to_json(&serde_json::json!({
            "scan": scan,
            "fill": outcome,
        }))?,
        OutputFormat::Console => {
            let after = ScanResult::from_forms(detect_forms(&page.borrow(), &detection));
            format!(
                "{}\n{}\n{}",
                format_scan_report(&scan),
                format_fill_report(&outcome),
                format_final_values(&after)
            )
        }
    };
    print!("{}", output);
    Ok(outcome.success)
}

// ============================================================================
// Helpers
// ============================================================================

pub fn load_page(path: impl AsRef<Path>) -> Result<Document, EngineError> {
    let content = std::fs::read_to_string(path.as_ref())?;
    Document::from_json(&content)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, EngineError> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    Ok(json)
}
