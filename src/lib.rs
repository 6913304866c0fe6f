//! Form field detection and autofill over an in-memory element tree.
//!
//! Detection finds every fillable control on a page (native inputs, custom
//! widgets and framework-rendered components), groups them into forms and
//! gives each a stable name, label and option set. Filling writes a
//! [`ValueBag`](fill::fill_model::ValueBag) into those fields with per-field
//! retries.

use std::rc::Rc;

use crate::{
    config::EngineConfig,
    detect::{
        aggregator::{FormDetector, detect_in_container},
        field_model::{FormField, ScanResult},
    },
    dom::{NodeId, SharedDocument},
    error::EngineError,
    fill::{
        executor::FillExecutor,
        fill_model::{FillOutcome, ValueBag},
    },
    scheduler::{Scheduler, TokioScheduler},
};

pub mod cli;
pub mod config;
pub mod detect;
pub mod dom;
pub mod error;
pub mod fill;
pub mod report;
pub mod scheduler;

/// Detection and filling behind one handle, sharing config and scheduler.
pub struct AutofillEngine {
    detector: FormDetector,
    executor: FillExecutor,
}

impl AutofillEngine {
    pub fn new(config: EngineConfig, scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            detector: FormDetector::new(config.detection, scheduler.clone()),
            executor: FillExecutor::new(config.fill, scheduler),
        }
    }

    /// Engine on real tokio timers.
    pub fn with_tokio(config: EngineConfig) -> Self {
        Self::new(config, Rc::new(TokioScheduler))
    }

    /// Detect every form on the page and (re)start the page watcher.
    pub async fn detect(&mut self, page: &SharedDocument) -> ScanResult {
        self.detector.detect(page).await
    }

    /// Detect fields inside one container element only.
    pub fn detect_in(
        &self,
        page: &SharedDocument,
        container: NodeId,
    ) -> Result<ScanResult, EngineError> {
        detect_in_container(&page.borrow(), container, self.detector.config())
    }

    pub async fn fill(
        &self,
        page: &SharedDocument,
        fields: &[FormField],
        bag: &ValueBag,
    ) -> FillOutcome {
        self.executor.fill(page, fields, bag).await
    }

    /// Detect, then fill every detected field.
    pub async fn detect_and_fill(
        &mut self,
        page: &SharedDocument,
        bag: &ValueBag,
    ) -> (ScanResult, FillOutcome) {
        let scan = self.detect(page).await;
        let fields: Vec<FormField> = scan.fields().cloned().collect();
        let outcome = self.fill(page, &fields, bag).await;
        (scan, outcome)
    }

    pub fn detector(&self) -> &FormDetector {
        &self.detector
    }

    pub fn detector_mut(&mut self) -> &mut FormDetector {
        &mut self.detector
    }

    pub fn stop_watching(&mut self, page: &SharedDocument) {
        self.detector.stop_watching(&mut page.borrow_mut());
    }
}
