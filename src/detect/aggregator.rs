use std::collections::HashSet;
use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::DetectionConfig;
use crate::detect::field_model::{DetectedForm, ScanResult};
use crate::detect::scanner::{Scanner, collect_candidates, scan_container};
use crate::detect::watcher::{RescanReceiver, WatcherSlot};
use crate::dom::selector::{NATIVE_SELECTORS, form_vocabulary, framework_vocabulary};
use crate::dom::{Document, NodeId, SharedDocument};
use crate::error::EngineError;
use crate::scheduler::Scheduler;

// ============================================================================
// Framework mount probe
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Framework {
    React,
    Next,
    Angular,
    Vue,
    Nuxt,
    Svelte,
    /// A populated `#root`/`#app` mount point without a known marker.
    Generic,
}

/// Which client framework, if any, has rendered into the page.
pub fn detect_framework(doc: &Document) -> Option<Framework> {
    let mut generic = false;

    for node in std::iter::once(doc.body()).chain(doc.descendants(doc.body())) {
        let Some(el) = doc.element(node) else {
            continue;
        };
        let attrs = &el.attributes;
        let populated = !doc.element_children(node).is_empty();

        if attrs.contains_key("data-reactroot") || attrs.contains_key("data-react-helmet") {
            return Some(Framework::React);
        }
        if attrs.contains_key("ng-version") {
            return Some(Framework::Angular);
        }
        if attrs.contains_key("data-v-app") || attrs.contains_key("data-server-rendered") {
            return Some(Framework::Vue);
        }
        if attrs.keys().any(|k| k.starts_with("data-svelte")) {
            return Some(Framework::Svelte);
        }
        match attrs.get("id").map(String::as_str) {
            Some("__next") if populated => return Some(Framework::Next),
            Some("__nuxt") if populated => return Some(Framework::Nuxt),
            Some("root") | Some("app") if populated => generic = true,
            _ => {}
        }
    }

    generic.then_some(Framework::Generic)
}

// ============================================================================
// Whole-page detection
// ============================================================================

/// Detect every fillable container on the page: native forms first, then
/// framework-rendered controls outside forms, then leftover standalone
/// inputs. Containers without fields are dropped by [`ScanResult`].
pub fn detect_forms(doc: &Document, config: &DetectionConfig) -> Vec<DetectedForm> {
    let body = doc.body();
    let mut forms = Vec::new();

    let form_selectors = form_vocabulary();
    for form in doc
        .descendants(body)
        .into_iter()
        .filter(|n| doc.tag(*n) == Some("form"))
    {
        let fields = scan_container(doc, form, &form_selectors, config);
        debug!(%form, fields = fields.len(), "scanned native form");
        forms.push(DetectedForm::new(Some(form), fields));
    }

    let outside_forms = |n: &NodeId| doc.closest(*n, "form").is_none();

    // One scanner for both passes so standalone inputs already covered by a
    // framework widget are deduplicated against it.
    let mut scanner = Scanner::new(doc, body, config);

    let framework_candidates: Vec<NodeId> =
        collect_candidates(doc, body, &framework_vocabulary())
            .into_iter()
            .filter(outside_forms)
            .collect();
    let framework_fields = scanner.scan(&framework_candidates);
    let captured: HashSet<NodeId> = framework_fields.iter().map(|f| f.element).collect();
    debug!(fields = framework_fields.len(), "scanned framework controls");
    forms.push(DetectedForm::new(None, framework_fields));

    let standalone_candidates: Vec<NodeId> = collect_candidates(doc, body, NATIVE_SELECTORS)
        .into_iter()
        .filter(outside_forms)
        .filter(|n| !captured.contains(n))
        .collect();
    let standalone_fields = scanner.scan(&standalone_candidates);
    debug!(fields = standalone_fields.len(), "scanned standalone inputs");
    forms.push(DetectedForm::new(None, standalone_fields));

    forms
}

/// Scan a single container. Fails only when `container` is not an attached
/// element.
pub fn detect_in_container(
    doc: &Document,
    container: NodeId,
    config: &DetectionConfig,
) -> Result<ScanResult, EngineError> {
    if !doc.is_element(container) || !doc.is_attached(container) {
        return Err(EngineError::InvalidContainer(container));
    }

    let fields = scan_container(doc, container, &form_vocabulary(), config);
    Ok(ScanResult::from_forms(vec![DetectedForm::new(
        Some(container),
        fields,
    )]))
}

/// Full-page detector. Owns the single page watcher: each detection
/// replaces the previous watcher instead of stacking another one.
pub struct FormDetector {
    config: DetectionConfig,
    scheduler: Rc<dyn Scheduler>,
    watcher: WatcherSlot,
    rescan: Option<RescanReceiver>,
}

impl FormDetector {
    pub fn new(config: DetectionConfig, scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            config,
            scheduler,
            watcher: WatcherSlot::new(),
            rescan: None,
        }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Poll for a mounted framework, giving up after the configured wait.
    pub async fn wait_for_framework(&self, page: &SharedDocument) -> Option<Framework> {
        let limit = self.config.mount_wait();
        let poll = self.config.mount_poll();
        let mut waited = Duration::ZERO;

        loop {
            let found = detect_framework(&page.borrow());
            if found.is_some() {
                debug!(?found, ?waited, "framework mounted");
                return found;
            }
            if waited >= limit {
                debug!(?waited, "no framework mounted, scanning anyway");
                return None;
            }
            self.scheduler.sleep(poll).await;
            waited += poll;
        }
    }

    /// Wait for the page to settle, detect all containers and (re)start the
    /// page watcher.
    pub async fn detect(&mut self, page: &SharedDocument) -> ScanResult {
        let framework = self.wait_for_framework(page).await;
        let mut doc = page.borrow_mut();
        let result = self.detect_now(&mut doc);
        info!(
            ?framework,
            forms = result.form_count,
            fields = result.field_count(),
            "form detection complete"
        );
        result
    }

    /// Detection without the mount wait.
    pub fn detect_now(&mut self, doc: &mut Document) -> ScanResult {
        let result = ScanResult::from_forms(detect_forms(doc, &self.config));
        self.rescan = Some(self.watcher.start(doc));
        result
    }

    /// Receiver of the current watcher's re-detection signals.
    pub fn rescan_signal(&self) -> Option<RescanReceiver> {
        self.rescan.clone()
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.is_active()
    }

    pub fn stop_watching(&mut self, doc: &mut Document) {
        self.watcher.dispose(doc);
        self.rescan = None;
    }
}
