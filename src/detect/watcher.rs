use tokio::sync::watch;
use tracing::{debug, info};

use crate::dom::selector::is_form_control_shaped;
use crate::dom::{Document, MutationRecord, NodeId, ObserverId};

/// Re-detection hint published by the watcher. `generation` increases each
/// time controls are added to the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RescanSignal {
    pub generation: u64,
    pub last_added: Option<NodeId>,
}

pub type RescanReceiver = watch::Receiver<RescanSignal>;

/// Whether a mutation added a control, directly or inside a subtree.
pub fn adds_form_control(doc: &Document, record: &MutationRecord) -> bool {
    record.added.iter().any(|added| {
        is_form_control_shaped(doc, *added)
            || doc
                .descendants(*added)
                .into_iter()
                .any(|n| is_form_control_shaped(doc, n))
    })
}

/// Holder of the single live page watcher. Starting a watcher disposes the
/// previous one first, so at most one notification stream exists.
#[derive(Debug, Default)]
pub struct WatcherSlot {
    active: Option<ObserverId>,
}

impl WatcherSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe `doc` and return the stream of re-detection signals. Any
    /// previous watcher is disconnected and its receivers see the channel
    /// close.
    pub fn start(&mut self, doc: &mut Document) -> RescanReceiver {
        self.dispose(doc);

        let (tx, rx) = watch::channel(RescanSignal::default());
        let observer = doc.observe(move |doc, record| {
            if !adds_form_control(doc, record) {
                return;
            }
            let added = record.added.first().copied();
            tx.send_modify(|signal| {
                signal.generation += 1;
                signal.last_added = added;
            });
            debug!(?added, "form controls added, re-detection suggested");
        });

        info!("page watcher started");
        self.active = Some(observer);
        rx
    }

    pub fn dispose(&mut self, doc: &mut Document) {
        if let Some(observer) = self.active.take() {
            doc.disconnect(observer);
            info!("page watcher disposed");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }
}
