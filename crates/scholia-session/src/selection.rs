//! Selection tracking and the shared selection context.
//!
//! [`SelectionStore`] holds the context handed to the next chat send. The
//! [`SelectionTracker`] writes it from pointer-release events inside a
//! registered document viewport; the chat engine consumes it with
//! [`SelectionStore::take`]; closing the assistant clears it.
//!
//! ```text
//! pointer release ──► SelectionTracker ──► SelectionStore ──► ChatSession::send
//!   (in viewport)          │                    ▲
//!                          ▼                    │ clear
//!                      Affordance        AssistantVisibility::close
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use scholia_models::{AnchorPoint, DocumentId, SelectionContext, SelectionRect};
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// SelectionStore
// ---------------------------------------------------------------------------

/// Shared selection context. Clones share one value.
#[derive(Debug, Clone)]
pub struct SelectionStore {
    state: Arc<watch::Sender<SelectionContext>>,
}

impl Default for SelectionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionStore {
    /// An empty store.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(SelectionContext::empty());
        Self {
            state: Arc::new(tx),
        }
    }

    /// Replace the context.
    pub fn set(&self, context: SelectionContext) {
        self.state.send_replace(context);
    }

    /// Empty the context.
    pub fn clear(&self) {
        self.state.send_if_modified(|ctx| {
            if ctx.is_empty() {
                return false;
            }
            *ctx = SelectionContext::empty();
            true
        });
    }

    /// Read and clear in one step.
    pub fn take(&self) -> SelectionContext {
        self.state.send_replace(SelectionContext::empty())
    }

    /// Current context.
    pub fn current(&self) -> SelectionContext {
        self.state.borrow().clone()
    }

    /// `true` when nothing is captured.
    pub fn is_empty(&self) -> bool {
        self.state.borrow().is_empty()
    }

    /// Observe changes.
    pub fn subscribe(&self) -> watch::Receiver<SelectionContext> {
        self.state.subscribe()
    }
}

// ---------------------------------------------------------------------------
// Viewports
// ---------------------------------------------------------------------------

/// Identifier of a registered document viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewportId(Uuid);

impl ViewportId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

type Registry = Arc<Mutex<HashMap<ViewportId, DocumentId>>>;

fn lock(registry: &Registry) -> MutexGuard<'_, HashMap<ViewportId, DocumentId>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Keeps a viewport registered with its tracker; dropping it releases the
/// registration.
#[derive(Debug)]
pub struct ViewportRegistration {
    id: ViewportId,
    registry: Registry,
}

impl ViewportRegistration {
    /// The registered viewport.
    pub fn id(&self) -> ViewportId {
        self.id
    }
}

impl Drop for ViewportRegistration {
    fn drop(&mut self) {
        if let Some(document) = lock(&self.registry).remove(&self.id) {
            debug!(document = %document, "viewport released");
        }
    }
}

// ---------------------------------------------------------------------------
// SelectionTracker
// ---------------------------------------------------------------------------

/// A pointer-release event as reported by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerRelease {
    /// Viewport the event target lies in, `None` when outside every
    /// document viewport.
    pub viewport: Option<ViewportId>,
    /// Current selection text, untrimmed.
    pub selected_text: String,
    /// Bounding rectangle of the selection range.
    pub bounds: SelectionRect,
}

/// Whether and where the "Ask AI" affordance is shown.
#[derive(Debug, Clone, PartialEq)]
pub enum Affordance {
    /// Not shown.
    Hidden,
    /// Shown at `anchor` for a selection in `document`.
    Visible {
        /// Screen position.
        anchor: AnchorPoint,
        /// Document the selection belongs to.
        document: DocumentId,
    },
}

/// Turns pointer releases inside registered viewports into selection
/// context.
#[derive(Debug, Clone)]
pub struct SelectionTracker {
    store: SelectionStore,
    viewports: Registry,
    anchor: Arc<Mutex<Option<AnchorPoint>>>,
}

impl SelectionTracker {
    /// A tracker writing into `store`.
    pub fn new(store: SelectionStore) -> Self {
        Self {
            store,
            viewports: Arc::default(),
            anchor: Arc::default(),
        }
    }

    /// The store this tracker writes.
    pub fn store(&self) -> &SelectionStore {
        &self.store
    }

    /// Register a viewport showing `document`.
    pub fn attach(&self, document: DocumentId) -> ViewportRegistration {
        let id = ViewportId::new();
        debug!(document = %document, "viewport attached");
        lock(&self.viewports).insert(id, document);
        ViewportRegistration {
            id,
            registry: Arc::clone(&self.viewports),
        }
    }

    /// Number of live viewport registrations.
    pub fn attached(&self) -> usize {
        lock(&self.viewports).len()
    }

    /// Handle a pointer release and return the resulting affordance.
    ///
    /// Releases outside a registered viewport leave everything untouched.
    pub fn on_pointer_release(&self, event: &PointerRelease) -> Affordance {
        let document = event
            .viewport
            .and_then(|id| lock(&self.viewports).get(&id).cloned());
        let Some(document) = document else {
            return self.affordance();
        };

        let context = SelectionContext::capture(&event.selected_text, document);
        let mut anchor = self.anchor.lock().unwrap_or_else(PoisonError::into_inner);
        if context.is_empty() {
            *anchor = None;
            drop(anchor);
            self.store.clear();
        } else {
            *anchor = Some(event.bounds.anchor());
            drop(anchor);
            self.store.set(context);
        }
        self.affordance()
    }

    /// The affordance for the current state. Hidden whenever the context is
    /// empty, however it was emptied.
    pub fn affordance(&self) -> Affordance {
        let context = self.store.current();
        let anchor = *self.anchor.lock().unwrap_or_else(PoisonError::into_inner);
        match (context.into_captured(), anchor) {
            (Some(captured), Some(anchor)) => Affordance::Visible {
                anchor,
                document: captured.document_id,
            },
            _ => Affordance::Hidden,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> SelectionRect {
        SelectionRect {
            left: 10.0,
            top: 20.0,
            right: 110.0,
            bottom: 40.0,
        }
    }

    fn release(viewport: Option<ViewportId>, text: &str) -> PointerRelease {
        PointerRelease {
            viewport,
            selected_text: text.to_string(),
            bounds: rect(),
        }
    }

    #[test]
    fn take_empties_the_store() {
        let store = SelectionStore::new();
        store.set(SelectionContext::capture("PID", DocumentId::new("ch-1")));
        assert_eq!(store.take().text(), Some("PID"));
        assert!(store.is_empty());
    }

    #[test]
    fn selection_inside_viewport_is_captured() {
        let tracker = SelectionTracker::new(SelectionStore::new());
        let viewport = tracker.attach(DocumentId::new("ch-2"));

        let affordance = tracker.on_pointer_release(&release(Some(viewport.id()), " torque control "));
        assert_eq!(
            affordance,
            Affordance::Visible {
                anchor: AnchorPoint { x: 115.0, y: 45.0 },
                document: DocumentId::new("ch-2"),
            }
        );
        let ctx = tracker.store().current();
        assert_eq!(ctx.text(), Some("torque control"));
        assert_eq!(ctx.document_id(), Some(&DocumentId::new("ch-2")));
    }

    #[test]
    fn empty_selection_clears_and_hides() {
        let tracker = SelectionTracker::new(SelectionStore::new());
        let viewport = tracker.attach(DocumentId::new("ch-2"));
        tracker.on_pointer_release(&release(Some(viewport.id()), "torque"));

        let affordance = tracker.on_pointer_release(&release(Some(viewport.id()), "   "));
        assert_eq!(affordance, Affordance::Hidden);
        assert!(tracker.store().is_empty());
    }

    #[test]
    fn release_outside_viewport_keeps_selection() {
        let tracker = SelectionTracker::new(SelectionStore::new());
        let viewport = tracker.attach(DocumentId::new("ch-2"));
        tracker.on_pointer_release(&release(Some(viewport.id()), "torque"));

        let affordance = tracker.on_pointer_release(&release(None, ""));
        assert!(matches!(affordance, Affordance::Visible { .. }));
        assert_eq!(tracker.store().current().text(), Some("torque"));
    }

    #[test]
    fn external_clear_hides_affordance() {
        let tracker = SelectionTracker::new(SelectionStore::new());
        let viewport = tracker.attach(DocumentId::new("ch-2"));
        tracker.on_pointer_release(&release(Some(viewport.id()), "torque"));

        tracker.store().take();
        assert_eq!(tracker.affordance(), Affordance::Hidden);
    }

    #[test]
    fn dropped_registration_stops_capturing() {
        let tracker = SelectionTracker::new(SelectionStore::new());
        let viewport = tracker.attach(DocumentId::new("ch-2"));
        let id = viewport.id();
        assert_eq!(tracker.attached(), 1);

        drop(viewport);
        assert_eq!(tracker.attached(), 0);
        tracker.on_pointer_release(&release(Some(id), "torque"));
        assert!(tracker.store().is_empty());
    }
}
