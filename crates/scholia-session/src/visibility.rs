//! Open/closed state of the assistant panel.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::selection::SelectionStore;

/// Shared open/closed flag of the assistant panel. Clones share one flag.
///
/// Closing the panel discards any pending selection context; opening has
/// no other effect.
#[derive(Debug, Clone)]
pub struct AssistantVisibility {
    open: Arc<watch::Sender<bool>>,
    selection: SelectionStore,
}

impl AssistantVisibility {
    /// A closed panel that clears `selection` when closed.
    pub fn new(selection: SelectionStore) -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            open: Arc::new(tx),
            selection,
        }
    }

    /// Flip the flag and return the new state.
    pub fn toggle(&self) -> bool {
        let mut now_open = false;
        self.open.send_modify(|open| {
            *open = !*open;
            now_open = *open;
        });
        if !now_open {
            debug!("assistant closed; pending selection discarded");
            self.selection.clear();
        }
        now_open
    }

    /// Open the panel.
    pub fn open(&self) {
        self.set_open(true);
    }

    /// Close the panel.
    pub fn close(&self) {
        self.set_open(false);
    }

    /// Set the flag. Only an open→closed transition clears the selection.
    pub fn set_open(&self, open: bool) {
        let mut was_open = false;
        self.open.send_if_modified(|current| {
            was_open = *current;
            if *current == open {
                return false;
            }
            *current = open;
            true
        });
        if was_open && !open {
            debug!("assistant closed; pending selection discarded");
            self.selection.clear();
        }
    }

    /// Current state.
    pub fn is_open(&self) -> bool {
        *self.open.borrow()
    }

    /// Observe changes.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.open.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scholia_models::{DocumentId, SelectionContext};

    fn with_selection() -> (AssistantVisibility, SelectionStore) {
        let store = SelectionStore::new();
        store.set(SelectionContext::capture("torque", DocumentId::new("ch-1")));
        (AssistantVisibility::new(store.clone()), store)
    }

    #[test]
    fn opening_keeps_the_selection() {
        let (panel, store) = with_selection();
        assert!(panel.toggle());
        assert!(panel.is_open());
        assert!(!store.is_empty());
    }

    #[test]
    fn closing_clears_the_selection() {
        let (panel, store) = with_selection();
        panel.open();
        assert!(!panel.toggle());
        assert!(store.is_empty());
    }

    #[test]
    fn close_while_closed_is_not_a_transition() {
        let (panel, store) = with_selection();
        panel.close();
        assert!(!store.is_empty());
    }
}
