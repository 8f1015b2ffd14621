//! Test doubles shared by the unit tests.

use std::sync::Mutex;

use crate::document_view::Navigator;

/// Navigator that records every target instead of navigating.
#[derive(Debug, Default)]
pub(crate) struct RecordingNavigator {
    visited: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub(crate) fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn hard_navigate(&self, target: &str) {
        self.visited.lock().unwrap().push(target.to_string());
    }
}
