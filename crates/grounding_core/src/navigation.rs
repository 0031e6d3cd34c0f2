//! Jump from a search hit or chat citation to a chunk in another document.

use crate::chunk::ChunkIndex;
use crate::chunk_store::{ChunkStore, LoadTicket};

/// Where a search result or citation points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationTarget {
    pub doc_id: String,
    pub chunk_key: String,
    pub display_name: String,
}

/// How the last navigation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    Selected { doc_id: String, index: ChunkIndex },
    /// The target document loaded but no chunk carries the requested key.
    SourceUnavailable { doc_id: String, chunk_key: String },
    LoadFailed { doc_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingNavigation {
    ticket: LoadTicket,
    doc_id: String,
    chunk_key: String,
}

/// Holds at most one navigation waiting for its chunk load to land.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Navigator {
    pending: Option<PendingNavigation>,
    last_outcome: Option<NavigationOutcome>,
}

impl Navigator {
    /// Park `target` until the load identified by `ticket` completes.
    pub fn begin(&mut self, ticket: LoadTicket, target: &NavigationTarget) {
        self.pending = Some(PendingNavigation {
            ticket,
            doc_id: target.doc_id.clone(),
            chunk_key: target.chunk_key.clone(),
        });
        self.last_outcome = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn last_outcome(&self) -> Option<&NavigationOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn clear_outcome(&mut self) {
        self.last_outcome = None;
    }

    /// Resolve the parked target against a freshly loaded store.
    ///
    /// Returns the index to select, or `None` when this load was not the one
    /// the navigation waits for or the key did not resolve.
    pub fn on_loaded(&mut self, ticket: LoadTicket, store: &ChunkStore) -> Option<ChunkIndex> {
        if self.pending.as_ref().map(|p| p.ticket) != Some(ticket) {
            return None;
        }
        let pending = self.pending.take()?;
        match store.index_of(&pending.chunk_key) {
            Some(index) => {
                self.last_outcome = Some(NavigationOutcome::Selected {
                    doc_id: pending.doc_id,
                    index,
                });
                Some(index)
            }
            None => {
                self.last_outcome = Some(NavigationOutcome::SourceUnavailable {
                    doc_id: pending.doc_id,
                    chunk_key: pending.chunk_key,
                });
                None
            }
        }
    }

    pub fn on_load_failed(&mut self, ticket: LoadTicket) {
        if self.pending.as_ref().map(|p| p.ticket) != Some(ticket) {
            return;
        }
        if let Some(pending) = self.pending.take() {
            self.last_outcome = Some(NavigationOutcome::LoadFailed {
                doc_id: pending.doc_id,
            });
        }
    }
}

/// Name to show for a document reached by navigation: the known filename, or
/// `Document <first 8 chars of id>`.
pub fn display_name_hint(doc_id: &str, known_filename: Option<&str>) -> String {
    match known_filename {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            let short: String = doc_id.chars().take(8).collect();
            format!("Document {short}")
        }
    }
}
