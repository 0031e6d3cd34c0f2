use std::path::PathBuf;

use crate::state::AppState;
use crate::{
    BatchStats, BatchSummary, ChatMessage, ChunkIndex, NavigationOutcome, TaskId, TaskStatus,
    UiError,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub documents: Vec<DocumentRow>,
    pub active: Option<ActiveDocumentView>,
    pub chunks: Vec<ChunkCardView>,
    /// Every drawable overlay of the active document, across all pages.
    pub overlays: Vec<OverlayView>,
    pub selected_chunk: Option<ChunkIndex>,
    pub hovered_chunk: Option<ChunkIndex>,
    pub scale: f64,
    pub zoom_label: String,
    pub left_width_percent: f64,
    pub dragging: bool,
    pub uploading: bool,
    pub search: SearchView,
    pub chat: Vec<ChatMessage>,
    pub chat_waiting: bool,
    pub batch: Option<BatchView>,
    pub review: ReviewView,
    pub banner: Option<UiError>,
    pub navigation: Option<NavigationOutcome>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRow {
    pub doc_id: String,
    pub filename: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveDocumentView {
    pub doc_id: String,
    pub display_name: String,
    pub cached_path: Option<PathBuf>,
    pub loading_chunks: bool,
    pub page_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkCardView {
    pub index: ChunkIndex,
    pub key: String,
    pub page_label: String,
    pub chunk_type: String,
    pub text: String,
    pub selected: bool,
    pub hovered: bool,
    pub has_overlay: bool,
}

/// Overlay box in percent of the page, ready for absolute positioning.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayView {
    pub index: ChunkIndex,
    /// 0-indexed page.
    pub page: u32,
    pub left_pct: f64,
    pub top_pct: f64,
    pub width_pct: f64,
    pub height_pct: f64,
    pub selected: bool,
    pub hovered: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchView {
    pub query: String,
    pub searching: bool,
    pub visible: bool,
    pub results: Vec<SearchResultView>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResultView {
    pub doc_id: String,
    pub chunk_key: String,
    /// 1-indexed for display.
    pub page_number: u64,
    pub chunk_type: String,
    pub text: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchView {
    pub tasks: Vec<UploadTaskView>,
    pub stats: BatchStats,
    pub running: bool,
    pub last_summary: Option<BatchSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTaskView {
    pub id: TaskId,
    pub name: String,
    pub size_label: String,
    pub status: TaskStatus,
    pub status_text: String,
    pub progress: u8,
    pub removable: bool,
    pub remote_doc_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReviewView {
    pub extracting: bool,
    pub extracted: Option<String>,
    pub saving: bool,
    pub save_status: Option<String>,
    pub error: Option<UiError>,
}

impl AppState {
    pub fn view(&self) -> AppViewModel {
        let active_id = self.active_doc_id();
        let selected = self.selection.selected();
        let hovered = self.selection.hovered();
        let chunks = self.active_chunks();

        let documents = self
            .documents
            .iter()
            .map(|doc| DocumentRow {
                doc_id: doc.doc_id.clone(),
                filename: doc.filename.clone(),
                active: Some(doc.doc_id.as_str()) == active_id,
            })
            .collect();

        let active = self.active.as_ref().map(|doc| ActiveDocumentView {
            doc_id: doc.doc_id.clone(),
            display_name: doc.display_name.clone(),
            cached_path: doc.cached_path.clone(),
            loading_chunks: doc.loading_chunks,
            page_count: self.viewport.layout().map(|layout| layout.page_count),
        });

        let cards = chunks
            .iter()
            .enumerate()
            .map(|(index, chunk)| ChunkCardView {
                index,
                key: chunk.key.clone(),
                page_label: chunk.page_label(),
                chunk_type: if chunk.chunk_type.is_empty() {
                    "text".to_string()
                } else {
                    chunk.chunk_type.clone()
                },
                text: if chunk.text.is_empty() {
                    "No content".to_string()
                } else {
                    chunk.text.clone()
                },
                selected: selected == Some(index),
                hovered: hovered == Some(index),
                has_overlay: chunk.overlay().is_some(),
            })
            .collect();

        let overlays = chunks
            .iter()
            .enumerate()
            .filter_map(|(index, chunk)| {
                let (page, bbox) = chunk.overlay()?;
                Some(OverlayView {
                    index,
                    page,
                    left_pct: bbox.left * 100.0,
                    top_pct: bbox.top * 100.0,
                    width_pct: bbox.width() * 100.0,
                    height_pct: bbox.height() * 100.0,
                    selected: selected == Some(index),
                    hovered: hovered == Some(index),
                })
            })
            .collect();

        let search = SearchView {
            query: self.search.query.clone(),
            searching: self.search.searching,
            visible: self.search.visible,
            results: self
                .search
                .hits
                .iter()
                .map(|hit| SearchResultView {
                    doc_id: hit.doc_id.clone(),
                    chunk_key: hit.chunk_key.clone(),
                    page_number: u64::from(hit.page) + 1,
                    chunk_type: hit.chunk_type.clone(),
                    text: hit.text.clone(),
                    score: hit.score,
                })
                .collect(),
        };

        let batch = self.batch_open.then(|| {
            let running = self.batch.is_running();
            BatchView {
                tasks: self
                    .batch
                    .tasks()
                    .map(|task| UploadTaskView {
                        id: task.id,
                        name: task.name.clone(),
                        size_label: format_file_size(task.size_bytes),
                        status: task.status,
                        status_text: status_text(task.status, task.error.as_deref()),
                        progress: task.progress,
                        removable: task.status == TaskStatus::Pending && !running,
                        remote_doc_id: task.remote_doc_id.clone(),
                    })
                    .collect(),
                stats: self.batch.stats(),
                running,
                last_summary: self.batch.last_summary(),
            }
        });

        AppViewModel {
            documents,
            active,
            chunks: cards,
            overlays,
            selected_chunk: selected,
            hovered_chunk: hovered,
            scale: self.viewport.scale(),
            zoom_label: self.viewport.zoom_label(),
            left_width_percent: self.split.left_width_percent(),
            dragging: self.split.is_dragging(),
            uploading: self.uploading,
            search,
            chat: self.chat.messages.clone(),
            chat_waiting: self.chat.waiting,
            batch,
            review: ReviewView {
                extracting: self.review.extracting,
                extracted: self.review.extracted.clone(),
                saving: self.review.saving,
                save_status: self.review.save_status.clone(),
                error: self.review.error.clone(),
            },
            banner: self.banner.clone(),
            navigation: self.navigation_outcome().cloned(),
            dirty: self.is_dirty(),
        }
    }
}

fn status_text(status: TaskStatus, error: Option<&str>) -> String {
    match status {
        TaskStatus::Pending => "Ready to upload".to_string(),
        TaskStatus::Uploading => "Uploading...".to_string(),
        TaskStatus::Parsing => "Parsing document...".to_string(),
        TaskStatus::Indexing => "Indexing for search...".to_string(),
        TaskStatus::Success => "Complete".to_string(),
        TaskStatus::Error => error.unwrap_or("Upload failed").to_string(),
    }
}

/// Human-readable size: bytes, KB or MB with one decimal.
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    if bytes < KB {
        format!("{bytes} B")
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::format_file_size;

    #[test]
    fn file_sizes_pick_a_unit() {
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(3 * 1024 * 1024), "3.0 MB");
    }
}
