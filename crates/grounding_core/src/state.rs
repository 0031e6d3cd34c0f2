use std::path::PathBuf;

use engine_logging::{engine_debug, engine_info, engine_warn};

use crate::batch::{BatchQueue, SelectedFile, TaskId, TaskUpdate, WaveAdvance};
use crate::chunk::ChunkIndex;
use crate::chunk_store::{ChunkStore, LoadTicket};
use crate::effect::{Effect, UploadRequest};
use crate::error::{ErrorKind, UiError};
use crate::navigation::{display_name_hint, NavigationOutcome, NavigationTarget, Navigator};
use crate::search::{ChatAnswer, ChatMessage, ChatState, SearchHit, SearchState, CHAT_FAILURE_REPLY};
use crate::selection::{SelectionChange, SelectionState};
use crate::split::{ContainerSpan, SplitState};
use crate::viewport::{PageLayout, ScrollAnchor, ViewportSync};
use crate::{Chunk, DEFAULT_SEARCH_RESULTS, DEFAULT_UPLOAD_CONCURRENCY};

/// A document known to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub doc_id: String,
    pub filename: String,
}

/// Tunables the core needs from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreSettings {
    pub upload_concurrency: usize,
    pub search_results: usize,
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            upload_concurrency: DEFAULT_UPLOAD_CONCURRENCY,
            search_results: DEFAULT_SEARCH_RESULTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ActiveDocument {
    pub(crate) doc_id: String,
    pub(crate) display_name: String,
    pub(crate) cached_path: Option<PathBuf>,
    pub(crate) loading_chunks: bool,
}

/// Structured-data extraction and review save for the active document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct ReviewState {
    pub(crate) extracting: bool,
    pub(crate) extracted: Option<String>,
    pub(crate) saving: bool,
    pub(crate) save_status: Option<String>,
    pub(crate) error: Option<UiError>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    pub(crate) settings: CoreSettings,
    pub(crate) documents: Vec<Document>,
    pub(crate) active: Option<ActiveDocument>,
    pub(crate) store: ChunkStore,
    pub(crate) selection: SelectionState,
    pub(crate) viewport: ViewportSync,
    pub(crate) split: SplitState,
    pub(crate) navigator: Navigator,
    pub(crate) batch: BatchQueue,
    pub(crate) batch_open: bool,
    pub(crate) search: SearchState,
    pub(crate) chat: ChatState,
    pub(crate) review: ReviewState,
    pub(crate) uploading: bool,
    pub(crate) banner: Option<UiError>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_settings(CoreSettings::default())
    }

    pub fn with_settings(settings: CoreSettings) -> Self {
        Self {
            settings,
            batch: BatchQueue::with_concurrency(settings.upload_concurrency),
            ..Self::default()
        }
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn active_doc_id(&self) -> Option<&str> {
        self.active.as_ref().map(|doc| doc.doc_id.as_str())
    }

    /// Chunks of the active document; empty while its list is not loaded.
    pub fn active_chunks(&self) -> &[Chunk] {
        match self.active_doc_id() {
            Some(doc_id) if self.store.holds(doc_id) => self.store.chunks(),
            _ => &[],
        }
    }

    pub fn batch(&self) -> &BatchQueue {
        &self.batch
    }

    pub fn navigation_outcome(&self) -> Option<&NavigationOutcome> {
        self.navigator.last_outcome()
    }

    // -- documents ----------------------------------------------------------

    pub(crate) fn set_documents(&mut self, result: Result<Vec<Document>, String>) {
        match result {
            Ok(documents) => {
                engine_debug!("document list refreshed: {} entries", documents.len());
                self.documents = documents;
            }
            Err(message) => {
                engine_warn!("failed to load documents: {}", message);
                self.banner = Some(UiError::new(ErrorKind::Load, message));
            }
        }
        self.mark_dirty();
    }

    pub(crate) fn known_filename(&self, doc_id: &str) -> Option<&str> {
        self.documents
            .iter()
            .find(|doc| doc.doc_id == doc_id)
            .map(|doc| doc.filename.as_str())
    }

    pub(crate) fn select_document(&mut self, doc_id: String) -> Vec<Effect> {
        let name = display_name_hint(&doc_id, self.known_filename(&doc_id));
        let (_ticket, effects) = self.activate(doc_id, name);
        effects
    }

    /// Make `doc_id` the active document and start loading its chunks.
    ///
    /// Selection and hover are always cleared: a reload hands out fresh
    /// positional ids even for the same document.
    fn activate(&mut self, doc_id: String, display_name: String) -> (LoadTicket, Vec<Effect>) {
        let same_document = self.active_doc_id() == Some(doc_id.as_str());
        let cached_path = if same_document {
            self.active.as_ref().and_then(|doc| doc.cached_path.clone())
        } else {
            None
        };

        self.selection.reset();
        self.navigator.cancel();
        self.navigator.clear_outcome();
        if !same_document {
            self.viewport.reset_layout();
            self.review = ReviewState::default();
        } else {
            self.viewport.cancel_pending();
        }

        let ticket = self.store.begin_load();
        engine_info!("activating document {} (load ticket {})", doc_id, ticket);

        let mut effects = vec![Effect::LoadChunks {
            doc_id: doc_id.clone(),
            ticket,
        }];
        if cached_path.is_none() {
            effects.push(Effect::FetchDocument {
                doc_id: doc_id.clone(),
            });
        }

        self.active = Some(ActiveDocument {
            doc_id,
            display_name,
            cached_path,
            loading_chunks: true,
        });
        self.mark_dirty();
        (ticket, effects)
    }

    pub(crate) fn apply_chunks(
        &mut self,
        doc_id: String,
        ticket: LoadTicket,
        result: Result<Vec<Chunk>, String>,
    ) -> Vec<Effect> {
        if !self.store.is_current(ticket) {
            engine_debug!("dropping stale chunk load {} for {}", ticket, doc_id);
            return Vec::new();
        }
        if let Some(active) = self.active.as_mut() {
            active.loading_chunks = false;
        }
        self.mark_dirty();

        match result {
            Ok(chunks) => {
                engine_info!("loaded {} chunks for {}", chunks.len(), doc_id);
                self.store.complete_load(ticket, &doc_id, chunks);
                match self.navigator.on_loaded(ticket, &self.store) {
                    Some(index) => self.click_chunk(index),
                    None => {
                        if let Some(NavigationOutcome::SourceUnavailable { doc_id, chunk_key }) =
                            self.navigator.last_outcome()
                        {
                            engine_warn!(
                                "navigation target {} not found in document {}",
                                chunk_key,
                                doc_id
                            );
                        }
                        Vec::new()
                    }
                }
            }
            Err(message) => {
                engine_warn!("failed to load chunks for {}: {}", doc_id, message);
                self.navigator.on_load_failed(ticket);
                // A refresh of the held document keeps its list; a switch does not.
                if !self.store.holds(&doc_id) {
                    self.store.clear();
                }
                self.banner = Some(UiError::new(
                    ErrorKind::Load,
                    format!("Failed to load document chunks: {message}"),
                ));
                Vec::new()
            }
        }
    }

    pub(crate) fn apply_document_cached(
        &mut self,
        doc_id: String,
        result: Result<PathBuf, String>,
    ) -> Vec<Effect> {
        let scale = self.viewport.scale();
        let Some(active) = self.active.as_mut().filter(|doc| doc.doc_id == doc_id) else {
            return Vec::new();
        };
        self.dirty = true;
        match result {
            Ok(path) => {
                active.cached_path = Some(path);
                vec![Effect::RelayoutPages { scale }]
            }
            Err(message) => {
                engine_warn!("failed to fetch document {}: {}", doc_id, message);
                self.banner = Some(UiError::new(
                    ErrorKind::Load,
                    format!("Failed to load PDF: {message}"),
                ));
                Vec::new()
            }
        }
    }

    pub(crate) fn apply_layout(&mut self, layout: PageLayout) -> Vec<Effect> {
        if self.active.is_none() {
            return Vec::new();
        }
        self.mark_dirty();
        match self.viewport.measure(layout) {
            Some(top_px) => vec![Effect::ScrollViewport { top_px }],
            None => Vec::new(),
        }
    }

    // -- selection ----------------------------------------------------------

    /// Toggle selection of `index`; selecting schedules list and page scrolls.
    pub(crate) fn click_chunk(&mut self, index: ChunkIndex) -> Vec<Effect> {
        let Some(chunk) = self.active_chunks().get(index) else {
            return Vec::new();
        };
        let anchor = ScrollAnchor::for_chunk(chunk);
        self.mark_dirty();

        match self.selection.click(index) {
            SelectionChange::Selected(index) => {
                let mut effects = vec![Effect::ScrollListToChunk { index }];
                match anchor {
                    Some(anchor) => {
                        if let Some(top_px) = self.viewport.request_scroll(anchor) {
                            effects.push(Effect::ScrollViewport { top_px });
                        }
                    }
                    None => self.viewport.cancel_pending(),
                }
                effects
            }
            SelectionChange::Deselected(_) => {
                self.viewport.cancel_pending();
                Vec::new()
            }
        }
    }

    pub(crate) fn hover_chunk(&mut self, index: ChunkIndex) {
        if index < self.active_chunks().len() && self.selection.hover_enter(index) {
            self.mark_dirty();
        }
    }

    pub(crate) fn unhover_chunk(&mut self) {
        if self.selection.hover_leave() {
            self.mark_dirty();
        }
    }

    pub(crate) fn zoom(&mut self, zoom_in: bool) -> Vec<Effect> {
        let changed = if zoom_in {
            self.viewport.zoom_in()
        } else {
            self.viewport.zoom_out()
        };
        if !changed {
            return Vec::new();
        }
        self.mark_dirty();
        let has_pages = self
            .active
            .as_ref()
            .is_some_and(|doc| doc.cached_path.is_some());
        if has_pages {
            vec![Effect::RelayoutPages {
                scale: self.viewport.scale(),
            }]
        } else {
            Vec::new()
        }
    }

    // -- divider ------------------------------------------------------------

    pub(crate) fn begin_drag(&mut self) -> Vec<Effect> {
        if self.split.begin_drag() {
            self.mark_dirty();
            vec![Effect::CapturePointer]
        } else {
            Vec::new()
        }
    }

    pub(crate) fn drag_to(&mut self, pointer_x: f64, container: ContainerSpan) {
        if self.split.drag_to(pointer_x, container) {
            self.mark_dirty();
        }
    }

    /// Every way a drag can end goes through here.
    pub(crate) fn end_drag(&mut self) -> Vec<Effect> {
        if self.split.end_drag() {
            self.mark_dirty();
            vec![Effect::ReleasePointer]
        } else {
            Vec::new()
        }
    }

    pub(crate) fn close_viewer(&mut self) -> Vec<Effect> {
        self.viewport.cancel_pending();
        self.end_drag()
    }

    // -- uploads ------------------------------------------------------------

    pub(crate) fn request_upload(&mut self, path: PathBuf) -> Vec<Effect> {
        if self.uploading {
            return Vec::new();
        }
        self.uploading = true;
        self.banner = None;
        self.mark_dirty();
        vec![Effect::UploadFile { path }]
    }

    pub(crate) fn apply_upload(&mut self, result: Result<Document, String>) -> Vec<Effect> {
        self.uploading = false;
        self.mark_dirty();
        match result {
            Ok(document) => {
                engine_info!("uploaded {} as {}", document.filename, document.doc_id);
                if self.known_filename(&document.doc_id).is_none() {
                    self.documents.push(document.clone());
                }
                let (_ticket, effects) = self.activate(document.doc_id, document.filename);
                effects
            }
            Err(message) => {
                self.banner = Some(UiError::new(ErrorKind::Upload, message));
                Vec::new()
            }
        }
    }

    pub(crate) fn open_batch(&mut self) {
        self.batch_open = true;
        self.mark_dirty();
    }

    pub(crate) fn add_batch_files(&mut self, files: Vec<SelectedFile>) {
        self.batch_open = true;
        let (added, skipped) = self.batch.add_files(files);
        if skipped > 0 {
            engine_info!("batch: queued {} file(s), skipped {}", added, skipped);
        }
        self.mark_dirty();
    }

    pub(crate) fn remove_batch_task(&mut self, task_id: TaskId) {
        if self.batch.remove(task_id) {
            self.mark_dirty();
        }
    }

    pub(crate) fn start_batch(&mut self) -> Vec<Effect> {
        match self.batch.start() {
            Some(wave) => {
                engine_info!("batch: starting wave of {}", wave.len());
                self.mark_dirty();
                vec![self.wave_effect(&wave)]
            }
            None => Vec::new(),
        }
    }

    pub(crate) fn apply_task_update(&mut self, task_id: TaskId, update: TaskUpdate) -> Vec<Effect> {
        if !self.batch.apply(task_id, update) {
            return Vec::new();
        }
        self.mark_dirty();
        match self.batch.advance() {
            Some(WaveAdvance::Next(wave)) => {
                engine_info!("batch: starting wave of {}", wave.len());
                vec![self.wave_effect(&wave)]
            }
            Some(WaveAdvance::Finished(summary)) => {
                engine_info!(
                    "batch finished: {}/{} succeeded",
                    summary.success_count,
                    summary.total
                );
                vec![Effect::BatchCompleted(summary), Effect::LoadDocuments]
            }
            None => Vec::new(),
        }
    }

    fn wave_effect(&self, wave: &[TaskId]) -> Effect {
        let requests = wave
            .iter()
            .filter_map(|id| self.batch.task(*id))
            .map(|task| UploadRequest {
                task_id: task.id,
                path: task.path.clone(),
            })
            .collect();
        Effect::UploadWave { requests }
    }

    pub(crate) fn close_batch(&mut self) {
        self.batch.clear();
        self.batch_open = false;
        self.mark_dirty();
    }

    // -- search & chat ------------------------------------------------------

    pub(crate) fn submit_search(&mut self, query: String) -> Vec<Effect> {
        if query.trim().is_empty() {
            return Vec::new();
        }
        self.search.query = query.clone();
        self.search.searching = true;
        self.mark_dirty();
        vec![Effect::Search {
            query,
            n_results: self.settings.search_results,
        }]
    }

    pub(crate) fn apply_search(&mut self, result: Result<Vec<SearchHit>, String>) {
        self.search.searching = false;
        match result {
            Ok(hits) => {
                self.search.hits = hits;
                self.search.visible = true;
            }
            Err(message) => {
                engine_warn!("search failed: {}", message);
                self.banner = Some(UiError::new(ErrorKind::Search, "Search failed"));
            }
        }
        self.mark_dirty();
    }

    pub(crate) fn clear_search(&mut self) {
        self.search = SearchState::default();
        self.mark_dirty();
    }

    pub(crate) fn activate_search_hit(&mut self, position: usize) -> Vec<Effect> {
        let Some(hit) = self.search.hits.get(position) else {
            return Vec::new();
        };
        let target = NavigationTarget {
            doc_id: hit.doc_id.clone(),
            chunk_key: hit.chunk_key.clone(),
            display_name: display_name_hint(&hit.doc_id, self.known_filename(&hit.doc_id)),
        };
        self.search.visible = false;
        self.navigate(target)
    }

    pub(crate) fn submit_chat(&mut self, question: String) -> Vec<Effect> {
        let question = question.trim().to_string();
        if question.is_empty() || self.chat.waiting {
            return Vec::new();
        }
        let history = self.chat.history();
        self.chat.messages.push(ChatMessage::user(question.clone()));
        self.chat.waiting = true;
        self.mark_dirty();
        vec![Effect::Chat { question, history }]
    }

    pub(crate) fn apply_chat(&mut self, result: Result<ChatAnswer, String>) {
        self.chat.waiting = false;
        let message = match result {
            Ok(answer) => ChatMessage::assistant(answer.answer, answer.sources),
            Err(message) => {
                engine_warn!("chat failed: {}", message);
                ChatMessage {
                    is_error: true,
                    ..ChatMessage::assistant(CHAT_FAILURE_REPLY, Vec::new())
                }
            }
        };
        self.chat.messages.push(message);
        self.mark_dirty();
    }

    pub(crate) fn activate_chat_source(&mut self, message: usize, source: usize) -> Vec<Effect> {
        let Some(source) = self
            .chat
            .messages
            .get(message)
            .and_then(|m| m.sources.get(source))
        else {
            return Vec::new();
        };
        let filename = source
            .filename
            .as_deref()
            .or_else(|| self.known_filename(&source.doc_id));
        let target = NavigationTarget {
            doc_id: source.doc_id.clone(),
            chunk_key: source.chunk_key.clone(),
            display_name: display_name_hint(&source.doc_id, filename),
        };
        self.navigate(target)
    }

    /// Switch to the target document and select the target chunk once its
    /// list has loaded.
    fn navigate(&mut self, target: NavigationTarget) -> Vec<Effect> {
        engine_info!(
            "navigating to chunk {} in document {}",
            target.chunk_key,
            target.doc_id
        );
        let (ticket, effects) = self.activate(target.doc_id.clone(), target.display_name.clone());
        self.navigator.begin(ticket, &target);
        effects
    }

    // -- review -------------------------------------------------------------

    pub(crate) fn request_extract(&mut self) -> Vec<Effect> {
        let Some(doc_id) = self.active_doc_id().map(str::to_string) else {
            return Vec::new();
        };
        self.review.extracting = true;
        self.review.error = None;
        self.review.save_status = None;
        self.mark_dirty();
        vec![Effect::Extract { doc_id }]
    }

    pub(crate) fn apply_extract(&mut self, doc_id: String, result: Result<String, String>) {
        if self.active_doc_id() != Some(doc_id.as_str()) {
            return;
        }
        self.review.extracting = false;
        match result {
            Ok(data) => self.review.extracted = Some(data),
            Err(message) => self.review.error = Some(UiError::new(ErrorKind::Extract, message)),
        }
        self.mark_dirty();
    }

    pub(crate) fn request_save(&mut self, payload: String) -> Vec<Effect> {
        let Some(doc_id) = self.active_doc_id().map(str::to_string) else {
            return Vec::new();
        };
        self.review.saving = true;
        self.review.error = None;
        self.review.save_status = None;
        self.mark_dirty();
        vec![Effect::Validate { doc_id, payload }]
    }

    pub(crate) fn apply_save(&mut self, doc_id: String, result: Result<String, String>) {
        if self.active_doc_id() != Some(doc_id.as_str()) {
            return;
        }
        self.review.saving = false;
        match result {
            Ok(status) => self.review.save_status = Some(status),
            Err(message) => self.review.error = Some(UiError::new(ErrorKind::Save, message)),
        }
        self.mark_dirty();
    }

    // -- deletion -----------------------------------------------------------

    pub(crate) fn apply_delete(&mut self, doc_id: String, result: Result<(), String>) -> Vec<Effect> {
        self.mark_dirty();
        if let Err(message) = result {
            self.banner = Some(UiError::new(ErrorKind::Delete, message));
            return Vec::new();
        }
        self.documents.retain(|doc| doc.doc_id != doc_id);
        if self.active_doc_id() != Some(doc_id.as_str()) {
            return Vec::new();
        }
        let effects = self.close_viewer();
        self.active = None;
        self.store.clear();
        self.selection.reset();
        self.viewport.reset_layout();
        self.navigator.cancel();
        self.review = ReviewState::default();
        effects
    }

    pub(crate) fn dismiss_error(&mut self) {
        if self.banner.take().is_some() {
            self.mark_dirty();
        }
    }
}
