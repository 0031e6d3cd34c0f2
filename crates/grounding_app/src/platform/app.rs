use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use engine_logging::{engine_debug, engine_info};
use grounding_core::{
    list_scroll_target, update, AppState, AppViewModel, BatchStats, ContainerSpan, Effect, Msg,
    SelectedFile,
};
use grounding_engine::EngineHandle;

use super::cli::Commands;
use super::config::AppConfig;
use super::effects::EffectRunner;
use super::ui;
use super::ui::constants::SPLIT_CONTAINER_WIDTH_PX;
use super::ui::layout::HeadlessLayout;

/// Poll interval while waiting on the engine; idle polls become `Msg::Tick`.
const TICK: Duration = Duration::from_millis(75);

/// Held while the divider drag owns the pointer.
struct PointerCapture;

impl PointerCapture {
    fn acquire() -> Self {
        engine_debug!("pointer captured");
        Self
    }
}

impl Drop for PointerCapture {
    fn drop(&mut self) {
        engine_debug!("pointer released");
    }
}

/// One dispatch loop over the core state. View effects run here; IO goes to
/// the engine.
pub struct Session {
    state: AppState,
    runner: EffectRunner,
    layout: HeadlessLayout,
    inbox: VecDeque<Msg>,
    pointer: Option<PointerCapture>,
    viewport_top: f64,
    list_scroll_top: f64,
    settle_timeout: Duration,
}

impl Session {
    pub fn new(
        state: AppState,
        engine: EngineHandle,
        layout: HeadlessLayout,
        settle_timeout: Duration,
    ) -> Self {
        Self {
            state,
            runner: EffectRunner::new(engine),
            layout,
            inbox: VecDeque::new(),
            pointer: None,
            viewport_top: 0.0,
            list_scroll_top: 0.0,
            settle_timeout,
        }
    }

    pub fn send(&mut self, msg: Msg) {
        self.inbox.push_back(msg);
    }

    pub fn view(&self) -> AppViewModel {
        self.state.view()
    }

    /// Last page-canvas scroll offset.
    pub fn viewport_top(&self) -> f64 {
        self.viewport_top
    }

    pub fn list_scroll_top(&self) -> f64 {
        self.list_scroll_top
    }

    pub fn pointer_captured(&self) -> bool {
        self.pointer.is_some()
    }

    /// Dispatch queued messages and engine events until nothing is owed.
    pub fn settle(&mut self) -> anyhow::Result<()> {
        self.settle_with(|_| {})
    }

    /// Like [`settle`](Self::settle), calling `on_change` after every
    /// dispatch that changed the state.
    pub fn settle_with(&mut self, mut on_change: impl FnMut(&AppViewModel)) -> anyhow::Result<()> {
        let deadline = Instant::now() + self.settle_timeout;
        loop {
            while let Some(msg) = self.inbox.pop_front() {
                if self.dispatch(msg) {
                    on_change(&self.state.view());
                }
            }
            if self.runner.outstanding() == 0 {
                return Ok(());
            }
            if Instant::now() >= deadline {
                bail!(
                    "timed out waiting for {} backend response(s)",
                    self.runner.outstanding()
                );
            }
            let msg = self.runner.recv(TICK).unwrap_or(Msg::Tick);
            self.inbox.push_back(msg);
        }
    }

    fn dispatch(&mut self, msg: Msg) -> bool {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        for effect in effects {
            if let Some(effect) = self.runner.submit(effect) {
                self.run_local(effect);
            }
        }
        self.state.consume_dirty()
    }

    fn run_local(&mut self, effect: Effect) {
        match effect {
            Effect::RelayoutPages { scale } => {
                let cached = self
                    .state
                    .view()
                    .active
                    .and_then(|active| active.cached_path);
                if let Some(path) = cached {
                    let layout = self.layout.measure(&path, scale);
                    self.inbox.push_back(Msg::PageLayoutMeasured(layout));
                }
            }
            Effect::ScrollViewport { top_px } => {
                engine_debug!("page canvas scrolled to {:.1}px", top_px);
                self.viewport_top = top_px;
            }
            Effect::ScrollListToChunk { index } => {
                let (container, element) = self.layout.list_geometry(self.list_scroll_top, index);
                self.list_scroll_top = list_scroll_target(&container, &element);
                engine_debug!(
                    "chunk list scrolled to {:.1}px for card {}",
                    self.list_scroll_top,
                    index
                );
            }
            Effect::CapturePointer => {
                if self.pointer.is_none() {
                    self.pointer = Some(PointerCapture::acquire());
                }
            }
            Effect::ReleasePointer => {
                self.pointer = None;
            }
            Effect::BatchCompleted(summary) => {
                engine_info!(
                    "batch finished: {} of {} uploaded",
                    summary.success_count,
                    summary.total
                );
            }
            other => engine_debug!("effect {:?} has no local handler", other),
        }
    }
}

pub fn run_command(command: Commands, config: &AppConfig, config_path: &Path) -> anyhow::Result<()> {
    if let Commands::Config { write } = command {
        print!("{}", config.to_ron()?);
        println!();
        if write {
            let written = config.save(config_path)?;
            println!("Wrote {}", written.display());
        }
        return Ok(());
    }

    let engine =
        EngineHandle::new(config.engine_settings()).context("failed to start the backend client")?;
    let layout = HeadlessLayout {
        fallback_page_height_px: config.page_height_px,
        viewport_height_px: config.viewport_height_px,
    };
    let mut session = Session::new(
        AppState::with_settings(config.core_settings()),
        engine,
        layout,
        config.settle_timeout(),
    );

    session.send(Msg::DocumentsRequested);
    session.settle()?;

    match command {
        Commands::Documents => print!("{}", ui::render::render_documents(&session.view())),
        Commands::Open {
            doc_id,
            select,
            zoom,
            divider,
        } => {
            open_document(&mut session, doc_id)?;
            let step = if zoom >= 0 {
                Msg::ZoomInClicked
            } else {
                Msg::ZoomOutClicked
            };
            for _ in 0..zoom.unsigned_abs() {
                session.send(step.clone());
            }
            if let Some(index) = select {
                session.send(Msg::ChunkClicked(index));
            }
            if let Some(percent) = divider {
                drag_divider(&mut session, percent);
            }
            session.settle()?;
            print!("{}", ui::render::render_viewer(&session.view()));
            println!(
                "Page scroll {:.0}px | list scroll {:.0}px",
                session.viewport_top(),
                session.list_scroll_top()
            );
            session.send(Msg::ViewerClosed);
            session.settle()?;
        }
        Commands::Search { query, open } => {
            session.send(Msg::SearchSubmitted(query));
            session.settle()?;
            print!("{}", ui::render::render_search(&session.view()));
            if let Some(position) = open {
                session.send(Msg::SearchResultActivated(position));
                session.settle()?;
                print!("{}", ui::render::render_viewer(&session.view()));
            }
        }
        Commands::Ask { question, source } => {
            session.send(Msg::ChatSubmitted(question));
            session.settle()?;
            let view = session.view();
            print!("{}", ui::render::render_chat(&view));
            if let Some(last) = view.chat.last().filter(|message| message.is_error) {
                bail!("{}", last.content);
            }
            if let Some(source) = source {
                let message = view.chat.len().saturating_sub(1);
                session.send(Msg::ChatSourceActivated { message, source });
                session.settle()?;
                print!("{}", ui::render::render_viewer(&session.view()));
            }
        }
        Commands::Upload { path } => {
            session.send(Msg::UploadRequested { path });
            session.settle()?;
            let view = session.view();
            print!("{}", ui::render::render_documents(&view));
            print!("{}", ui::render::render_viewer(&view));
        }
        Commands::Batch { paths } => {
            session.send(Msg::BatchOpened);
            session.send(Msg::BatchFilesSelected(selected_files(paths)));
            session.send(Msg::BatchStartClicked);
            let mut last_stats = BatchStats::default();
            session.settle_with(|view| {
                if let Some(batch) = &view.batch {
                    if batch.stats != last_stats {
                        last_stats = batch.stats;
                        println!(
                            "{} processing, {} done, {} failed of {}",
                            batch.stats.processing,
                            batch.stats.success,
                            batch.stats.error,
                            batch.stats.total
                        );
                    }
                }
            })?;
            if let Some(batch) = &session.view().batch {
                print!("{}", ui::render::render_batch(batch));
            }
        }
        Commands::Extract { doc_id } => {
            open_document(&mut session, doc_id)?;
            session.send(Msg::ExtractRequested);
            session.settle()?;
            print!("{}", ui::render::render_review(&session.view()));
        }
        Commands::Validate { doc_id, file } => {
            let payload = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            open_document(&mut session, doc_id)?;
            session.send(Msg::SaveRequested { payload });
            session.settle()?;
            print!("{}", ui::render::render_review(&session.view()));
        }
        Commands::Delete { doc_id } => {
            session.send(Msg::DeleteRequested { doc_id });
            session.settle()?;
            print!("{}", ui::render::render_documents(&session.view()));
        }
        Commands::Config { .. } => {}
    }

    finish(&session.view())
}

fn open_document(session: &mut Session, doc_id: String) -> anyhow::Result<()> {
    session.send(Msg::DocumentSelected { doc_id });
    session.settle()
}

fn drag_divider(session: &mut Session, percent: f64) {
    let container = ContainerSpan {
        left: 0.0,
        width: SPLIT_CONTAINER_WIDTH_PX,
    };
    session.send(Msg::DividerDragStarted);
    session.send(Msg::DividerDragMoved {
        pointer_x: container.left + container.width * percent / 100.0,
        container,
    });
    session.send(Msg::DividerDragEnded);
}

fn selected_files(paths: Vec<PathBuf>) -> Vec<SelectedFile> {
    paths
        .into_iter()
        .map(|path| {
            let size_bytes = fs::metadata(&path).map(|meta| meta.len()).unwrap_or(0);
            SelectedFile { path, size_bytes }
        })
        .collect()
}

/// Print notices and turn a surfaced failure into the exit status.
fn finish(view: &AppViewModel) -> anyhow::Result<()> {
    print!("{}", ui::render::render_notices(view));
    if let Some(banner) = &view.banner {
        bail!("{banner}");
    }
    if let Some(err) = &view.review.error {
        bail!("{err}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use grounding_engine::{
        ApiError, Backend, BoxRecord, ChatAnswerRecord, ChatTurnRecord, ChunkRecord,
        DocumentRecord, FailureKind, GroundingRecord, SearchHitRecord, UploadSettings,
    };
    use std::sync::{Arc, Once};

    static INIT: Once = Once::new();

    fn init_logging() {
        INIT.call_once(|| {
            engine_logging::initialize_for_tests();
        });
    }

    struct FakeBackend;

    fn unsupported() -> ApiError {
        ApiError {
            kind: FailureKind::HttpStatus(500),
            message: "not supported here".to_string(),
        }
    }

    #[async_trait::async_trait]
    impl Backend for FakeBackend {
        async fn list_documents(&self) -> Result<Vec<DocumentRecord>, ApiError> {
            Ok(vec![DocumentRecord {
                doc_id: "doc-a".to_string(),
                filename: "invoice.pdf".to_string(),
                status: None,
                num_chunks: Some(3),
            }])
        }

        async fn load_chunks(&self, _doc_id: &str) -> Result<Vec<ChunkRecord>, ApiError> {
            Ok((0..3)
                .map(|position| ChunkRecord {
                    key: position.to_string(),
                    text: format!("chunk {position}"),
                    chunk_type: "text".to_string(),
                    grounding: Some(GroundingRecord {
                        page: 1,
                        bbox: Some(BoxRecord {
                            left: 0.1,
                            top: 0.25,
                            right: 0.9,
                            bottom: 0.75,
                        }),
                    }),
                })
                .collect())
        }

        async fn fetch_document(&self, _doc_id: &str) -> Result<Vec<u8>, ApiError> {
            Ok(ui::layout::blank_pdf(2, 600, 1_000))
        }

        async fn upload(&self, _path: &Path) -> Result<DocumentRecord, ApiError> {
            Err(unsupported())
        }

        async fn search(
            &self,
            _query: &str,
            _n_results: usize,
        ) -> Result<Vec<SearchHitRecord>, ApiError> {
            Err(unsupported())
        }

        async fn chat(
            &self,
            _question: &str,
            _history: &[ChatTurnRecord],
        ) -> Result<ChatAnswerRecord, ApiError> {
            Err(unsupported())
        }

        async fn extract(&self, _doc_id: &str) -> Result<String, ApiError> {
            Ok("{\"total\": 42}".to_string())
        }

        async fn validate(
            &self,
            _doc_id: &str,
            _payload: &serde_json::Value,
        ) -> Result<String, ApiError> {
            Err(unsupported())
        }

        async fn delete(&self, _doc_id: &str) -> Result<(), ApiError> {
            Ok(())
        }
    }

    fn session(cache: &Path) -> Session {
        init_logging();
        let engine = EngineHandle::with_backend(
            Arc::new(FakeBackend),
            UploadSettings::default(),
            cache.to_path_buf(),
        )
        .unwrap();
        Session::new(
            AppState::new(),
            engine,
            HeadlessLayout {
                fallback_page_height_px: 1_000.0,
                viewport_height_px: 800.0,
            },
            Duration::from_secs(10),
        )
    }

    #[test]
    fn opened_document_is_laid_out_and_scrolls_on_click() {
        let cache = tempfile::tempdir().unwrap();
        let mut session = session(cache.path());

        session.send(Msg::DocumentsRequested);
        session.settle().unwrap();
        open_document(&mut session, "doc-a".to_string()).unwrap();

        let view = session.view();
        let active = view.active.unwrap();
        assert_eq!(active.display_name, "invoice.pdf");
        assert_eq!(active.page_count, Some(2));
        assert!(active.cached_path.unwrap().starts_with(cache.path()));
        assert_eq!(view.chunks.len(), 3);

        session.send(Msg::ChunkClicked(2));
        session.settle().unwrap();
        // page 1 top (1016) + half the page (500) - half the viewport (400)
        assert_eq!(session.viewport_top(), 1_116.0);
        // 2 * 96 + 48 - 400, left unclamped
        assert_eq!(session.list_scroll_top(), -160.0);
        assert_eq!(session.view().selected_chunk, Some(2));
    }

    #[test]
    fn divider_drag_holds_the_pointer_until_release() {
        let cache = tempfile::tempdir().unwrap();
        let mut session = session(cache.path());

        session.send(Msg::DividerDragStarted);
        session.settle().unwrap();
        assert!(session.pointer_captured());

        drag_divider(&mut session, 25.0);
        session.settle().unwrap();
        assert!(!session.pointer_captured());
        assert_eq!(session.view().left_width_percent, 30.0);
    }

    #[test]
    fn review_extraction_reaches_the_view() {
        let cache = tempfile::tempdir().unwrap();
        let mut session = session(cache.path());

        open_document(&mut session, "doc-a".to_string()).unwrap();
        session.send(Msg::ExtractRequested);
        session.settle().unwrap();

        let view = session.view();
        assert_eq!(view.review.extracted.as_deref(), Some("{\"total\": 42}"));
        assert!(finish(&view).is_ok());
    }

    #[test]
    fn surfaced_failures_become_errors() {
        let cache = tempfile::tempdir().unwrap();
        let mut session = session(cache.path());

        session.send(Msg::SearchSubmitted("total".to_string()));
        session.settle().unwrap();

        let err = finish(&session.view()).unwrap_err();
        assert_eq!(err.to_string(), "search failed: Search failed");
    }
}
