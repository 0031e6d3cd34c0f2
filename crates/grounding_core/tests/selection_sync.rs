use std::path::PathBuf;
use std::sync::Once;

use grounding_core::{
    update, AppState, BoundingBox, Chunk, Effect, Grounding, LoadTicket, Msg, PageLayout,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn chunk(key: &str, page: u32, bbox: Option<BoundingBox>) -> Chunk {
    Chunk {
        key: key.to_string(),
        text: format!("text {key}"),
        chunk_type: "text".to_string(),
        grounding: Some(Grounding { page, bbox }),
    }
}

fn two_page_chunks() -> Vec<Chunk> {
    vec![
        chunk("0", 0, Some(BoundingBox::new(0.1, 0.1, 0.5, 0.2))),
        chunk("1", 1, Some(BoundingBox::new(0.2, 0.3, 0.6, 0.4))),
    ]
}

fn layout() -> PageLayout {
    PageLayout {
        page_height_px: 1000.0,
        viewport_height_px: 600.0,
        page_count: 2,
    }
}

fn ticket_of(effects: &[Effect]) -> LoadTicket {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::LoadChunks { ticket, .. } => Some(*ticket),
            _ => None,
        })
        .expect("load chunks effect")
}

/// Select `doc_id` and land `chunks` for it.
fn open_document(state: AppState, doc_id: &str, chunks: Vec<Chunk>) -> AppState {
    let (state, effects) = update(
        state,
        Msg::DocumentSelected {
            doc_id: doc_id.to_string(),
        },
    );
    let ticket = ticket_of(&effects);
    let (state, _) = update(
        state,
        Msg::ChunksLoaded {
            doc_id: doc_id.to_string(),
            ticket,
            result: Ok(chunks),
        },
    );
    state
}

fn viewport_scrolls(effects: &[Effect]) -> Vec<f64> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::ScrollViewport { top_px } => Some(*top_px),
            _ => None,
        })
        .collect()
}

#[test]
fn selecting_document_loads_chunks_and_fetches_pages() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::DocumentSelected {
            doc_id: "doc-a".to_string(),
        },
    );
    assert_eq!(
        effects,
        vec![
            Effect::LoadChunks {
                doc_id: "doc-a".to_string(),
                ticket: 1
            },
            Effect::FetchDocument {
                doc_id: "doc-a".to_string()
            },
        ]
    );
    let view = state.view();
    let active = view.active.expect("active document");
    assert!(active.loading_chunks);
    assert_eq!(active.display_name, "Document doc-a");
    assert!(view.chunks.is_empty());
}

#[test]
fn click_waits_for_layout_then_scrolls_to_region() {
    init_logging();
    let state = open_document(AppState::new(), "doc-a", two_page_chunks());

    let (state, effects) = update(state, Msg::ChunkClicked(1));
    assert_eq!(effects, vec![Effect::ScrollListToChunk { index: 1 }]);
    assert_eq!(state.view().selected_chunk, Some(1));

    let (state, effects) = update(state, Msg::PageLayoutMeasured(layout()));
    let scrolls = viewport_scrolls(&effects);
    assert_eq!(scrolls.len(), 1);
    // page 1, centre 0.35: 1016 + 350 - 300
    assert!((scrolls[0] - 1066.0).abs() < 1e-9);

    // Layout known: the next selection scrolls immediately.
    let (_state, effects) = update(state, Msg::ChunkClicked(0));
    assert_eq!(effects[0], Effect::ScrollListToChunk { index: 0 });
    assert_eq!(viewport_scrolls(&effects), vec![0.0]);
}

#[test]
fn clicking_selected_chunk_deselects_without_scrolling() {
    init_logging();
    let state = open_document(AppState::new(), "doc-a", two_page_chunks());
    let (state, _) = update(state, Msg::PageLayoutMeasured(layout()));

    let (state, _) = update(state, Msg::ChunkClicked(0));
    let (state, effects) = update(state, Msg::ChunkClicked(0));
    assert!(effects.is_empty());
    assert_eq!(state.view().selected_chunk, None);

    let (state, _) = update(state, Msg::ChunkClicked(0));
    let (state, _) = update(state, Msg::ChunkClicked(1));
    let view = state.view();
    assert_eq!(view.selected_chunk, Some(1));
    assert!(!view.chunks[0].selected);
    assert!(view.chunks[1].selected);
}

#[test]
fn chunk_without_valid_box_scrolls_list_only() {
    init_logging();
    let chunks = vec![
        chunk("0", 0, None),
        chunk("1", 0, Some(BoundingBox::new(0.6, 0.1, 0.5, 0.2))),
        Chunk {
            grounding: None,
            ..chunk("2", 0, None)
        },
    ];
    let state = open_document(AppState::new(), "doc-a", chunks);
    let (state, _) = update(state, Msg::PageLayoutMeasured(layout()));

    for index in 0..3 {
        let (next, effects) = update(state.clone(), Msg::ChunkClicked(index));
        assert_eq!(effects, vec![Effect::ScrollListToChunk { index }]);
        assert_eq!(next.view().selected_chunk, Some(index));
    }

    let view = state.view();
    assert!(view.overlays.is_empty());
    assert_eq!(view.chunks.len(), 3);
    assert_eq!(view.chunks[2].page_label, "N/A");
}

#[test]
fn overlays_are_percentages_of_the_page() {
    init_logging();
    let state = open_document(AppState::new(), "doc-a", two_page_chunks());
    let (state, _) = update(state, Msg::ChunkHoverStarted(1));
    let view = state.view();

    assert_eq!(view.overlays.len(), 2);
    let overlay = &view.overlays[1];
    assert_eq!(overlay.page, 1);
    assert!((overlay.left_pct - 20.0).abs() < 1e-9);
    assert!((overlay.top_pct - 30.0).abs() < 1e-9);
    assert!((overlay.width_pct - 40.0).abs() < 1e-9);
    assert!((overlay.height_pct - 10.0).abs() < 1e-9);
    assert!(overlay.hovered);
    assert!(!overlay.selected);

    let (state, _) = update(state, Msg::ChunkHoverEnded);
    assert_eq!(state.view().hovered_chunk, None);
}

#[test]
fn switching_document_resets_selection_and_replaces_chunks() {
    init_logging();
    let state = open_document(AppState::new(), "doc-a", two_page_chunks());
    let (state, _) = update(state, Msg::ChunkClicked(1));
    let (state, _) = update(state, Msg::ChunkHoverStarted(0));

    let (state, effects) = update(
        state,
        Msg::DocumentSelected {
            doc_id: "doc-b".to_string(),
        },
    );
    let view = state.view();
    assert_eq!(view.selected_chunk, None);
    assert_eq!(view.hovered_chunk, None);
    assert!(view.chunks.is_empty());

    let ticket = ticket_of(&effects);
    let (state, _) = update(
        state,
        Msg::ChunksLoaded {
            doc_id: "doc-b".to_string(),
            ticket,
            result: Ok(vec![chunk("b0", 3, None)]),
        },
    );
    let view = state.view();
    assert_eq!(view.chunks.len(), 1);
    assert_eq!(view.chunks[0].key, "b0");
    assert_eq!(view.chunks[0].page_label, "Page 4");
}

#[test]
fn late_response_for_previous_document_is_dropped() {
    init_logging();
    let (state, first) = update(
        AppState::new(),
        Msg::DocumentSelected {
            doc_id: "doc-a".to_string(),
        },
    );
    let (state, second) = update(
        state,
        Msg::DocumentSelected {
            doc_id: "doc-b".to_string(),
        },
    );

    let (state, effects) = update(
        state,
        Msg::ChunksLoaded {
            doc_id: "doc-a".to_string(),
            ticket: ticket_of(&first),
            result: Ok(two_page_chunks()),
        },
    );
    assert!(effects.is_empty());
    assert!(state.view().chunks.is_empty());

    let (state, _) = update(
        state,
        Msg::ChunksLoaded {
            doc_id: "doc-b".to_string(),
            ticket: ticket_of(&second),
            result: Ok(vec![chunk("b0", 0, None)]),
        },
    );
    assert_eq!(state.view().chunks.len(), 1);
}

#[test]
fn failed_load_surfaces_error_and_clears_other_document() {
    init_logging();
    let state = open_document(AppState::new(), "doc-a", two_page_chunks());

    // Reloading the same document keeps its list on failure.
    let (state, effects) = update(
        state,
        Msg::DocumentSelected {
            doc_id: "doc-a".to_string(),
        },
    );
    let (state, _) = update(
        state,
        Msg::ChunksLoaded {
            doc_id: "doc-a".to_string(),
            ticket: ticket_of(&effects),
            result: Err("boom".to_string()),
        },
    );
    let view = state.view();
    assert_eq!(view.chunks.len(), 2);
    assert!(view.banner.is_some());

    let (state, effects) = update(
        state,
        Msg::DocumentSelected {
            doc_id: "doc-b".to_string(),
        },
    );
    let (state, _) = update(
        state,
        Msg::ChunksLoaded {
            doc_id: "doc-b".to_string(),
            ticket: ticket_of(&effects),
            result: Err("gone".to_string()),
        },
    );
    let view = state.view();
    assert!(view.chunks.is_empty());
    assert!(view
        .banner
        .expect("banner")
        .message
        .contains("gone"));
    assert!(!view.active.expect("still active").loading_chunks);
}

#[test]
fn cached_document_triggers_layout_at_current_scale() {
    init_logging();
    let state = open_document(AppState::new(), "doc-a", two_page_chunks());
    let (state, _) = update(state, Msg::ZoomInClicked);
    let (state, effects) = update(
        state,
        Msg::DocumentCached {
            doc_id: "doc-a".to_string(),
            result: Ok(PathBuf::from("/tmp/doc-a.pdf")),
        },
    );
    assert_eq!(effects, vec![Effect::RelayoutPages { scale: 1.2 }]);

    let (state, effects) = update(state, Msg::ZoomOutClicked);
    assert_eq!(effects, vec![Effect::RelayoutPages { scale: 1.0 }]);

    // Same document again: pages are kept, only chunks reload.
    let (_state, effects) = update(
        state,
        Msg::DocumentSelected {
            doc_id: "doc-a".to_string(),
        },
    );
    assert_eq!(effects.len(), 1);
    assert!(matches!(effects[0], Effect::LoadChunks { .. }));
}

#[test]
fn clicks_out_of_range_are_ignored() {
    init_logging();
    let state = open_document(AppState::new(), "doc-a", two_page_chunks());
    let (mut state, _) = update(state, Msg::ChunkHoverStarted(9));
    state.consume_dirty();
    let (mut state, effects) = update(state, Msg::ChunkClicked(9));
    assert!(effects.is_empty());
    assert!(!state.consume_dirty());
    assert_eq!(state.view().selected_chunk, None);
}
